//! Endpoint HTTP du proxy
//!
//! `GET /api/proxy?endpoint=search&q=…` ou `GET /api/proxy?endpoint=stream&videoId=…`
//!
//! Toutes les réponses de cette route, y compris les erreurs, portent les
//! en-têtes CORS.

use crate::error::{ProxyError, Result};
use crate::request::{ProxyQuery, ProxyRequest};
use crate::translator::ProxyTranslator;
use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
    },
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tracing::debug;

/// Crée le router du proxy (à monter sous `/api/proxy`)
pub fn create_router(translator: Arc<ProxyTranslator>) -> Router {
    Router::new()
        .route("/", get(proxy_handler))
        .with_state(translator)
}

/// GET /api/proxy
async fn proxy_handler(
    State(translator): State<Arc<ProxyTranslator>>,
    query: std::result::Result<Query<ProxyQuery>, QueryRejection>,
) -> Response {
    let mut response = match handle(&translator, query).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    apply_cors(response.headers_mut());
    response
}

async fn handle(
    translator: &ProxyTranslator,
    query: std::result::Result<Query<ProxyQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|rejection| {
        debug!("Rejected proxy query string: {}", rejection);
        ProxyError::InvalidRequest
    })?;
    let request = ProxyRequest::from_query(&query)?;
    let upstream = translator.forward(&request).await?;

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, upstream.content_type)],
        upstream.body,
    )
        .into_response())
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
