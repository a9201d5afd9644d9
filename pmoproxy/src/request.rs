//! Normalisation des paramètres de requête du proxy

use crate::error::{ProxyError, Result};
use serde::Deserialize;

/// Paramètres bruts de `GET /api/proxy`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    /// `id` est accepté comme alias
    #[serde(default, rename = "videoId", alias = "id")]
    pub video_id: Option<String>,
}

/// Requête proxy validée
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRequest {
    Search { query: String },
    Stream { id: String },
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ProxyRequest {
    /// Valide les paramètres bruts
    ///
    /// ```
    /// use pmoproxy::{ProxyQuery, ProxyRequest};
    ///
    /// let query = ProxyQuery {
    ///     endpoint: Some("search".into()),
    ///     q: Some(" lofi ".into()),
    ///     video_id: None,
    /// };
    /// assert_eq!(
    ///     ProxyRequest::from_query(&query).unwrap(),
    ///     ProxyRequest::Search { query: "lofi".into() }
    /// );
    /// ```
    pub fn from_query(query: &ProxyQuery) -> Result<Self> {
        let endpoint = query.endpoint.as_deref().map(str::trim);
        match endpoint {
            Some("search") => non_blank(&query.q)
                .map(|query| ProxyRequest::Search { query })
                .ok_or(ProxyError::InvalidRequest),
            Some("stream") => non_blank(&query.video_id)
                .map(|id| ProxyRequest::Stream { id })
                .ok_or(ProxyError::InvalidRequest),
            _ => Err(ProxyError::InvalidRequest),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            ProxyRequest::Search { .. } => "search",
            ProxyRequest::Stream { .. } => "stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(endpoint: Option<&str>, q: Option<&str>, video_id: Option<&str>) -> ProxyQuery {
        ProxyQuery {
            endpoint: endpoint.map(String::from),
            q: q.map(String::from),
            video_id: video_id.map(String::from),
        }
    }

    #[test]
    fn test_stream_request() {
        assert_eq!(
            ProxyRequest::from_query(&query(Some("stream"), None, Some("abc"))).unwrap(),
            ProxyRequest::Stream { id: "abc".into() }
        );
    }

    #[test]
    fn test_invalid_requests() {
        let cases = [
            query(None, Some("lofi"), None),
            query(Some("search"), None, Some("abc")),
            query(Some("search"), Some("   "), None),
            query(Some("stream"), Some("lofi"), None),
            query(Some("stream"), None, Some("")),
            query(Some("playlists"), Some("lofi"), Some("abc")),
        ];
        for case in &cases {
            assert!(
                matches!(ProxyRequest::from_query(case), Err(ProxyError::InvalidRequest)),
                "{:?} should be rejected",
                case
            );
        }
    }

    #[test]
    fn test_id_alias() {
        let parsed: ProxyQuery =
            serde_json::from_value(serde_json::json!({"endpoint": "stream", "id": "xyz"}))
                .unwrap();
        assert_eq!(parsed.video_id.as_deref(), Some("xyz"));
    }
}
