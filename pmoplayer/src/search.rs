//! Search orchestration: query → queue of playable items

use crate::client::MetadataSource;
use crate::error::Result;
use crate::queue::Queue;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SearchOrchestrator {
    source: Arc<dyn MetadataSource>,
}

impl SearchOrchestrator {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Run one search
    ///
    /// A blank query returns `Ok(None)` without any request. Otherwise the
    /// queue holds the playable results in upstream order, possibly empty.
    pub async fn search(&self, query: &str) -> Result<Option<Queue>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring blank search");
            return Ok(None);
        }

        let items = self.source.search(query).await?;
        let total = items.len();
        let queue = Queue::from_items(items);

        info!(query = %query, total, playable = queue.len(), "Search completed");
        Ok(Some(queue))
    }
}
