use pmogateway::QueueItem;
use serde::Serialize;

/// Ordered list of playable tracks
///
/// Built wholesale from one search response and never edited afterwards:
/// a new search replaces the whole queue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Keep only playable items, in their original order
    pub fn from_items(items: impl IntoIterator<Item = QueueItem>) -> Self {
        Self {
            items: items.into_iter().filter(QueueItem::is_playable).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}
