use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::HistorySeries;

/// Latest scraped history per item. Entries are replaced whole; a reader
/// holding an `Arc` keeps the series it got even if a newer one lands.
#[derive(Debug, Default)]
pub struct HistoryCache {
    entries: RwLock<HashMap<String, Arc<HistorySeries>>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, series: HistorySeries) {
        let key = series.item_id.clone();
        self.entries.write().insert(key, Arc::new(series));
    }

    pub fn get(&self, item_id: &str) -> Option<Arc<HistorySeries>> {
        self.entries.read().get(item_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
