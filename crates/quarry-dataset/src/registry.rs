//! Open index handles, keyed by dataset name.
//!
//! Owned by a [`DatasetStore`](crate::store::DatasetStore), so its lifecycle
//! is the store's lifecycle, not the process's.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use quarry_core::schema::Schema;
use quarry_search::store::IndexHandle;

/// A dataset's validated schema together with its opened index.
pub struct RegistryEntry {
    pub schema: Schema,
    pub handle: IndexHandle,
}

#[derive(Default)]
pub struct IndexRegistry {
    entries: RwLock<HashMap<String, Arc<RegistryEntry>>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        IndexRegistry::default()
    }

    pub fn get(&self, dataset: &str) -> Option<Arc<RegistryEntry>> {
        self.entries.read().get(dataset).cloned()
    }

    pub fn insert(&self, dataset: &str, entry: RegistryEntry) -> Arc<RegistryEntry> {
        let entry = Arc::new(entry);
        self.entries
            .write()
            .insert(dataset.to_string(), Arc::clone(&entry));
        entry
    }

    /// Drop a dataset's handle, releasing the open index. The next search
    /// reopens (or rebuilds) from disk.
    pub fn remove(&self, dataset: &str) {
        self.entries.write().remove(dataset);
    }
}
