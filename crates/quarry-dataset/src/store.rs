//! The facade UI and dispatch layers talk to.
//!
//! One `DatasetStore` per home directory: it resolves dataset names to
//! files, keeps opened indexes in a registry, memoizes query evaluations,
//! and turns raw hits into display records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use quarry_core::error::SchemaError;
use quarry_core::format::{self, DisplayRecord};
use quarry_core::schema::Schema;
use quarry_search::cache::{CacheKey, QueryCache};
use quarry_search::{query, store};

use crate::dataset::{self, Dataset};
use crate::error::DatasetError;
use crate::registry::{IndexRegistry, RegistryEntry};

/// How long a memoized result list stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Outcome of an interactive search request. Blank input is a prompt state,
/// not a query; an empty result list is a real outcome of a real query. The
/// two render differently, so they are distinct values.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The query text was empty or all whitespace; nothing was evaluated.
    AwaitingQuery,
    /// Ranked, formatted hits. May be empty.
    Results(Vec<DisplayRecord>),
}

pub struct DatasetStore {
    home: PathBuf,
    registry: IndexRegistry,
    cache: QueryCache,
}

impl DatasetStore {
    /// A store over `home` with the default cache TTL.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        DatasetStore::with_cache_ttl(home, DEFAULT_CACHE_TTL)
    }

    pub fn with_cache_ttl(home: impl Into<PathBuf>, ttl: Duration) -> Self {
        DatasetStore {
            home: home.into(),
            registry: IndexRegistry::new(),
            cache: QueryCache::new(ttl),
        }
    }

    /// A store over the user's default home (`~/.quarry`).
    pub fn open_default() -> Self {
        DatasetStore::new(dataset::default_home())
    }

    pub fn dataset(&self, name: &str) -> Dataset {
        Dataset::new(name, &self.home)
    }

    /// Validate a schema document without touching any dataset.
    pub fn validate_schema(document: &str) -> Result<Schema, SchemaError> {
        Schema::from_document(document)
    }

    /// Evaluate `query_text` against the named dataset and return formatted
    /// display records, bounded by `limit`.
    pub fn search(
        &self,
        dataset_name: &str,
        query_text: &str,
        limit: usize,
    ) -> Result<SearchOutcome, DatasetError> {
        let trimmed = query_text.trim();
        if trimmed.is_empty() {
            return Ok(SearchOutcome::AwaitingQuery);
        }

        let entry = self.open_entry(dataset_name)?;
        let key = CacheKey {
            dataset: dataset_name.to_string(),
            query: trimmed.to_string(),
            limit,
        };
        let hits = self.cache.get_or_compute(key, || {
            query::search(&entry.handle, &entry.schema, trimmed, limit)
                .map_err(DatasetError::from)
        })?;

        let dataset = self.dataset(dataset_name);
        let results = hits
            .iter()
            .map(|record| {
                let mut display = format::format(&entry.schema, record);
                display.icon = display
                    .icon
                    .take()
                    .map(|icon| resolve_icon(&dataset, icon));
                display
            })
            .collect();
        Ok(SearchOutcome::Results(results))
    }

    /// Throw away the dataset's persisted index, open handle, and memoized
    /// results. The next search builds from current data.
    pub fn rebuild(&self, dataset_name: &str) -> Result<(), DatasetError> {
        let dataset = self.dataset(dataset_name);
        store::rebuild(dataset_name, &dataset.index_dir())?;
        self.registry.remove(dataset_name);
        self.cache.purge_dataset(dataset_name);
        info!("dataset '{}' reset; next search rebuilds the index", dataset_name);
        Ok(())
    }

    fn open_entry(&self, dataset_name: &str) -> Result<Arc<RegistryEntry>, DatasetError> {
        if let Some(entry) = self.registry.get(dataset_name) {
            return Ok(entry);
        }
        let dataset = self.dataset(dataset_name);
        let schema = dataset.load_schema()?;
        let handle = store::open_or_build(dataset_name, &schema, &dataset.index_dir(), || {
            dataset.load_records()
        })?;
        Ok(self.registry.insert(dataset_name, RegistryEntry { schema, handle }))
    }
}

/// Absolute icon values pass through; relative ones resolve against the
/// dataset's icon directory.
fn resolve_icon(dataset: &Dataset, icon: String) -> String {
    let path = std::path::Path::new(&icon);
    if path.is_absolute() {
        icon
    } else {
        dataset.icon_dir().join(path).to_string_lossy().into_owned()
    }
}
