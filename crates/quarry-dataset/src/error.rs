use std::path::PathBuf;

use thiserror::Error;

use quarry_core::error::{RecordError, SchemaError};
use quarry_search::error::SearchError;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed schema for dataset '{dataset}': {source}")]
    MalformedSchema {
        dataset: String,
        #[source]
        source: SchemaError,
    },

    #[error("malformed record set for dataset '{dataset}': {source}")]
    MalformedRecordSet {
        dataset: String,
        #[source]
        source: RecordError,
    },

    /// The dataset's source file is missing and nothing can supply it here;
    /// acquiring data is the caller's concern.
    #[error("dataset '{dataset}' has no file at {}", .path.display())]
    DataUnavailable { dataset: String, path: PathBuf },

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
