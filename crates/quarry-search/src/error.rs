use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The persisted index was built from a different schema. Fatal to the
    /// current call; recoverable by a rebuild.
    #[error("index does not match the current schema: {reason}")]
    SchemaMismatch { reason: String },

    /// A record could not be transformed per its field's index kind. The
    /// partial index directory has already been torn down, so the dataset is
    /// back in the clean "not yet built" state.
    #[error("index build failed at record {record}: {reason}")]
    BuildFailure { record: usize, reason: String },

    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
