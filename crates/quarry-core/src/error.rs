use thiserror::Error;

/// A schema-document invariant was violated.
///
/// Raised once, at construction; a [`Schema`](crate::schema::Schema) that
/// exists has passed every check, so downstream components never
/// re-validate. Nothing here is auto-repaired; the source document must be
/// fixed by its author.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("duplicate field name {name:?}")]
    DuplicateField { name: String },

    #[error(
        "field {name:?} must select exactly one index type \
         (store, ngram, ngram_words, phrase, keyword, numeric)"
    )]
    InvalidIndexKind { name: String },

    #[error("field {name:?} has an invalid ngram range {min}..={max}")]
    InvalidNgramRange { name: String, min: usize, max: usize },

    #[error("field {name:?} has a non-positive weight {weight}")]
    InvalidWeight { name: String, weight: f32 },

    #[error("field {name:?} is sortable but not stored")]
    SortableNotStored { name: String },

    #[error("{slot} template references unknown field {field:?}")]
    UnknownTemplateField { slot: &'static str, field: String },

    #[error("{slot} template references field {field:?}, which is not stored")]
    UnstoredTemplateField { slot: &'static str, field: String },

    #[error("no title template and no stored field named \"title\"")]
    MissingTitleField,
}

/// A record-set document could not be read as a list of records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record set is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record set must be a JSON array of objects")]
    NotAnArray,

    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
}
