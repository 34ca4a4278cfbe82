use serde::Deserialize;

use crate::error::SchemaError;

/// How a field participates in indexing. Exactly one kind per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Stored for retrieval only; never matched by free-text terms.
    Stored,
    /// Character n-grams over the whole value, spaces included. Matches any
    /// substring whose length falls inside the configured range.
    Ngram,
    /// The value is split into words first; n-grams are taken within each
    /// word, so matches never cross word boundaries.
    NgramWords,
    /// Word tokens for case-insensitive relevance matching.
    Phrase,
    /// An exact-match token set, split on the configured delimiter.
    Keyword,
    /// A sortable scalar. Participates in sorting, not in text matching.
    Numeric,
}

/// Separator for [`IndexKind::Keyword`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordDelimiter {
    /// Split on commas; surrounding whitespace is trimmed from each token.
    Comma,
    /// Split on whitespace runs.
    Whitespace,
}

/// One declared field of a dataset schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub index_kind: IndexKind,
    /// Shortest matchable n-gram (Ngram/NgramWords only).
    pub ngram_min: usize,
    /// Longest matchable n-gram (Ngram/NgramWords only).
    pub ngram_max: usize,
    pub keyword_case_insensitive: bool,
    pub keyword_delimiter: KeywordDelimiter,
    /// Relative ranking boost when this field matches. Must be positive.
    pub weight: f32,
    /// Whether the raw value is persisted for retrieval and templates.
    pub stored: bool,
    /// Sortable fields override relevance ranking. Requires `stored`.
    pub sortable: bool,
    pub sort_ascending: bool,
}

impl FieldSpec {
    /// A field with the given kind and every other attribute at its default.
    pub fn new(name: impl Into<String>, index_kind: IndexKind) -> Self {
        FieldSpec {
            name: name.into(),
            index_kind,
            ngram_min: 2,
            ngram_max: 10,
            keyword_case_insensitive: true,
            keyword_delimiter: KeywordDelimiter::Comma,
            weight: 1.0,
            stored: true,
            sortable: false,
            sort_ascending: true,
        }
    }
}

fn default_ngram_min() -> usize {
    2
}

fn default_ngram_max() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f32 {
    1.0
}

/// Wire form of one field entry in a schema document. The `type_is_*` flags
/// mirror the dataset setting format; exactly one must be set.
#[derive(Debug, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(default)]
    pub type_is_store: bool,
    #[serde(default)]
    pub type_is_ngram: bool,
    #[serde(default)]
    pub type_is_ngram_words: bool,
    #[serde(default)]
    pub type_is_phrase: bool,
    #[serde(default)]
    pub type_is_keyword: bool,
    #[serde(default)]
    pub type_is_numeric: bool,
    #[serde(default = "default_ngram_min")]
    pub ngram_minsize: usize,
    #[serde(default = "default_ngram_max")]
    pub ngram_maxsize: usize,
    #[serde(default = "default_true")]
    pub keyword_lowercase: bool,
    #[serde(default = "default_true")]
    pub keyword_commas: bool,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default = "default_true")]
    pub stored: bool,
    #[serde(default)]
    pub is_sortable: bool,
    #[serde(default = "default_true")]
    pub is_sort_ascending: bool,
}

impl FieldDocument {
    /// Resolve the flag set into a [`FieldSpec`]. Zero flags and two-or-more
    /// flags are both rejected.
    pub fn into_spec(self) -> Result<FieldSpec, SchemaError> {
        let flags = [
            (self.type_is_store, IndexKind::Stored),
            (self.type_is_ngram, IndexKind::Ngram),
            (self.type_is_ngram_words, IndexKind::NgramWords),
            (self.type_is_phrase, IndexKind::Phrase),
            (self.type_is_keyword, IndexKind::Keyword),
            (self.type_is_numeric, IndexKind::Numeric),
        ];
        let mut selected = flags.iter().filter(|(on, _)| *on).map(|(_, kind)| *kind);
        let index_kind = match (selected.next(), selected.next()) {
            (Some(kind), None) => kind,
            _ => return Err(SchemaError::InvalidIndexKind { name: self.name }),
        };

        Ok(FieldSpec {
            name: self.name,
            index_kind,
            ngram_min: self.ngram_minsize,
            ngram_max: self.ngram_maxsize,
            keyword_case_insensitive: self.keyword_lowercase,
            keyword_delimiter: if self.keyword_commas {
                KeywordDelimiter::Comma
            } else {
                KeywordDelimiter::Whitespace
            },
            weight: self.weight,
            // A store-only field is stored by definition.
            stored: self.stored || index_kind == IndexKind::Stored,
            sortable: self.is_sortable,
            sort_ascending: self.is_sort_ascending,
        })
    }
}
