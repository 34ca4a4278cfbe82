//! The validated dataset schema and its mapping onto a Tantivy index schema.
//!
//! Validation happens exactly once, at construction. Every invariant failure
//! names the offending field or template; nothing is silently repaired.

use std::collections::HashSet;

use serde::Deserialize;
use tantivy::schema::{
    IndexRecordOption, NumericOptions, Schema as IndexSchema, TextFieldIndexing, TextOptions,
};

use crate::error::SchemaError;
use crate::field::{FieldDocument, FieldSpec, IndexKind};
use crate::format::{self, Templates};

/// Wire form of a schema document: the per-field settings plus the five
/// display templates.
#[derive(Debug, Deserialize)]
pub struct SchemaDocument {
    pub fields: Vec<FieldDocument>,
    #[serde(default)]
    pub title_field: Option<String>,
    #[serde(default)]
    pub subtitle_field: Option<String>,
    #[serde(default)]
    pub arg_field: Option<String>,
    #[serde(default)]
    pub autocomplete_field: Option<String>,
    #[serde(default)]
    pub icon_field: Option<String>,
}

/// A validated dataset schema: the ordered field specs, the display
/// templates, and the derived field views, computed once and reused for the
/// schema's lifetime.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    templates: Templates,
    stored: Vec<usize>,
    searchable: Vec<usize>,
    sortable: Vec<usize>,
}

impl Schema {
    /// Validate `fields` and `templates` into a schema.
    pub fn new(fields: Vec<FieldSpec>, templates: Templates) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for spec in &fields {
            if !seen.insert(spec.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    name: spec.name.clone(),
                });
            }
            if matches!(spec.index_kind, IndexKind::Ngram | IndexKind::NgramWords)
                && (spec.ngram_min == 0 || spec.ngram_min > spec.ngram_max)
            {
                return Err(SchemaError::InvalidNgramRange {
                    name: spec.name.clone(),
                    min: spec.ngram_min,
                    max: spec.ngram_max,
                });
            }
            if !(spec.weight > 0.0) {
                return Err(SchemaError::InvalidWeight {
                    name: spec.name.clone(),
                    weight: spec.weight,
                });
            }
            if spec.sortable && !spec.stored {
                return Err(SchemaError::SortableNotStored {
                    name: spec.name.clone(),
                });
            }
        }

        for (slot, template) in templates.slots() {
            let Some(template) = template else { continue };
            for placeholder in format::placeholders(template) {
                match fields.iter().find(|f| f.name == placeholder) {
                    None => {
                        return Err(SchemaError::UnknownTemplateField {
                            slot,
                            field: placeholder,
                        });
                    }
                    Some(spec) if !spec.stored => {
                        return Err(SchemaError::UnstoredTemplateField {
                            slot,
                            field: placeholder,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        // Without a title template the title slot falls back to a record
        // field literally named "title", which must therefore exist.
        if templates.title.is_none()
            && !fields.iter().any(|f| f.name == "title" && f.stored)
        {
            return Err(SchemaError::MissingTitleField);
        }

        let stored = indices(&fields, |f| f.stored);
        let sortable = indices(&fields, |f| f.sortable);

        // Searchable order: ngram kinds, then phrase, then keyword, then
        // numeric, declaration order within each group.
        let mut searchable = indices(&fields, |f| {
            matches!(f.index_kind, IndexKind::Ngram | IndexKind::NgramWords)
        });
        searchable.extend(indices(&fields, |f| f.index_kind == IndexKind::Phrase));
        searchable.extend(indices(&fields, |f| f.index_kind == IndexKind::Keyword));
        searchable.extend(indices(&fields, |f| f.index_kind == IndexKind::Numeric));

        Ok(Schema {
            fields,
            templates,
            stored,
            searchable,
            sortable,
        })
    }

    /// Deserialize and validate a JSON schema document.
    pub fn from_document(json: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        let fields = document
            .fields
            .into_iter()
            .map(FieldDocument::into_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let templates = Templates {
            title: document.title_field,
            subtitle: document.subtitle_field,
            arg: document.arg_field,
            autocomplete: document.autocomplete_field,
            icon: document.icon_field,
        };
        Schema::new(fields, templates)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Fields whose raw values are persisted for retrieval.
    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.stored.iter().map(|&i| &self.fields[i])
    }

    /// Fields eligible to participate in query evaluation: everything except
    /// store-only fields, ordered ngram, phrase, keyword, numeric.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.searchable.iter().map(|&i| &self.fields[i])
    }

    /// Stored fields that override relevance ranking, in declaration order.
    pub fn sortable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.sortable.iter().map(|&i| &self.fields[i])
    }

    /// The static Tantivy schema this dataset schema maps to. One index
    /// field per declared field; fields that are neither indexed nor stored
    /// still appear (store-only fields with `stored` forced on keep this
    /// from arising in practice).
    pub fn to_index_schema(&self) -> IndexSchema {
        let mut builder = IndexSchema::builder();
        for spec in &self.fields {
            match spec.index_kind {
                IndexKind::Stored => {
                    builder.add_text_field(&spec.name, TextOptions::default().set_stored());
                }
                IndexKind::Ngram | IndexKind::NgramWords | IndexKind::Keyword => {
                    let name = crate::tokenize::tokenizer_name(spec)
                        .expect("tokenized kinds always name a tokenizer");
                    let indexing = TextFieldIndexing::default()
                        .set_tokenizer(&name)
                        .set_index_option(IndexRecordOption::WithFreqs);
                    let mut options = TextOptions::default().set_indexing_options(indexing);
                    if spec.stored {
                        options = options.set_stored();
                    }
                    builder.add_text_field(&spec.name, options);
                }
                IndexKind::Phrase => {
                    let indexing = TextFieldIndexing::default()
                        .set_tokenizer("default")
                        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
                    let mut options = TextOptions::default().set_indexing_options(indexing);
                    if spec.stored {
                        options = options.set_stored();
                    }
                    builder.add_text_field(&spec.name, options);
                }
                IndexKind::Numeric => {
                    let mut options = NumericOptions::default().set_fast();
                    if spec.stored {
                        options = options.set_stored();
                    }
                    builder.add_f64_field(&spec.name, options);
                }
            }
        }
        builder.build()
    }
}

fn indices(fields: &[FieldSpec], keep: impl Fn(&FieldSpec) -> bool) -> Vec<usize> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| keep(f))
        .map(|(i, _)| i)
        .collect()
}
