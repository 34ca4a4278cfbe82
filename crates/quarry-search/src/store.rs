//! On-disk index lifecycle: build, open, verify, rebuild.
//!
//! The invariants here are directional: "no index" is always a safe,
//! recoverable state, while a half-written index must never be left
//! standing. Every build failure tears the partial directory down before
//! the error propagates, so a retry starts clean.

use std::path::Path;

use serde_json::Value;
use tantivy::schema::{Field, Schema as IndexSchema};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument};
use tracing::{info, warn};

use quarry_core::field::{FieldSpec, IndexKind};
use quarry_core::record::{self, Record};
use quarry_core::schema::Schema;
use quarry_core::tokenize;

use crate::error::SearchError;

/// An opened dataset index, ready for concurrent reads.
pub struct IndexHandle {
    index: Index,
    reader: IndexReader,
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle").finish_non_exhaustive()
    }
}

impl IndexHandle {
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn searcher(&self) -> tantivy::Searcher {
        self.reader.searcher()
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// True when a persisted index exists at `index_dir`.
pub fn index_exists(index_dir: &Path) -> bool {
    index_dir.join("meta.json").exists()
}

/// Open the dataset's index if one is persisted, otherwise load the records
/// and build it.
///
/// The records closure runs only on the build path, so reopening an
/// existing index never touches the record source.
pub fn open_or_build<E, F>(
    dataset_id: &str,
    schema: &Schema,
    index_dir: &Path,
    load_records: F,
) -> Result<IndexHandle, E>
where
    E: From<SearchError>,
    F: FnOnce() -> Result<Vec<Record>, E>,
{
    if index_exists(index_dir) {
        return open(schema, index_dir).map_err(E::from);
    }
    let records = load_records()?;
    build(dataset_id, schema, &records, index_dir).map_err(E::from)
}

/// Delete the persisted index unconditionally. The caller re-invokes
/// [`open_or_build`] to get a fresh one.
pub fn rebuild(dataset_id: &str, index_dir: &Path) -> Result<(), SearchError> {
    if index_dir.exists() {
        std::fs::remove_dir_all(index_dir)?;
        info!("dropped index for dataset '{}' at {}", dataset_id, index_dir.display());
    }
    Ok(())
}

fn open(schema: &Schema, index_dir: &Path) -> Result<IndexHandle, SearchError> {
    let index = Index::open_in_dir(index_dir)?;
    verify_schema(&schema.to_index_schema(), &index.schema())?;
    tokenize::register_tokenizers(&index, schema);
    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    Ok(IndexHandle { index, reader })
}

fn build(
    dataset_id: &str,
    schema: &Schema,
    records: &[Record],
    index_dir: &Path,
) -> Result<IndexHandle, SearchError> {
    info!("building index for dataset '{}' ({} records)", dataset_id, records.len());
    std::fs::create_dir_all(index_dir)?;
    let index = match Index::create_in_dir(index_dir, schema.to_index_schema()) {
        Ok(index) => index,
        // A concurrent builder won the race on this path; serve its result
        // instead of clobbering it.
        Err(tantivy::TantivyError::IndexAlreadyExists) => return open(schema, index_dir),
        Err(err) => return Err(err.into()),
    };
    // From here the directory is exclusively ours: any failure tears it
    // down so a retry starts from "not yet built".
    match build_inner(&index, schema, records) {
        Ok(handle) => Ok(handle),
        Err(err) => {
            teardown(index_dir);
            Err(err)
        }
    }
}

fn build_inner(
    index: &Index,
    schema: &Schema,
    records: &[Record],
) -> Result<IndexHandle, SearchError> {
    tokenize::register_tokenizers(index, schema);

    let index_schema = index.schema();
    let mut handles = Vec::with_capacity(schema.fields().len());
    for spec in schema.fields() {
        handles.push((spec, index_schema.get_field(&spec.name)?));
    }

    // The writer's worker threads parallelize per-record tokenization; the
    // commit below is the single atomic step that makes the index visible.
    let mut writer = index.writer(50_000_000)?;
    for (position, record) in records.iter().enumerate() {
        let doc = build_document(&handles, record, position)?;
        writer.add_document(doc)?;
    }
    writer.commit()?;
    drop(writer);

    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    Ok(IndexHandle {
        index: index.clone(),
        reader,
    })
}

/// One indexed document per record. Only fields declared by the schema
/// contribute; everything else in the record is dropped.
fn build_document(
    handles: &[(&FieldSpec, Field)],
    record: &Record,
    position: usize,
) -> Result<TantivyDocument, SearchError> {
    let mut doc = TantivyDocument::default();
    for (spec, field) in handles {
        let Some(value) = record.get(&spec.name) else {
            continue;
        };
        match spec.index_kind {
            IndexKind::Numeric => {
                let Some(value) = numeric_value(value) else {
                    if value.is_null() {
                        continue;
                    }
                    return Err(SearchError::BuildFailure {
                        record: position,
                        reason: format!(
                            "field '{}' expects a numeric value, got {}",
                            spec.name, value
                        ),
                    });
                };
                doc.add_f64(*field, value);
            }
            _ => {
                if let Some(text) = index_text(&spec.name, value, position)? {
                    doc.add_text(*field, text);
                }
            }
        }
    }
    Ok(doc)
}

/// Text form of a record value for indexing. Stricter than the display
/// conversion: container-valued entries other than flat scalar arrays fail
/// the build instead of silently vanishing.
fn index_text(
    field_name: &str,
    value: &Value,
    position: usize,
) -> Result<Option<String>, SearchError> {
    let unsupported = |shape: &str| SearchError::BuildFailure {
        record: position,
        reason: format!("field '{field_name}' has an unsupported {shape} value"),
    };
    match value {
        Value::Null => Ok(None),
        Value::Object(_) => Err(unsupported("object")),
        Value::Array(items) if items.iter().any(|i| i.is_array() || i.is_object()) => {
            Err(unsupported("nested array"))
        }
        other => Ok(record::display_text(other)),
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Compare the persisted index layout against the schema's expected layout.
fn verify_schema(expected: &IndexSchema, actual: &IndexSchema) -> Result<(), SearchError> {
    let expected_fp = fingerprint(expected);
    let actual_fp = fingerprint(actual);
    if expected_fp == actual_fp {
        return Ok(());
    }
    let reason = expected_fp
        .iter()
        .zip(actual_fp.iter())
        .find(|(e, a)| e != a)
        .map(|(e, a)| format!("expected {e}, found {a}"))
        .unwrap_or_else(|| {
            format!(
                "field count changed from {} to {}",
                actual_fp.len(),
                expected_fp.len()
            )
        });
    Err(SearchError::SchemaMismatch { reason })
}

fn fingerprint(schema: &IndexSchema) -> Vec<String> {
    schema
        .fields()
        .map(|(_, entry)| format!("{} [{:?}]", entry.name(), entry.field_type()))
        .collect()
}

fn teardown(index_dir: &Path) {
    if let Err(err) = std::fs::remove_dir_all(index_dir) {
        warn!(
            "failed to tear down partial index at {}: {}",
            index_dir.display(),
            err
        );
    }
}
