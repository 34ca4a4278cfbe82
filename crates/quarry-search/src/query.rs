//! Query evaluation: free text in, a bounded ranked list of records out.
//!
//! The boolean shape is AND across query terms, OR across searchable fields
//! within each term, so a document matches when every term is satisfied by
//! at least one field. Relevance is BM25 term-frequency scoring times the
//! matched field's weight; a schema with sortable fields overrides relevance
//! with a stable multi-key sort over stored values.

use std::cmp::Ordering;

use serde_json::Value;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, OwnedValue, Schema as IndexSchema};
use tantivy::{DocAddress, Document, TantivyDocument, Term};
use tracing::debug;

use quarry_core::field::{FieldSpec, IndexKind};
use quarry_core::record::{self, Record};
use quarry_core::schema::Schema;
use quarry_core::tokenize;

use crate::error::SearchError;
use crate::store::IndexHandle;

/// Result-set bound when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 20;

/// Characters trimmed from the edges of query terms. Interior punctuation
/// (hyphens, apostrophes mid-word) survives.
pub const TERM_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '\'', '"', '(', ')', '[', ']', '{', '}', '<', '>', '`', '~',
];

/// Split query text into search terms: whitespace-separated, punctuation
/// trimmed from the edges, empties dropped.
pub fn parse_terms(query_text: &str) -> Vec<String> {
    query_text
        .split_whitespace()
        .map(|raw| raw.trim_matches(TERM_PUNCTUATION).to_string())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Evaluate `query_text` against an opened index. An empty term list
/// matches nothing; the zero-length-query case is the caller's to reject
/// before this layer.
pub fn search(
    handle: &IndexHandle,
    schema: &Schema,
    query_text: &str,
    limit: usize,
) -> Result<Vec<Record>, SearchError> {
    let terms = parse_terms(query_text);
    if terms.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let index_schema = handle.index().schema();
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(terms.len());
    for term in &terms {
        let Some(group) = term_group(schema, &index_schema, term)? else {
            // A term no field can match makes the whole conjunction empty.
            debug!("term '{}' is unmatchable, returning no results", term);
            return Ok(Vec::new());
        };
        clauses.push((Occur::Must, group));
    }
    let query = BooleanQuery::new(clauses);
    let searcher = handle.searcher();

    let sort_fields: Vec<&FieldSpec> = schema.sortable_fields().collect();
    let hits = if sort_fields.is_empty() {
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(doc_to_record(&index_schema, &doc));
        }
        hits
    } else {
        // Sortable fields replace relevance wholesale, so the full match set
        // is collected and ordered by stored values before truncation.
        let mut addresses: Vec<DocAddress> =
            searcher.search(&query, &DocSetCollector)?.into_iter().collect();
        addresses.sort_unstable();
        let mut hits = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(doc_to_record(&index_schema, &doc));
        }
        hits.sort_by(|a, b| compare_records(a, b, &sort_fields));
        hits.truncate(limit);
        hits
    };

    debug!("query '{}' returned {} hits", query_text, hits.len());
    Ok(hits)
}

/// The OR-across-fields group for one term, boosted per field weight, or
/// `None` when no searchable field can match the term at all.
fn term_group(
    schema: &Schema,
    index_schema: &IndexSchema,
    term: &str,
) -> Result<Option<Box<dyn Query>>, SearchError> {
    let mut group: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for spec in schema.searchable_fields() {
        let field = index_schema
            .get_field(&spec.name)
            .map_err(|_| SearchError::SchemaMismatch {
                reason: format!("searchable field '{}' missing from the index", spec.name),
            })?;
        let Some(clause) = term_clause(spec, field, term) else {
            continue;
        };
        let boosted: Box<dyn Query> = if (spec.weight - 1.0).abs() < f32::EPSILON {
            clause
        } else {
            Box::new(BoostQuery::new(clause, spec.weight))
        };
        group.push((Occur::Should, boosted));
    }
    if group.is_empty() {
        return Ok(None);
    }
    Ok(Some(Box::new(BooleanQuery::new(group))))
}

/// The matching rule for one term against one field, by index kind.
fn term_clause(spec: &FieldSpec, field: Field, term: &str) -> Option<Box<dyn Query>> {
    match spec.index_kind {
        IndexKind::Ngram => {
            ngram_clause(field, &term.to_lowercase(), spec.ngram_min, spec.ngram_max)
        }
        IndexKind::NgramWords => {
            // Indexed ngrams never cross word boundaries, so the term splits
            // into words and every word must match.
            let lowered = term.to_lowercase();
            let words: Vec<&str> = lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect();
            if words.is_empty() {
                return None;
            }
            let mut parts = Vec::with_capacity(words.len());
            for word in words {
                parts.push(ngram_clause(field, word, spec.ngram_min, spec.ngram_max)?);
            }
            Some(all_of(parts))
        }
        IndexKind::Phrase => {
            let lowered = term.to_lowercase();
            let tokens: Vec<Box<dyn Query>> = lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .map(|t| term_query(field, t, IndexRecordOption::WithFreqs))
                .collect();
            if tokens.is_empty() {
                return None;
            }
            Some(all_of(tokens))
        }
        IndexKind::Keyword => {
            let token = if spec.keyword_case_insensitive {
                term.to_lowercase()
            } else {
                term.to_string()
            };
            Some(term_query(field, &token, IndexRecordOption::Basic))
        }
        IndexKind::Stored | IndexKind::Numeric => None,
    }
}

/// Ngram matching for one contiguous piece of text: a term inside the ngram
/// range is itself an indexed ngram; a longer term decomposes into all of
/// its max-length windows, all required; a shorter term cannot match.
fn ngram_clause(field: Field, text: &str, min: usize, max: usize) -> Option<Box<dyn Query>> {
    let len = text.chars().count();
    if len < min {
        return None;
    }
    if len <= max {
        return Some(term_query(field, text, IndexRecordOption::WithFreqs));
    }
    let windows = tokenize::char_windows(text, max)
        .into_iter()
        .map(|window| term_query(field, &window, IndexRecordOption::WithFreqs))
        .collect::<Vec<_>>();
    Some(all_of(windows))
}

fn term_query(field: Field, text: &str, option: IndexRecordOption) -> Box<dyn Query> {
    Box::new(TermQuery::new(Term::from_field_text(field, text), option))
}

fn all_of(parts: Vec<Box<dyn Query>>) -> Box<dyn Query> {
    if parts.len() == 1 {
        return parts.into_iter().next().expect("len checked");
    }
    Box::new(BooleanQuery::new(
        parts.into_iter().map(|q| (Occur::Must, q)).collect(),
    ))
}

/// Reconstruct a record from a document's stored values. Whole numbers come
/// back as integers so templates render `1974`, not `1974.0`.
fn doc_to_record(index_schema: &IndexSchema, doc: &TantivyDocument) -> Record {
    let named = doc.to_named_doc(index_schema);
    let mut record = Record::new();
    for (name, values) in named.0 {
        let Some(value) = values.into_iter().next() else {
            continue;
        };
        let json = match value {
            OwnedValue::Str(text) => Value::String(text),
            OwnedValue::F64(number) => json_number(number),
            OwnedValue::U64(number) => Value::from(number),
            OwnedValue::I64(number) => Value::from(number),
            OwnedValue::Bool(flag) => Value::Bool(flag),
            _ => continue,
        };
        record.insert(name, json);
    }
    record
}

fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Stable multi-key comparison over the sortable fields, declaration order.
/// Missing values sort last regardless of direction.
fn compare_records(a: &Record, b: &Record, keys: &[&FieldSpec]) -> Ordering {
    for spec in keys {
        let ord = match (present(a.get(&spec.name)), present(b.get(&spec.name))) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                if spec.sort_ascending { ord } else { ord.reverse() }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => {
            let x = record::display_text(a).unwrap_or_default().to_lowercase();
            let y = record::display_text(b).unwrap_or_default().to_lowercase();
            x.cmp(&y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terms_split_on_whitespace_and_trim_punctuation() {
        assert_eq!(parse_terms("god father"), vec!["god", "father"]);
        assert_eq!(parse_terms("  \"quoted\"  (term)! "), vec!["quoted", "term"]);
    }

    #[test]
    fn interior_punctuation_survives() {
        assert_eq!(parse_terms("state-of-the-art"), vec!["state-of-the-art"]);
        assert_eq!(parse_terms("o'brien,"), vec!["o'brien"]);
    }

    #[test]
    fn empty_input_yields_no_terms() {
        assert!(parse_terms("").is_empty());
        assert!(parse_terms("   ").is_empty());
        assert!(parse_terms("?!.,").is_empty());
    }

    #[test]
    fn whole_numbers_come_back_as_integers() {
        assert_eq!(json_number(1974.0), json!(1974));
        assert_eq!(json_number(8.7), json!(8.7));
    }

    #[test]
    fn missing_sort_values_sort_last_in_both_directions() {
        let mut spec = quarry_core::field::FieldSpec::new(
            "year",
            quarry_core::field::IndexKind::Numeric,
        );
        spec.sortable = true;

        let with: Record = [("year".to_string(), json!(1994))].into_iter().collect();
        let without = Record::new();

        for ascending in [true, false] {
            spec.sort_ascending = ascending;
            assert_eq!(compare_records(&with, &without, &[&spec]), Ordering::Less);
            assert_eq!(compare_records(&without, &with, &[&spec]), Ordering::Greater);
        }
    }
}
