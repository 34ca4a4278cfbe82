//! Maps a raw result record onto the five user-facing display slots.
//!
//! Each slot is driven by an optional template. An absent template falls
//! back to the record field with the slot's literal name; a present template
//! has every `{field}` placeholder substituted with the record's value for
//! that field. Templates were validated against the schema, not against any
//! particular record, so a field missing from one record renders as the
//! empty string rather than failing.

use crate::record::{self, Record};
use crate::schema::Schema;

/// The five display templates a schema may declare.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Templates {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub arg: Option<String>,
    pub autocomplete: Option<String>,
    pub icon: Option<String>,
}

impl Templates {
    /// Slot name / template pairs, in display order.
    pub fn slots(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("title", self.title.as_deref()),
            ("subtitle", self.subtitle.as_deref()),
            ("arg", self.arg.as_deref()),
            ("autocomplete", self.autocomplete.as_deref()),
            ("icon", self.icon.as_deref()),
        ]
    }
}

/// A search hit mapped to display fields. Slots whose formatted value
/// normalizes to the empty string are absent, so a consumer can distinguish
/// "nothing to show" without comparing strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayRecord {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub arg: Option<String>,
    pub autocomplete: Option<String>,
    pub icon: Option<String>,
}

/// Format one record into its display slots.
pub fn format(schema: &Schema, record: &Record) -> DisplayRecord {
    let mut display = DisplayRecord::default();
    for (slot, template) in schema.templates().slots() {
        let value = match template {
            Some(template) => render_template(template, record),
            None => record
                .get(slot)
                .and_then(record::display_text)
                .unwrap_or_default(),
        };
        let value = if value.trim().is_empty() { None } else { Some(value) };
        match slot {
            "title" => display.title = value,
            "subtitle" => display.subtitle = value,
            "arg" => display.arg = value,
            "autocomplete" => display.autocomplete = value,
            "icon" => display.icon = value,
            _ => unreachable!("slots() enumerates the five display slots"),
        }
    }
    display
}

/// Substitute every `{field}` placeholder in `template` with the record's
/// value for that field; literal text is kept as-is and fields the record
/// lacks become the empty string.
pub fn render_template(template: &str, record: &Record) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((literal, after_brace)) = rest.split_once('{') {
        out.push_str(literal);
        match after_brace.split_once('}') {
            Some((name, tail)) => {
                if let Some(text) = record.get(name).and_then(record::display_text) {
                    out.push_str(&text);
                }
                rest = tail;
            }
            None => {
                // Unterminated brace: keep it literal.
                out.push('{');
                rest = after_brace;
            }
        }
    }
    out.push_str(rest);
    out
}

/// The placeholder names a template references, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some((_, after_brace)) = rest.split_once('{') {
        match after_brace.split_once('}') {
            Some((name, tail)) => {
                names.push(name.to_string());
                rest = tail;
            }
            None => break,
        }
    }
    names
}
