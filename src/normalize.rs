//! Raw issue → flat row.

use serde_json::Value;

use crate::catalog::{Extract, FieldCatalog, LIST_DELIMITER};
use crate::model::{RawRecord, RowRecord};
use crate::util::adf::rich_text;

/// Attributes tried, in order, when an object lands in a single cell.
const DISPLAY_ATTRS: &[&str] = &["displayName", "name", "value", "key"];

/// Flatten one issue. Every catalog column is present in the result, in
/// catalog order; missing data becomes the column's fallback. The cell type
/// follows the column kind, not the JSON type of the source value.
pub fn normalize(raw: &RawRecord, catalog: &FieldCatalog) -> RowRecord {
    let mut row = RowRecord::with_capacity(catalog.len());
    for spec in catalog.iter() {
        let value = match extract(&spec.rule, raw) {
            Some(text) => spec.kind.cell(&text),
            None => spec.fallback.clone(),
        };
        row.insert(spec.column, value);
    }
    row
}

pub fn normalize_all(raws: &[RawRecord], catalog: &FieldCatalog) -> Vec<RowRecord> {
    raws.iter().map(|raw| normalize(raw, catalog)).collect()
}

fn extract(rule: &Extract, raw: &RawRecord) -> Option<String> {
    match rule {
        Extract::Key => non_blank(&raw.key).map(String::from),
        Extract::Scalar(field) => raw.field(field).and_then(text),
        Extract::Path { field, path } => walk(raw.field(field)?, path).and_then(text),
        Extract::RichText(field) => raw.field(field).and_then(rich_text),
        Extract::Flag { field, text } => raw
            .field(field)
            .filter(|v| truthy(v))
            .map(|_| text.to_string()),
        Extract::List {
            field,
            within,
            select,
        } => {
            let mut value = raw.field(field)?;
            if let Some(inner) = within {
                value = value.get(*inner)?;
            }
            let parts: Vec<String> = value
                .as_array()?
                .iter()
                .filter_map(|item| walk(item, select))
                .filter_map(text)
                .collect();
            (!parts.is_empty()).then(|| parts.join(LIST_DELIMITER))
        }
    }
}

fn walk<'a>(mut value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    for key in path {
        value = value.get(key)?;
    }
    (!value.is_null()).then_some(value)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_blank(s).map(String::from),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => DISPLAY_ATTRS
            .iter()
            .filter_map(|attr| obj.get(*attr))
            .find_map(text),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text).collect();
            (!parts.is_empty()).then(|| parts.join(LIST_DELIMITER))
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}

fn non_blank(s: &str) -> Option<&str> {
    (!s.trim().is_empty()).then_some(s)
}
