//! # Document Context & Field Resolution
//!
//! [`DocumentContext`] wraps the merged LC/invoice/transport-document
//! data for one evaluation as an immutable JSON tree. Rules address
//! fields by dotted paths (`"invoice.amount"`, `"transport.legs.0.mode"`);
//! [`DocumentContext::resolve`] walks the tree and returns a
//! [`FieldLookup`].
//!
//! ## Absence Is a First-Class Outcome
//!
//! Any dead end — unknown key, index out of range, indexing into a
//! scalar — resolves to [`FieldLookup::Missing`], never an error. The
//! rule evaluator turns missing data into "not applicable", so a lookup
//! failure must be an ordinary value the evaluator can branch on.

use serde_json::Value;

/// Result of resolving a dotted field path against a document context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldLookup<'a> {
    /// The path resolved to a value.
    Found(&'a Value),
    /// The path dead-ended somewhere in the tree.
    Missing,
}

impl<'a> FieldLookup<'a> {
    /// The resolved value, if any.
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Self::Found(v) => Some(v),
            Self::Missing => None,
        }
    }

    /// Whether the path resolved.
    pub fn is_found(self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Immutable nested document data for one evaluation.
///
/// Values are the `serde_json` value space: strings, numbers, booleans,
/// lists, and maps. Dates travel as strings and are parsed on demand by
/// the operator evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    root: Value,
}

impl DocumentContext {
    /// Wrap a JSON tree as a document context.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The underlying JSON tree.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Resolve a dotted/indexed path.
    ///
    /// Splits on `.`; each segment looks up a map key, or — when the
    /// segment is numeric and the current node is a list — indexes into
    /// the list. Out-of-range indexes and every other mismatch resolve
    /// to [`FieldLookup::Missing`].
    pub fn resolve(&self, path: &str) -> FieldLookup<'_> {
        if path.is_empty() {
            return FieldLookup::Missing;
        }
        let mut current = &self.root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => match map.get(segment) {
                    Some(v) => v,
                    None => return FieldLookup::Missing,
                },
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(idx) => match items.get(idx) {
                        Some(v) => v,
                        None => return FieldLookup::Missing,
                    },
                    Err(_) => return FieldLookup::Missing,
                },
                _ => return FieldLookup::Missing,
            };
        }
        FieldLookup::Found(current)
    }
}

impl From<Value> for DocumentContext {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> DocumentContext {
        DocumentContext::new(json!({
            "invoice": {"amount": 105000, "currency": "USD"},
            "lc": {"amount": 100000},
            "transport": {
                "legs": [
                    {"mode": "sea", "vessel": "MV Meridian"},
                    {"mode": "rail"}
                ]
            }
        }))
    }

    #[test]
    fn test_resolve_nested_key() {
        let c = ctx();
        assert_eq!(c.resolve("invoice.amount").value(), Some(&json!(105000)));
        assert_eq!(c.resolve("invoice.currency").value(), Some(&json!("USD")));
    }

    #[test]
    fn test_resolve_list_index() {
        let c = ctx();
        assert_eq!(c.resolve("transport.legs.0.mode").value(), Some(&json!("sea")));
        assert_eq!(c.resolve("transport.legs.1.mode").value(), Some(&json!("rail")));
    }

    #[test]
    fn test_out_of_range_index_is_missing() {
        let c = ctx();
        assert_eq!(c.resolve("transport.legs.2.mode"), FieldLookup::Missing);
    }

    #[test]
    fn test_non_numeric_segment_on_list_is_missing() {
        let c = ctx();
        assert_eq!(c.resolve("transport.legs.first"), FieldLookup::Missing);
    }

    #[test]
    fn test_unknown_key_is_missing() {
        let c = ctx();
        assert_eq!(c.resolve("invoice.tax"), FieldLookup::Missing);
        assert_eq!(c.resolve("beneficiary.name"), FieldLookup::Missing);
    }

    #[test]
    fn test_descending_into_scalar_is_missing() {
        let c = ctx();
        assert_eq!(c.resolve("invoice.amount.cents"), FieldLookup::Missing);
    }

    #[test]
    fn test_empty_path_is_missing() {
        let c = ctx();
        assert_eq!(c.resolve(""), FieldLookup::Missing);
    }

    #[test]
    fn test_whole_subtree_resolves() {
        let c = ctx();
        assert!(c.resolve("transport.legs").is_found());
    }
}
