//! # Condition Normalization
//!
//! Converts each authoring schema into the canonical [`Condition`] form.
//! One arm per [`TaggedSource`] variant — the dispatch is the enum match,
//! not shape-sniffing.
//!
//! ## Reference-vs-Literal Heuristic
//!
//! A right-hand string denotes another field path when it contains `.`
//! and no whitespace; otherwise it is a literal. Dotted document paths
//! never contain spaces, and literal values that look like paths
//! (`"3.14"`) are rare enough in authored content that the original
//! heuristic is preserved unchanged.
//!
//! ## Degradation
//!
//! When a schema fails to yield a field and an operator, normalization
//! returns `None` — "no condition" — and logs the rule id and condition
//! index. The caller skips the slot; nothing is raised.

use serde_json::Value;
use tracing::warn;

use crate::condition::{Condition, Operator};
use crate::source::{SourceCondition, TaggedSource};
use lcv_core::DayType;

/// Normalize one authored condition.
///
/// Returns `None` for malformed authoring; the rule id and index are
/// only used for logging.
pub fn normalize_condition(
    src: &SourceCondition,
    rule_id: &str,
    index: usize,
) -> Option<Condition> {
    match src {
        SourceCondition::Tagged(tagged) => normalize_tagged(tagged, rule_id, index),
        SourceCondition::Canonical(cond) => {
            if cond.field.is_empty() {
                warn!(rule_id, index, "canonical condition with empty field path");
                return None;
            }
            Some(cond.clone())
        }
        SourceCondition::Raw(value) => {
            warn!(rule_id, index, raw = %value, "unrecognized condition schema");
            None
        }
    }
}

/// Normalize a full condition list, dropping malformed slots.
pub fn normalize_all(sources: &[SourceCondition], rule_id: &str) -> Vec<Condition> {
    sources
        .iter()
        .enumerate()
        .filter_map(|(i, src)| normalize_condition(src, rule_id, i))
        .collect()
}

fn normalize_tagged(tagged: &TaggedSource, rule_id: &str, index: usize) -> Option<Condition> {
    match tagged {
        TaggedSource::EnumValue { field, allowed } => {
            let field = non_empty(field, "enum_value", rule_id, index)?;
            Some(Condition {
                field,
                operator: Operator::In,
                value: Some(Value::Array(allowed.clone())),
                value_ref: None,
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::FieldPresence { field, present } => {
            let field = non_empty(field, "field_presence", rule_id, index)?;
            Some(Condition {
                field,
                operator: if *present {
                    Operator::Exists
                } else {
                    Operator::NotExists
                },
                value: None,
                value_ref: None,
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::DocRequired { document_type } => {
            let doc = non_empty(document_type, "doc_required", rule_id, index)?;
            Some(Condition {
                field: "documents".to_string(),
                operator: Operator::Contains,
                value: Some(Value::String(doc)),
                value_ref: None,
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::EqualityMatch {
            field,
            value,
            negate,
        } => {
            let field = non_empty(field, "equality_match", rule_id, index)?;
            let Some(rhs) = value else {
                warn!(rule_id, index, "equality_match without a value");
                return None;
            };
            let (value, value_ref) = split_ref_or_literal(rhs);
            Some(Condition {
                field,
                operator: if *negate {
                    Operator::NotEquals
                } else {
                    Operator::Equals
                },
                value,
                value_ref,
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::ConsistencyCheck {
            field,
            compare_to,
            operator,
        } => {
            let field = non_empty(field, "consistency_check", rule_id, index)?;
            let target = non_empty(compare_to, "consistency_check", rule_id, index)?;
            let operator = operator
                .as_deref()
                .map_or(Operator::Equals, Operator::parse);
            Some(Condition {
                field,
                operator,
                value: None,
                value_ref: Some(target),
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::DateOrder {
            first,
            second,
            order,
        } => {
            let field = non_empty(first, "date_order", rule_id, index)?;
            let target = non_empty(second, "date_order", rule_id, index)?;
            let operator = match order.as_deref() {
                None | Some("before") => Operator::Before,
                Some("after") => Operator::After,
                Some(other) => {
                    warn!(rule_id, index, order = other, "unknown date_order direction");
                    return None;
                }
            };
            Some(Condition {
                field,
                operator,
                value: None,
                value_ref: Some(target),
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::NumericRange {
            field,
            min,
            max,
            tolerance,
            allow_exceed_credit,
            allow_under_credit,
            min_percent,
            max_percent,
        } => {
            let field = non_empty(field, "numeric_range", rule_id, index)?;
            if min.is_none() && max.is_none() {
                warn!(rule_id, index, "numeric_range without bounds");
                return None;
            }
            let mut bounds = serde_json::Map::new();
            if let Some(v) = min {
                bounds.insert("min".into(), json_num(*v));
            }
            if let Some(v) = max {
                bounds.insert("max".into(), json_num(*v));
            }
            if let Some(v) = tolerance {
                bounds.insert("tolerance".into(), json_num(*v));
            }
            if *allow_exceed_credit {
                bounds.insert("allow_exceed_credit".into(), Value::Bool(true));
            }
            if *allow_under_credit {
                bounds.insert("allow_under_credit".into(), Value::Bool(true));
            }
            if let Some(v) = min_percent {
                bounds.insert("min_percent".into(), json_num(*v));
            }
            if let Some(v) = max_percent {
                bounds.insert("max_percent".into(), json_num(*v));
            }
            Some(Condition {
                field,
                operator: Operator::Between,
                value: Some(Value::Object(bounds)),
                value_ref: None,
                day_type: DayType::Calendar,
            })
        }
        TaggedSource::TimeConstraint {
            field,
            reference,
            days,
            day_type,
        } => {
            let field = non_empty(field, "time_constraint", rule_id, index)?;
            let reference = non_empty(reference, "time_constraint", rule_id, index)?;
            let (value, value_ref) = if is_field_ref(&reference) {
                (Some(Value::from(*days)), Some(reference))
            } else {
                (
                    Some(serde_json::json!({"days": days, "reference": reference})),
                    None,
                )
            };
            Some(Condition {
                field,
                operator: Operator::WithinDays,
                value,
                value_ref,
                day_type: *day_type,
            })
        }
    }
}

/// A right-hand string denotes a field path iff it contains `.` and no
/// whitespace.
fn is_field_ref(s: &str) -> bool {
    s.contains('.') && !s.chars().any(char::is_whitespace)
}

fn split_ref_or_literal(rhs: &Value) -> (Option<Value>, Option<String>) {
    match rhs {
        Value::String(s) if is_field_ref(s) => (None, Some(s.clone())),
        other => (Some(other.clone()), None),
    }
}

fn non_empty(s: &str, schema: &str, rule_id: &str, index: usize) -> Option<String> {
    if s.is_empty() {
        warn!(rule_id, index, schema, "condition with empty field path");
        None
    } else {
        Some(s.to_string())
    }
}

fn json_num(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}
