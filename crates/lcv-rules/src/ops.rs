//! # Operator Evaluation
//!
//! Executes a canonical [`Condition`] against a [`DocumentContext`].
//! The semantics here are load-bearing compatibility surface: authored
//! rule content depends on the exact coercion, tolerance, and window
//! behavior, so each operator is documented with its contract.
//!
//! ## Missing-Field Contract
//!
//! `exists`, `not_exists`, `is_empty`, and `is_not_empty` are total —
//! they are the only operators with defined behavior for an absent
//! field. Every other operator returns [`EvalError::MissingField`] when
//! its field (or its `value_ref` target) is absent. Only the rule
//! evaluator consumes this signal; it is how "skip due to missing data"
//! is implemented, and it must never surface as a rule failure.
//!
//! An explicit JSON `null` is treated as absent throughout: authored
//! document feeds emit `null` for fields they could not populate.
//!
//! ## Equality Coercion
//!
//! Coercion in `equals` is asymmetric by inherited contract: a numeric
//! literal promotes a numeric-looking string field to a number, while a
//! string literal demotes a number field to its string rendering. See
//! DESIGN.md — preserved pending product confirmation.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::condition::{Condition, Operator};
use lcv_core::temporal::{add_days, parse_date};
use lcv_core::{DayType, DocumentContext, FieldLookup};

/// Typed signal produced when a non-total operator meets an absent field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The condition's field (or `value_ref` target) is absent.
    #[error("field {field:?} is absent for operator {operator}")]
    MissingField {
        /// The absent path.
        field: String,
        /// The operator that needed it.
        operator: String,
    },
}

/// Tolerance-widened numeric bounds for the `between` operator.
///
/// All supplied bounds must hold. Tolerance widens a bound unless the
/// matching `allow_*` flag suppresses widening on that side. Absolute
/// tolerance and percentage widening combine by taking the wider
/// allowance on each side.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RangeBounds {
    /// Lower bound.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound.
    #[serde(default)]
    pub max: Option<f64>,
    /// Absolute tolerance widening both bounds.
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Suppress tolerance widening on the max side.
    #[serde(default)]
    pub allow_exceed_credit: bool,
    /// Suppress tolerance widening on the min side.
    #[serde(default)]
    pub allow_under_credit: bool,
    /// Percentage widening of the min bound.
    #[serde(default)]
    pub min_percent: Option<f64>,
    /// Percentage widening of the max bound.
    #[serde(default)]
    pub max_percent: Option<f64>,
}

impl RangeBounds {
    /// Effective lower bound after widening.
    pub fn effective_min(&self) -> Option<f64> {
        self.min.map(|min| {
            if self.allow_under_credit {
                min
            } else {
                let abs = self.tolerance.unwrap_or(0.0);
                let pct = self.min_percent.map_or(0.0, |p| min.abs() * p / 100.0);
                min - abs.max(pct)
            }
        })
    }

    /// Effective upper bound after widening.
    pub fn effective_max(&self) -> Option<f64> {
        self.max.map(|max| {
            if self.allow_exceed_credit {
                max
            } else {
                let abs = self.tolerance.unwrap_or(0.0);
                let pct = self.max_percent.map_or(0.0, |p| max.abs() * p / 100.0);
                max + abs.max(pct)
            }
        })
    }

    /// Whether a value satisfies every supplied bound.
    pub fn contains(&self, n: f64) -> bool {
        if let Some(min) = self.effective_min() {
            if n < min {
                return false;
            }
        }
        if let Some(max) = self.effective_max() {
            if n > max {
                return false;
            }
        }
        true
    }
}

/// Evaluate one canonical condition against a document context.
///
/// Returns `Ok(bool)` for every defined case; `Err(MissingField)` only
/// for non-total operators over absent data. Malformed right-hand sides
/// and unknown operators evaluate to `false` with a warning — never an
/// error.
pub fn eval_condition(cond: &Condition, ctx: &DocumentContext) -> Result<bool, EvalError> {
    // Unknown operators never raise, even over absent fields.
    if let Operator::Unknown(name) = &cond.operator {
        warn!(field = %cond.field, operator = %name, "unknown operator evaluates to false");
        return Ok(false);
    }

    let lookup = ctx.resolve(&cond.field);

    // Presence operators are total.
    match cond.operator {
        Operator::Exists => return Ok(is_present(lookup)),
        Operator::NotExists => return Ok(!is_present(lookup)),
        Operator::IsEmpty => return Ok(is_empty(lookup)),
        Operator::IsNotEmpty => return Ok(!is_empty(lookup)),
        _ => {}
    }

    let lhs = match lookup {
        FieldLookup::Found(v) if !v.is_null() => v,
        _ => {
            return Err(EvalError::MissingField {
                field: cond.field.clone(),
                operator: cond.operator.as_str().to_string(),
            })
        }
    };

    // Resolve the right-hand side: a value_ref names another field and
    // is subject to the same missing-field contract.
    let resolved_ref;
    let rhs: Option<&Value> = match &cond.value_ref {
        Some(path) => match ctx.resolve(path) {
            FieldLookup::Found(v) if !v.is_null() => {
                resolved_ref = v;
                Some(resolved_ref)
            }
            _ => {
                return Err(EvalError::MissingField {
                    field: path.clone(),
                    operator: cond.operator.as_str().to_string(),
                })
            }
        },
        None => cond.value.as_ref(),
    };

    Ok(match &cond.operator {
        Operator::Equals => with_rhs(cond, rhs, |r| coerced_eq(lhs, r)),
        Operator::NotEquals => with_rhs(cond, rhs, |r| !coerced_eq(lhs, r)),
        Operator::Contains => with_rhs(cond, rhs, |r| contains(lhs, r)),
        Operator::NotContains => with_rhs(cond, rhs, |r| !contains(lhs, r)),
        Operator::Matches => with_rhs(cond, rhs, |r| regex_match(lhs, r)),
        Operator::In => with_rhs(cond, rhs, |r| in_list(lhs, r)),
        Operator::NotIn => with_rhs(cond, rhs, |r| !in_list(lhs, r)),
        Operator::GreaterThan => numeric_cmp(lhs, rhs, |l, r| l > r),
        Operator::GreaterThanOrEqual => numeric_cmp(lhs, rhs, |l, r| l >= r),
        Operator::LessThan => numeric_cmp(lhs, rhs, |l, r| l < r),
        Operator::LessThanOrEqual => numeric_cmp(lhs, rhs, |l, r| l <= r),
        Operator::Between => with_rhs(cond, rhs, |r| between(lhs, r)),
        Operator::NotContainsAny => with_rhs(cond, rhs, |r| !contains_any(lhs, r)),
        Operator::WithinDays => with_rhs(cond, rhs, |r| {
            let (anchor, days) = if cond.value_ref.is_some() {
                // rhs resolved from value_ref is the anchor date; the
                // day count rides in the condition's literal value.
                (
                    r.as_str().and_then(parse_date),
                    cond.value.as_ref().and_then(day_count),
                )
            } else {
                (
                    r.get("reference")
                        .and_then(Value::as_str)
                        .and_then(parse_date),
                    r.get("days").and_then(Value::as_i64),
                )
            };
            within_days(lhs, anchor, days, cond.day_type)
        }),
        Operator::Before => with_rhs(cond, rhs, |r| date_cmp(lhs, r, |a, b| a < b)),
        Operator::After => with_rhs(cond, rhs, |r| date_cmp(lhs, r, |a, b| a > b)),
        // Presence and unknown operators were handled above.
        _ => false,
    })
}

fn with_rhs(cond: &Condition, rhs: Option<&Value>, f: impl FnOnce(&Value) -> bool) -> bool {
    match rhs {
        Some(r) => f(r),
        None => {
            warn!(
                field = %cond.field,
                operator = %cond.operator,
                "condition without a right-hand side evaluates to false"
            );
            false
        }
    }
}

fn is_present(lookup: FieldLookup<'_>) -> bool {
    matches!(lookup, FieldLookup::Found(v) if !v.is_null())
}

fn is_empty(lookup: FieldLookup<'_>) -> bool {
    match lookup {
        FieldLookup::Missing => true,
        FieldLookup::Found(v) => match v {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Number(_) | Value::Bool(_) => false,
        },
    }
}

/// Render a JSON scalar the way authored content expects: integers
/// without a decimal point, floats via their shortest display form.
fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Equality after asymmetric coercion. The literal (right-hand) side
/// drives the direction: numeric literal promotes a numeric-looking
/// string field, string literal demotes a number field to its string
/// rendering.
fn coerced_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::String(l), Value::Number(r)) => match l.trim().parse::<f64>() {
            Ok(ln) => r.as_f64().is_some_and(|rn| ln == rn),
            Err(_) => false,
        },
        (Value::Number(l), Value::String(r)) => l.to_string() == *r,
        (Value::Number(l), Value::Number(r)) => {
            l.as_f64().zip(r.as_f64()).is_some_and(|(a, b)| a == b)
        }
        (l, r) => l == r,
    }
}

/// Loose equality for list membership: numbers compare numerically,
/// everything else structurally.
fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().zip(y.as_f64()).is_some_and(|(x, y)| x == y)
        }
        _ => a == b,
    }
}

fn contains(lhs: &Value, rhs: &Value) -> bool {
    match lhs {
        Value::String(s) => s
            .to_lowercase()
            .contains(&value_to_string(rhs).to_lowercase()),
        Value::Array(items) => items.iter().any(|item| values_eq(item, rhs)),
        _ => false,
    }
}

fn regex_match(lhs: &Value, rhs: &Value) -> bool {
    let Value::String(text) = lhs else {
        return false;
    };
    let pattern = value_to_string(rhs);
    match regex::Regex::new(&pattern) {
        // Anchored at the start: the leftmost match must begin at 0.
        Ok(re) => re.find(text).is_some_and(|m| m.start() == 0),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "invalid regex pattern evaluates to false");
            false
        }
    }
}

fn in_list(lhs: &Value, rhs: &Value) -> bool {
    match rhs {
        Value::Array(items) => items.iter().any(|item| values_eq(item, lhs)),
        _ => false,
    }
}

fn numeric_cmp(lhs: &Value, rhs: Option<&Value>, f: impl FnOnce(f64, f64) -> bool) -> bool {
    match (as_number(lhs), rhs.and_then(as_number)) {
        (Some(l), Some(r)) => f(l, r),
        _ => false,
    }
}

fn between(lhs: &Value, rhs: &Value) -> bool {
    let Some(n) = as_number(lhs) else {
        return false;
    };
    match serde_json::from_value::<RangeBounds>(rhs.clone()) {
        Ok(bounds) => bounds.contains(n),
        Err(e) => {
            warn!(error = %e, "malformed between bounds evaluate to false");
            false
        }
    }
}

/// True when any of the listed terms appears in the field value.
/// Vacuously false for an empty term list (so `not_contains_any` is
/// vacuously true).
fn contains_any(lhs: &Value, rhs: &Value) -> bool {
    let terms: Vec<String> = match rhs {
        Value::Array(items) => items
            .iter()
            .map(|t| value_to_string(t).to_lowercase())
            .collect(),
        Value::String(s) => vec![s.to_lowercase()],
        _ => return false,
    };
    let haystacks: Vec<String> = match lhs {
        Value::String(s) => vec![s.to_lowercase()],
        Value::Array(items) => items
            .iter()
            .map(|i| value_to_string(i).to_lowercase())
            .collect(),
        _ => return false,
    };
    terms
        .iter()
        .filter(|t| !t.is_empty())
        .any(|t| haystacks.iter().any(|h| h.contains(t.as_str())))
}

/// The day count as authored: a bare number or a `{days: N}` object.
fn day_count(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::Object(map) => map.get("days").and_then(Value::as_i64),
        _ => None,
    }
}

/// Date window `[ref, ref + N days]`, inclusive both ends.
fn within_days(
    lhs: &Value,
    anchor: Option<chrono::NaiveDate>,
    days: Option<i64>,
    day_type: DayType,
) -> bool {
    let Some(date) = lhs.as_str().and_then(parse_date) else {
        return false;
    };
    let (Some(anchor), Some(days)) = (anchor, days) else {
        return false;
    };
    let end = add_days(anchor, days, day_type);
    let (start, end) = if end < anchor { (end, anchor) } else { (anchor, end) };
    date >= start && date <= end
}

fn date_cmp(
    lhs: &Value,
    rhs: &Value,
    f: impl FnOnce(chrono::NaiveDate, chrono::NaiveDate) -> bool,
) -> bool {
    match (
        lhs.as_str().and_then(parse_date),
        rhs.as_str().and_then(parse_date),
    ) {
        (Some(l), Some(r)) => f(l, r),
        _ => false,
    }
}
