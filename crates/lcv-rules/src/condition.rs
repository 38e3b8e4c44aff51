//! # Canonical Condition Form
//!
//! Every authoring schema normalizes to one canonical shape: a field
//! path, an operator, and either a literal `value` or a `value_ref`
//! naming another field in the document context. Date-window operators
//! additionally carry a [`DayType`].
//!
//! ## Unknown Operators
//!
//! Authored rule content predates this engine and occasionally carries
//! operators we do not recognize. [`Operator::parse`] is total: an
//! unrecognized name is preserved as [`Operator::Unknown`] so it survives
//! serialization round-trips, and the evaluator resolves it to `false`
//! with a warning rather than rejecting the rule.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lcv_core::DayType;

/// The canonical operator vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality after asymmetric numeric/string coercion.
    Equals,
    /// Negated [`Operator::Equals`].
    NotEquals,
    /// Case-insensitive substring (strings) or membership (lists).
    Contains,
    /// Negated [`Operator::Contains`].
    NotContains,
    /// Regex match anchored at the start of the field value.
    Matches,
    /// Membership of the field value in a literal list.
    In,
    /// Negated [`Operator::In`].
    NotIn,
    /// Strict numeric comparison.
    GreaterThan,
    /// Numeric comparison, inclusive.
    GreaterThanOrEqual,
    /// Strict numeric comparison.
    LessThan,
    /// Numeric comparison, inclusive.
    LessThanOrEqual,
    /// Tolerance-widened numeric range; all supplied bounds must hold.
    Between,
    /// True when none of a list of terms appear in the field value.
    NotContainsAny,
    /// Date window `[ref, ref + N days]`, inclusive both ends.
    WithinDays,
    /// Strict date comparison.
    Before,
    /// Strict date comparison.
    After,
    /// Field presence. Total: defined for absent fields.
    Exists,
    /// Field absence. Total: defined for absent fields.
    NotExists,
    /// Empty after trim (strings), zero length (lists/maps), or absent.
    IsEmpty,
    /// Negated [`Operator::IsEmpty`].
    IsNotEmpty,
    /// An operator name this engine does not recognize.
    Unknown(String),
}

impl Operator {
    /// Parse an operator name. Total — unrecognized names are carried
    /// as [`Operator::Unknown`] instead of failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "matches" => Self::Matches,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "greater_than" => Self::GreaterThan,
            "greater_than_or_equal" => Self::GreaterThanOrEqual,
            "less_than" => Self::LessThan,
            "less_than_or_equal" => Self::LessThanOrEqual,
            "between" => Self::Between,
            "not_contains_any" => Self::NotContainsAny,
            "within_days" => Self::WithinDays,
            "before" => Self::Before,
            "after" => Self::After,
            "exists" => Self::Exists,
            "not_exists" => Self::NotExists,
            "is_empty" => Self::IsEmpty,
            "is_not_empty" => Self::IsNotEmpty,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The snake_case name of this operator.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Matches => "matches",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Between => "between",
            Self::NotContainsAny => "not_contains_any",
            Self::WithinDays => "within_days",
            Self::Before => "before",
            Self::After => "after",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::Unknown(s) => s,
        }
    }

    /// Whether this operator has defined behavior for an absent field.
    ///
    /// These four are the ONLY operators that never produce a
    /// missing-field signal, regardless of field absence.
    pub fn is_total(&self) -> bool {
        matches!(
            self,
            Self::Exists | Self::NotExists | Self::IsEmpty | Self::IsNotEmpty
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// The canonical condition form.
///
/// Exactly one of `value` / `value_ref` is populated for binary
/// operators; presence operators carry neither. The JSON field names
/// match the authored rule interchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path into the document context.
    pub field: String,
    /// Operator to apply.
    pub operator: Operator,
    /// Literal right-hand side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Right-hand side naming another field in the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_ref: Option<String>,
    /// Day unit for date-window operators.
    #[serde(default)]
    pub day_type: DayType,
}

impl Condition {
    /// Compact rendering for violation records and logs.
    pub fn describe(&self) -> String {
        match (&self.value_ref, &self.value) {
            (Some(r), _) => format!("{} {} {}", self.field, self.operator, r),
            (None, Some(v)) => format!("{} {} {}", self.field, self.operator, v),
            (None, None) => format!("{} {}", self.field, self.operator),
        }
    }
}
