//! # Condition Authoring Schemas
//!
//! Authored rule content arrives in eight tagged schemas plus the
//! canonical form itself. Each schema is a struct variant of
//! [`TaggedSource`], dispatched by its `type` tag — a tagged union per
//! variant rather than sequential shape-sniffing, so adding a ninth
//! schema is one new variant and one new normalization arm.
//!
//! ## Degradation
//!
//! [`SourceCondition`] deserialization never fails: records that match
//! no known schema land in [`SourceCondition::Raw`] and normalize to
//! "no condition" (logged). A malformed condition must degrade that one
//! check, not sink the rule or the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use lcv_core::DayType;

/// A condition as authored, before normalization.
///
/// Deserialization tries the tagged schemas first, then the canonical
/// form, and finally captures anything else verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceCondition {
    /// One of the eight tagged authoring schemas.
    Tagged(TaggedSource),
    /// An already-canonical condition record.
    Canonical(Condition),
    /// Anything else — preserved for logging, normalizes to nothing.
    Raw(Value),
}

/// The eight tagged authoring schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaggedSource {
    /// Field value must be one of an allowed set.
    EnumValue {
        /// Dotted path into the document context.
        field: String,
        /// Allowed values.
        #[serde(default)]
        allowed: Vec<Value>,
    },
    /// Field must be present (or absent when `present` is false).
    FieldPresence {
        /// Dotted path into the document context.
        field: String,
        /// Expected presence; defaults to required.
        #[serde(default = "default_true")]
        present: bool,
    },
    /// A document of the given type must be part of the presented set.
    DocRequired {
        /// Document type identifier (e.g. `"commercial_invoice"`).
        document_type: String,
    },
    /// Field must equal a literal or another field.
    EqualityMatch {
        /// Dotted path into the document context.
        field: String,
        /// Right-hand side; a string containing `.` and no whitespace
        /// denotes another field path.
        #[serde(default, alias = "expected")]
        value: Option<Value>,
        /// Negate to require inequality.
        #[serde(default)]
        negate: bool,
    },
    /// Two fields must agree under the given operator.
    ConsistencyCheck {
        /// Dotted path into the document context.
        field: String,
        /// The field to compare against.
        #[serde(alias = "other_field")]
        compare_to: String,
        /// Comparison operator name; defaults to equality.
        #[serde(default)]
        operator: Option<String>,
    },
    /// One date field must precede (or follow) another.
    DateOrder {
        /// The earlier date in the default ordering.
        first: String,
        /// The later date in the default ordering.
        second: String,
        /// `"before"` (default) or `"after"`, applied to `first`.
        #[serde(default)]
        order: Option<String>,
    },
    /// Field must fall in a tolerance-widened numeric range.
    NumericRange {
        /// Dotted path into the document context.
        field: String,
        /// Lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Upper bound.
        #[serde(default)]
        max: Option<f64>,
        /// Absolute tolerance widening both bounds.
        #[serde(default)]
        tolerance: Option<f64>,
        /// Suppress tolerance widening on the max side.
        #[serde(default)]
        allow_exceed_credit: bool,
        /// Suppress tolerance widening on the min side.
        #[serde(default)]
        allow_under_credit: bool,
        /// Percentage widening of the min bound.
        #[serde(default)]
        min_percent: Option<f64>,
        /// Percentage widening of the max bound.
        #[serde(default)]
        max_percent: Option<f64>,
    },
    /// A date field must fall within N days of a reference.
    TimeConstraint {
        /// The date field being checked.
        field: String,
        /// Anchor of the window: a field path or a literal date.
        reference: String,
        /// Window size in days.
        days: i64,
        /// Banking or calendar days; defaults to calendar.
        #[serde(default)]
        day_type: DayType,
    },
}

fn default_true() -> bool {
    true
}
