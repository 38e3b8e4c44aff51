//! # lcv-rules — Rule Evaluation Engine
//!
//! Evaluates compliance rules against a [`DocumentContext`]:
//!
//! - **Condition** (`condition.rs`): the canonical condition form
//!   `{field, operator, value | value_ref, day_type}` and the
//!   [`Operator`] vocabulary.
//!
//! - **Source** (`source.rs`): the heterogeneous authoring schemas
//!   (`enum_value`, `field_presence`, `doc_required`, `equality_match`,
//!   `consistency_check`, `date_order`, `numeric_range`,
//!   `time_constraint`) as a serde-tagged union.
//!
//! - **Normalize** (`normalize.rs`): one normalization arm per authoring
//!   variant. Malformed authoring degrades to "no condition", logged with
//!   rule id and index — never an error.
//!
//! - **Ops** (`ops.rs`): operator execution with type coercion, temporal
//!   windows, and tolerance-widened numeric ranges. Absent fields produce
//!   a typed [`EvalError::MissingField`] that only the rule evaluator
//!   consumes.
//!
//! - **Evaluate** (`evaluate.rs`): per-rule orchestration (preconditions,
//!   missing-data separation, outcome assembly) and parallel batch
//!   evaluation with per-rule fault isolation and cooperative
//!   cancellation.
//!
//! ## Contract
//!
//! The engine always returns a result. Malformed rule content degrades
//! detection coverage, never availability: a batch over `n` rules always
//! yields `n` outcomes.

pub mod condition;
pub mod evaluate;
pub mod normalize;
pub mod ops;
pub mod source;

pub use condition::{Condition, Operator};
pub use evaluate::{
    evaluate_rule, evaluate_rules, evaluate_rules_with_cancel, BatchResult, CancelToken,
    ExpectedOutcome, Rule, RuleOutcome, Violation,
};
pub use normalize::normalize_condition;
pub use ops::{eval_condition, EvalError};
pub use source::SourceCondition;

pub use lcv_core::{DocumentContext, FieldLookup, Severity};
