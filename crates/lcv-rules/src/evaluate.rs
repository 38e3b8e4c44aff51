//! # Rule Evaluation & Batch Orchestration
//!
//! Per-rule flow: precondition gate → condition evaluation → outcome
//! assembly. Preconditions never produce failures — a false or
//! unevaluable `applies_if` makes the rule not applicable. Conditions
//! separate hard violations from missing-data signals: a rule whose only
//! failures are attributable to absent fields is skipped (not
//! applicable, severity `info`), not failed.
//!
//! ## Batch Contract
//!
//! A batch over `n` rules always yields `n` outcomes. One faulty rule
//! becomes a failed outcome carrying the error text; it never aborts the
//! batch. Rules are pure functions of `(rule, context)` and evaluate in
//! parallel on the rayon pool, order-preserving. Interactive callers may
//! pass a [`CancelToken`]: rules not yet started when the token fires
//! are reported as not-applicable outcomes and the batch is flagged
//! `cancelled`.

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::normalize::normalize_all;
use crate::ops::{eval_condition, EvalError};
use crate::source::SourceCondition;
use lcv_core::{DocumentContext, Severity};

/// A compliance rule as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier (e.g. `"UCP600-14B"`).
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: Option<String>,
    /// Severity assigned to a failing outcome.
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// `applies_if` gate: all must hold for the rule to apply.
    #[serde(default)]
    pub preconditions: Vec<SourceCondition>,
    /// AND-conjoined checks.
    #[serde(default)]
    pub conditions: Vec<SourceCondition>,
    /// Authored outcome messages.
    #[serde(default)]
    pub expected_outcome: ExpectedOutcome,
    /// Document type this rule addresses.
    #[serde(default)]
    pub document_type: Option<String>,
    /// Provenance: the ICC domain this rule was fetched under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_domain: Option<String>,
    /// Provenance: the ruleset version the rule came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_version: Option<String>,
}

fn default_severity() -> Severity {
    Severity::Major
}

/// Authored outcome messages for the pass and fail cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    /// Messages for a passing outcome; the first is used.
    #[serde(default)]
    pub valid: Vec<String>,
    /// Messages for a failing outcome; the first is used.
    #[serde(default)]
    pub invalid: Vec<String>,
}

/// One failed condition within a rule outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// The rule the condition belongs to.
    pub rule_id: String,
    /// Compact rendering of the condition.
    pub condition: String,
    /// The field the condition addressed.
    pub field: String,
    /// The operator that failed.
    pub operator: String,
    /// Human-readable description.
    pub message: String,
}

/// Outcome of evaluating one rule.
///
/// The `waived`/`overridden`/`exception_applied`/`policy_override`/
/// `exception_id`/`policy_reason` fields are populated by the bank
/// policy layer; batch evaluation leaves them at their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// The evaluated rule.
    pub rule_id: String,
    /// Whether the rule passed (not-applicable outcomes pass).
    pub passed: bool,
    /// Whether the rule was skipped as not applicable.
    pub not_applicable: bool,
    /// Failed conditions, empty unless the rule failed.
    pub violations: Vec<Violation>,
    /// Outcome message.
    pub message: String,
    /// Outcome severity.
    pub severity: Severity,
    /// Sorted, de-duplicated fields whose absence caused a skip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    /// A policy exception waived this outcome.
    #[serde(default)]
    pub waived: bool,
    /// A policy exception overrode this outcome.
    #[serde(default)]
    pub overridden: bool,
    /// Any policy exception was applied.
    #[serde(default)]
    pub exception_applied: bool,
    /// A bank-wide overlay touched this outcome.
    #[serde(default)]
    pub policy_override: bool,
    /// Identifier of the applied exception.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_id: Option<String>,
    /// Reason recorded by the policy layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_reason: Option<String>,
}

impl RuleOutcome {
    fn base(rule_id: &str, severity: Severity) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            passed: false,
            not_applicable: false,
            violations: Vec::new(),
            message: String::new(),
            severity,
            missing_fields: Vec::new(),
            waived: false,
            overridden: false,
            exception_applied: false,
            policy_override: false,
            exception_id: None,
            policy_reason: None,
        }
    }

    fn not_applicable(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            passed: true,
            not_applicable: true,
            message: message.into(),
            ..Self::base(rule_id, Severity::Info)
        }
    }
}

/// Result of a batch evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// One outcome per input rule, in input order.
    pub outcomes: Vec<RuleOutcome>,
    /// Violations from failed, applicable rules only.
    pub violations: Vec<Violation>,
    /// Always equals the number of input rules.
    pub rules_evaluated: usize,
    /// Applicable rules that passed.
    pub rules_passed: usize,
    /// Applicable rules that failed.
    pub rules_failed: usize,
    /// Rules skipped as not applicable.
    pub rules_not_applicable: usize,
    /// Whether the batch was cut short by a cancel token.
    #[serde(default)]
    pub cancelled: bool,
}

/// Cooperative cancellation flag for interactive batch callers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; rules not yet started will be skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Internal faults surfaced as failed outcomes by the batch layer.
#[derive(Error, Debug)]
enum RuleEvalError {
    #[error("rule has no identifier")]
    MissingId,
}

/// Evaluate one rule against a document context.
///
/// Total: every defined input yields an outcome. Use
/// [`evaluate_rules`] for the fault-isolating batch entry point.
pub fn evaluate_rule(rule: &Rule, ctx: &DocumentContext) -> RuleOutcome {
    match try_evaluate_rule(rule, ctx) {
        Ok(outcome) => outcome,
        Err(e) => failed_with_error(rule, &e.to_string()),
    }
}

fn try_evaluate_rule(rule: &Rule, ctx: &DocumentContext) -> Result<RuleOutcome, RuleEvalError> {
    if rule.id.is_empty() {
        return Err(RuleEvalError::MissingId);
    }

    // Precondition gate. A false or unevaluable applies_if means the
    // rule does not apply — never a failure.
    for cond in &normalize_all(&rule.preconditions, &rule.id) {
        match eval_condition(cond, ctx) {
            Ok(true) => {}
            Ok(false) | Err(EvalError::MissingField { .. }) => {
                return Ok(RuleOutcome::not_applicable(
                    &rule.id,
                    "rule does not apply: precondition not met",
                ));
            }
        }
    }

    let conditions = normalize_all(&rule.conditions, &rule.id);
    if conditions.is_empty() {
        warn!(rule_id = %rule.id, "rule has no evaluable conditions");
        return Ok(RuleOutcome {
            passed: true,
            message: pass_message(rule),
            ..RuleOutcome::base(&rule.id, rule.severity)
        });
    }

    let mut violations = Vec::new();
    let mut missing = BTreeSet::new();
    for cond in &conditions {
        match eval_condition(cond, ctx) {
            Ok(true) => {}
            Ok(false) => violations.push(Violation {
                rule_id: rule.id.clone(),
                condition: cond.describe(),
                field: cond.field.clone(),
                operator: cond.operator.as_str().to_string(),
                message: format!("{} check failed", cond.describe()),
            }),
            Err(EvalError::MissingField { field, .. }) => {
                missing.insert(field);
            }
        }
    }

    // Skip, don't fail: every failing condition was attributable to
    // missing data and there are zero hard violations.
    if violations.is_empty() && !missing.is_empty() {
        let fields: Vec<String> = missing.into_iter().collect();
        return Ok(RuleOutcome {
            message: format!("not applicable: missing fields: {}", fields.join(", ")),
            missing_fields: fields,
            ..RuleOutcome::not_applicable(&rule.id, "")
        });
    }

    let passed = violations.is_empty();
    let message = if passed {
        pass_message(rule)
    } else {
        fail_message(rule, violations.len())
    };
    Ok(RuleOutcome {
        passed,
        violations,
        message,
        missing_fields: missing.into_iter().collect(),
        ..RuleOutcome::base(&rule.id, rule.severity)
    })
}

fn pass_message(rule: &Rule) -> String {
    rule.expected_outcome
        .valid
        .first()
        .cloned()
        .unwrap_or_else(|| "all conditions satisfied".to_string())
}

fn fail_message(rule: &Rule, count: usize) -> String {
    rule.expected_outcome
        .invalid
        .first()
        .cloned()
        .unwrap_or_else(|| format!("{count} condition(s) failed"))
}

fn failed_with_error(rule: &Rule, error: &str) -> RuleOutcome {
    RuleOutcome {
        message: format!("rule evaluation error: {error}"),
        ..RuleOutcome::base(&rule.id, rule.severity)
    }
}

/// Evaluate a batch of rules in parallel.
pub fn evaluate_rules(rules: &[Rule], ctx: &DocumentContext) -> BatchResult {
    evaluate_rules_with_cancel(rules, ctx, &CancelToken::new())
}

/// Evaluate a batch with cooperative cancellation.
///
/// Every input rule yields an outcome — rules skipped by cancellation
/// are reported not-applicable — so `rules_evaluated == rules.len()`
/// holds unconditionally.
pub fn evaluate_rules_with_cancel(
    rules: &[Rule],
    ctx: &DocumentContext,
    token: &CancelToken,
) -> BatchResult {
    let outcomes: Vec<RuleOutcome> = rules
        .par_iter()
        .map(|rule| {
            if token.is_cancelled() {
                return RuleOutcome::not_applicable(
                    &rule.id,
                    "batch cancelled before this rule started",
                );
            }
            // A faulting rule must not abort the batch; it becomes a
            // failed outcome carrying the fault text.
            match catch_unwind(AssertUnwindSafe(|| evaluate_rule(rule, ctx))) {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(rule_id = %rule.id, "rule evaluation panicked");
                    failed_with_error(rule, "unexpected fault during evaluation")
                }
            }
        })
        .collect();

    let mut rules_passed = 0;
    let mut rules_failed = 0;
    let mut rules_not_applicable = 0;
    let mut violations = Vec::new();
    for outcome in &outcomes {
        if outcome.not_applicable {
            rules_not_applicable += 1;
        } else if outcome.passed {
            rules_passed += 1;
        } else {
            rules_failed += 1;
            violations.extend(outcome.violations.iter().cloned());
        }
    }

    BatchResult {
        rules_evaluated: outcomes.len(),
        outcomes,
        violations,
        rules_passed,
        rules_failed,
        rules_not_applicable,
        cancelled: token.is_cancelled(),
    }
}
