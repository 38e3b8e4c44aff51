//! # Policy Exceptions — Scoped Waivers, Downgrades, Overrides
//!
//! An exception bypasses a normally-failing rule for a bounded scope:
//! a client, a branch, a product line, or any combination. Exactly one
//! exception applies per failed rule.
//!
//! ## Selection Order
//!
//! "First matching exception wins" carried no documented order in the
//! source system. The order here is explicit and deterministic:
//! candidates are sorted most-specific-scope-first (count of non-empty
//! scope fields, descending) with a stable sort, so ties keep the
//! caller-supplied order. See DESIGN.md.
//!
//! ## Effects
//!
//! - `waive` — force pass, severity `info`, waive reason recorded.
//! - `downgrade` — one step down the critical → major → minor ladder.
//! - `override` — behaviorally identical to waive, recorded with a
//!   distinct reason so audits can tell deliberate overrides from
//!   routine waivers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lcv_core::{BankId, DocumentContext, Severity};
use lcv_rules::RuleOutcome;

/// What an exception does to a failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionEffect {
    /// Force pass with severity `info`.
    Waive,
    /// Step severity one rung down the ladder.
    Downgrade,
    /// Force pass, recorded distinctly from a waiver.
    Override,
}

/// The scope an exception is limited to. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionScope {
    /// Client identifier the exception is limited to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Branch code the exception is limited to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Product type the exception is limited to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl ExceptionScope {
    /// Number of non-empty scope fields. Higher is more specific.
    pub fn specificity(&self) -> usize {
        [&self.client, &self.branch, &self.product]
            .iter()
            .filter(|f| f.is_some())
            .count()
    }

    /// Whether every non-empty scope field matches the document.
    pub fn matches(&self, doc: &DocumentScope) -> bool {
        scope_field_matches(&self.client, &doc.client)
            && scope_field_matches(&self.branch, &doc.branch)
            && scope_field_matches(&self.product, &doc.product)
    }
}

fn scope_field_matches(scope: &Option<String>, actual: &Option<String>) -> bool {
    match scope {
        None => true,
        Some(required) => actual.as_deref() == Some(required.as_str()),
    }
}

/// The document's own scope coordinates, extracted once per policy run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentScope {
    /// Client identifier, if present in the document data.
    pub client: Option<String>,
    /// Branch code, if present.
    pub branch: Option<String>,
    /// Product type, if present.
    pub product: Option<String>,
}

/// Paths probed for each scope coordinate, in order.
const CLIENT_PATHS: &[&str] = &["client_id", "client.id", "meta.client_id"];
const BRANCH_PATHS: &[&str] = &["branch_code", "branch.code", "meta.branch_code"];
const PRODUCT_PATHS: &[&str] = &["product_type", "product.type", "meta.product_type"];

impl DocumentScope {
    /// Extract the scope coordinates from document data.
    pub fn from_document(data: &DocumentContext) -> Self {
        Self {
            client: first_string(data, CLIENT_PATHS),
            branch: first_string(data, BRANCH_PATHS),
            product: first_string(data, PRODUCT_PATHS),
        }
    }
}

fn first_string(data: &DocumentContext, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|p| data.resolve(p).value().and_then(Value::as_str))
        .map(String::from)
}

/// A scoped waiver, downgrade, or override for one rule code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyException {
    /// Exception identifier, recorded on the outcome it is applied to.
    pub id: String,
    /// The bank that granted the exception.
    pub bank_id: BankId,
    /// The rule code the exception targets.
    pub rule_code: String,
    /// Scope limits; empty fields match anything.
    #[serde(default)]
    pub scope: ExceptionScope,
    /// What the exception does.
    pub effect: ExceptionEffect,
    /// Expiry; an expired exception never matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PolicyException {
    /// Whether the exception is live at the given instant.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expiry| now <= expiry)
    }
}

/// Select the exception to apply to a failed outcome: the most specific
/// active match, ties keeping caller-supplied order.
pub fn select_exception<'a>(
    exceptions: &'a [PolicyException],
    rule_id: &str,
    doc_scope: &DocumentScope,
    now: DateTime<Utc>,
) -> Option<&'a PolicyException> {
    let mut candidates: Vec<&PolicyException> = exceptions
        .iter()
        .filter(|e| e.rule_code == rule_id && e.is_active(now) && e.scope.matches(doc_scope))
        .collect();
    candidates.sort_by_key(|e| std::cmp::Reverse(e.scope.specificity()));
    candidates.first().copied()
}

/// Apply one exception to a failed outcome in place.
pub fn apply_exception(outcome: &mut RuleOutcome, exception: &PolicyException) {
    outcome.exception_applied = true;
    outcome.exception_id = Some(exception.id.clone());
    match exception.effect {
        ExceptionEffect::Waive => {
            outcome.passed = true;
            outcome.waived = true;
            outcome.severity = Severity::Info;
            outcome.policy_reason = Some(format!("waived by policy exception {}", exception.id));
        }
        ExceptionEffect::Downgrade => {
            outcome.severity = outcome.severity.downgrade();
            outcome.policy_reason =
                Some(format!("downgraded by policy exception {}", exception.id));
        }
        ExceptionEffect::Override => {
            outcome.passed = true;
            outcome.overridden = true;
            outcome.severity = Severity::Info;
            outcome.policy_reason = Some(format!(
                "overridden by bank instruction via exception {}",
                exception.id
            ));
        }
    }
}
