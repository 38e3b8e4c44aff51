//! # Bank-Wide Policy Overlay
//!
//! An overlay is a coarse, whole-result-set operation: the bank's
//! configured severity override force-sets severity on every currently
//! failed result. Passed and not-applicable outcomes are untouched.
//!
//! The source configuration also declared a max-date-slippage threshold
//! that was never checked anywhere; the key is not modeled here — see
//! DESIGN.md for the decision record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lcv_core::{BankId, Severity};
use lcv_rules::RuleOutcome;

/// Bank-wide stricter configuration layered atop base rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOverlay {
    /// The bank this overlay belongs to.
    pub bank_id: BankId,
    /// Overlay configuration version.
    pub version: String,
    /// Severity force-set on every failed result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_override: Option<Severity>,
    /// Named stricter-check toggles, keyed by check name.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub stricter_checks: serde_json::Map<String, Value>,
    /// Numeric thresholds, keyed by threshold name.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub thresholds: serde_json::Map<String, Value>,
}

/// Apply an overlay to a result set in place.
///
/// Returns the number of outcomes touched. Only currently-failed,
/// applicable results are modified; each touched outcome is flagged
/// `policy_override`.
pub fn apply_overlay(outcomes: &mut [RuleOutcome], overlay: &PolicyOverlay) -> usize {
    let Some(severity) = overlay.severity_override else {
        return 0;
    };
    let mut touched = 0;
    for outcome in outcomes.iter_mut() {
        if !outcome.passed && !outcome.not_applicable {
            outcome.severity = severity;
            outcome.policy_override = true;
            touched += 1;
        }
    }
    touched
}
