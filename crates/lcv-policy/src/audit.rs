//! # Policy Audit Trail
//!
//! Every overlay and exception application emits a structured audit
//! event: what was applied, to which bank and rule, and the before/after
//! discrepancy counts and per-severity deltas it produced.
//!
//! ## Best-Effort Boundary
//!
//! The audit sink is a collaborator that may fail. Emission failure is
//! logged and swallowed — it must never alter, block, or roll back the
//! validation outcome the event describes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use lcv_core::BankId;
use lcv_rules::RuleOutcome;

/// What kind of policy application an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// A bank-wide overlay was applied.
    OverlayApplied,
    /// A scoped exception was applied to one rule outcome.
    ExceptionApplied,
}

/// A structured audit event for one policy application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub id: Uuid,
    /// What was applied.
    pub kind: AuditEventKind,
    /// The bank whose policy was applied.
    pub bank_id: BankId,
    /// The rule the application touched, for exception events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// The applied exception, for exception events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_id: Option<String>,
    /// Failed, applicable outcomes before the application.
    pub discrepancies_before: usize,
    /// Failed, applicable outcomes after the application.
    pub discrepancies_after: usize,
    /// Per-severity count deltas (after minus before), keyed by
    /// severity name. Only non-zero entries are recorded.
    pub severity_deltas: BTreeMap<String, i64>,
    /// Reason recorded by the applying engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the application happened (UTC).
    pub occurred_at: DateTime<Utc>,
}

/// Error from an audit sink.
#[derive(Error, Debug)]
#[error("audit sink error: {0}")]
pub struct AuditError(pub String);

/// Collaborator trait for the audit trail.
pub trait AuditSink: Send + Sync {
    /// Record one event. Failures are tolerated by the caller.
    fn emit(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Sink that drops every event. Useful for tests and offline tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Snapshot of a result set for delta computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSnapshot {
    /// Failed, applicable outcome count.
    pub discrepancies: usize,
    /// Outcome count per severity name.
    pub severity_counts: BTreeMap<String, i64>,
}

/// Take a snapshot of the discrepancy and severity profile.
pub fn snapshot(outcomes: &[RuleOutcome]) -> ResultSnapshot {
    let mut severity_counts = BTreeMap::new();
    let mut discrepancies = 0;
    for outcome in outcomes {
        if !outcome.passed && !outcome.not_applicable {
            discrepancies += 1;
        }
        *severity_counts
            .entry(outcome.severity.as_str().to_string())
            .or_insert(0) += 1;
    }
    ResultSnapshot {
        discrepancies,
        severity_counts,
    }
}

/// Non-zero per-severity deltas between two snapshots.
pub fn severity_deltas(before: &ResultSnapshot, after: &ResultSnapshot) -> BTreeMap<String, i64> {
    let mut deltas = BTreeMap::new();
    let keys = before
        .severity_counts
        .keys()
        .chain(after.severity_counts.keys());
    for key in keys {
        let b = before.severity_counts.get(key).copied().unwrap_or(0);
        let a = after.severity_counts.get(key).copied().unwrap_or(0);
        if a != b {
            deltas.insert(key.clone(), a - b);
        }
    }
    deltas
}

/// Emit an event, logging and swallowing sink failures.
pub fn emit_best_effort(sink: &dyn AuditSink, event: AuditEvent) {
    let kind = event.kind;
    if let Err(e) = sink.emit(event) {
        warn!(?kind, error = %e, "audit emission failed; validation outcome unaffected");
    }
}
