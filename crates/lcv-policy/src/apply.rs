//! # Policy Application Orchestration
//!
//! [`PolicyEngine`] is the explicit handle wiring the overlay provider,
//! exception provider, and audit sink together. Construct it once and
//! pass it to callers — there are no module-level singletons.
//!
//! ## Flow
//!
//! 1. Fetch the bank's overlay; apply its severity override to every
//!    currently-failed result.
//! 2. Fetch the bank's exceptions; for each failed, non-waived result,
//!    select and apply at most one exception (most specific scope
//!    first).
//! 3. Emit an audit event per application with before/after discrepancy
//!    counts and severity deltas.
//!
//! Provider and audit failures are logged and skipped — policy
//! application degrades, the validation result survives.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::audit::{
    emit_best_effort, severity_deltas, snapshot, AuditEvent, AuditEventKind, AuditSink,
};
use crate::exception::{apply_exception, select_exception, DocumentScope, PolicyException};
use crate::overlay::{apply_overlay, PolicyOverlay};
use lcv_core::{BankId, DocumentContext};
use lcv_rules::RuleOutcome;

/// Error from a policy data provider.
#[derive(Error, Debug)]
#[error("policy provider error: {0}")]
pub struct PolicyError(pub String);

/// Collaborator supplying the bank-wide overlay, if one is configured.
pub trait OverlayProvider: Send + Sync {
    /// The active overlay for a bank, or `None`.
    fn overlay_for(&self, bank_id: &BankId) -> Result<Option<PolicyOverlay>, PolicyError>;
}

/// Collaborator supplying a bank's policy exceptions.
///
/// The returned order is meaningful: it breaks specificity ties.
pub trait ExceptionProvider: Send + Sync {
    /// All exceptions granted by a bank.
    fn exceptions_for(&self, bank_id: &BankId) -> Result<Vec<PolicyException>, PolicyError>;
}

/// The bank policy engine handle.
pub struct PolicyEngine {
    overlays: Arc<dyn OverlayProvider>,
    exceptions: Arc<dyn ExceptionProvider>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine").finish_non_exhaustive()
    }
}

impl PolicyEngine {
    /// Wire a policy engine from its collaborators.
    pub fn new(
        overlays: Arc<dyn OverlayProvider>,
        exceptions: Arc<dyn ExceptionProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            overlays,
            exceptions,
            audit,
        }
    }

    /// Apply a bank's overlay and exceptions to a batch of outcomes.
    ///
    /// Always returns the outcomes — policy layer failures degrade to
    /// the unmodified validation result.
    pub fn apply_bank_policy(
        &self,
        mut outcomes: Vec<RuleOutcome>,
        bank_id: &BankId,
        document_data: &DocumentContext,
    ) -> Vec<RuleOutcome> {
        self.apply_overlay_stage(&mut outcomes, bank_id);
        self.apply_exception_stage(&mut outcomes, bank_id, document_data);
        outcomes
    }

    fn apply_overlay_stage(&self, outcomes: &mut [RuleOutcome], bank_id: &BankId) {
        let overlay = match self.overlays.overlay_for(bank_id) {
            Ok(Some(overlay)) => overlay,
            Ok(None) => return,
            Err(e) => {
                warn!(bank = %bank_id, error = %e, "overlay provider failed; skipping overlay");
                return;
            }
        };

        let before = snapshot(outcomes);
        let touched = apply_overlay(outcomes, &overlay);
        if touched == 0 {
            return;
        }
        let after = snapshot(outcomes);
        emit_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                id: Uuid::new_v4(),
                kind: AuditEventKind::OverlayApplied,
                bank_id: bank_id.clone(),
                rule_id: None,
                exception_id: None,
                discrepancies_before: before.discrepancies,
                discrepancies_after: after.discrepancies,
                severity_deltas: severity_deltas(&before, &after),
                reason: Some(format!(
                    "overlay {} touched {touched} failed result(s)",
                    overlay.version
                )),
                occurred_at: Utc::now(),
            },
        );
    }

    fn apply_exception_stage(
        &self,
        outcomes: &mut [RuleOutcome],
        bank_id: &BankId,
        document_data: &DocumentContext,
    ) {
        let exceptions = match self.exceptions.exceptions_for(bank_id) {
            Ok(list) if list.is_empty() => return,
            Ok(list) => list,
            Err(e) => {
                warn!(bank = %bank_id, error = %e, "exception provider failed; skipping exceptions");
                return;
            }
        };

        let doc_scope = DocumentScope::from_document(document_data);
        let now = Utc::now();

        for i in 0..outcomes.len() {
            let outcome = &outcomes[i];
            if outcome.passed || outcome.not_applicable || outcome.waived {
                continue;
            }
            let Some(exception) =
                select_exception(&exceptions, &outcome.rule_id, &doc_scope, now)
            else {
                continue;
            };
            let exception = exception.clone();

            let before = snapshot(outcomes);
            apply_exception(&mut outcomes[i], &exception);
            let after = snapshot(outcomes);

            emit_best_effort(
                self.audit.as_ref(),
                AuditEvent {
                    id: Uuid::new_v4(),
                    kind: AuditEventKind::ExceptionApplied,
                    bank_id: bank_id.clone(),
                    rule_id: Some(outcomes[i].rule_id.clone()),
                    exception_id: Some(exception.id.clone()),
                    discrepancies_before: before.discrepancies,
                    discrepancies_after: after.discrepancies,
                    severity_deltas: severity_deltas(&before, &after),
                    reason: outcomes[i].policy_reason.clone(),
                    occurred_at: now,
                },
            );
        }
    }
}
