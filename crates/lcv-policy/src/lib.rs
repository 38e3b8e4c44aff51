//! # lcv-policy — Bank Policy Overlay & Exception Engine
//!
//! Applies bank-specific policy to a batch of rule outcomes:
//!
//! - **Overlay** (`overlay.rs`): coarse, bank-wide adjustments — a
//!   configured severity override force-sets severity on every
//!   currently-failed result.
//!
//! - **Exception** (`exception.rs`): fine-grained, per-rule-code
//!   waivers, downgrades, and overrides scoped by client, branch, and
//!   product, with a deterministic most-specific-first selection order.
//!
//! - **Audit** (`audit.rs`): every policy application emits a structured
//!   event with before/after discrepancy counts and per-severity deltas
//!   through the [`AuditSink`] trait. Emission is best-effort — an audit
//!   failure never alters or rolls back the validation outcome.
//!
//! - **Apply** (`apply.rs`): the [`PolicyEngine`] handle wires providers
//!   and the audit sink together behind
//!   [`PolicyEngine::apply_bank_policy`]. Construct it once and share it;
//!   there are no ambient globals.

pub mod apply;
pub mod audit;
pub mod exception;
pub mod overlay;

pub use apply::{ExceptionProvider, OverlayProvider, PolicyEngine, PolicyError};
pub use audit::{AuditError, AuditEvent, AuditEventKind, AuditSink, NoopAuditSink};
pub use exception::{ExceptionEffect, ExceptionScope, PolicyException};
pub use overlay::PolicyOverlay;
