//! # lcv-workflow — Effective Ruleset Composition
//!
//! Builds the effective ruleset a bank's workflow evaluates under:
//!
//! ```text
//! base_rules[workflow_type]
//!   ⊕ policy_version.config
//!   ⊕ workflow.base_config
//!   ⊕ active rule overrides        (last, each optionally gated)
//! ```
//!
//! - **Merge** (`merge.rs`): recursive dict merge — dict-vs-dict
//!   collisions recurse, anything else is wholesale replacement by the
//!   later source.
//!
//! - **Overrides** (`overrides.rs`): live [`RuleOverride`]s with
//!   comparator semantics (`EQUALS` replaces, `GREATER_THAN`/`LESS_THAN`
//!   keep the extremum over numeric existing values) and a minimal
//!   `$path op literal` gating expression over the evaluation context.
//!
//! - **Cache** (`cache.rs`): per `(bank, workflow_type)` entries with a
//!   15-minute TTL and a per-bank generation counter — one atomic bump
//!   invalidates every entry for a bank in O(1).
//!
//! - **Composer** (`composer.rs`): the [`RuleComposer`] handle over a
//!   [`WorkflowConfigProvider`] collaborator. Applied overrides record a
//!   usage count and last-applied timestamp through the provider,
//!   best-effort.

pub mod cache;
pub mod composer;
pub mod merge;
pub mod overrides;

pub use cache::EffectiveRuleCache;
pub use composer::{ComposeError, RuleComposer, WorkflowConfigProvider};
pub use merge::deep_merge;
pub use overrides::{Comparator, GateExpr, RuleOverride};
