//! # lcv-rulesets — ICC Ruleset Domains
//!
//! Determines which ICC rule families govern a document set and fetches
//! their rules:
//!
//! - **Domain** (`domain.rs`): the [`IccRuleset`] enum — one definition
//!   of the base families (UCP600, ISP98, URDG758, URC522) and the
//!   supplements (eUCP 2.1, URR725) used across the stack.
//!
//! - **Resolver** (`resolver.rs`): token scan over document text and
//!   metadata flags with fixed precedence and logged conflict
//!   resolution.
//!
//! - **Fetch** (`fetch.rs`): the [`RulesetFetcher`] collaborator trait
//!   plus timeout/fallback orchestration. Fetched rules are tagged with
//!   their origin domain and version for provenance.

pub mod domain;
pub mod fetch;
pub mod resolver;

pub use domain::{DomainResolution, IccRuleset};
pub use fetch::{fetch_rules_for_domains, FetchError, FetchedRules, RulesetBundle, RulesetFetcher, RulesetSource};
pub use resolver::resolve_ruleset_domains;
