//! # lcv-core — Foundational Types for the LCV Engine
//!
//! This crate is the bedrock of the LCV (Letter-of-Credit Validation)
//! stack. It defines the primitives every other crate builds on; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Absence is a value, not a fault.** Field resolution over a
//!    [`DocumentContext`] returns [`FieldLookup::Missing`] for any dead
//!    end — never an error. Rule evaluation branches on this directly.
//!
//! 2. **Newtype wrappers for domain primitives.** [`BankId`] and
//!    [`WorkflowType`] are newtypes with validated constructors. No bare
//!    strings for cache keys.
//!
//! 3. **One severity ladder.** [`Severity`] is the single definition of
//!    the critical → major → minor → info ordering used by rules,
//!    overlays, and exceptions. Downgrade logic lives here and nowhere
//!    else.
//!
//! 4. **Date parsing is lenient, date arithmetic is exact.** Authored
//!    document data carries dates in several shapes (date-only, RFC 3339,
//!    trailing `Z`); [`temporal::parse_date`] accepts them all, while
//!    banking-day arithmetic is Mon–Fri exact (holiday calendars are an
//!    explicit extension point, not modeled).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lcv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross the interchange boundary.

pub mod context;
pub mod error;
pub mod identity;
pub mod severity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use context::{DocumentContext, FieldLookup};
pub use error::LcvError;
pub use identity::{BankId, WorkflowType};
pub use severity::Severity;
pub use temporal::DayType;
