//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the LCV engine. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! The engine's user-visible contract is "always return a result":
//! malformed rule content degrades detection coverage, never availability.
//! The error types here exist so that *internal* layers can distinguish
//! "ambiguous input, degraded result" from "genuine bug" — they are
//! consumed inside the engine and logged, not surfaced to callers of the
//! batch entry points.

use thiserror::Error;

/// Top-level error type for the LCV engine.
#[derive(Error, Debug)]
pub enum LcvError {
    /// An identifier failed construction-time validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A date string could not be parsed in any accepted shape.
    #[error("unparseable date: {0:?}")]
    UnparseableDate(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LcvError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
