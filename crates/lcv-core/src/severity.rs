//! # Severity — Single Source of Truth
//!
//! Defines the `Severity` ladder used by rules, overlays, and exceptions.
//! This is the ONE definition used across the entire engine; downgrade
//! semantics live here so no policy layer can invent its own ordering.
//!
//! ## Ladder
//!
//! ```text
//! critical → major → minor        (downgrade moves one step right)
//! info                            (informational; outside the ladder)
//! ```
//!
//! A `downgrade()` of `Minor` stays `Minor` — exceptions step a finding
//! down the ladder, they do not reclassify it as informational. `Info` is
//! reserved for waived findings and not-applicable outcomes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LcvError;

/// Severity of a rule finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Discrepancy that blocks document acceptance outright.
    Critical,
    /// Material discrepancy requiring correction or waiver.
    Major,
    /// Cosmetic or low-impact discrepancy.
    Minor,
    /// Informational — waived findings and not-applicable outcomes.
    Info,
}

impl Severity {
    /// All severities in ladder order, worst first.
    pub fn all() -> &'static [Severity] {
        &[Self::Critical, Self::Major, Self::Minor, Self::Info]
    }

    /// Returns the snake_case string identifier for this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Info => "info",
        }
    }

    /// One step down the critical → major → minor ladder.
    ///
    /// `Minor` and `Info` are fixed points: a downgrade exception on a
    /// minor finding leaves it minor, and informational outcomes are
    /// never reclassified.
    pub fn downgrade(self) -> Self {
        match self {
            Self::Critical => Self::Major,
            Self::Major => Self::Minor,
            Self::Minor => Self::Minor,
            Self::Info => Self::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LcvError;

    /// Parse a severity from its snake_case identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Self::Critical),
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "info" => Ok(Self::Info),
            other => Err(LcvError::InvalidIdentifier(format!(
                "unknown severity: {other:?}"
            ))),
        }
    }
}
