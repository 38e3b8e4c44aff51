//! # ICC Ruleset Families — Single Source of Truth
//!
//! Defines the [`IccRuleset`] enum covering the four base rule families
//! and the two supplements. This is the ONE definition used across the
//! stack; every `match` on `IccRuleset` must be exhaustive, so adding a
//! family forces every consumer to handle it at compile time.
//!
//! ## Identifiers
//!
//! The canonical string identifiers are the dotted forms used in
//! authored rule content and ruleset storage: `icc.ucp600`, `icc.isp98`,
//! `icc.urdg758`, `icc.urc522`, `icc.eucp2.1`, `icc.urr725`.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use lcv_core::LcvError;

/// An ICC rule family or supplement.
///
/// | Identifier | Instrument |
/// |------------|------------|
/// | `icc.ucp600` | Documentary credits |
/// | `icc.isp98` | Standby letters of credit |
/// | `icc.urdg758` | Demand guarantees |
/// | `icc.urc522` | Documentary collections |
/// | `icc.eucp2.1` | Electronic presentation supplement to UCP600 |
/// | `icc.urr725` | Bank-to-bank reimbursement supplement |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IccRuleset {
    /// UCP600 — Uniform Customs and Practice for Documentary Credits.
    Ucp600,
    /// ISP98 — International Standby Practices.
    Isp98,
    /// URDG758 — Uniform Rules for Demand Guarantees.
    Urdg758,
    /// URC522 — Uniform Rules for Collections.
    Urc522,
    /// eUCP 2.1 — electronic presentation supplement (UCP600 only).
    Eucp21,
    /// URR725 — bank-to-bank reimbursement supplement.
    Urr725,
}

/// Total number of rule families and supplements.
pub const ICC_RULESET_COUNT: usize = 6;

impl IccRuleset {
    /// All rulesets in canonical order.
    pub fn all() -> &'static [IccRuleset] {
        &[
            Self::Ucp600,
            Self::Isp98,
            Self::Urdg758,
            Self::Urc522,
            Self::Eucp21,
            Self::Urr725,
        ]
    }

    /// The dotted canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ucp600 => "icc.ucp600",
            Self::Isp98 => "icc.isp98",
            Self::Urdg758 => "icc.urdg758",
            Self::Urc522 => "icc.urc522",
            Self::Eucp21 => "icc.eucp2.1",
            Self::Urr725 => "icc.urr725",
        }
    }

    /// Whether this ruleset can serve as a base domain.
    ///
    /// Supplements only ever appear alongside a base.
    pub fn is_base(&self) -> bool {
        !matches!(self, Self::Eucp21 | Self::Urr725)
    }
}

impl std::fmt::Display for IccRuleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IccRuleset {
    type Err = LcvError;

    /// Parse a ruleset from its dotted canonical identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "icc.ucp600" => Ok(Self::Ucp600),
            "icc.isp98" => Ok(Self::Isp98),
            "icc.urdg758" => Ok(Self::Urdg758),
            "icc.urc522" => Ok(Self::Urc522),
            "icc.eucp2.1" => Ok(Self::Eucp21),
            "icc.urr725" => Ok(Self::Urr725),
            other => Err(LcvError::InvalidIdentifier(format!(
                "unknown ICC ruleset: {other:?}"
            ))),
        }
    }
}

impl Serialize for IccRuleset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IccRuleset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The outcome of ruleset-domain detection: one base family plus an
/// ordered, de-duplicated list of supplements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainResolution {
    /// The governing base family.
    pub base: IccRuleset,
    /// Supplements, in detection order, without duplicates.
    pub supplements: Vec<IccRuleset>,
}

impl DomainResolution {
    /// Base followed by supplements — the fetch order.
    pub fn domains(&self) -> Vec<IccRuleset> {
        let mut out = vec![self.base];
        for s in &self.supplements {
            if !out.contains(s) {
                out.push(*s);
            }
        }
        out
    }
}
