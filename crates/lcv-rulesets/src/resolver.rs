//! # Ruleset-Domain Detection
//!
//! Scans a document's free-text fields and metadata flags for ICC
//! ruleset signals and resolves them to one base family plus
//! supplements under a fixed precedence.
//!
//! ## Precedence
//!
//! ```text
//! ISP98 > URDG758 / guarantee flag > UCP600 > URC522 / collection flag > UCP600 (default)
//! ```
//!
//! Two documented conflict cases:
//!
//! - ISP98 and UCP600 signals together: standby practice wins; a warning
//!   records the conflict.
//! - URDG text alongside ISP98: the guarantee context wins — URDG758 is
//!   chosen, warned.
//!
//! A `collection` metadata flag forces URC522 as a final override after
//! all other precedence, including ISP98.
//!
//! ## Supplements
//!
//! `icc.eucp2.1` is appended only when the resolved base is UCP600 and
//! eUCP + version text is present. `icc.urr725` is appended whenever its
//! token appears, independent of the base.

use serde_json::Value;
use tracing::warn;

use crate::domain::{DomainResolution, IccRuleset};
use lcv_core::DocumentContext;

/// Free-text paths scanned for ruleset tokens.
const SCANNED_TEXT_FIELDS: &[&str] = &[
    "applicable_rules",
    "clauses",
    "narrative",
    "additional_conditions",
    "lc.applicable_rules",
    "lc.clauses",
    "lc.narrative",
    "lc.additional_conditions",
];

/// Metadata flag paths. A boolean `true` at any of these counts.
const GUARANTEE_FLAGS: &[&str] = &["guarantee", "meta.guarantee", "lc.guarantee"];
const COLLECTION_FLAGS: &[&str] = &["collection", "meta.collection", "lc.collection"];

#[derive(Debug, Default)]
struct Signals {
    isp98: bool,
    ucp600: bool,
    urdg758: bool,
    urc522: bool,
    eucp_version: bool,
    urr725: bool,
    guarantee_flag: bool,
    collection_flag: bool,
}

/// Detect the governing ICC ruleset domains for a document set.
///
/// Never fails: a document with no signals at all resolves to the
/// UCP600 default with no supplements.
pub fn resolve_ruleset_domains(data: &DocumentContext) -> DomainResolution {
    let signals = scan(data);

    let mut base = if signals.isp98 && signals.urdg758 {
        warn!("ISP98 and URDG758 signals co-occur; preferring URDG758 for guarantee context");
        IccRuleset::Urdg758
    } else if signals.isp98 {
        if signals.ucp600 {
            warn!("ISP98 and UCP600 signals co-occur; preferring ISP98");
        }
        IccRuleset::Isp98
    } else if signals.urdg758 || signals.guarantee_flag {
        IccRuleset::Urdg758
    } else if signals.ucp600 {
        IccRuleset::Ucp600
    } else if signals.urc522 {
        IccRuleset::Urc522
    } else {
        IccRuleset::Ucp600
    };

    // The collection flag is a final override, applied after all other
    // precedence.
    if signals.collection_flag && base != IccRuleset::Urc522 {
        warn!(resolved = %base, "collection flag forces icc.urc522 over resolved base");
        base = IccRuleset::Urc522;
    }

    let mut supplements = Vec::new();
    if base == IccRuleset::Ucp600 && signals.eucp_version {
        supplements.push(IccRuleset::Eucp21);
    }
    if signals.urr725 {
        supplements.push(IccRuleset::Urr725);
    }

    DomainResolution { base, supplements }
}

fn scan(data: &DocumentContext) -> Signals {
    let mut text = String::new();
    for path in SCANNED_TEXT_FIELDS {
        if let Some(v) = data.resolve(path).value() {
            collect_text(v, &mut text);
        }
    }
    let normalized = normalize(&text);

    Signals {
        isp98: normalized.contains("isp98"),
        ucp600: normalized.contains("ucp600"),
        urdg758: normalized.contains("urdg758") || normalized.contains("urdg"),
        urc522: normalized.contains("urc522"),
        eucp_version: normalized.contains("eucp")
            && (normalized.contains("2.1") || normalized.contains("latest")),
        urr725: normalized.contains("urr725"),
        guarantee_flag: flag_set(data, GUARANTEE_FLAGS),
        collection_flag: flag_set(data, COLLECTION_FLAGS),
    }
}

/// Lowercase and strip spaces/hyphens so `ISP 98`, `isp-98`, and
/// `isp98` all hit the same token.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect()
}

fn collect_text(v: &Value, out: &mut String) {
    match v {
        Value::String(s) => {
            out.push_str(s);
            out.push('\n');
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

fn flag_set(data: &DocumentContext, paths: &[&str]) -> bool {
    paths
        .iter()
        .any(|p| data.resolve(p).value().and_then(Value::as_bool) == Some(true))
}
