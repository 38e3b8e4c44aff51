//! # Live Rule Overrides
//!
//! A [`RuleOverride`] patches one dotted key of the merged configuration
//! after all static layers. Overrides carry an effective window, an
//! optional gating expression over the evaluation context, and a
//! comparator that decides how the override value meets an existing
//! value.
//!
//! ## Comparator Semantics
//!
//! - `EQUALS` — wholesale replacement.
//! - `GREATER_THAN` — keeps `max(existing, override)` only when the
//!   existing value is numeric; otherwise a no-op.
//! - `LESS_THAN` — keeps `min(existing, override)` likewise.
//! - Anything else — a no-op. Unlisted comparators are the extension
//!   point for future semantics; they must not guess.
//!
//! ## Gating Expressions
//!
//! A minimal comparator language over the context:
//! `$invoice.amount > 10000`, `$lc.currency == USD`. One path, one
//! operator, one literal. An unparseable expression or a missing path
//! gates the override OFF (logged) — a patch that cannot prove its
//! condition does not apply.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use lcv_core::{DocumentContext, WorkflowType};

/// How an override value meets the existing config value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Replace the existing value.
    Equals,
    /// Keep the maximum of existing and override (numeric existing only).
    GreaterThan,
    /// Keep the minimum of existing and override (numeric existing only).
    LessThan,
    /// An unlisted comparator: preserved, applies as a no-op.
    Unknown(String),
}

impl Comparator {
    /// Parse a comparator name. Total — unlisted names are carried as
    /// [`Comparator::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s {
            "EQUALS" => Self::Equals,
            "GREATER_THAN" => Self::GreaterThan,
            "LESS_THAN" => Self::LessThan,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "EQUALS",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::Unknown(s) => s,
        }
    }
}

impl Serialize for Comparator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Comparator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// A live override of one configuration key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOverride {
    /// Override identifier, used for usage recording.
    pub id: String,
    /// The workflow the override belongs to.
    pub workflow_id: WorkflowType,
    /// Dotted configuration key the override patches.
    pub rule_key: String,
    /// How the override value meets the existing value.
    pub comparator: Comparator,
    /// The override value.
    pub value_data: Value,
    /// Optional gating expression over the evaluation context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expr: Option<String>,
    /// Start of the effective window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<DateTime<Utc>>,
    /// End of the effective window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<DateTime<Utc>>,
    /// How many times the override has been applied.
    #[serde(default)]
    pub applied_count: u64,
    /// When the override was last applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_applied_at: Option<DateTime<Utc>>,
}

impl RuleOverride {
    /// Whether the override's effective window covers the instant.
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.effective_from.map_or(true, |from| now >= from)
            && self.effective_to.map_or(true, |to| now <= to)
    }

    /// Whether the gating expression (if any) holds for the context.
    pub fn gate_open(&self, context: &DocumentContext) -> bool {
        match &self.condition_expr {
            None => true,
            Some(expr) => match GateExpr::parse(expr) {
                Some(gate) => gate.eval(context),
                None => {
                    warn!(override_id = %self.id, expr = %expr, "unparseable override gate; override skipped");
                    false
                }
            },
        }
    }

    /// Apply this override to a merged config tree.
    ///
    /// Returns `true` when the tree was modified. Missing intermediate
    /// objects are created for `EQUALS`; the extremum comparators only
    /// ever touch an existing numeric leaf.
    pub fn apply(&self, config: &mut Value) -> bool {
        match &self.comparator {
            Comparator::Equals => {
                set_path(config, &self.rule_key, self.value_data.clone());
                true
            }
            Comparator::GreaterThan => self.apply_extremum(config, f64::max),
            Comparator::LessThan => self.apply_extremum(config, f64::min),
            Comparator::Unknown(name) => {
                warn!(override_id = %self.id, comparator = %name, "unlisted comparator is a no-op");
                false
            }
        }
    }

    fn apply_extremum(&self, config: &mut Value, pick: fn(f64, f64) -> f64) -> bool {
        let Some(override_num) = self.value_data.as_f64() else {
            warn!(override_id = %self.id, "non-numeric override value for extremum comparator");
            return false;
        };
        let Some(slot) = get_path_mut(config, &self.rule_key) else {
            return false;
        };
        let Some(existing) = slot.as_f64() else {
            return false;
        };
        let chosen = pick(existing, override_num);
        if chosen == existing {
            return false;
        }
        *slot = serde_json::Number::from_f64(chosen)
            .map_or(Value::Null, Value::Number);
        true
    }
}

/// A parsed `$path op literal` gating expression.
#[derive(Debug, Clone, PartialEq)]
pub struct GateExpr {
    path: String,
    op: GateOp,
    literal: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl GateExpr {
    /// Parse an expression of the form `$path op literal`.
    pub fn parse(expr: &str) -> Option<Self> {
        let mut parts = expr.split_whitespace();
        let path_tok = parts.next()?;
        let op_tok = parts.next()?;
        let literal_tok: Vec<&str> = parts.collect();
        if literal_tok.is_empty() {
            return None;
        }
        let literal_tok = literal_tok.join(" ");

        let path = path_tok.strip_prefix('$')?.to_string();
        if path.is_empty() {
            return None;
        }
        let op = match op_tok {
            ">" => GateOp::Gt,
            ">=" => GateOp::Gte,
            "<" => GateOp::Lt,
            "<=" => GateOp::Lte,
            "==" => GateOp::Eq,
            "!=" => GateOp::Ne,
            _ => return None,
        };
        let literal = parse_literal(&literal_tok);
        Some(Self { path, op, literal })
    }

    /// Evaluate against a context. A missing path gates OFF.
    pub fn eval(&self, context: &DocumentContext) -> bool {
        let Some(actual) = context.resolve(&self.path).value() else {
            return false;
        };
        match self.op {
            GateOp::Gt | GateOp::Gte | GateOp::Lt | GateOp::Lte => {
                let (Some(l), Some(r)) = (numeric(actual), numeric(&self.literal)) else {
                    return false;
                };
                match self.op {
                    GateOp::Gt => l > r,
                    GateOp::Gte => l >= r,
                    GateOp::Lt => l < r,
                    GateOp::Lte => l <= r,
                    _ => unreachable!(),
                }
            }
            GateOp::Eq => loose_eq(actual, &self.literal),
            GateOp::Ne => !loose_eq(actual, &self.literal),
        }
    }
}

fn parse_literal(tok: &str) -> Value {
    let trimmed = tok.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        return serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number);
    }
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    Value::String(unquoted.to_string())
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => x == y,
            _ => a == b,
        },
    }
}

fn set_path(config: &mut Value, path: &str, value: Value) {
    let mut current = config;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        if i == segments.len() - 1 {
            map.insert((*segment).to_string(), value);
            return;
        }
        current = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

fn get_path_mut<'a>(config: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = config;
    for segment in path.split('.') {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn override_with(comparator: &str, rule_key: &str, value: Value) -> RuleOverride {
        RuleOverride {
            id: "OVR-1".into(),
            workflow_id: WorkflowType::new("lc_issuance").unwrap(),
            rule_key: rule_key.into(),
            comparator: Comparator::parse(comparator),
            value_data: value,
            condition_expr: None,
            effective_from: None,
            effective_to: None,
            applied_count: 0,
            last_applied_at: None,
        }
    }

    #[test]
    fn test_equals_replaces_and_creates_path() {
        let mut config = json!({"rules": {}});
        let ovr = override_with("EQUALS", "rules.amount.max", json!(50000));
        assert!(ovr.apply(&mut config));
        assert_eq!(config["rules"]["amount"]["max"], json!(50000));
    }

    #[test]
    fn test_greater_than_keeps_max_of_numeric_existing() {
        let mut config = json!({"rules": {"limit": 100}});
        let ovr = override_with("GREATER_THAN", "rules.limit", json!(250));
        assert!(ovr.apply(&mut config));
        assert_eq!(config["rules"]["limit"], json!(250.0));

        // Existing already larger: untouched.
        let mut config = json!({"rules": {"limit": 1000}});
        assert!(!ovr.apply(&mut config));
        assert_eq!(config["rules"]["limit"], json!(1000));
    }

    #[test]
    fn test_less_than_keeps_min() {
        let mut config = json!({"rules": {"limit": 100}});
        let ovr = override_with("LESS_THAN", "rules.limit", json!(40));
        assert!(ovr.apply(&mut config));
        assert_eq!(config["rules"]["limit"], json!(40.0));
    }

    #[test]
    fn test_extremum_requires_numeric_existing() {
        let mut config = json!({"rules": {"limit": "unbounded"}});
        let ovr = override_with("GREATER_THAN", "rules.limit", json!(250));
        assert!(!ovr.apply(&mut config));
        assert_eq!(config["rules"]["limit"], json!("unbounded"));

        // Absent key: extremum comparators never create it.
        let mut config = json!({});
        assert!(!ovr.apply(&mut config));
        assert_eq!(config, json!({}));
    }

    #[test]
    fn test_unlisted_comparator_is_noop() {
        let mut config = json!({"rules": {"limit": 100}});
        let ovr = override_with("APPROXIMATELY", "rules.limit", json!(1));
        assert!(!ovr.apply(&mut config));
        assert_eq!(config["rules"]["limit"], json!(100));
    }

    #[test]
    fn test_effective_window() {
        use chrono::TimeZone;
        let mut ovr = override_with("EQUALS", "k", json!(1));
        ovr.effective_from = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        ovr.effective_to = Some(Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap());
        assert!(ovr.is_effective(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()));
        assert!(!ovr.is_effective(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
        assert!(!ovr.is_effective(Utc.with_ymd_and_hms(2027, 6, 1, 0, 0, 0).unwrap()));
    }

    // ── gate expressions ────────────────────────────────────────────

    fn ctx() -> DocumentContext {
        DocumentContext::new(json!({
            "amount": 25000,
            "lc": {"currency": "USD", "amount": "90000"}
        }))
    }

    #[test]
    fn test_gate_numeric_comparison() {
        let gate = GateExpr::parse("$amount > 10000").unwrap();
        assert!(gate.eval(&ctx()));
        let gate = GateExpr::parse("$amount <= 10000").unwrap();
        assert!(!gate.eval(&ctx()));
    }

    #[test]
    fn test_gate_dotted_path_and_numeric_string() {
        let gate = GateExpr::parse("$lc.amount >= 90000").unwrap();
        assert!(gate.eval(&ctx()));
    }

    #[test]
    fn test_gate_string_equality() {
        assert!(GateExpr::parse("$lc.currency == USD").unwrap().eval(&ctx()));
        assert!(GateExpr::parse("$lc.currency == 'USD'").unwrap().eval(&ctx()));
        assert!(GateExpr::parse("$lc.currency != EUR").unwrap().eval(&ctx()));
    }

    #[test]
    fn test_gate_missing_path_is_closed() {
        let gate = GateExpr::parse("$ghost.field > 1").unwrap();
        assert!(!gate.eval(&ctx()));
    }

    #[test]
    fn test_gate_parse_rejects_malformed() {
        assert!(GateExpr::parse("amount > 10").is_none()); // no $ prefix
        assert!(GateExpr::parse("$amount >").is_none()); // no literal
        assert!(GateExpr::parse("$amount ~ 10").is_none()); // unknown op
        assert!(GateExpr::parse("").is_none());
    }

    #[test]
    fn test_gate_open_on_override() {
        let mut ovr = override_with("EQUALS", "k", json!(1));
        ovr.condition_expr = Some("$amount > 10000".into());
        assert!(ovr.gate_open(&ctx()));
        ovr.condition_expr = Some("$amount > 90000".into());
        assert!(!ovr.gate_open(&ctx()));
        // Unparseable gates OFF.
        ovr.condition_expr = Some("nonsense".into());
        assert!(!ovr.gate_open(&ctx()));
    }

    #[test]
    fn test_comparator_serde_roundtrip() {
        let ovr = override_with("GREATER_THAN", "k", json!(1));
        let json = serde_json::to_value(&ovr).unwrap();
        assert_eq!(json["comparator"], "GREATER_THAN");
        let back: RuleOverride = serde_json::from_value(json).unwrap();
        assert_eq!(back.comparator, Comparator::GreaterThan);
    }
}
