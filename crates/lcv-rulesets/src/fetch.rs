//! # Ruleset Fetching — Timeout, Fallback, Provenance
//!
//! The ruleset store is a network collaborator. The engine invokes it
//! through the [`RulesetFetcher`] trait with a hard deadline and a
//! documented fallback path:
//!
//! 1. Ask the primary fetcher, bounded by the deadline.
//! 2. On failure or timeout, ask the fallback fetcher (typically a
//!    legacy or cached rule source), bounded the same way.
//! 3. If both fail, the domain contributes no rules and the merged
//!    result is marked `degraded`.
//!
//! An empty, degraded result is indistinguishable from "compliant" to a
//! caller that only counts violations — the `degraded` flag exists so
//! callers can tell the difference. See DESIGN.md.
//!
//! Every fetched rule is tagged with its origin domain and ruleset
//! version so downstream outcomes carry provenance.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::domain::{DomainResolution, IccRuleset};
use lcv_rules::Rule;

/// Error returned by a ruleset fetch attempt.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The fetcher did not answer within the deadline.
    #[error("ruleset fetch for {domain} timed out after {waited_ms}ms")]
    Timeout {
        /// The domain being fetched.
        domain: IccRuleset,
        /// How long the orchestrator waited.
        waited_ms: u64,
    },
    /// The fetcher answered with a failure.
    #[error("ruleset source unavailable: {0}")]
    Unavailable(String),
}

/// One domain's rules as returned by a ruleset store.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RulesetBundle {
    /// The rules of this domain.
    pub rules: Vec<Rule>,
    /// Version of the ruleset content.
    pub ruleset_version: String,
    /// Version of the rulebook the content was compiled from.
    pub rulebook_version: String,
}

/// Collaborator trait for the ruleset store, keyed by
/// `(domain, jurisdiction)`.
pub trait RulesetFetcher: Send + Sync + 'static {
    /// Fetch the rules of one domain for a jurisdiction.
    fn fetch(&self, domain: IccRuleset, jurisdiction: &str) -> Result<RulesetBundle, FetchError>;
}

/// Provenance of one fetched domain.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RulesetSource {
    /// The fetched domain.
    pub domain: IccRuleset,
    /// Ruleset content version.
    pub ruleset_version: String,
    /// Rulebook version.
    pub rulebook_version: String,
    /// Whether this domain came from the fallback fetcher.
    pub from_fallback: bool,
}

/// Merged fetch result across all resolved domains.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FetchedRules {
    /// All rules, in domain order, each tagged with provenance.
    pub rules: Vec<Rule>,
    /// Per-domain source records.
    pub sources: Vec<RulesetSource>,
    /// True when at least one domain could not be fetched from any
    /// source. Degraded coverage, not an error.
    pub degraded: bool,
}

/// Fetch the rules for every resolved domain, in order.
///
/// Primary failures fall back; double failures degrade. Never returns
/// an error — the engine's availability contract extends to its
/// dependencies.
pub fn fetch_rules_for_domains(
    resolution: &DomainResolution,
    jurisdiction: &str,
    primary: Arc<dyn RulesetFetcher>,
    fallback: Option<Arc<dyn RulesetFetcher>>,
    deadline: Duration,
) -> FetchedRules {
    let mut out = FetchedRules::default();

    for domain in resolution.domains() {
        let bundle = match fetch_with_deadline(Arc::clone(&primary), domain, jurisdiction, deadline)
        {
            Ok(bundle) => Some((bundle, false)),
            Err(e) => {
                warn!(domain = %domain, error = %e, "primary ruleset fetch failed");
                match &fallback {
                    Some(fb) => {
                        match fetch_with_deadline(Arc::clone(fb), domain, jurisdiction, deadline) {
                            Ok(bundle) => Some((bundle, true)),
                            Err(e) => {
                                warn!(domain = %domain, error = %e, "fallback ruleset fetch failed");
                                None
                            }
                        }
                    }
                    None => None,
                }
            }
        };

        match bundle {
            Some((bundle, from_fallback)) => {
                out.sources.push(RulesetSource {
                    domain,
                    ruleset_version: bundle.ruleset_version.clone(),
                    rulebook_version: bundle.rulebook_version.clone(),
                    from_fallback,
                });
                out.rules.extend(bundle.rules.into_iter().map(|mut rule| {
                    rule.origin_domain = Some(domain.as_str().to_string());
                    rule.origin_version = Some(bundle.ruleset_version.clone());
                    rule
                }));
            }
            None => {
                out.degraded = true;
            }
        }
    }

    if out.degraded {
        warn!(
            jurisdiction,
            fetched = out.sources.len(),
            "ruleset coverage degraded: at least one domain returned no rules"
        );
    }
    out
}

/// Run one fetch on its own thread, bounded by the deadline.
///
/// A fetcher that overruns the deadline is abandoned: its thread
/// finishes on its own and the late result is discarded.
fn fetch_with_deadline(
    fetcher: Arc<dyn RulesetFetcher>,
    domain: IccRuleset,
    jurisdiction: &str,
    deadline: Duration,
) -> Result<RulesetBundle, FetchError> {
    let (tx, rx) = mpsc::channel();
    let jurisdiction = jurisdiction.to_string();
    thread::spawn(move || {
        let result = fetcher.fetch(domain, &jurisdiction);
        // The receiver may have given up; a closed channel is fine.
        let _ = tx.send(result);
    });
    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            domain,
            waited_ms: deadline.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticFetcher {
        version: &'static str,
        fail: bool,
        delay: Option<Duration>,
    }

    impl RulesetFetcher for StaticFetcher {
        fn fetch(
            &self,
            domain: IccRuleset,
            _jurisdiction: &str,
        ) -> Result<RulesetBundle, FetchError> {
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            if self.fail {
                return Err(FetchError::Unavailable("store offline".into()));
            }
            let rule: Rule = serde_json::from_value(json!({
                "id": format!("{}-R1", domain.as_str()),
                "conditions": [{"field": "lc.amount", "operator": "exists"}]
            }))
            .unwrap();
            Ok(RulesetBundle {
                rules: vec![rule],
                ruleset_version: self.version.to_string(),
                rulebook_version: "rb-2026.1".to_string(),
            })
        }
    }

    fn resolution() -> DomainResolution {
        DomainResolution {
            base: IccRuleset::Ucp600,
            supplements: vec![IccRuleset::Urr725],
        }
    }

    #[test]
    fn test_fetch_tags_provenance() {
        let primary = Arc::new(StaticFetcher {
            version: "v7",
            fail: false,
            delay: None,
        });
        let fetched = fetch_rules_for_domains(
            &resolution(),
            "SG",
            primary,
            None,
            Duration::from_secs(1),
        );
        assert!(!fetched.degraded);
        assert_eq!(fetched.rules.len(), 2);
        assert_eq!(fetched.rules[0].origin_domain.as_deref(), Some("icc.ucp600"));
        assert_eq!(fetched.rules[1].origin_domain.as_deref(), Some("icc.urr725"));
        assert!(fetched.rules.iter().all(|r| r.origin_version.as_deref() == Some("v7")));
        assert_eq!(fetched.sources.len(), 2);
    }

    #[test]
    fn test_primary_failure_uses_fallback() {
        let primary = Arc::new(StaticFetcher {
            version: "v7",
            fail: true,
            delay: None,
        });
        let fallback: Arc<dyn RulesetFetcher> = Arc::new(StaticFetcher {
            version: "legacy-3",
            fail: false,
            delay: None,
        });
        let fetched = fetch_rules_for_domains(
            &resolution(),
            "SG",
            primary,
            Some(fallback),
            Duration::from_secs(1),
        );
        assert!(!fetched.degraded);
        assert!(fetched.sources.iter().all(|s| s.from_fallback));
        assert!(fetched
            .rules
            .iter()
            .all(|r| r.origin_version.as_deref() == Some("legacy-3")));
    }

    #[test]
    fn test_double_failure_degrades_to_empty() {
        let primary = Arc::new(StaticFetcher {
            version: "v7",
            fail: true,
            delay: None,
        });
        let fallback: Arc<dyn RulesetFetcher> = Arc::new(StaticFetcher {
            version: "legacy-3",
            fail: true,
            delay: None,
        });
        let fetched = fetch_rules_for_domains(
            &resolution(),
            "SG",
            primary,
            Some(fallback),
            Duration::from_secs(1),
        );
        assert!(fetched.degraded);
        assert!(fetched.rules.is_empty());
        assert!(fetched.sources.is_empty());
    }

    #[test]
    fn test_slow_primary_times_out_into_fallback() {
        let primary = Arc::new(StaticFetcher {
            version: "v7",
            fail: false,
            delay: Some(Duration::from_millis(250)),
        });
        let fallback: Arc<dyn RulesetFetcher> = Arc::new(StaticFetcher {
            version: "legacy-3",
            fail: false,
            delay: None,
        });
        let fetched = fetch_rules_for_domains(
            &resolution(),
            "SG",
            primary,
            Some(fallback),
            Duration::from_millis(20),
        );
        assert!(!fetched.degraded);
        assert!(fetched.sources.iter().all(|s| s.from_fallback));
    }

    #[test]
    fn test_no_fallback_degrades_on_failure() {
        let primary = Arc::new(StaticFetcher {
            version: "v7",
            fail: true,
            delay: None,
        });
        let fetched = fetch_rules_for_domains(
            &resolution(),
            "SG",
            primary,
            None,
            Duration::from_secs(1),
        );
        assert!(fetched.degraded);
    }
}
