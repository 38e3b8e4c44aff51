//! # Workflow Rule Composer
//!
//! Merges the configuration layers for one `(bank, workflow_type)` pair
//! and caches the result:
//!
//! ```text
//! base_rules[workflow_type] ⊕ policy_version.config ⊕ workflow.base_config ⊕ overrides
//! ```
//!
//! Each layer comes from the [`WorkflowConfigProvider`] collaborator. A
//! failing layer contributes nothing (warned); the composer still
//! returns a usable merge — configuration lookups must not take the
//! validation path down.
//!
//! Applying an override is an observable side effect distinct from the
//! merge: the provider is asked to increment the usage counter and
//! record the last-applied timestamp, best-effort.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::cache::EffectiveRuleCache;
use crate::merge::deep_merge;
use crate::overrides::RuleOverride;
use lcv_core::{BankId, DocumentContext, WorkflowType};

/// Error from the workflow configuration store.
#[derive(Error, Debug)]
#[error("workflow config error: {0}")]
pub struct ComposeError(pub String);

/// Collaborator supplying the configuration layers and recording
/// override usage.
pub trait WorkflowConfigProvider: Send + Sync {
    /// Base rules for a workflow type.
    fn base_rules(&self, workflow_type: &WorkflowType) -> Result<Value, ComposeError>;

    /// The bank's active policy-version configuration.
    fn policy_version_config(&self, bank_id: &BankId) -> Result<Value, ComposeError>;

    /// The bank's workflow base configuration.
    fn workflow_base_config(
        &self,
        bank_id: &BankId,
        workflow_type: &WorkflowType,
    ) -> Result<Value, ComposeError>;

    /// Live overrides for the bank and workflow, in priority order.
    fn active_overrides(
        &self,
        bank_id: &BankId,
        workflow_type: &WorkflowType,
    ) -> Result<Vec<RuleOverride>, ComposeError>;

    /// Record that an override was applied: usage counter plus
    /// last-applied timestamp. Best-effort from the composer's side.
    fn record_override_applied(&self, override_id: &str) -> Result<(), ComposeError>;
}

/// The effective-ruleset composer handle.
///
/// Construct once with its provider and share across callers; the
/// embedded cache is thread-safe.
pub struct RuleComposer {
    provider: Arc<dyn WorkflowConfigProvider>,
    cache: EffectiveRuleCache,
}

impl std::fmt::Debug for RuleComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleComposer").finish_non_exhaustive()
    }
}

impl RuleComposer {
    /// A composer with the default 15-minute cache TTL.
    pub fn new(provider: Arc<dyn WorkflowConfigProvider>) -> Self {
        Self::with_cache(provider, EffectiveRuleCache::new())
    }

    /// A composer over a custom-configured cache.
    pub fn with_cache(provider: Arc<dyn WorkflowConfigProvider>, cache: EffectiveRuleCache) -> Self {
        Self { provider, cache }
    }

    /// The effective ruleset for `(bank, workflow_type)` under the
    /// given evaluation context.
    ///
    /// Served from cache when a live entry exists; otherwise merged
    /// fresh and cached. Context-gated overrides are evaluated at merge
    /// time, so two calls inside one cache window see the same result.
    pub fn effective_rules(
        &self,
        bank_id: &BankId,
        workflow_type: &WorkflowType,
        context: &DocumentContext,
    ) -> Arc<Value> {
        if let Some(cached) = self.cache.get(bank_id, workflow_type) {
            return cached;
        }

        let merged = Arc::new(self.merge_layers(bank_id, workflow_type, context));
        self.cache.insert(bank_id, workflow_type, Arc::clone(&merged));
        merged
    }

    /// Invalidate every cached entry for a bank. Call on any override
    /// or policy-version mutation for that bank.
    pub fn invalidate_bank(&self, bank_id: &BankId) {
        self.cache.invalidate_bank(bank_id);
    }

    fn merge_layers(
        &self,
        bank_id: &BankId,
        workflow_type: &WorkflowType,
        context: &DocumentContext,
    ) -> Value {
        let mut config = layer_or_empty(
            self.provider.base_rules(workflow_type),
            "base_rules",
            bank_id,
        );
        let policy = layer_or_empty(
            self.provider.policy_version_config(bank_id),
            "policy_version_config",
            bank_id,
        );
        deep_merge(&mut config, &policy);
        let workflow = layer_or_empty(
            self.provider.workflow_base_config(bank_id, workflow_type),
            "workflow_base_config",
            bank_id,
        );
        deep_merge(&mut config, &workflow);

        let overrides = match self.provider.active_overrides(bank_id, workflow_type) {
            Ok(list) => list,
            Err(e) => {
                warn!(bank = %bank_id, error = %e, "override lookup failed; merging without overrides");
                Vec::new()
            }
        };
        let now = Utc::now();
        for ovr in &overrides {
            if !ovr.is_effective(now) || !ovr.gate_open(context) {
                continue;
            }
            if ovr.apply(&mut config) {
                if let Err(e) = self.provider.record_override_applied(&ovr.id) {
                    warn!(override_id = %ovr.id, error = %e, "override usage recording failed");
                }
            }
        }
        config
    }
}

fn layer_or_empty(result: Result<Value, ComposeError>, layer: &str, bank_id: &BankId) -> Value {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(bank = %bank_id, layer, error = %e, "config layer unavailable; treating as empty");
            Value::Object(serde_json::Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::Comparator;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn bank() -> BankId {
        BankId::new("acme").unwrap()
    }

    fn wf() -> WorkflowType {
        WorkflowType::new("lc_issuance").unwrap()
    }

    fn ctx() -> DocumentContext {
        DocumentContext::new(json!({"amount": 25000}))
    }

    #[derive(Default)]
    struct StubProvider {
        overrides: Vec<RuleOverride>,
        base_calls: AtomicUsize,
        applied: Mutex<Vec<String>>,
    }

    impl WorkflowConfigProvider for StubProvider {
        fn base_rules(&self, _wf: &WorkflowType) -> Result<Value, ComposeError> {
            self.base_calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "rules": {"amount": {"max": 100000, "currency": "USD"}},
                "checks": ["amount", "dates"]
            }))
        }

        fn policy_version_config(&self, _bank: &BankId) -> Result<Value, ComposeError> {
            Ok(json!({"rules": {"amount": {"max": 90000}}}))
        }

        fn workflow_base_config(
            &self,
            _bank: &BankId,
            _wf: &WorkflowType,
        ) -> Result<Value, ComposeError> {
            Ok(json!({"rules": {"dates": {"presentation_window": 21}}}))
        }

        fn active_overrides(
            &self,
            _bank: &BankId,
            _wf: &WorkflowType,
        ) -> Result<Vec<RuleOverride>, ComposeError> {
            Ok(self.overrides.clone())
        }

        fn record_override_applied(&self, override_id: &str) -> Result<(), ComposeError> {
            self.applied.lock().unwrap().push(override_id.to_string());
            Ok(())
        }
    }

    fn override_equals(id: &str, key: &str, value: Value, gate: Option<&str>) -> RuleOverride {
        RuleOverride {
            id: id.into(),
            workflow_id: wf(),
            rule_key: key.into(),
            comparator: Comparator::Equals,
            value_data: value,
            condition_expr: gate.map(String::from),
            effective_from: None,
            effective_to: None,
            applied_count: 0,
            last_applied_at: None,
        }
    }

    #[test]
    fn test_layers_merge_in_order() {
        let composer = RuleComposer::new(Arc::new(StubProvider::default()));
        let merged = composer.effective_rules(&bank(), &wf(), &ctx());
        // Policy layer tightened the max; base currency survives; the
        // workflow layer added its own subtree.
        assert_eq!(merged["rules"]["amount"]["max"], json!(90000));
        assert_eq!(merged["rules"]["amount"]["currency"], json!("USD"));
        assert_eq!(merged["rules"]["dates"]["presentation_window"], json!(21));
    }

    #[test]
    fn test_overrides_apply_last_and_record_usage() {
        let provider = Arc::new(StubProvider {
            overrides: vec![override_equals(
                "OVR-7",
                "rules.amount.max",
                json!(50000),
                None,
            )],
            ..Default::default()
        });
        let composer = RuleComposer::new(Arc::clone(&provider) as Arc<dyn WorkflowConfigProvider>);
        let merged = composer.effective_rules(&bank(), &wf(), &ctx());
        assert_eq!(merged["rules"]["amount"]["max"], json!(50000));
        assert_eq!(*provider.applied.lock().unwrap(), vec!["OVR-7".to_string()]);
    }

    #[test]
    fn test_gated_override_respects_context() {
        let provider = Arc::new(StubProvider {
            overrides: vec![override_equals(
                "OVR-8",
                "rules.amount.max",
                json!(50000),
                Some("$amount > 100000"),
            )],
            ..Default::default()
        });
        let composer = RuleComposer::new(Arc::clone(&provider) as Arc<dyn WorkflowConfigProvider>);
        // Context amount 25000 fails the gate; the policy-layer max holds.
        let merged = composer.effective_rules(&bank(), &wf(), &ctx());
        assert_eq!(merged["rules"]["amount"]["max"], json!(90000));
        assert!(provider.applied.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let provider = Arc::new(StubProvider::default());
        let composer = RuleComposer::new(Arc::clone(&provider) as Arc<dyn WorkflowConfigProvider>);
        let first = composer.effective_rules(&bank(), &wf(), &ctx());
        let second = composer.effective_rules(&bank(), &wf(), &ctx());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.base_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mutation_forces_fresh_merge() {
        let provider = Arc::new(StubProvider::default());
        let composer = RuleComposer::new(Arc::clone(&provider) as Arc<dyn WorkflowConfigProvider>);
        let first = composer.effective_rules(&bank(), &wf(), &ctx());
        composer.invalidate_bank(&bank());
        let second = composer.effective_rules(&bank(), &wf(), &ctx());
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(provider.base_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expired_entry_forces_fresh_merge() {
        let provider = Arc::new(StubProvider::default());
        let composer = RuleComposer::with_cache(
            Arc::clone(&provider) as Arc<dyn WorkflowConfigProvider>,
            EffectiveRuleCache::with_ttl(Duration::ZERO),
        );
        composer.effective_rules(&bank(), &wf(), &ctx());
        composer.effective_rules(&bank(), &wf(), &ctx());
        assert_eq!(provider.base_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failing_layer_degrades_to_remaining_layers() {
        struct FailingBase(StubProvider);
        impl WorkflowConfigProvider for FailingBase {
            fn base_rules(&self, _wf: &WorkflowType) -> Result<Value, ComposeError> {
                Err(ComposeError("store offline".into()))
            }
            fn policy_version_config(&self, b: &BankId) -> Result<Value, ComposeError> {
                self.0.policy_version_config(b)
            }
            fn workflow_base_config(
                &self,
                b: &BankId,
                w: &WorkflowType,
            ) -> Result<Value, ComposeError> {
                self.0.workflow_base_config(b, w)
            }
            fn active_overrides(
                &self,
                b: &BankId,
                w: &WorkflowType,
            ) -> Result<Vec<RuleOverride>, ComposeError> {
                self.0.active_overrides(b, w)
            }
            fn record_override_applied(&self, id: &str) -> Result<(), ComposeError> {
                self.0.record_override_applied(id)
            }
        }
        let composer = RuleComposer::new(Arc::new(FailingBase(StubProvider::default())));
        let merged = composer.effective_rules(&bank(), &wf(), &ctx());
        // Base layer missing, later layers still present.
        assert_eq!(merged["rules"]["amount"]["max"], json!(90000));
        assert_eq!(merged["rules"]["dates"]["presentation_window"], json!(21));
    }
}
