//! # Effective-Ruleset Cache
//!
//! Per `(bank, workflow_type)` cache of merged configuration with a
//! 15-minute TTL and per-bank generation counters.
//!
//! ## Invalidation
//!
//! Any override or policy-version mutation for a bank must invalidate
//! every cache entry for that bank, atomically with respect to
//! concurrent lookups. Rather than scanning keys by prefix, each bank
//! has a generation counter; entries record the generation they were
//! built under, and a lookup whose entry carries a stale generation is
//! a miss. [`EffectiveRuleCache::invalidate_bank`] is one counter bump:
//! O(1), and no reader can observe a half-invalidated bank.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use lcv_core::{BankId, WorkflowType};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<Value>,
    inserted_at: Instant,
    generation: u64,
}

/// Thread-safe effective-ruleset cache.
///
/// Shared across callers via the composer; all methods take `&self`.
#[derive(Debug)]
pub struct EffectiveRuleCache {
    entries: DashMap<(BankId, WorkflowType), CacheEntry>,
    generations: DashMap<BankId, u64>,
    ttl: Duration,
}

impl EffectiveRuleCache {
    /// A cache with the default 15-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// A cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
            ttl,
        }
    }

    /// The current generation for a bank.
    pub fn generation(&self, bank_id: &BankId) -> u64 {
        self.generations.get(bank_id).map_or(0, |g| *g)
    }

    /// Look up a live entry: present, unexpired, and built under the
    /// bank's current generation.
    pub fn get(&self, bank_id: &BankId, workflow_type: &WorkflowType) -> Option<Arc<Value>> {
        let key = (bank_id.clone(), workflow_type.clone());
        let entry = self.entries.get(&key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        if entry.generation != self.generation(bank_id) {
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    /// Store a freshly merged ruleset under the bank's current
    /// generation.
    pub fn insert(&self, bank_id: &BankId, workflow_type: &WorkflowType, value: Arc<Value>) {
        let generation = self.generation(bank_id);
        self.entries.insert(
            (bank_id.clone(), workflow_type.clone()),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                generation,
            },
        );
    }

    /// Invalidate every entry for a bank in O(1) by bumping its
    /// generation.
    pub fn invalidate_bank(&self, bank_id: &BankId) {
        *self.generations.entry(bank_id.clone()).or_insert(0) += 1;
    }
}

impl Default for EffectiveRuleCache {
    fn default() -> Self {
        Self::new()
    }
}
