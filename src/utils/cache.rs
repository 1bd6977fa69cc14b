//! Assessment Cache
//!
//! Short-lived cache of finished assessments keyed by
//! (wallet, contract, tx_type). Wallet extensions tend to re-check the same
//! pending transaction several times while the user hovers "Confirm", so a
//! TTL of about a minute saves repeated RPC fan-outs.
//!
//! Thread-safe via DashMap. A TTL of 0 disables caching.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::types::{Address, RiskAssessment, TxType};
use crate::utils::constants::DEFAULT_CACHE_TTL_SECS;

/// Cache key
pub type AssessmentKey = (Address, Address, TxType);

/// Cache entry with timestamp for TTL validation
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub assessment: RiskAssessment,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= Duration::from_secs(self.ttl_secs)
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        self.ttl_secs.saturating_sub(self.created_at.elapsed().as_secs())
    }
}

#[derive(Clone)]
pub struct AssessmentCache {
    store: Arc<DashMap<AssessmentKey, CacheEntry>>,
    ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for AssessmentCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL_SECS)
    }
}

impl AssessmentCache {
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl_secs > 0
    }

    /// Cached assessment if present and fresh
    pub fn get(&self, wallet: &Address, contract: &Address, tx_type: TxType) -> Option<RiskAssessment> {
        if !self.is_enabled() {
            return None;
        }

        let key = (wallet.clone(), contract.clone(), tx_type);
        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry); // Release read lock before removing
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {} {} {}", key.0, key.1, tx_type);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "✅ CACHE HIT: {} {} {} (TTL: {}s remaining)",
                    key.0,
                    key.1,
                    tx_type,
                    entry.remaining_ttl()
                );
                Some(entry.assessment.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Store an assessment under its own (wallet, contract, tx_type)
    pub fn set(&self, assessment: &RiskAssessment) {
        if !self.is_enabled() {
            return;
        }

        let key = (
            assessment.wallet().clone(),
            assessment.contract().clone(),
            assessment.tx_type(),
        );
        self.store.insert(
            key,
            CacheEntry {
                assessment: assessment.clone(),
                created_at: Instant::now(),
                ttl_secs: self.ttl_secs,
            },
        );
    }

    /// Drop expired entries; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl_secs,
        }
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}

/// Cache statistics for the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
