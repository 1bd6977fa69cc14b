//! Scam Intelligence Store
//!
//! Read-only snapshot of addresses known to be malicious, loaded once from
//! a JSON file and shared across concurrent analyses behind `Arc`.
//!
//! Snapshot format: a JSON array of records
//! ```json
//! [{"address": "0x…", "category": "approval_drainer", "source": "chainabuse",
//!   "confidence": 0.9, "cluster_id": "inferno-drainer"}]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{Address, ScamRecord};

/// Address -> record lookup
#[derive(Debug, Clone, Default)]
pub struct ScamStore {
    records: HashMap<Address, ScamRecord>,
}

impl ScamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store; later duplicates replace earlier ones
    pub fn from_records(records: impl IntoIterator<Item = ScamRecord>) -> Self {
        let mut by_address: HashMap<Address, ScamRecord> = HashMap::new();
        for record in records {
            by_address.insert(record.address.clone(), record);
        }

        Self {
            records: by_address,
        }
    }

    /// Parse a JSON snapshot
    pub fn from_json(json: &str) -> AppResult<Self> {
        let records: Vec<ScamRecord> = serde_json::from_str(json).map_err(|e| {
            AppError::with_source(ErrorCode::RegistryInvalid, "Malformed scam registry snapshot", e)
        })?;

        for record in &records {
            if !(0.0..=1.0).contains(&record.confidence) {
                return Err(AppError::new(
                    ErrorCode::RegistryInvalid,
                    format!(
                        "Confidence {} out of range for {}",
                        record.confidence, record.address
                    ),
                ));
            }
        }

        Ok(Self::from_records(records))
    }

    /// Load a snapshot from disk
    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorCode::RegistryLoadFailed,
                format!("Cannot read scam registry at {}", path.display()),
                e,
            )
        })?;

        let store = Self::from_json(&json)?;
        info!(
            "🗂️ Scam registry loaded: {} addresses, {} clusters from {}",
            store.len(),
            store.cluster_count(),
            path.display()
        );
        Ok(store)
    }

    /// Load a snapshot, falling back to an empty registry when the file is missing
    pub fn load_or_empty(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            warn!(
                "⚠️ Scam registry not found at {}, proximity checks will find no matches",
                path.display()
            );
            return Ok(Self::new());
        }
        Self::load(path)
    }

    #[inline]
    pub fn get(&self, address: &Address) -> Option<&ScamRecord> {
        self.records.get(address)
    }

    #[inline]
    pub fn contains(&self, address: &Address) -> bool {
        self.records.contains_key(address)
    }

    /// Distinct cluster ids across all records
    pub fn cluster_count(&self) -> usize {
        self.records
            .values()
            .filter_map(|r| r.cluster_id.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
