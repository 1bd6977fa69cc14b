//! Configuration module for WalletWork
//!
//! Defaults come from utils/constants.rs; environment variables may
//! override a subset. Both structs are built once at process start and
//! shared behind `Arc`, never mutated afterwards.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::*;

/// Additive points per rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskWeights {
    pub zero_history: u32,
    pub low_activity: u32,
    pub unverified_contract: u32,
    /// Indexed by hop distance 0..=3
    pub hop: [u32; 4],
    pub approve: u32,
    pub drain_high: u32,
    pub drain_elevated: u32,
    pub swap: u32,
    pub transfer: u32,
    pub suspicious_contract: u32,
    pub null_prefix_wallet: u32,
    /// Simulator input weights
    pub contract_risk_unverified: u32,
    pub contract_risk_cluster: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            zero_history: WEIGHT_ZERO_HISTORY,
            low_activity: WEIGHT_LOW_ACTIVITY,
            unverified_contract: WEIGHT_UNVERIFIED_CONTRACT,
            hop: [WEIGHT_HOP_0, WEIGHT_HOP_1, WEIGHT_HOP_2, WEIGHT_HOP_3],
            approve: WEIGHT_APPROVE,
            drain_high: WEIGHT_DRAIN_HIGH,
            drain_elevated: WEIGHT_DRAIN_ELEVATED,
            swap: WEIGHT_SWAP,
            transfer: WEIGHT_TRANSFER,
            suspicious_contract: WEIGHT_SUSPICIOUS_CONTRACT,
            null_prefix_wallet: WEIGHT_NULL_PREFIX_WALLET,
            contract_risk_unverified: CONTRACT_RISK_UNVERIFIED,
            contract_risk_cluster: CONTRACT_RISK_CLUSTER,
        }
    }
}

impl RiskWeights {
    /// Points for a hop distance; distances past the table score nothing
    pub fn for_hops(&self, hops: u8) -> u32 {
        self.hop.get(hops as usize).copied().unwrap_or(0)
    }
}

/// Immutable scoring configuration
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    /// Highest SAFE score
    pub safe_max: u8,
    /// Highest CAUTION score
    pub caution_max: u8,
    pub drain_high_threshold: f64,
    pub drain_elevated_threshold: f64,
    /// Wallets with fewer transactions are "low activity"
    pub low_activity_threshold: u64,
    pub suspicious_substrings: Vec<String>,
    pub null_prefix: String,
    pub proximity_max_depth: u8,
    pub cluster_hop_threshold: u8,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            safe_max: SAFE_MAX_SCORE,
            caution_max: CAUTION_MAX_SCORE,
            drain_high_threshold: DRAIN_HIGH_THRESHOLD,
            drain_elevated_threshold: DRAIN_ELEVATED_THRESHOLD,
            low_activity_threshold: LOW_ACTIVITY_THRESHOLD,
            suspicious_substrings: DEFAULT_SUSPICIOUS_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            null_prefix: DEFAULT_NULL_PREFIX.to_string(),
            proximity_max_depth: PROXIMITY_MAX_DEPTH,
            cluster_hop_threshold: CLUSTER_HOP_THRESHOLD,
        }
    }
}

impl RiskConfig {
    /// Defaults plus environment overrides
    ///
    /// Environment:
    ///   WALLETWORK_SUSPICIOUS_SUBSTRINGS - comma-separated contract substrings
    ///   WALLETWORK_NULL_PREFIX           - null-like wallet prefix
    ///   WALLETWORK_CLUSTER_HOPS          - max hops counted as cluster-linked
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("WALLETWORK_SUSPICIOUS_SUBSTRINGS") {
            config.suspicious_substrings = raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(prefix) = std::env::var("WALLETWORK_NULL_PREFIX") {
            config.null_prefix = prefix.trim().to_lowercase();
        }

        if let Ok(raw) = std::env::var("WALLETWORK_CLUSTER_HOPS") {
            config.cluster_hop_threshold = raw.trim().parse().map_err(|_| {
                AppError::invalid_config(format!("WALLETWORK_CLUSTER_HOPS is not a number: {}", raw))
            })?;
        }

        config.validate()?;
        info!(
            "⚙️ Risk config loaded: bands SAFE≤{} CAUTION≤{}, {} suspicious substrings, cluster ≤{} hops",
            config.safe_max,
            config.caution_max,
            config.suspicious_substrings.len(),
            config.cluster_hop_threshold
        );
        Ok(config)
    }

    /// Reject configurations that would break band exclusivity or BFS limits
    pub fn validate(&self) -> AppResult<()> {
        if self.safe_max >= self.caution_max {
            return Err(AppError::invalid_config("safe_max must be below caution_max"));
        }
        if self.caution_max >= MAX_SCORE as u8 {
            return Err(AppError::invalid_config("caution_max must be below 100"));
        }
        if self.cluster_hop_threshold > self.proximity_max_depth {
            return Err(AppError::invalid_config(
                "cluster_hop_threshold cannot exceed proximity_max_depth",
            ));
        }
        if self.drain_elevated_threshold > self.drain_high_threshold {
            return Err(AppError::invalid_config(
                "drain_elevated_threshold cannot exceed drain_high_threshold",
            ));
        }
        Ok(())
    }
}

/// Runtime wiring for providers and the HTTP surface
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP JSON-RPC endpoint (Alchemy preferred, transfers need it)
    pub rpc_url: String,
    /// Etherscan-compatible explorer API
    pub explorer_url: String,
    pub explorer_api_key: Option<String>,
    /// Independent budget for each collector fetch
    pub fetch_timeout: Duration,
    /// Recent transfer edges kept per wallet
    pub max_transfers: usize,
    /// Counterparties whose own transfers are fetched (0 disables)
    pub neighbor_fanout: usize,
    pub registry_path: PathBuf,
    pub cache_ttl_secs: u64,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rpc_url: PUBLIC_RPC_FALLBACK.to_string(),
            explorer_url: DEFAULT_EXPLORER_API_URL.to_string(),
            explorer_api_key: None,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            max_transfers: DEFAULT_MAX_TRANSFERS,
            neighbor_fanout: DEFAULT_NEIGHBOR_FANOUT,
            registry_path: PathBuf::from(DEFAULT_SCAM_REGISTRY_PATH),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    /// Read environment with defaults
    ///
    /// Environment:
    ///   ETH_HTTP_URL / ALCHEMY_API_KEY - RPC endpoint
    ///   ETHERSCAN_API_KEY, ETHERSCAN_API_URL
    ///   WALLETWORK_FETCH_TIMEOUT_MS, WALLETWORK_MAX_TRANSFERS, WALLETWORK_NEIGHBOR_FANOUT
    ///   WALLETWORK_SCAM_REGISTRY, WALLETWORK_CACHE_TTL_SECS
    ///   WALLETWORK_HOST, PORT / WALLETWORK_PORT
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_non_empty("ETH_HTTP_URL") {
            config.rpc_url = url;
        } else if let Some(key) = env_non_empty("ALCHEMY_API_KEY").filter(|k| k != "YOUR_API_KEY") {
            info!("🔑 ALCHEMY_API_KEY configured (key hidden for security)");
            config.rpc_url = build_alchemy_url(&key);
        } else {
            warn!("⚠️ No ETH_HTTP_URL or ALCHEMY_API_KEY set, using public RPC (transfer history unavailable)");
        }

        if let Some(url) = env_non_empty("ETHERSCAN_API_URL") {
            config.explorer_url = url;
        }
        config.explorer_api_key = env_non_empty("ETHERSCAN_API_KEY");

        if let Some(ms) = env_parsed::<u64>("WALLETWORK_FETCH_TIMEOUT_MS") {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = env_parsed::<usize>("WALLETWORK_MAX_TRANSFERS") {
            config.max_transfers = n;
        }
        if let Some(n) = env_parsed::<usize>("WALLETWORK_NEIGHBOR_FANOUT") {
            config.neighbor_fanout = n;
        }
        if let Some(path) = env_non_empty("WALLETWORK_SCAM_REGISTRY") {
            config.registry_path = PathBuf::from(path);
        }
        if let Some(ttl) = env_parsed::<u64>("WALLETWORK_CACHE_TTL_SECS") {
            config.cache_ttl_secs = ttl;
        }
        if let Some(host) = env_non_empty("WALLETWORK_HOST") {
            config.host = host;
        }
        // Railway-style PORT first, WALLETWORK_PORT for local dev
        if let Some(port) = env_parsed::<u16>("PORT").or_else(|| env_parsed("WALLETWORK_PORT")) {
            config.port = port;
        }

        config
    }

    /// RPC URL safe for logs
    pub fn masked_rpc_url(&self) -> String {
        mask_url(&self.rpc_url)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_non_empty(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("⚠️ Ignoring {}={} (not a valid value)", key, raw);
            None
        }
    }
}
