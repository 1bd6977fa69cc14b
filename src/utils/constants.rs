//! Constants Module - Single Source of Truth
//!
//! Every default weight, threshold, timeout and endpoint used across the
//! engine is defined here. Other modules read these through `RiskConfig`
//! and `ServiceConfig`, never as literals.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "WalletWork";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = "WalletWork/0.1.0";

// ============================================
// RPC / PROVIDER CONSTANTS
// ============================================

/// Default timeout for a single HTTP request to an RPC node (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default per-fetch budget used by the signal collector (milliseconds)
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 4_000;

/// Default number of recent transfer edges kept per wallet
pub const DEFAULT_MAX_TRANSFERS: usize = 100;

/// Default number of counterparties whose own transfers are fetched
pub const DEFAULT_NEIGHBOR_FANOUT: usize = 5;

/// Transfer edges fetched per counterparty during neighbour expansion
pub const NEIGHBOR_TRANSFER_LIMIT: usize = 20;

/// Public Ethereum RPC used when no Alchemy key is configured
pub const PUBLIC_RPC_FALLBACK: &str = "https://eth.llamarpc.com";

/// Etherscan-compatible explorer API
pub const DEFAULT_EXPLORER_API_URL: &str = "https://api.etherscan.io/api";

/// Default scam registry snapshot location
pub const DEFAULT_SCAM_REGISTRY_PATH: &str = "./data/scam_registry.json";

/// Default assessment cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Default HTTP bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Maximum requests accepted by the batch endpoint
pub const MAX_BATCH_SIZE: usize = 50;

// ============================================
// ADDRESS FORMAT
// ============================================

/// Length of a normalized address including the `0x` prefix
pub const ADDRESS_LEN: usize = 42;

// ============================================
// RISK WEIGHTS (additive points)
// ============================================

pub const WEIGHT_ZERO_HISTORY: u32 = 30;
pub const WEIGHT_LOW_ACTIVITY: u32 = 15;
pub const WEIGHT_UNVERIFIED_CONTRACT: u32 = 35;
pub const WEIGHT_HOP_0: u32 = 50;
pub const WEIGHT_HOP_1: u32 = 35;
pub const WEIGHT_HOP_2: u32 = 20;
pub const WEIGHT_HOP_3: u32 = 10;
pub const WEIGHT_APPROVE: u32 = 25;
pub const WEIGHT_DRAIN_HIGH: u32 = 25;
pub const WEIGHT_DRAIN_ELEVATED: u32 = 15;
pub const WEIGHT_SWAP: u32 = 10;
pub const WEIGHT_TRANSFER: u32 = 5;
pub const WEIGHT_SUSPICIOUS_CONTRACT: u32 = 25;
pub const WEIGHT_NULL_PREFIX_WALLET: u32 = 15;

/// Drain probability at or above which the high drain tier applies
pub const DRAIN_HIGH_THRESHOLD: f64 = 0.8;

/// Drain probability at or above which the elevated drain tier applies
pub const DRAIN_ELEVATED_THRESHOLD: f64 = 0.5;

/// Simulator input: points added for an unverified smart contract
pub const CONTRACT_RISK_UNVERIFIED: u32 = 60;

/// Simulator input: points added when the wallet is near a scam cluster
pub const CONTRACT_RISK_CLUSTER: u32 = 30;

// ============================================
// VERDICT BANDS
// ============================================

/// Highest score still considered SAFE
pub const SAFE_MAX_SCORE: u8 = 29;

/// Highest score still considered CAUTION
pub const CAUTION_MAX_SCORE: u8 = 69;

/// Hard cap on the final score
pub const MAX_SCORE: u32 = 100;

// ============================================
// HEURISTICS
// ============================================

/// Wallets with fewer transactions than this are "low activity"
pub const LOW_ACTIVITY_THRESHOLD: u64 = 3;

/// Maximum BFS depth when searching for scam proximity
pub const PROXIMITY_MAX_DEPTH: u8 = 3;

/// Hop distances up to this value count as "linked to a scam cluster"
pub const CLUSTER_HOP_THRESHOLD: u8 = 2;

/// Contract address substrings that look like vanity scam deployments
pub const DEFAULT_SUSPICIOUS_SUBSTRINGS: [&str; 2] = ["dead", "bad"];

/// Wallet prefix shared by burn/null-like and bot addresses
pub const DEFAULT_NULL_PREFIX: &str = "0x000";

// ============================================
// CHAIN HEURISTICS
// ============================================

/// Approximate Ethereum block time, used to turn block deltas into days
pub const SECONDS_PER_BLOCK: u64 = 12;

/// Seconds per day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Build an Alchemy mainnet URL from an API key
pub fn build_alchemy_url(api_key: &str) -> String {
    format!("https://eth-mainnet.g.alchemy.com/v2/{}", api_key)
}

/// Mask the key segment of an RPC URL for logging
pub fn mask_url(url: &str) -> String {
    match url.split_once("/v2/") {
        Some((base, _)) => format!("{}/v2/***HIDDEN***", base),
        None => url.to_string(),
    }
}
