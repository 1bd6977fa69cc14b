//! WalletWork Library
//!
//! Pre-signing risk engine for blockchain transactions. Before a user signs,
//! it answers "how dangerous is this?" with a 0-100 score, a verdict and
//! human-readable reasons, built from:
//! - On-chain signals (wallet activity, contract code and verification)
//! - Scam-proximity graph analysis against a registry of flagged addresses
//! - Deterministic fraud simulation (drain probability, attack window)
//!
//! Data sources that fail fall back to neutral defaults; the degradation is
//! recorded on the assessment instead of failing the request.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{FraudSimulator, ProximityAnalyzer, RiskAggregator, RiskEngine};
pub use models::{
    Address, AppError, AppResult, ErrorCode, HopDistance, Observed, ProximityResult, RiskAssessment,
    RiskConfig, ScamRecord, ServiceConfig, SimulationResult, TxType, Verdict,
};
pub use providers::{ChainDataSource, LiveChainSource, ScamStore};
pub use utils::{AssessmentCache, TelemetryCollector};
