//! Type definitions for WalletWork
//! All core data structures flowing from the signal collector through the
//! proximity analyzer, fraud simulator and risk aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::ADDRESS_LEN;

// ============================================
// Address
// ============================================

/// Normalized chain address (lowercase `0x` + 40 hex chars).
///
/// `Address::parse` is the strict validator used by the API and CLI.
/// Anything deserialized or built with `Address::normalized` is only
/// lowercased, so the core can still receive an address of unknown
/// validity without crashing on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validate and normalize a raw address
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if !trimmed.starts_with("0x") {
            return Err(AppError::invalid_address("Address must start with 0x"));
        }
        if trimmed.len() != ADDRESS_LEN {
            return Err(AppError::invalid_address(format!(
                "Address must be {} characters long",
                ADDRESS_LEN
            )));
        }

        let parsed = alloy_primitives::Address::from_str(trimmed)
            .map_err(|e| AppError::invalid_address(format!("Invalid hex address: {}", e)))?;

        Ok(Self(format!("0x{}", hex::encode(parsed.as_slice()))))
    }

    /// Lowercase without validating
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the address has the canonical shape
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ADDRESS_LEN
            && self.0.starts_with("0x")
            && self.0[2..].bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::normalized(&raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl FromStr for Address {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================
// Transaction type
// ============================================

/// Kind of transaction the user is about to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Approve,
    Swap,
    Transfer,
    Send,
}

impl TxType {
    pub const ALL: [TxType; 4] = [TxType::Approve, TxType::Swap, TxType::Transfer, TxType::Send];

    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Approve => "approve",
            TxType::Swap => "swap",
            TxType::Transfer => "transfer",
            TxType::Send => "send",
        }
    }
}

impl FromStr for TxType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(TxType::Approve),
            "swap" => Ok(TxType::Swap),
            "transfer" => Ok(TxType::Transfer),
            "send" => Ok(TxType::Send),
            other => Err(AppError::unsupported_tx_type(other)),
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Tri-state observation
// ============================================

/// A value that was either observed or could not be checked.
///
/// `Unknown` is never conflated with a zero count or with `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Observed<T> {
    Known(T),
    Unknown,
}

impl<T> Observed<T> {
    pub fn known(self) -> Option<T> {
        match self {
            Observed::Known(v) => Some(v),
            Observed::Unknown => None,
        }
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Observed::Known(v) => Some(v),
            Observed::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Observed::Unknown)
    }
}

impl<T> From<Option<T>> for Observed<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Observed::Known(v),
            None => Observed::Unknown,
        }
    }
}

// ============================================
// Raw signals
// ============================================

/// Observed value movement between two addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEdge {
    pub from: Address,
    pub to: Address,
    pub block: u64,
    pub amount: f64,
}

impl TransferEdge {
    pub fn new(from: Address, to: Address, block: u64, amount: f64) -> Self {
        Self { from, to, block, amount }
    }
}

/// On-chain facts about the wallet and its counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainSignals {
    /// Outgoing transaction count (nonce) of the wallet
    pub tx_count: Observed<u64>,
    /// Counterparty has deployed bytecode
    pub is_contract: bool,
    /// Source verified on the block explorer
    pub contract_verified: Observed<bool>,
    /// Days since the counterparty contract was created
    pub contract_age_days: Observed<u64>,
}

impl OnChainSignals {
    /// Every fetch failed
    pub fn unknown() -> Self {
        Self {
            tx_count: Observed::Unknown,
            is_contract: false,
            contract_verified: Observed::Unknown,
            contract_age_days: Observed::Unknown,
        }
    }
}

// ============================================
// Scam intelligence
// ============================================

/// Category of a flagged address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScamCategory {
    Phishing,
    ApprovalDrainer,
    Honeypot,
    #[serde(other)]
    Other,
}

impl ScamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScamCategory::Phishing => "phishing",
            ScamCategory::ApprovalDrainer => "approval drainer",
            ScamCategory::Honeypot => "honeypot",
            ScamCategory::Other => "other",
        }
    }
}

/// One entry of the scam intelligence registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScamRecord {
    pub address: Address,
    pub category: ScamCategory,
    pub source: String,
    /// Reporter confidence (0.0 - 1.0)
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

// ============================================
// Derived signals
// ============================================

/// Distance from the wallet to the nearest flagged address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "hops", rename_all = "snake_case")]
pub enum HopDistance {
    /// Flagged address found this many edges away (0 = the wallet itself)
    Hops(u8),
    /// Search depth exhausted without a match
    Unreachable,
    /// Transfer graph could not be fetched, so no search happened
    Unknown,
}

impl HopDistance {
    pub fn hops(&self) -> Option<u8> {
        match self {
            HopDistance::Hops(n) => Some(*n),
            _ => None,
        }
    }
}

/// Output of the graph proximity analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityResult {
    pub hop_distance: HopDistance,
    pub connected_to_cluster: bool,
    pub cluster_id: Option<String>,
    /// Nearest flagged address, when one was found
    pub matched_address: Option<Address>,
    pub matched_category: Option<ScamCategory>,
}

impl ProximityResult {
    pub fn unreachable() -> Self {
        Self {
            hop_distance: HopDistance::Unreachable,
            connected_to_cluster: false,
            cluster_id: None,
            matched_address: None,
            matched_category: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            hop_distance: HopDistance::Unknown,
            ..Self::unreachable()
        }
    }
}

/// Output of the fraud simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Estimated chance the counterparty extracts funds (0.0 - 1.0)
    pub drain_probability: f64,
    /// Blocks during which the drain risk stays live
    pub attack_window_blocks: u64,
}

// ============================================
// Fetch health
// ============================================

/// Outcome of one collector fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    /// Fetch failed or timed out; a neutral default was substituted
    Degraded { reason: String },
    /// Not attempted (e.g. verification of a non-contract)
    Skipped,
}

impl FetchStatus {
    pub fn degraded(reason: impl Into<String>) -> Self {
        FetchStatus::Degraded { reason: reason.into() }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FetchStatus::Degraded { .. })
    }
}

/// Per-source fetch health carried into the signal bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub tx_count: FetchStatus,
    pub bytecode: FetchStatus,
    pub transfers: FetchStatus,
    pub verification: FetchStatus,
    pub contract_age: FetchStatus,
}

impl SourceReport {
    /// Report for signals supplied directly by the caller
    pub fn all_ok() -> Self {
        Self {
            tx_count: FetchStatus::Ok,
            bytecode: FetchStatus::Ok,
            transfers: FetchStatus::Ok,
            verification: FetchStatus::Ok,
            contract_age: FetchStatus::Ok,
        }
    }

    /// Names of sources that fell back to a neutral default
    pub fn degraded_sources(&self) -> Vec<&'static str> {
        [
            ("tx_count", &self.tx_count),
            ("bytecode", &self.bytecode),
            ("transfers", &self.transfers),
            ("verification", &self.verification),
            ("contract_age", &self.contract_age),
        ]
        .into_iter()
        .filter(|(_, status)| status.is_degraded())
        .map(|(name, _)| name)
        .collect()
    }
}

// ============================================
// Assessment
// ============================================

/// Identifier of a scoring rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    FreshWallet,
    ContractVerification,
    ScamProximity,
    TxType,
    DrainTier,
    SuspiciousContract,
    NullPrefixWallet,
}

/// One rule that fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule: RuleId,
    pub points: u32,
    pub reason: String,
}

/// Tri-level verdict derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Safe,
    Caution,
    Dangerous,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "SAFE",
            Verdict::Caution => "CAUTION",
            Verdict::Dangerous => "DANGEROUS",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::Safe => "✅",
            Verdict::Caution => "🟠",
            Verdict::Dangerous => "💀",
        }
    }
}

/// Every intermediate result behind a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBundle {
    pub onchain: OnChainSignals,
    pub proximity: ProximityResult,
    pub simulation: SimulationResult,
    /// Simulator input derived from verification + cluster proximity
    pub contract_risk_score: u32,
    pub fresh_wallet: bool,
    pub unverified_contract: bool,
    pub rule_hits: Vec<RuleHit>,
    pub sources: SourceReport,
}

/// Final output of one analysis. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    assessment_id: Uuid,
    wallet: Address,
    contract: Address,
    tx_type: TxType,
    score: u8,
    verdict: Verdict,
    reasons: Vec<String>,
    signals: SignalBundle,
    timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        wallet: Address,
        contract: Address,
        tx_type: TxType,
        score: u8,
        verdict: Verdict,
        reasons: Vec<String>,
        signals: SignalBundle,
    ) -> Self {
        Self {
            assessment_id: Uuid::new_v4(),
            wallet,
            contract,
            tx_type,
            score,
            verdict,
            reasons,
            signals,
            timestamp: Utc::now(),
        }
    }

    pub fn assessment_id(&self) -> Uuid {
        self.assessment_id
    }

    pub fn wallet(&self) -> &Address {
        &self.wallet
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn signals(&self) -> &SignalBundle {
        &self.signals
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Pretty print the assessment
    pub fn summary(&self) -> String {
        let mut output = format!(
            "\n{} Verdict: {} | Score: {}/100\n",
            self.verdict.emoji(),
            self.verdict.as_str(),
            self.score
        );
        output.push_str(&format!("   Wallet:   {}\n", self.wallet));
        output.push_str(&format!("   Contract: {}\n", self.contract));
        output.push_str(&format!("   Type:     {}\n", self.tx_type));
        output.push_str(&format!(
            "   Drain:    {:.0}% over {} blocks\n",
            self.signals.simulation.drain_probability * 100.0,
            self.signals.simulation.attack_window_blocks
        ));

        output.push_str("   Reasons:\n");
        for reason in &self.reasons {
            output.push_str(&format!("     - {}\n", reason));
        }

        let degraded = self.signals.sources.degraded_sources();
        if !degraded.is_empty() {
            output.push_str(&format!("   Degraded: {}\n", degraded.join(", ")));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_normalizes_case() {
        let addr = Address::parse("0xdAC17F958D2ee523a2206206994597C13D831ec7").unwrap();
        assert_eq!(addr.as_str(), "0xdac17f958d2ee523a2206206994597c13d831ec7");
        assert!(addr.is_well_formed());
    }

    #[test]
    fn test_address_parse_rejects_malformed() {
        assert!(Address::parse("dac17f958d2ee523a2206206994597c13d831ec7").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn test_normalized_address_tolerates_garbage() {
        let addr = Address::normalized("  NOT-AN-ADDRESS ");
        assert_eq!(addr.as_str(), "not-an-address");
        assert!(!addr.is_well_formed());
    }

    #[test]
    fn test_address_deserialize_lowercases() {
        let addr: Address = serde_json::from_str("\"0xABCDEF0000000000000000000000000000000001\"").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0000000000000000000000000000000001");
    }

    #[test]
    fn test_tx_type_parse() {
        assert_eq!("approve".parse::<TxType>().unwrap(), TxType::Approve);
        assert_eq!("SEND".parse::<TxType>().unwrap(), TxType::Send);
        assert!("mint".parse::<TxType>().is_err());
    }

    #[test]
    fn test_observed_unknown_is_not_zero() {
        let unknown: Observed<u64> = Observed::Unknown;
        assert_ne!(unknown, Observed::Known(0));
        assert_eq!(unknown.known(), None);
        assert_eq!(Observed::from(Some(5u64)), Observed::Known(5));
    }

    #[test]
    fn test_scam_category_tolerates_unknown_labels() {
        let cat: ScamCategory = serde_json::from_str("\"rug_pull\"").unwrap();
        assert_eq!(cat, ScamCategory::Other);
        let cat: ScamCategory = serde_json::from_str("\"approval_drainer\"").unwrap();
        assert_eq!(cat, ScamCategory::ApprovalDrainer);
    }

    #[test]
    fn test_degraded_sources() {
        let mut report = SourceReport::all_ok();
        assert!(report.degraded_sources().is_empty());
        report.transfers = FetchStatus::degraded("timeout");
        report.verification = FetchStatus::Skipped;
        assert_eq!(report.degraded_sources(), vec!["transfers"]);
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::Dangerous).unwrap(), "\"DANGEROUS\"");
    }
}
