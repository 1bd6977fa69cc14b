//! Risk Aggregator
//!
//! Merges on-chain, graph and simulation signals into a capped 0-100 score,
//! a verdict and an ordered list of reasons.
//!
//! Scoring is an ordered table of rules. Each rule looks at the shared
//! `RuleContext` and may emit one `RuleHit` (points + reason). Points are
//! summed, so order only affects the order of reasons.

use std::sync::Arc;
use tracing::debug;

use crate::core::simulator::FraudSimulator;
use crate::models::config::RiskConfig;
use crate::models::types::{
    Address, HopDistance, Observed, OnChainSignals, ProximityResult, RiskAssessment, RuleHit,
    RuleId, SignalBundle, SimulationResult, SourceReport, TxType, Verdict,
};
use crate::utils::constants::MAX_SCORE;

/// Reasons used when no rule had anything to say
pub const CLEAN_BILL_OF_HEALTH: [&str; 2] = [
    "No risk signals detected for this transaction",
    "Wallet history and counterparty checks came back clean",
];

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub wallet: &'a Address,
    pub contract: &'a Address,
    pub tx_type: TxType,
    pub onchain: &'a OnChainSignals,
    pub proximity: &'a ProximityResult,
    pub simulation: &'a SimulationResult,
    pub sources: &'a SourceReport,
}

type RuleFn = fn(&RuleContext<'_>, &RiskConfig) -> Option<RuleHit>;

/// Evaluation order defines reason order
const RULES: [(RuleId, RuleFn); 7] = [
    (RuleId::FreshWallet, fresh_wallet_rule),
    (RuleId::ContractVerification, verification_rule),
    (RuleId::ScamProximity, proximity_rule),
    (RuleId::TxType, tx_type_rule),
    (RuleId::DrainTier, drain_tier_rule),
    (RuleId::SuspiciousContract, suspicious_contract_rule),
    (RuleId::NullPrefixWallet, null_prefix_rule),
];

fn hit(rule: RuleId, points: u32, reason: impl Into<String>) -> Option<RuleHit> {
    Some(RuleHit {
        rule,
        points,
        reason: reason.into(),
    })
}

// ============================================
// Rules
// ============================================

fn fresh_wallet_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    // Unknown history never counts as zero history
    match ctx.onchain.tx_count {
        Observed::Known(0) => hit(
            RuleId::FreshWallet,
            config.weights.zero_history,
            "Brand new wallet with zero transaction history",
        ),
        Observed::Known(n) if n < config.low_activity_threshold => hit(
            RuleId::FreshWallet,
            config.weights.low_activity,
            format!("Very low wallet activity ({} transactions)", n),
        ),
        _ => None,
    }
}

fn verification_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    // Failed bytecode lookup: the counterparty kind is unknown, not an EOA
    if ctx.sources.bytecode.is_degraded() {
        return None;
    }

    if !ctx.onchain.is_contract {
        return hit(
            RuleId::ContractVerification,
            0,
            "Counterparty is not a smart contract (externally owned account)",
        );
    }

    match ctx.onchain.contract_verified {
        Observed::Known(false) => hit(
            RuleId::ContractVerification,
            config.weights.unverified_contract,
            "Contract source code is NOT verified - cannot audit code",
        ),
        Observed::Known(true) => hit(
            RuleId::ContractVerification,
            0,
            "Contract source code is verified",
        ),
        Observed::Unknown => None,
    }
}

fn proximity_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    let hops = match ctx.proximity.hop_distance {
        HopDistance::Hops(n) => n,
        HopDistance::Unreachable | HopDistance::Unknown => return None,
    };

    let category = ctx
        .proximity
        .matched_category
        .map(|c| c.as_str())
        .unwrap_or("scam");

    let mut reason = match hops {
        0 => format!("Wallet is listed in the scam registry ({})", category),
        1 => format!("Wallet transacted directly with a flagged {} address", category),
        n => format!("Wallet is {} hops away from a flagged {} address", n, category),
    };
    if let Some(cluster) = &ctx.proximity.cluster_id {
        reason.push_str(&format!(" in scam cluster '{}'", cluster));
    }

    hit(RuleId::ScamProximity, config.weights.for_hops(hops), reason)
}

fn tx_type_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    match ctx.tx_type {
        TxType::Approve => hit(
            RuleId::TxType,
            config.weights.approve,
            "High-risk transaction type: approve grants token spending rights",
        ),
        TxType::Swap => hit(
            RuleId::TxType,
            config.weights.swap,
            "Medium-risk transaction type: swap",
        ),
        TxType::Transfer | TxType::Send => hit(
            RuleId::TxType,
            config.weights.transfer,
            format!("Standard transaction type: {}", ctx.tx_type),
        ),
    }
}

fn drain_tier_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    if ctx.tx_type != TxType::Approve {
        return None;
    }

    let p = ctx.simulation.drain_probability;
    let points = if p >= config.drain_high_threshold {
        config.weights.drain_high
    } else if p >= config.drain_elevated_threshold {
        config.weights.drain_elevated
    } else {
        return None;
    };

    hit(
        RuleId::DrainTier,
        points,
        format!(
            "Simulated drain probability {:.0}% with an attack window of {} blocks",
            p * 100.0,
            ctx.simulation.attack_window_blocks
        ),
    )
}

fn suspicious_contract_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    let contract = ctx.contract.as_str();
    let matched = config
        .suspicious_substrings
        .iter()
        .any(|s| !s.is_empty() && contract.contains(s.as_str()));

    if matched {
        hit(
            RuleId::SuspiciousContract,
            config.weights.suspicious_contract,
            "Suspicious keywords found in contract address",
        )
    } else {
        None
    }
}

fn null_prefix_rule(ctx: &RuleContext<'_>, config: &RiskConfig) -> Option<RuleHit> {
    if !config.null_prefix.is_empty() && ctx.wallet.as_str().starts_with(&config.null_prefix) {
        hit(
            RuleId::NullPrefixWallet,
            config.weights.null_prefix_wallet,
            "Wallet pattern matches known bot/suspicious prefix",
        )
    } else {
        None
    }
}

// ============================================
// Aggregator
// ============================================

/// Run every rule in order
pub fn evaluate_rules(ctx: &RuleContext<'_>, config: &RiskConfig) -> Vec<RuleHit> {
    RULES
        .iter()
        .filter_map(|(_, rule)| rule(ctx, config))
        .collect()
}

/// Map a capped score onto its band
pub fn verdict_for(score: u8, config: &RiskConfig) -> Verdict {
    if score <= config.safe_max {
        Verdict::Safe
    } else if score <= config.caution_max {
        Verdict::Caution
    } else {
        Verdict::Dangerous
    }
}

/// Simulator input: unverified contract and cluster proximity
pub fn contract_risk_score(
    onchain: &OnChainSignals,
    proximity: &ProximityResult,
    config: &RiskConfig,
) -> u32 {
    let mut score = 0;
    if is_unverified_contract(onchain) {
        score += config.weights.contract_risk_unverified;
    }
    if proximity.connected_to_cluster {
        score += config.weights.contract_risk_cluster;
    }
    score
}

fn is_unverified_contract(onchain: &OnChainSignals) -> bool {
    onchain.is_contract && onchain.contract_verified == Observed::Known(false)
}

fn is_fresh_wallet(onchain: &OnChainSignals, config: &RiskConfig) -> bool {
    matches!(onchain.tx_count, Observed::Known(n) if n < config.low_activity_threshold)
}

/// Combines all signals into a `RiskAssessment`
#[derive(Debug, Clone)]
pub struct RiskAggregator {
    config: Arc<RiskConfig>,
    simulator: FraudSimulator,
}

impl RiskAggregator {
    pub fn new(config: Arc<RiskConfig>) -> Self {
        Self {
            config,
            simulator: FraudSimulator::new(),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Score one transaction
    pub fn aggregate(
        &self,
        wallet: &Address,
        contract: &Address,
        tx_type: TxType,
        onchain: OnChainSignals,
        proximity: ProximityResult,
        sources: SourceReport,
    ) -> RiskAssessment {
        let config = self.config.as_ref();

        let contract_risk = contract_risk_score(&onchain, &proximity, config);
        let simulation =
            self.simulator
                .simulate(tx_type, contract_risk, proximity.connected_to_cluster);

        let ctx = RuleContext {
            wallet,
            contract,
            tx_type,
            onchain: &onchain,
            proximity: &proximity,
            simulation: &simulation,
            sources: &sources,
        };
        let rule_hits = evaluate_rules(&ctx, config);

        let total: u32 = rule_hits.iter().map(|h| h.points).sum();
        let score = total.min(MAX_SCORE) as u8;
        let verdict = verdict_for(score, config);

        let mut reasons: Vec<String> = Vec::with_capacity(rule_hits.len());
        for hit in &rule_hits {
            if !reasons.contains(&hit.reason) {
                reasons.push(hit.reason.clone());
            }
        }
        if reasons.is_empty() {
            reasons.extend(CLEAN_BILL_OF_HEALTH.iter().map(|r| r.to_string()));
        }

        debug!(
            wallet = %wallet,
            contract = %contract,
            tx_type = %tx_type,
            raw_score = total,
            score,
            verdict = verdict.as_str(),
            "Risk aggregated"
        );

        let signals = SignalBundle {
            fresh_wallet: is_fresh_wallet(&onchain, config),
            unverified_contract: is_unverified_contract(&onchain),
            contract_risk_score: contract_risk,
            onchain,
            proximity,
            simulation,
            rule_hits,
            sources,
        };

        RiskAssessment::new(
            wallet.clone(),
            contract.clone(),
            tx_type,
            score,
            verdict,
            reasons,
            signals,
        )
    }
}

impl Default for RiskAggregator {
    fn default() -> Self {
        Self::new(Arc::new(RiskConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{FetchStatus, ScamCategory};

    const WALLET: &str = "0x1234567890123456789012345678901234567890";
    const CONTRACT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

    fn onchain(tx_count: Observed<u64>, is_contract: bool, verified: Observed<bool>) -> OnChainSignals {
        OnChainSignals {
            tx_count,
            is_contract,
            contract_verified: verified,
            contract_age_days: Observed::Unknown,
        }
    }

    fn proximity(hops: u8) -> ProximityResult {
        ProximityResult {
            hop_distance: HopDistance::Hops(hops),
            connected_to_cluster: hops <= 2,
            cluster_id: None,
            matched_address: None,
            matched_category: Some(ScamCategory::Phishing),
        }
    }

    fn run(
        wallet: &str,
        contract: &str,
        tx_type: TxType,
        signals: OnChainSignals,
        prox: ProximityResult,
    ) -> RiskAssessment {
        RiskAggregator::default().aggregate(
            &Address::normalized(wallet),
            &Address::normalized(contract),
            tx_type,
            signals,
            prox,
            SourceReport::all_ok(),
        )
    }

    #[test]
    fn test_fresh_wallet_rule() {
        let config = RiskConfig::default();
        let sim = FraudSimulator::new().simulate(TxType::Send, 0, false);
        let prox = ProximityResult::unreachable();
        let wallet = Address::normalized(WALLET);
        let contract = Address::normalized(CONTRACT);
        let sources = SourceReport::all_ok();

        let cases = [
            (Observed::Known(0), Some(30)),
            (Observed::Known(1), Some(15)),
            (Observed::Known(2), Some(15)),
            (Observed::Known(3), None),
            (Observed::Unknown, None),
        ];
        for (tx_count, expected) in cases {
            let signals = onchain(tx_count, false, Observed::Unknown);
            let ctx = RuleContext {
                wallet: &wallet,
                contract: &contract,
                tx_type: TxType::Send,
                onchain: &signals,
                proximity: &prox,
                simulation: &sim,
                sources: &sources,
            };
            assert_eq!(fresh_wallet_rule(&ctx, &config).map(|h| h.points), expected);
        }
    }

    #[test]
    fn test_unknown_verification_skips_reason_and_penalty() {
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Send,
            onchain(Observed::Known(10), true, Observed::Unknown),
            ProximityResult::unreachable(),
        );
        assert_eq!(result.score(), 5);
        assert!(!result.signals().unverified_contract);
        assert!(result
            .signals()
            .rule_hits
            .iter()
            .all(|h| h.rule != RuleId::ContractVerification));
    }

    #[test]
    fn test_failed_bytecode_lookup_is_not_reported_as_eoa() {
        let mut sources = SourceReport::all_ok();
        sources.bytecode = FetchStatus::degraded("eth_getCode timed out");
        sources.verification = FetchStatus::Skipped;

        let result = RiskAggregator::default().aggregate(
            &Address::normalized(WALLET),
            &Address::normalized(CONTRACT),
            TxType::Approve,
            onchain(Observed::Known(10), false, Observed::Unknown),
            ProximityResult::unreachable(),
            sources,
        );

        // approve (25) + elevated drain tier (15)
        assert_eq!(result.score(), 40);
        assert!(result
            .reasons()
            .iter()
            .all(|r| !r.contains("not a smart contract")));
        assert!(result
            .signals()
            .rule_hits
            .iter()
            .all(|h| h.rule != RuleId::ContractVerification));
    }

    #[test]
    fn test_verified_contract_is_reason_only() {
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Send,
            onchain(Observed::Known(10), true, Observed::Known(true)),
            ProximityResult::unreachable(),
        );
        assert_eq!(result.score(), 5);
        assert_eq!(result.reasons()[0], "Contract source code is verified");
    }

    #[test]
    fn test_scenario_a_caps_at_100() {
        let result = run(
            WALLET,
            "0xdead000000000000000000000000000000000001",
            TxType::Approve,
            onchain(Observed::Known(0), true, Observed::Known(false)),
            proximity(0),
        );
        assert_eq!(result.signals().contract_risk_score, 90);
        assert_eq!(result.signals().simulation.drain_probability, 0.85);
        assert_eq!(result.score(), 100);
        assert_eq!(result.verdict(), Verdict::Dangerous);
        let raw: u32 = result.signals().rule_hits.iter().map(|h| h.points).sum();
        assert_eq!(raw, 190);
    }

    #[test]
    fn test_scenario_b_clean_send() {
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Send,
            onchain(Observed::Known(10), false, Observed::Unknown),
            ProximityResult::unreachable(),
        );
        assert_eq!(result.score(), 5);
        assert_eq!(result.verdict(), Verdict::Safe);
    }

    #[test]
    fn test_scenario_c_swap_near_cluster() {
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Swap,
            onchain(Observed::Known(1), true, Observed::Known(true)),
            proximity(2),
        );
        assert_eq!(result.score(), 45);
        assert_eq!(result.verdict(), Verdict::Caution);
    }

    #[test]
    fn test_approve_base_drain_tier() {
        // Clean approve: drain 0.70 -> elevated tier
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Approve,
            onchain(Observed::Known(10), true, Observed::Known(true)),
            ProximityResult::unreachable(),
        );
        assert_eq!(result.signals().simulation.drain_probability, 0.70);
        assert_eq!(result.score(), 25 + 15);
        assert_eq!(result.verdict(), Verdict::Caution);
    }

    #[test]
    fn test_null_prefix_and_suspicious_contract() {
        let result = run(
            "0x0001234567890123456789012345678901234567",
            "0xbad0000000000000000000000000000000000001",
            TxType::Send,
            onchain(Observed::Known(10), false, Observed::Unknown),
            ProximityResult::unreachable(),
        );
        assert_eq!(result.score(), 5 + 25 + 15);
        let rules: Vec<RuleId> = result.signals().rule_hits.iter().map(|h| h.rule).collect();
        assert_eq!(
            rules,
            vec![
                RuleId::ContractVerification,
                RuleId::TxType,
                RuleId::SuspiciousContract,
                RuleId::NullPrefixWallet
            ]
        );
    }

    #[test]
    fn test_reason_order_follows_rule_table() {
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Swap,
            onchain(Observed::Known(0), true, Observed::Known(false)),
            proximity(1),
        );
        let rules: Vec<RuleId> = result.signals().rule_hits.iter().map(|h| h.rule).collect();
        assert_eq!(
            rules,
            vec![
                RuleId::FreshWallet,
                RuleId::ContractVerification,
                RuleId::ScamProximity,
                RuleId::TxType
            ]
        );
        assert_eq!(result.reasons().len(), 4);
    }

    #[test]
    fn test_reasons_never_empty() {
        for tx_type in TxType::ALL {
            let result = run(
                WALLET,
                CONTRACT,
                tx_type,
                onchain(Observed::Unknown, true, Observed::Unknown),
                ProximityResult::unknown(),
            );
            assert!(!result.reasons().is_empty());
            assert!(result.score() <= 100);
        }
    }

    #[test]
    fn test_verdict_bands() {
        let config = RiskConfig::default();
        assert_eq!(verdict_for(0, &config), Verdict::Safe);
        assert_eq!(verdict_for(29, &config), Verdict::Safe);
        assert_eq!(verdict_for(30, &config), Verdict::Caution);
        assert_eq!(verdict_for(69, &config), Verdict::Caution);
        assert_eq!(verdict_for(70, &config), Verdict::Dangerous);
        assert_eq!(verdict_for(100, &config), Verdict::Dangerous);
    }

    #[test]
    fn test_cluster_link_feeds_simulator() {
        // Scam-linked transfer escalates to 0.95 drain
        let result = run(
            WALLET,
            CONTRACT,
            TxType::Transfer,
            onchain(Observed::Known(10), false, Observed::Unknown),
            proximity(1),
        );
        assert_eq!(result.signals().contract_risk_score, 30);
        assert_eq!(result.signals().simulation.drain_probability, 0.95);
        assert_eq!(result.score(), 35 + 5);
    }
}
