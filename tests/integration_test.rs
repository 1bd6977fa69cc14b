//! Integration tests for WalletWork
//!
//! The live providers are replaced by an in-memory `ChainDataSource`, so the
//! full collect → proximity → simulate → aggregate pipeline runs offline.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use eyre::{eyre, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use walletwork::core::risk_score::RiskAggregator;
use walletwork::models::{
    FetchStatus, OnChainSignals, ScamCategory, SourceReport, TransferEdge,
};
use walletwork::{
    Address, ChainDataSource, FraudSimulator, HopDistance, Observed, ProximityResult, RiskConfig,
    RiskEngine, ScamRecord, ScamStore, ServiceConfig, TxType, Verdict,
};

const WALLET: &str = "0x1111111111111111111111111111111111111111";
const CONTRACT: &str = "0x2222222222222222222222222222222222222222";
const DRAINER: &str = "0xdead00000000000000000000000000000000beef";
const HOP: &str = "0x3333333333333333333333333333333333333333";
const FLAGGED: &str = "0x4444444444444444444444444444444444444444";

fn addr(raw: &str) -> Address {
    Address::normalized(raw)
}

/// In-memory chain; `None` fields fail the corresponding fetch
#[derive(Clone)]
struct StubChain {
    tx_count: Option<u64>,
    has_code: Option<bool>,
    transfers: Option<Vec<TransferEdge>>,
    verified: Option<bool>,
    created_at: Option<DateTime<Utc>>,
    delay: Option<Duration>,
}

impl StubChain {
    fn healthy() -> Self {
        Self {
            tx_count: Some(10),
            has_code: Some(false),
            transfers: Some(vec![]),
            verified: None,
            created_at: None,
            delay: None,
        }
    }
}

#[async_trait]
impl ChainDataSource for StubChain {
    async fn transaction_count(&self, _wallet: &Address) -> Result<u64> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.tx_count.ok_or_else(|| eyre!("rpc unavailable"))
    }

    async fn has_code(&self, _address: &Address) -> Result<bool> {
        self.has_code.ok_or_else(|| eyre!("rpc unavailable"))
    }

    async fn recent_transfers(&self, _wallet: &Address, _limit: usize) -> Result<Vec<TransferEdge>> {
        self.transfers.clone().ok_or_else(|| eyre!("alchemy unavailable"))
    }

    async fn is_verified(&self, _contract: &Address) -> Result<bool> {
        self.verified.ok_or_else(|| eyre!("explorer unavailable"))
    }

    async fn contract_created_at(&self, _contract: &Address) -> Result<DateTime<Utc>> {
        self.created_at.ok_or_else(|| eyre!("explorer unavailable"))
    }
}

fn record(address: &str, cluster: &str) -> ScamRecord {
    ScamRecord {
        address: addr(address),
        category: ScamCategory::ApprovalDrainer,
        source: "test-feed".to_string(),
        confidence: 0.9,
        cluster_id: Some(cluster.to_string()),
    }
}

fn engine(chain: StubChain, records: Vec<ScamRecord>) -> RiskEngine {
    engine_with_config(chain, records, ServiceConfig::default())
}

fn engine_with_config(chain: StubChain, records: Vec<ScamRecord>, config: ServiceConfig) -> RiskEngine {
    RiskEngine::new(
        Arc::new(chain),
        Arc::new(ScamStore::from_records(records)),
        Arc::new(RiskConfig::default()),
        &config,
    )
}

// ============================================
// End-to-end scenarios
// ============================================

#[tokio::test]
async fn test_fresh_wallet_approving_unverified_drainer_is_dangerous() {
    let chain = StubChain {
        tx_count: Some(0),
        has_code: Some(true),
        verified: Some(false),
        created_at: Some(Utc::now() - ChronoDuration::days(2)),
        ..StubChain::healthy()
    };
    let engine = engine(chain, vec![record(WALLET, "drainer-kit")]);

    let result = engine
        .analyze_raw(WALLET, DRAINER, "approve")
        .await
        .unwrap();

    assert_eq!(result.score(), 100);
    assert_eq!(result.verdict(), Verdict::Dangerous);
    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Hops(0));
    assert_eq!(result.signals().simulation.drain_probability, 0.85);
    assert_eq!(result.signals().simulation.attack_window_blocks, 10);
    assert_eq!(result.signals().onchain.contract_age_days, Observed::Known(2));
    assert!(result.reasons().iter().any(|r| r.contains("NOT verified")));
    assert!(result.reasons().iter().any(|r| r.contains("drainer-kit")));
}

#[tokio::test]
async fn test_established_wallet_sending_to_eoa_is_safe() {
    let engine = engine(StubChain::healthy(), vec![record(FLAGGED, "c1")]);

    let result = engine.analyze_raw(WALLET, CONTRACT, "send").await.unwrap();

    assert_eq!(result.score(), 5);
    assert_eq!(result.verdict(), Verdict::Safe);
    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Unreachable);
    assert_eq!(result.signals().sources.verification, FetchStatus::Skipped);
    assert!(result.signals().sources.degraded_sources().is_empty());
}

#[tokio::test]
async fn test_swap_two_hops_from_cluster_is_caution() {
    let chain = StubChain {
        tx_count: Some(1),
        has_code: Some(true),
        verified: Some(true),
        transfers: Some(vec![
            TransferEdge::new(addr(WALLET), addr(HOP), 100, 1.0),
            TransferEdge::new(addr(FLAGGED), addr(HOP), 90, 5.0),
        ]),
        ..StubChain::healthy()
    };
    let engine = engine(chain, vec![record(FLAGGED, "ring-7")]);

    let result = engine.analyze_raw(WALLET, CONTRACT, "swap").await.unwrap();

    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Hops(2));
    assert!(result.signals().proximity.connected_to_cluster);
    assert_eq!(result.score(), 45);
    assert_eq!(result.verdict(), Verdict::Caution);
}

/// Each wallet answers with its own transfer history
struct HistoryChain {
    histories: HashMap<Address, Vec<TransferEdge>>,
}

#[async_trait]
impl ChainDataSource for HistoryChain {
    async fn transaction_count(&self, _wallet: &Address) -> Result<u64> {
        Ok(10)
    }

    async fn has_code(&self, _address: &Address) -> Result<bool> {
        Ok(false)
    }

    async fn recent_transfers(&self, wallet: &Address, _limit: usize) -> Result<Vec<TransferEdge>> {
        Ok(self.histories.get(wallet).cloned().unwrap_or_default())
    }

    async fn is_verified(&self, _contract: &Address) -> Result<bool> {
        Err(eyre!("not a contract"))
    }

    async fn contract_created_at(&self, _contract: &Address) -> Result<DateTime<Utc>> {
        Err(eyre!("not a contract"))
    }
}

fn history_engine(config: ServiceConfig) -> RiskEngine {
    // WALLET -> HOP, and only HOP's own history shows FLAGGED -> HOP
    let histories = [
        (addr(WALLET), vec![TransferEdge::new(addr(WALLET), addr(HOP), 100, 1.0)]),
        (addr(HOP), vec![TransferEdge::new(addr(FLAGGED), addr(HOP), 90, 5.0)]),
    ]
    .into_iter()
    .collect();

    RiskEngine::new(
        Arc::new(HistoryChain { histories }),
        Arc::new(ScamStore::from_records(vec![record(FLAGGED, "ring-7")])),
        Arc::new(RiskConfig::default()),
        &config,
    )
}

#[tokio::test]
async fn test_second_hop_found_through_counterparty_history() {
    let result = history_engine(ServiceConfig::default())
        .analyze_raw(WALLET, CONTRACT, "send")
        .await
        .unwrap();

    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Hops(2));
    assert!(result.signals().proximity.connected_to_cluster);
}

#[tokio::test]
async fn test_second_hop_invisible_without_neighbor_fanout() {
    let config = ServiceConfig {
        neighbor_fanout: 0,
        ..ServiceConfig::default()
    };
    let result = history_engine(config)
        .analyze_raw(WALLET, CONTRACT, "send")
        .await
        .unwrap();

    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Unreachable);
}

#[tokio::test]
async fn test_input_is_normalized_before_lookup() {
    let engine = engine(StubChain::healthy(), vec![record(DRAINER, "c1")]);
    let upper = "0xDEAD00000000000000000000000000000000BEEF";

    let result = engine.analyze_raw(upper, CONTRACT, "send").await.unwrap();
    assert_eq!(result.wallet().as_str(), DRAINER);
    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Hops(0));
}

// ============================================
// Degradation
// ============================================

#[tokio::test]
async fn test_every_source_down_still_yields_assessment() {
    let chain = StubChain {
        tx_count: None,
        has_code: None,
        transfers: None,
        verified: None,
        created_at: None,
        delay: None,
    };
    let engine = engine(chain, vec![record(FLAGGED, "c1")]);

    let result = engine.analyze_raw(WALLET, CONTRACT, "transfer").await.unwrap();

    let onchain = &result.signals().onchain;
    assert_eq!(onchain.tx_count, Observed::Unknown);
    assert!(!onchain.is_contract);
    assert_eq!(result.signals().proximity.hop_distance, HopDistance::Unknown);
    // Only the transaction type contributes
    assert_eq!(result.score(), 5);
    assert!(!result.signals().fresh_wallet);

    let degraded = result.signals().sources.degraded_sources();
    assert!(degraded.contains(&"tx_count"));
    assert!(degraded.contains(&"bytecode"));
    assert!(degraded.contains(&"transfers"));
}

#[tokio::test]
async fn test_slow_source_times_out_independently() {
    let chain = StubChain {
        delay: Some(Duration::from_millis(500)),
        ..StubChain::healthy()
    };
    let config = ServiceConfig {
        fetch_timeout: Duration::from_millis(50),
        ..ServiceConfig::default()
    };
    let engine = engine_with_config(chain, vec![], config);

    let result = engine.analyze_raw(WALLET, CONTRACT, "send").await.unwrap();

    assert_eq!(result.signals().onchain.tx_count, Observed::Unknown);
    assert!(result.signals().sources.tx_count.is_degraded());
    assert_eq!(result.signals().sources.bytecode, FetchStatus::Ok);
    assert_eq!(result.signals().sources.transfers, FetchStatus::Ok);
}

#[tokio::test]
async fn test_verification_failure_is_unknown_not_unverified() {
    let chain = StubChain {
        has_code: Some(true),
        verified: None,
        ..StubChain::healthy()
    };
    let engine = engine(chain, vec![]);

    let result = engine.analyze_raw(WALLET, CONTRACT, "send").await.unwrap();
    assert_eq!(result.signals().onchain.contract_verified, Observed::Unknown);
    assert!(!result.signals().unverified_contract);
    assert_eq!(result.score(), 5);
}

// ============================================
// Properties
// ============================================

fn onchain_variants() -> Vec<OnChainSignals> {
    let mut variants = Vec::new();
    for tx_count in [Observed::Known(0), Observed::Known(2), Observed::Known(50), Observed::Unknown] {
        for (is_contract, verified) in [
            (false, Observed::Unknown),
            (true, Observed::Known(false)),
            (true, Observed::Known(true)),
            (true, Observed::Unknown),
        ] {
            variants.push(OnChainSignals {
                tx_count,
                is_contract,
                contract_verified: verified,
                contract_age_days: Observed::Unknown,
            });
        }
    }
    variants
}

fn proximity_at(hops: Option<u8>) -> ProximityResult {
    match hops {
        Some(n) => ProximityResult {
            hop_distance: HopDistance::Hops(n),
            connected_to_cluster: n <= 2,
            cluster_id: Some("c1".to_string()),
            ..ProximityResult::unreachable()
        },
        None => ProximityResult::unreachable(),
    }
}

#[test]
fn test_score_bounds_and_verdict_bands() {
    let aggregator = RiskAggregator::default();
    let config = RiskConfig::default();
    let contracts = [CONTRACT, DRAINER];
    let wallets = [WALLET, "0x0001111111111111111111111111111111111111"];

    for wallet in wallets {
        for contract in contracts {
            for tx_type in TxType::ALL {
                for onchain in onchain_variants() {
                    for hops in [Some(0), Some(1), Some(2), Some(3), None] {
                        let result = aggregator.aggregate(
                            &addr(wallet),
                            &addr(contract),
                            tx_type,
                            onchain.clone(),
                            proximity_at(hops),
                            SourceReport::all_ok(),
                        );

                        assert!(result.score() <= 100);
                        assert!(!result.reasons().is_empty());

                        let expected = if result.score() <= config.safe_max {
                            Verdict::Safe
                        } else if result.score() <= config.caution_max {
                            Verdict::Caution
                        } else {
                            Verdict::Dangerous
                        };
                        assert_eq!(result.verdict(), expected);
                    }
                }
            }
        }
    }
}

#[test]
fn test_closer_scam_never_lowers_score() {
    let aggregator = RiskAggregator::default();

    for tx_type in TxType::ALL {
        for onchain in onchain_variants() {
            let scores: Vec<u8> = [Some(0), Some(1), Some(2), Some(3), None]
                .into_iter()
                .map(|hops| {
                    aggregator
                        .aggregate(
                            &addr(WALLET),
                            &addr(CONTRACT),
                            tx_type,
                            onchain.clone(),
                            proximity_at(hops),
                            SourceReport::all_ok(),
                        )
                        .score()
                })
                .collect();

            for pair in scores.windows(2) {
                assert!(pair[0] >= pair[1], "{:?} {:?}: {:?}", tx_type, onchain, scores);
            }
        }
    }
}

#[test]
fn test_simulator_is_total_and_bounded() {
    let sim = FraudSimulator::new();
    for tx_type in TxType::ALL {
        for risk in [0, 50, 51, 60, 61, 100, 500, u32::MAX] {
            for linked in [false, true] {
                let out = sim.simulate(tx_type, risk, linked);
                assert!((0.0..=1.0).contains(&out.drain_probability));
            }
        }
    }
}

#[test]
fn test_aggregation_is_deterministic() {
    let aggregator = RiskAggregator::default();
    let run = || {
        aggregator.aggregate(
            &addr(WALLET),
            &addr(DRAINER),
            TxType::Approve,
            OnChainSignals {
                tx_count: Observed::Known(1),
                is_contract: true,
                contract_verified: Observed::Known(false),
                contract_age_days: Observed::Known(3),
            },
            proximity_at(Some(1)),
            SourceReport::all_ok(),
        )
    };

    let (a, b) = (run(), run());
    assert_eq!(a.score(), b.score());
    assert_eq!(a.verdict(), b.verdict());
    assert_eq!(a.reasons(), b.reasons());
    assert_eq!(a.signals(), b.signals());
    assert_ne!(a.assessment_id(), b.assessment_id());
}

#[test]
fn test_registry_snapshot_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/scam_registry.json");
    let store = ScamStore::load(&path).unwrap();
    assert!(store.len() >= 5);
    assert!(store.contains(&addr(DRAINER)));
    assert!(store.cluster_count() >= 1);
}
