//! Risk Engine - the single analysis entry point
//!
//! collect → proximity → simulate → aggregate
//!
//! Collection is the only suspending step. It runs on its own task so a
//! panic inside a data source fails this one request with ANALYSIS_FAILED
//! instead of tearing down the caller.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::core::proximity::ProximityAnalyzer;
use crate::core::risk_score::RiskAggregator;
use crate::models::config::{RiskConfig, ServiceConfig};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    Address, OnChainSignals, ProximityResult, RiskAssessment, SourceReport, TransferEdge, TxType,
};
use crate::providers::collector::{ChainDataSource, LiveChainSource, SignalCollector};
use crate::providers::registry::ScamStore;

/// Wires the collector, the scam registry and the scoring core together
#[derive(Clone)]
pub struct RiskEngine {
    collector: SignalCollector,
    registry: Arc<ScamStore>,
    proximity: ProximityAnalyzer,
    aggregator: RiskAggregator,
}

impl RiskEngine {
    pub fn new(
        source: Arc<dyn ChainDataSource>,
        registry: Arc<ScamStore>,
        risk_config: Arc<RiskConfig>,
        service_config: &ServiceConfig,
    ) -> Self {
        Self {
            collector: SignalCollector::from_config(source, service_config),
            registry,
            proximity: ProximityAnalyzer::from_config(&risk_config),
            aggregator: RiskAggregator::new(risk_config),
        }
    }

    /// Live providers + registry snapshot from disk
    pub fn from_config(risk_config: Arc<RiskConfig>, service_config: &ServiceConfig) -> AppResult<Self> {
        let source = LiveChainSource::from_config(service_config)?;
        let registry = ScamStore::load_or_empty(&service_config.registry_path)?;

        info!(
            "🛡️ Risk engine ready: {} flagged addresses, fetch timeout {}ms, {} transfers max",
            registry.len(),
            service_config.fetch_timeout.as_millis(),
            service_config.max_transfers
        );

        Ok(Self::new(
            Arc::new(source),
            Arc::new(registry),
            risk_config,
            service_config,
        ))
    }

    pub fn registry(&self) -> &ScamStore {
        &self.registry
    }

    pub fn config(&self) -> &RiskConfig {
        self.aggregator.config()
    }

    /// Parse raw inputs, then analyze
    pub async fn analyze_raw(&self, wallet: &str, contract: &str, tx_type: &str) -> AppResult<RiskAssessment> {
        let wallet = Address::parse(wallet)?;
        let contract = Address::parse(contract)?;
        let tx_type: TxType = tx_type.parse()?;
        self.analyze_transaction(&wallet, &contract, tx_type).await
    }

    /// Full pre-signing analysis of one pending transaction
    pub async fn analyze_transaction(
        &self,
        wallet: &Address,
        contract: &Address,
        tx_type: TxType,
    ) -> AppResult<RiskAssessment> {
        let start = Instant::now();

        let collector = self.collector.clone();
        let (w, c) = (wallet.clone(), contract.clone());
        let collected = tokio::spawn(async move { collector.collect(&w, &c).await })
            .await
            .map_err(|e| AppError::analysis_failed(format!("Signal collection aborted: {}", e)))?;

        let assessment = self.assess(
            wallet,
            contract,
            tx_type,
            collected.onchain,
            &collected.transfers,
            collected.sources,
        );

        info!(
            "{} {} {} → {} ({}/100) in {}ms",
            assessment.verdict().emoji(),
            tx_type,
            contract,
            assessment.verdict().as_str(),
            assessment.score(),
            start.elapsed().as_millis()
        );
        Ok(assessment)
    }

    /// Score already-collected signals. Pure apart from id and timestamp.
    pub fn assess(
        &self,
        wallet: &Address,
        contract: &Address,
        tx_type: TxType,
        onchain: OnChainSignals,
        transfers: &[TransferEdge],
        sources: SourceReport,
    ) -> RiskAssessment {
        let proximity = self.proximity_for(wallet, transfers, &sources);
        debug!(
            "🕸️ Proximity for {}: {:?} (cluster-linked: {})",
            wallet, proximity.hop_distance, proximity.connected_to_cluster
        );

        self.aggregator
            .aggregate(wallet, contract, tx_type, onchain, proximity, sources)
    }

    /// A failed transfer fetch means "not computed", unless the wallet is itself listed
    fn proximity_for(&self, wallet: &Address, transfers: &[TransferEdge], sources: &SourceReport) -> ProximityResult {
        if sources.transfers.is_degraded() && !self.registry.contains(wallet) {
            return ProximityResult::unknown();
        }
        self.proximity.analyze(wallet, transfers, &self.registry)
    }
}
