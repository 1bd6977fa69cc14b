//! Signal Collector
//!
//! Fans out to the chain data sources, bounds every fetch with its own
//! timeout and folds failures into neutral defaults plus a degraded marker.
//! The collector never returns an error: whatever could not be observed is
//! reported as `Unknown` / `Degraded` and scoring carries on.
//!
//! Stage 1 (concurrent): wallet tx count, counterparty bytecode, transfers.
//! Stage 2 (concurrent): verification and age when bytecode is present,
//! plus the recent transfers of up to `neighbor_fanout` counterparties so
//! two-hop paths show up in the graph.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::alchemy::AlchemyClient;
use super::explorer::ExplorerClient;
use super::rpc::RpcProvider;
use crate::models::config::ServiceConfig;
use crate::models::errors::AppResult;
use crate::models::types::{Address, FetchStatus, Observed, OnChainSignals, SourceReport, TransferEdge};
use crate::utils::constants::NEIGHBOR_TRANSFER_LIMIT;

// ============================================
// Data source seam
// ============================================

/// Everything the engine reads from the chain
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Outgoing transaction count (nonce) of a wallet
    async fn transaction_count(&self, wallet: &Address) -> Result<u64>;

    /// True when the address has deployed bytecode
    async fn has_code(&self, address: &Address) -> Result<bool>;

    /// Recent transfers touching `wallet`, newest first, at most `limit`
    async fn recent_transfers(&self, wallet: &Address, limit: usize) -> Result<Vec<TransferEdge>>;

    /// Source published on the block explorer
    async fn is_verified(&self, contract: &Address) -> Result<bool>;

    /// Deployment time of a contract
    async fn contract_created_at(&self, contract: &Address) -> Result<DateTime<Utc>>;
}

/// Production source: JSON-RPC + Alchemy transfers + block explorer
pub struct LiveChainSource {
    rpc: RpcProvider,
    /// Only available when the RPC endpoint is Alchemy
    alchemy: Option<AlchemyClient>,
    explorer: ExplorerClient,
}

impl LiveChainSource {
    pub fn new(rpc: RpcProvider, explorer: ExplorerClient) -> Self {
        let alchemy = match AlchemyClient::new(rpc.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("⚠️ {} - proximity analysis will report unknown", e);
                None
            }
        };
        Self { rpc, alchemy, explorer }
    }

    pub fn from_config(config: &ServiceConfig) -> AppResult<Self> {
        let rpc = RpcProvider::from_config(config)?;
        let explorer = ExplorerClient::from_config(config)?;
        Ok(Self::new(rpc, explorer))
    }
}

#[async_trait]
impl ChainDataSource for LiveChainSource {
    async fn transaction_count(&self, wallet: &Address) -> Result<u64> {
        self.rpc.get_transaction_count(wallet.as_str()).await
    }

    async fn has_code(&self, address: &Address) -> Result<bool> {
        self.rpc.has_code(address.as_str()).await
    }

    async fn recent_transfers(&self, wallet: &Address, limit: usize) -> Result<Vec<TransferEdge>> {
        match &self.alchemy {
            Some(client) => client.recent_transfers(wallet, limit).await,
            None => Err(eyre!("Transfers API unavailable without an Alchemy endpoint")),
        }
    }

    async fn is_verified(&self, contract: &Address) -> Result<bool> {
        self.explorer.is_verified(contract).await
    }

    async fn contract_created_at(&self, contract: &Address) -> Result<DateTime<Utc>> {
        let creation = self.explorer.contract_creation(contract).await?;
        if let Some(created_at) = creation.created_at() {
            return Ok(created_at);
        }

        let latest = self.rpc.block_number().await?;
        creation
            .estimated_created_at(latest, Utc::now())
            .ok_or_else(|| eyre!("Creation record for {} has no block or timestamp", contract))
    }
}

// ============================================
// Collector
// ============================================

/// Raw material for proximity + aggregation
#[derive(Debug, Clone)]
pub struct CollectedSignals {
    pub onchain: OnChainSignals,
    pub transfers: Vec<TransferEdge>,
    pub sources: SourceReport,
}

/// Concurrent, timeout-bounded signal fetcher
#[derive(Clone)]
pub struct SignalCollector {
    source: Arc<dyn ChainDataSource>,
    fetch_timeout: Duration,
    max_transfers: usize,
    neighbor_fanout: usize,
}

impl SignalCollector {
    /// Collector without neighbour expansion
    pub fn new(source: Arc<dyn ChainDataSource>, fetch_timeout: Duration, max_transfers: usize) -> Self {
        Self {
            source,
            fetch_timeout,
            max_transfers,
            neighbor_fanout: 0,
        }
    }

    pub fn with_neighbor_fanout(mut self, fanout: usize) -> Self {
        self.neighbor_fanout = fanout;
        self
    }

    pub fn from_config(source: Arc<dyn ChainDataSource>, config: &ServiceConfig) -> Self {
        Self::new(source, config.fetch_timeout, config.max_transfers)
            .with_neighbor_fanout(config.neighbor_fanout)
    }

    /// Run one fetch under the timeout; failures become `Degraded`
    async fn fetch<T>(
        &self,
        name: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> (Option<T>, FetchStatus) {
        match tokio::time::timeout(self.fetch_timeout, fut).await {
            Ok(Ok(value)) => (Some(value), FetchStatus::Ok),
            Ok(Err(e)) => {
                warn!(source = name, "⚠️ Fetch failed, using neutral default: {}", e);
                (None, FetchStatus::degraded(e.to_string()))
            }
            Err(_) => {
                let reason = format!("timed out after {}ms", self.fetch_timeout.as_millis());
                warn!(source = name, "⏱️ Fetch {}, using neutral default", reason);
                (None, FetchStatus::degraded(reason))
            }
        }
    }

    /// Gather every signal for one (wallet, contract) pair
    pub async fn collect(&self, wallet: &Address, contract: &Address) -> CollectedSignals {
        let (tx_count, bytecode, transfers) = tokio::join!(
            self.fetch("tx_count", self.source.transaction_count(wallet)),
            self.fetch("bytecode", self.source.has_code(contract)),
            self.fetch(
                "transfers",
                self.source.recent_transfers(wallet, self.max_transfers)
            ),
        );

        let (tx_count, tx_count_status) = tx_count;
        let (has_code, bytecode_status) = bytecode;
        let (transfers, transfers_status) = transfers;
        let is_contract = has_code.unwrap_or(false);

        let mut transfers = transfers.unwrap_or_default();
        transfers.truncate(self.max_transfers);

        let contract_checks = async {
            if is_contract {
                tokio::join!(
                    self.fetch("verification", self.source.is_verified(contract)),
                    self.fetch("contract_age", self.source.contract_created_at(contract)),
                )
            } else {
                ((None, FetchStatus::Skipped), (None, FetchStatus::Skipped))
            }
        };
        let (contract_checks, neighbor_edges) =
            tokio::join!(contract_checks, self.expand_neighbors(wallet, &transfers));
        let ((verified, verification_status), (created_at, age_status)) = contract_checks;
        transfers.extend(neighbor_edges);

        let contract_age_days = created_at.map(|at| age_in_days(at, Utc::now()));

        let sources = SourceReport {
            tx_count: tx_count_status,
            bytecode: bytecode_status,
            transfers: transfers_status,
            verification: verification_status,
            contract_age: age_status,
        };

        let degraded = sources.degraded_sources();
        if degraded.is_empty() {
            debug!("📡 All signals collected for {} → {}", wallet, contract);
        } else {
            info!(
                "📡 Signals collected for {} → {} with degraded sources: {}",
                wallet,
                contract,
                degraded.join(", ")
            );
        }

        CollectedSignals {
            onchain: OnChainSignals {
                tx_count: Observed::from(tx_count),
                is_contract,
                contract_verified: Observed::from(verified),
                contract_age_days: Observed::from(contract_age_days),
            },
            transfers,
            sources,
        }
    }

    /// Recent transfers of the wallet's newest distinct counterparties.
    ///
    /// Best effort: a failed or slow neighbour is logged and skipped, and
    /// never marks the transfers source as degraded.
    async fn expand_neighbors(&self, wallet: &Address, edges: &[TransferEdge]) -> Vec<TransferEdge> {
        let neighbors = counterparties(wallet, edges, self.neighbor_fanout);
        if neighbors.is_empty() {
            return Vec::new();
        }

        let mut tasks = JoinSet::new();
        for neighbor in neighbors {
            let source = self.source.clone();
            let budget = self.fetch_timeout;
            tasks.spawn(async move {
                let fetched = tokio::time::timeout(
                    budget,
                    source.recent_transfers(&neighbor, NEIGHBOR_TRANSFER_LIMIT),
                )
                .await;
                (neighbor, fetched)
            });
        }

        let mut expanded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Ok(mut found)))) => {
                    found.truncate(NEIGHBOR_TRANSFER_LIMIT);
                    expanded.extend(found);
                }
                Ok((neighbor, Ok(Err(e)))) => {
                    debug!("🔗 Neighbour {} transfers unavailable: {}", neighbor, e);
                }
                Ok((neighbor, Err(_))) => {
                    debug!("⏱️ Neighbour {} transfers timed out", neighbor);
                }
                Err(e) => {
                    debug!("🔗 Neighbour fetch task aborted: {}", e);
                }
            }
        }

        debug!("🔗 {} neighbour edges added for {}", expanded.len(), wallet);
        expanded
    }
}

/// First `limit` distinct addresses the wallet exchanged value with, in edge order
fn counterparties(wallet: &Address, edges: &[TransferEdge], limit: usize) -> Vec<Address> {
    let mut found: Vec<Address> = Vec::with_capacity(limit);
    for edge in edges {
        if found.len() >= limit {
            break;
        }
        let other = if &edge.from == wallet { &edge.to } else { &edge.from };
        if other != wallet && !found.contains(other) {
            found.push(other.clone());
        }
    }
    found
}

/// Whole days between deployment and `now`; future timestamps clamp to 0
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - created_at).num_days().max(0) as u64
}
