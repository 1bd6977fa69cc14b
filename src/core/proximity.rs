//! Graph Proximity Analyzer
//!
//! Breadth-first search over the undirected transfer graph around a wallet,
//! looking for the nearest address listed in the scam registry. Receiving
//! from a flagged address exposes the wallet as much as sending to one, so
//! every edge is walked in both directions.
//!
//! Pure function of (wallet, transfers, registry): no I/O, no clock.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::config::RiskConfig;
use crate::models::types::{Address, HopDistance, ProximityResult, ScamRecord, TransferEdge};
use crate::providers::registry::ScamStore;

/// Undirected adjacency view over a set of transfer edges
struct TransferGraph<'a> {
    adjacency: HashMap<&'a Address, Vec<&'a Address>>,
}

impl<'a> TransferGraph<'a> {
    fn build(transfers: &'a [TransferEdge]) -> Self {
        let mut adjacency: HashMap<&'a Address, Vec<&'a Address>> = HashMap::new();
        for edge in transfers {
            adjacency.entry(&edge.from).or_default().push(&edge.to);
            adjacency.entry(&edge.to).or_default().push(&edge.from);
        }
        Self { adjacency }
    }

    fn neighbors(&self, node: &Address) -> &[&'a Address] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Scam-proximity search with a bounded depth
#[derive(Debug, Clone, Copy)]
pub struct ProximityAnalyzer {
    max_depth: u8,
    cluster_hop_threshold: u8,
}

impl ProximityAnalyzer {
    pub fn new(max_depth: u8, cluster_hop_threshold: u8) -> Self {
        Self {
            max_depth,
            cluster_hop_threshold,
        }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.proximity_max_depth, config.cluster_hop_threshold)
    }

    /// Minimum hop distance from `wallet` to any registry member
    pub fn analyze(
        &self,
        wallet: &Address,
        transfers: &[TransferEdge],
        registry: &ScamStore,
    ) -> ProximityResult {
        if let Some(record) = registry.get(wallet) {
            debug!("🎯 Wallet {} is itself a registry member", wallet);
            return self.matched(0, record);
        }

        if transfers.is_empty() || registry.is_empty() {
            return ProximityResult::unreachable();
        }

        let graph = TransferGraph::build(transfers);
        let mut visited: HashSet<&Address> = HashSet::new();
        visited.insert(wallet);
        let mut frontier: Vec<&Address> = vec![wallet];

        for depth in 1..=self.max_depth {
            let mut next: Vec<&Address> = Vec::new();
            for node in &frontier {
                for neighbor in graph.neighbors(node) {
                    if visited.insert(*neighbor) {
                        next.push(*neighbor);
                    }
                }
            }

            if next.is_empty() {
                break;
            }

            // Same-depth ties: highest confidence, then lowest address
            let nearest = next
                .iter()
                .filter_map(|addr| registry.get(addr))
                .max_by(|a, b| {
                    a.confidence
                        .partial_cmp(&b.confidence)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| b.address.cmp(&a.address))
                });

            if let Some(record) = nearest {
                debug!(
                    "🎯 Registry member {} found {} hop(s) from {}",
                    record.address, depth, wallet
                );
                return self.matched(depth, record);
            }

            frontier = next;
        }

        ProximityResult::unreachable()
    }

    fn matched(&self, hops: u8, record: &ScamRecord) -> ProximityResult {
        ProximityResult {
            hop_distance: HopDistance::Hops(hops),
            connected_to_cluster: hops <= self.cluster_hop_threshold,
            cluster_id: record.cluster_id.clone(),
            matched_address: Some(record.address.clone()),
            matched_category: Some(record.category),
        }
    }
}

impl Default for ProximityAnalyzer {
    fn default() -> Self {
        Self::from_config(&RiskConfig::default())
    }
}
