//! Alchemy Transfers API
//!
//! `alchemy_getAssetTransfers` is the only non-standard method the engine
//! relies on: it gives the recent value movements around a wallet that the
//! proximity analyzer walks. Both directions are fetched (wallet as sender
//! and wallet as receiver) and merged newest first.
//!
//! Compute Units: 120 CU per call, so 240 CU per analysis.
//! Reference: https://alchemy.com/docs/reference/transfers-api-quickstart.mdx

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rpc::{parse_hex_u64, RpcProvider};
use crate::models::types::{Address, TransferEdge};

// ============================================
// TRANSFERS API TYPES
// ============================================

/// Transfer category filter
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferCategory {
    External,
    Internal,
    Erc20,
    Erc721,
    Erc1155,
}

/// Categories that move value a drainer cares about
pub const VALUE_CATEGORIES: [TransferCategory; 3] = [
    TransferCategory::External,
    TransferCategory::Internal,
    TransferCategory::Erc20,
];

/// Asset transfer entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    pub block_num: String,
    pub hash: String,
    pub from: String,
    /// Absent for contract creations
    pub to: Option<String>,
    pub value: Option<f64>,
    pub asset: Option<String>,
    pub category: String,
}

impl AssetTransfer {
    /// Convert into a graph edge; `None` when there is no counterparty
    pub fn to_edge(&self) -> Option<TransferEdge> {
        let to = self.to.as_deref()?;
        let block = parse_hex_u64(&self.block_num).ok()?;
        Some(TransferEdge::new(
            Address::normalized(&self.from),
            Address::normalized(to),
            block,
            self.value.unwrap_or(0.0),
        ))
    }
}

/// Response from alchemy_getAssetTransfers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersResponse {
    pub transfers: Vec<AssetTransfer>,
    pub page_key: Option<String>,
}

/// Which side of the transfer the wallet sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Outgoing,
    Incoming,
}

/// Build the request params for one direction
pub fn transfer_query(wallet: &Address, direction: TransferDirection, max_count: usize) -> serde_json::Value {
    let mut params = serde_json::json!({
        "fromBlock": "0x0",
        "toBlock": "latest",
        "category": VALUE_CATEGORIES,
        "order": "desc",
        "withMetadata": false,
        "excludeZeroValue": true,
        "maxCount": format!("0x{:x}", max_count.max(1)),
    });

    let key = match direction {
        TransferDirection::Outgoing => "fromAddress",
        TransferDirection::Incoming => "toAddress",
    };
    params[key] = serde_json::Value::String(wallet.as_str().to_string());

    serde_json::json!([params])
}

/// Merge two directions newest first, drop duplicates, keep `limit`
pub fn merge_transfers(
    outgoing: Vec<TransferEdge>,
    incoming: Vec<TransferEdge>,
    limit: usize,
) -> Vec<TransferEdge> {
    let mut merged: Vec<TransferEdge> = outgoing;
    merged.extend(incoming);
    merged.sort_by(|a, b| {
        b.block
            .cmp(&a.block)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
    merged.dedup();
    merged.truncate(limit);
    merged
}

// ============================================
// ALCHEMY API CLIENT
// ============================================

/// Alchemy Enhanced API Client
#[derive(Clone)]
pub struct AlchemyClient {
    provider: RpcProvider,
}

impl AlchemyClient {
    /// Create client from an RPC provider pointing at Alchemy
    pub fn new(provider: RpcProvider) -> Result<Self> {
        if !provider.is_alchemy() {
            return Err(eyre!(
                "Transfers API needs an Alchemy endpoint, got {}",
                provider.masked_url()
            ));
        }
        Ok(Self { provider })
    }

    /// One page of transfers in one direction
    pub async fn get_asset_transfers(
        &self,
        wallet: &Address,
        direction: TransferDirection,
        max_count: usize,
    ) -> Result<AssetTransfersResponse> {
        let params = transfer_query(wallet, direction, max_count);
        self.provider
            .call::<AssetTransfersResponse>("alchemy_getAssetTransfers", params)
            .await
    }

    /// Most recent transfers in either direction, newest first
    pub async fn recent_transfers(&self, wallet: &Address, limit: usize) -> Result<Vec<TransferEdge>> {
        let (outgoing, incoming) = tokio::try_join!(
            self.get_asset_transfers(wallet, TransferDirection::Outgoing, limit),
            self.get_asset_transfers(wallet, TransferDirection::Incoming, limit),
        )?;

        let to_edges = |resp: AssetTransfersResponse| -> Vec<TransferEdge> {
            resp.transfers.iter().filter_map(AssetTransfer::to_edge).collect()
        };
        let edges = merge_transfers(to_edges(outgoing), to_edges(incoming), limit);

        debug!("🔗 {} transfer edges fetched for {}", edges.len(), wallet);
        Ok(edges)
    }
}
