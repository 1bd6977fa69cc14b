//! Block Explorer Client - Etherscan-compatible REST API
//!
//! Two lookups, both only meaningful for addresses with bytecode:
//! - `module=contract&action=getsourcecode` → is the source verified?
//! - `module=contract&action=getcontractcreation` → when was it deployed?
//!
//! Works keyless at the public rate limit; set ETHERSCAN_API_KEY for more.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use eyre::{eyre, Result};
use serde::Deserialize;
use tracing::debug;

use super::rpc::build_http_client;
use crate::models::config::ServiceConfig;
use crate::models::types::Address;
use crate::utils::constants::SECONDS_PER_BLOCK;

/// Envelope shared by every explorer endpoint
#[derive(Debug, Deserialize)]
pub struct ExplorerResponse {
    pub status: String,
    pub message: String,
    /// Array on success, error string on failure
    pub result: serde_json::Value,
}

impl ExplorerResponse {
    /// Unwrap the result array, or report the explorer's error message
    pub fn into_entries<T: for<'de> Deserialize<'de>>(self) -> Result<Vec<T>> {
        if self.status != "1" {
            let detail = self.result.as_str().unwrap_or_default();
            return Err(eyre!("Explorer error: {} {}", self.message, detail));
        }
        serde_json::from_value(self.result)
            .map_err(|e| eyre!("Failed to parse explorer result: {}", e))
    }
}

/// `getsourcecode` entry (fields we read)
#[derive(Debug, Clone, Deserialize)]
pub struct SourceCodeEntry {
    #[serde(rename = "SourceCode", default)]
    pub source_code: String,
    #[serde(rename = "ContractName", default)]
    pub contract_name: String,
}

impl SourceCodeEntry {
    pub fn is_verified(&self) -> bool {
        !self.source_code.trim().is_empty()
    }
}

/// `getcontractcreation` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCreation {
    pub contract_address: String,
    pub contract_creator: String,
    pub tx_hash: String,
    /// Newer API versions include these, older ones do not
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ContractCreation {
    /// Deployment time from the explicit timestamp, if present
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.timestamp.as_deref()?.trim().parse().ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.as_deref()?.trim().parse().ok()
    }

    /// Deployment time estimated from block distance
    pub fn estimated_created_at(&self, latest_block: u64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let created = self.block()?;
        let blocks_ago = latest_block.saturating_sub(created);
        let secs = i64::try_from(blocks_ago.saturating_mul(SECONDS_PER_BLOCK)).ok()?;
        Some(now - ChronoDuration::seconds(secs))
    }
}

/// Etherscan-style explorer client
#[derive(Clone)]
pub struct ExplorerClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ExplorerClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(config.explorer_url.clone(), config.explorer_api_key.clone())
    }

    fn query<'a>(&'a self, action: &'a str, address_key: &'a str, address: &'a Address) -> Vec<(&'a str, &'a str)> {
        let mut params = vec![
            ("module", "contract"),
            ("action", action),
            (address_key, address.as_str()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.as_str()));
        }
        params
    }

    async fn get_entries<T: for<'de> Deserialize<'de>>(&self, params: &[(&str, &str)]) -> Result<Vec<T>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await
            .map_err(|e| eyre!("Explorer request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Explorer API error: {}", response.status()));
        }

        let body: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse explorer response: {}", e))?;
        body.into_entries()
    }

    /// True when the contract's source is published on the explorer
    pub async fn is_verified(&self, contract: &Address) -> Result<bool> {
        let params = self.query("getsourcecode", "address", contract);
        let entries: Vec<SourceCodeEntry> = self.get_entries(&params).await?;
        let entry = entries
            .first()
            .ok_or_else(|| eyre!("Explorer returned no source entry for {}", contract))?;

        debug!(
            "📜 {} verified={} ({})",
            contract,
            entry.is_verified(),
            if entry.contract_name.is_empty() { "unnamed" } else { entry.contract_name.as_str() }
        );
        Ok(entry.is_verified())
    }

    /// Creation record of a contract
    pub async fn contract_creation(&self, contract: &Address) -> Result<ContractCreation> {
        let params = self.query("getcontractcreation", "contractaddresses", contract);
        let entries: Vec<ContractCreation> = self.get_entries(&params).await?;
        entries
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("Explorer returned no creation record for {}", contract))
    }
}
