//! RPC Client Module - Ethereum JSON-RPC over HTTP
//!
//! 1. Primary endpoint (Alchemy when a key is configured) plus optional public fallback
//! 2. Exponential backoff retry with jitter on 429 and transport errors
//! 3. User-Agent header, gzip, API key masked in every log line
//!
//! Only the handful of read calls the signal collector needs are exposed:
//! `eth_getTransactionCount`, `eth_getCode` and `eth_blockNumber`.
//! Retries stay short because every call runs under the collector's
//! per-fetch timeout.

use eyre::{eyre, Result};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::config::ServiceConfig;
use crate::utils::constants::{
    mask_url, DEFAULT_RPC_TIMEOUT_SECS, PUBLIC_RPC_FALLBACK, USER_AGENT as USER_AGENT_CONST,
};

// ============================================
// RETRY CONSTANTS
// ============================================

/// Base retry delay in milliseconds
pub const RPC_BASE_RETRY_MS: u64 = 250;

/// Maximum retry delay in milliseconds
pub const RPC_MAX_RETRY_MS: u64 = 2_000;

/// Maximum attempts per endpoint
pub const RPC_MAX_RETRIES: u32 = 3;

/// Jitter percentage for retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Backoff delay before `attempt` (1-based), jittered
pub fn backoff_delay_ms(attempt: u32) -> u64 {
    let base_delay = RPC_BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    let capped_delay = base_delay.min(RPC_MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    (capped_delay as i64 + jitter).max(50) as u64
}

/// Build the shared HTTP client (gzip, User-Agent, request timeout)
pub fn build_http_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS))
        .gzip(true)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_hex_u64(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| eyre!("Quantity missing 0x prefix: {}", raw))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|e| eyre!("Invalid hex quantity {}: {}", raw, e))
}

/// RPC Provider with retry logic and fallback support
#[derive(Clone)]
pub struct RpcProvider {
    primary_url: String,
    fallback_url: Option<String>,
    client: reqwest::Client,
}

impl RpcProvider {
    /// Create a provider for an explicit endpoint
    pub fn new(primary_url: impl Into<String>, fallback_url: Option<String>) -> Result<Self> {
        let primary_url = primary_url.into();
        let fallback_url = fallback_url.filter(|f| *f != primary_url);
        Ok(Self {
            primary_url,
            fallback_url,
            client: build_http_client()?,
        })
    }

    /// Create a provider from service config, falling back to the public RPC
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let provider = Self::new(config.rpc_url.clone(), Some(PUBLIC_RPC_FALLBACK.to_string()))?;
        info!("✅ RPC provider initialized ({})", provider.masked_url());
        Ok(provider)
    }

    /// Execute JSON-RPC call with retry logic and fallback
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let primary_err = match self.call_with_retry(&self.primary_url, &payload).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                warn!("⚠️ Primary RPC failed for {}: {}", method, e);
                e
            }
        };

        if let Some(ref fallback) = self.fallback_url {
            info!("🔄 Trying fallback RPC for {}", method);
            match self.call_with_retry(fallback, &payload).await {
                Ok(result) => return Ok(result),
                Err(e) => warn!("⚠️ Fallback RPC also failed: {}", e),
            }
        }

        Err(eyre!("All RPC endpoints failed for {}: {}", method, primary_err))
    }

    /// Execute call with exponential backoff
    async fn call_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let mut last_error = None;

        for attempt in 0..RPC_MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay_ms(attempt);
                debug!("⏳ Retry {}/{} after {}ms", attempt + 1, RPC_MAX_RETRIES, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.execute_call::<T>(url, payload).await {
                Ok(result) => return Ok(result),
                Err(CallError::Fatal(e)) => return Err(e),
                Err(CallError::Retryable(e)) => {
                    if e.to_string().contains("429") {
                        warn!(
                            "⏳ Rate limited (HTTP 429), backing off (attempt {}/{})",
                            attempt + 1,
                            RPC_MAX_RETRIES
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| eyre!("Unknown error after {} retries", RPC_MAX_RETRIES)))
    }

    /// Execute single RPC call
    async fn execute_call<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> std::result::Result<T, CallError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CallError::Retryable(eyre!("Request failed: {}", e)))?;

        let status = response.status();
        if status == 429 {
            return Err(CallError::Retryable(eyre!("Rate limited (HTTP 429)")));
        }
        if status.is_server_error() {
            return Err(CallError::Retryable(eyre!("HTTP error: {}", status)));
        }
        if !status.is_success() {
            return Err(CallError::Fatal(eyre!("HTTP error: {}", status)));
        }

        let json: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| CallError::Fatal(eyre!("Failed to parse response: {}", e)))?;

        if let Some(error) = json.error {
            let err = eyre!("RPC error: {} (code: {})", error.message, error.code);
            return Err(if error.is_rate_limit() {
                CallError::Retryable(err)
            } else {
                CallError::Fatal(err)
            });
        }

        json.result
            .ok_or_else(|| CallError::Fatal(eyre!("No result in response")))
    }

    /// Outgoing transaction count (nonce) at latest block
    pub async fn get_transaction_count(&self, address: &str) -> Result<u64> {
        let params = serde_json::json!([address, "latest"]);
        let raw: String = self.call("eth_getTransactionCount", params).await?;
        parse_hex_u64(&raw)
    }

    /// Get bytecode
    pub async fn get_code(&self, address: &str) -> Result<String> {
        let params = serde_json::json!([address, "latest"]);
        self.call::<String>("eth_getCode", params).await
    }

    /// True when the address has deployed bytecode
    pub async fn has_code(&self, address: &str) -> Result<bool> {
        let code = self.get_code(address).await?;
        Ok(!matches!(code.as_str(), "" | "0x" | "0x0"))
    }

    /// Latest block number
    pub async fn block_number(&self) -> Result<u64> {
        let raw: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_hex_u64(&raw)
    }

    /// Primary URL (Alchemy-only methods are sent here)
    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        mask_url(&self.primary_url)
    }

    /// Alchemy endpoints also serve `alchemy_*` methods
    pub fn is_alchemy(&self) -> bool {
        self.primary_url.contains("alchemy.com")
    }
}

enum CallError {
    Retryable(eyre::Report),
    Fatal(eyre::Report),
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Check if this is a rate limit error (HTTP 429 or code -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x0").unwrap(), 0);
        assert_eq!(parse_hex_u64("0x").unwrap(), 0);
        assert_eq!(parse_hex_u64("0x1a").unwrap(), 26);
        assert!(parse_hex_u64("1a").is_err());
        assert!(parse_hex_u64("0xzz").is_err());
    }

    #[test]
    fn test_backoff_is_bounded() {
        for attempt in 1..10 {
            let delay = backoff_delay_ms(attempt);
            assert!(delay >= 50);
            assert!(delay <= RPC_MAX_RETRY_MS + RPC_MAX_RETRY_MS * RETRY_JITTER_PERCENT / 100);
        }
    }

    #[test]
    fn test_masked_url_hides_key() {
        let provider = RpcProvider::new("https://eth-mainnet.g.alchemy.com/v2/secret", None).unwrap();
        assert!(!provider.masked_url().contains("secret"));
        assert!(provider.is_alchemy());
    }

    #[test]
    fn test_fallback_equal_to_primary_is_dropped() {
        let provider = RpcProvider::new(PUBLIC_RPC_FALLBACK, Some(PUBLIC_RPC_FALLBACK.to_string())).unwrap();
        assert!(provider.fallback_url.is_none());
        assert!(!provider.is_alchemy());
    }

    #[test]
    fn test_rpc_error_classification() {
        let rate_limit_error = RpcError {
            code: -32005,
            message: "Rate limit exceeded".to_string(),
        };
        assert!(rate_limit_error.is_rate_limit());

        let method_not_found = RpcError {
            code: -32601,
            message: "Method not found".to_string(),
        };
        assert!(!method_not_found.is_rate_limit());
    }
}
