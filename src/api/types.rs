//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::errors::AppError;
use crate::models::types::{RiskAssessment, Verdict};
use crate::utils::cache::CacheStats;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Transaction Analysis
// ============================================

/// Raw request; validated in the handler so errors carry our codes
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub wallet: String,
    pub contract: String,
    pub tx_type: String,
}

/// Signal bundle as exposed to clients
#[derive(Debug, Serialize)]
pub struct SignalsResponse {
    pub fresh_wallet: bool,
    pub unverified_contract: bool,
    /// Absent when unreachable or not computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hop_distance: Option<u8>,
    pub connected_to_cluster: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub drain_probability: f64,
    pub attack_window_blocks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_age_days: Option<u64>,
    /// Sources that fell back to a neutral default
    pub degraded_sources: Vec<&'static str>,
}

/// Flat assessment document
#[derive(Debug, Serialize)]
pub struct AnalyzeData {
    pub verdict: Verdict,
    pub score: u8,
    pub reasons: Vec<String>,
    pub signals: SignalsResponse,
    pub assessment_id: String,
    pub timestamp: String,
}

impl From<&RiskAssessment> for AnalyzeData {
    fn from(assessment: &RiskAssessment) -> Self {
        let signals = assessment.signals();
        Self {
            verdict: assessment.verdict(),
            score: assessment.score(),
            reasons: assessment.reasons().to_vec(),
            signals: SignalsResponse {
                fresh_wallet: signals.fresh_wallet,
                unverified_contract: signals.unverified_contract,
                hop_distance: signals.proximity.hop_distance.hops(),
                connected_to_cluster: signals.proximity.connected_to_cluster,
                cluster_id: signals.proximity.cluster_id.clone(),
                drain_probability: signals.simulation.drain_probability,
                attack_window_blocks: signals.simulation.attack_window_blocks,
                contract_age_days: signals.onchain.contract_age_days.known(),
                degraded_sources: signals.sources.degraded_sources(),
            },
            assessment_id: assessment.assessment_id().to_string(),
            timestamp: assessment.timestamp().to_rfc3339(),
        }
    }
}

// ============================================
// Batch Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct BatchAnalysisRequest {
    pub requests: Vec<AnalyzeRequest>,
    /// Max concurrent analyses (default: 10, max: 50)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub wallet: String,
    pub contract: String,
    pub tx_type: String,
    pub status: String, // "success" | "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalyzeData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchAnalysisData {
    pub total_requested: usize,
    pub total_processed: usize,
    pub total_safe: usize,
    pub total_caution: usize,
    pub total_dangerous: usize,
    pub total_failed: usize,
    pub results: Vec<BatchItemResult>,
    pub processing_time_ms: f64,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub telemetry: TelemetryStats,
    pub cache: CacheStats,
    pub registry_size: usize,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
