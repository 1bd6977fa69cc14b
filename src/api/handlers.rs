//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::types::*;
use crate::core::engine::RiskEngine;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Address, RiskAssessment, TxType, Verdict};
use crate::utils::cache::AssessmentCache;
use crate::utils::constants::{APP_VERSION, MAX_BATCH_SIZE};
use crate::utils::telemetry::TelemetryCollector;

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Shared application state
pub struct AppState {
    pub engine: RiskEngine,
    pub telemetry: Arc<TelemetryCollector>,
    pub cache: Arc<AssessmentCache>,
    pub start_time: Instant,
}

impl AppState {
    /// Must be called inside a tokio runtime (spawns the cache janitor)
    pub fn new(engine: RiskEngine, telemetry: Arc<TelemetryCollector>, cache: AssessmentCache) -> Self {
        let cache = Arc::new(cache);

        if cache.is_enabled() {
            let cache_clone = cache.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
                loop {
                    interval.tick().await;
                    cache_clone.cleanup_expired();
                }
            });
        }

        Self {
            engine,
            telemetry,
            cache,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn error_response(err: &AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), elapsed_ms(start))),
    )
}

/// Malformed bodies get the same envelope as every other client error
fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    start: Instant,
) -> Result<T, (StatusCode, Json<ApiResponse<()>>)> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| error_response(&AppError::bad_request(rejection.body_text()), start))
}

fn parse_request(req: &AnalyzeRequest) -> AppResult<(Address, Address, TxType)> {
    let wallet = Address::parse(&req.wallet)?;
    let contract = Address::parse(&req.contract)?;
    let tx_type = req.tx_type.parse()?;
    Ok((wallet, contract, tx_type))
}

/// Cache lookup, then the engine; telemetry records every outcome
async fn run_analysis(
    engine: &RiskEngine,
    cache: &AssessmentCache,
    telemetry: &TelemetryCollector,
    req: &AnalyzeRequest,
) -> AppResult<RiskAssessment> {
    let start = Instant::now();

    let (wallet, contract, tx_type) = match parse_request(req) {
        Ok(parsed) => parsed,
        Err(e) => {
            telemetry.record_failure();
            return Err(e);
        }
    };

    if let Some(cached) = cache.get(&wallet, &contract, tx_type) {
        return Ok(cached);
    }

    match engine.analyze_transaction(&wallet, &contract, tx_type).await {
        Ok(assessment) => {
            telemetry.record_assessment(&assessment, start.elapsed().as_millis() as u64);
            let degraded = assessment.signals().sources.degraded_sources();
            if degraded.is_empty() {
                cache.set(&assessment);
            } else {
                debug!("🚫 Not caching assessment with degraded sources: {:?}", degraded);
            }
            Ok(assessment)
        }
        Err(e) => {
            error!("❌ Analysis failed: {}", e);
            telemetry.record_failure();
            Err(e)
        }
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Transaction Analysis
// ============================================

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<AnalyzeData> {
    let start = Instant::now();
    let req = json_body(payload, start)?;

    let assessment = run_analysis(&state.engine, &state.cache, &state.telemetry, &req)
        .await
        .map_err(|e| error_response(&e, start))?;

    Ok(Json(ApiResponse::success(
        AnalyzeData::from(&assessment),
        elapsed_ms(start),
    )))
}

// ============================================
// Batch Analysis
// ============================================

pub async fn batch_analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchAnalysisRequest>, JsonRejection>,
) -> ApiResult<BatchAnalysisData> {
    let start = Instant::now();
    let req = json_body(payload, start)?;

    if req.requests.is_empty() {
        return Err(error_response(
            &AppError::bad_request("requests array cannot be empty"),
            start,
        ));
    }

    if req.requests.len() > MAX_BATCH_SIZE {
        return Err(error_response(
            &AppError::bad_request(format!(
                "Maximum {} transactions per batch request",
                MAX_BATCH_SIZE
            )),
            start,
        ));
    }

    let concurrency = req.concurrency.clamp(1, MAX_BATCH_SIZE);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(req.requests.len());

    for item in req.requests.iter().cloned() {
        let sem = semaphore.clone();
        let state = state.clone();

        handles.push(tokio::spawn(async move {
            let item_start = Instant::now();
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| AppError::internal(format!("Batch semaphore closed: {}", e)))?;
            let assessment =
                run_analysis(&state.engine, &state.cache, &state.telemetry, &item).await?;
            Ok::<_, AppError>((assessment, elapsed_ms(item_start)))
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (item, handle) in req.requests.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("⚠️ Batch item task aborted: {}", e);
                state.telemetry.record_failure();
                Err(AppError::analysis_failed(format!("Analysis task aborted: {}", e)))
            }
        };

        results.push(match outcome {
            Ok((assessment, latency_ms)) => BatchItemResult {
                wallet: item.wallet.clone(),
                contract: item.contract.clone(),
                tx_type: item.tx_type.clone(),
                status: "success".to_string(),
                result: Some(AnalyzeData::from(&assessment)),
                error: None,
                latency_ms,
            },
            Err(e) => BatchItemResult {
                wallet: item.wallet.clone(),
                contract: item.contract.clone(),
                tx_type: item.tx_type.clone(),
                status: "error".to_string(),
                result: None,
                error: Some(ApiError::from(&e)),
                latency_ms: 0.0,
            },
        });
    }

    let count = |verdict: Verdict| {
        results
            .iter()
            .filter(|r| r.result.as_ref().map(|d| d.verdict == verdict).unwrap_or(false))
            .count()
    };
    let total_safe = count(Verdict::Safe);
    let total_caution = count(Verdict::Caution);
    let total_dangerous = count(Verdict::Dangerous);
    let total_failed = results.iter().filter(|r| r.error.is_some()).count();

    info!(
        "📦 Batch: {} analyzed (✅ {} / 🟠 {} / 💀 {}), {} failed in {:.0}ms",
        results.len(),
        total_safe,
        total_caution,
        total_dangerous,
        total_failed,
        elapsed_ms(start)
    );

    let data = BatchAnalysisData {
        total_requested: req.requests.len(),
        total_processed: results.len() - total_failed,
        total_safe,
        total_caution,
        total_dangerous,
        total_failed,
        results,
        processing_time_ms: elapsed_ms(start),
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let cache = state.cache.stats();

    info!(
        "📊 Cache Stats: {} entries, {:.1}% hit rate ({} hits / {} misses)",
        cache.entries, cache.hit_rate, cache.hits, cache.misses
    );

    let data = StatsData {
        telemetry: state.telemetry.get_stats(),
        cache,
        registry_size: state.engine.registry().len(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}
