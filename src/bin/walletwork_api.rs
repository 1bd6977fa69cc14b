//! WalletWork API Server
//!
//! REST API answering "how dangerous is this transaction?" before signing
//!
//! Usage:
//!   cargo run --bin walletwork_api
//!
//! Environment:
//!   PORT / WALLETWORK_PORT   - Server port (default: 8000)
//!   WALLETWORK_HOST          - Server host (default: 0.0.0.0)
//!   ETH_HTTP_URL / ALCHEMY_API_KEY, ETHERSCAN_API_KEY
//!   WALLETWORK_SCAM_REGISTRY - Registry snapshot (default: ./data/scam_registry.json)
//!   RUST_LOG                 - Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use walletwork::api::{create_router, start_cleanup_task, AppState};
use walletwork::{AssessmentCache, RiskConfig, RiskEngine, ServiceConfig, TelemetryCollector};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let service_config = ServiceConfig::from_env();
    let risk_config = RiskConfig::from_env()?;
    info!("🔌 RPC endpoint: {}", service_config.masked_rpc_url());

    let engine = RiskEngine::from_config(Arc::new(risk_config), &service_config)?;

    let telemetry = Arc::new(TelemetryCollector::new());
    let telemetry_for_shutdown = telemetry.clone();

    let cache = AssessmentCache::with_ttl(service_config.cache_ttl_secs);
    let state = Arc::new(AppState::new(engine, telemetry, cache));

    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", service_config.host, service_config.port).parse()?;

    info!("🛡️ WalletWork API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/analyze          - Pre-signing transaction analysis");
    info!("  POST /v1/analyze/batch    - Batch analysis (up to 50 transactions)");
    info!("  GET  /v1/stats            - Verdict and degradation statistics");
    info!("  GET  /v1/health           - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = telemetry_for_shutdown.get_stats();
    info!("{}", stats.summary());

    match telemetry_for_shutdown.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 WalletWork API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════╗
    ║                                                  ║
    ║        W A L L E T W O R K   A P I   v0.1.0      ║
    ║      Pre-signing transaction risk analysis       ║
    ║                                                  ║
    ╚══════════════════════════════════════════════════╝
    "#
    );
}
