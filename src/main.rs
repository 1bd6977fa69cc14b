//! WalletWork CLI - one-shot transaction analysis
//!
//! Usage:
//!   walletwork <wallet> <contract> <tx_type>
//!
//! Prints the assessment as JSON on stdout; logs go to stderr.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use walletwork::api::AnalyzeData;
use walletwork::{RiskConfig, RiskEngine, ServiceConfig};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [wallet, contract, tx_type] = args.as_slice() else {
        eprintln!("Usage: walletwork <wallet> <contract> <send|approve|swap|transfer>");
        std::process::exit(2);
    };

    let service_config = ServiceConfig::from_env();
    let risk_config = RiskConfig::from_env()?;
    let engine = RiskEngine::from_config(Arc::new(risk_config), &service_config)?;

    let assessment = engine.analyze_raw(wallet, contract, tx_type).await?;
    eprintln!("{}", assessment.summary());
    println!("{}", serde_json::to_string_pretty(&AnalyzeData::from(&assessment))?);

    Ok(())
}
