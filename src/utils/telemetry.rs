//! Telemetry Module
//!
//! In-process counters for the stats endpoint and periodic JSON export:
//! analyses by verdict, degraded fetches by source, failures, latency.
//!
//! Privacy-first: no wallet or contract addresses are stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::types::{RiskAssessment, Verdict};

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    /// Completed assessments
    pub total_analyzed: u64,
    pub safe: u64,
    pub caution: u64,
    pub dangerous: u64,
    /// Requests that ended in an error instead of an assessment
    pub failed: u64,
    /// Assessments with at least one degraded source
    pub degraded_assessments: u64,
    /// Degraded fetches by source name
    pub degraded_by_source: HashMap<String, u64>,
    /// Average analysis latency (ms)
    pub avg_latency_ms: f64,
    pub period_start: u64,
    pub period_end: u64,
}

impl TelemetryStats {
    /// Share of analyses that ended DANGEROUS (0-100)
    pub fn dangerous_rate(&self) -> f64 {
        if self.total_analyzed == 0 {
            0.0
        } else {
            self.dangerous as f64 / self.total_analyzed as f64 * 100.0
        }
    }

    /// Plain-text report for logs
    pub fn summary(&self) -> String {
        format!(
            "🛡️ WalletWork report: {} analyzed (✅ {} / 🟠 {} / 💀 {}), {} failed, {} degraded, avg {:.1}ms",
            self.total_analyzed,
            self.safe,
            self.caution,
            self.dangerous,
            self.failed,
            self.degraded_assessments,
            self.avg_latency_ms
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Main telemetry collector
pub struct TelemetryCollector {
    total_analyzed: AtomicU64,
    safe: AtomicU64,
    caution: AtomicU64,
    dangerous: AtomicU64,
    failed: AtomicU64,
    degraded_assessments: AtomicU64,
    total_latency_ms: AtomicU64,
    degraded_by_source: RwLock<HashMap<&'static str, u64>>,
    session_start: u64,
    export_dir: PathBuf,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self::with_export_dir(PathBuf::from("./telemetry"))
    }

    pub fn with_export_dir(export_dir: PathBuf) -> Self {
        Self {
            total_analyzed: AtomicU64::new(0),
            safe: AtomicU64::new(0),
            caution: AtomicU64::new(0),
            dangerous: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            degraded_assessments: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            degraded_by_source: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
            export_dir,
        }
    }

    /// Record a finished assessment
    pub fn record_assessment(&self, assessment: &RiskAssessment, latency_ms: u64) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        let counter = match assessment.verdict() {
            Verdict::Safe => &self.safe,
            Verdict::Caution => &self.caution,
            Verdict::Dangerous => &self.dangerous,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let degraded = assessment.signals().sources.degraded_sources();
        if !degraded.is_empty() {
            self.degraded_assessments.fetch_add(1, Ordering::Relaxed);
            if let Ok(mut counts) = self.degraded_by_source.write() {
                for source in degraded {
                    *counts.entry(source).or_insert(0) += 1;
                }
            }
        }
    }

    /// Record a request that produced no assessment
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total_analyzed = self.total_analyzed.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency_ms = if total_analyzed > 0 {
            total_latency as f64 / total_analyzed as f64
        } else {
            0.0
        };

        let degraded_by_source = self
            .degraded_by_source
            .read()
            .map(|counts| counts.iter().map(|(k, v)| (k.to_string(), *v)).collect())
            .unwrap_or_default();

        TelemetryStats {
            total_analyzed,
            safe: self.safe.load(Ordering::Relaxed),
            caution: self.caution.load(Ordering::Relaxed),
            dangerous: self.dangerous.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            degraded_assessments: self.degraded_assessments.load(Ordering::Relaxed),
            degraded_by_source,
            avg_latency_ms,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Export current stats to a timestamped JSON file
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.export_dir)?;

        let stats = self.get_stats();
        let path = self
            .export_dir
            .join(format!("stats_{}.json", current_timestamp()));

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk_score::RiskAggregator;
    use crate::models::types::{
        Address, FetchStatus, HopDistance, Observed, OnChainSignals, ProximityResult, SourceReport,
        TxType,
    };

    fn assessment(hops: Option<u8>, sources: SourceReport) -> RiskAssessment {
        let proximity = match hops {
            Some(n) => ProximityResult {
                hop_distance: HopDistance::Hops(n),
                connected_to_cluster: n <= 2,
                ..ProximityResult::unreachable()
            },
            None => ProximityResult::unreachable(),
        };
        RiskAggregator::default().aggregate(
            &Address::normalized("0x1111111111111111111111111111111111111111"),
            &Address::normalized("0x2222222222222222222222222222222222222222"),
            TxType::Send,
            OnChainSignals {
                tx_count: Observed::Known(10),
                ..OnChainSignals::unknown()
            },
            proximity,
            sources,
        )
    }

    #[test]
    fn test_counts_by_verdict() {
        let collector = TelemetryCollector::new();
        collector.record_assessment(&assessment(None, SourceReport::all_ok()), 10);
        collector.record_assessment(&assessment(Some(0), SourceReport::all_ok()), 30);
        collector.record_failure();

        let stats = collector.get_stats();
        assert_eq!(stats.total_analyzed, 2);
        assert_eq!(stats.safe, 1);
        assert_eq!(stats.caution, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.avg_latency_ms, 20.0);
    }

    #[test]
    fn test_degraded_sources_counted() {
        let collector = TelemetryCollector::new();
        let mut sources = SourceReport::all_ok();
        sources.transfers = FetchStatus::degraded("timeout");
        sources.tx_count = FetchStatus::degraded("rpc down");
        collector.record_assessment(&assessment(None, sources), 5);

        let stats = collector.get_stats();
        assert_eq!(stats.degraded_assessments, 1);
        assert_eq!(stats.degraded_by_source.get("transfers"), Some(&1));
        assert_eq!(stats.degraded_by_source.get("tx_count"), Some(&1));
    }

    #[test]
    fn test_stats_json() {
        let stats = TelemetryStats {
            total_analyzed: 1000,
            dangerous: 250,
            ..Default::default()
        };
        let json = stats.to_json();
        assert!(json.contains("1000"));
        assert!(json.contains("degraded_by_source"));
        assert_eq!(stats.dangerous_rate(), 25.0);
    }
}
