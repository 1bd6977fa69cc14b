//! Utils Module - Shared Helpers
//!
//! Constants, the assessment cache and telemetry counters.

pub mod cache;
pub mod constants;
pub mod telemetry;

pub use cache::{AssessmentCache, CacheStats};
pub use constants::*;
pub use telemetry::{TelemetryCollector, TelemetryStats};
