//! Core Module - Scoring Logic
//!
//! Proximity search, drain simulation and rule-based aggregation, plus the
//! engine that feeds them from the signal collector. Everything here except
//! `engine` is synchronous and free of I/O.

pub mod engine;
pub mod proximity;
pub mod risk_score;
pub mod simulator;

pub use engine::RiskEngine;
pub use proximity::ProximityAnalyzer;
pub use risk_score::{RiskAggregator, RuleContext};
pub use simulator::FraudSimulator;
