//! Fraud Simulator
//!
//! Rule-based forecast of how likely the counterparty is to drain funds and
//! for how many blocks that risk stays live. Deterministic lookup table:
//! no randomness, no clock, no chain state.
//!
//! | tx_type         | base          | escalates when                       | escalated   |
//! |-----------------|---------------|--------------------------------------|-------------|
//! | approve         | 0.70 / 1000   | scam-linked OR contract risk > 50    | 0.85 / 10   |
//! | swap            | 0.05 / 0      | contract risk > 60                   | 0.90 / 1    |
//! | transfer / send | 0.01 / 0      | scam-linked                          | 0.95 / 1    |

use crate::models::types::{SimulationResult, TxType};

/// Contract risk above which an approval is treated as immediately exploitable
const APPROVE_ESCALATION_RISK: u32 = 50;

/// Contract risk above which a swap target is treated as a honeypot
const SWAP_ESCALATION_RISK: u32 = 60;

/// Stateless drain forecaster
#[derive(Debug, Clone, Copy, Default)]
pub struct FraudSimulator;

impl FraudSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Forecast drain probability and attack window.
    ///
    /// `contract_risk_score` is capped at 100 before use.
    pub fn simulate(
        &self,
        tx_type: TxType,
        contract_risk_score: u32,
        is_scam_linked: bool,
    ) -> SimulationResult {
        let risk = contract_risk_score.min(100);

        let (drain_probability, attack_window_blocks) = match tx_type {
            // Unlimited allowance: risky even with a clean counterparty
            TxType::Approve => {
                if is_scam_linked || risk > APPROVE_ESCALATION_RISK {
                    (0.85, 10)
                } else {
                    (0.70, 1000)
                }
            }
            TxType::Swap => {
                if risk > SWAP_ESCALATION_RISK {
                    (0.90, 1)
                } else {
                    (0.05, 0)
                }
            }
            TxType::Transfer | TxType::Send => {
                if is_scam_linked {
                    (0.95, 1)
                } else {
                    (0.01, 0)
                }
            }
        };

        SimulationResult {
            drain_probability,
            attack_window_blocks,
        }
    }
}
