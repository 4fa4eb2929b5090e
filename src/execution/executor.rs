use crate::execution::PositionManager;
use crate::models::{AnalysisResult, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Open { side: Side, price: f64 },
    Close { price: f64 },
    Skip,
    /// Capital exhausted, no further opens
    Halt,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// Decides what the trade tick does
///
/// Close always wins over analysis: a position never survives past the
/// next trade tick.
#[derive(Debug, Clone)]
pub struct Executor {
    halt_capital: f64,
}

impl Executor {
    /// `halt_capital`: trading stops once capital is at or below this
    pub fn new(halt_capital: f64) -> Self {
        Self { halt_capital }
    }

    /// Process the latest analysis and decide what to do
    pub fn decide(
        &self,
        pm: &PositionManager,
        analysis: &AnalysisResult,
        current_price: Option<f64>,
    ) -> ExecutionDecision {
        if pm.capital() <= self.halt_capital {
            return ExecutionDecision {
                action: ExecutionAction::Halt,
                reason: format!("Capital depleted ({:.0}), trading stopped", pm.capital()),
            };
        }

        let Some(price) = current_price else {
            return ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: "No price yet".to_string(),
            };
        };

        if let Some(position) = pm.current_position() {
            return ExecutionDecision {
                action: ExecutionAction::Close { price },
                reason: format!("Closing {} opened @ {:.0}", position.side, position.entry_price),
            };
        }

        match analysis.signal.side() {
            Some(side) => ExecutionDecision {
                action: ExecutionAction::Open { side, price },
                reason: format!(
                    "{} ({:.0}% confidence)",
                    analysis.reason, analysis.confidence
                ),
            },
            None => ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: analysis.reason.clone(),
            },
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(0.0)
    }
}
