use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single parameter value carried by a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value. `Text` choices have no numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) => Some(v.round() as i64),
            ParamValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{:.4}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

pub type ParamMap = HashMap<String, ParamValue>;

/// One concrete parameter assignment for a named strategy.
///
/// Immutable once created: mutation and crossover always produce new
/// candidates with fresh ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCandidate {
    pub id: u64,
    pub strategy_name: String,
    pub parameters: ParamMap,
}

/// Backtest metrics for one candidate in one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    pub candidate_id: u64,
    pub total_return: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub outperformance: f64,
    pub passed: bool,
}

impl StrategyPerformance {
    /// Worst-case sentinel used when a candidate's evaluation fails.
    /// A bad candidate must never abort its generation.
    pub fn failed(candidate_id: u64) -> Self {
        Self {
            candidate_id,
            total_return: -1.0,
            sharpe: 0.0,
            max_drawdown: 1.0,
            win_rate: 0.0,
            profit_factor: 0.0,
            outperformance: -1.0,
            passed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Signal,
    EndOfData,
}

/// Completed round-trip trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub entry_bar: usize,
    pub exit_bar: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub direction: Direction,
    pub size: f64,
    pub pnl: f64,
    pub fees: f64,
    pub exit_reason: ExitReason,
}

/// What the strategy-simulation collaborator hands back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
}

/// One generation's candidates and their scores. Superseded, never mutated,
/// by the next generation.
#[derive(Debug, Clone)]
pub struct Population {
    pub generation_index: usize,
    pub candidates: Vec<StrategyCandidate>,
    pub performances: HashMap<u64, StrategyPerformance>,
}

impl Population {
    /// Fraction of candidates whose performance passed.
    pub fn success_rate(&self) -> f64 {
        if self.candidates.is_empty() {
            return 0.0;
        }
        let passed = self
            .performances
            .values()
            .filter(|p| p.passed)
            .count();
        passed as f64 / self.candidates.len() as f64
    }

    /// Best outperformance seen this generation.
    pub fn best_outperformance(&self) -> f64 {
        self.performances
            .values()
            .map(|p| p.outperformance)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Plain per-generation summary record for logging/CLI consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation_index: usize,
    pub best_outperformance: f64,
    pub success_rate: f64,
    pub diversity_score: f64,
    pub converged: bool,
}
