use super::traits::ConfigSection;
use crate::engines::evaluation::batch::{DEFAULT_WORKERS, MAX_WORKERS};
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub period: String,
    pub interval: String,
    pub initial_capital: f64,
    pub position_fraction: f64,
    pub commission: f64,
    /// Minimum bars of history required for a meaningful backtest.
    pub min_bars: usize,
    pub periods_per_year: f64,
    /// A candidate passes when it beats buy-and-hold by more than this.
    pub pass_threshold: f64,
    pub parallel: bool,
    pub max_workers: usize,
    pub cache_ttl_secs: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC".to_string()],
            period: "1y".to_string(),
            interval: "1d".to_string(),
            initial_capital: 10_000.0,
            position_fraction: 0.1,
            commission: 0.001,
            min_bars: 100,
            periods_per_year: 252.0,
            pass_threshold: 0.0,
            parallel: true,
            max_workers: DEFAULT_WORKERS,
            cache_ttl_secs: 3600,
        }
    }
}

impl ConfigSection for BacktestConfig {
    fn section_name() -> &'static str {
        "backtesting"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        if self.symbols.is_empty() {
            return Err(EvotradeError::Configuration(
                "At least one symbol is required".to_string(),
            ));
        }
        if self.initial_capital <= 0.0 {
            return Err(EvotradeError::Configuration(
                "Initial capital must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.position_fraction) {
            return Err(EvotradeError::Configuration(
                "Position fraction must be between 0 and 1".to_string(),
            ));
        }
        if self.max_workers == 0 || self.max_workers > MAX_WORKERS {
            return Err(EvotradeError::Configuration(format!(
                "Worker count must be between 1 and {}",
                MAX_WORKERS
            )));
        }
        if self.min_bars < 2 {
            return Err(EvotradeError::Configuration(
                "Minimum bar count must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}
