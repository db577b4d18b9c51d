use crate::data::close_prices;
use crate::engines::evaluation::portfolio::Portfolio;
use crate::error::{EvotradeError, Result};
use crate::types::{ParamMap, SimulationOutcome};
use polars::prelude::DataFrame;

/// External strategy-simulation collaborator: run a named strategy with a
/// parameter set over a price series and hand back an equity curve plus the
/// trades taken. Implementations are expected to be deterministic for a
/// given input (seed any internal randomness).
pub trait StrategySimulator: Send + Sync {
    fn simulate(
        &self,
        strategy_name: &str,
        parameters: &ParamMap,
        data: &DataFrame,
    ) -> Result<SimulationOutcome>;
}

/// Built-in reference simulator: a moving-average cross over the close
/// column. Exists so the engine can be exercised end to end without an
/// external collaborator; strategy semantics live behind the trait, not in
/// the engine.
///
/// Parameters consumed: `fast_period`, `slow_period` (ints).
pub struct MaCrossSimulator {
    initial_capital: f64,
    position_fraction: f64,
    commission: f64,
}

impl MaCrossSimulator {
    pub fn new(initial_capital: f64, position_fraction: f64, commission: f64) -> Self {
        Self {
            initial_capital,
            position_fraction,
            commission,
        }
    }
}

impl StrategySimulator for MaCrossSimulator {
    fn simulate(
        &self,
        _strategy_name: &str,
        parameters: &ParamMap,
        data: &DataFrame,
    ) -> Result<SimulationOutcome> {
        let closes = close_prices(data)?;

        let fast = param_period(parameters, "fast_period")?;
        let slow = param_period(parameters, "slow_period")?;
        if fast == 0 || slow == 0 {
            return Err(EvotradeError::Simulation(
                "moving-average periods must be positive".to_string(),
            ));
        }

        let fast_ma = rolling_mean(&closes, fast);
        let slow_ma = rolling_mean(&closes, slow);

        let mut portfolio = Portfolio::new(
            self.initial_capital,
            self.position_fraction,
            self.commission,
        );

        let warmup = fast.max(slow);
        for bar in 0..closes.len() {
            let signal = if bar < warmup {
                0.0
            } else if fast_ma[bar] > slow_ma[bar] {
                1.0
            } else if fast_ma[bar] < slow_ma[bar] {
                -1.0
            } else {
                0.0
            };
            portfolio.process_bar(bar, signal, closes[bar]);
        }

        let last_bar = closes.len().saturating_sub(1);
        let (equity_curve, trades) = portfolio.finish(last_bar);
        Ok(SimulationOutcome {
            equity_curve,
            trades,
        })
    }
}

fn param_period(parameters: &ParamMap, name: &str) -> Result<usize> {
    let value = parameters
        .get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| EvotradeError::Simulation(format!("missing parameter '{}'", name)))?;
    Ok(value.max(0) as usize)
}

fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = sum / window as f64;
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = sum / window as f64;
    }
    out
}
