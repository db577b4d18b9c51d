use crate::types::{SimulationOutcome, StrategyPerformance, Trade};

/// Computes performance metrics from an equity curve and trade list in one
/// pass over contiguous slices. Every metric is total: degenerate inputs
/// (no trades, flat returns, short curves) map to defined fallbacks, never
/// to a panic or a division by zero.
pub struct MetricsEngine {
    periods_per_year: f64,
    pass_threshold: f64,
}

impl MetricsEngine {
    pub fn new(periods_per_year: f64, pass_threshold: f64) -> Self {
        Self {
            periods_per_year,
            pass_threshold,
        }
    }

    /// Score one candidate's simulation against buy-and-hold on the same
    /// closes.
    pub fn performance(
        &self,
        candidate_id: u64,
        outcome: &SimulationOutcome,
        closes: &[f64],
    ) -> StrategyPerformance {
        let equity = &outcome.equity_curve;
        if equity.len() < 2 || equity[0] <= 0.0 {
            return StrategyPerformance::failed(candidate_id);
        }

        let total_return = equity[equity.len() - 1] / equity[0] - 1.0;
        let returns = bar_returns(equity);
        let sharpe = sharpe_ratio(&returns, self.periods_per_year);
        let max_drawdown = max_drawdown(equity);
        let win_rate = win_rate(&outcome.trades);
        let profit_factor = profit_factor(&outcome.trades);

        let benchmark = buy_and_hold_return(closes);
        let outperformance = total_return - benchmark;

        StrategyPerformance {
            candidate_id,
            total_return,
            sharpe,
            max_drawdown,
            win_rate,
            profit_factor,
            outperformance,
            passed: outperformance > self.pass_threshold,
        }
    }
}

/// Per-bar fractional returns over the whole curve.
pub fn bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Annualized Sharpe, 0 when variance vanishes or fewer than two return
/// observations exist.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let std = variance.sqrt();
    if std == 0.0 {
        return 0.0;
    }
    mean / std * periods_per_year.sqrt()
}

/// Largest peak-to-trough decline as a fraction of the running peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0;
    for &value in equity {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of trades with positive pnl; 0 with no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.pnl > 0.0).count();
    winners as f64 / trades.len() as f64
}

/// Gross wins over gross losses; 0 when there is no nonzero loss to divide
/// by.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();
    if gross_loss == 0.0 {
        return 0.0;
    }
    gross_profit / gross_loss
}

/// Buy-and-hold return of the same series over the same window.
pub fn buy_and_hold_return(closes: &[f64]) -> f64 {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, ExitReason};

    fn trade(pnl: f64) -> Trade {
        Trade {
            entry_bar: 0,
            exit_bar: 1,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            direction: Direction::Long,
            size: 1.0,
            pnl,
            fees: 0.0,
            exit_reason: ExitReason::Signal,
        }
    }

    #[test]
    fn test_max_drawdown_running_peak() {
        let equity = [100.0, 120.0, 90.0, 110.0, 80.0];
        // Worst decline is 120 -> 80.
        assert!((max_drawdown(&equity) - (120.0 - 80.0) / 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_zero_on_flat_curve() {
        let returns = bar_returns(&[100.0, 100.0, 100.0, 100.0]);
        assert_eq!(sharpe_ratio(&returns, 252.0), 0.0);
    }

    #[test]
    fn test_sharpe_zero_on_short_series() {
        assert_eq!(sharpe_ratio(&[0.01], 252.0), 0.0);
    }

    #[test]
    fn test_zero_trades_yield_zero_ratios() {
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(profit_factor(&[]), 0.0);
        // All winners: no loss to divide by.
        assert_eq!(profit_factor(&[trade(5.0), trade(3.0)]), 0.0);
    }

    #[test]
    fn test_profit_factor() {
        let trades = [trade(6.0), trade(-2.0), trade(-1.0)];
        assert!((profit_factor(&trades) - 2.0).abs() < 1e-12);
        assert!((win_rate(&trades) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_outperformance_against_buy_and_hold() {
        let engine = MetricsEngine::new(252.0, 0.0);
        let outcome = SimulationOutcome {
            equity_curve: vec![100.0, 105.0, 121.0],
            trades: vec![trade(21.0)],
        };
        // Benchmark gains 10%, strategy 21%.
        let perf = engine.performance(7, &outcome, &[100.0, 104.0, 110.0]);
        assert_eq!(perf.candidate_id, 7);
        assert!((perf.total_return - 0.21).abs() < 1e-12);
        assert!((perf.outperformance - 0.11).abs() < 1e-12);
        assert!(perf.passed);
    }

    #[test]
    fn test_short_equity_curve_is_sentinel() {
        let engine = MetricsEngine::new(252.0, 0.0);
        let outcome = SimulationOutcome {
            equity_curve: vec![100.0],
            trades: vec![],
        };
        let perf = engine.performance(1, &outcome, &[100.0]);
        assert!(!perf.passed);
        assert_eq!(perf.total_return, -1.0);
    }
}
