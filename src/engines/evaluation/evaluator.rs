use crate::data::{cache_key, close_prices, DataCache, MarketDataProvider};
use crate::engines::evaluation::metrics::MetricsEngine;
use crate::engines::evaluation::simulator::StrategySimulator;
use crate::error::Result;
use crate::types::{StrategyCandidate, StrategyPerformance};
use polars::prelude::DataFrame;
use std::sync::Arc;

/// Backtest harness for one candidate: resolve price data through the TTL
/// cache, run the simulation collaborator, score the outcome.
///
/// `evaluate` is total — any per-candidate failure (too little history, a
/// faulting simulator, malformed data) is absorbed into the worst-case
/// sentinel performance so a single bad candidate can never abort a
/// generation. Only data-resolution failures, which sink the whole batch,
/// surface as errors from `resolve_data`.
pub struct FitnessEvaluator {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<DataCache>,
    simulator: Arc<dyn StrategySimulator>,
    metrics: MetricsEngine,
    min_bars: usize,
}

impl FitnessEvaluator {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<DataCache>,
        simulator: Arc<dyn StrategySimulator>,
        metrics: MetricsEngine,
        min_bars: usize,
    ) -> Self {
        Self {
            provider,
            cache,
            simulator,
            metrics,
            min_bars,
        }
    }

    /// Fetch-or-reuse the price frame for a market window. Concurrent
    /// misses for the same key collapse into one provider call.
    pub fn resolve_data(
        &self,
        symbols: &[String],
        period: &str,
        interval: &str,
    ) -> Result<DataFrame> {
        let key = cache_key(symbols, period, interval);
        self.cache
            .get_or_fetch(&key, || self.provider.fetch(symbols, period, interval))
    }

    pub fn evaluate(&self, candidate: &StrategyCandidate, data: &DataFrame) -> StrategyPerformance {
        if data.height() < self.min_bars {
            log::warn!(
                "Candidate {}: {} bars of history, minimum {}",
                candidate.id,
                data.height(),
                self.min_bars
            );
            return StrategyPerformance::failed(candidate.id);
        }

        let closes = match close_prices(data) {
            Ok(closes) => closes,
            Err(e) => {
                log::warn!("Candidate {}: unreadable close column: {}", candidate.id, e);
                return StrategyPerformance::failed(candidate.id);
            }
        };

        let outcome = match self.simulator.simulate(
            &candidate.strategy_name,
            &candidate.parameters,
            data,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Candidate {}: simulation failed: {}", candidate.id, e);
                return StrategyPerformance::failed(candidate.id);
            }
        };

        self.metrics.performance(candidate.id, &outcome, &closes)
    }
}
