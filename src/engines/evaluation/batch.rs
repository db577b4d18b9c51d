use crate::engines::evaluation::evaluator::FitnessEvaluator;
use crate::error::{EvotradeError, Result};
use crate::types::{StrategyCandidate, StrategyPerformance};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_WORKERS: usize = 4;
/// Hard cap on worker threads regardless of configuration.
pub const MAX_WORKERS: usize = 8;

/// Fans a generation of candidates across a bounded worker pool.
///
/// The shared price frame is loaded once per batch via `preload`; individual
/// evaluations are stateless over read-only data, so parallel and sequential
/// runs produce identical per-candidate metrics. Results are keyed by
/// candidate id, never by completion order.
pub struct BatchEvaluator {
    evaluator: Arc<FitnessEvaluator>,
    parallel: bool,
    workers: usize,
}

impl BatchEvaluator {
    pub fn new(evaluator: Arc<FitnessEvaluator>, parallel: bool, max_workers: usize) -> Self {
        let workers = max_workers.clamp(1, MAX_WORKERS);
        Self {
            evaluator,
            parallel,
            workers,
        }
    }

    /// Load the batch's shared price data once, before any candidate is
    /// dispatched. A failure here is structural and propagates.
    pub fn preload(&self, symbols: &[String], period: &str, interval: &str) -> Result<DataFrame> {
        self.evaluator.resolve_data(symbols, period, interval)
    }

    pub fn evaluate_batch(
        &self,
        candidates: &[StrategyCandidate],
        data: &DataFrame,
    ) -> Result<HashMap<u64, StrategyPerformance>> {
        if self.parallel {
            self.evaluate_parallel(candidates, data)
        } else {
            Ok(self.evaluate_sequential(candidates, data))
        }
    }

    fn evaluate_sequential(
        &self,
        candidates: &[StrategyCandidate],
        data: &DataFrame,
    ) -> HashMap<u64, StrategyPerformance> {
        candidates
            .iter()
            .map(|c| (c.id, self.evaluator.evaluate(c, data)))
            .collect()
    }

    fn evaluate_parallel(
        &self,
        candidates: &[StrategyCandidate],
        data: &DataFrame,
    ) -> Result<HashMap<u64, StrategyPerformance>> {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| EvotradeError::Simulation(format!("worker pool: {}", e)))?;

        let evaluator = Arc::clone(&self.evaluator);
        let results = pool.install(|| {
            candidates
                .par_iter()
                .map(|c| (c.id, evaluator.evaluate(c, data)))
                .collect()
        });
        Ok(results)
    }
}
