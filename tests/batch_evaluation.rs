use evotrade::data::{DataCache, MarketDataProvider};
use evotrade::engines::evaluation::{
    BatchEvaluator, FitnessEvaluator, MetricsEngine, StrategySimulator,
};
use evotrade::error::{EvotradeError, Result};
use evotrade::types::{
    Direction, ExitReason, ParamMap, ParamValue, SimulationOutcome, StrategyCandidate, Trade,
};
use polars::df;
use polars::prelude::DataFrame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory provider that counts upstream fetches.
struct CountingProvider {
    frame: DataFrame,
    fetches: AtomicUsize,
}

impl CountingProvider {
    fn new(frame: DataFrame) -> Self {
        Self {
            frame,
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl MarketDataProvider for CountingProvider {
    fn fetch(&self, _symbols: &[String], _period: &str, _interval: &str) -> Result<DataFrame> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }
}

/// Deterministic simulator: final equity scales with the `level` parameter;
/// candidates carrying `fail = 1` fault.
struct LevelSimulator;

impl StrategySimulator for LevelSimulator {
    fn simulate(
        &self,
        _strategy_name: &str,
        parameters: &ParamMap,
        data: &DataFrame,
    ) -> Result<SimulationOutcome> {
        if parameters.get("fail").and_then(|v| v.as_i64()) == Some(1) {
            return Err(EvotradeError::Simulation("injected fault".to_string()));
        }

        let level = parameters
            .get("level")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let bars = data.height();
        let equity_curve: Vec<f64> = (0..=bars)
            .map(|i| 100.0 * (1.0 + level * 0.001 * i as f64))
            .collect();

        let trades = vec![
            winning_trade(level.abs() + 1.0),
            losing_trade(level.abs() / 2.0 + 0.5),
        ];
        Ok(SimulationOutcome {
            equity_curve,
            trades,
        })
    }
}

fn winning_trade(pnl: f64) -> Trade {
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

fn losing_trade(loss: f64) -> Trade {
    Trade {
        entry_bar: 2,
        exit_bar: 3,
        entry_price: 100.0,
        exit_price: 100.0 - loss,
        direction: Direction::Long,
        size: 1.0,
        pnl: -loss,
        fees: 0.0,
        exit_reason: ExitReason::Signal,
    }
}

fn flat_frame(bars: usize) -> DataFrame {
    let closes = vec![100.0; bars];
    df! { "close" => &closes }.unwrap()
}

fn level_candidate(id: u64, level: f64) -> StrategyCandidate {
    let mut parameters = ParamMap::new();
    parameters.insert("level".to_string(), ParamValue::Float(level));
    StrategyCandidate {
        id,
        strategy_name: "level".to_string(),
        parameters,
    }
}

fn failing_candidate(id: u64) -> StrategyCandidate {
    let mut parameters = ParamMap::new();
    parameters.insert("level".to_string(), ParamValue::Float(1.0));
    parameters.insert("fail".to_string(), ParamValue::Int(1));
    StrategyCandidate {
        id,
        strategy_name: "level".to_string(),
        parameters,
    }
}

fn harness(
    provider: Arc<CountingProvider>,
    ttl: Duration,
    parallel: bool,
) -> BatchEvaluator {
    let cache = Arc::new(DataCache::new(ttl));
    let evaluator = Arc::new(FitnessEvaluator::new(
        provider,
        cache,
        Arc::new(LevelSimulator),
        MetricsEngine::new(252.0, 0.0),
        10,
    ));
    BatchEvaluator::new(evaluator, parallel, 4)
}

fn symbols() -> Vec<String> {
    vec!["BTC".to_string()]
}

#[test]
fn test_parallel_and_sequential_agree() {
    let candidates: Vec<_> = (0..20)
        .map(|i| level_candidate(i, i as f64 - 10.0))
        .collect();

    let provider = Arc::new(CountingProvider::new(flat_frame(50)));
    let sequential = harness(Arc::clone(&provider), Duration::from_secs(3600), false);
    let parallel = harness(Arc::clone(&provider), Duration::from_secs(3600), true);

    let data = sequential.preload(&symbols(), "1y", "1d").unwrap();
    let seq_results = sequential.evaluate_batch(&candidates, &data).unwrap();
    let par_results = parallel.evaluate_batch(&candidates, &data).unwrap();

    assert_eq!(seq_results.len(), candidates.len());
    assert_eq!(seq_results.len(), par_results.len());
    for candidate in &candidates {
        assert_eq!(
            seq_results.get(&candidate.id),
            par_results.get(&candidate.id),
            "metrics diverged for candidate {}",
            candidate.id
        );
    }
}

#[test]
fn test_single_failure_does_not_poison_the_batch() {
    let mut candidates: Vec<_> = (0..8).map(|i| level_candidate(i, 5.0)).collect();
    candidates.push(failing_candidate(99));

    let provider = Arc::new(CountingProvider::new(flat_frame(50)));
    let batch = harness(provider, Duration::from_secs(3600), true);

    let data = batch.preload(&symbols(), "1y", "1d").unwrap();
    let results = batch.evaluate_batch(&candidates, &data).unwrap();

    assert_eq!(results.len(), 9);
    let failed = &results[&99];
    assert!(!failed.passed);
    assert_eq!(failed.total_return, -1.0);
    for id in 0..8u64 {
        assert!(results[&id].passed, "healthy candidate {} was dragged down", id);
    }
}

#[test]
fn test_preload_fetches_once_within_ttl() {
    let provider = Arc::new(CountingProvider::new(flat_frame(50)));
    let batch = harness(Arc::clone(&provider), Duration::from_secs(3600), false);

    for _ in 0..5 {
        batch.preload(&symbols(), "1y", "1d").unwrap();
    }
    assert_eq!(provider.fetch_count(), 1);

    // A different window is a different key.
    batch.preload(&symbols(), "6mo", "1d").unwrap();
    assert_eq!(provider.fetch_count(), 2);
}

#[test]
fn test_expired_ttl_refetches() {
    let provider = Arc::new(CountingProvider::new(flat_frame(50)));
    let batch = harness(Arc::clone(&provider), Duration::ZERO, false);

    batch.preload(&symbols(), "1y", "1d").unwrap();
    batch.preload(&symbols(), "1y", "1d").unwrap();
    assert_eq!(provider.fetch_count(), 2);
}

#[test]
fn test_insufficient_history_yields_sentinel() {
    // Harness requires 10 bars; give it 5.
    let provider = Arc::new(CountingProvider::new(flat_frame(5)));
    let batch = harness(provider, Duration::from_secs(3600), false);

    let data = batch.preload(&symbols(), "1y", "1d").unwrap();
    let results = batch
        .evaluate_batch(&[level_candidate(0, 5.0)], &data)
        .unwrap();

    let perf = &results[&0];
    assert!(!perf.passed);
    assert_eq!(perf.total_return, -1.0);
    assert_eq!(perf.max_drawdown, 1.0);
}

#[test]
fn test_zero_trades_produce_zero_ratios() {
    struct TradelessSimulator;
    impl StrategySimulator for TradelessSimulator {
        fn simulate(
            &self,
            _strategy_name: &str,
            _parameters: &ParamMap,
            data: &DataFrame,
        ) -> Result<SimulationOutcome> {
            Ok(SimulationOutcome {
                equity_curve: vec![100.0; data.height() + 1],
                trades: Vec::new(),
            })
        }
    }

    let provider = Arc::new(CountingProvider::new(flat_frame(50)));
    let cache = Arc::new(DataCache::new(Duration::from_secs(3600)));
    let evaluator = Arc::new(FitnessEvaluator::new(
        provider,
        cache,
        Arc::new(TradelessSimulator),
        MetricsEngine::new(252.0, 0.0),
        10,
    ));
    let batch = BatchEvaluator::new(evaluator, false, 4);

    let data = batch.preload(&symbols(), "1y", "1d").unwrap();
    let results = batch
        .evaluate_batch(&[level_candidate(3, 0.0)], &data)
        .unwrap();

    let perf = &results[&3];
    assert_eq!(perf.win_rate, 0.0);
    assert_eq!(perf.profit_factor, 0.0);
    assert!(!perf.passed);
}
