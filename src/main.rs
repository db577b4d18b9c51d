use anyhow::Context;
use evotrade::config::ConfigManager;
use evotrade::data::{CsvProvider, DataCache};
use evotrade::engines::adaptive::{AdaptiveConfig, AdaptiveController};
use evotrade::engines::evaluation::{
    BatchEvaluator, FitnessEvaluator, MaCrossSimulator, MetricsEngine,
};
use evotrade::engines::evolution::{ConsoleProgressCallback, EvolutionLoop};
use evotrade::space::{CandidateFactory, ParameterBound, ParameterSpace};
use evotrade::storage::JsonFileStore;
use std::sync::Arc;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let manager = ConfigManager::new();
    if std::path::Path::new("config.toml").exists() {
        manager
            .load_from_file("config.toml")
            .context("loading config.toml")?;
    }
    let config = manager.get();

    let data_root = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());

    let space = Arc::new(ParameterSpace::new(vec![
        ParameterBound::int("fast_period", 3, 50, 10),
        ParameterBound::int("slow_period", 10, 200, 30),
    ])?);
    let factory = CandidateFactory::new(Arc::clone(&space), "ma_cross");

    let provider = Arc::new(CsvProvider::new(&data_root));
    let cache = Arc::new(DataCache::new(Duration::from_secs(
        config.backtesting.cache_ttl_secs,
    )));
    let simulator = Arc::new(MaCrossSimulator::new(
        config.backtesting.initial_capital,
        config.backtesting.position_fraction,
        config.backtesting.commission,
    ));
    let metrics = MetricsEngine::new(
        config.backtesting.periods_per_year,
        config.backtesting.pass_threshold,
    );
    let evaluator = Arc::new(FitnessEvaluator::new(
        provider,
        cache,
        simulator,
        metrics,
        config.backtesting.min_bars,
    ));
    let batch = BatchEvaluator::new(
        evaluator,
        config.backtesting.parallel,
        config.backtesting.max_workers,
    );

    let controller = AdaptiveController::new(
        AdaptiveConfig {
            base_mutation_rate: config.evolution.base_mutation_rate,
            base_crossover_rate: config.evolution.base_crossover_rate,
            elite_count: config.evolution.elite_count,
            convergence_window: config.evolution.convergence_window,
            convergence_threshold: config.evolution.convergence_threshold,
            diversity_floor: config.evolution.diversity_floor,
        },
        space,
    );

    let store = JsonFileStore::new("results")?;
    let mut evolution = EvolutionLoop::new(
        config.evolution.clone(),
        factory,
        batch,
        controller,
    )
    .with_store(Box::new(store));

    let outcome = evolution.run(
        &config.backtesting.symbols,
        &config.backtesting.period,
        &config.backtesting.interval,
        ConsoleProgressCallback,
    )?;

    println!(
        "\nRun ended ({:?}) after {} generations",
        outcome.stop_reason, outcome.generations_completed
    );
    for (rank, entry) in outcome.elites.iter().enumerate() {
        println!(
            "  #{} outperformance {:.4} sharpe {:.2} params {:?}",
            rank + 1,
            entry.performance.outperformance,
            entry.performance.sharpe,
            entry.candidate.parameters
        );
    }

    Ok(())
}
