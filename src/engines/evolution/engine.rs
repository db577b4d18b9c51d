use crate::config::EvolutionConfig;
use crate::engines::adaptive::{AdaptiveController, EliteEntry};
use crate::engines::evaluation::BatchEvaluator;
use crate::engines::evolution::progress::ProgressCallback;
use crate::error::Result;
use crate::space::CandidateFactory;
use crate::storage::CandidateStore;
use crate::types::{GenerationSummary, ParamMap, Population, StrategyCandidate};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    MaxGenerations,
    Stopped,
    Failed(String),
}

/// Final state of a run. Carries everything scored so far even when the run
/// halts on a structural failure: the generation reached and the elite
/// roster are never lost.
pub struct EvolutionOutcome {
    pub stop_reason: StopReason,
    pub generations_completed: usize,
    pub elites: Vec<EliteEntry>,
    pub summaries: Vec<GenerationSummary>,
}

/// Cooperative stop switch, checked between generations. An in-flight batch
/// always runs to completion.
#[derive(Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Orchestrates generations: assemble a population, batch-evaluate it, feed
/// the controller, and loop until convergence, the generation cap, a stop
/// request, or a structural data failure.
pub struct EvolutionLoop {
    config: EvolutionConfig,
    factory: CandidateFactory,
    batch: BatchEvaluator,
    controller: AdaptiveController,
    store: Option<Box<dyn CandidateStore>>,
    stop: StopHandle,
    rng: StdRng,
}

impl EvolutionLoop {
    pub fn new(
        config: EvolutionConfig,
        factory: CandidateFactory,
        batch: BatchEvaluator,
        controller: AdaptiveController,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            factory,
            batch,
            controller,
            store: None,
            stop: StopHandle::new(),
            rng,
        }
    }

    pub fn with_store(mut self, store: Box<dyn CandidateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn run<C: ProgressCallback>(
        &mut self,
        symbols: &[String],
        period: &str,
        interval: &str,
        mut callback: C,
    ) -> Result<EvolutionOutcome> {
        let mut summaries: Vec<GenerationSummary> = Vec::new();
        let mut candidates = self.initial_population();

        for generation in 0..self.config.max_generations {
            if self.stop.is_stopped() {
                log::info!("Stop requested before generation {}", generation);
                return Ok(self.outcome(StopReason::Stopped, generation, summaries));
            }

            callback.on_generation_start(generation);

            // One shared load per batch; a cache hit after generation 0.
            let data = match self.batch.preload(symbols, period, interval) {
                Ok(data) => data,
                Err(e) => {
                    log::error!("Market data unavailable at generation {}: {}", generation, e);
                    return Ok(self.outcome(
                        StopReason::Failed(e.to_string()),
                        generation,
                        summaries,
                    ));
                }
            };

            let performances = self.batch.evaluate_batch(&candidates, &data)?;
            let population = Population {
                generation_index: generation,
                candidates,
                performances,
            };

            let success_rate = population.success_rate();
            let diversity = self.controller.diversity_score(&population.candidates);
            self.controller
                .observe_generation(&population.candidates, &population.performances);
            let converged = self.controller.is_converged();

            let summary = GenerationSummary {
                generation_index: generation,
                best_outperformance: self.controller.roster().best_outperformance(),
                success_rate,
                diversity_score: diversity,
                converged,
            };
            callback.on_generation_complete(&summary, self.controller.roster().len());
            summaries.push(summary);

            if let Some(store) = self.store.as_mut() {
                if let Err(e) = store.save_generation(
                    self.factory.strategy_name(),
                    generation,
                    self.controller.roster().entries(),
                ) {
                    log::warn!("Failed to persist generation {}: {}", generation, e);
                }
            }

            if converged {
                log::info!("Converged after generation {}", generation);
                return Ok(self.outcome(StopReason::Converged, generation + 1, summaries));
            }

            // Rates for the generation we are about to assemble.
            let mutation_rate = self
                .controller
                .adaptive_mutation_rate(generation + 1, success_rate);
            let crossover_rate = self.controller.adaptive_crossover_rate(success_rate);
            log::debug!(
                "Generation {}: mutation rate {:.3}, crossover rate {:.3}, diversity {:.3}",
                generation + 1,
                mutation_rate,
                crossover_rate,
                diversity
            );

            let inject = self.controller.needs_injection(diversity);
            candidates =
                self.next_population(&population, mutation_rate, crossover_rate, inject);
        }

        Ok(self.outcome(
            StopReason::MaxGenerations,
            self.config.max_generations,
            summaries,
        ))
    }

    fn outcome(
        &self,
        stop_reason: StopReason,
        generations_completed: usize,
        summaries: Vec<GenerationSummary>,
    ) -> EvolutionOutcome {
        EvolutionOutcome {
            stop_reason,
            generations_completed,
            elites: self.controller.roster().entries().to_vec(),
            summaries,
        }
    }

    fn initial_population(&mut self) -> Vec<StrategyCandidate> {
        (0..self.config.population_size)
            .map(|_| {
                let params = self.factory.generate_random(&mut self.rng);
                self.factory.candidate(params)
            })
            .collect()
    }

    /// Next generation: elites verbatim, then random / mutated / crossover
    /// children per the configured split, with extra randoms when the
    /// diversity signal fired.
    fn next_population(
        &mut self,
        population: &Population,
        mutation_rate: f64,
        crossover_rate: f64,
        inject_randoms: bool,
    ) -> Vec<StrategyCandidate> {
        let target = self.config.population_size;
        let mut next: Vec<StrategyCandidate> = Vec::with_capacity(target);

        for entry in self
            .controller
            .roster()
            .entries()
            .iter()
            .take(self.config.elite_count.min(target))
        {
            next.push(entry.candidate.clone());
        }

        let injected = if inject_randoms {
            self.config.injection_count
        } else {
            0
        };
        let open_slots = target.saturating_sub(next.len());
        let random_count = ((open_slots as f64 * self.config.random_ratio).round() as usize
            + injected)
            .min(open_slots);
        let mutated_count = ((open_slots as f64 * self.config.mutation_ratio).round() as usize)
            .min(open_slots.saturating_sub(random_count));

        let scored = self.scored_parents(population);

        for _ in 0..random_count {
            let params = self.factory.generate_random(&mut self.rng);
            next.push(self.factory.candidate(params));
        }

        for _ in 0..mutated_count {
            let parent = tournament_selection(&scored, self.config.tournament_size, &mut self.rng);
            let params = self.factory.mutate(parent, mutation_rate, &mut self.rng);
            next.push(self.factory.candidate(params));
        }

        // Remaining slots are crossover territory; the adaptive rate decides
        // per child whether to recombine or fall back to a mutated parent.
        while next.len() < target {
            let params = if self.rng.gen::<f64>() < crossover_rate {
                let parent_a =
                    tournament_selection(&scored, self.config.tournament_size, &mut self.rng);
                let parent_b =
                    tournament_selection(&scored, self.config.tournament_size, &mut self.rng);
                self.factory.crossover(parent_a, parent_b, &mut self.rng)
            } else {
                let parent =
                    tournament_selection(&scored, self.config.tournament_size, &mut self.rng);
                self.factory.mutate(parent, mutation_rate, &mut self.rng)
            };
            next.push(self.factory.candidate(params));
        }

        next.truncate(target);
        next
    }

    fn scored_parents<'a>(&self, population: &'a Population) -> Vec<(&'a ParamMap, f64)> {
        population
            .candidates
            .iter()
            .map(|c| {
                let score = population
                    .performances
                    .get(&c.id)
                    .map(|p| p.outperformance)
                    .unwrap_or(f64::NEG_INFINITY);
                (&c.parameters, score)
            })
            .collect()
    }
}

/// Tournament selection: best outperformance among K random entrants.
pub fn tournament_selection<'a, R: Rng>(
    scored: &[(&'a ParamMap, f64)],
    tournament_size: usize,
    rng: &mut R,
) -> &'a ParamMap {
    let mut best_idx = rng.gen_range(0..scored.len());
    let mut best_score = scored[best_idx].1;

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..scored.len());
        if scored[idx].1 > best_score {
            best_idx = idx;
            best_score = scored[idx].1;
        }
    }

    scored[best_idx].0
}
