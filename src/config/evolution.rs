use super::traits::ConfigSection;
use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub elite_count: usize,
    /// Composition of each generation's non-elite slots. Must sum to 1.
    pub random_ratio: f64,
    pub mutation_ratio: f64,
    pub crossover_ratio: f64,
    pub base_mutation_rate: f64,
    pub base_crossover_rate: f64,
    pub tournament_size: usize,
    pub convergence_window: usize,
    /// Fractional improvement threshold (0.005 = 0.5%).
    pub convergence_threshold: f64,
    pub diversity_floor: f64,
    /// Extra random candidates injected when diversity drops below the
    /// floor.
    pub injection_count: usize,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 30,
            elite_count: 5,
            random_ratio: 0.20,
            mutation_ratio: 0.40,
            crossover_ratio: 0.40,
            base_mutation_rate: 0.15,
            base_crossover_rate: 0.60,
            tournament_size: 3,
            convergence_window: 5,
            convergence_threshold: 0.005,
            diversity_floor: 0.10,
            injection_count: 5,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvotradeError> {
        if self.population_size < 4 {
            return Err(EvotradeError::Configuration(
                "Population size must be at least 4".to_string(),
            ));
        }
        if self.elite_count >= self.population_size {
            return Err(EvotradeError::Configuration(
                "Elite count must be smaller than the population".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.base_mutation_rate) {
            return Err(EvotradeError::Configuration(
                "Base mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.base_crossover_rate) {
            return Err(EvotradeError::Configuration(
                "Base crossover rate must be between 0 and 1".to_string(),
            ));
        }
        let ratio_sum = self.random_ratio + self.mutation_ratio + self.crossover_ratio;
        if (ratio_sum - 1.0).abs() > 1e-6 {
            return Err(EvotradeError::Configuration(format!(
                "Composition ratios must sum to 1, got {}",
                ratio_sum
            )));
        }
        if self.tournament_size == 0 {
            return Err(EvotradeError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if self.convergence_window < 2 {
            return Err(EvotradeError::Configuration(
                "Convergence window must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}
