use crate::engines::adaptive::elite::EliteRoster;
use crate::space::{ParamType, ParameterSpace};
use crate::types::{StrategyCandidate, StrategyPerformance};
use std::collections::HashMap;
use std::sync::Arc;

pub const MIN_MUTATION_RATE: f64 = 0.05;
pub const MAX_MUTATION_RATE: f64 = 0.50;

#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    pub base_mutation_rate: f64,
    pub base_crossover_rate: f64,
    pub elite_count: usize,
    pub convergence_window: usize,
    /// Fractional improvement below which the run counts as converged
    /// (0.005 = 0.5%).
    pub convergence_threshold: f64,
    pub diversity_floor: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            base_mutation_rate: 0.15,
            base_crossover_rate: 0.60,
            elite_count: 5,
            convergence_window: 5,
            convergence_threshold: 0.005,
            diversity_floor: 0.10,
        }
    }
}

/// Cross-generation state: elite roster, best-score history, and the
/// generation-aware rate schedule. Owned by the single-threaded evolution
/// loop; worker tasks never touch it.
pub struct AdaptiveController {
    config: AdaptiveConfig,
    space: Arc<ParameterSpace>,
    roster: EliteRoster,
    best_history: Vec<f64>,
}

impl AdaptiveController {
    pub fn new(config: AdaptiveConfig, space: Arc<ParameterSpace>) -> Self {
        let roster = EliteRoster::new(config.elite_count);
        Self {
            config,
            space,
            roster,
            best_history: Vec::new(),
        }
    }

    /// Mutation rate for the next generation: explore early, exploit late,
    /// and push exploration back up when few candidates are passing.
    pub fn adaptive_mutation_rate(&self, generation: usize, success_rate: f64) -> f64 {
        let generation_factor = 1.0 / (1.0 + 0.1 * generation as f64);
        let success_factor = 1.0 + (1.0 - success_rate.clamp(0.0, 1.0));
        (self.config.base_mutation_rate * generation_factor * success_factor)
            .clamp(MIN_MUTATION_RATE, MAX_MUTATION_RATE)
    }

    /// Recombine more aggressively once good building blocks exist.
    pub fn adaptive_crossover_rate(&self, success_rate: f64) -> f64 {
        (self.config.base_crossover_rate * (0.5 + success_rate.clamp(0.0, 1.0))).clamp(0.0, 1.0)
    }

    /// Merge a scored generation into the elite roster and record its best
    /// score for convergence tracking.
    pub fn observe_generation(
        &mut self,
        candidates: &[StrategyCandidate],
        performances: &HashMap<u64, StrategyPerformance>,
    ) {
        for candidate in candidates {
            if let Some(performance) = performances.get(&candidate.id) {
                self.roster.try_add(candidate.clone(), performance.clone());
            }
        }
        self.best_history.push(self.roster.best_outperformance());
    }

    /// Mean coefficient of variation across the population's numeric genes.
    /// Identical candidates score near 0; a spread population scores high.
    pub fn diversity_score(&self, candidates: &[StrategyCandidate]) -> f64 {
        if candidates.len() < 2 {
            return 0.0;
        }

        let mut cv_sum = 0.0;
        let mut counted = 0usize;

        for bound in self.space.all_bounds() {
            if bound.param_type == ParamType::Choice {
                continue;
            }
            let values: Vec<f64> = candidates
                .iter()
                .filter_map(|c| c.parameters.get(&bound.name))
                .filter_map(|v| v.as_f64())
                .collect();
            if values.len() < 2 {
                continue;
            }

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance = values
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / values.len() as f64;
            let std = variance.sqrt();

            cv_sum += if mean.abs() < 1e-12 {
                if std < 1e-12 {
                    0.0
                } else {
                    1.0
                }
            } else {
                std / mean.abs()
            };
            counted += 1;
        }

        if counted == 0 {
            0.0
        } else {
            cv_sum / counted as f64
        }
    }

    /// Signal for the loop to inject extra random candidates next
    /// generation.
    pub fn needs_injection(&self, diversity: f64) -> bool {
        diversity < self.config.diversity_floor
    }

    /// Whether the tracked best-score history has plateaued.
    pub fn is_converged(&self) -> bool {
        converged(
            &self.best_history,
            self.config.convergence_window,
            self.config.convergence_threshold,
        )
    }

    pub fn roster(&self) -> &EliteRoster {
        &self.roster
    }

    pub fn best_history(&self) -> &[f64] {
        &self.best_history
    }

    pub fn elite_count(&self) -> usize {
        self.config.elite_count
    }
}

/// True when the best score improved by less than `threshold` (fractional)
/// across the trailing `window` observations. Purely a stopping signal.
pub fn converged(recent_best_scores: &[f64], window: usize, threshold: f64) -> bool {
    if window < 2 || recent_best_scores.len() < window {
        return false;
    }
    let tail = &recent_best_scores[recent_best_scores.len() - window..];
    let first = tail[0];
    let last = tail[window - 1];
    let improvement = (last - first) / first.abs().max(f64::EPSILON);
    improvement < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convergence_plateau() {
        let scores = [10.0, 10.2, 10.1, 10.15];
        assert!(converged(&scores, 3, 0.005));
    }

    #[test]
    fn test_convergence_still_improving() {
        let scores = [10.0, 12.0, 15.0, 20.0];
        assert!(!converged(&scores, 3, 0.005));
    }

    #[test]
    fn test_convergence_needs_full_window() {
        assert!(!converged(&[10.0, 10.0], 3, 0.005));
    }
}
