use crate::space::bounds::{ParamType, ParameterBound, ParameterSpace};
use crate::types::{ParamMap, ParamValue, StrategyCandidate};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Fraction of an int bound's range used for the occasional long jump.
const INT_JUMP_SPAN: f64 = 0.10;
/// Sub-probability of taking that jump instead of a +/-1 step.
const INT_JUMP_PROB: f64 = 0.10;
/// Magnitude of float mutation noise relative to the bound's range.
const FLOAT_NOISE_SPAN: f64 = 0.05;

/// Produces candidate parameter sets: uniform random draws, type-aware
/// mutation, and per-gene uniform crossover. All three operations return
/// exactly the space's key set, with every value inside its bound.
pub struct CandidateFactory {
    space: Arc<ParameterSpace>,
    strategy_name: String,
    next_id: AtomicU64,
}

impl CandidateFactory {
    pub fn new(space: Arc<ParameterSpace>, strategy_name: &str) -> Self {
        Self {
            space,
            strategy_name: strategy_name.to_string(),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    /// Wrap a parameter map into a candidate with a fresh id.
    pub fn candidate(&self, parameters: ParamMap) -> StrategyCandidate {
        StrategyCandidate {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            strategy_name: self.strategy_name.clone(),
            parameters,
        }
    }

    /// Uniform draw within every bound, independent across parameters.
    pub fn generate_random<R: Rng>(&self, rng: &mut R) -> ParamMap {
        self.space
            .all_bounds()
            .iter()
            .map(|bound| (bound.name.clone(), random_value(bound, rng)))
            .collect()
    }

    /// Mutate each gene independently with probability `mutation_rate`.
    ///
    /// Choice genes resample uniformly. Int genes step +/-1, with a small
    /// sub-probability of jumping +/-10% of the range to escape local optima.
    /// Float genes take uniform noise sized to 5% of the range. Every mutated
    /// value passes through `validate`, so no out-of-bounds gene can escape.
    pub fn mutate<R: Rng>(&self, parameters: &ParamMap, mutation_rate: f64, rng: &mut R) -> ParamMap {
        self.space
            .all_bounds()
            .iter()
            .map(|bound| {
                let current = parameters
                    .get(&bound.name)
                    .cloned()
                    .unwrap_or_else(|| bound.default.clone());
                let value = if rng.gen::<f64>() < mutation_rate {
                    bound.validate(&mutated_value(bound, &current, rng))
                } else {
                    bound.validate(&current)
                };
                (bound.name.clone(), value)
            })
            .collect()
    }

    /// Per-gene uniform crossover: each gene comes from either parent with
    /// equal probability. Both parents share this space, so the child's key
    /// set equals theirs.
    pub fn crossover<R: Rng>(&self, parent_a: &ParamMap, parent_b: &ParamMap, rng: &mut R) -> ParamMap {
        self.space
            .all_bounds()
            .iter()
            .map(|bound| {
                let source = if rng.gen::<bool>() { parent_a } else { parent_b };
                let value = source
                    .get(&bound.name)
                    .cloned()
                    .unwrap_or_else(|| bound.default.clone());
                (bound.name.clone(), bound.validate(&value))
            })
            .collect()
    }

    /// The full parameter set at defaults.
    pub fn defaults(&self) -> ParamMap {
        self.space
            .all_bounds()
            .iter()
            .map(|bound| (bound.name.clone(), bound.default.clone()))
            .collect()
    }
}

fn random_value<R: Rng>(bound: &ParameterBound, rng: &mut R) -> ParamValue {
    match bound.param_type {
        ParamType::Int => {
            let min = bound.min_value.round() as i64;
            let max = bound.max_value.round() as i64;
            ParamValue::Int(rng.gen_range(min..=max))
        }
        ParamType::Float => ParamValue::Float(rng.gen_range(bound.min_value..=bound.max_value)),
        ParamType::Choice => bound.choices[rng.gen_range(0..bound.choices.len())].clone(),
    }
}

fn mutated_value<R: Rng>(bound: &ParameterBound, current: &ParamValue, rng: &mut R) -> ParamValue {
    match bound.param_type {
        ParamType::Choice => bound.choices[rng.gen_range(0..bound.choices.len())].clone(),
        ParamType::Int => {
            let current = current.as_i64().unwrap_or(bound.min_value.round() as i64);
            if rng.gen::<f64>() < INT_JUMP_PROB {
                let span = (bound.range() * INT_JUMP_SPAN).round().max(1.0) as i64;
                let jump = if rng.gen::<bool>() { span } else { -span };
                ParamValue::Int(current + jump)
            } else {
                let step = if rng.gen::<bool>() { 1 } else { -1 };
                ParamValue::Int(current + step)
            }
        }
        ParamType::Float => {
            let current = current.as_f64().unwrap_or(bound.min_value);
            let noise = rng.gen_range(-1.0..=1.0) * bound.range() * FLOAT_NOISE_SPAN;
            ParamValue::Float(current + noise)
        }
    }
}
