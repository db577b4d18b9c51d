use crate::error::{EvotradeError, Result};
use crate::types::ParamValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Int,
    Float,
    Choice,
}

/// Declarative description of one tunable parameter.
///
/// Defined once at startup; every operator that touches a gene goes through
/// `validate` instead of clamping inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterBound {
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub param_type: ParamType,
    pub default: ParamValue,
    pub choices: Vec<ParamValue>,
}

impl ParameterBound {
    pub fn int(name: &str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            min_value: min as f64,
            max_value: max as f64,
            param_type: ParamType::Int,
            default: ParamValue::Int(default),
            choices: Vec::new(),
        }
    }

    pub fn float(name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            min_value: min,
            max_value: max,
            param_type: ParamType::Float,
            default: ParamValue::Float(default),
            choices: Vec::new(),
        }
    }

    pub fn choice(name: &str, choices: Vec<ParamValue>, default: ParamValue) -> Self {
        Self {
            name: name.to_string(),
            min_value: 0.0,
            max_value: (choices.len().saturating_sub(1)) as f64,
            param_type: ParamType::Choice,
            default,
            choices,
        }
    }

    pub fn range(&self) -> f64 {
        self.max_value - self.min_value
    }

    /// Clamp an out-of-range numeric value into `[min, max]`; snap an unknown
    /// choice back to the default. Out-of-range input is recovered, never
    /// rejected: a gene is always kept.
    pub fn validate(&self, value: &ParamValue) -> ParamValue {
        match self.param_type {
            ParamType::Int => {
                let v = value.as_f64().unwrap_or(self.min_value);
                let clamped = v.clamp(self.min_value, self.max_value);
                ParamValue::Int(clamped.round() as i64)
            }
            ParamType::Float => {
                let v = value.as_f64().unwrap_or(self.min_value);
                ParamValue::Float(v.clamp(self.min_value, self.max_value))
            }
            ParamType::Choice => {
                if self.choices.iter().any(|c| c == value) {
                    value.clone()
                } else {
                    self.default.clone()
                }
            }
        }
    }

    fn check(&self) -> Result<()> {
        match self.param_type {
            ParamType::Choice => {
                if self.choices.is_empty() {
                    return Err(EvotradeError::Configuration(format!(
                        "Parameter '{}' has an empty choice set",
                        self.name
                    )));
                }
                if !self.choices.iter().any(|c| c == &self.default) {
                    return Err(EvotradeError::Configuration(format!(
                        "Parameter '{}' default is not among its choices",
                        self.name
                    )));
                }
            }
            ParamType::Int | ParamType::Float => {
                if self.min_value > self.max_value {
                    return Err(EvotradeError::Configuration(format!(
                        "Parameter '{}' has min {} > max {}",
                        self.name, self.min_value, self.max_value
                    )));
                }
                let d = self.default.as_f64().ok_or_else(|| {
                    EvotradeError::Configuration(format!(
                        "Parameter '{}' has a non-numeric default",
                        self.name
                    ))
                })?;
                if d < self.min_value || d > self.max_value {
                    return Err(EvotradeError::Configuration(format!(
                        "Parameter '{}' default {} outside [{}, {}]",
                        self.name, d, self.min_value, self.max_value
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The full catalogue of tunable parameters for one strategy type.
///
/// Single source of truth: no other component may hardcode a bound.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    bounds: Vec<ParameterBound>,
}

impl ParameterSpace {
    pub fn new(bounds: Vec<ParameterBound>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for bound in &bounds {
            bound.check()?;
            if !seen.insert(bound.name.clone()) {
                return Err(EvotradeError::Configuration(format!(
                    "Duplicate parameter name '{}'",
                    bound.name
                )));
            }
        }
        Ok(Self { bounds })
    }

    pub fn all_bounds(&self) -> &[ParameterBound] {
        &self.bounds
    }

    pub fn get(&self, name: &str) -> Option<&ParameterBound> {
        self.bounds.iter().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_clamps_and_rounds() {
        let bound = ParameterBound::int("period", 5, 50, 14);
        assert_eq!(bound.validate(&ParamValue::Int(3)), ParamValue::Int(5));
        assert_eq!(bound.validate(&ParamValue::Int(99)), ParamValue::Int(50));
        assert_eq!(bound.validate(&ParamValue::Float(10.6)), ParamValue::Int(11));
    }

    #[test]
    fn test_float_clamps() {
        let bound = ParameterBound::float("threshold", 0.0, 1.0, 0.5);
        assert_eq!(
            bound.validate(&ParamValue::Float(1.7)),
            ParamValue::Float(1.0)
        );
        assert_eq!(
            bound.validate(&ParamValue::Float(-0.2)),
            ParamValue::Float(0.0)
        );
    }

    #[test]
    fn test_choice_snaps_to_default() {
        let bound = ParameterBound::choice(
            "ma_type",
            vec![
                ParamValue::Text("sma".into()),
                ParamValue::Text("ema".into()),
            ],
            ParamValue::Text("sma".into()),
        );
        assert_eq!(
            bound.validate(&ParamValue::Text("ema".into())),
            ParamValue::Text("ema".into())
        );
        assert_eq!(
            bound.validate(&ParamValue::Text("wma".into())),
            ParamValue::Text("sma".into())
        );
    }

    #[test]
    fn test_space_rejects_bad_bounds() {
        assert!(ParameterSpace::new(vec![ParameterBound::int("p", 10, 5, 7)]).is_err());
        assert!(ParameterSpace::new(vec![ParameterBound::int("p", 0, 5, 9)]).is_err());
        assert!(ParameterSpace::new(vec![
            ParameterBound::int("p", 0, 5, 3),
            ParameterBound::int("p", 0, 5, 3),
        ])
        .is_err());
        assert!(ParameterSpace::new(vec![ParameterBound::choice(
            "c",
            vec![],
            ParamValue::Text("x".into())
        )])
        .is_err());
    }
}
