use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::discovery::PERCENT_SCALE;
use crate::constants::resample::{
    DEFAULT_A, DEFAULT_ALPHA, DEFAULT_B, DEFAULT_BETA, DEFAULT_UNDERSAMPLE_RATIO,
};
use crate::constants::rng::DEFAULT_SEED;
use crate::errors::ScreeningError;
use crate::rng::{DeterministicRng, derive_seed};
use crate::types::{Iteration, Seed};

/// Parameters of the double-weighting oversampling curve.
///
/// - `a`: linear weight of relevant items. Higher values mean linearly more relevant rows.
/// - `alpha`: how strongly a low relevant/irrelevant ratio raises the relevant weight.
/// - `b`: irrelevant weight approached as evidence grows (`1.0` removes the dependence on `n_read`).
/// - `beta`: how quickly larger labeled sets penalize irrelevant rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightParams {
    /// Linear weight of the relevant class.
    pub a: f64,
    /// Exponent on the class ratio.
    pub alpha: f64,
    /// Asymptotic irrelevant weight.
    pub b: f64,
    /// Exponent on the evidence term.
    pub beta: f64,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            a: DEFAULT_A,
            alpha: DEFAULT_ALPHA,
            b: DEFAULT_B,
            beta: DEFAULT_BETA,
        }
    }
}

impl WeightParams {
    /// Build validated parameters; all four must be finite and strictly positive.
    pub fn new(a: f64, alpha: f64, b: f64, beta: f64) -> Result<Self, ScreeningError> {
        Self { a, alpha, b, beta }.validated()
    }

    /// Validate that every parameter is finite and strictly positive.
    pub fn validated(self) -> Result<Self, ScreeningError> {
        for (name, value) in [
            ("a", self.a),
            ("alpha", self.alpha),
            ("b", self.b),
            ("beta", self.beta),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScreeningError::Configuration(format!(
                    "weight parameter '{name}' must be finite and > 0, got {value}"
                )));
            }
        }
        Ok(self)
    }
}

/// Parameters for undersampling the irrelevant class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UndersampleParams {
    /// Target relevant/irrelevant ratio; irrelevant rows are dropped until it is reached.
    pub ratio: f64,
}

impl Default for UndersampleParams {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_UNDERSAMPLE_RATIO,
        }
    }
}

impl UndersampleParams {
    /// Validate that `ratio` is finite and strictly positive.
    pub fn validated(self) -> Result<Self, ScreeningError> {
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(ScreeningError::Configuration(format!(
                "undersample ratio must be finite and > 0, got {}",
                self.ratio
            )));
        }
        Ok(self)
    }
}

/// Strategy used to turn the labeled set into a training batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum BalanceStrategy {
    /// Every labeled row exactly once, shuffled.
    Simple,
    /// Oversample relevant rows using class-ratio and evidence weights.
    Double(WeightParams),
    /// Keep all relevant rows and drop irrelevant rows down to a target ratio.
    Undersample(UndersampleParams),
}

impl Default for BalanceStrategy {
    fn default() -> Self {
        Self::Double(WeightParams::default())
    }
}

impl BalanceStrategy {
    /// Short name used in logs and demo output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Double(_) => "double",
            Self::Undersample(_) => "undersample",
        }
    }

    /// Validate the parameters carried by the strategy.
    pub fn validated(self) -> Result<Self, ScreeningError> {
        match self {
            Self::Simple => Ok(self),
            Self::Double(params) => params.validated().map(Self::Double),
            Self::Undersample(params) => params.validated().map(Self::Undersample),
        }
    }
}

/// Seed plus strategy for a whole screening run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Base seed; each loop iteration derives its own generator from it.
    pub seed: Seed,
    /// Resampling strategy.
    pub strategy: BalanceStrategy,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            strategy: BalanceStrategy::default(),
        }
    }
}

impl BalanceConfig {
    /// Validate the embedded strategy.
    pub fn validated(self) -> Result<Self, ScreeningError> {
        Ok(Self {
            strategy: self.strategy.validated()?,
            ..self
        })
    }

    /// Fresh generator for `iteration`, reproducible for a fixed seed.
    pub fn rng_for_iteration(&self, iteration: Iteration) -> DeterministicRng {
        DeterministicRng::new(derive_seed(self.seed, iteration))
    }
}

/// Unit of reported discovery times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Raw number of items screened.
    #[default]
    Count,
    /// Share of the screenable items (`0..=1`).
    Fraction,
    /// Percentage of the screenable items (`0..=100`).
    Percentage,
}

impl TimeUnit {
    /// Per-position multiplier given the universe size and prior-knowledge prefix length.
    pub fn multiplier(self, n_total: usize, n_prior: usize) -> Result<f64, ScreeningError> {
        let scale = match self {
            Self::Count => return Ok(1.0),
            Self::Fraction => 1.0,
            Self::Percentage => PERCENT_SCALE,
        };
        let screenable = n_total.saturating_sub(n_prior);
        if screenable == 0 {
            return Err(ScreeningError::Domain(format!(
                "cannot normalize discovery times: all {n_total} items are prior knowledge"
            )));
        }
        Ok(scale / screenable as f64)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Fraction => "fraction",
            Self::Percentage => "percentage",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = ScreeningError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "fraction" => Ok(Self::Fraction),
            "percentage" => Ok(Self::Percentage),
            other => Err(ScreeningError::Configuration(format!(
                "unknown result format '{other}' (expected count, fraction or percentage)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_params_reject_non_positive_values() {
        assert!(WeightParams::new(2.155, 0.94, 0.789, 1.0).is_ok());
        assert!(WeightParams::new(0.0, 0.94, 0.789, 1.0).is_err());
        assert!(WeightParams::new(2.155, -1.0, 0.789, 1.0).is_err());
        assert!(WeightParams::new(2.155, 0.94, f64::NAN, 1.0).is_err());
        assert!(WeightParams::new(2.155, 0.94, 0.789, f64::INFINITY).is_err());
    }

    #[test]
    fn default_strategy_is_double_with_default_curve() {
        let config = BalanceConfig::default();
        assert_eq!(config.strategy, BalanceStrategy::Double(WeightParams::default()));
        assert_eq!(config.strategy.name(), "double");
        assert!(config.validated().is_ok());

        let bad = BalanceConfig {
            strategy: BalanceStrategy::Undersample(UndersampleParams { ratio: 0.0 }),
            ..config
        };
        assert!(bad.validated().is_err());
    }

    #[test]
    fn iteration_generators_are_reproducible_and_distinct() {
        use rand::RngCore;

        let config = BalanceConfig::default();
        let mut first = config.rng_for_iteration(3);
        let mut again = config.rng_for_iteration(3);
        let mut other = config.rng_for_iteration(4);
        let a = first.next_u64();
        assert_eq!(a, again.next_u64());
        assert_ne!(a, other.next_u64());
    }

    #[test]
    fn strategy_serializes_as_tagged_value() {
        let json = serde_json::to_string(&BalanceStrategy::Simple).unwrap();
        assert_eq!(json, r#"{"strategy":"simple"}"#);
        let parsed: BalanceStrategy =
            serde_json::from_str(r#"{"strategy":"undersample","ratio":0.5}"#).unwrap();
        assert_eq!(
            parsed,
            BalanceStrategy::Undersample(UndersampleParams { ratio: 0.5 })
        );
    }

    #[test]
    fn time_unit_multipliers_follow_screenable_count() {
        assert_eq!(TimeUnit::Count.multiplier(10, 2).unwrap(), 1.0);
        assert!((TimeUnit::Fraction.multiplier(10, 2).unwrap() - 0.125).abs() < 1e-12);
        assert!((TimeUnit::Percentage.multiplier(10, 2).unwrap() - 12.5).abs() < 1e-12);
        assert!(TimeUnit::Fraction.multiplier(4, 4).is_err());
        assert_eq!(TimeUnit::Count.multiplier(4, 4).unwrap(), 1.0);
    }

    #[test]
    fn time_unit_parses_case_insensitively() {
        assert_eq!("Percentage".parse::<TimeUnit>().unwrap(), TimeUnit::Percentage);
        assert_eq!(TimeUnit::Fraction.to_string(), "fraction");
        assert!("minutes".parse::<TimeUnit>().is_err());
    }
}
