//! Engine configuration.
//!
//! [`GeneConfig`] holds every parameter of a run. It is validated once when
//! the [`Engine`](super::Engine) is built and is read-only afterwards.

use super::population::{elite_count, reprieve_count};
use crate::error::ConfigError;
use crate::tsp::CityLayout;
use std::time::Duration;

/// Configuration for an evolution run.
///
/// # Defaults
///
/// ```
/// use tsp_evolve::ga::GeneConfig;
///
/// let config = GeneConfig::default();
/// assert_eq!(config.city_count, 50);
/// assert_eq!(config.pop_cap, 1000);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use std::time::Duration;
/// use tsp_evolve::ga::GeneConfig;
///
/// let config = GeneConfig::random()
///     .with_city_count(30)
///     .with_pop_cap(200)
///     .with_stat_period(10)
///     .with_delay(Duration::from_millis(5))
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneConfig {
    /// Number of cities in the instance.
    pub city_count: usize,

    /// Population size at the start and end of every generation.
    pub pop_cap: usize,

    /// Number of generations before the run completes.
    pub max_generations: usize,

    /// Fraction of the population culled before reprieve (0.0–1.0).
    ///
    /// The best `floor((1 - cull_rate) * pop_cap)` tours always survive.
    pub cull_rate: f64,

    /// Fraction of the population randomly spared from culling (0.0–1.0).
    ///
    /// `floor(cull_reprieve * pop_cap)` culled tours are kept to preserve
    /// diversity. Must not exceed `cull_rate`.
    pub cull_reprieve: f64,

    /// Mean swap-mutation intensity (0.0–1.0).
    ///
    /// A rate of 1.0 swaps `city_count / 2` disjoint position pairs.
    pub mutate_rate: f64,

    /// Symmetric random spread applied around `mutate_rate`.
    pub mutate_deviation: f64,

    /// Pause inserted after each generation.
    pub delay: Duration,

    /// Emit a snapshot every `stat_period` generations. 0 emits every
    /// generation.
    pub stat_period: usize,

    /// `true` places cities uniformly at random, `false` on the unit circle.
    pub random_city_pos: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GeneConfig {
    fn default() -> Self {
        Self {
            city_count: 50,
            pop_cap: 1000,
            max_generations: 10_000,
            cull_rate: 0.8,
            cull_reprieve: 0.2,
            mutate_rate: 0.5,
            mutate_deviation: 0.5,
            delay: Duration::ZERO,
            stat_period: 100,
            random_city_pos: false,
            seed: None,
        }
    }
}

impl GeneConfig {
    /// Preset for a circle layout run.
    pub fn circle() -> Self {
        Self::default()
    }

    /// Preset for a uniformly random layout run.
    pub fn random() -> Self {
        Self {
            random_city_pos: true,
            ..Self::default()
        }
    }

    pub fn with_city_count(mut self, n: usize) -> Self {
        self.city_count = n;
        self
    }

    pub fn with_pop_cap(mut self, n: usize) -> Self {
        self.pop_cap = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_cull_rate(mut self, rate: f64) -> Self {
        self.cull_rate = rate;
        self
    }

    pub fn with_cull_reprieve(mut self, rate: f64) -> Self {
        self.cull_reprieve = rate;
        self
    }

    pub fn with_mutate_rate(mut self, rate: f64) -> Self {
        self.mutate_rate = rate;
        self
    }

    pub fn with_mutate_deviation(mut self, deviation: f64) -> Self {
        self.mutate_deviation = deviation;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_stat_period(mut self, period: usize) -> Self {
        self.stat_period = period;
        self
    }

    pub fn with_random_city_pos(mut self, random: bool) -> Self {
        self.random_city_pos = random;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The city layout selected by `random_city_pos`.
    pub fn layout(&self) -> CityLayout {
        if self.random_city_pos {
            CityLayout::Random
        } else {
            CityLayout::Circle
        }
    }

    /// Number of tours kept by rank alone during culling.
    pub fn elite_count(&self) -> usize {
        elite_count(self.pop_cap, self.cull_rate)
    }

    /// Number of culled tours spared at random.
    pub fn reprieve_count(&self) -> usize {
        reprieve_count(self.pop_cap, self.cull_reprieve)
    }

    /// Whether a snapshot is emitted after `generation`.
    pub fn emits_at(&self, generation: usize) -> bool {
        self.stat_period == 0 || generation % self.stat_period == 0
    }

    /// Validates the configuration.
    ///
    /// Returns [`ConfigError::Invalid`] with a description if any parameter
    /// cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.city_count < 2 {
            return Err(invalid("city_count must be at least 2"));
        }
        if self.pop_cap < 2 {
            return Err(invalid("pop_cap must be at least 2"));
        }
        if self.max_generations == 0 {
            return Err(invalid("max_generations must be at least 1"));
        }
        check_unit_rate("cull_rate", self.cull_rate)?;
        check_unit_rate("cull_reprieve", self.cull_reprieve)?;
        check_unit_rate("mutate_rate", self.mutate_rate)?;
        if !self.mutate_deviation.is_finite() || self.mutate_deviation < 0.0 {
            return Err(invalid("mutate_deviation must be finite and non-negative"));
        }
        if self.cull_reprieve > self.cull_rate {
            return Err(invalid(
                "cull_reprieve must not exceed cull_rate: more tours would be reprieved than culled",
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

fn check_unit_rate(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneConfig::default();
        assert_eq!(config.city_count, 50);
        assert_eq!(config.pop_cap, 1000);
        assert_eq!(config.max_generations, 10_000);
        assert!((config.cull_rate - 0.8).abs() < 1e-12);
        assert!((config.cull_reprieve - 0.2).abs() < 1e-12);
        assert!((config.mutate_rate - 0.5).abs() < 1e-12);
        assert!((config.mutate_deviation - 0.5).abs() < 1e-12);
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.stat_period, 100);
        assert!(!config.random_city_pos);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GeneConfig::default()
            .with_city_count(12)
            .with_pop_cap(40)
            .with_max_generations(300)
            .with_cull_rate(0.5)
            .with_cull_reprieve(0.1)
            .with_mutate_rate(0.25)
            .with_mutate_deviation(0.1)
            .with_delay(Duration::from_millis(3))
            .with_stat_period(0)
            .with_random_city_pos(true)
            .with_seed(42);

        assert_eq!(config.city_count, 12);
        assert_eq!(config.pop_cap, 40);
        assert_eq!(config.max_generations, 300);
        assert!((config.cull_rate - 0.5).abs() < 1e-12);
        assert!((config.cull_reprieve - 0.1).abs() < 1e-12);
        assert!((config.mutate_rate - 0.25).abs() < 1e-12);
        assert!((config.mutate_deviation - 0.1).abs() < 1e-12);
        assert_eq!(config.delay, Duration::from_millis(3));
        assert_eq!(config.stat_period, 0);
        assert!(config.random_city_pos);
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_layout() {
        assert_eq!(GeneConfig::circle().layout(), CityLayout::Circle);
        assert_eq!(GeneConfig::random().layout(), CityLayout::Random);
        assert!(GeneConfig::random().validate().is_ok());
    }

    #[test]
    fn test_cull_counts() {
        let config = GeneConfig::default()
            .with_pop_cap(10)
            .with_cull_rate(0.2)
            .with_cull_reprieve(0.1);
        assert_eq!(config.elite_count(), 8);
        assert_eq!(config.reprieve_count(), 1);

        let defaults = GeneConfig::default();
        assert_eq!(defaults.elite_count(), 200);
        assert_eq!(defaults.reprieve_count(), 200);
    }

    #[test]
    fn test_emits_at() {
        let every = GeneConfig::default().with_stat_period(0);
        assert!((0..10).all(|g| every.emits_at(g)));

        let third = GeneConfig::default().with_stat_period(3);
        let emitted: Vec<usize> = (0..10).filter(|&g| third.emits_at(g)).collect();
        assert_eq!(emitted, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_validate_too_few_cities() {
        assert!(GeneConfig::default().with_city_count(1).validate().is_err());
        assert!(GeneConfig::default().with_city_count(0).validate().is_err());
        assert!(GeneConfig::default().with_city_count(2).validate().is_ok());
    }

    #[test]
    fn test_validate_population_too_small() {
        assert!(GeneConfig::default().with_pop_cap(1).validate().is_err());
    }

    #[test]
    fn test_validate_zero_generations() {
        assert!(GeneConfig::default()
            .with_max_generations(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rates_out_of_range() {
        assert!(GeneConfig::default().with_cull_rate(1.5).validate().is_err());
        assert!(GeneConfig::default()
            .with_cull_reprieve(-0.1)
            .validate()
            .is_err());
        assert!(GeneConfig::default()
            .with_mutate_rate(f64::NAN)
            .validate()
            .is_err());
        assert!(GeneConfig::default()
            .with_mutate_deviation(-1.0)
            .validate()
            .is_err());
        assert!(GeneConfig::default()
            .with_mutate_deviation(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_reprieve_exceeds_cull() {
        let config = GeneConfig::default()
            .with_cull_rate(0.3)
            .with_cull_reprieve(0.4);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cull_reprieve"), "{err}");
    }

    #[test]
    fn test_validate_accepts_full_cull() {
        // Small populations may cull every tour; mutation then reseeds.
        let config = GeneConfig::default().with_city_count(4).with_pop_cap(4);
        assert_eq!(config.elite_count() + config.reprieve_count(), 0);
        assert!(config.validate().is_ok());
    }
}
