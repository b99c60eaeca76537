//! The per-pixel mixture update engine.
//!
//! One engine drives every algorithm variant: the injected
//! [`MatchStrategy`] decides what "close" means, the configured bias
//! and pruning policy decide how modes decay and die. Each update runs
//! the same fixed sequence — rank and sort, match once, adapt the
//! match, decay the rest, spawn or replace on no match, prune,
//! renormalize — because later steps depend on values computed by
//! earlier ones.

use std::cmp::Ordering;

use crate::matching::{self, MatchStrategy};
use crate::model::{Component, ConfigError, Mixture, ModelConfig};

/// Variance floor preventing a mode from collapsing to a point.
const MIN_VARIANCE: f64 = 1e-6;

/// Total weight below which a mixture is considered degenerate.
const WEIGHT_EPSILON: f64 = 1e-12;

/// Per-pixel classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLabel {
    /// The observation matched a background-capable mode.
    Background,
    /// The observation matched no mode, or only a foreground one.
    Foreground,
}

/// Outcome of one per-pixel update.
#[derive(Debug, Clone, Copy)]
pub struct PixelDecision {
    /// Background/foreground classification for the mask.
    pub label: PixelLabel,
    /// The top-ranked mode's mean, the pixel's background estimate.
    pub background: [f64; 3],
}

impl PixelDecision {
    /// Returns true if the pixel was classified as background.
    pub fn is_background(&self) -> bool {
        self.label == PixelLabel::Background
    }
}

/// The mixture update state machine, shared by all pixels of a model.
///
/// The engine is stateless across pixels; all per-pixel state lives in
/// the [`Mixture`] passed to [`MixtureEngine::update`]. That keeps the
/// per-frame loop embarrassingly parallel.
pub struct MixtureEngine {
    config: ModelConfig,
    prune: bool,
    strategy: Box<dyn MatchStrategy>,
}

impl MixtureEngine {
    /// Creates an engine after validating the configuration.
    pub fn new(config: ModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = matching::for_algorithm(config.algorithm, config.uncertainty);
        let prune = config.algorithm.prunes_negative_weights();
        Ok(Self {
            config,
            prune,
            strategy,
        })
    }

    /// Returns the engine's configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Seeds a fresh mixture from a first observation.
    pub fn seed(&self, observation: [f64; 3]) -> Mixture {
        Mixture::seeded(
            observation,
            self.config.default_variance,
            self.config.max_modes,
        )
    }

    /// Runs one full update of a pixel's mixture.
    ///
    /// Only the first `channels` lanes of the observation participate.
    /// A degenerate mixture (emptied by pruning, or with a vanishing
    /// total weight) is reseeded from the current observation; this is
    /// a local, recoverable condition.
    pub fn update(
        &self,
        mixture: &mut Mixture,
        observation: [f64; 3],
        channels: usize,
    ) -> PixelDecision {
        if mixture.is_empty() {
            *mixture = self.seed(observation);
            return PixelDecision {
                label: PixelLabel::Foreground,
                background: observation,
            };
        }

        let config = &self.config;
        let components = mixture.components_mut();

        // 1. Rank and sort; derive the background-capable prefix as
        // the shortest run of top-ranked modes whose cumulative weight
        // reaches the background threshold.
        for component in components.iter_mut() {
            component.refresh_rank();
        }
        components.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));

        let mut prefix = 0;
        let mut cumulative = 0.0;
        while prefix < components.len() && cumulative < config.background_threshold {
            cumulative += components[prefix].weight;
            prefix += 1;
        }

        // The reported background estimate is this frame's top-ranked
        // mode, captured before adaptation shifts it.
        let background = components[0].mean;

        // 2.-4. Match-once scan: the first mode within its gate is the
        // unique match and adapts toward the observation; every other
        // mode only decays.
        let mut matched: Option<usize> = None;
        for (index, component) in components.iter_mut().enumerate() {
            if matched.is_none()
                && self.strategy.matches(
                    &observation,
                    component,
                    channels,
                    config.variance_threshold,
                )
            {
                matched = Some(index);

                let rate = config.alpha * component.weight - config.alpha * config.bias;
                component.weight = (1.0 - config.alpha) * component.weight + config.alpha
                    - config.alpha * config.bias;
                for lane in 0..channels {
                    component.mean[lane] += rate * (observation[lane] - component.mean[lane]);
                }
                let mut residual = 0.0;
                for lane in 0..channels {
                    let d = observation[lane] - component.mean[lane];
                    residual += d * d;
                }
                component.variance =
                    (component.variance + rate * (residual - component.variance)).max(MIN_VARIANCE);
            } else {
                component.weight =
                    (1.0 - config.alpha) * component.weight - config.alpha * config.bias;
            }
        }

        let label = match matched {
            Some(index) if index < prefix => PixelLabel::Background,
            Some(_) => PixelLabel::Foreground,
            None => {
                // 5. No match: spawn below capacity, otherwise replace
                // the weakest (lowest-ranked) mode.
                let fresh =
                    Component::seeded(observation, config.default_variance, config.alpha);
                if components.len() < config.max_modes {
                    components.push(fresh);
                } else if let Some(weakest) = components.last_mut() {
                    *weakest = fresh;
                }
                PixelLabel::Foreground
            }
        };

        // 6. Bias-driven pruning: drop modes whose weight has been
        // drained below zero.
        if self.prune {
            components.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
            if let Some(cut) = components.iter().position(|c| c.weight < 0.0) {
                components.truncate(cut);
            }
        }

        // 7. Renormalize so the weights sum to 1 again.
        let total: f64 = components.iter().map(|c| c.weight).sum();
        if components.is_empty() || total <= WEIGHT_EPSILON {
            tracing::trace!(total, "degenerate mixture, reseeding from observation");
            *mixture = self.seed(observation);
            return PixelDecision { label, background };
        }
        for component in components.iter_mut() {
            component.weight /= total;
        }

        PixelDecision { label, background }
    }
}

impl std::fmt::Debug for MixtureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixtureEngine")
            .field("algorithm", &self.config.algorithm)
            .field("max_modes", &self.config.max_modes)
            .field("prune", &self.prune)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Algorithm;
    use proptest::prelude::*;

    fn engine(config: ModelConfig) -> MixtureEngine {
        MixtureEngine::new(config).unwrap()
    }

    fn weights_of(mixture: &Mixture) -> Vec<f64> {
        mixture.components().iter().map(|c| c.weight).collect()
    }

    #[test]
    fn test_seed_single_full_weight_mode() {
        let engine = engine(ModelConfig::zivkovic());
        let mixture = engine.seed([10.0, 20.0, 30.0]);

        assert_eq!(mixture.len(), 1);
        let mode = mixture.components()[0];
        assert_eq!(mode.mean, [10.0, 20.0, 30.0]);
        assert_eq!(mode.variance, 16.0);
        assert_eq!(mode.weight, 1.0);
    }

    #[test]
    fn test_constant_observation_stays_background() {
        let engine = engine(ModelConfig::zivkovic());
        let observation = [120.0, 80.0, 40.0];
        let mut mixture = engine.seed(observation);

        for _ in 0..100 {
            let decision = engine.update(&mut mixture, observation, 3);
            assert!(decision.is_background());
            assert_eq!(decision.background, observation);
            assert!((mixture.total_weight() - 1.0).abs() < 1e-9);
        }
        assert_eq!(mixture.len(), 1);
    }

    #[test]
    fn test_match_once_adapts_a_single_mode() {
        let engine = engine(ModelConfig::zivkovic());
        let observation = [100.0, 100.0, 100.0];

        // Two modes both within the gate of the observation.
        let mut mixture = engine.seed(observation);
        mixture
            .components_mut()
            .push(Component::seeded([101.0, 100.0, 100.0], 16.0, 0.5));

        let shares_of = |weights: &[f64]| -> Vec<f64> {
            let total: f64 = weights.iter().sum();
            weights.iter().map(|w| w / total).collect()
        };

        let before = shares_of(&weights_of(&mixture));
        engine.update(&mut mixture, observation, 3);

        // Only the match receives the alpha boost, so exactly one mode
        // gains weight share; the other merely decays.
        let after = shares_of(&weights_of(&mixture));
        let gained = after
            .iter()
            .zip(before.iter())
            .filter(|(a, b)| a > b)
            .count();
        assert_eq!(gained, 1);
    }

    #[test]
    fn test_no_match_spawns_new_mode() {
        let engine = engine(ModelConfig::zivkovic());
        let mut mixture = engine.seed([0.0, 0.0, 0.0]);

        let decision = engine.update(&mut mixture, [200.0, 200.0, 200.0], 3);

        assert_eq!(decision.label, PixelLabel::Foreground);
        assert_eq!(mixture.len(), 2);
        let spawned = mixture
            .components()
            .iter()
            .find(|c| c.mean == [200.0, 200.0, 200.0])
            .expect("freshly spawned mode");
        assert_eq!(spawned.variance, 16.0);
    }

    #[test]
    fn test_at_capacity_replaces_weakest_instead_of_growing() {
        // Regression: the at-capacity path must overwrite the weakest
        // mode, never append past the capacity bound.
        let mut config = ModelConfig::zivkovic();
        config.max_modes = 2;
        let engine = engine(config);

        let mut mixture = engine.seed([0.0, 0.0, 0.0]);
        engine.update(&mut mixture, [100.0, 100.0, 100.0], 3);
        assert_eq!(mixture.len(), 2);

        engine.update(&mut mixture, [200.0, 200.0, 200.0], 3);
        assert_eq!(mixture.len(), 2);

        let means: Vec<[f64; 3]> = mixture.components().iter().map(|c| c.mean).collect();
        assert!(means.contains(&[200.0, 200.0, 200.0]));
        // The weaker of the two earlier modes (the frame-2 spawn) is gone.
        assert!(!means.contains(&[100.0, 100.0, 100.0]));
        assert!(means.contains(&[0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_bias_prunes_stale_mode() {
        let engine = engine(ModelConfig::zivkovic());
        let background = [50.0, 50.0, 50.0];
        let mut mixture = engine.seed(background);

        // A transient object leaves a second mode behind.
        engine.update(&mut mixture, [200.0, 200.0, 200.0], 3);
        assert_eq!(mixture.len(), 2);

        // Static background afterwards: the stale mode's weight drains
        // below zero and the mixture shrinks without any external rule.
        for _ in 0..400 {
            engine.update(&mut mixture, background, 3);
        }
        assert_eq!(mixture.len(), 1);
        assert_eq!(mixture.components()[0].mean, background);
    }

    #[test]
    fn test_grimson_never_prunes() {
        let engine = engine(ModelConfig::grimson());
        let background = [50.0, 50.0, 50.0];
        let mut mixture = engine.seed(background);

        engine.update(&mut mixture, [200.0, 200.0, 200.0], 3);
        assert_eq!(mixture.len(), 2);

        // Without bias the stale mode only shrinks multiplicatively.
        for _ in 0..400 {
            engine.update(&mut mixture, background, 3);
        }
        assert_eq!(mixture.len(), 2);
    }

    #[test]
    fn test_degenerate_mixture_reseeds() {
        let engine = engine(ModelConfig::zivkovic());
        let mut mixture = engine.seed([10.0, 10.0, 10.0]);

        // Force a pathological state: a single mode with a deeply
        // negative weight that still matches the observation.
        mixture.components_mut()[0].weight = -1.0;
        engine.update(&mut mixture, [10.0, 10.0, 10.0], 3);

        assert_eq!(mixture.len(), 1);
        let mode = mixture.components()[0];
        assert_eq!(mode.mean, [10.0, 10.0, 10.0]);
        assert_eq!(mode.weight, 1.0);
    }

    #[test]
    fn test_empty_mixture_reseeds_as_foreground() {
        let engine = engine(ModelConfig::zivkovic());
        let mut mixture = Mixture::default();

        let decision = engine.update(&mut mixture, [9.0, 9.0, 9.0], 3);

        assert_eq!(decision.label, PixelLabel::Foreground);
        assert_eq!(mixture.len(), 1);
    }

    #[test]
    fn test_sorted_mixture_order_is_stable() {
        // With alpha = 0 an update neither adapts nor decays, so a
        // second pass over an already rank-sorted mixture must leave
        // the order untouched.
        let mut config = ModelConfig::zivkovic();
        config.alpha = 0.0;
        config.bias = 0.0;
        let engine = engine(config);

        let mut mixture = engine.seed([100.0, 100.0, 100.0]);
        mixture
            .components_mut()
            .push(Component::seeded([101.0, 100.0, 100.0], 16.0, 1.0));

        engine.update(&mut mixture, [100.0, 100.0, 100.0], 3);
        let first_order: Vec<[f64; 3]> =
            mixture.components().iter().map(|c| c.mean).collect();

        engine.update(&mut mixture, [100.0, 100.0, 100.0], 3);
        let second_order: Vec<[f64; 3]> =
            mixture.components().iter().map(|c| c.mean).collect();

        assert_eq!(first_order, second_order);
    }

    #[test]
    fn test_gray_updates_touch_first_lane_only() {
        let engine = engine(ModelConfig::zivkovic());
        let mut mixture = engine.seed([100.0, 0.0, 0.0]);

        for _ in 0..10 {
            engine.update(&mut mixture, [104.0, 0.0, 0.0], 1);
        }
        let mode = mixture.components()[0];
        assert!(mode.mean[0] > 100.0);
        assert_eq!(mode.mean[1], 0.0);
        assert_eq!(mode.mean[2], 0.0);
    }

    fn widen(sample: [u8; 3]) -> [f64; 3] {
        [
            f64::from(sample[0]),
            f64::from(sample[1]),
            f64::from(sample[2]),
        ]
    }

    proptest! {
        #[test]
        fn prop_weights_conserved_and_capacity_bounded(
            observations in prop::collection::vec(prop::array::uniform3(0u8..), 2..60)
        ) {
            for config in [
                ModelConfig::grimson(),
                ModelConfig::zivkovic(),
                ModelConfig::fuzzy_uncertain_mean(),
                ModelConfig::fuzzy_uncertain_variance(),
            ] {
                let max_modes = config.max_modes;
                let engine = MixtureEngine::new(config).unwrap();
                let mut mixture = engine.seed(widen(observations[0]));

                for observation in &observations[1..] {
                    engine.update(&mut mixture, widen(*observation), 3);
                    prop_assert!((mixture.total_weight() - 1.0).abs() < 1e-9);
                    prop_assert!(mixture.len() <= max_modes);
                    prop_assert!(!mixture.is_empty());
                }
            }
        }

        #[test]
        fn prop_gray_observations_conserve_weights(
            observations in prop::collection::vec(0u8.., 2..60)
        ) {
            let engine = MixtureEngine::new(ModelConfig::zivkovic()).unwrap();
            let mut mixture = engine.seed([f64::from(observations[0]), 0.0, 0.0]);

            for observation in &observations[1..] {
                engine.update(&mut mixture, [f64::from(*observation), 0.0, 0.0], 1);
                prop_assert!((mixture.total_weight() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = ModelConfig::for_algorithm(Algorithm::Grimson);
        config.max_modes = 0;
        assert!(MixtureEngine::new(config).is_err());
    }
}
