//! Type-2 fuzzy membership match strategies.
//!
//! Both strategies score an observation by evaluating a per-channel
//! primary membership term and summing the squared terms over the live
//! channels. The uncertainty factor `k` widens or narrows the band in
//! which an observation is considered compatible with a mode.

use super::MatchStrategy;
use crate::model::Component;

/// Gaussian primary membership with uncertain mean.
///
/// Outside the `k·s` band around the mean the term is a linear ramp
/// `2k·d/s`; inside the band it blends `d/(2v) + k·d/s + k²/2`.
#[derive(Debug, Clone, Copy)]
pub struct UncertainMeanMatcher {
    /// Uncertainty factor applied to the mean band.
    pub k: f64,
}

impl UncertainMeanMatcher {
    /// Creates the matcher with the given uncertainty factor.
    pub fn new(k: f64) -> Self {
        Self { k }
    }
}

impl MatchStrategy for UncertainMeanMatcher {
    fn distance(&self, observation: &[f64; 3], component: &Component, channels: usize) -> f64 {
        let k = self.k;
        let v = component.variance;
        let s = component.spread();

        let mut score = 0.0;
        for lane in 0..channels {
            let x = observation[lane];
            let mean = component.mean[lane];
            let d = mean - x;

            let term = if x < mean - k * s || x > mean + k * s {
                2.0 * k * d / s
            } else {
                d / (2.0 * v) + k * d / s + k * k / 2.0
            };
            score += term * term;
        }
        score
    }

    fn gate(&self, component: &Component) -> f64 {
        component.variance
    }
}

/// Gaussian primary membership with uncertain variance.
///
/// Closed form `((1/k² − k²) / 2v) · d²` per channel.
#[derive(Debug, Clone, Copy)]
pub struct UncertainVarianceMatcher {
    /// Uncertainty multiplier applied to the variance.
    pub k: f64,
}

impl UncertainVarianceMatcher {
    /// Creates the matcher with the given uncertainty factor.
    pub fn new(k: f64) -> Self {
        Self { k }
    }
}

impl MatchStrategy for UncertainVarianceMatcher {
    fn distance(&self, observation: &[f64; 3], component: &Component, channels: usize) -> f64 {
        let k = self.k;
        let scale = (1.0 / (k * k) - k * k) / (2.0 * component.variance);

        let mut score = 0.0;
        for lane in 0..channels {
            let d = component.mean[lane] - observation[lane];
            let term = scale * d * d;
            score += term * term;
        }
        score
    }

    fn gate(&self, component: &Component) -> f64 {
        component.variance
    }
}
