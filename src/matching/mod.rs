//! Pluggable match/distance strategies.
//!
//! A strategy scores how well an observed pixel value fits one mixture
//! component. The update engine is generic over this trait: injecting
//! a different strategy switches the algorithm variant without
//! touching the per-pixel control flow.

mod fuzzy;
mod gaussian;

pub use fuzzy::{UncertainMeanMatcher, UncertainVarianceMatcher};
pub use gaussian::{EuclideanMatcher, MahalanobisMatcher};

use crate::model::{Algorithm, Component};

/// Closeness test between an observation and a mixture component.
///
/// `distance` returns a non-negative score where smaller means closer;
/// `gate` returns the component-dependent scale that the configured
/// variance threshold multiplies to form the acceptance bound. Only
/// the first `channels` lanes of the observation participate.
pub trait MatchStrategy: Send + Sync {
    /// Distance between an observed sample and a component.
    fn distance(&self, observation: &[f64; 3], component: &Component, channels: usize) -> f64;

    /// Scale factor for the match gate of this component.
    fn gate(&self, component: &Component) -> f64;

    /// Returns true if the observation falls within the component's
    /// acceptance bound `variance_threshold × gate`.
    fn matches(
        &self,
        observation: &[f64; 3],
        component: &Component,
        channels: usize,
        variance_threshold: f64,
    ) -> bool {
        self.distance(observation, component, channels) < variance_threshold * self.gate(component)
    }
}

/// Builds the strategy an algorithm variant calls for.
pub fn for_algorithm(algorithm: Algorithm, uncertainty: f64) -> Box<dyn MatchStrategy> {
    match algorithm {
        Algorithm::Grimson => Box::new(EuclideanMatcher),
        Algorithm::Zivkovic => Box::new(MahalanobisMatcher),
        Algorithm::FuzzyUncertainMean => Box::new(UncertainMeanMatcher::new(uncertainty)),
        Algorithm::FuzzyUncertainVariance => Box::new(UncertainVarianceMatcher::new(uncertainty)),
    }
}
