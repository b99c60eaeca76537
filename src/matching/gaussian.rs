//! Gaussian match strategies.

use super::MatchStrategy;
use crate::model::Component;

/// Plain Euclidean matching (Stauffer/Grimson).
///
/// Distance is the straight-line distance between the observation and
/// the component mean; the match gate scales with the component's
/// spread, so wide modes accept observations further away.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanMatcher;

impl MatchStrategy for EuclideanMatcher {
    fn distance(&self, observation: &[f64; 3], component: &Component, channels: usize) -> f64 {
        let mut squared = 0.0;
        for lane in 0..channels {
            let d = observation[lane] - component.mean[lane];
            squared += d * d;
        }
        squared.sqrt()
    }

    fn gate(&self, component: &Component) -> f64 {
        component.spread()
    }
}

/// Squared-distance matching normalized by variance (Zivkovic).
///
/// Distance is the squared difference and the gate scales with the
/// component's variance, giving the Mahalanobis-style acceptance test
/// `‖x − μ‖² < T·σ²`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MahalanobisMatcher;

impl MatchStrategy for MahalanobisMatcher {
    fn distance(&self, observation: &[f64; 3], component: &Component, channels: usize) -> f64 {
        let mut squared = 0.0;
        for lane in 0..channels {
            let d = observation[lane] - component.mean[lane];
            squared += d * d;
        }
        squared
    }

    fn gate(&self, component: &Component) -> f64 {
        component.variance
    }
}
