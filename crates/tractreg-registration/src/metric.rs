//! Fiber distances and the entropy objective.

use nalgebra::Point3;
use rayon::prelude::*;
use tractreg_core::Bundle;

/// Floor seeding each fiber probability before kernel accumulation.
pub const PROBABILITY_FLOOR: f64 = 1e-20;

/// Distance from a query fiber to every fiber of a bundle.
///
/// The pairwise distance is the mean over point index of the squared
/// Euclidean distance between corresponding points, taken as the minimum
/// over the two traversal directions of the query fiber. Fibers have no
/// canonical start, so a reversed copy of the same geometry must score zero.
///
/// Callers guarantee equal point counts; the session validates this once
/// when bundles are attached.
pub fn fiber_distances(query: &[Point3<f64>], bundle: &Bundle) -> Vec<f64> {
    bundle
        .fibers()
        .map(|fixed| fiber_distance(query, fixed))
        .collect()
}

fn fiber_distance(query: &[Point3<f64>], fixed: &[Point3<f64>]) -> f64 {
    let forward = mean_squared(query.iter(), fixed);
    let reversed = mean_squared(query.iter().rev(), fixed);
    forward.min(reversed)
}

fn mean_squared<'a>(
    query: impl Iterator<Item = &'a Point3<f64>>,
    fixed: &[Point3<f64>],
) -> f64 {
    let mut sum = 0.0;
    for (q, f) in query.zip(fixed) {
        sum += (q - f).norm_squared();
    }
    sum / fixed.len() as f64
}

/// Entropy of a moving bundle against a fixed bundle under a Gaussian
/// fiber-distance kernel. Lower values mean better overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyMetric {
    sigma_squared: f64,
}

impl EntropyMetric {
    /// Metric with the given kernel width in mm.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma_squared: sigma * sigma,
        }
    }

    /// Objective value for the current moving geometry.
    ///
    /// Each moving fiber contributes the negative log of its probability
    /// under the fixed bundle. Moving fibers are scored in parallel; the
    /// per-fiber terms are summed in fiber order so the result does not
    /// depend on the thread schedule.
    pub fn evaluate(&self, fixed: &Bundle, moving: &Bundle) -> f64 {
        let num_fixed = fixed.num_fibers() as f64;
        let terms: Vec<f64> = (0..moving.num_fibers())
            .into_par_iter()
            .map(|idx| {
                let mut probability = PROBABILITY_FLOOR;
                for distance in fiber_distances(moving.fiber(idx), fixed) {
                    probability += (-distance / self.sigma_squared).exp();
                }
                -(probability / num_fixed).ln()
            })
            .collect();
        terms.iter().sum()
    }
}
