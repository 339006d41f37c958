//! Plausibility constraints on candidate deformations.
//!
//! Constraint values follow the solver's convention: a candidate is
//! feasible iff the value is greater than or equal to zero.

use nalgebra::Point3;
use tractreg_core::AffineFit;

/// Weight on the affine volume-change penalty.
pub const VOLUME_PENALTY_SCALE: f64 = 100.0;

/// Largest mean absolute lattice displacement considered plausible, in mm.
pub const MAX_MEAN_DISPLACEMENT_MM: f64 = 10.0;

/// Volume-change penalty for a landmark deformation.
///
/// Fits the least-squares affine map of source onto target landmarks and
/// scores `-100 * (1 - det)` of its linear part. Exactly zero at identity,
/// negative once the fitted map loses volume.
pub fn affine_volume_penalty(sources: &[Point3<f64>], targets: &[Point3<f64>]) -> f64 {
    match AffineFit::fit(sources, targets) {
        Ok(fit) => -VOLUME_PENALTY_SCALE * (1.0 - fit.determinant()),
        // Landmark sets too degenerate to fit are never plausible.
        Err(_) => -VOLUME_PENALTY_SCALE,
    }
}

/// Magnitude cap for a displacement-field deformation: the margin left
/// below the mean absolute displacement limit.
pub fn displacement_magnitude_penalty(parameters: &[f64]) -> f64 {
    if parameters.is_empty() {
        return MAX_MEAN_DISPLACEMENT_MM;
    }
    let mean = parameters.iter().map(|x| x.abs()).sum::<f64>() / parameters.len() as f64;
    MAX_MEAN_DISPLACEMENT_MM - mean
}
