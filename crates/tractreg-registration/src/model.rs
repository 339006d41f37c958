//! Transform parameterizations searched by the optimizer.

use tractreg_core::transform::landmarks::points_from_flat;
use tractreg_core::{DisplacementField, LandmarkGrid, PointMap, ThinPlateSpline};

use crate::constraint;
use crate::error::{RegistrationError, Result};

/// Default lattice resolution for the landmark model.
pub const DEFAULT_LANDMARK_RESOLUTION: usize = 3;

/// Default lattice resolution for the displacement-field model.
pub const DEFAULT_FIELD_RESOLUTION: usize = 6;

/// The deformation family being optimized, chosen at session setup.
#[derive(Debug, Clone)]
pub enum TransformModel {
    /// Sparse deformation. Parameters are source landmark coordinates; the
    /// transform is the thin-plate spline carrying them onto the fixed
    /// target lattice.
    Landmark(LandmarkGrid),
    /// Dense deformation. Parameters are lattice displacement vectors
    /// interpolated with a cubic B-spline.
    DisplacementField { resolution: usize },
}

impl TransformModel {
    /// Landmark model at a supported lattice resolution.
    pub fn landmark(resolution: usize) -> Result<Self> {
        let grid = LandmarkGrid::new(resolution)
            .map_err(|_| RegistrationError::UnsupportedResolution(resolution))?;
        Ok(Self::Landmark(grid))
    }

    /// Displacement-field model at a supported lattice resolution.
    pub fn displacement_field(resolution: usize) -> Result<Self> {
        if !tractreg_core::grid::SUPPORTED_RESOLUTIONS.contains(&resolution) {
            return Err(RegistrationError::UnsupportedResolution(resolution));
        }
        Ok(Self::DisplacementField { resolution })
    }

    /// Number of scalar parameters the model is searched over.
    pub fn parameter_count(&self) -> usize {
        match self {
            Self::Landmark(grid) => 3 * grid.len(),
            Self::DisplacementField { resolution } => 3 * resolution.pow(3),
        }
    }

    /// Parameters of the identity transform.
    pub fn identity_parameters(&self) -> Vec<f64> {
        match self {
            Self::Landmark(grid) => grid.flat(),
            Self::DisplacementField { .. } => vec![0.0; self.parameter_count()],
        }
    }

    /// Materialize the transform for a candidate parameter vector.
    pub fn build(&self, parameters: &[f64]) -> Result<Box<dyn PointMap>> {
        match self {
            Self::Landmark(grid) => {
                let sources = points_from_flat(parameters);
                let spline = ThinPlateSpline::fit(&sources, grid.landmarks())?;
                Ok(Box::new(spline))
            }
            Self::DisplacementField { resolution } => {
                let field = DisplacementField::from_lattice(*resolution, parameters)?;
                Ok(Box::new(field))
            }
        }
    }

    /// Plausibility of a candidate; feasible iff the value is >= 0.
    pub fn plausibility(&self, parameters: &[f64]) -> f64 {
        match self {
            Self::Landmark(grid) => {
                let sources = points_from_flat(parameters);
                constraint::affine_volume_penalty(&sources, grid.landmarks())
            }
            Self::DisplacementField { .. } => {
                constraint::displacement_magnitude_penalty(parameters)
            }
        }
    }
}
