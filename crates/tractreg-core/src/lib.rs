//! Geometry and transform primitives for fiber tract registration.
//!
//! This crate owns the data model shared by the registration layer: fiber
//! bundles, the landmark lattices that parameterize sparse deformations, and
//! the two nonlinear transform families (thin-plate splines and cubic
//! B-spline displacement fields) together with the affine fitting used to
//! judge their plausibility.

pub mod bundle;
pub mod error;
pub mod grid;
pub mod interpolation;
pub mod transform;

pub use bundle::Bundle;
pub use error::{CoreError, Result};
pub use grid::LandmarkGrid;
pub use transform::affine::AffineFit;
pub use transform::displacement_field::DisplacementField;
pub use transform::thin_plate::ThinPlateSpline;
pub use transform::PointMap;
