//! Point transforms applied to fiber geometry.

pub mod affine;
pub mod displacement_field;
pub mod landmarks;
pub mod thin_plate;

use nalgebra::Point3;

/// A spatial map applied pointwise to fiber geometry.
pub trait PointMap {
    /// Map a single point.
    fn map(&self, point: Point3<f64>) -> Point3<f64>;
}
