//! Fiber bundle storage.

use nalgebra::Point3;

use crate::error::{CoreError, Result};
use crate::transform::PointMap;

/// A set of fibers sampled at a common number of points.
///
/// Points are stored fiber-major: all points of fiber 0, then all points of
/// fiber 1, and so on. Every fiber in a bundle has the same point count,
/// enforced at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    points: Vec<Point3<f64>>,
    num_fibers: usize,
    points_per_fiber: usize,
}

impl Bundle {
    /// Build a bundle from per-fiber point lists.
    ///
    /// Fails if the list is empty, any fiber is empty, or the fibers do not
    /// all share the same point count.
    pub fn from_fibers(fibers: Vec<Vec<Point3<f64>>>) -> Result<Self> {
        if fibers.is_empty() {
            return Err(CoreError::invalid_bundle("no fibers"));
        }
        let points_per_fiber = fibers[0].len();
        if points_per_fiber == 0 {
            return Err(CoreError::invalid_bundle("fiber 0 has no points"));
        }
        for (i, fiber) in fibers.iter().enumerate() {
            if fiber.len() != points_per_fiber {
                return Err(CoreError::invalid_bundle(format!(
                    "fiber {} has {} points, expected {}",
                    i,
                    fiber.len(),
                    points_per_fiber
                )));
            }
        }
        let num_fibers = fibers.len();
        let mut points = Vec::with_capacity(num_fibers * points_per_fiber);
        for fiber in fibers {
            points.extend(fiber);
        }
        Ok(Self {
            points,
            num_fibers,
            points_per_fiber,
        })
    }

    /// Number of fibers in the bundle.
    pub fn num_fibers(&self) -> usize {
        self.num_fibers
    }

    /// Number of points along each fiber.
    pub fn points_per_fiber(&self) -> usize {
        self.points_per_fiber
    }

    /// View of one fiber's points.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn fiber(&self, index: usize) -> &[Point3<f64>] {
        let start = index * self.points_per_fiber;
        &self.points[start..start + self.points_per_fiber]
    }

    /// Iterator over all fibers.
    pub fn fibers(&self) -> impl Iterator<Item = &[Point3<f64>]> {
        self.points.chunks_exact(self.points_per_fiber)
    }

    /// Apply a point map to every point, producing a new bundle.
    ///
    /// The receiver is left untouched; repeated transforms always start from
    /// the same source geometry.
    pub fn map<M: PointMap + ?Sized>(&self, transform: &M) -> Bundle {
        Bundle {
            points: self.points.iter().map(|p| transform.map(*p)).collect(),
            num_fibers: self.num_fibers,
            points_per_fiber: self.points_per_fiber,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fiber(values: &[[f64; 3]]) -> Vec<Point3<f64>> {
        values.iter().map(|v| Point3::new(v[0], v[1], v[2])).collect()
    }

    #[test]
    fn test_construction_and_access() {
        let bundle = Bundle::from_fibers(vec![
            fiber(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            fiber(&[[0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]),
            fiber(&[[0.0, 2.0, 0.0], [1.0, 2.0, 0.0]]),
        ])
        .unwrap();

        assert_eq!(bundle.num_fibers(), 3);
        assert_eq!(bundle.points_per_fiber(), 2);
        assert_eq!(bundle.fiber(1)[0], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(bundle.fibers().count(), 3);
    }

    #[test]
    fn test_rejects_empty_and_ragged() {
        assert!(Bundle::from_fibers(vec![]).is_err());
        assert!(Bundle::from_fibers(vec![fiber(&[])]).is_err());

        let ragged = Bundle::from_fibers(vec![
            fiber(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            fiber(&[[0.0, 1.0, 0.0]]),
        ]);
        assert!(ragged.is_err());
    }

    #[test]
    fn test_map_leaves_source_untouched() {
        struct Shift;
        impl PointMap for Shift {
            fn map(&self, point: Point3<f64>) -> Point3<f64> {
                Point3::new(point.x + 1.0, point.y, point.z)
            }
        }

        let bundle = Bundle::from_fibers(vec![fiber(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])]).unwrap();
        let shifted = bundle.map(&Shift);

        assert_eq!(shifted.fiber(0)[0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(shifted.fiber(0)[1], Point3::new(2.0, 0.0, 0.0));
        assert_eq!(bundle.fiber(0)[0], Point3::new(0.0, 0.0, 0.0));
    }
}
