//! Thin-plate spline transform with the r basis.

use nalgebra::{DMatrix, Point3};

use crate::error::{CoreError, Result};
use crate::transform::PointMap;

/// Thin-plate spline carrying each source landmark onto its target.
///
/// Uses the three-dimensional basis U(r) = r. Weights solve the bordered
/// system `[[K P], [P^T 0]]` where `K_ij` is the distance between source
/// landmarks i and j and the rows of P are `[1, x, y, z]`.
#[derive(Debug, Clone)]
pub struct ThinPlateSpline {
    sources: Vec<Point3<f64>>,
    /// `(n + 4) x 3`: n kernel weight rows, then affine rows 1, x, y, z.
    weights: DMatrix<f64>,
}

impl ThinPlateSpline {
    /// Fit the spline interpolating `sources[i] -> targets[i]`.
    pub fn fit(sources: &[Point3<f64>], targets: &[Point3<f64>]) -> Result<Self> {
        if sources.len() != targets.len() {
            return Err(CoreError::landmark_mismatch(format!(
                "{} source landmarks vs {} targets",
                sources.len(),
                targets.len()
            )));
        }
        let n = sources.len();
        if n < 4 {
            return Err(CoreError::landmark_mismatch(format!(
                "need at least 4 landmark pairs, got {n}"
            )));
        }

        let mut a = DMatrix::zeros(n + 4, n + 4);
        for i in 0..n {
            for j in 0..n {
                a[(i, j)] = (sources[i] - sources[j]).norm();
            }
            a[(i, n)] = 1.0;
            a[(i, n + 1)] = sources[i].x;
            a[(i, n + 2)] = sources[i].y;
            a[(i, n + 3)] = sources[i].z;
            a[(n, i)] = 1.0;
            a[(n + 1, i)] = sources[i].x;
            a[(n + 2, i)] = sources[i].y;
            a[(n + 3, i)] = sources[i].z;
        }

        let mut b = DMatrix::zeros(n + 4, 3);
        for (i, target) in targets.iter().enumerate() {
            b[(i, 0)] = target.x;
            b[(i, 1)] = target.y;
            b[(i, 2)] = target.z;
        }

        let weights = a
            .lu()
            .solve(&b)
            .ok_or(CoreError::SingularSystem("thin-plate spline system"))?;

        Ok(Self {
            sources: sources.to_vec(),
            weights,
        })
    }

    /// Number of landmark pairs the spline was fitted through.
    pub fn num_landmarks(&self) -> usize {
        self.sources.len()
    }
}

impl PointMap for ThinPlateSpline {
    fn map(&self, point: Point3<f64>) -> Point3<f64> {
        let n = self.sources.len();
        let w = &self.weights;
        let mut out = [0.0; 3];
        for c in 0..3 {
            out[c] = w[(n, c)]
                + w[(n + 1, c)] * point.x
                + w[(n + 2, c)] * point.y
                + w[(n + 3, c)] * point.z;
        }
        for (i, source) in self.sources.iter().enumerate() {
            let r = (point - source).norm();
            for c in 0..3 {
                out[c] += w[(i, c)] * r;
            }
        }
        Point3::new(out[0], out[1], out[2])
    }
}
