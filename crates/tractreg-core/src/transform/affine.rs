//! Least-squares affine fitting between landmark sets.

use nalgebra::{DMatrix, Matrix3, Point3, Vector3};

use crate::error::{CoreError, Result};

/// Affine map fitted to landmark pairs in the least-squares sense.
///
/// The determinant of the linear part measures how much the fitted map
/// scales volume, which is what the plausibility check on landmark
/// deformations looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineFit {
    linear: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl AffineFit {
    /// Fit the affine map taking `sources[i]` close to `targets[i]`.
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

        let mut design = DMatrix::zeros(n, 4);
        let mut rhs = DMatrix::zeros(n, 3);
        for i in 0..n {
            design[(i, 0)] = sources[i].x;
            design[(i, 1)] = sources[i].y;
            design[(i, 2)] = sources[i].z;
            design[(i, 3)] = 1.0;
            rhs[(i, 0)] = targets[i].x;
            rhs[(i, 1)] = targets[i].y;
            rhs[(i, 2)] = targets[i].z;
        }

        let beta = design
            .svd(true, true)
            .solve(&rhs, 1e-12)
            .map_err(|_| CoreError::SingularSystem("affine landmark fit"))?;

        // beta is 4x3 with target components in columns; the map itself has
        // source components in columns, hence the transpose.
        let mut linear = Matrix3::zeros();
        for r in 0..3 {
            for c in 0..3 {
                linear[(c, r)] = beta[(r, c)];
            }
        }
        let translation = Vector3::new(beta[(3, 0)], beta[(3, 1)], beta[(3, 2)]);

        Ok(Self {
            linear,
            translation,
        })
    }

    /// Linear part of the fitted map.
    pub fn linear(&self) -> &Matrix3<f64> {
        &self.linear
    }

    /// Translation part of the fitted map.
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.linear.determinant()
    }

    /// Apply the fitted map to a point.
    pub fn apply(&self, point: Point3<f64>) -> Point3<f64> {
        Point3::from(self.linear * point.coords + self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner_landmarks(scale: f64) -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for &x in &[-scale, scale] {
            for &y in &[-scale, scale] {
                for &z in &[-scale, scale] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn test_identity_determinant() {
        let landmarks = corner_landmarks(120.0);
        let fit = AffineFit::fit(&landmarks, &landmarks).unwrap();
        assert!((fit.determinant() - 1.0).abs() < 1e-9);
        assert!(fit.translation().norm() < 1e-9);
    }

    #[test]
    fn test_uniform_scale_determinant() {
        let sources = corner_landmarks(100.0);
        let targets: Vec<Point3<f64>> = sources.iter().map(|p| p * 2.0).collect();
        let fit = AffineFit::fit(&sources, &targets).unwrap();
        assert!((fit.determinant() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_translation_preserves_determinant() {
        let sources = corner_landmarks(100.0);
        let shift = Vector3::new(10.0, -4.0, 2.5);
        let targets: Vec<Point3<f64>> = sources.iter().map(|p| p + shift).collect();
        let fit = AffineFit::fit(&sources, &targets).unwrap();
        assert!((fit.determinant() - 1.0).abs() < 1e-9);
        assert!((fit.translation() - shift).norm() < 1e-9);
    }

    #[test]
    fn test_recovers_exact_affine() {
        let sources = corner_landmarks(50.0);
        let linear = Matrix3::new(1.2, 0.1, 0.0, -0.05, 0.9, 0.2, 0.0, 0.0, 1.1);
        let shift = Vector3::new(3.0, -7.0, 1.0);
        let targets: Vec<Point3<f64>> = sources
            .iter()
            .map(|p| Point3::from(linear * p.coords + shift))
            .collect();
        let fit = AffineFit::fit(&sources, &targets).unwrap();
        for (source, target) in sources.iter().zip(&targets) {
            assert!((fit.apply(*source) - target).norm() < 1e-9);
        }
        assert!((fit.determinant() - linear.determinant()).abs() < 1e-9);
    }
}
