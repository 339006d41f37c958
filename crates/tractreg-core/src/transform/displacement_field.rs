//! Dense displacement field on a cubic B-spline lattice.

use nalgebra::{Point3, Vector3};

use crate::error::{CoreError, Result};
use crate::grid::SUPPORTED_RESOLUTIONS;
use crate::interpolation::bspline::{cubic_bspline, mirror_index, prefilter};
use crate::transform::PointMap;

/// Side length of the cube covered by the displacement lattice, in mm.
pub const FIELD_EXTENT_MM: f64 = 200.0;

/// Displacement field interpolated from a `res x res x res` lattice of
/// displacement vectors with a cubic B-spline.
///
/// The lattice spans a 200 mm cube centered at the origin. Lattice values
/// are converted to spline coefficients at construction, so the field
/// reproduces the given displacements exactly at lattice points. Queries
/// outside the cube return zero displacement.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    resolution: usize,
    origin: f64,
    spacing: f64,
    /// One prefiltered coefficient volume per displacement component,
    /// x-fastest layout.
    coefficients: [Vec<f64>; 3],
}

impl DisplacementField {
    /// Build the field from interleaved lattice displacements.
    ///
    /// `displacements` holds an x, y, z triple for every lattice point, with
    /// the first lattice index varying fastest. An all-zero vector yields
    /// the identity map.
    pub fn from_lattice(resolution: usize, displacements: &[f64]) -> Result<Self> {
        if !SUPPORTED_RESOLUTIONS.contains(&resolution) {
            return Err(CoreError::UnsupportedResolution(resolution));
        }
        let num_points = resolution.pow(3);
        let expected = 3 * num_points;
        if displacements.len() != expected {
            return Err(CoreError::LatticeSize {
                resolution,
                expected,
                actual: displacements.len(),
            });
        }

        let mut coefficients: [Vec<f64>; 3] = [
            Vec::with_capacity(num_points),
            Vec::with_capacity(num_points),
            Vec::with_capacity(num_points),
        ];
        for triple in displacements.chunks_exact(3) {
            for (component, volume) in triple.iter().zip(coefficients.iter_mut()) {
                volume.push(*component);
            }
        }
        for volume in coefficients.iter_mut() {
            prefilter_volume(volume, resolution);
        }

        Ok(Self {
            resolution,
            origin: -FIELD_EXTENT_MM / 2.0,
            spacing: FIELD_EXTENT_MM / (resolution as f64 - 1.0),
            coefficients,
        })
    }

    /// Lattice resolution along one axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Spline displacement at a point; zero outside the lattice support.
    pub fn displacement_at(&self, point: Point3<f64>) -> Vector3<f64> {
        let res = self.resolution;
        let u = [
            (point.x - self.origin) / self.spacing,
            (point.y - self.origin) / self.spacing,
            (point.z - self.origin) / self.spacing,
        ];
        let max = (res - 1) as f64;
        if u.iter().any(|&v| !(0.0..=max).contains(&v)) {
            return Vector3::zeros();
        }

        let mut base = [0_isize; 3];
        let mut weights = [[0.0; 4]; 3];
        for axis in 0..3 {
            base[axis] = u[axis].floor() as isize - 1;
            for t in 0..4 {
                weights[axis][t] = cubic_bspline(u[axis] - (base[axis] + t as isize) as f64);
            }
        }

        let mut out = Vector3::zeros();
        for k in 0..4 {
            let zi = mirror_index(base[2] + k as isize, res);
            for j in 0..4 {
                let yi = mirror_index(base[1] + j as isize, res);
                let wyz = weights[1][j] * weights[2][k];
                for i in 0..4 {
                    let xi = mirror_index(base[0] + i as isize, res);
                    let w = weights[0][i] * wyz;
                    let idx = xi + yi * res + zi * res * res;
                    out.x += w * self.coefficients[0][idx];
                    out.y += w * self.coefficients[1][idx];
                    out.z += w * self.coefficients[2][idx];
                }
            }
        }
        out
    }
}

impl PointMap for DisplacementField {
    fn map(&self, point: Point3<f64>) -> Point3<f64> {
        point + self.displacement_at(point)
    }
}

/// Run the coefficient prefilter along every x, y and z line of a volume.
fn prefilter_volume(volume: &mut [f64], res: usize) {
    let mut line = vec![0.0; res];
    for k in 0..res {
        for j in 0..res {
            let start = j * res + k * res * res;
            for i in 0..res {
                line[i] = volume[start + i];
            }
            prefilter(&mut line);
            volume[start..start + res].copy_from_slice(&line);
        }
    }
    for k in 0..res {
        for i in 0..res {
            let start = i + k * res * res;
            for j in 0..res {
                line[j] = volume[start + j * res];
            }
            prefilter(&mut line);
            for j in 0..res {
                volume[start + j * res] = line[j];
            }
        }
    }
    for j in 0..res {
        for i in 0..res {
            let start = i + j * res;
            for k in 0..res {
                line[k] = volume[start + k * res * res];
            }
            prefilter(&mut line);
            for k in 0..res {
                volume[start + k * res * res] = line[k];
            }
        }
    }
}
