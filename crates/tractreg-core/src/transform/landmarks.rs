//! Conversions between flat coordinate vectors and landmark point lists.

use nalgebra::Point3;

/// Interpret a flat `[x, y, z, x, y, z, ..]` slice as points.
///
/// Trailing values that do not fill a complete point are ignored.
pub fn points_from_flat(flat: &[f64]) -> Vec<Point3<f64>> {
    flat.chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect()
}

/// Flatten points into `[x, y, z, ..]` order.
pub fn flatten_points(points: &[Point3<f64>]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(points.len() * 3);
    for p in points {
        flat.extend_from_slice(&[p.x, p.y, p.z]);
    }
    flat
}
