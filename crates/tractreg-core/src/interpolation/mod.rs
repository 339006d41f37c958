//! Interpolation kernels.

pub mod bspline;

pub use bspline::cubic_bspline;
