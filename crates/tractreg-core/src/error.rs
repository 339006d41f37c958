//! Error types for geometric operations.

use thiserror::Error;

/// Errors produced by geometry and transform construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A dense linear system could not be solved.
    #[error("singular linear system in {0}")]
    SingularSystem(&'static str),

    /// A grid resolution outside the supported set was requested.
    #[error("unsupported grid resolution {0} (expected one of 3, 4, 5, 6, 8, 10)")]
    UnsupportedResolution(usize),

    /// Landmark source and target lists disagree or are too small.
    #[error("invalid landmark configuration: {0}")]
    LandmarkMismatch(String),

    /// A bundle could not be constructed from the given fibers.
    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    /// A lattice parameter vector has the wrong length for its resolution.
    #[error("lattice of resolution {resolution} needs {expected} values, got {actual}")]
    LatticeSize {
        resolution: usize,
        expected: usize,
        actual: usize,
    },
}

impl CoreError {
    /// Create a landmark mismatch error.
    pub fn landmark_mismatch(msg: impl Into<String>) -> Self {
        Self::LandmarkMismatch(msg.into())
    }

    /// Create an invalid bundle error.
    pub fn invalid_bundle(msg: impl Into<String>) -> Self {
        Self::InvalidBundle(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
