//! Error types for registration runs.

use thiserror::Error;
use tractreg_core::CoreError;

/// Errors surfaced by session configuration and execution.
///
/// Solver nonconvergence is not represented here; a pass that exhausts its
/// evaluation budget still returns the best candidate it saw.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// `compute` was called before a required input was provided.
    #[error("missing input: {0} must be set before computing")]
    MissingInput(&'static str),

    /// A grid resolution outside the supported set was requested.
    #[error("unsupported grid resolution {0} (expected one of 3, 4, 5, 6, 8, 10)")]
    UnsupportedResolution(usize),

    /// Fixed and moving bundles sample fibers at different point counts.
    #[error("fixed bundle has {fixed} points per fiber but moving has {moving}")]
    ShapeMismatch { fixed: usize, moving: usize },

    /// A parameter vector does not match the model's parameter count.
    #[error("expected {expected} parameters, got {actual}")]
    ParameterLength { expected: usize, actual: usize },

    /// A geometric operation failed outside the optimization loop.
    #[error("transform error: {0}")]
    Transform(#[from] CoreError),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;
