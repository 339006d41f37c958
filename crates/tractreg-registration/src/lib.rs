//! Entropy-based pairwise registration of fiber tract bundles.
//!
//! A [`RegistrationSession`] holds a fixed and a moving bundle, a
//! [`TransformModel`] describing the deformation family being searched, and
//! drives a constrained derivative-free solver over the model's parameters.
//! The objective is the entropy of the moving bundle under a Gaussian
//! fiber-distance kernel against the fixed bundle; candidates are kept
//! plausible by a per-model constraint. Repeated `compute` calls with
//! shrinking step sizes refine the result coarse-to-fine.

pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod metric;
pub mod model;
pub mod progress;
pub mod session;

pub use diagnostics::BundleRenderer;
pub use error::{RegistrationError, Result};
pub use metric::{fiber_distances, EntropyMetric};
pub use model::TransformModel;
pub use progress::{ProgressObserver, TracingProgress};
pub use session::{RegistrationSession, RegistrationSolution, SessionOptions};
