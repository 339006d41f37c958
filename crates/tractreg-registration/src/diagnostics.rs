//! Optional rendering hooks for visual inspection of inputs.

use std::path::Path;

use tractreg_core::Bundle;

/// Renders a bundle into an output directory for later inspection.
///
/// Implementations live outside this crate. The session only ever calls
/// [`BundleRenderer::render`] and never reads anything back; rendering
/// failures are the implementation's concern.
pub trait BundleRenderer {
    /// Write a picture of `bundle` under `output_directory`, using `prefix`
    /// in generated file names.
    fn render(&self, bundle: &Bundle, output_directory: &Path, prefix: &str);
}
