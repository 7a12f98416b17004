//! Result output port for persisting the generated image.

use std::path::PathBuf;

use crate::domain::GenerationResult;

/// Port for persisting prediction output.
pub trait ResultOutput: Send + Sync {
    /// Writes the result image, replacing any earlier one.
    ///
    /// # Returns
    ///
    /// The location the image was written to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn persist(&self, result: &GenerationResult) -> anyhow::Result<PathBuf>;
}
