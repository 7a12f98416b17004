//! Safety classifier port.

use image::DynamicImage;

/// Port for the NSFW content classifier.
pub trait SafetyClassifier: Send + Sync {
    /// Classifies each image.
    ///
    /// # Returns
    ///
    /// One flag per input image, `true` when the image is flagged.
    ///
    /// # Errors
    ///
    /// Returns an error if classification fails.
    fn check(&self, images: &[DynamicImage]) -> anyhow::Result<Vec<bool>>;
}
