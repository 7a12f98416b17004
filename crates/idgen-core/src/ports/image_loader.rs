//! Image loading port.

use image::DynamicImage;

/// Port for loading request images from a path or URI.
pub trait ImageLoader: Send + Sync {
    /// Loads the image at `location` as RGB.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be fetched or decoded.
    fn load(&self, location: &str) -> anyhow::Result<DynamicImage>;
}
