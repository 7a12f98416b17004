//! Conditioning extractor ports.

use image::DynamicImage;

/// Port for deriving a structural conditioning image from a source image.
pub trait ConditionExtractor: Send + Sync {
    /// Returns the name of this extractor.
    fn name(&self) -> &'static str;

    /// Derives the conditioning image for `image`.
    ///
    /// The output size need not match the input; callers resize it.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails.
    fn extract(&self, image: &DynamicImage) -> anyhow::Result<DynamicImage>;
}

/// Raw relative depth predicted by a depth network.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    /// Width of the prediction grid.
    pub width: u32,
    /// Height of the prediction grid.
    pub height: u32,
    /// Row-major depth values, `width * height` long.
    pub values: Vec<f32>,
}

/// Port for the monocular depth estimation model.
pub trait DepthEstimator: Send + Sync {
    /// Predicts relative depth for `image`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be run.
    fn estimate(&self, image: &DynamicImage) -> anyhow::Result<DepthMap>;
}
