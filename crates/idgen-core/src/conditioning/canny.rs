//! Edge-map conditioning.

use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;

use crate::ports::ConditionExtractor;

/// Hysteresis thresholds for the Canny detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyConfig {
    /// Weak-edge threshold.
    pub low_threshold: f32,
    /// Strong-edge threshold.
    pub high_threshold: f32,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            low_threshold: 100.0,
            high_threshold: 200.0,
        }
    }
}

/// Produces a white-on-black edge map.
///
/// Edges are found on the luma of the image, so a boundary between two
/// colors of equal brightness produces no edge.
#[derive(Debug, Clone, Default)]
pub struct CannyExtractor {
    config: CannyConfig,
}

impl CannyExtractor {
    /// Creates an extractor with the given thresholds.
    #[must_use]
    pub const fn new(config: CannyConfig) -> Self {
        Self { config }
    }

    /// Runs Canny on an already-grayscale image.
    #[must_use]
    pub fn edges(&self, gray: &GrayImage) -> GrayImage {
        canny(gray, self.config.low_threshold, self.config.high_threshold)
    }
}

impl ConditionExtractor for CannyExtractor {
    fn name(&self) -> &'static str {
        "canny"
    }

    fn extract(&self, image: &DynamicImage) -> anyhow::Result<DynamicImage> {
        let edges = self.edges(&image.to_luma8());
        // Three identical channels, as the ControlNet was trained on.
        Ok(DynamicImage::ImageLuma8(edges).into_rgb8().into())
    }
}
