//! Channel-order conversion between RGB images and detector BGR buffers.

use image::{DynamicImage, RgbImage};

/// An 8-bit, three-channel image stored in BGR order.
///
/// Face detectors trained on OpenCV pipelines expect this layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgrImage {
    /// Converts an RGB image to BGR order.
    #[must_use]
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: swap_red_blue(image.as_raw()),
        }
    }

    /// Converts any image to BGR via RGB8.
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb(&image.to_rgb8())
    }

    /// Converts back to an RGB image.
    #[must_use]
    pub fn to_rgb(&self) -> RgbImage {
        // Lengths always agree: `data` is built from a `width * height * 3` buffer.
        RgbImage::from_raw(self.width, self.height, swap_red_blue(&self.data))
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw interleaved BGR bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

fn swap_red_blue(raw: &[u8]) -> Vec<u8> {
    raw.chunks_exact(3)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect()
}
