//! Depth-map conditioning built on a raw depth estimator.

// Pixel math on small positive values
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{ensure, Context};
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::ports::{ConditionExtractor, DepthEstimator, DepthMap};

/// Turns a [`DepthEstimator`] prediction into an 8-bit depth image.
pub struct DepthMapExtractor {
    estimator: Box<dyn DepthEstimator>,
}

impl DepthMapExtractor {
    /// Wraps `estimator`.
    #[must_use]
    pub fn new(estimator: Box<dyn DepthEstimator>) -> Self {
        Self { estimator }
    }
}

impl std::fmt::Debug for DepthMapExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthMapExtractor").finish_non_exhaustive()
    }
}

impl ConditionExtractor for DepthMapExtractor {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn extract(&self, image: &DynamicImage) -> anyhow::Result<DynamicImage> {
        let depth = self
            .estimator
            .estimate(image)
            .context("depth estimation failed")?;
        let (width, height) = image.dimensions();
        let map = normalize_depth(&depth, width, height)?;
        Ok(DynamicImage::ImageLuma8(map))
    }
}

/// Rescales `depth` bilinearly to `width` × `height` and min-max normalizes
/// it to `0..=255`.
///
/// A constant map normalizes to all zeros.
///
/// # Errors
///
/// Returns an error if the value count does not match the map dimensions.
pub fn normalize_depth(depth: &DepthMap, width: u32, height: u32) -> anyhow::Result<GrayImage> {
    ensure!(
        depth.width > 0 && depth.height > 0,
        "depth map is empty ({}x{})",
        depth.width,
        depth.height
    );
    let expected = depth.width as usize * depth.height as usize;
    ensure!(
        depth.values.len() == expected,
        "depth map has {} values, expected {}x{}",
        depth.values.len(),
        depth.width,
        depth.height
    );

    let scaled = bilinear(depth, width, height);
    let (min, max) = scaled
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    debug!(min, max, "Normalizing depth map");

    Ok(GrayImage::from_fn(width, height, |x, y| {
        if range > 0.0 {
            let value = (scaled[(y * width + x) as usize] - min) / range * 255.0;
            Luma([value.clamp(0.0, 255.0) as u8])
        } else {
            Luma([0])
        }
    }))
}

/// Half-pixel-centered bilinear resampling, row-major.
fn bilinear(depth: &DepthMap, width: u32, height: u32) -> Vec<f32> {
    let (src_w, src_h) = (depth.width as usize, depth.height as usize);
    let scale_x = src_w as f32 / width.max(1) as f32;
    let scale_y = src_h as f32 / height.max(1) as f32;
    let at = |x: usize, y: usize| depth.values[y * src_w + x];

    let mut out = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (src_h - 1) as f32);
        let (y0, fy) = (sy.floor() as usize, sy.fract());
        let y1 = (y0 + 1).min(src_h - 1);
        for x in 0..width {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (src_w - 1) as f32);
            let (x0, fx) = (sx.floor() as usize, sx.fract());
            let x1 = (x0 + 1).min(src_w - 1);
            let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
            let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
            out.push(top * (1.0 - fy) + bottom * fy);
        }
    }
    out
}
