//! Aspect-preserving resize with optional square padding.

// Pixel math on small positive values
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

/// Options for [`resize_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    /// Target length of the longer side.
    pub max_side: u32,
    /// Length the shorter side is scaled to before fitting `max_side`.
    pub min_side: u32,
    /// Exact output size; bypasses the aspect logic when set.
    pub size: Option<(u32, u32)>,
    /// Paste the result centered on a white `max_side` square.
    pub pad_to_max_side: bool,
    /// Output sides are rounded down to a multiple of this.
    pub base: u32,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            max_side: 1280,
            min_side: 1024,
            size: None,
            pad_to_max_side: false,
            base: 64,
        }
    }
}

impl ResizeOptions {
    /// Default options with the given longer-side target.
    #[must_use]
    pub fn with_max_side(max_side: u32) -> Self {
        Self {
            max_side,
            ..Self::default()
        }
    }
}

/// Resizes `image` according to `options`.
///
/// Without an explicit `size`, the shorter side is first scaled to `min_side`
/// and then the longer side to `max_side`. Both sides are then floored to a
/// multiple of `base`, never below `base`. Rounding is half-to-even.
#[must_use]
pub fn resize_image(image: &DynamicImage, options: &ResizeOptions) -> DynamicImage {
    let (width, height) = match options.size {
        Some(size) => size,
        None => fitted_size(image.dimensions(), options),
    };

    let resized = image.resize_exact(width, height, FilterType::Triangle);

    if !options.pad_to_max_side {
        return resized;
    }

    let side = options.max_side;
    let mut canvas = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
    let offset_x = i64::from(side.saturating_sub(width) / 2);
    let offset_y = i64::from(side.saturating_sub(height) / 2);
    imageops::overlay(&mut canvas, &resized.to_rgb8(), offset_x, offset_y);
    DynamicImage::ImageRgb8(canvas)
}

/// Computes the output size for the aspect-preserving path.
fn fitted_size((width, height): (u32, u32), options: &ResizeOptions) -> (u32, u32) {
    let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));

    let ratio = f64::from(options.min_side) / w.min(h);
    let (w, h) = ((ratio * w).round_ties_even(), (ratio * h).round_ties_even());

    let ratio = f64::from(options.max_side) / w.max(h);
    let (w, h) = ((ratio * w).round_ties_even(), (ratio * h).round_ties_even());

    let base = options.base.max(1);
    (floor_to_base(w, base), floor_to_base(h, base))
}

fn floor_to_base(value: f64, base: u32) -> u32 {
    let value = value.max(0.0) as u32;
    ((value / base) * base).max(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_fits_max_side() {
        let img = DynamicImage::new_rgb8(1600, 900);
        let out = resize_image(&img, &ResizeOptions::with_max_side(1024));
        // 1024 wide, 576 tall
        assert_eq!(out.dimensions(), (1024, 576));
    }

    #[test]
    fn test_dimensions_divisible_by_base() {
        for (w, h) in [(640, 480), (333, 777), (1000, 1001), (3000, 2000), (257, 64)] {
            let img = DynamicImage::new_rgb8(w, h);
            let out = resize_image(&img, &ResizeOptions::with_max_side(1024));
            let (ow, oh) = out.dimensions();
            assert_eq!(ow % 64, 0, "width {ow} for {w}x{h}");
            assert_eq!(oh % 64, 0, "height {oh} for {w}x{h}");
            assert!(ow.max(oh) <= 1024);
        }
    }

    #[test]
    fn test_aspect_ratio_preserved_within_rounding() {
        let img = DynamicImage::new_rgb8(800, 1200);
        let out = resize_image(&img, &ResizeOptions::with_max_side(1024));
        let (ow, oh) = out.dimensions();
        assert_eq!(oh, 1024);
        // 1024 * 800 / 1200 = 682.67 -> 640 after flooring to 64
        assert_eq!(ow, 640);
        let original = 800.0 / 1200.0;
        let resized = f64::from(ow) / f64::from(oh);
        assert!((original - resized).abs() < 64.0 / 1024.0);
    }

    #[test]
    fn test_explicit_size() {
        let img = DynamicImage::new_rgb8(100, 100);
        let options = ResizeOptions {
            size: Some((300, 200)),
            ..ResizeOptions::default()
        };
        assert_eq!(resize_image(&img, &options).dimensions(), (300, 200));
    }

    #[test]
    fn test_pad_to_square_is_white_bordered() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([0, 0, 0])));
        let options = ResizeOptions {
            max_side: 512,
            min_side: 256,
            pad_to_max_side: true,
            ..ResizeOptions::default()
        };
        let out = resize_image(&img, &options).to_rgb8();
        assert_eq!(out.dimensions(), (512, 512));

        // Content is 512x256, centered vertically at rows 128..384.
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(511, 127), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(256, 256), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(0, 384), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_degenerate_strip_keeps_one_base() {
        let img = DynamicImage::new_rgb8(4000, 2);
        let out = resize_image(&img, &ResizeOptions::with_max_side(1024));
        assert_eq!(out.dimensions(), (1024, 64));
    }
}
