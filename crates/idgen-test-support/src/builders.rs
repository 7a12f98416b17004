//! Synthetic images and face records for testing.

use idgen_core::FaceRecord;
use image::{DynamicImage, Rgb, RgbImage};

/// Builder for creating synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates a single-color RGB image.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    /// Creates a light background with a darker centered ellipse.
    ///
    /// Stands in for a face photo wherever only size and some structure matter.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn portrait(width: u32, height: u32) -> DynamicImage {
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let (rx, ry) = (width as f32 / 4.0, height as f32 / 3.0);
        let img = RgbImage::from_fn(width, height, |x, y| {
            let dx = (x as f32 - cx) / rx.max(1.0);
            let dy = (y as f32 - cy) / ry.max(1.0);
            if dx * dx + dy * dy <= 1.0 {
                Rgb([180, 130, 110])
            } else {
                Rgb([235, 235, 230])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Creates a high-contrast checkerboard with `cell` pixel squares.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell: u32) -> DynamicImage {
        let cell = cell.max(1);
        let img = RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }
}

/// Builder for [`FaceRecord`] fixtures.
#[derive(Debug, Clone)]
pub struct FaceRecordBuilder {
    bbox: [f32; 4],
    embedding: Vec<f32>,
    kps: Option<Vec<[f32; 2]>>,
}

impl Default for FaceRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceRecordBuilder {
    /// Starts from a 100×100 box at (50, 50) with a 512-long zero embedding.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bbox: [50.0, 50.0, 150.0, 150.0],
            embedding: vec![0.0; 512],
            kps: None,
        }
    }

    /// Sets the bounding box `[x1, y1, x2, y2]`.
    #[must_use]
    pub const fn bbox(mut self, bbox: [f32; 4]) -> Self {
        self.bbox = bbox;
        self
    }

    /// Sets the embedding.
    #[must_use]
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Fills the embedding with `value`, keeping its length.
    #[must_use]
    pub fn tagged(mut self, value: f32) -> Self {
        self.embedding.iter_mut().for_each(|v| *v = value);
        self
    }

    /// Sets explicit keypoints.
    #[must_use]
    pub fn kps(mut self, kps: Vec<[f32; 2]>) -> Self {
        self.kps = Some(kps);
        self
    }

    /// Builds the record. Without explicit keypoints, five are laid out
    /// inside the box: eyes, nose, mouth corners.
    #[must_use]
    pub fn build(self) -> FaceRecord {
        let [x1, y1, x2, y2] = self.bbox;
        let (w, h) = (x2 - x1, y2 - y1);
        let kps = self.kps.unwrap_or_else(|| {
            vec![
                [x1 + 0.3 * w, y1 + 0.35 * h],
                [x1 + 0.7 * w, y1 + 0.35 * h],
                [x1 + 0.5 * w, y1 + 0.55 * h],
                [x1 + 0.35 * w, y1 + 0.75 * h],
                [x1 + 0.65 * w, y1 + 0.75 * h],
            ]
        });
        FaceRecord {
            bbox: self.bbox,
            embedding: self.embedding,
            kps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_portrait_has_center_and_background() {
        let img = SyntheticImageBuilder::portrait(100, 120).to_rgb8();
        assert_eq!(img.get_pixel(50, 60).0, [180, 130, 110]);
        assert_eq!(img.get_pixel(0, 0).0, [235, 235, 230]);
    }

    #[test]
    fn test_checkerboard_pattern() {
        let img = SyntheticImageBuilder::checkerboard(16, 16, 8).to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(8, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(8, 8).0, [255, 255, 255]);
    }

    #[test]
    fn test_solid_dimensions() {
        let img = SyntheticImageBuilder::solid(30, 20, [1, 2, 3]);
        assert_eq!(img.dimensions(), (30, 20));
    }

    #[test]
    fn test_default_keypoints_inside_box() {
        let face = FaceRecordBuilder::new().bbox([10.0, 20.0, 110.0, 220.0]).build();
        assert_eq!(face.kps.len(), 5);
        for [x, y] in &face.kps {
            assert!((10.0..=110.0).contains(x));
            assert!((20.0..=220.0).contains(y));
        }
    }

    #[test]
    fn test_tagged_embedding() {
        let face = FaceRecordBuilder::new().tagged(0.5).build();
        assert_eq!(face.embedding.len(), 512);
        assert!(face.embedding.iter().all(|v| (*v - 0.5).abs() < f32::EPSILON));
    }
}
