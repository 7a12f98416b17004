//! Pure image helpers: resizing, channel order, keypoint overlays.

mod color;
mod keypoints;
mod resize;

pub use color::BgrImage;
pub use keypoints::draw_keypoints;
pub use resize::{resize_image, ResizeOptions};

/// Longest side for face and pose images before detection.
pub const INPUT_MAX_SIDE: u32 = 1024;
