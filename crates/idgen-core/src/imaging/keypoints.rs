//! Face keypoint overlay used as the IdentityNet conditioning image.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;

/// Keypoint colors, by keypoint index.
const COLORS: [[u8; 3]; 5] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [255, 0, 255],
];

/// Limbs as keypoint index pairs; every limb ends at the nose.
const LIMBS: [(usize, usize); 4] = [(0, 2), (1, 2), (3, 2), (4, 2)];

/// Half thickness of a limb ellipse in pixels.
const STICK_WIDTH: i32 = 4;

/// Radius of a keypoint dot in pixels.
const DOT_RADIUS: i32 = 10;

/// Limbs are drawn at this fraction of full intensity.
const LIMB_INTENSITY: f32 = 0.6;

/// Renders `kps` on a black `width` × `height` canvas.
///
/// Each limb is a filled ellipse between its two keypoints, dimmed to 60%.
/// Each keypoint is then drawn as a full-intensity dot. Only the first five
/// keypoints are used.
#[must_use]
pub fn draw_keypoints(width: u32, height: u32, kps: &[[f32; 2]]) -> DynamicImage {
    let mut canvas = RgbImage::new(width, height);
    let kps = &kps[..kps.len().min(COLORS.len())];

    for &(from, to) in &LIMBS {
        let (Some(a), Some(b)) = (kps.get(from), kps.get(to)) else {
            continue;
        };
        let color = dimmed(COLORS[from]);

        let length = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
        let angle = (a[1] - b[1]).atan2(a[0] - b[0]).to_degrees();
        let center = (
            ((a[0] + b[0]) / 2.0) as i32,
            ((a[1] + b[1]) / 2.0) as i32,
        );
        let polygon = ellipse_polygon(center, ((length / 2.0) as i32, STICK_WIDTH), angle as i32);

        if polygon.len() >= 3 {
            draw_polygon_mut(&mut canvas, &polygon, Rgb(color));
        }
    }

    for (kp, color) in kps.iter().zip(COLORS) {
        draw_filled_circle_mut(
            &mut canvas,
            (kp[0] as i32, kp[1] as i32),
            DOT_RADIUS,
            Rgb(color),
        );
    }

    DynamicImage::ImageRgb8(canvas)
}

fn dimmed(color: [u8; 3]) -> [u8; 3] {
    color.map(|c| (f32::from(c) * LIMB_INTENSITY) as u8)
}

/// Approximates a rotated ellipse with one vertex per degree.
///
/// Consecutive duplicates are dropped, and so is a closing vertex equal to
/// the first one, as `draw_polygon_mut` requires an open polygon.
fn ellipse_polygon(center: (i32, i32), axes: (i32, i32), angle_deg: i32) -> Vec<Point<i32>> {
    let (sin_a, cos_a) = (angle_deg as f32).to_radians().sin_cos();
    let (cx, cy) = (center.0 as f32, center.1 as f32);
    let (ax, ay) = (axes.0 as f32, axes.1 as f32);

    let mut points: Vec<Point<i32>> = Vec::with_capacity(360);
    for deg in 0..360_u16 {
        let (sin_t, cos_t) = f32::from(deg).to_radians().sin_cos();
        let x = ax * cos_t;
        let y = ay * sin_t;
        let point = Point::new(
            (cx + x * cos_a - y * sin_a).round() as i32,
            (cy + x * sin_a + y * cos_a).round() as i32,
        );
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}
