//! Detected face records.

use serde::{Deserialize, Serialize};

/// A single face found by the face analyzer.
///
/// Coordinates are in pixels of the image that was passed to the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Bounding box `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
    /// Identity embedding produced by the recognition network.
    pub embedding: Vec<f32>,
    /// Facial keypoints `[x, y]`: left eye, right eye, nose, left and right mouth corner.
    pub kps: Vec<[f32; 2]>,
}

impl FaceRecord {
    /// Ranking key used to choose the primary face.
    ///
    /// Evaluates `(x2 - x1) * y2 - y1`. This is not the box area; the ranking
    /// must stay exactly this so that face choice matches the reference model.
    #[must_use]
    pub fn ranking_key(&self) -> f32 {
        let [x1, y1, x2, y2] = self.bbox;
        (x2 - x1) * y2 - y1
    }
}

/// Picks the face with the greatest [`FaceRecord::ranking_key`].
///
/// On equal keys the later detection wins.
#[must_use]
pub fn largest_face(faces: &[FaceRecord]) -> Option<&FaceRecord> {
    // `max_by` yields the last of several equal maxima.
    faces
        .iter()
        .max_by(|a, b| a.ranking_key().total_cmp(&b.ranking_key()))
}

/// Picks the last detected face, as done for reference pose images.
#[must_use]
pub fn last_face(faces: &[FaceRecord]) -> Option<&FaceRecord> {
    faces.last()
}
