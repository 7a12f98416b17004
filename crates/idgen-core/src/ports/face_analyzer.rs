//! Face analysis port.

use crate::domain::FaceRecord;
use crate::imaging::BgrImage;

/// Port for the face detection and recognition model.
pub trait FaceAnalyzer: Send + Sync {
    /// Detects every face in `image`.
    ///
    /// # Arguments
    ///
    /// * `image` - The image to analyze, in BGR channel order
    /// * `det_size` - Detector input size `(width, height)` for this call
    ///
    /// # Returns
    ///
    /// Faces in detection order, with coordinates in `image` pixels. Empty
    /// when no face is found.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be run.
    fn detect(&self, image: &BgrImage, det_size: (u32, u32)) -> anyhow::Result<Vec<FaceRecord>>;
}
