//! Prediction result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output of one prediction, before it is persisted.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Final image: the generated one, or the black placeholder.
    pub image: image::DynamicImage,
    /// Whether the safety classifier flagged the generated image.
    pub nsfw: bool,
    /// Seed the generator was seeded with.
    pub seed: u32,
    /// Generation width in pixels.
    pub width: u32,
    /// Generation height in pixels.
    pub height: u32,
}

/// Machine-readable summary of a persisted prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSummary {
    /// Where the image was written.
    pub path: PathBuf,
    /// Seed used.
    pub seed: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the output was redacted.
    pub nsfw: bool,
    /// Completion time (RFC 3339).
    pub timestamp: String,
}

impl PredictionSummary {
    /// Summarizes `result` persisted at `path`.
    #[must_use]
    pub fn new(result: &GenerationResult, path: PathBuf, timestamp: String) -> Self {
        Self {
            path,
            seed: result.seed,
            width: result.width,
            height: result.height,
            nsfw: result.nsfw,
            timestamp,
        }
    }
}
