//! Progress reporting port for UI integration.

use crate::domain::AuxKind;

/// Events emitted as a prediction moves through its stages.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionEvent {
    /// Request accepted and validated.
    Started {
        /// Location of the face image.
        face_image: String,
    },
    /// The primary face was found.
    FaceDetected {
        /// Number of faces the detector returned.
        faces: usize,
    },
    /// Keypoints and size were taken from the reference pose image.
    PoseReferenceApplied,
    /// Conditioning images are ready.
    Conditioned {
        /// Auxiliary kinds in application order.
        selected: Vec<AuxKind>,
        /// Generation width.
        width: u32,
        /// Generation height.
        height: u32,
    },
    /// The pipeline returned an image.
    Generated {
        /// Seed the generator was seeded with.
        seed: u32,
    },
    /// The safety gate ran.
    SafetyChecked {
        /// Whether the image was replaced by the placeholder.
        nsfw: bool,
    },
    /// The result was written.
    Done {
        /// Where the image was written.
        path: std::path::PathBuf,
    },
    /// The prediction stopped with an error.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

impl PredictionEvent {
    /// Short label for the stage the event closes.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::FaceDetected { .. } => "face detected",
            Self::PoseReferenceApplied => "pose reference applied",
            Self::Conditioned { .. } => "conditioned",
            Self::Generated { .. } => "generated",
            Self::SafetyChecked { .. } => "safety checked",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: PredictionEvent);
}

/// A sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_event(&self, _event: PredictionEvent) {}
}
