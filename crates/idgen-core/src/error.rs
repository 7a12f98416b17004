//! Error taxonomy for predictions.
//!
//! Every error is terminal for the current request. Nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

/// The caller supplied something the request cannot be served with.
#[derive(Debug, Error)]
pub enum InputValidationError {
    /// The request names no face image.
    #[error("No face image specified.")]
    MissingFaceImage,

    /// No face was found in the primary face image.
    #[error(
        "Unable to detect your face in the photo. Please upload a different photo with a clear face."
    )]
    NoFaceInFaceImage,

    /// No face was found in the reference pose image.
    #[error(
        "Unable to detect a face in the reference image. Please upload another person's image."
    )]
    NoFaceInPoseImage,

    /// A numeric parameter is outside its accepted range.
    #[error("{field} must be in {min}..={max}, got {value}")]
    OutOfRange {
        /// Parameter name.
        field: &'static str,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
        /// Offending value.
        value: f64,
    },
}

/// The process is not set up to serve requests.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required weights file does not exist.
    #[error("model weights for '{name}' not found at {}", path.display())]
    MissingWeights {
        /// Registry name of the model.
        name: String,
        /// Expected location.
        path: PathBuf,
    },

    /// A weights file exists but cannot be read or parsed.
    #[error("model weights for '{name}' at {} are unreadable: {reason}", path.display())]
    UnreadableWeights {
        /// Registry name of the model.
        name: String,
        /// Location of the file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The inference backend URL cannot be used.
    #[error("invalid backend url '{url}': {reason}")]
    InvalidBackendUrl {
        /// The configured URL.
        url: String,
        /// What went wrong.
        reason: String,
    },
}

/// Failure of a single prediction.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Input could not be used.
    #[error(transparent)]
    Input(#[from] InputValidationError),

    /// Setup problem surfaced during the call.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// An external collaborator failed.
    #[error("{stage} failed")]
    Collaborator {
        /// Stage in which the failure happened.
        stage: &'static str,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },
}

impl PredictError {
    pub(crate) fn collaborator(stage: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::Collaborator { stage, source }
    }

    /// Returns true if the error was caused by the request's input.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
