//! idgen core - domain types, ports and request orchestration
//!
//! This crate holds the request model, the image utilities used to prepare
//! conditioning, the conditioning selector, the seeded generator and the
//! [`Predictor`] that drives a prediction through the collaborator ports.

pub mod conditioning;
pub mod domain;
pub mod error;
pub mod imaging;
pub mod inference;
pub mod ports;
pub mod predict;

pub use conditioning::{CannyExtractor, ConditioningSelector, DepthMapExtractor};
pub use domain::{
    AuxKind, AuxToggle, ConditionKind, ConditioningEntry, ControlInput, FaceRecord,
    GenerationRequest, GenerationResult, PredictionSummary,
};
pub use error::{ConfigurationError, InputValidationError, PredictError};
pub use inference::Generator;
pub use ports::{
    ConditionExtractor, DepthEstimator, DepthMap, DiffusionPipeline, FaceAnalyzer,
    GenerationCall, ImageLoader, NoopProgress, PredictionEvent, ProgressSink, ResultOutput,
    SafetyClassifier,
};
pub use predict::{Collaborators, Prediction, Predictor, SafetyGate};
