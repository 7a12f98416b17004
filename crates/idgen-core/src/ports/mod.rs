//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the orchestration core and the
//! model backends, image sources and output sinks that adapters provide.

mod extractor;
mod face_analyzer;
mod image_loader;
mod pipeline;
mod progress;
mod result_output;
mod safety;

pub use extractor::{ConditionExtractor, DepthEstimator, DepthMap};
pub use face_analyzer::FaceAnalyzer;
pub use image_loader::ImageLoader;
pub use pipeline::{DiffusionPipeline, GenerationCall};
pub use progress::{NoopProgress, PredictionEvent, ProgressSink};
pub use result_output::ResultOutput;
pub use safety::SafetyClassifier;
