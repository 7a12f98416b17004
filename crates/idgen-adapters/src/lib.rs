//! idgen adapters - concrete implementations of the core ports.
//!
//! This crate provides adapters for:
//! - Loading request images from disk or over HTTP
//! - Writing the result image
//! - Locating and verifying model weights
//! - Talking to a model server that hosts the networks

pub mod fs;
pub mod http;
pub mod models;

pub use fs::{FileResultOutput, FsImageLoader, DEFAULT_OUTPUT_PATH};
pub use http::{HttpBackend, DEFAULT_TIMEOUT_SECS};
pub use models::{
    list_models, model_path, models_dir, verify_model, verify_models, ModelInfo,
    DEFAULT_MODELS_DIR, MODELS,
};
