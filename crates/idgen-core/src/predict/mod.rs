//! Prediction orchestration and the output safety gate.

mod predictor;
mod safety;

pub use predictor::{Collaborators, Prediction, Predictor, DEFAULT_DET_SIZE};
pub use safety::{placeholder, SafetyGate, Screened, NSFW_MESSAGE};
