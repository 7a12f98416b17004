//! Core domain types for identity-preserving generation.

mod conditioning;
mod face;
mod request;
mod result;

pub use conditioning::{
    AuxKind, ConditionKind, ConditioningEntry, ControlInput, IDENTITYNET_MODEL,
};
pub use face::{largest_face, last_face, FaceRecord};
pub use request::{limits, AuxToggle, GenerationRequest, MAX_SEED};
pub use result::{GenerationResult, PredictionSummary};
