//! Conditioning extractors and the selector that orders them.

mod canny;
mod depth;
mod selector;

pub use canny::{CannyConfig, CannyExtractor};
pub use depth::{normalize_depth, DepthMapExtractor};
pub use selector::{Conditioning, ConditioningSelector};
