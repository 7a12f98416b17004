//! Test support utilities for idgen.
//!
//! Provides mocks for every core port plus builders for synthetic images and
//! face records, so the predictor can be exercised without model weights.
//!
//! # Example
//!
//! ```
//! use idgen_test_support::{FaceRecordBuilder, MockFaceAnalyzer, SyntheticImageBuilder};
//!
//! let photo = SyntheticImageBuilder::portrait(320, 400);
//! let face = FaceRecordBuilder::new().bbox([80.0, 100.0, 240.0, 300.0]).build();
//! let analyzer = MockFaceAnalyzer::returning(vec![face]);
//! # let _ = (photo, analyzer);
//! ```

mod builders;
mod mocks;

pub use builders::{FaceRecordBuilder, SyntheticImageBuilder};
pub use mocks::{
    DetectCall, MockDepthEstimator, MockExtractor, MockFaceAnalyzer, MockImageLoader,
    MockPipeline, MockProgressSink, MockResultOutput, MockSafetyClassifier, PipelineCall,
};
