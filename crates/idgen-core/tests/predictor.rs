//! Predictor integration tests against mocked collaborators.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::missing_panics_doc)]

use idgen_core::domain::IDENTITYNET_MODEL;
use idgen_core::predict::DEFAULT_DET_SIZE;
use idgen_core::{
    AuxKind, CannyExtractor, Collaborators, ConditioningSelector, DepthMapExtractor,
    GenerationRequest, PredictError, Predictor, SafetyGate,
};
use idgen_test_support::{
    FaceRecordBuilder, MockDepthEstimator, MockExtractor, MockFaceAnalyzer, MockImageLoader,
    MockPipeline, MockProgressSink, MockResultOutput, MockSafetyClassifier,
    SyntheticImageBuilder,
};
use image::GenericImageView;

/// Face photo 800x1000 fits to 768x1024.
const FACE_SIZE: (u32, u32) = (768, 1024);
/// Pose photo 1200x800 fits to 1024x640.
const POSE_SIZE: (u32, u32) = (1024, 640);

struct Harness {
    loader: MockImageLoader,
    faces: MockFaceAnalyzer,
    pose: MockExtractor,
    depth: MockDepthEstimator,
    pipeline: MockPipeline,
    safety: MockSafetyClassifier,
    output: MockResultOutput,
    progress: MockProgressSink,
}

impl Harness {
    fn new(faces: MockFaceAnalyzer) -> Self {
        let loader = MockImageLoader::new()
            .with_image("face.jpg", SyntheticImageBuilder::portrait(800, 1000))
            .with_image("pose.jpg", SyntheticImageBuilder::portrait(1200, 800));
        Self {
            loader,
            faces,
            pose: MockExtractor::new("pose", [0, 255, 0]).with_size(100, 100),
            depth: MockDepthEstimator::default(),
            pipeline: MockPipeline::new(),
            safety: MockSafetyClassifier::clean(),
            output: MockResultOutput::new(),
            progress: MockProgressSink::new(),
        }
    }

    fn with_one_face() -> Self {
        Self::new(MockFaceAnalyzer::returning(vec![FaceRecordBuilder::new()
            .bbox([200.0, 300.0, 560.0, 760.0])
            .tagged(0.25)
            .build()]))
    }

    fn predictor(&self) -> Predictor {
        Predictor::new(Collaborators {
            loader: Box::new(self.loader.clone()),
            faces: Box::new(self.faces.clone()),
            selector: ConditioningSelector::new(
                Box::new(self.pose.clone()),
                CannyExtractor::default(),
                DepthMapExtractor::new(Box::new(self.depth.clone())),
            ),
            pipeline: Box::new(self.pipeline.clone()),
            safety: SafetyGate::new(Box::new(self.safety.clone())),
            output: Box::new(self.output.clone()),
        })
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::new("face.jpg").with_seed(42)
}

// === Sizing ===

#[test]
fn test_output_size_follows_face_image() {
    let h = Harness::with_one_face();
    let prediction = h.predictor().predict(&request(), &h.progress).unwrap();

    assert_eq!(
        (prediction.result.width, prediction.result.height),
        FACE_SIZE
    );
    assert_eq!(prediction.result.image.dimensions(), FACE_SIZE);
    let call = h.pipeline.last_call().unwrap();
    assert_eq!(call.size, FACE_SIZE);
}

#[test]
fn test_pose_image_controls_size_and_keeps_primary_embedding() {
    let h = Harness::new(MockFaceAnalyzer::sequence(vec![
        vec![FaceRecordBuilder::new().tagged(0.25).build()],
        vec![FaceRecordBuilder::new().tagged(0.75).build()],
    ]));
    let req = request().with_pose_image("pose.jpg");
    let prediction = h.predictor().predict(&req, &h.progress).unwrap();

    assert_eq!(prediction.result.image.dimensions(), POSE_SIZE);
    let call = h.pipeline.last_call().unwrap();
    assert_eq!(call.size, POSE_SIZE);
    assert!(call.image_embeds.iter().all(|v| *v == 0.25));
    assert_eq!(h.loader.requests(), vec!["face.jpg", "pose.jpg"]);
}

#[test]
fn test_every_conditioning_image_matches_output_size() {
    let h = Harness::with_one_face();
    let mut req = request().with_pose_image("pose.jpg");
    req.pose.enabled = true;
    req.canny.enabled = true;
    req.depth.enabled = true;
    h.predictor().predict(&req, &h.progress).unwrap();

    let call = h.pipeline.last_call().unwrap();
    assert_eq!(call.image_sizes, vec![POSE_SIZE; 4]);
}

// === Conditioning selection ===

#[test]
fn test_no_aux_is_single_mode() {
    let h = Harness::with_one_face();
    h.predictor().predict(&request(), &h.progress).unwrap();

    let call = h.pipeline.last_call().unwrap();
    assert!(!call.multi);
    assert_eq!(call.models, vec![IDENTITYNET_MODEL]);
    assert_eq!(call.scales, vec![0.8]);
    assert_eq!(h.pose.call_count(), 0);
    assert_eq!(h.depth.call_count(), 0);
}

#[test]
fn test_all_aux_is_multi_mode_with_identity_first() {
    let h = Harness::with_one_face();
    let mut req = request();
    req.identitynet_strength_ratio = 0.7;
    req.pose.enabled = true;
    req.pose.strength = 1.0;
    req.canny.enabled = true;
    req.canny.strength = 0.3;
    req.depth.enabled = true;
    req.depth.strength = 1.5;
    h.predictor().predict(&req, &h.progress).unwrap();

    let call = h.pipeline.last_call().unwrap();
    assert!(call.multi);
    assert_eq!(
        call.models,
        vec![
            IDENTITYNET_MODEL,
            AuxKind::Pose.model(),
            AuxKind::Canny.model(),
            AuxKind::Depth.model(),
        ]
    );
    assert_eq!(call.scales, vec![0.7, 1.0, 0.3, 1.5]);
    assert_eq!(h.pose.call_count(), 1);
    assert_eq!(h.depth.call_count(), 1);
}

#[test]
fn test_subset_yields_k_plus_one_entries() {
    let h = Harness::with_one_face();
    let mut req = request();
    req.depth.enabled = true;
    h.predictor().predict(&req, &h.progress).unwrap();

    let call = h.pipeline.last_call().unwrap();
    assert_eq!(call.models, vec![IDENTITYNET_MODEL, AuxKind::Depth.model()]);
}

#[test]
fn test_generation_parameters_forwarded() {
    let h = Harness::with_one_face();
    let mut req = request().with_prompt("a knight in armor");
    req.negative_prompt = "blurry".to_string();
    req.adapter_strength_ratio = 0.4;
    req.num_steps = 12;
    req.guidance_scale = 2.5;
    h.predictor().predict(&req, &h.progress).unwrap();

    let call = h.pipeline.last_call().unwrap();
    assert_eq!(call.prompt, "a knight in armor");
    assert_eq!(call.negative_prompt, "blurry");
    assert_eq!(call.ip_adapter_scale, 0.4);
    assert_eq!(call.num_inference_steps, 12);
    assert_eq!(call.guidance_scale, 2.5);
}

// === Face selection ===

#[test]
fn test_primary_face_uses_ranking_key() {
    // Key 100 * 100 - 0 = 10000 for the big face high in the frame,
    // 60 * 400 - 300 = 23700 for the small face lower down.
    let big_high = FaceRecordBuilder::new()
        .bbox([0.0, 0.0, 100.0, 100.0])
        .tagged(1.0)
        .build();
    let small_low = FaceRecordBuilder::new()
        .bbox([200.0, 300.0, 260.0, 400.0])
        .tagged(2.0)
        .build();
    let h = Harness::new(MockFaceAnalyzer::returning(vec![big_high, small_low]));
    h.predictor().predict(&request(), &h.progress).unwrap();

    let call = h.pipeline.last_call().unwrap();
    assert!(call.image_embeds.iter().all(|v| *v == 2.0));
}

#[test]
fn test_pose_reference_uses_last_face() {
    let first = FaceRecordBuilder::new()
        .bbox([50.0, 50.0, 350.0, 450.0])
        .build();
    let last = FaceRecordBuilder::new()
        .bbox([600.0, 100.0, 900.0, 500.0])
        .build();
    let h = Harness::new(MockFaceAnalyzer::sequence(vec![
        vec![FaceRecordBuilder::new().build()],
        vec![first, last],
    ]));
    let req = request().with_pose_image("pose.jpg");
    h.predictor().predict(&req, &h.progress).unwrap();

    let identity = h.pipeline.last_call().unwrap().identity.to_rgb8();
    // Nose keypoints: (750, 320) for the last face, (200, 270) for the first.
    assert_eq!(identity.get_pixel(750, 320).0, [0, 0, 255]);
    assert_eq!(identity.get_pixel(200, 270).0, [0, 0, 0]);
}

// === Detector size ===

#[test]
fn test_detector_size_follows_request() {
    let h = Harness::with_one_face();
    let mut predictor = h.predictor();
    assert_eq!(predictor.det_size(), DEFAULT_DET_SIZE);

    let mut req = request().with_pose_image("pose.jpg");
    req.width = 1024;
    req.height = 768;
    predictor.predict(&req, &h.progress).unwrap();

    assert_eq!(predictor.det_size(), (1024, 768));
    let calls = h.faces.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.det_size == (1024, 768)));
    assert_eq!((calls[0].width, calls[0].height), FACE_SIZE);
    assert_eq!((calls[1].width, calls[1].height), POSE_SIZE);
}

// === Seeds ===

#[test]
fn test_fixed_seed_is_reproducible() {
    let h = Harness::with_one_face();
    let mut predictor = h.predictor();
    let a = predictor.predict(&request(), &h.progress).unwrap();
    let b = predictor.predict(&request(), &h.progress).unwrap();

    assert_eq!(a.result.seed, 42);
    assert_eq!(b.result.seed, 42);
    assert_eq!(a.result.image, b.result.image);
}

#[test]
fn test_seed_zero_draws_fresh_seed_each_call() {
    let h = Harness::with_one_face();
    let mut predictor = h.predictor();
    let req = GenerationRequest::new("face.jpg").with_seed(0);

    let first = predictor.predict(&req, &h.progress).unwrap().result.seed;
    assert_eq!(h.pipeline.last_call().unwrap().seed, first);
    let second = predictor.predict(&req, &h.progress).unwrap().result.seed;
    assert_eq!(h.pipeline.last_call().unwrap().seed, second);

    assert!((1..=idgen_core::domain::MAX_SEED).contains(&first));
    assert!((1..=idgen_core::domain::MAX_SEED).contains(&second));
    assert_ne!(first, second);
}

#[test]
fn test_unset_seed_draws_fresh_seed_each_call() {
    let h = Harness::with_one_face();
    let mut predictor = h.predictor();
    let req = GenerationRequest::new("face.jpg");
    assert!(req.seed.is_none());

    let first = predictor.predict(&req, &h.progress).unwrap().result.seed;
    let second = predictor.predict(&req, &h.progress).unwrap().result.seed;

    assert!((1..=idgen_core::domain::MAX_SEED).contains(&first));
    assert_ne!(first, second);
    assert_eq!(h.pipeline.calls().len(), 2);
}

// === Safety gate ===

#[test]
fn test_flagged_output_replaced_by_placeholder() {
    let mut h = Harness::with_one_face();
    h.safety = MockSafetyClassifier::flagging();
    let prediction = h.predictor().predict(&request(), &h.progress).unwrap();

    assert!(prediction.result.nsfw);
    let image = prediction.result.image.to_rgb8();
    assert_eq!(image.dimensions(), FACE_SIZE);
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    assert_eq!(h.safety.call_count(), 1);

    let persisted = h.output.results();
    assert_eq!(persisted.len(), 1);
    assert!(persisted[0].nsfw);
}

#[test]
fn test_clean_output_passes_through() {
    let h = Harness::with_one_face();
    let prediction = h.predictor().predict(&request(), &h.progress).unwrap();

    assert!(!prediction.result.nsfw);
    let image = prediction.result.image.to_rgb8();
    assert!(image.pixels().any(|p| p.0 != [0, 0, 0]));
}

#[test]
fn test_disabled_safety_checker_skips_classifier() {
    let mut h = Harness::with_one_face();
    h.safety = MockSafetyClassifier::flagging();
    let mut req = request();
    req.safety_checker = false;
    let prediction = h.predictor().predict(&req, &h.progress).unwrap();

    assert!(!prediction.result.nsfw);
    assert_eq!(h.safety.call_count(), 0);
}

// === Failures ===

#[test]
fn test_no_face_in_face_image() {
    let h = Harness::new(MockFaceAnalyzer::empty());
    let err = h.predictor().predict(&request(), &h.progress).unwrap_err();

    assert!(err.is_input_error());
    assert!(err.to_string().contains("your face in the photo"));
    assert!(h.pipeline.calls().is_empty());
    assert!(h.output.results().is_empty());
    assert!(h.progress.has_failed());
}

#[test]
fn test_no_face_in_pose_image() {
    let h = Harness::new(MockFaceAnalyzer::sequence(vec![
        vec![FaceRecordBuilder::new().build()],
        Vec::new(),
    ]));
    let req = request().with_pose_image("pose.jpg");
    let err = h.predictor().predict(&req, &h.progress).unwrap_err();

    assert!(err.is_input_error());
    assert!(err.to_string().contains("reference image"));
    assert!(h.pipeline.calls().is_empty());
}

#[test]
fn test_out_of_range_rejected_before_loading() {
    let h = Harness::with_one_face();
    let mut req = request();
    req.num_steps = 31;
    let err = h.predictor().predict(&req, &h.progress).unwrap_err();

    assert!(err.is_input_error());
    assert!(h.loader.requests().is_empty());
}

#[test]
fn test_missing_image_is_collaborator_error() {
    let h = Harness::with_one_face();
    let req = GenerationRequest::new("missing.jpg");
    let err = h.predictor().predict(&req, &h.progress).unwrap_err();

    assert!(matches!(
        err,
        PredictError::Collaborator {
            stage: "image loading",
            ..
        }
    ));
}

#[test]
fn test_extractor_failure_is_collaborator_error() {
    let mut h = Harness::with_one_face();
    h.pose = MockExtractor::failing("pose");
    let mut req = request();
    req.pose.enabled = true;
    let err = h.predictor().predict(&req, &h.progress).unwrap_err();

    assert!(matches!(
        err,
        PredictError::Collaborator {
            stage: "conditioning",
            ..
        }
    ));
    assert!(h.pipeline.calls().is_empty());
}

#[test]
fn test_pipeline_size_mismatch_is_error() {
    let mut h = Harness::with_one_face();
    h.pipeline = MockPipeline::new().with_output_size(64, 64);
    let err = h.predictor().predict(&request(), &h.progress).unwrap_err();

    assert!(matches!(
        err,
        PredictError::Collaborator {
            stage: "generation",
            ..
        }
    ));
    assert!(h.output.results().is_empty());
}

// === Progress ===

#[test]
fn test_progress_reports_each_stage() {
    let h = Harness::with_one_face();
    h.predictor().predict(&request(), &h.progress).unwrap();

    assert_eq!(
        h.progress.stages(),
        vec![
            "started",
            "face detected",
            "conditioned",
            "generated",
            "safety checked",
            "done"
        ]
    );
}

#[test]
fn test_progress_includes_pose_reference() {
    let h = Harness::with_one_face();
    let req = request().with_pose_image("pose.jpg");
    h.predictor().predict(&req, &h.progress).unwrap();

    assert!(h.progress.stages().contains(&"pose reference applied"));
}
