//! Mock implementations of core port traits.
//!
//! Every mock is cheap to clone and clones share state, so a test can hand
//! one clone to the predictor and keep another for assertions.

// Test-only pixel math
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, bail};
use idgen_core::imaging::BgrImage;
use idgen_core::ports::{
    ConditionExtractor, DepthEstimator, DepthMap, DiffusionPipeline, FaceAnalyzer,
    GenerationCall, ImageLoader, PredictionEvent, ProgressSink, ResultOutput, SafetyClassifier,
};
use idgen_core::{ControlInput, FaceRecord, Generator, GenerationResult};
use image::{DynamicImage, Rgb, RgbImage};

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock implementation of `ImageLoader`.
///
/// Serves registered images by location and records every request.
#[derive(Clone, Default)]
pub struct MockImageLoader {
    images: Arc<Mutex<HashMap<String, DynamicImage>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockImageLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `image` under `location`.
    #[must_use]
    pub fn with_image(self, location: &str, image: DynamicImage) -> Self {
        locked(&self.images).insert(location.to_string(), image);
        self
    }

    /// Returns every requested location, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        locked(&self.requests).clone()
    }
}

impl ImageLoader for MockImageLoader {
    fn load(&self, location: &str) -> anyhow::Result<DynamicImage> {
        locked(&self.requests).push(location.to_string());
        locked(&self.images)
            .get(location)
            .cloned()
            .ok_or_else(|| anyhow!("no such image: {location}"))
    }
}

/// One recorded `FaceAnalyzer::detect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectCall {
    /// Width of the analyzed image.
    pub width: u32,
    /// Height of the analyzed image.
    pub height: u32,
    /// Detector size passed with the call.
    pub det_size: (u32, u32),
}

/// Mock implementation of `FaceAnalyzer`.
///
/// Answers calls from a queue of responses; the last response repeats once
/// the queue runs dry.
#[derive(Clone)]
pub struct MockFaceAnalyzer {
    responses: Arc<Mutex<VecDeque<Vec<FaceRecord>>>>,
    last: Arc<Mutex<Vec<FaceRecord>>>,
    calls: Arc<Mutex<Vec<DetectCall>>>,
}

impl MockFaceAnalyzer {
    /// Returns `faces` on every call.
    #[must_use]
    pub fn returning(faces: Vec<FaceRecord>) -> Self {
        Self::sequence(vec![faces])
    }

    /// Returns each entry of `responses` in turn.
    #[must_use]
    pub fn sequence(responses: Vec<Vec<FaceRecord>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            last: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Finds no faces.
    #[must_use]
    pub fn empty() -> Self {
        Self::returning(Vec::new())
    }

    /// Returns every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<DetectCall> {
        locked(&self.calls).clone()
    }
}

impl FaceAnalyzer for MockFaceAnalyzer {
    fn detect(&self, image: &BgrImage, det_size: (u32, u32)) -> anyhow::Result<Vec<FaceRecord>> {
        locked(&self.calls).push(DetectCall {
            width: image.width(),
            height: image.height(),
            det_size,
        });
        let mut last = locked(&self.last);
        if let Some(next) = locked(&self.responses).pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// Mock implementation of `ConditionExtractor`.
///
/// Returns a solid image and counts calls. A failing mock returns an error.
#[derive(Clone)]
pub struct MockExtractor {
    name: &'static str,
    color: [u8; 3],
    size: Option<(u32, u32)>,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockExtractor {
    /// Returns a `color` image the size of its input.
    #[must_use]
    pub fn new(name: &'static str, color: [u8; 3]) -> Self {
        Self {
            name,
            color,
            size: None,
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns images of a fixed size regardless of input.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Fails every call.
    #[must_use]
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name, [0, 0, 0])
        }
    }

    /// Returns the number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *locked(&self.calls)
    }
}

impl ConditionExtractor for MockExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, image: &DynamicImage) -> anyhow::Result<DynamicImage> {
        *locked(&self.calls) += 1;
        if self.fail {
            bail!("{} extractor failed", self.name);
        }
        let (width, height) = self.size.unwrap_or((image.width(), image.height()));
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb(self.color),
        )))
    }
}

/// Mock implementation of `DepthEstimator`.
///
/// Returns a left-to-right ramp on a small grid.
#[derive(Clone)]
pub struct MockDepthEstimator {
    grid: (u32, u32),
    calls: Arc<Mutex<usize>>,
}

impl MockDepthEstimator {
    /// Creates an estimator predicting on a `width` × `height` grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            grid: (width.max(1), height.max(1)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *locked(&self.calls)
    }
}

impl Default for MockDepthEstimator {
    fn default() -> Self {
        Self::new(8, 8)
    }
}

impl DepthEstimator for MockDepthEstimator {
    #[allow(clippy::cast_precision_loss)]
    fn estimate(&self, _image: &DynamicImage) -> anyhow::Result<DepthMap> {
        *locked(&self.calls) += 1;
        let (width, height) = self.grid;
        let values = (0..height)
            .flat_map(|_| (0..width).map(|x| x as f32))
            .collect();
        Ok(DepthMap {
            width,
            height,
            values,
        })
    }
}

/// What the mock pipeline saw in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCall {
    /// Prompt.
    pub prompt: String,
    /// Negative prompt.
    pub negative_prompt: String,
    /// Identity embedding.
    pub image_embeds: Vec<f32>,
    /// Whether the multi-ControlNet configuration was used.
    pub multi: bool,
    /// Model references in order.
    pub models: Vec<&'static str>,
    /// Conditioning scales in order.
    pub scales: Vec<f32>,
    /// Size of each conditioning image.
    pub image_sizes: Vec<(u32, u32)>,
    /// The identity conditioning image.
    pub identity: DynamicImage,
    /// IP-adapter scale.
    pub ip_adapter_scale: f32,
    /// Denoising steps.
    pub num_inference_steps: u32,
    /// Guidance scale.
    pub guidance_scale: f32,
    /// Output size.
    pub size: (u32, u32),
    /// Generator seed.
    pub seed: u32,
}

/// Mock implementation of `DiffusionPipeline`.
///
/// Paints an image of the requested size from generator samples, so equal
/// seeds give equal images.
#[derive(Clone, Default)]
pub struct MockPipeline {
    calls: Arc<Mutex<Vec<PipelineCall>>>,
    size_override: Option<(u32, u32)>,
}

impl MockPipeline {
    /// Creates a pipeline that honors the requested size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns images of a fixed size regardless of the request.
    #[must_use]
    pub const fn with_output_size(mut self, width: u32, height: u32) -> Self {
        self.size_override = Some((width, height));
        self
    }

    /// Returns every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<PipelineCall> {
        locked(&self.calls).clone()
    }

    /// Returns the most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<PipelineCall> {
        locked(&self.calls).last().cloned()
    }
}

impl DiffusionPipeline for MockPipeline {
    fn generate(
        &self,
        call: &GenerationCall<'_>,
        generator: &mut Generator,
    ) -> anyhow::Result<DynamicImage> {
        let identity = call
            .control
            .images()
            .first()
            .map(|img| (*img).clone())
            .ok_or_else(|| anyhow!("no conditioning images"))?;
        let (models, scales) = match call.control {
            ControlInput::Single { model, scale, .. } => (vec![*model], vec![*scale]),
            ControlInput::Multi { models, scales, .. } => (models.clone(), scales.clone()),
        };
        locked(&self.calls).push(PipelineCall {
            prompt: call.prompt.to_string(),
            negative_prompt: call.negative_prompt.to_string(),
            image_embeds: call.image_embeds.to_vec(),
            multi: call.control.is_multi(),
            models,
            scales,
            image_sizes: call
                .control
                .images()
                .iter()
                .map(|img| (img.width(), img.height()))
                .collect(),
            identity,
            ip_adapter_scale: call.ip_adapter_scale,
            num_inference_steps: call.num_inference_steps,
            guidance_scale: call.guidance_scale,
            size: (call.width, call.height),
            seed: generator.seed(),
        });

        let (width, height) = self.size_override.unwrap_or((call.width, call.height));
        let noise = generator.randn_vec(16);
        let img = RgbImage::from_fn(width, height, |x, y| {
            let v = noise[((x + y) % 16) as usize];
            let level = ((v.clamp(-3.0, 3.0) + 3.0) / 6.0 * 255.0) as u8;
            Rgb([level, level / 2, 255 - level])
        });
        Ok(DynamicImage::ImageRgb8(img))
    }
}

/// Mock implementation of `SafetyClassifier`.
#[derive(Clone)]
pub struct MockSafetyClassifier {
    nsfw: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockSafetyClassifier {
    /// Flags nothing.
    #[must_use]
    pub fn clean() -> Self {
        Self {
            nsfw: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Flags everything.
    #[must_use]
    pub fn flagging() -> Self {
        Self {
            nsfw: true,
            ..Self::clean()
        }
    }

    /// Returns the number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *locked(&self.calls)
    }
}

impl SafetyClassifier for MockSafetyClassifier {
    fn check(&self, images: &[DynamicImage]) -> anyhow::Result<Vec<bool>> {
        *locked(&self.calls) += 1;
        Ok(vec![self.nsfw; images.len()])
    }
}

/// Mock implementation of `ResultOutput`.
///
/// Keeps persisted results in memory and reports a fixed path.
#[derive(Clone)]
pub struct MockResultOutput {
    path: PathBuf,
    results: Arc<Mutex<Vec<GenerationResult>>>,
}

impl MockResultOutput {
    /// Creates a mock output reporting `result.jpg`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("result.jpg"),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all persisted results.
    #[must_use]
    pub fn results(&self) -> Vec<GenerationResult> {
        locked(&self.results).clone()
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn persist(&self, result: &GenerationResult) -> anyhow::Result<PathBuf> {
        locked(&self.results).push(result.clone());
        Ok(self.path.clone())
    }
}

/// Mock implementation of `ProgressSink`.
///
/// Captures events for later assertions.
#[derive(Clone, Default)]
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<PredictionEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<PredictionEvent> {
        locked(&self.events).clone()
    }

    /// Returns the stage label of every captured event.
    #[must_use]
    pub fn stages(&self) -> Vec<&'static str> {
        self.events().iter().map(PredictionEvent::stage).collect()
    }

    /// Returns whether a `Failed` event was received.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, PredictionEvent::Failed { .. }))
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: PredictionEvent) {
        locked(&self.events).push(event);
    }
}
