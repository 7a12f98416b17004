//! Request orchestration from input images to a persisted result.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use super::SafetyGate;
use crate::conditioning::ConditioningSelector;
use crate::domain::{
    largest_face, last_face, FaceRecord, GenerationRequest, GenerationResult,
};
use crate::error::{InputValidationError, PredictError};
use crate::imaging::{draw_keypoints, resize_image, BgrImage, ResizeOptions, INPUT_MAX_SIDE};
use crate::inference::{resolve_seed, Generator};
use crate::ports::{
    DiffusionPipeline, FaceAnalyzer, GenerationCall, ImageLoader, PredictionEvent, ProgressSink,
    ResultOutput,
};

/// Detector input size before the first request.
pub const DEFAULT_DET_SIZE: (u32, u32) = (640, 640);

/// Everything a [`Predictor`] delegates to.
pub struct Collaborators {
    /// Fetches request images.
    pub loader: Box<dyn ImageLoader>,
    /// Face detection and embedding.
    pub faces: Box<dyn FaceAnalyzer>,
    /// Auxiliary conditioning.
    pub selector: ConditioningSelector,
    /// Image generation.
    pub pipeline: Box<dyn DiffusionPipeline>,
    /// NSFW screening.
    pub safety: SafetyGate,
    /// Result persistence.
    pub output: Box<dyn ResultOutput>,
}

/// A persisted prediction.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// The result as persisted.
    pub result: GenerationResult,
    /// Where it was written.
    pub path: PathBuf,
}

/// Runs predictions one at a time.
///
/// Collaborators are set up once and reused. The detector input size is the
/// only state carried between calls.
pub struct Predictor {
    parts: Collaborators,
    det_size: (u32, u32),
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("det_size", &self.det_size)
            .finish_non_exhaustive()
    }
}

/// Face and keypoint overlay chosen from one image.
struct Detection {
    face: FaceRecord,
    faces: usize,
    overlay: DynamicImage,
}

impl Predictor {
    /// Creates a predictor.
    #[must_use]
    pub fn new(parts: Collaborators) -> Self {
        Self {
            parts,
            det_size: DEFAULT_DET_SIZE,
        }
    }

    /// Detector input size used by the most recent request.
    #[must_use]
    pub const fn det_size(&self) -> (u32, u32) {
        self.det_size
    }

    /// Runs one prediction and persists its image.
    ///
    /// Every stage is reported to `progress`; a failure is reported as
    /// [`PredictionEvent::Failed`] before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Input`] when the request is out of range or a
    /// face cannot be found, and [`PredictError::Collaborator`] when a model,
    /// loader or output fails.
    pub fn predict(
        &mut self,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<Prediction, PredictError> {
        let outcome = self.run(request, progress);
        if let Err(err) = &outcome {
            progress.on_event(PredictionEvent::Failed {
                reason: err.to_string(),
            });
        }
        outcome
    }

    fn run(
        &mut self,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<Prediction, PredictError> {
        request.validate()?;
        info!("Starting prediction for {}", request.face_image);
        progress.on_event(PredictionEvent::Started {
            face_image: request.face_image.clone(),
        });

        self.update_det_size((request.width, request.height));

        let face_image = self.load(&request.face_image)?;
        let primary = self
            .detect(&face_image, largest_face)?
            .ok_or(InputValidationError::NoFaceInFaceImage)?;
        debug!(faces = primary.faces, bbox = ?primary.face.bbox, "Selected primary face");
        progress.on_event(PredictionEvent::FaceDetected {
            faces: primary.faces,
        });

        let embedding = primary.face.embedding;
        let (control_image, overlay) = match &request.pose_image {
            Some(location) => {
                let pose_image = self.load(location)?;
                let reference = self
                    .detect(&pose_image, last_face)?
                    .ok_or(InputValidationError::NoFaceInPoseImage)?;
                debug!(faces = reference.faces, "Applied pose reference");
                progress.on_event(PredictionEvent::PoseReferenceApplied);
                (pose_image, reference.overlay)
            }
            None => (face_image, primary.overlay),
        };

        let (width, height) = control_image.dimensions();
        let conditioning = self
            .parts
            .selector
            .select(
                &request.aux_toggles(),
                &control_image,
                overlay,
                request.identitynet_strength_ratio,
                (width, height),
            )
            .map_err(PredictError::collaborator("conditioning"))?;
        info!(
            width,
            height,
            controlnets = conditioning.selected.len() + 1,
            "Conditioning ready"
        );
        progress.on_event(PredictionEvent::Conditioned {
            selected: conditioning.selected.clone(),
            width,
            height,
        });
        let control = conditioning.into_control();

        let seed = resolve_seed(request.seed);
        info!("Using seed {seed}");
        let mut generator = Generator::new(seed);

        let call = GenerationCall {
            prompt: &request.prompt,
            negative_prompt: &request.negative_prompt,
            image_embeds: &embedding,
            control: &control,
            ip_adapter_scale: request.adapter_strength_ratio,
            num_inference_steps: request.num_steps,
            guidance_scale: request.guidance_scale,
            width,
            height,
        };
        let image = self
            .parts
            .pipeline
            .generate(&call, &mut generator)
            .map_err(PredictError::collaborator("generation"))?;
        if image.dimensions() != (width, height) {
            let (w, h) = image.dimensions();
            return Err(PredictError::collaborator("generation")(anyhow!(
                "pipeline returned {w}x{h}, expected {width}x{height}"
            )));
        }
        progress.on_event(PredictionEvent::Generated { seed });

        let (image, nsfw) = if request.safety_checker {
            let screened = self
                .parts
                .safety
                .screen(image)
                .map_err(PredictError::collaborator("safety check"))?;
            (screened.image, screened.nsfw)
        } else {
            debug!("Safety checker disabled");
            (image, false)
        };
        progress.on_event(PredictionEvent::SafetyChecked { nsfw });

        let result = GenerationResult {
            image,
            nsfw,
            seed,
            width,
            height,
        };
        let path = self
            .parts
            .output
            .persist(&result)
            .map_err(PredictError::collaborator("output"))?;
        info!("Wrote result to {}", path.display());
        progress.on_event(PredictionEvent::Done { path: path.clone() });

        Ok(Prediction { result, path })
    }

    fn update_det_size(&mut self, size: (u32, u32)) {
        if size != self.det_size {
            info!(
                "Face detector size changed from {}x{} to {}x{}",
                self.det_size.0, self.det_size.1, size.0, size.1
            );
            self.det_size = size;
        }
    }

    /// Loads `location` and fits it to the detector's working size.
    fn load(&self, location: &str) -> Result<DynamicImage, PredictError> {
        let image = self
            .parts
            .loader
            .load(location)
            .with_context(|| format!("failed to load {location}"))
            .map_err(PredictError::collaborator("image loading"))?;
        Ok(resize_image(
            &image,
            &ResizeOptions::with_max_side(INPUT_MAX_SIDE),
        ))
    }

    /// Detects faces in `image` and renders the chosen face's keypoints.
    ///
    /// Returns `None` when no face is found.
    fn detect(
        &self,
        image: &DynamicImage,
        choose: fn(&[FaceRecord]) -> Option<&FaceRecord>,
    ) -> Result<Option<Detection>, PredictError> {
        let faces = self
            .parts
            .faces
            .detect(&BgrImage::from_dynamic(image), self.det_size)
            .map_err(PredictError::collaborator("face detection"))?;

        Ok(choose(&faces).map(|face| {
            let (width, height) = image.dimensions();
            Detection {
                overlay: draw_keypoints(width, height, &face.kps),
                face: face.clone(),
                faces: faces.len(),
            }
        }))
    }
}
