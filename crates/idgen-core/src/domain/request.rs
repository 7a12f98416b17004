//! Generation request parameters.

use serde::{Deserialize, Serialize};

use super::AuxKind;
use crate::error::InputValidationError;

/// Largest accepted seed (`i32::MAX`).
pub const MAX_SEED: u32 = i32::MAX as u32;

/// Inclusive bounds for every numeric request parameter.
pub mod limits {
    /// Output width/height.
    pub const DIMENSION: (u32, u32) = (512, 2048);
    /// Adapter and IdentityNet strength ratios.
    pub const RATIO: (f32, f32) = (0.0, 1.0);
    /// Pose/canny/depth strengths.
    pub const AUX_STRENGTH: (f32, f32) = (0.0, 1.5);
    /// Denoising steps.
    pub const STEPS: (u32, u32) = (1, 30);
    /// Classifier-free guidance scale.
    pub const GUIDANCE: (f32, f32) = (0.0, 10.0);
}

/// Toggle and strength for one auxiliary conditioning signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxToggle {
    /// Whether the signal is used.
    pub enabled: bool,
    /// ControlNet conditioning scale for the signal.
    pub strength: f32,
}

impl Default for AuxToggle {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 0.5,
        }
    }
}

/// All parameters of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Path or URL of the face photo.
    pub face_image: String,
    /// Path or URL of an optional reference pose image.
    pub pose_image: Option<String>,
    /// Positive prompt.
    pub prompt: String,
    /// Negative prompt.
    pub negative_prompt: String,
    /// Requested output width; drives the face detector input size.
    pub width: u32,
    /// Requested output height; drives the face detector input size.
    pub height: u32,
    /// IP-adapter scale (detail).
    pub adapter_strength_ratio: f32,
    /// IdentityNet conditioning scale (fidelity).
    pub identitynet_strength_ratio: f32,
    /// Pose skeleton conditioning.
    pub pose: AuxToggle,
    /// Canny edge conditioning.
    pub canny: AuxToggle,
    /// Depth map conditioning.
    pub depth: AuxToggle,
    /// Number of denoising steps.
    pub num_steps: u32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// Seed; `None` or `Some(0)` draws a fresh random seed.
    pub seed: Option<u32>,
    /// Run the NSFW classifier on the output.
    pub safety_checker: bool,
}

impl GenerationRequest {
    /// Creates a request for `face_image` with default parameters.
    #[must_use]
    pub fn new(face_image: impl Into<String>) -> Self {
        Self {
            face_image: face_image.into(),
            pose_image: None,
            prompt: "a person".to_string(),
            negative_prompt: "ugly, low quality, deformed face".to_string(),
            width: 640,
            height: 640,
            adapter_strength_ratio: 0.8,
            identitynet_strength_ratio: 0.8,
            pose: AuxToggle::default(),
            canny: AuxToggle::default(),
            depth: AuxToggle::default(),
            num_steps: 6,
            guidance_scale: 0.0,
            seed: None,
            safety_checker: true,
        }
    }

    /// Sets the reference pose image.
    #[must_use]
    pub fn with_pose_image(mut self, pose_image: impl Into<String>) -> Self {
        self.pose_image = Some(pose_image.into());
        self
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Auxiliary toggles paired with their kind, in application order.
    #[must_use]
    pub const fn aux_toggles(&self) -> [(AuxKind, AuxToggle); 3] {
        [
            (AuxKind::Pose, self.pose),
            (AuxKind::Canny, self.canny),
            (AuxKind::Depth, self.depth),
        ]
    }

    /// Checks every numeric parameter against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::MissingFaceImage`] for a blank face
    /// image, else [`InputValidationError::OutOfRange`] for the first
    /// parameter outside its bounds.
    pub fn validate(&self) -> Result<(), InputValidationError> {
        if self.face_image.trim().is_empty() {
            return Err(InputValidationError::MissingFaceImage);
        }
        check_u32("width", self.width, limits::DIMENSION)?;
        check_u32("height", self.height, limits::DIMENSION)?;
        check_f32(
            "adapter_strength_ratio",
            self.adapter_strength_ratio,
            limits::RATIO,
        )?;
        check_f32(
            "identitynet_strength_ratio",
            self.identitynet_strength_ratio,
            limits::RATIO,
        )?;
        check_f32("pose_strength", self.pose.strength, limits::AUX_STRENGTH)?;
        check_f32("canny_strength", self.canny.strength, limits::AUX_STRENGTH)?;
        check_f32("depth_strength", self.depth.strength, limits::AUX_STRENGTH)?;
        check_u32("num_steps", self.num_steps, limits::STEPS)?;
        check_f32("guidance_scale", self.guidance_scale, limits::GUIDANCE)?;
        if let Some(seed) = self.seed {
            // 0 is accepted and means "pick one for me".
            check_u32("seed", seed, (0, MAX_SEED))?;
        }
        Ok(())
    }
}

fn check_u32(
    field: &'static str,
    value: u32,
    (min, max): (u32, u32),
) -> Result<(), InputValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputValidationError::OutOfRange {
            field,
            min: f64::from(min),
            max: f64::from(max),
            value: f64::from(value),
        })
    }
}

fn check_f32(
    field: &'static str,
    value: f32,
    (min, max): (f32, f32),
) -> Result<(), InputValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputValidationError::OutOfRange {
            field,
            min: f64::from(min),
            max: f64::from(max),
            value: f64::from(value),
        })
    }
}
