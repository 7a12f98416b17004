//! Diffusion pipeline port.

use image::DynamicImage;

use crate::domain::ControlInput;
use crate::inference::Generator;

/// Everything the diffusion pipeline needs for one image.
#[derive(Debug, Clone)]
pub struct GenerationCall<'a> {
    /// Positive prompt.
    pub prompt: &'a str,
    /// Negative prompt.
    pub negative_prompt: &'a str,
    /// Face identity embedding.
    pub image_embeds: &'a [f32],
    /// ControlNet configuration, images and scales.
    pub control: &'a ControlInput,
    /// IP-adapter scale.
    pub ip_adapter_scale: f32,
    /// Denoising steps.
    pub num_inference_steps: u32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
}

/// Port for the identity-conditioned diffusion pipeline.
pub trait DiffusionPipeline: Send + Sync {
    /// Generates one image.
    ///
    /// Every stochastic step must draw from `generator` so that a fixed seed
    /// reproduces the output.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(
        &self,
        call: &GenerationCall<'_>,
        generator: &mut Generator,
    ) -> anyhow::Result<DynamicImage>;
}
