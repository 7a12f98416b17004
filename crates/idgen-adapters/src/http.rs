//! HTTP model-server backend for every model-backed port.
//!
//! Images travel as base64 PNG inside JSON bodies.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use candle_core::Device;
use idgen_core::imaging::BgrImage;
use idgen_core::{
    ConditionExtractor, ConfigurationError, ControlInput, DepthEstimator, DepthMap,
    DiffusionPipeline, FaceAnalyzer, FaceRecord, GenerationCall, Generator, SafetyClassifier,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Serialize)]
struct FacesRequest {
    image: String,
    det_size: [u32; 2],
}

#[derive(Deserialize)]
struct FacesResponse {
    faces: Vec<FaceRecord>,
}

#[derive(Serialize, Deserialize)]
struct ImagePayload {
    image: String,
}

#[derive(Deserialize)]
struct DepthResponse {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

/// ControlNet inputs; single mode carries scalars, multi mode parallel lists.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum ControlPayload {
    Single {
        model: &'static str,
        image: String,
        scale: f32,
    },
    Multi {
        models: Vec<&'static str>,
        images: Vec<String>,
        scales: Vec<f32>,
    },
}

#[derive(Serialize)]
struct LatentsPayload {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    image_embeds: &'a [f32],
    control: ControlPayload,
    ip_adapter_scale: f32,
    num_inference_steps: u32,
    guidance_scale: f32,
    width: u32,
    height: u32,
    seed: u32,
    latents: LatentsPayload,
}

#[derive(Serialize)]
struct SafetyRequest {
    images: Vec<String>,
}

#[derive(Deserialize)]
struct SafetyResponse {
    has_nsfw_concepts: Vec<bool>,
}

/// Client for a model server exposing `/v1/faces`, `/v1/pose`, `/v1/depth`,
/// `/v1/generate` and `/v1/safety`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    /// Creates a backend for the server at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidBackendUrl`] if `url` is not an
    /// http(s) URL or the client cannot be built.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidBackendUrl {
            url: url.to_string(),
            reason,
        };

        let parsed = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The server base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<R> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!("{endpoint} returned {status}: {text}");
        }

        response
            .json()
            .with_context(|| format!("Invalid response from {endpoint}"))
    }
}

impl FaceAnalyzer for HttpBackend {
    fn detect(&self, image: &BgrImage, det_size: (u32, u32)) -> Result<Vec<FaceRecord>> {
        // Channels stay in BGR order inside the PNG.
        let raw = RgbImage::from_raw(image.width(), image.height(), image.as_bytes().to_vec())
            .context("BGR buffer does not match its dimensions")?;
        let request = FacesRequest {
            image: encode_png(&DynamicImage::ImageRgb8(raw))?,
            det_size: [det_size.0, det_size.1],
        };
        let response: FacesResponse = self.post("/v1/faces", &request)?;
        debug!("Backend found {} faces", response.faces.len());
        Ok(response.faces)
    }
}

impl ConditionExtractor for HttpBackend {
    fn name(&self) -> &'static str {
        "pose"
    }

    fn extract(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let request = ImagePayload {
            image: encode_png(image)?,
        };
        let response: ImagePayload = self.post("/v1/pose", &request)?;
        decode_png(&response.image)
    }
}

impl DepthEstimator for HttpBackend {
    fn estimate(&self, image: &DynamicImage) -> Result<DepthMap> {
        let request = ImagePayload {
            image: encode_png(image)?,
        };
        let response: DepthResponse = self.post("/v1/depth", &request)?;
        Ok(DepthMap {
            width: response.width,
            height: response.height,
            values: response.values,
        })
    }
}

impl DiffusionPipeline for HttpBackend {
    fn generate(&self, call: &GenerationCall<'_>, generator: &mut Generator) -> Result<DynamicImage> {
        let latents = generator
            .latents(call.width, call.height, &Device::Cpu)
            .context("Failed to sample initial latents")?;
        let latents = LatentsPayload {
            shape: latents.dims().to_vec(),
            data: latents.flatten_all()?.to_vec1::<f32>()?,
        };

        let request = GenerateRequest {
            prompt: call.prompt,
            negative_prompt: call.negative_prompt,
            image_embeds: call.image_embeds,
            control: control_payload(call.control)?,
            ip_adapter_scale: call.ip_adapter_scale,
            num_inference_steps: call.num_inference_steps,
            guidance_scale: call.guidance_scale,
            width: call.width,
            height: call.height,
            seed: generator.seed(),
            latents,
        };
        let response: ImagePayload = self.post("/v1/generate", &request)?;
        decode_png(&response.image)
    }
}

impl SafetyClassifier for HttpBackend {
    fn check(&self, images: &[DynamicImage]) -> Result<Vec<bool>> {
        let request = SafetyRequest {
            images: images.iter().map(encode_png).collect::<Result<_>>()?,
        };
        let response: SafetyResponse = self.post("/v1/safety", &request)?;
        Ok(response.has_nsfw_concepts)
    }
}

fn control_payload(control: &ControlInput) -> Result<ControlPayload> {
    Ok(match control {
        ControlInput::Single {
            model,
            image,
            scale,
        } => ControlPayload::Single {
            model: *model,
            image: encode_png(image)?,
            scale: *scale,
        },
        ControlInput::Multi {
            models,
            images,
            scales,
        } => ControlPayload::Multi {
            models: models.clone(),
            images: images.iter().map(encode_png).collect::<Result<_>>()?,
            scales: scales.clone(),
        },
    })
}

/// Encodes `image` as base64 PNG.
fn encode_png(image: &DynamicImage) -> Result<String> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(general_purpose::STANDARD.encode(buf))
}

/// Decodes a base64 PNG (or any format `image` sniffs) to RGB.
fn decode_png(data: &str) -> Result<DynamicImage> {
    let bytes = general_purpose::STANDARD
        .decode(data)
        .context("Image payload is not valid base64")?;
    let image = image::load_from_memory(&bytes).context("Failed to decode image payload")?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
