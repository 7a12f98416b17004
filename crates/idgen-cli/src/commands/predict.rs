//! Predict command - generate one image from a face photo.

use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use idgen_adapters::{
    models_dir, verify_models, FileResultOutput, FsImageLoader, HttpBackend, DEFAULT_OUTPUT_PATH,
    DEFAULT_TIMEOUT_SECS,
};
use idgen_core::conditioning::CannyConfig;
use idgen_core::domain::{limits, MAX_SEED};
use idgen_core::{
    AuxToggle, CannyExtractor, Collaborators, ConditioningSelector, DepthMapExtractor,
    GenerationRequest, InputValidationError, PredictionSummary, Predictor, SafetyGate,
};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Hardcoded fallbacks for values that are not request parameters.
mod defaults {
    pub const BACKEND_URL: &str = "http://127.0.0.1:7860";
}

/// Parses `s` and checks it against inclusive `bounds`.
fn parse_bounded<T>(s: &str, (min, max): (T, T)) -> Result<T, String>
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let value: T = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in {min}..={max}"))
    }
}

fn parse_dimension(s: &str) -> Result<u32, String> {
    parse_bounded(s, limits::DIMENSION)
}

fn parse_ratio(s: &str) -> Result<f32, String> {
    parse_bounded(s, limits::RATIO)
}

fn parse_aux_strength(s: &str) -> Result<f32, String> {
    parse_bounded(s, limits::AUX_STRENGTH)
}

fn parse_steps(s: &str) -> Result<u32, String> {
    parse_bounded(s, limits::STEPS)
}

fn parse_guidance(s: &str) -> Result<f32, String> {
    parse_bounded(s, limits::GUIDANCE)
}

fn parse_seed(s: &str) -> Result<u32, String> {
    parse_bounded(s, (0, MAX_SEED))
}

fn parse_timeout(s: &str) -> Result<u64, String> {
    parse_bounded(s, (1, u64::MAX))
}

/// Arguments for one prediction.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PredictArgs {
    /// Face photo (path or http(s) URL)
    #[arg(value_name = "FACE_IMAGE")]
    pub face_image: Option<String>,

    /// Reference image whose face keypoints and size are used
    #[arg(long, value_name = "IMAGE")]
    pub pose_image: Option<String>,

    /// Prompt
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Negative prompt
    #[arg(long)]
    pub negative_prompt: Option<String>,

    /// Requested width (512-2048); sets the face detector input size
    #[arg(long, value_parser = parse_dimension)]
    pub width: Option<u32>,

    /// Requested height (512-2048); sets the face detector input size
    #[arg(long, value_parser = parse_dimension)]
    pub height: Option<u32>,

    /// IP-adapter strength for detail (0.0-1.0)
    #[arg(long, value_parser = parse_ratio)]
    pub adapter_strength: Option<f32>,

    /// IdentityNet strength for fidelity (0.0-1.0)
    #[arg(long, value_parser = parse_ratio)]
    pub identitynet_strength: Option<f32>,

    /// Add pose skeleton conditioning
    #[arg(long)]
    pub pose: bool,

    /// Pose conditioning strength (0.0-1.5)
    #[arg(long, value_parser = parse_aux_strength)]
    pub pose_strength: Option<f32>,

    /// Add canny edge conditioning
    #[arg(long)]
    pub canny: bool,

    /// Canny conditioning strength (0.0-1.5)
    #[arg(long, value_parser = parse_aux_strength)]
    pub canny_strength: Option<f32>,

    /// Add depth map conditioning
    #[arg(long)]
    pub depth: bool,

    /// Depth conditioning strength (0.0-1.5)
    #[arg(long, value_parser = parse_aux_strength)]
    pub depth_strength: Option<f32>,

    /// Number of denoising steps (1-30)
    #[arg(long, value_parser = parse_steps)]
    pub steps: Option<u32>,

    /// Guidance scale (0.0-10.0)
    #[arg(long, value_parser = parse_guidance)]
    pub guidance: Option<f32>,

    /// Seed; 0 or unset picks a random one
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u32>,

    /// Skip the NSFW safety checker
    #[arg(long)]
    pub no_safety_checker: bool,

    /// Where the result image is written
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Model server base URL
    #[arg(long, value_name = "URL", env = "IDGEN_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Model server request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Do not check model weights before predicting
    #[arg(long)]
    pub skip_verify: bool,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pub pretty: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl PredictArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods and [`GenerationRequest::new`])
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if args.prompt.is_none() {
            args.prompt.clone_from(&config.generation.prompt);
        }
        if args.negative_prompt.is_none() {
            args.negative_prompt
                .clone_from(&config.generation.negative_prompt);
        }
        args.steps = args.steps.or(config.generation.num_steps);
        args.guidance = args.guidance.or(config.generation.guidance_scale);

        // CLI --no-safety-checker wins; config can only turn the checker off.
        if !args.no_safety_checker {
            args.no_safety_checker = config.generation.safety_checker == Some(false);
        }

        if args.output.is_none() {
            args.output.clone_from(&config.output.path);
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }

        if args.backend_url.is_none() {
            args.backend_url.clone_from(&config.backend.url);
        }
        args.timeout = args.timeout.or(config.backend.timeout_secs);

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        if !args.skip_verify {
            args.skip_verify = config.models.verify == Some(false);
        }

        args
    }

    /// Builds and validates the request described by these arguments.
    ///
    /// # Errors
    ///
    /// Fails if no face image was given or a parameter is out of range.
    pub fn request(&self) -> Result<GenerationRequest> {
        let face_image = self
            .face_image
            .as_deref()
            .ok_or(InputValidationError::MissingFaceImage)?;

        let mut request = GenerationRequest::new(face_image);
        request.pose_image.clone_from(&self.pose_image);
        if let Some(ref prompt) = self.prompt {
            request.prompt.clone_from(prompt);
        }
        if let Some(ref negative) = self.negative_prompt {
            request.negative_prompt.clone_from(negative);
        }
        request.width = self.width.unwrap_or(request.width);
        request.height = self.height.unwrap_or(request.height);
        request.adapter_strength_ratio = self
            .adapter_strength
            .unwrap_or(request.adapter_strength_ratio);
        request.identitynet_strength_ratio = self
            .identitynet_strength
            .unwrap_or(request.identitynet_strength_ratio);
        request.pose = toggle(self.pose, self.pose_strength, request.pose);
        request.canny = toggle(self.canny, self.canny_strength, request.canny);
        request.depth = toggle(self.depth, self.depth_strength, request.depth);
        request.num_steps = self.steps.unwrap_or(request.num_steps);
        request.guidance_scale = self.guidance.unwrap_or(request.guidance_scale);
        request.seed = self.seed;
        request.safety_checker = !self.no_safety_checker;

        request.validate()?;
        Ok(request)
    }

    /// Get backend URL with fallback to the local default.
    fn backend_url(&self) -> &str {
        self.backend_url.as_deref().unwrap_or(defaults::BACKEND_URL)
    }

    /// Get request timeout with fallback to the adapter default.
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Get output path with fallback to `result.jpg`.
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }
}

fn toggle(enabled: bool, strength: Option<f32>, default: AuxToggle) -> AuxToggle {
    AuxToggle {
        enabled,
        strength: strength.unwrap_or(default.strength),
    }
}

/// Run the predict command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
///
/// # Errors
///
/// Fails on invalid input, missing weights, an unusable backend URL, or any
/// collaborator failure during the prediction.
pub fn run(args: &PredictArgs) -> Result<PredictionSummary> {
    let request = args.request()?;
    info!("Running predict command on {}", request.face_image);

    if args.skip_verify {
        warn!("Skipping model weight verification");
    } else {
        let dir = models_dir(args.models_dir.as_deref());
        debug!("Verifying models in {}", dir.display());
        verify_models(&dir).context("Model weights are not ready")?;
    }

    let mut predictor = build_predictor(args)?;

    let show_progress = !args.quiet && std::io::stderr().is_terminal();
    let progress = ProgressBar::new(args.quiet, show_progress);

    let prediction = predictor.predict(&request, &progress)?;
    let summary = PredictionSummary::new(&prediction.result, prediction.path, iso_timestamp());

    JsonOutput::stdout().write_summary(&summary, args.pretty)?;

    Ok(summary)
}

/// Wires the adapters into a predictor.
fn build_predictor(args: &PredictArgs) -> Result<Predictor> {
    let timeout = args.timeout();
    let backend = HttpBackend::new(args.backend_url(), timeout)?;
    debug!("Using model server at {}", backend.base_url());

    let selector = ConditioningSelector::new(
        Box::new(backend.clone()),
        CannyExtractor::new(CannyConfig::default()),
        DepthMapExtractor::new(Box::new(backend.clone())),
    );

    Ok(Predictor::new(Collaborators {
        loader: Box::new(FsImageLoader::new(timeout)?),
        faces: Box::new(backend.clone()),
        selector,
        pipeline: Box::new(backend.clone()),
        safety: SafetyGate::new(Box::new(backend)),
        output: Box::new(FileResultOutput::new(args.output_path())),
    }))
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(face: &str) -> PredictArgs {
        PredictArgs {
            face_image: Some(face.to_string()),
            ..PredictArgs::default()
        }
    }

    #[test]
    fn test_parse_bounded_accepts_edges() {
        assert_eq!(parse_dimension("512"), Ok(512));
        assert_eq!(parse_dimension("2048"), Ok(2048));
        assert_eq!(parse_aux_strength("1.5"), Ok(1.5));
        assert_eq!(parse_seed("0"), Ok(0));
    }

    #[test]
    fn test_parse_bounded_rejects_out_of_range() {
        assert_eq!(parse_steps("31").unwrap_err(), "31 is not in 1..=30");
        assert_eq!(parse_ratio("1.2").unwrap_err(), "1.2 is not in 0..=1");
        assert!(parse_seed("2147483648").is_err());
        assert!(parse_timeout("0").is_err());
        assert_eq!(parse_timeout("30"), Ok(30));
    }

    #[test]
    fn test_parse_bounded_rejects_garbage() {
        assert_eq!(
            parse_guidance("lots").unwrap_err(),
            "'lots' is not a valid number"
        );
    }

    #[test]
    fn test_request_defaults() {
        let request = args("face.jpg").request().unwrap();
        assert_eq!(request, GenerationRequest::new("face.jpg"));
    }

    #[test]
    fn test_request_requires_face_image() {
        let err = PredictArgs::default().request().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputValidationError>(),
            Some(InputValidationError::MissingFaceImage)
        ));
    }

    #[test]
    fn test_request_maps_toggles_and_strengths() {
        let request = PredictArgs {
            canny: true,
            canny_strength: Some(0.9),
            depth_strength: Some(1.2),
            no_safety_checker: true,
            seed: Some(7),
            ..args("face.jpg")
        }
        .request()
        .unwrap();

        assert!(!request.pose.enabled);
        assert!(request.canny.enabled);
        assert!((request.canny.strength - 0.9).abs() < f32::EPSILON);
        assert!(!request.depth.enabled);
        assert!((request.depth.strength - 1.2).abs() < f32::EPSILON);
        assert!(!request.safety_checker);
        assert_eq!(request.seed, Some(7));
    }

    #[test]
    fn test_config_fills_unset_values() {
        let config: AppConfig = toml::from_str(
            r"
[backend]
url = 'http://config:1'

[generation]
prompt = 'from config'
num_steps = 12
safety_checker = false

[models]
verify = false
",
        )
        .unwrap();

        let merged = PredictArgs::with_config(args("face.jpg"), &config);
        assert_eq!(merged.backend_url(), "http://config:1");
        assert!(merged.no_safety_checker);
        assert!(merged.skip_verify);

        let request = merged.request().unwrap();
        assert_eq!(request.prompt, "from config");
        assert_eq!(request.num_steps, 12);
    }

    #[test]
    fn test_cli_wins_over_config() {
        let config: AppConfig = toml::from_str(
            r"
[generation]
prompt = 'from config'
num_steps = 12

[output]
path = 'config.jpg'
",
        )
        .unwrap();

        let cli = PredictArgs {
            prompt: Some("from cli".to_string()),
            steps: Some(4),
            output: Some(PathBuf::from("cli.jpg")),
            ..args("face.jpg")
        };
        let merged = PredictArgs::with_config(cli, &config);

        assert_eq!(merged.output_path(), PathBuf::from("cli.jpg"));
        let request = merged.request().unwrap();
        assert_eq!(request.prompt, "from cli");
        assert_eq!(request.num_steps, 4);
    }

    #[test]
    fn test_accessor_fallbacks() {
        let plain = args("face.jpg");
        assert_eq!(plain.backend_url(), defaults::BACKEND_URL);
        assert_eq!(plain.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(plain.output_path(), PathBuf::from("result.jpg"));
    }

    #[test]
    fn test_config_steps_out_of_range_rejected_by_request() {
        let mut config = AppConfig::default();
        config.generation.num_steps = Some(99);

        let merged = PredictArgs::with_config(args("face.jpg"), &config);
        let err = merged.request().unwrap_err();
        assert!(err.to_string().contains("num_steps"));
    }
}
