//! Registry of the model weights a serving process needs.
//!
//! Weights are provisioned out of band; this module only locates and checks
//! them.

use std::path::{Path, PathBuf};

use idgen_core::ConfigurationError;
use safetensors::SafeTensors;
use tracing::debug;

/// Models directory used when none is configured.
pub const DEFAULT_MODELS_DIR: &str = "checkpoints";

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// What the weights are used for.
    pub description: &'static str,
    /// File or directory, relative to the models directory.
    pub path: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "antelopev2",
        description: "face detection and recognition",
        path: "antelopev2",
    },
    ModelInfo {
        name: "identitynet",
        description: "IdentityNet ControlNet",
        path: "ControlNetModel/diffusion_pytorch_model.safetensors",
    },
    ModelInfo {
        name: "ip-adapter",
        description: "face IP-adapter",
        path: "ip-adapter.bin",
    },
    ModelInfo {
        name: "controlnet-pose",
        description: "OpenPose ControlNet",
        path: "pose",
    },
    ModelInfo {
        name: "controlnet-canny",
        description: "Canny ControlNet",
        path: "canny",
    },
    ModelInfo {
        name: "controlnet-depth",
        description: "depth ControlNet",
        path: "depth",
    },
    ModelInfo {
        name: "sdxl",
        description: "SDXL base pipeline",
        path: "sd_model",
    },
    ModelInfo {
        name: "lcm-lora",
        description: "LCM LoRA weights",
        path: "pytorch_lora_weights.safetensors",
    },
    ModelInfo {
        name: "safety-checker",
        description: "NSFW safety checker",
        path: "safety_cache",
    },
    ModelInfo {
        name: "feature-extractor",
        description: "CLIP feature extractor for the safety checker",
        path: "feature_extractor",
    },
];

/// Returns the models directory: `custom` if given, else `./checkpoints`.
#[must_use]
pub fn models_dir(custom: Option<&Path>) -> PathBuf {
    custom.map_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR), Path::to_path_buf)
}

/// Returns the path to a specific model under `dir`.
#[must_use]
pub fn model_path(dir: &Path, name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| dir.join(m.path))
}

/// Lists models under `dir` with whether each is present.
#[must_use]
pub fn list_models(dir: &Path) -> Vec<(String, bool)> {
    MODELS
        .iter()
        .map(|m| (m.name.to_string(), dir.join(m.path).exists()))
        .collect()
}

/// Checks that every registered model under `dir` is present and readable.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] found.
pub fn verify_models(dir: &Path) -> Result<(), ConfigurationError> {
    for model in MODELS {
        verify_model(model.name, &dir.join(model.path))?;
    }
    Ok(())
}

/// Checks one model file or directory.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingWeights`] if nothing exists at `path`,
/// or [`ConfigurationError::UnreadableWeights`] if a safetensors file does
/// not parse.
pub fn verify_model(name: &str, path: &Path) -> Result<(), ConfigurationError> {
    if !path.exists() {
        return Err(ConfigurationError::MissingWeights {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }

    if path.extension().is_some_and(|e| e == "safetensors") {
        check_safetensors(path).map_err(|reason| ConfigurationError::UnreadableWeights {
            name: name.to_string(),
            path: path.to_path_buf(),
            reason,
        })?;
    }

    debug!("Model {name} present at {}", path.display());
    Ok(())
}

/// Parses the file as safetensors, checking the header against the data.
fn check_safetensors(path: &Path) -> Result<(), String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    let tensors = SafeTensors::deserialize(&data).map_err(|e| e.to_string())?;
    debug!("{} holds {} tensors", path.display(), tensors.len());
    Ok(())
}
