//! Configuration file support for idgen.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/idgen/config.toml` (lowest priority)
//! - Project-local: `.idgen.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use idgen_core::domain::limits;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model server settings.
    pub backend: BackendConfig,
    /// Model weights settings.
    pub models: ModelsConfig,
    /// Result output settings.
    pub output: OutputConfig,
    /// Default generation parameters.
    pub generation: GenerationConfig,
}

/// Model server configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the model server.
    pub url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Verify weights before serving.
    pub verify: Option<bool>,
}

/// Output configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the result image is written.
    pub path: Option<PathBuf>,
    /// Pretty-print the JSON summary.
    pub pretty: Option<bool>,
}

/// Generation defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default prompt.
    pub prompt: Option<String>,
    /// Default negative prompt.
    pub negative_prompt: Option<String>,
    /// Default number of denoising steps.
    pub num_steps: Option<u32>,
    /// Default guidance scale.
    pub guidance_scale: Option<f32>,
    /// Run the safety checker by default.
    pub safety_checker: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/idgen/config.toml`
    /// 2. Project-local: `.idgen.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        config.checked()
    }

    /// Warns about invalid values and drops the ones that cannot be used.
    ///
    /// Out-of-range generation values are kept so the request reports them.
    fn checked(mut self) -> Self {
        if let Err(e) = self.validate() {
            eprintln!("warning: {e}");
        }
        if self.backend.timeout_secs == Some(0) {
            warn!("Ignoring backend.timeout_secs = 0");
            self.backend.timeout_secs = None;
        }
        self
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.backend.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("backend.url must be an http(s) URL, got '{url}'"));
            }
        }
        if self.backend.timeout_secs == Some(0) {
            return Err("backend.timeout_secs must be positive".to_string());
        }

        if let Some(steps) = self.generation.num_steps {
            let (min, max) = limits::STEPS;
            if !(min..=max).contains(&steps) {
                return Err(format!(
                    "generation.num_steps must be {min}-{max}, got {steps}"
                ));
            }
        }
        if let Some(scale) = self.generation.guidance_scale {
            let (min, max) = limits::GUIDANCE;
            if !(min..=max).contains(&scale) {
                return Err(format!(
                    "generation.guidance_scale must be {min}-{max}, got {scale}"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Backend
        self.backend.url = other.backend.url.or_else(|| self.backend.url.take());
        self.backend.timeout_secs = other.backend.timeout_secs.or(self.backend.timeout_secs);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.verify = other.models.verify.or(self.models.verify);

        // Output
        self.output.path = other.output.path.or_else(|| self.output.path.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);

        // Generation
        self.generation.prompt = other
            .generation
            .prompt
            .or_else(|| self.generation.prompt.take());
        self.generation.negative_prompt = other
            .generation
            .negative_prompt
            .or_else(|| self.generation.negative_prompt.take());
        self.generation.num_steps = other.generation.num_steps.or(self.generation.num_steps);
        self.generation.guidance_scale = other
            .generation
            .guidance_scale
            .or(self.generation.guidance_scale);
        self.generation.safety_checker = other
            .generation
            .safety_checker
            .or(self.generation.safety_checker);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("idgen").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.idgen.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".idgen.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
