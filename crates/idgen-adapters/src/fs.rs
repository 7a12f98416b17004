//! Image loading from paths or URLs, and result persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use idgen_core::{GenerationResult, ImageLoader, ResultOutput};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// Default location of the generated image.
pub const DEFAULT_OUTPUT_PATH: &str = "result.jpg";

/// Loads request images from local paths or http(s) URLs.
pub struct FsImageLoader {
    client: reqwest::blocking::Client,
}

impl FsImageLoader {
    /// Creates a loader whose downloads time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<DynamicImage> {
        debug!("Downloading image from {url}");
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to download {url}"))?;

        if !response.status().is_success() {
            bail!("Download of {url} failed with status: {}", response.status());
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response for {url}"))?;
        image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image: {url}"))
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, location: &str) -> Result<DynamicImage> {
        let image = if is_remote(location) {
            self.fetch(location)?
        } else {
            debug!("Opening image {location}");
            image::open(location)
                .with_context(|| format!("Failed to open image: {location}"))?
        };
        Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
    }
}

/// Whether `location` is an http(s) URL rather than a path.
fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Writes the result image to one fixed path, replacing the previous one.
#[derive(Debug, Clone)]
pub struct FileResultOutput {
    path: PathBuf,
}

impl FileResultOutput {
    /// Creates an output writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path results are written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileResultOutput {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_PATH)
    }
}

impl ResultOutput for FileResultOutput {
    fn persist(&self, result: &GenerationResult) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Infer the format from the extension, falling back to JPEG.
        let format = ImageFormat::from_path(&self.path).unwrap_or(ImageFormat::Jpeg);
        DynamicImage::ImageRgb8(result.image.to_rgb8())
            .save_with_format(&self.path, format)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!("Saved {}x{} image", result.width, result.height);
        Ok(self.path.clone())
    }
}
