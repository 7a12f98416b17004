//! Post-generation NSFW gate.

use anyhow::ensure;
use image::{DynamicImage, RgbImage};
use tracing::{debug, warn};

use crate::ports::SafetyClassifier;

/// Logged when an output is replaced by the placeholder.
pub const NSFW_MESSAGE: &str = "NSFW content detected. Try running it again, rephrase different prompt or add 'nsfw' in the negative prompt.";

/// Outcome of screening one image.
#[derive(Debug, Clone)]
pub struct Screened {
    /// The original image, or a black image of the same size.
    pub image: DynamicImage,
    /// Whether the classifier flagged the original.
    pub nsfw: bool,
}

/// Replaces flagged images with a black placeholder.
pub struct SafetyGate {
    classifier: Box<dyn SafetyClassifier>,
}

impl std::fmt::Debug for SafetyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyGate").finish_non_exhaustive()
    }
}

impl SafetyGate {
    /// Creates a gate backed by `classifier`.
    #[must_use]
    pub fn new(classifier: Box<dyn SafetyClassifier>) -> Self {
        Self { classifier }
    }

    /// Classifies `image` and redacts it if flagged.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier fails or does not return exactly
    /// one flag.
    pub fn screen(&self, image: DynamicImage) -> anyhow::Result<Screened> {
        let flags = self.classifier.check(std::slice::from_ref(&image))?;
        ensure!(
            flags.len() == 1,
            "safety classifier returned {} flags for 1 image",
            flags.len()
        );

        if flags[0] {
            warn!("{NSFW_MESSAGE}");
            Ok(Screened {
                image: placeholder(&image),
                nsfw: true,
            })
        } else {
            debug!("Safety check passed");
            Ok(Screened { image, nsfw: false })
        }
    }
}

/// All-black RGB image the size of `image`.
#[must_use]
pub fn placeholder(image: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(image.width(), image.height()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    struct Fixed(Vec<bool>);

    impl SafetyClassifier for Fixed {
        fn check(&self, _images: &[DynamicImage]) -> anyhow::Result<Vec<bool>> {
            Ok(self.0.clone())
        }
    }

    fn red() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([200, 10, 10])))
    }

    #[test]
    fn test_clean_image_passes_through() {
        let gate = SafetyGate::new(Box::new(Fixed(vec![false])));
        let screened = gate.screen(red()).unwrap();
        assert!(!screened.nsfw);
        assert_eq!(screened.image, red());
    }

    #[test]
    fn test_flagged_image_is_blacked_out() {
        let gate = SafetyGate::new(Box::new(Fixed(vec![true])));
        let screened = gate.screen(red()).unwrap();
        assert!(screened.nsfw);
        let out = screened.image.to_rgb8();
        assert_eq!(out.dimensions(), (12, 8));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_flag_count_mismatch_is_error() {
        let gate = SafetyGate::new(Box::new(Fixed(Vec::new())));
        assert!(gate.screen(red()).is_err());
    }
}
