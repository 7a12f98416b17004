//! Chooses and renders the conditioning signals for one generation.

use anyhow::Context;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use super::{CannyExtractor, DepthMapExtractor};
use crate::domain::{AuxKind, AuxToggle, ConditionKind, ConditioningEntry, ControlInput};
use crate::imaging::{resize_image, ResizeOptions};
use crate::ports::ConditionExtractor;

/// Conditioning chosen for one request.
#[derive(Debug, Clone)]
pub struct Conditioning {
    /// Keypoint overlay entry.
    pub identity: ConditioningEntry,
    /// Auxiliary entries in application order.
    pub auxiliary: Vec<ConditioningEntry>,
    /// Auxiliary kinds that were applied, parallel to `auxiliary`.
    pub selected: Vec<AuxKind>,
}

impl Conditioning {
    /// All entries, identity first.
    pub fn entries(&self) -> impl Iterator<Item = &ConditioningEntry> {
        std::iter::once(&self.identity).chain(&self.auxiliary)
    }

    /// Converts the entries into the pipeline's ControlNet input.
    #[must_use]
    pub fn into_control(self) -> ControlInput {
        ControlInput::new(self.identity, self.auxiliary)
    }
}

/// Owns one extractor per auxiliary kind.
pub struct ConditioningSelector {
    pose: Box<dyn ConditionExtractor>,
    canny: CannyExtractor,
    depth: DepthMapExtractor,
}

impl std::fmt::Debug for ConditioningSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditioningSelector")
            .field("pose", &self.pose.name())
            .field("canny", &self.canny)
            .field("depth", &self.depth)
            .finish()
    }
}

impl ConditioningSelector {
    /// Creates a selector from its extractors.
    #[must_use]
    pub fn new(
        pose: Box<dyn ConditionExtractor>,
        canny: CannyExtractor,
        depth: DepthMapExtractor,
    ) -> Self {
        Self { pose, canny, depth }
    }

    /// The extractor that renders `kind`.
    #[must_use]
    pub fn extractor(&self, kind: AuxKind) -> &dyn ConditionExtractor {
        match kind {
            AuxKind::Pose => self.pose.as_ref(),
            AuxKind::Canny => &self.canny,
            AuxKind::Depth => &self.depth,
        }
    }

    /// Builds the ordered conditioning for one request.
    ///
    /// Enabled kinds are taken in the order given, each extracted from
    /// `source` and resized to exactly `size`. The identity entry is always
    /// prepended.
    ///
    /// # Errors
    ///
    /// Returns an error if any extractor fails.
    pub fn select(
        &self,
        toggles: &[(AuxKind, AuxToggle)],
        source: &DynamicImage,
        identity: DynamicImage,
        identity_strength: f32,
        size: (u32, u32),
    ) -> anyhow::Result<Conditioning> {
        let exact = ResizeOptions {
            size: Some(size),
            ..ResizeOptions::default()
        };

        let identity = if identity.dimensions() == size {
            identity
        } else {
            resize_image(&identity, &exact)
        };

        let identity = ConditioningEntry {
            kind: ConditionKind::Identity,
            image: identity,
            strength: identity_strength,
        };
        let mut auxiliary = Vec::new();
        let mut selected = Vec::new();

        for &(kind, toggle) in toggles.iter().filter(|(_, t)| t.enabled) {
            let extractor = self.extractor(kind);
            let image = extractor
                .extract(source)
                .with_context(|| format!("{} extraction failed", extractor.name()))?;
            debug!(
                kind = kind.name(),
                strength = toggle.strength,
                "Added conditioning"
            );
            auxiliary.push(ConditioningEntry {
                kind: kind.into(),
                image: resize_image(&image, &exact),
                strength: toggle.strength,
            });
            selected.push(kind);
        }

        Ok(Conditioning {
            identity,
            auxiliary,
            selected,
        })
    }
}
