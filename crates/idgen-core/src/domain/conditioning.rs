//! Conditioning signals and the ControlNet configuration handed to the pipeline.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Model reference of the IdentityNet ControlNet.
pub const IDENTITYNET_MODEL: &str = "checkpoints/ControlNetModel";

/// Kind of a conditioning entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Face keypoint overlay; always present and always first.
    Identity,
    /// Pose skeleton.
    Pose,
    /// Canny edge map.
    Canny,
    /// Depth map.
    Depth,
}

impl ConditionKind {
    /// ControlNet model reference for this kind.
    #[must_use]
    pub const fn model(self) -> &'static str {
        match self {
            Self::Identity => IDENTITYNET_MODEL,
            Self::Pose => AuxKind::Pose.model(),
            Self::Canny => AuxKind::Canny.model(),
            Self::Depth => AuxKind::Depth.model(),
        }
    }
}

/// Optional auxiliary conditioning kinds, in selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxKind {
    /// Pose skeleton.
    Pose,
    /// Canny edge map.
    Canny,
    /// Depth map.
    Depth,
}

impl AuxKind {
    /// All kinds in the order they are applied.
    pub const ALL: [Self; 3] = [Self::Pose, Self::Canny, Self::Depth];

    /// ControlNet model reference for this kind.
    #[must_use]
    pub const fn model(self) -> &'static str {
        match self {
            Self::Pose => "thibaud/controlnet-openpose-sdxl-1.0",
            Self::Canny => "diffusers/controlnet-canny-sdxl-1.0",
            Self::Depth => "diffusers/controlnet-depth-sdxl-1.0-small",
        }
    }

    /// Short name used in logs and config.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pose => "pose",
            Self::Canny => "canny",
            Self::Depth => "depth",
        }
    }
}

impl From<AuxKind> for ConditionKind {
    fn from(kind: AuxKind) -> Self {
        match kind {
            AuxKind::Pose => Self::Pose,
            AuxKind::Canny => Self::Canny,
            AuxKind::Depth => Self::Depth,
        }
    }
}

/// One conditioning signal.
#[derive(Debug, Clone)]
pub struct ConditioningEntry {
    /// What the image encodes.
    pub kind: ConditionKind,
    /// Conditioning image, already at generation size.
    pub image: DynamicImage,
    /// ControlNet conditioning scale.
    pub strength: f32,
}

/// ControlNet input for one generation call.
///
/// `Single` drives the IdentityNet alone with a scalar scale. `Multi` drives a
/// multi-ControlNet whose first member is always the IdentityNet.
#[derive(Debug, Clone)]
pub enum ControlInput {
    /// IdentityNet only.
    Single {
        /// Model reference.
        model: &'static str,
        /// Keypoint overlay image.
        image: DynamicImage,
        /// Scalar conditioning scale.
        scale: f32,
    },
    /// IdentityNet followed by the selected auxiliary ControlNets.
    Multi {
        /// Model references, parallel to `images` and `scales`.
        models: Vec<&'static str>,
        /// Conditioning images.
        images: Vec<DynamicImage>,
        /// Conditioning scales.
        scales: Vec<f32>,
    },
}

impl ControlInput {
    /// Builds the pipeline input from the identity entry and the auxiliary
    /// entries that follow it.
    ///
    /// No auxiliary entries yields [`ControlInput::Single`]; anything more
    /// yields [`ControlInput::Multi`].
    #[must_use]
    pub fn new(identity: ConditioningEntry, auxiliary: Vec<ConditioningEntry>) -> Self {
        if auxiliary.is_empty() {
            return Self::Single {
                model: identity.kind.model(),
                image: identity.image,
                scale: identity.strength,
            };
        }

        let n = auxiliary.len() + 1;
        let mut models = Vec::with_capacity(n);
        let mut images = Vec::with_capacity(n);
        let mut scales = Vec::with_capacity(n);
        for entry in std::iter::once(identity).chain(auxiliary) {
            models.push(entry.kind.model());
            images.push(entry.image);
            scales.push(entry.strength);
        }
        Self::Multi {
            models,
            images,
            scales,
        }
    }

    /// Builds the pipeline input from ordered entries, the first of which
    /// drives the IdentityNet. Returns `None` for an empty list.
    #[must_use]
    pub fn from_entries(entries: Vec<ConditioningEntry>) -> Option<Self> {
        let mut entries = entries.into_iter();
        let identity = entries.next()?;
        Some(Self::new(identity, entries.collect()))
    }

    /// Number of conditioning images.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Multi { images, .. } => images.len(),
        }
    }

    /// Always false; a control input carries at least the identity image.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether this is the multi-ControlNet configuration.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }

    /// Conditioning images in application order.
    #[must_use]
    pub fn images(&self) -> Vec<&DynamicImage> {
        match self {
            Self::Single { image, .. } => vec![image],
            Self::Multi { images, .. } => images.iter().collect(),
        }
    }
}
