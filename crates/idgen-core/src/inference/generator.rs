//! Seeded random source for every stochastic step of one generation.
//!
//! MT19937 with Box-Muller normal sampling, laid out the way PyTorch fills
//! `randn` so that a seed produces the same latents across runtimes.

// Bit masks and float conversions on fixed-width values
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use candle_core::{DType, Device, Tensor};
use rand::Rng;
use rand_mt::Mt;
use tracing::debug;

use crate::domain::MAX_SEED;

/// Latent channels of the SDXL VAE.
pub const LATENT_CHANNELS: usize = 4;

/// Spatial downscale factor between pixels and latents.
pub const VAE_SCALE_FACTOR: u32 = 8;

/// Chunk size of the vectorized fill.
const CHUNK: usize = 16;
const HALF_CHUNK: usize = CHUNK / 2;

/// Returns `seed` unless it is absent or zero, in which case a fresh seed is
/// drawn uniformly from `1..=i32::MAX`.
#[must_use]
pub fn resolve_seed(seed: Option<u32>) -> u32 {
    match seed {
        Some(seed) if seed != 0 => seed,
        _ => {
            let seed = rand::thread_rng().gen_range(1..=MAX_SEED);
            debug!(seed, "Drew random seed");
            seed
        }
    }
}

/// Seeded generator handed to the diffusion pipeline.
#[derive(Debug, Clone)]
pub struct Generator {
    seed: u32,
    rng: Mt,
    cached: Option<f32>,
}

impl Generator {
    /// Creates a generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: Mt::new(seed),
            cached: None,
        }
    }

    /// Seed this generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// One standard normal sample (53-bit uniforms, second value cached).
    pub fn sample(&mut self) -> f32 {
        if let Some(cached) = self.cached.take() {
            return cached;
        }

        let u1 = self.uniform_f64();
        let u2 = self.uniform_f64();

        let radius = (-2.0 * (1.0 - u2).ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u1;

        self.cached = Some((radius * theta.sin()) as f32);
        (radius * theta.cos()) as f32
    }

    /// `count` standard normal samples.
    ///
    /// Counts of sixteen or more are filled in chunks of sixteen from 24-bit
    /// uniforms; the tail and small counts use [`Generator::sample`].
    pub fn randn_vec(&mut self, count: usize) -> Vec<f32> {
        if count < CHUNK {
            return (0..count).map(|_| self.sample()).collect();
        }

        let mut out = Vec::with_capacity(count);
        for _ in 0..count / CHUNK {
            let mut uniforms = [0.0_f32; CHUNK];
            for u in &mut uniforms {
                *u = self.uniform_f32();
            }

            let mut cos = [0.0_f32; HALF_CHUNK];
            let mut sin = [0.0_f32; HALF_CHUNK];
            for i in 0..HALF_CHUNK {
                let radius = (-2.0 * (1.0 - uniforms[i]).ln()).sqrt();
                let theta = 2.0 * std::f32::consts::PI * uniforms[HALF_CHUNK + i];
                cos[i] = radius * theta.cos();
                sin[i] = radius * theta.sin();
            }
            out.extend_from_slice(&cos);
            out.extend_from_slice(&sin);
        }
        for _ in 0..count % CHUNK {
            out.push(self.sample());
        }
        out
    }

    /// Normal tensor of `shape` on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor cannot be created or moved.
    pub fn randn(&mut self, shape: &[usize], device: &Device) -> candle_core::Result<Tensor> {
        let count = shape.iter().product();
        let data = self.randn_vec(count);
        Tensor::from_vec(data, shape, &Device::Cpu)?
            .to_device(device)?
            .to_dtype(DType::F32)
    }

    /// Initial latents `(1, 4, height / 8, width / 8)` for an image of
    /// `width` × `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor cannot be created or moved.
    pub fn latents(
        &mut self,
        width: u32,
        height: u32,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        let shape = [
            1,
            LATENT_CHANNELS,
            (height / VAE_SCALE_FACTOR) as usize,
            (width / VAE_SCALE_FACTOR) as usize,
        ];
        self.randn(&shape, device)
    }

    fn uniform_f64(&mut self) -> f64 {
        const MASK_53: u64 = (1 << 53) - 1;
        let lo = u64::from(self.rng.next_u32());
        let hi = u64::from(self.rng.next_u32());
        (((lo << 32) | hi) & MASK_53) as f64 / (1_u64 << 53) as f64
    }

    fn uniform_f32(&mut self) -> f32 {
        const MASK_24: u32 = (1 << 24) - 1;
        (self.rng.next_u32() & MASK_24) as f32 / (1_u32 << 24) as f32
    }
}
