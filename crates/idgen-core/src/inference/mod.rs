//! Seeded randomness for the diffusion call.

mod generator;

pub use generator::{resolve_seed, Generator, LATENT_CHANNELS, VAE_SCALE_FACTOR};
