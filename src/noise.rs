//! Noise generation for the terrain field.
//!
//! The field generator only sees the narrow [`HeightNoise`] trait, so the
//! algorithm can be swapped (or replaced by a fixed field in tests) without
//! touching the terrain code.

use noise::{NoiseFn, OpenSimplex, Perlin, Simplex};

use crate::params::{NoiseConfig, NoiseKind};

/// Continuous, deterministic 2D scalar field
pub trait HeightNoise {
    /// Sample the field at `(x, y)`
    ///
    /// Returns value in range [-1, 1]
    fn sample(&self, x: f64, y: f64) -> f32;
}

/// Seeded noise generator backed by the `noise` crate
pub struct NoiseGenerator {
    kind: NoiseKind,
    seed: u32,
    source: Box<dyn NoiseFn<f64, 2>>,
}

impl NoiseGenerator {
    /// Create new noise generator of the given kind with seed
    pub fn new(kind: NoiseKind, seed: u32) -> Self {
        let source: Box<dyn NoiseFn<f64, 2>> = match kind {
            NoiseKind::OpenSimplex => Box::new(OpenSimplex::new(seed)),
            NoiseKind::Perlin => Box::new(Perlin::new(seed)),
            NoiseKind::Simplex => Box::new(Simplex::new(seed)),
        };
        Self { kind, seed, source }
    }

    pub fn from_config(config: &NoiseConfig) -> Self {
        Self::new(config.kind, config.seed)
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl HeightNoise for NoiseGenerator {
    fn sample(&self, x: f64, y: f64) -> f32 {
        // Implementations may overshoot [-1, 1] slightly
        (self.source.get([x, y]) as f32).clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("kind", &self.kind)
            .field("seed", &self.seed)
            .finish()
    }
}
