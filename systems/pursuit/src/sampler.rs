//! Seeded disk sampling for wander-target selection.

use chase_core::DiskSampler;
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitDisc};

/// Reproducible [`DiskSampler`] backed by a ChaCha stream.
#[derive(Clone, Debug)]
pub struct SeededDiskSampler {
    rng: ChaCha8Rng,
}

impl SeededDiskSampler {
    /// Creates a sampler whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DiskSampler for SeededDiskSampler {
    fn sample_disk(&mut self, radius: f32) -> Vec2 {
        if !radius.is_finite() || radius <= 0.0 {
            return Vec2::ZERO;
        }

        let [x, y]: [f32; 2] = UnitDisc.sample(&mut self.rng);
        Vec2::new(x, y) * radius
    }
}
