//! Random sampling capability injected into every simulation component.

use std::cmp::Ordering;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitSphere};

/// Uniform sampling used for spread and variance.
pub trait RandomSource {
    /// Samples uniformly from `low..=high`. Returns `low` when the range is
    /// empty or degenerate.
    fn range(&mut self, low: f32, high: f32) -> f32;

    /// Samples a point uniformly distributed on the unit sphere.
    fn unit_sphere(&mut self) -> Vec3;

    /// Samples an index uniformly from `0..len`. Returns zero when `len` is zero.
    fn index(&mut self, len: usize) -> usize;
}

/// Seedable random source backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a generator whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn range(&mut self, low: f32, high: f32) -> f32 {
        match low.partial_cmp(&high) {
            Some(Ordering::Less) => self.rng.gen_range(low..=high),
            _ => low,
        }
    }

    fn unit_sphere(&mut self) -> Vec3 {
        let [x, y, z]: [f32; 3] = UnitSphere.sample(&mut self.rng);
        Vec3::new(x, y, z)
    }

    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Deterministic source that always samples the middle of every range.
///
/// Useful for pinning exact arithmetic in tests.
#[cfg(any(test, feature = "test_support"))]
#[derive(Clone, Copy, Debug)]
pub struct MidpointRandom {
    sphere: Vec3,
}

#[cfg(any(test, feature = "test_support"))]
impl MidpointRandom {
    /// Creates a source whose unit-sphere samples are always `sphere`.
    #[must_use]
    pub fn new(sphere: Vec3) -> Self {
        Self { sphere }
    }
}

#[cfg(any(test, feature = "test_support"))]
impl Default for MidpointRandom {
    fn default() -> Self {
        Self::new(Vec3::Z)
    }
}

#[cfg(any(test, feature = "test_support"))]
impl RandomSource for MidpointRandom {
    fn range(&mut self, low: f32, high: f32) -> f32 {
        (low + high) * 0.5
    }

    fn unit_sphere(&mut self) -> Vec3 {
        self.sphere
    }

    fn index(&mut self, _len: usize) -> usize {
        0
    }
}
