//! Deterministic per-vehicle randomness.
//!
//! # Determinism strategy
//!
//! Every stochastic decision a vehicle makes (trigger distances, throttle
//! adjustments, jitter, DTC selection, oil-temperature noise) draws from one
//! [`RandomSource`] owned by that vehicle's model.  Fleet runs derive each
//! vehicle's seed as:
//!
//!   seed = global_seed XOR (vehicle_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive vehicle IDs uniformly across the seed space, so:
//!
//! - Vehicles never share RNG state (no contention, no ordering dependency).
//! - Adding vehicles at the end of a fleet does not disturb existing seeds.
//! - The same seed and route always replay the same trip.
//!
//! Tests that need exact control substitute [`SequenceRng`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::VehicleId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── RandomSource ──────────────────────────────────────────────────────────────

/// The single injectable source of randomness for one simulated vehicle.
///
/// Only [`next_unit`][Self::next_unit] is required; the helpers are defined in
/// terms of it so a scripted source reproduces the exact same decisions as a
/// seeded generator fed the same unit samples.
pub trait RandomSource {
    /// A uniformly distributed sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// A uniformly distributed sample in `[lower, upper)`.
    #[inline]
    fn uniform(&mut self, lower: f64, upper: f64) -> f64 {
        self.next_unit() * (upper - lower) + lower
    }

    /// A uniformly distributed index in `0..n`.  Returns `0` when `n == 0`.
    #[inline]
    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_unit() * n as f64).floor() as usize).min(n - 1)
    }

    /// `true` with probability one half.
    #[inline]
    fn coin(&mut self) -> bool {
        self.below(2) == 1
    }
}

// ── VehicleRng ────────────────────────────────────────────────────────────────

/// Per-vehicle deterministic RNG.
///
/// Create one per vehicle at model construction.  Each fleet worker owns the
/// models (and therefore the RNGs) it drives.
pub struct VehicleRng(SmallRng);

impl VehicleRng {
    /// Seed deterministically from the run's global seed and a vehicle ID.
    pub fn new(global_seed: u64, vehicle: VehicleId) -> Self {
        let seed = global_seed ^ (vehicle.0 as u64).wrapping_mul(MIXING_CONSTANT);
        VehicleRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed directly, for single-vehicle runs.
    pub fn from_seed(seed: u64) -> Self {
        VehicleRng(SmallRng::seed_from_u64(seed))
    }
}

impl RandomSource for VehicleRng {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}

// ── SequenceRng ───────────────────────────────────────────────────────────────

/// A scripted [`RandomSource`] that replays a fixed list of unit samples,
/// cycling when exhausted.
///
/// Values are clamped into `[0, 1)`.  An empty script always yields `0.0`.
#[derive(Clone, Debug, Default)]
pub struct SequenceRng {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRng {
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples drawn so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRng {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}
