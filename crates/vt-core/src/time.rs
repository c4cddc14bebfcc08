//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  The
//! mapping to wall-clock time is held in `SimClock`:
//!
//!   unix_ms = start_unix_ms + tick * tick_period_ms
//!
//! Simulated time is authoritative.  Every calculator integrates over the
//! tick period and every timer in the route state machine is measured in
//! simulated milliseconds, so a run is reproducible regardless of how fast
//! (or slowly) the host drives the ticks.
//!
//! The default tick period is 1 000 ms.

use std::fmt;

use crate::{VtError, VtResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts, elapsed simulated milliseconds, and Unix
/// wall-clock milliseconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (milliseconds since epoch) of tick 0.
    pub start_unix_ms: i64,
    /// How many simulated milliseconds one tick represents.  Default: 1000.
    pub tick_period_ms: u32,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    /// Create a clock starting at `start_unix_ms` with the given period.
    pub fn new(start_unix_ms: i64, tick_period_ms: u32) -> Self {
        Self {
            start_unix_ms,
            tick_period_ms,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated milliseconds since tick 0.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.current_tick.0 * self.tick_period_ms as u64
    }

    /// Current Unix timestamp (ms) corresponding to `current_tick`.
    #[inline]
    pub fn current_unix_ms(&self) -> i64 {
        self.start_unix_ms + self.elapsed_ms() as i64
    }

    /// The tick period in seconds: the Δt every integrator uses.
    #[inline]
    pub fn tick_secs(&self) -> f64 {
        self.tick_period_ms as f64 / 1000.0
    }

    /// Break elapsed time into (hours, minutes, seconds) from sim start.
    /// Useful for human-readable logging without a datetime library.
    pub fn elapsed_hms(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_ms() / 1000;
        let hours = total_secs / 3_600;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        let seconds = (total_secs % 60) as u32;
        (hours, minutes, seconds)
    }

    /// How many ticks span `ms` milliseconds? (rounds up)
    #[inline]
    pub fn ticks_for_ms(&self, ms: u64) -> u64 {
        ms.div_ceil(self.tick_period_ms as u64)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.elapsed_hms();
        write!(f, "{} (+{:02}:{:02}:{:02})", self.current_tick, h, m, s)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Per-vehicle simulation configuration.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the model builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Unix timestamp (ms) for tick 0.
    pub start_unix_ms: i64,

    /// Simulated milliseconds per tick.  Default: 1000.
    pub tick_period_ms: u32,

    /// Master RNG seed.  The same seed and route always produce identical
    /// telemetry.
    pub seed: u64,

    /// Hard cap on ticks executed by `run`.  `None` runs until the route ends.
    pub max_ticks: Option<u64>,

    /// Sleep one tick period of wall time between ticks in `run`, producing
    /// telemetry at a live rate.  Simulated time is unaffected.
    pub realtime: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_ms:  0,
            tick_period_ms: 1_000,
            seed:           0,
            max_ticks:      None,
            realtime:       false,
        }
    }
}

impl SimConfig {
    /// Reject configurations the tick loop cannot run.
    pub fn validate(&self) -> VtResult<()> {
        if self.tick_period_ms == 0 {
            return Err(VtError::Config("tick_period_ms must be greater than zero".into()));
        }
        Ok(())
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_ms, self.tick_period_ms)
    }
}
