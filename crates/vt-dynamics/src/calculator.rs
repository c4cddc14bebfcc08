//! The `Calculator` trait — one simulated quantity per implementation.

use vt_core::RandomSource;
use vt_route::Route;

use crate::Snapshot;

/// Per-tick inputs shared by every calculator.
#[derive(Copy, Clone, Debug)]
pub struct StepContext<'a> {
    /// Simulated milliseconds since the model started, at the end of the tick
    /// being computed.
    pub now_ms: u64,
    /// Integration step, seconds.  Equal to the tick period.
    pub dt_secs: f64,
    /// The route being driven.
    pub route: &'a Route,
}

/// A unit that owns one (or a few) simulated quantities.
///
/// Implementations are plain structs holding only their own private state.
///
/// # Read-from-previous
///
/// [`iterate`][Self::iterate] receives the *previous* snapshot and must
/// derive its new value from it alone.  [`publish`][Self::publish] then
/// writes the value into the snapshot under construction.  The split makes it
/// impossible for one calculator to observe another's output from the same
/// tick.
pub trait Calculator {
    type Output;

    /// Field label, used in logs.
    fn name(&self) -> &'static str;

    /// The last computed value.
    fn value(&self) -> Self::Output;

    fn iterate(
        &mut self,
        previous: &Snapshot,
        ctx:      &StepContext<'_>,
        rng:      &mut dyn RandomSource,
    );

    /// Write the current value into `next`.  Also used once at construction to
    /// seed the initial snapshot.
    fn publish(&self, next: &mut Snapshot);
}

/// Object-safe view of a [`Calculator`], so calculators with different
/// output types can share one ordered pipeline.
pub trait PipelineStep: Send {
    fn name(&self) -> &'static str;

    fn step(
        &mut self,
        previous: &Snapshot,
        next:     &mut Snapshot,
        ctx:      &StepContext<'_>,
        rng:      &mut dyn RandomSource,
    );

    fn seed(&self, snapshot: &mut Snapshot);
}

impl<C: Calculator + Send> PipelineStep for C {
    #[inline]
    fn name(&self) -> &'static str {
        Calculator::name(self)
    }

    #[inline]
    fn step(
        &mut self,
        previous: &Snapshot,
        next:     &mut Snapshot,
        ctx:      &StepContext<'_>,
        rng:      &mut dyn RandomSource,
    ) {
        self.iterate(previous, ctx, rng);
        self.publish(next);
    }

    #[inline]
    fn seed(&self, snapshot: &mut Snapshot) {
        self.publish(snapshot);
    }
}
