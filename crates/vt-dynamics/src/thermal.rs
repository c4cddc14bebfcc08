//! Oil temperature.
//!
//! Warm-up ramps linearly at 2.0417 °/s for the first 115 s.  After that (or
//! as soon as an `oiltemp` trigger is visible) the reading jitters uniformly
//! within ±5° of the operating zone.  The first `oiltemp` trigger moves the
//! operating zone to a random value in `[275, 320)`, an injected overheat.

use log::debug;

use vt_core::RandomSource;
use vt_route::TriggerKind;

use crate::{Calculator, Snapshot, StepContext};

const TEMP_COEFFICIENT: f64 = 2.0417;
const WARM_UP_SECS: f64 = 115.0;
const JITTER: f64 = 5.0;
const OVERHEAT_MIN: f64 = 275.0;
const OVERHEAT_SPAN: f64 = 45.0;

#[derive(Clone, Debug, Default)]
pub struct OilTempCalc {
    temp:           f64,
    total_secs:     f64,
    operating_zone: f64,
    tripped:        bool,
}

impl OilTempCalc {
    pub fn new() -> Self {
        Self::default()
    }

    /// The temperature the reading currently oscillates around.
    pub fn operating_zone(&self) -> f64 {
        self.operating_zone
    }

    pub fn overheated(&self) -> bool {
        self.tripped
    }
}

impl Calculator for OilTempCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "oil_temp"
    }

    fn value(&self) -> f64 {
        self.temp
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, rng: &mut dyn RandomSource) {
        self.total_secs += ctx.dt_secs;
        let overheat = previous.triggers.iter().any(|t| t.kind == TriggerKind::OilTemp);

        if self.total_secs <= WARM_UP_SECS && !overheat {
            self.temp += ctx.dt_secs * TEMP_COEFFICIENT;
            self.operating_zone = self.temp;
        } else {
            self.temp = rng.uniform(self.operating_zone - JITTER, self.operating_zone + JITTER);
        }

        if overheat && !self.tripped {
            self.operating_zone = (rng.next_unit() * OVERHEAT_SPAN).floor() + OVERHEAT_MIN;
            self.tripped = true;
            debug!("oil temperature operating zone raised to {}", self.operating_zone);
        }
    }

    fn publish(&self, next: &mut Snapshot) {
        next.oil_temp = self.temp;
    }
}
