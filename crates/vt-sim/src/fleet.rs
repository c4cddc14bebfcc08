//! Driving many independent models to completion.
//!
//! Each [`DynamicsModel`] owns its snapshot, route handle, aggregator and RNG,
//! so a fleet needs no synchronization: with the `parallel` feature the models
//! are simply split across Rayon's thread pool.  A vehicle that fails stops on
//! its own; its error is reported in its slot and the others run on.

use log::{info, warn};

use vt_core::{RandomSource, Tick};

use crate::{DynamicsModel, NoopObserver, SimError, SimResult, TelemetryObserver};

/// Run every model with a [`NoopObserver`].  Results are in model order.
pub fn run_fleet<R>(models: &mut [DynamicsModel<R>]) -> Vec<SimResult<Tick>>
where
    R: RandomSource + Send,
{
    let observers: Vec<NoopObserver> = models.iter().map(|_| NoopObserver).collect();
    drive(models, observers)
        .into_iter()
        .map(|(result, _)| result)
        .collect()
}

/// Run every model with its own observer (`observers[i]` watches
/// `models[i]`).
///
/// Returns each model's result alongside its observer, in model order, so
/// callers can collect per-vehicle output after the run.  Fails before running
/// anything if the two lengths differ.
pub fn run_fleet_with<R, O>(
    models:    &mut [DynamicsModel<R>],
    observers: Vec<O>,
) -> SimResult<Vec<(SimResult<Tick>, O)>>
where
    R: RandomSource + Send,
    O: TelemetryObserver + Send,
{
    if observers.len() != models.len() {
        return Err(SimError::Config(format!(
            "fleet of {} models given {} observers",
            models.len(),
            observers.len(),
        )));
    }
    Ok(drive(models, observers))
}

fn drive<R, O>(models: &mut [DynamicsModel<R>], observers: Vec<O>) -> Vec<(SimResult<Tick>, O)>
where
    R: RandomSource + Send,
    O: TelemetryObserver + Send,
{
    info!("running fleet of {} vehicles", models.len());

    let run_one = |(index, (model, mut observer)): (usize, (&mut DynamicsModel<R>, O))| {
        let result = model.run(&mut observer);
        if let Err(e) = &result {
            warn!("fleet vehicle {index} ({}) failed: {e}", model.snapshot().vin);
        }
        (result, observer)
    };

    #[cfg(not(feature = "parallel"))]
    {
        models.iter_mut().zip(observers).enumerate().map(run_one).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        models
            .par_iter_mut()
            .zip(observers.into_par_iter())
            .enumerate()
            .map(run_one)
            .collect()
    }
}
