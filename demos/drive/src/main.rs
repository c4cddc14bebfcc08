//! drive — run simulated vehicles along a route and write their telemetry.
//!
//! Without `--route`, drives a synthetic loop through downtown Mobile,
//! Alabama with one brake, one DTC and one oil-temperature trigger.  Each
//! vehicle writes `telemetry.csv`, `trigger_events.csv` and `trips.csv` under
//! `<output>/<vin>/`, and its trip metrics are printed as JSON at the end.
//!
//! ```text
//! RUST_LOG=debug cargo run -p drive -- --vehicles 4 --sample-every 5
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use vt_core::{GeoPoint, SimConfig, VehicleId};
use vt_output::{CsvWriter, OutputObserver};
use vt_route::{Profile, Route, TriggerKind, TriggerTemplate, load_route_json};
use vt_sim::{DynamicsModel, ModelBuilder, ModelParams, run_fleet_with};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "drive")]
#[command(about = "Deterministic vehicle telemetry simulator")]
struct Cli {
    /// Route JSON document.  A synthetic loop is used when omitted.
    #[arg(long)]
    route: Option<PathBuf>,

    /// Model parameters JSON (vin, device_id, odometer, fuel_tank_capacity, …).
    #[arg(long)]
    params: Option<PathBuf>,

    /// Drive the aggressive throttle profile on the synthetic route.
    #[arg(long)]
    aggressive: bool,

    /// Master RNG seed.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of vehicles to drive.
    #[arg(long, default_value = "1")]
    vehicles: u32,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value = "1000")]
    tick_ms: u32,

    /// Stop each vehicle after this many ticks even if its route has not
    /// ended.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Pace ticks to wall-clock time.
    #[arg(long)]
    realtime: bool,

    /// Write telemetry every N ticks.
    #[arg(long, default_value = "1")]
    sample_every: u64,

    /// Output directory.
    #[arg(long, default_value = "output/drive")]
    output: PathBuf,

    /// Register the heading calculator.
    #[arg(long)]
    heading: bool,
}

// ── Synthetic route ───────────────────────────────────────────────────────────

const LOOP_WAYPOINTS: [(f64, f64); 6] = [
    (30.6954, -88.0399),
    (30.6890, -88.0431),
    (30.6835, -88.0520),
    (30.6901, -88.0612),
    (30.6987, -88.0535),
    (30.6954, -88.0399),
];

fn synthetic_route(profile: Profile) -> Result<Route> {
    let points: Vec<GeoPoint> = LOOP_WAYPOINTS
        .iter()
        .map(|&(lat, lon)| GeoPoint::new(lat, lon))
        .collect();
    let route = Route::from_waypoints("mobile-downtown-loop", profile, &points)?
        .with_description("Synthetic loop through downtown Mobile, AL")
        .with_trigger(TriggerTemplate::new(TriggerKind::Brake, 1))
        .with_trigger(TriggerTemplate::new(TriggerKind::Dtc, 1))
        .with_trigger(TriggerTemplate::new(TriggerKind::OilTemp, 1));
    Ok(route)
}

fn load_params(path: Option<&Path>) -> Result<ModelParams> {
    let Some(path) = path else {
        return Ok(ModelParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.vehicles == 0 {
        bail!("--vehicles must be at least 1");
    }

    let mut base = load_params(cli.params.as_deref())?;
    let route = match (&cli.route, base.route.take()) {
        (Some(path), _) => {
            base.route_location = Some(path.display().to_string());
            load_route_json(path).with_context(|| format!("loading route {}", path.display()))?
        }
        (None, Some(route)) => route,
        (None, None) => {
            let profile = if cli.aggressive { Profile::Aggressive } else { Profile::Normal };
            synthetic_route(profile)?
        }
    };
    info!(
        "route {} ({}): {} stages, {:.2} km, {} profile",
        route.route_id,
        route.description,
        route.stage_count(),
        route.km,
        route.profile,
    );
    let route = Arc::new(route);

    let config = SimConfig {
        tick_period_ms: cli.tick_ms,
        seed:           cli.seed,
        max_ticks:      cli.max_ticks,
        realtime:       cli.realtime,
        ..SimConfig::default()
    };

    // 1. Build one model and one CSV observer per vehicle.
    let mut models: Vec<DynamicsModel> = Vec::with_capacity(cli.vehicles as usize);
    let mut observers = Vec::with_capacity(cli.vehicles as usize);
    for i in 0..cli.vehicles {
        let mut params = base.clone();
        if params.vin.is_empty() || cli.vehicles > 1 {
            params.vin = format!("{}SIM{:010}", params.vin, i);
        }
        if params.device_id.is_empty() {
            params.device_id = format!("device-{i}");
        }

        let dir = cli.output.join(&params.vin);
        let mut builder = ModelBuilder::new(config.clone(), params)
            .vehicle(VehicleId(i))
            .route(Arc::clone(&route));
        if cli.heading {
            builder = builder.with_heading();
        }
        models.push(builder.build()?);

        let writer = CsvWriter::new(&dir)
            .with_context(|| format!("opening output in {}", dir.display()))?;
        observers.push(OutputObserver::new(writer).sample_every(cli.sample_every));
    }

    // 2. Drive.
    let t0 = Instant::now();
    let results = run_fleet_with(&mut models, observers)?;
    let elapsed = t0.elapsed();
    info!("fleet finished in {:.3} s", elapsed.as_secs_f64());

    // 3. Report.
    let mut failures = 0;
    for ((result, mut observer), model) in results.into_iter().zip(&models) {
        let vin = &model.snapshot().vin;
        if let Some(e) = observer.take_error() {
            eprintln!("{vin}: output error: {e}");
        }
        match result {
            Ok(tick) => {
                println!(
                    "{vin}: {} after {} ({:.3} km)",
                    if model.snapshot().route_ended { "route ended" } else { "stopped" },
                    tick,
                    model.snapshot().trip_odometer,
                );
                println!("{}", serde_json::to_string_pretty(model.aggregated_metrics())?);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{vin}: {e}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} vehicles failed", models.len());
    }
    Ok(())
}
