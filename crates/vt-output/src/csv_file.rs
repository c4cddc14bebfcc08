//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `telemetry.csv`
//! - `trigger_events.csv`
//! - `trips.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;
use log::debug;

use crate::writer::OutputWriter;
use crate::{OutputResult, TelemetryRow, TriggerEventRow, TripRow};

const TELEMETRY_HEADER: [&str; 21] = [
    "vin", "trip_id", "tick", "timestamp", "vehicle_speed", "acceleration", "engine_speed",
    "torque_at_transmission", "gear", "accelerator", "brake", "fuel_level", "fuel_consumed",
    "odometer", "trip_odometer", "oil_temp", "latitude", "longitude", "bearing", "route_stage",
    "dtc_code",
];

const TRIGGER_HEADER: [&str; 7] =
    ["vin", "trip_id", "tick", "timestamp", "type", "value", "trip_odometer"];

const TRIP_HEADER: [&str; 19] = [
    "vin", "trip_id", "simulation_id", "start_time", "end_time", "route_ended",
    "route_duration_ms", "distance_km", "odometer", "mean_speed", "mean_engine_speed",
    "mean_oil_temp", "fuel_consumed", "fuel_level", "high_speed_duration", "idle_duration",
    "high_acceleration_event", "high_braking_event", "dtc_count",
];

/// Writes telemetry output to three CSV files.
pub struct CsvWriter {
    telemetry: Writer<File>,
    triggers:  Writer<File>,
    trips:     Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three CSV files and write the header
    /// rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut telemetry = Writer::from_path(dir.join("telemetry.csv"))?;
        telemetry.write_record(TELEMETRY_HEADER)?;

        let mut triggers = Writer::from_path(dir.join("trigger_events.csv"))?;
        triggers.write_record(TRIGGER_HEADER)?;

        let mut trips = Writer::from_path(dir.join("trips.csv"))?;
        trips.write_record(TRIP_HEADER)?;

        debug!("writing CSV output to {}", dir.display());
        Ok(Self { telemetry, triggers, trips, finished: false })
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl OutputWriter for CsvWriter {
    fn write_telemetry(&mut self, rows: &[TelemetryRow]) -> OutputResult<()> {
        for row in rows {
            self.telemetry.write_record(&[
                row.vin.clone(),
                row.trip_id.clone(),
                row.tick.to_string(),
                row.timestamp.to_string(),
                row.vehicle_speed.to_string(),
                row.acceleration.to_string(),
                row.engine_speed.to_string(),
                row.torque_at_transmission.to_string(),
                row.gear.to_string(),
                row.accelerator.to_string(),
                row.brake.to_string(),
                row.fuel_level.to_string(),
                row.fuel_consumed.to_string(),
                row.odometer.to_string(),
                row.trip_odometer.to_string(),
                row.oil_temp.to_string(),
                row.latitude.to_string(),
                row.longitude.to_string(),
                row.bearing.to_string(),
                row.route_stage.to_string(),
                opt(&row.dtc_code),
            ])?;
        }
        Ok(())
    }

    fn write_trigger_event(&mut self, row: &TriggerEventRow) -> OutputResult<()> {
        self.triggers.write_record(&[
            row.vin.clone(),
            row.trip_id.clone(),
            row.tick.to_string(),
            row.timestamp.to_string(),
            row.kind.to_owned(),
            opt(&row.value),
            row.trip_odometer.to_string(),
        ])?;
        Ok(())
    }

    fn write_trip(&mut self, row: &TripRow) -> OutputResult<()> {
        self.trips.write_record(&[
            row.vin.clone(),
            row.trip_id.clone(),
            row.simulation_id.clone(),
            row.start_time.to_string(),
            opt(&row.end_time),
            (row.route_ended as u8).to_string(),
            opt(&row.route_duration_ms),
            row.distance_km.to_string(),
            row.odometer.to_string(),
            row.mean_speed.to_string(),
            row.mean_engine_speed.to_string(),
            row.mean_oil_temp.to_string(),
            row.fuel_consumed.to_string(),
            row.fuel_level.to_string(),
            row.high_speed_duration.to_string(),
            row.idle_duration.to_string(),
            row.high_acceleration_event.to_string(),
            row.high_braking_event.to_string(),
            row.dtc_count.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.telemetry.flush()?;
        self.triggers.flush()?;
        self.trips.flush()?;
        Ok(())
    }
}
