//! Unit and integration tests for vt-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv_file::CsvWriter;
    use crate::row::{TelemetryRow, TriggerEventRow, TripRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(path: std::path::PathBuf) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    fn records(path: std::path::PathBuf) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    fn telemetry_row(tick: u64) -> TelemetryRow {
        TelemetryRow {
            vin:                    "VIN1".into(),
            trip_id:                "abcdefghij".into(),
            tick,
            timestamp:              tick as i64 * 1_000,
            vehicle_speed:          42.5,
            acceleration:           1.0,
            engine_speed:           3_000.0,
            torque_at_transmission: 120.0,
            gear:                   3,
            accelerator:            30.0,
            brake:                  0.0,
            fuel_level:             99.5,
            fuel_consumed:          0.2,
            odometer:               1_000.5,
            trip_odometer:          0.5,
            oil_temp:               210.0,
            latitude:               47.0,
            longitude:              8.0,
            bearing:                90.0,
            route_stage:            1,
            dtc_code:               None,
        }
    }

    fn trip_row() -> TripRow {
        TripRow {
            vin:                     "VIN1".into(),
            trip_id:                 "abcdefghij".into(),
            simulation_id:           "sim".into(),
            start_time:              0,
            end_time:                None,
            route_ended:             false,
            route_duration_ms:       None,
            distance_km:             0.5,
            odometer:                1_000.5,
            mean_speed:              40.0,
            mean_engine_speed:       2_900.0,
            mean_oil_temp:           205.0,
            fuel_consumed:           0.2,
            fuel_level:              99.5,
            high_speed_duration:     0,
            idle_duration:           3_000,
            high_acceleration_event: 2,
            high_braking_event:      0,
            dtc_count:               0,
        }
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("telemetry.csv").exists());
        assert!(dir.path().join("trigger_events.csv").exists());
        assert!(dir.path().join("trips.csv").exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tmp();
        let nested = dir.path().join("fleet").join("VIN1");
        let _w = CsvWriter::new(&nested).unwrap();
        assert!(nested.join("telemetry.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let telemetry = headers(dir.path().join("telemetry.csv"));
        assert_eq!(&telemetry[..4], ["vin", "trip_id", "tick", "timestamp"]);
        assert_eq!(telemetry.last().map(String::as_str), Some("dtc_code"));

        assert_eq!(
            headers(dir.path().join("trigger_events.csv")),
            ["vin", "trip_id", "tick", "timestamp", "type", "value", "trip_odometer"]
        );
        assert_eq!(headers(dir.path().join("trips.csv")).len(), 19);
    }

    #[test]
    fn telemetry_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let mut with_dtc = telemetry_row(2);
        with_dtc.dtc_code = Some("P0300".into());
        w.write_telemetry(&[telemetry_row(1), with_dtc]).unwrap();
        w.finish().unwrap();

        let rows = records(dir.path().join("telemetry.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "1");       // tick
        assert_eq!(&rows[0][4], "42.5");    // vehicle_speed
        assert_eq!(&rows[0][8], "3");       // gear
        assert_eq!(&rows[0][20], "");       // no dtc
        assert_eq!(&rows[1][20], "P0300");
    }

    #[test]
    fn trigger_event_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_trigger_event(&TriggerEventRow {
            vin:           "VIN1".into(),
            trip_id:       "abcdefghij".into(),
            tick:          7,
            timestamp:     7_000,
            kind:          "dtc",
            value:         Some("U0100".into()),
            trip_odometer: 0.25,
        })
        .unwrap();
        w.finish().unwrap();

        let rows = records(dir.path().join("trigger_events.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][4], "dtc");
        assert_eq!(&rows[0][5], "U0100");
        assert_eq!(&rows[0][6], "0.25");
    }

    #[test]
    fn trip_optional_fields_blank() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_trip(&trip_row()).unwrap();
        w.finish().unwrap();

        let rows = records(dir.path().join("trips.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][4], "");    // end_time
        assert_eq!(&rows[0][5], "0");   // route_ended
        assert_eq!(&rows[0][6], "");    // route_duration_ms
        assert_eq!(&rows[0][15], "3000");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batch_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_telemetry(&[]).unwrap();
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use vt_core::{GeoPoint, SimConfig, Tick};
    use vt_dynamics::Snapshot;
    use vt_route::{Profile, Route, RouteStage, Trigger, TriggerKind, TriggerTemplate};
    use vt_sim::{AggregatedMetrics, ModelBuilder, ModelParams, TelemetryObserver};

    use crate::csv_file::CsvWriter;
    use crate::observer::OutputObserver;
    use crate::row::{TelemetryRow, TriggerEventRow, TripRow};
    use crate::writer::OutputWriter;
    use crate::OutputResult;

    /// Keeps everything in memory.
    #[derive(Default)]
    struct MemoryWriter {
        telemetry: Vec<TelemetryRow>,
        triggers:  Vec<TriggerEventRow>,
        trips:     Vec<TripRow>,
        finished:  usize,
    }

    impl OutputWriter for MemoryWriter {
        fn write_telemetry(&mut self, rows: &[TelemetryRow]) -> OutputResult<()> {
            self.telemetry.extend_from_slice(rows);
            Ok(())
        }

        fn write_trigger_event(&mut self, row: &TriggerEventRow) -> OutputResult<()> {
            self.triggers.push(row.clone());
            Ok(())
        }

        fn write_trip(&mut self, row: &TripRow) -> OutputResult<()> {
            self.trips.push(row.clone());
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finished += 1;
            Ok(())
        }
    }

    fn short_route() -> Route {
        Route::new(
            "short",
            Profile::Normal,
            vec![
                RouteStage::new(0, GeoPoint::new(47.0, 8.0), GeoPoint::new(47.0, 8.004), 0.3),
                RouteStage::new(1, GeoPoint::new(47.0, 8.004), GeoPoint::new(47.0027, 8.004), 0.3),
            ],
        )
        .with_trigger(TriggerTemplate::new(TriggerKind::Dtc, 1))
    }

    fn config(max_ticks: u64) -> SimConfig {
        SimConfig { seed: 7, max_ticks: Some(max_ticks), ..SimConfig::default() }
    }

    fn with_triggers(triggers: Vec<Trigger>) -> Snapshot {
        Snapshot { triggers, triggers_changed: true, ..Snapshot::default() }
    }

    #[test]
    fn only_new_trigger_records_written() {
        let dtc = Trigger::fired_record(TriggerKind::Dtc, Some("P0100".into()));
        let oil = Trigger::fired_record(TriggerKind::OilTemp, None);
        let stage = Trigger::fired_record(TriggerKind::Brake, None);

        let mut obs = OutputObserver::new(MemoryWriter::default());
        obs.on_trigger_update(Tick(1), &with_triggers(vec![dtc.clone()]));
        obs.on_trigger_update(Tick(2), &with_triggers(vec![dtc, oil]));
        obs.on_trigger_update(Tick(3), &with_triggers(vec![stage]));

        let w = obs.into_writer();
        let kinds: Vec<_> = w.triggers.iter().map(|r| (r.tick, r.kind)).collect();
        assert_eq!(kinds, [(1, "dtc"), (2, "oiltemp"), (3, "brake")]);
        assert_eq!(w.triggers[0].value.as_deref(), Some("P0100"));
    }

    #[test]
    fn dtc_change_without_trigger_change_writes_nothing() {
        let mut obs = OutputObserver::new(MemoryWriter::default());
        let s = Snapshot { dtc_changed: true, ..Snapshot::default() };
        obs.on_trigger_update(Tick(1), &s);
        assert!(obs.into_writer().triggers.is_empty());
    }

    #[test]
    fn sampling_keeps_every_nth_tick_and_the_last() {
        let mut obs = OutputObserver::new(MemoryWriter::default()).sample_every(3);
        for t in 1..=7 {
            let s = Snapshot { route_ended: t == 7, ..Snapshot::default() };
            obs.on_snapshot(Tick(t), &s);
        }
        obs.on_stop(Tick(7), &AggregatedMetrics::default());

        let w = obs.into_writer();
        let ticks: Vec<u64> = w.telemetry.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, [3, 6, 7]);
        assert_eq!(w.finished, 1);
    }

    #[test]
    fn full_trip_to_memory() {
        let mut model = ModelBuilder::new(config(20_000), ModelParams::new("VIN1"))
            .route(Arc::new(short_route()))
            .build()
            .unwrap();
        let mut obs = OutputObserver::new(MemoryWriter::default());
        let end = model.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let w = obs.into_writer();
        assert_eq!(w.telemetry.len() as u64, end.0);
        assert_eq!(w.triggers.len(), 1);
        assert_eq!(w.triggers[0].kind, "dtc");
        assert_eq!(w.trips.len(), 1);
        assert!(w.trips[0].route_ended);
        assert_eq!(w.trips[0].dtc_count, 1);
        assert_eq!(w.trips[0].end_time, Some(model.snapshot().timestamp));
        assert_eq!(w.finished, 1);
    }

    #[test]
    fn capped_run_still_writes_trip() {
        let mut model = ModelBuilder::new(config(4), ModelParams::new("VIN1"))
            .route(Arc::new(short_route()))
            .build()
            .unwrap();
        let mut obs = OutputObserver::new(MemoryWriter::default());
        model.run(&mut obs).unwrap();

        let w = obs.into_writer();
        assert_eq!(w.telemetry.len(), 4);
        assert_eq!(w.trips.len(), 1);
        assert!(!w.trips[0].route_ended);
        assert_eq!(w.trips[0].end_time, None);
    }

    #[test]
    fn integration_csv() {
        let dir: TempDir = tempfile::tempdir().expect("create temp dir");
        let mut model = ModelBuilder::new(config(20_000), ModelParams::new("VIN1"))
            .route(Arc::new(short_route()))
            .build()
            .unwrap();

        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = OutputObserver::new(writer).sample_every(5);
        let end = model.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        let count = |name: &str| {
            let mut rdr = csv::Reader::from_path(dir.path().join(name)).unwrap();
            rdr.records().map(|r| r.unwrap()).count() as u64
        };
        let expected = end.0 / 5 + u64::from(end.0 % 5 != 0);
        assert_eq!(count("telemetry.csv"), expected);
        assert_eq!(count("trigger_events.csv"), 1);
        assert_eq!(count("trips.csv"), 1);
    }
}
