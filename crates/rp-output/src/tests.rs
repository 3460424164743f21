//! Tests for rp-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{CycleRow, MatchRow, RouteStopRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn match_row(request: u32) -> MatchRow {
        MatchRow {
            at_ms:          5_000,
            request,
            ride:           request + 100,
            driver:         7,
            passengers:     2,
            cost_m:         1234.56,
            pickup_eta_ms:  65_000,
            dropoff_eta_ms: 300_000,
            offers:         3,
        }
    }

    fn read(dir: &TempDir, file: &str) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }

    #[test]
    fn files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (h, rows) = read(&dir, "matches.csv");
        assert_eq!(h, crate::csv::MATCH_HEADER);
        assert!(rows.is_empty());
        assert_eq!(read(&dir, "ride_events.csv").0, crate::csv::RIDE_EVENT_HEADER);
        assert_eq!(read(&dir, "route_stops.csv").0, crate::csv::ROUTE_STOP_HEADER);
        assert_eq!(read(&dir, "cycles.csv").0, crate::csv::CYCLE_HEADER);
    }

    #[test]
    fn match_rows_written_in_order() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_match(&match_row(1)).unwrap();
        w.write_match(&match_row(2)).unwrap();
        w.finish().unwrap();

        let (_, rows) = read(&dir, "matches.csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "1");
        assert_eq!(&rows[0][2], "101");
        assert_eq!(&rows[0][5], "1234.6");
        assert_eq!(&rows[1][1], "2");
    }

    #[test]
    fn route_snapshot_keeps_missing_ride_as_max() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_route(&[RouteStopRow {
            at_ms:      0,
            driver:     1,
            seq:        0,
            kind:       "current",
            ride:       u32::MAX,
            lat:        40.2,
            lon:        -8.4,
            eta_ms:     0,
            passengers: 0,
        }])
        .unwrap();
        w.write_route(&[]).unwrap();
        w.finish().unwrap();

        let (_, rows) = read(&dir, "route_stops.csv");
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], "current");
        assert_eq!(&rows[0][4], "4294967295");
        assert_eq!(&rows[0][5], "40.200000");
    }

    #[test]
    fn cycle_row_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let row = CycleRow {
            at_ms:         60_000,
            considered:    4,
            matched:       3,
            unmatched:     1,
            expired:       0,
            skipped:       2,
            errors:        0,
            active_routes: 2,
        };
        w.write_cycle(&row).unwrap();
        w.finish().unwrap();

        let (_, rows) = read(&dir, "cycles.csv");
        let fields: Vec<&str> = rows[0].iter().collect();
        assert_eq!(fields, ["60000", "4", "3", "1", "0", "2", "0", "2"]);
    }

    #[test]
    fn finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("nope")).is_err());
    }
}

#[cfg(test)]
mod observer_tests {
    use std::io;

    use rp_core::{DriverId, GeoPoint, LocationId, ManualClock, Timestamp};
    use rp_dispatch::{DispatchConfig, DispatcherBuilder};
    use rp_fleet::{CancelReason, Driver, Location, NewRequest, RequestStatus, Vehicle};
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::observer::DispatchOutputObserver;
    use crate::row::{CycleRow, MatchRow, RideEventRow, RouteStopRow};
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult};

    fn north(m: f64) -> GeoPoint {
        GeoPoint::new(40.2, -8.4).offset_m(m, 0.0)
    }

    fn rows(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    /// Fails every write with a distinct message.
    struct Broken(u32);

    impl Broken {
        fn fail(&mut self) -> OutputResult<()> {
            self.0 += 1;
            Err(io::Error::other(format!("write {}", self.0)).into())
        }
    }

    impl OutputWriter for Broken {
        fn write_match(&mut self, _: &MatchRow) -> OutputResult<()> {
            self.fail()
        }
        fn write_ride_event(&mut self, _: &RideEventRow) -> OutputResult<()> {
            self.fail()
        }
        fn write_route(&mut self, _: &[RouteStopRow]) -> OutputResult<()> {
            self.fail()
        }
        fn write_cycle(&mut self, _: &CycleRow) -> OutputResult<()> {
            self.fail()
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.fail()
        }
    }

    #[test]
    fn dispatcher_run_lands_in_csv() {
        let config = DispatchConfig { speed_kmh: 36.0, ..DispatchConfig::default() };
        let location = Location::new(LocationId(1), "test").with_pooling(true);
        let driver = Driver::new(DriverId(1), north(0.0), Vehicle::new(5, 1)).serving(LocationId(1));
        let d = DispatcherBuilder::new(config.clone(), config.estimator(), ManualClock::new(Timestamp::ZERO))
            .location(location)
            .driver(driver)
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut obs = DispatchOutputObserver::new(CsvWriter::new(dir.path()).unwrap());

        let first = d.admit(NewRequest::new(LocationId(1), north(1000.0), north(3000.0), 2)).unwrap();
        let second = d.admit(NewRequest::new(LocationId(1), north(1500.0), north(2500.0), 1)).unwrap();
        d.search(&mut obs);
        let RequestStatus::Matched(ride) = d.request(second).unwrap().status else {
            panic!("second request not matched");
        };
        d.cancel_ride(ride, CancelReason::Rider, &mut obs).unwrap();
        obs.finish();
        assert!(obs.take_error().is_none(), "no write errors expected");

        let matches = rows(&dir, "matches.csv");
        assert_eq!(matches.len(), 2);
        assert_eq!(&matches[0][1], first.0.to_string());

        let events = rows(&dir, "ride_events.csv");
        let to: Vec<&str> = events.iter().map(|r| r.get(4).unwrap()).collect();
        assert_eq!(to, ["assigned", "assigned", "rider_cancelled"]);

        // Snapshots after each match and the cancellation: 3, 5, then 3 stops.
        assert_eq!(rows(&dir, "route_stops.csv").len(), 3 + 5 + 3);
        let cycles = rows(&dir, "cycles.csv");
        assert_eq!(cycles.len(), 1);
        assert_eq!(&cycles[0][2], "2");
    }

    #[test]
    fn route_snapshots_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut obs = DispatchOutputObserver::new(CsvWriter::new(dir.path()).unwrap()).with_routes(false);
        rp_dispatch::DispatchObserver::on_route_changed(&mut obs, DriverId(1), &[], Timestamp::ZERO);
        obs.finish();
        assert!(rows(&dir, "route_stops.csv").is_empty());
    }

    #[test]
    fn first_error_kept() {
        let mut obs = DispatchOutputObserver::new(Broken(0));
        obs.finish();
        obs.finish();

        let err = obs.take_error().unwrap();
        assert!(matches!(&err, OutputError::Io(e) if e.to_string() == "write 1"), "{err}");
        assert!(obs.take_error().is_none());
        assert_eq!(obs.into_writer().0, 2);
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use crate::row::{CycleRow, RideEventRow, RouteStopRow};
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn stop(seq: u32) -> RouteStopRow {
        RouteStopRow {
            at_ms:      1_000,
            driver:     4,
            seq,
            kind:       if seq == 0 { "current" } else { "pickup" },
            ride:       if seq == 0 { u32::MAX } else { seq },
            lat:        40.2,
            lon:        -8.4,
            eta_ms:     1_000 + i64::from(seq) * 60_000,
            passengers: seq,
        }
    }

    #[test]
    fn db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("dispatch.db").exists());
    }

    #[test]
    fn route_snapshot_count() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_route(&[stop(0), stop(1), stop(2)]).unwrap();
        w.write_route(&[]).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("dispatch.db")).unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM route_stops", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 3);
        let ride: i64 = conn
            .query_row("SELECT ride FROM route_stops WHERE seq = 0", [], |r| r.get(0))
            .unwrap();
        assert_eq!(ride, i64::from(u32::MAX));
    }

    #[test]
    fn events_and_cycles() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_ride_event(&RideEventRow { at_ms: 0, ride: 1, driver: 2, from: "assigned", to: "picked_up" })
            .unwrap();
        w.write_cycle(&CycleRow {
            at_ms:         0,
            considered:    1,
            matched:       1,
            unmatched:     0,
            expired:       0,
            skipped:       0,
            errors:        0,
            active_routes: 1,
        })
        .unwrap();
        w.finish().unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("dispatch.db")).unwrap();
        let to: String = conn.query_row("SELECT to_status FROM ride_events", [], |r| r.get(0)).unwrap();
        assert_eq!(to, "picked_up");
        let matched: i64 = conn.query_row("SELECT matched FROM cycles", [], |r| r.get(0)).unwrap();
        assert_eq!(matched, 1);
    }
}
