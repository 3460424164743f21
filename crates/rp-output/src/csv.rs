//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `matches.csv`
//! - `ride_events.csv`
//! - `route_stops.csv`
//! - `cycles.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{CycleRow, MatchRow, OutputResult, RideEventRow, RouteStopRow};

pub const MATCH_HEADER: [&str; 9] = [
    "at_ms", "request", "ride", "driver", "passengers", "cost_m", "pickup_eta_ms", "dropoff_eta_ms", "offers",
];
pub const RIDE_EVENT_HEADER: [&str; 5] = ["at_ms", "ride", "driver", "from", "to"];
pub const ROUTE_STOP_HEADER: [&str; 9] =
    ["at_ms", "driver", "seq", "kind", "ride", "lat", "lon", "eta_ms", "passengers"];
pub const CYCLE_HEADER: [&str; 8] =
    ["at_ms", "considered", "matched", "unmatched", "expired", "skipped", "errors", "active_routes"];

/// Writes dispatch output to four CSV files.
pub struct CsvWriter {
    matches:  Writer<File>,
    events:   Writer<File>,
    stops:    Writer<File>,
    cycles:   Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the four CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut matches = Writer::from_path(dir.join("matches.csv"))?;
        matches.write_record(MATCH_HEADER)?;

        let mut events = Writer::from_path(dir.join("ride_events.csv"))?;
        events.write_record(RIDE_EVENT_HEADER)?;

        let mut stops = Writer::from_path(dir.join("route_stops.csv"))?;
        stops.write_record(ROUTE_STOP_HEADER)?;

        let mut cycles = Writer::from_path(dir.join("cycles.csv"))?;
        cycles.write_record(CYCLE_HEADER)?;

        Ok(Self { matches, events, stops, cycles, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_match(&mut self, row: &MatchRow) -> OutputResult<()> {
        self.matches.write_record(&[
            row.at_ms.to_string(),
            row.request.to_string(),
            row.ride.to_string(),
            row.driver.to_string(),
            row.passengers.to_string(),
            format!("{:.1}", row.cost_m),
            row.pickup_eta_ms.to_string(),
            row.dropoff_eta_ms.to_string(),
            row.offers.to_string(),
        ])?;
        Ok(())
    }

    fn write_ride_event(&mut self, row: &RideEventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.at_ms.to_string(),
            row.ride.to_string(),
            row.driver.to_string(),
            row.from.to_owned(),
            row.to.to_owned(),
        ])?;
        Ok(())
    }

    fn write_route(&mut self, rows: &[RouteStopRow]) -> OutputResult<()> {
        for row in rows {
            self.stops.write_record(&[
                row.at_ms.to_string(),
                row.driver.to_string(),
                row.seq.to_string(),
                row.kind.to_owned(),
                row.ride.to_string(),
                format!("{:.6}", row.lat),
                format!("{:.6}", row.lon),
                row.eta_ms.to_string(),
                row.passengers.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_cycle(&mut self, row: &CycleRow) -> OutputResult<()> {
        self.cycles.write_record(&[
            row.at_ms.to_string(),
            row.considered.to_string(),
            row.matched.to_string(),
            row.unmatched.to_string(),
            row.expired.to_string(),
            row.skipped.to_string(),
            row.errors.to_string(),
            row.active_routes.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.matches.flush()?;
        self.events.flush()?;
        self.stops.flush()?;
        self.cycles.flush()?;
        Ok(())
    }
}
