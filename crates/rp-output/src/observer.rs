//! `DispatchOutputObserver<W>`: bridges `DispatchObserver` to an `OutputWriter`.

use rp_core::{DriverId, RideId, Timestamp};
use rp_dispatch::{CycleSummary, DispatchObserver, Match};
use rp_fleet::{Ride, RideStatus};
use rp_route::Stop;

use crate::row::{CycleRow, MatchRow, RideEventRow, RouteStopRow, kind_name, status_name};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`DispatchObserver`] that writes matches, ride transitions, route
/// snapshots, and cycle counters to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  Check them with [`take_error`][Self::take_error]
/// once the dispatcher is done.
pub struct DispatchOutputObserver<W: OutputWriter> {
    writer:     W,
    routes:     bool,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> DispatchOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, routes: true, last_error: None }
    }

    /// Turn route snapshots on or off.  They are the bulk of the output.
    pub fn with_routes(mut self, enabled: bool) -> Self {
        self.routes = enabled;
        self
    }

    /// Flush the writer.  Errors are stored like any other.
    pub fn finish(&mut self) {
        let result = self.writer.finish();
        self.store_err(result);
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

fn id_or_max(ride: Option<RideId>) -> u32 {
    ride.map_or(u32::MAX, |r| r.0)
}

impl<W: OutputWriter> DispatchObserver for DispatchOutputObserver<W> {
    fn on_match(&mut self, m: &Match) {
        let row = MatchRow {
            at_ms:          m.at.0,
            request:        m.request.0,
            ride:           m.ride.0,
            driver:         m.driver.0,
            passengers:     m.passengers,
            cost_m:         m.cost_m,
            pickup_eta_ms:  m.pickup_eta.0,
            dropoff_eta_ms: m.dropoff_eta.0,
            offers:         m.offers as u32,
        };
        let result = self.writer.write_match(&row);
        self.store_err(result);
    }

    fn on_ride_status(&mut self, ride: &Ride, from: RideStatus, at: Timestamp) {
        let row = RideEventRow {
            at_ms:  at.0,
            ride:   ride.id.0,
            driver: ride.driver.0,
            from:   status_name(from),
            to:     status_name(ride.status),
        };
        let result = self.writer.write_ride_event(&row);
        self.store_err(result);
    }

    fn on_route_changed(&mut self, driver: DriverId, stops: &[Stop], at: Timestamp) {
        if !self.routes {
            return;
        }
        let rows: Vec<RouteStopRow> = stops
            .iter()
            .enumerate()
            .map(|(seq, s)| RouteStopRow {
                at_ms:      at.0,
                driver:     driver.0,
                seq:        seq as u32,
                kind:       kind_name(s.kind),
                ride:       id_or_max(s.kind.ride()),
                lat:        s.point.lat,
                lon:        s.point.lon,
                eta_ms:     s.eta.0,
                passengers: s.onboard.passengers,
            })
            .collect();
        let result = self.writer.write_route(&rows);
        self.store_err(result);
    }

    fn on_cycle_end(&mut self, summary: &CycleSummary) {
        let row = CycleRow {
            at_ms:         summary.at.0,
            considered:    summary.considered as u64,
            matched:       summary.matched as u64,
            unmatched:     summary.unmatched as u64,
            expired:       summary.expired as u64,
            skipped:       summary.skipped as u64,
            errors:        summary.errors as u64,
            active_routes: summary.active_routes as u64,
        };
        let result = self.writer.write_cycle(&row);
        self.store_err(result);
    }
}
