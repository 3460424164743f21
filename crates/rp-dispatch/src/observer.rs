//! Dispatch observer trait for progress reporting and data collection.

use rp_core::{DriverId, RequestId, RideId, Timestamp};
use rp_fleet::{Request, Ride, RideStatus};
use rp_route::Stop;

use crate::DispatchError;

/// A committed assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub at:          Timestamp,
    pub request:     RequestId,
    pub ride:        RideId,
    pub driver:      DriverId,
    pub passengers:  u32,
    pub cost_m:      f64,
    pub pickup_eta:  Timestamp,
    pub dropoff_eta: Timestamp,
    /// Drivers whose plans were compared.
    pub offers:      usize,
}

/// Why an otherwise eligible driver was left out of a request's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Vehicle matching rule rejects the request's zones.
    ZoneRule,
    /// Route already holds `max_pending_stops` or more.
    TooManyStops,
    /// Location does not pool and the route has work.
    NotPooling,
    /// Route lock held by another pass.
    RouteBusy,
}

/// Counters for one `search()` pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub at:            Timestamp,
    pub considered:    usize,
    pub matched:       usize,
    pub unmatched:     usize,
    pub expired:       usize,
    pub skipped:       usize,
    pub errors:        usize,
    pub active_routes: usize,
}

/// Callbacks invoked by [`Dispatcher`][crate::Dispatcher] as requests are
/// matched and rides progress.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: match counter
///
/// ```rust,ignore
/// struct Counter(usize);
///
/// impl DispatchObserver for Counter {
///     fn on_match(&mut self, _m: &Match) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait DispatchObserver {
    fn on_cycle_start(&mut self, _at: Timestamp) {}

    fn on_match(&mut self, _m: &Match) {}

    /// A ride moved from `from` to `ride.status`.
    fn on_ride_status(&mut self, _ride: &Ride, _from: RideStatus, _at: Timestamp) {}

    /// A driver's stop list changed.  `stops[0]` is the anchor.
    fn on_route_changed(&mut self, _driver: DriverId, _stops: &[Stop], _at: Timestamp) {}

    /// A request found no driver this pass and stays waiting.
    fn on_unmatched(&mut self, _request: &Request, _at: Timestamp) {}

    /// A request waited past the timeout and was cancelled.
    fn on_request_expired(&mut self, _request: &Request, _at: Timestamp) {}

    fn on_driver_skipped(&mut self, _request: RequestId, _driver: DriverId, _reason: SkipReason) {}

    /// Evaluating `driver` for `request` failed.  The pair is dropped; the
    /// pass continues.
    fn on_evaluation_error(&mut self, _request: RequestId, _driver: DriverId, _err: &DispatchError) {}

    fn on_cycle_end(&mut self, _summary: &CycleSummary) {}
}

/// A [`DispatchObserver`] that does nothing.
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}
