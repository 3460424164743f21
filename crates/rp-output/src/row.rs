//! Plain data row types written by output backends.
//!
//! Times are milliseconds on the dispatcher's clock.  Absent ids are
//! written as `u32::MAX`.

use rp_fleet::RideStatus;
use rp_route::StopKind;

/// One committed match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRow {
    pub at_ms:          i64,
    pub request:        u32,
    pub ride:           u32,
    pub driver:         u32,
    pub passengers:     u32,
    pub cost_m:         f64,
    pub pickup_eta_ms:  i64,
    pub dropoff_eta_ms: i64,
    pub offers:         u32,
}

/// A ride status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideEventRow {
    pub at_ms:  i64,
    pub ride:   u32,
    pub driver: u32,
    pub from:   &'static str,
    pub to:     &'static str,
}

/// One stop of a route snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStopRow {
    pub at_ms:      i64,
    pub driver:     u32,
    /// Position in the route; 0 is the driver's own position.
    pub seq:        u32,
    pub kind:       &'static str,
    pub ride:       u32,
    pub lat:        f64,
    pub lon:        f64,
    pub eta_ms:     i64,
    pub passengers: u32,
}

/// Counters of one search pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleRow {
    pub at_ms:         i64,
    pub considered:    u64,
    pub matched:       u64,
    pub unmatched:     u64,
    pub expired:       u64,
    pub skipped:       u64,
    pub errors:        u64,
    pub active_routes: u64,
}

pub fn status_name(status: RideStatus) -> &'static str {
    match status {
        RideStatus::Unassigned      => "unassigned",
        RideStatus::Assigned        => "assigned",
        RideStatus::DriverArrived   => "driver_arrived",
        RideStatus::PickedUp        => "picked_up",
        RideStatus::Completed       => "completed",
        RideStatus::RiderCancelled  => "rider_cancelled",
        RideStatus::DriverCancelled => "driver_cancelled",
        RideStatus::NoShowCancelled => "no_show",
        RideStatus::AdminCancelled  => "admin_cancelled",
    }
}

pub fn kind_name(kind: StopKind) -> &'static str {
    match kind {
        StopKind::CurrentLocation => "current",
        StopKind::Pickup(_)       => "pickup",
        StopKind::Dropoff(_)      => "dropoff",
    }
}
