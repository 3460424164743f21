//! Stops.

use rp_core::{GeoPoint, Load, RideId, Timestamp};

/// What a stop is for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopKind {
    /// The driver's position; always the first pending stop.
    CurrentLocation,
    Pickup(RideId),
    Dropoff(RideId),
}

impl StopKind {
    pub fn ride(self) -> Option<RideId> {
        match self {
            StopKind::CurrentLocation => None,
            StopKind::Pickup(r) | StopKind::Dropoff(r) => Some(r),
        }
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, StopKind::Pickup(_))
    }

    pub fn is_dropoff(self) -> bool {
        matches!(self, StopKind::Dropoff(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopStatus {
    Waiting,
    Done,
    Cancelled,
}

/// One stop of a route with its projected annotations.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    pub kind:           StopKind,
    pub point:          GeoPoint,
    /// Load of the ride this stop belongs to (zero for the anchor).
    pub load:           Load,
    pub status:         StopStatus,
    /// ETA projected when the stop was committed.
    pub initial_eta:    Option<Timestamp>,

    // ── Annotations (recomputed from the anchor) ──────────────────────────
    pub cum_distance_m: f64,
    /// Seconds from the anchor to this stop, including service time at
    /// earlier stops.
    pub cum_secs:       f64,
    pub eta:            Timestamp,
    /// Load aboard after this stop is served.
    pub onboard:        Load,
}

impl Stop {
    fn new(kind: StopKind, point: GeoPoint, load: Load) -> Self {
        Self {
            kind,
            point,
            load,
            status:         StopStatus::Waiting,
            initial_eta:    None,
            cum_distance_m: 0.0,
            cum_secs:       0.0,
            eta:            Timestamp::ZERO,
            onboard:        Load::ZERO,
        }
    }

    pub fn anchor(point: GeoPoint) -> Self {
        Self::new(StopKind::CurrentLocation, point, Load::ZERO)
    }

    pub fn pickup(ride: RideId, point: GeoPoint, load: Load) -> Self {
        Self::new(StopKind::Pickup(ride), point, load)
    }

    pub fn dropoff(ride: RideId, point: GeoPoint, load: Load) -> Self {
        Self::new(StopKind::Dropoff(ride), point, load)
    }

    /// Signed change in passengers aboard when this stop is served.
    pub fn delta(&self) -> i64 {
        match self.kind {
            StopKind::CurrentLocation => 0,
            StopKind::Pickup(_)       => i64::from(self.load.passengers),
            StopKind::Dropoff(_)      => -i64::from(self.load.passengers),
        }
    }

    /// Load aboard after serving this stop, given `before`.  `None` if a
    /// dropoff would take off more than is aboard.
    pub fn apply(&self, before: Load) -> Option<Load> {
        match self.kind {
            StopKind::CurrentLocation => Some(before),
            StopKind::Pickup(_)       => Some(before + self.load),
            StopKind::Dropoff(_)      => before.checked_sub(self.load),
        }
    }
}
