//! Rides and their status machine.
//!
//! ```text
//! Unassigned ─► Assigned ─► DriverArrived ─► PickedUp ─► Completed
//!                  └─────────────────────────►┘
//! ```
//!
//! Any state before `PickedUp` may end in a cancellation.  `NoShowCancelled`
//! is only reachable once the driver has arrived.
//!
//! Hailed rides are created already `PickedUp`: the passengers boarded
//! before the dispatcher heard of them.

use rp_core::{DriverId, GeoPoint, Load, LocationId, RequestId, RideId, RiderId, Timestamp};

use crate::{CancelReason, FleetError, FleetResult, Request};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RideStatus {
    Unassigned,
    Assigned,
    DriverArrived,
    PickedUp,
    Completed,
    RiderCancelled,
    DriverCancelled,
    NoShowCancelled,
    AdminCancelled,
}

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RideStatus::Completed
                | RideStatus::RiderCancelled
                | RideStatus::DriverCancelled
                | RideStatus::NoShowCancelled
                | RideStatus::AdminCancelled
        )
    }

    pub fn is_cancelled(self) -> bool {
        self.is_terminal() && self != RideStatus::Completed
    }

    /// Passengers are in the vehicle.
    pub fn is_onboard(self) -> bool {
        self == RideStatus::PickedUp
    }

    pub fn can_transition_to(self, next: RideStatus) -> bool {
        use RideStatus::*;
        match (self, next) {
            (Unassigned, Assigned) => true,
            (Assigned, DriverArrived | PickedUp) => true,
            (DriverArrived, PickedUp | NoShowCancelled) => true,
            (PickedUp, Completed) => true,
            (Unassigned | Assigned | DriverArrived, RiderCancelled | DriverCancelled | AdminCancelled) => true,
            _ => false,
        }
    }

    /// Terminal status for a cancellation of the given kind.
    pub fn cancelled_by(reason: CancelReason) -> RideStatus {
        match reason {
            CancelReason::Rider  => RideStatus::RiderCancelled,
            CancelReason::Driver => RideStatus::DriverCancelled,
            CancelReason::NoShow => RideStatus::NoShowCancelled,
            CancelReason::Admin | CancelReason::NoDriversAvailable => RideStatus::AdminCancelled,
        }
    }
}

/// A ride assigned to a driver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ride {
    pub id:          RideId,
    /// `None` for hailed rides.
    pub request:     Option<RequestId>,
    pub driver:      DriverId,
    pub rider:       Option<RiderId>,
    pub location:    LocationId,
    pub pickup:      GeoPoint,
    pub dropoff:     GeoPoint,
    pub passengers:  u32,
    pub ada:         bool,
    pub status:      RideStatus,
    pub created_at:  Timestamp,
    /// Pickup ETA projected when the ride was matched.
    pub initial_eta: Option<Timestamp>,
    /// Latest projected pickup ETA (or drop-off ETA once on board).
    pub eta:         Option<Timestamp>,
}

impl Ride {
    /// Ride created for a matched request; starts `Unassigned` and is moved
    /// to `Assigned` by the dispatcher on commit.
    pub fn from_request(id: RideId, request: &Request, driver: DriverId, now: Timestamp) -> Self {
        Self {
            id,
            request:     Some(request.id),
            driver,
            rider:       request.rider,
            location:    request.location,
            pickup:      request.pickup,
            dropoff:     request.dropoff,
            passengers:  request.passengers,
            ada:         request.ada,
            status:      RideStatus::Unassigned,
            created_at:  now,
            initial_eta: None,
            eta:         None,
        }
    }

    /// Driver-initiated ride with no rider; passengers are already aboard.
    pub fn hailed(
        id:         RideId,
        driver:     DriverId,
        location:   LocationId,
        at:         GeoPoint,
        passengers: u32,
        ada:        bool,
        now:        Timestamp,
    ) -> Self {
        Self {
            id,
            request:     None,
            driver,
            rider:       None,
            location,
            pickup:      at,
            dropoff:     at,
            passengers,
            ada,
            status:      RideStatus::PickedUp,
            created_at:  now,
            initial_eta: Some(now),
            eta:         Some(now),
        }
    }

    pub fn is_hailed(&self) -> bool {
        self.request.is_none() && self.rider.is_none()
    }

    pub fn load(&self) -> Load {
        Load::ride(self.passengers, self.ada)
    }

    /// Move to `next`, rejecting transitions the status machine forbids.
    pub fn transition(&mut self, next: RideStatus) -> FleetResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(FleetError::InvalidTransition { ride: self.id, from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}
