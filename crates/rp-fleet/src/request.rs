//! Ride requests.

use rp_core::{GeoPoint, Load, LocationId, RequestId, RideId, RiderId, Timestamp, ZoneId};

/// Why a request or ride was cancelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CancelReason {
    Rider,
    Driver,
    NoShow,
    Admin,
    /// Waited longer than the configured request timeout.
    NoDriversAvailable,
}

/// Lifecycle of a request.  Only `Waiting` requests are searched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestStatus {
    Waiting,
    Matched(RideId),
    Cancelled(CancelReason),
}

/// Admission input: a request as submitted, before validation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewRequest {
    pub rider:        Option<RiderId>,
    pub location:     LocationId,
    pub pickup:       GeoPoint,
    pub dropoff:      GeoPoint,
    pub pickup_zone:  Option<ZoneId>,
    pub dropoff_zone: Option<ZoneId>,
    pub passengers:   u32,
    pub ada:          bool,
}

impl NewRequest {
    pub fn new(location: LocationId, pickup: GeoPoint, dropoff: GeoPoint, passengers: u32) -> Self {
        Self {
            rider: None,
            location,
            pickup,
            dropoff,
            pickup_zone: None,
            dropoff_zone: None,
            passengers,
            ada: false,
        }
    }

    pub fn rider(mut self, rider: RiderId) -> Self {
        self.rider = Some(rider);
        self
    }

    pub fn ada(mut self, ada: bool) -> Self {
        self.ada = ada;
        self
    }

    pub fn zones(mut self, pickup: Option<ZoneId>, dropoff: Option<ZoneId>) -> Self {
        self.pickup_zone = pickup;
        self.dropoff_zone = dropoff;
        self
    }
}

/// An admitted request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    pub id:             RequestId,
    pub rider:          Option<RiderId>,
    pub location:       LocationId,
    pub pickup:         GeoPoint,
    pub dropoff:        GeoPoint,
    pub pickup_zone:    Option<ZoneId>,
    pub dropoff_zone:   Option<ZoneId>,
    pub passengers:     u32,
    pub ada:            bool,
    pub requested_at:   Timestamp,
    pub status:         RequestStatus,
    /// Search passes that found no driver.
    pub search_retries: u32,
    pub last_retry:     Option<Timestamp>,
}

impl Request {
    pub fn admit(id: RequestId, new: NewRequest, now: Timestamp) -> Self {
        Self {
            id,
            rider:          new.rider,
            location:       new.location,
            pickup:         new.pickup,
            dropoff:        new.dropoff,
            pickup_zone:    new.pickup_zone,
            dropoff_zone:   new.dropoff_zone,
            passengers:     new.passengers,
            ada:            new.ada,
            requested_at:   now,
            status:         RequestStatus::Waiting,
            search_retries: 0,
            last_retry:     None,
        }
    }

    pub fn load(&self) -> Load {
        Load::ride(self.passengers, self.ada)
    }

    pub fn is_waiting(&self) -> bool {
        self.status == RequestStatus::Waiting
    }

    /// Record a pass that found no driver.
    pub fn note_retry(&mut self, now: Timestamp) {
        self.search_retries += 1;
        self.last_retry = Some(now);
    }
}
