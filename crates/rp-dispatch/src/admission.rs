//! Request admission: everything that can be rejected before a route is
//! consulted.

use rp_core::{GeoPoint, LocationId};
use rp_fleet::{Location, NewRequest};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error("unknown location {0}")]
    UnknownLocation(LocationId),

    #[error("a request needs at least one passenger")]
    NoPassengers,

    #[error("{requested} passengers exceed the limit of {limit}")]
    TooManyPassengers { requested: u32, limit: u32 },

    #[error("{0} offers no ADA seats")]
    AdaUnavailable(LocationId),

    #[error("invalid coordinates {0}")]
    InvalidPoint(GeoPoint),

    #[error("{0} is outside the service area")]
    OutsideServiceArea(GeoPoint),
}

/// Check `new` against its location.
pub fn validate(new: &NewRequest, location: Option<&Location>) -> Result<(), AdmissionError> {
    let location = location.ok_or(AdmissionError::UnknownLocation(new.location))?;

    if new.passengers == 0 {
        return Err(AdmissionError::NoPassengers);
    }
    if new.passengers > location.passenger_limit {
        return Err(AdmissionError::TooManyPassengers {
            requested: new.passengers,
            limit:     location.passenger_limit,
        });
    }
    if new.ada && location.ada_capacity == Some(0) {
        return Err(AdmissionError::AdaUnavailable(location.id));
    }
    for p in [new.pickup, new.dropoff] {
        if !p.is_valid() {
            return Err(AdmissionError::InvalidPoint(p));
        }
        if !location.serves(p) {
            return Err(AdmissionError::OutsideServiceArea(p));
        }
    }
    Ok(())
}
