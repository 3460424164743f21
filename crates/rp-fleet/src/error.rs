use rp_core::RideId;
use rp_spatial::SpatialError;
use thiserror::Error;

use crate::RideStatus;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("ride {ride} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        ride: RideId,
        from: RideStatus,
        to:   RideStatus,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),
}

pub type FleetResult<T> = Result<T, FleetError>;
