use rp_core::{DriverId, RideId};
use rp_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route of {0} is not locked by this holder")]
    LockLost(DriverId),

    #[error("insertion after stops {pickup_after}/{dropoff_after} is out of range for {len} stops")]
    BadInsertion {
        pickup_after:  usize,
        dropoff_after: usize,
        len:           usize,
    },

    #[error("no pending stop {0:?}")]
    UnknownStop(crate::StopKind),

    #[error("dropoff of {0} precedes its pickup")]
    Precedence(RideId),

    #[error("capacity exceeded after stop {0}")]
    CapacityExceeded(usize),

    #[error("more passengers leave than are aboard at stop {0}")]
    NegativeLoad(usize),

    #[error("replacement sequence does not contain the same stops")]
    MismatchedStops,

    #[error("travel estimate failed: {0}")]
    Spatial(#[from] SpatialError),
}

pub type RouteResult<T> = Result<T, RouteError>;
