use rp_core::{DriverId, GeoPoint, RequestId, RideId};
use rp_fleet::{FleetError, RideStatus};
use rp_planner::PlanError;
use rp_route::RouteError;
use thiserror::Error;

use crate::AdmissionError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch configuration error: {0}")]
    Config(String),

    #[error("request rejected: {0}")]
    Admission(#[from] AdmissionError),

    #[error("route of {0} stayed locked through every retry")]
    RouteBusy(DriverId),

    #[error("{0} has no active route")]
    NoRoute(DriverId),

    #[error("unknown driver {0}")]
    UnknownDriver(DriverId),

    #[error("unknown request {0}")]
    UnknownRequest(RequestId),

    #[error("unknown ride {0}")]
    UnknownRide(RideId),

    #[error("{ride} is {status:?}, which does not allow this operation")]
    WrongStatus { ride: RideId, status: RideStatus },

    #[error("{0} cannot take that many passengers aboard")]
    OverCapacity(DriverId),

    #[error("invalid position {0}")]
    InvalidPoint(GeoPoint),

    #[error("fleet error: {0}")]
    Fleet(#[from] FleetError),

    #[error("route error: {0}")]
    Route(#[from] RouteError),

    #[error("planning error: {0}")]
    Plan(#[from] PlanError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
