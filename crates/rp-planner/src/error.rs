use rp_route::RouteError;
use rp_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("route has no anchor stop")]
    EmptyRoute,

    #[error("route error: {0}")]
    Route(#[from] RouteError),

    #[error("travel estimate failed: {0}")]
    Spatial(#[from] SpatialError),
}

pub type PlanResult<T> = Result<T, PlanError>;
