//! Spatial-subsystem error type.

use thiserror::Error;

use rp_core::GeoPoint;

/// Errors produced by `rp-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("invalid coordinate {0}")]
    InvalidPoint(GeoPoint),

    #[error("service area needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),

    #[error("negative travel estimate from {from} to {to}")]
    NegativeLeg { from: GeoPoint, to: GeoPoint },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
