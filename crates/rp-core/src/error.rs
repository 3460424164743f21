//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::GeoPoint;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid coordinate {0}")]
    InvalidPoint(GeoPoint),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `rp-core`.
pub type CoreResult<T> = Result<T, CoreError>;
