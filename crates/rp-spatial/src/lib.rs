//! `rp-spatial`: travel-cost estimation and spatial lookups.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`estimator`] | `CostEstimator` trait, `Leg`, `GreatCircleEstimator`, `MatrixEstimator` |
//! | [`area`]      | `ServiceArea` polygon with point-in-polygon test              |
//! | [`index`]     | `DriverIndex`: R-tree of driver positions                    |
//! | [`error`]     | `SpatialError`, `SpatialResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod area;
pub mod error;
pub mod estimator;
pub mod index;

#[cfg(test)]
mod tests;

pub use area::ServiceArea;
pub use error::{SpatialError, SpatialResult};
pub use estimator::{CostEstimator, GreatCircleEstimator, Leg, MatrixEstimator};
pub use index::DriverIndex;
