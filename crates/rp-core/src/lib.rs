//! `rp-core`: foundational types for the ride-pooling dispatch engine.
//!
//! Every other `rp-*` crate depends on this one.  It has no `rp-*`
//! dependencies and only `thiserror` (plus optional `serde`) from outside.
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`ids`]    | `DriverId`, `RequestId`, `RideId`, `RiderId`, `LocationId`, `ZoneId` |
//! | [`geo`]    | `GeoPoint`, haversine distance, feet/metre conversion      |
//! | [`time`]   | `Timestamp`, `Clock`, `SystemClock`, `ManualClock`         |
//! | [`load`]   | `Load`, `Capacity`: passenger / ADA / ride counters       |
//! | [`error`]  | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod load;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, feet_to_m};
pub use ids::{DriverId, LocationId, RequestId, RideId, RiderId, ZoneId};
pub use load::{Capacity, Load};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
