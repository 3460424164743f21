//! `rp-fleet`: the entities the dispatcher works on.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`location`] | `Location`: service area and per-location dispatch limits      |
//! | [`driver`]   | `Driver`, `Vehicle`, `MatchingRule`, `CallBucket`               |
//! | [`request`]  | `Request`, `NewRequest`, `RequestStatus`, `CancelReason`        |
//! | [`ride`]     | `Ride`, `RideStatus` state machine                              |
//! | [`queue`]    | `RequestQueue`: waiting requests, oldest first, with claims    |
//! | [`loader`]   | CSV loading of drivers and scheduled requests                   |
//! | [`error`]    | `FleetError`, `FleetResult<T>`                                  |

pub mod driver;
pub mod error;
pub mod loader;
pub mod location;
pub mod queue;
pub mod request;
pub mod ride;


pub use driver::{CallBucket, Driver, MatchingRule, Vehicle};
pub use error::{FleetError, FleetResult};
pub use loader::{ScheduledRequest, load_drivers_csv, load_drivers_reader, load_requests_csv, load_requests_reader};
pub use location::Location;
pub use queue::RequestQueue;
pub use request::{CancelReason, NewRequest, Request, RequestStatus};
pub use ride::{Ride, RideStatus};
