//! `rp-route`: per-driver routes.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                          |
//! |-----------|-------------------------------------------------------------------|
//! | [`stop`]  | `Stop`, `StopKind`, `StopStatus`                                  |
//! | [`lock`]  | `RouteLock` tagged state, `LockToken`                             |
//! | [`route`] | `Route`, `Insertion`, `Projection`, sequence checks and annotation |
//! | [`book`]  | `RouteBook`: registry of active routes, one per driver           |
//! | [`error`] | `RouteError`, `RouteResult<T>`                                    |
//!
//! # Route model
//!
//! A route is a fixed history of passed stops plus a pending sequence whose
//! first element is always the driver's current position
//! ([`StopKind::CurrentLocation`]).  Every stop in the pending sequence
//! carries annotations recomputed from that anchor: cumulative distance,
//! cumulative time, ETA, and the load aboard after the stop.
//!
//! # Locking
//!
//! Any change to the stop order requires the [`LockToken`] handed out when
//! the route was locked.  A lock older than the configured TTL can be broken
//! by the next caller; the old holder's token then stops working, so a
//! holder that stalled past its TTL cannot commit over newer work.

pub mod book;
pub mod error;
pub mod lock;
pub mod route;
pub mod stop;

#[cfg(test)]
mod tests;

pub use book::{RouteBook, guard};
pub use error::{RouteError, RouteResult};
pub use lock::{LockToken, RouteLock};
pub use route::{Insertion, Projection, Route, annotate, check_sequence, feasible_prefix_capacity};
pub use stop::{Stop, StopKind, StopStatus};
