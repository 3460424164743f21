//! `rp-dispatch`: matches waiting requests to drivers and keeps their
//! routes current as rides progress.
//!
//! # Search cycle
//!
//! ```text
//! search():
//!   ① Expire  : with a request timeout, cancel requests that waited too long.
//!   ② Claim   : walk Waiting requests oldest-first; claim each so a
//!               concurrent pass skips it.
//!   ③ Lock    : per eligible driver, try the route lock (never blocks;
//!               a busy route is skipped for this pass).
//!   ④ Plan    : run the insertion planner per locked driver
//!               (parallel with the `parallel` feature).
//!   ⑤ Commit  : best plan wins: zone bucket, then cost, then distance to
//!               pickup, then driver id.  Splice it in, create the ride,
//!               and release every lock.
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`config`]    | `DispatchConfig`, `RetryPolicy`                           |
//! | [`admission`] | `AdmissionError`, request validation                      |
//! | [`dispatcher`]| `Dispatcher` and `search()`                               |
//! | [`lifecycle`] | arrivals, pickups, drop-offs, cancellation, hails, positions |
//! | [`builder`]   | `DispatcherBuilder`                                       |
//! | [`scheduler`] | `Scheduler`: repeated `search()` on an interval          |
//! | [`observer`]  | `DispatchObserver`, `NoopObserver`, `CycleSummary`, `Match` |
//! | [`error`]     | `DispatchError`, `DispatchResult<T>`                      |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Evaluates candidate drivers on Rayon's thread pool.       |
//! | `fx-hash`  | FxHash for the request and ride stores.                   |
//! | `serde`    | `Serialize`/`Deserialize` for `DispatchConfig` and entities. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rp_core::SystemClock;
//! use rp_dispatch::{DispatchConfig, DispatcherBuilder, NoopObserver};
//!
//! let config = DispatchConfig::default();
//! let dispatcher = DispatcherBuilder::new(config.clone(), config.estimator(), SystemClock)
//!     .location(location)
//!     .drivers(drivers)
//!     .build()?;
//! let id = dispatcher.admit(new_request)?;
//! let summary = dispatcher.search(&mut NoopObserver);
//! ```

pub mod admission;
pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod observer;
pub mod scheduler;


pub use admission::AdmissionError;
pub use builder::DispatcherBuilder;
pub use config::{DispatchConfig, RetryPolicy};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use observer::{CycleSummary, DispatchObserver, Match, NoopObserver, SkipReason};
pub use scheduler::Scheduler;

#[cfg(feature = "fx-hash")]
pub(crate) type Map<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;
