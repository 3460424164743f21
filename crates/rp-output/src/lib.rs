//! `rp-output`: dispatch output writers.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                                     |
//! |-----------|---------|-------------------------------------------------------------------|
//! | *(none)*  | CSV     | `matches.csv`, `ride_events.csv`, `route_stops.csv`, `cycles.csv` |
//! | `sqlite`  | SQLite  | `dispatch.db`                                                     |
//!
//! Both implement [`OutputWriter`] and are driven by
//! [`DispatchOutputObserver`], which implements
//! `rp_dispatch::DispatchObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rp_output::{CsvWriter, DispatchOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = DispatchOutputObserver::new(writer);
//! Scheduler::new(&dispatcher).run(60, interval, &mut obs);
//! obs.finish();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::DispatchOutputObserver;
pub use row::{CycleRow, MatchRow, RideEventRow, RouteStopRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
