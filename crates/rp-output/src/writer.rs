//! The `OutputWriter` trait implemented by all backend writers.

use crate::{CycleRow, MatchRow, OutputResult, RideEventRow, RouteStopRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors never reach the dispatcher; the observer stores them for
/// [`DispatchOutputObserver::take_error`](crate::DispatchOutputObserver::take_error).
pub trait OutputWriter {
    fn write_match(&mut self, row: &MatchRow) -> OutputResult<()>;

    fn write_ride_event(&mut self, row: &RideEventRow) -> OutputResult<()>;

    /// Write one route snapshot (every stop of one route at one instant).
    fn write_route(&mut self, rows: &[RouteStopRow]) -> OutputResult<()>;

    fn write_cycle(&mut self, row: &CycleRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
