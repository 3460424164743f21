//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `dispatch.db` file in the configured output directory
//! with tables `matches`, `ride_events`, `route_stops`, and `cycles`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{CycleRow, MatchRow, OutputResult, RideEventRow, RouteStopRow};

/// Writes dispatch output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `dispatch.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("dispatch.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS matches (
                 at_ms          INTEGER NOT NULL,
                 request        INTEGER PRIMARY KEY,
                 ride           INTEGER NOT NULL,
                 driver         INTEGER NOT NULL,
                 passengers     INTEGER NOT NULL,
                 cost_m         REAL    NOT NULL,
                 pickup_eta_ms  INTEGER NOT NULL,
                 dropoff_eta_ms INTEGER NOT NULL,
                 offers         INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS ride_events (
                 at_ms  INTEGER NOT NULL,
                 ride   INTEGER NOT NULL,
                 driver INTEGER NOT NULL,
                 from_status TEXT NOT NULL,
                 to_status   TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS route_stops (
                 at_ms      INTEGER NOT NULL,
                 driver     INTEGER NOT NULL,
                 seq        INTEGER NOT NULL,
                 kind       TEXT    NOT NULL,
                 ride       INTEGER NOT NULL,
                 lat        REAL    NOT NULL,
                 lon        REAL    NOT NULL,
                 eta_ms     INTEGER NOT NULL,
                 passengers INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS cycles (
                 at_ms         INTEGER NOT NULL,
                 considered    INTEGER NOT NULL,
                 matched       INTEGER NOT NULL,
                 unmatched     INTEGER NOT NULL,
                 expired       INTEGER NOT NULL,
                 skipped       INTEGER NOT NULL,
                 errors        INTEGER NOT NULL,
                 active_routes INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_match(&mut self, row: &MatchRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO matches \
             (at_ms, request, ride, driver, passengers, cost_m, pickup_eta_ms, dropoff_eta_ms, offers) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                row.at_ms,
                row.request,
                row.ride,
                row.driver,
                row.passengers,
                row.cost_m,
                row.pickup_eta_ms,
                row.dropoff_eta_ms,
                row.offers,
            ],
        )?;
        Ok(())
    }

    fn write_ride_event(&mut self, row: &RideEventRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO ride_events (at_ms, ride, driver, from_status, to_status) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![row.at_ms, row.ride, row.driver, row.from, row.to],
        )?;
        Ok(())
    }

    fn write_route(&mut self, rows: &[RouteStopRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO route_stops \
                 (at_ms, driver, seq, kind, ride, lat, lon, eta_ms, passengers) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.at_ms,
                    row.driver,
                    row.seq,
                    row.kind,
                    row.ride,
                    row.lat,
                    row.lon,
                    row.eta_ms,
                    row.passengers,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_cycle(&mut self, row: &CycleRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO cycles \
             (at_ms, considered, matched, unmatched, expired, skipped, errors, active_routes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                row.at_ms,
                row.considered,
                row.matched,
                row.unmatched,
                row.expired,
                row.skipped,
                row.errors,
                row.active_routes,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
