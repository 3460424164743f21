//! coimbra: replay a morning of pooled bookings against a small fleet.
//!
//! Booked requests come from an embedded CSV, the rest are synthetic
//! (seeded).  A manual clock advances one minute per dispatch cycle; between
//! cycles every driver serves whatever stops it has reached, so the run
//! exercises matching, pickups, drop-offs, and re-optimization end to end.

mod scenario;

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use rp_core::{Clock, DriverId, ManualClock, RequestId, Timestamp};
use rp_dispatch::{
    CycleSummary, DispatchError, DispatchObserver, Dispatcher, DispatcherBuilder, Match, SkipReason,
};
use rp_fleet::{Request, Ride, RideStatus};
use rp_output::{CsvWriter, DispatchOutputObserver, OutputWriter};
use rp_route::{Stop, StopKind};
use rp_spatial::GreatCircleEstimator;

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:         u64   = 7;
const SYNTHETIC:    usize = 40;
const HORIZON_SECS: i64   = 45 * 60;
const CYCLE_SECS:   i64   = 60;
const CYCLES:       u32   = 90; // 90 minutes: the horizon plus time to finish rides
const OUTPUT_DIR:   &str  = "output/coimbra";

type Demo = Dispatcher<GreatCircleEstimator, ManualClock>;

// ── Observer wrapper to count events ──────────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:     DispatchOutputObserver<W>,
    matches:   usize,
    unmatched: usize,
    skipped:   usize,
    completed: usize,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: DispatchOutputObserver<W>) -> Self {
        Self { inner, matches: 0, unmatched: 0, skipped: 0, completed: 0 }
    }
}

impl<W: OutputWriter> DispatchObserver for CountingObserver<W> {
    fn on_match(&mut self, m: &Match) {
        self.matches += 1;
        self.inner.on_match(m);
    }

    fn on_ride_status(&mut self, ride: &Ride, from: RideStatus, at: Timestamp) {
        if ride.status == RideStatus::Completed {
            self.completed += 1;
        }
        self.inner.on_ride_status(ride, from, at);
    }

    fn on_route_changed(&mut self, driver: DriverId, stops: &[Stop], at: Timestamp) {
        self.inner.on_route_changed(driver, stops, at);
    }

    fn on_unmatched(&mut self, _request: &Request, _at: Timestamp) {
        self.unmatched += 1;
    }

    fn on_driver_skipped(&mut self, _request: RequestId, _driver: DriverId, _reason: SkipReason) {
        self.skipped += 1;
    }

    fn on_evaluation_error(&mut self, request: RequestId, driver: DriverId, err: &DispatchError) {
        eprintln!("  evaluation error for {request} on {driver}: {err}");
    }

    fn on_cycle_end(&mut self, summary: &CycleSummary) {
        self.inner.on_cycle_end(summary);
    }
}

// ── Driver playback ───────────────────────────────────────────────────────────

/// Serve every stop whose ETA has passed.  Drivers jump to the stop.
fn serve_due_stops<O: DispatchObserver>(d: &Demo, observer: &mut O) {
    let now = d.clock().now();
    for driver in d.routes().drivers() {
        loop {
            let Some(route) = d.route(driver) else {
                break;
            };
            let Some(next) = route.pending().first().cloned() else {
                break;
            };
            if next.eta > now {
                break;
            }
            if let Err(err) = serve(d, driver, &next, observer) {
                eprintln!("  {driver} could not serve {:?}: {err}", next.kind);
                break;
            }
        }
    }
}

fn serve<O: DispatchObserver>(d: &Demo, driver: DriverId, stop: &Stop, observer: &mut O) -> Result<(), DispatchError> {
    d.report_position(driver, stop.point)?;
    match stop.kind {
        StopKind::Pickup(ride) => {
            d.driver_arrived(ride, observer)?;
            d.pick_up(ride, observer)
        }
        StopKind::Dropoff(ride) => d.drop_off(ride, observer),
        StopKind::CurrentLocation => Ok(()),
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    println!("=== coimbra - pooled dispatch replay ===");
    println!("Synthetic requests: {SYNTHETIC}  |  Horizon: {} min  |  Seed: {SEED}", HORIZON_SECS / 60);
    println!();

    // 1. Inputs.
    let config = scenario::config()?;
    let location = scenario::location()?;
    let drivers = scenario::drivers()?;
    let requests = scenario::requests(SYNTHETIC, HORIZON_SECS, SEED)?;
    println!(
        "Location {:?}: pooling {}, {} drivers, {} requests",
        location.name,
        location.pooling_enabled,
        drivers.len(),
        requests.len()
    );

    // 2. Dispatcher on a manual clock.
    let dispatcher = DispatcherBuilder::new(config.clone(), config.estimator(), ManualClock::new(Timestamp::ZERO))
        .location(location)
        .drivers(drivers)
        .build()?;

    // 3. Output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = CountingObserver::new(DispatchOutputObserver::new(writer));

    // 4. Replay: admit what is due, search, let a minute pass, serve stops.
    let mut due = requests.into_iter().peekable();
    let mut rejected = 0;
    let t0 = Instant::now();
    for _ in 0..CYCLES {
        let now_secs = dispatcher.clock().now().as_secs_f64() as i64;
        while let Some(s) = due.next_if(|s| s.at_secs <= now_secs) {
            if let Err(err) = dispatcher.admit(s.request) {
                rejected += 1;
                println!("  t={:>4}s rejected: {err}", s.at_secs);
            }
        }
        dispatcher.search(&mut obs);
        dispatcher.clock().advance_secs(CYCLE_SECS);
        serve_due_stops(&dispatcher, &mut obs);
    }
    let elapsed = t0.elapsed();

    obs.inner.finish();
    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!();
    println!("Replay complete in {:.3} s", elapsed.as_secs_f64());
    println!("  matched   : {}", obs.matches);
    println!("  completed : {}", obs.completed);
    println!("  rejected  : {rejected}");
    println!("  unmatched : {} search attempts", obs.unmatched);
    println!("  skipped   : {} driver evaluations", obs.skipped);
    println!("  still waiting: {}", dispatcher.waiting().len());
    println!();

    // 6. Per-driver table.
    let rides = dispatcher.rides();
    println!("{:<10} {:<8} {:<10} {:<8}", "Driver", "Rides", "Completed", "Pending");
    println!("{}", "-".repeat(40));
    let mut ids: Vec<DriverId> = rides.iter().map(|r| r.driver).collect();
    ids.sort();
    ids.dedup();
    for id in ids {
        let mine = rides.iter().filter(|r| r.driver == id);
        let total = mine.clone().count();
        let done = mine.filter(|r| r.status == RideStatus::Completed).count();
        let pending = dispatcher.route(id).map_or(0, |r| r.pending().len());
        println!("{:<10} {:<8} {:<10} {:<8}", id.to_string(), total, done, pending);
    }
    println!();
    println!("CSV output in {OUTPUT_DIR}/");

    Ok(())
}
