//! `Scheduler`: repeated `search()` passes on a fixed interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use rp_core::Clock;
use rp_planner::InsertionPlanner;
use rp_spatial::CostEstimator;

use crate::{CycleSummary, DispatchObserver, Dispatcher};

/// Upper bound on the summaries reserved up front by [`Scheduler::run`].
const PREALLOC_CYCLES: u64 = 1024;

/// Drives a [`Dispatcher`] from an external trigger.
///
/// The scheduler holds no state of its own beyond the interval; several
/// schedulers may share one dispatcher.
pub struct Scheduler<'d, E: CostEstimator, C: Clock, P: InsertionPlanner> {
    dispatcher: &'d Dispatcher<E, C, P>,
}

impl<'d, E: CostEstimator, C: Clock, P: InsertionPlanner> Scheduler<'d, E, C, P> {
    pub fn new(dispatcher: &'d Dispatcher<E, C, P>) -> Self {
        Self { dispatcher }
    }

    /// Run `n_cycles` passes, starting each `interval` after the previous
    /// one started.  A pass that overruns starts the next immediately.
    pub fn run<O: DispatchObserver>(&self, n_cycles: u64, interval: Duration, observer: &mut O) -> Vec<CycleSummary> {
        let mut summaries = Vec::with_capacity(prealloc(n_cycles));
        for cycle in 0..n_cycles {
            let started = Instant::now();
            summaries.push(self.dispatcher.search(observer));
            if cycle + 1 < n_cycles {
                pause(started, interval);
            }
        }
        summaries
    }

    /// Run passes until `stop` is set.  Returns the number of passes.
    pub fn run_until<O: DispatchObserver>(&self, stop: &AtomicBool, interval: Duration, observer: &mut O) -> u64 {
        let mut cycles = 0;
        while !stop.load(Ordering::Acquire) {
            let started = Instant::now();
            self.dispatcher.search(observer);
            cycles += 1;
            pause(started, interval);
        }
        debug!(cycles, "scheduler stopped");
        cycles
    }
}

pub(crate) fn prealloc(n_cycles: u64) -> usize {
    n_cycles.min(PREALLOC_CYCLES) as usize
}

fn pause(started: Instant, interval: Duration) {
    if let Some(rest) = interval.checked_sub(started.elapsed()) {
        thread::sleep(rest);
    }
}
