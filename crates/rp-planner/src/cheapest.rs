//! Exhaustive cheapest insertion.
//!
//! For a route of `n` stops (anchor included) there are at most
//! `n·(n+1)/2` pickup/dropoff pairs; with routes capped at a handful of
//! pending stops every pair is projected and checked in full.

use tracing::debug;

use rp_core::{GeoPoint, RideId};
use rp_route::{Insertion, Stop, annotate, feasible_prefix_capacity};

use crate::planner::delays_waiting_pickup;
use crate::reoptimize::relocate_rides;
use crate::{Candidate, InsertionPlanner, Plan, PlanContext, PlanError, PlanResult, PlannerConfig};

#[derive(Debug, Clone, Default)]
pub struct CheapestInsertion {
    pub config: PlannerConfig,
}

impl CheapestInsertion {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// First index the pickup may follow.
    fn first_slot(&self, n: usize) -> usize {
        if self.config.keep_first_stop && n > 1 { 1 } else { 0 }
    }
}

impl InsertionPlanner for CheapestInsertion {
    fn plan(&self, ctx: &PlanContext<'_>, cand: &Candidate) -> PlanResult<Option<Plan>> {
        let stops = ctx.stops;
        let n = stops.len();
        let Some(last) = stops.last() else {
            return Err(PlanError::EmptyRoute);
        };
        let (base_m, base_secs) = (last.cum_distance_m, last.cum_secs);
        let eta_limit = ctx.location.eta_increase_limit_secs();
        let queue_limit = ctx.location.queue_time_limit_secs();
        let range_m = ctx.location.inversion_range_m();

        let mut feasible = Vec::new();
        for p in self.first_slot(n)..n {
            if !feasible_prefix_capacity(stops, cand.load, p, p, ctx.capacity) {
                continue;
            }
            for d in p..n {
                if d - p > self.config.max_intermediate_stops {
                    break;
                }
                // Every wider window contains this stop too.
                if !feasible_prefix_capacity(stops, cand.load, d, d, ctx.capacity) {
                    break;
                }
                let ins = Insertion {
                    ride:          RideId::INVALID,
                    pickup:        cand.pickup,
                    dropoff:       cand.dropoff,
                    load:          cand.load,
                    pickup_after:  p,
                    dropoff_after: d,
                };
                let mut seq = ins.apply_to(stops)?;
                annotate(&mut seq, &ctx.proj)?;

                let end = &seq[seq.len() - 1];
                if n > 1 && end.cum_secs > queue_limit {
                    continue;
                }
                if delays_waiting_pickup(stops, &seq, eta_limit) {
                    continue;
                }
                let (pick, drop) = (&seq[p + 1], &seq[d + 2]);
                feasible.push(Plan {
                    pickup_after:      p,
                    dropoff_after:     d,
                    cost_m:            end.cum_distance_m - base_m,
                    added_secs:        end.cum_secs - base_secs,
                    pickup_eta:        pick.eta,
                    dropoff_eta:       drop.eta,
                    pickup_distance_m: pick.cum_distance_m,
                    inversions:        inversions(stops, cand, p, d, range_m),
                });
            }
        }

        let chosen = select(feasible, range_m);
        if let Some(plan) = &chosen {
            debug!(
                pickup_after = plan.pickup_after,
                dropoff_after = plan.dropoff_after,
                cost_m = plan.cost_m,
                inversions = plan.inversions,
                "insertion found"
            );
        }
        Ok(chosen)
    }

    fn reoptimize(&self, ctx: &PlanContext<'_>) -> PlanResult<Option<Vec<Stop>>> {
        relocate_rides(&self.config, ctx)
    }
}

/// Existing stops the new ride jumps ahead of while sharing their spot.
///
/// A pickup inserted after `stops[p]` overtakes `stops[p+1..]`; any of those
/// within `range_m` of the new pickup were effectively there first.  Same
/// for the dropoff after `stops[d]`.
fn inversions(stops: &[Stop], cand: &Candidate, p: usize, d: usize, range_m: f64) -> u32 {
    let near = |from: usize, point: GeoPoint| {
        stops[from + 1..].iter().filter(|s| s.point.distance_m(point) <= range_m).count()
    };
    (near(p, cand.pickup) + near(d, cand.dropoff)) as u32
}

/// Cheapest plan, with near-ties broken by fewest inversions and then by
/// position so existing stops keep their order.
fn select(feasible: Vec<Plan>, range_m: f64) -> Option<Plan> {
    let best = feasible.iter().map(|p| p.cost_m).min_by(f64::total_cmp)?;
    feasible
        .into_iter()
        .filter(|p| p.cost_m <= best + range_m)
        .min_by(|a, b| {
            a.inversions
                .cmp(&b.inversions)
                .then_with(|| a.cost_m.total_cmp(&b.cost_m))
                .then_with(|| a.pickup_after.cmp(&b.pickup_after))
                .then_with(|| a.dropoff_after.cmp(&b.dropoff_after))
        })
}
