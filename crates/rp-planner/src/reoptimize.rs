//! Ride-relocation local search.
//!
//! Each sweep lifts one ride's movable stops out of the route and puts them
//! back at the cheapest valid spot.  A move is kept only when it shortens
//! the route by more than the location's inversion range, so near-equal
//! orders never churn.  The anchor (and with `keep_first_stop` the stop
//! right after it) never moves; passed stops are not in the sequence at all.

use tracing::debug;

use rp_core::RideId;
use rp_route::{Stop, StopKind, annotate, check_sequence};

use crate::planner::delays_waiting_pickup;
use crate::{PlanContext, PlanResult, PlannerConfig};

/// A shorter pending order, or `None` if no move pays off.
pub fn relocate_rides(config: &PlannerConfig, ctx: &PlanContext<'_>) -> PlanResult<Option<Vec<Stop>>> {
    if ctx.stops.len() < 3 {
        return Ok(None);
    }
    let mut current = ctx.stops.to_vec();
    let mut moves = 0usize;

    for _ in 0..config.reopt_passes {
        let mut improved = false;
        for ride in rides_in(&current) {
            if let Some(better) = relocate(config, ctx, &current, ride)? {
                current = better;
                improved = true;
                moves += 1;
            }
        }
        if !improved {
            break;
        }
    }

    if moves == 0 {
        return Ok(None);
    }
    debug!(
        moves,
        before_m = ctx.stops[ctx.stops.len() - 1].cum_distance_m,
        after_m = current[current.len() - 1].cum_distance_m,
        "route re-optimized"
    );
    Ok(Some(current.split_off(1)))
}

/// Rides with a pending stop, in route order.
fn rides_in(stops: &[Stop]) -> Vec<RideId> {
    let mut out: Vec<RideId> = Vec::new();
    for r in stops.iter().filter_map(|s| s.kind.ride()) {
        if !out.contains(&r) {
            out.push(r);
        }
    }
    out
}

fn relocate(
    config: &PlannerConfig,
    ctx:    &PlanContext<'_>,
    seq:    &[Stop],
    ride:   RideId,
) -> PlanResult<Option<Vec<Stop>>> {
    let fixed = if config.keep_first_stop { 2 } else { 1 };
    let movable: Vec<usize> = (fixed..seq.len())
        .filter(|&i| seq[i].kind.ride() == Some(ride))
        .collect();
    if movable.is_empty() {
        return Ok(None);
    }

    let mut base = seq.to_vec();
    let mut moved: Vec<Stop> = movable.iter().rev().map(|&i| base.remove(i)).collect();
    moved.reverse();

    // A lone dropoff may not go ahead of its own (fixed) pickup.
    let earliest = match moved.as_slice() {
        [only] if only.kind.is_dropoff() => base
            .iter()
            .position(|s| s.kind == StopKind::Pickup(ride))
            .unwrap_or(0)
            .max(fixed - 1),
        _ => fixed - 1,
    };

    let eta_limit = ctx.location.eta_increase_limit_secs();
    let target = seq[seq.len() - 1].cum_distance_m - ctx.location.inversion_range_m();
    let mut best: Option<(f64, Vec<Stop>)> = None;

    for p in earliest..base.len() {
        let dropoff_slots = if moved.len() == 2 { p..base.len() } else { p..p + 1 };
        for d in dropoff_slots {
            let mut cand = base.clone();
            match moved.as_slice() {
                [pickup, dropoff] => {
                    cand.insert(d + 1, dropoff.clone());
                    cand.insert(p + 1, pickup.clone());
                }
                [only] => cand.insert(p + 1, only.clone()),
                _ => return Ok(None),
            }
            if check_sequence(&cand, ctx.capacity).is_err() {
                continue;
            }
            annotate(&mut cand, &ctx.proj)?;
            if delays_waiting_pickup(ctx.stops, &cand, eta_limit) {
                continue;
            }
            let total = cand[cand.len() - 1].cum_distance_m;
            if total < target && best.as_ref().is_none_or(|(b, _)| total < *b) {
                best = Some((total, cand));
            }
        }
    }
    Ok(best.map(|(_, s)| s))
}
