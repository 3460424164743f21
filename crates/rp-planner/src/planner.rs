//! The `InsertionPlanner` trait: the dispatcher's pluggable search step.

use rp_core::{Capacity, GeoPoint, Load, RideId, Timestamp};
use rp_fleet::Location;
use rp_route::{Insertion, Projection, Stop};

use crate::PlanResult;

/// Tuning knobs shared by planners.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Max existing stops between a ride's pickup and its dropoff.
    pub max_intermediate_stops: usize,
    /// Never insert ahead of the stop the driver is already heading to.
    pub keep_first_stop:        bool,
    /// Full relocation sweeps per re-optimization.
    pub reopt_passes:           usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_intermediate_stops: 2,
            keep_first_stop:        true,
            reopt_passes:           2,
        }
    }
}

/// A ride to place: its two points and the load it brings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    pub pickup:  GeoPoint,
    pub dropoff: GeoPoint,
    pub load:    Load,
}

/// Everything a planner may read about one driver's route.
pub struct PlanContext<'a> {
    /// Annotated stops, anchor first.
    pub stops:    &'a [Stop],
    pub capacity: Capacity,
    pub location: &'a Location,
    pub proj:     Projection<'a>,
}

/// A feasible placement and what it costs.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub pickup_after:      usize,
    pub dropoff_after:     usize,
    /// Marginal route distance in metres.
    pub cost_m:            f64,
    /// Marginal route duration in seconds.
    pub added_secs:        f64,
    pub pickup_eta:        Timestamp,
    pub dropoff_eta:       Timestamp,
    /// Route distance the driver covers before the pickup.
    pub pickup_distance_m: f64,
    pub inversions:        u32,
}

impl Plan {
    /// The route insertion that realises this plan for `ride`.
    pub fn insertion(&self, ride: RideId, cand: &Candidate) -> Insertion {
        Insertion {
            ride,
            pickup:        cand.pickup,
            dropoff:       cand.dropoff,
            load:          cand.load,
            pickup_after:  self.pickup_after,
            dropoff_after: self.dropoff_after,
        }
    }
}

/// Pluggable insertion search.
///
/// # Thread safety
///
/// The dispatcher evaluates several drivers at once with the `parallel`
/// feature, so implementations must be `Send + Sync`.
pub trait InsertionPlanner: Send + Sync {
    /// Cheapest feasible placement of `cand`, or `None` if nothing fits.
    fn plan(&self, ctx: &PlanContext<'_>, cand: &Candidate) -> PlanResult<Option<Plan>>;

    /// A better ordering of the pending stops (`ctx.stops[1..]`), or `None`
    /// to keep the current one.
    ///
    /// Default: never reorders.
    fn reoptimize(&self, _ctx: &PlanContext<'_>) -> PlanResult<Option<Vec<Stop>>> {
        Ok(None)
    }
}

/// `true` if any pickup waiting in `before` is projected more than
/// `limit_secs` later in `after`.  Stops only in `after` are ignored.
pub(crate) fn delays_waiting_pickup(before: &[Stop], after: &[Stop], limit_secs: f64) -> bool {
    before.iter().filter(|s| s.kind.is_pickup()).any(|old| {
        after
            .iter()
            .find(|s| s.kind == old.kind)
            .is_some_and(|new| new.eta.secs_after(old.eta) > limit_secs)
    })
}
