//! `rp-planner`: where does a new ride fit into a route?
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`planner`]    | `InsertionPlanner` trait, `PlanContext`, `Candidate`, `Plan`, `PlannerConfig` |
//! | [`cheapest`]   | `CheapestInsertion`: exhaustive pair enumeration            |
//! | [`reoptimize`] | ride-relocation local search over pending stops              |
//! | [`error`]      | `PlanError`, `PlanResult<T>`                                 |
//!
//! # Feasibility
//!
//! A pickup/dropoff pair is feasible at positions `(p, d)` when, in order:
//!
//! 1. the load aboard over the affected window stays within capacity
//!    (passengers, ADA seats, and distinct rides independently);
//! 2. the dropoff follows at most `max_intermediate_stops` existing stops
//!    after the pickup;
//! 3. the whole route still finishes within the location's queue-time limit
//!    (skipped for an empty route);
//! 4. no waiting rider's pickup ETA slips by more than the location's
//!    ETA-increase limit.
//!
//! Among feasible pairs the cheapest marginal detour wins, except that
//! pairs within the location's inversion range of the cheapest are treated
//! as equal and ordered by fewest inversions first.

pub mod cheapest;
pub mod error;
pub mod planner;
pub mod reoptimize;

#[cfg(test)]
mod tests;

pub use cheapest::CheapestInsertion;
pub use error::{PlanError, PlanResult};
pub use planner::{Candidate, InsertionPlanner, Plan, PlanContext, PlannerConfig};
