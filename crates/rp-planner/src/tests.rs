//! Unit tests for rp-planner.
//!
//! Stops sit on a north-south line, the estimator runs at 10 m/s and every
//! served stop costs 120 s of dwell.

#[cfg(test)]
mod helpers {
    use std::time::Duration;

    use rp_core::{Capacity, DriverId, GeoPoint, Load, LocationId, RideId, Timestamp};
    use rp_fleet::Location;
    use rp_route::{Insertion, Projection, Route, StopKind};
    use rp_spatial::GreatCircleEstimator;

    use crate::{Candidate, PlanContext};

    pub fn est() -> GreatCircleEstimator {
        GreatCircleEstimator::new(36.0)
    }

    pub fn north(m: f64) -> GeoPoint {
        GeoPoint::new(40.2, -8.4).offset_m(m, 0.0)
    }

    pub fn pooled() -> Location {
        Location::new(LocationId(1), "test").with_pooling(true)
    }

    pub fn cap() -> Capacity {
        Capacity::new(5, 1, 3)
    }

    pub fn proj(e: &GreatCircleEstimator) -> Projection<'_> {
        Projection::new(e, Timestamp::ZERO, 120.0)
    }

    pub fn cand(from: f64, to: f64, passengers: u32) -> Candidate {
        Candidate { pickup: north(from), dropoff: north(to), load: Load::ride(passengers, false) }
    }

    /// A route serving `rides` one after another, in the given order.
    pub fn route_of(e: &GreatCircleEstimator, rides: &[(u32, f64, f64, Load)]) -> Route {
        let mut r = Route::new(DriverId(1), north(0.0), Timestamp::ZERO);
        let token = r.try_lock(Timestamp::ZERO, Duration::from_secs(10)).unwrap();
        for &(id, from, to, load) in rides {
            let end = r.stops().len() - 1;
            let ins = Insertion {
                ride:          RideId(id),
                pickup:        north(from),
                dropoff:       north(to),
                load,
                pickup_after:  end,
                dropoff_after: end,
            };
            r.commit(token, &ins, Capacity::new(9, 9, 9), &proj(e)).unwrap();
        }
        r
    }

    pub fn ctx<'a>(
        route:    &'a Route,
        location: &'a Location,
        capacity: Capacity,
        e:        &'a GreatCircleEstimator,
    ) -> PlanContext<'a> {
        PlanContext { stops: route.stops(), capacity, location, proj: proj(e) }
    }

    pub fn kinds(stops: &[rp_route::Stop]) -> Vec<StopKind> {
        stops.iter().map(|s| s.kind).collect()
    }
}

#[cfg(test)]
mod insertion {
    use rp_core::{Capacity, Load, Timestamp};
    use rp_route::Projection;

    use super::helpers::*;
    use crate::{CheapestInsertion, InsertionPlanner, PlanContext, PlanError, PlannerConfig};

    #[test]
    fn empty_route_goes_straight_there() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[]);
        let plan = CheapestInsertion::default()
            .plan(&ctx(&route, &loc, cap(), &e), &cand(1000.0, 3000.0, 1))
            .unwrap()
            .unwrap();

        assert_eq!((plan.pickup_after, plan.dropoff_after), (0, 0));
        assert!((plan.cost_m - 3000.0).abs() < 1.0, "cost {}", plan.cost_m);
        assert!((plan.pickup_distance_m - 1000.0).abs() < 1.0);
        assert!((plan.pickup_eta.as_secs_f64() - 100.0).abs() < 0.5);
        // 100 s to the pickup, 120 s dwell, 200 s on to the dropoff.
        assert!((plan.dropoff_eta.as_secs_f64() - 420.0).abs() < 0.5);
        assert_eq!(plan.inversions, 0);
    }

    #[test]
    fn no_anchor_is_an_error() {
        let e = est();
        let loc = pooled();
        let c = PlanContext { stops: &[], capacity: cap(), location: &loc, proj: Projection::new(&e, Timestamp::ZERO, 120.0) };
        let err = CheapestInsertion::default().plan(&c, &cand(0.0, 10.0, 1)).unwrap_err();
        assert!(matches!(err, PlanError::EmptyRoute));
    }

    #[test]
    fn keeps_the_first_stop_unless_told_otherwise() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 3000.0, Load::ride(1, false))]);
        let c = ctx(&route, &loc, cap(), &e);
        let near = cand(10.0, 500.0, 1);

        let kept = CheapestInsertion::default().plan(&c, &near).unwrap().unwrap();
        assert!(kept.pickup_after >= 1);

        let free = CheapestInsertion::new(PlannerConfig { keep_first_stop: false, ..PlannerConfig::default() });
        let plan = free.plan(&c, &near).unwrap().unwrap();
        assert_eq!(plan.pickup_after, 0);
    }

    #[test]
    fn full_vehicle_forces_sequential_service() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 3000.0, Load::ride(4, false))]);
        let c = ctx(&route, &loc, cap(), &e);
        let planner = CheapestInsertion::default();

        let plan = planner.plan(&c, &cand(1500.0, 2500.0, 2)).unwrap().unwrap();
        assert_eq!((plan.pickup_after, plan.dropoff_after), (2, 2));

        assert!(planner.plan(&c, &cand(1500.0, 2500.0, 6)).unwrap().is_none());
    }

    #[test]
    fn one_ada_seat_is_never_shared() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 3000.0, Load::ride(1, true))]);
        let c = ctx(&route, &loc, cap(), &e);
        let mut ada = cand(1500.0, 2500.0, 1);
        ada.load = Load::ride(1, true);

        let plan = CheapestInsertion::default().plan(&c, &ada).unwrap().unwrap();
        assert_eq!(plan.pickup_after, 2);
    }

    #[test]
    fn single_ride_capacity_without_pooling() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 3000.0, Load::ride(1, false))]);
        let c = ctx(&route, &loc, Capacity::new(5, 1, 1), &e);

        let plan = CheapestInsertion::default().plan(&c, &cand(1500.0, 2500.0, 1)).unwrap().unwrap();
        assert_eq!(plan.pickup_after, 2);
    }

    #[test]
    fn eta_limit_protects_waiting_pickups() {
        let e = est();
        let route = route_of(&e, &[
            (1, 1000.0, 1500.0, Load::ride(1, false)),
            (2, 2000.0, 3000.0, Load::ride(1, false)),
        ]);
        let rider = cand(1200.0, 1400.0, 1);

        let relaxed = pooled();
        let plan = CheapestInsertion::default()
            .plan(&ctx(&route, &relaxed, cap(), &e), &rider)
            .unwrap()
            .unwrap();
        assert!(plan.pickup_after < 3);

        // Anything ahead of ride 2's pickup adds two dwells to its ETA.
        let strict = rp_fleet::Location { eta_increase_limit_mins: 1, ..pooled() };
        let plan = CheapestInsertion::default()
            .plan(&ctx(&route, &strict, cap(), &e), &rider)
            .unwrap()
            .unwrap();
        assert!(plan.pickup_after >= 3, "{plan:?}");
    }

    #[test]
    fn queue_limit_only_binds_busy_routes() {
        let e = est();
        let loc = rp_fleet::Location { queue_time_limit_mins: 1, ..pooled() };
        let far = cand(5000.0, 9000.0, 1);

        let busy = route_of(&e, &[(1, 100.0, 200.0, Load::ride(1, false))]);
        assert!(CheapestInsertion::default().plan(&ctx(&busy, &loc, cap(), &e), &far).unwrap().is_none());

        let idle = route_of(&e, &[]);
        assert!(CheapestInsertion::default().plan(&ctx(&idle, &loc, cap(), &e), &far).unwrap().is_some());
    }

    #[test]
    fn identical_trip_keeps_existing_order() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 3000.0, Load::ride(1, false))]);
        let plan = CheapestInsertion::default()
            .plan(&ctx(&route, &loc, cap(), &e), &cand(1000.0, 3000.0, 1))
            .unwrap()
            .unwrap();

        // Both stops go behind ride 1's.
        assert_eq!((plan.pickup_after, plan.dropoff_after), (1, 2));
        assert_eq!(plan.inversions, 0);
        assert!(plan.cost_m.abs() < 1.0);
    }

    #[test]
    fn intermediate_stop_limit() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[
            (1, 1000.0, 1100.0, Load::ride(1, false)),
            (2, 1200.0, 1300.0, Load::ride(1, false)),
        ]);
        let config = PlannerConfig { max_intermediate_stops: 0, ..PlannerConfig::default() };
        let plan = CheapestInsertion::new(config)
            .plan(&ctx(&route, &loc, cap(), &e), &cand(1050.0, 1250.0, 1))
            .unwrap()
            .unwrap();
        assert_eq!(plan.pickup_after, plan.dropoff_after);
    }
}

#[cfg(test)]
mod reoptimize {
    use rp_core::{Load, RideId};
    use rp_route::StopKind;

    use super::helpers::*;
    use crate::{CheapestInsertion, InsertionPlanner, PlannerConfig};

    fn one() -> Load {
        Load::ride(1, false)
    }

    #[test]
    fn pulls_a_long_dropoff_to_the_end() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 5000.0, one()), (2, 2000.0, 3000.0, one())]);

        let pending = CheapestInsertion::default()
            .reoptimize(&ctx(&route, &loc, cap(), &e))
            .unwrap()
            .expect("a shorter order exists");

        assert_eq!(kinds(&pending), vec![
            StopKind::Pickup(RideId(1)),
            StopKind::Pickup(RideId(2)),
            StopKind::Dropoff(RideId(2)),
            StopKind::Dropoff(RideId(1)),
        ]);
    }

    #[test]
    fn optimal_route_is_left_alone() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 2000.0, one()), (2, 3000.0, 4000.0, one())]);
        assert!(CheapestInsertion::default().reoptimize(&ctx(&route, &loc, cap(), &e)).unwrap().is_none());

        let single = route_of(&e, &[(1, 1000.0, 2000.0, one())]);
        assert!(CheapestInsertion::default().reoptimize(&ctx(&single, &loc, cap(), &e)).unwrap().is_none());
    }

    #[test]
    fn first_stop_is_pinned() {
        let e = est();
        let loc = pooled();
        let route = route_of(&e, &[(1, 3000.0, 4000.0, one()), (2, 1000.0, 2000.0, one())]);
        let c = ctx(&route, &loc, cap(), &e);

        assert!(CheapestInsertion::default().reoptimize(&c).unwrap().is_none());

        let free = CheapestInsertion::new(PlannerConfig { keep_first_stop: false, ..PlannerConfig::default() });
        let pending = free.reoptimize(&c).unwrap().unwrap();
        assert_eq!(kinds(&pending), vec![
            StopKind::Pickup(RideId(2)),
            StopKind::Dropoff(RideId(2)),
            StopKind::Pickup(RideId(1)),
            StopKind::Dropoff(RideId(1)),
        ]);
    }

    #[test]
    fn small_gains_do_not_churn() {
        let e = est();
        // 10 m of backtracking is well inside the inversion range.
        let loc = pooled();
        let route = route_of(&e, &[(1, 1000.0, 1010.0, one()), (2, 1005.0, 2000.0, one())]);
        assert!(CheapestInsertion::default().reoptimize(&ctx(&route, &loc, cap(), &e)).unwrap().is_none());
    }
}
