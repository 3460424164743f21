//! Unit tests for rp-route.
//!
//! Stops sit on a north-south line so distances are easy to read off.  The
//! estimator runs at 36 km/h, i.e. 10 m/s.

#[cfg(test)]
mod helpers {
    use rp_core::{Capacity, DriverId, GeoPoint, Load, RideId, Timestamp};
    use rp_spatial::GreatCircleEstimator;

    use crate::{Insertion, Projection, Route};

    pub const SERVICE: f64 = 120.0;

    pub fn est() -> GreatCircleEstimator {
        GreatCircleEstimator::new(36.0)
    }

    pub fn origin() -> GeoPoint {
        GeoPoint::new(40.2, -8.4)
    }

    pub fn north(m: f64) -> GeoPoint {
        origin().offset_m(m, 0.0)
    }

    pub fn proj(e: &GreatCircleEstimator, now: Timestamp) -> Projection<'_> {
        Projection::new(e, now, SERVICE)
    }

    pub fn cap() -> Capacity {
        Capacity::new(5, 1, 3)
    }

    pub fn route() -> Route {
        Route::new(DriverId(1), origin(), Timestamp::ZERO)
    }

    pub fn ins(ride: u32, from: f64, to: f64, passengers: u32, p: usize, d: usize) -> Insertion {
        Insertion {
            ride:          RideId(ride),
            pickup:        north(from),
            dropoff:       north(to),
            load:          Load::ride(passengers, false),
            pickup_after:  p,
            dropoff_after: d,
        }
    }
}

#[cfg(test)]
mod locking {
    use std::time::Duration;

    use rp_core::Timestamp;

    use super::helpers::*;
    use crate::{RouteError, RouteLock};

    const TTL: Duration = Duration::from_secs(10);

    #[test]
    fn lock_is_idempotent_and_release_is_unconditional() {
        let mut r = route();
        assert!(r.lock(Timestamp(0)));
        assert!(r.lock(Timestamp(5)));
        assert!(r.is_locked());
        r.release();
        assert!(!r.is_locked());
        r.release();
        assert_eq!(r.lock_state(), RouteLock::Unlocked);
    }

    #[test]
    fn try_lock_respects_live_lock() {
        let mut r = route();
        let t = r.try_lock(Timestamp(0), TTL).unwrap();
        assert!(r.try_lock(Timestamp::from_secs(9), TTL).is_none());
        assert!(r.release_token(t));
        assert!(r.try_lock(Timestamp::from_secs(9), TTL).is_some());
    }

    #[test]
    fn stale_lock_is_broken_and_old_token_lost() {
        let e = est();
        let mut r = route();
        let old = r.try_lock(Timestamp(0), TTL).unwrap();
        let new = r.try_lock(Timestamp::from_secs(10), TTL).unwrap();
        assert_ne!(old, new);

        let err = r.commit(old, &ins(1, 100.0, 200.0, 1, 0, 0), cap(), &proj(&e, Timestamp::from_secs(10)));
        assert!(matches!(err, Err(RouteError::LockLost(_))));
        assert!(!r.release_token(old));
        assert!(r.is_locked());
        assert!(r.release_token(new));
    }

    #[test]
    fn mutation_without_lock_fails() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), TTL).unwrap();
        r.release();
        assert!(matches!(r.recompute(t, &proj(&e, Timestamp(0))), Err(RouteError::LockLost(_))));
    }
}

#[cfg(test)]
mod sequence {
    use std::time::Duration;

    use rp_core::{Load, RideId, Timestamp};

    use super::helpers::*;
    use crate::{RouteError, StopKind, check_sequence};

    #[test]
    fn commit_annotates_etas_and_load() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        let stops = r.commit(t, &ins(1, 1_000.0, 3_000.0, 4, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();

        assert_eq!(stops.len(), 3);
        assert_eq!(stops[1].kind, StopKind::Pickup(RideId(1)));
        assert!((stops[1].cum_secs - 100.0).abs() < 0.5, "got {}", stops[1].cum_secs);
        // 100 s drive, 120 s service, 200 s drive.
        assert!((stops[2].cum_secs - 420.0).abs() < 0.5, "got {}", stops[2].cum_secs);
        assert_eq!(stops[1].onboard.passengers, 4);
        assert_eq!(stops[2].onboard, Load::ZERO);
        assert_eq!(stops[1].initial_eta, Some(stops[1].eta));
        assert!((r.total_distance_m() - 3_000.0).abs() < 1.0);
        assert_eq!(r.ride_eta(RideId(1)), Some(r.stops()[1].eta));
    }

    #[test]
    fn prefix_capacity_window() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 4, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();

        // While ride 1 is aboard only one more seat is free.
        assert!(r.feasible_prefix_capacity(Load::ride(1, false), 1, 1, cap()));
        assert!(!r.feasible_prefix_capacity(Load::ride(2, false), 1, 1, cap()));
        // After its dropoff there is room for five.
        assert!(r.feasible_prefix_capacity(Load::ride(5, false), 2, 2, cap()));
        assert!(!r.feasible_prefix_capacity(Load::ride(1, false), 2, 1, cap()));
    }

    #[test]
    fn overfull_commit_is_rejected() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        let p = proj(&e, Timestamp(0));
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 4, 0, 0), cap(), &p).unwrap();
        let err = r.commit(t, &ins(2, 1_500.0, 2_000.0, 2, 1, 1), cap(), &p);
        assert!(matches!(err, Err(RouteError::CapacityExceeded(2))));
        assert_eq!(r.pending().len(), 2);
    }

    #[test]
    fn out_of_range_insertion_is_rejected() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        let err = r.commit(t, &ins(1, 1.0, 2.0, 1, 0, 3), cap(), &proj(&e, Timestamp(0)));
        assert!(matches!(err, Err(RouteError::BadInsertion { len: 1, .. })));
    }

    #[test]
    fn dropoff_before_pickup_is_invalid() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 1, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();
        let mut seq = r.stops().to_vec();
        seq.swap(1, 2);
        assert!(matches!(check_sequence(&seq, cap()), Err(RouteError::Precedence(_))));
    }
}

#[cfg(test)]
mod lifecycle {
    use std::time::Duration;

    use rp_core::{Load, RideId, Timestamp};

    use super::helpers::*;
    use crate::{RouteError, StopKind, StopStatus};

    #[test]
    fn serving_moves_stops_to_history() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 2, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();

        let early = r.complete_stop(t, StopKind::Dropoff(RideId(1)), &proj(&e, Timestamp(0)));
        assert!(matches!(early, Err(RouteError::Precedence(_))));

        let now = Timestamp::from_secs(100);
        let done = r.complete_stop(t, StopKind::Pickup(RideId(1)), &proj(&e, now)).unwrap();
        assert_eq!(done.status, StopStatus::Done);
        assert_eq!(r.passed().len(), 1);
        assert_eq!(r.stops()[0].point, north(1_000.0));
        assert_eq!(r.onboard_at_anchor(), Load::ride(2, false));
        assert_eq!(r.pending().len(), 1);

        r.complete_stop(t, StopKind::Dropoff(RideId(1)), &proj(&e, now)).unwrap();
        assert!(r.is_idle());
        assert!(matches!(
            r.complete_stop(t, StopKind::Dropoff(RideId(1)), &proj(&e, now)),
            Err(RouteError::UnknownStop(_))
        ));
    }

    #[test]
    fn cancel_removes_both_stops() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        let p = proj(&e, Timestamp(0));
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 2, 0, 0), cap(), &p).unwrap();
        r.commit(t, &ins(2, 1_200.0, 2_000.0, 1, 1, 1), cap(), &p).unwrap();
        assert_eq!(r.rides(), vec![RideId(1), RideId(2)]);

        assert_eq!(r.cancel_ride(t, RideId(1), &p).unwrap(), 2);
        assert_eq!(r.rides(), vec![RideId(2)]);
        assert!(r.passed().iter().all(|s| s.status == StopStatus::Cancelled));
        assert!((r.stops()[1].cum_distance_m - 1_200.0).abs() < 1.0);
    }

    #[test]
    fn reordering_keeps_history_and_rejects_foreign_stops() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        let p = proj(&e, Timestamp(0));
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 1, 0, 0), cap(), &p).unwrap();
        r.commit(t, &ins(2, 500.0, 800.0, 1, 0, 0), cap(), &p).unwrap();
        r.complete_stop(t, StopKind::Pickup(RideId(2)), &p).unwrap();

        // Pending: D2, P1, D1.  Swap to P1, D2, D1.
        let mut pending = r.pending().to_vec();
        pending.swap(0, 1);
        r.replace_pending(t, pending, cap(), &p).unwrap();
        assert_eq!(r.pending()[0].kind, StopKind::Pickup(RideId(1)));
        assert_eq!(r.passed().len(), 1);
        assert_eq!(r.passed()[0].kind, StopKind::Pickup(RideId(2)));

        let mut foreign = r.pending().to_vec();
        foreign.pop();
        assert!(matches!(r.replace_pending(t, foreign, cap(), &p), Err(RouteError::MismatchedStops)));
    }

    #[test]
    fn hailed_load_counts_aboard() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        let p = proj(&e, Timestamp(0));
        r.add_hailed(t, Load::ride(3, false), &p).unwrap();
        assert!(!r.is_idle());
        assert_eq!(r.stops()[0].onboard.passengers, 3);

        let err = r.commit(t, &ins(1, 100.0, 200.0, 3, 0, 0), cap(), &p);
        assert!(matches!(err, Err(RouteError::CapacityExceeded(_))));

        r.remove_hailed(t, Load::ride(9, false), &p).unwrap();
        assert!(r.is_idle());
    }

    #[test]
    fn current_stops_is_a_projection() {
        let e = est();
        let mut r = route();
        let t = r.try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        r.commit(t, &ins(1, 1_000.0, 3_000.0, 1, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();

        let live = r.current_stops(north(500.0), &proj(&e, Timestamp::from_secs(50))).unwrap();
        assert!((live[1].cum_distance_m - 500.0).abs() < 1.0);
        assert_eq!(live[1].eta, Timestamp::from_secs(50).plus_secs(live[1].cum_secs));
        assert!((r.stops()[1].cum_distance_m - 1_000.0).abs() < 1.0);
    }
}

#[cfg(test)]
mod book {
    use std::sync::Arc;
    use std::time::Duration;

    use rp_core::{DriverId, Timestamp};

    use super::helpers::*;
    use crate::{RouteBook, guard};

    #[test]
    fn one_route_per_driver() {
        let book = RouteBook::new();
        let a = book.get_or_create(DriverId(1), origin(), Timestamp(0));
        let b = book.get_or_create(DriverId(1), north(10.0), Timestamp(5));
        assert!(Arc::ptr_eq(&a, &b));
        book.get_or_create(DriverId(0), origin(), Timestamp(0));
        assert_eq!(book.drivers(), vec![DriverId(0), DriverId(1)]);
    }

    #[test]
    fn idle_unlocked_routes_retire() {
        let e = est();
        let book = RouteBook::new();
        let r = book.get_or_create(DriverId(1), origin(), Timestamp(0));
        let t = guard(&r).try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        assert!(!book.retire_if_idle(DriverId(1)));

        guard(&r).commit(t, &ins(1, 10.0, 20.0, 1, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();
        guard(&r).release_token(t);
        assert!(!book.retire_if_idle(DriverId(1)));
        assert_eq!(book.snapshot(DriverId(1)).unwrap().pending().len(), 2);

        let t = guard(&r).try_lock(Timestamp(0), Duration::from_secs(10)).unwrap();
        guard(&r).cancel_ride(t, rp_core::RideId(1), &proj(&e, Timestamp(0))).unwrap();
        guard(&r).release();
        assert!(book.retire_if_idle(DriverId(1)));
        assert!(book.is_empty());
    }

    #[test]
    fn retired_handle_cannot_be_locked() {
        let book = RouteBook::new();
        let held = book.get_or_create(DriverId(1), origin(), Timestamp(0));
        assert!(book.retire_if_idle(DriverId(1)));

        let mut r = guard(&held);
        assert!(r.is_retired());
        assert!(r.try_lock(Timestamp(0), Duration::from_secs(10)).is_none());
        assert!(!r.lock(Timestamp(0)));
        assert!(!r.is_locked());
    }

    #[test]
    fn ride_committed_after_retire_lands_in_the_book() {
        let e = est();
        let book = RouteBook::new();
        let stale = book.get_or_create(DriverId(1), origin(), Timestamp(0));
        assert!(book.retire_if_idle(DriverId(1)));

        let (route, t) = book
            .lock_or_create(DriverId(1), origin(), Timestamp(0), Duration::from_secs(10))
            .unwrap();
        assert!(!Arc::ptr_eq(&route, &stale));
        guard(&route).commit(t, &ins(1, 10.0, 20.0, 1, 0, 0), cap(), &proj(&e, Timestamp(0))).unwrap();
        guard(&route).release_token(t);

        assert!(Arc::ptr_eq(&route, &book.get(DriverId(1)).unwrap()));
        assert_eq!(book.snapshot(DriverId(1)).unwrap().pending().len(), 2);
        assert!(guard(&stale).pending().is_empty());
    }

    #[test]
    fn lock_or_create_respects_a_live_holder() {
        let book = RouteBook::new();
        let ttl = Duration::from_secs(10);
        let (_route, _t) = book.lock_or_create(DriverId(1), origin(), Timestamp(0), ttl).unwrap();
        assert!(book.lock_or_create(DriverId(1), origin(), Timestamp(1), ttl).is_none());
        assert!(!book.retire_if_idle(DriverId(1)));
        assert_eq!(book.len(), 1);
    }
}
