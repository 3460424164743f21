//! Ride lifecycle: arrivals, pickups, drop-offs, cancellations, hails, and
//! position reports.
//!
//! Every operation that touches a route takes its lock first.  Unlike
//! `search()`, which skips a busy route, lifecycle operations retry with a
//! short doubling backoff ([`RetryPolicy`](crate::RetryPolicy)) and give up
//! with [`DispatchError::RouteBusy`].  Ride status checks happen while the
//! route lock is held, so two operations on one ride never interleave.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, warn};

use rp_core::{Capacity, Clock, DriverId, GeoPoint, Load, LocationId, RideId, Timestamp};
use rp_fleet::{CancelReason, FleetError, Location, RequestStatus, Ride, RideStatus};
use rp_planner::{InsertionPlanner, PlanContext};
use rp_route::{LockToken, Projection, Route, Stop, StopKind, guard};
use rp_spatial::CostEstimator;

use crate::admission::AdmissionError;
use crate::dispatcher::write;
use crate::{DispatchError, DispatchObserver, DispatchResult, Dispatcher};

impl<E: CostEstimator, C: Clock, P: InsertionPlanner> Dispatcher<E, C, P> {
    // ── Ride lifecycle ────────────────────────────────────────────────────

    /// The driver reached the pickup.  No route change.
    pub fn driver_arrived<O: DispatchObserver>(&self, ride: RideId, observer: &mut O) -> DispatchResult<()> {
        let now = self.clock.now();
        let (ride, from) = self.transition(ride, RideStatus::DriverArrived)?;
        observer.on_ride_status(&ride, from, now);
        Ok(())
    }

    /// Riders boarded: the pickup stop is served.
    pub fn pick_up<O: DispatchObserver>(&self, ride: RideId, observer: &mut O) -> DispatchResult<()> {
        let now = self.clock.now();
        let current = self.ride(ride).ok_or(DispatchError::UnknownRide(ride))?;
        let proj = self.projection(now);

        let ((updated, from), stops) = self.with_route(current.driver, || self.active_route(current.driver), |r, token| {
            self.check(ride, RideStatus::PickedUp)?;
            r.complete_stop(token, StopKind::Pickup(ride), &proj)?;
            Ok((self.transition(ride, RideStatus::PickedUp)?, r.stops().to_vec()))
        })?;

        self.sync_etas(&stops);
        debug!(ride = %ride, driver = %current.driver, "picked up");
        observer.on_ride_status(&updated, from, now);
        observer.on_route_changed(current.driver, &stops, now);
        Ok(())
    }

    /// Riders got off.  Frees their capacity and re-optimizes what is left.
    /// Hailed rides are completed via [`complete_hail`](Self::complete_hail).
    pub fn drop_off<O: DispatchObserver>(&self, ride: RideId, observer: &mut O) -> DispatchResult<()> {
        let current = self.ride(ride).ok_or(DispatchError::UnknownRide(ride))?;
        if current.is_hailed() {
            return self.complete_hail(ride, observer);
        }
        let now = self.clock.now();
        let (location, cap) = self.route_limits(current.driver, current.location)?;
        let proj = self.projection(now);

        let ((updated, from), stops) = self.with_route(current.driver, || self.active_route(current.driver), |r, token| {
            self.check(ride, RideStatus::Completed)?;
            r.complete_stop(token, StopKind::Dropoff(ride), &proj)?;
            let moved = self.transition(ride, RideStatus::Completed)?;
            self.reoptimize_locked(r, token, location, cap, &proj);
            Ok((moved, r.stops().to_vec()))
        })?;

        self.finish_route_change(current.driver, &stops, now, observer);
        info!(ride = %ride, driver = %current.driver, "ride completed");
        observer.on_ride_status(&updated, from, now);
        Ok(())
    }

    /// Cancel a ride that has not been picked up.  Its stops leave the
    /// route, the rest is re-optimized, and a matched request is marked
    /// cancelled with the same reason.
    pub fn cancel_ride<O: DispatchObserver>(
        &self,
        ride:     RideId,
        reason:   CancelReason,
        observer: &mut O,
    ) -> DispatchResult<()> {
        let now = self.clock.now();
        let current = self.ride(ride).ok_or(DispatchError::UnknownRide(ride))?;
        let next = RideStatus::cancelled_by(reason);

        let (updated, from) = match self.routes.get(current.driver) {
            Some(_) => {
                let (location, cap) = self.route_limits(current.driver, current.location)?;
                let proj = self.projection(now);
                let (status, stops) = self.with_route(current.driver, || self.active_route(current.driver), |r, token| {
                    self.check(ride, next)?;
                    r.cancel_ride(token, ride, &proj)?;
                    let moved = self.transition(ride, next)?;
                    self.reoptimize_locked(r, token, location, cap, &proj);
                    Ok((moved, r.stops().to_vec()))
                })?;
                self.finish_route_change(current.driver, &stops, now, observer);
                status
            }
            None => self.transition(ride, next)?,
        };

        if let Some(request) = updated.request {
            if let Some(r) = guard(&self.requests).requests.get_mut(&request) {
                r.status = RequestStatus::Cancelled(reason);
            }
        }
        info!(ride = %ride, ?reason, "ride cancelled");
        observer.on_ride_status(&updated, from, now);
        Ok(())
    }

    // ── Hailed rides ──────────────────────────────────────────────────────

    /// A group boarded at the kerb without a request.  Their load counts
    /// against the vehicle until [`complete_hail`](Self::complete_hail).
    pub fn hail<O: DispatchObserver>(
        &self,
        driver:     DriverId,
        location:   LocationId,
        passengers: u32,
        ada:        bool,
        observer:   &mut O,
    ) -> DispatchResult<RideId> {
        let now = self.clock.now();
        let d = self.driver(driver).ok_or(DispatchError::UnknownDriver(driver))?;
        let loc = self.locations.get(&location).ok_or(AdmissionError::UnknownLocation(location))?;
        if passengers == 0 {
            return Err(AdmissionError::NoPassengers.into());
        }
        let cap = loc.route_capacity(&d.vehicle);
        let load = Load::ride(passengers, ada);
        let proj = self.projection(now);

        let fetch = || -> DispatchResult<_> { Ok(self.routes.get_or_create(driver, d.position, now)) };
        let result = self.with_route(driver, fetch, |r, token| {
            let last = r.stops().len() - 1;
            if !r.feasible_prefix_capacity(load, 0, last, cap) {
                return Err(DispatchError::OverCapacity(driver));
            }
            r.add_hailed(token, load, &proj)?;
            Ok(r.stops().to_vec())
        });
        let stops = match result {
            Ok(stops) => stops,
            Err(err) => {
                self.routes.retire_if_idle(driver);
                return Err(err);
            }
        };

        let id = RideId(self.next_ride.fetch_add(1, Ordering::Relaxed));
        let ride = Ride::hailed(id, driver, location, d.position, passengers, ada, now);
        guard(&self.rides).insert(id, ride.clone());

        info!(ride = %id, driver = %driver, passengers, "hailed ride started");
        observer.on_ride_status(&ride, RideStatus::Unassigned, now);
        observer.on_route_changed(driver, &stops, now);
        Ok(id)
    }

    /// The hailed group got off.  Frees their capacity and re-optimizes.
    pub fn complete_hail<O: DispatchObserver>(&self, ride: RideId, observer: &mut O) -> DispatchResult<()> {
        let now = self.clock.now();
        let current = self.ride(ride).ok_or(DispatchError::UnknownRide(ride))?;
        if !current.is_hailed() {
            return Err(DispatchError::WrongStatus { ride, status: current.status });
        }
        let (location, cap) = self.route_limits(current.driver, current.location)?;
        let proj = self.projection(now);

        let ((updated, from), stops) = self.with_route(current.driver, || self.active_route(current.driver), |r, token| {
            self.check(ride, RideStatus::Completed)?;
            r.remove_hailed(token, current.load(), &proj)?;
            let moved = self.transition(ride, RideStatus::Completed)?;
            self.reoptimize_locked(r, token, location, cap, &proj);
            Ok((moved, r.stops().to_vec()))
        })?;

        self.finish_route_change(current.driver, &stops, now, observer);
        info!(ride = %ride, driver = %current.driver, "hailed ride completed");
        observer.on_ride_status(&updated, from, now);
        Ok(())
    }

    // ── Positions ─────────────────────────────────────────────────────────

    /// Record a driver's position, re-project their route from it, and let
    /// the planner reorder what is still pending.
    pub fn report_position(&self, driver: DriverId, position: GeoPoint) -> DispatchResult<()> {
        if !position.is_valid() {
            return Err(DispatchError::InvalidPoint(position));
        }
        let now = self.clock.now();
        {
            let mut drivers = write(&self.drivers);
            let d = drivers.get_mut(&driver).ok_or(DispatchError::UnknownDriver(driver))?;
            d.position = position;
            d.position_at = now;
        }

        let proj = self.projection(now);
        let result = self.with_route(driver, || self.active_route(driver), |r, token| {
            r.refresh(token, position, &proj)?;
            let ride = r.rides().first().and_then(|&id| self.ride(id));
            if let Some(ride) = ride {
                let (location, cap) = self.route_limits(driver, ride.location)?;
                self.reoptimize_locked(r, token, location, cap, &proj);
            }
            Ok(r.stops().to_vec())
        });
        match result {
            Ok(stops) => self.sync_etas(&stops),
            Err(DispatchError::NoRoute(_)) => {}
            Err(err) => return Err(err),
        }
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// Run `f` on the driver's route while holding its lock.
    ///
    /// `fetch` looks the route up; it runs again whenever the handle turns
    /// out to be retired, so `f` only ever sees the route in the book.  A
    /// busy lock is retried per the retry policy; a stale one is broken by
    /// `try_lock`.  The lock is released whatever `f` returns.
    fn with_route<T>(
        &self,
        driver: DriverId,
        fetch:  impl Fn() -> DispatchResult<Arc<Mutex<Route>>>,
        f:      impl FnOnce(&mut Route, LockToken) -> DispatchResult<T>,
    ) -> DispatchResult<T> {
        let ttl = self.config.lock_ttl();
        let policy = self.config.retry;
        let attempts = policy.attempts.max(1);

        let mut attempt = 0;
        while attempt < attempts {
            let route = fetch()?;
            let mut r = guard(&route);
            if r.is_retired() {
                continue;
            }
            if let Some(token) = r.try_lock(self.clock.now(), ttl) {
                let result = f(&mut *r, token);
                r.release_token(token);
                return result;
            }
            drop(r);
            attempt += 1;
            if attempt < attempts {
                thread::sleep(policy.backoff(attempt - 1));
            }
        }
        warn!(driver = %driver, attempts, "route stayed locked");
        Err(DispatchError::RouteBusy(driver))
    }

    fn active_route(&self, driver: DriverId) -> DispatchResult<Arc<Mutex<Route>>> {
        self.routes.get(driver).ok_or(DispatchError::NoRoute(driver))
    }

    /// Location and vehicle capacity that bound `driver`'s route for a ride
    /// at `location`.
    fn route_limits(&self, driver: DriverId, location: LocationId) -> DispatchResult<(&Location, Capacity)> {
        let d = self.driver(driver).ok_or(DispatchError::UnknownDriver(driver))?;
        let loc = self.locations.get(&location).ok_or(AdmissionError::UnknownLocation(location))?;
        Ok((loc, loc.route_capacity(&d.vehicle)))
    }

    /// Fail unless the ride may move to `next`.
    fn check(&self, ride: RideId, next: RideStatus) -> DispatchResult<()> {
        let rides = guard(&self.rides);
        let r = rides.get(&ride).ok_or(DispatchError::UnknownRide(ride))?;
        if r.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(FleetError::InvalidTransition { ride, from: r.status, to: next }.into())
        }
    }

    /// Move the ride to `next`; returns the updated ride and its old status.
    fn transition(&self, ride: RideId, next: RideStatus) -> DispatchResult<(Ride, RideStatus)> {
        let mut rides = guard(&self.rides);
        let r = rides.get_mut(&ride).ok_or(DispatchError::UnknownRide(ride))?;
        let from = r.status;
        r.transition(next)?;
        Ok((r.clone(), from))
    }

    /// Let the planner reorder the pending stops.  Requires the lock.
    ///
    /// Best effort: the route change that prompted it has already happened,
    /// so a planner failure keeps the current order and is only logged.
    fn reoptimize_locked(
        &self,
        r:        &mut Route,
        token:    LockToken,
        location: &Location,
        cap:      Capacity,
        proj:     &Projection<'_>,
    ) -> bool {
        let stops = r.stops().to_vec();
        let ctx = PlanContext { stops: &stops, capacity: cap, location, proj: *proj };
        let reordered = match self.planner.reoptimize(&ctx) {
            Ok(Some(pending)) => r.replace_pending(token, pending, cap, proj).map_err(DispatchError::from),
            Ok(None) => return false,
            Err(err) => Err(err.into()),
        };
        match reordered {
            Ok(()) => {
                debug!(driver = %r.driver(), "pending stops reordered");
                true
            }
            Err(err) => {
                warn!(driver = %r.driver(), error = %err, "re-optimization failed, keeping current order");
                false
            }
        }
    }

    /// Publish a changed route and retire it once nothing is left.
    fn finish_route_change<O: DispatchObserver>(
        &self,
        driver:   DriverId,
        stops:    &[Stop],
        now:      Timestamp,
        observer: &mut O,
    ) {
        self.sync_etas(stops);
        observer.on_route_changed(driver, stops, now);
        if self.routes.retire_if_idle(driver) {
            debug!(driver = %driver, "route retired");
        }
    }
}
