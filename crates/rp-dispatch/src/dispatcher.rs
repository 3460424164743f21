//! The `Dispatcher` struct and its search cycle.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use rp_core::{Capacity, Clock, DriverId, LocationId, RequestId, RideId, Timestamp};
use rp_fleet::{
    CallBucket, CancelReason, Driver, Location, NewRequest, Request, RequestQueue, RequestStatus, Ride,
    RideStatus,
};
use rp_planner::{Candidate, CheapestInsertion, InsertionPlanner, Plan, PlanContext};
use rp_route::{LockToken, Projection, Route, RouteBook, Stop, StopKind, guard};
use rp_spatial::{CostEstimator, DriverIndex};

use crate::admission::{self, AdmissionError};
use crate::{CycleSummary, DispatchConfig, DispatchError, DispatchObserver, DispatchResult, Map, Match, SkipReason};

pub(crate) fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

/// Requests by id plus the oldest-first queue of those still waiting.
#[derive(Default)]
pub(crate) struct RequestBook {
    pub(crate) requests: Map<RequestId, Request>,
    pub(crate) queue:    RequestQueue,
}

// ── Per-driver state held across one request's evaluation ─────────────────────

/// A driver whose route lock this pass holds.
struct Held {
    driver:   Driver,
    bucket:   CallBucket,
    capacity: Capacity,
    route:    Arc<Mutex<Route>>,
    token:    LockToken,
}

enum Outcome {
    Offer(Plan),
    Infeasible,
    Skipped(SkipReason),
    Failed(DispatchError),
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// The dispatch engine.
///
/// `Dispatcher<E, C, P>` owns the entity stores and the route book and is
/// shared by reference: `search()` and every lifecycle operation take
/// `&self`, so several threads may drive it at once.  The per-route
/// [`RouteLock`](rp_route::RouteLock) is what serializes route changes;
/// the in-memory maps sit behind short `Mutex`/`RwLock` sections.
///
/// Create via [`DispatcherBuilder`][crate::DispatcherBuilder].
pub struct Dispatcher<E: CostEstimator, C: Clock, P: InsertionPlanner = CheapestInsertion> {
    pub(crate) config:       DispatchConfig,
    pub(crate) estimator:    E,
    pub(crate) clock:        C,
    pub(crate) planner:      P,
    /// Read-only once built.
    pub(crate) locations:    Map<LocationId, Location>,
    pub(crate) drivers:      RwLock<Map<DriverId, Driver>>,
    pub(crate) requests:     Mutex<RequestBook>,
    pub(crate) rides:        Mutex<Map<RideId, Ride>>,
    pub(crate) routes:       RouteBook,
    pub(crate) next_request: AtomicU32,
    pub(crate) next_ride:    AtomicU32,
}

impl<E: CostEstimator, C: Clock, P: InsertionPlanner> Dispatcher<E, C, P> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn routes(&self) -> &RouteBook {
        &self.routes
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn driver(&self, id: DriverId) -> Option<Driver> {
        read(&self.drivers).get(&id).cloned()
    }

    pub fn request(&self, id: RequestId) -> Option<Request> {
        guard(&self.requests).requests.get(&id).cloned()
    }

    pub fn ride(&self, id: RideId) -> Option<Ride> {
        guard(&self.rides).get(&id).cloned()
    }

    /// All rides, ascending by id.
    pub fn rides(&self) -> Vec<Ride> {
        let mut rides: Vec<Ride> = guard(&self.rides).values().cloned().collect();
        rides.sort_by_key(|r| r.id);
        rides
    }

    /// Requests still waiting, oldest first.
    pub fn waiting(&self) -> Vec<RequestId> {
        guard(&self.requests).queue.oldest_first()
    }

    /// A copy of the driver's active route.
    pub fn route(&self, driver: DriverId) -> Option<Route> {
        self.routes.snapshot(driver)
    }

    /// The driver's stops re-projected from their latest reported position.
    /// A driver without a route gets just the anchor.
    pub fn current_stops(&self, driver: DriverId) -> DispatchResult<Vec<Stop>> {
        let d = self.driver(driver).ok_or(DispatchError::UnknownDriver(driver))?;
        let now = self.clock.now();
        match self.routes.snapshot(driver) {
            Some(route) => Ok(route.current_stops(d.position, &self.projection(now))?),
            None => Ok(Route::new(driver, d.position, now).stops().to_vec()),
        }
    }

    // ── Fleet updates ─────────────────────────────────────────────────────

    /// Add a driver, or replace one with the same id.
    pub fn add_driver(&self, driver: Driver) {
        write(&self.drivers).insert(driver.id, driver);
    }

    pub fn set_driver_status(&self, driver: DriverId, online: bool, available: bool) -> DispatchResult<()> {
        let mut drivers = write(&self.drivers);
        let d = drivers.get_mut(&driver).ok_or(DispatchError::UnknownDriver(driver))?;
        d.is_online = online;
        d.is_available = available;
        Ok(())
    }

    // ── Admission ─────────────────────────────────────────────────────────

    /// Validate `new` and queue it as a waiting request.
    pub fn admit(&self, new: NewRequest) -> Result<RequestId, AdmissionError> {
        admission::validate(&new, self.locations.get(&new.location))?;

        let id = RequestId(self.next_request.fetch_add(1, Ordering::Relaxed));
        let now = self.clock.now();
        let request = Request::admit(id, new, now);

        let mut book = guard(&self.requests);
        book.queue.push(id, now);
        book.requests.insert(id, request);
        debug!(request = %id, "request admitted");
        Ok(id)
    }

    // ── Search ────────────────────────────────────────────────────────────

    /// One dispatch pass over every waiting request, oldest first.
    ///
    /// Never fails as a whole: lock contention skips a driver, evaluation
    /// errors drop one (request, driver) pair and are reported to
    /// `observer`.
    pub fn search<O: DispatchObserver>(&self, observer: &mut O) -> CycleSummary {
        let now = self.clock.now();
        observer.on_cycle_start(now);
        let mut summary = CycleSummary { at: now, ..CycleSummary::default() };

        self.expire_requests(now, observer, &mut summary);

        let waiting = guard(&self.requests).queue.oldest_first();
        for id in waiting {
            let Some(request) = self.claim(id) else {
                continue;
            };
            summary.considered += 1;
            let matched = self.match_request(&request, now, observer, &mut summary);

            let unmatched = {
                let mut book = guard(&self.requests);
                if matched {
                    book.queue.remove(id);
                    None
                } else {
                    book.queue.release(id);
                    book.requests.get_mut(&id).map(|r| {
                        r.note_retry(now);
                        r.clone()
                    })
                }
            };
            if let Some(r) = unmatched {
                summary.unmatched += 1;
                debug!(request = %id, retries = r.search_retries, "no driver found");
                observer.on_unmatched(&r, now);
            }
        }

        summary.active_routes = self.routes.len();
        info!(
            considered = summary.considered,
            matched = summary.matched,
            unmatched = summary.unmatched,
            expired = summary.expired,
            active_routes = summary.active_routes,
            "dispatch cycle"
        );
        observer.on_cycle_end(&summary);
        summary
    }

    // ── Internals shared with lifecycle ───────────────────────────────────

    pub(crate) fn projection(&self, now: Timestamp) -> Projection<'_> {
        Projection::new(&self.estimator, now, self.config.service_secs)
    }

    /// Copy fresh stop ETAs onto the rides they belong to.
    pub(crate) fn sync_etas(&self, stops: &[Stop]) {
        let mut rides = guard(&self.rides);
        for s in stops.iter().skip(1) {
            let Some(id) = s.kind.ride() else {
                continue;
            };
            if let Some(ride) = rides.get_mut(&id) {
                match s.kind {
                    StopKind::Pickup(_) => ride.eta = Some(s.eta),
                    StopKind::Dropoff(_) if ride.status.is_onboard() => ride.eta = Some(s.eta),
                    _ => {}
                }
            }
        }
    }

    // ── Search steps ──────────────────────────────────────────────────────

    /// Cancel unclaimed requests that waited past the timeout.
    fn expire_requests<O: DispatchObserver>(&self, now: Timestamp, observer: &mut O, summary: &mut CycleSummary) {
        let Some(timeout) = self.config.request_timeout() else {
            return;
        };
        let expired: Vec<Request> = {
            let mut book = guard(&self.requests);
            let RequestBook { requests, queue } = &mut *book;
            let stale: Vec<RequestId> = queue
                .oldest_first()
                .into_iter()
                .filter(|&id| !queue.is_claimed(id))
                .filter(|id| requests.get(id).is_some_and(|r| now.since(r.requested_at) >= timeout))
                .collect();
            stale
                .into_iter()
                .filter_map(|id| {
                    queue.remove(id);
                    let r = requests.get_mut(&id)?;
                    r.status = RequestStatus::Cancelled(CancelReason::NoDriversAvailable);
                    Some(r.clone())
                })
                .collect()
        };
        for r in &expired {
            info!(request = %r.id, waited_secs = now.secs_after(r.requested_at), "request timed out");
            observer.on_request_expired(r, now);
        }
        summary.expired += expired.len();
    }

    /// Claim a waiting request for this pass.
    fn claim(&self, id: RequestId) -> Option<Request> {
        let mut book = guard(&self.requests);
        let waiting = book.requests.get(&id).filter(|r| r.is_waiting()).cloned();
        match waiting {
            Some(r) if book.queue.try_claim(id) => Some(r),
            Some(_) => None,
            None => {
                book.queue.remove(id);
                None
            }
        }
    }

    fn match_request<O: DispatchObserver>(
        &self,
        request:  &Request,
        now:      Timestamp,
        observer: &mut O,
        summary:  &mut CycleSummary,
    ) -> bool {
        let Some(location) = self.locations.get(&request.location) else {
            return false;
        };
        let cand = Candidate { pickup: request.pickup, dropoff: request.dropoff, load: request.load() };

        let held = self.lock_candidates(request, location, now, observer, summary);
        let outcomes = self.evaluate_all(&held, location, &cand, now);

        let mut best: Option<(usize, Plan)> = None;
        let mut offers = 0;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let driver = held[i].driver.id;
            match outcome {
                Outcome::Offer(plan) => {
                    offers += 1;
                    let wins = best.as_ref().is_none_or(|(b, bp)| rank(&held[i], &plan) < rank(&held[*b], bp));
                    if wins {
                        best = Some((i, plan));
                    }
                }
                Outcome::Infeasible => {
                    debug!(request = %request.id, driver = %driver, "no feasible insertion");
                }
                Outcome::Skipped(reason) => {
                    summary.skipped += 1;
                    debug!(request = %request.id, driver = %driver, ?reason, "driver skipped");
                    observer.on_driver_skipped(request.id, driver, reason);
                }
                Outcome::Failed(err) => {
                    summary.errors += 1;
                    warn!(request = %request.id, driver = %driver, error = %err, "driver evaluation failed");
                    observer.on_evaluation_error(request.id, driver, &err);
                }
            }
        }

        let matched = match best {
            Some((i, plan)) => match self.commit(request, &held[i], &plan, &cand, offers, now, observer) {
                Ok(()) => {
                    summary.matched += 1;
                    true
                }
                Err(err) => {
                    summary.errors += 1;
                    warn!(request = %request.id, driver = %held[i].driver.id, error = %err, "commit failed");
                    observer.on_evaluation_error(request.id, held[i].driver.id, &err);
                    false
                }
            },
            None => false,
        };

        for h in &held {
            guard(&h.route).release_token(h.token);
        }
        for h in &held {
            self.routes.retire_if_idle(h.driver.id);
        }
        matched
    }

    /// Lock the route of every driver that may serve `request`.  Drivers
    /// whose route is busy are skipped, never waited for.  With a candidate
    /// radius, drivers farther from the pickup are not considered at all.
    fn lock_candidates<O: DispatchObserver>(
        &self,
        request:  &Request,
        location: &Location,
        now:      Timestamp,
        observer: &mut O,
        summary:  &mut CycleSummary,
    ) -> Vec<Held> {
        let mut drivers: Vec<Driver> = read(&self.drivers)
            .values()
            .filter(|d| d.is_dispatchable() && d.serves(request.location))
            .cloned()
            .collect();
        drivers.sort_by_key(|d| d.id);
        if let Some(radius) = self.config.candidate_radius_m {
            let near = DriverIndex::build(drivers.iter().map(|d| (d.id, d.position))).within_m(request.pickup, radius);
            drivers.retain(|d| near.binary_search(&d.id).is_ok());
        }

        let ttl = self.config.lock_ttl();
        let mut held = Vec::with_capacity(drivers.len());
        for driver in drivers {
            let Some(bucket) = driver.vehicle.call_bucket(request.pickup_zone, request.dropoff_zone) else {
                summary.skipped += 1;
                observer.on_driver_skipped(request.id, driver.id, SkipReason::ZoneRule);
                continue;
            };
            let Some((route, token)) = self.routes.lock_or_create(driver.id, driver.position, now, ttl) else {
                summary.skipped += 1;
                debug!(request = %request.id, driver = %driver.id, "route busy");
                observer.on_driver_skipped(request.id, driver.id, SkipReason::RouteBusy);
                continue;
            };
            held.push(Held {
                capacity: location.route_capacity(&driver.vehicle),
                bucket,
                route,
                token,
                driver,
            });
        }
        held
    }

    /// Plan `cand` against every held route.
    ///
    /// With the `parallel` feature the drivers are evaluated on Rayon's
    /// thread pool; each touches only its own route.
    fn evaluate_all(&self, held: &[Held], location: &Location, cand: &Candidate, now: Timestamp) -> Vec<Outcome> {
        #[cfg(not(feature = "parallel"))]
        {
            held.iter().map(|h| self.evaluate(h, location, cand, now)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            held.par_iter().map(|h| self.evaluate(h, location, cand, now)).collect()
        }
    }

    fn evaluate(&self, h: &Held, location: &Location, cand: &Candidate, now: Timestamp) -> Outcome {
        match self.try_evaluate(h, location, cand, now) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed(err),
        }
    }

    fn try_evaluate(&self, h: &Held, location: &Location, cand: &Candidate, now: Timestamp) -> DispatchResult<Outcome> {
        let proj = self.projection(now);
        let stops = {
            let route = guard(&h.route);
            if !location.pooling_enabled && !route.is_idle() {
                return Ok(Outcome::Skipped(SkipReason::NotPooling));
            }
            if route.pending().len() >= self.config.max_pending_stops {
                return Ok(Outcome::Skipped(SkipReason::TooManyStops));
            }
            route.current_stops(h.driver.position, &proj)?
        };

        let ctx = PlanContext { stops: &stops, capacity: h.capacity, location, proj };
        Ok(match self.planner.plan(&ctx, cand)? {
            Some(plan) => Outcome::Offer(plan),
            None => Outcome::Infeasible,
        })
    }

    /// Splice the winning plan into its route and record the ride.  Only
    /// the winner's anchor moves to the driver's position; losing routes
    /// are never written.  The caller still holds the route lock and
    /// releases it afterwards.
    #[allow(clippy::too_many_arguments)]
    fn commit<O: DispatchObserver>(
        &self,
        request:  &Request,
        h:        &Held,
        plan:     &Plan,
        cand:     &Candidate,
        offers:   usize,
        now:      Timestamp,
        observer: &mut O,
    ) -> DispatchResult<()> {
        let id = RideId(self.next_ride.fetch_add(1, Ordering::Relaxed));
        let mut ride = Ride::from_request(id, request, h.driver.id, now);
        ride.transition(RideStatus::Assigned)?;

        let proj = self.projection(now);
        let stops = {
            let mut route = guard(&h.route);
            route.refresh(h.token, h.driver.position, &proj)?;
            route.commit(h.token, &plan.insertion(id, cand), h.capacity, &proj)?.to_vec()
        };

        let eta = |kind: StopKind| stops.iter().find(|s| s.kind == kind).map(|s| s.eta);
        let pickup_eta = eta(StopKind::Pickup(id)).unwrap_or(plan.pickup_eta);
        let dropoff_eta = eta(StopKind::Dropoff(id)).unwrap_or(plan.dropoff_eta);
        ride.initial_eta = Some(pickup_eta);
        ride.eta = Some(pickup_eta);

        guard(&self.rides).insert(id, ride.clone());
        if let Some(r) = guard(&self.requests).requests.get_mut(&request.id) {
            r.status = RequestStatus::Matched(id);
        }
        self.sync_etas(&stops);

        let m = Match {
            at: now,
            request: request.id,
            ride: id,
            driver: h.driver.id,
            passengers: request.passengers,
            cost_m: plan.cost_m,
            pickup_eta,
            dropoff_eta,
            offers,
        };
        info!(
            request = %request.id,
            ride = %id,
            driver = %h.driver.id,
            cost_m = plan.cost_m,
            offers,
            "request matched"
        );
        observer.on_match(&m);
        observer.on_ride_status(&ride, RideStatus::Unassigned, now);
        observer.on_route_changed(h.driver.id, &stops, now);
        Ok(())
    }
}

/// Lower is better: matching-rule bucket, plan cost, route distance to the
/// pickup, then driver id.
fn rank(h: &Held, plan: &Plan) -> (CallBucket, OrdF64, OrdF64, DriverId) {
    (h.bucket, OrdF64(plan.cost_m), OrdF64(plan.pickup_distance_m), h.driver.id)
}

/// Total order over `f64` for ranking tuples.
#[derive(Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}
