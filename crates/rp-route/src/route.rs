//! The `Route` type and the sequence helpers shared with the planner.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use rp_core::{Capacity, DriverId, GeoPoint, Load, RideId, Timestamp};
use rp_spatial::CostEstimator;

use crate::{LockToken, RouteError, RouteLock, RouteResult, Stop, StopKind, StopStatus};

// ── Projection ────────────────────────────────────────────────────────────────

/// Everything needed to turn a stop order into ETAs.
#[derive(Clone, Copy)]
pub struct Projection<'a> {
    pub estimator:    &'a dyn CostEstimator,
    pub now:          Timestamp,
    /// Dwell time at every served stop before driving on.
    pub service_secs: f64,
}

impl<'a> Projection<'a> {
    pub fn new(estimator: &'a dyn CostEstimator, now: Timestamp, service_secs: f64) -> Self {
        Self { estimator, now, service_secs }
    }
}

// ── Sequence helpers ──────────────────────────────────────────────────────────

/// Recompute cumulative distance, time, ETA, and onboard load for `stops`
/// from the anchor at `stops[0]`, whose `onboard` must already be set.
pub fn annotate(stops: &mut [Stop], proj: &Projection<'_>) -> RouteResult<()> {
    let Some(first) = stops.first_mut() else {
        return Ok(());
    };
    first.cum_distance_m = 0.0;
    first.cum_secs = 0.0;
    first.eta = proj.now;

    for i in 1..stops.len() {
        let (prev_point, prev_dist, prev_secs, prev_onboard) = {
            let p = &stops[i - 1];
            (p.point, p.cum_distance_m, p.cum_secs, p.onboard)
        };
        let leg = proj.estimator.leg(prev_point, stops[i].point)?;
        // No dwell at the anchor: the driver is already moving.
        let dwell = if i >= 2 { proj.service_secs } else { 0.0 };

        let s = &mut stops[i];
        s.cum_distance_m = prev_dist + leg.distance_m;
        s.cum_secs = prev_secs + dwell + leg.duration_secs;
        s.eta = proj.now.plus_secs(s.cum_secs);
        s.onboard = s.apply(prev_onboard).ok_or(RouteError::NegativeLoad(i))?;
    }
    Ok(())
}

/// Validate precedence and capacity of a full sequence (anchor first).
///
/// Load only grows at pickups, so capacity is checked there; an anchor that
/// is already over capacity (e.g. a large hailed group) blocks new pickups
/// without invalidating the route.
pub fn check_sequence(stops: &[Stop], cap: Capacity) -> RouteResult<()> {
    let pickups: HashMap<RideId, usize> = stops
        .iter()
        .enumerate()
        .filter_map(|(i, s)| match s.kind {
            StopKind::Pickup(r) => Some((r, i)),
            _ => None,
        })
        .collect();

    let mut onboard = stops.first().map_or(Load::ZERO, |s| s.onboard);
    for (i, s) in stops.iter().enumerate().skip(1) {
        if let StopKind::Dropoff(r) = s.kind {
            if pickups.get(&r).is_some_and(|&p| p > i) {
                return Err(RouteError::Precedence(r));
            }
        }
        onboard = s.apply(onboard).ok_or(RouteError::NegativeLoad(i))?;
        if s.kind.is_pickup() && !onboard.fits(cap) {
            return Err(RouteError::CapacityExceeded(i));
        }
    }
    Ok(())
}

/// `true` if adding `delta` to the load aboard after each of
/// `stops[at..=until]` keeps every counter within `cap`.
///
/// This is the capacity test for inserting a ride whose pickup goes right
/// after `stops[at]` and whose dropoff goes right after `stops[until]`.
pub fn feasible_prefix_capacity(stops: &[Stop], delta: Load, at: usize, until: usize, cap: Capacity) -> bool {
    at <= until
        && until < stops.len()
        && stops[at..=until].iter().all(|s| (s.onboard + delta).fits(cap))
}

// ── Insertion ─────────────────────────────────────────────────────────────────

/// A new ride's two stops and where they go.
#[derive(Clone, Debug, PartialEq)]
pub struct Insertion {
    pub ride:          RideId,
    pub pickup:        GeoPoint,
    pub dropoff:       GeoPoint,
    pub load:          Load,
    /// Index of the existing stop the pickup goes right after.
    pub pickup_after:  usize,
    /// Index of the existing stop the dropoff goes right after.  Equal to
    /// `pickup_after` means directly after the new pickup.
    pub dropoff_after: usize,
}

impl Insertion {
    /// Splice the two stops into `stops`.  Annotations are left stale.
    pub fn apply_to(&self, stops: &[Stop]) -> RouteResult<Vec<Stop>> {
        let (p, d, n) = (self.pickup_after, self.dropoff_after, stops.len());
        if d < p || d >= n {
            return Err(RouteError::BadInsertion { pickup_after: p, dropoff_after: d, len: n });
        }
        let mut out = Vec::with_capacity(n + 2);
        out.extend_from_slice(&stops[..=p]);
        out.push(Stop::pickup(self.ride, self.pickup, self.load));
        out.extend_from_slice(&stops[p + 1..=d]);
        out.push(Stop::dropoff(self.ride, self.dropoff, self.load));
        out.extend_from_slice(&stops[d + 1..]);
        Ok(out)
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// One driver's route.
///
/// `stops[0]` is the anchor at the driver's position; `stops[1..]` are
/// pending.  Served and cancelled stops move to `passed` and never come
/// back.
#[derive(Debug, Clone)]
pub struct Route {
    driver:     DriverId,
    passed:     Vec<Stop>,
    stops:      Vec<Stop>,
    /// Load of hailed rides, which have no stops of their own.
    hailed:     Load,
    lock:       RouteLock,
    next_token: u64,
    updated_at: Timestamp,
    /// Set once the route leaves the book; a retired route never locks again.
    retired:    bool,
}

impl Route {
    pub fn new(driver: DriverId, position: GeoPoint, now: Timestamp) -> Self {
        let mut anchor = Stop::anchor(position);
        anchor.eta = now;
        Self {
            driver,
            passed:     Vec::new(),
            stops:      vec![anchor],
            hailed:     Load::ZERO,
            lock:       RouteLock::Unlocked,
            next_token: 0,
            updated_at: now,
            retired:    false,
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn driver(&self) -> DriverId {
        self.driver
    }

    /// Anchor followed by pending stops.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn pending(&self) -> &[Stop] {
        &self.stops[1..]
    }

    pub fn passed(&self) -> &[Stop] {
        &self.passed
    }

    pub fn hailed(&self) -> Load {
        self.hailed
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// No pending stops and nobody aboard.
    pub fn is_idle(&self) -> bool {
        self.stops.len() <= 1 && self.hailed.is_empty()
    }

    /// Rides with a pending stop, in first-appearance order.
    pub fn rides(&self) -> Vec<RideId> {
        let mut out: Vec<RideId> = Vec::new();
        for r in self.pending().iter().filter_map(|s| s.kind.ride()) {
            if !out.contains(&r) {
                out.push(r);
            }
        }
        out
    }

    /// Load aboard at the anchor: hailed load plus every ride whose dropoff
    /// is pending but whose pickup is not.
    pub fn onboard_at_anchor(&self) -> Load {
        let pending = self.pending();
        pending
            .iter()
            .filter(|s| match s.kind {
                StopKind::Dropoff(r) => !pending.iter().any(|o| o.kind == StopKind::Pickup(r)),
                _ => false,
            })
            .fold(self.hailed, |acc, s| acc + s.load)
    }

    pub fn position_of(&self, kind: StopKind) -> Option<usize> {
        self.stops.iter().position(|s| s.kind == kind)
    }

    /// Projected pickup ETA of `ride`, or its dropoff ETA once aboard.
    pub fn ride_eta(&self, ride: RideId) -> Option<Timestamp> {
        self.position_of(StopKind::Pickup(ride))
            .or_else(|| self.position_of(StopKind::Dropoff(ride)))
            .map(|i| self.stops[i].eta)
    }

    pub fn total_distance_m(&self) -> f64 {
        self.stops.last().map_or(0.0, |s| s.cum_distance_m)
    }

    pub fn total_secs(&self) -> f64 {
        self.stops.last().map_or(0.0, |s| s.cum_secs)
    }

    pub fn feasible_prefix_capacity(&self, delta: Load, at: usize, until: usize, cap: Capacity) -> bool {
        feasible_prefix_capacity(&self.stops, delta, at, until, cap)
    }

    /// The pending sequence re-projected from `position`, without touching
    /// the route.
    pub fn current_stops(&self, position: GeoPoint, proj: &Projection<'_>) -> RouteResult<Vec<Stop>> {
        let mut stops = self.stops.clone();
        stops[0].point = position;
        stops[0].onboard = self.onboard_at_anchor();
        annotate(&mut stops, proj)?;
        Ok(stops)
    }

    // ── Locking ───────────────────────────────────────────────────────────

    pub fn lock_state(&self) -> RouteLock {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Removed from its [`RouteBook`](crate::RouteBook).  Holders of a
    /// stale handle must look the driver up again.
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    /// Lock the route.  Locking an already-locked route succeeds without
    /// nesting; a single [`release`](Self::release) clears it.  A retired
    /// route refuses.
    pub fn lock(&mut self, now: Timestamp) -> bool {
        if self.retired {
            return false;
        }
        if !self.lock.is_locked() {
            self.grant(now);
        }
        true
    }

    /// Clear the lock regardless of holder.
    pub fn release(&mut self) {
        self.lock = RouteLock::Unlocked;
    }

    /// Non-blocking acquisition.  Fails on a live lock or a retired route;
    /// a lock held for at least `ttl` is broken and re-granted.
    pub fn try_lock(&mut self, now: Timestamp, ttl: Duration) -> Option<LockToken> {
        if self.retired {
            return None;
        }
        match self.lock {
            RouteLock::Unlocked => {}
            RouteLock::Locked { since, .. } if self.lock.is_stale(now, ttl) => {
                warn!(
                    driver  = %self.driver,
                    held_ms = now.since(since).as_millis() as u64,
                    "breaking stale route lock"
                );
            }
            RouteLock::Locked { .. } => return None,
        }
        Some(self.grant(now))
    }

    /// Release only if `token` still holds the lock.
    pub fn release_token(&mut self, token: LockToken) -> bool {
        if self.lock.holds(token) {
            self.lock = RouteLock::Unlocked;
            true
        } else {
            false
        }
    }

    fn grant(&mut self, now: Timestamp) -> LockToken {
        self.next_token += 1;
        let token = LockToken(self.next_token);
        self.lock = RouteLock::Locked { since: now, token };
        token
    }

    fn verify(&self, token: LockToken) -> RouteResult<()> {
        if self.lock.holds(token) { Ok(()) } else { Err(RouteError::LockLost(self.driver)) }
    }

    // ── Mutations (lock holder only) ──────────────────────────────────────

    /// Recompute all annotations for the current order.
    pub fn recompute(&mut self, token: LockToken, proj: &Projection<'_>) -> RouteResult<()> {
        self.verify(token)?;
        self.stops[0].onboard = self.onboard_at_anchor();
        annotate(&mut self.stops, proj)?;
        self.updated_at = proj.now;
        Ok(())
    }

    /// Move the anchor to `position` and recompute.
    pub fn refresh(&mut self, token: LockToken, position: GeoPoint, proj: &Projection<'_>) -> RouteResult<()> {
        self.verify(token)?;
        self.stops[0].point = position;
        self.recompute(token, proj)
    }

    /// Splice a new ride into the route and return the new sequence.
    pub fn commit(
        &mut self,
        token: LockToken,
        ins:   &Insertion,
        cap:   Capacity,
        proj:  &Projection<'_>,
    ) -> RouteResult<&[Stop]> {
        self.verify(token)?;
        let mut seq = ins.apply_to(&self.stops)?;
        seq[0].onboard = self.onboard_at_anchor();
        check_sequence(&seq, cap)?;
        annotate(&mut seq, proj)?;
        for s in seq.iter_mut().filter(|s| s.kind.ride() == Some(ins.ride)) {
            s.initial_eta = Some(s.eta);
        }
        self.stops = seq;
        self.updated_at = proj.now;
        Ok(&self.stops)
    }

    /// Replace the pending stops with a reordering of the same stops.
    pub fn replace_pending(
        &mut self,
        token:   LockToken,
        pending: Vec<Stop>,
        cap:     Capacity,
        proj:    &Projection<'_>,
    ) -> RouteResult<()> {
        self.verify(token)?;
        let current = self.pending();
        if pending.len() != current.len()
            || !pending.iter().all(|s| current.iter().any(|c| c.kind == s.kind))
        {
            return Err(RouteError::MismatchedStops);
        }
        let mut seq = Vec::with_capacity(pending.len() + 1);
        seq.push(self.stops[0].clone());
        seq.extend(pending);
        seq[0].onboard = self.onboard_at_anchor();
        check_sequence(&seq, cap)?;
        annotate(&mut seq, proj)?;
        self.stops = seq;
        self.updated_at = proj.now;
        Ok(())
    }

    /// Mark a pending stop served.  The anchor moves to the stop's point.
    pub fn complete_stop(&mut self, token: LockToken, kind: StopKind, proj: &Projection<'_>) -> RouteResult<Stop> {
        self.verify(token)?;
        let idx = match self.position_of(kind) {
            Some(i) if i > 0 => i,
            _ => return Err(RouteError::UnknownStop(kind)),
        };
        if let StopKind::Dropoff(r) = kind {
            if self.position_of(StopKind::Pickup(r)).is_some() {
                return Err(RouteError::Precedence(r));
            }
        }
        let mut stop = self.stops.remove(idx);
        stop.status = StopStatus::Done;
        stop.eta = proj.now;
        self.stops[0].point = stop.point;
        self.passed.push(stop.clone());
        self.recompute(token, proj)?;
        Ok(stop)
    }

    /// Drop every pending stop of `ride`.  Returns how many were removed.
    pub fn cancel_ride(&mut self, token: LockToken, ride: RideId, proj: &Projection<'_>) -> RouteResult<usize> {
        self.verify(token)?;
        let (gone, keep): (Vec<Stop>, Vec<Stop>) = self
            .stops
            .drain(..)
            .partition(|s| s.kind.ride() == Some(ride));
        self.stops = keep;
        let removed = gone.len();
        self.passed.extend(gone.into_iter().map(|mut s| {
            s.status = StopStatus::Cancelled;
            s
        }));
        self.recompute(token, proj)?;
        Ok(removed)
    }

    /// Put a hailed group aboard.
    pub fn add_hailed(&mut self, token: LockToken, load: Load, proj: &Projection<'_>) -> RouteResult<()> {
        self.verify(token)?;
        self.hailed += load;
        self.recompute(token, proj)
    }

    /// Take a hailed group off.  Saturates at zero.
    pub fn remove_hailed(&mut self, token: LockToken, load: Load, proj: &Projection<'_>) -> RouteResult<()> {
        self.verify(token)?;
        self.hailed = self.hailed.saturating_sub(load);
        self.recompute(token, proj)
    }
}
