//! `RouteBook`: the registry of active routes.
//!
//! # Concurrency
//!
//! The map sits behind an `RwLock` and each route behind its own `Mutex`.
//! Both are held only for short critical sections; the logical
//! [`RouteLock`](crate::RouteLock) inside each route is what a dispatcher
//! holds across a whole evaluate-then-commit step.
//!
//! A panic while holding a guard poisons it.  Route state is always left
//! consistent between statements, so poisoned guards are recovered rather
//! than propagated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use rp_core::{DriverId, GeoPoint, Timestamp};

use crate::{LockToken, Route};

/// Lock `m`, recovering the guard if a previous holder panicked.
pub fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Active routes keyed by driver.  At most one route per driver.
#[derive(Default)]
pub struct RouteBook {
    routes: RwLock<HashMap<DriverId, Arc<Mutex<Route>>>>,
}

impl RouteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, driver: DriverId) -> Option<Arc<Mutex<Route>>> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&driver)
            .cloned()
    }

    /// The driver's route, creating an empty one anchored at `position`.
    pub fn get_or_create(&self, driver: DriverId, position: GeoPoint, now: Timestamp) -> Arc<Mutex<Route>> {
        if let Some(route) = self.get(driver) {
            return route;
        }
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(driver)
            .or_insert_with(|| Arc::new(Mutex::new(Route::new(driver, position, now))))
            .clone()
    }

    /// The driver's live route, locked.  `None` if someone else holds it.
    ///
    /// A handle that was retired between lookup and locking is discarded
    /// and the lookup repeated, so the token always belongs to the route
    /// in the book.
    pub fn lock_or_create(
        &self,
        driver:   DriverId,
        position: GeoPoint,
        now:      Timestamp,
        ttl:      Duration,
    ) -> Option<(Arc<Mutex<Route>>, LockToken)> {
        loop {
            let route = self.get_or_create(driver, position, now);
            let token = {
                let mut r = guard(&route);
                if r.is_retired() {
                    continue;
                }
                r.try_lock(now, ttl)
            };
            return token.map(|t| (route, t));
        }
    }

    /// Drop the driver's route if it is idle and unlocked.  The dropped
    /// route is marked retired so stale handles cannot lock it.
    pub fn retire_if_idle(&self, driver: DriverId) -> bool {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let idle = routes.get(&driver).is_some_and(|r| {
            let mut r = guard(r);
            let idle = r.is_idle() && !r.is_locked();
            if idle {
                r.retire();
            }
            idle
        });
        if idle {
            routes.remove(&driver);
        }
        idle
    }

    /// Drivers with an active route, ascending.
    pub fn drivers(&self) -> Vec<DriverId> {
        let mut ids: Vec<DriverId> = self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// A copy of the driver's route.
    pub fn snapshot(&self, driver: DriverId) -> Option<Route> {
        let route = self.get(driver)?;
        let snapshot = guard(&route).clone();
        Some(snapshot)
    }

    pub fn len(&self) -> usize {
        self.routes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
