//! Fluent builder for constructing a [`Dispatcher`].

use std::sync::atomic::AtomicU32;
use std::sync::{Mutex, RwLock};

use rp_core::Clock;
use rp_fleet::{Driver, Location};
use rp_planner::{CheapestInsertion, InsertionPlanner};
use rp_route::RouteBook;
use rp_spatial::CostEstimator;

use crate::dispatcher::RequestBook;
use crate::{DispatchConfig, DispatchError, DispatchResult, Dispatcher, Map};

/// Fluent builder for [`Dispatcher<E, C, P>`].
///
/// # Required inputs
///
/// - [`DispatchConfig`]: lock TTL, dwell time, retry policy, …
/// - `E: CostEstimator`: e.g. [`DispatchConfig::estimator`]
/// - `C: Clock`: [`SystemClock`](rp_core::SystemClock) in service,
///   [`ManualClock`](rp_core::ManualClock) in tests and replays
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                                     |
/// |------------------|---------------------------------------------|
/// | `.planner(p)`    | `CheapestInsertion` with `config.planner`   |
/// | `.location(l)`   | none; at least one is required              |
/// | `.driver(d)`     | none; drivers may also be added later       |
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = DispatcherBuilder::new(config, estimator, SystemClock)
///     .locations(locations)
///     .drivers(drivers)
///     .build()?;
/// ```
pub struct DispatcherBuilder<E: CostEstimator, C: Clock, P: InsertionPlanner = CheapestInsertion> {
    config:    DispatchConfig,
    estimator: E,
    clock:     C,
    planner:   P,
    locations: Vec<Location>,
    drivers:   Vec<Driver>,
}

impl<E: CostEstimator, C: Clock> DispatcherBuilder<E, C, CheapestInsertion> {
    pub fn new(config: DispatchConfig, estimator: E, clock: C) -> Self {
        let planner = CheapestInsertion::new(config.planner.clone());
        Self {
            config,
            estimator,
            clock,
            planner,
            locations: Vec::new(),
            drivers:   Vec::new(),
        }
    }
}

impl<E: CostEstimator, C: Clock, P: InsertionPlanner> DispatcherBuilder<E, C, P> {
    /// Swap in a different insertion planner.
    pub fn planner<Q: InsertionPlanner>(self, planner: Q) -> DispatcherBuilder<E, C, Q> {
        DispatcherBuilder {
            config:    self.config,
            estimator: self.estimator,
            clock:     self.clock,
            planner,
            locations: self.locations,
            drivers:   self.drivers,
        }
    }

    pub fn location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(locations);
        self
    }

    pub fn driver(mut self, driver: Driver) -> Self {
        self.drivers.push(driver);
        self
    }

    pub fn drivers(mut self, drivers: impl IntoIterator<Item = Driver>) -> Self {
        self.drivers.extend(drivers);
        self
    }

    /// Validate inputs and return a ready dispatcher.
    pub fn build(self) -> DispatchResult<Dispatcher<E, C, P>> {
        self.config.validate()?;

        // ── Locations ─────────────────────────────────────────────────────
        if self.locations.is_empty() {
            return Err(DispatchError::Config("at least one location is required".into()));
        }
        let mut locations = Map::default();
        for loc in self.locations {
            if !loc.id.is_valid() {
                return Err(DispatchError::Config(format!("location {:?} has no id", loc.name)));
            }
            let id = loc.id;
            if locations.insert(id, loc).is_some() {
                return Err(DispatchError::Config(format!("duplicate location {id}")));
            }
        }

        // ── Drivers ───────────────────────────────────────────────────────
        let mut drivers = Map::default();
        for d in self.drivers {
            if let Some(unknown) = d.locations.iter().find(|l| !locations.contains_key(*l)) {
                return Err(DispatchError::Config(format!("{} serves unknown location {unknown}", d.id)));
            }
            if !d.position.is_valid() {
                return Err(DispatchError::InvalidPoint(d.position));
            }
            let id = d.id;
            if drivers.insert(id, d).is_some() {
                return Err(DispatchError::Config(format!("duplicate driver {id}")));
            }
        }

        Ok(Dispatcher {
            config:       self.config,
            estimator:    self.estimator,
            clock:        self.clock,
            planner:      self.planner,
            locations,
            drivers:      RwLock::new(drivers),
            requests:     Mutex::new(RequestBook::default()),
            rides:        Mutex::new(Map::default()),
            routes:       RouteBook::new(),
            next_request: AtomicU32::new(1),
            next_ride:    AtomicU32::new(1),
        })
    }
}
