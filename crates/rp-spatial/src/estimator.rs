//! Travel-cost estimation.
//!
//! # Pluggability
//!
//! The planner and dispatcher only see the [`CostEstimator`] trait, so a
//! deployment can swap the default great-circle model for a matrix fed by an
//! external routing service without touching dispatch code.
//!
//! # Contract
//!
//! Estimates are pure, non-negative, and zero for identical points.  Two
//! candidate insertions are compared by summing legs, so an estimator must
//! be consistent: the same pair always yields the same leg.

use std::collections::HashMap;

use rp_core::GeoPoint;

use crate::{SpatialError, SpatialResult};

/// Default assumed average driving speed.
const DEFAULT_SPEED_KMH: f64 = 40.0;

// ── Leg ───────────────────────────────────────────────────────────────────────

/// Estimated cost of driving between two points.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leg {
    pub distance_m:    f64,
    pub duration_secs: f64,
}

impl Leg {
    pub const ZERO: Leg = Leg { distance_m: 0.0, duration_secs: 0.0 };
}

// ── CostEstimator trait ───────────────────────────────────────────────────────

/// Pluggable travel-cost model.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; the dispatcher evaluates drivers on
/// Rayon worker threads with the `parallel` feature.
pub trait CostEstimator: Send + Sync {
    /// Estimate the leg from `from` to `to`.
    ///
    /// Returns [`SpatialError::InvalidPoint`] for non-finite or out-of-range
    /// coordinates.
    fn leg(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Leg>;
}

impl<E: CostEstimator + ?Sized> CostEstimator for std::sync::Arc<E> {
    fn leg(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Leg> {
        (**self).leg(from, to)
    }
}

fn check(p: GeoPoint) -> SpatialResult<GeoPoint> {
    if p.is_valid() { Ok(p) } else { Err(SpatialError::InvalidPoint(p)) }
}

// ── GreatCircleEstimator ──────────────────────────────────────────────────────

/// Haversine distance at a fixed average speed.
///
/// Ignores the road network, so it underestimates real detours; it is always
/// available and needs no data.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreatCircleEstimator {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for GreatCircleEstimator {
    fn default() -> Self {
        Self { speed_kmh: DEFAULT_SPEED_KMH }
    }
}

impl GreatCircleEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn secs_for(&self, metres: f64) -> f64 {
        metres / (self.speed_kmh / 3.6)
    }
}

impl CostEstimator for GreatCircleEstimator {
    fn leg(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Leg> {
        let distance_m = check(from)?.distance_m(check(to)?);
        Ok(Leg { distance_m, duration_secs: self.secs_for(distance_m) })
    }
}

// ── MatrixEstimator ───────────────────────────────────────────────────────────

/// Coordinates snapped to a micro-degree grid (~0.1 m) so that `f64` points
/// can key a hash map.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
struct CellKey(i64, i64);

impl From<GeoPoint> for CellKey {
    fn from(p: GeoPoint) -> Self {
        CellKey((p.lat * 1e6).round() as i64, (p.lon * 1e6).round() as i64)
    }
}

/// Externally supplied travel times with a great-circle fallback.
///
/// Typically filled from a routing engine's distance matrix for the stops of
/// the current cycle.  Pairs not in the matrix use `fallback`.
#[derive(Debug, Clone, Default)]
pub struct MatrixEstimator {
    legs:     HashMap<(CellKey, CellKey), Leg>,
    fallback: GreatCircleEstimator,
}

impl MatrixEstimator {
    pub fn new(fallback: GreatCircleEstimator) -> Self {
        Self { legs: HashMap::new(), fallback }
    }

    /// Record the directed leg `from → to`.
    pub fn insert(&mut self, from: GeoPoint, to: GeoPoint, leg: Leg) -> SpatialResult<()> {
        if leg.distance_m < 0.0 || leg.duration_secs < 0.0 {
            return Err(SpatialError::NegativeLeg { from, to });
        }
        self.legs.insert((check(from)?.into(), check(to)?.into()), leg);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

impl CostEstimator for MatrixEstimator {
    fn leg(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Leg> {
        let key = (CellKey::from(check(from)?), CellKey::from(check(to)?));
        if key.0 == key.1 {
            return Ok(Leg::ZERO);
        }
        match self.legs.get(&key) {
            Some(leg) => Ok(*leg),
            None      => self.fallback.leg(from, to),
        }
    }
}
