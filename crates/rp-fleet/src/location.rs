//! Service locations.
//!
//! A location is an operating area with its own dispatch limits.  Locations
//! are read-only during a dispatch cycle.

use rp_core::{Capacity, GeoPoint, LocationId, feet_to_m};
use rp_spatial::ServiceArea;

use crate::Vehicle;

/// A service location and its dispatch limits.
///
/// | Field                     | Default | Meaning                                          |
/// |---------------------------|---------|--------------------------------------------------|
/// | `passenger_limit`         | 5       | Max occupants per ride and per vehicle at once   |
/// | `ada_capacity`            | `None`  | Extra cap on ADA seats (vehicle's own if `None`) |
/// | `pooling_enabled`         | false   | Allow several rides on one route                 |
/// | `eta_increase_limit_mins` | 15      | Max delay a new ride may add to a waiting pickup |
/// | `inversion_range_feet`    | 2300    | Distance under which orderings cost the same     |
/// | `concurrent_ride_limit`   | 3       | Max distinct rides aboard at once                |
/// | `queue_time_limit_mins`   | 30      | Max duration of a non-empty pending route        |
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Location {
    pub id:                      LocationId,
    pub name:                    String,
    pub area:                    ServiceArea,
    pub passenger_limit:         u32,
    pub ada_capacity:            Option<u32>,
    pub pooling_enabled:         bool,
    pub eta_increase_limit_mins: u32,
    pub inversion_range_feet:    f64,
    pub concurrent_ride_limit:   u32,
    pub queue_time_limit_mins:   u32,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            id:                      LocationId::INVALID,
            name:                    String::new(),
            area:                    ServiceArea::unbounded(),
            passenger_limit:         5,
            ada_capacity:            None,
            pooling_enabled:         false,
            eta_increase_limit_mins: 15,
            inversion_range_feet:    2300.0,
            concurrent_ride_limit:   3,
            queue_time_limit_mins:   30,
        }
    }
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Self::default() }
    }

    pub fn with_area(mut self, area: ServiceArea) -> Self {
        self.area = area;
        self
    }

    pub fn with_pooling(mut self, enabled: bool) -> Self {
        self.pooling_enabled = enabled;
        self
    }

    pub fn serves(&self, p: GeoPoint) -> bool {
        self.area.contains(p)
    }

    pub fn inversion_range_m(&self) -> f64 {
        feet_to_m(self.inversion_range_feet)
    }

    pub fn eta_increase_limit_secs(&self) -> f64 {
        f64::from(self.eta_increase_limit_mins) * 60.0
    }

    pub fn queue_time_limit_secs(&self) -> f64 {
        f64::from(self.queue_time_limit_mins) * 60.0
    }

    /// Capacity of `vehicle` while operating here: the vehicle's own seats
    /// clipped by the location's passenger, ADA, and concurrent-ride limits.
    /// Without pooling a vehicle carries one ride at a time.
    pub fn route_capacity(&self, vehicle: &Vehicle) -> Capacity {
        let rides = if self.pooling_enabled { self.concurrent_ride_limit } else { 1 };
        Capacity::new(
            vehicle.passenger_capacity,
            vehicle.ada_capacity,
            u32::MAX,
        )
        .min(Capacity::new(
            self.passenger_limit,
            self.ada_capacity.unwrap_or(u32::MAX),
            rides,
        ))
    }
}
