//! Drivers and their vehicles.

use rp_core::{DriverId, GeoPoint, LocationId, Timestamp, ZoneId};

// ── Matching rules ────────────────────────────────────────────────────────────

/// How a vehicle's zones restrict which requests it is offered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchingRule {
    /// Serves any request; zones are ignored.
    #[default]
    Shared,
    /// Preferred for requests touching its zones, but serves others too.
    Priority,
    /// Serves only requests that start or end in one of its zones.
    Exclusive,
    /// Serves only requests that start and end in its zones.
    Locked,
}

impl std::str::FromStr for MatchingRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "shared" => Ok(MatchingRule::Shared),
            "priority"    => Ok(MatchingRule::Priority),
            "exclusive"   => Ok(MatchingRule::Exclusive),
            "locked"      => Ok(MatchingRule::Locked),
            other         => Err(format!("unknown matching rule {other:?}")),
        }
    }
}

/// Call-order bucket of a vehicle for one request.  Lower buckets are offered
/// the request first; the dispatcher only falls through to a later bucket
/// when no vehicle in an earlier one has a feasible plan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallBucket {
    LockedZone,
    OriginZone,
    DestinationZone,
    Shared,
    PriorityOutOfZone,
}

impl MatchingRule {
    /// Bucket for a request with the given zones, or `None` when the rule
    /// forbids serving it at all.
    pub fn call_bucket(
        self,
        zones:        &[ZoneId],
        pickup_zone:  Option<ZoneId>,
        dropoff_zone: Option<ZoneId>,
    ) -> Option<CallBucket> {
        let has = |z: Option<ZoneId>| z.is_some_and(|z| zones.contains(&z));
        match self {
            MatchingRule::Locked if has(pickup_zone) && has(dropoff_zone) => Some(CallBucket::LockedZone),
            MatchingRule::Locked => None,
            MatchingRule::Priority | MatchingRule::Exclusive if has(pickup_zone) => Some(CallBucket::OriginZone),
            MatchingRule::Priority | MatchingRule::Exclusive if has(dropoff_zone) => Some(CallBucket::DestinationZone),
            MatchingRule::Exclusive => None,
            MatchingRule::Shared => Some(CallBucket::Shared),
            MatchingRule::Priority => Some(CallBucket::PriorityOutOfZone),
        }
    }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// Seats and matching configuration of a driver's vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub passenger_capacity: u32,
    /// Wheelchair-accessible seats; a sub-count of `passenger_capacity`.
    pub ada_capacity:       u32,
    pub matching_rule:      MatchingRule,
    pub zones:              Vec<ZoneId>,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            passenger_capacity: 5,
            ada_capacity:       0,
            matching_rule:      MatchingRule::Shared,
            zones:              Vec::new(),
        }
    }
}

impl Vehicle {
    pub fn new(passenger_capacity: u32, ada_capacity: u32) -> Self {
        Self { passenger_capacity, ada_capacity, ..Self::default() }
    }

    pub fn with_rule(mut self, rule: MatchingRule, zones: Vec<ZoneId>) -> Self {
        self.matching_rule = rule;
        self.zones = zones;
        self
    }

    pub fn call_bucket(&self, pickup_zone: Option<ZoneId>, dropoff_zone: Option<ZoneId>) -> Option<CallBucket> {
        self.matching_rule.call_bucket(&self.zones, pickup_zone, dropoff_zone)
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// A driver, their last reported position, and their vehicle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Driver {
    pub id:           DriverId,
    pub name:         String,
    pub position:     GeoPoint,
    /// When `position` was last reported.
    pub position_at:  Timestamp,
    pub is_online:    bool,
    pub is_available: bool,
    pub locations:    Vec<LocationId>,
    pub vehicle:      Vehicle,
}

impl Driver {
    pub fn new(id: DriverId, position: GeoPoint, vehicle: Vehicle) -> Self {
        Self {
            id,
            name:         String::new(),
            position,
            position_at:  Timestamp::ZERO,
            is_online:    true,
            is_available: true,
            locations:    Vec::new(),
            vehicle,
        }
    }

    pub fn serving(mut self, location: LocationId) -> Self {
        self.locations.push(location);
        self
    }

    pub fn serves(&self, location: LocationId) -> bool {
        self.locations.contains(&location)
    }

    /// Online, available, and placed at a valid position.
    pub fn is_dispatchable(&self) -> bool {
        self.is_online && self.is_available && self.position.is_valid()
    }
}
