//! CSV loaders for drivers and scheduled requests.
//!
//! # Driver CSV
//!
//! ```csv
//! driver_id,name,lat,lon,online,available,locations,passenger_capacity,ada_capacity,matching_rule,zones
//! 0,Ana,40.2033,-8.4103,true,true,0,5,1,shared,
//! 1,Rui,40.2100,-8.4200,true,true,0;1,4,0,priority,3;4
//! ```
//!
//! `locations` and `zones` are `;`-separated ids; an empty field means none.
//! `matching_rule` is one of `shared`, `priority`, `exclusive`, `locked`
//! (empty means `shared`).
//!
//! # Request CSV
//!
//! ```csv
//! at_secs,rider_id,location_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,passengers,ada,pickup_zone,dropoff_zone
//! 0,17,0,40.2050,-8.4150,40.1900,-8.4300,2,false,,
//! ```
//!
//! `at_secs` is the submission offset from the start of a replay.  Empty
//! `rider_id`, `pickup_zone`, or `dropoff_zone` mean none.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use rp_core::{DriverId, GeoPoint, LocationId, RiderId, ZoneId};

use crate::{Driver, FleetError, FleetResult, MatchingRule, NewRequest, Vehicle};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DriverRecord {
    driver_id:          u32,
    name:               String,
    lat:                f64,
    lon:                f64,
    online:             bool,
    available:          bool,
    locations:          String,
    passenger_capacity: u32,
    ada_capacity:       u32,
    matching_rule:      String,
    zones:              String,
}

#[derive(Deserialize)]
struct RequestRecord {
    at_secs:      i64,
    rider_id:     Option<u32>,
    location_id:  u16,
    pickup_lat:   f64,
    pickup_lon:   f64,
    dropoff_lat:  f64,
    dropoff_lon:  f64,
    passengers:   u32,
    ada:          bool,
    pickup_zone:  Option<u16>,
    dropoff_zone: Option<u16>,
}

/// A request to be submitted `at_secs` seconds into a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledRequest {
    pub at_secs: i64,
    pub request: NewRequest,
}

// ── Public API ────────────────────────────────────────────────────────────────

pub fn load_drivers_csv(path: &Path) -> FleetResult<Vec<Driver>> {
    let file = std::fs::File::open(path)?;
    load_drivers_reader(file)
}

/// Like [`load_drivers_csv`] but accepts any `Read` source.
pub fn load_drivers_reader<R: Read>(reader: R) -> FleetResult<Vec<Driver>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut drivers = Vec::new();
    for result in rdr.deserialize::<DriverRecord>() {
        let r = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let rule: MatchingRule = r.matching_rule.parse().map_err(FleetError::Parse)?;
        let zones = parse_ids(&r.zones)?.into_iter().map(ZoneId).collect();
        let vehicle = Vehicle::new(r.passenger_capacity, r.ada_capacity).with_rule(rule, zones);

        let mut driver = Driver::new(DriverId(r.driver_id), GeoPoint::new(r.lat, r.lon), vehicle);
        driver.name = r.name;
        driver.is_online = r.online;
        driver.is_available = r.available;
        driver.locations = parse_ids(&r.locations)?.into_iter().map(LocationId).collect();
        drivers.push(driver);
    }
    Ok(drivers)
}

pub fn load_requests_csv(path: &Path) -> FleetResult<Vec<ScheduledRequest>> {
    let file = std::fs::File::open(path)?;
    load_requests_reader(file)
}

/// Like [`load_requests_csv`] but accepts any `Read` source.  Rows are
/// returned sorted by `at_secs` (stable for equal offsets).
pub fn load_requests_reader<R: Read>(reader: R) -> FleetResult<Vec<ScheduledRequest>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for result in rdr.deserialize::<RequestRecord>() {
        let r = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let mut request = NewRequest::new(
            LocationId(r.location_id),
            GeoPoint::new(r.pickup_lat, r.pickup_lon),
            GeoPoint::new(r.dropoff_lat, r.dropoff_lon),
            r.passengers,
        )
        .ada(r.ada)
        .zones(r.pickup_zone.map(ZoneId), r.dropoff_zone.map(ZoneId));
        request.rider = r.rider_id.map(RiderId);
        out.push(ScheduledRequest { at_secs: r.at_secs, request });
    }
    out.sort_by_key(|s| s.at_secs);
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_ids<T: std::str::FromStr>(field: &str) -> FleetResult<Vec<T>> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| FleetError::Parse(format!("invalid id {s:?} in list {field:?}")))
        })
        .collect()
}
