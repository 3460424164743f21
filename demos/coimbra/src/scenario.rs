//! Embedded inputs for the Coimbra demo: one pooled location, a small fleet,
//! a handful of booked requests, and a seeded stream of synthetic ones.

use std::io::Cursor;

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use rp_core::{GeoPoint, LocationId, RiderId};
use rp_dispatch::DispatchConfig;
use rp_fleet::{Driver, Location, NewRequest, ScheduledRequest, load_drivers_reader, load_requests_reader};

/// Praça da República, roughly the middle of the service area.
pub const CENTRE: GeoPoint = GeoPoint { lat: 40.2092, lon: -8.4197 };

const CONFIG_JSON: &str = r#"{
    "lock_ttl_secs": 10,
    "service_secs": 90,
    "speed_kmh": 25,
    "request_timeout_secs": 900,
    "planner": { "max_intermediate_stops": 2, "keep_first_stop": true }
}"#;

const LOCATION_JSON: &str = r#"{
    "id": 0,
    "name": "Coimbra",
    "pooling_enabled": true,
    "passenger_limit": 5,
    "ada_capacity": 1,
    "eta_increase_limit_mins": 10,
    "inversion_range_feet": 1500,
    "concurrent_ride_limit": 3,
    "queue_time_limit_mins": 40
}"#;

const DRIVERS_CSV: &str = "\
driver_id,name,lat,lon,online,available,locations,passenger_capacity,ada_capacity,matching_rule,zones\n\
1,Ana,40.2033,-8.4103,true,true,0,5,1,shared,\n\
2,Rui,40.2110,-8.4290,true,true,0,4,0,shared,\n\
3,Inês,40.1985,-8.4180,true,true,0,5,1,priority,1\n\
4,Tiago,40.2160,-8.4120,true,true,0,6,0,shared,\n\
";

// Booked ahead: a morning burst around the university and the station.
const REQUESTS_CSV: &str = "\
at_secs,rider_id,location_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,passengers,ada,pickup_zone,dropoff_zone\n\
0,101,0,40.2075,-8.4260,40.2110,-8.4290,2,false,,\n\
0,102,0,40.2080,-8.4250,40.2115,-8.4300,1,false,,\n\
60,103,0,40.2000,-8.4200,40.2150,-8.4140,3,false,1,\n\
120,104,0,40.2090,-8.4190,40.1990,-8.4350,1,true,,\n\
180,105,0,40.2120,-8.4210,40.2080,-8.4260,6,false,,\n\
";

pub fn config() -> Result<DispatchConfig> {
    Ok(serde_json::from_str(CONFIG_JSON)?)
}

pub fn location() -> Result<Location> {
    let location: Location = serde_json::from_str(LOCATION_JSON)?;
    Ok(location)
}

pub fn drivers() -> Result<Vec<Driver>> {
    Ok(load_drivers_reader(Cursor::new(DRIVERS_CSV))?)
}

/// Booked requests plus `extra` synthetic ones spread over `horizon_secs`,
/// sorted by submission time.
pub fn requests(extra: usize, horizon_secs: i64, seed: u64) -> Result<Vec<ScheduledRequest>> {
    let mut out = load_requests_reader(Cursor::new(REQUESTS_CSV))?;
    let mut rng = SmallRng::seed_from_u64(seed);
    for i in 0..extra {
        let pickup = CENTRE.offset_m(rng.gen_range(-2500.0..2500.0), rng.gen_range(-2500.0..2500.0));
        let dropoff = CENTRE.offset_m(rng.gen_range(-3000.0..3000.0), rng.gen_range(-3000.0..3000.0));
        let passengers = match rng.gen_range(0..10) {
            0..=5 => 1,
            6..=8 => 2,
            _ => 3,
        };
        let request = NewRequest::new(LocationId(0), pickup, dropoff, passengers).rider(RiderId(1_000 + i as u32));
        out.push(ScheduledRequest { at_secs: rng.gen_range(0..horizon_secs), request });
    }
    out.sort_by_key(|s| s.at_secs);
    Ok(out)
}
