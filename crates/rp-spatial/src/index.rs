//! R-tree of driver positions.
//!
//! Rebuilt once per dispatch cycle from the drivers' last reported positions
//! and used to pre-filter candidates by distance to a request's pickup.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use rp_core::{DriverId, GeoPoint};

/// Metres per degree of latitude, used to turn a radius into a degree box.
const M_PER_DEG: f64 = 111_195.0;

#[derive(Clone)]
struct DriverEntry {
    point: [f64; 2], // [lat, lon]
    id:    DriverId,
    pos:   GeoPoint,
}

impl RTreeObject for DriverEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for DriverEntry {
    /// Squared Euclidean distance in lat/lon space.  Only used for ordering
    /// nearest-neighbour candidates; exact metres come from haversine.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Spatial index over driver positions.
pub struct DriverIndex {
    tree: RTree<DriverEntry>,
}

impl DriverIndex {
    /// Bulk-load from `(driver, position)` pairs.  Invalid positions are
    /// skipped.
    pub fn build(positions: impl IntoIterator<Item = (DriverId, GeoPoint)>) -> Self {
        let entries: Vec<DriverEntry> = positions
            .into_iter()
            .filter(|(_, p)| p.is_valid())
            .map(|(id, pos)| DriverEntry { point: [pos.lat, pos.lon], id, pos })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Up to `k` drivers nearest to `pos`, closest first.
    pub fn nearest(&self, pos: GeoPoint, k: usize) -> Vec<DriverId> {
        self.tree
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// All drivers within `radius_m` metres of `pos`, sorted by id.
    pub fn within_m(&self, pos: GeoPoint, radius_m: f64) -> Vec<DriverId> {
        // Longitude degrees shrink with latitude; search the wider circle and
        // filter by exact distance.
        let half_lat = radius_m / M_PER_DEG;
        let half_lon = half_lat / pos.lat.to_radians().cos().abs().max(1e-6);
        let reach = half_lat.max(half_lon);
        let mut found: Vec<DriverId> = self.tree
            .locate_within_distance([pos.lat, pos.lon], reach * reach)
            .filter(|e| e.pos.distance_m(pos) <= radius_m)
            .map(|e| e.id)
            .collect();
        found.sort_unstable();
        found
    }
}
