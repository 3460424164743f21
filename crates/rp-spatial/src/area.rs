//! Service-area polygons.

use rp_core::GeoPoint;

use crate::{SpatialError, SpatialResult};

/// A simple polygon in lat/lon space bounding where a location operates.
///
/// An area with no vertices is unbounded and contains every valid point.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceArea {
    vertices: Vec<GeoPoint>,
}

impl ServiceArea {
    /// Build a polygon from its vertices (implicitly closed).
    pub fn new(vertices: Vec<GeoPoint>) -> SpatialResult<Self> {
        if vertices.len() < 3 {
            return Err(SpatialError::DegeneratePolygon(vertices.len()));
        }
        if let Some(bad) = vertices.iter().find(|v| !v.is_valid()) {
            return Err(SpatialError::InvalidPoint(*bad));
        }
        Ok(Self { vertices })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    /// Even-odd ray casting along the longitude axis.  Points exactly on an
    /// edge may fall either way.
    pub fn contains(&self, p: GeoPoint) -> bool {
        if !p.is_valid() {
            return false;
        }
        if self.vertices.is_empty() {
            return true;
        }
        let mut inside = false;
        let n = self.vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.vertices[i], self.vertices[j]);
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let lon_at = a.lon + (p.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
                if p.lon < lon_at {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}
