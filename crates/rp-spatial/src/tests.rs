//! Unit tests for rp-spatial.

#[cfg(test)]
mod estimator {
    use rp_core::GeoPoint;

    use crate::{CostEstimator, GreatCircleEstimator, Leg, MatrixEstimator, SpatialError};

    #[test]
    fn identical_points_cost_nothing() {
        let p = GeoPoint::new(40.2, -8.4);
        let leg = GreatCircleEstimator::default().leg(p, p).unwrap();
        assert!(leg.distance_m < 1e-6);
        assert!(leg.duration_secs < 1e-6);
    }

    #[test]
    fn ten_km_at_forty_kmh_is_fifteen_minutes() {
        let a = GeoPoint::new(40.0, -8.0);
        let b = a.offset_m(10_000.0, 0.0);
        let leg = GreatCircleEstimator::new(40.0).leg(a, b).unwrap();
        assert!((leg.duration_secs - 900.0).abs() < 2.0, "got {}", leg.duration_secs);
    }

    #[test]
    fn monotone_in_distance() {
        let e = GreatCircleEstimator::default();
        let a = GeoPoint::new(40.0, -8.0);
        let near = e.leg(a, a.offset_m(100.0, 0.0)).unwrap();
        let far = e.leg(a, a.offset_m(200.0, 0.0)).unwrap();
        assert!(near.distance_m < far.distance_m);
        assert!(near.duration_secs < far.duration_secs);
    }

    #[test]
    fn invalid_point_is_an_error() {
        let e = GreatCircleEstimator::default();
        let err = e.leg(GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(0.0, 0.0));
        assert!(matches!(err, Err(SpatialError::InvalidPoint(_))));
    }

    #[test]
    fn matrix_prefers_supplied_legs() {
        let a = GeoPoint::new(40.0, -8.0);
        let b = GeoPoint::new(40.01, -8.0);
        let mut m = MatrixEstimator::default();
        m.insert(a, b, Leg { distance_m: 5_000.0, duration_secs: 600.0 }).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.leg(a, b).unwrap().duration_secs, 600.0);
        // Reverse direction falls back to great circle.
        let back = m.leg(b, a).unwrap();
        assert!((back.distance_m - a.distance_m(b)).abs() < 1e-6);
        assert_eq!(m.leg(a, a).unwrap(), Leg::ZERO);
    }

    #[test]
    fn matrix_rejects_negative_legs() {
        let a = GeoPoint::new(40.0, -8.0);
        let mut m = MatrixEstimator::default();
        let err = m.insert(a, a.offset_m(10.0, 0.0), Leg { distance_m: -1.0, duration_secs: 1.0 });
        assert!(matches!(err, Err(SpatialError::NegativeLeg { .. })));
        assert!(m.is_empty());
    }
}

#[cfg(test)]
mod area {
    use rp_core::GeoPoint;

    use crate::{ServiceArea, SpatialError};

    fn square() -> ServiceArea {
        ServiceArea::new(vec![
            GeoPoint::new(40.0, -8.5),
            GeoPoint::new(40.0, -8.3),
            GeoPoint::new(40.3, -8.3),
            GeoPoint::new(40.3, -8.5),
        ])
        .unwrap()
    }

    #[test]
    fn inside_and_outside() {
        let a = square();
        assert!(a.contains(GeoPoint::new(40.2, -8.4)));
        assert!(!a.contains(GeoPoint::new(40.4, -8.4)));
        assert!(!a.contains(GeoPoint::new(40.2, -8.2)));
    }

    #[test]
    fn unbounded_contains_valid_points_only() {
        let a = ServiceArea::unbounded();
        assert!(a.contains(GeoPoint::new(-33.0, 151.0)));
        assert!(!a.contains(GeoPoint::new(100.0, 0.0)));
    }

    #[test]
    fn degenerate_polygon_rejected() {
        let err = ServiceArea::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]);
        assert!(matches!(err, Err(SpatialError::DegeneratePolygon(2))));
    }
}

#[cfg(test)]
mod index {
    use rp_core::{DriverId, GeoPoint};

    use crate::DriverIndex;

    #[test]
    fn nearest_and_radius() {
        let origin = GeoPoint::new(40.2, -8.4);
        let idx = DriverIndex::build([
            (DriverId(0), origin.offset_m(100.0, 0.0)),
            (DriverId(1), origin.offset_m(0.0, 900.0)),
            (DriverId(2), origin.offset_m(-3_000.0, 0.0)),
            (DriverId(3), GeoPoint::new(f64::NAN, 0.0)),
        ]);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.nearest(origin, 2), vec![DriverId(0), DriverId(1)]);
        assert_eq!(idx.within_m(origin, 1_000.0), vec![DriverId(0), DriverId(1)]);
        assert!(idx.within_m(origin, 50.0).is_empty());
    }
}
