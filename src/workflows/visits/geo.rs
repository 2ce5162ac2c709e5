use serde::{Deserialize, Serialize};

use super::error::VisitError;

const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, VisitError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(VisitError::ValueConstraint {
                constraint: "latitude must be between -90 and 90",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(VisitError::ValueConstraint {
                constraint: "longitude must be between -180 and 180",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in meters via the haversine formula, using the
    /// mean Earth radius (6,371 km). Rounded to two decimals.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        let meters = MEAN_EARTH_RADIUS_M * c;
        (meters * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 180.5).is_err());
        assert!(GeoPoint::new(0.0, -200.0).is_err());
        assert!(GeoPoint::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let points = [
            GeoPoint::new(0.0, 0.0).expect("valid"),
            GeoPoint::new(30.0444, 31.2357).expect("valid"),
            GeoPoint::new(-33.8688, 151.2093).expect("valid"),
        ];
        for p in points {
            assert_eq!(p.distance_to(&p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let cairo = GeoPoint::new(30.0444, 31.2357).expect("valid");
        let alexandria = GeoPoint::new(31.2001, 29.9187).expect("valid");
        let there = cairo.distance_to(&alexandria);
        let back = alexandria.distance_to(&cairo);
        assert!((there - back).abs() < 0.02, "{there} vs {back}");
    }

    #[test]
    fn known_distance_is_plausible() {
        // Cairo to Alexandria is roughly 180 km great-circle.
        let cairo = GeoPoint::new(30.0444, 31.2357).expect("valid");
        let alexandria = GeoPoint::new(31.2001, 29.9187).expect("valid");
        let km = cairo.distance_to(&alexandria) / 1000.0;
        assert!((170.0..=190.0).contains(&km), "{km} km");
    }

    #[test]
    fn short_distances_resolve_to_meters() {
        // Two points ~111 m apart along a meridian (0.001 degrees latitude).
        let a = GeoPoint::new(30.0, 31.0).expect("valid");
        let b = GeoPoint::new(30.001, 31.0).expect("valid");
        let d = a.distance_to(&b);
        assert!((100.0..=125.0).contains(&d), "{d} m");
    }
}
