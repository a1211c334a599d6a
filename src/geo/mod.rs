pub mod osrm;
pub mod resolver;
pub mod yandex;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::geo::GeoPoint;

pub use resolver::{DistanceChain, DistanceTier, GeoResolver};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Turns a free-form address into coordinates. `Ok(None)` means the provider
/// answered but knows no such place.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, ProviderError>;
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn driving_distance_km(
        &self,
        from: GeoPoint,
        to: GeoPoint,
    ) -> Result<Option<f64>, ProviderError>;
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use super::haversine_km;
    use crate::models::geo::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 55.7575,
            lng: 37.6136,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let moscow = GeoPoint {
            lat: 55.7558,
            lng: 37.6173,
        };
        let tver = GeoPoint {
            lat: 56.8587,
            lng: 35.9176,
        };
        let there = haversine_km(&moscow, &tver);
        let back = haversine_km(&tver, &moscow);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn moscow_to_saint_petersburg_is_around_634_km() {
        let moscow = GeoPoint {
            lat: 55.7558,
            lng: 37.6173,
        };
        let spb = GeoPoint {
            lat: 59.9343,
            lng: 30.3351,
        };
        let distance = haversine_km(&moscow, &spb);
        assert!((distance - 634.0).abs() < 5.0);
    }
}
