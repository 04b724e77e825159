use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if !self.latitude.is_finite() || self.latitude.abs() > 90.0 {
            return Err(ServiceError::ValidationError(format!(
                "Latitude {} is out of range [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || self.longitude.abs() > 180.0 {
            return Err(ServiceError::ValidationError(format!(
                "Longitude {} is out of range [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Great-circle distance between two points (haversine).
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h =
        (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Circular delivery area around the restaurant.
#[derive(Debug, Clone)]
pub struct DeliveryZone {
    center: Point,
    max_radius_km: f64,
}

impl DeliveryZone {
    pub fn new(center: Point, max_radius_km: f64) -> Self {
        Self {
            center,
            max_radius_km,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Point::new(config.restaurant_lat, config.restaurant_lng),
            config.delivery_radius_km,
        )
    }

    pub fn max_radius_km(&self) -> f64 {
        self.max_radius_km
    }

    /// Validates the coordinate and checks it against the zone.
    /// Returns the distance from the restaurant on success.
    pub fn check(&self, point: Point) -> Result<f64, ServiceError> {
        point.validate()?;
        let distance_km = haversine_km(self.center, point);
        if distance_km > self.max_radius_km {
            return Err(ServiceError::OutsideDeliveryZone {
                distance_km,
                max_radius_km: self.max_radius_km,
            });
        }
        Ok(distance_km)
    }
}
