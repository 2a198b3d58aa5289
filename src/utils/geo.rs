use crate::error::{AppError, AppResult};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Reject coordinates outside latitude [-90, 90] / longitude [-180, 180].
///
/// `haversine_distance` itself accepts anything; this is applied where
/// coordinates enter the system.
pub fn validate_coordinates(lat: f64, lng: f64) -> AppResult<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::BadRequest(format!(
            "Latitude {} is out of range [-90, 90]",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::BadRequest(format!(
            "Longitude {} is out of range [-180, 180]",
            lng
        )));
    }
    Ok(())
}

/// Validate an optional (latitude, longitude) pair where both halves must be
/// present together
pub fn validate_optional_location(lat: Option<f64>, lng: Option<f64>) -> AppResult<()> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => validate_coordinates(lat, lng),
        (None, None) => Ok(()),
        _ => Err(AppError::BadRequest(
            "Latitude and longitude must be provided together".to_string(),
        )),
    }
}
