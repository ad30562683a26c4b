use crate::models::provider::GeoPoint;

const EARTH_RADIUS_MILES: f64 = 3_958.8;

pub fn haversine_miles(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lon = (delta_lon / 2.0).sin();

    let h = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    // clamp keeps asin in its domain for near-antipodal points
    let central_angle = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * central_angle
}
