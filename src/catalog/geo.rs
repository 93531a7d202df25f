//! Great-circle distance

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points given in decimal degrees, in km
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Offset a point by kilometres north and east (flat-earth, fine for boxes of a few hundred km)
pub fn offset_km(lat: f64, lon: f64, north_km: f64, east_km: f64) -> (f64, f64) {
    let km_per_deg = EARTH_RADIUS_KM.to_radians();
    let new_lat = lat + north_km / km_per_deg;
    let cos_lat = lat.to_radians().cos().max(1e-6);
    let new_lon = lon + east_km / (km_per_deg * cos_lat);
    (new_lat, new_lon)
}
