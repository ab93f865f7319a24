use crate::models::Coordinate;

/// Mean Earth radius in miles
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Default ratio between the search radius and the straight-line cutoff
///
/// Routed distance is never shorter than the great-circle distance and
/// rarely more than twice it.
pub const DEFAULT_PREFILTER_BUFFER: f64 = 2.0;

/// Calculate the Haversine (great-circle) distance between two points in miles
///
/// Identical coordinates yield exactly `0.0`.
#[inline]
pub fn haversine(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Cheap pre-routing check
///
/// A destination survives when its straight-line distance is within
/// `radius_miles * buffer`.
#[inline]
pub fn passes_prefilter(origin: Coordinate, destination: Coordinate, radius_miles: f64, buffer: f64) -> bool {
    haversine(origin, destination) <= radius_miles * buffer
}
