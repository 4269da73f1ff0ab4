//! Great-circle distance on a spherical Earth.

use crate::geometry::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometers.
///
/// Symmetric in its arguments; the distance from a point to itself is zero.
#[must_use]
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat() - from.lat()).to_radians();
    let d_lng = (to.lng() - from.lng()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat().to_radians().cos()
            * to.lat().to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    // Near-antipodal rounding can leave `a` a hair above 1.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
