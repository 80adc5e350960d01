//! Great-circle geometry on a spherical earth.

use crate::domain::Coord;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in metres (haversine formula).
///
/// # Examples
///
/// ```
/// use transit_server::domain::Coord;
/// use transit_server::geo::haversine_m;
///
/// let a = Coord::new(0.0, 0.0);
/// let b = Coord::new(0.0, 1.0);
/// let d = haversine_m(a, b);
/// assert!((d - 111_194.9).abs() < 1.0);
/// ```
pub fn haversine_m(a: Coord, b: Coord) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Project a coordinate onto a sphere of radius [`EARTH_RADIUS_M`] in
/// earth-centred Cartesian space.
pub fn to_cartesian(c: Coord) -> [f64; 3] {
    let (lat, lon) = (c.lat.to_radians(), c.lon.to_radians());
    [
        EARTH_RADIUS_M * lat.cos() * lon.cos(),
        EARTH_RADIUS_M * lat.cos() * lon.sin(),
        EARTH_RADIUS_M * lat.sin(),
    ]
}

/// Straight-line (chord) length through the sphere matching a great-circle
/// distance in metres.
///
/// Arcs longer than half the circumference map to the diameter.
pub fn chord_for_arc_m(arc_m: f64) -> f64 {
    let angle = (arc_m / EARTH_RADIUS_M).min(std::f64::consts::PI);
    2.0 * EARTH_RADIUS_M * (angle / 2.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist3(a: [f64; 3], b: [f64; 3]) -> f64 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
    }

    #[test]
    fn zero_distance() {
        let c = Coord::new(55.6761, 12.5683);
        assert_eq!(haversine_m(c, c), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = Coord::new(55.6761, 12.5683);
        let b = Coord::new(55.6800, 12.5700);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Coord::new(10.0, 20.0);
        let b = Coord::new(11.0, 20.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((haversine_m(a, b) - expected).abs() < 1e-6);
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(0.0, 180.0);
        let expected = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((haversine_m(a, b) - expected).abs() < 1e-3);
    }

    #[test]
    fn short_distance_in_copenhagen() {
        // Roughly 200 m north of Rådhuspladsen.
        let a = Coord::new(55.6761, 12.5683);
        let b = Coord::new(55.6779, 12.5683);
        let d = haversine_m(a, b);
        assert!((d - 200.15).abs() < 0.5, "got {d}");
    }

    #[test]
    fn chord_matches_projected_distance() {
        let a = Coord::new(55.6761, 12.5683);
        let b = Coord::new(55.6790, 12.5740);
        let arc = haversine_m(a, b);
        let chord = dist3(to_cartesian(a), to_cartesian(b));
        assert!((chord_for_arc_m(arc) - chord).abs() < 1e-6);
    }

    #[test]
    fn chord_is_capped_at_diameter() {
        assert!((chord_for_arc_m(1e12) - 2.0 * EARTH_RADIUS_M).abs() < 1e-6);
        assert_eq!(chord_for_arc_m(0.0), 0.0);
    }
}
