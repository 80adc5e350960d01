//! Brute-force spatial index.

use crate::domain::Coord;
use crate::geo::haversine_m;

use super::SpatialIndex;

/// Checks every point on each query. Fine for small feeds and tests.
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    points: Vec<Coord>,
}

impl LinearIndex {
    /// Index a set of points.
    pub fn new(points: &[Coord]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl SpatialIndex for LinearIndex {
    fn within_radius(&self, at: Coord, radius_m: f64) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| haversine_m(at, **p) <= radius_m)
            .map(|(id, _)| id)
            .collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index() {
        let index = LinearIndex::new(&[]);
        assert!(index.is_empty());
        assert!(index.within_radius(Coord::new(0.0, 0.0), 1e9).is_empty());
    }

    #[test]
    fn includes_query_point_and_boundary() {
        let points = [Coord::new(0.0, 0.0), Coord::new(0.0, 0.001)];
        let index = LinearIndex::new(&points);
        let d = haversine_m(points[0], points[1]);

        assert_eq!(index.within_radius(points[0], d), vec![0, 1]);
        assert_eq!(index.within_radius(points[0], d - 0.01), vec![0]);
    }
}
