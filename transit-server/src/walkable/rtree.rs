//! R-tree spatial index over earth-centred Cartesian coordinates.
//!
//! Points are projected onto a sphere so that Euclidean distance in the tree
//! is the chord length between stops. A great-circle radius converts to an
//! equivalent chord, which gives a candidate set that is then filtered with
//! the haversine distance so results match [`LinearIndex`](super::LinearIndex)
//! exactly.

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::domain::Coord;
use crate::geo::{chord_for_arc_m, haversine_m, to_cartesian};

use super::SpatialIndex;

/// Slack added to the chord radius so boundary points survive rounding in the
/// projection; the haversine filter has the final say.
const CHORD_SLACK_M: f64 = 1e-3;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// R-tree backed [`SpatialIndex`].
pub struct RTreeIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<Coord>,
}

impl RTreeIndex {
    /// Bulk-load an index over a set of points.
    pub fn new(points: &[Coord]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(id, c)| GeomWithData::new(to_cartesian(*c), id))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            points: points.to_vec(),
        }
    }
}

impl SpatialIndex for RTreeIndex {
    fn within_radius(&self, at: Coord, radius_m: f64) -> Vec<usize> {
        if radius_m.is_nan() || radius_m < 0.0 {
            return Vec::new();
        }
        let chord = chord_for_arc_m(radius_m) + CHORD_SLACK_M;

        let mut ids: Vec<usize> = self
            .tree
            .locate_within_distance(to_cartesian(at), chord * chord)
            .map(|entry| entry.data)
            .filter(|&id| haversine_m(at, self.points[id]) <= radius_m)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

impl std::fmt::Debug for RTreeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RTreeIndex")
            .field("points", &self.points.len())
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::walkable::LinearIndex;
    use proptest::prelude::*;

    fn coord() -> impl Strategy<Value = Coord> {
        (55.60f64..55.62, 12.50f64..12.53).prop_map(|(lat, lon)| Coord::new(lat, lon))
    }

    proptest! {
        /// The R-tree returns exactly what a full scan returns.
        #[test]
        fn rtree_agrees_with_linear_scan(
            points in prop::collection::vec(coord(), 0..60),
            query in coord(),
            radius in 0.0f64..800.0,
        ) {
            let rtree = RTreeIndex::new(&points);
            let linear = LinearIndex::new(&points);
            prop_assert_eq!(
                rtree.within_radius(query, radius),
                linear.within_radius(query, radius)
            );
        }
    }
}
