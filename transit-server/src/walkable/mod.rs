//! Walkable connections between nearby stops.
//!
//! Stops close enough to walk between get pedestrian links in the transit
//! graph. Finding them needs a radius query over stop coordinates; the query
//! is expressed as the [`SpatialIndex`] capability so the backing structure
//! can be swapped (R-tree for real feeds, linear scan for small inputs and as
//! a test oracle).

mod linear;
mod rtree;

pub use linear::LinearIndex;
pub use rtree::RTreeIndex;

use crate::domain::Coord;
use crate::geo::haversine_m;

/// Radius queries over a fixed set of points.
///
/// Point ids are positions in the slice the index was built from.
pub trait SpatialIndex {
    /// Ids of all points whose great-circle distance from `at` is at most
    /// `radius_m`, in ascending id order.
    fn within_radius(&self, at: Coord, radius_m: f64) -> Vec<usize>;

    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Returns true if no points are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A directed walking link between two indexed points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkLink {
    pub from: usize,
    pub to: usize,
    /// Great-circle distance in metres.
    pub distance_m: f64,
    /// Walking time in seconds.
    pub duration_secs: f64,
}

/// Find every directed walking link among `points`.
///
/// Each point queries the index on its own, so a pair within range yields a
/// link in each direction. Self-pairs are excluded. Links are ordered by
/// `from`, then `to`.
pub fn walk_links<I: SpatialIndex + ?Sized>(
    points: &[Coord],
    index: &I,
    radius_m: f64,
    speed_mps: f64,
) -> Vec<WalkLink> {
    let mut links = Vec::new();
    for (from, &at) in points.iter().enumerate() {
        for to in index.within_radius(at, radius_m) {
            if to == from {
                continue;
            }
            let distance_m = haversine_m(at, points[to]);
            links.push(WalkLink {
                from,
                to,
                distance_m,
                duration_secs: distance_m / speed_mps,
            });
        }
    }
    links
}
