//! Time-dependent transit graph.
//!
//! Nodes are stops. Edges are either transport edges, which carry the
//! timetable of every trip that runs directly between two consecutive stops,
//! or fixed-duration edges (pedestrian walks and static links).
//!
//! A [`TransitGraph`] is only produced by [`GraphBuilder`] or by loading a
//! snapshot, and has no mutation API: once built it can be shared freely
//! between concurrent route searches.

mod builder;
mod schedule;
pub mod snapshot;

use std::collections::HashMap;

use bitcode::{Decode, Encode};

use crate::domain::{Stop, StopId, TripId};

pub use builder::{BuildConfig, BuildError, BuildReport, GraphBuilder};
pub use schedule::{Schedule, ScheduleEvent};

/// Dense index of a stop within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// The index as a `usize`, for slice access.
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a trip within a graph's trip table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct TripIndex(pub u32);

/// What kind of connection an edge represents, and what it costs.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum EdgeKind {
    /// Scheduled vehicle service between consecutive stops of one or more trips.
    Transport(Schedule),

    /// Walking between nearby stops.
    Pedestrian { distance_m: f64, duration_secs: f64 },

    /// Any other fixed-duration link.
    Static { duration_secs: f64 },
}

impl EdgeKind {
    /// Short lowercase name, used in API output.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Transport(_) => "transport",
            EdgeKind::Pedestrian { .. } => "pedestrian",
            EdgeKind::Static { .. } => "static",
        }
    }

    /// Suggested line colour for map rendering.
    pub fn color_hint(&self) -> &'static str {
        match self {
            EdgeKind::Transport(_) => "blue",
            EdgeKind::Pedestrian { .. } => "green",
            EdgeKind::Static { .. } => "black",
        }
    }

    /// Fixed traversal time in seconds, or `None` for scheduled edges.
    pub fn fixed_duration_secs(&self) -> Option<f64> {
        match self {
            EdgeKind::Transport(_) => None,
            EdgeKind::Pedestrian { duration_secs, .. } | EdgeKind::Static { duration_secs } => {
                Some(*duration_secs)
            }
        }
    }

    /// The timetable, for transport edges.
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            EdgeKind::Transport(s) => Some(s),
            _ => None,
        }
    }
}

/// A directed edge, stored in its origin's adjacency list.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Edge {
    pub to: NodeIndex,
    pub kind: EdgeKind,
}

/// An edge together with its origin, as yielded by [`TransitGraph::edges`].
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'a> {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub kind: &'a EdgeKind,
}

/// The immutable transit graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitGraph {
    stops: Vec<Stop>,
    trips: Vec<TripId>,
    adjacency: Vec<Vec<Edge>>,
    index: HashMap<StopId, NodeIndex>,
}

impl TransitGraph {
    /// Assemble a graph from its parts, rebuilding the id lookup.
    ///
    /// `adjacency` must have one entry per stop.
    fn from_parts(stops: Vec<Stop>, trips: Vec<TripId>, adjacency: Vec<Vec<Edge>>) -> Self {
        let index = stops
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), NodeIndex(i as u32)))
            .collect();

        Self {
            stops,
            trips,
            adjacency,
            index,
        }
    }

    /// Number of stops.
    pub fn node_count(&self) -> usize {
        self.stops.len()
    }

    /// Number of directed edges of all kinds.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Number of distinct trips with at least one edge.
    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// All stops, in node-index order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Stops paired with their node index.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Stop)> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, s)| (NodeIndex(i as u32), s))
    }

    /// The stop at a node.
    pub fn stop(&self, node: NodeIndex) -> &Stop {
        &self.stops[node.idx()]
    }

    /// Look up a stop's node by feed id.
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Edges leaving a node.
    pub fn outgoing(&self, node: NodeIndex) -> &[Edge] {
        &self.adjacency[node.idx()]
    }

    /// Edges leaving a node, with the origin attached.
    pub fn outgoing_edges(&self, node: NodeIndex) -> impl Iterator<Item = EdgeRef<'_>> {
        self.outgoing(node).iter().map(move |e| EdgeRef {
            from: node,
            to: e.to,
            kind: &e.kind,
        })
    }

    /// Every edge in the graph, grouped by origin in node-index order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> {
        self.nodes().flat_map(move |(node, _)| self.outgoing_edges(node))
    }

    /// The feed id of an interned trip.
    pub fn trip_id(&self, trip: TripIndex) -> &TripId {
        &self.trips[trip.0 as usize]
    }

    /// Display name for a stop id, falling back to the id itself.
    pub fn display_name(&self, id: &StopId) -> String {
        self.node_index(id.as_str())
            .map(|n| self.stop(n).display_name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// Count edges by kind: (transport, pedestrian, static).
    pub fn edge_counts_by_kind(&self) -> (usize, usize, usize) {
        self.edges()
            .fold((0, 0, 0), |(t, p, s), e| match e.kind {
                EdgeKind::Transport(_) => (t + 1, p, s),
                EdgeKind::Pedestrian { .. } => (t, p + 1, s),
                EdgeKind::Static { .. } => (t, p, s + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coord, StopTimeRecord};

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop::new(StopId::parse(id).unwrap(), Some(format!("Stop {id}")), Coord::new(lat, lon))
    }

    fn rec(trip: &str, stop: &str, seq: u32, arr: &str, dep: &str) -> StopTimeRecord {
        StopTimeRecord::new(
            TripId::parse(trip).unwrap(),
            StopId::parse(stop).unwrap(),
            seq,
            arr,
            dep,
        )
    }

    fn small_graph() -> TransitGraph {
        let mut builder = GraphBuilder::new(BuildConfig::default()).unwrap();
        builder.add_stops(vec![
            stop("A", 55.0, 12.0),
            stop("B", 55.1, 12.0),
            // ~111 m from B
            stop("C", 55.101, 12.0),
        ]);
        builder.add_stop_times(vec![
            rec("T1", "A", 1, "00:10:00", "00:10:00"),
            rec("T1", "B", 2, "00:20:00", "00:20:00"),
        ]);
        builder.build().0
    }

    #[test]
    fn lookup_and_counts() {
        let g = small_graph();

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.trip_count(), 1);
        assert_eq!(g.edge_counts_by_kind(), (1, 2, 0));
        assert_eq!(g.edge_count(), 3);

        let a = g.node_index("A").unwrap();
        assert_eq!(g.stop(a).id.as_str(), "A");
        assert!(g.node_index("missing").is_none());
    }

    #[test]
    fn edges_carry_origin() {
        let g = small_graph();
        let a = g.node_index("A").unwrap();
        let b = g.node_index("B").unwrap();

        let transport: Vec<_> = g
            .edges()
            .filter(|e| matches!(e.kind, EdgeKind::Transport(_)))
            .collect();
        assert_eq!(transport.len(), 1);
        assert_eq!((transport[0].from, transport[0].to), (a, b));

        let schedule = transport[0].kind.schedule().unwrap();
        assert_eq!(g.trip_id(schedule.events()[0].trip).as_str(), "T1");
    }

    #[test]
    fn outgoing_edges_match_full_scan() {
        let g = small_graph();
        let b = g.node_index("B").unwrap();
        let c = g.node_index("C").unwrap();

        let out: Vec<_> = g.outgoing_edges(b).map(|e| (e.from, e.to, e.kind.as_str())).collect();
        assert_eq!(out, vec![(b, c, "pedestrian")]);

        for (node, _) in g.nodes() {
            let direct: Vec<_> = g.outgoing_edges(node).map(|e| (e.from, e.to)).collect();
            let scanned: Vec<_> = g
                .edges()
                .filter(|e| e.from == node)
                .map(|e| (e.from, e.to))
                .collect();
            assert_eq!(direct, scanned);
        }
    }

    #[test]
    fn edge_kind_hints() {
        let walk = EdgeKind::Pedestrian {
            distance_m: 150.0,
            duration_secs: 100.0,
        };
        assert_eq!(walk.as_str(), "pedestrian");
        assert_eq!(walk.color_hint(), "green");
        assert_eq!(walk.fixed_duration_secs(), Some(100.0));
        assert!(walk.schedule().is_none());

        let link = EdgeKind::Static { duration_secs: 30.0 };
        assert_eq!(link.color_hint(), "black");
        assert_eq!(link.fixed_duration_secs(), Some(30.0));
    }

    #[test]
    fn display_name_lookup() {
        let g = small_graph();
        assert_eq!(g.display_name(&StopId::parse("A").unwrap()), "Stop A");
        assert_eq!(g.display_name(&StopId::parse("Z").unwrap()), "Z");
    }

    #[test]
    fn nodes_enumerate_in_order() {
        let g = small_graph();
        let ids: Vec<_> = g.nodes().map(|(n, s)| (n.0, s.id.to_string())).collect();
        assert_eq!(
            ids,
            vec![(0, "A".to_string()), (1, "B".to_string()), (2, "C".to_string())]
        );
    }
}
