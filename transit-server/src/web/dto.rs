//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::domain::{Hop, HopMode, Stop};
use crate::graph::{EdgeKind, EdgeRef, TransitGraph};
use crate::router::{RouteOutcome, RouteRequest};

/// Query parameters for a route search.
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    /// Origin stop id
    pub origin: String,

    /// Destination stop id
    pub destination: String,

    /// Departure time in HH:MM:SS format
    pub start_time: String,

    /// Transfer buffer in seconds (defaults to the server's setting)
    pub transfer_time: Option<u32>,
}

/// Result of a route search.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    /// Whether the destination is reachable
    pub found: bool,

    pub origin: String,
    pub destination: String,

    /// Requested departure time
    pub departure_time: String,

    /// Final arrival time, if found
    pub arrival_time: Option<String>,

    /// Journey time in seconds, if found
    pub duration_secs: Option<u32>,

    /// Number of vehicle changes, if found
    pub transfers: Option<usize>,

    /// Hops from the origin, empty if not found
    pub hops: Vec<HopResult>,
}

impl RouteResponse {
    pub fn from_outcome(
        graph: &TransitGraph,
        request: &RouteRequest,
        outcome: &RouteOutcome,
    ) -> Self {
        let itinerary = outcome.itinerary();
        Self {
            found: outcome.is_found(),
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            departure_time: request.departure.to_string(),
            arrival_time: itinerary.map(|it| it.arrival_time().to_string()),
            duration_secs: itinerary.map(|it| it.duration_secs()),
            transfers: itinerary.map(|it| it.transfers()),
            hops: itinerary
                .map(|it| it.hops().iter().map(|h| HopResult::from_hop(graph, h)).collect())
                .unwrap_or_default(),
        }
    }
}

/// One hop of an itinerary.
#[derive(Debug, Serialize)]
pub struct HopResult {
    pub stop_id: String,
    pub stop_name: String,

    /// start, transport, pedestrian or static
    pub mode: &'static str,

    /// Arrival time at this stop
    pub arrival_time: String,

    /// Trip ridden to reach this stop (transport only)
    pub trip_id: Option<String>,

    /// Departure time from the previous stop (transport only)
    pub departure_time: Option<String>,

    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl HopResult {
    pub fn from_hop(graph: &TransitGraph, hop: &Hop) -> Self {
        let location = graph
            .node_index(hop.stop.as_str())
            .and_then(|n| graph.stop(n).location);
        let (trip_id, departure_time) = match &hop.mode {
            HopMode::Transport { departure, trip } => {
                (Some(trip.to_string()), Some(departure.to_string()))
            }
            _ => (None, None),
        };

        Self {
            stop_id: hop.stop.to_string(),
            stop_name: graph.display_name(&hop.stop),
            mode: hop.mode.as_str(),
            arrival_time: hop.arrival.to_string(),
            trip_id,
            departure_time,
            lat: location.map(|c| c.lat),
            lon: location.map(|c| c.lon),
        }
    }
}

/// A stop (graph node).
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl From<&Stop> for StopResult {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.display_name().to_string(),
            lat: stop.location.map(|c| c.lat),
            lon: stop.location.map(|c| c.lon),
        }
    }
}

/// All stops.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub stops: Vec<StopResult>,
}

/// One scheduled run over a transport edge.
#[derive(Debug, Serialize)]
pub struct ScheduleEntry {
    pub departure: String,
    pub arrival: String,
    pub trip_id: String,
}

/// A directed edge.
#[derive(Debug, Serialize)]
pub struct EdgeResult {
    pub from: String,
    pub to: String,

    /// transport, pedestrian or static
    pub kind: &'static str,

    /// Suggested line colour
    pub color_hint: &'static str,

    /// False if either endpoint has no coordinates
    pub drawable: bool,

    /// Fixed traversal time in seconds (pedestrian and static)
    pub weight_secs: Option<f64>,

    /// Walking distance in metres (pedestrian only)
    pub distance_m: Option<f64>,

    /// Timetable (transport only)
    pub schedule: Option<Vec<ScheduleEntry>>,
}

impl EdgeResult {
    pub fn from_edge(graph: &TransitGraph, edge: EdgeRef<'_>) -> Self {
        let from = graph.stop(edge.from);
        let to = graph.stop(edge.to);
        let distance_m = match edge.kind {
            EdgeKind::Pedestrian { distance_m, .. } => Some(*distance_m),
            _ => None,
        };
        let schedule = edge.kind.schedule().map(|s| {
            s.events()
                .iter()
                .map(|e| ScheduleEntry {
                    departure: e.departure.to_string(),
                    arrival: e.arrival.to_string(),
                    trip_id: graph.trip_id(e.trip).to_string(),
                })
                .collect()
        });

        Self {
            from: from.id.to_string(),
            to: to.id.to_string(),
            kind: edge.kind.as_str(),
            color_hint: edge.kind.color_hint(),
            drawable: from.location.is_some() && to.location.is_some(),
            weight_secs: edge.kind.fixed_duration_secs(),
            distance_m,
            schedule,
        }
    }
}

/// A list of edges.
#[derive(Debug, Serialize)]
pub struct EdgesResponse {
    pub edges: Vec<EdgeResult>,
}

/// Graph and cache counts.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub nodes: usize,
    pub edges: usize,
    pub transport_edges: usize,
    pub pedestrian_edges: usize,
    pub static_edges: usize,
    pub trips: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_entries: u64,
}

impl StatsResponse {
    pub fn new(graph: &TransitGraph, cache: CacheStats) -> Self {
        let (transport_edges, pedestrian_edges, static_edges) = graph.edge_counts_by_kind();
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            transport_edges,
            pedestrian_edges,
            static_edges,
            trips: graph.trip_count(),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cache_entries: cache.entries,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
