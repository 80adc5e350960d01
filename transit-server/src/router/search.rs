//! Earliest-arrival search over the time-dependent graph.
//!
//! A label-setting search (time-dependent Dijkstra). Each label records how a
//! stop was reached and points at the label it was reached from; labels live
//! in an arena and the path is rebuilt once the destination is settled.
//!
//! Label times are milliseconds so that fractional walking times add up
//! exactly. Itinerary times are rounded up to the whole second.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::domain::{
    Hop, HopMode, Itinerary, ItineraryError, ServiceTime, TimeError, millis_ceil,
};
use crate::graph::{EdgeKind, NodeIndex, TransitGraph, TripIndex};

use super::config::RouterConfig;

/// Error from route search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The origin or destination is not a stop in the graph.
    #[error("unknown stop {0:?}")]
    UnknownStop(String),

    /// The departure time could not be parsed.
    #[error(transparent)]
    Time(#[from] TimeError),

    /// The search allocated more labels than the configured budget.
    #[error("search budget of {limit} labels exhausted")]
    BudgetExhausted { limit: usize },

    /// The reconstructed path was not a valid itinerary.
    #[error("invalid itinerary: {0}")]
    Itinerary(#[from] ItineraryError),
}

/// A route query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub departure: ServiceTime,

    /// Transfer buffer override in seconds. Uses the router's configured
    /// buffer when `None`.
    pub min_transfer_secs: Option<u32>,
}

impl RouteRequest {
    /// Create a request from already-parsed parts.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure: ServiceTime,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure,
            min_transfer_secs: None,
        }
    }

    /// Create a request, parsing the departure from `HH:MM:SS`.
    pub fn parse(
        origin: &str,
        destination: &str,
        departure: &str,
        min_transfer_secs: Option<u32>,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            origin: origin.trim().to_string(),
            destination: destination.trim().to_string(),
            departure: ServiceTime::parse(departure)?,
            min_transfer_secs,
        })
    }

    /// Set the transfer buffer for this request.
    pub fn with_min_transfer_secs(mut self, secs: u32) -> Self {
        self.min_transfer_secs = Some(secs);
        self
    }
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The earliest-arrival itinerary.
    Found(Itinerary),

    /// No sequence of edges reaches the destination.
    Unreachable,
}

impl RouteOutcome {
    /// The itinerary, if one was found.
    pub fn itinerary(&self) -> Option<&Itinerary> {
        match self {
            RouteOutcome::Found(it) => Some(it),
            RouteOutcome::Unreachable => None,
        }
    }

    /// Final arrival time, if the destination is reachable.
    pub fn arrival_time(&self) -> Option<ServiceTime> {
        self.itinerary().map(Itinerary::arrival_time)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }
}

/// How a label's node was reached, with the trip still as an index.
#[derive(Debug, Clone, Copy)]
enum Via {
    Start,
    Transport {
        departure: ServiceTime,
        trip: TripIndex,
    },
    Pedestrian,
    Static,
}

#[derive(Debug, Clone, Copy)]
struct Label {
    node: NodeIndex,
    /// Milliseconds since the start of the service day.
    arrival_ms: u64,
    via: Via,
    prev: Option<usize>,
}

/// Frontier entry. Ordered by arrival, then insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    arrival_ms: u64,
    seq: u64,
    label: usize,
}

/// Earliest-arrival router over a built graph.
pub struct Router<'a> {
    graph: &'a TransitGraph,
    config: &'a RouterConfig,
}

impl<'a> Router<'a> {
    /// Create a new router.
    pub fn new(graph: &'a TransitGraph, config: &'a RouterConfig) -> Self {
        Self { graph, config }
    }

    /// Find the earliest-arrival itinerary for a request.
    pub fn route(&self, request: &RouteRequest) -> Result<RouteOutcome, RouteError> {
        let origin = self
            .graph
            .node_index(&request.origin)
            .ok_or_else(|| RouteError::UnknownStop(request.origin.clone()))?;
        let destination = self
            .graph
            .node_index(&request.destination)
            .ok_or_else(|| RouteError::UnknownStop(request.destination.clone()))?;
        let buffer = request
            .min_transfer_secs
            .unwrap_or(self.config.min_transfer_secs);

        debug!(
            origin = %request.origin,
            destination = %request.destination,
            departure = %request.departure,
            buffer,
            "Starting route search"
        );

        let mut search = Search::new(self.graph.node_count(), self.config.max_labels);
        let start = search.push(Label {
            node: origin,
            arrival_ms: request.departure.as_millis(),
            via: Via::Start,
            prev: None,
        })?;

        if origin == destination {
            return Ok(RouteOutcome::Found(self.reconstruct(&search.labels, start)?));
        }

        while let Some(Reverse(entry)) = search.frontier.pop() {
            let label = search.labels[entry.label];
            if label.arrival_ms > search.best[label.node.idx()] {
                continue;
            }

            if label.node == destination {
                debug!(
                    labels = search.labels.len(),
                    arrival_ms = label.arrival_ms,
                    "Destination settled"
                );
                return Ok(RouteOutcome::Found(
                    self.reconstruct(&search.labels, entry.label)?,
                ));
            }

            for edge in self.graph.outgoing(label.node) {
                let Some((arrival_ms, via)) = relax(&label, &edge.kind, buffer) else {
                    continue;
                };
                if arrival_ms < search.best[edge.to.idx()] {
                    search.push(Label {
                        node: edge.to,
                        arrival_ms,
                        via,
                        prev: Some(entry.label),
                    })?;
                }
            }
        }

        debug!(labels = search.labels.len(), "Destination unreachable");
        Ok(RouteOutcome::Unreachable)
    }

    /// Walk predecessor links back to the origin and build the itinerary.
    fn reconstruct(&self, labels: &[Label], last: usize) -> Result<Itinerary, ItineraryError> {
        let mut hops = Vec::new();
        let mut cursor = Some(last);
        while let Some(i) = cursor {
            let label = &labels[i];
            let mode = match label.via {
                Via::Start => HopMode::Start,
                Via::Transport { departure, trip } => HopMode::Transport {
                    departure,
                    trip: self.graph.trip_id(trip).clone(),
                },
                Via::Pedestrian => HopMode::Pedestrian,
                Via::Static => HopMode::Static,
            };
            hops.push(Hop {
                stop: self.graph.stop(label.node).id.clone(),
                arrival: ServiceTime::from_millis_ceil(label.arrival_ms),
                mode,
            });
            cursor = label.prev;
        }
        hops.reverse();
        Itinerary::new(hops)
    }
}

/// Arrival in milliseconds at the far end of `kind` when leaving from
/// `label`, or `None` if the edge cannot be taken.
fn relax(label: &Label, kind: &EdgeKind, buffer: u32) -> Option<(u64, Via)> {
    match kind {
        EdgeKind::Transport(schedule) => {
            // Departures are whole seconds, so boarding at `dep >= arrival`
            // is the same as `dep >= ceil(arrival)`.
            let now = ServiceTime::from_millis_ceil(label.arrival_ms);
            let event = match label.via {
                Via::Transport { trip, .. } => schedule
                    .earliest_on_trip(trip, now)
                    .or_else(|| schedule.earliest_from(now.saturating_add_secs(buffer))),
                Via::Start | Via::Pedestrian | Via::Static => schedule.earliest_from(now),
            }?;
            trace!(
                node = label.node.0,
                departure = %event.departure,
                arrival = %event.arrival,
                "Boarding candidate"
            );
            Some((
                event.arrival.as_millis(),
                Via::Transport {
                    departure: event.departure,
                    trip: event.trip,
                },
            ))
        }
        EdgeKind::Pedestrian { duration_secs, .. } => Some((
            label.arrival_ms.saturating_add(millis_ceil(*duration_secs)),
            Via::Pedestrian,
        )),
        EdgeKind::Static { duration_secs } => Some((
            label.arrival_ms.saturating_add(millis_ceil(*duration_secs)),
            Via::Static,
        )),
    }
}

/// Per-query search state.
struct Search {
    best: Vec<u64>,
    labels: Vec<Label>,
    frontier: BinaryHeap<Reverse<Entry>>,
    seq: u64,
    max_labels: Option<usize>,
}

impl Search {
    fn new(nodes: usize, max_labels: Option<usize>) -> Self {
        Self {
            best: vec![u64::MAX; nodes],
            labels: Vec::new(),
            frontier: BinaryHeap::new(),
            seq: 0,
            max_labels,
        }
    }

    /// Record a label as the best arrival at its node and queue it.
    fn push(&mut self, label: Label) -> Result<usize, RouteError> {
        if let Some(limit) = self.max_labels {
            if self.labels.len() >= limit {
                return Err(RouteError::BudgetExhausted { limit });
            }
        }
        let id = self.labels.len();
        self.labels.push(label);
        self.best[label.node.idx()] = label.arrival_ms;
        self.frontier.push(Reverse(Entry {
            arrival_ms: label.arrival_ms,
            seq: self.seq,
            label: id,
        }));
        self.seq += 1;
        Ok(id)
    }
}
