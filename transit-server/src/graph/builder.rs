//! Construction of the transit graph from feed records.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::domain::{Coord, ServiceTime, Stop, StopId, StopTimeRecord, TripId};
use crate::walkable::{RTreeIndex, SpatialIndex, walk_links};

use super::{Edge, EdgeKind, NodeIndex, Schedule, ScheduleEvent, TransitGraph, TripIndex};

/// Errors from graph construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A configuration value is out of range.
    #[error("invalid build configuration: {0}")]
    InvalidConfig(&'static str),

    /// A static link names a stop that was never added.
    #[error("unknown stop {0} in static link")]
    UnknownStop(String),

    /// A static link has a negative or non-finite duration.
    #[error("invalid static link duration {0}")]
    InvalidDuration(f64),
}

/// Parameters for graph construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Maximum great-circle distance between stops joined by a walk (metres).
    pub walk_radius_m: f64,

    /// Assumed walking speed (metres per second).
    pub walking_speed_mps: f64,
}

impl BuildConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(walk_radius_m: f64, walking_speed_mps: f64) -> Self {
        Self {
            walk_radius_m,
            walking_speed_mps,
        }
    }

    /// Check that the radius is non-negative and the speed positive.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.walk_radius_m.is_finite() || self.walk_radius_m < 0.0 {
            return Err(BuildError::InvalidConfig(
                "walk radius must be a non-negative number",
            ));
        }
        if !self.walking_speed_mps.is_finite() || self.walking_speed_mps <= 0.0 {
            return Err(BuildError::InvalidConfig(
                "walking speed must be a positive number",
            ));
        }
        Ok(())
    }

    /// Time to walk the full radius.
    pub fn max_walk(&self) -> Duration {
        Duration::milliseconds((self.walk_radius_m / self.walking_speed_mps * 1000.0) as i64)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            walk_radius_m: 200.0,
            walking_speed_mps: 1.5,
        }
    }
}

/// Counters describing what a build kept and what it dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub stops: usize,
    pub duplicate_stops: usize,
    pub stops_without_location: usize,
    pub trips: usize,
    pub legs_accepted: usize,
    pub legs_malformed_time: usize,
    pub legs_negative_duration: usize,
    pub legs_unknown_stop: usize,
    pub transport_edges: usize,
    pub pedestrian_edges: usize,
    pub static_edges: usize,
}

impl BuildReport {
    /// Total legs that were excluded from the graph.
    pub fn legs_dropped(&self) -> usize {
        self.legs_malformed_time + self.legs_negative_duration + self.legs_unknown_stop
    }
}

/// Accumulates feed records and produces an immutable [`TransitGraph`].
///
/// # Example
///
/// ```
/// use transit_server::domain::{Coord, Stop, StopId, StopTimeRecord, TripId};
/// use transit_server::graph::{BuildConfig, GraphBuilder};
///
/// let a = StopId::parse("A").unwrap();
/// let b = StopId::parse("B").unwrap();
/// let t1 = TripId::parse("T1").unwrap();
///
/// let mut builder = GraphBuilder::new(BuildConfig::default()).unwrap();
/// builder.add_stops(vec![
///     Stop::new(a.clone(), None, Coord::new(55.0, 12.0)),
///     Stop::new(b.clone(), None, Coord::new(55.1, 12.0)),
/// ]);
/// builder.add_stop_times(vec![
///     StopTimeRecord::new(t1.clone(), a, 1, "08:00:00", "08:00:00"),
///     StopTimeRecord::new(t1, b, 2, "08:10:00", "08:10:00"),
/// ]);
///
/// let (graph, report) = builder.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(report.transport_edges, 1);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    config: BuildConfig,
    stops: Vec<Stop>,
    index: HashMap<StopId, NodeIndex>,
    duplicate_stops: usize,
    stop_times: Vec<StopTimeRecord>,
    static_links: BTreeMap<(NodeIndex, NodeIndex), f64>,
}

impl GraphBuilder {
    /// Create a builder, validating the configuration.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self {
            config,
            stops: Vec::new(),
            index: HashMap::new(),
            duplicate_stops: 0,
            stop_times: Vec::new(),
            static_links: BTreeMap::new(),
        })
    }

    /// Add stops as nodes. Returns the number of new nodes.
    ///
    /// Every stop becomes a node, whether or not any trip serves it. If an id
    /// was already added the earlier stop is kept.
    pub fn add_stops(&mut self, stops: impl IntoIterator<Item = Stop>) -> usize {
        let mut added = 0;
        for stop in stops {
            if self.index.contains_key(&stop.id) {
                warn!(stop = %stop.id, "Duplicate stop id, keeping first occurrence");
                self.duplicate_stops += 1;
                continue;
            }
            let node = NodeIndex(self.stops.len() as u32);
            self.index.insert(stop.id.clone(), node);
            self.stops.push(stop);
            added += 1;
        }
        added
    }

    /// Add stop-time records. They are grouped into trips at build time.
    pub fn add_stop_times(&mut self, records: impl IntoIterator<Item = StopTimeRecord>) {
        self.stop_times.extend(records);
    }

    /// Add a fixed-duration link between two known stops.
    ///
    /// A later link between the same pair replaces an earlier one.
    pub fn add_static_link(
        &mut self,
        from: &str,
        to: &str,
        duration_secs: f64,
    ) -> Result<(), BuildError> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(BuildError::InvalidDuration(duration_secs));
        }
        let from_node = self
            .index
            .get(from)
            .copied()
            .ok_or_else(|| BuildError::UnknownStop(from.to_string()))?;
        let to_node = self
            .index
            .get(to)
            .copied()
            .ok_or_else(|| BuildError::UnknownStop(to.to_string()))?;
        self.static_links.insert((from_node, to_node), duration_secs);
        Ok(())
    }

    /// Build the graph, finding walking links with an R-tree.
    pub fn build(self) -> (TransitGraph, BuildReport) {
        self.build_with_index(RTreeIndex::new)
    }

    /// Build the graph, finding walking links with the index produced by
    /// `make_index` over the coordinates of every located stop.
    pub fn build_with_index<I, F>(self, make_index: F) -> (TransitGraph, BuildReport)
    where
        I: SpatialIndex,
        F: FnOnce(&[Coord]) -> I,
    {
        info!(
            stops = self.stops.len(),
            stop_times = self.stop_times.len(),
            "Building transit graph"
        );

        let mut report = BuildReport {
            stops: self.stops.len(),
            duplicate_stops: self.duplicate_stops,
            ..BuildReport::default()
        };

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); self.stops.len()];

        // Transport edges.
        let (trips, events) = self.collect_transport_events(&mut report);
        for ((from, to), events) in events {
            if let Some(schedule) = Schedule::from_events(events) {
                adjacency[from.idx()].push(Edge {
                    to,
                    kind: EdgeKind::Transport(schedule),
                });
                report.transport_edges += 1;
            }
        }
        report.trips = trips.len();

        // Static links.
        for (&(from, to), &duration_secs) in &self.static_links {
            adjacency[from.idx()].push(Edge {
                to,
                kind: EdgeKind::Static { duration_secs },
            });
            report.static_edges += 1;
        }

        // Pedestrian edges between located stops.
        let (located_nodes, coords): (Vec<NodeIndex>, Vec<Coord>) = self
            .stops
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.location.map(|c| (NodeIndex(i as u32), c)))
            .unzip();
        report.stops_without_location = self.stops.len() - located_nodes.len();
        if report.stops_without_location > 0 {
            warn!(
                count = report.stops_without_location,
                "Stops without coordinates get no walking links"
            );
        }

        let index = make_index(&coords);
        let links = walk_links(
            &coords,
            &index,
            self.config.walk_radius_m,
            self.config.walking_speed_mps,
        );
        for link in links {
            let from = located_nodes[link.from];
            adjacency[from.idx()].push(Edge {
                to: located_nodes[link.to],
                kind: EdgeKind::Pedestrian {
                    distance_m: link.distance_m,
                    duration_secs: link.duration_secs,
                },
            });
            report.pedestrian_edges += 1;
        }

        info!(
            nodes = report.stops,
            trips = report.trips,
            transport_edges = report.transport_edges,
            pedestrian_edges = report.pedestrian_edges,
            static_edges = report.static_edges,
            legs_dropped = report.legs_dropped(),
            "Transit graph built"
        );

        (
            TransitGraph::from_parts(self.stops, trips, adjacency),
            report,
        )
    }

    /// Group stop times into trips and turn consecutive stops into events.
    ///
    /// Returns the interned trip table and the events per (from, to) pair.
    /// Trips are processed in id order so trip indices are deterministic.
    fn collect_transport_events(
        &self,
        report: &mut BuildReport,
    ) -> (
        Vec<TripId>,
        BTreeMap<(NodeIndex, NodeIndex), Vec<ScheduleEvent>>,
    ) {
        let mut by_trip: BTreeMap<&TripId, Vec<&StopTimeRecord>> = BTreeMap::new();
        for record in &self.stop_times {
            by_trip.entry(&record.trip_id).or_default().push(record);
        }

        let mut trips: Vec<TripId> = Vec::new();
        let mut events: BTreeMap<(NodeIndex, NodeIndex), Vec<ScheduleEvent>> = BTreeMap::new();
        let mut unknown_stops: HashSet<&StopId> = HashSet::new();

        for (trip_id, mut calls) in by_trip {
            // Stable, so equal sequence numbers keep feed order.
            calls.sort_by_key(|r| r.sequence);

            let mut trip_index: Option<TripIndex> = None;

            for pair in calls.windows(2) {
                let (prev, next) = (pair[0], pair[1]);

                let (Some(&from), Some(&to)) =
                    (self.index.get(&prev.stop_id), self.index.get(&next.stop_id))
                else {
                    for id in [&prev.stop_id, &next.stop_id] {
                        if !self.index.contains_key(id) && unknown_stops.insert(id) {
                            warn!(stop = %id, trip = %trip_id, "Stop time references unknown stop");
                        }
                    }
                    report.legs_unknown_stop += 1;
                    continue;
                };

                let (Ok(departure), Ok(arrival)) = (
                    ServiceTime::parse(&prev.departure),
                    ServiceTime::parse(&next.arrival),
                ) else {
                    debug!(
                        trip = %trip_id,
                        from = %prev.stop_id,
                        to = %next.stop_id,
                        "Dropping leg with malformed time"
                    );
                    report.legs_malformed_time += 1;
                    continue;
                };

                if arrival < departure {
                    debug!(
                        trip = %trip_id,
                        from = %prev.stop_id,
                        to = %next.stop_id,
                        %departure,
                        %arrival,
                        "Dropping leg that arrives before it departs"
                    );
                    report.legs_negative_duration += 1;
                    continue;
                }

                let trip = *trip_index.get_or_insert_with(|| {
                    trips.push(trip_id.clone());
                    TripIndex((trips.len() - 1) as u32)
                });

                events.entry((from, to)).or_default().push(ScheduleEvent {
                    departure,
                    arrival,
                    trip,
                });
                report.legs_accepted += 1;
            }
        }

        (trips, events)
    }
}
