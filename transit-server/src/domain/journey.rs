//! Itineraries produced by the router.
//!
//! An itinerary is the sequence of hops a traveller makes from the origin to
//! the destination. The first hop is always a `Start` at the origin; each
//! later hop records how the traveller reached its stop.

use std::fmt::Write as _;

use super::{ServiceTime, StopId, TripId};

/// How a hop's stop was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopMode {
    /// The origin of the journey.
    Start,

    /// Riding a vehicle on `trip`, boarding the previous stop at `departure`.
    Transport {
        departure: ServiceTime,
        trip: TripId,
    },

    /// Walking from the previous stop.
    Pedestrian,

    /// A fixed-duration link that is neither a vehicle nor a walk.
    Static,
}

impl HopMode {
    /// Short lowercase name, used in API output.
    pub fn as_str(&self) -> &'static str {
        match self {
            HopMode::Start => "start",
            HopMode::Transport { .. } => "transport",
            HopMode::Pedestrian => "pedestrian",
            HopMode::Static => "static",
        }
    }

    /// The trip ridden, if this is a transport hop.
    pub fn trip(&self) -> Option<&TripId> {
        match self {
            HopMode::Transport { trip, .. } => Some(trip),
            _ => None,
        }
    }
}

/// One step of an itinerary: arriving at `stop` at `arrival` via `mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub stop: StopId,
    pub arrival: ServiceTime,
    pub mode: HopMode,
}

impl Hop {
    /// The initial hop at the origin.
    pub fn start(stop: StopId, at: ServiceTime) -> Self {
        Self {
            stop,
            arrival: at,
            mode: HopMode::Start,
        }
    }
}

/// An earliest-arrival journey.
///
/// Invariants (enforced by [`Itinerary::new`]): the hop list is non-empty,
/// the first hop is a `Start`, no later hop is a `Start`, and arrival times
/// never decrease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    hops: Vec<Hop>,
}

/// Error returned when hops do not form a valid itinerary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItineraryError {
    #[error("itinerary must have at least one hop")]
    Empty,

    #[error("itinerary must begin with a start hop")]
    MissingStart,

    #[error("start hop may only appear first (found at index {0})")]
    MisplacedStart(usize),

    #[error("arrival times go backwards at hop {0}")]
    TimeTravel(usize),
}

impl Itinerary {
    /// Build an itinerary, validating its invariants.
    pub fn new(hops: Vec<Hop>) -> Result<Self, ItineraryError> {
        let first = hops.first().ok_or(ItineraryError::Empty)?;
        if first.mode != HopMode::Start {
            return Err(ItineraryError::MissingStart);
        }
        for (idx, pair) in hops.windows(2).enumerate() {
            if pair[1].mode == HopMode::Start {
                return Err(ItineraryError::MisplacedStart(idx + 1));
            }
            if pair[1].arrival < pair[0].arrival {
                return Err(ItineraryError::TimeTravel(idx + 1));
            }
        }
        Ok(Self { hops })
    }

    /// All hops, starting with the origin.
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// The origin hop.
    pub fn origin(&self) -> &Hop {
        &self.hops[0]
    }

    /// The final hop, at the destination.
    pub fn last(&self) -> &Hop {
        &self.hops[self.hops.len() - 1]
    }

    /// Departure time from the origin.
    pub fn departure_time(&self) -> ServiceTime {
        self.origin().arrival
    }

    /// Arrival time at the destination.
    pub fn arrival_time(&self) -> ServiceTime {
        self.last().arrival
    }

    /// Total journey time in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.arrival_time().secs_since(self.departure_time())
    }

    /// Number of vehicle changes: boardings after the first.
    pub fn transfers(&self) -> usize {
        let mut boardings: usize = 0;
        let mut current_trip: Option<&TripId> = None;
        for hop in &self.hops {
            match hop.mode.trip() {
                Some(trip) => {
                    if current_trip != Some(trip) {
                        boardings += 1;
                    }
                    current_trip = Some(trip);
                }
                None => current_trip = None,
            }
        }
        boardings.saturating_sub(1)
    }

    /// Render the itinerary as console text.
    ///
    /// `name_of` resolves a stop id to a display name.
    ///
    /// # Example
    ///
    /// ```
    /// use transit_server::domain::{Hop, HopMode, Itinerary, ServiceTime, StopId, TripId};
    ///
    /// let a = StopId::parse("A").unwrap();
    /// let b = StopId::parse("B").unwrap();
    /// let itinerary = Itinerary::new(vec![
    ///     Hop::start(a, ServiceTime::from_secs(900)),
    ///     Hop {
    ///         stop: b,
    ///         arrival: ServiceTime::from_secs(1100),
    ///         mode: HopMode::Transport {
    ///             departure: ServiceTime::from_secs(1000),
    ///             trip: TripId::parse("T1").unwrap(),
    ///         },
    ///     },
    /// ])
    /// .unwrap();
    ///
    /// let text = itinerary.render(|id| id.to_string());
    /// assert!(text.contains("take Trip T1 departing 00:16:40"));
    /// ```
    pub fn render<F>(&self, name_of: F) -> String
    where
        F: Fn(&StopId) -> String,
    {
        let mut out = String::new();
        let origin = self.origin();
        let _ = writeln!(
            out,
            "- Start at {} (ID={}) at {}",
            name_of(&origin.stop),
            origin.stop,
            origin.arrival
        );

        for pair in self.hops.windows(2) {
            let (prev, hop) = (&pair[0], &pair[1]);
            let prev_name = name_of(&prev.stop);
            let name = name_of(&hop.stop);
            let _ = match &hop.mode {
                HopMode::Transport { departure, trip } => writeln!(
                    out,
                    "  • At {prev_name} (ID={}), take Trip {trip} departing {departure} → {name} (ID={}), arrive {}",
                    prev.stop, hop.stop, hop.arrival
                ),
                HopMode::Pedestrian => writeln!(
                    out,
                    "  • Walk from {prev_name} (ID={}) → {name} (ID={}), arrive {}",
                    prev.stop, hop.stop, hop.arrival
                ),
                HopMode::Static | HopMode::Start => writeln!(
                    out,
                    "  • Move from {prev_name} (ID={}) → {name} (ID={}), arrive {}",
                    prev.stop, hop.stop, hop.arrival
                ),
            };
        }

        let last = self.last();
        let _ = write!(
            out,
            "\nFinal arrival at {} (ID={}): {}",
            name_of(&last.stop),
            last.stop,
            last.arrival
        );
        out
    }
}
