//! Trip identifiers and stop-time records.

use std::fmt;

use bitcode::{Decode, Encode};

use super::StopId;

/// Error returned when a trip identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trip id: {reason}")]
pub struct InvalidTripId {
    reason: &'static str,
}

/// A GTFS trip identifier: one vehicle run through a fixed stop sequence.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct TripId(String);

impl TripId {
    /// Parse a trip id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidTripId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidTripId {
                reason: "must not be empty",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripId({})", self.0)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the feed's stop-time table.
///
/// Times are kept as the raw strings from the feed. They are parsed when the
/// graph is built, where a malformed time drops the affected leg rather than
/// the whole row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeRecord {
    pub trip_id: TripId,
    pub stop_id: StopId,
    /// Position of this stop within the trip (GTFS `stop_sequence`).
    pub sequence: u32,
    pub arrival: String,
    pub departure: String,
}

impl StopTimeRecord {
    /// Create a record.
    pub fn new(
        trip_id: TripId,
        stop_id: StopId,
        sequence: u32,
        arrival: impl Into<String>,
        departure: impl Into<String>,
    ) -> Self {
        Self {
            trip_id,
            stop_id,
            sequence,
            arrival: arrival.into(),
            departure: departure.into(),
        }
    }
}
