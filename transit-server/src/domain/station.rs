//! Stop identifiers and stop records.

use std::borrow::Borrow;
use std::fmt;

use bitcode::{Decode, Encode};

/// Error returned when a stop identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// A GTFS stop identifier.
///
/// Feeds use arbitrary strings, so the only validation is that the id is
/// non-empty after trimming.
///
/// # Examples
///
/// ```
/// use transit_server::domain::StopId;
///
/// let id = StopId::parse(" 8600626 ").unwrap();
/// assert_eq!(id.as_str(), "8600626");
///
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidStopId {
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

impl Borrow<str> for StopId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point on the earth's surface, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Create a coordinate.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn checked(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}

/// A stop from the feed's stop table.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Stop {
    /// Feed identifier.
    pub id: StopId,

    /// Display name, if the feed provides one.
    pub name: Option<String>,

    /// Location, if the feed row carried valid coordinates.
    pub location: Option<Coord>,
}

impl Stop {
    /// Create a stop with a known location.
    pub fn new(id: StopId, name: Option<String>, location: Coord) -> Self {
        Self {
            id,
            name,
            location: Some(location),
        }
    }

    /// Create a stop without coordinates.
    pub fn unlocated(id: StopId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            location: None,
        }
    }

    /// Name to show to people: the display name, or the id if there is none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims() {
        let id = StopId::parse("  A1 ").unwrap();
        assert_eq!(id.as_str(), "A1");
    }

    #[test]
    fn reject_empty() {
        assert!(StopId::parse("").is_err());
        assert!(StopId::parse(" \t").is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = StopId::parse("8600626").unwrap();
        assert_eq!(format!("{}", id), "8600626");
        assert_eq!(format!("{:?}", id), "StopId(8600626)");
    }

    #[test]
    fn coord_checked() {
        assert!(Coord::checked(55.67, 12.56).is_some());
        assert!(Coord::checked(91.0, 0.0).is_none());
        assert!(Coord::checked(0.0, -181.0).is_none());
        assert!(Coord::checked(f64::NAN, 0.0).is_none());
        assert!(Coord::checked(0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let id = StopId::parse("S1").unwrap();
        let named = Stop::new(id.clone(), Some("Central".into()), Coord::new(0.0, 0.0));
        let unnamed = Stop::unlocated(id, None);

        assert_eq!(named.display_name(), "Central");
        assert_eq!(unnamed.display_name(), "S1");
        assert!(unnamed.location.is_none());
    }
}
