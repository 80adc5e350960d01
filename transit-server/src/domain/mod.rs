//! Domain types for the transit router.
//!
//! These types represent validated feed data and router output. Types
//! enforce their invariants at construction time, so code that receives them
//! can trust their validity.

mod journey;
mod station;
mod time;
mod trip;

pub use journey::{Hop, HopMode, Itinerary, ItineraryError};
pub use station::{Coord, InvalidStopId, Stop, StopId};
pub use time::{ServiceTime, TimeError, millis_ceil};
pub use trip::{InvalidTripId, StopTimeRecord, TripId};
