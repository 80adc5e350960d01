//! Earliest-arrival routing.
//!
//! Answers "leaving stop A at time t, when is the earliest I can be at stop
//! B, and how?" over a built [`TransitGraph`](crate::graph::TransitGraph).
//!
//! Staying aboard the same trip needs no transfer buffer. Boarding a
//! different trip after alighting needs at least `min_transfer_secs`. The
//! first boarding, and boarding after a walk, need none.

mod config;
mod search;


pub use config::{DEFAULT_MIN_TRANSFER_SECS, RouterConfig};
pub use search::{RouteError, RouteOutcome, RouteRequest, Router};
