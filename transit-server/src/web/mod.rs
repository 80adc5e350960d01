//! Web layer for the transit router.
//!
//! Provides a JSON API for route queries and read-only graph enumeration.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
