//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::{CacheConfig, CachedRouter};
use crate::graph::TransitGraph;
use crate::router::RouterConfig;

/// Shared application state.
///
/// The graph is read-only; the only mutable state is inside the route cache.
#[derive(Clone)]
pub struct AppState {
    /// The transit graph
    pub graph: Arc<TransitGraph>,

    /// Cached router over `graph`
    pub router: Arc<CachedRouter>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(graph: TransitGraph, config: RouterConfig, cache_config: &CacheConfig) -> Self {
        let graph = Arc::new(graph);
        let router = CachedRouter::new(Arc::clone(&graph), Arc::new(config), cache_config);
        Self {
            graph,
            router: Arc::new(router),
        }
    }
}
