//! Caching layer for route queries.
//!
//! Searches over a fixed graph are pure functions of (origin, destination,
//! departure, transfer buffer), so outcomes can be memoised. Errors are not
//! cached; unknown stops are cheap to rediscover.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::ServiceTime;
use crate::graph::TransitGraph;
use crate::router::{RouteError, RouteOutcome, RouteRequest, Router, RouterConfig};

/// Cache key for route outcomes: (origin, destination, departure, buffer).
pub type RouteKey = (String, String, ServiceTime, u32);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_capacity: 10_000,
        }
    }
}

/// Memoised route outcomes.
pub struct RouteCache {
    outcomes: MokaCache<RouteKey, Arc<RouteOutcome>>,
}

impl RouteCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let outcomes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { outcomes }
    }

    /// Get a cached outcome.
    pub async fn get(&self, key: &RouteKey) -> Option<Arc<RouteOutcome>> {
        self.outcomes.get(key).await
    }

    /// Insert an outcome into the cache.
    pub async fn insert(&self, key: RouteKey, outcome: Arc<RouteOutcome>) {
        self.outcomes.insert(key, outcome).await;
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.outcomes.entry_count()
    }

    /// Apply pending inserts and evictions so counts are current.
    pub async fn sync(&self) {
        self.outcomes.run_pending_tasks().await;
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.outcomes.invalidate_all();
    }
}

/// Error from a cached route query.
#[derive(Debug, thiserror::Error)]
pub enum CachedRouteError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("route search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Cache hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Router with caching.
///
/// Wraps a shared graph and router configuration, running searches on the
/// blocking pool and caching their outcomes.
pub struct CachedRouter {
    graph: Arc<TransitGraph>,
    config: Arc<RouterConfig>,
    cache: RouteCache,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedRouter {
    /// Create a new cached router.
    pub fn new(
        graph: Arc<TransitGraph>,
        config: Arc<RouterConfig>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            graph,
            config,
            cache: RouteCache::new(cache_config),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The graph being routed over.
    pub fn graph(&self) -> &Arc<TransitGraph> {
        &self.graph
    }

    /// The router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route a request, using the cache if available.
    pub async fn route(
        &self,
        request: RouteRequest,
    ) -> Result<Arc<RouteOutcome>, CachedRouteError> {
        let buffer = request
            .min_transfer_secs
            .unwrap_or(self.config.min_transfer_secs);
        let key = (
            request.origin.clone(),
            request.destination.clone(),
            request.departure,
            buffer,
        );

        if let Some(cached) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(origin = %key.0, destination = %key.1, "Route cache hit");
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let graph = Arc::clone(&self.graph);
        let config = Arc::clone(&self.config);
        let request = request.with_min_transfer_secs(buffer);
        let outcome = tokio::task::spawn_blocking(move || {
            Router::new(&graph, &config).route(&request)
        })
        .await??;

        let entry = Arc::new(outcome);
        self.cache.insert(key, Arc::clone(&entry)).await;
        Ok(entry)
    }

    /// Current hit, miss and entry counts.
    pub async fn stats(&self) -> CacheStats {
        self.cache.sync().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coord, Stop, StopId, StopTimeRecord, TripId};
    use crate::graph::{BuildConfig, GraphBuilder};

    fn t(secs: u32) -> ServiceTime {
        ServiceTime::from_secs(secs)
    }

    fn router() -> CachedRouter {
        let sid = |s: &str| StopId::parse(s).unwrap();
        let trip = || TripId::parse("T1").unwrap();
        let mut b = GraphBuilder::new(BuildConfig::default()).unwrap();
        b.add_stops(vec![
            Stop::new(sid("A"), None, Coord::new(55.0, 12.0)),
            Stop::new(sid("B"), None, Coord::new(55.1, 12.0)),
        ]);
        b.add_stop_times(vec![
            StopTimeRecord::new(trip(), sid("A"), 1, "00:16:40", "00:16:40"),
            StopTimeRecord::new(trip(), sid("B"), 2, "00:18:20", "00:18:20"),
        ]);
        let (graph, _) = b.build();

        CachedRouter::new(
            Arc::new(graph),
            Arc::new(RouterConfig::default()),
            &CacheConfig::default(),
        )
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert_eq!(config.max_capacity, 10_000);
    }

    #[tokio::test]
    async fn repeated_query_hits_cache() {
        let router = router();
        let request = RouteRequest::new("A", "B", t(900));

        let first = router.route(request.clone()).await.unwrap();
        let second = router.route(request).await.unwrap();

        assert_eq!(first.arrival_time(), Some(t(1100)));
        assert!(Arc::ptr_eq(&first, &second));

        let stats = router.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn default_and_explicit_buffer_share_entry() {
        let router = router();
        router
            .route(RouteRequest::new("A", "B", t(900)))
            .await
            .unwrap();
        router
            .route(RouteRequest::new("A", "B", t(900)).with_min_transfer_secs(180))
            .await
            .unwrap();

        assert_eq!(router.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn different_departures_are_separate_entries() {
        let router = router();
        let early = router.route(RouteRequest::new("A", "B", t(900))).await.unwrap();
        let late = router.route(RouteRequest::new("A", "B", t(2000))).await.unwrap();

        assert!(early.is_found());
        assert_eq!(*late, RouteOutcome::Unreachable);
        assert_eq!(router.stats().await.entries, 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let router = router();
        for _ in 0..2 {
            let err = router
                .route(RouteRequest::new("A", "NOPE", t(0)))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                CachedRouteError::Route(RouteError::UnknownStop(_))
            ));
        }
        let stats = router.stats().await;
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn invalidate_clears_entries() {
        let router = router();
        router.route(RouteRequest::new("A", "B", t(900))).await.unwrap();
        router.invalidate_cache();
        assert_eq!(router.stats().await.entries, 0);
    }
}
