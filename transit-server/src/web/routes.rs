//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cache::CachedRouteError;
use crate::router::{RouteError, RouteRequest};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/route", get(route_query))
        .route("/api/stops", get(list_stops))
        .route("/api/stops/:id/edges", get(stop_edges))
        .route("/api/graph/edges", get(graph_edges))
        .route("/api/graph/stats", get(graph_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Earliest-arrival route between two stops.
async fn route_query(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteResponse>, AppError> {
    let request = RouteRequest::parse(
        &query.origin,
        &query.destination,
        &query.start_time,
        query.transfer_time,
    )?;

    let outcome = state.router.route(request.clone()).await?;
    info!(
        origin = %request.origin,
        destination = %request.destination,
        departure = %request.departure,
        found = outcome.is_found(),
        "Route query"
    );

    Ok(Json(RouteResponse::from_outcome(
        &state.graph,
        &request,
        &outcome,
    )))
}

/// All stops with names and coordinates.
async fn list_stops(State(state): State<AppState>) -> Json<StopsResponse> {
    let stops = state.graph.stops().iter().map(StopResult::from).collect();
    Json(StopsResponse { stops })
}

/// Outgoing edges of one stop.
async fn stop_edges(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EdgesResponse>, AppError> {
    let graph = &state.graph;
    let node = graph.node_index(&id).ok_or_else(|| AppError::NotFound {
        message: format!("unknown stop {id:?}"),
    })?;

    let edges = graph
        .outgoing_edges(node)
        .map(|e| EdgeResult::from_edge(graph, e))
        .collect();
    Ok(Json(EdgesResponse { edges }))
}

/// Every edge in the graph.
async fn graph_edges(State(state): State<AppState>) -> Json<EdgesResponse> {
    let graph = &state.graph;
    let edges = graph
        .edges()
        .map(|e| EdgeResult::from_edge(graph, e))
        .collect();
    Json(EdgesResponse { edges })
}

/// Graph size and cache counters.
async fn graph_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.router.stats().await;
    Json(StatsResponse::new(&state.graph, cache))
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::Time(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            RouteError::UnknownStop(_) => AppError::NotFound {
                message: e.to_string(),
            },
            RouteError::BudgetExhausted { .. } | RouteError::Itinerary(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<CachedRouteError> for AppError {
    fn from(e: CachedRouteError) -> Self {
        match e {
            CachedRouteError::Route(e) => e.into(),
            CachedRouteError::Task(e) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::domain::{Coord, Stop, StopId, StopTimeRecord, TripId};
    use crate::graph::{BuildConfig, GraphBuilder};
    use crate::router::RouterConfig;

    fn state() -> AppState {
        let sid = |s: &str| StopId::parse(s).unwrap();
        let trip = || TripId::parse("T1").unwrap();
        let mut b = GraphBuilder::new(BuildConfig::default()).unwrap();
        b.add_stops(vec![
            Stop::new(sid("A"), Some("Alpha".into()), Coord::new(55.6761, 12.5683)),
            Stop::new(sid("B"), Some("Beta".into()), Coord::new(55.6771, 12.5683)),
            Stop::new(sid("C"), None, Coord::new(55.7761, 12.5683)),
            Stop::unlocated(sid("U"), Some("Nowhere".into())),
        ]);
        b.add_stop_times(vec![
            StopTimeRecord::new(trip(), sid("B"), 1, "00:20:00", "00:20:00"),
            StopTimeRecord::new(trip(), sid("C"), 2, "00:30:00", "00:30:00"),
            StopTimeRecord::new(trip(), sid("U"), 3, "00:40:00", "00:40:00"),
        ]);
        let (graph, _) = b.build();
        AppState::new(graph, RouterConfig::default(), &CacheConfig::default())
    }

    fn query(origin: &str, destination: &str, start: &str) -> Query<RouteQuery> {
        Query(RouteQuery {
            origin: origin.into(),
            destination: destination.into(),
            start_time: start.into(),
            transfer_time: None,
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn route_found() {
        let Json(resp) = route_query(State(state()), query("A", "C", "00:15:00"))
            .await
            .unwrap();

        assert!(resp.found);
        assert_eq!(resp.arrival_time.as_deref(), Some("00:30:00"));
        let modes: Vec<&str> = resp.hops.iter().map(|h| h.mode).collect();
        assert_eq!(modes, vec!["start", "pedestrian", "transport"]);
        assert_eq!(resp.hops[0].stop_name, "Alpha");
        assert_eq!(resp.hops[2].trip_id.as_deref(), Some("T1"));
        assert_eq!(resp.hops[2].departure_time.as_deref(), Some("00:20:00"));
    }

    #[tokio::test]
    async fn route_not_found_is_not_an_error() {
        let Json(resp) = route_query(State(state()), query("C", "A", "00:00:00"))
            .await
            .unwrap();

        assert!(!resp.found);
        assert!(resp.arrival_time.is_none());
        assert!(resp.hops.is_empty());
    }

    #[tokio::test]
    async fn malformed_time_is_bad_request() {
        let err = route_query(State(state()), query("A", "C", "quarter past"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let err = route_query(State(state()), query("A", "ZZZ", "00:15:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lists_stops() {
        let Json(resp) = list_stops(State(state())).await;
        assert_eq!(resp.stops.len(), 4);
        assert_eq!(resp.stops[2].name, "C");
        assert_eq!(resp.stops[3].lat, None);
    }

    #[tokio::test]
    async fn edges_for_stop() {
        let Json(resp) = stop_edges(State(state()), Path("B".to_string()))
            .await
            .unwrap();

        let kinds: Vec<(&str, &str)> = resp.edges.iter().map(|e| (e.kind, e.color_hint)).collect();
        assert_eq!(kinds, vec![("transport", "blue"), ("pedestrian", "green")]);

        let transport = &resp.edges[0];
        let schedule = transport.schedule.as_ref().unwrap();
        assert_eq!(schedule[0].departure, "00:20:00");
        assert_eq!(schedule[0].trip_id, "T1");
        assert!(transport.weight_secs.is_none());

        let walk = &resp.edges[1];
        assert!(walk.schedule.is_none());
        assert!(walk.weight_secs.is_some());
        assert!(walk.distance_m.is_some());
    }

    #[tokio::test]
    async fn edges_for_unknown_stop() {
        let err = stop_edges(State(state()), Path("ZZZ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unlocated_endpoints_are_not_drawable() {
        let Json(resp) = graph_edges(State(state())).await;

        assert_eq!(resp.edges.len(), 4);
        let to_u = resp.edges.iter().find(|e| e.to == "U").unwrap();
        assert!(!to_u.drawable);
        assert!(resp.edges.iter().filter(|e| e.to != "U").all(|e| e.drawable));
    }

    #[tokio::test]
    async fn stats_count_graph_and_cache() {
        let state = state();
        route_query(State(state.clone()), query("A", "C", "00:15:00"))
            .await
            .unwrap();
        route_query(State(state.clone()), query("A", "C", "00:15:00"))
            .await
            .unwrap();

        let Json(stats) = graph_stats(State(state)).await;
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.edges, 4);
        assert_eq!(stats.transport_edges, 2);
        assert_eq!(stats.pedestrian_edges, 2);
        assert_eq!(stats.static_edges, 0);
        assert_eq!(stats.trips, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }
}
