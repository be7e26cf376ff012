//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::MatchSummary;
use crate::util::time::uptime;
use crate::ws::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.client_origin))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/matches", get(matches_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; otherwise a comma-separated list
fn allowed_origins(client_origin: &str) -> AllowOrigin {
    if client_origin.trim() == "*" {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    AllowOrigin::list(origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_matches: usize,
    waiting_players: usize,
    connected_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime().as_secs(),
        active_matches: state.coordinator.active_matches(),
        waiting_players: state.coordinator.queue_size(),
        connected_players: state.coordinator.connected_players(),
    })
}

// ============================================================================
// Match listing
// ============================================================================

#[derive(Serialize)]
struct MatchesResponse {
    matches: Vec<MatchSummary>,
}

async fn matches_handler(State(state): State<AppState>) -> Json<MatchesResponse> {
    Json(MatchesResponse {
        matches: state.coordinator.match_summaries(),
    })
}
