//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.client_origin.as_deref());

    Router::new()
        .route("/", get(banner_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS from a comma-separated origin list, permissive when unset
fn cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let Some(origins) = client_origin else {
        return CorsLayer::permissive();
    };

    let allowed_origins: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn banner_handler() -> &'static str {
    "Tank arena server is running. Connect over WebSocket at /ws."
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    active_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.active_rooms(),
        active_players: state.rooms.total_players(),
    })
}
