// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::publisher::Publisher;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) publisher: Publisher,
}

pub fn app(publisher: Publisher) -> Router {
    let state = AppState { publisher };
    Router::new()
        .route("/", get(ws::root)) // WS / (plain GET: banner)
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/statistics", get(http::statistics_handler)) // GET /api/statistics
        .route("/ws", get(ws::ws_statistics)) // WS /ws (alias of /)
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
