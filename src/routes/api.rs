use crate::{
    handlers::{diagnostics, health_check, root_greeting},
    websocket::handler::websocket_handler,
    AppState,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/diagnostics", get(diagnostics))
}

/// Full router: greeting at the root, the socket at /ws, JSON endpoints under /api.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = app_state.cors.layer();

    Router::new()
        .route("/", get(root_greeting))
        .route("/ws", get(websocket_handler))
        .nest("/api", create_api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
