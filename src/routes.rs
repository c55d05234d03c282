//! Router assembly

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

/// Full application router: auth API, health check, and the portal's
/// static login page as the fallback.
pub fn router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes())
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/omada/username-login", post(handlers::omada_username_login))
        .route("/aruba/username-login", post(handlers::aruba_username_login))
}
