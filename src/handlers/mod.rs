// HTTP handlers for the ClickShield backend

pub mod check_url;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};

// URL check routes, mounted at the root and again under the API base path
pub fn check_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/check-url",
            post(check_url::check_url).fallback(check_url::method_not_allowed),
        )
        .route("/health", get(crate::health_check))
}
