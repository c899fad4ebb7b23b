// Library exports for the ClickShield backend
// This file exposes modules and functions for library consumers and tests

pub mod app;
pub mod app_config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use models::{Confidence, ThreatMatch, ThreatType, Verdict};
pub use services::{UrlCheckService, VerdictCache};
pub use utils::{CheckError, ThreatLookup, ThreatLookupError};

// Re-export handler route builders
pub use handlers::check_routes;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

// Library initialization function for external consumers
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    use tracing::{info, warn};

    // Load environment
    dotenv::dotenv().ok();

    // Initialize config
    let config = app_config::config().clone();

    if !config.has_api_key() {
        warn!("GOOGLE_SAFE_BROWSING_API_KEY is not set; every check will fail with 500");
    }

    info!("Initializing verdict cache (ttl: {}s)...", config.cache.ttl_seconds);
    let cache = Arc::new(VerdictCache::new(config.cache.ttl()));
    let url_check = Arc::new(UrlCheckService::from_config(&config, cache));

    Ok(AppState::new(Arc::new(config), url_check))
}

/// Full application router: check routes at `/` and under the base path,
/// JSON 404 fallback, JSON 500 on handler panics, CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let base_path = state.config.server.base_path.clone();

    let mut router = Router::new().merge(check_routes());
    if !base_path.is_empty() {
        router = router.nest(&base_path, check_routes());
    }

    router
        .fallback(handlers::check_url::not_found)
        .layer(CatchPanicLayer::custom(handlers::check_url::internal_error))
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Health check handler
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let timestamp = chrono::Utc::now().to_rfc3339();
    let configured = state.url_check.threat_lookup_configured();

    // Missing key degrades the service but the process is alive, so still 200
    let response = serde_json::json!({
        "status": if configured { "healthy" } else { "degraded" },
        "service": "clickshield-backend",
        "timestamp": timestamp,
        "components": {
            "cache": {
                "entries": state.cache.len().await,
                "ttl_seconds": state.cache.ttl().as_secs()
            },
            "safe_browsing": {
                "configured": configured
            }
        }
    });

    (StatusCode::OK, Json(response))
}
