//! API routes.

pub mod health;
pub mod sites;
pub mod track;

use std::time::Duration;

use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Preflight responses are cacheable for a day.
const CORS_MAX_AGE: Duration = Duration::from_secs(86400);

/// Creates the API router.
///
/// The tracking gateway is wildcard-origin on purpose: tracked sites are
/// third-party origins and the gateway authenticates by site identifier,
/// not by origin. The dashboard surface carries the same wildcard with
/// the headers its fetches need; origin policy for it lives with the
/// identity provider in front of this service.
pub fn router(state: AppState) -> Router {
    let tracking_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE);

    let dashboard_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE);

    let tracking = Router::new()
        .route("/track", post(track::track_handler))
        .route("/track/batch", post(track::batch_handler))
        .layer(tracking_cors);

    let dashboard = Router::new()
        .route(
            "/api/sites",
            post(sites::create_site_handler).get(sites::list_sites_handler),
        )
        .route(
            "/api/sites/:site_id",
            get(sites::get_site_handler)
                .patch(sites::update_site_handler)
                .delete(sites::delete_site_handler),
        )
        .route("/api/sites/:site_id/stats", get(sites::site_stats_handler))
        .route("/api/validate/:site_id", get(sites::validate_site_handler))
        .layer(dashboard_cors);

    Router::new()
        .merge(tracking)
        .merge(dashboard)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(preflight_no_content))
        .with_state(state)
}

/// CorsLayer answers preflights itself with 200 and an empty body; the
/// wire contract for this service is 204 No Content.
async fn preflight_no_content(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
