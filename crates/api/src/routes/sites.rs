//! Site management and dashboard endpoints.
//!
//! Everything here except `/api/validate/:site_id` requires an
//! authenticated user; ownership checks treat "missing" and "not yours"
//! identically so site identifiers cannot be probed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use telemetry::metrics;
use tracing::info;

use store::{
    sites::SiteValidation,
    stats::{BucketCount, PathCount, SiteSummary},
};
use tracking_core::{rate_limit::actions, Error, Site};

use crate::extractors::UserContext;
use crate::response::ApiError;
use crate::state::AppState;

/// Default stats window when the query gives no bounds (30 days).
const DEFAULT_STATS_WINDOW_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Rows in the top-pages table.
const TOP_PAGES_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatsResponse {
    pub summary: SiteSummary,
    pub top_pages: Vec<PathCount>,
    pub devices: Vec<BucketCount>,
    pub referrers: Vec<BucketCount>,
}

/// POST /api/sites - register a new site.
pub async fn create_site_handler(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<Site>), ApiError> {
    require_api_call(&state, &user).await?;

    let site = store::sites::create_site(&state.store, &user.user_id, &req.name, &req.domain)
        .await
        .map_err(ApiError::from)?;

    info!(site_id = %site.public_id, owner = %user.user_id, "Site created");

    Ok((StatusCode::CREATED, Json(site)))
}

/// GET /api/sites - the caller's sites, newest first.
pub async fn list_sites_handler(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<Vec<Site>>, ApiError> {
    let sites = store::sites::list_sites(&state.store, &user.user_id).await?;
    Ok(Json(sites))
}

/// GET /api/sites/:site_id - one owned site.
pub async fn get_site_handler(
    State(state): State<AppState>,
    user: UserContext,
    Path(site_id): Path<String>,
) -> Result<Json<Site>, ApiError> {
    let site = store::sites::get_owned_site(&state.store, &user.user_id, &site_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Site not found"))?;
    Ok(Json(site))
}

/// PATCH /api/sites/:site_id - pause or resume tracking.
pub async fn update_site_handler(
    State(state): State<AppState>,
    user: UserContext,
    Path(site_id): Path<String>,
    Json(req): Json<UpdateSiteRequest>,
) -> Result<Json<Site>, ApiError> {
    require_api_call(&state, &user).await?;

    let changed =
        store::sites::set_site_active(&state.store, &user.user_id, &site_id, req.is_active).await?;
    if !changed {
        return Err(ApiError::not_found("Site not found"));
    }

    let site = store::sites::get_owned_site(&state.store, &user.user_id, &site_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Site not found"))?;

    info!(site_id = %site.public_id, is_active = site.is_active, "Site updated");

    Ok(Json(site))
}

/// DELETE /api/sites/:site_id - delete the site and all tracking data.
pub async fn delete_site_handler(
    State(state): State<AppState>,
    user: UserContext,
    Path(site_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_api_call(&state, &user).await?;

    let deleted = store::sites::delete_site(&state.store, &user.user_id, &site_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Site not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sites/:site_id/stats - traffic summary and breakdowns.
pub async fn site_stats_handler(
    State(state): State<AppState>,
    user: UserContext,
    Path(site_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<SiteStatsResponse>, ApiError> {
    let site = store::sites::get_owned_site(&state.store, &user.user_id, &site_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Site not found"))?;

    let to = query.to.unwrap_or_else(|| Utc::now().timestamp_millis());
    let from = query.from.unwrap_or(to - DEFAULT_STATS_WINDOW_MS);

    let summary = store::stats::site_summary(&state.store, &site.public_id, from, to).await?;
    let top_pages =
        store::stats::top_pages(&state.store, &site.public_id, from, to, TOP_PAGES_LIMIT).await?;
    let devices = store::stats::device_breakdown(&state.store, &site.public_id, from, to).await?;
    let referrers =
        store::stats::referrer_breakdown(&state.store, &site.public_id, from, to).await?;

    Ok(Json(SiteStatsResponse {
        summary,
        top_pages,
        devices,
        referrers,
    }))
}

/// GET /api/validate/:site_id - public site-registry lookup used by the
/// snippet installer to confirm a pasted identifier.
pub async fn validate_site_handler(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<SiteValidation>, ApiError> {
    let validation = store::sites::validate_site_id(&state.store, &site_id).await?;
    Ok(Json(validation))
}

/// Gate a dashboard mutation on the caller's api_call budget.
async fn require_api_call(state: &AppState, user: &UserContext) -> Result<(), ApiError> {
    store::rate_limit::require_rate_limit(
        &state.store,
        &user.user_id,
        actions::API_CALL,
        &state.policy,
    )
    .await
    .map_err(|e| {
        if matches!(e, Error::RateLimit { .. }) {
            metrics().rate_limit_denials.inc();
        }
        ApiError::from(e)
    })
}
