//! Dashboard read queries.
//!
//! Plain aggregates over the tracking tables, always scoped to one site
//! and a [from, to] window in Unix milliseconds. Ownership checks happen
//! at the API layer.

use serde::Serialize;

use tracking_core::Result;

use crate::client::{db_err, Store};

/// Traffic summary for one site.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub pageviews: i64,
    pub visitors: i64,
    pub sessions: i64,
    /// Percentage of sessions that never saw a second page view.
    pub bounce_rate: f64,
    pub avg_duration_seconds: f64,
}

/// One row of the top-pages table.
#[derive(Debug, Clone, Serialize)]
pub struct PathCount {
    pub path: String,
    pub views: i64,
}

/// One row of a grouped breakdown (devices, referrer types).
#[derive(Debug, Clone, Serialize)]
pub struct BucketCount {
    pub value: String,
    pub count: i64,
}

/// Aggregate traffic numbers for a site within a window.
pub async fn site_summary(store: &Store, site_id: &str, from: i64, to: i64) -> Result<SiteSummary> {
    let pageviews: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pageviews WHERE site_id = ?1 AND timestamp BETWEEN ?2 AND ?3",
    )
    .bind(site_id)
    .bind(from)
    .bind(to)
    .fetch_one(store.pool())
    .await
    .map_err(db_err)?;

    let (sessions, visitors, bounce_rate, avg_duration_seconds): (i64, i64, f64, f64) =
        sqlx::query_as(
            "SELECT COUNT(*),
                    COUNT(DISTINCT visitor_id),
                    COALESCE(AVG(is_bounce) * 100.0, 0.0),
                    COALESCE(AVG(duration), 0.0)
             FROM sessions
             WHERE site_id = ?1 AND started_at BETWEEN ?2 AND ?3",
        )
        .bind(site_id)
        .bind(from)
        .bind(to)
        .fetch_one(store.pool())
        .await
        .map_err(db_err)?;

    Ok(SiteSummary {
        pageviews,
        visitors,
        sessions,
        bounce_rate,
        avg_duration_seconds,
    })
}

/// Most-viewed paths for a site within a window.
pub async fn top_pages(
    store: &Store,
    site_id: &str,
    from: i64,
    to: i64,
    limit: i64,
) -> Result<Vec<PathCount>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT path, COUNT(*) AS views
         FROM pageviews
         WHERE site_id = ?1 AND timestamp BETWEEN ?2 AND ?3
         GROUP BY path
         ORDER BY views DESC, path ASC
         LIMIT ?4",
    )
    .bind(site_id)
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(store.pool())
    .await
    .map_err(db_err)?;

    Ok(rows
        .into_iter()
        .map(|(path, views)| PathCount { path, views })
        .collect())
}

/// Sessions grouped by device classification.
pub async fn device_breakdown(
    store: &Store,
    site_id: &str,
    from: i64,
    to: i64,
) -> Result<Vec<BucketCount>> {
    grouped_sessions(store, site_id, from, to, "device").await
}

/// Sessions grouped by referrer type.
pub async fn referrer_breakdown(
    store: &Store,
    site_id: &str,
    from: i64,
    to: i64,
) -> Result<Vec<BucketCount>> {
    grouped_sessions(store, site_id, from, to, "referrer_type").await
}

async fn grouped_sessions(
    store: &Store,
    site_id: &str,
    from: i64,
    to: i64,
    column: &str,
) -> Result<Vec<BucketCount>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
        "SELECT {column}, COUNT(*) AS count
         FROM sessions
         WHERE site_id = ?1 AND started_at BETWEEN ?2 AND ?3
         GROUP BY {column}
         ORDER BY count DESC, {column} ASC"
    ))
    .bind(site_id)
    .bind(from)
    .bind(to)
    .fetch_all(store.pool())
    .await
    .map_err(db_err)?;

    Ok(rows
        .into_iter()
        .map(|(value, count)| BucketCount { value, count })
        .collect())
}

/// Row counts used by tests and the site detail panel.
pub async fn pageview_count(store: &Store, site_id: &str) -> Result<i64> {
    table_count(store, "pageviews", site_id).await
}

pub async fn event_count(store: &Store, site_id: &str) -> Result<i64> {
    table_count(store, "events", site_id).await
}

pub async fn performance_sample_count(store: &Store, site_id: &str) -> Result<i64> {
    table_count(store, "performance_samples", site_id).await
}

pub async fn session_count(store: &Store, site_id: &str) -> Result<i64> {
    table_count(store, "sessions", site_id).await
}

async fn table_count(store: &Store, table: &str, site_id: &str) -> Result<i64> {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE site_id = ?1"))
        .bind(site_id)
        .fetch_one(store.pool())
        .await
        .map_err(db_err)
}
