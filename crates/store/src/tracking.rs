//! Per-event tracking mutations.
//!
//! Every site-scoped mutation resolves the site by its public identifier
//! first and requires it to be active. An unknown or paused site is a
//! normal outcome (`TrackWrite::InvalidSite`), not an error — a snippet
//! on a paused site must not see failures.

use chrono::Utc;
use sqlx::FromRow;
use tracing::debug;

use tracking_core::{
    classify_referrer, CustomEventPayload, EndPayload, PageviewPayload, PerformancePayload,
    ReferrerType, Result, SessionPayload, SessionRecord,
};

use crate::client::{db_err, Store};
use crate::sites;

/// Outcome of a tracking write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackWrite {
    /// A new session row was created.
    SessionStarted,
    /// The session already existed; activity/duration were patched.
    SessionResumed,
    /// An append-only row was recorded.
    Recorded,
    /// The target site is unknown or paused; nothing was written.
    InvalidSite,
}

/// Idempotent session create-or-update keyed on the client session id.
///
/// The insert is conditional on the unique `session_id` index, so two
/// concurrent "first events" of the same session converge to one row:
/// the losing racer falls through to the patch path.
pub async fn record_session(store: &Store, payload: &SessionPayload) -> Result<TrackWrite> {
    if sites::find_active(store, &payload.site_id).await?.is_none() {
        return Ok(TrackWrite::InvalidSite);
    }

    let now = Utc::now().timestamp_millis();
    let referrer_type = payload
        .referrer_type
        .as_deref()
        .and_then(ReferrerType::parse)
        .unwrap_or_else(|| classify_referrer(payload.referrer.as_deref()));

    let inserted = sqlx::query(
        "INSERT INTO sessions
             (site_id, session_id, visitor_id, started_at, last_activity,
              device, browser, os, country, referrer, referrer_type,
              page_count, duration, is_bounce)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, 0, 1)
         ON CONFLICT(session_id) DO NOTHING",
    )
    .bind(&payload.site_id)
    .bind(&payload.session_id)
    .bind(&payload.visitor_id)
    .bind(now)
    .bind(payload.device.as_deref().unwrap_or("unknown"))
    .bind(payload.browser.as_deref().unwrap_or("unknown"))
    .bind(payload.os.as_deref().unwrap_or("unknown"))
    .bind(&payload.country)
    .bind(&payload.referrer)
    .bind(referrer_type.as_str())
    .execute(store.pool())
    .await
    .map_err(db_err)?
    .rows_affected();

    if inserted == 1 {
        debug!(site_id = %payload.site_id, session_id = %payload.session_id, "Session started");
        Ok(TrackWrite::SessionStarted)
    } else {
        touch_session(store, &payload.session_id, now).await?;
        Ok(TrackWrite::SessionResumed)
    }
}

/// Append a page view, then patch its session: bump the page count,
/// clear the bounce flag, refresh activity. A page view for a session
/// the store has never seen is still kept — session records can arrive
/// out of order or not at all.
pub async fn record_pageview(store: &Store, payload: &PageviewPayload) -> Result<TrackWrite> {
    if sites::find_active(store, &payload.site_id).await?.is_none() {
        return Ok(TrackWrite::InvalidSite);
    }

    let now = Utc::now().timestamp_millis();

    sqlx::query(
        "INSERT INTO pageviews
             (site_id, session_id, path, referrer, utm_source, utm_medium, utm_campaign, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&payload.site_id)
    .bind(&payload.session_id)
    .bind(&payload.path)
    .bind(&payload.referrer)
    .bind(&payload.utm_source)
    .bind(&payload.utm_medium)
    .bind(&payload.utm_campaign)
    .bind(now)
    .execute(store.pool())
    .await
    .map_err(db_err)?;

    sqlx::query(
        "UPDATE sessions
         SET last_activity = ?2, page_count = page_count + 1, is_bounce = 0
         WHERE session_id = ?1",
    )
    .bind(&payload.session_id)
    .bind(now)
    .execute(store.pool())
    .await
    .map_err(db_err)?;

    Ok(TrackWrite::Recorded)
}

/// Append a page-load timing sample. Any subset of metrics is valid.
pub async fn record_performance(store: &Store, payload: &PerformancePayload) -> Result<TrackWrite> {
    if sites::find_active(store, &payload.site_id).await?.is_none() {
        return Ok(TrackWrite::InvalidSite);
    }

    let now = Utc::now().timestamp_millis();

    sqlx::query(
        "INSERT INTO performance_samples
             (site_id, session_id, path, timestamp, load_time, ttfb, fcp, lcp, fid, cls)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&payload.site_id)
    .bind(&payload.session_id)
    .bind(&payload.path)
    .bind(now)
    .bind(payload.load_time)
    .bind(payload.ttfb)
    .bind(payload.fcp)
    .bind(payload.lcp)
    .bind(payload.fid)
    .bind(payload.cls)
    .execute(store.pool())
    .await
    .map_err(db_err)?;

    Ok(TrackWrite::Recorded)
}

/// Append a custom named event with its property bag.
pub async fn record_event(store: &Store, payload: &CustomEventPayload) -> Result<TrackWrite> {
    if sites::find_active(store, &payload.site_id).await?.is_none() {
        return Ok(TrackWrite::InvalidSite);
    }

    let now = Utc::now().timestamp_millis();
    let properties = payload
        .properties
        .as_ref()
        .map(|p| serde_json::to_string(p).unwrap_or_else(|_| "{}".into()))
        .unwrap_or_else(|| "{}".into());

    sqlx::query(
        "INSERT INTO events (site_id, session_id, name, properties, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&payload.site_id)
    .bind(&payload.session_id)
    .bind(&payload.name)
    .bind(&properties)
    .bind(now)
    .execute(store.pool())
    .await
    .map_err(db_err)?;

    Ok(TrackWrite::Recorded)
}

/// Finalize a session's activity and duration. Session ids are globally
/// unique so there is no site check; an unknown session is a no-op.
pub async fn end_session(store: &Store, payload: &EndPayload) -> Result<()> {
    let now = Utc::now().timestamp_millis();
    touch_session(store, &payload.session_id, now).await
}

/// Patch `last_activity` and recompute `duration` in whole seconds.
async fn touch_session(store: &Store, session_id: &str, now: i64) -> Result<()> {
    sqlx::query(
        "UPDATE sessions
         SET last_activity = ?2, duration = (?2 - started_at) / 1000
         WHERE session_id = ?1",
    )
    .bind(session_id)
    .bind(now)
    .execute(store.pool())
    .await
    .map_err(db_err)?;

    Ok(())
}

#[derive(Debug, FromRow)]
struct SessionRow {
    site_id: String,
    session_id: String,
    visitor_id: String,
    started_at: i64,
    last_activity: i64,
    device: String,
    browser: String,
    os: String,
    country: Option<String>,
    referrer: Option<String>,
    referrer_type: String,
    page_count: i64,
    duration: i64,
    is_bounce: bool,
}

/// Fetch one session by its client identifier.
pub async fn get_session(store: &Store, session_id: &str) -> Result<Option<SessionRecord>> {
    let row: Option<SessionRow> = sqlx::query_as(
        "SELECT site_id, session_id, visitor_id, started_at, last_activity,
                device, browser, os, country, referrer, referrer_type,
                page_count, duration, is_bounce
         FROM sessions WHERE session_id = ?1",
    )
    .bind(session_id)
    .fetch_optional(store.pool())
    .await
    .map_err(db_err)?;

    Ok(row.map(|r| SessionRecord {
        site_id: r.site_id,
        session_id: r.session_id,
        visitor_id: r.visitor_id,
        started_at: r.started_at,
        last_activity: r.last_activity,
        device: r.device,
        browser: r.browser,
        os: r.os,
        country: r.country,
        referrer: r.referrer,
        referrer_type: ReferrerType::parse(&r.referrer_type).unwrap_or(ReferrerType::Direct),
        page_count: r.page_count,
        duration: r.duration,
        is_bounce: r.is_bounce,
    }))
}
