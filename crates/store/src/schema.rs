//! Table and index definitions.
//!
//! Timestamps are Unix milliseconds (INTEGER). Tracking tables reference
//! sites by public identifier — a weak reference by design, matching the
//! capability-token model of the gateway. The unique index on
//! `sessions.session_id` is load-bearing: it closes the concurrent
//! create-or-update race on first session events.

use crate::client::{db_err, Store};
use tracking_core::Result;

/// SQL for creating the sites table.
pub const CREATE_SITES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    domain TEXT NOT NULL,
    public_id TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
)
"#;

pub const CREATE_SITES_OWNER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sites_owner ON sites (owner_id)
"#;

/// SQL for creating the sessions table.
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id TEXT NOT NULL,
    session_id TEXT NOT NULL UNIQUE,
    visitor_id TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    last_activity INTEGER NOT NULL,
    device TEXT NOT NULL,
    browser TEXT NOT NULL,
    os TEXT NOT NULL,
    country TEXT,
    referrer TEXT,
    referrer_type TEXT NOT NULL DEFAULT 'direct',
    page_count INTEGER NOT NULL DEFAULT 1,
    duration INTEGER NOT NULL DEFAULT 0,
    is_bounce INTEGER NOT NULL DEFAULT 1
)
"#;

pub const CREATE_SESSIONS_SITE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sessions_site ON sessions (site_id, started_at)
"#;

/// SQL for creating the pageviews table (append-only).
pub const CREATE_PAGEVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pageviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id TEXT NOT NULL,
    session_id TEXT NOT NULL,
    path TEXT NOT NULL,
    referrer TEXT,
    utm_source TEXT,
    utm_medium TEXT,
    utm_campaign TEXT,
    timestamp INTEGER NOT NULL
)
"#;

pub const CREATE_PAGEVIEWS_SITE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_pageviews_site ON pageviews (site_id, timestamp)
"#;

pub const CREATE_PAGEVIEWS_SESSION_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_pageviews_session ON pageviews (session_id)
"#;

/// SQL for creating the performance samples table.
pub const CREATE_PERFORMANCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS performance_samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id TEXT NOT NULL,
    session_id TEXT NOT NULL,
    path TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    load_time REAL,
    ttfb REAL,
    fcp REAL,
    lcp REAL,
    fid REAL,
    cls REAL
)
"#;

pub const CREATE_PERFORMANCE_SITE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_performance_site ON performance_samples (site_id, timestamp)
"#;

/// SQL for creating the custom events table.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id TEXT NOT NULL,
    session_id TEXT NOT NULL,
    name TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}',
    timestamp INTEGER NOT NULL
)
"#;

pub const CREATE_EVENTS_SITE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_events_site ON events (site_id, timestamp)
"#;

/// SQL for creating the rate limit audit table. One row per admitted
/// attempt; denials write nothing.
pub const CREATE_RATE_LIMITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS rate_limits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    action TEXT NOT NULL,
    timestamp INTEGER NOT NULL
)
"#;

pub const CREATE_RATE_LIMITS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_rate_limits_key ON rate_limits (user_id, action, timestamp)
"#;

/// All schema statements, in creation order.
pub fn all_statements() -> Vec<&'static str> {
    vec![
        CREATE_SITES_TABLE,
        CREATE_SITES_OWNER_INDEX,
        CREATE_SESSIONS_TABLE,
        CREATE_SESSIONS_SITE_INDEX,
        CREATE_PAGEVIEWS_TABLE,
        CREATE_PAGEVIEWS_SITE_INDEX,
        CREATE_PAGEVIEWS_SESSION_INDEX,
        CREATE_PERFORMANCE_TABLE,
        CREATE_PERFORMANCE_SITE_INDEX,
        CREATE_EVENTS_TABLE,
        CREATE_EVENTS_SITE_INDEX,
        CREATE_RATE_LIMITS_TABLE,
        CREATE_RATE_LIMITS_INDEX,
    ]
}

/// Initialize the schema. Safe to run on every startup.
pub async fn init_schema(store: &Store) -> Result<()> {
    for sql in all_statements() {
        sqlx::query(sql).execute(store.pool()).await.map_err(db_err)?;
    }
    Ok(())
}
