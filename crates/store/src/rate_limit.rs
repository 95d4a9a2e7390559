//! Store-backed sliding-window rate limiter.
//!
//! Admission and audit-trail insert happen in one conditional INSERT, so
//! the count-then-insert sequence cannot interleave with a concurrent
//! caller: SQLite serializes the statement under its writer lock,
//! matching the serializable-mutation guarantee of the original store.

use chrono::Utc;
use tracing::debug;

use tracking_core::{Error, RateLimitErrorCode, RateLimitPolicy, Result};

use crate::client::{db_err, Store};

/// Admit or deny one attempt at `action` by `user_id`.
///
/// Admission inserts exactly one audit row; denial writes nothing and
/// returns a RATE_001 error carrying the seconds until the oldest
/// in-window attempt expires.
pub async fn require_rate_limit(
    store: &Store,
    user_id: &str,
    action: &str,
    policy: &RateLimitPolicy,
) -> Result<()> {
    let rule = policy.rule_for(action);
    let now = Utc::now().timestamp_millis();
    let window_start = now - rule.window_ms;

    let admitted = sqlx::query(
        "INSERT INTO rate_limits (user_id, action, timestamp)
         SELECT ?1, ?2, ?3
         WHERE (SELECT COUNT(*) FROM rate_limits
                WHERE user_id = ?1 AND action = ?2 AND timestamp > ?4) < ?5",
    )
    .bind(user_id)
    .bind(action)
    .bind(now)
    .bind(window_start)
    .bind(rule.requests as i64)
    .execute(store.pool())
    .await
    .map_err(db_err)?
    .rows_affected()
        == 1;

    if admitted {
        return Ok(());
    }

    let oldest: Option<i64> = sqlx::query_scalar(
        "SELECT MIN(timestamp) FROM rate_limits
         WHERE user_id = ?1 AND action = ?2 AND timestamp > ?3",
    )
    .bind(user_id)
    .bind(action)
    .bind(window_start)
    .fetch_one(store.pool())
    .await
    .map_err(db_err)?;

    let retry_after_ms = oldest
        .map(|t| t + rule.window_ms - now)
        .unwrap_or(rule.window_ms)
        .max(0);
    let retry_after_secs = ((retry_after_ms + 999) / 1000) as u64;

    debug!(
        user_id = %user_id,
        action = %action,
        retry_after_secs = retry_after_secs,
        "Rate limit denial"
    );

    Err(Error::rate_limit(
        RateLimitErrorCode::Exceeded,
        format!(
            "Too many requests, try again in {} seconds",
            retry_after_secs
        ),
        Some(retry_after_secs),
    ))
}

/// Delete audit rows too old to affect any configured window. Read-time
/// filtering stays the correctness mechanism; this is capacity hygiene.
pub async fn prune_expired(store: &Store, policy: &RateLimitPolicy) -> Result<u64> {
    let cutoff = Utc::now().timestamp_millis() - policy.max_window_ms();

    let deleted = sqlx::query("DELETE FROM rate_limits WHERE timestamp < ?1")
        .bind(cutoff)
        .execute(store.pool())
        .await
        .map_err(db_err)?
        .rows_affected();

    if deleted > 0 {
        debug!(deleted = deleted, "Pruned expired rate limit records");
    }
    Ok(deleted)
}

/// Count audit rows for one (user, action) pair. Used by tests and the
/// usage panel on the dashboard.
pub async fn attempt_count(store: &Store, user_id: &str, action: &str) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM rate_limits WHERE user_id = ?1 AND action = ?2")
        .bind(user_id)
        .bind(action)
        .fetch_one(store.pool())
        .await
        .map_err(db_err)
}
