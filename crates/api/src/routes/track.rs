//! Tracking gateway handlers.
//!
//! Public, cross-origin, unauthenticated by design: the site identifier
//! inside each payload is the capability token. This is the outermost
//! boundary for tracking traffic — no exception escapes unhandled, every
//! code path returns JSON with an HTTP status.

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, info, warn};

use store::TrackWrite;
use tracking_core::{
    limits::{MAX_BATCH_EVENTS, MAX_BODY_BYTES},
    TrackingPayload,
};

use crate::response::{ApiError, BatchResponse, TrackOutcome};
use crate::state::AppState;

/// POST /track - single tracking event.
///
/// Body: `{ "type": "session" | "pageview" | "performance" | "event" | "end",
///          "data": { ... } }`.
/// The mutation's result is returned verbatim with HTTP 200, including
/// the soft invalid-site outcome.
pub async fn track_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TrackOutcome>, ApiError> {
    let start = Instant::now();

    metrics().events_received.inc();

    if body.len() > MAX_BODY_BYTES {
        return Err(ApiError::payload_too_large(format!(
            "Payload size {}KB exceeds {}KB limit",
            body.len() / 1024,
            MAX_BODY_BYTES / 1024
        )));
    }

    // A body that is not JSON at all means a broken client build, not a
    // recoverable input problem; treated like any other uncaught failure.
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        error!("Failed to parse tracking request body: {}", e);
        ApiError::internal()
    })?;

    let payload = TrackingPayload::parse(&value).map_err(|e| {
        metrics().events_rejected.inc();
        ApiError::from(e)
    })?;

    let kind = payload.kind();
    let outcome = dispatch(&state, payload).await.map_err(|e| {
        metrics().store_errors.inc();
        error!(event_type = kind, "Tracking write failed: {}", e);
        ApiError::internal()
    })?;

    metrics()
        .ingest_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    debug!(event_type = kind, success = outcome.success, "Processed tracking event");

    Ok(Json(outcome))
}

/// POST /track/batch - buffered events flushed by the snippet.
///
/// Body: `{ "events": [{type, data}, ...] }`. Events are processed
/// sequentially and failures are isolated per event — one bad event
/// never aborts the batch.
pub async fn batch_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BatchResponse>, ApiError> {
    let start = Instant::now();

    metrics().batches_received.inc();

    if body.len() > MAX_BODY_BYTES {
        return Err(ApiError::payload_too_large(format!(
            "Payload size {}KB exceeds {}KB limit",
            body.len() / 1024,
            MAX_BODY_BYTES / 1024
        )));
    }

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        error!("Failed to parse batch request body: {}", e);
        ApiError::internal()
    })?;

    let events = value
        .get("events")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::malformed_batch("Events must be an array"))?;

    if events.len() > MAX_BATCH_EVENTS {
        return Err(ApiError::payload_too_large(format!(
            "Batch has {} events, exceeds {} limit",
            events.len(),
            MAX_BATCH_EVENTS
        )));
    }

    metrics().events_received.inc_by(events.len() as u64);

    let mut results = Vec::with_capacity(events.len());
    let mut failed = 0usize;

    for event in events {
        let outcome = match TrackingPayload::parse(event) {
            Ok(payload) => match dispatch(&state, payload).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    metrics().store_errors.inc();
                    error!("Batch event write failed: {}", e);
                    TrackOutcome::failed("Internal server error")
                }
            },
            Err(e) => {
                metrics().events_rejected.inc();
                TrackOutcome::failed(e.message())
            }
        };

        if !outcome.success {
            failed += 1;
        }
        results.push(outcome);
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().ingest_latency_ms.observe(latency_ms);

    info!(
        events = results.len(),
        failed = failed,
        latency_ms = latency_ms,
        "Batch processed"
    );

    Ok(Json(BatchResponse {
        success: true,
        results,
    }))
}

/// Route a parsed payload to its mutation and record metrics.
async fn dispatch(state: &AppState, payload: TrackingPayload) -> tracking_core::Result<TrackOutcome> {
    let write = match &payload {
        TrackingPayload::Session(p) => store::tracking::record_session(&state.store, p).await?,
        TrackingPayload::Pageview(p) => store::tracking::record_pageview(&state.store, p).await?,
        TrackingPayload::Performance(p) => {
            store::tracking::record_performance(&state.store, p).await?
        }
        TrackingPayload::Event(p) => store::tracking::record_event(&state.store, p).await?,
        TrackingPayload::End(p) => {
            store::tracking::end_session(&state.store, p).await?;
            return Ok(TrackOutcome::ok());
        }
    };

    match write {
        TrackWrite::SessionStarted => metrics().sessions_started.inc(),
        TrackWrite::SessionResumed => metrics().sessions_resumed.inc(),
        TrackWrite::Recorded => match &payload {
            TrackingPayload::Pageview(_) => metrics().pageviews_recorded.inc(),
            TrackingPayload::Performance(_) => metrics().performance_samples_recorded.inc(),
            TrackingPayload::Event(_) => metrics().custom_events_recorded.inc(),
            _ => {}
        },
        TrackWrite::InvalidSite => {
            metrics().invalid_site_rejections.inc();
            warn!(event_type = payload.kind(), "Event for unknown or inactive site");
        }
    }

    Ok(TrackOutcome::from(write))
}
