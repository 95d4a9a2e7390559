//! Test fixtures and payload builders.

use serde_json::{json, Value};
use uuid::Uuid;

/// Generate a client-style session identifier.
pub fn session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a client-style visitor identifier.
pub fn visitor_id() -> String {
    Uuid::new_v4().to_string()
}

/// A session start envelope.
pub fn session_event(site_id: &str, session_id: &str) -> Value {
    json!({
        "type": "session",
        "data": {
            "siteId": site_id,
            "sessionId": session_id,
            "visitorId": visitor_id(),
            "device": "desktop",
            "browser": "Firefox",
            "os": "Linux"
        }
    })
}

/// A session start envelope with a referrer.
pub fn session_event_with_referrer(site_id: &str, session_id: &str, referrer: &str) -> Value {
    let mut event = session_event(site_id, session_id);
    event["data"]["referrer"] = json!(referrer);
    event
}

/// A page view envelope.
pub fn pageview_event(site_id: &str, session_id: &str, path: &str) -> Value {
    json!({
        "type": "pageview",
        "data": {
            "siteId": site_id,
            "sessionId": session_id,
            "path": path
        }
    })
}

/// A partial performance sample envelope (a subset of metrics is valid).
pub fn performance_event(site_id: &str, session_id: &str, path: &str) -> Value {
    json!({
        "type": "performance",
        "data": {
            "siteId": site_id,
            "sessionId": session_id,
            "path": path,
            "lcp": 1830.0,
            "cls": 0.02
        }
    })
}

/// A custom event envelope.
pub fn custom_event(site_id: &str, session_id: &str, name: &str) -> Value {
    json!({
        "type": "event",
        "data": {
            "siteId": site_id,
            "sessionId": session_id,
            "name": name,
            "properties": { "plan": "agency", "seats": 3 }
        }
    })
}

/// A session end envelope.
pub fn end_event(session_id: &str) -> Value {
    json!({
        "type": "end",
        "data": { "sessionId": session_id }
    })
}

/// Wrap envelopes into a batch body.
pub fn batch(events: Vec<Value>) -> Value {
    json!({ "events": events })
}

/// A well-formed site identifier that is registered nowhere.
pub fn unregistered_site_id() -> String {
    "cc_zzzz99999999".to_string()
}
