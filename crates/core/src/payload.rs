//! Tracking payload parsing and dispatch.
//!
//! The gateway accepts `{ "type": ..., "data": ... }` envelopes from
//! embedded snippets. Parsing inspects the raw JSON value manually so the
//! error ladder stays exact: missing `type`/`data`/`data.siteId` is a
//! different rejection than an unknown `type` tag, and unknown tags are
//! never silently ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::MAX_PROPERTIES_BYTES;

/// Session start (or resume) payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub site_id: String,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 128))]
    pub visitor_id: String,
    /// Device classification ("desktop", "mobile", ...), client-supplied.
    #[validate(length(max = 64))]
    pub device: Option<String>,
    #[validate(length(max = 64))]
    pub browser: Option<String>,
    #[validate(length(max = 64))]
    pub os: Option<String>,
    #[validate(length(max = 64))]
    pub country: Option<String>,
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    /// Optional client-side classification; recomputed server-side when absent.
    pub referrer_type: Option<String>,
}

/// Page view payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageviewPayload {
    pub site_id: String,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub path: String,
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    #[validate(length(max = 255))]
    pub utm_source: Option<String>,
    #[validate(length(max = 255))]
    pub utm_medium: Option<String>,
    #[validate(length(max = 255))]
    pub utm_campaign: Option<String>,
}

/// Page-load timing payload. Every metric is independently optional; a
/// partial sample is valid.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePayload {
    pub site_id: String,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub path: String,
    /// Load complete (ms)
    #[validate(range(min = 0.0, max = 300000.0))]
    pub load_time: Option<f64>,
    /// Time to First Byte (ms)
    #[validate(range(min = 0.0, max = 60000.0))]
    pub ttfb: Option<f64>,
    /// First Contentful Paint (ms)
    #[validate(range(min = 0.0, max = 60000.0))]
    pub fcp: Option<f64>,
    /// Largest Contentful Paint (ms)
    #[validate(range(min = 0.0, max = 60000.0))]
    pub lcp: Option<f64>,
    /// First Input Delay (ms)
    #[validate(range(min = 0.0, max = 10000.0))]
    pub fid: Option<f64>,
    /// Cumulative Layout Shift
    #[validate(range(min = 0.0, max = 10.0))]
    pub cls: Option<f64>,
}

/// Validates custom properties JSON size.
fn validate_properties_size(props: &Value) -> std::result::Result<(), ValidationError> {
    if props.is_null() {
        return Ok(());
    }

    let size = serde_json::to_vec(props).map(|v| v.len()).unwrap_or(0);

    if size > MAX_PROPERTIES_BYTES {
        let mut err = ValidationError::new("properties_too_large");
        err.message = Some(
            format!(
                "properties {}KB exceeds {}KB limit",
                size / 1024,
                MAX_PROPERTIES_BYTES / 1024
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Custom named event payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomEventPayload {
    pub site_id: String,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Arbitrary property bag (max 16KB).
    #[validate(custom(function = "validate_properties_size"))]
    pub properties: Option<Value>,
}

/// Session end payload. Only needs the session identifier; session ids
/// are globally unique so no site validation happens on this path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndPayload {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
}

/// A parsed tracking event, dispatched by its `type` tag.
#[derive(Debug, Clone)]
pub enum TrackingPayload {
    Session(SessionPayload),
    Pageview(PageviewPayload),
    Performance(PerformancePayload),
    Event(CustomEventPayload),
    End(EndPayload),
}

impl TrackingPayload {
    /// Returns the event type as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Pageview(_) => "pageview",
            Self::Performance(_) => "performance",
            Self::Event(_) => "event",
            Self::End(_) => "end",
        }
    }

    /// Parse a `{ type, data }` envelope.
    ///
    /// Rejections, in order:
    /// - missing/non-string `type`, missing/non-object `data` → VALID_001
    /// - unknown `type` tag → VALID_002
    /// - missing `data.siteId` (all types except `end`) or missing
    ///   `data.sessionId` → VALID_001
    /// - anything else malformed in `data` → VALID_001 with detail
    pub fn parse(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(Error::missing_fields)?;

        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(Error::missing_fields)?;

        let data = obj
            .get("data")
            .filter(|d| d.is_object())
            .ok_or_else(Error::missing_fields)?;

        if !matches!(ty, "session" | "pageview" | "performance" | "event" | "end") {
            return Err(Error::unknown_type());
        }

        if ty != "end" && !has_nonempty_str(data, "siteId") {
            return Err(Error::missing_fields());
        }
        if !has_nonempty_str(data, "sessionId") {
            return Err(Error::missing_fields());
        }

        let payload = match ty {
            "session" => Self::Session(decode(ty, data)?),
            "pageview" => Self::Pageview(decode(ty, data)?),
            "performance" => Self::Performance(decode(ty, data)?),
            "event" => Self::Event(decode(ty, data)?),
            "end" => Self::End(decode(ty, data)?),
            _ => unreachable!("tag checked above"),
        };

        payload.validate_fields()?;
        Ok(payload)
    }

    /// Run validator-derived field checks for the active variant.
    fn validate_fields(&self) -> Result<()> {
        let result = match self {
            Self::Session(p) => p.validate(),
            Self::Pageview(p) => p.validate(),
            Self::Performance(p) => p.validate(),
            Self::Event(p) => p.validate(),
            Self::End(p) => p.validate(),
        };

        result.map_err(|e| {
            Error::validation(
                ValidationErrorCode::MissingFields,
                format!("Invalid {} payload: {}", self.kind(), e),
            )
        })
    }
}

fn has_nonempty_str(data: &Value, key: &str) -> bool {
    data.get(key)
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, data: &Value) -> Result<T> {
    serde_json::from_value(data.clone()).map_err(|e| {
        Error::validation(
            ValidationErrorCode::MissingFields,
            format!("Invalid {} payload: {}", kind, e),
        )
    })
}
