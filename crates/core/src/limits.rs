//! Size and field limits for the tracking engine.
//!
//! Limits bound what untrusted snippets can push through the public
//! gateway. Field caps are duplicated in `#[validate]` attributes where
//! the derive macro requires literals; keep both in sync when modifying.

// === Batch Limits ===

/// Maximum batch payload size in bytes (1MB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Maximum events per batch request.
pub const MAX_BATCH_EVENTS: usize = 1000;

// === Custom Event Limits ===

/// Maximum custom properties JSON size in bytes (16KB).
///
/// Most real-world custom events are under 1KB.
pub const MAX_PROPERTIES_BYTES: usize = 16 * 1024;

/// Custom event name max length.
pub const MAX_EVENT_NAME_LEN: usize = 100;

// === String Field Limits (chars) ===

/// URL path max length.
pub const MAX_PATH_LEN: usize = 2000;

/// Referrer URL max length. Matches the HTTP Referer header limit.
pub const MAX_REFERRER_LEN: usize = 2048;

/// Session/visitor identifier max length (client-generated opaque strings).
pub const MAX_CLIENT_ID_LEN: usize = 128;

/// Device/browser/OS classification string max length.
pub const MAX_CLASSIFICATION_LEN: usize = 64;

/// Country value max length (ISO code or display name).
pub const MAX_COUNTRY_LEN: usize = 64;

/// UTM tag max length.
pub const MAX_UTM_LEN: usize = 255;

/// Site display name max length.
pub const MAX_SITE_NAME_LEN: usize = 200;

/// Domain max length (DNS limit).
pub const MAX_DOMAIN_LEN: usize = 253;

/// Opaque user identifier max length.
pub const MAX_USER_ID_LEN: usize = 128;

/// Rate-limited action name max length.
pub const MAX_ACTION_LEN: usize = 64;

// === Site Identifier Format ===

/// Public site identifier prefix.
pub const SITE_ID_PREFIX: &str = "cc_";

/// Random characters after the prefix.
pub const SITE_ID_RANDOM_LEN: usize = 12;

/// Alphabet for the random part of a site identifier.
pub const SITE_ID_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Full site identifier pattern.
pub const SITE_ID_PATTERN: &str = "^cc_[a-z0-9]{12}$";

// === Performance Metric Bounds (ms unless noted) ===

/// Load complete max (5 minutes).
pub const MAX_LOAD_TIME_MS: f64 = 300_000.0;

/// TTFB max (60 seconds).
pub const MAX_TTFB_MS: f64 = 60_000.0;

/// FCP max (60 seconds).
pub const MAX_FCP_MS: f64 = 60_000.0;

/// LCP max (60 seconds).
pub const MAX_LCP_MS: f64 = 60_000.0;

/// FID max (10 seconds).
pub const MAX_FID_MS: f64 = 10_000.0;

/// CLS max value (unitless; Google considers >0.25 poor, 10 is extreme).
pub const MAX_CLS: f64 = 10.0;
