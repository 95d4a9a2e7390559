//! Session records and referrer classification.

use serde::{Deserialize, Serialize};

/// How a visitor arrived at the tracked site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferrerType {
    Direct,
    Organic,
    Social,
    Referral,
    Email,
}

impl ReferrerType {
    /// Returns the string representation stored in the `sessions` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Organic => "organic",
            Self::Social => "social",
            Self::Referral => "referral",
            Self::Email => "email",
        }
    }

    /// Parse a stored or client-supplied value. Unknown values are
    /// treated as absent so a buggy snippet cannot poison the column.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "direct" => Some(Self::Direct),
            "organic" => Some(Self::Organic),
            "social" => Some(Self::Social),
            "referral" => Some(Self::Referral),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

/// Search engine hosts classified as organic traffic.
const SEARCH_HOSTS: &[&str] = &[
    "google.", "bing.", "duckduckgo.", "search.yahoo.", "baidu.", "yandex.", "ecosia.",
];

/// Social network hosts.
const SOCIAL_HOSTS: &[&str] = &[
    "facebook.", "instagram.", "twitter.", "x.com", "t.co", "linkedin.", "reddit.",
    "pinterest.", "youtube.", "tiktok.",
];

/// Webmail hosts.
const EMAIL_HOSTS: &[&str] = &["mail.google.", "outlook.", "mail.yahoo.", "mail.proton."];

/// Classify a referrer URL into a traffic bucket.
///
/// Missing referrer is direct traffic; a referrer whose host matches no
/// known bucket is a plain referral.
pub fn classify_referrer(referrer: Option<&str>) -> ReferrerType {
    let Some(raw) = referrer.map(str::trim).filter(|r| !r.is_empty()) else {
        return ReferrerType::Direct;
    };

    let host = url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

    let Some(host) = host else {
        return ReferrerType::Referral;
    };

    if EMAIL_HOSTS.iter().any(|p| host.contains(p)) {
        ReferrerType::Email
    } else if SEARCH_HOSTS.iter().any(|p| host.contains(p)) {
        ReferrerType::Organic
    } else if SOCIAL_HOSTS.iter().any(|p| host.contains(p)) {
        ReferrerType::Social
    } else {
        ReferrerType::Referral
    }
}

/// One visitor's browsing session on a tracked site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Public identifier of the tracked site (weak reference).
    pub site_id: String,
    /// Client-generated session identifier; unique across all sites.
    pub session_id: String,
    /// Client-generated visitor identifier, longer-lived than the session.
    pub visitor_id: String,
    /// Session start (Unix ms).
    pub started_at: i64,
    /// Last event seen in this session (Unix ms).
    pub last_activity: i64,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub country: Option<String>,
    pub referrer: Option<String>,
    pub referrer_type: ReferrerType,
    /// Pages viewed so far.
    pub page_count: i64,
    /// Seconds between start and last activity.
    pub duration: i64,
    /// True until a second page view arrives, then permanently false.
    pub is_bounce: bool,
}
