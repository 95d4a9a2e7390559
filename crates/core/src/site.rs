//! Site registration types and public site identifiers.
//!
//! The public site identifier doubles as an unauthenticated bearer
//! capability for the tracking gateway (tracked sites cannot run
//! authenticated requests), so it gets the same handling as an API key:
//! fixed prefix, random body, strict format validation.

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::{
    MAX_DOMAIN_LEN, SITE_ID_ALPHABET, SITE_ID_PATTERN, SITE_ID_PREFIX, SITE_ID_RANDOM_LEN,
};

/// Compiled site identifier regex (lazy initialization).
static SITE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SITE_ID_PATTERN).expect("invalid site id pattern"));

/// A registered external website allowed to send tracking data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Internal row id.
    #[serde(skip_serializing, default)]
    pub id: i64,
    /// Owning user (opaque identifier from the identity provider).
    pub owner_id: String,
    /// Display name.
    pub name: String,
    /// Normalized domain (scheme and trailing slashes stripped, lowercased).
    pub domain: String,
    /// Public site identifier; globally unique and immutable once created.
    pub public_id: String,
    /// Creation timestamp (Unix ms).
    pub created_at: i64,
    /// Whether the site accepts tracking events.
    pub is_active: bool,
}

/// Configuration for public site identifier generation.
///
/// Passed in explicitly so tests can override the alphabet or length
/// instead of patching a module constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteIdConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    #[serde(default = "default_random_len")]
    pub random_len: usize,
}

fn default_prefix() -> String {
    SITE_ID_PREFIX.to_string()
}

fn default_alphabet() -> String {
    SITE_ID_ALPHABET.to_string()
}

fn default_random_len() -> usize {
    SITE_ID_RANDOM_LEN
}

impl Default for SiteIdConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            alphabet: default_alphabet(),
            random_len: default_random_len(),
        }
    }
}

/// Generate a fresh public site identifier.
pub fn generate_site_id(config: &SiteIdConfig) -> String {
    let chars: Vec<char> = config.alphabet.chars().collect();
    let mut rng = rand::thread_rng();

    let mut id = String::with_capacity(config.prefix.len() + config.random_len);
    id.push_str(&config.prefix);
    for _ in 0..config.random_len {
        id.push(chars[rng.gen_range(0..chars.len())]);
    }
    id
}

/// Check whether a string is a well-formed public site identifier.
pub fn is_valid_site_id(id: &str) -> bool {
    SITE_ID_REGEX.is_match(id)
}

/// Normalize a user-supplied domain for storage and comparison.
///
/// Strips the scheme and any path/trailing slashes, lowercases the host.
/// `"HTTPS://Example.com/"`, `"example.com"` and `"http://example.com"`
/// all normalize to `"example.com"`.
pub fn normalize_domain(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_DOMAIN_LEN + 8 {
        return Err(Error::validation(
            ValidationErrorCode::MissingFields,
            "Invalid domain",
        ));
    }

    // Parse through the url crate when a scheme is present; otherwise add
    // one so the host parses the same way.
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let host = url::Url::parse(&candidate)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .ok_or_else(|| Error::validation(ValidationErrorCode::MissingFields, "Invalid domain"))?;

    let host = host.trim_end_matches('/').to_string();
    if host.is_empty() || host.len() > MAX_DOMAIN_LEN {
        return Err(Error::validation(
            ValidationErrorCode::MissingFields,
            "Invalid domain",
        ));
    }

    Ok(host)
}
