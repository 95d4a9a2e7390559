//! Core types, payload parsing, and validation for the CherryCap tracking engine.

pub mod error;
pub mod limits;
pub mod payload;
pub mod rate_limit;
pub mod session;
pub mod site;

pub use error::{
    AuthErrorCode, DbErrorCode, Error, RateLimitErrorCode, Result, ValidationErrorCode,
};
pub use payload::*;
pub use rate_limit::{RateLimitPolicy, RateLimitRule};
pub use session::{classify_referrer, ReferrerType, SessionRecord};
pub use site::{generate_site_id, is_valid_site_id, normalize_domain, Site, SiteIdConfig};
