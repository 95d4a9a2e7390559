//! Rate limit policy configuration.
//!
//! The policy is an explicit immutable structure handed to whoever
//! enforces it, so tests can run with tight windows instead of patching
//! constants. Enforcement itself lives in the store crate (the counter
//! is an audit table, not in-process state).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known action names guarded by the limiter.
pub mod actions {
    pub const MESSAGE: &str = "message";
    pub const BLOG_POST: &str = "blog_post";
    pub const API_CALL: &str = "api_call";
    pub const VERIFICATION: &str = "verification";
}

/// Ceiling for one action: at most `requests` admitted per rolling
/// `window_ms` window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub requests: u32,
    pub window_ms: i64,
}

impl RateLimitRule {
    pub const fn new(requests: u32, window_ms: i64) -> Self {
        Self { requests, window_ms }
    }
}

/// Per-action rate limit ceilings with a fallback for unrecognized
/// action names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    rules: HashMap<String, RateLimitRule>,
    default_rule: RateLimitRule,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert(actions::MESSAGE.to_string(), RateLimitRule::new(10, 60_000));
        rules.insert(actions::BLOG_POST.to_string(), RateLimitRule::new(15, 3_600_000));
        rules.insert(actions::API_CALL.to_string(), RateLimitRule::new(200, 60_000));
        rules.insert(
            actions::VERIFICATION.to_string(),
            RateLimitRule::new(5, 86_400_000),
        );

        Self {
            rules,
            default_rule: RateLimitRule::new(60, 60_000),
        }
    }
}

impl RateLimitPolicy {
    /// Policy with only the fallback rule.
    pub fn new(default_rule: RateLimitRule) -> Self {
        Self {
            rules: HashMap::new(),
            default_rule,
        }
    }

    /// Add or replace a per-action rule.
    pub fn with_rule(mut self, action: impl Into<String>, rule: RateLimitRule) -> Self {
        self.rules.insert(action.into(), rule);
        self
    }

    /// Ceiling for an action; unrecognized names get the fallback.
    pub fn rule_for(&self, action: &str) -> RateLimitRule {
        self.rules.get(action).copied().unwrap_or(self.default_rule)
    }

    /// Longest configured window, used to bound audit-record retention.
    pub fn max_window_ms(&self) -> i64 {
        self.rules
            .values()
            .map(|r| r.window_ms)
            .chain(std::iter::once(self.default_rule.window_ms))
            .max()
            .unwrap_or(self.default_rule.window_ms)
    }
}
