//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use store::Store;
use tracking_core::RateLimitPolicy;

/// How often expired rate-limit audit rows are pruned.
const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Document store
    pub store: Arc<Store>,
    /// Rate limit ceilings for dashboard mutations
    pub policy: Arc<RateLimitPolicy>,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            policy: Arc::new(RateLimitPolicy::default()),
        }
    }

    /// Create with custom rate limit ceilings.
    pub fn with_policy(store: Arc<Store>, policy: RateLimitPolicy) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
        }
    }

    /// Start the background task that prunes expired rate-limit records.
    /// Returns a handle that can be used to cancel the task.
    pub fn start_rate_limit_pruner(&self) -> tokio::task::JoinHandle<()> {
        let store = self.store.clone();
        let policy = self.policy.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = store::rate_limit::prune_expired(&store, &policy).await {
                    warn!("Rate limit pruning failed: {}", e);
                }
            }
        })
    }
}
