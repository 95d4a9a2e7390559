//! Common test setup functions.

use std::sync::Arc;

use api::{router, AppState};
use axum::Router;
use store::{init_schema, Store, StoreConfig};
use tracking_core::{RateLimitPolicy, Site};

/// Test context running the real router over a fresh in-memory store.
///
/// Every context gets its own database, so tests are fully isolated and
/// exercise the exact production code paths (router, middleware, store).
pub struct TestContext {
    pub store: Arc<Store>,
    pub router: Router,
}

impl TestContext {
    /// Create a new test context with default rate limit ceilings.
    pub async fn new() -> Self {
        Self::with_policy(RateLimitPolicy::default()).await
    }

    /// Create a test context with custom rate limit ceilings.
    pub async fn with_policy(policy: RateLimitPolicy) -> Self {
        let store = Arc::new(
            Store::connect(&StoreConfig::in_memory())
                .await
                .expect("Failed to open in-memory store"),
        );

        init_schema(&store).await.expect("Failed to initialize schema");

        let state = AppState::with_policy(store.clone(), policy);
        let router = router(state);

        Self { store, router }
    }

    /// Register a site directly through the store layer.
    pub async fn create_site(&self, owner: &str, name: &str, domain: &str) -> Site {
        store::sites::create_site(&self.store, owner, name, domain)
            .await
            .expect("Failed to create site")
    }

    /// Register a site and immediately pause it.
    pub async fn create_inactive_site(&self, owner: &str) -> Site {
        let site = self.create_site(owner, "Paused Site", "paused.example.com").await;
        store::sites::set_site_active(&self.store, owner, &site.public_id, false)
            .await
            .expect("Failed to deactivate site");

        store::sites::get_site(&self.store, &site.public_id)
            .await
            .expect("Failed to reload site")
            .expect("Site vanished after deactivation")
    }
}
