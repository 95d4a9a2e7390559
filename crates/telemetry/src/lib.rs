//! Internal telemetry for the tracking engine: metrics, health, tracing.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::{health, HealthRegistry, HealthStatus};
pub use metrics::{metrics, Metrics, MetricsSnapshot};
pub use tracing_setup::{init_tracing, init_tracing_from_env, TracingConfig};
