//! SQLite persistence layer for the tracking engine.

pub mod client;
pub mod config;
pub mod rate_limit;
pub mod schema;
pub mod sites;
pub mod stats;
pub mod tracking;

pub use client::Store;
pub use config::StoreConfig;
pub use schema::init_schema;
pub use tracking::TrackWrite;
