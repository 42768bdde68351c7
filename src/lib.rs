//! Inventory API: SKUs, stores, store assortments and daily sales ledgers over PostgreSQL.

pub mod auth;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use auth::{AuthProvider, SupabaseAuth, UnconfiguredAuth};
pub use config::AppConfig;
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, ensure_database_exists, seed_sample_data};
pub use routes::{api_routes, app, common_routes};
pub use service::Services;
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};
