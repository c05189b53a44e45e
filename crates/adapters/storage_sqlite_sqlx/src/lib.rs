//! # safelink-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the store ports defined in `safelink-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain aggregates and database rows
//! - Enforce optimistic concurrency through the `version` column
//!
//! ## Dependency rule
//! Depends on `safelink-app` (for port traits) and `safelink-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod columns;
mod emergency_store;
mod error;
mod pool;
mod user_store;

pub use emergency_store::SqliteEmergencyStore;
pub use error::StorageError;
pub use pool::{Config, Database};
pub use user_store::SqliteUserStore;
