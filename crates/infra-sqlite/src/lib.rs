// Antrean Infrastructure - SQLite Adapter
// Implements: DurableSlot with a polling change feed

mod connection;
mod migration;
mod slot;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use slot::{SqliteSlot, DEFAULT_POLL_INTERVAL};

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
