//! Database module
//!
//! This module handles database connections, migrations, and the stores
//! the submission lifecycle reads and writes through.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

use sqlx::PgPool;

pub use connection::*;
pub use memory::MemoryStore;
pub use store::{ProblemStore, SubmissionStore, UserStore};

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
