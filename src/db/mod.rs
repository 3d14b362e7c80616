//! PostgreSQL access for the `jobs` table.
//!
//! [`filter_sql`] turns a [`crate::specs::filter::FilterExpr`] into a bound
//! `WHERE` clause; [`queries`] runs it.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// The reaper runs one pass at a time, each a single statement.
const MAX_CONNECTIONS: u32 = 2;

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
}

/// Connect the pool the reaper and job queries share.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url).await
}

/// Create or upgrade the `jobs` table and its indexes.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

pub mod filter_sql;
pub mod queries;
