//! Database Layer
//!
//! `PostgreSQL` pool construction, migrations and the partial-update helper.

mod patch;

#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub use patch::{Patch, EMPTY_PATCH};

/// Log a failed query with context, then map it through
/// [`ApiError::database`](crate::error::ApiError::database).
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e: sqlx::Error| {
            tracing::error!(query = $query, $($field)*, error = %e, "Database query failed");
            $crate::error::ApiError::database($query)(e)
        }
    };
}

pub(crate) use db_error;

/// Create `PostgreSQL` connection pool with health configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = pool_options().connect(database_url).await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Create a pool that connects on first use.
///
/// Lets the router be built and exercised in tests that never reach the
/// database.
pub fn create_lazy_pool(database_url: &str) -> Result<PgPool> {
    Ok(pool_options()
        .min_connections(0)
        .connect_lazy(database_url)?)
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        // Keep minimum connections warm to prevent cold-start latency
        .min_connections(2)
        .max_connections(20)
        // Prevent hanging requests on pool exhaustion
        .acquire_timeout(Duration::from_secs(5))
        // Clean up idle connections to prevent stale connection issues
        .idle_timeout(Duration::from_secs(600))
        // Validate connections before use to catch stale/broken connections
        .test_before_acquire(true)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
