//! # Homeroom DB
//!
//! Database pool and schema migrations for the Homeroom API.
//!
//! # Example
//!
//! ```ignore
//! use homeroom_config::DatabaseConfig;
//! use homeroom_db::{init_db_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = init_db_pool(&DatabaseConfig::from_env()).await;
//!     run_migrations(&pool).await.expect("migrations failed");
//! }
//! ```

use homeroom_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Initializes a PostgreSQL connection pool.
///
/// The returned pool is cheaply cloneable and should be passed to the
/// application state for use in request handlers.
///
/// # Panics
///
/// Panics if the connection to the database fails.
pub async fn init_db_pool(config: &DatabaseConfig) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .expect("Failed to connect to database");

    info!(max_connections = config.max_connections, "Database pool initialized");
    pool
}

/// Applies the embedded migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;
