//! Database connection settings.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
        }
    }
}
