//! # Homeroom Config
//!
//! Configuration types for the Homeroom API, loaded from environment variables:
//!
//! - [`attendance`]: Attendance policy caps (external-leave quotas)
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: Database connection settings
//! - [`server`]: HTTP and metrics listener addresses
//!
//! # Example
//!
//! ```ignore
//! use homeroom_config::{AttendancePolicyConfig, CorsConfig, DatabaseConfig, ServerConfig};
//!
//! let policy = AttendancePolicyConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let database_config = DatabaseConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod attendance;
pub mod cors;
pub mod database;
pub mod server;

// Re-export commonly used types at crate root
pub use attendance::AttendancePolicyConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Reads and parses an environment variable, falling back to `default`
/// when the variable is unset or unparsable.
pub(crate) fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value in environment, using default");
            default
        }),
        Err(_) => default,
    }
}
