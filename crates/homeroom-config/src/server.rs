//! Listener configuration for the API server and the Prometheus endpoint.
//!
//! # Environment Variables
//!
//! - `HOST`: Bind address (default: `0.0.0.0`)
//! - `PORT`: API port (default: 3000)
//! - `METRICS_PORT`: Prometheus scrape port (default: 9090)

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            metrics_port: 9090,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", defaults.host),
            port: env_or("PORT", defaults.port),
            metrics_port: env_or("METRICS_PORT", defaults.metrics_port),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_addr(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}
