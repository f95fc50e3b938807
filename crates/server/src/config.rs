//! Server configuration
//!
//! This module provides the bind configuration for the Stratify HTTP API
//! and its default ports.

use crate::error::{Result, ServerError};
use std::net::SocketAddr;

/// Default port assignments
pub mod ports {
    /// Screener API HTTP port
    pub const SCREENER_HTTP: u16 = 8090;
}

/// Bind configuration for the HTTP server
///
/// # Example
///
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::http_only("127.0.0.1", 8090);
/// assert!(config.http_addr().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// HTTP port; 0 binds an ephemeral port
    pub http_port: Option<u16>,
}

impl ServerConfig {
    /// Create a server config for HTTP only
    pub fn http_only(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            http_port: Some(port),
        }
    }

    /// Same host, different port
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    /// Get HTTP socket address
    pub fn http_addr(&self) -> Option<Result<SocketAddr>> {
        self.http_port.map(|p| self.parse_addr(p))
    }

    fn parse_addr(&self, port: u16) -> Result<SocketAddr> {
        format!("{}:{}", self.host, port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, port)))
    }
}

impl From<&::config::HttpConfig> for ServerConfig {
    fn from(c: &::config::HttpConfig) -> Self {
        Self::http_only(c.resolve_host(), c.http_port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::http_only("0.0.0.0", ports::SCREENER_HTTP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_http_only() {
        let config = ServerConfig::http_only("127.0.0.1", 8090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.http_port, Some(8090));
        assert_eq!(
            config.http_addr().unwrap().unwrap(),
            "127.0.0.1:8090".parse().unwrap()
        );
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig::http_only("not a host", 8090);
        assert!(matches!(
            config.http_addr(),
            Some(Err(ServerError::InvalidAddress(_)))
        ));
    }

    #[test]
    fn test_from_http_config() {
        let http = ::config::HttpConfig {
            host: "127.0.0.1".to_string(),
            fallback: "0.0.0.0".to_string(),
            http_port: 18090,
        };
        let config = ServerConfig::from(&http);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.http_port, Some(18090));
        assert_eq!(ServerConfig::default().with_http_port(1).http_port, Some(1));
    }
}
