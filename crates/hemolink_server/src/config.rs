//! Server configuration.

use hemolink_identity::WebhookSecret;
use std::net::SocketAddr;

/// Cross-origin policy for browser clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsMode {
    /// Allow any origin, method and header.
    Permissive,
    /// Add no CORS headers.
    Disabled,
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Shared secret for the new-user webhook. The route is closed when unset.
    pub webhook_secret: Option<WebhookSecret>,
    /// Cross-origin policy.
    pub cors: CorsMode,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            webhook_secret: None,
            cors: CorsMode::Permissive,
            max_body_bytes: 64 * 1024,
        }
    }

    /// Enables the new-user webhook with the given secret.
    pub fn with_webhook_secret(mut self, secret: Vec<u8>) -> Self {
        self.webhook_secret = Some(WebhookSecret::new(secret));
        self
    }

    /// Sets the cross-origin policy.
    pub fn with_cors(mut self, cors: CorsMode) -> Self {
        self.cors = cors;
        self
    }

    /// Sets the request body limit.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 3000)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cors, CorsMode::Permissive);
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new("0.0.0.0:9000".parse().unwrap())
            .with_webhook_secret(b"hook".to_vec())
            .with_cors(CorsMode::Disabled)
            .with_max_body_bytes(1024);

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.cors, CorsMode::Disabled);
        assert_eq!(config.max_body_bytes, 1024);
        assert!(config.webhook_secret.unwrap().validate(b"hook").is_ok());
    }
}
