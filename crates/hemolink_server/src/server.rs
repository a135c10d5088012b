//! Server bootstrap.

use crate::config::{CorsMode, ServerConfig};
use crate::orchestrator::WriteOrchestrator;
use crate::router::{routes, AppState};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use hemolink_identity::IdentityVerifier;
use hemolink_store::DocumentStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// The HTTP server.
///
/// Collaborators are injected at construction; the server holds no other
/// state across requests.
///
/// # Example
///
/// ```
/// use hemolink_identity::{AuthConfig, LocalIdentityService};
/// use hemolink_server::{HemolinkServer, ServerConfig};
/// use hemolink_store::MemoryStore;
/// use std::sync::Arc;
///
/// let server = HemolinkServer::new(
///     ServerConfig::default(),
///     Arc::new(MemoryStore::new()),
///     Arc::new(LocalIdentityService::new(AuthConfig::new(b"secret".to_vec()))),
/// );
/// let _app = server.router();
/// ```
pub struct HemolinkServer {
    config: ServerConfig,
    orchestrator: WriteOrchestrator,
    identity: Arc<dyn IdentityVerifier>,
}

impl HemolinkServer {
    /// Creates a server over the given store and identity service.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let orchestrator = WriteOrchestrator::new(store, Arc::clone(&identity));
        Self {
            config,
            orchestrator,
            identity,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the write orchestrator.
    pub fn orchestrator(&self) -> &WriteOrchestrator {
        &self.orchestrator
    }

    /// Builds the full application: routes plus tracing, CORS and body limit.
    pub fn router(&self) -> Router {
        let state = AppState::new(
            self.orchestrator.clone(),
            Arc::clone(&self.identity),
            self.config.webhook_secret.clone(),
        );
        let app = routes(state)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http());
        match self.config.cors {
            CorsMode::Permissive => app.layer(CorsLayer::permissive()),
            CorsMode::Disabled => app,
        }
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the address cannot be bound.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if accepting connections fails.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(%addr, cors = ?self.config.cors, "listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemolink_identity::{AuthConfig, LocalIdentityService};
    use hemolink_store::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn server() -> HemolinkServer {
        HemolinkServer::new(
            ServerConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(LocalIdentityService::new(AuthConfig::new(b"s".to_vec()))),
        )
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(server().serve_on(listener, async {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"{"status":"ok"}"#));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
