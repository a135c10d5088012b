//! Serve command implementation.

use hemolink_identity::{AuthConfig, LocalIdentityService};
use hemolink_server::{CorsMode, HemolinkServer, SeedData, ServerConfig};
use hemolink_store::MemoryStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Options collected from the command line.
pub struct ServeOptions {
    /// Address to bind to.
    pub bind: SocketAddr,
    /// Token signing secret.
    pub secret: String,
    /// Token lifetime in seconds.
    pub token_expiry_secs: u64,
    /// Webhook secret, if the webhook is enabled.
    pub webhook_secret: Option<String>,
    /// Whether to add permissive CORS headers.
    pub cors: bool,
    /// Request body limit.
    pub max_body_bytes: usize,
    /// Seed file to load.
    pub seed: Option<PathBuf>,
}

impl ServeOptions {
    fn server_config(&self) -> ServerConfig {
        let cors = if self.cors {
            CorsMode::Permissive
        } else {
            CorsMode::Disabled
        };
        let config = ServerConfig::new(self.bind)
            .with_cors(cors)
            .with_max_body_bytes(self.max_body_bytes);
        match &self.webhook_secret {
            Some(secret) => config.with_webhook_secret(secret.clone().into_bytes()),
            None => config,
        }
    }
}

/// Runs the serve command.
pub fn run(options: ServeOptions) -> Result<(), Box<dyn std::error::Error>> {
    if options.secret.is_empty() {
        return Err("token secret must not be empty".into());
    }

    let auth = AuthConfig::new(options.secret.clone().into_bytes())
        .with_expiry(Duration::from_secs(options.token_expiry_secs));
    let identity = Arc::new(LocalIdentityService::new(auth));
    let store = Arc::new(MemoryStore::new());
    let server = HemolinkServer::new(options.server_config(), store, identity.clone());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        if let Some(path) = &options.seed {
            let seed = SeedData::from_path(path)?;
            seed.apply(identity.directory(), server.orchestrator().roles())
                .await?;
            tracing::info!(path = %path.display(), "seed file loaded");
        }
        if options.webhook_secret.is_none() {
            tracing::warn!("no webhook secret configured; /api/handle-new-user is closed");
        }

        server.serve(shutdown_signal()).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
