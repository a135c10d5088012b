//! Hemolink CLI
//!
//! Runs the Hemolink HTTP server and its development helpers.
//!
//! # Commands
//!
//! - `serve` - Run the HTTP server
//! - `issue-token` - Mint a bearer token for local testing
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use hemolink_server::Role;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Role-gated blood request and donation ledger server.
#[derive(Parser)]
#[command(name = "hemolink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind to
        #[arg(long, env = "HEMOLINK_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Port to listen on; overrides the port in --bind
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Secret used to sign and verify bearer tokens
        #[arg(long, env = "HEMOLINK_AUTH_SECRET", hide_env_values = true)]
        secret: String,

        /// Bearer token lifetime in seconds
        #[arg(long, default_value = "3600")]
        token_expiry_secs: u64,

        /// Shared secret for the new-user webhook; the webhook is closed without it
        #[arg(long, env = "HEMOLINK_WEBHOOK_SECRET", hide_env_values = true)]
        webhook_secret: Option<String>,

        /// Do not add CORS headers
        #[arg(long)]
        no_cors: bool,

        /// Largest accepted request body in bytes
        #[arg(long, default_value = "65536")]
        max_body_bytes: usize,

        /// JSON file of users and role records to load at startup
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Mint a bearer token for local testing
    IssueToken {
        /// Secret the server was started with
        #[arg(long, env = "HEMOLINK_AUTH_SECRET", hide_env_values = true)]
        secret: String,

        /// User id to issue the token for
        #[arg(long)]
        uid: String,

        /// Role claim to embed (regular_user or medical_staff)
        #[arg(long)]
        role: Option<Role>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins unless --verbose is given
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            bind,
            port,
            secret,
            token_expiry_secs,
            webhook_secret,
            no_cors,
            max_body_bytes,
            seed,
        } => {
            let mut bind = bind;
            if let Some(port) = port {
                bind.set_port(port);
            }
            commands::serve::run(commands::serve::ServeOptions {
                bind,
                secret,
                token_expiry_secs,
                webhook_secret,
                cors: !no_cors,
                max_body_bytes,
                seed,
            })?;
        }
        Commands::IssueToken { secret, uid, role } => {
            commands::issue_token::run(&secret, &uid, role)?;
        }
        Commands::Version => {
            println!("Hemolink CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Hemolink Server v{}", hemolink_server::VERSION);
        }
    }

    Ok(())
}
