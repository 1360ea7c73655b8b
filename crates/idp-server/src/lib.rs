//! # idp-server
//!
//! Axum HTTP surface of the SSO IdP simulator.
//!
//! This crate provides:
//! - SAML 2.0 endpoints (SP-initiated and IdP-initiated login, SP-initiated logout)
//! - OAuth2 authorization-code endpoints and the profile API
//! - The IdP landing page with local login and logout
//! - Health check endpoints
//!
//! ## Architecture
//!
//! Every handler receives an [`AppContext`] holding the store, the password
//! verifier, the ID-token signer and the configuration. Protocol decisions
//! live in `idp-protocol-saml` and `idp-protocol-oauth2`; this crate only
//! maps them onto HTTP: cookies, templates, redirects and status codes.
//!
//! ## Usage
//!
//! ```ignore
//! use idp_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod cookies;
pub mod error;
pub mod oauth2_handlers;
pub mod router;
pub mod saml_handlers;
pub mod seed;
pub mod state;
pub mod ui;

pub use config::ServerConfig;
pub use router::create_router;
pub use seed::{Seed, SeedSummary};
pub use state::AppContext;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use idp_storage_memory::MemoryStore;
use tokio::net::TcpListener;

/// The IdP simulator server.
pub struct Server {
    ctx: AppContext,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Loads the seed file named in the configuration, if any, into a fresh
    /// in-memory store.
    ///
    /// # Errors
    ///
    /// Fails if the seed file cannot be read or applied.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let seed_file = config.seed_file.clone();
        let ctx = AppContext::new(config, store);

        match seed_file {
            Some(path) => {
                let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
                let summary = Seed::from_file(&path)?
                    .apply(ctx.store.as_ref(), &ctx.hasher, &ctx.config.issuer_base, base_dir)
                    .await?;
                tracing::info!(
                    identity_providers = summary.identity_providers,
                    service_providers = summary.service_providers,
                    users = summary.users,
                    attributes = summary.attributes,
                    "Seed data loaded from {}",
                    path.display()
                );
            }
            None => tracing::warn!("IDP_SEED_FILE is not set; starting with an empty store"),
        }

        Ok(Self { ctx })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound or the server errors out.
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.ctx.config();
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        let app = create_router(self.ctx.clone());

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the application context.
    #[must_use]
    pub const fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Creates a test router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        create_router(self.ctx.clone())
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
