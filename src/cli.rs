//! # CLI
//!
//! Argument parsing and service boot. The token secret and lifetime
//! have no defaults: both must arrive via flags or environment, and the
//! process refuses to start without them.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;

use crate::access::AccessLayer;
use crate::config::GuardConfig;
use crate::guard::{TokenVerifier, ROLE_FIELD, USERS_COLLECTION};
use crate::messages::MessageCatalog;
use crate::server::ApiServer;
use crate::store::{DocumentId, DocumentStore, MemoryStore, ID_FIELD};

/// Guarded document-access service
#[derive(Debug, Parser)]
#[command(name = "docgate", version, about)]
pub struct Cli {
    /// Address to bind the HTTP API on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Token-signing secret
    #[arg(long, env = "DOCGATE_JWT_SECRET")]
    pub jwt_secret: String,

    /// Token lifetime in seconds
    #[arg(long, env = "DOCGATE_JWT_TTL_SECS")]
    pub jwt_ttl_secs: i64,

    /// Insert an admin user at boot and log a token for it
    #[arg(long)]
    pub seed_admin: bool,
}

/// Parse arguments, initialize logging, and run the service
pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tokio::runtime::Runtime::new()?.block_on(serve(cli))
}

async fn serve(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = GuardConfig::new(cli.jwt_secret, cli.jwt_ttl_secs);
    let engine = AccessLayer::new(Arc::new(MemoryStore::new()));
    let verifier = Arc::new(TokenVerifier::new(&config));
    let catalog = Arc::new(MessageCatalog::builtin());

    if cli.seed_admin {
        let id = DocumentId::generate();
        engine
            .store()
            .insert_one(
                USERS_COLLECTION,
                json!({ID_FIELD: id.to_string(), "name": "admin", ROLE_FIELD: "admin"}),
            )
            .await?;
        let token = verifier.sign(&id.to_string())?;
        tracing::info!(%id, token = %token, "seeded admin user");
    }

    let server = ApiServer::new(engine, verifier, catalog);
    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    tracing::info!(bind = %cli.bind, "listening");
    axum::serve(listener, server.router()).await?;
    Ok(())
}
