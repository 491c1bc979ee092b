//! Medgate CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use medgate::auth::SigningKey;
use medgate::authority::{run_authority, AuthorityService, AuthorityState};
use medgate::gateway::{
    run_gateway, BearerAuthStage, Forwarder, GatewayState, Pipeline, RouteTable, TraceStage,
    ValidationClient,
};
use medgate::store::{CredentialStore, MemoryStore, PostgresConfig, PostgresStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Helper to get database config lazily (only when needed)
    let get_db_config = || -> Result<PostgresConfig> {
        if let Some(url) = &cli.database_url {
            PostgresConfig::from_url(url).context("Invalid DATABASE_URL")
        } else {
            PostgresConfig::from_env().context("DATABASE_URL not set")
        }
    };

    match cli.command {
        Commands::Authority { bind, secret, memory } => {
            let store: Arc<dyn CredentialStore> = if memory {
                info!("Using in-memory credential store");
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(PostgresStore::new(get_db_config()?).await?)
            };
            authority(store, bind, secret).await
        }
        Commands::Gateway {
            bind,
            auth_url,
            routes,
            validate_timeout,
        } => gateway(bind, auth_url, routes, validate_timeout).await,
        Commands::Init => init(get_db_config()?).await,
        Commands::Status => status(get_db_config()?).await,
        Commands::Hash { password } => hash(&password),
    }
}

async fn authority(store: Arc<dyn CredentialStore>, bind: String, secret: String) -> Result<()> {
    let key = SigningKey::from_config(&secret).context("Invalid MEDGATE_SECRET")?;
    let bind_addr = bind.parse().context("Invalid bind address")?;

    let state = AuthorityState {
        service: Arc::new(AuthorityService::new(store, key)),
    };

    info!("Starting token authority...");
    run_authority(bind_addr, state).await
}

async fn gateway(
    bind: String,
    auth_url: String,
    routes: Vec<String>,
    validate_timeout: u64,
) -> Result<()> {
    let bind_addr = bind.parse().context("Invalid bind address")?;
    let routes = RouteTable::parse(&routes).context("Invalid --route rule")?;

    let validator = ValidationClient::new(&auth_url, Duration::from_secs(validate_timeout))
        .context("Failed to build validation client")?;
    let forwarder =
        Forwarder::new(medgate::gateway::DEFAULT_FORWARD_TIMEOUT).context("Failed to build forwarder")?;

    let pipeline = Pipeline::new(vec![
        Arc::new(TraceStage),
        Arc::new(BearerAuthStage::new(validator)),
    ]);

    let state = GatewayState {
        pipeline: Arc::new(pipeline),
        routes: Arc::new(routes),
        forwarder: Arc::new(forwarder),
    };

    info!(auth_url = %auth_url, "Starting edge gatekeeper...");
    run_gateway(bind_addr, state).await
}

async fn init(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;
    println!("Database schema initialized successfully");
    Ok(())
}

async fn status(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;

    println!("Medgate Status");
    println!("==============");
    println!("Database: Connected");

    Ok(())
}

fn hash(password: &str) -> Result<()> {
    let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    println!("{}", hashed);
    Ok(())
}
