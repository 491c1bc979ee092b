//! Medgate daemon - runs the token authority or the edge gatekeeper

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use medgate::auth::SigningKey;
use medgate::authority::{run_authority, AuthorityService, AuthorityState};
use medgate::gateway::{
    run_gateway, BearerAuthStage, Forwarder, GatewayState, Pipeline, RouteTable, TraceStage,
    ValidationClient, DEFAULT_FORWARD_TIMEOUT,
};
use medgate::store::{CredentialStore, MemoryStore, PostgresConfig, PostgresStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Service {
    Authority,
    Gateway,
}

#[derive(Parser)]
#[command(name = "medgated")]
#[command(about = "Medgate perimeter authentication daemon")]
#[command(version)]
struct Args {
    /// Which service to run
    #[arg(long, value_enum, env = "MEDGATE_SERVICE")]
    service: Service,

    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "MEDGATE_BIND")]
    bind: String,

    /// Token signing secret (authority only)
    #[arg(long, env = "MEDGATE_SECRET")]
    secret: Option<String>,

    /// Database URL (authority only)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Use the in-memory credential store instead of Postgres (authority only)
    #[arg(long)]
    memory: bool,

    /// Base URL of the token authority (gateway only)
    #[arg(long, env = "MEDGATE_AUTH_URL")]
    auth_url: Option<String>,

    /// Forwarding rule as prefix=target (gateway only, can be repeated)
    #[arg(long = "route", env = "MEDGATE_ROUTES", value_delimiter = ',')]
    routes: Vec<String>,

    /// Timeout in seconds for a single validation call (gateway only)
    #[arg(long, default_value_t = 5, env = "MEDGATE_VALIDATE_TIMEOUT")]
    validate_timeout: u64,

    /// Run as daemon (background)
    #[arg(short, long)]
    daemon: bool,

    /// PID file path (only with --daemon)
    #[arg(long, env = "MEDGATE_PIDFILE")]
    pidfile: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Daemonize if requested
    if args.daemon {
        daemonize(&args)?;
    }

    run_service(args).await
}

#[cfg(unix)]
fn daemonize(args: &Args) -> Result<()> {
    use std::fs::File;
    use std::io::Write;

    // Fork and detach
    match unsafe { libc::fork() } {
        -1 => return Err(anyhow::anyhow!("Fork failed")),
        0 => {
            // Child process - continue
        }
        pid => {
            // Parent process - write pidfile and exit
            if let Some(pidfile) = &args.pidfile {
                let mut f = File::create(pidfile)
                    .with_context(|| format!("Failed to create pidfile: {:?}", pidfile))?;
                writeln!(f, "{}", pid)?;
            }
            info!(pid = pid, "Daemon started");
            std::process::exit(0);
        }
    }

    // Create new session
    if unsafe { libc::setsid() } == -1 {
        return Err(anyhow::anyhow!("setsid failed"));
    }

    // Change to root directory
    std::env::set_current_dir("/")?;

    // Close standard file descriptors
    unsafe {
        libc::close(0);
        libc::close(1);
        libc::close(2);
    }

    Ok(())
}

#[cfg(not(unix))]
fn daemonize(_args: &Args) -> Result<()> {
    Err(anyhow::anyhow!("--daemon is only supported on Unix"))
}

async fn run_service(args: Args) -> Result<()> {
    let bind_addr = args.bind.parse().context("Invalid bind address")?;

    let server = match args.service {
        Service::Authority => {
            let secret = args
                .secret
                .as_deref()
                .context("MEDGATE_SECRET required for the authority")?;
            let key = SigningKey::from_config(secret).context("Invalid MEDGATE_SECRET")?;

            let store: Arc<dyn CredentialStore> = if args.memory {
                info!("Using in-memory credential store");
                Arc::new(MemoryStore::new())
            } else {
                let url = args
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL required for the authority")?;
                let db_config = PostgresConfig::from_url(url).context("Invalid DATABASE_URL")?;
                Arc::new(PostgresStore::new(db_config).await?)
            };

            let state = AuthorityState {
                service: Arc::new(AuthorityService::new(store, key)),
            };

            info!(addr = %args.bind, "Token authority daemon starting");
            tokio::spawn(async move { run_authority(bind_addr, state).await })
        }
        Service::Gateway => {
            let auth_url = args
                .auth_url
                .as_deref()
                .context("MEDGATE_AUTH_URL required for the gateway")?;
            let routes = RouteTable::parse(&args.routes).context("Invalid --route rule")?;
            if routes.is_empty() {
                return Err(anyhow::anyhow!("At least one --route rule is required"));
            }

            let validator =
                ValidationClient::new(auth_url, Duration::from_secs(args.validate_timeout))
                    .context("Failed to build validation client")?;
            let forwarder =
                Forwarder::new(DEFAULT_FORWARD_TIMEOUT).context("Failed to build forwarder")?;

            let pipeline = Pipeline::new(vec![
                Arc::new(TraceStage),
                Arc::new(BearerAuthStage::new(validator)),
            ]);

            let state = GatewayState {
                pipeline: Arc::new(pipeline),
                routes: Arc::new(routes),
                forwarder: Arc::new(forwarder),
            };

            info!(addr = %args.bind, auth_url = %auth_url, "Edge gatekeeper daemon starting");
            tokio::spawn(async move { run_gateway(bind_addr, state).await })
        }
    };

    // Run server with graceful shutdown on signals
    tokio::select! {
        result = server => {
            result??;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server");
        }
    }

    // Cleanup pidfile if it exists
    if let Some(pidfile) = &args.pidfile {
        if pidfile.exists() {
            if let Err(e) = std::fs::remove_file(pidfile) {
                warn!(error = %e, "Failed to remove pidfile");
            }
        }
    }

    info!("Medgate daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
