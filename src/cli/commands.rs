//! CLI command definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "medgate")]
#[command(about = "Token authority and edge gatekeeper", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the token authority
    Authority {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0:8081", env = "MEDGATE_BIND")]
        bind: String,

        /// Token signing secret (base64, at least 32 decoded bytes)
        #[arg(long, env = "MEDGATE_SECRET")]
        secret: String,

        /// Use the in-memory credential store instead of Postgres
        #[arg(long)]
        memory: bool,
    },

    /// Start the edge gatekeeper
    Gateway {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0:8080", env = "MEDGATE_BIND")]
        bind: String,

        /// Base URL of the token authority
        #[arg(long, env = "MEDGATE_AUTH_URL")]
        auth_url: String,

        /// Forwarding rule as prefix=target (can be repeated)
        ///
        /// Examples:
        ///   medgate gateway --auth-url http://localhost:8081 \
        ///     --route /api/patients=http://localhost:8082 \
        ///     --route /api/billing=http://localhost:8083
        #[arg(long = "route", env = "MEDGATE_ROUTES", value_delimiter = ',', required = true)]
        routes: Vec<String>,

        /// Timeout in seconds for a single validation call
        #[arg(long, default_value_t = 5, env = "MEDGATE_VALIDATE_TIMEOUT")]
        validate_timeout: u64,
    },

    /// Initialize the database schema
    Init,

    /// Show connectivity status
    Status,

    /// Hash a password for out-of-band credential seeding
    Hash {
        /// Password to hash
        password: String,
    },
}
