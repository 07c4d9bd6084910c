//! Rentcamp - Camping gear rental backend

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};
use rentcamp_api::{AppState, create_router};
use rentcamp_auth::{CredentialHasher, TokenService};
use rentcamp_db::{Database, Gender, NewUser, UserRole};

/// Rentcamp - Camping gear rental backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "RENTCAMP_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "RENTCAMP_PORT")]
    port: Option<u16>,

    /// Secret for signing access tokens
    #[arg(long, env = "RENTCAMP_ACCESS_SECRET", hide_env_values = true)]
    access_secret: Option<String>,

    /// Secret for signing refresh tokens
    #[arg(long, env = "RENTCAMP_REFRESH_SECRET", hide_env_values = true)]
    refresh_secret: Option<String>,

    /// Password for the bootstrap admin account
    #[arg(long, env = "RENTCAMP_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

impl Args {
    /// Command line and environment win over the file
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(secret) = self.access_secret {
            config.auth.access_secret = secret;
        }
        if let Some(secret) = self.refresh_secret {
            config.auth.refresh_secret = secret;
        }
        if let Some(password) = self.admin_password {
            config.auth.admin_password = Some(password);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);

    init_logging(&config.logging);

    config.validate().context("Invalid configuration")?;

    info!("Starting Rentcamp v{}", env!("CARGO_PKG_VERSION"));

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Initialize database
    let db_url = format!("sqlite:{}", config.database.path);
    let db = Database::new(&db_url)
        .await
        .context("Failed to open database")?;

    let hasher = Arc::new(CredentialHasher::default());
    bootstrap_admin(&db, &hasher, &config).await?;

    let tokens = Arc::new(
        TokenService::new(
            &config.auth.access_secret,
            &config.auth.refresh_secret,
            config.auth.access_token_ttl_secs,
            config.auth.refresh_token_ttl_secs,
        )
        .context("Failed to initialize token service")?,
    );

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let state = AppState::new(db, tokens, hasher)?;

    let app = create_router(state, Some(Arc::new(metrics_handle))).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the admin account on an empty database
async fn bootstrap_admin(db: &Database, hasher: &CredentialHasher, config: &Config) -> Result<()> {
    if db.has_users().await? {
        return Ok(());
    }

    let Some(password) = &config.auth.admin_password else {
        warn!("No users exist and no admin password is configured; skipping admin bootstrap");
        return Ok(());
    };

    info!("Creating admin user: {}", config.auth.admin_username);
    db.insert_user(NewUser {
        name: "Administrator".to_string(),
        username: config.auth.admin_username.clone(),
        password_hash: hasher.hash(password)?,
        email: format!("{}@localhost.localdomain", config.auth.admin_username),
        phone: "-".to_string(),
        address: "-".to_string(),
        gender: Gender::Male,
        role: UserRole::Admin,
    })
    .await?;

    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
