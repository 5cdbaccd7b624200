//! Folio Auth Server
//!
//! HTTP service for OTP registration, login, token rotation and password reset.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use folio_core::Config;
use folio_core::config::{MailConfig, database_path, load_config};
use folio_core::tracing_init::init_tracing;

use folio_auth::api;
use folio_auth::auth::{Argon2Hasher, JwtManager, OtpEngine};
use folio_auth::housekeeping::{PURGE_INTERVAL, spawn_housekeeping};
use folio_auth::mail::{LogMailer, Mailer};
use folio_auth::service::SessionController;
use folio_auth::storage::AuthDatabase;

#[derive(Parser, Debug)]
#[command(name = "folio-auth")]
#[command(
    version,
    about = "Folio auth server - OTP registration, login, token rotation, password reset"
)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Access token signing secret.
    #[arg(long, env = "FOLIO_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_secret: Option<String>,

    /// Refresh token signing secret.
    #[arg(long, env = "FOLIO_REFRESH_TOKEN_SECRET", hide_env_values = true)]
    refresh_secret: Option<String>,

    /// Access token TTL in seconds.
    #[arg(long)]
    access_ttl: Option<i64>,

    /// Refresh token TTL in seconds.
    #[arg(long)]
    refresh_ttl: Option<i64>,

    /// Log outgoing mail instead of sending it.
    #[arg(long)]
    log_mail: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,

    /// OTLP endpoint for traces and metrics.
    #[cfg(feature = "metrics")]
    #[arg(long, env = "FOLIO_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,
}

impl Args {
    /// CLI flags take precedence over file and environment.
    fn apply(&self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(path) = &self.db_path {
            config.server.database_path = Some(path.clone());
        }
        if let Some(secret) = &self.access_secret {
            config.tokens.access_secret = Some(secret.clone());
        }
        if let Some(secret) = &self.refresh_secret {
            config.tokens.refresh_secret = Some(secret.clone());
        }
        if let Some(ttl) = self.access_ttl {
            config.tokens.access_ttl_secs = ttl;
        }
        if let Some(ttl) = self.refresh_ttl {
            config.tokens.refresh_ttl_secs = ttl;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    init_tracing(
        &format!("folio_auth={}", config.server.log_level),
        args.log_json,
    );

    #[cfg(feature = "metrics")]
    let metrics_guard = args
        .otlp_endpoint
        .as_deref()
        .map(folio_core::metrics::init_metrics)
        .transpose()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting folio-auth"
    );

    let (access_secret, refresh_secret) = config.tokens.secrets()?;
    let jwt = JwtManager::new(
        access_secret.as_bytes(),
        config.tokens.access_ttl_secs,
        refresh_secret.as_bytes(),
        config.tokens.refresh_ttl_secs,
    );

    let db_path = config
        .server
        .database_path
        .clone()
        .or_else(database_path)
        .context("Cannot determine database path; pass --db-path")?;
    info!(path = %db_path.display(), "Opening auth database");
    let db = AuthDatabase::open(&db_path).await?;

    let controller = Arc::new(SessionController::new(
        db,
        Arc::new(Argon2Hasher::new()),
        Arc::new(jwt),
        OtpEngine::default(),
        build_mailer(&config.mail, args.log_mail)?,
    )?);

    let housekeeping = spawn_housekeeping(Arc::clone(&controller), PURGE_INTERVAL);

    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    info!(addr = %config.server.addr, "Auth server listening");

    axum::serve(listener, api::router(controller))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    housekeeping.abort();

    #[cfg(feature = "metrics")]
    if let Some(guard) = metrics_guard {
        if let Err(e) = guard.shutdown() {
            warn!(error = %e, "Failed to flush telemetry");
        }
    }

    info!("Auth server stopped");
    Ok(())
}

fn build_mailer(config: &MailConfig, log_only: bool) -> anyhow::Result<Arc<dyn Mailer>> {
    if let (Some(url), false) = (&config.api_url, log_only) {
        #[cfg(feature = "http-mailer")]
        {
            info!(url, sender = %config.sender, "Sending mail through HTTP API");
            let mailer = folio_auth::mail::HttpMailer::new(
                url.clone(),
                config.api_key.clone(),
                config.sender.clone(),
                config.sender_name.clone(),
            )?;
            return Ok(Arc::new(mailer));
        }
        #[cfg(not(feature = "http-mailer"))]
        warn!(url, "Built without the http-mailer feature; mail.api_url ignored");
    }

    info!("Mail transport not configured; logging mail");
    Ok(Arc::new(LogMailer))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal");
}
