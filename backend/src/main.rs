//! Backend entry-point: loads settings, wires adapters, and serves the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use inspection_backend::inbound::http::health::HealthState;
use inspection_backend::outbound::persistence::{DbPool, PoolConfig, apply_migrations};
use inspection_backend::outbound::token::key_fingerprint;
use inspection_backend::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().context("failed to load settings")?;
    let bind_addr = settings.bind_addr()?;
    let token_ttl = settings.token_ttl()?;
    let secret = settings.signing_secret()?;
    match secret.as_deref() {
        Some(bytes) => info!(key_fingerprint = %key_fingerprint(bytes), "token signing key loaded"),
        None => warn!("no token signing secret configured; sign-in and authenticated routes will fail"),
    }

    let mut config = ServerConfig::new(bind_addr, token_ttl)
        .with_signing_secret(secret)
        .with_identity_provider(settings.identity_provider()?)
        .with_development_identity(settings.dev_identity_provider);
    match settings.database_url.as_deref() {
        Some(url) => {
            let applied = apply_migrations(url)
                .await
                .context("failed to apply database migrations")?;
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .context("failed to build database pool")?;
            info!(applied, "using PostgreSQL persistence");
            config = config.with_db_pool(pool);
        }
        None => {
            warn!("no database_url configured; templates are held in memory");
            config = config.with_bootstrap_admin(settings.bootstrap_admin_email()?);
        }
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).context("failed to start HTTP server")?;
    info!(%bind_addr, "listening");
    server.await.context("HTTP server terminated")
}
