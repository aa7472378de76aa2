use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use service::auth::{
    password::Argon2Hasher,
    repo::seaorm::SeaOrmAccountStore,
    repository::AccountStore,
    AuthConfig, AuthService,
};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Public entry: connect, migrate, build the app and run the HTTP server.
///
/// An unusable signing key aborts here, before anything is bound.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_default();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!(event = "migrations_applied", "database schema is current");

    let store: Arc<dyn AccountStore> = Arc::new(SeaOrmAccountStore { db });
    let auth = AuthService::new(store, Arc::new(Argon2Hasher::default()), AuthConfig::from(&cfg.jwt))
        .map_err(StartupError::from)?;
    let state = ServerState::new(auth);

    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, expiration_ms = cfg.jwt.expiration_ms, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
