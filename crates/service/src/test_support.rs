#![cfg(test)]
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};

use crate::auth::clock::ManualClock;
use crate::auth::domain::RegisterInput;
use crate::auth::password::{Argon2Hasher, PasswordHasher};
use crate::auth::repository::mock::InMemoryAccountStore;
use crate::auth::service::{AuthConfig, AuthService};

/// base64("0123456789abcdef0123456789abcdef")
pub const TEST_SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
pub const TEST_EXPIRATION_MS: u64 = 24 * 3_600_000;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let mut cfg = DatabaseConfig::default();
    cfg.normalize_from_env();
    cfg.acquire_timeout_secs = 10;
    let db = connect_with_config(&cfg).await?;
    MIGRATED
        .get_or_try_init(|| async { migration::Migrator::up(&db, None).await })
        .await?;
    Ok(db)
}

/// Argon2 with minimal cost so tests stay fast.
pub fn cheap_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::with_params(1024, 1, 1).expect("valid argon2 params"))
}

pub fn fixture_with_store(
    clock: Arc<ManualClock>,
    store: Arc<InMemoryAccountStore>,
) -> (AuthService<InMemoryAccountStore>, Arc<InMemoryAccountStore>) {
    let cfg = AuthConfig { jwt_secret: TEST_SECRET.into(), expiration_ms: TEST_EXPIRATION_MS };
    let svc = AuthService::with_clock(store.clone(), cheap_hasher(), cfg, clock).expect("test key is valid");
    (svc, store)
}

pub fn fixture() -> (AuthService<InMemoryAccountStore>, Arc<InMemoryAccountStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_secs(1_700_000_000));
    let (svc, store) = fixture_with_store(clock.clone(), Arc::new(InMemoryAccountStore::default()));
    (svc, store, clock)
}

pub fn register_input(email: &str, password: &str) -> RegisterInput {
    RegisterInput {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        password: password.into(),
        password_confirmation: password.into(),
    }
}
