use anyhow::Result;
use anyhow::anyhow;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

/// Minimum HMAC-SHA256 key length in bytes.
pub const MIN_JWT_KEY_BYTES: usize = 32;
/// Upper bound on session lifetime (366 days).
pub const MAX_JWT_EXPIRATION_MS: u64 = 366 * 86_400_000;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Session token settings. `secret_key` is base64-encoded key material.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_jwt_expiration_ms")]
    pub expiration_ms: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self { secret_key: String::new(), expiration_ms: default_jwt_expiration_ms() }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_jwt_expiration_ms() -> u64 { 86_400_000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to an all-defaults config
    /// filled from the environment when no file is present.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        // 若 TOML 中未提供，则从环境变量填充
        self.database.normalize_from_env();
        self.database.validate()?;
        self.jwt.normalize_from_env();
        self.jwt.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() { self.host = host; }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl JwtConfig {
    pub fn normalize_from_env(&mut self) {
        if self.secret_key.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET_KEY") {
                self.secret_key = secret;
            }
        }
        if let Some(ms) = std::env::var("JWT_EXPIRATION_MS").ok().and_then(|v| v.parse::<u64>().ok()) {
            self.expiration_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let secret = self.secret_key.trim();
        if secret.is_empty() {
            return Err(anyhow!("jwt.secret_key is empty; set it in config.toml or JWT_SECRET_KEY"));
        }
        let bytes = general_purpose::STANDARD
            .decode(secret)
            .map_err(|e| anyhow!("jwt.secret_key is not valid base64: {e}"))?;
        if bytes.len() < MIN_JWT_KEY_BYTES {
            return Err(anyhow!(
                "jwt.secret_key decodes to {} bytes; at least {} required",
                bytes.len(),
                MIN_JWT_KEY_BYTES
            ));
        }
        if self.expiration_ms == 0 {
            return Err(anyhow!("jwt.expiration_ms must be positive"));
        }
        if self.expiration_ms > MAX_JWT_EXPIRATION_MS {
            return Err(anyhow!(
                "jwt.expiration_ms is {}; at most {} allowed",
                self.expiration_ms,
                MAX_JWT_EXPIRATION_MS
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 32 zero bytes
    const KEY_32: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn parses_full_file() {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost:5432/db"

            [jwt]
            secret_key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
            expiration_ms = 60000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.jwt.expiration_ms, 60_000);
        cfg.database.validate().unwrap();
        cfg.jwt.validate().unwrap();
    }

    #[test]
    fn jwt_defaults_to_one_day() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.jwt.expiration_ms, 86_400_000);
    }

    #[test]
    fn jwt_rejects_short_or_garbled_keys() {
        let short = JwtConfig { secret_key: "c2hvcnQ=".into(), expiration_ms: 1000 };
        assert!(short.validate().is_err());
        let garbled = JwtConfig { secret_key: "not base64 !!".into(), expiration_ms: 1000 };
        assert!(garbled.validate().is_err());
        let zero_exp = JwtConfig { secret_key: KEY_32.into(), expiration_ms: 0 };
        assert!(zero_exp.validate().is_err());
        let ok = JwtConfig { secret_key: KEY_32.into(), expiration_ms: 1000 };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn jwt_expiration_is_bounded() {
        let at_cap = JwtConfig { secret_key: KEY_32.into(), expiration_ms: MAX_JWT_EXPIRATION_MS };
        assert!(at_cap.validate().is_ok());
        let over = JwtConfig { secret_key: KEY_32.into(), expiration_ms: MAX_JWT_EXPIRATION_MS + 1 };
        assert!(over.validate().is_err());
        let huge = JwtConfig { secret_key: KEY_32.into(), expiration_ms: u64::MAX };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn database_url_scheme_checked() {
        let db = DatabaseConfig { url: "mysql://x".into(), min_connections: 1, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, sqlx_logging: false };
        assert!(db.validate().is_err());
    }
}
