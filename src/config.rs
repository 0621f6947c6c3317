use std::path::Path;

use jsonwebtoken::Algorithm;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub enforce_meta_types: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub security: Option<SecurityConfig>,
}

/// One year.
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 60 * 24 * 366;

const DEFAULTS: &str = include_str!("../config/default.toml");

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => panic!("Failed to deserialize default config: {}", e),
            },
            Err(e) => panic!("Failed to parse default config: {}", e),
        }
    }
}

impl AuthConfig {
    /// The signing algorithm. Only HMAC variants are usable with a shared secret.
    pub fn jwt_algorithm(&self) -> anyhow::Result<Algorithm> {
        let alg: Algorithm = self
            .algorithm
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown auth.algorithm: {}", self.algorithm))?;
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
            other => Err(anyhow::anyhow!("auth.algorithm must be an HMAC algorithm, got {:?}", other)),
        }
    }
}

/// Loads defaults -> historian.toml -> `HISTORIAN_CONFIG` file -> env.
pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();
    let custom = std::env::var("HISTORIAN_CONFIG").ok();
    load_with(custom.as_deref())
}

/// Same as [`load`] with an explicit extra config file instead of `HISTORIAN_CONFIG`.
pub fn load_with(custom_path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        // Optional local file: historian.toml (in CWD)
        .add_source(::config::File::with_name("historian").required(false));

    if let Some(path) = custom_path {
        builder = builder.add_source(::config::File::with_name(path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("HISTORIAN").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Database
    if cfg.database.url.trim().is_empty() {
        return Err(anyhow::anyhow!("database.url must not be empty"));
    }
    if cfg.database.max_connections == 0 {
        return Err(anyhow::anyhow!("database.max_connections must be > 0"));
    }

    // Auth
    if cfg.auth.secret_key.is_empty() {
        return Err(anyhow::anyhow!("auth.secret_key must not be empty"));
    }
    cfg.auth.jwt_algorithm()?;
    if !(1..=MAX_ACCESS_TOKEN_MINUTES).contains(&cfg.auth.access_token_expire_minutes) {
        return Err(anyhow::anyhow!(
            "auth.access_token_expire_minutes must be between 1 and {}, got {}",
            MAX_ACCESS_TOKEN_MINUTES,
            cfg.auth.access_token_expire_minutes
        ));
    }

    // Api
    if cfg.api.max_body_bytes == 0 {
        return Err(anyhow::anyhow!("api.max_body_bytes must be > 0"));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        // Strip query parameters such as ?mode=rwc
        let path = path.split('?').next().unwrap_or(path);
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
