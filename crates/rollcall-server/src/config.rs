//! Server configuration: TOML file, environment overrides, validation.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use rollcall_cache::TtlPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub fallback: FallbackSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // TTL validations
        if self.cache.min_ttl_secs == 0 {
            return Err("cache.min_ttl_secs must be > 0".into());
        }
        if self.cache.min_ttl_secs > self.cache.max_ttl_secs {
            return Err("cache.min_ttl_secs must be <= cache.max_ttl_secs".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Collaborator endpoints are required
        if self.fallback.base_url.as_deref().unwrap_or("").is_empty() {
            return Err("fallback.base_url is required".into());
        }
        if self.sync.sink_url.as_deref().unwrap_or("").is_empty() {
            return Err("sync.sink_url is required".into());
        }
        // Auth validation
        match self.auth.mode {
            AuthMode::Introspection => {
                if self.auth.introspection_url.as_deref().unwrap_or("").is_empty() {
                    return Err("auth.mode = \"introspection\" requires auth.introspection_url".into());
                }
            }
            AuthMode::Static => {
                if self.auth.static_tokens.is_empty() {
                    return Err("auth.mode = \"static\" requires at least one [[auth.static_tokens]] entry".into());
                }
            }
        }
        if self.redis.enabled && self.redis.url.is_empty() {
            return Err("redis.enabled = true requires redis.url".into());
        }
        if self.redis.enabled && self.redis.timeout_ms == 0 {
            return Err("redis.timeout_ms must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            default_ttl_secs: self.cache.default_ttl_secs,
            fallback_ttl_secs: self.cache.fallback_ttl_secs,
            min_ttl_secs: self.cache.min_ttl_secs,
            max_ttl_secs: self.cache.max_ttl_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable the Redis store; without it the in-memory store is used
    /// (single-instance deployments).
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_redis_url")]
    pub url: String,

    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// How long to wait for a pooled connection before the store call
    /// fails with a connection error.
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// TTL applied when the miss path repopulates the cache; the
    /// original writer's TTL is not available at read time.
    #[serde(default = "default_ttl_secs")]
    pub fallback_ttl_secs: u64,

    #[serde(default = "default_min_ttl_secs")]
    pub min_ttl_secs: u64,

    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            fallback_ttl_secs: default_ttl_secs(),
            min_ttl_secs: default_min_ttl_secs(),
            max_ttl_secs: default_max_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Static,
    Introspection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    #[serde(default)]
    pub mode: AuthMode,

    /// RFC 7662-style endpoint consulted in introspection mode.
    #[serde(default)]
    pub introspection_url: Option<String>,

    /// Fixed token table used in static mode.
    #[serde(default)]
    pub static_tokens: Vec<StaticTokenEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticTokenEntry {
    pub token: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSettings {
    /// Endpoint queued attendance writes are forwarded to.
    #[serde(default)]
    pub sink_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FallbackSettings {
    /// Base URL of the system of record consulted on cache misses.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    16
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_min_ttl_secs() -> u64 {
    60
}

fn default_max_ttl_secs() -> u64 {
    86400
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from `path` if it exists, falling back to
/// defaults, then apply `ROLLCALL_*` environment overrides.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let mut cfg = if Path::new(path).exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) -> Result<(), ConfigError> {
    if let Ok(port) = std::env::var("ROLLCALL_SERVER_PORT") {
        cfg.server.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("ROLLCALL_SERVER_PORT: '{port}' is not a port")))?;
    }
    if let Ok(url) = std::env::var("ROLLCALL_REDIS_URL") {
        cfg.redis.enabled = true;
        cfg.redis.url = url;
    }
    if let Ok(url) = std::env::var("ROLLCALL_SYNC_SINK_URL") {
        cfg.sync.sink_url = Some(url);
    }
    if let Ok(url) = std::env::var("ROLLCALL_FALLBACK_BASE_URL") {
        cfg.fallback.base_url = Some(url);
    }
    if let Ok(url) = std::env::var("ROLLCALL_AUTH_INTROSPECTION_URL") {
        cfg.auth.mode = AuthMode::Introspection;
        cfg.auth.introspection_url = Some(url);
    }
    if let Ok(level) = std::env::var("ROLLCALL_LOG_LEVEL") {
        cfg.logging.level = level;
    }
    Ok(())
}
