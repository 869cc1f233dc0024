/// Configuration management for Post Service
///
/// Everything is loaded from environment variables (optionally seeded from a
/// `.env` file by the binary). Unset variables take defaults; variables that
/// are set but malformed are rejected.
use db_pool::env_utils::{env_optional, env_or, parse_env_or};
use db_pool::DbConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const SERVICE_NAME: &str = "post-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database pool configuration (shared db-pool library)
    pub database: DbConfig,
    /// Apply bundled migrations at startup
    pub run_migrations: bool,
    /// Cache (Redis) configuration
    pub cache: CacheConfig,
    /// Search index (Elasticsearch) configuration
    pub search: SearchConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Overall deadline for a single request
    pub request_timeout_ms: u64,
    pub log_format: LogFormat,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL
    pub url: String,
    /// Lifetime of a cached post snapshot
    pub ttl_secs: u64,
    /// Upper bound for a single Redis command
    pub op_timeout_ms: u64,
}

/// Search index (Elasticsearch) configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub url: String,
    pub post_index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: u64,
    /// Maximum number of related posts returned with a post
    pub related_limit: usize,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("url", &self.url)
            .field("post_index", &self.post_index)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_ms", &self.timeout_ms)
            .field("related_limit", &self.related_limit)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::load().map_err(AppError::Config)
    }

    fn load() -> std::result::Result<Self, String> {
        let env = env_or("APP_ENV", "development");
        let default_log_format = if is_production_env(&env) {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        let app = AppConfig {
            env,
            host: env_or("POST_SERVICE_HOST", "0.0.0.0"),
            port: parse_env_or("POST_SERVICE_PORT", 8080)?,
            request_timeout_ms: parse_env_or("REQUEST_TIMEOUT_MS", 10_000)?,
            log_format: parse_env_or("LOG_FORMAT", default_log_format)?,
        };

        let cache = CacheConfig {
            url: env_or("REDIS_URL", "redis://localhost:6379"),
            ttl_secs: parse_env_or("CACHE_TTL_SECONDS", 300)?,
            op_timeout_ms: parse_env_or("CACHE_OP_TIMEOUT_MS", 200)?,
        };
        if cache.ttl_secs == 0 {
            return Err("CACHE_TTL_SECONDS must be greater than zero".to_string());
        }

        let search = SearchConfig {
            url: env_or("ELASTICSEARCH_URL", "http://localhost:9200"),
            post_index: env_or("ELASTICSEARCH_POST_INDEX", "posts"),
            username: env_optional("ELASTICSEARCH_USERNAME"),
            password: env_optional("ELASTICSEARCH_PASSWORD"),
            timeout_ms: parse_env_or("ELASTICSEARCH_TIMEOUT_MS", 2_000)?,
            related_limit: parse_env_or("RELATED_POSTS_LIMIT", 5)?,
        };
        if search.username.is_some() != search.password.is_some() {
            return Err(
                "ELASTICSEARCH_USERNAME and ELASTICSEARCH_PASSWORD must be set together"
                    .to_string(),
            );
        }

        Ok(Config {
            app,
            database: DbConfig::from_env(SERVICE_NAME)?,
            run_migrations: parse_env_or("DB_RUN_MIGRATIONS", true)?,
            cache,
            search,
        })
    }

    pub fn is_production(&self) -> bool {
        is_production_env(&self.app.env)
    }
}

fn is_production_env(env: &str) -> bool {
    env.eq_ignore_ascii_case("production")
}
