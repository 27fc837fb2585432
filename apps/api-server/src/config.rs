//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use board_infra::LocalStoreConfig;

#[cfg(feature = "postgres")]
use board_infra::DatabaseConfig;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SWEEP_GRACE_SECS: i64 = 3600;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on in-memory repositories.
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    /// Apply pending migrations on startup.
    #[cfg(feature = "postgres")]
    pub auto_migrate: bool,
    pub storage: LocalStoreConfig,
    /// Per-file upload limit.
    pub max_upload_bytes: usize,
    pub orphan_sweep: OrphanSweepConfig,
}

/// Schedule for the orphaned blob sweep.
#[derive(Debug, Clone)]
pub struct OrphanSweepConfig {
    /// Cron expression (with seconds). No sweep runs when unset.
    pub cron: Option<String>,
    /// Blobs younger than this are never swept.
    pub grace: chrono::Duration,
}

impl Default for OrphanSweepConfig {
    fn default() -> Self {
        Self {
            cron: None,
            grace: chrono::Duration::seconds(DEFAULT_SWEEP_GRACE_SECS),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        #[cfg(feature = "postgres")]
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout: std::time::Duration::from_secs(parse_or("DB_CONNECT_TIMEOUT_SECS", 10)),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            #[cfg(feature = "postgres")]
            database,
            #[cfg(feature = "postgres")]
            auto_migrate: env::var("DB_AUTO_MIGRATE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            storage: LocalStoreConfig::from_env(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            orphan_sweep: OrphanSweepConfig {
                cron: env::var("ORPHAN_SWEEP_CRON")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                grace: chrono::Duration::seconds(parse_or(
                    "ORPHAN_SWEEP_GRACE_SECS",
                    DEFAULT_SWEEP_GRACE_SECS,
                )),
            },
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
