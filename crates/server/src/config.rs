// crates/server/src/config.rs
//! Command-line and environment configuration, resolved once at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use marketlens_db::ConnectionConfig;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default location of the local database file.
pub const DEFAULT_DB_PATH: &str = "data/marketlens.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite file on local disk.
    Local,
    /// Private in-memory database (lost on exit).
    Memory,
    /// Hosted libSQL replica over HTTP.
    Remote,
}

/// marketlens - marketing analytics dashboard API
#[derive(Parser, Debug, Clone)]
#[command(name = "marketlens", version, about, long_about = None)]
pub struct Args {
    /// Storage backend
    #[arg(long, env = "MARKETLENS_BACKEND", value_enum, default_value = "local")]
    pub backend: Backend,

    /// Database file for the local backend
    #[arg(long, env = "MARKETLENS_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Hosted replica URL (libsql:// or https://)
    #[arg(long, env = "TURSO_DATABASE_URL")]
    pub remote_url: Option<String>,

    /// Hosted replica auth token
    #[arg(long, env = "TURSO_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Create missing tables on the hosted replica at startup
    #[arg(long, env = "MARKETLENS_APPLY_SCHEMA")]
    pub apply_schema: bool,

    /// Load the demo dataset into the memory backend
    #[arg(long, env = "MARKETLENS_SEED_DEMO")]
    pub seed_demo: bool,

    /// HTTP timeout for hosted replica requests, in seconds
    #[arg(long, env = "MARKETLENS_REMOTE_TIMEOUT_SECS", default_value_t = 15)]
    pub remote_timeout_secs: u64,

    /// Bind address
    #[arg(long, env = "MARKETLENS_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port (falls back to PORT, then 3000)
    #[arg(short, long, env = "MARKETLENS_PORT")]
    pub port: Option<u16>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "MARKETLENS_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "MARKETLENS_LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    /// Backend selection for the connection adapter.
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let config = match self.backend {
            Backend::Local => ConnectionConfig::local(&self.db_path),
            Backend::Memory if self.seed_demo => ConnectionConfig::memory_seeded(),
            Backend::Memory => ConnectionConfig::memory(),
            Backend::Remote => {
                let Some(url) = self.remote_url.as_deref().filter(|u| !u.trim().is_empty()) else {
                    bail!("TURSO_DATABASE_URL (--remote-url) is required for the remote backend");
                };
                ConnectionConfig::remote(url.trim(), self.auth_token.clone())
                    .with_schema(self.apply_schema)
                    .with_remote_timeout(Duration::from_secs(self.remote_timeout_secs))
            }
        };
        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        let port = self
            .port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT);
        SocketAddr::new(self.host, port)
    }
}
