//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub address: SocketAddr,
    /// File-backed store directory; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub max_body_size: usize,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_filter: "info".into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> anyhow::Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(addr) = get("ADDRESS") {
            cfg.address = addr
                .trim()
                .parse()
                .with_context(|| format!("ADDRESS is not a socket address: {addr:?}"))?;
        }
        cfg.data_dir = get("NUTRIGPT_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);
        if let Some(size) = get("MAX_HTTP_BODY_SIZE") {
            cfg.max_body_size = size
                .trim()
                .parse()
                .with_context(|| format!("MAX_HTTP_BODY_SIZE must be a byte count, got {size:?}"))?;
        }
        if let Some(secs) = get("NUTRIGPT_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().with_context(|| {
                format!("NUTRIGPT_REQUEST_TIMEOUT_SECS must be a number of seconds, got {secs:?}")
            })?;
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(filter) = get("NUTRIGPT_LOG_LEVEL").or_else(|| get("RUST_LOG")) {
            cfg.log_filter = filter;
        }
        Ok(cfg)
    }
}

/// Build the log filter, falling back to `info` when the directives don't parse.
pub fn env_filter(directives: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_new(directives)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}
