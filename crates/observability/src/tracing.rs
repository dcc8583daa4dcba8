//! Tracing/logging initialization.
//!
//! `VOTEBASIS_LOG` takes an `EnvFilter` directive (falls back to `RUST_LOG`,
//! then `info`); `VOTEBASIS_LOG_FORMAT` selects `json` (default) or `pretty`.

use std::str::FromStr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

const LOG: &str = "VOTEBASIS_LOG";
const LOG_FORMAT: &str = "VOTEBASIS_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => anyhow::bail!("unknown log format '{other}', expected json or pretty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(filter) = lookup(LOG).or_else(|| lookup("RUST_LOG")) {
            EnvFilter::try_new(&filter)
                .with_context(|| format!("invalid log filter '{filter}'"))?;
            config.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT) {
            config.format = format
                .parse()
                .with_context(|| format!("reading {LOG_FORMAT}"))?;
        }

        Ok(config)
    }
}

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };
}
