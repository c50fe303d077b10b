//! # Config - service configuration
//!
//! A plain `key=value` text file:
//!
//! ```text
//! # queries are only answered during working hours
//! start_time = 08:00
//! end_time   = 18:30
//!
//! data_dir       = data
//! listen_addr    = 0.0.0.0:8080
//! snapshot_every = 0
//! ```
//!
//! Keys and values are trimmed. Blank lines, `#` comments and lines without
//! `=` are skipped; unknown keys are ignored. `start_time` and `end_time` are
//! required, everything else has a default.

mod window;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use thiserror::Error;

pub use window::AccessWindow;

/// Default data directory (record log + snapshot).
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
/// Layout of `start_time` / `end_time`.
pub const TIME_FORMAT: &str = "%H:%M";

/// Errors from reading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config line {line}: {reason}")]
    Invalid { line: usize, reason: String },

    #[error("missing required config key '{0}'")]
    Missing(&'static str),
}

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Time-of-day window during which queries are served.
    pub access: AccessWindow,
    /// Directory holding the record log and the index snapshot.
    pub data_dir: PathBuf,
    pub listen_addr: SocketAddr,
    /// Save the index snapshot after this many ingests (0 = only on shutdown).
    pub snapshot_every: usize,
}

impl Config {
    /// Reads and parses the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut start = None;
        let mut end = None;
        let mut data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        let mut listen_addr = None;
        let mut snapshot_every = 0usize;

        for (i, raw) in text.lines().enumerate() {
            let line_num = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            let invalid = |reason: String| ConfigError::Invalid {
                line: line_num,
                reason,
            };

            match key {
                "start_time" => start = Some(parse_time(value).map_err(invalid)?),
                "end_time" => end = Some(parse_time(value).map_err(invalid)?),
                "data_dir" => {
                    if value.is_empty() {
                        return Err(invalid("data_dir must not be empty".to_string()));
                    }
                    data_dir = PathBuf::from(value);
                }
                "listen_addr" => {
                    listen_addr = Some(value.parse::<SocketAddr>().map_err(|e| {
                        invalid(format!("invalid listen_addr '{}': {}", value, e))
                    })?)
                }
                "snapshot_every" => {
                    snapshot_every = value.parse().map_err(|e| {
                        invalid(format!("invalid snapshot_every '{}': {}", value, e))
                    })?
                }
                other => {
                    tracing::debug!(key = other, line = line_num, "ignoring unknown config key")
                }
            }
        }

        let start = start.ok_or(ConfigError::Missing("start_time"))?;
        let end = end.ok_or(ConfigError::Missing("end_time"))?;
        let listen_addr = match listen_addr {
            Some(addr) => addr,
            None => default_listen_addr(),
        };

        Ok(Self {
            access: AccessWindow::new(start, end),
            data_dir,
            listen_addr,
            snapshot_every,
        })
    }
}

/// [`DEFAULT_LISTEN_ADDR`] as a socket address.
pub fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| format!("invalid time '{}' (expected HH:MM): {}", value, e))
}
