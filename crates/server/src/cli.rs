//! Command-line arguments for the `speedcam` binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use config::Config;

use crate::logging::Verbosity;

/// Speed-camera reading store: HTTP ingest and per-date queries.
#[derive(Debug, Parser)]
#[command(name = "speedcam", version)]
pub struct Args {
    /// Configuration file (key=value lines)
    #[arg(short, long, env = "SPEEDCAM_CONFIG", default_value = "config.txt")]
    pub config: PathBuf,

    /// Data directory override
    #[arg(short, long, env = "SPEEDCAM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Listen address override, e.g. 127.0.0.1:8080
    #[arg(short, long, env = "SPEEDCAM_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Save the date index every N ingests (0 = only on shutdown)
    #[arg(long, env = "SPEEDCAM_SNAPSHOT_EVERY")]
    pub snapshot_every: Option<usize>,

    /// More logging; repeat for trace output
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Applies command-line and environment overrides on top of the file.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(addr) = self.listen {
            cfg.listen_addr = addr;
        }
        if let Some(every) = self.snapshot_every {
            cfg.snapshot_every = every;
        }
    }
}
