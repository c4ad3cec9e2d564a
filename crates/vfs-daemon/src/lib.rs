// VFS Daemon
//
// This crate hosts the shared file system console behind a Unix socket
// speaking line-delimited JSON, or drives it directly from stdin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vfs_core::FsConfig;

pub mod server;
pub mod stdin;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the Unix socket for listening
    #[arg(long, default_value = "/tmp/vfs/vfsd.sock")]
    pub socket_path: PathBuf,

    /// Run in stdin mode (read command lines from stdin instead of socket)
    #[arg(long)]
    pub stdin_mode: bool,

    /// User the stdin session is authorized as
    #[arg(long, default_value = "local")]
    pub user: String,

    /// JSON file with volume and notification settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn level(&self) -> tracing::Level {
        match self.log_level.as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }

    /// Loads `--config` if given, otherwise the defaults.
    pub fn load_config(&self) -> Result<FsConfig> {
        match &self.config {
            Some(path) => FsConfig::from_json_file(path)
                .with_context(|| format!("loading config from {}", path.display())),
            None => Ok(FsConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let args = Args::try_parse_from(["vfsd", "--log-level", "chatty"]).unwrap();
        assert_eq!(args.level(), tracing::Level::INFO);

        let args = Args::try_parse_from(["vfsd", "--log-level", "trace"]).unwrap();
        assert_eq!(args.level(), tracing::Level::TRACE);
    }
}
