//! CLI argument definitions for the chatrelay server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use chatrelay_core::config::RelayConfig;

/// chatrelay - relays chat turns to a hosted model and audio to a transcription service.
#[derive(Parser, Debug)]
#[command(name = "chatrelay", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind the API server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// SQLite database file for conversation history.
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CHATRELAY_CONFIG env var > ~/.chatrelay/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CHATRELAY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overlay the flags that were given onto `config`.
    ///
    /// Call after environment overrides so flags win.
    pub fn apply_to(&self, config: &mut RelayConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref db) = self.database {
            config.storage.database_path = db.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.server.log_level = level.clone();
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    PathBuf::from(home.unwrap_or_else(|_| ".".to_string()))
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    home_dir().join(".chatrelay").join("config.toml")
}
