//! CLI argument definitions for the pensionbot server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use pensionbot_core::config::PensionbotConfig;

/// pensionbot - HTTP front end for the pension grievance chatbot worker.
#[derive(Parser, Debug, Default)]
#[command(name = "pensionbot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Interface to bind the API server on.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Executable used to run both workers.
    #[arg(long = "worker-program")]
    pub worker_program: Option<String>,

    /// Script handed to the chat worker program.
    #[arg(long = "worker-script")]
    pub worker_script: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PENSIONBOT_CONFIG env var > ~/.pensionbot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PENSIONBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > PENSIONBOT_PORT env var > config file value > 5000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.port
            .or_else(|| port_from_env(std::env::var("PENSIONBOT_PORT").ok()))
            .unwrap_or(if config_port != 0 { config_port } else { 5000 })
    }

    /// Fold every override into `config`.
    pub fn apply(&self, config: &mut PensionbotConfig) {
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref program) = self.worker_program {
            config.worker.program = program.clone();
            config.direct_worker.program = program.clone();
        }
        if let Some(ref script) = self.worker_script {
            config.worker.args = vec![script.clone()];
        }
    }
}

fn port_from_env(value: Option<String>) -> Option<u16> {
    value.and_then(|v| v.parse::<u16>().ok())
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".pensionbot").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".pensionbot").join("config.toml");
    }
    PathBuf::from("config.toml")
}
