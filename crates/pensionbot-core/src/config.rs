use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PensionbotError, Result};

/// Top-level configuration for the pensionbot service.
///
/// Loaded from `~/.pensionbot/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PensionbotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub direct_worker: DirectWorkerConfig,
}

impl PensionbotConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PensionbotConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values that cannot describe a working setup.
    pub fn validate(&self) -> Result<()> {
        if self.worker.max_concurrent == Some(0) {
            return Err(PensionbotError::Config(
                "worker.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.worker.timeout_secs == Some(0) {
            return Err(PensionbotError::Config(
                "worker.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PensionbotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// The chat worker invoked once per facade call.
///
/// The process is started as `program args... <call arguments>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Executable to launch.
    pub program: String,
    /// Leading arguments, usually the worker script path.
    pub args: Vec<String>,
    /// Abort an invocation after this many seconds. Unset means no limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Maximum number of worker processes alive at once. Unset means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["python/groq_chatbot.py".to_string()],
            timeout_secs: None,
            max_concurrent: None,
        }
    }
}

/// The worker behind the direct `POST /api/chatbot/` route.
///
/// It receives a single JSON payload argument instead of positional fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectWorkerConfig {
    /// Executable to launch.
    pub program: String,
    /// Leading arguments, usually the worker script path.
    pub args: Vec<String>,
}

impl Default for DirectWorkerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["python/chatbot_service.py".to_string()],
        }
    }
}
