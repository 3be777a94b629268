//! TOML configuration for the Bassline service.
//!
//! Layered the usual way: an explicit file, then the `BASSLINE_CONFIG`
//! environment variable, then `/etc/bassline/bassline.toml`, and finally the
//! compiled-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::debug_logs::{DEFAULT_PRIVILEGE_COMMAND, DEFAULT_SCRIPT_PATH};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV_VAR: &str = "BASSLINE_CONFIG";

/// Standard system location of the config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/bassline/bassline.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the Bassline process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasslineConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub debug_logs: DebugLogsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BasslineConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded bassline configuration");
        Ok(config)
    }

    /// Try `BASSLINE_CONFIG`, then the system path, then defaults.
    pub fn load_or_default() -> Self {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_layered(env_path.as_deref(), Path::new(SYSTEM_CONFIG_PATH))
    }

    fn load_layered(env_path: Option<&Path>, system_path: &Path) -> Self {
        if let Some(path) = env_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "BASSLINE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address and port for the HTTP listener.
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8000".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Debug logs
// ---------------------------------------------------------------------------

/// How the privileged log collection helper is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugLogsConfig {
    /// Privilege-escalation front end. Empty runs the script directly.
    pub privilege_command: String,
    /// Path to the helper script.
    pub script_path: PathBuf,
    /// Pass `-q` to the helper.
    pub quiet: bool,
}

impl Default for DebugLogsConfig {
    fn default() -> Self {
        Self {
            privilege_command: DEFAULT_PRIVILEGE_COMMAND.to_string(),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            quiet: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
