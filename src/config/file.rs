//! TOML configuration file loading
//!
//! Supports `~/.config/slotline/config.toml` as a persistent config source.
//! All fields are optional. The file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SlotlineConfigFile {
    /// Data directory override
    pub data_dir: Option<String>,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Coffee barista assistant
    #[serde(default)]
    pub barista: AssistantFileConfig,

    /// Wellness check-in assistant
    #[serde(default)]
    pub wellness: AssistantFileConfig,

    /// Completion notification delivery
    #[serde(default)]
    pub notify: NotifyFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,
}

/// Per-assistant settings
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Record file (order file for the barista, log for wellness)
    pub path: Option<String>,

    /// Partial forms kept when a conversation ends early
    pub draft_path: Option<String>,

    /// Notification topic
    pub topic: Option<String>,

    /// Completion gate ("required" or "trusted")
    pub gate: Option<String>,
}

/// Notification configuration
#[derive(Debug, Default, Deserialize)]
pub struct NotifyFileConfig {
    /// Deliver notifications by HTTP POST instead of to WebSocket observers
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SlotlineConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SlotlineConfigFile {
    config_file_path().map_or_else(SlotlineConfigFile::default, |path| load_from(&path))
}

/// Load a config file from an explicit path, falling back to defaults
pub fn load_from(path: &Path) -> SlotlineConfigFile {
    if !path.exists() {
        return SlotlineConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SlotlineConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SlotlineConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/slotline/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("slotline").join("config.toml"))
}
