//! Configuration for slotline
//!
//! Layering is env > `config.toml` > defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::slots::CompletionGate;
use crate::{Error, Result};

/// Default API server port
pub const DEFAULT_PORT: u16 = 18820;

/// Default barista notification topic
pub const ORDER_TOPIC: &str = "order_complete";

/// Default wellness notification topic
pub const WELLNESS_TOPIC: &str = "wellness_update";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root for persisted records
    pub data_dir: PathBuf,

    /// API server settings
    pub api_server: ApiServerConfig,

    /// Coffee barista settings
    pub barista: BaristaConfig,

    /// Wellness companion settings
    pub wellness: WellnessConfig,

    /// Notification delivery settings
    pub notify: NotifyConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Coffee barista configuration
#[derive(Debug, Clone)]
pub struct BaristaConfig {
    /// Latest-order file
    pub order_path: PathBuf,
    /// Last order left unfinished
    pub draft_path: PathBuf,
    /// Topic for `order_complete` notifications
    pub topic: String,
    /// Completion gate
    pub gate: CompletionGate,
}

/// Wellness companion configuration
#[derive(Debug, Clone)]
pub struct WellnessConfig {
    /// Check-in history file
    pub log_path: PathBuf,
    /// Check-ins left unfinished
    pub draft_path: PathBuf,
    /// Topic for `wellness_update` notifications
    pub topic: String,
    /// Completion gate
    pub gate: CompletionGate,
}

/// Notification configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Webhook target; `None` delivers to WebSocket observers
    pub webhook_url: Option<String>,
    /// Webhook request timeout
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a completion gate or port is not recognised
    pub fn from_sources(
        fc: file::SlotlineConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Data directory (~/.local/share/slotline on Linux)
        let data_dir = env("SLOTLINE_DATA_DIR")
            .or(fc.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        let port = match env("SLOTLINE_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid SLOTLINE_PORT: {raw}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };

        let barista = BaristaConfig {
            order_path: env("SLOTLINE_ORDER_PATH")
                .or(fc.barista.path)
                .map_or_else(
                    || data_dir.join("orders").join("latest_order.json"),
                    PathBuf::from,
                ),
            draft_path: env("SLOTLINE_ORDER_DRAFT_PATH")
                .or(fc.barista.draft_path)
                .map_or_else(
                    || data_dir.join("orders").join("draft_order.json"),
                    PathBuf::from,
                ),
            topic: fc.barista.topic.unwrap_or_else(|| ORDER_TOPIC.to_string()),
            gate: parse_gate(
                "barista",
                env("SLOTLINE_BARISTA_GATE").or(fc.barista.gate),
                CompletionGate::Required,
            )?,
        };

        let wellness = WellnessConfig {
            log_path: env("SLOTLINE_WELLNESS_LOG")
                .or(fc.wellness.path)
                .map_or_else(|| data_dir.join("wellness_log.json"), PathBuf::from),
            draft_path: env("SLOTLINE_WELLNESS_DRAFTS")
                .or(fc.wellness.draft_path)
                .map_or_else(|| data_dir.join("wellness_drafts.json"), PathBuf::from),
            topic: fc
                .wellness
                .topic
                .unwrap_or_else(|| WELLNESS_TOPIC.to_string()),
            gate: parse_gate(
                "wellness",
                env("SLOTLINE_WELLNESS_GATE").or(fc.wellness.gate),
                CompletionGate::Trusted,
            )?,
        };

        let notify = NotifyConfig {
            webhook_url: env("SLOTLINE_WEBHOOK_URL")
                .or(fc.notify.webhook_url)
                .filter(|url| !url.trim().is_empty()),
            timeout: Duration::from_secs(
                env("SLOTLINE_WEBHOOK_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .or(fc.notify.timeout_secs)
                    .unwrap_or(10),
            ),
        };

        Ok(Self {
            data_dir,
            api_server: ApiServerConfig { port },
            barista,
            wellness,
            notify,
        })
    }

    /// Configuration rooted at `data_dir` with every other setting at its default
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            api_server: ApiServerConfig { port: DEFAULT_PORT },
            barista: BaristaConfig {
                order_path: data_dir.join("orders").join("latest_order.json"),
                draft_path: data_dir.join("orders").join("draft_order.json"),
                topic: ORDER_TOPIC.to_string(),
                gate: CompletionGate::Required,
            },
            wellness: WellnessConfig {
                log_path: data_dir.join("wellness_log.json"),
                draft_path: data_dir.join("wellness_drafts.json"),
                topic: WELLNESS_TOPIC.to_string(),
                gate: CompletionGate::Trusted,
            },
            notify: NotifyConfig {
                webhook_url: None,
                timeout: Duration::from_secs(10),
            },
            data_dir,
        }
    }
}

fn parse_gate(
    assistant: &str,
    raw: Option<String>,
    default: CompletionGate,
) -> Result<CompletionGate> {
    match raw {
        None => Ok(default),
        Some(raw) => CompletionGate::from_str_value(&raw).ok_or_else(|| {
            Error::Config(format!(
                "invalid {assistant} completion gate {raw:?} (expected required or trusted)"
            ))
        }),
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/slotline"),
        |d| d.data_dir().join("slotline"),
    )
}
