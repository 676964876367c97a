//! Error types for slotline

use thiserror::Error;

/// Result type alias for slotline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a conversation
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Record store failure (the completed record was not saved)
    #[error("store error: {0}")]
    Store(String),

    /// Notification delivery failure
    #[error("notify error: {0}")]
    Notify(String),

    /// Record was persisted but the completion notification was not delivered
    #[error("record saved but not announced on topic {topic}: {reason}")]
    NotAnnounced {
        /// Topic the notification was addressed to
        topic: String,
        /// Delivery failure reason
        reason: String,
    },

    /// Tool arguments could not be applied
    #[error("tool error: {0}")]
    Tool(String),

    /// No tool registered under this name
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Conversation session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the completed record reached the store before this error
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::NotAnnounced { .. })
    }
}
