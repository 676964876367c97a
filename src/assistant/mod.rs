//! Conversational assistants and their tool interface
//!
//! Each assistant exposes two tools to the conversation driver: one that
//! merges partial fields into the form and one that completes it. Tools are
//! dispatched by registered name through [`Assistant::execute`].

mod barista;
mod slot;
mod wellness;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::notify::Notifier;
use crate::session::Disposition;
use crate::store::{CheckInLog, OrderFile};
use crate::{Error, Result};

pub use barista::BaristaAssistant;
pub use slot::SlotAssistant;
pub use wellness::{WellnessAssistant, continuity_text};

/// Which assistant drives a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantKind {
    /// Coffee barista taking a drink order
    Barista,
    /// Wellness companion recording a daily check-in
    Wellness,
}

impl AssistantKind {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Barista => "barista",
            Self::Wellness => "wellness",
        }
    }
}

impl std::fmt::Display for AssistantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssistantKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "barista" | "coffee" => Ok(Self::Barista),
            "wellness" | "checkin" => Ok(Self::Wellness),
            other => Err(format!("unknown assistant: {other}")),
        }
    }
}

/// Function tool offered to the conversation driver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Name, description, and JSON-schema parameters of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolDefinition {
    /// Build a `function` tool definition
    #[must_use]
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: Some(description.to_string()),
                parameters: Some(parameters),
            },
        }
    }
}

/// Registered names of an assistant's two tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolNames {
    /// Merges partial fields into the form
    pub update: &'static str,
    /// Persists, announces, and resets the form
    pub complete: &'static str,
}

/// A conversational assistant backed by one slot form
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Which assistant this is
    fn kind(&self) -> AssistantKind;

    /// System instructions for the language model
    fn instructions(&self) -> &str;

    /// Registered tool names
    fn tool_names(&self) -> ToolNames;

    /// Tool definitions to offer the language model
    fn tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Current form as JSON
    ///
    /// # Errors
    ///
    /// Returns error if the form cannot be serialized
    fn snapshot(&self) -> Result<Value>;

    /// Required fields the completion gate is still waiting for
    fn missing(&self) -> Vec<&'static str>;

    /// Whether a saved record is still waiting to be announced
    fn has_pending_announcement(&self) -> bool;

    /// Merge tool arguments into the form and return the new form
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if the arguments are not a valid partial update
    fn apply_update(&mut self, arguments: Value) -> Result<Value>;

    /// Try to complete the form
    ///
    /// An incomplete form yields `{"error": ..., "missing": [...]}` rather
    /// than an error.
    ///
    /// # Errors
    ///
    /// Returns error if persisting or announcing fails
    async fn complete(&mut self) -> Result<Value>;

    /// Redeliver a pending announcement
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnnounced`] if delivery fails again
    async fn retry_announcement(&mut self) -> Result<bool>;

    /// End the conversation, discarding or persisting the partial form
    ///
    /// # Errors
    ///
    /// Returns error if persisting the partial form fails
    async fn end(&mut self, disposition: Disposition) -> Result<Option<Value>>;

    /// Execute a named tool with raw JSON arguments
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTool`] if `name` is not one of this assistant's tools
    /// - [`Error::Tool`] if the arguments are malformed
    /// - completion failures are propagated
    async fn execute(&mut self, name: &str, arguments: &str) -> Result<String> {
        let tools = self.tool_names();
        let result = if name == tools.update {
            let arguments = parse_arguments(name, arguments)?;
            self.apply_update(arguments)?
        } else if name == tools.complete {
            self.complete().await?
        } else {
            return Err(Error::UnknownTool(format!("{}/{name}", self.kind())));
        };

        Ok(serde_json::to_string(&result)?)
    }
}

/// Parse raw tool arguments, treating an empty payload as no fields
fn parse_arguments(tool: &str, arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(arguments)
        .map_err(|e| Error::Tool(format!("{tool}: invalid arguments: {e}")))
}

/// Shared record stores and notifier that new assistants are wired to
///
/// Stores are shared across sessions so that writers to one file serialize.
#[derive(Clone)]
pub struct AssistantFactory {
    config: Arc<Config>,
    orders: Arc<OrderFile>,
    order_drafts: Arc<OrderFile>,
    checkins: Arc<CheckInLog>,
    checkin_drafts: Arc<CheckInLog>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AssistantFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantFactory")
            .field("orders", &self.orders)
            .field("order_drafts", &self.order_drafts)
            .field("checkins", &self.checkins)
            .field("checkin_drafts", &self.checkin_drafts)
            .field("notifier", &self.notifier.name())
            .finish_non_exhaustive()
    }
}

impl AssistantFactory {
    /// Create a factory with stores at the configured paths
    #[must_use]
    pub fn new(config: Arc<Config>, notifier: Arc<dyn Notifier>) -> Self {
        let orders = Arc::new(OrderFile::new(&config.barista.order_path));
        let order_drafts = Arc::new(OrderFile::new(&config.barista.draft_path));
        let checkins = Arc::new(CheckInLog::new(&config.wellness.log_path));
        let checkin_drafts = Arc::new(CheckInLog::new(&config.wellness.draft_path));
        Self {
            config,
            orders,
            order_drafts,
            checkins,
            checkin_drafts,
            notifier,
        }
    }

    /// Latest-order store
    #[must_use]
    pub fn orders(&self) -> &OrderFile {
        &self.orders
    }

    /// Last unfinished order kept by an early end
    #[must_use]
    pub fn order_drafts(&self) -> &OrderFile {
        &self.order_drafts
    }

    /// Check-in history store
    #[must_use]
    pub fn checkins(&self) -> &CheckInLog {
        &self.checkins
    }

    /// Unfinished check-ins kept by an early end
    #[must_use]
    pub fn checkin_drafts(&self) -> &CheckInLog {
        &self.checkin_drafts
    }

    /// Build a fresh assistant of `kind`
    ///
    /// The wellness companion reads the last check-in for its instructions.
    pub async fn create(&self, kind: AssistantKind) -> Box<dyn Assistant> {
        match kind {
            AssistantKind::Barista => Box::new(BaristaAssistant::new(
                &self.config.barista,
                self.orders.clone(),
                self.order_drafts.clone(),
                self.notifier.clone(),
            )),
            AssistantKind::Wellness => Box::new(
                WellnessAssistant::load(
                    &self.config.wellness,
                    self.checkins.clone(),
                    self.checkin_drafts.clone(),
                    self.notifier.clone(),
                )
                .await,
            ),
        }
    }
}
