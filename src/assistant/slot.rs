//! Assistant implementation shared by every slot form

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Assistant, AssistantKind, ToolDefinition, ToolNames};
use crate::session::{Completion, Conversation, Disposition};
use crate::slots::SlotForm;
use crate::{Error, Result};

/// Assistant that drives one [`Conversation`] through its two tools
pub struct SlotAssistant<F: SlotForm> {
    kind: AssistantKind,
    instructions: String,
    tools: ToolNames,
    definitions: Vec<ToolDefinition>,
    incomplete_message: &'static str,
    conversation: Conversation<F>,
}

impl<F: SlotForm> std::fmt::Debug for SlotAssistant<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotAssistant")
            .field("kind", &self.kind)
            .field("tools", &self.tools)
            .field("conversation", &self.conversation)
            .finish_non_exhaustive()
    }
}

impl<F: SlotForm> SlotAssistant<F> {
    pub(super) fn from_parts(
        kind: AssistantKind,
        instructions: String,
        tools: ToolNames,
        definitions: Vec<ToolDefinition>,
        incomplete_message: &'static str,
        conversation: Conversation<F>,
    ) -> Self {
        Self {
            kind,
            instructions,
            tools,
            definitions,
            incomplete_message,
            conversation,
        }
    }

    /// Underlying conversation state
    #[must_use]
    pub const fn conversation(&self) -> &Conversation<F> {
        &self.conversation
    }
}

#[async_trait]
impl<F: SlotForm> Assistant for SlotAssistant<F> {
    fn kind(&self) -> AssistantKind {
        self.kind
    }

    fn instructions(&self) -> &str {
        &self.instructions
    }

    fn tool_names(&self) -> ToolNames {
        self.tools
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    fn snapshot(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.conversation.form())?)
    }

    fn missing(&self) -> Vec<&'static str> {
        self.conversation.missing()
    }

    fn has_pending_announcement(&self) -> bool {
        self.conversation.has_pending_announcement()
    }

    fn apply_update(&mut self, arguments: Value) -> Result<Value> {
        let update: F::Update = serde_json::from_value(arguments)
            .map_err(|e| Error::Tool(format!("{}: invalid arguments: {e}", self.tools.update)))?;

        let form = serde_json::to_value(self.conversation.apply_update(update))?;
        tracing::debug!(
            assistant = %self.kind,
            missing = ?self.conversation.missing(),
            "form updated"
        );
        Ok(form)
    }

    async fn complete(&mut self) -> Result<Value> {
        match self.conversation.complete().await? {
            Completion::Incomplete { missing } => Ok(json!({
                "error": self.incomplete_message,
                "missing": missing,
            })),
            Completion::Completed { record } => Ok(serde_json::to_value(record)?),
        }
    }

    async fn retry_announcement(&mut self) -> Result<bool> {
        self.conversation.retry_announcement().await
    }

    async fn end(&mut self, disposition: Disposition) -> Result<Option<Value>> {
        let record = self.conversation.end(disposition).await?;
        Ok(record.map(serde_json::to_value).transpose()?)
    }
}
