//! Wellness companion recording daily check-ins

use std::sync::Arc;

use super::{AssistantKind, SlotAssistant, ToolDefinition, ToolNames};
use crate::config::WellnessConfig;
use crate::notify::Notifier;
use crate::session::Conversation;
use crate::slots::{CheckIn, CheckInEntry};
use crate::store::CheckInLog;

/// Wellness assistant over a [`CheckIn`]
pub type WellnessAssistant = SlotAssistant<CheckIn>;

const TOOLS: ToolNames = ToolNames {
    update: "update_checkin",
    complete: "save_checkin",
};

const INSTRUCTIONS: &str = "\
You are a calm, supportive wellness companion doing a short daily check-in. \
You are not a clinician: never diagnose or give medical advice, and suggest \
professional help if the user mentions a crisis.

Check in on three things, one gentle question at a time:
- mood: how they are feeling today
- energy: their energy level
- goals: one to three small, realistic things they want to do today

Whenever the user shares any of these, call update_checkin with just what \
they shared; goals are added to the list. When the check-in feels complete, \
recap it in one or two sentences and call save_checkin.";

impl SlotAssistant<CheckIn> {
    /// Create a wellness companion, optionally continuing from `previous`
    ///
    /// Completed check-ins go to `log`, unfinished ones to `drafts`.
    #[must_use]
    pub fn new(
        config: &WellnessConfig,
        log: Arc<CheckInLog>,
        drafts: Arc<CheckInLog>,
        notifier: Arc<dyn Notifier>,
        previous: Option<&CheckInEntry>,
    ) -> Self {
        let instructions = match previous {
            Some(entry) => format!("{INSTRUCTIONS}\n\n{}", continuity_text(entry)),
            None => INSTRUCTIONS.to_string(),
        };

        let conversation =
            Conversation::<CheckIn>::new(config.gate, config.topic.clone(), log, notifier)
                .with_drafts(drafts);
        Self::from_parts(
            AssistantKind::Wellness,
            instructions,
            TOOLS,
            tool_definitions(),
            "Check-in is not complete yet.",
            conversation,
        )
    }

    /// Create a wellness companion that continues from the latest logged check-in
    ///
    /// An unreadable log is logged and treated as an empty history.
    pub async fn load(
        config: &WellnessConfig,
        log: Arc<CheckInLog>,
        drafts: Arc<CheckInLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let previous = match log.latest().await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(
                    path = %config.log_path.display(),
                    error = %e,
                    "failed to read check-in history, starting without continuity"
                );
                None
            }
        };

        Self::new(config, log, drafts, notifier, previous.as_ref())
    }
}

/// Instruction text that carries the last check-in into a new conversation
#[must_use]
pub fn continuity_text(entry: &CheckInEntry) -> String {
    let mut parts = Vec::new();

    if let Some(mood) = &entry.mood {
        parts.push(format!("Mood: {mood}"));
    }
    if let Some(energy) = &entry.energy {
        parts.push(format!("Energy: {energy}"));
    }
    if !entry.goals.is_empty() {
        parts.push(format!("Goals: {}", entry.goals.join(", ")));
    }

    if parts.is_empty() {
        parts.push(format!("Summary: {}", entry.summary));
    }

    format!(
        "Previous check-in ({}):\n{}\n\nBriefly mention this when you greet the user and ask how those goals went.",
        entry.timestamp.format("%Y-%m-%d"),
        parts.join("\n")
    )
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            TOOLS.update,
            "Record check-in details the user just shared. Pass only the fields that were mentioned; goals are added to the existing list.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "mood": {
                        "type": "string",
                        "description": "How the user feels, in their words"
                    },
                    "energy": {
                        "type": "string",
                        "description": "Energy level, e.g. low, medium, high"
                    },
                    "goals": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Goals for today"
                    }
                },
                "additionalProperties": false
            }),
        ),
        ToolDefinition::function(
            TOOLS.complete,
            "Save today's check-in to the wellness log.",
            serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        ),
    ]
}
