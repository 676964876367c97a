//! Slot state for the conversational assistants
//!
//! A slot form is the structured record one conversation fills in. Updates
//! arrive as partial field sets in any order; scalar fields are overwritten,
//! sequence fields are append-extended. Completeness is a pure predicate over
//! the form, optionally relaxed per assistant through a [`CompletionGate`].

mod coffee;
mod wellness;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::notify::Notification;

pub use coffee::{CoffeeOrder, OrderUpdate};
pub use wellness::{CheckIn, CheckInEntry, CheckInUpdate};

/// A structured record filled in over one conversation
pub trait SlotForm: Clone + Default + Serialize + Send + Sync + 'static {
    /// Partial field set accepted by [`SlotForm::apply_update`]
    type Update: DeserializeOwned + Send;

    /// Snapshot written to the record store on completion
    type Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Merge a partial update into the form
    ///
    /// Fields absent from `update` are left untouched.
    fn apply_update(&mut self, update: Self::Update);

    /// Names of required fields that are still unset, in declaration order
    fn missing_fields(&self) -> Vec<&'static str>;

    /// Whether every required field is set
    fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Copy the form into a persistable record
    fn to_record(&self, at: DateTime<Utc>) -> Self::Record;

    /// Build the completion notification for a persisted record
    fn notification(record: &Self::Record) -> Notification;
}

/// How strictly an assistant checks the form before saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionGate {
    /// Every required field must be set
    #[default]
    Required,
    /// The conversation driver decides when the form is done
    Trusted,
}

impl CompletionGate {
    /// Required fields this gate still waits for
    #[must_use]
    pub fn missing<F: SlotForm>(self, form: &F) -> Vec<&'static str> {
        match self {
            Self::Required => form.missing_fields(),
            Self::Trusted => Vec::new(),
        }
    }

    /// Parse a gate from its config string
    #[must_use]
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "required" | "strict" => Some(Self::Required),
            "trusted" | "none" => Some(Self::Trusted),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompletionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Trusted => write!(f, "trusted"),
        }
    }
}

/// Overwrite a scalar slot when the update carries a non-empty value
fn merge_scalar(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

/// Append every provided item to a sequence slot
fn extend_sequence(slot: &mut Vec<String>, values: Option<Vec<String>>) {
    if let Some(values) = values {
        slot.extend(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_scalar_ignores_empty_values() {
        let mut slot = Some("latte".to_string());
        merge_scalar(&mut slot, Some("   ".to_string()));
        merge_scalar(&mut slot, None);
        assert_eq!(slot.as_deref(), Some("latte"));

        merge_scalar(&mut slot, Some("mocha".to_string()));
        assert_eq!(slot.as_deref(), Some("mocha"));
    }

    #[test]
    fn extend_sequence_keeps_duplicates_in_order() {
        let mut slot = vec!["ice".to_string()];
        extend_sequence(&mut slot, Some(vec!["caramel".to_string(), "ice".to_string()]));
        extend_sequence(&mut slot, None);
        assert_eq!(slot, ["ice", "caramel", "ice"]);
    }

    #[test]
    fn gate_parses_config_values() {
        assert_eq!(CompletionGate::from_str_value("required"), Some(CompletionGate::Required));
        assert_eq!(CompletionGate::from_str_value(" Trusted "), Some(CompletionGate::Trusted));
        assert_eq!(CompletionGate::from_str_value("maybe"), None);
        assert_eq!(CompletionGate::Trusted.to_string(), "trusted");
    }

    #[test]
    fn trusted_gate_waits_for_nothing() {
        let order = CoffeeOrder::default();
        assert_eq!(CompletionGate::Required.missing(&order).len(), 4);
        assert!(CompletionGate::Trusted.missing(&order).is_empty());
    }
}
