//! Daily wellness check-in form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SlotForm, extend_sequence, merge_scalar};
use crate::notify::Notification;

/// A wellness check-in in progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    /// How the user says they feel
    pub mood: Option<String>,
    /// Self-reported energy level
    pub energy: Option<String>,
    /// Goals for the day, in the order they were mentioned
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Partial check-in supplied by `update_checkin`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckInUpdate {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub energy: Option<String>,
    #[serde(default)]
    pub goals: Option<Vec<String>>,
}

/// One entry of the persisted wellness log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInEntry {
    /// When the check-in was saved
    pub timestamp: DateTime<Utc>,
    pub mood: Option<String>,
    pub energy: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    /// Human-readable recap of the check-in
    pub summary: String,
}

impl CheckIn {
    /// One or two sentence recap of the check-in
    #[must_use]
    pub fn summarize(&self) -> String {
        let mut sentences = Vec::new();

        match (&self.mood, &self.energy) {
            (Some(mood), Some(energy)) => {
                sentences.push(format!("Feeling {mood} with {energy} energy."));
            }
            (Some(mood), None) => sentences.push(format!("Feeling {mood}.")),
            (None, Some(energy)) => sentences.push(format!("Energy is {energy}.")),
            (None, None) => {}
        }

        if !self.goals.is_empty() {
            sentences.push(format!("Goals: {}.", self.goals.join(", ")));
        }

        if sentences.is_empty() {
            "No details shared.".to_string()
        } else {
            sentences.join(" ")
        }
    }
}

impl SlotForm for CheckIn {
    type Update = CheckInUpdate;
    type Record = CheckInEntry;

    fn apply_update(&mut self, update: CheckInUpdate) {
        merge_scalar(&mut self.mood, update.mood);
        merge_scalar(&mut self.energy, update.energy);
        extend_sequence(&mut self.goals, update.goals);
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.mood.is_none() {
            missing.push("mood");
        }
        if self.energy.is_none() {
            missing.push("energy");
        }
        if self.goals.is_empty() {
            missing.push("goals");
        }
        missing
    }

    fn to_record(&self, at: DateTime<Utc>) -> CheckInEntry {
        CheckInEntry {
            timestamp: at,
            mood: self.mood.clone(),
            energy: self.energy.clone(),
            goals: self.goals.clone(),
            summary: self.summarize(),
        }
    }

    fn notification(record: &CheckInEntry) -> Notification {
        Notification::WellnessUpdate {
            data: record.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in(mood: Option<&str>, energy: Option<&str>, goals: &[&str]) -> CheckIn {
        CheckIn {
            mood: mood.map(ToString::to_string),
            energy: energy.map(ToString::to_string),
            goals: goals.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn goals_append_and_scalars_overwrite() {
        let mut form = CheckIn::default();
        form.apply_update(serde_json::from_str(r#"{"mood":"ok","goals":["stretch"]}"#).unwrap());
        form.apply_update(serde_json::from_str(r#"{"mood":"tired","goals":["drink water"]}"#).unwrap());

        assert_eq!(form.mood.as_deref(), Some("tired"));
        assert_eq!(form.goals, ["stretch", "drink water"]);
        assert_eq!(form.missing_fields(), ["energy"]);
    }

    #[test]
    fn summary_covers_all_fields() {
        let form = check_in(Some("tired"), Some("low"), &["drink water", "walk"]);
        assert_eq!(
            form.summarize(),
            "Feeling tired with low energy. Goals: drink water, walk."
        );
    }

    #[test]
    fn summary_handles_partial_check_ins() {
        assert_eq!(check_in(None, Some("high"), &[]).summarize(), "Energy is high.");
        assert_eq!(check_in(Some("calm"), None, &[]).summarize(), "Feeling calm.");
        assert_eq!(CheckIn::default().summarize(), "No details shared.");
    }

    #[test]
    fn record_is_a_copy_with_timestamp_and_summary() {
        let mut form = check_in(Some("tired"), Some("low"), &["drink water"]);
        let at = Utc::now();
        let entry = form.to_record(at);

        form.goals.push("sleep early".to_string());

        assert_eq!(entry.timestamp, at);
        assert_eq!(entry.goals, ["drink water"]);
        assert_eq!(entry.summary, "Feeling tired with low energy. Goals: drink water.");
    }

    #[test]
    fn entry_serializes_timestamp_as_iso_8601() {
        let entry = check_in(Some("tired"), Some("low"), &[]).to_record(Utc::now());
        let value = serde_json::to_value(&entry).unwrap();
        let timestamp = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert_eq!(value["mood"], "tired");
    }

    #[test]
    fn notification_is_tagged_wellness_update() {
        let entry = check_in(Some("calm"), None, &[]).to_record(Utc::now());
        let value = serde_json::to_value(CheckIn::notification(&entry)).unwrap();
        assert_eq!(value["type"], "wellness_update");
        assert_eq!(value["data"]["mood"], "calm");
    }
}
