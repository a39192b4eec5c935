// Status Domain Model
//
// Every status value entering or leaving the system passes through
// `normalize`, so only the three canonical states ever reach the data model.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::str::FromStr;

const QUEUE_SYNONYMS: &[&str] = &["queue", "antri", "antre"];

const ON_PROGRESS_SYNONYMS: &[&str] = &[
    "on progress",
    "onprogress",
    "on-progress",
    "progress",
    "serve",
    "serving",
    "proses",
    "dipanggil",
];

const FINISHING_SYNONYMS: &[&str] = &["finishing", "finish", "done", "selesai", "completed"];

/// Canonical lifecycle state of a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Queue,
    OnProgress,
    Finishing,
}

impl Status {
    /// All canonical states, in lifecycle order
    pub const ALL: [Status; 3] = [Status::Queue, Status::OnProgress, Status::Finishing];

    /// Map free-text input to a canonical state. Never fails.
    pub fn from_raw(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        if s.is_empty() || QUEUE_SYNONYMS.contains(&s.as_str()) {
            Status::Queue
        } else if ON_PROGRESS_SYNONYMS.contains(&s.as_str()) {
            Status::OnProgress
        } else if FINISHING_SYNONYMS.contains(&s.as_str()) {
            Status::Finishing
        } else {
            Status::Queue
        }
    }

    /// Persisted and displayed label
    pub fn label(&self) -> &'static str {
        match self {
            Status::Queue => "Queue",
            Status::OnProgress => "On Progress",
            Status::Finishing => "Finishing",
        }
    }

    /// Presentation tag renderers use to style an entry row
    pub fn style_tag(&self) -> &'static str {
        match self {
            Status::Queue => "status-queue",
            Status::OnProgress => "status-onprogress",
            Status::Finishing => "status-finishing",
        }
    }
}

/// Normalize an optional raw status. Missing input maps to `Status::Queue`.
pub fn normalize(raw: Option<&str>) -> Status {
    raw.map(Status::from_raw).unwrap_or_default()
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Status::from_raw(s))
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Status {
    // Legacy records may carry any spelling, null, or not a string at all
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => Status::from_raw(&raw),
            serde_json::Value::Null => Status::default(),
            other => Status::from_raw(&other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_blank_input_is_queue() {
        assert_eq!(normalize(None), Status::Queue);
        assert_eq!(normalize(Some("")), Status::Queue);
        assert_eq!(normalize(Some("   ")), Status::Queue);
    }

    #[test]
    fn test_synonyms_are_trimmed_and_case_insensitive() {
        assert_eq!(normalize(Some("  SELESAI ")), Status::Finishing);
        assert_eq!(normalize(Some("dipanggil")), Status::OnProgress);
        assert_eq!(normalize(Some("On-Progress")), Status::OnProgress);
        assert_eq!(normalize(Some("ANTRE")), Status::Queue);
        assert_eq!(normalize(Some("Completed")), Status::Finishing);
    }

    #[test]
    fn test_unknown_input_defaults_to_queue() {
        assert_eq!(normalize(Some("xyz")), Status::Queue);
        assert_eq!(normalize(Some("on  progress")), Status::Queue);
    }

    #[test]
    fn test_normalize_is_idempotent_over_labels() {
        let inputs = [
            "queue", "serving", "done", "xyz", "", "  Finish  ", "PROSES", "on progress",
        ];
        for raw in inputs {
            let once = normalize(Some(raw));
            let twice = normalize(Some(once.label()));
            assert_eq!(once, twice, "not idempotent for {raw:?}");
            assert!(Status::ALL.contains(&once));
        }
    }

    #[test]
    fn test_style_tags() {
        assert_eq!(Status::Queue.style_tag(), "status-queue");
        assert_eq!(Status::OnProgress.style_tag(), "status-onprogress");
        assert_eq!(Status::Finishing.style_tag(), "status-finishing");
    }

    #[test]
    fn test_serde_uses_labels_and_tolerates_legacy_values() {
        let json = serde_json::to_string(&Status::OnProgress).unwrap();
        assert_eq!(json, "\"On Progress\"");

        let legacy: Status = serde_json::from_str("\"selesai\"").unwrap();
        assert_eq!(legacy, Status::Finishing);

        let null: Status = serde_json::from_str("null").unwrap();
        assert_eq!(null, Status::Queue);

        for other in ["2", "true", "[\"done\"]", "{\"status\":\"done\"}"] {
            let status: Status = serde_json::from_str(other).unwrap();
            assert_eq!(status, Status::Queue, "for {other}");
        }
    }

    #[test]
    fn test_from_str_never_fails() {
        assert_eq!("  Serve ".parse::<Status>(), Ok(Status::OnProgress));
        assert_eq!("???".parse::<Status>(), Ok(Status::Queue));
    }
}
