use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::generate_id;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(format!(
                "invalid priority '{}' (expected low, medium, or high)",
                other
            )),
        }
    }
}

/// A single actionable item belonging to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Generated ID like `task-k3j9x0q2m1ab`
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    /// Number of comments, when any were recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u32>,
}

impl Task {
    /// Create a new, not yet completed task stamped with the current time
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Task {
            id: generate_id("task"),
            title: title.into(),
            completed: false,
            priority,
            created_at: Utc::now(),
            comments: None,
        }
    }

    /// Short creation date as shown in task rows, e.g. `Apr 16`
    pub fn created_label(&self) -> String {
        self.created_at.format("%b %-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_task_starts_incomplete() {
        let task = Task::new("Wireframe homepage", Priority::High);
        assert!(!task.completed);
        assert!(task.id.starts_with("task-"));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.comments, None);
    }

    #[test]
    fn priority_parses_loosely() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" med ".parse::<Priority>(), Ok(Priority::Medium));
        assert_eq!("l".parse::<Priority>(), Ok(Priority::Low));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn created_label_is_short_date() {
        let mut task = Task::new("Ship it", Priority::Low);
        task.created_at = Utc.with_ymd_and_hms(2023, 4, 16, 11, 30, 0).unwrap();
        assert_eq!(task.created_label(), "Apr 16");
    }

    #[test]
    fn serializes_with_camel_case_and_skips_missing_comments() {
        let mut task = Task::new("Review", Priority::Low);
        task.id = "task-1".into();
        task.created_at = Utc.with_ymd_and_hms(2023, 4, 16, 11, 30, 0).unwrap();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["createdAt"], "2023-04-16T11:30:00Z");
        assert_eq!(json["priority"], "low");
        assert!(json.get("comments").is_none());

        task.comments = Some(3);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["comments"], 3);
    }
}
