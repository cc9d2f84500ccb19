use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

/// Task counts for a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
}

impl TaskSummary {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}

/// A tracked unit of work.
///
/// `progress` and `tasks` are derived from the project's task list and can
/// only be written through [`Project::apply_stats`], which the store calls
/// after every task mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Generated ID like `project-k3j9x0q2m1ab`
    pub id: String,
    pub title: String,
    pub description: String,
    /// Completion percentage, 0..=100
    progress: u8,
    tasks: TaskSummary,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create an empty project (no tasks, 0% progress)
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Project {
            id: generate_id("project"),
            title: title.into(),
            description: description.into(),
            progress: 0,
            tasks: TaskSummary::default(),
            created_at: Utc::now(),
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn tasks(&self) -> TaskSummary {
        self.tasks
    }

    /// Write freshly derived stats back onto the project
    pub(crate) fn apply_stats(&mut self, progress: u8, summary: TaskSummary) {
        self.progress = progress;
        self.tasks = summary;
    }

    /// Long creation date as shown on the project page, e.g. `April 15, 2023`
    pub fn created_label(&self) -> String {
        self.created_at.format("%B %-d, %Y").to_string()
    }
}
