use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::task::{Priority, Task};
use crate::model::workspace::Workspace;
use crate::ops::progress::derive_stats;

/// Error type for task operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task title required: please enter a title for your task")]
    EmptyTitle,
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("task not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Add a task to the top of a project's list. Returns the assigned ID.
/// New tasks always start incomplete.
pub fn create_task(
    ws: &mut Workspace,
    project_id: &str,
    title: &str,
    priority: Priority,
) -> Result<String, TaskError> {
    if title.trim().is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    let tasks = project_tasks_mut(ws, project_id)?;
    let task = Task::new(title, priority);
    let id = task.id.clone();
    tasks.insert(0, task);
    refresh_project_stats(ws, project_id);
    log::debug!("created task {} in {}", id, project_id);
    Ok(id)
}

/// Set a task's completed flag.
pub fn set_task_completed(
    ws: &mut Workspace,
    project_id: &str,
    task_id: &str,
    completed: bool,
) -> Result<(), TaskError> {
    let task = find_task_mut(ws, project_id, task_id)?;
    task.completed = completed;
    refresh_project_stats(ws, project_id);
    Ok(())
}

/// Flip a task's completed flag. Returns the new value.
pub fn toggle_task(ws: &mut Workspace, project_id: &str, task_id: &str) -> Result<bool, TaskError> {
    let task = find_task_mut(ws, project_id, task_id)?;
    task.completed = !task.completed;
    let completed = task.completed;
    refresh_project_stats(ws, project_id);
    Ok(completed)
}

/// Remove a task entirely.
pub fn delete_task(ws: &mut Workspace, project_id: &str, task_id: &str) -> Result<Task, TaskError> {
    let tasks = project_tasks_mut(ws, project_id)?;
    let idx = tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    let task = tasks.remove(idx);
    refresh_project_stats(ws, project_id);
    log::debug!("deleted task {} from {}", task_id, project_id);
    Ok(task)
}

/// Recompute a project's progress and counts from its task list and write
/// them back onto the project.
pub fn refresh_project_stats(ws: &mut Workspace, project_id: &str) {
    let stats = derive_stats(ws.tasks(project_id));
    if let Some(project) = ws.project_mut(project_id) {
        project.apply_stats(stats.progress, stats.summary);
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Which tasks a list view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }

    /// Message shown when the filtered list is empty
    pub fn empty_message(self) -> &'static str {
        match self {
            TaskFilter::All => "No tasks yet. Add your first task!",
            TaskFilter::Active => "No active tasks. Great job!",
            TaskFilter::Completed => "No completed tasks yet.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "active" | "open" | "todo" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!(
                "invalid filter '{}' (expected all, active, or completed)",
                other
            )),
        }
    }
}

/// Counts for each filter, as shown on the filter buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

pub fn filter_tasks(tasks: &[Task], filter: TaskFilter) -> Vec<&Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

pub fn filter_counts(tasks: &[Task]) -> FilterCounts {
    let completed = tasks.iter().filter(|t| t.completed).count();
    FilterCounts {
        all: tasks.len(),
        active: tasks.len() - completed,
        completed,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn project_tasks_mut<'a>(
    ws: &'a mut Workspace,
    project_id: &str,
) -> Result<&'a mut Vec<Task>, TaskError> {
    if ws.project(project_id).is_none() {
        return Err(TaskError::ProjectNotFound(project_id.to_string()));
    }
    Ok(ws.tasks.entry(project_id.to_string()).or_default())
}

fn find_task_mut<'a>(
    ws: &'a mut Workspace,
    project_id: &str,
    task_id: &str,
) -> Result<&'a mut Task, TaskError> {
    project_tasks_mut(ws, project_id)?
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
}
