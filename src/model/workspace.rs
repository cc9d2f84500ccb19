use indexmap::IndexMap;
use serde::Serialize;

use super::project::Project;
use super::task::Task;

/// The session's in-memory store: every project (newest first) and the
/// ordered task list of each project, keyed by project ID.
///
/// Mutation goes through `ops::project_ops` and `ops::task_ops`, which keep
/// each project's derived stats in step with its task list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Workspace {
    pub(crate) projects: Vec<Project>,
    pub(crate) tasks: IndexMap<String, Vec<Task>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub(crate) fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Tasks of a project, newest first. Empty for unknown projects.
    pub fn tasks(&self, project_id: &str) -> &[Task] {
        self.tasks
            .get(project_id)
            .map(|t| t.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Resolve a project by exact ID, falling back to a unique ID prefix
    /// or a case-insensitive exact title match.
    pub fn resolve_project(&self, key: &str) -> Option<&Project> {
        if let Some(p) = self.project(key) {
            return Some(p);
        }
        let by_prefix: Vec<&Project> = self
            .projects
            .iter()
            .filter(|p| p.id.starts_with(key))
            .collect();
        if by_prefix.len() == 1 {
            return Some(by_prefix[0]);
        }
        let by_title: Vec<&Project> = self
            .projects
            .iter()
            .filter(|p| p.title.eq_ignore_ascii_case(key))
            .collect();
        if by_title.len() == 1 {
            return Some(by_title[0]);
        }
        None
    }

    /// Resolve a task inside a project by exact ID or unique ID prefix.
    pub fn resolve_task<'a>(&'a self, project_id: &str, key: &str) -> Option<&'a Task> {
        let tasks = self.tasks(project_id);
        if let Some(t) = tasks.iter().find(|t| t.id == key) {
            return Some(t);
        }
        let mut matches = tasks.iter().filter(|t| t.id.starts_with(key));
        match (matches.next(), matches.next()) {
            (Some(t), None) => Some(t),
            _ => None,
        }
    }
}
