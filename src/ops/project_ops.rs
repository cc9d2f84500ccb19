use crate::model::project::Project;
use crate::model::workspace::Workspace;

/// Error type for project operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("project title required: please enter a title for your project")]
    EmptyTitle,
    #[error("project not found: {0}")]
    NotFound(String),
}

/// Create a project at the front of the list. Returns the new ID.
pub fn create_project(
    ws: &mut Workspace,
    title: &str,
    description: &str,
) -> Result<String, ProjectError> {
    if title.trim().is_empty() {
        return Err(ProjectError::EmptyTitle);
    }
    let project = Project::new(title, description);
    let id = project.id.clone();
    ws.tasks.insert(id.clone(), Vec::new());
    ws.projects.insert(0, project);
    log::debug!("created project {}", id);
    Ok(id)
}

/// Remove a project together with its tasks.
pub fn delete_project(ws: &mut Workspace, project_id: &str) -> Result<Project, ProjectError> {
    let idx = ws
        .projects
        .iter()
        .position(|p| p.id == project_id)
        .ok_or_else(|| ProjectError::NotFound(project_id.to_string()))?;
    let project = ws.projects.remove(idx);
    ws.tasks.shift_remove(project_id);
    log::debug!("deleted project {}", project_id);
    Ok(project)
}

/// Update a project's title and/or description. Derived stats are untouched.
pub fn edit_project(
    ws: &mut Workspace,
    project_id: &str,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<(), ProjectError> {
    if let Some(t) = title
        && t.trim().is_empty()
    {
        return Err(ProjectError::EmptyTitle);
    }
    let project = ws
        .project_mut(project_id)
        .ok_or_else(|| ProjectError::NotFound(project_id.to_string()))?;
    if let Some(t) = title {
        project.title = t.to_string();
    }
    if let Some(d) = description {
        project.description = d.to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use crate::ops::task_ops;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_prepends_and_starts_empty() {
        let mut ws = Workspace::new();
        let first = create_project(&mut ws, "Website Redesign", "Modern look").unwrap();
        let second = create_project(&mut ws, "Mobile App", "").unwrap();
        let ids: Vec<&str> = ws.projects().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        let p = ws.project(&first).unwrap();
        assert_eq!(p.progress(), 0);
        assert_eq!(p.tasks().total, 0);
        assert_eq!(p.description, "Modern look");
        assert!(ws.tasks(&first).is_empty());
    }

    #[test]
    fn blank_title_is_rejected_without_mutation() {
        let mut ws = Workspace::new();
        assert_eq!(
            create_project(&mut ws, "   ", "desc"),
            Err(ProjectError::EmptyTitle)
        );
        assert!(ws.is_empty());
    }

    #[test]
    fn delete_removes_project_and_tasks() {
        let mut ws = Workspace::new();
        let id = create_project(&mut ws, "Campaign", "").unwrap();
        task_ops::create_task(&mut ws, &id, "Define objectives", Priority::High).unwrap();
        let removed = delete_project(&mut ws, &id).unwrap();
        assert_eq!(removed.title, "Campaign");
        assert!(ws.project(&id).is_none());
        assert!(ws.tasks(&id).is_empty());
        assert!(!ws.tasks.contains_key(&id));
    }

    #[test]
    fn delete_unknown_project_errors() {
        let mut ws = Workspace::new();
        assert_eq!(
            delete_project(&mut ws, "project-missing").unwrap_err(),
            ProjectError::NotFound("project-missing".into())
        );
    }

    #[test]
    fn edit_updates_fields_and_keeps_stats() {
        let mut ws = Workspace::new();
        let id = create_project(&mut ws, "Old", "old desc").unwrap();
        let task = task_ops::create_task(&mut ws, &id, "One", Priority::Low).unwrap();
        task_ops::set_task_completed(&mut ws, &id, &task, true).unwrap();

        edit_project(&mut ws, &id, Some("New"), None).unwrap();
        let p = ws.project(&id).unwrap();
        assert_eq!(p.title, "New");
        assert_eq!(p.description, "old desc");
        assert_eq!(p.progress(), 100);

        edit_project(&mut ws, &id, None, Some("")).unwrap();
        assert_eq!(ws.project(&id).unwrap().description, "");
    }

    #[test]
    fn edit_rejects_blank_title() {
        let mut ws = Workspace::new();
        let id = create_project(&mut ws, "Keep", "").unwrap();
        assert_eq!(
            edit_project(&mut ws, &id, Some(""), Some("changed")),
            Err(ProjectError::EmptyTitle)
        );
        let p = ws.project(&id).unwrap();
        assert_eq!(p.title, "Keep");
        assert_eq!(p.description, "");
    }
}
