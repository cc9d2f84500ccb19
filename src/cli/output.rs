use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::chat::{LoadPhase, LoadStatus};
use crate::model::chat::{ChatMessage, Role};
use crate::model::project::{Project, TaskSummary};
use crate::model::task::Task;
use crate::ops::task_ops::{FilterCounts, TaskFilter};

const TITLE_WIDTH: usize = 32;
const BAR_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectDetailJson<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub remaining: usize,
}

#[derive(Serialize)]
pub struct TaskListJson<'a> {
    pub project: &'a str,
    pub filter: TaskFilter,
    pub counts: FilterCounts,
    pub tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
pub struct CreatedJson<'a> {
    pub created: &'a str,
}

#[derive(Serialize)]
pub struct DeletedJson<'a> {
    pub deleted: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateJson<'a> {
    pub id: &'a str,
    pub completed: bool,
    pub project_progress: u8,
    pub project_tasks: TaskSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusJson<'a> {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub fallback: bool,
    pub progress: u8,
    pub taking_long: bool,
    pub messages: usize,
}

#[derive(Serialize)]
pub struct ChatReplyJson<'a> {
    pub reply: &'a str,
    pub fallback: bool,
}

#[derive(Serialize)]
pub struct LoadJson<'a> {
    pub model: &'a str,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// `[#########-----------]` style bar for a 0..=100 percentage
pub fn progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Truncate to `width` columns (with an ellipsis) and pad to exactly `width`.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    if text.width() <= width {
        out.push_str(text);
    } else {
        let mut used = 0;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('…');
    }
    let pad = width.saturating_sub(out.width());
    out.push_str(&" ".repeat(pad));
    out
}

pub fn render_project_list(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects yet. Create one with `project new <title>`.\n".to_string();
    }
    let mut out = String::new();
    for p in projects {
        let tasks = p.tasks();
        out.push_str(&format!(
            "{}  {}  {:>3}%  {}/{} tasks\n",
            p.id,
            fit(&p.title, TITLE_WIDTH),
            p.progress(),
            tasks.completed,
            tasks.total
        ));
    }
    out
}

pub fn render_project_detail(project: &Project) -> String {
    let tasks = project.tasks();
    let mut out = String::new();
    out.push_str(&format!("{}  ({})\n", project.title, project.id));
    if !project.description.is_empty() {
        out.push_str(&format!("{}\n", project.description));
    }
    out.push_str(&format!(
        "Created on {}  |  {} tasks ({} completed)\n",
        project.created_label(),
        tasks.total,
        tasks.completed
    ));
    out.push_str(&format!(
        "Completion {} {}%\n",
        progress_bar(project.progress()),
        project.progress()
    ));
    out.push_str(&format!(
        "Total {}  Completed {}  Remaining {}\n",
        tasks.total,
        tasks.completed,
        tasks.remaining()
    ));
    out
}

pub fn render_task_line(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    let mut line = format!(
        "[{}] {}  {}  {:<6}  {}",
        mark,
        task.id,
        fit(&task.title, TITLE_WIDTH),
        task.priority,
        task.created_label()
    );
    if let Some(n) = task.comments
        && n > 0
    {
        line.push_str(&format!("  ({} comments)", n));
    }
    line.push('\n');
    line
}

pub fn render_task_list(tasks: &[&Task], filter: TaskFilter, counts: FilterCounts) -> String {
    let mut out = format!(
        "All ({})  Active ({})  Completed ({})  [showing: {}]\n",
        counts.all, counts.active, counts.completed, filter
    );
    if tasks.is_empty() {
        out.push_str(filter.empty_message());
        out.push('\n');
        return out;
    }
    for task in tasks {
        out.push_str(&render_task_line(task));
    }
    out
}

pub fn render_message(message: &ChatMessage) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    format!("{}> {}\n", who, message.content)
}

pub fn render_conversation(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return "No messages yet. Start with `chat <message>`.\n".to_string();
    }
    messages.iter().map(render_message).collect()
}

pub fn load_state_label(status: Option<LoadStatus>) -> &'static str {
    match status.map(|s| s.phase) {
        None => "not loaded",
        Some(LoadPhase::Initializing) => "loading",
        Some(LoadPhase::Ready { fallback: true }) => "ready (basic mode)",
        Some(LoadPhase::Ready { fallback: false }) => "ready",
    }
}
