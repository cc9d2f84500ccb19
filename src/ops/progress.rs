use crate::model::project::TaskSummary;
use crate::model::task::Task;

/// Aggregates derived from a project's task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectStats {
    /// Completion percentage, 0..=100
    pub progress: u8,
    pub summary: TaskSummary,
}

/// Completion percentage: round(100 * completed / total), 0 for no tasks.
/// Halves round up.
pub fn calculate_progress(tasks: &[Task]) -> u8 {
    percentage(summarize(tasks))
}

/// Total and completed task counts
pub fn summarize(tasks: &[Task]) -> TaskSummary {
    TaskSummary {
        total: tasks.len(),
        completed: tasks.iter().filter(|t| t.completed).count(),
    }
}

/// Derive both the percentage and the counts in one pass over the list
pub fn derive_stats(tasks: &[Task]) -> ProjectStats {
    let summary = summarize(tasks);
    ProjectStats {
        progress: percentage(summary),
        summary,
    }
}

fn percentage(summary: TaskSummary) -> u8 {
    if summary.total == 0 {
        return 0;
    }
    // Integer form of floor(100 * c / t + 0.5)
    let pct = (200 * summary.completed + summary.total) / (2 * summary.total);
    pct.min(100) as u8
}
