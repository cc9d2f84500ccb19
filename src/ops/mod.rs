pub mod progress;
pub mod project_ops;
pub mod task_ops;
