use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::task::Priority;
use crate::ops::task_ops::TaskFilter;

#[derive(Parser)]
#[command(
    name = "trellis",
    about = concat!("trellis v", env!("CARGO_PKG_VERSION"), " - projects, tasks, and an assistant that knows about them"),
    version
)]
pub struct Cli {
    /// Print command results as JSON (one document per line)
    #[arg(long)]
    pub json: bool,

    /// Config file (default: ./trellis.toml when present)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Skip model loading; the assistant answers in basic mode
    #[arg(long)]
    pub offline: bool,

    /// Model to load (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Generation backend URL (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// One line typed into the shell
#[derive(Parser)]
#[command(
    name = "trellis",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "{subcommands}"
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand)]
pub enum ShellCommand {
    /// List all projects
    #[command(alias = "ls")]
    Projects,
    /// Create, show, edit, or delete a project
    #[command(subcommand)]
    Project(ProjectCmd),
    /// List a project's tasks
    Tasks(TasksArgs),
    /// Add, complete, or delete tasks
    #[command(subcommand)]
    Task(TaskCmd),
    /// Ask the project assistant
    #[command(alias = "ask")]
    Chat(ChatArgs),
    /// Show the conversation so far
    History,
    /// Show assistant status
    Status,
    /// Load (or retry loading) the assistant model
    Reload,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

// ---------------------------------------------------------------------------
// Project args
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ProjectCmd {
    /// Create a new project
    New(ProjectNewArgs),
    /// Show project details and progress
    Show(ProjectRef),
    /// Change a project's title or description
    Edit(ProjectEditArgs),
    /// Delete a project and all of its tasks
    Rm(ProjectRef),
}

#[derive(Args)]
pub struct ProjectNewArgs {
    /// Project title
    pub title: String,
    /// Brief description
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct ProjectRef {
    /// Project ID, unique ID prefix, or exact title
    pub project: String,
}

#[derive(Args)]
pub struct ProjectEditArgs {
    /// Project ID, unique ID prefix, or exact title
    pub project: String,
    /// New title
    #[arg(short, long)]
    pub title: Option<String>,
    /// New description
    #[arg(short, long)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TasksArgs {
    /// Project ID, unique ID prefix, or exact title
    pub project: String,
    /// Which tasks to show (all, active, completed)
    #[arg(short, long, default_value_t = TaskFilter::All)]
    pub filter: TaskFilter,
}

#[derive(Subcommand)]
pub enum TaskCmd {
    /// Add a task to the top of a project's list
    Add(TaskAddArgs),
    /// Mark a task completed
    Done(TaskRef),
    /// Mark a task not completed
    Undo(TaskRef),
    /// Flip a task's completed state
    Toggle(TaskRef),
    /// Delete a task
    Rm(TaskRef),
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Project ID, unique ID prefix, or exact title
    pub project: String,
    /// Task title
    pub title: String,
    /// Priority (low, medium, high)
    #[arg(short, long, default_value_t = Priority::Medium)]
    pub priority: Priority,
}

#[derive(Args)]
pub struct TaskRef {
    /// Project ID, unique ID prefix, or exact title
    pub project: String,
    /// Task ID or unique ID prefix
    pub task: String,
}

// ---------------------------------------------------------------------------
// Chat args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ChatArgs {
    /// Message text
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

impl ChatArgs {
    pub fn message(&self) -> String {
        self.text.join(" ")
    }
}
