use std::error::Error;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use tokio::sync::watch;

use crate::chat::{ChatBridge, GeneratorLoader, LoadPhase, LoadStatus};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::model::config::ChatConfig;
use crate::model::workspace::Workspace;
use crate::ops::project_ops::{self, ProjectError};
use crate::ops::task_ops::{self, TaskError};

type CmdResult<T = ()> = Result<T, Box<dyn Error>>;

/// Whether the shell keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State owned by one shell session: the workspace, the assistant, and the
/// loader used to (re)load its model.
pub struct Session {
    workspace: Workspace,
    bridge: ChatBridge,
    loader: Box<dyn GeneratorLoader>,
    load_timeout: Duration,
    load_attempted: bool,
    json: bool,
}

impl Session {
    pub fn new(config: &ChatConfig, loader: Box<dyn GeneratorLoader>, json: bool) -> Self {
        Session {
            workspace: Workspace::new(),
            bridge: ChatBridge::new(config),
            loader,
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            load_attempted: false,
            json,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn bridge(&self) -> &ChatBridge {
        &self.bridge
    }

    pub async fn execute(&mut self, cmd: ShellCommand, out: &mut dyn Write) -> CmdResult<Flow> {
        match cmd {
            ShellCommand::Projects => self.cmd_projects(out)?,
            ShellCommand::Project(sub) => match sub {
                ProjectCmd::New(args) => self.cmd_project_new(args, out)?,
                ProjectCmd::Show(args) => self.cmd_project_show(args, out)?,
                ProjectCmd::Edit(args) => self.cmd_project_edit(args, out)?,
                ProjectCmd::Rm(args) => self.cmd_project_rm(args, out)?,
            },
            ShellCommand::Tasks(args) => self.cmd_tasks(args, out)?,
            ShellCommand::Task(sub) => match sub {
                TaskCmd::Add(args) => self.cmd_task_add(args, out)?,
                TaskCmd::Done(args) => self.cmd_task_state(args, Some(true), out)?,
                TaskCmd::Undo(args) => self.cmd_task_state(args, Some(false), out)?,
                TaskCmd::Toggle(args) => self.cmd_task_state(args, None, out)?,
                TaskCmd::Rm(args) => self.cmd_task_rm(args, out)?,
            },
            ShellCommand::Chat(args) => self.cmd_chat(args, out).await?,
            ShellCommand::History => self.cmd_history(out)?,
            ShellCommand::Status => self.cmd_status(out)?,
            ShellCommand::Reload => self.cmd_reload(out).await?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    fn cmd_projects(&self, out: &mut dyn Write) -> CmdResult {
        if self.json {
            writeln!(out, "{}", serde_json::to_string(self.workspace.projects())?)?;
        } else {
            write!(out, "{}", render_project_list(self.workspace.projects()))?;
        }
        Ok(())
    }

    fn cmd_project_new(&mut self, args: ProjectNewArgs, out: &mut dyn Write) -> CmdResult {
        let id = project_ops::create_project(&mut self.workspace, &args.title, &args.description)?;
        if self.json {
            writeln!(out, "{}", serde_json::to_string(&CreatedJson { created: &id })?)?;
        } else {
            writeln!(out, "Project created: {} ({})", args.title.trim(), id)?;
        }
        Ok(())
    }

    fn cmd_project_show(&self, args: ProjectRef, out: &mut dyn Write) -> CmdResult {
        let id = self.project_id(&args.project)?;
        let Some(project) = self.workspace.project(&id) else {
            return Err(ProjectError::NotFound(args.project).into());
        };
        if self.json {
            let detail = ProjectDetailJson {
                project,
                remaining: project.tasks().remaining(),
            };
            writeln!(out, "{}", serde_json::to_string(&detail)?)?;
        } else {
            write!(out, "{}", render_project_detail(project))?;
        }
        Ok(())
    }

    fn cmd_project_edit(&mut self, args: ProjectEditArgs, out: &mut dyn Write) -> CmdResult {
        if args.title.is_none() && args.description.is_none() {
            return Err("nothing to change: pass --title and/or --description".into());
        }
        let id = self.project_id(&args.project)?;
        project_ops::edit_project(
            &mut self.workspace,
            &id,
            args.title.as_deref(),
            args.description.as_deref(),
        )?;
        if self.json {
            if let Some(project) = self.workspace.project(&id) {
                writeln!(out, "{}", serde_json::to_string(project)?)?;
            }
        } else {
            writeln!(out, "Project updated")?;
        }
        Ok(())
    }

    fn cmd_project_rm(&mut self, args: ProjectRef, out: &mut dyn Write) -> CmdResult {
        let id = self.project_id(&args.project)?;
        let removed = project_ops::delete_project(&mut self.workspace, &id)?;
        if self.json {
            writeln!(out, "{}", serde_json::to_string(&DeletedJson { deleted: &removed.id })?)?;
        } else {
            writeln!(out, "Project deleted: {}", removed.title)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    fn cmd_tasks(&self, args: TasksArgs, out: &mut dyn Write) -> CmdResult {
        let id = self.project_id(&args.project)?;
        let all = self.workspace.tasks(&id);
        let tasks = task_ops::filter_tasks(all, args.filter);
        let counts = task_ops::filter_counts(all);
        if self.json {
            let list = TaskListJson {
                project: &id,
                filter: args.filter,
                counts,
                tasks,
            };
            writeln!(out, "{}", serde_json::to_string(&list)?)?;
        } else {
            write!(out, "{}", render_task_list(&tasks, args.filter, counts))?;
        }
        Ok(())
    }

    fn cmd_task_add(&mut self, args: TaskAddArgs, out: &mut dyn Write) -> CmdResult {
        let project_id = self.project_id(&args.project)?;
        let id = task_ops::create_task(&mut self.workspace, &project_id, &args.title, args.priority)?;
        if self.json {
            writeln!(out, "{}", serde_json::to_string(&CreatedJson { created: &id })?)?;
        } else {
            writeln!(out, "Task added: {} ({})", args.title.trim(), id)?;
            self.write_project_progress(&project_id, out)?;
        }
        Ok(())
    }

    /// `completed: None` toggles
    fn cmd_task_state(
        &mut self,
        args: TaskRef,
        completed: Option<bool>,
        out: &mut dyn Write,
    ) -> CmdResult {
        let (project_id, task_id) = self.task_ids(&args)?;
        let completed = match completed {
            Some(value) => {
                task_ops::set_task_completed(&mut self.workspace, &project_id, &task_id, value)?;
                value
            }
            None => task_ops::toggle_task(&mut self.workspace, &project_id, &task_id)?,
        };
        if self.json {
            self.write_task_state(&project_id, &task_id, completed, out)?;
        } else {
            let verb = if completed { "completed" } else { "reopened" };
            writeln!(out, "Task {}: {}", verb, task_id)?;
            self.write_project_progress(&project_id, out)?;
        }
        Ok(())
    }

    fn cmd_task_rm(&mut self, args: TaskRef, out: &mut dyn Write) -> CmdResult {
        let (project_id, task_id) = self.task_ids(&args)?;
        let removed = task_ops::delete_task(&mut self.workspace, &project_id, &task_id)?;
        if self.json {
            writeln!(out, "{}", serde_json::to_string(&DeletedJson { deleted: &removed.id })?)?;
        } else {
            writeln!(out, "Task deleted: {}", removed.title)?;
            self.write_project_progress(&project_id, out)?;
        }
        Ok(())
    }

    fn write_project_progress(&self, project_id: &str, out: &mut dyn Write) -> CmdResult {
        if let Some(p) = self.workspace.project(project_id) {
            let tasks = p.tasks();
            writeln!(
                out,
                "{} {} {}% ({}/{} completed)",
                p.title,
                progress_bar(p.progress()),
                p.progress(),
                tasks.completed,
                tasks.total
            )?;
        }
        Ok(())
    }

    fn write_task_state(
        &self,
        project_id: &str,
        task_id: &str,
        completed: bool,
        out: &mut dyn Write,
    ) -> CmdResult {
        let Some(project) = self.workspace.project(project_id) else {
            return Err(ProjectError::NotFound(project_id.to_string()).into());
        };
        let state = TaskStateJson {
            id: task_id,
            completed,
            project_progress: project.progress(),
            project_tasks: project.tasks(),
        };
        writeln!(out, "{}", serde_json::to_string(&state)?)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assistant
    // -----------------------------------------------------------------------

    async fn cmd_chat(&mut self, args: ChatArgs, out: &mut dyn Write) -> CmdResult {
        let message = args.message();
        if message.trim().is_empty() {
            return Err(crate::chat::ChatError::EmptyMessage.into());
        }
        if !self.load_attempted {
            self.load_model(out).await?;
            if !self.json
                && let Some(greeting) = self.bridge.conversation().last()
            {
                write!(out, "{}", render_message(greeting))?;
            }
        }
        let fallback = matches!(
            self.bridge.status().phase,
            LoadPhase::Ready { fallback: true }
        );
        let reply = self.bridge.send(&message).await?;
        if self.json {
            let json = ChatReplyJson {
                reply: &reply.content,
                fallback,
            };
            writeln!(out, "{}", serde_json::to_string(&json)?)?;
        } else {
            write!(out, "{}", render_message(reply))?;
        }
        Ok(())
    }

    fn cmd_history(&self, out: &mut dyn Write) -> CmdResult {
        let messages = self.bridge.conversation().messages();
        if self.json {
            writeln!(out, "{}", serde_json::to_string(messages)?)?;
        } else {
            write!(out, "{}", render_conversation(messages))?;
        }
        Ok(())
    }

    fn cmd_status(&self, out: &mut dyn Write) -> CmdResult {
        let status = self.load_attempted.then(|| self.bridge.status());
        let fallback = matches!(
            status.map(|s| s.phase),
            Some(LoadPhase::Ready { fallback: true })
        );
        let messages = self.bridge.conversation().len();
        if self.json {
            let json = StatusJson {
                state: load_state_label(status),
                model: self.bridge.model_name(),
                fallback,
                progress: status.map_or(0, |s| s.progress),
                taking_long: status.is_some_and(|s| s.taking_long),
                messages,
            };
            writeln!(out, "{}", serde_json::to_string(&json)?)?;
            return Ok(());
        }
        writeln!(out, "Assistant: {}", load_state_label(status))?;
        match self.bridge.model_name() {
            Some(name) => writeln!(out, "Model: {}", name)?,
            None => writeln!(out, "Model: {} (loads on first chat)", self.loader.model_name())?,
        }
        writeln!(out, "Messages: {}", messages)?;
        Ok(())
    }

    async fn cmd_reload(&mut self, out: &mut dyn Write) -> CmdResult {
        self.load_model(out).await
    }

    /// Run a model load with a progress reporter on stderr, then report how
    /// it went.
    async fn load_model(&mut self, out: &mut dyn Write) -> CmdResult {
        let reporter = tokio::spawn(report_load_progress(
            self.bridge.subscribe(),
            self.loader.model_name().to_string(),
            self.load_timeout,
        ));
        let outcome = self.bridge.load(self.loader.as_ref()).await;
        reporter.abort();
        self.load_attempted = true;

        if self.json {
            let json = LoadJson {
                model: &outcome.model,
                fallback: outcome.fallback,
                error: outcome.error.as_deref(),
            };
            writeln!(out, "{}", serde_json::to_string(&json)?)?;
        } else if outcome.fallback {
            writeln!(
                out,
                "Using basic mode: could not load the full AI model, so answers come from built-in guidance."
            )?;
        } else {
            writeln!(out, "Assistant ready: loaded model {}", outcome.model)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup helpers
    // -----------------------------------------------------------------------

    fn project_id(&self, key: &str) -> Result<String, ProjectError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ProjectError::NotFound(key.to_string()));
        }
        self.workspace
            .resolve_project(key)
            .map(|p| p.id.clone())
            .ok_or_else(|| ProjectError::NotFound(key.to_string()))
    }

    fn task_ids(&self, args: &TaskRef) -> CmdResult<(String, String)> {
        let project_id = self.project_id(&args.project)?;
        let key = args.task.trim();
        let task = (!key.is_empty())
            .then(|| self.workspace.resolve_task(&project_id, key))
            .flatten()
            .ok_or_else(|| TaskError::NotFound(key.to_string()))?;
        Ok((project_id, task.id.clone()))
    }
}

/// Mirror load status to stderr until the load finishes: a live percentage
/// on a terminal, plus a one-time notice once loading runs long.
async fn report_load_progress(
    mut rx: watch::Receiver<LoadStatus>,
    model: String,
    timeout: Duration,
) {
    let live = std::io::stderr().is_terminal();
    let mut warned = false;
    while rx.changed().await.is_ok() {
        let status = *rx.borrow_and_update();
        if matches!(status.phase, LoadPhase::Ready { .. }) {
            if live {
                eprint!("\r\x1b[K");
            }
            break;
        }
        if live {
            eprint!("\rLoading {}... {}%", model, status.progress);
        }
        if status.taking_long && !warned {
            warned = true;
            if live {
                eprintln!();
            }
            eprintln!(
                "Loading {} is taking longer than {}s. It keeps going in the background; \
                 if it never finishes, try `reload`.",
                model,
                timeout.as_secs()
            );
        }
    }
}
