use std::io::{IsTerminal, Write};

use clap::Parser;
use clap::error::ErrorKind;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::commands::{ChatArgs, ShellCommand, ShellLine};
use crate::cli::handlers::{Flow, Session};

const PROMPT: &str = "trellis> ";

/// Why a typed line could not become a command
#[derive(Debug)]
pub enum LineError {
    UnbalancedQuotes,
    Usage(clap::Error),
}

/// Parse one line of shell input. Blank lines and `#` comments yield
/// `Ok(None)`.
///
/// `chat`/`ask` take the rest of the line verbatim so apostrophes and
/// quotes in a question need no escaping.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, LineError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    if matches!(head, "chat" | "ask") && !rest.is_empty() {
        return Ok(Some(ShellCommand::Chat(ChatArgs {
            text: vec![rest.to_string()],
        })));
    }

    let words = shlex::split(line).ok_or(LineError::UnbalancedQuotes)?;
    ShellLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(LineError::Usage)
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run(mut session: Session) -> std::io::Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if interactive {
        println!(
            "trellis v{}. Type `help` for commands, `quit` to leave.",
            env!("CARGO_PKG_VERSION")
        );
    }

    loop {
        if interactive {
            print!("{}", PROMPT);
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let cmd = match parse_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(LineError::UnbalancedQuotes) => {
                eprintln!("error: unbalanced quotes");
                continue;
            }
            Err(LineError::Usage(e)) => {
                match e.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        print!("{}", e.render())
                    }
                    _ => eprint!("{}", e.render()),
                }
                continue;
            }
        };

        log::debug!("command: {}", line.trim());
        let mut buf = Vec::new();
        let result = session.execute(cmd, &mut buf).await;
        std::io::stdout().write_all(&buf)?;
        std::io::stdout().flush()?;
        match result {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("error: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{ProjectCmd, TaskCmd};

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# setup").unwrap().is_none());
    }

    #[test]
    fn quoted_titles_are_one_argument() {
        match parse_line(r#"project new "Website Redesign" -d "Modern look""#).unwrap() {
            Some(ShellCommand::Project(ProjectCmd::New(args))) => {
                assert_eq!(args.title, "Website Redesign");
                assert_eq!(args.description, "Modern look");
            }
            _ => panic!("expected project new"),
        }
    }

    #[test]
    fn chat_keeps_the_raw_remainder() {
        match parse_line("ask   what's the best way to set priorities?").unwrap() {
            Some(ShellCommand::Chat(args)) => {
                assert_eq!(args.message(), "what's the best way to set priorities?")
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn bare_chat_is_a_usage_error() {
        assert!(matches!(parse_line("chat"), Err(LineError::Usage(_))));
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(matches!(
            parse_line(r#"task add p "unterminated"#),
            Err(LineError::UnbalancedQuotes)
        ));
    }

    #[test]
    fn help_is_a_display_error() {
        match parse_line("help") {
            Err(LineError::Usage(e)) => assert_eq!(e.kind(), ErrorKind::DisplayHelp),
            _ => panic!("expected help"),
        }
    }

    #[test]
    fn task_done_parses() {
        assert!(matches!(
            parse_line("task done p task-abc").unwrap(),
            Some(ShellCommand::Task(TaskCmd::Done(_)))
        ));
    }
}
