// runner.rs - Subprocess execution with run-log bookkeeping
// Purpose: Every external tool goes through CommandRunner so each invocation
//          leaves one "Running:" line, plus one "Error:" line if it fails

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::logger::RunLog;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Command '{program}' not found on PATH")]
    NotFound { program: String },

    #[error("Command '{command}' could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' returned non-zero exit status {status}")]
    ExitStatus {
        command: String,
        code: Option<i32>,
        status: String,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {after:?}")]
    TimedOut { command: String, after: Duration },
}

/// Result of one invocation, keeping "failed" apart from "produced nothing"
#[derive(Debug)]
pub enum CommandOutcome {
    Succeeded { stdout: String, stderr: String },
    Failed(RunError),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded { .. })
    }

    /// The legacy view: stdout on success, empty string otherwise
    pub fn into_stdout(self) -> String {
        match self {
            CommandOutcome::Succeeded { stdout, .. } => stdout,
            CommandOutcome::Failed(_) => String::new(),
        }
    }
}

pub struct CommandRunner {
    log: RunLog,
    search_path: Option<OsString>,
    timeout: Option<Duration>,
    show_spinner: bool,
}

impl CommandRunner {
    pub fn new(log: RunLog, search_path: Option<OsString>, timeout: Option<Duration>) -> Self {
        Self {
            log,
            search_path,
            timeout,
            show_spinner: false,
        }
    }

    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.show_spinner = enabled;
        self
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Run a command and return its stdout; failures are logged and yield ""
    pub async fn run(&self, command: &[String]) -> String {
        self.execute(command).await.into_stdout()
    }

    pub async fn execute(&self, command: &[String]) -> CommandOutcome {
        let rendered = command.join(" ");
        self.log.log_or_warn(&format!("Running: {}", rendered));

        let spinner = self.spinner(&rendered);
        let outcome = self.spawn_and_wait(command, &rendered).await;
        spinner.finish_and_clear();

        if let CommandOutcome::Failed(ref err) = outcome {
            self.log.log_or_warn(&format!("Error: {}", err));
        }
        outcome
    }

    async fn spawn_and_wait(&self, command: &[String], rendered: &str) -> CommandOutcome {
        let Some((program, args)) = command.split_first() else {
            return CommandOutcome::Failed(RunError::EmptyCommand);
        };

        let resolved = match self.resolve(program) {
            Some(path) => path,
            None => {
                return CommandOutcome::Failed(RunError::NotFound {
                    program: program.clone(),
                });
            }
        };

        let mut cmd = Command::new(&resolved);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref path) = self.search_path {
            cmd.env("PATH", path);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                return CommandOutcome::Failed(RunError::Spawn {
                    command: rendered.to_string(),
                    source,
                });
            }
        };

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    return CommandOutcome::Failed(RunError::TimedOut {
                        command: rendered.to_string(),
                        after: limit,
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(source) => {
                return CommandOutcome::Failed(RunError::Spawn {
                    command: rendered.to_string(),
                    source,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            CommandOutcome::Succeeded { stdout, stderr }
        } else {
            let code = output.status.code();
            let status = match code {
                Some(code) => code.to_string(),
                None => "(terminated by signal)".to_string(),
            };
            CommandOutcome::Failed(RunError::ExitStatus {
                command: rendered.to_string(),
                code,
                status,
                stderr,
            })
        }
    }

    /// Absolute/relative paths are taken as-is, bare names are looked up on the search PATH
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        if program.contains(std::path::MAIN_SEPARATOR) {
            let path = PathBuf::from(program);
            return path.exists().then_some(path);
        }
        let cwd = std::env::current_dir().ok()?;
        match self.search_path {
            Some(ref path) => which::which_in(program, Some(path), cwd).ok(),
            None => which::which(program).ok(),
        }
    }

    fn spinner(&self, rendered: &str) -> ProgressBar {
        if !self.show_spinner {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{elapsed}] {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(rendered.dimmed().to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}
