//! Process runner
//!
//! Runs one external tool at a time, optionally feeding confirmation text on
//! stdin, and buffers its output. Nothing here interprets the output.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AndroidToolError, Result};

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Text written to the child's stdin before it is closed
    pub stdin: Option<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Feed `answer` followed by a newline `times` times, the way `yes` would
    pub fn answer_repeatedly(self, answer: &str, times: usize) -> Self {
        let input = format!("{}\n", answer).repeat(times.max(1));
        self.stdin(input)
    }

    /// Program file name followed by the arguments, used for matching and logs
    pub fn invocation(&self) -> String {
        let program = self
            .program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned());

        std::iter::once(program)
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(|c: char| c.is_whitespace() || c == ';') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit code and decoded output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    fn from_output(output: std::process::Output) -> Self {
        Self {
            // Killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Executes commands on behalf of the SDK wrappers
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<CommandResult>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn log_output(stream: &str, text: &str) {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            debug!("[{}] {}", stream, line);
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandResult> {
        match &command.cwd {
            Some(cwd) => debug!(
                "Executing command: \"{}\" using working directory: \"{}\"",
                command,
                cwd.display()
            ),
            None => debug!("Executing command: \"{}\"", command),
        }

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            });

        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => AndroidToolError::BinaryNotFound {
                binary: command.program.display().to_string(),
            },
            _ => AndroidToolError::Io(e),
        })?;

        // Feed stdin while the output pipes drain so neither side blocks
        let stdin = child.stdin.take();
        let feed = async {
            let (Some(input), Some(mut stdin)) = (&command.stdin, stdin) else {
                return Ok(());
            };
            // The tool may exit before consuming every confirmation
            match stdin.write_all(input.as_bytes()).await {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin early", command.invocation());
                    Ok(())
                }
                other => other,
            }
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;
        let result = CommandResult::from_output(output);

        Self::log_output("stdout", &result.stdout);
        Self::log_output("stderr", &result.stderr);
        debug!("{} exited with {}", command.invocation(), result.exit_code);

        Ok(result)
    }
}

/// Runner that replays canned results instead of spawning processes
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: Vec<(String, CommandResult)>,
    calls: parking_lot::Mutex<Vec<CommandLine>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any command whose invocation starts with `prefix`
    ///
    /// The prefix is the program file name followed by its arguments, e.g.
    /// `"sdkmanager --verbose --list"`. The longest matching prefix wins.
    pub fn on(mut self, prefix: &str, result: CommandResult) -> Self {
        self.scripts.push((prefix.to_string(), result));
        self
    }

    /// Shorthand for a successful command printing `stdout`
    pub fn on_stdout(self, prefix: &str, stdout: &str) -> Self {
        self.on(prefix, CommandResult::new(0, stdout, ""))
    }

    /// Every command run so far, in order
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().clone()
    }

    /// Invocations of every command run so far
    pub fn invocations(&self) -> Vec<String> {
        self.calls.lock().iter().map(CommandLine::invocation).collect()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandResult> {
        self.calls.lock().push(command.clone());
        let invocation = command.invocation();

        self.scripts
            .iter()
            .filter(|(prefix, _)| invocation.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, result)| result.clone())
            .ok_or_else(|| AndroidToolError::BinaryNotFound {
                binary: command.program.display().to_string(),
            })
    }
}
