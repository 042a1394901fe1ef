//! Execution of the `op` command-line tool.
//!
//! [`CommandRunner`] is the seam between this crate and the operating
//! system: [`SystemRunner`] spawns real processes, while tests substitute
//! a scripted runner. [`Invoker`] sits on top of a runner and adds the
//! session environment, output trimming and failure reporting every item
//! command needs.

use crate::session::Session;
use crate::{OpError, Result};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Name of the 1Password CLI binary.
pub const OP_BINARY: &str = "op";

/// Where a child process reads its standard input from.
#[derive(Clone, PartialEq, Eq)]
pub enum Stdin {
    /// Inherit the caller's standard input (interactive prompts).
    Inherit,
    /// Write the password to a pipe, then close it.
    Password(String),
    /// Connect standard input to the null device.
    Null,
}

impl fmt::Debug for Stdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => write!(f, "Inherit"),
            Self::Password(_) => write!(f, "Password(<redacted>)"),
            Self::Null => write!(f, "Null"),
        }
    }
}

/// A fully described invocation of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpCommand {
    /// Program to execute
    pub program: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment
    pub env: Vec<(String, String)>,
    /// Standard input source
    pub stdin: Stdin,
    /// Run the child as this user id (unix only)
    pub uid: Option<u32>,
    redacted: Vec<usize>,
}

impl OpCommand {
    /// Creates an `op` invocation with the given arguments.
    pub fn op<S: AsRef<str>>(args: &[S]) -> Self {
        Self::new(OP_BINARY, args)
    }

    /// Creates an invocation of an arbitrary program.
    pub fn new<S: AsRef<str>>(program: &str, args: &[S]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            env: Vec::new(),
            stdin: Stdin::Null,
            uid: None,
            redacted: Vec::new(),
        }
    }

    /// Adds an environment variable for the child only.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the standard input source.
    pub fn with_stdin(mut self, stdin: Stdin) -> Self {
        self.stdin = stdin;
        self
    }

    /// Sets the user id the child runs as.
    pub fn with_uid(mut self, uid: Option<u32>) -> Self {
        self.uid = uid;
        self
    }

    /// Hides the argument at `index` from [`describe`](Self::describe).
    pub fn redact(mut self, index: usize) -> Self {
        self.redacted.push(index);
        self
    }

    /// Human-readable command line, safe for logs and error messages.
    pub fn describe(&self) -> String {
        let mut line = self.program.clone();
        for (i, arg) in self.args.iter().enumerate() {
            line.push(' ');
            if self.redacted.contains(&i) {
                line.push_str("<redacted>");
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status zero
    pub success: bool,
    /// Exit code, if the command exited normally
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// A successful exit with the given standard output.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// A failed exit (status 1) with the given standard error.
    pub fn failure(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        out.extend_from_slice(&self.stdout);
        out.extend_from_slice(&self.stderr);
        out
    }
}

/// Runs external commands.
///
/// Implementations return `Ok` for any command that ran to completion,
/// whatever its exit status; `Err` is reserved for commands that could not
/// be run at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command and waits for it to exit.
    async fn run(&self, command: &OpCommand) -> Result<CommandOutput>;
}

/// Runs commands as real child processes via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &OpCommand) -> Result<CommandOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(match command.stdin {
            Stdin::Inherit => Stdio::inherit(),
            Stdin::Password(_) => Stdio::piped(),
            Stdin::Null => Stdio::null(),
        });

        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        #[cfg(unix)]
        {
            if let Some(uid) = command.uid {
                cmd.uid(uid);
            }
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OpError::ToolNotInstalled(format!("{} command not found", command.program))
            } else {
                OpError::Io(e)
            }
        })?;

        // The password is written from its own task so a child that prints
        // before reading cannot deadlock against us; dropping the handle
        // closes the pipe and signals end of input.
        let writer = match (&command.stdin, child.stdin.take()) {
            (Stdin::Password(password), Some(mut stdin)) => {
                let password = password.clone();
                Some(tokio::spawn(async move {
                    let result = stdin.write_all(password.as_bytes()).await;
                    drop(stdin);
                    result
                }))
            }
            _ => None,
        };

        let output = child.wait_with_output().await?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(program = %command.program, error = %e, "stdin write failed"),
                Err(e) => warn!(program = %command.program, error = %e, "stdin writer task failed"),
            }
        }

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Removes one trailing newline byte, if present.
pub fn strip_trailing_newline(mut output: Vec<u8>) -> Vec<u8> {
    if output.last() == Some(&b'\n') {
        output.pop();
    }
    output
}

/// Runs `op` item commands on behalf of a signed-in [`Session`].
#[derive(Clone)]
pub struct Invoker {
    runner: Arc<dyn CommandRunner>,
    uid: Option<u32>,
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker").field("uid", &self.uid).finish_non_exhaustive()
    }
}

impl Invoker {
    /// Creates an invoker running commands through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>, uid: Option<u32>) -> Self {
        Self { runner, uid }
    }

    /// The underlying command runner.
    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Runs `op <args>` with the session token in the child environment.
    ///
    /// See [`run_command`](Self::run_command).
    pub async fn run(&self, session: &Session, args: &[&str]) -> Result<Vec<u8>> {
        self.run_command(session, OpCommand::op(args)).await
    }

    /// Runs a prepared command with the session token in the child
    /// environment.
    ///
    /// The child inherits this process's environment plus
    /// `OP_SESSION_<account>=<token>`; this process's own environment is
    /// left untouched. Standard output and standard error are captured
    /// together and one trailing newline is removed on success.
    ///
    /// # Errors
    ///
    /// A non-zero exit yields [`OpError::CommandFailed`] carrying the raw
    /// output, which callers classify with [`crate::classify`].
    pub async fn run_command(&self, session: &Session, command: OpCommand) -> Result<Vec<u8>> {
        let command = command
            .with_env(session.env_var(), session.token())
            .with_uid(self.uid);

        debug!(command = %command.describe(), account = %session.account(), "running op");
        let output = self.runner.run(&command).await?;

        if !output.success {
            let combined = output.combined();
            debug!(
                command = %command.describe(),
                code = ?output.code,
                "op exited unsuccessfully"
            );
            return Err(OpError::CommandFailed {
                command: command.describe(),
                output: String::from_utf8_lossy(&combined).into_owned(),
            });
        }

        Ok(strip_trailing_newline(output.combined()))
    }
}
