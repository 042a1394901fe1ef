//! Scripted stand-ins for the `op` CLI and its configuration file.
//!
//! These let code built on opsession be tested without 1Password installed.
//!
//! # Example
//!
//! ```
//! use opsession::mock::{MockConfig, MockRunner};
//! use opsession::{Op, Settings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> opsession::Result<()> {
//!     let runner = Arc::new(MockRunner::new());
//!     runner.push_success("export OP_SESSION_doc_example=\"tok\"\n");
//!     runner.push_success("123456\n");
//!
//!     let op = Op::new(
//!         Settings::new()
//!             .with_config_source(Arc::new(MockConfig::new(r#"{"latest_signin":"doc_example"}"#)))
//!             .with_runner(runner.clone()),
//!     )
//!     .await?;
//!
//!     assert_eq!(op.get_totp("github").await?, "123456");
//!     assert_eq!(runner.calls()[1].args, vec!["get", "totp", "github"]);
//!     Ok(())
//! }
//! ```

use crate::account::ConfigSource;
use crate::cli::{CommandOutput, CommandRunner, OpCommand};
use crate::{OpError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

enum Scripted {
    Output(CommandOutput),
    NotInstalled,
}

/// Command runner that replays queued outputs and records every call.
///
/// Outputs are returned in the order they were pushed. Running a command
/// with nothing queued is an error, so unexpected invocations fail loudly.
#[derive(Default)]
pub struct MockRunner {
    queue: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<OpCommand>>,
}

impl MockRunner {
    /// Creates a runner with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an output for the next call.
    pub fn push_output(&self, output: CommandOutput) {
        self.queue.lock().unwrap().push_back(Scripted::Output(output));
    }

    /// Queues a zero exit with the given standard output.
    pub fn push_success(&self, stdout: impl Into<Vec<u8>>) {
        self.push_output(CommandOutput::success(stdout));
    }

    /// Queues a non-zero exit with the given standard error.
    pub fn push_failure(&self, stderr: impl Into<Vec<u8>>) {
        self.push_output(CommandOutput::failure(stderr));
    }

    /// Queues a failure to start the program at all.
    pub fn push_not_installed(&self) {
        self.queue.lock().unwrap().push_back(Scripted::NotInstalled);
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<OpCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of commands run so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of queued outputs not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &OpCommand) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::NotInstalled) => Err(OpError::ToolNotInstalled(format!(
                "{} command not found",
                command.program
            ))),
            None => Err(OpError::Other(anyhow::anyhow!(
                "mock runner has no output queued for: {}",
                command.describe()
            ))),
        }
    }
}

/// In-memory configuration record.
#[derive(Debug, Clone)]
pub struct MockConfig {
    data: Option<Vec<u8>>,
}

impl MockConfig {
    /// A configuration record with the given contents.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    /// A configuration record that does not exist.
    pub fn missing() -> Self {
        Self { data: None }
    }
}

impl ConfigSource for MockConfig {
    fn read(&self) -> Result<Vec<u8>> {
        self.data.clone().ok_or_else(|| {
            OpError::ConfigMissing(PathBuf::from(crate::account::DEFAULT_CONFIG_PATH))
        })
    }
}
