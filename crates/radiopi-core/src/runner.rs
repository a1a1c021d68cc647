//! External command runner and the `radio_cli` command payloads.

use std::future::Future;
use std::process::Stdio;

use tracing::{debug, info, warn};

use crate::config::RunnerKind;
use crate::error::{RadioError, Result};
use crate::platform;
use crate::station::Station;

/// Executes one external command.  Failures propagate to the caller.
pub trait Runner: Send + Sync + 'static {
    fn call(&self, args: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// Logs the command and does nothing else.
#[derive(Debug, Clone, Default)]
pub struct MockRunner;

impl Runner for MockRunner {
    async fn call(&self, args: &[String]) -> Result<()> {
        debug!("Runner: mock: {}", args.join(" "));
        Ok(())
    }
}

/// Spawns the command and waits for it.  A non-zero exit is an error.
/// Dropping the call kills the child, so an aborted watcher leaves no
/// `radio_cli` behind.
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl Runner for SubprocessRunner {
    async fn call(&self, args: &[String]) -> Result<()> {
        let command = args.join(" ");
        let Some((program, rest)) = args.split_first() else {
            return Err(RadioError::CommandSpawn {
                command,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        let status = tokio::process::Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| RadioError::CommandSpawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(RadioError::CommandFailed {
                command,
                status: status.to_string(),
            });
        }
        debug!("Runner: `{}` ok", command);
        Ok(())
    }
}

/// The runner selected by configuration.
#[derive(Debug, Clone)]
pub enum CommandRunner {
    Mock(MockRunner),
    Subprocess(SubprocessRunner),
}

impl CommandRunner {
    /// Pick a runner.  `Auto` uses the subprocess runner only when `program`
    /// can actually be found.
    pub fn discover(kind: RunnerKind, program: &str) -> Self {
        info!("Runner: Discovering");
        let runner = match kind {
            RunnerKind::Mock => CommandRunner::Mock(MockRunner),
            RunnerKind::Subprocess => CommandRunner::Subprocess(SubprocessRunner),
            RunnerKind::Auto => match platform::find_on_path(program) {
                Some(path) => {
                    debug!("Runner: found {:?}", path);
                    CommandRunner::Subprocess(SubprocessRunner)
                }
                None => {
                    warn!("Runner: `{}` not available, using mock runner!", program);
                    CommandRunner::Mock(MockRunner)
                }
            },
        };
        info!("Runner: Discovered: {}", runner.name());
        runner
    }

    /// Runner for the host power-off command.  Only an explicit mock config
    /// mocks it; a missing `radio_cli` says nothing about `systemctl`.
    pub fn for_power_off(kind: RunnerKind) -> Self {
        match kind {
            RunnerKind::Mock => {
                warn!("Runner: power-off is mocked, the host stays up");
                CommandRunner::Mock(MockRunner)
            }
            RunnerKind::Auto | RunnerKind::Subprocess => {
                CommandRunner::Subprocess(SubprocessRunner)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandRunner::Mock(_) => "mock",
            CommandRunner::Subprocess(_) => "subprocess",
        }
    }
}

impl Runner for CommandRunner {
    async fn call(&self, args: &[String]) -> Result<()> {
        match self {
            CommandRunner::Mock(r) => r.call(args).await,
            CommandRunner::Subprocess(r) => r.call(args).await,
        }
    }
}

// ── radio_cli payloads ────────────────────────────────────────────────────────

pub const DEFAULT_RADIO_CLI: &str = "radio_cli";

/// Volume passed with every tune command.
pub const TUNE_LEVEL: u8 = 63;

/// Builds `radio_cli` argument lists for the DAB board.
#[derive(Debug, Clone)]
pub struct RadioCli {
    program: String,
}

impl RadioCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn boot(&self) -> Vec<String> {
        vec![self.program.clone(), "--boot=D".to_string()]
    }

    pub fn tune(&self, station: &Station) -> Vec<String> {
        vec![
            self.program.clone(),
            format!("--component={}", station.component_id),
            format!("--service={}", station.service_id),
            format!("--frequency={}", station.frequency_index),
            "--play".to_string(),
            format!("--level={}", TUNE_LEVEL),
        ]
    }

    pub fn shutdown(&self) -> Vec<String> {
        vec![self.program.clone(), "--shutdown".to_string()]
    }
}

impl Default for RadioCli {
    fn default() -> Self {
        Self::new(DEFAULT_RADIO_CLI)
    }
}
