//! Debug log collection through the privileged helper script.
//!
//! The helper gathers Bassline's logs and configuration files and prints them
//! to stdout. It must run as root, so it is invoked through `sudo`. Callers
//! only ever see a [`DebugLogBundle`] or a [`LogCollectionScriptFailedError`];
//! the subprocess is an implementation detail.

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{error, info};

use crate::config::DebugLogsConfig;

/// Privilege-escalation front end used to run the helper.
pub const DEFAULT_PRIVILEGE_COMMAND: &str = "sudo";

/// Location of the helper installed by the Bassline package.
pub const DEFAULT_SCRIPT_PATH: &str = "/opt/bassline-privileged/collect-debug-logs";

/// Asks the helper for quiet, non-interactive output.
pub const QUIET_FLAG: &str = "-q";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The helper script did not complete successfully.
#[derive(Debug, Error)]
#[error("log collection script failed: `{command}` {failure}{}", stderr_suffix(.stderr))]
pub struct LogCollectionScriptFailedError {
    command: String,
    failure: ScriptFailure,
    stderr: String,
}

/// How the helper process failed.
#[derive(Debug, Error)]
pub enum ScriptFailure {
    #[error("returned non-zero exit status {0}")]
    NonZeroExit(i32),

    #[error("was terminated by a signal")]
    Terminated,

    #[error("could not be started: {0}")]
    Launch(std::io::Error),
}

impl LogCollectionScriptFailedError {
    /// The command line that was run.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn failure(&self) -> &ScriptFailure {
        &self.failure
    }

    /// Exit code of the helper, if it exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self.failure {
            ScriptFailure::NonZeroExit(code) => Some(code),
            _ => None,
        }
    }

    /// Whatever the helper wrote to stderr, trimmed.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Raw stdout of the helper script, returned verbatim.
///
/// The content is whatever the helper prints (logs and config snapshots);
/// no structure is imposed on it here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLogBundle(Vec<u8>);

impl DebugLogBundle {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text view of the bundle. Invalid UTF-8 is replaced, not rejected.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<DebugLogBundle> for Vec<u8> {
    fn from(bundle: DebugLogBundle) -> Self {
        bundle.0
    }
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Runs the debug log helper and captures its output.
///
/// The command line is fixed when the collector is built. Each call to
/// [`LogCollector::collect`] spawns a fresh process; nothing is cached and no
/// state is shared between calls.
#[derive(Debug, Clone)]
pub struct LogCollector {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for LogCollector {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRIVILEGE_COMMAND,
            [DEFAULT_SCRIPT_PATH, QUIET_FLAG],
        )
    }
}

impl LogCollector {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            program: program.as_ref().to_os_string(),
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
        }
    }

    /// Build the command line from configuration. An empty
    /// `privilege_command` runs the script directly.
    pub fn from_config(config: &DebugLogsConfig) -> Self {
        let mut args: Vec<OsString> = Vec::new();
        let program = if config.privilege_command.trim().is_empty() {
            config.script_path.clone().into_os_string()
        } else {
            args.push(config.script_path.clone().into_os_string());
            OsString::from(config.privilege_command.trim())
        };
        if config.quiet {
            args.push(OsString::from(QUIET_FLAG));
        }
        Self { program, args }
    }

    /// Human-readable command line, used in logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the helper and return its full stdout.
    ///
    /// Blocks until the process exits. There is no timeout and no retry: the
    /// call either yields the whole bundle or fails.
    pub fn collect(&self) -> Result<DebugLogBundle, LogCollectionScriptFailedError> {
        let command = self.command_line();
        info!(%command, "collecting debug logs");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| fail(command.clone(), ScriptFailure::Launch(e), String::new()))?;

        if output.status.success() {
            info!(bytes = output.stdout.len(), "debug logs collected");
            return Ok(DebugLogBundle(output.stdout));
        }

        let failure = match output.status.code() {
            Some(code) => ScriptFailure::NonZeroExit(code),
            None => ScriptFailure::Terminated,
        };
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(fail(command, failure, stderr))
    }
}

fn fail(command: String, failure: ScriptFailure, stderr: String) -> LogCollectionScriptFailedError {
    error!(%command, %failure, %stderr, "debug log collection failed");
    LogCollectionScriptFailedError {
        command,
        failure,
        stderr,
    }
}

/// Collect debug logs with the stock `sudo` helper invocation.
pub fn collect() -> Result<DebugLogBundle, LogCollectionScriptFailedError> {
    LogCollector::default().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
