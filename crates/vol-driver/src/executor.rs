//! Command executor boundary
//!
//! The driver never spawns processes itself; it hands a fully formed
//! argument list to a [`CommandExecutor`]. Retry and timeout policy live on
//! this side of the boundary, not in the driver.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use san_volume_core::{ExecutionError, Result};

/// Runs one appliance management command and captures its output
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `args` (program followed by its arguments) and return the
    /// captured standard output. Any non-zero exit surfaces as an
    /// execution error carrying the appliance diagnostic.
    async fn execute(&self, args: &[String]) -> Result<String>;
}

async fn run(mut cmd: Command, rendered: &str) -> Result<String> {
    debug!("Executing {rendered}");

    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ExecutionError::Spawn {
            command: rendered.to_string(),
            reason: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        Ok(stdout)
    } else {
        warn!(
            "{rendered} failed with exit code {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
        let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };
        Err(ExecutionError::CommandFailed {
            command: rendered.to_string(),
            output: diagnostic.trim().to_string(),
        }
        .into())
    }
}

/// Executor spawning the management CLI on the local host
///
/// Useful when the appliance CLI is installed alongside the driver, and in
/// integration environments.
#[derive(Debug, Default)]
pub struct LocalExecutor;

#[async_trait]
impl CommandExecutor for LocalExecutor {
    async fn execute(&self, args: &[String]) -> Result<String> {
        let rendered = args.join(" ");
        let (program, rest) = args.split_first().ok_or_else(|| ExecutionError::Spawn {
            command: String::new(),
            reason: "empty argument list".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(rest);
        run(cmd, &rendered).await
    }
}

/// SSH endpoint of the appliance management interface
#[derive(Debug, Clone)]
pub struct SshEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Private key file; password agents are left to the ssh configuration
    pub identity_file: Option<PathBuf>,
}

impl SshEndpoint {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            identity_file: None,
        }
    }
}

/// Executor running the management CLI on the appliance over SSH
#[derive(Debug)]
pub struct SshExecutor {
    endpoint: SshEndpoint,
}

impl SshExecutor {
    pub fn new(endpoint: SshEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl CommandExecutor for SshExecutor {
    async fn execute(&self, args: &[String]) -> Result<String> {
        let rendered = format!(
            "ssh {}@{} {}",
            self.endpoint.user,
            self.endpoint.host,
            args.join(" ")
        );

        let mut cmd = Command::new("ssh");
        cmd.arg("-p").arg(self.endpoint.port.to_string());
        if let Some(identity) = &self.endpoint.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(format!("{}@{}", self.endpoint.user, self.endpoint.host));
        cmd.arg("--");
        cmd.args(args);
        run(cmd, &rendered).await
    }
}
