//! Shell tools — execute system commands.
//!
//! Two variants share the execution path: the unrestricted variant runs
//! anything with a 120 s default timeout; the sandboxed variant checks the
//! command against an allow-list and metacharacter guard, runs inside the
//! sandbox root, and defaults to 30 s. A timeout is a labeled result, never
//! an error.

use async_trait::async_trait;
use kaede_core::error::ToolError;
use kaede_core::tool::{Tool, ToolResult};
use kaede_security::{check_command, CommandPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const UNRESTRICTED_TIMEOUT_SECS: u64 = 120;
const SANDBOXED_TIMEOUT_SECS: u64 = 30;

/// Run a command through the system shell and render its output.
async fn run_command(
    tool_name: &str,
    command: &str,
    timeout_secs: u64,
    cwd: Option<&Path>,
) -> Result<ToolResult, ToolError> {
    debug!(tool = tool_name, command, "Executing shell command");

    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Ok(ToolResult::labeled(format!(
                "[TIMEOUT] Command exceeded {timeout_secs}s"
            )));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut text = String::new();
    if !stdout.is_empty() {
        text.push_str(&stdout);
    }
    if !stderr.is_empty() {
        text.push_str(&format!("\n[STDERR]\n{stderr}"));
    }
    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        text.push_str(&format!("\n[EXIT CODE: {code}]"));
    }

    let text = text.trim().to_string();
    Ok(ToolResult {
        success: output.status.success(),
        output: if text.is_empty() {
            "(no output)".into()
        } else {
            text
        },
        data: None,
    })
}

fn timeout_from_args(arguments: &serde_json::Value, default_secs: u64) -> u64 {
    arguments["timeout"].as_u64().unwrap_or(default_secs)
}

/// Execute arbitrary shell commands. No restrictions — intended only for
/// hosts that are already isolated.
pub struct ShellTool;

impl ShellTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command on the system. No restrictions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: 120)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;
        let timeout = timeout_from_args(&arguments, UNRESTRICTED_TIMEOUT_SECS);

        run_command(self.name(), command, timeout, None).await
    }
}

/// Execute allow-listed shell commands inside the workspace sandbox.
pub struct SandboxedShellTool {
    root: PathBuf,
    policy: CommandPolicy,
}

impl SandboxedShellTool {
    pub fn new(root: impl Into<PathBuf>, policy: CommandPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }
}

#[async_trait]
impl Tool for SandboxedShellTool {
    fn name(&self) -> &str {
        "safe_shell"
    }

    fn description(&self) -> &str {
        "Execute safe shell commands in the workspace sandbox."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The safe shell command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: 30)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;
        let timeout = timeout_from_args(&arguments, SANDBOXED_TIMEOUT_SECS);

        if let Err(violation) = check_command(&self.policy, command) {
            return Ok(ToolResult::labeled(format!("[BLOCKED] {violation}")));
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("Failed to create sandbox root: {e}"),
            })?;

        run_command(self.name(), command, timeout, Some(&self.root)).await
    }
}
