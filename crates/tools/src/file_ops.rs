//! File tools — read, write, append, list, exists.
//!
//! One action-dispatched tool per trust level. The sandboxed variant resolves
//! every path against the workspace root before touching the filesystem and
//! reports refusals as `[BLOCKED]` results rather than errors.

use async_trait::async_trait;
use kaede_core::error::ToolError;
use kaede_core::tool::{Tool, ToolResult};
use kaede_security::resolve_sandboxed;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Perform one file action at `path` and render the outcome.
async fn run_action(
    tool_name: &str,
    action: &str,
    path: &Path,
    shown_path: &str,
    content: &str,
) -> Result<ToolResult, ToolError> {
    debug!(tool = tool_name, action, path = shown_path, "File operation");

    let io_err = |e: std::io::Error| ToolError::ExecutionFailed {
        tool_name: tool_name.into(),
        reason: e.to_string(),
    };

    match action {
        "read" => match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(ToolResult::ok(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ToolResult::labeled(
                format!("[NOT FOUND] {shown_path}"),
            )),
            Err(e) => Err(io_err(e)),
        },
        "write" => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            tokio::fs::write(path, content).await.map_err(io_err)?;
            Ok(ToolResult::ok(format!(
                "[WRITTEN] {shown_path} ({} chars)",
                content.chars().count()
            )))
        }
        "append" => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            // True append mode: existing contents are never rewritten, so a
            // file the tool cannot read (non-UTF-8, say) is left intact
            let mut file = tokio::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .await
                .map_err(io_err)?;
            file.write_all(content.as_bytes()).await.map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
            Ok(ToolResult::ok(format!(
                "[APPENDED] {shown_path} (+{} chars)",
                content.chars().count()
            )))
        }
        "list" => {
            let meta = match tokio::fs::metadata(path).await {
                Ok(m) => m,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(ToolResult::labeled(format!("[NOT FOUND] {shown_path}")));
                }
                Err(e) => return Err(io_err(e)),
            };
            if meta.is_file() {
                return Ok(ToolResult::ok(shown_path));
            }
            let mut entries = tokio::fs::read_dir(path).await.map_err(io_err)?;
            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                names.push(if is_dir {
                    format!("[DIR] {name}")
                } else {
                    name
                });
            }
            names.sort();
            Ok(ToolResult::ok(if names.is_empty() {
                "(empty directory)".into()
            } else {
                names.join("\n")
            }))
        }
        "exists" => Ok(ToolResult::ok(if tokio::fs::try_exists(path).await.unwrap_or(false) {
            format!("{shown_path} exists")
        } else {
            format!("{shown_path} does not exist")
        })),
        other => Ok(ToolResult::labeled(format!("[UNKNOWN ACTION] {other}"))),
    }
}

fn parameters_schema(path_description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "action": {
                "type": "string",
                "enum": ["read", "write", "append", "list", "exists"],
                "description": "The file operation to perform"
            },
            "path": {
                "type": "string",
                "description": path_description
            },
            "content": {
                "type": "string",
                "description": "Content for write/append actions"
            }
        },
        "required": ["action", "path"]
    })
}

fn parse_args(arguments: &serde_json::Value) -> Result<(String, String, String), ToolError> {
    let action = arguments["action"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'action' argument".into()))?;
    let path = arguments["path"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
    let content = arguments["content"].as_str().unwrap_or_default();
    Ok((action.into(), path.into(), content.into()))
}

/// File operations anywhere on the filesystem.
pub struct FileOpsTool;

impl FileOpsTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileOpsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileOpsTool {
    fn name(&self) -> &str {
        "file_ops"
    }

    fn description(&self) -> &str {
        "Read, write, append, list, or check files anywhere on the filesystem."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        parameters_schema("Absolute or relative file path")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let (action, path, content) = parse_args(&arguments)?;
        run_action(self.name(), &action, Path::new(&path), &path, &content).await
    }
}

/// File operations confined to the workspace sandbox.
pub struct SandboxedFileOpsTool {
    root: PathBuf,
}

impl SandboxedFileOpsTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for SandboxedFileOpsTool {
    fn name(&self) -> &str {
        "safe_file_ops"
    }

    fn description(&self) -> &str {
        "Read, write, append, list, or check files inside the workspace sandbox."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        parameters_schema("Path relative to the workspace root")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let (action, path, content) = parse_args(&arguments)?;

        let resolved = match resolve_sandboxed(&self.root, &path) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::labeled(format!("[BLOCKED] {e}"))),
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("Failed to create sandbox root: {e}"),
            })?;

        run_action(self.name(), &action, &resolved, &path, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({
                "action": "write", "path": "notes.txt", "content": "hello"
            }))
            .await
            .unwrap();
        assert!(result.output.starts_with("[WRITTEN] notes.txt (5 chars)"));

        let result = tool
            .execute(serde_json::json!({"action": "read", "path": "notes.txt"}))
            .await
            .unwrap();
        assert_eq!(result.output, "hello");
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({
                "action": "write", "path": "a/b/c.txt", "content": "deep"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert!(dir.path().join("a/b/c.txt").exists());
    }

    #[tokio::test]
    async fn append_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        tool.execute(serde_json::json!({
            "action": "write", "path": "log.txt", "content": "one\n"
        }))
        .await
        .unwrap();
        let result = tool
            .execute(serde_json::json!({
                "action": "append", "path": "log.txt", "content": "two\n"
            }))
            .await
            .unwrap();
        assert!(result.output.contains("+4 chars"));

        let text = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(text, "one\ntwo\n");
    }

    #[tokio::test]
    async fn append_to_missing_file_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({
                "action": "append", "path": "fresh.txt", "content": "first"
            }))
            .await
            .unwrap();
        assert!(result.success);
        let text = std::fs::read_to_string(dir.path().join("fresh.txt")).unwrap();
        assert_eq!(text, "first");
    }

    #[tokio::test]
    async fn read_missing_is_not_found_label() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({"action": "read", "path": "ghost.txt"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "[NOT FOUND] ghost.txt");
    }

    #[tokio::test]
    async fn append_preserves_unreadable_contents() {
        let dir = tempfile::tempdir().unwrap();
        // Not valid UTF-8; a read-modify-write append would lose it
        std::fs::write(dir.path().join("data.bin"), [0xFF, 0xFE, 0x00, 0x41]).unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({
                "action": "append", "path": "data.bin", "content": "tail"
            }))
            .await
            .unwrap();
        assert!(result.success);

        let bytes = std::fs::read(dir.path().join("data.bin")).unwrap();
        assert_eq!(bytes, [0xFF, 0xFE, 0x00, 0x41, b't', b'a', b'i', b'l']);
    }

    #[tokio::test]
    async fn list_missing_path_is_not_found_label() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({"action": "list", "path": "ghost_dir"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "[NOT FOUND] ghost_dir");
    }

    #[tokio::test]
    async fn list_of_file_returns_the_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain.txt"), "x").unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({"action": "list", "path": "plain.txt"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "plain.txt");
    }

    #[tokio::test]
    async fn list_marks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({"action": "list", "path": "."}))
            .await
            .unwrap();
        assert!(result.output.contains("[DIR] sub"));
        assert!(result.output.contains("file.txt"));
    }

    #[tokio::test]
    async fn exists_reports_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("here.txt"), "x").unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({"action": "exists", "path": "here.txt"}))
            .await
            .unwrap();
        assert_eq!(result.output, "here.txt exists");

        let result = tool
            .execute(serde_json::json!({"action": "exists", "path": "gone.txt"}))
            .await
            .unwrap();
        assert_eq!(result.output, "gone.txt does not exist");
    }

    #[tokio::test]
    async fn unknown_action_is_labeled() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        let result = tool
            .execute(serde_json::json!({"action": "delete", "path": "x"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "[UNKNOWN ACTION] delete");
    }

    #[tokio::test]
    async fn escape_attempts_are_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SandboxedFileOpsTool::new(dir.path());

        for path in ["../outside.txt", "/etc/passwd", "a/../../b"] {
            let result = tool
                .execute(serde_json::json!({"action": "read", "path": path}))
                .await
                .unwrap();
            assert!(
                result.output.starts_with("[BLOCKED]"),
                "{path} should be blocked, got {}",
                result.output
            );
        }
    }

    #[tokio::test]
    async fn unrestricted_reads_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("anywhere.txt");
        std::fs::write(&file, "reachable").unwrap();
        let tool = FileOpsTool::new();

        let result = tool
            .execute(serde_json::json!({
                "action": "read", "path": file.to_str().unwrap()
            }))
            .await
            .unwrap();
        assert_eq!(result.output, "reachable");
    }
}
