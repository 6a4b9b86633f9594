//! Built-in tool implementations for Kaede.
//!
//! Each capability comes in two trust variants sharing one contract:
//! - unrestricted — for hosts that are already isolated
//! - sandboxed — confined to a workspace root and a command allow-list
//!
//! The registry is constructed once at startup and passed by reference to
//! whatever builds the agent loop; there is no global tool state.

pub mod file_ops;
pub mod shell;
pub mod web_fetch;

use kaede_core::tool::ToolRegistry;
use kaede_security::CommandPolicy;
use std::path::Path;

/// A registry with the unrestricted tool set. Only for hosts where the
/// process itself is already isolated.
pub fn unrestricted_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::ShellTool::new()));
    registry.register(Box::new(file_ops::FileOpsTool::new()));
    registry.register(Box::new(web_fetch::WebFetchTool::new()));
    registry
}

/// A registry with the sandboxed tool set, confined to `root`.
///
/// An empty `allowed_commands` means the built-in default allow-list.
pub fn sandboxed_registry(root: &Path, allowed_commands: Vec<String>) -> ToolRegistry {
    let policy = if allowed_commands.is_empty() {
        CommandPolicy::default()
    } else {
        CommandPolicy::new(allowed_commands)
    };

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::SandboxedShellTool::new(root, policy)));
    registry.register(Box::new(file_ops::SandboxedFileOpsTool::new(root)));
    registry.register(Box::new(web_fetch::WebFetchTool::new()));
    registry
}
