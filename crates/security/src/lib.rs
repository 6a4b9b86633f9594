//! Security checks for the sandboxed tool variants.
//!
//! Two independent guards, both of which must pass before any I/O or
//! process spawn happens:
//! - **Path resolution**: every path handed to a sandboxed file tool must
//!   resolve strictly within one fixed root directory.
//! - **Command guarding**: sandboxed shell commands must use an allow-listed
//!   base command and must not contain shell metacharacters used for
//!   chaining, substitution, redirection, or traversal.

pub mod command;
pub mod path;

pub use command::{check_command, CommandPolicy, CommandViolation};
pub use path::{resolve_sandboxed, SandboxPathError};
