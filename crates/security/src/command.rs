//! Shell command guarding for the sandboxed shell tool.
//!
//! A command passes only if its base command (first word) is on the
//! allow-list AND the full command string is free of metacharacters used
//! for chaining, substitution, redirection, or path traversal.

/// Substrings that disqualify a command regardless of its base command.
/// `>` also covers `>>`; `/` keeps both absolute paths and traversal out of
/// reach, since sandboxed commands run with the sandbox root as cwd.
const DANGEROUS_PATTERNS: &[&str] = &["..", "~", "/", "|", ";", "&&", "||", "`", "$(", ">"];

/// The default allow-list of base commands for sandboxed execution.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "ls", "cat", "echo", "pwd", "mkdir", "touch", "grep", "find", "head", "tail", "wc", "sort",
    "uniq", "cp", "mv", "rm", "git", "curl", "wget", "python", "python3", "pip", "pip3", "node",
    "npm", "cargo",
];

/// The allow-list policy for sandboxed shell execution.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    allowed_commands: Vec<String>,
}

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandViolation {
    Empty,
    NotAllowed { base_command: String },
    DangerousPattern { pattern: &'static str },
}

impl std::fmt::Display for CommandViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty command"),
            Self::NotAllowed { base_command } => {
                write!(f, "Command '{base_command}' not allowed")
            }
            Self::DangerousPattern { pattern } => {
                write!(f, "Dangerous pattern '{pattern}' detected")
            }
        }
    }
}

impl CommandPolicy {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self { allowed_commands }
    }

    pub fn allowed_commands(&self) -> &[String] {
        &self.allowed_commands
    }
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED_COMMANDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        )
    }
}

/// Check a command string against the policy.
pub fn check_command(policy: &CommandPolicy, command: &str) -> Result<(), CommandViolation> {
    let base_command = match command.split_whitespace().next() {
        Some(word) => word,
        None => return Err(CommandViolation::Empty),
    };

    if !policy.allowed_commands.iter().any(|a| a == base_command) {
        return Err(CommandViolation::NotAllowed {
            base_command: base_command.into(),
        });
    }

    for pattern in DANGEROUS_PATTERNS {
        if command.contains(pattern) {
            return Err(CommandViolation::DangerousPattern { pattern });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_plain_commands_pass() {
        let policy = CommandPolicy::default();
        assert!(check_command(&policy, "ls").is_ok());
        assert!(check_command(&policy, "cat notes.txt").is_ok());
        assert!(check_command(&policy, "git status").is_ok());
    }

    #[test]
    fn disallowed_base_command_rejected() {
        let policy = CommandPolicy::default();
        let err = check_command(&policy, "sudo rm file").unwrap_err();
        assert_eq!(
            err,
            CommandViolation::NotAllowed {
                base_command: "sudo".into()
            }
        );
    }

    #[test]
    fn empty_command_rejected() {
        let policy = CommandPolicy::default();
        assert_eq!(check_command(&policy, "  "), Err(CommandViolation::Empty));
    }

    #[test]
    fn chaining_and_substitution_rejected() {
        let policy = CommandPolicy::default();
        for cmd in [
            "ls ; rm file",
            "cat a && cat b",
            "echo hi || true",
            "echo `whoami`",
            "echo $(whoami)",
            "cat a | grep b",
        ] {
            assert!(
                matches!(
                    check_command(&policy, cmd),
                    Err(CommandViolation::DangerousPattern { .. })
                ),
                "expected rejection for: {cmd}"
            );
        }
    }

    #[test]
    fn redirection_rejected() {
        let policy = CommandPolicy::default();
        assert!(check_command(&policy, "echo hi > out.txt").is_err());
        assert!(check_command(&policy, "echo hi >> out.txt").is_err());
    }

    #[test]
    fn traversal_and_home_rejected() {
        let policy = CommandPolicy::default();
        assert!(check_command(&policy, "cat ../secret").is_err());
        assert!(check_command(&policy, "ls ~").is_err());
    }

    #[test]
    fn rm_rf_root_rejected() {
        let policy = CommandPolicy::default();
        assert!(matches!(
            check_command(&policy, "rm -rf /"),
            Err(CommandViolation::DangerousPattern { pattern: "/" })
        ));
    }

    #[test]
    fn custom_allowlist_enforced() {
        let policy = CommandPolicy::new(vec!["ls".into(), "cat".into()]);
        assert!(check_command(&policy, "ls -la").is_ok());
        assert!(check_command(&policy, "grep foo bar").is_err());
    }
}
