//! Sandbox path resolution — confine file operations to one root directory.

use std::path::{Component, Path, PathBuf};

/// Error returned when a path cannot be confined to the sandbox root.
#[derive(Debug, thiserror::Error)]
pub enum SandboxPathError {
    #[error("Path outside workspace: {path}")]
    OutsideRoot { path: String },

    #[error("Invalid path: {path}")]
    Invalid { path: String },
}

/// Resolve `path` relative to `root` and verify the result stays inside it.
///
/// The target may not exist yet (writes create files), so resolution is
/// lexical: the joined path is normalized component by component, and any
/// `..` that would climb above the root is rejected. Absolute input paths
/// are rejected outright.
///
/// Returns the normalized absolute path on success.
pub fn resolve_sandboxed(root: &Path, path: &str) -> Result<PathBuf, SandboxPathError> {
    let candidate = Path::new(path);

    if candidate.is_absolute() {
        return Err(SandboxPathError::OutsideRoot { path: path.into() });
    }

    let mut resolved = root.to_path_buf();
    let mut depth: usize = 0;

    for component in candidate.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(SandboxPathError::OutsideRoot { path: path.into() });
                }
                resolved.pop();
                depth -= 1;
            }
            // Prefix/RootDir only appear in absolute paths, handled above
            _ => return Err(SandboxPathError::Invalid { path: path.into() }),
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_relative_path_resolves_under_root() {
        let root = Path::new("/workspace");
        let resolved = resolve_sandboxed(root, "notes.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/workspace/notes.txt"));
    }

    #[test]
    fn nested_path_resolves() {
        let root = Path::new("/workspace");
        let resolved = resolve_sandboxed(root, "a/b/c.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/workspace/a/b/c.txt"));
    }

    #[test]
    fn parent_escape_rejected() {
        let root = Path::new("/workspace");
        let err = resolve_sandboxed(root, "../escape.txt").unwrap_err();
        assert!(matches!(err, SandboxPathError::OutsideRoot { .. }));
    }

    #[test]
    fn deep_escape_rejected() {
        let root = Path::new("/workspace");
        assert!(resolve_sandboxed(root, "a/../../etc/passwd").is_err());
    }

    #[test]
    fn internal_parent_dirs_allowed() {
        let root = Path::new("/workspace");
        let resolved = resolve_sandboxed(root, "a/b/../c.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/workspace/a/c.txt"));
    }

    #[test]
    fn absolute_path_rejected() {
        let root = Path::new("/workspace");
        assert!(resolve_sandboxed(root, "/etc/passwd").is_err());
    }

    #[test]
    fn current_dir_components_ignored() {
        let root = Path::new("/workspace");
        let resolved = resolve_sandboxed(root, "./notes.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/workspace/notes.txt"));
    }
}
