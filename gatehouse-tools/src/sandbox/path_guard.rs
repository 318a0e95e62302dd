use crate::error::ToolError;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Confines file-tool paths to a single data root.
///
/// Containment is decided on the canonicalized form (symlinks and `..`
/// resolved), never on the raw string, so traversal via relative segments
/// or symlink indirection cannot escape the root.
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = fs::canonicalize(root.as_ref())
            .map_err(|e| ToolError::PathEscape(format!("invalid sandbox root: {e}")))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an existing path inside the root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let joined = self.root.join(relative.as_ref());
        let canonical = fs::canonicalize(&joined).map_err(|e| {
            ToolError::ExecutionFailed(format!("cannot resolve {}: {e}", joined.display()))
        })?;
        self.contain(canonical)
    }

    /// Resolve a path that may not exist yet (write and copy targets).
    /// `.` and `..` are normalized lexically; climbing past the root is an
    /// escape. The deepest existing ancestor is then canonicalized so a
    /// symlinked directory cannot redirect the write outside the root.
    pub fn resolve_new(&self, relative: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            return match relative.strip_prefix(&self.root) {
                Ok(inside) => self.resolve_new(inside),
                Err(_) => Err(ToolError::PathEscape(format!(
                    "{} is outside {}",
                    relative.display(),
                    self.root.display()
                ))),
            };
        }

        let mut stack: Vec<OsString> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => stack.push(part.to_os_string()),
                Component::CurDir => {}
                Component::ParentDir => {
                    if stack.pop().is_none() {
                        return Err(ToolError::PathEscape(format!(
                            "{} climbs out of the sandbox",
                            relative.display()
                        )));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ToolError::PathEscape(format!(
                        "{} is not relative to the sandbox",
                        relative.display()
                    )));
                }
            }
        }

        let mut candidate = self.root.clone();
        for part in &stack {
            candidate.push(part);
        }

        let mut probe = candidate.clone();
        while !probe.exists() {
            match probe.parent() {
                Some(parent) => probe = parent.to_path_buf(),
                None => break,
            }
        }
        let canonical = fs::canonicalize(&probe).map_err(|e| {
            ToolError::ExecutionFailed(format!("cannot resolve {}: {e}", probe.display()))
        })?;
        self.contain(canonical)?;

        Ok(candidate)
    }

    fn contain(&self, canonical: PathBuf) -> Result<PathBuf, ToolError> {
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(ToolError::PathEscape(format!(
                "{} resolves outside {}",
                canonical.display(),
                self.root.display()
            )))
        }
    }
}
