use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsafePathError {
    #[error("path must be relative: {}", .0.display())]
    Absolute(PathBuf),
    #[error("path contains ..: {}", .0.display())]
    ParentTraversal(PathBuf),
}

/// A relative path that passed [`check_sane_relpath`].
///
/// The inner path is lexically normalized: it never contains `.`, `..` or
/// empty segments, and the current directory is spelled `.`. Two spellings of
/// the same relative location (`./a/b`, `a//b/`) compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct SafePath(PathBuf);

/// Check that `path` is relative and does not traverse upwards.
///
/// Returns the normalized form on success.
pub fn check_sane_relpath(path: impl AsRef<Path>) -> Result<SafePath, UnsafePathError> {
    let path = path.as_ref();
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(UnsafePathError::Absolute(path.to_path_buf()));
            }
            Component::ParentDir => {
                return Err(UnsafePathError::ParentTraversal(path.to_path_buf()));
            }
            Component::CurDir => {}
            Component::Normal(segment) => normalized.push(segment),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    Ok(SafePath(normalized))
}

impl SafePath {
    /// The current directory, `.`.
    pub fn current_dir() -> Self {
        Self(PathBuf::from("."))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_inner(self) -> PathBuf {
        self.0
    }

    pub fn is_current_dir(&self) -> bool {
        self.0 == Path::new(".")
    }
}

impl Default for SafePath {
    fn default() -> Self {
        Self::current_dir()
    }
}

impl Deref for SafePath {
    type Target = Path;
    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SafePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl TryFrom<PathBuf> for SafePath {
    type Error = UnsafePathError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        check_sane_relpath(path)
    }
}

impl TryFrom<&str> for SafePath {
    type Error = UnsafePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        check_sane_relpath(path)
    }
}

impl From<SafePath> for PathBuf {
    fn from(path: SafePath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_paths() {
        let p = check_sane_relpath("src/app").unwrap();
        assert_eq!(p.as_path(), Path::new("src/app"));
    }

    #[test]
    fn normalizes_cur_dir_and_empty_segments() {
        assert_eq!(check_sane_relpath("./a//b/./").unwrap().as_path(), Path::new("a/b"));
        assert_eq!(check_sane_relpath("a/b").unwrap(), check_sane_relpath("./a/b").unwrap());
    }

    #[test]
    fn empty_and_dot_are_current_dir() {
        assert!(check_sane_relpath("").unwrap().is_current_dir());
        assert!(check_sane_relpath(".").unwrap().is_current_dir());
        assert!(check_sane_relpath("./.").unwrap().is_current_dir());
        assert_eq!(SafePath::default().to_string(), ".");
    }

    #[test]
    fn rejects_absolute_paths() {
        let err = check_sane_relpath("/etc/passwd").unwrap_err();
        assert_eq!(err, UnsafePathError::Absolute(PathBuf::from("/etc/passwd")));
        assert_eq!(err.to_string(), "path must be relative: /etc/passwd");
    }

    #[test]
    fn rejects_parent_traversal_anywhere() {
        for p in ["..", "../x", "a/../b", "a/b/.."] {
            let err = check_sane_relpath(p).unwrap_err();
            assert!(
                matches!(err, UnsafePathError::ParentTraversal(_)),
                "{p} should be rejected"
            );
        }
        assert_eq!(
            check_sane_relpath("a/../b").unwrap_err().to_string(),
            "path contains ..: a/../b"
        );
    }

    #[test]
    fn dotted_names_are_not_traversal() {
        assert!(check_sane_relpath("..hidden/x...").is_ok());
    }

    #[test]
    fn serde_rejects_unsafe_paths() {
        let ok: SafePath = serde_json::from_str("\"./pkg\"").unwrap();
        assert_eq!(ok.as_path(), Path::new("pkg"));
        assert!(serde_json::from_str::<SafePath>("\"../pkg\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"pkg\"");
    }
}
