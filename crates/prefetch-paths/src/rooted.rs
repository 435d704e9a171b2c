use serde::{Serialize, Serializer};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RootedPathError {
    #[error("root must be an absolute path: {}", .0.display())]
    RelativeRoot(PathBuf),
    #[error(
        "joining path '{}' to '{}': target is outside '{}'",
        .path.display(),
        .root.display(),
        .root.display()
    )]
    PathOutsideRoot { root: PathBuf, path: PathBuf },
    #[error("failed to resolve '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RootedPathError {
    pub fn is_outside_root(&self) -> bool {
        matches!(self, Self::PathOutsideRoot { .. })
    }
}

/// An absolute path that is known to stay under a root directory.
///
/// Every path produced by [`join_within_root`](Self::join_within_root) has been
/// resolved with symlinks followed and checked against the resolved root, so a
/// link inside the tree pointing outside of it is rejected, not just lexical
/// `..` escapes. The stored path is the root joined with the resolved subpath,
/// which keeps it spelled relative to the root the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootedPath {
    root: PathBuf,
    path: PathBuf,
}

impl RootedPath {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RootedPathError> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(RootedPathError::RelativeRoot(root));
        }
        Ok(Self {
            path: root.clone(),
            root,
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The part of [`path`](Self::path) below the root; empty for the root itself.
    pub fn subpath_from_root(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or_else(|_| Path::new(""))
    }

    /// Join `other` onto this path and verify the result stays under the root.
    pub fn join_within_root(&self, other: impl AsRef<Path>) -> Result<Self, RootedPathError> {
        let other = other.as_ref();
        let joined = self.path.join(other);

        let resolved_root = resolve(&self.root)?;
        let resolved = resolve(&joined)?;

        let Ok(subpath) = resolved.strip_prefix(&resolved_root) else {
            debug!(
                "{} resolves to {}, outside of {}",
                joined.display(),
                resolved.display(),
                resolved_root.display()
            );
            return Err(RootedPathError::PathOutsideRoot {
                root: self.root.clone(),
                path: other.to_path_buf(),
            });
        };

        Ok(Self {
            path: self.root.join(subpath),
            root: self.root.clone(),
        })
    }

    /// The same subpath, rooted somewhere else.
    pub fn re_root(&self, new_root: impl Into<PathBuf>) -> Result<Self, RootedPathError> {
        Self::new(new_root)?.join_within_root(self.subpath_from_root())
    }
}

impl Serialize for RootedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.path.serialize(serializer)
    }
}

/// Resolve an absolute path, following symlinks, without requiring it to exist.
///
/// Components are resolved one at a time: every prefix that exists is
/// canonicalized before the next component is applied, so `..` only ever
/// pops an already resolved prefix. Missing prefixes are kept lexically.
/// Errors other than "does not exist" are returned.
fn resolve(path: &Path) -> Result<PathBuf, RootedPathError> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            Component::Normal(name) => {
                resolved.push(name);
                match fs::canonicalize(&resolved) {
                    Ok(real) => resolved = real,
                    Err(e) if is_missing(&e) => {}
                    Err(e) => {
                        return Err(RootedPathError::Io {
                            path: path.to_path_buf(),
                            source: e,
                        });
                    }
                }
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}
