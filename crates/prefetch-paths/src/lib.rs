//! Path safety for prefetch requests.
//!
//! This crate provides the two path guarantees every later stage relies on:
//! syntactic sanity of user-supplied relative paths (`check_sane_relpath`,
//! `SafePath`) and containment of resolved paths under a designated root
//! directory, following symlinks (`RootedPath`).

pub mod relpath;
pub mod rooted;

pub use relpath::{check_sane_relpath, SafePath, UnsafePathError};
pub use rooted::{RootedPath, RootedPathError};
