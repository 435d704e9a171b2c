//! Validation of prefetch requests.
//!
//! This crate turns an untrusted request document (a list of packages, each
//! tagged with its package manager, plus feature flags) into a [`Request`]
//! whose invariants later stages can rely on: every path is relative, sane
//! and inside the source directory, the package list is non-empty and free of
//! duplicates, and every manager-specific option has the expected shape.
//! All problems in a document are reported together in a [`ValidationReport`].

mod fields;

pub mod error;
pub mod flags;
pub mod input;
pub mod options;
pub mod package;
pub mod report;
pub mod request;
pub mod validators;

pub use error::{ErrorKind, InputError, LocSegment, Location, ValidationError};
pub use flags::{Flag, ParseFlagError};
pub use input::{load_document, merge_flags, normalize_input, normalize_value};
pub use options::{RepoOptions, RpmOptions, SslOptions};
pub use package::{
    BundlerPackageInput, GomodPackageInput, NpmPackageInput, PackageInput, PackageManagerType,
    ParsePackageManagerError, PipPackageInput, RpmPackageInput, YarnPackageInput,
};
pub use prefetch_paths::{RootedPath, RootedPathError, SafePath};
pub use report::ValidationReport;
pub use request::{parse_request, parse_request_str, Request, GOMOD_CACHE_DOWNLOAD_PART};
pub use validators::unique;
