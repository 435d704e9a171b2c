use crate::error::{Collector, ErrorKind, InputError, Location};
use crate::fields::{read_list, ObjectFields};
use crate::flags::{read_flags, Flag};
use crate::input::normalize_input;
use crate::package::{
    BundlerPackageInput, GomodPackageInput, NpmPackageInput, PackageInput, PackageManagerType,
    PipPackageInput, RpmPackageInput, YarnPackageInput,
};
use crate::validators::unique;
use prefetch_paths::{RootedPath, RootedPathError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the Go module cache keeps downloaded modules, relative to `GOMODCACHE`'s parent.
pub const GOMOD_CACHE_DOWNLOAD_PART: [&str; 4] = ["pkg", "mod", "cache", "download"];

/// Everything needed to process a single prefetch request.
///
/// Only obtainable through [`parse_request`], so the invariants below always hold:
/// - `packages` is non-empty and has no two entries with the same type and path;
/// - every package path is an existing directory under `source_dir`,
///   symlinks included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    source_dir: RootedPath,
    output_dir: RootedPath,
    packages: Vec<PackageInput>,
    flags: BTreeSet<Flag>,
}

impl Request {
    pub fn source_dir(&self) -> &RootedPath {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &RootedPath {
        &self.output_dir
    }

    pub fn packages(&self) -> &[PackageInput] {
        &self.packages
    }

    pub fn flags(&self) -> &BTreeSet<Flag> {
        &self.flags
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn packages_by_type(
        &self,
        kind: PackageManagerType,
    ) -> impl Iterator<Item = &PackageInput> {
        self.packages.iter().filter(move |p| p.kind() == kind)
    }

    pub fn bundler_packages(&self) -> Vec<&BundlerPackageInput> {
        self.packages.iter().filter_map(PackageInput::as_bundler).collect()
    }

    pub fn gomod_packages(&self) -> Vec<&GomodPackageInput> {
        self.packages.iter().filter_map(PackageInput::as_gomod).collect()
    }

    pub fn npm_packages(&self) -> Vec<&NpmPackageInput> {
        self.packages.iter().filter_map(PackageInput::as_npm).collect()
    }

    pub fn pip_packages(&self) -> Vec<&PipPackageInput> {
        self.packages.iter().filter_map(PackageInput::as_pip).collect()
    }

    pub fn rpm_packages(&self) -> Vec<&RpmPackageInput> {
        self.packages.iter().filter_map(PackageInput::as_rpm).collect()
    }

    pub fn yarn_packages(&self) -> Vec<&YarnPackageInput> {
        self.packages.iter().filter_map(PackageInput::as_yarn).collect()
    }

    /// Directory the gomod fetcher downloads modules into:
    /// `<output_dir>/deps/gomod/pkg/mod/cache/download`.
    pub fn gomod_download_dir(&self) -> Result<RootedPath, RootedPathError> {
        let subpath: PathBuf = ["deps", "gomod"]
            .into_iter()
            .chain(GOMOD_CACHE_DOWNLOAD_PART)
            .collect();
        self.output_dir.join_within_root(subpath)
    }
}

/// Validate a raw request document against the given source and output roots.
///
/// Every problem found is returned at once as [`InputError::InvalidInput`].
/// Filesystem failures unrelated to the checks themselves (permission errors
/// while probing a package path, for instance) come back as
/// [`InputError::Filesystem`] or [`InputError::Path`] instead.
pub fn parse_request(
    document: &Value,
    source_dir: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
) -> Result<Request, InputError> {
    let mut errors = Collector::default();
    let root = Location::root();

    let source_dir = read_root(source_dir.into(), root.key("source_dir"), &mut errors);
    let output_dir = read_root(output_dir.into(), root.key("output_dir"), &mut errors);

    let mut packages = None;
    let mut flags = BTreeSet::new();
    if let Some(mut fields) = ObjectFields::new(document, &root, &mut errors) {
        packages = match fields.take("packages") {
            Some(value) => read_packages(value, &root.key("packages"), &mut errors),
            None => {
                errors.push(ErrorKind::MissingField, root.key("packages"), "field required");
                None
            }
        };
        if let Some(value) = fields.take("flags") {
            flags = read_flags(value, &root.key("flags"), &mut errors);
        }
        fields.finish(&mut errors);
    }

    let packages = match packages {
        Some(packages) => check_packages(
            packages,
            source_dir.as_ref(),
            &root.key("packages"),
            &mut errors,
        )?,
        None => None,
    };

    match (source_dir, output_dir, packages) {
        (Some(source_dir), Some(output_dir), Some(packages)) if errors.is_empty() => {
            debug!(
                "validated request: {} package(s), flags {:?}",
                packages.len(),
                flags
            );
            Ok(Request {
                source_dir,
                output_dir,
                packages,
                flags,
            })
        }
        _ => Err(InputError::InvalidInput(errors.into_report())),
    }
}

/// [`normalize_input`] followed by [`parse_request`].
pub fn parse_request_str(
    raw: &str,
    source_dir: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
) -> Result<Request, InputError> {
    let document = normalize_input(raw)?;
    parse_request(&document, source_dir, output_dir)
}

fn read_root(path: PathBuf, location: Location, errors: &mut Collector) -> Option<RootedPath> {
    match RootedPath::new(path) {
        Ok(rooted) => Some(rooted),
        Err(e) => {
            errors.malformed(location, e.to_string());
            None
        }
    }
}

/// Each valid entry paired with its index in the document. `None` unless every entry validated.
fn read_packages(
    value: &Value,
    location: &Location,
    errors: &mut Collector,
) -> Option<Vec<(usize, PackageInput)>> {
    let checkpoint = errors.checkpoint();
    let items = read_list(value, location.clone(), errors)?;
    let packages: Vec<_> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            PackageInput::read(item, &location.index(i), errors).map(|package| (i, package))
        })
        .collect();
    if errors.failed_since(checkpoint) {
        None
    } else {
        Some(packages)
    }
}

/// Cross-field checks on a structurally valid package list, in order:
/// de-duplication, non-emptiness, then path containment and existence.
fn check_packages(
    packages: Vec<(usize, PackageInput)>,
    source_dir: Option<&RootedPath>,
    location: &Location,
    errors: &mut Collector,
) -> Result<Option<Vec<PackageInput>>, InputError> {
    let total = packages.len();
    let packages = unique(packages, |(_, p)| (p.kind(), p.path().clone()));
    if packages.len() < total {
        debug!("dropped {} duplicate package(s)", total - packages.len());
    }

    if packages.is_empty() {
        errors.push(
            ErrorKind::EmptyPackageList,
            location.clone(),
            "at least one package must be defined, got an empty list",
        );
        return Ok(None);
    }

    let Some(source_dir) = source_dir else {
        return Ok(None);
    };
    let checkpoint = errors.checkpoint();
    for (i, package) in &packages {
        check_package_dir(source_dir, package.path().as_path(), location.index(*i), errors)?;
    }
    if errors.failed_since(checkpoint) {
        return Ok(None);
    }

    Ok(Some(packages.into_iter().map(|(_, p)| p).collect()))
}

fn check_package_dir(
    source_dir: &RootedPath,
    path: &Path,
    location: Location,
    errors: &mut Collector,
) -> Result<(), InputError> {
    let abspath = match source_dir.join_within_root(path) {
        Ok(abspath) => abspath,
        Err(e) if e.is_outside_root() => {
            errors.push(
                ErrorKind::PathOutsideRoot,
                location,
                format!(
                    "package path (a symlink?) leads outside source directory: {}",
                    path.display()
                ),
            );
            return Ok(());
        }
        Err(e) => return Err(InputError::Path(e)),
    };

    match std::fs::metadata(abspath.path()) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => errors.push(
            ErrorKind::NotADirectory,
            location,
            format!("package path is not a directory: {}", path.display()),
        ),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            errors.push(
                ErrorKind::PathNotFound,
                location,
                format!("package path does not exist: {}", path.display()),
            );
        }
        Err(source) => {
            return Err(InputError::Filesystem {
                path: abspath.path().to_path_buf(),
                source,
            });
        }
    }
    Ok(())
}
