//! Package inputs: one variant per supported package manager, selected by `type`.

use crate::error::{Collector, ErrorKind, Location};
use crate::fields::{read_bool, read_list, read_relpath, type_name, ObjectFields, NULL_NOT_ALLOWED};
use crate::options::RpmOptions;
use prefetch_paths::SafePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerType {
    Bundler,
    Gomod,
    Npm,
    Pip,
    Rpm,
    Yarn,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown package manager: '{0}'")]
pub struct ParsePackageManagerError(pub String);

impl PackageManagerType {
    pub const ALL: [Self; 6] = [
        Self::Bundler,
        Self::Gomod,
        Self::Npm,
        Self::Pip,
        Self::Rpm,
        Self::Yarn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bundler => "bundler",
            Self::Gomod => "gomod",
            Self::Npm => "npm",
            Self::Pip => "pip",
            Self::Rpm => "rpm",
            Self::Yarn => "yarn",
        }
    }
}

impl fmt::Display for PackageManagerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManagerType {
    type Err = ParsePackageManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParsePackageManagerError(s.to_owned()))
    }
}

macro_rules! path_only_input {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct $name {
            pub path: SafePath,
        }
    };
}

path_only_input!(
    /// A Ruby project managed by bundler.
    BundlerPackageInput
);

path_only_input!(
    /// A Go module.
    GomodPackageInput
);

path_only_input!(
    /// A Node.js project managed by npm.
    NpmPackageInput
);

path_only_input!(
    /// A Node.js project managed by yarn.
    YarnPackageInput
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipPackageInput {
    pub path: SafePath,
    /// Requirements files relative to `path`; `None` when not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements_files: Option<Vec<SafePath>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements_build_files: Option<Vec<SafePath>>,
    pub allow_binary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RpmPackageInput {
    pub path: SafePath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RpmOptions>,
}

/// A validated package to prefetch.
///
/// Serializes with the manager name under `type`, the same shape it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PackageInput {
    Bundler(BundlerPackageInput),
    Gomod(GomodPackageInput),
    Npm(NpmPackageInput),
    Pip(PipPackageInput),
    Rpm(RpmPackageInput),
    Yarn(YarnPackageInput),
}

macro_rules! variant_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self) -> Option<&$ty> {
            match self {
                Self::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

impl PackageInput {
    pub fn kind(&self) -> PackageManagerType {
        match self {
            Self::Bundler(_) => PackageManagerType::Bundler,
            Self::Gomod(_) => PackageManagerType::Gomod,
            Self::Npm(_) => PackageManagerType::Npm,
            Self::Pip(_) => PackageManagerType::Pip,
            Self::Rpm(_) => PackageManagerType::Rpm,
            Self::Yarn(_) => PackageManagerType::Yarn,
        }
    }

    pub fn path(&self) -> &SafePath {
        match self {
            Self::Bundler(p) => &p.path,
            Self::Gomod(p) => &p.path,
            Self::Npm(p) => &p.path,
            Self::Pip(p) => &p.path,
            Self::Rpm(p) => &p.path,
            Self::Yarn(p) => &p.path,
        }
    }

    variant_accessor!(as_bundler, Bundler, BundlerPackageInput);
    variant_accessor!(as_gomod, Gomod, GomodPackageInput);
    variant_accessor!(as_npm, Npm, NpmPackageInput);
    variant_accessor!(as_pip, Pip, PipPackageInput);
    variant_accessor!(as_rpm, Rpm, RpmPackageInput);
    variant_accessor!(as_yarn, Yarn, YarnPackageInput);

    /// Validate one entry of the `packages` list.
    ///
    /// The `type` tag is read first and picks the schema for the remaining
    /// keys. Returns `None` if anything about the entry was rejected.
    pub(crate) fn read(value: &Value, location: &Location, errors: &mut Collector) -> Option<Self> {
        let checkpoint = errors.checkpoint();
        let mut fields = ObjectFields::new(value, location, errors)?;

        let kind = match fields.take("type") {
            None => {
                errors.push(
                    ErrorKind::MissingField,
                    location.key("type"),
                    "field required",
                );
                return None;
            }
            Some(Value::String(tag)) => match tag.parse::<PackageManagerType>() {
                Ok(kind) => kind,
                Err(_) => {
                    errors.push(
                        ErrorKind::UnknownPackageType,
                        location.clone(),
                        format!(
                            "unknown package type '{tag}', expected one of: {}",
                            permitted_types()
                        ),
                    );
                    return None;
                }
            },
            Some(other) => {
                errors.malformed(
                    location.key("type"),
                    format!("expected a package type string, got {}", type_name(other)),
                );
                return None;
            }
        };

        let path = fields
            .take("path")
            .map_or_else(SafePath::default, |v| {
                read_relpath(v, location.key("path"), errors).unwrap_or_default()
            });

        let package = match kind {
            PackageManagerType::Bundler => Self::Bundler(BundlerPackageInput { path }),
            PackageManagerType::Gomod => Self::Gomod(GomodPackageInput { path }),
            PackageManagerType::Npm => Self::Npm(NpmPackageInput { path }),
            PackageManagerType::Yarn => Self::Yarn(YarnPackageInput { path }),
            PackageManagerType::Pip => Self::Pip(PipPackageInput::read(&mut fields, path, errors)),
            PackageManagerType::Rpm => Self::Rpm(RpmPackageInput {
                path,
                options: fields
                    .take("options")
                    .and_then(|v| RpmOptions::read(v, &location.key("options"), errors)),
            }),
        };
        fields.finish(errors);

        if errors.failed_since(checkpoint) {
            None
        } else {
            Some(package)
        }
    }
}

fn permitted_types() -> String {
    PackageManagerType::ALL
        .iter()
        .map(|t| format!("'{t}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl PipPackageInput {
    fn read(fields: &mut ObjectFields<'_>, path: SafePath, errors: &mut Collector) -> Self {
        let location = fields.location().clone();
        let requirements_files = fields
            .take("requirements_files")
            .and_then(|v| read_file_list(v, &location.key("requirements_files"), errors));
        let requirements_build_files = fields
            .take("requirements_build_files")
            .and_then(|v| read_file_list(v, &location.key("requirements_build_files"), errors));
        let allow_binary = fields
            .take("allow_binary")
            .and_then(|v| read_bool(v, location.key("allow_binary"), errors))
            .unwrap_or(false);

        Self {
            path,
            requirements_files,
            requirements_build_files,
            allow_binary,
        }
    }
}

/// A list of relative file paths. Omitting the key is fine, `null` is not.
fn read_file_list(
    value: &Value,
    location: &Location,
    errors: &mut Collector,
) -> Option<Vec<SafePath>> {
    if value.is_null() {
        errors.malformed(location.clone(), NULL_NOT_ALLOWED);
        return None;
    }
    let items = read_list(value, location.clone(), errors)?;
    let paths: Vec<SafePath> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| read_relpath(item, location.index(i), errors))
        .collect();
    Some(paths)
}
