use crate::report::ValidationReport;
use prefetch_paths::RootedPathError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level failure of turning user input into a [`Request`](crate::Request).
///
/// `InvalidInput` and `MalformedDocument` are problems with what the user
/// supplied; everything else is an environment failure that happened while
/// looking at the input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{0}")]
    InvalidInput(ValidationReport),
    #[error("malformed input document: {0}")]
    MalformedDocument(String),
    #[error("failed to read input document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to resolve package path: {0}")]
    Path(#[from] RootedPathError),
    #[error("filesystem error while checking '{}': {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    /// Whether the user is to blame, as opposed to the environment.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::MalformedDocument(_))
    }

    /// The collected validation errors, if this is an `InvalidInput` failure.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::InvalidInput(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong shape or type, including an explicit null where only omission is allowed.
    MalformedField,
    MissingField,
    UnknownField,
    UnknownPackageType,
    UnsafePath,
    PathOutsideRoot,
    PathNotFound,
    NotADirectory,
    EmptyPackageList,
}

/// One step into the input document: a mapping key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Where in the input document an error was found. Empty for the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location(Vec<LocSegment>);

impl Location {
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(LocSegment::Key(key.into()));
        Self(segments)
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(LocSegment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[LocSegment] {
        &self.0
    }

    /// `packages.0.options.dnf`, as opposed to the arrowed `Display` form.
    pub fn dotted(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub location: Location,
    pub message: String,
}

/// Accumulates validation errors across a whole document.
///
/// Readers record what is wrong and keep going. Whether a sub-tree validated
/// is decided by comparing [`checkpoint`](Self::checkpoint)s, so a reader can
/// return a partial value without it ever reaching the caller.
#[derive(Debug, Default)]
pub(crate) struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    pub(crate) fn push(&mut self, kind: ErrorKind, location: Location, message: impl Into<String>) {
        self.errors.push(ValidationError {
            kind,
            location,
            message: message.into(),
        });
    }

    pub(crate) fn malformed(&mut self, location: Location, message: impl Into<String>) {
        self.push(ErrorKind::MalformedField, location, message);
    }

    pub(crate) fn checkpoint(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn failed_since(&self, checkpoint: usize) -> bool {
        self.errors.len() > checkpoint
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_report(self) -> ValidationReport {
        ValidationReport::new(self.errors)
    }
}
