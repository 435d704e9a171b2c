use crate::error::{ErrorKind, ValidationError};
use std::fmt;

/// Every validation error found in one document.
///
/// `Display` renders the user-facing text:
///
/// ```text
/// 2 validation errors for user input
/// packages -> 0
///   unknown package type 'cargo', expected one of: 'bundler', ...
/// packages -> 1
///   unknown package type 'cargo', expected one of: 'bundler', ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.of_kind(kind).next().is_some()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.errors.len();
        write!(
            f,
            "{n} validation error{} for user input",
            if n == 1 { "" } else { "s" }
        )?;
        for error in &self.errors {
            if error.location.is_root() {
                write!(f, "\n{}", error.message)?;
            } else {
                write!(f, "\n{}\n  {}", error.location, error.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;

    fn error(location: Location, message: &str) -> ValidationError {
        ValidationError {
            kind: ErrorKind::MalformedField,
            location,
            message: message.to_owned(),
        }
    }

    #[test]
    fn single_error_header_is_singular() {
        let report = ValidationReport::new(vec![error(
            Location::root().key("packages"),
            "field required",
        )]);
        assert_eq!(
            report.to_string(),
            "1 validation error for user input\npackages\n  field required"
        );
    }

    #[test]
    fn multiple_errors_with_root_location() {
        let report = ValidationReport::new(vec![
            error(Location::root(), "expected a mapping for the input document"),
            error(Location::root().key("flags").index(2), "unexpected value"),
        ]);
        assert_eq!(
            report.to_string(),
            "2 validation errors for user input\n\
             expected a mapping for the input document\n\
             flags -> 2\n  unexpected value"
        );
        assert_eq!(report.len(), 2);
        assert!(report.contains(ErrorKind::MalformedField));
        assert!(!report.contains(ErrorKind::UnknownField));
    }
}
