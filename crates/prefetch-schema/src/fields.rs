//! Readers for raw JSON values that record problems instead of stopping.

use crate::error::{Collector, ErrorKind, Location};
use prefetch_paths::{check_sane_relpath, SafePath};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub(crate) const NULL_NOT_ALLOWED: &str = "none is not an allowed value";

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// A mapping being validated against a closed set of declared keys.
///
/// Every key must be [`take`](Self::take)n before [`finish`](Self::finish);
/// whatever is left over is reported as an unknown field.
pub(crate) struct ObjectFields<'a> {
    map: &'a Map<String, Value>,
    location: Location,
    taken: BTreeSet<&'a str>,
}

impl<'a> ObjectFields<'a> {
    pub(crate) fn new(
        value: &'a Value,
        location: &Location,
        errors: &mut Collector,
    ) -> Option<Self> {
        let Value::Object(map) = value else {
            errors.malformed(location.clone(), expected("a mapping", value));
            return None;
        };
        Some(Self {
            map,
            location: location.clone(),
            taken: BTreeSet::new(),
        })
    }

    pub(crate) fn location(&self) -> &Location {
        &self.location
    }

    pub(crate) fn take(&mut self, key: &'a str) -> Option<&'a Value> {
        self.taken.insert(key);
        self.map.get(key)
    }

    pub(crate) fn finish(self, errors: &mut Collector) {
        for key in self.map.keys() {
            if !self.taken.contains(key.as_str()) {
                errors.push(
                    ErrorKind::UnknownField,
                    self.location.key(key.as_str()),
                    "extra fields not permitted",
                );
            }
        }
    }
}

pub(crate) fn expected(what: &str, got: &Value) -> String {
    if got.is_null() {
        NULL_NOT_ALLOWED.to_owned()
    } else {
        format!("expected {what}, got {}", type_name(got))
    }
}

pub(crate) fn read_str<'v>(
    value: &'v Value,
    location: Location,
    errors: &mut Collector,
) -> Option<&'v str> {
    if let Value::String(s) = value {
        Some(s.as_str())
    } else {
        errors.malformed(location, expected("a string", value));
        None
    }
}

pub(crate) fn read_bool(value: &Value, location: Location, errors: &mut Collector) -> Option<bool> {
    if let Value::Bool(b) = value {
        Some(*b)
    } else {
        errors.malformed(location, expected("a boolean", value));
        None
    }
}

pub(crate) fn read_list<'v>(
    value: &'v Value,
    location: Location,
    errors: &mut Collector,
) -> Option<&'v [Value]> {
    if let Value::Array(items) = value {
        Some(items.as_slice())
    } else {
        errors.malformed(location, expected("a list", value));
        None
    }
}

/// A string that must pass [`check_sane_relpath`].
pub(crate) fn read_relpath(
    value: &Value,
    location: Location,
    errors: &mut Collector,
) -> Option<SafePath> {
    let raw = read_str(value, location.clone(), errors)?;
    match check_sane_relpath(raw) {
        Ok(path) => Some(path),
        Err(e) => {
            errors.push(ErrorKind::UnsafePath, location, e.to_string());
            None
        }
    }
}
