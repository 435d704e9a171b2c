//! Raw input documents and their shorthand forms.
//!
//! A request may be written as any of:
//! - a bare package manager name: `gomod`
//! - a single package: `{"type": "gomod", "path": "."}`
//! - a list of packages: `[{"type": "gomod"}, {"type": "npm"}]`
//! - the full document: `{"packages": [...], "flags": [...]}`
//!
//! All of them normalize to the full document form before validation.

use crate::error::InputError;
use crate::flags::Flag;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Turn a raw input string into a full request document.
///
/// Only the shape is adjusted here; nothing is validated.
pub fn normalize_input(raw: &str) -> Result<Value, InputError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Ok(json!({"packages": [{"type": trimmed}]}));
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| InputError::MalformedDocument(format!("looks like JSON but is not: {e}")))?;
    Ok(normalize_value(value))
}

/// Wrap a single package or a bare list into a full document.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) if map.contains_key("packages") => Value::Object(map),
        Value::Object(map) => json!({"packages": [map]}),
        Value::Array(items) => json!({"packages": items}),
        other => other,
    }
}

/// Add `flags` to the document's flag list, skipping ones already present.
///
/// A document whose `flags` is not a list is left untouched so that
/// validation reports it.
pub fn merge_flags(document: &mut Value, flags: impl IntoIterator<Item = Flag>) {
    let Value::Object(map) = document else {
        return;
    };
    let entry = map.entry("flags").or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(existing) = entry else {
        return;
    };
    for flag in flags {
        let name = Value::String(flag.as_str().to_owned());
        if !existing.contains(&name) {
            existing.push(name);
        }
    }
}

/// Read a request document from a `.json` or `.toml` file.
///
/// JSON files may use any of the shorthand forms; TOML files hold a table
/// and may be either a single package or the full document.
pub fn load_document(path: impl AsRef<Path>) -> Result<Value, InputError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let value = if is_toml {
        let table: toml::Value = toml::from_str(&content)
            .map_err(|e| InputError::MalformedDocument(format!("{}: {e}", path.display())))?;
        serde_json::to_value(table)
            .map_err(|e| InputError::MalformedDocument(format!("{}: {e}", path.display())))?
    } else {
        serde_json::from_str(&content)
            .map_err(|e| InputError::MalformedDocument(format!("{}: {e}", path.display())))?
    };
    debug!("loaded input document from {}", path.display());
    Ok(normalize_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_becomes_single_package() {
        assert_eq!(
            normalize_input(" gomod\n").unwrap(),
            json!({"packages": [{"type": "gomod"}]})
        );
    }

    #[test]
    fn single_package_object_is_wrapped() {
        assert_eq!(
            normalize_input(r#"{"type": "pip", "path": "py"}"#).unwrap(),
            json!({"packages": [{"type": "pip", "path": "py"}]})
        );
    }

    #[test]
    fn list_is_wrapped() {
        assert_eq!(
            normalize_input(r#"[{"type": "npm"}, {"type": "yarn"}]"#).unwrap(),
            json!({"packages": [{"type": "npm"}, {"type": "yarn"}]})
        );
    }

    #[test]
    fn full_document_is_kept() {
        let raw = r#"{"packages": [{"type": "rpm"}], "flags": ["cgo-disable"]}"#;
        assert_eq!(
            normalize_input(raw).unwrap(),
            serde_json::from_str::<Value>(raw).unwrap()
        );
    }

    #[test]
    fn invalid_json_is_malformed_document() {
        let err = normalize_input(r#"{"type": "gomod""#).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(err, InputError::MalformedDocument(_)));
    }

    #[test]
    fn merge_flags_unions() {
        let mut doc = json!({"packages": [], "flags": ["gomod-vendor"]});
        merge_flags(&mut doc, [Flag::GomodVendor, Flag::CgoDisable]);
        assert_eq!(doc["flags"], json!(["gomod-vendor", "cgo-disable"]));

        let mut doc = json!({"packages": []});
        merge_flags(&mut doc, [Flag::ForceGomodTidy]);
        assert_eq!(doc["flags"], json!(["force-gomod-tidy"]));

        let mut doc = json!({"packages": [], "flags": "oops"});
        merge_flags(&mut doc, [Flag::ForceGomodTidy]);
        assert_eq!(doc["flags"], json!("oops"));
    }

    #[test]
    fn loads_toml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("request.toml");
        fs::write(
            &toml_path,
            r#"
flags = ["gomod-vendor"]

[[packages]]
type = "rpm"

[packages.options.dnf.main]
best = true
"#,
        )
        .unwrap();
        let doc = load_document(&toml_path).unwrap();
        assert_eq!(doc["packages"][0]["options"]["dnf"]["main"]["best"], json!(true));
        assert_eq!(doc["flags"], json!(["gomod-vendor"]));

        let json_path = dir.path().join("request.json");
        fs::write(&json_path, r#"{"type": "bundler"}"#).unwrap();
        assert_eq!(
            load_document(&json_path).unwrap(),
            json!({"packages": [{"type": "bundler"}]})
        );
    }

    #[test]
    fn load_errors_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_document(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, InputError::Io(_)));
        assert!(!missing.is_invalid_input());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "packages = [").unwrap();
        assert!(load_document(&bad).unwrap_err().is_invalid_input());
    }
}
