//! Options accepted by the rpm package manager.
//!
//! DNF configuration is INI-like and split into sections: the global `main`
//! section and one section per repository id. Section contents are passed
//! through to the fetcher as-is; only their shape is validated here.

use crate::error::{Collector, ErrorKind, Location};
use crate::fields::{read_bool, read_str, type_name, ObjectFields};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Options of a single DNF section. Keys and values are not interpreted here.
pub type RepoOptions = Map<String, Value>;

/// Client TLS settings used when talking to repositories.
///
/// Every field is independently optional; whether a client certificate
/// requires a matching key is left to the code that opens the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SslOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RpmOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnf: Option<BTreeMap<String, RepoOptions>>,
}

const OPTION_KEYS: [&str; 2] = ["ssl", "dnf"];

impl RpmOptions {
    pub const MAIN_SECTION: &'static str = "main";

    /// The global `main` section, if configured.
    pub fn main_section(&self) -> Option<&RepoOptions> {
        self.dnf.as_ref()?.get(Self::MAIN_SECTION)
    }

    /// Per-repository sections, keyed by repository id.
    pub fn repo_sections(&self) -> impl Iterator<Item = (&str, &RepoOptions)> {
        self.dnf
            .iter()
            .flatten()
            .filter(|(id, _)| id.as_str() != Self::MAIN_SECTION)
            .map(|(id, options)| (id.as_str(), options))
    }

    /// Validate the `options` value of an rpm package.
    ///
    /// `null` and an empty mapping both mean "no options".
    pub(crate) fn read(value: &Value, location: &Location, errors: &mut Collector) -> Option<Self> {
        let map = match value {
            Value::Null => return None,
            Value::Object(map) if map.is_empty() => return None,
            Value::Object(map) => map,
            other => {
                unexpected_type(other, location, errors);
                return None;
            }
        };

        // Structure first: unknown namespaces, then the section maps.
        for key in map.keys() {
            if !OPTION_KEYS.contains(&key.as_str()) {
                let at = location.key(key.as_str());
                let message = format!(
                    "unknown option namespace '{}', expected one of: {}",
                    at.dotted(),
                    OPTION_KEYS.join(", ")
                );
                errors.push(ErrorKind::UnknownField, at, message);
            }
        }
        let dnf = map
            .get("dnf")
            .and_then(|v| read_sections(v, &location.key("dnf"), errors));

        let ssl = map
            .get("ssl")
            .and_then(|v| SslOptions::read(v, &location.key("ssl"), errors));

        Some(Self { ssl, dnf })
    }
}

fn unexpected_type(value: &Value, location: &Location, errors: &mut Collector) {
    errors.malformed(
        location.clone(),
        format!(
            "unexpected data type for '{}' in input JSON: expected a mapping, got {}",
            location.dotted(),
            type_name(value)
        ),
    );
}

fn read_sections(
    value: &Value,
    location: &Location,
    errors: &mut Collector,
) -> Option<BTreeMap<String, RepoOptions>> {
    let Value::Object(sections) = value else {
        unexpected_type(value, location, errors);
        return None;
    };
    let mut out = BTreeMap::new();
    for (name, options) in sections {
        if let Value::Object(options) = options {
            out.insert(name.clone(), options.clone());
        } else {
            unexpected_type(options, &location.key(name.as_str()), errors);
        }
    }
    Some(out)
}

impl SslOptions {
    fn read(value: &Value, location: &Location, errors: &mut Collector) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let mut fields = ObjectFields::new(value, location, errors)?;
        let client_cert = read_string(&mut fields, "client_cert", errors);
        let client_key = read_string(&mut fields, "client_key", errors);
        let ca_bundle = read_string(&mut fields, "ca_bundle", errors);
        let ssl_verify = fields
            .take("ssl_verify")
            .and_then(|v| read_bool(v, location.key("ssl_verify"), errors));
        fields.finish(errors);

        Some(Self {
            client_cert,
            client_key,
            ca_bundle,
            ssl_verify,
        })
    }
}

fn read_string(
    fields: &mut ObjectFields<'_>,
    key: &'static str,
    errors: &mut Collector,
) -> Option<String> {
    let at = fields.location().key(key);
    fields
        .take(key)
        .and_then(|v| read_str(v, at, errors))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options_loc() -> Location {
        Location::root().key("options")
    }

    fn read(value: &Value) -> (Option<RpmOptions>, crate::ValidationReport) {
        let mut errors = Collector::default();
        let options = RpmOptions::read(value, &options_loc(), &mut errors);
        (options, errors.into_report())
    }

    #[test]
    fn null_and_empty_mean_no_options() {
        assert_eq!(read(&Value::Null).0, None);
        assert_eq!(read(&json!({})).0, None);
    }

    #[test]
    fn parses_sections_and_ssl() {
        let (options, report) = read(&json!({
            "dnf": {
                "main": {"best": true, "timeout": 30},
                "epel": {"gpgcheck": 0, "exclude": ["foo*"]}
            },
            "ssl": {"client_cert": "/certs/c.pem", "ssl_verify": false}
        }));
        assert!(report.is_empty(), "{report}");
        let options = options.unwrap();
        assert_eq!(options.main_section().unwrap()["timeout"], json!(30));
        let repos: Vec<_> = options.repo_sections().map(|(id, _)| id).collect();
        assert_eq!(repos, vec!["epel"]);
        let ssl = options.ssl.unwrap();
        assert_eq!(ssl.client_cert.as_deref(), Some("/certs/c.pem"));
        assert_eq!(ssl.client_key, None);
        assert_eq!(ssl.ssl_verify, Some(false));
    }

    #[test]
    fn rejects_unknown_namespace() {
        let (_, report) = read(&json!({"unexpected_key": 1}));
        assert_eq!(report.len(), 1);
        let error = &report.errors()[0];
        assert_eq!(error.kind, ErrorKind::UnknownField);
        assert_eq!(error.location.dotted(), "options.unexpected_key");
        assert!(error.message.contains("'options.unexpected_key'"));
    }

    #[test]
    fn rejects_non_mapping_section() {
        let (_, report) = read(&json!({"dnf": {"main": {}, "reponame": "enabled=1"}}));
        assert_eq!(report.len(), 1);
        let error = &report.errors()[0];
        assert_eq!(error.kind, ErrorKind::MalformedField);
        assert_eq!(error.location.dotted(), "options.dnf.reponame");
        assert_eq!(
            error.message,
            "unexpected data type for 'options.dnf.reponame' in input JSON: expected a mapping, got string"
        );
    }

    #[test]
    fn reports_every_bad_location() {
        let (_, report) = read(&json!({
            "dnf": {"a": 1, "b": [], "c": {}},
            "extra": true,
            "ssl": {"ssl_verify": "yes", "client_key": null, "pin": "x"}
        }));
        let locations: Vec<_> = report.errors().iter().map(|e| e.location.dotted()).collect();
        assert_eq!(
            locations,
            vec![
                "options.extra",
                "options.dnf.a",
                "options.dnf.b",
                "options.ssl.client_key",
                "options.ssl.ssl_verify",
                "options.ssl.pin",
            ]
        );
    }

    #[test]
    fn rejects_non_mapping_options_and_dnf() {
        let (_, report) = read(&json!("dnf"));
        assert_eq!(report.errors()[0].location.dotted(), "options");
        let (_, report) = read(&json!({"dnf": null}));
        assert_eq!(report.errors()[0].location.dotted(), "options.dnf");
        assert_eq!(report.errors()[0].kind, ErrorKind::MalformedField);
    }

    #[test]
    fn cert_without_key_is_accepted() {
        let (options, report) = read(&json!({"ssl": {"client_cert": "c.pem"}}));
        assert!(report.is_empty());
        assert_eq!(options.unwrap().ssl.unwrap().client_key, None);
    }

    #[test]
    fn null_ssl_means_no_ssl() {
        let (options, report) = read(&json!({"ssl": null, "dnf": {"main": {}}}));
        assert!(report.is_empty());
        assert_eq!(options.unwrap().ssl, None);
    }
}
