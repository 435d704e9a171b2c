use crate::error::{Collector, Location};
use crate::fields::{read_list, read_str};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Independent feature toggles a request may switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    CgoDisable,
    DevPackageManagers,
    ForceGomodTidy,
    GomodVendor,
    GomodVendorCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flag: '{0}'")]
pub struct ParseFlagError(pub String);

impl Flag {
    pub const ALL: [Self; 5] = [
        Self::CgoDisable,
        Self::DevPackageManagers,
        Self::ForceGomodTidy,
        Self::GomodVendor,
        Self::GomodVendorCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CgoDisable => "cgo-disable",
            Self::DevPackageManagers => "dev-package-managers",
            Self::ForceGomodTidy => "force-gomod-tidy",
            Self::GomodVendor => "gomod-vendor",
            Self::GomodVendorCheck => "gomod-vendor-check",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = ParseFlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| ParseFlagError(s.to_owned()))
    }
}

fn permitted() -> String {
    Flag::ALL
        .iter()
        .map(|f| format!("'{f}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn read_flags(
    value: &Value,
    location: &Location,
    errors: &mut Collector,
) -> BTreeSet<Flag> {
    let mut flags = BTreeSet::new();
    let Some(items) = read_list(value, location.clone(), errors) else {
        return flags;
    };
    for (i, item) in items.iter().enumerate() {
        let Some(name) = read_str(item, location.index(i), errors) else {
            continue;
        };
        match name.parse() {
            Ok(flag) => {
                flags.insert(flag);
            }
            Err(_) => errors.malformed(
                location.index(i),
                format!("unexpected value '{name}'; permitted: {}", permitted()),
            ),
        }
    }
    flags
}
