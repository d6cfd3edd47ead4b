use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Three-part artifact version.
///
/// Input accepts either `.` or `-` between components, so `"1.0.0"` and
/// `"1-0-0"` address the same version. Components are non-negative
/// integers without leading zeros. Rendering always uses `.`; the
/// persisted key uses `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl Version {
    /// Version assigned to the first payload of every new artifact.
    pub const INITIAL: Version = Version {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the dash-separated key used by storage adapters.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}-{}-{}", self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(['.', '-']).collect();
        if parts.len() != 3 {
            return Err(CatalogError::validation(format!(
                "version `{s}` must have exactly three components"
            )));
        }

        let component = |raw: &str| -> Result<u64, CatalogError> {
            let well_formed = !raw.is_empty()
                && raw.chars().all(|c| c.is_ascii_digit())
                && (raw.len() == 1 || !raw.starts_with('0'));
            if !well_formed {
                return Err(CatalogError::validation(format!(
                    "invalid version component `{raw}` in `{s}`"
                )));
            }
            raw.parse::<u64>().map_err(|err| {
                CatalogError::validation(format!("version component `{raw}` out of range: {err}"))
            })
        };

        Ok(Self {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(parts[2])?,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}
