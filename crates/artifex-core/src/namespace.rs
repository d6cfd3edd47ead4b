use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Validated namespace name: one or more ASCII alphanumerics or hyphens.
///
/// Construction is the only place the format is enforced; every other
/// operation relies on the fact that a name violating the format can
/// never have been created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NamespaceName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed =
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !well_formed {
            return Err(CatalogError::validation(format!(
                "namespace `{s}` must match [A-Za-z0-9-]+"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NamespaceName> for String {
    fn from(value: NamespaceName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumerics_and_hyphens() {
        assert!("finos".parse::<NamespaceName>().is_ok());
        assert!("team-42".parse::<NamespaceName>().is_ok());
    }

    #[test]
    fn rejects_empty_and_punctuation() {
        assert!("".parse::<NamespaceName>().is_err());
        assert!("a/b".parse::<NamespaceName>().is_err());
        assert!("a b".parse::<NamespaceName>().is_err());
        assert!("a.b".parse::<NamespaceName>().is_err());
    }
}
