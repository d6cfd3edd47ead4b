use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::SequenceKind;

/// Permission granted by a user access entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    /// Returns the canonical lowercase string persisted by adapters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(()),
        }
    }
}

/// Namespace-scoped permission record.
///
/// Duplicate `(namespace, username, resource)` combinations are allowed;
/// the catalog does not deduplicate grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccessEntry {
    /// Counter-assigned identifier.
    pub id: u64,
    /// Namespace the grant applies to.
    pub namespace: String,
    /// Username the grant applies to.
    pub username: String,
    /// Resource kind the grant covers.
    pub resource: SequenceKind,
    /// Granted permission.
    pub permission: Permission,
    /// Creation timestamp in UTC.
    pub created_at: DateTime<Utc>,
    /// Update timestamp in UTC.
    pub updated_at: DateTime<Utc>,
}

impl UserAccessEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        id: u64,
        namespace: impl Into<String>,
        username: impl Into<String>,
        resource: SequenceKind,
        permission: Permission,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            namespace: namespace.into(),
            username: username.into(),
            resource,
            permission,
            created_at: now,
            updated_at: now,
        }
    }
}
