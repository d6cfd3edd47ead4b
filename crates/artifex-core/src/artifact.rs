use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Descriptor for one versioned artifact within a namespace.
///
/// The id is allocated once from the kind's sequence counter and never
/// changes. Payloads live in the version table, not on the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Counter-assigned identifier, unique within the resource kind.
    pub id: u64,
    /// Owning namespace.
    pub namespace: String,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Creation timestamp in UTC.
    pub created_at: DateTime<Utc>,
    /// Update timestamp in UTC.
    pub updated_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        id: u64,
        namespace: impl Into<String>,
        name: Option<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            namespace: namespace.into(),
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Artifact aggregate returned by catalog operations: the record plus
/// every version key known for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// The artifact descriptor.
    pub record: ArtifactRecord,
    /// Version keys, sorted ascending.
    pub versions: Vec<Version>,
}
