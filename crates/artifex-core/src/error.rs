use thiserror::Error;

/// Canonical error type for catalog operations.
///
/// Kinds map one-to-one onto the failure families the storage contract
/// can report; callers select HTTP status codes (or equivalents) from the
/// variant alone.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Namespace is unknown to the catalog.
    #[error("namespace `{namespace}` was not found")]
    NamespaceNotFound {
        /// Name of the missing namespace.
        namespace: String,
    },

    /// Namespace already exists and strict creation was requested.
    #[error("namespace `{namespace}` already exists")]
    NamespaceExists {
        /// Name that conflicts.
        namespace: String,
    },

    /// No artifact (or ADR) with the given id exists in the namespace.
    #[error("{kind} `{id}` was not found in namespace `{namespace}`")]
    ArtifactNotFound {
        /// Resource kind name (e.g. `"pattern"`, `"adr"`).
        kind: &'static str,
        /// Namespace that was searched.
        namespace: String,
        /// Identifier of the missing artifact.
        id: u64,
    },

    /// The artifact exists but has no such version.
    #[error("version `{version}` of {kind} `{id}` in namespace `{namespace}` was not found")]
    VersionNotFound {
        /// Resource kind name.
        kind: &'static str,
        /// Namespace that was searched.
        namespace: String,
        /// Artifact identifier.
        id: u64,
        /// Version string as presented by the caller.
        version: String,
    },

    /// The version key is already taken and must be updated, not created.
    #[error("version `{version}` of {kind} `{id}` in namespace `{namespace}` already exists")]
    VersionExists {
        /// Resource kind name.
        kind: &'static str,
        /// Namespace holding the artifact.
        namespace: String,
        /// Artifact identifier.
        id: u64,
        /// Conflicting version string.
        version: String,
    },

    /// The ADR exists but has no such revision.
    #[error("revision {revision} of adr `{id}` in namespace `{namespace}` was not found")]
    AdrRevisionNotFound {
        /// Namespace holding the ADR.
        namespace: String,
        /// ADR identifier.
        id: u64,
        /// Missing revision number.
        revision: u32,
    },

    /// A user-access lookup matched nothing.
    #[error("no user access records matched {scope}")]
    UserAccessNotFound {
        /// Human-readable description of the query scope.
        scope: String,
    },

    /// Input payload or stored document failed (de)serialization.
    #[error("parse error: {message}")]
    Parse {
        /// Details of the malformed input.
        message: String,
    },

    /// Caller-supplied identifier violated its format constraints.
    #[error("validation error: {message}")]
    Validation {
        /// Explanation of the constraint violation.
        message: String,
    },

    /// Backend write or read failed in a way no other kind describes.
    #[error("persistence error: {message}")]
    Persistence {
        /// Details from the storage adapter.
        message: String,
    },
}

impl CatalogError {
    /// Creates a `NamespaceNotFound` variant.
    #[must_use]
    pub fn namespace_not_found(namespace: impl Into<String>) -> Self {
        Self::NamespaceNotFound {
            namespace: namespace.into(),
        }
    }

    /// Creates an `ArtifactNotFound` variant.
    #[must_use]
    pub fn artifact_not_found(kind: &'static str, namespace: impl Into<String>, id: u64) -> Self {
        Self::ArtifactNotFound {
            kind,
            namespace: namespace.into(),
            id,
        }
    }

    /// Creates a `VersionNotFound` variant.
    #[must_use]
    pub fn version_not_found(
        kind: &'static str,
        namespace: impl Into<String>,
        id: u64,
        version: impl Into<String>,
    ) -> Self {
        Self::VersionNotFound {
            kind,
            namespace: namespace.into(),
            id,
            version: version.into(),
        }
    }

    /// Creates a `VersionExists` variant.
    #[must_use]
    pub fn version_exists(
        kind: &'static str,
        namespace: impl Into<String>,
        id: u64,
        version: impl Into<String>,
    ) -> Self {
        Self::VersionExists {
            kind,
            namespace: namespace.into(),
            id,
            version: version.into(),
        }
    }

    /// Creates a `Parse` variant.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a `Validation` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a `Persistence` variant.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// Convenient result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
