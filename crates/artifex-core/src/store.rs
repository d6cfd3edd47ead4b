use async_trait::async_trait;

use crate::access::UserAccessEntry;
use crate::adr::AdrRecord;
use crate::artifact::ArtifactRecord;
use crate::error::CatalogResult;
use crate::resource::{ArtifactKind, SequenceKind};
use crate::version::Version;

/// High level health reported by a storage adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Healthy,
    Degraded,
}

/// Result of a conditional insert against a unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was free and the document was written.
    Inserted,
    /// The key was already taken; nothing was written.
    AlreadyPresent,
}

/// Contract every storage adapter implements.
///
/// Adapters only translate these operations to native calls; business
/// rules (namespace gating, error precedence, id allocation, payload
/// sanitization) live above the trait and are never duplicated per
/// backend. Payloads cross this boundary as raw text and are stored
/// verbatim.
///
/// Concurrency is delegated to the backend: `next_sequence` must be
/// atomic per kind, and the conditional inserts (`insert_version`,
/// `append_adr_revision`) must use a native uniqueness primitive rather
/// than a read-then-write in the adapter.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Reports whether the backend is reachable and serving.
    async fn status(&self) -> CatalogResult<StoreStatus>;

    // === Namespaces ===

    /// Returns whether the namespace exists.
    async fn namespace_exists(&self, namespace: &str) -> CatalogResult<bool>;

    /// Returns all known namespace names. Order is not guaranteed.
    async fn list_namespaces(&self) -> CatalogResult<Vec<String>>;

    /// Inserts the namespace. Returns `false` when it was already present.
    async fn insert_namespace(&self, namespace: &str) -> CatalogResult<bool>;

    // === Sequence counters ===

    /// Atomically increments the kind's counter and returns the new
    /// value. A counter with no stored value starts at 0, so the first
    /// allocation returns 1.
    async fn next_sequence(&self, kind: SequenceKind) -> CatalogResult<u64>;

    // === Versioned artifacts ===

    /// Inserts an artifact record together with its initial version
    /// payload in one backend write scope.
    async fn insert_artifact(
        &self,
        kind: ArtifactKind,
        record: &ArtifactRecord,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<()>;

    /// Fetches an artifact record by id.
    async fn get_artifact(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
    ) -> CatalogResult<Option<ArtifactRecord>>;

    /// Lists artifact ids in the namespace. A namespace with no
    /// artifacts yields an empty list, never an error.
    async fn list_artifact_ids(
        &self,
        kind: ArtifactKind,
        namespace: &str,
    ) -> CatalogResult<Vec<u64>>;

    /// Lists version keys for an artifact, sorted ascending.
    async fn list_versions(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
    ) -> CatalogResult<Vec<Version>>;

    /// Fetches the raw payload stored for a version.
    async fn get_version_payload(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
    ) -> CatalogResult<Option<String>>;

    /// Conditionally inserts a version payload; the existing payload is
    /// untouched when the key is already taken.
    async fn insert_version(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<InsertOutcome>;

    /// Inserts or overwrites a version payload.
    async fn put_version(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<()>;

    // === ADR revisions ===

    /// Inserts an ADR record together with its revision-1 payload.
    async fn insert_adr(&self, record: &AdrRecord, payload: &str) -> CatalogResult<()>;

    /// Fetches an ADR record by id.
    async fn get_adr_record(&self, namespace: &str, id: u64) -> CatalogResult<Option<AdrRecord>>;

    /// Lists ADR ids in the namespace.
    async fn list_adr_ids(&self, namespace: &str) -> CatalogResult<Vec<u64>>;

    /// Lists revision numbers present for an ADR.
    async fn list_adr_revisions(&self, namespace: &str, id: u64) -> CatalogResult<Vec<u32>>;

    /// Fetches the payload stored at a revision.
    async fn get_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
    ) -> CatalogResult<Option<String>>;

    /// Conditionally appends a revision payload; existing revisions are
    /// never overwritten.
    async fn append_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
        payload: &str,
    ) -> CatalogResult<InsertOutcome>;

    // === User access ===

    /// Inserts a user access entry.
    async fn insert_access(&self, entry: &UserAccessEntry) -> CatalogResult<()>;

    /// Lists entries for a username across all namespaces.
    async fn access_for_username(&self, username: &str) -> CatalogResult<Vec<UserAccessEntry>>;

    /// Lists entries scoped to a namespace.
    async fn access_for_namespace(&self, namespace: &str) -> CatalogResult<Vec<UserAccessEntry>>;

    /// Fetches a single entry by namespace and id.
    async fn get_access(&self, namespace: &str, id: u64) -> CatalogResult<Option<UserAccessEntry>>;
}
