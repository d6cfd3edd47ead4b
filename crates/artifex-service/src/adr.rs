use std::sync::Arc;

use tracing::{info, warn};

use artifex_core::{
    Adr, AdrRecord, AdrRevision, AdrSnapshot, AdrStatus, CatalogError, CatalogResult,
    CatalogStore, InsertOutcome, Sanitizer, SequenceKind,
};

use crate::namespace::ensure_namespace;

/// Number of times an append retries after losing a revision-number race
/// to a concurrent writer.
const MAX_APPEND_ATTEMPTS: usize = 16;

/// Revision store for architecture decision records.
///
/// Revisions are append-only: updates always write `latest + 1` and
/// never mutate an existing entry. Every payload passes through the
/// injected sanitization policy before it is persisted.
pub struct AdrCatalog {
    store: Arc<dyn CatalogStore>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl AdrCatalog {
    /// Creates a catalog over the given store and sanitization policy.
    pub fn new(store: Arc<dyn CatalogStore>, sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { store, sanitizer }
    }

    /// Lists ADR ids in the namespace.
    pub async fn list_adr_ids(&self, namespace: &str) -> CatalogResult<Vec<u64>> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        self.store.list_adr_ids(namespace).await
    }

    /// Creates an ADR with a fresh counter-assigned id; the payload
    /// becomes revision 1.
    pub async fn create_adr(&self, namespace: &str, adr: &Adr) -> CatalogResult<AdrSnapshot> {
        ensure_namespace(self.store.as_ref(), namespace).await?;

        let clean = adr.sanitized(self.sanitizer.as_ref());
        let payload = serde_json::to_string(&clean)?;
        let id = self.store.next_sequence(SequenceKind::Adr).await?;
        let record = AdrRecord::new(id, namespace);
        self.store.insert_adr(&record, &payload).await?;

        info!(namespace, id, "created adr");
        Ok(AdrSnapshot {
            record,
            revision: AdrRevision {
                revision: 1,
                adr: clean,
            },
        })
    }

    /// Returns the latest revision, where latest means the highest
    /// revision number present, not the most recently written entry.
    pub async fn get_adr(&self, namespace: &str, id: u64) -> CatalogResult<AdrSnapshot> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let record = self.require_adr(namespace, id).await?;
        let latest = self.latest_revision(namespace, id).await?;
        let adr = self.load_revision(namespace, id, latest).await?;
        Ok(AdrSnapshot {
            record,
            revision: AdrRevision {
                revision: latest,
                adr,
            },
        })
    }

    /// Returns one specific revision.
    pub async fn get_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
    ) -> CatalogResult<AdrSnapshot> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let record = self.require_adr(namespace, id).await?;
        let adr = self.load_revision(namespace, id, revision).await?;
        Ok(AdrSnapshot {
            record,
            revision: AdrRevision { revision, adr },
        })
    }

    /// Appends the payload as a new revision (`latest + 1`). Prior
    /// revisions are never touched.
    pub async fn update_adr(&self, namespace: &str, id: u64, adr: &Adr) -> CatalogResult<AdrSnapshot> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let record = self.require_adr(namespace, id).await?;
        let clean = adr.sanitized(self.sanitizer.as_ref());
        self.append_next(record, namespace, id, clean).await
    }

    /// Appends a new revision identical to the latest one except for the
    /// status field.
    pub async fn update_adr_status(
        &self,
        namespace: &str,
        id: u64,
        status: AdrStatus,
    ) -> CatalogResult<AdrSnapshot> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let record = self.require_adr(namespace, id).await?;
        let latest = self.latest_revision(namespace, id).await?;
        let current = self.load_revision(namespace, id, latest).await?;
        let next = current.with_status(status).sanitized(self.sanitizer.as_ref());
        self.append_next(record, namespace, id, next).await
    }

    async fn append_next(
        &self,
        record: AdrRecord,
        namespace: &str,
        id: u64,
        adr: Adr,
    ) -> CatalogResult<AdrSnapshot> {
        let payload = serde_json::to_string(&adr)?;

        for _ in 0..MAX_APPEND_ATTEMPTS {
            let next = self.latest_revision(namespace, id).await? + 1;
            match self
                .store
                .append_adr_revision(namespace, id, next, &payload)
                .await?
            {
                InsertOutcome::Inserted => {
                    info!(namespace, id, revision = next, "appended adr revision");
                    return Ok(AdrSnapshot {
                        record,
                        revision: AdrRevision {
                            revision: next,
                            adr,
                        },
                    });
                }
                InsertOutcome::AlreadyPresent => {
                    warn!(namespace, id, revision = next, "revision taken, retrying append");
                }
            }
        }

        Err(CatalogError::persistence(format!(
            "adr `{id}` in namespace `{namespace}` contended beyond {MAX_APPEND_ATTEMPTS} append attempts"
        )))
    }

    async fn require_adr(&self, namespace: &str, id: u64) -> CatalogResult<AdrRecord> {
        self.store
            .get_adr_record(namespace, id)
            .await?
            .ok_or_else(|| CatalogError::artifact_not_found("adr", namespace, id))
    }

    async fn latest_revision(&self, namespace: &str, id: u64) -> CatalogResult<u32> {
        let revisions = self.store.list_adr_revisions(namespace, id).await?;
        revisions.into_iter().max().ok_or_else(|| {
            CatalogError::persistence(format!(
                "adr `{id}` in namespace `{namespace}` has no revisions"
            ))
        })
    }

    async fn load_revision(&self, namespace: &str, id: u64, revision: u32) -> CatalogResult<Adr> {
        let payload = self
            .store
            .get_adr_revision(namespace, id, revision)
            .await?
            .ok_or_else(|| CatalogError::AdrRevisionNotFound {
                namespace: namespace.to_string(),
                id,
                revision,
            })?;
        serde_json::from_str(&payload).map_err(Into::into)
    }
}
