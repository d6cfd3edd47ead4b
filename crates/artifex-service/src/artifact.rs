use std::sync::Arc;

use tracing::info;

use artifex_core::{
    Artifact, ArtifactKind, ArtifactRecord, CatalogError, CatalogResult, CatalogStore,
    InsertOutcome, Version,
};

use crate::namespace::ensure_namespace;

/// Catalog facade for one artifact kind.
///
/// The same rules serve all five kinds; construct one facade per kind
/// over a shared store. Error precedence on every operation is
/// namespace, then artifact, then version.
pub struct ArtifactCatalog {
    store: Arc<dyn CatalogStore>,
    kind: ArtifactKind,
}

impl ArtifactCatalog {
    /// Creates a facade for `kind` over the given store.
    pub fn new(store: Arc<dyn CatalogStore>, kind: ArtifactKind) -> Self {
        Self { store, kind }
    }

    /// The artifact kind this facade serves.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Lists artifact ids in the namespace. A namespace with no
    /// artifacts yields an empty list.
    pub async fn list_artifact_ids(&self, namespace: &str) -> CatalogResult<Vec<u64>> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        self.store.list_artifact_ids(self.kind, namespace).await
    }

    /// Creates an artifact with a fresh counter-assigned id and version
    /// 1.0.0 holding `payload`.
    pub async fn create_artifact(
        &self,
        namespace: &str,
        name: Option<String>,
        description: Option<String>,
        payload: &str,
    ) -> CatalogResult<Artifact> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        check_payload(payload)?;

        let id = self.store.next_sequence(self.kind.into()).await?;
        let record = ArtifactRecord::new(id, namespace, name, description);
        self.store
            .insert_artifact(self.kind, &record, &Version::INITIAL, payload)
            .await?;

        info!(kind = %self.kind, namespace, id, "created artifact");
        Ok(Artifact {
            record,
            versions: vec![Version::INITIAL],
        })
    }

    /// Lists version keys for an artifact, sorted ascending.
    pub async fn list_versions(&self, namespace: &str, id: u64) -> CatalogResult<Vec<Version>> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        self.require_artifact(namespace, id).await?;
        self.store.list_versions(self.kind, namespace, id).await
    }

    /// Returns the payload stored for a version, unchanged from what was
    /// written.
    pub async fn get_version(
        &self,
        namespace: &str,
        id: u64,
        version: &str,
    ) -> CatalogResult<String> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        self.require_artifact(namespace, id).await?;
        let parsed: Version = version.parse()?;

        match self
            .store
            .get_version_payload(self.kind, namespace, id, &parsed)
            .await?
        {
            Some(payload) => Ok(payload),
            None => Err(CatalogError::version_not_found(
                self.kind.as_str(),
                namespace,
                id,
                version,
            )),
        }
    }

    /// Adds a new version to an existing artifact. Fails with
    /// `VersionExists` when the key is already taken; the stored payload
    /// is untouched in that case.
    pub async fn create_version(
        &self,
        namespace: &str,
        id: u64,
        version: &str,
        payload: &str,
    ) -> CatalogResult<Artifact> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let record = self.require_artifact(namespace, id).await?;
        check_payload(payload)?;
        let parsed: Version = version.parse()?;

        match self
            .store
            .insert_version(self.kind, namespace, id, &parsed, payload)
            .await?
        {
            InsertOutcome::Inserted => {
                info!(kind = %self.kind, namespace, id, version, "created version");
                self.aggregate(record).await
            }
            InsertOutcome::AlreadyPresent => Err(CatalogError::version_exists(
                self.kind.as_str(),
                namespace,
                id,
                version,
            )),
        }
    }

    /// Creates or overwrites a version of an existing artifact. Safe to
    /// repeat: the final state is the same whether the key existed or
    /// not.
    pub async fn update_version(
        &self,
        namespace: &str,
        id: u64,
        version: &str,
        payload: &str,
    ) -> CatalogResult<Artifact> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let record = self.require_artifact(namespace, id).await?;
        check_payload(payload)?;
        let parsed: Version = version.parse()?;

        self.store
            .put_version(self.kind, namespace, id, &parsed, payload)
            .await?;
        info!(kind = %self.kind, namespace, id, version, "updated version");
        self.aggregate(record).await
    }

    async fn require_artifact(&self, namespace: &str, id: u64) -> CatalogResult<ArtifactRecord> {
        self.store
            .get_artifact(self.kind, namespace, id)
            .await?
            .ok_or_else(|| CatalogError::artifact_not_found(self.kind.as_str(), namespace, id))
    }

    async fn aggregate(&self, record: ArtifactRecord) -> CatalogResult<Artifact> {
        let versions = self
            .store
            .list_versions(self.kind, &record.namespace, record.id)
            .await?;
        Ok(Artifact { record, versions })
    }
}

/// Rejects payloads that are not syntactically valid JSON. Content is
/// otherwise opaque to the catalog.
pub(crate) fn check_payload(payload: &str) -> CatalogResult<()> {
    serde_json::from_str::<serde_json::Value>(payload)
        .map(|_| ())
        .map_err(|err| CatalogError::parse(format!("payload is not valid JSON: {err}")))
}
