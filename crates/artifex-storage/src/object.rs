//! Networked multi-client adapter over an object store.
//!
//! Every entity is one JSON document under a deterministic key. Version
//! and revision creation rely on `PutMode::Create`, and counters on an
//! ETag compare-and-swap (`PutMode::Update`), so uniqueness comes from
//! the store's own conditional-put primitives. In production this runs
//! against Amazon S3 (or a compatible service) through the `object_store`
//! crate; tests use its in-memory implementation.
//!
//! Artifact and ADR creation write the payload document before the
//! record document: a failure in between leaves an orphan payload that
//! no lookup can reach, never a record without its initial payload.

use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{Error as ObjectError, ObjectStore, PutMode, PutOptions, UpdateVersion};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use artifex_core::{
    AdrRecord, ArtifactKind, ArtifactRecord, CatalogError, CatalogResult, CatalogStore,
    InsertOutcome, SequenceKind, StoreStatus, UserAccessEntry, Version,
};

const MAX_CAS_ATTEMPTS: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
struct NamespaceDoc {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CounterDoc {
    value: u64,
}

/// Object-store-backed realization of the catalog storage contract.
pub struct ObjectCatalogStore {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ObjectCatalogStore {
    /// Creates a store rooted at the top of the bucket.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_prefix(store, "")
    }

    /// Creates a store whose keys all live under `prefix`.
    pub fn with_prefix(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn path(&self, parts: &[&str]) -> ObjectPath {
        let joined = parts.join("/");
        if self.prefix.is_empty() {
            ObjectPath::from(joined)
        } else {
            ObjectPath::from(format!("{}/{}", self.prefix, joined))
        }
    }

    fn namespace_path(&self, namespace: &str) -> ObjectPath {
        self.path(&["namespaces", &format!("{namespace}.json")])
    }

    fn counter_path(&self, kind: SequenceKind) -> ObjectPath {
        self.path(&["counters", &format!("{}.json", kind.as_str())])
    }

    fn artifact_dir(&self, kind: ArtifactKind, namespace: &str, id: u64) -> ObjectPath {
        self.path(&["artifacts", kind.collection(), namespace, &id.to_string()])
    }

    fn artifact_record_path(&self, kind: ArtifactKind, namespace: &str, id: u64) -> ObjectPath {
        ObjectPath::from(format!("{}/record.json", self.artifact_dir(kind, namespace, id)))
    }

    fn version_path(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
    ) -> ObjectPath {
        ObjectPath::from(format!(
            "{}/versions/{}.json",
            self.artifact_dir(kind, namespace, id),
            version.storage_key()
        ))
    }

    fn adr_dir(&self, namespace: &str, id: u64) -> ObjectPath {
        self.path(&["adrs", namespace, &id.to_string()])
    }

    fn adr_record_path(&self, namespace: &str, id: u64) -> ObjectPath {
        ObjectPath::from(format!("{}/record.json", self.adr_dir(namespace, id)))
    }

    fn adr_revision_path(&self, namespace: &str, id: u64, revision: u32) -> ObjectPath {
        ObjectPath::from(format!("{}/revisions/{revision}.json", self.adr_dir(namespace, id)))
    }

    fn access_path(&self, namespace: &str, id: u64) -> ObjectPath {
        self.path(&["user-access", namespace, &format!("{id}.json")])
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        &self,
        location: &ObjectPath,
        context: &str,
    ) -> CatalogResult<Option<T>> {
        let result = match self.store.get(location).await {
            Ok(result) => result,
            Err(ObjectError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(map_object_error(context, err)),
        };
        let bytes = result
            .bytes()
            .await
            .map_err(|err| map_object_error(context, err))?;
        serde_json::from_slice(&bytes).map(Some).map_err(Into::into)
    }

    async fn write_json<T: Serialize>(
        &self,
        location: &ObjectPath,
        document: &T,
        mode: PutMode,
        context: &str,
    ) -> CatalogResult<()> {
        let body = serde_json::to_vec(document)?;
        self.store
            .put_opts(
                location,
                Bytes::from(body).into(),
                PutOptions {
                    mode,
                    ..Default::default()
                },
            )
            .await
            .map(|_| ())
            .map_err(|err| map_object_error(context, err))
    }

    async fn list_filenames(&self, prefix: &ObjectPath) -> CatalogResult<Vec<String>> {
        let mut stream = self.store.list(Some(prefix));
        let mut names = Vec::new();
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|err| map_object_error("list objects", err))?
        {
            if let Some(filename) = meta.location.filename() {
                names.push(filename.to_string());
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl CatalogStore for ObjectCatalogStore {
    async fn status(&self) -> CatalogResult<StoreStatus> {
        match self.store.list_with_delimiter(None).await {
            Ok(_) => Ok(StoreStatus::Healthy),
            Err(err) => {
                warn!(error = %err, "object store probe failed");
                Ok(StoreStatus::Degraded)
            }
        }
    }

    async fn namespace_exists(&self, namespace: &str) -> CatalogResult<bool> {
        match self.store.head(&self.namespace_path(namespace)).await {
            Ok(_) => Ok(true),
            Err(ObjectError::NotFound { .. }) => Ok(false),
            Err(err) => Err(map_object_error("namespace head", err)),
        }
    }

    async fn list_namespaces(&self) -> CatalogResult<Vec<String>> {
        let prefix = self.path(&["namespaces"]);
        let names = self
            .list_filenames(&prefix)
            .await?
            .into_iter()
            .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
            .collect();
        Ok(names)
    }

    async fn insert_namespace(&self, namespace: &str) -> CatalogResult<bool> {
        let doc = NamespaceDoc {
            name: namespace.to_string(),
            created_at: Utc::now(),
        };
        let body = serde_json::to_vec(&doc)?;
        match self
            .store
            .put_opts(
                &self.namespace_path(namespace),
                Bytes::from(body).into(),
                PutOptions {
                    mode: PutMode::Create,
                    ..Default::default()
                },
            )
            .await
        {
            Ok(_) => {
                debug!(namespace, "created namespace document");
                Ok(true)
            }
            Err(ObjectError::AlreadyExists { .. }) => Ok(false),
            Err(err) => Err(map_object_error("namespace create", err)),
        }
    }

    async fn next_sequence(&self, kind: SequenceKind) -> CatalogResult<u64> {
        let location = self.counter_path(kind);

        for _ in 0..MAX_CAS_ATTEMPTS {
            match self.store.get(&location).await {
                Ok(result) => {
                    let update = UpdateVersion {
                        e_tag: result.meta.e_tag.clone(),
                        version: result.meta.version.clone(),
                    };
                    let bytes = result
                        .bytes()
                        .await
                        .map_err(|err| map_object_error("counter read", err))?;
                    let current: CounterDoc = serde_json::from_slice(&bytes)?;
                    let next = current.value + 1;
                    let body = serde_json::to_vec(&CounterDoc { value: next })?;
                    match self
                        .store
                        .put_opts(
                            &location,
                            Bytes::from(body).into(),
                            PutOptions {
                                mode: PutMode::Update(update),
                                ..Default::default()
                            },
                        )
                        .await
                    {
                        Ok(_) => {
                            debug!(kind = kind.as_str(), value = next, "allocated sequence value");
                            return Ok(next);
                        }
                        Err(ObjectError::Precondition { .. })
                        | Err(ObjectError::AlreadyExists { .. }) => {
                            warn!(kind = kind.as_str(), "counter contention, retrying");
                            continue;
                        }
                        Err(err) => return Err(map_object_error("counter update", err)),
                    }
                }
                Err(ObjectError::NotFound { .. }) => {
                    let body = serde_json::to_vec(&CounterDoc { value: 1 })?;
                    match self
                        .store
                        .put_opts(
                            &location,
                            Bytes::from(body).into(),
                            PutOptions {
                                mode: PutMode::Create,
                                ..Default::default()
                            },
                        )
                        .await
                    {
                        Ok(_) => return Ok(1),
                        Err(ObjectError::AlreadyExists { .. }) => continue,
                        Err(err) => return Err(map_object_error("counter create", err)),
                    }
                }
                Err(err) => return Err(map_object_error("counter read", err)),
            }
        }

        Err(CatalogError::persistence(format!(
            "counter `{}` update contended beyond {MAX_CAS_ATTEMPTS} attempts",
            kind.as_str()
        )))
    }

    async fn insert_artifact(
        &self,
        kind: ArtifactKind,
        record: &ArtifactRecord,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<()> {
        let version_path = self.version_path(kind, &record.namespace, record.id, version);
        self.store
            .put_opts(
                &version_path,
                Bytes::from(payload.to_string()).into(),
                PutOptions {
                    mode: PutMode::Create,
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| map_object_error("initial version write", err))?;

        self.write_json(
            &self.artifact_record_path(kind, &record.namespace, record.id),
            record,
            PutMode::Create,
            "artifact record write",
        )
        .await?;

        debug!(
            kind = kind.as_str(),
            namespace = %record.namespace,
            id = record.id,
            "created artifact"
        );
        Ok(())
    }

    async fn get_artifact(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
    ) -> CatalogResult<Option<ArtifactRecord>> {
        self.read_json(
            &self.artifact_record_path(kind, namespace, id),
            "artifact record read",
        )
        .await
    }

    async fn list_artifact_ids(
        &self,
        kind: ArtifactKind,
        namespace: &str,
    ) -> CatalogResult<Vec<u64>> {
        let prefix = self.path(&["artifacts", kind.collection(), namespace]);
        let mut stream = self.store.list(Some(&prefix));
        let mut ids = Vec::new();
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|err| map_object_error("artifact list", err))?
        {
            if let Some(id) = id_from_record_path(&meta.location) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    async fn list_versions(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
    ) -> CatalogResult<Vec<Version>> {
        let prefix = ObjectPath::from(format!("{}/versions", self.artifact_dir(kind, namespace, id)));
        let mut versions = Vec::new();
        for filename in self.list_filenames(&prefix).await? {
            let Some(key) = filename.strip_suffix(".json") else {
                continue;
            };
            let version = Version::from_str(key).map_err(|_| {
                CatalogError::persistence(format!("corrupt version key `{key}`"))
            })?;
            versions.push(version);
        }
        versions.sort_unstable();
        Ok(versions)
    }

    async fn get_version_payload(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
    ) -> CatalogResult<Option<String>> {
        let location = self.version_path(kind, namespace, id, version);
        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(ObjectError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(map_object_error("version read", err)),
        };
        let bytes = result
            .bytes()
            .await
            .map_err(|err| map_object_error("version read", err))?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|err| CatalogError::persistence(format!("stored payload not UTF-8: {err}")))
    }

    async fn insert_version(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<InsertOutcome> {
        let location = self.version_path(kind, namespace, id, version);
        match self
            .store
            .put_opts(
                &location,
                Bytes::from(payload.to_string()).into(),
                PutOptions {
                    mode: PutMode::Create,
                    ..Default::default()
                },
            )
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(ObjectError::AlreadyExists { .. }) => Ok(InsertOutcome::AlreadyPresent),
            Err(err) => Err(map_object_error("version create", err)),
        }
    }

    async fn put_version(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<()> {
        let location = self.version_path(kind, namespace, id, version);
        self.store
            .put(&location, Bytes::from(payload.to_string()).into())
            .await
            .map(|_| ())
            .map_err(|err| map_object_error("version upsert", err))
    }

    async fn insert_adr(&self, record: &AdrRecord, payload: &str) -> CatalogResult<()> {
        let revision_path = self.adr_revision_path(&record.namespace, record.id, 1);
        self.store
            .put_opts(
                &revision_path,
                Bytes::from(payload.to_string()).into(),
                PutOptions {
                    mode: PutMode::Create,
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| map_object_error("initial revision write", err))?;

        self.write_json(
            &self.adr_record_path(&record.namespace, record.id),
            record,
            PutMode::Create,
            "adr record write",
        )
        .await?;

        debug!(namespace = %record.namespace, id = record.id, "created adr");
        Ok(())
    }

    async fn get_adr_record(&self, namespace: &str, id: u64) -> CatalogResult<Option<AdrRecord>> {
        self.read_json(&self.adr_record_path(namespace, id), "adr record read")
            .await
    }

    async fn list_adr_ids(&self, namespace: &str) -> CatalogResult<Vec<u64>> {
        let prefix = self.path(&["adrs", namespace]);
        let mut stream = self.store.list(Some(&prefix));
        let mut ids = Vec::new();
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|err| map_object_error("adr list", err))?
        {
            if let Some(id) = id_from_record_path(&meta.location) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    async fn list_adr_revisions(&self, namespace: &str, id: u64) -> CatalogResult<Vec<u32>> {
        let prefix = ObjectPath::from(format!("{}/revisions", self.adr_dir(namespace, id)));
        let mut revisions = Vec::new();
        for filename in self.list_filenames(&prefix).await? {
            let Some(key) = filename.strip_suffix(".json") else {
                continue;
            };
            let revision = key.parse::<u32>().map_err(|_| {
                CatalogError::persistence(format!("corrupt revision key `{key}`"))
            })?;
            revisions.push(revision);
        }
        revisions.sort_unstable();
        Ok(revisions)
    }

    async fn get_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
    ) -> CatalogResult<Option<String>> {
        let location = self.adr_revision_path(namespace, id, revision);
        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(ObjectError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(map_object_error("revision read", err)),
        };
        let bytes = result
            .bytes()
            .await
            .map_err(|err| map_object_error("revision read", err))?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|err| CatalogError::persistence(format!("stored payload not UTF-8: {err}")))
    }

    async fn append_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
        payload: &str,
    ) -> CatalogResult<InsertOutcome> {
        let location = self.adr_revision_path(namespace, id, revision);
        match self
            .store
            .put_opts(
                &location,
                Bytes::from(payload.to_string()).into(),
                PutOptions {
                    mode: PutMode::Create,
                    ..Default::default()
                },
            )
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(ObjectError::AlreadyExists { .. }) => Ok(InsertOutcome::AlreadyPresent),
            Err(err) => Err(map_object_error("revision append", err)),
        }
    }

    async fn insert_access(&self, entry: &UserAccessEntry) -> CatalogResult<()> {
        self.write_json(
            &self.access_path(&entry.namespace, entry.id),
            entry,
            PutMode::Create,
            "access write",
        )
        .await
    }

    async fn access_for_username(&self, username: &str) -> CatalogResult<Vec<UserAccessEntry>> {
        let prefix = self.path(&["user-access"]);
        let mut stream = self.store.list(Some(&prefix));
        let mut entries = Vec::new();
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|err| map_object_error("access list", err))?
        {
            let Some(entry) = self
                .read_json::<UserAccessEntry>(&meta.location, "access read")
                .await?
            else {
                continue;
            };
            if entry.username == username {
                entries.push(entry);
            }
        }
        entries.sort_unstable_by_key(|entry| entry.id);
        Ok(entries)
    }

    async fn access_for_namespace(&self, namespace: &str) -> CatalogResult<Vec<UserAccessEntry>> {
        let prefix = self.path(&["user-access", namespace]);
        let mut stream = self.store.list(Some(&prefix));
        let mut entries = Vec::new();
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|err| map_object_error("access list", err))?
        {
            if let Some(entry) = self
                .read_json::<UserAccessEntry>(&meta.location, "access read")
                .await?
            {
                entries.push(entry);
            }
        }
        entries.sort_unstable_by_key(|entry| entry.id);
        Ok(entries)
    }

    async fn get_access(&self, namespace: &str, id: u64) -> CatalogResult<Option<UserAccessEntry>> {
        self.read_json(&self.access_path(namespace, id), "access read")
            .await
    }
}

fn id_from_record_path(location: &ObjectPath) -> Option<u64> {
    let mut parts = location.as_ref().rsplit('/');
    match parts.next() {
        Some("record.json") => parts.next()?.parse().ok(),
        _ => None,
    }
}

fn map_object_error(context: &str, err: ObjectError) -> CatalogError {
    CatalogError::persistence(format!("{context}: {err}"))
}
