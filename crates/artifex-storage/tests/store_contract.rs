//! Contract test suite shared by both storage adapters.
//!
//! Every test runs against the embedded SQLite store and the in-memory
//! object store so the two backends cannot drift apart.

use std::sync::Arc;

use object_store::memory::InMemory;

use artifex_core::{
    AdrRecord, ArtifactKind, ArtifactRecord, CatalogStore, InsertOutcome, Permission,
    SequenceKind, StoreStatus, UserAccessEntry, Version,
};
use artifex_storage::{create_sqlite_pool, run_migrations, ObjectCatalogStore, SqliteCatalogStore};

async fn stores() -> Vec<(&'static str, Arc<dyn CatalogStore>)> {
    let sqlite = SqliteCatalogStore::connect_in_memory()
        .await
        .expect("in-memory sqlite store");
    let object = ObjectCatalogStore::new(Arc::new(InMemory::new()));
    vec![
        ("sqlite", Arc::new(sqlite) as Arc<dyn CatalogStore>),
        ("object", Arc::new(object) as Arc<dyn CatalogStore>),
    ]
}

fn version(s: &str) -> Version {
    s.parse().expect("version literal")
}

#[tokio::test]
async fn reports_healthy_status() {
    for (backend, store) in stores().await {
        let status = store.status().await.expect(backend);
        assert_eq!(status, StoreStatus::Healthy, "{backend}");
    }
}

#[tokio::test]
async fn namespace_insert_is_idempotent() {
    for (backend, store) in stores().await {
        assert!(!store.namespace_exists("finos").await.expect(backend));
        assert!(store.insert_namespace("finos").await.expect(backend));
        assert!(!store.insert_namespace("finos").await.expect(backend));
        assert!(store.namespace_exists("finos").await.expect(backend));

        let names = store.list_namespaces().await.expect(backend);
        assert_eq!(names, vec!["finos".to_string()], "{backend}");
    }
}

#[tokio::test]
async fn counters_start_at_one_and_are_isolated_per_kind() {
    for (backend, store) in stores().await {
        assert_eq!(store.next_sequence(SequenceKind::Pattern).await.expect(backend), 1);
        assert_eq!(store.next_sequence(SequenceKind::Pattern).await.expect(backend), 2);
        assert_eq!(store.next_sequence(SequenceKind::Pattern).await.expect(backend), 3);

        // A different kind owns its own sequence.
        assert_eq!(store.next_sequence(SequenceKind::Adr).await.expect(backend), 1);
    }
}

#[tokio::test]
async fn artifact_insert_and_lookup_round_trip() {
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);
        let record = ArtifactRecord::new(1, "finos", Some("calm".to_string()), None);
        store
            .insert_artifact(ArtifactKind::Pattern, &record, &Version::INITIAL, r#"{"test":"json"}"#)
            .await
            .expect(backend);

        let fetched = store
            .get_artifact(ArtifactKind::Pattern, "finos", 1)
            .await
            .expect(backend)
            .expect("artifact present");
        assert_eq!(fetched.id, 1, "{backend}");
        assert_eq!(fetched.namespace, "finos");
        assert_eq!(fetched.name.as_deref(), Some("calm"));

        let ids = store
            .list_artifact_ids(ArtifactKind::Pattern, "finos")
            .await
            .expect(backend);
        assert_eq!(ids, vec![1]);

        let versions = store
            .list_versions(ArtifactKind::Pattern, "finos", 1)
            .await
            .expect(backend);
        assert_eq!(versions, vec![Version::INITIAL]);
    }
}

#[tokio::test]
async fn missing_artifacts_and_namespaces_read_as_empty() {
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);

        let ids = store
            .list_artifact_ids(ArtifactKind::Flow, "finos")
            .await
            .expect(backend);
        assert!(ids.is_empty(), "{backend}");

        let artifact = store
            .get_artifact(ArtifactKind::Flow, "finos", 42)
            .await
            .expect(backend);
        assert!(artifact.is_none(), "{backend}");

        let versions = store
            .list_versions(ArtifactKind::Flow, "finos", 42)
            .await
            .expect(backend);
        assert!(versions.is_empty(), "{backend}");
    }
}

#[tokio::test]
async fn version_payloads_round_trip_byte_for_byte() {
    let payload = "{\n  \"spaced\": \t\"value\",  \"n\": 1e3 }";
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);
        let record = ArtifactRecord::new(1, "finos", None, None);
        store
            .insert_artifact(ArtifactKind::Standard, &record, &Version::INITIAL, payload)
            .await
            .expect(backend);

        let stored = store
            .get_version_payload(ArtifactKind::Standard, "finos", 1, &Version::INITIAL)
            .await
            .expect(backend)
            .expect("payload present");
        assert_eq!(stored, payload, "{backend}");
    }
}

#[tokio::test]
async fn insert_version_is_conditional_and_put_version_overwrites() {
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);
        let record = ArtifactRecord::new(1, "finos", None, None);
        store
            .insert_artifact(ArtifactKind::Pattern, &record, &Version::INITIAL, "{}")
            .await
            .expect(backend);

        let next = version("1.0.1");
        let outcome = store
            .insert_version(ArtifactKind::Pattern, "finos", 1, &next, r#"{"a":1}"#)
            .await
            .expect(backend);
        assert_eq!(outcome, InsertOutcome::Inserted, "{backend}");

        let outcome = store
            .insert_version(ArtifactKind::Pattern, "finos", 1, &next, r#"{"a":2}"#)
            .await
            .expect(backend);
        assert_eq!(outcome, InsertOutcome::AlreadyPresent, "{backend}");

        // The losing insert must not have clobbered the payload.
        let stored = store
            .get_version_payload(ArtifactKind::Pattern, "finos", 1, &next)
            .await
            .expect(backend)
            .expect("payload present");
        assert_eq!(stored, r#"{"a":1}"#, "{backend}");

        store
            .put_version(ArtifactKind::Pattern, "finos", 1, &next, r#"{"a":3}"#)
            .await
            .expect(backend);
        let stored = store
            .get_version_payload(ArtifactKind::Pattern, "finos", 1, &next)
            .await
            .expect(backend)
            .expect("payload present");
        assert_eq!(stored, r#"{"a":3}"#, "{backend}");
    }
}

#[tokio::test]
async fn dot_and_dash_version_keys_are_the_same_version() {
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);
        let record = ArtifactRecord::new(1, "finos", None, None);
        store
            .insert_artifact(ArtifactKind::Pattern, &record, &version("1.0.0"), "{}")
            .await
            .expect(backend);

        let stored = store
            .get_version_payload(ArtifactKind::Pattern, "finos", 1, &version("1-0-0"))
            .await
            .expect(backend);
        assert!(stored.is_some(), "{backend}");
    }
}

#[tokio::test]
async fn adr_revisions_append_conditionally() {
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);
        let record = AdrRecord::new(1, "finos");
        store.insert_adr(&record, r#"{"rev":1}"#).await.expect(backend);

        assert_eq!(store.list_adr_ids("finos").await.expect(backend), vec![1]);
        assert_eq!(
            store.list_adr_revisions("finos", 1).await.expect(backend),
            vec![1]
        );

        let outcome = store
            .append_adr_revision("finos", 1, 2, r#"{"rev":2}"#)
            .await
            .expect(backend);
        assert_eq!(outcome, InsertOutcome::Inserted, "{backend}");

        let outcome = store
            .append_adr_revision("finos", 1, 2, r#"{"rev":"dup"}"#)
            .await
            .expect(backend);
        assert_eq!(outcome, InsertOutcome::AlreadyPresent, "{backend}");

        let first = store
            .get_adr_revision("finos", 1, 1)
            .await
            .expect(backend)
            .expect("revision 1");
        assert_eq!(first, r#"{"rev":1}"#, "{backend}");

        let second = store
            .get_adr_revision("finos", 1, 2)
            .await
            .expect(backend)
            .expect("revision 2");
        assert_eq!(second, r#"{"rev":2}"#, "{backend}");

        assert!(store
            .get_adr_revision("finos", 1, 9)
            .await
            .expect(backend)
            .is_none());
    }
}

#[tokio::test]
async fn user_access_lookups_cover_all_scopes() {
    for (backend, store) in stores().await {
        store.insert_namespace("finos").await.expect(backend);
        store.insert_namespace("traderx").await.expect(backend);

        let first = UserAccessEntry::new(1, "finos", "alice", SequenceKind::Pattern, Permission::Read);
        let second =
            UserAccessEntry::new(2, "traderx", "alice", SequenceKind::Adr, Permission::Write);
        let third = UserAccessEntry::new(3, "finos", "bob", SequenceKind::Flow, Permission::Read);
        for entry in [&first, &second, &third] {
            store.insert_access(entry).await.expect(backend);
        }

        let alice = store.access_for_username("alice").await.expect(backend);
        let alice_ids: Vec<u64> = alice.iter().map(|entry| entry.id).collect();
        assert_eq!(alice_ids, vec![1, 2], "{backend}");
        assert!(alice.iter().all(|entry| entry.username == "alice"));

        let finos = store.access_for_namespace("finos").await.expect(backend);
        let finos_ids: Vec<u64> = finos.iter().map(|entry| entry.id).collect();
        assert_eq!(finos_ids, vec![1, 3], "{backend}");

        let fetched = store
            .get_access("finos", 3)
            .await
            .expect(backend)
            .expect("entry present");
        assert_eq!(fetched.username, "bob", "{backend}");
        assert_eq!(fetched.resource, SequenceKind::Flow);
        assert_eq!(fetched.permission, Permission::Read);

        assert!(store.get_access("finos", 2).await.expect(backend).is_none());
    }
}

#[tokio::test]
async fn file_backed_sqlite_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());

    {
        let pool = create_sqlite_pool(&url).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        let store = SqliteCatalogStore::new(pool);
        store.insert_namespace("finos").await.expect("insert");
        assert_eq!(store.next_sequence(SequenceKind::Pattern).await.expect("seq"), 1);
    }

    let pool = create_sqlite_pool(&url).await.expect("pool reopen");
    run_migrations(&pool).await.expect("migrations reopen");
    let store = SqliteCatalogStore::new(pool);
    assert!(store.namespace_exists("finos").await.expect("exists"));
    assert_eq!(store.next_sequence(SequenceKind::Pattern).await.expect("seq"), 2);
}
