//! End-to-end catalog flows exercised through the service layer, against
//! both storage adapters.

use std::sync::Arc;

use object_store::memory::InMemory;

use artifex_core::{
    Adr, AdrDecision, AdrLink, AdrOption, AdrStatus, ArtifactKind, CatalogError, CatalogStore,
    MarkupStrippingSanitizer, Permission, Sanitizer, SequenceKind, Version,
};
use artifex_service::{
    AdrCatalog, ArtifactCatalog, NamespaceService, UserAccessCatalog,
};
use artifex_storage::{ObjectCatalogStore, SqliteCatalogStore};

struct Harness {
    backend: &'static str,
    store: Arc<dyn CatalogStore>,
    namespaces: NamespaceService,
    patterns: ArtifactCatalog,
    flows: ArtifactCatalog,
    adrs: AdrCatalog,
    access: UserAccessCatalog,
}

async fn harnesses() -> Vec<Harness> {
    let sqlite = Arc::new(
        SqliteCatalogStore::connect_in_memory()
            .await
            .expect("in-memory sqlite store"),
    ) as Arc<dyn CatalogStore>;
    let object = Arc::new(ObjectCatalogStore::new(Arc::new(InMemory::new()))) as Arc<dyn CatalogStore>;

    [("sqlite", sqlite), ("object", object)]
        .into_iter()
        .map(|(backend, store)| {
            let sanitizer: Arc<dyn Sanitizer> = Arc::new(MarkupStrippingSanitizer);
            Harness {
                backend,
                store: store.clone(),
                namespaces: NamespaceService::new(store.clone()),
                patterns: ArtifactCatalog::new(store.clone(), ArtifactKind::Pattern),
                flows: ArtifactCatalog::new(store.clone(), ArtifactKind::Flow),
                adrs: AdrCatalog::new(store.clone(), sanitizer),
                access: UserAccessCatalog::new(store),
            }
        })
        .collect()
}

fn sample_adr() -> Adr {
    Adr {
        title: "My ADR".to_string(),
        status: AdrStatus::Draft,
        context: "Choosing a message broker".to_string(),
        decision_drivers: vec!["operability".to_string()],
        considered_options: vec![AdrOption {
            name: "Kafka".to_string(),
            description: "Durable log".to_string(),
        }],
        decision_outcome: Some(AdrDecision {
            chosen_option: "Kafka".to_string(),
            rationale: "Replay support".to_string(),
        }),
        links: vec![AdrLink {
            rel: "refines".to_string(),
            href: "https://example.com/adr/7".to_string(),
        }],
    }
}

#[tokio::test]
async fn unknown_namespace_fails_every_scoped_operation() {
    for h in harnesses().await {
        let b = h.backend;

        assert!(matches!(
            h.patterns.list_artifact_ids("ghost").await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.patterns.create_artifact("ghost", None, None, "{}").await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.patterns.get_version("ghost", 1, "1.0.0").await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.adrs.create_adr("ghost", &sample_adr()).await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.access
                .create("ghost", "alice", SequenceKind::Pattern, Permission::Read)
                .await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.access.get_for_namespace("ghost").await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");
    }
}

#[tokio::test]
async fn namespace_create_is_idempotent_and_validated() {
    for h in harnesses().await {
        let b = h.backend;

        h.namespaces.create("finos").await.expect(b);
        h.namespaces.create("finos").await.expect(b);
        assert!(h.namespaces.exists("finos").await.expect(b));
        assert_eq!(h.namespaces.list().await.expect(b), vec!["finos".to_string()]);

        assert!(matches!(
            h.namespaces.create("not valid!").await,
            Err(CatalogError::Validation { .. })
        ), "{b}");
        assert!(!h.namespaces.exists("not valid!").await.expect(b));
    }
}

// Scenario A: first pattern in a fresh namespace gets id 1 at 1.0.0.
#[tokio::test]
async fn creating_the_first_pattern_assigns_id_one_at_initial_version() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);

        let artifact = h
            .patterns
            .create_artifact("finos", None, None, r#"{"test":"json"}"#)
            .await
            .expect(b);
        assert_eq!(artifact.record.id, 1, "{b}");
        assert_eq!(artifact.versions, vec![Version::INITIAL], "{b}");

        let versions = h.patterns.list_versions("finos", 1).await.expect(b);
        assert_eq!(versions, vec![Version::INITIAL], "{b}");

        let payload = h.patterns.get_version("finos", 1, "1.0.0").await.expect(b);
        assert_eq!(payload, r#"{"test":"json"}"#, "{b}");
    }
}

#[tokio::test]
async fn ids_grow_within_a_kind_and_are_independent_across_kinds() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);

        let first = h.patterns.create_artifact("finos", None, None, "{}").await.expect(b);
        let second = h.patterns.create_artifact("finos", None, None, "{}").await.expect(b);
        assert!(second.record.id > first.record.id, "{b}");
        assert_eq!((first.record.id, second.record.id), (1, 2), "{b}");

        // Flows own their own counter.
        let flow = h.flows.create_artifact("finos", None, None, "{}").await.expect(b);
        assert_eq!(flow.record.id, 1, "{b}");

        assert_eq!(h.patterns.list_artifact_ids("finos").await.expect(b), vec![1, 2]);
        assert_eq!(h.flows.list_artifact_ids("finos").await.expect(b), vec![1]);
    }
}

// Scenario B: duplicate createVersion conflicts, missing version reads fail.
#[tokio::test]
async fn create_version_conflicts_and_missing_versions_are_distinct_errors() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);
        h.patterns
            .create_artifact("finos", None, None, r#"{"test":"json"}"#)
            .await
            .expect(b);

        let artifact = h
            .patterns
            .create_version("finos", 1, "1.0.1", r#"{"v":"1.0.1"}"#)
            .await
            .expect(b);
        assert_eq!(
            artifact.versions,
            vec![Version::INITIAL, "1.0.1".parse().unwrap()],
            "{b}"
        );

        assert!(matches!(
            h.patterns.create_version("finos", 1, "1.0.1", "{}").await,
            Err(CatalogError::VersionExists { .. })
        ), "{b}");

        assert!(matches!(
            h.patterns.get_version("finos", 1, "9.9.9").await,
            Err(CatalogError::VersionNotFound { .. })
        ), "{b}");

        // Artifact existence is checked before the version key.
        assert!(matches!(
            h.patterns.get_version("finos", 99, "1.0.0").await,
            Err(CatalogError::ArtifactNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.patterns.create_version("finos", 99, "1.0.0", "{}").await,
            Err(CatalogError::ArtifactNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.patterns.update_version("finos", 99, "1.0.0", "{}").await,
            Err(CatalogError::ArtifactNotFound { .. })
        ), "{b}");
    }
}

#[tokio::test]
async fn update_version_upserts_and_is_idempotent() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);
        h.patterns.create_artifact("finos", None, None, "{}").await.expect(b);

        // Creates the version when absent.
        h.patterns
            .update_version("finos", 1, "2.0.0", r#"{"rev":"a"}"#)
            .await
            .expect(b);
        // Overwrites when present; repeating is safe.
        h.patterns
            .update_version("finos", 1, "2.0.0", r#"{"rev":"b"}"#)
            .await
            .expect(b);
        h.patterns
            .update_version("finos", 1, "2.0.0", r#"{"rev":"b"}"#)
            .await
            .expect(b);

        let payload = h.patterns.get_version("finos", 1, "2.0.0").await.expect(b);
        assert_eq!(payload, r#"{"rev":"b"}"#, "{b}");
    }
}

#[tokio::test]
async fn dot_and_dash_version_spellings_are_interchangeable() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);
        h.patterns.create_artifact("finos", None, None, "{}").await.expect(b);

        h.patterns
            .create_version("finos", 1, "1-0-1", r#"{"sep":"dash"}"#)
            .await
            .expect(b);
        let payload = h.patterns.get_version("finos", 1, "1.0.1").await.expect(b);
        assert_eq!(payload, r#"{"sep":"dash"}"#, "{b}");

        assert!(matches!(
            h.patterns.create_version("finos", 1, "1.0.1", "{}").await,
            Err(CatalogError::VersionExists { .. })
        ), "{b}");

        assert!(matches!(
            h.patterns.get_version("finos", 1, "1.0").await,
            Err(CatalogError::Validation { .. })
        ), "{b}");
    }
}

// Scenario D: an existing namespace with no artifacts lists empty.
#[tokio::test]
async fn listing_artifacts_in_an_empty_namespace_returns_no_ids() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);
        assert!(h.patterns.list_artifact_ids("finos").await.expect(b).is_empty(), "{b}");
        assert!(h.adrs.list_adr_ids("finos").await.expect(b).is_empty(), "{b}");
    }
}

#[tokio::test]
async fn malformed_payloads_are_rejected_before_any_write() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);

        assert!(matches!(
            h.patterns.create_artifact("finos", None, None, "{not json").await,
            Err(CatalogError::Parse { .. })
        ), "{b}");
        // The failed create must not have consumed an id or written anything.
        assert!(h.patterns.list_artifact_ids("finos").await.expect(b).is_empty(), "{b}");

        h.patterns.create_artifact("finos", None, None, "{}").await.expect(b);
        assert!(matches!(
            h.patterns.create_version("finos", 1, "1.0.1", "[1,").await,
            Err(CatalogError::Parse { .. })
        ), "{b}");
        assert_eq!(
            h.patterns.list_versions("finos", 1).await.expect(b),
            vec![Version::INITIAL],
            "{b}"
        );
    }
}

// Scenario C: status transition appends revision 2, revision 1 keeps draft.
#[tokio::test]
async fn adr_status_updates_append_instead_of_mutating() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);

        let created = h.adrs.create_adr("finos", &sample_adr()).await.expect(b);
        assert_eq!(created.record.id, 1, "{b}");
        assert_eq!(created.revision.revision, 1, "{b}");
        assert_eq!(created.revision.adr.status, AdrStatus::Draft, "{b}");

        let updated = h
            .adrs
            .update_adr_status("finos", 1, AdrStatus::Proposed)
            .await
            .expect(b);
        assert_eq!(updated.revision.revision, 2, "{b}");
        assert_eq!(updated.revision.adr.status, AdrStatus::Proposed, "{b}");
        assert_eq!(updated.revision.adr.title, "My ADR", "{b}");

        let first = h.adrs.get_adr_revision("finos", 1, 1).await.expect(b);
        assert_eq!(first.revision.adr.status, AdrStatus::Draft, "{b}");

        let latest = h.adrs.get_adr("finos", 1).await.expect(b);
        assert_eq!(latest.revision.revision, 2, "{b}");
        assert_eq!(latest.revision.adr.status, AdrStatus::Proposed, "{b}");
    }
}

#[tokio::test]
async fn adr_updates_append_monotonically_and_preserve_history() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);
        h.adrs.create_adr("finos", &sample_adr()).await.expect(b);

        let steps: u32 = 3;
        for step in 1..=steps {
            let mut adr = sample_adr();
            adr.context = format!("context at step {step}");
            let snapshot = h.adrs.update_adr("finos", 1, &adr).await.expect(b);
            assert_eq!(snapshot.revision.revision, step + 1, "{b}");
        }

        let latest = h.adrs.get_adr("finos", 1).await.expect(b);
        assert_eq!(latest.revision.revision, steps + 1, "{b}");
        assert_eq!(latest.revision.adr.context, format!("context at step {steps}"));

        // Every prior revision still reads back exactly as written.
        let first = h.adrs.get_adr_revision("finos", 1, 1).await.expect(b);
        assert_eq!(first.revision.adr, sample_adr(), "{b}");
        for step in 1..=steps {
            let snapshot = h.adrs.get_adr_revision("finos", 1, step + 1).await.expect(b);
            assert_eq!(
                snapshot.revision.adr.context,
                format!("context at step {step}"),
                "{b}"
            );
        }

        assert!(matches!(
            h.adrs.get_adr_revision("finos", 1, 99).await,
            Err(CatalogError::AdrRevisionNotFound { .. })
        ), "{b}");
        assert!(matches!(
            h.adrs.get_adr("finos", 42).await,
            Err(CatalogError::ArtifactNotFound { kind: "adr", .. })
        ), "{b}");
    }
}

#[tokio::test]
async fn adr_free_text_is_sanitized_before_persisting() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);

        let mut adr = sample_adr();
        adr.title = "My <script>alert(1)</script>ADR".to_string();
        adr.decision_drivers = vec!["<scr<script>ipt>stealth".to_string()];
        adr.links[0].href = "<a href=x>https://example.com</a>".to_string();

        let created = h.adrs.create_adr("finos", &adr).await.expect(b);
        assert_eq!(created.revision.adr.title, "My alert(1)ADR", "{b}");
        assert_eq!(created.revision.adr.decision_drivers, vec!["stealth".to_string()]);
        assert_eq!(created.revision.adr.links[0].href, "https://example.com");

        // What was stored is the sanitized payload, not the raw input.
        let fetched = h.adrs.get_adr_revision("finos", 1, 1).await.expect(b);
        assert_eq!(fetched.revision.adr, created.revision.adr, "{b}");
    }
}

#[tokio::test]
async fn user_access_lookups_follow_the_stated_precedence() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);
        h.namespaces.create("traderx").await.expect(b);

        let entry = h
            .access
            .create("finos", "alice", SequenceKind::Pattern, Permission::Read)
            .await
            .expect(b);
        assert_eq!(entry.id, 1, "{b}");
        h.access
            .create("traderx", "alice", SequenceKind::Adr, Permission::Write)
            .await
            .expect(b);

        // Duplicates of the same grant are allowed.
        let duplicate = h
            .access
            .create("finos", "alice", SequenceKind::Pattern, Permission::Read)
            .await
            .expect(b);
        assert_eq!(duplicate.id, 3, "{b}");

        let alice = h.access.get_for_username("alice").await.expect(b);
        assert_eq!(alice.len(), 3, "{b}");

        assert!(matches!(
            h.access.get_for_username("nobody").await,
            Err(CatalogError::UserAccessNotFound { .. })
        ), "{b}");

        let finos = h.access.get_for_namespace("finos").await.expect(b);
        assert_eq!(finos.len(), 2, "{b}");

        assert!(matches!(
            h.access.get_for_namespace("ghost").await,
            Err(CatalogError::NamespaceNotFound { .. })
        ), "{b}");

        let fetched = h.access.get_for_namespace_and_id("finos", 1).await.expect(b);
        assert_eq!(fetched.username, "alice", "{b}");
        assert!(matches!(
            h.access.get_for_namespace_and_id("finos", 2).await,
            Err(CatalogError::UserAccessNotFound { .. })
        ), "{b}");
    }
}

#[tokio::test]
async fn all_five_artifact_kinds_share_the_same_rules() {
    for h in harnesses().await {
        let b = h.backend;
        h.namespaces.create("finos").await.expect(b);

        for kind in ArtifactKind::ALL {
            let catalog = ArtifactCatalog::new(h.store.clone(), kind);
            let artifact = catalog
                .create_artifact("finos", Some(kind.as_str().to_string()), None, "{}")
                .await
                .expect(b);
            assert_eq!(artifact.record.id, 1, "{b}/{kind}");
            assert_eq!(
                catalog.list_artifact_ids("finos").await.expect(b),
                vec![1],
                "{b}/{kind}"
            );
        }
    }
}
