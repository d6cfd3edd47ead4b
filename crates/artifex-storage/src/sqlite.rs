//! Embedded single-process adapter backed by SQLite.
//!
//! Counter increments ride on a single `INSERT .. ON CONFLICT DO UPDATE
//! .. RETURNING` statement and version/revision creation on `INSERT OR
//! IGNORE`, so uniqueness and atomicity come from the database, not from
//! adapter-side read-then-write.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{query, Row, SqlitePool};
use tracing::debug;

use artifex_core::{
    AdrRecord, ArtifactKind, ArtifactRecord, CatalogError, CatalogResult, CatalogStore,
    InsertOutcome, Permission, SequenceKind, StoreStatus, UserAccessEntry, Version,
};

use crate::MIGRATOR;

/// Creates a SQLite connection pool configured for catalog workloads.
pub async fn create_sqlite_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
}

/// Runs all outstanding migrations against the provided pool.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// SQLite-backed realization of the catalog storage contract.
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Creates a store backed by the provided pool. The caller is
    /// responsible for running migrations first.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (and migrates) an in-memory database. A single connection
    /// keeps every caller on the same memory instance.
    pub async fn connect_in_memory() -> CatalogResult<Self> {
        let options = "sqlite::memory:"
            .parse::<SqliteConnectOptions>()
            .map_err(|err| map_sqlx_error("parse in-memory url", err))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|err| map_sqlx_error("connect in-memory", err))?;
        run_migrations(&pool)
            .await
            .map_err(|err| CatalogError::persistence(format!("migrate in-memory: {err}")))?;
        Ok(Self::new(pool))
    }

    /// Provides access to the underlying pool, primarily for testing.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn status(&self) -> CatalogResult<StoreStatus> {
        match query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(StoreStatus::Healthy),
            Err(_) => Ok(StoreStatus::Degraded),
        }
    }

    async fn namespace_exists(&self, namespace: &str) -> CatalogResult<bool> {
        let row = query("SELECT 1 FROM namespaces WHERE name = ?1")
            .bind(namespace)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("namespace lookup", err))?;
        Ok(row.is_some())
    }

    async fn list_namespaces(&self) -> CatalogResult<Vec<String>> {
        let rows = query("SELECT name FROM namespaces")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("namespace list", err))?;
        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn insert_namespace(&self, namespace: &str) -> CatalogResult<bool> {
        let result = query("INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)")
            .bind(namespace)
            .bind(format_ts(&Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|err| map_sqlx_error("namespace insert", err))?;
        Ok(result.rows_affected() == 1)
    }

    async fn next_sequence(&self, kind: SequenceKind) -> CatalogResult<u64> {
        let row = query(
            r#"
            INSERT INTO counters (kind, value) VALUES (?1, 1)
            ON CONFLICT (kind) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("counter increment", err))?;

        let value: i64 = row.get("value");
        debug!(kind = kind.as_str(), value, "allocated sequence value");
        from_db_id(value)
    }

    async fn insert_artifact(
        &self,
        kind: ArtifactKind,
        record: &ArtifactRecord,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<()> {
        let id = to_db_id(record.id)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| map_sqlx_error("artifact insert begin", err))?;

        query(
            r#"
            INSERT INTO artifacts (kind, namespace, artifact_id, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(kind.collection())
        .bind(&record.namespace)
        .bind(id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(format_ts(&record.created_at))
        .bind(format_ts(&record.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|err| map_sqlx_error("artifact insert", err))?;

        let now = format_ts(&Utc::now());
        query(
            r#"
            INSERT INTO artifact_versions (kind, namespace, artifact_id, version, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(kind.collection())
        .bind(&record.namespace)
        .bind(id)
        .bind(version.storage_key())
        .bind(payload)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|err| map_sqlx_error("initial version insert", err))?;

        tx.commit()
            .await
            .map_err(|err| map_sqlx_error("artifact insert commit", err))?;

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
        let row = query(
            r#"
            SELECT artifact_id, namespace, name, description, created_at, updated_at
              FROM artifacts
             WHERE kind = ?1 AND namespace = ?2 AND artifact_id = ?3
            "#,
        )
        .bind(kind.collection())
        .bind(namespace)
        .bind(to_db_id(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("artifact lookup", err))?;

        row.map(map_artifact_row).transpose()
    }

    async fn list_artifact_ids(
        &self,
        kind: ArtifactKind,
        namespace: &str,
    ) -> CatalogResult<Vec<u64>> {
        let rows = query(
            r#"
            SELECT artifact_id
              FROM artifacts
             WHERE kind = ?1 AND namespace = ?2
          ORDER BY artifact_id ASC
            "#,
        )
        .bind(kind.collection())
        .bind(namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("artifact id list", err))?;

        rows.into_iter()
            .map(|row| from_db_id(row.get("artifact_id")))
            .collect()
    }

    async fn list_versions(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
    ) -> CatalogResult<Vec<Version>> {
        let rows = query(
            r#"
            SELECT version
              FROM artifact_versions
             WHERE kind = ?1 AND namespace = ?2 AND artifact_id = ?3
            "#,
        )
        .bind(kind.collection())
        .bind(namespace)
        .bind(to_db_id(id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("version list", err))?;

        let mut versions = rows
            .into_iter()
            .map(|row| parse_version_key(row.get("version")))
            .collect::<CatalogResult<Vec<_>>>()?;
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
        let row = query(
            r#"
            SELECT payload
              FROM artifact_versions
             WHERE kind = ?1 AND namespace = ?2 AND artifact_id = ?3 AND version = ?4
            "#,
        )
        .bind(kind.collection())
        .bind(namespace)
        .bind(to_db_id(id)?)
        .bind(version.storage_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("version lookup", err))?;

        Ok(row.map(|row| row.get("payload")))
    }

    async fn insert_version(
        &self,
        kind: ArtifactKind,
        namespace: &str,
        id: u64,
        version: &Version,
        payload: &str,
    ) -> CatalogResult<InsertOutcome> {
        let now = format_ts(&Utc::now());
        let result = query(
            r#"
            INSERT OR IGNORE INTO artifact_versions
                (kind, namespace, artifact_id, version, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(kind.collection())
        .bind(namespace)
        .bind(to_db_id(id)?)
        .bind(version.storage_key())
        .bind(payload)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("version insert", err))?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
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
        let now = format_ts(&Utc::now());
        query(
            r#"
            INSERT INTO artifact_versions
                (kind, namespace, artifact_id, version, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (kind, namespace, artifact_id, version)
            DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
            "#,
        )
        .bind(kind.collection())
        .bind(namespace)
        .bind(to_db_id(id)?)
        .bind(version.storage_key())
        .bind(payload)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("version upsert", err))?;
        Ok(())
    }

    async fn insert_adr(&self, record: &AdrRecord, payload: &str) -> CatalogResult<()> {
        let id = to_db_id(record.id)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| map_sqlx_error("adr insert begin", err))?;

        query(
            r#"
            INSERT INTO adrs (namespace, adr_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&record.namespace)
        .bind(id)
        .bind(format_ts(&record.created_at))
        .bind(format_ts(&record.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|err| map_sqlx_error("adr insert", err))?;

        query(
            r#"
            INSERT INTO adr_revisions (namespace, adr_id, revision, payload, created_at)
            VALUES (?1, ?2, 1, ?3, ?4)
            "#,
        )
        .bind(&record.namespace)
        .bind(id)
        .bind(payload)
        .bind(format_ts(&Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(|err| map_sqlx_error("initial revision insert", err))?;

        tx.commit()
            .await
            .map_err(|err| map_sqlx_error("adr insert commit", err))?;

        debug!(namespace = %record.namespace, id = record.id, "created adr");
        Ok(())
    }

    async fn get_adr_record(&self, namespace: &str, id: u64) -> CatalogResult<Option<AdrRecord>> {
        let row = query(
            r#"
            SELECT adr_id, namespace, created_at, updated_at
              FROM adrs
             WHERE namespace = ?1 AND adr_id = ?2
            "#,
        )
        .bind(namespace)
        .bind(to_db_id(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("adr lookup", err))?;

        row.map(map_adr_row).transpose()
    }

    async fn list_adr_ids(&self, namespace: &str) -> CatalogResult<Vec<u64>> {
        let rows = query(
            r#"
            SELECT adr_id FROM adrs WHERE namespace = ?1 ORDER BY adr_id ASC
            "#,
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("adr id list", err))?;

        rows.into_iter()
            .map(|row| from_db_id(row.get("adr_id")))
            .collect()
    }

    async fn list_adr_revisions(&self, namespace: &str, id: u64) -> CatalogResult<Vec<u32>> {
        let rows = query(
            r#"
            SELECT revision
              FROM adr_revisions
             WHERE namespace = ?1 AND adr_id = ?2
          ORDER BY revision ASC
            "#,
        )
        .bind(namespace)
        .bind(to_db_id(id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("revision list", err))?;

        rows.into_iter()
            .map(|row| {
                let raw: i64 = row.get("revision");
                u32::try_from(raw)
                    .map_err(|_| CatalogError::persistence(format!("corrupt revision `{raw}`")))
            })
            .collect()
    }

    async fn get_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
    ) -> CatalogResult<Option<String>> {
        let row = query(
            r#"
            SELECT payload
              FROM adr_revisions
             WHERE namespace = ?1 AND adr_id = ?2 AND revision = ?3
            "#,
        )
        .bind(namespace)
        .bind(to_db_id(id)?)
        .bind(i64::from(revision))
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("revision lookup", err))?;

        Ok(row.map(|row| row.get("payload")))
    }

    async fn append_adr_revision(
        &self,
        namespace: &str,
        id: u64,
        revision: u32,
        payload: &str,
    ) -> CatalogResult<InsertOutcome> {
        let result = query(
            r#"
            INSERT OR IGNORE INTO adr_revisions (namespace, adr_id, revision, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(namespace)
        .bind(to_db_id(id)?)
        .bind(i64::from(revision))
        .bind(payload)
        .bind(format_ts(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("revision append", err))?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    async fn insert_access(&self, entry: &UserAccessEntry) -> CatalogResult<()> {
        query(
            r#"
            INSERT INTO user_access
                (access_id, namespace, username, resource_kind, permission, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(to_db_id(entry.id)?)
        .bind(&entry.namespace)
        .bind(&entry.username)
        .bind(entry.resource.as_str())
        .bind(entry.permission.as_str())
        .bind(format_ts(&entry.created_at))
        .bind(format_ts(&entry.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("access insert", err))?;
        Ok(())
    }

    async fn access_for_username(&self, username: &str) -> CatalogResult<Vec<UserAccessEntry>> {
        let rows = query(
            r#"
            SELECT access_id, namespace, username, resource_kind, permission, created_at, updated_at
              FROM user_access
             WHERE username = ?1
          ORDER BY access_id ASC
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("access lookup by username", err))?;

        rows.into_iter().map(map_access_row).collect()
    }

    async fn access_for_namespace(&self, namespace: &str) -> CatalogResult<Vec<UserAccessEntry>> {
        let rows = query(
            r#"
            SELECT access_id, namespace, username, resource_kind, permission, created_at, updated_at
              FROM user_access
             WHERE namespace = ?1
          ORDER BY access_id ASC
            "#,
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("access lookup by namespace", err))?;

        rows.into_iter().map(map_access_row).collect()
    }

    async fn get_access(&self, namespace: &str, id: u64) -> CatalogResult<Option<UserAccessEntry>> {
        let row = query(
            r#"
            SELECT access_id, namespace, username, resource_kind, permission, created_at, updated_at
              FROM user_access
             WHERE namespace = ?1 AND access_id = ?2
            "#,
        )
        .bind(namespace)
        .bind(to_db_id(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error("access lookup", err))?;

        row.map(map_access_row).transpose()
    }
}

fn map_artifact_row(row: SqliteRow) -> CatalogResult<ArtifactRecord> {
    Ok(ArtifactRecord {
        id: from_db_id(row.get("artifact_id"))?,
        namespace: row.get("namespace"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
    })
}

fn map_adr_row(row: SqliteRow) -> CatalogResult<AdrRecord> {
    Ok(AdrRecord {
        id: from_db_id(row.get("adr_id"))?,
        namespace: row.get("namespace"),
        created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
    })
}

fn map_access_row(row: SqliteRow) -> CatalogResult<UserAccessEntry> {
    let resource: String = row.get("resource_kind");
    let permission: String = row.get("permission");
    Ok(UserAccessEntry {
        id: from_db_id(row.get("access_id"))?,
        namespace: row.get("namespace"),
        username: row.get("username"),
        resource: SequenceKind::from_str(&resource)
            .map_err(|_| CatalogError::persistence(format!("unknown resource kind `{resource}`")))?,
        permission: Permission::from_str(&permission)
            .map_err(|_| CatalogError::persistence(format!("unknown permission `{permission}`")))?,
        created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
    })
}

fn parse_version_key(raw: String) -> CatalogResult<Version> {
    raw.parse::<Version>()
        .map_err(|_| CatalogError::persistence(format!("corrupt version key `{raw}`")))
}

fn to_db_id(id: u64) -> CatalogResult<i64> {
    i64::try_from(id)
        .map_err(|_| CatalogError::validation(format!("identifier `{id}` exceeds 63-bit range")))
}

fn from_db_id(raw: i64) -> CatalogResult<u64> {
    u64::try_from(raw)
        .map_err(|_| CatalogError::persistence(format!("stored negative identifier `{raw}`")))
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> CatalogResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| CatalogError::persistence(format!("invalid timestamp `{raw}`: {err}")))
}

fn map_sqlx_error(context: &'static str, err: sqlx::Error) -> CatalogError {
    CatalogError::persistence(format!("{context}: {err}"))
}
