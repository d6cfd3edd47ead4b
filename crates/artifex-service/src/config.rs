//! Runtime configuration for the catalog.
//!
//! Sources, in precedence order: environment variables prefixed
//! `ARTIFEX`, an optional TOML file, then defaults. The config selects
//! which storage adapter serves the catalog and how to reach it.

use std::path::Path;
use std::sync::Arc;

use config::{Config, ConfigError, Environment, File};
use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};
use tracing::info;

use artifex_core::{CatalogError, CatalogResult, CatalogStore};
use artifex_storage::{create_sqlite_pool, run_migrations, ObjectCatalogStore, SqliteCatalogStore};

/// Which storage adapter serves the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded single-process SQLite database.
    Sqlite,
    /// Networked object store (S3 or compatible).
    Object,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Sqlite
    }
}

/// Root configuration structure for the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Selected storage adapter.
    #[serde(default)]
    pub backend: BackendKind,

    /// Embedded database settings, used when `backend = "sqlite"`.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Object store settings, used when `backend = "object"`.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

/// Embedded database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database URL.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Object store settings. Credentials come from the environment, the
/// way the S3 SDK resolves them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Bucket holding the catalog documents.
    #[serde(default)]
    pub bucket: String,

    /// Optional key prefix under which all documents live.
    #[serde(default)]
    pub prefix: String,

    /// Optional explicit region.
    #[serde(default)]
    pub region: Option<String>,
}

fn default_database_url() -> String {
    "sqlite://artifex.db".to_string()
}

impl CatalogConfig {
    /// Loads configuration from `config/artifex.toml` (if present) with
    /// `ARTIFEX_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/artifex").required(false))
            .add_source(Environment::with_prefix("ARTIFEX").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from an explicit file with environment
    /// overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("ARTIFEX").separator("__"))
            .build()?
            .try_deserialize()
    }
}

/// Builds the configured storage adapter, running migrations where the
/// backend has any.
pub async fn connect(config: &CatalogConfig) -> CatalogResult<Arc<dyn CatalogStore>> {
    match config.backend {
        BackendKind::Sqlite => {
            let pool = create_sqlite_pool(&config.database.url)
                .await
                .map_err(|err| {
                    CatalogError::persistence(format!("open `{}`: {err}", config.database.url))
                })?;
            run_migrations(&pool)
                .await
                .map_err(|err| CatalogError::persistence(format!("migrate: {err}")))?;
            info!(url = %config.database.url, "connected embedded catalog store");
            Ok(Arc::new(SqliteCatalogStore::new(pool)))
        }
        BackendKind::Object => {
            let mut builder =
                AmazonS3Builder::from_env().with_bucket_name(&config.object_store.bucket);
            if let Some(region) = &config.object_store.region {
                builder = builder.with_region(region);
            }
            let store = builder.build().map_err(|err| {
                CatalogError::persistence(format!(
                    "open bucket `{}`: {err}",
                    config.object_store.bucket
                ))
            })?;
            info!(bucket = %config.object_store.bucket, "connected object catalog store");
            Ok(Arc::new(ObjectCatalogStore::with_prefix(
                Arc::new(store),
                config.object_store.prefix.clone(),
            )))
        }
    }
}
