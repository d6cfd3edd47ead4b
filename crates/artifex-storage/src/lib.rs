//! Storage adapters realizing the catalog contract.
//!
//! Two interchangeable backends: [`sqlite::SqliteCatalogStore`] embeds a
//! single-process SQLite database; [`object::ObjectCatalogStore`] talks
//! to a networked object store. Both implement
//! [`artifex_core::CatalogStore`] and pass the same contract test suite.

pub mod object;
pub mod sqlite;

pub use object::ObjectCatalogStore;
pub use sqlite::{create_sqlite_pool, run_migrations, SqliteCatalogStore};

/// Embedded SQL migrations for the catalog database.
pub const MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
