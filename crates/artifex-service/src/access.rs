use std::sync::Arc;

use tracing::info;

use artifex_core::{
    CatalogError, CatalogResult, CatalogStore, Permission, SequenceKind, UserAccessEntry,
};

use crate::namespace::ensure_namespace;

/// Namespace-scoped permission records.
///
/// Grants are append-only flat records; duplicate
/// `(namespace, username, resource)` combinations are not rejected.
pub struct UserAccessCatalog {
    store: Arc<dyn CatalogStore>,
}

impl UserAccessCatalog {
    /// Creates a catalog over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Records a grant with a fresh counter-assigned id.
    pub async fn create(
        &self,
        namespace: &str,
        username: &str,
        resource: SequenceKind,
        permission: Permission,
    ) -> CatalogResult<UserAccessEntry> {
        ensure_namespace(self.store.as_ref(), namespace).await?;

        let id = self.store.next_sequence(SequenceKind::UserAccess).await?;
        let entry = UserAccessEntry::new(id, namespace, username, resource, permission);
        self.store.insert_access(&entry).await?;

        info!(namespace, username, id, "created user access entry");
        Ok(entry)
    }

    /// Lists grants for a username across all namespaces.
    pub async fn get_for_username(&self, username: &str) -> CatalogResult<Vec<UserAccessEntry>> {
        let entries = self.store.access_for_username(username).await?;
        if entries.is_empty() {
            return Err(CatalogError::UserAccessNotFound {
                scope: format!("username `{username}`"),
            });
        }
        Ok(entries)
    }

    /// Lists grants scoped to a namespace.
    pub async fn get_for_namespace(&self, namespace: &str) -> CatalogResult<Vec<UserAccessEntry>> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        let entries = self.store.access_for_namespace(namespace).await?;
        if entries.is_empty() {
            return Err(CatalogError::UserAccessNotFound {
                scope: format!("namespace `{namespace}`"),
            });
        }
        Ok(entries)
    }

    /// Fetches a single grant by namespace and id.
    pub async fn get_for_namespace_and_id(
        &self,
        namespace: &str,
        id: u64,
    ) -> CatalogResult<UserAccessEntry> {
        ensure_namespace(self.store.as_ref(), namespace).await?;
        self.store
            .get_access(namespace, id)
            .await?
            .ok_or_else(|| CatalogError::UserAccessNotFound {
                scope: format!("namespace `{namespace}` id `{id}`"),
            })
    }
}
