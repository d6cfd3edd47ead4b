use std::sync::Arc;

use tracing::info;

use artifex_core::{CatalogError, CatalogResult, CatalogStore, NamespaceName};

/// Gate in front of every other catalog component: namespaces must exist
/// before anything can be stored under them.
pub struct NamespaceService {
    store: Arc<dyn CatalogStore>,
}

impl NamespaceService {
    /// Creates a service over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Returns whether the namespace exists.
    pub async fn exists(&self, namespace: &str) -> CatalogResult<bool> {
        self.store.namespace_exists(namespace).await
    }

    /// Returns all known namespace names. Order is not guaranteed.
    pub async fn list(&self) -> CatalogResult<Vec<String>> {
        self.store.list_namespaces().await
    }

    /// Validates the name and creates the namespace. Creating an
    /// existing namespace is a no-op.
    pub async fn create(&self, namespace: &str) -> CatalogResult<NamespaceName> {
        let name: NamespaceName = namespace.parse()?;
        let created = self.store.insert_namespace(name.as_str()).await?;
        if created {
            info!(namespace = %name, "created namespace");
        }
        Ok(name)
    }
}

/// Fails with `NamespaceNotFound` unless the namespace exists.
pub(crate) async fn ensure_namespace(
    store: &dyn CatalogStore,
    namespace: &str,
) -> CatalogResult<()> {
    if store.namespace_exists(namespace).await? {
        Ok(())
    } else {
        Err(CatalogError::namespace_not_found(namespace))
    }
}
