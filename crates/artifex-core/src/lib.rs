//! Core domain types and the storage contract for the Artifex catalog.

pub mod access;
pub mod adr;
pub mod artifact;
pub mod error;
pub mod namespace;
pub mod resource;
pub mod sanitize;
pub mod store;
pub mod version;

pub use access::{Permission, UserAccessEntry};
pub use adr::{Adr, AdrDecision, AdrLink, AdrOption, AdrRecord, AdrRevision, AdrSnapshot, AdrStatus};
pub use artifact::{Artifact, ArtifactRecord};
pub use error::{CatalogError, CatalogResult};
pub use namespace::NamespaceName;
pub use resource::{ArtifactKind, SequenceKind};
pub use sanitize::{MarkupStrippingSanitizer, Sanitizer};
pub use store::{CatalogStore, InsertOutcome, StoreStatus};
pub use version::Version;
