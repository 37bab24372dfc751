//!
//! # Orchestration platform API
//!
//! Get/List/Create/Update/Delete against the platform's object store with
//! optimistic concurrency on `ObjectMeta::resource_version`.
//!

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use ordo_types::ObjectKey;

use crate::core::Spec;
use crate::store::MetadataStoreObject;

pub type SharedClient<C> = Arc<C>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: ObjectKey },
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: ObjectKey },
    #[error("{kind} {key} was modified concurrently: expected version {expected}, found {found}")]
    Conflict {
        kind: &'static str,
        key: ObjectKey,
        expected: u64,
        found: u64,
    },
    #[error("platform unavailable: {0}")]
    Unavailable(String),
    #[error("unable to decode {kind} {key}: {source}")]
    Serialization {
        kind: &'static str,
        key: ObjectKey,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ClientError {
    pub fn not_found<S: Spec>(key: &ObjectKey) -> Self {
        Self::NotFound {
            kind: S::LABEL,
            key: key.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// retrieve a single item
    async fn retrieve_item<S>(&self, key: &ObjectKey) -> Result<MetadataStoreObject<S>, ClientError>
    where
        S: Spec;

    /// list items of a kind in namespace
    async fn retrieve_items<S>(
        &self,
        namespace: &str,
    ) -> Result<Vec<MetadataStoreObject<S>>, ClientError>
    where
        S: Spec;

    /// create new object, resource version is assigned by the platform
    async fn create_item<S>(
        &self,
        value: MetadataStoreObject<S>,
    ) -> Result<MetadataStoreObject<S>, ClientError>
    where
        S: Spec;

    /// replace existing object. `value.meta.resource_version` must match the stored version
    async fn update_item<S>(
        &self,
        value: MetadataStoreObject<S>,
    ) -> Result<MetadataStoreObject<S>, ClientError>
    where
        S: Spec;

    /// delete object, optionally only if it is still at `precondition` version
    async fn delete_item<S>(&self, key: &ObjectKey, precondition: Option<u64>) -> Result<(), ClientError>
    where
        S: Spec;
}
