use serde::{Deserialize, Serialize};

use ordo_types::ObjectKey;

use crate::core::{ObjectMeta, Spec};

/// An object as stored on the platform: metadata, desired spec and observed status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "S: Spec", deserialize = "S: Spec"))]
pub struct MetadataStoreObject<S: Spec> {
    pub meta: ObjectMeta,
    pub spec: S,
    #[serde(default)]
    pub status: S::Status,
}

impl<S: Spec> MetadataStoreObject<S> {
    pub fn with_spec(key: &ObjectKey, spec: S) -> Self {
        Self {
            meta: ObjectMeta::new(key),
            spec,
            status: S::Status::default(),
        }
    }

    pub fn with_status(mut self, status: S::Status) -> Self {
        self.status = status;
        self
    }

    pub fn key(&self) -> ObjectKey {
        self.meta.key()
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn status(&self) -> &S::Status {
        &self.status
    }

    pub fn resource_version(&self) -> u64 {
        self.meta.resource_version
    }
}
