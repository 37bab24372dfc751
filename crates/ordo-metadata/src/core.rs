use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use ordo_types::{ObjectKey, OwnerIdentity};

/// Spec of an object kind stored on the orchestration platform
pub trait Spec:
    Serialize + DeserializeOwned + Debug + Clone + PartialEq + Send + Sync + 'static
{
    const LABEL: &'static str;

    type Status: Status;
}

/// Status of an object kind, owned by the platform
pub trait Status:
    Serialize + DeserializeOwned + Debug + Clone + Default + PartialEq + Send + Sync + 'static
{
}

/// Object metadata.
///
/// `resource_version` is the platform's optimistic concurrency token. It is
/// opaque to the operator: only compared for equality and threaded back
/// through writes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "OwnerSet::is_empty")]
    pub owners: OwnerSet,
}

impl ObjectMeta {
    pub fn new(key: &ObjectKey) -> Self {
        Self {
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }

    pub fn set_labels<T: Into<String>>(mut self, labels: Vec<(T, T)>) -> Self {
        for (key, value) in labels {
            self.labels.insert(key.into(), value.into());
        }
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Controller objects referencing a shared resource.
/// Membership is unique, order is irrelevant.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerSet(BTreeSet<OwnerIdentity>);

impl OwnerSet {
    pub fn with_owner(owner: OwnerIdentity) -> Self {
        let mut set = Self::default();
        set.insert(owner);
        set
    }

    /// returns true if owner was not already present
    pub fn insert(&mut self, owner: OwnerIdentity) -> bool {
        self.0.insert(owner)
    }

    /// returns true if owner was present
    pub fn remove(&mut self, owner: &OwnerIdentity) -> bool {
        self.0.remove(owner)
    }

    pub fn contains(&self, owner: &OwnerIdentity) -> bool {
        self.0.contains(owner)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwnerIdentity> {
        self.0.iter()
    }
}

impl FromIterator<OwnerIdentity> for OwnerSet {
    fn from_iter<T: IntoIterator<Item = OwnerIdentity>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
