//!
//! # In-memory platform
//!
//! Versioned object store implementing `MetadataClient` without a cluster.
//! Every kind gets its own store; objects are kept as yaml values so that a
//! decode failure behaves like a corrupt record on a real platform.
//!

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_lock::{Mutex, RwLock};
use async_trait::async_trait;
use serde_yaml::Value;
use tracing::{debug, trace};

use ordo_types::ObjectKey;

use crate::client::{ClientError, MetadataClient};
use crate::core::Spec;
use crate::store::MetadataStoreObject;

/// failure returned by the next mutating call on a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Conflict,
    Unavailable,
}

#[derive(Debug, Clone)]
struct Record {
    resource_version: u64,
    value: Value,
}

#[derive(Debug, Default)]
struct KindStore {
    version: AtomicU64,
    data: RwLock<BTreeMap<ObjectKey, Record>>,
}

impl KindStore {
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Default)]
pub struct MemoryClient {
    stores: Mutex<HashMap<&'static str, Arc<KindStore>>>,
    faults: Mutex<HashMap<&'static str, VecDeque<Fault>>>,
}

impl MemoryClient {
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn get_store(&self, kind: &'static str) -> Arc<KindStore> {
        let mut stores = self.stores.lock().await;
        stores.entry(kind).or_default().clone()
    }

    /// queue a failure for the next create/update/delete of kind `S`
    pub async fn fail_next<S: Spec>(&self, fault: Fault) {
        let mut faults = self.faults.lock().await;
        faults.entry(S::LABEL).or_default().push_back(fault);
    }

    /// store raw value under key, bypassing the `Spec` schema
    pub async fn insert_raw<S: Spec>(&self, key: &ObjectKey, value: Value) {
        let store = self.get_store(S::LABEL).await;
        let resource_version = store.next_version();
        store.data.write().await.insert(
            key.clone(),
            Record {
                resource_version,
                value,
            },
        );
    }

    /// number of objects of kind `S` across namespaces
    pub async fn count<S: Spec>(&self) -> usize {
        let store = self.get_store(S::LABEL).await;
        store.data.read().await.len()
    }

    async fn take_fault<S: Spec>(&self, key: &ObjectKey) -> Result<(), ClientError> {
        let mut faults = self.faults.lock().await;
        let Some(fault) = faults.get_mut(S::LABEL).and_then(|queue| queue.pop_front()) else {
            return Ok(());
        };
        debug!(kind = S::LABEL, %key, ?fault, "injecting fault");
        Err(match fault {
            Fault::Conflict => ClientError::Conflict {
                kind: S::LABEL,
                key: key.clone(),
                expected: 0,
                found: 0,
            },
            Fault::Unavailable => ClientError::Unavailable(format!("{} store", S::LABEL)),
        })
    }

    fn decode<S: Spec>(key: &ObjectKey, record: &Record) -> Result<MetadataStoreObject<S>, ClientError> {
        let mut obj: MetadataStoreObject<S> =
            serde_yaml::from_value(record.value.clone()).map_err(|source| {
                ClientError::Serialization {
                    kind: S::LABEL,
                    key: key.clone(),
                    source,
                }
            })?;
        obj.meta.resource_version = record.resource_version;
        Ok(obj)
    }

    fn encode<S: Spec>(
        key: &ObjectKey,
        resource_version: u64,
        mut obj: MetadataStoreObject<S>,
    ) -> Result<(Record, MetadataStoreObject<S>), ClientError> {
        obj.meta.resource_version = resource_version;
        let value = serde_yaml::to_value(&obj).map_err(|source| ClientError::Serialization {
            kind: S::LABEL,
            key: key.clone(),
            source,
        })?;
        Ok((
            Record {
                resource_version,
                value,
            },
            obj,
        ))
    }
}

#[async_trait]
impl MetadataClient for MemoryClient {
    async fn retrieve_item<S>(&self, key: &ObjectKey) -> Result<MetadataStoreObject<S>, ClientError>
    where
        S: Spec,
    {
        let store = self.get_store(S::LABEL).await;
        let data = store.data.read().await;
        let record = data.get(key).ok_or_else(|| ClientError::not_found::<S>(key))?;
        Self::decode(key, record)
    }

    async fn retrieve_items<S>(
        &self,
        namespace: &str,
    ) -> Result<Vec<MetadataStoreObject<S>>, ClientError>
    where
        S: Spec,
    {
        let store = self.get_store(S::LABEL).await;
        let data = store.data.read().await;
        data.iter()
            .filter(|(key, _)| key.namespace == namespace)
            .map(|(key, record)| Self::decode(key, record))
            .collect()
    }

    async fn create_item<S>(
        &self,
        value: MetadataStoreObject<S>,
    ) -> Result<MetadataStoreObject<S>, ClientError>
    where
        S: Spec,
    {
        let key = value.key();
        self.take_fault::<S>(&key).await?;

        let store = self.get_store(S::LABEL).await;
        let mut data = store.data.write().await;
        if data.contains_key(&key) {
            return Err(ClientError::AlreadyExists {
                kind: S::LABEL,
                key,
            });
        }

        let (record, obj) = Self::encode(&key, store.next_version(), value)?;
        trace!(kind = S::LABEL, %key, version = record.resource_version, "created");
        data.insert(key, record);
        Ok(obj)
    }

    async fn update_item<S>(
        &self,
        value: MetadataStoreObject<S>,
    ) -> Result<MetadataStoreObject<S>, ClientError>
    where
        S: Spec,
    {
        let key = value.key();
        self.take_fault::<S>(&key).await?;

        let store = self.get_store(S::LABEL).await;
        let mut data = store.data.write().await;
        let current = data
            .get(&key)
            .ok_or_else(|| ClientError::not_found::<S>(&key))?
            .resource_version;

        if current != value.resource_version() {
            return Err(ClientError::Conflict {
                kind: S::LABEL,
                key,
                expected: value.resource_version(),
                found: current,
            });
        }

        let (record, obj) = Self::encode(&key, store.next_version(), value)?;
        trace!(kind = S::LABEL, %key, version = record.resource_version, "updated");
        data.insert(key, record);
        Ok(obj)
    }

    async fn delete_item<S>(&self, key: &ObjectKey, precondition: Option<u64>) -> Result<(), ClientError>
    where
        S: Spec,
    {
        self.take_fault::<S>(key).await?;

        let store = self.get_store(S::LABEL).await;
        let mut data = store.data.write().await;
        let current = data
            .get(key)
            .ok_or_else(|| ClientError::not_found::<S>(key))?
            .resource_version;

        if let Some(expected) = precondition {
            if expected != current {
                return Err(ClientError::Conflict {
                    kind: S::LABEL,
                    key: key.clone(),
                    expected,
                    found: current,
                });
            }
        }

        data.remove(key);
        trace!(kind = S::LABEL, %key, "deleted");
        Ok(())
    }
}
