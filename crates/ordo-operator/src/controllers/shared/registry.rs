//!
//! # Shared resource ownership
//!
//! Shared resources are created by the first controller object referencing
//! them and deleted once the last one lets go. Owner sets are mutated with a
//! read-modify-write against the resource version, retried on conflict.
//!

use std::future::Future;

use adaptive_backoff::prelude::Backoff;
use tracing::{debug, info, instrument, warn};

use fluvio_future::timer::sleep;

use ordo_metadata::podgroup::PodGroupSpec;
use ordo_metadata::{ClientError, MetadataClient, MetadataStoreObject, OwnerSet, SharedClient, Spec};
use ordo_types::{ObjectKey, OwnerIdentity};

use crate::OperatorError;
use crate::config::RetryConfig;

/// Kind that can be lazily created by its first owner
pub trait SharedSpec: Spec {
    fn initial(key: &ObjectKey) -> Self;
}

/// monitoring endpoints run as a single replica group
impl SharedSpec for PodGroupSpec {
    fn initial(_key: &ObjectKey) -> Self {
        PodGroupSpec::new(1, "")
    }
}

pub struct OwnershipRegistry<C> {
    client: SharedClient<C>,
    retry: RetryConfig,
}

impl<C> OwnershipRegistry<C>
where
    C: MetadataClient,
{
    pub fn new(client: SharedClient<C>, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// `NotFound` is returned as is, callers use it to decide whether to create
    pub async fn get_by_name<S: SharedSpec>(
        &self,
        key: &ObjectKey,
    ) -> Result<MetadataStoreObject<S>, OperatorError> {
        Ok(self.client.retrieve_item::<S>(key).await?)
    }

    pub async fn owners<S: SharedSpec>(&self, key: &ObjectKey) -> Result<OwnerSet, OperatorError> {
        Ok(self.get_by_name::<S>(key).await?.meta.owners)
    }

    #[instrument(skip(self), fields(kind = S::LABEL))]
    pub async fn add_owner<S: SharedSpec>(
        &self,
        key: &ObjectKey,
        owner: &OwnerIdentity,
    ) -> Result<(), OperatorError> {
        self.with_retry(key, move || self.try_add_owner::<S>(key, owner))
            .await
    }

    #[instrument(skip(self), fields(kind = S::LABEL))]
    pub async fn remove_owner<S: SharedSpec>(
        &self,
        key: &ObjectKey,
        owner: &OwnerIdentity,
    ) -> Result<(), OperatorError> {
        self.with_retry(key, move || self.try_remove_owner::<S>(key, owner))
            .await
    }

    /// controller object switched from one shared resource to another
    pub async fn move_owner<S: SharedSpec>(
        &self,
        owner: &OwnerIdentity,
        from: &ObjectKey,
        to: &ObjectKey,
    ) -> Result<(), OperatorError> {
        if from == to {
            return Ok(());
        }
        self.add_owner::<S>(to, owner).await?;
        self.remove_owner::<S>(from, owner).await
    }

    async fn try_add_owner<S: SharedSpec>(
        &self,
        key: &ObjectKey,
        owner: &OwnerIdentity,
    ) -> Result<(), ClientError> {
        match self.client.retrieve_item::<S>(key).await {
            Ok(mut resource) => {
                if !resource.meta.owners.insert(owner.clone()) {
                    debug!(%owner, "already an owner");
                    return Ok(());
                }
                self.client.update_item(resource).await?;
                debug!(%owner, "owner added");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                let mut resource = MetadataStoreObject::with_spec(key, S::initial(key));
                resource.meta.owners = OwnerSet::with_owner(owner.clone());
                self.client.create_item(resource).await?;
                info!(%key, %owner, "created shared resource");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn try_remove_owner<S: SharedSpec>(
        &self,
        key: &ObjectKey,
        owner: &OwnerIdentity,
    ) -> Result<(), ClientError> {
        let mut resource = match self.client.retrieve_item::<S>(key).await {
            Ok(resource) => resource,
            Err(err) if err.is_not_found() => {
                debug!(%key, "shared resource already gone");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let removed = resource.meta.owners.remove(owner);

        // also converges a resource left ownerless by an interrupted removal
        if resource.meta.owners.is_empty() {
            match self
                .client
                .delete_item::<S>(key, Some(resource.resource_version()))
                .await
            {
                Ok(()) => info!(%key, "deleted shared resource, no owners left"),
                Err(err) if err.is_not_found() => debug!(%key, "shared resource already gone"),
                Err(err) => return Err(err),
            }
            return Ok(());
        }

        if !removed {
            debug!(%owner, "not an owner");
            return Ok(());
        }

        self.client.update_item(resource).await?;
        debug!(%owner, "owner removed");
        Ok(())
    }

    /// run `attempt` until it succeeds, retrying lost version races with backoff
    async fn with_retry<F, Fut>(&self, key: &ObjectKey, mut attempt: F) -> Result<(), OperatorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), ClientError>>,
    {
        let mut backoff = self.retry.backoff()?;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let err = match attempt().await {
                Ok(()) => return Ok(()),
                // a write hitting NotFound means the resource vanished after the read
                Err(err) if err.is_conflict() || err.is_already_exists() || err.is_not_found() => {
                    err
                }
                Err(err) => return Err(err.into()),
            };

            if attempts >= self.retry.max_attempts {
                warn!(%key, attempts, %err, "giving up on owner update");
                return Err(OperatorError::Transient(err));
            }

            let wait = backoff.wait();
            debug!(%key, attempts, ?wait, "owner update lost race, retrying");
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ordo_metadata::memory::{Fault, MemoryClient};

    use super::*;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            min_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn monitoring_key() -> ObjectKey {
        ObjectKey::new("test", "splunk-test-monitoring-console")
    }

    fn owner(name: &str) -> OwnerIdentity {
        OwnerIdentity::new("Standalone", "test", name)
    }

    fn names(owners: &OwnerSet) -> Vec<&str> {
        owners.iter().map(|owner| owner.name.as_str()).collect()
    }

    #[fluvio_future::test]
    async fn test_first_owner_creates_resource() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        let err = registry
            .get_by_name::<PodGroupSpec>(&key)
            .await
            .expect_err("not created yet");
        assert!(err.is_not_found());

        registry
            .add_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect("added");

        let resource = registry.get_by_name::<PodGroupSpec>(&key).await.expect("created");
        assert_eq!(resource.spec, PodGroupSpec::new(1, ""));
        assert_eq!(names(&resource.meta.owners), vec!["s1"]);
    }

    #[fluvio_future::test]
    async fn test_add_owner_is_idempotent() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        registry.add_owner::<PodGroupSpec>(&key, &owner("s1")).await.expect("added");
        let first = registry.get_by_name::<PodGroupSpec>(&key).await.expect("fetched");

        registry.add_owner::<PodGroupSpec>(&key, &owner("s1")).await.expect("added");
        let second = registry.get_by_name::<PodGroupSpec>(&key).await.expect("fetched");

        assert_eq!(second, first);
    }

    #[fluvio_future::test]
    async fn test_remove_one_of_two_owners() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        registry.add_owner::<PodGroupSpec>(&key, &owner("s1")).await.expect("added");
        registry.add_owner::<PodGroupSpec>(&key, &owner("s2")).await.expect("added");
        registry
            .remove_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect("removed");

        let owners = registry.owners::<PodGroupSpec>(&key).await.expect("present");
        assert_eq!(names(&owners), vec!["s2"]);

        // absent owner is a no-op
        registry
            .remove_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect("noop");
        let owners = registry.owners::<PodGroupSpec>(&key).await.expect("present");
        assert_eq!(names(&owners), vec!["s2"]);
    }

    #[fluvio_future::test]
    async fn test_last_owner_deletes_resource() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        registry.add_owner::<PodGroupSpec>(&key, &owner("s1")).await.expect("added");
        registry
            .remove_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect("removed");

        let err = registry
            .get_by_name::<PodGroupSpec>(&key)
            .await
            .expect_err("deleted");
        assert!(err.is_not_found());

        // removing again from a missing resource succeeds
        registry
            .remove_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect("noop");
    }

    #[fluvio_future::test]
    async fn test_ownerless_resource_is_collected() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        // left behind by a crash between emptying the set and deleting
        client
            .create_item(MetadataStoreObject::with_spec(&key, PodGroupSpec::new(1, "")))
            .await
            .expect("created");

        registry
            .remove_owner::<PodGroupSpec>(&key, &owner("s9"))
            .await
            .expect("collected");
        assert_eq!(client.count::<PodGroupSpec>().await, 0);
    }

    #[fluvio_future::test]
    async fn test_conflicts_are_retried() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        registry.add_owner::<PodGroupSpec>(&key, &owner("s1")).await.expect("added");
        client.fail_next::<PodGroupSpec>(Fault::Conflict).await;
        client.fail_next::<PodGroupSpec>(Fault::Conflict).await;

        registry.add_owner::<PodGroupSpec>(&key, &owner("s2")).await.expect("added");
        let owners = registry.owners::<PodGroupSpec>(&key).await.expect("present");
        assert_eq!(names(&owners), vec!["s1", "s2"]);
    }

    #[fluvio_future::test]
    async fn test_exhausted_retries_are_transient() {
        let client = MemoryClient::new_shared();
        let retry = RetryConfig {
            max_attempts: 3,
            ..fast_retry()
        };
        let registry = OwnershipRegistry::new(client.clone(), retry);
        let key = monitoring_key();

        for _ in 0..3 {
            client.fail_next::<PodGroupSpec>(Fault::Conflict).await;
        }

        let err = registry
            .add_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect_err("exhausted");
        assert!(err.is_transient());
        assert_eq!(client.count::<PodGroupSpec>().await, 0);
    }

    #[fluvio_future::test]
    async fn test_unavailable_is_not_retried() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let key = monitoring_key();

        client.fail_next::<PodGroupSpec>(Fault::Unavailable).await;
        let err = registry
            .add_owner::<PodGroupSpec>(&key, &owner("s1"))
            .await
            .expect_err("unavailable");
        assert!(err.is_transient());

        // the fault was consumed by the single attempt
        registry.add_owner::<PodGroupSpec>(&key, &owner("s1")).await.expect("added");
    }

    #[fluvio_future::test]
    async fn test_move_owner() {
        let client = MemoryClient::new_shared();
        let registry = OwnershipRegistry::new(client.clone(), fast_retry());
        let old = monitoring_key();
        let new = old.sibling("splunk-test2-monitoring-console");

        registry.add_owner::<PodGroupSpec>(&old, &owner("s1")).await.expect("added");
        registry
            .move_owner::<PodGroupSpec>(&owner("s1"), &old, &new)
            .await
            .expect("moved");

        assert!(
            registry
                .get_by_name::<PodGroupSpec>(&old)
                .await
                .expect_err("old collected")
                .is_not_found()
        );
        let owners = registry.owners::<PodGroupSpec>(&new).await.expect("present");
        assert_eq!(names(&owners), vec!["s1"]);
    }
}
