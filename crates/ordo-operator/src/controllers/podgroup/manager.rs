//!
//! # Pod managers
//!
//! Tier specific hooks deciding when a replica may be removed. Managers are
//! registered per tier at startup and resolved by the engine on every pass.
//!

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use ordo_metadata::podgroup::ReplicaSpec;
use ordo_metadata::{MetadataClient, MetadataStoreObject, SharedClient};
use ordo_types::defaults::{DECOMMISSION_ANNOTATION, DECOMMISSION_REQUESTED};
use ordo_types::{Ordinal, TierId};

use crate::OperatorError;

pub type ReplicaObject = MetadataStoreObject<ReplicaSpec>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PodManager: Send + Sync {
    /// true once `replica` can be removed. Called again on every pass while
    /// a drain is pending, so it must be idempotent.
    async fn authorize_removal(
        &self,
        ordinal: Ordinal,
        replica: &ReplicaObject,
    ) -> Result<bool, OperatorError>;

    /// replica is running the current template
    async fn on_ready(&self, _ordinal: Ordinal, _replica: &ReplicaObject) -> Result<(), OperatorError> {
        Ok(())
    }
}

/// Stateless tiers: replicas can go at any time
#[derive(Debug, Default)]
pub struct DefaultPodManager;

#[async_trait]
impl PodManager for DefaultPodManager {
    async fn authorize_removal(
        &self,
        _ordinal: Ordinal,
        _replica: &ReplicaObject,
    ) -> Result<bool, OperatorError> {
        Ok(true)
    }
}

/// Tiers that must evacuate a replica first.
///
/// Removal is requested by annotating the replica; the replica reports
/// `decommissioned` in its status once its responsibilities are moved.
pub struct DecommissionPodManager<C> {
    client: SharedClient<C>,
}

impl<C> fmt::Debug for DecommissionPodManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecommissionPodManager")
    }
}

impl<C> DecommissionPodManager<C> {
    pub fn new(client: SharedClient<C>) -> Self {
        Self { client }
    }
}

fn decommission_requested(replica: &ReplicaObject) -> bool {
    replica.meta.annotation(DECOMMISSION_ANNOTATION) == Some(DECOMMISSION_REQUESTED)
}

#[async_trait]
impl<C> PodManager for DecommissionPodManager<C>
where
    C: MetadataClient,
{
    #[instrument(skip(self, replica), fields(replica = %replica.key()))]
    async fn authorize_removal(
        &self,
        ordinal: Ordinal,
        replica: &ReplicaObject,
    ) -> Result<bool, OperatorError> {
        if replica.status.decommissioned {
            debug!("replica decommissioned");
            return Ok(true);
        }

        if decommission_requested(replica) {
            debug!("decommission pending");
            return Ok(false);
        }

        let mut requested = replica.clone();
        requested.meta.annotations.insert(
            DECOMMISSION_ANNOTATION.to_owned(),
            DECOMMISSION_REQUESTED.to_owned(),
        );
        self.client.update_item(requested).await?;
        info!(ordinal, "requested decommission");
        Ok(false)
    }

    async fn on_ready(&self, ordinal: Ordinal, replica: &ReplicaObject) -> Result<(), OperatorError> {
        if replica.meta.annotation(DECOMMISSION_ANNOTATION).is_none() {
            return Ok(());
        }

        let mut cleared = replica.clone();
        cleared.meta.annotations.remove(DECOMMISSION_ANNOTATION);
        self.client.update_item(cleared).await?;
        debug!(ordinal, replica = %replica.key(), "cleared stale decommission request");
        Ok(())
    }
}

/// Pod managers by tier
#[derive(Default, Clone)]
pub struct PodManagerRegistry {
    managers: HashMap<TierId, Arc<dyn PodManager>>,
}

impl fmt::Debug for PodManagerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodManagerRegistry")
            .field("tiers", &self.managers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PodManagerRegistry {
    pub fn register(&mut self, tier: impl Into<TierId>, manager: Arc<dyn PodManager>) {
        let tier = tier.into();
        debug!(%tier, "registering pod manager");
        self.managers.insert(tier, manager);
    }

    pub fn lookup(&self, tier: &str) -> Result<Arc<dyn PodManager>, OperatorError> {
        self.managers.get(tier).cloned().ok_or_else(|| {
            OperatorError::Configuration(format!("no pod manager registered for tier {tier}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use ordo_metadata::memory::MemoryClient;
    use ordo_types::ObjectKey;

    use super::*;

    async fn create_replica(client: &MemoryClient, ordinal: Ordinal) -> ReplicaObject {
        let spec = ReplicaSpec::new("idx", ordinal, "v1");
        let key = ObjectKey::new("test", spec.name());
        client
            .create_item(MetadataStoreObject::with_spec(&key, spec))
            .await
            .expect("created")
    }

    #[fluvio_future::test]
    async fn test_default_manager_always_authorizes() {
        let client = MemoryClient::new_shared();
        let replica = create_replica(&client, 0).await;

        assert!(
            DefaultPodManager
                .authorize_removal(0, &replica)
                .await
                .expect("authorized")
        );
        DefaultPodManager.on_ready(0, &replica).await.expect("ready");
    }

    #[fluvio_future::test]
    async fn test_decommission_handshake() {
        let client = MemoryClient::new_shared();
        let manager = DecommissionPodManager::new(client.clone());
        let replica = create_replica(&client, 2).await;

        // first pass requests decommission
        assert!(!manager.authorize_removal(2, &replica).await.expect("pass 1"));
        let replica: ReplicaObject = client.retrieve_item(&replica.key()).await.expect("fetched");
        assert_eq!(
            replica.meta.annotation(DECOMMISSION_ANNOTATION),
            Some(DECOMMISSION_REQUESTED)
        );

        // repeated passes keep waiting without writing
        let version = replica.resource_version();
        assert!(!manager.authorize_removal(2, &replica).await.expect("pass 2"));
        let replica: ReplicaObject = client.retrieve_item(&replica.key()).await.expect("fetched");
        assert_eq!(replica.resource_version(), version);

        // replica reports evacuation done
        let mut done = replica.clone();
        done.status.decommissioned = true;
        let done = client.update_item(done).await.expect("status updated");
        assert!(manager.authorize_removal(2, &done).await.expect("pass 3"));
    }

    #[fluvio_future::test]
    async fn test_on_ready_clears_stale_request() {
        let client = MemoryClient::new_shared();
        let manager = DecommissionPodManager::new(client.clone());
        let replica = create_replica(&client, 0).await;

        manager.authorize_removal(0, &replica).await.expect("requested");
        let replica: ReplicaObject = client.retrieve_item(&replica.key()).await.expect("fetched");

        manager.on_ready(0, &replica).await.expect("cleared");
        let replica: ReplicaObject = client.retrieve_item(&replica.key()).await.expect("fetched");
        assert_eq!(replica.meta.annotation(DECOMMISSION_ANNOTATION), None);

        // nothing to clear, no write
        let version = replica.resource_version();
        manager.on_ready(0, &replica).await.expect("noop");
        let replica: ReplicaObject = client.retrieve_item(&replica.key()).await.expect("fetched");
        assert_eq!(replica.resource_version(), version);
    }

    #[test]
    fn test_missing_registration() {
        let mut registry = PodManagerRegistry::default();
        registry.register("standalone", Arc::new(DefaultPodManager));

        assert!(registry.lookup("standalone").is_ok());
        let err = registry.lookup("indexer").err().expect("missing");
        assert!(matches!(err, OperatorError::Configuration(_)));
    }
}
