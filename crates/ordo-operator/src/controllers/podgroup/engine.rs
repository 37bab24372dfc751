use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, info, instrument, trace, warn};

use ordo_metadata::podgroup::{
    Phase, PodGroupCondition, PodGroupSpec, PodGroupStatus, ReplicaSpec, VolumeClaimSpec,
    volume_claim_name,
};
use ordo_metadata::{ClientError, MetadataClient, MetadataStoreObject, SharedClient, Spec};
use ordo_types::defaults::GROUP_LABEL;
use ordo_types::{ObjectKey, Ordinal, ReplicaCount};

use crate::{OperatorError, PhaseError};

use super::manager::{PodManager, PodManagerRegistry, ReplicaObject};

pub type PodGroupObject = MetadataStoreObject<PodGroupSpec>;

/// phase implied by the stored replica count and observed readiness:
/// replica convergence first, then revision
pub fn observed_phase(spec_replicas: ReplicaCount, status: &PodGroupStatus) -> Phase {
    match status.ready_replicas.cmp(&spec_replicas) {
        Ordering::Greater => Phase::ScalingDown,
        Ordering::Less => Phase::ScalingUp,
        Ordering::Equal if status.is_rolled_out() => Phase::Ready,
        Ordering::Equal => Phase::Updating,
    }
}

/// condition for the controller object status
pub fn condition(result: &Result<Phase, PhaseError>) -> PodGroupCondition {
    match result {
        Ok(phase) => PodGroupCondition::new(*phase),
        Err(err) => PodGroupCondition::with_message(err.phase, err.source.to_string()),
    }
}

/// Drives pod groups toward their desired replica count and template
pub struct PodGroupEngine<C> {
    client: SharedClient<C>,
    managers: PodManagerRegistry,
}

impl<C> PodGroupEngine<C>
where
    C: MetadataClient,
{
    pub fn new(client: SharedClient<C>, managers: PodManagerRegistry) -> Self {
        Self { client, managers }
    }

    /// single reconciliation pass. Waiting is expressed through a converging
    /// phase, the caller requeues.
    ///
    /// A transient failure reading the group is reported as `Pending` because
    /// existence is unknown. Only `Ok(Pending)` means the group was just created;
    /// `Err` with `Pending` and a transient source means retry the read.
    #[instrument(skip(self, desired), fields(replicas = desired.replicas))]
    pub async fn reconcile(
        &self,
        tier: &str,
        key: &ObjectKey,
        desired: &PodGroupSpec,
    ) -> Result<Phase, PhaseError> {
        let manager = self
            .managers
            .lookup(tier)
            .map_err(|source| PhaseError::new(Phase::Error, source))?;

        let group = match self.client.retrieve_item::<PodGroupSpec>(key).await {
            Ok(group) => group,
            Err(err) if err.is_not_found() => {
                debug!("pod group not found, creating");
                self.create_group(key, desired)
                    .await
                    .map_err(|source| PhaseError::new(Phase::Pending, source))?;
                return Ok(Phase::Pending);
            }
            Err(err) => {
                let source = OperatorError::from(err);
                let phase = match source {
                    OperatorError::Unrecoverable(_) => Phase::Error,
                    _ => Phase::Pending,
                };
                warn!(%source, "unable to read pod group");
                return Err(PhaseError::new(phase, source));
            }
        };

        let phase = observed_phase(group.spec.replicas, group.status());
        debug!(%phase, status = %group.status(), "observed");

        if group.spec.drifted_from(desired) {
            self.patch_group(&group, desired)
                .await
                .map_err(|source| PhaseError::new(phase, source))?;
        }

        let converged = match phase {
            Phase::ScalingDown => self.scale_down(manager.as_ref(), &group, desired).await,
            Phase::Updating => self.roll_replicas(manager.as_ref(), &group).await,
            _ => Ok(()),
        };
        converged.map_err(|source| PhaseError::new(phase, source))?;

        Ok(phase)
    }

    async fn create_group(&self, key: &ObjectKey, desired: &PodGroupSpec) -> Result<(), OperatorError> {
        let mut group = PodGroupObject::with_spec(key, desired.clone());
        group.meta = group.meta.set_labels(vec![(GROUP_LABEL, key.name.as_str())]);
        self.client.create_item(group).await?;
        info!(%key, replicas = desired.replicas, "created pod group");
        Ok(())
    }

    /// replica count and template change go out in one write
    async fn patch_group(&self, group: &PodGroupObject, desired: &PodGroupSpec) -> Result<(), OperatorError> {
        let mut patched = group.clone();
        patched.spec.replicas = desired.replicas;
        patched.spec.template_revision = desired.template_revision.clone();

        info!(
            from = group.spec.replicas,
            to = desired.replicas,
            revision = %desired.template_revision,
            "patching pod group"
        );
        self.client.update_item(patched).await?;
        Ok(())
    }

    /// replicas of the group ordered by ordinal
    async fn replicas(&self, group: &PodGroupObject) -> Result<BTreeMap<Ordinal, ReplicaObject>, OperatorError> {
        let replicas = self
            .client
            .retrieve_items::<ReplicaSpec>(&group.meta.namespace)
            .await?;

        Ok(replicas
            .into_iter()
            .filter(|replica| replica.spec.group == group.meta.name)
            .map(|replica| (replica.spec.ordinal, replica))
            .collect())
    }

    /// remove the highest ordinal beyond the desired count, one per pass
    async fn scale_down(
        &self,
        manager: &dyn PodManager,
        group: &PodGroupObject,
        desired: &PodGroupSpec,
    ) -> Result<(), OperatorError> {
        let replicas = self.replicas(group).await?;
        let Some((&ordinal, replica)) = replicas
            .last_key_value()
            .filter(|(ordinal, _)| **ordinal >= desired.replicas)
        else {
            debug!("no replica beyond desired count, waiting for platform");
            return Ok(());
        };

        if !manager.authorize_removal(ordinal, replica).await? {
            debug!(ordinal, "removal not yet authorized");
            return Ok(());
        }

        self.delete_tolerant::<ReplicaSpec>(&replica.key(), Some(replica.resource_version()))
            .await?;
        for claim in &group.spec.volume_claims {
            let claim_key = replica.key().sibling(volume_claim_name(claim, replica.name()));
            self.delete_tolerant::<VolumeClaimSpec>(&claim_key, None).await?;
        }

        info!(ordinal, replica = %replica.key(), "removed replica");
        Ok(())
    }

    /// recycle outdated replicas from the highest ordinal down, one per pass
    async fn roll_replicas(&self, manager: &dyn PodManager, group: &PodGroupObject) -> Result<(), OperatorError> {
        let status = group.status();
        let replicas = self.replicas(group).await?;

        for ordinal in (0..group.spec.replicas).rev() {
            let Some(replica) = replicas.get(&ordinal) else {
                debug!(ordinal, "replica not created yet");
                break;
            };

            if !replica.status.ready {
                debug!(ordinal, "replica not ready");
                break;
            }

            if replica.spec.revision != status.update_revision {
                if manager.authorize_removal(ordinal, replica).await? {
                    self.delete_tolerant::<ReplicaSpec>(
                        &replica.key(),
                        Some(replica.resource_version()),
                    )
                    .await?;
                    info!(ordinal, revision = %replica.spec.revision, "recycled outdated replica");
                } else {
                    debug!(ordinal, "recycle not yet authorized");
                }
                break;
            }

            trace!(ordinal, "replica up to date");
            manager.on_ready(ordinal, replica).await?;
        }

        Ok(())
    }

    async fn delete_tolerant<S: Spec>(&self, key: &ObjectKey, precondition: Option<u64>) -> Result<(), OperatorError> {
        match self.client.delete_item::<S>(key, precondition).await {
            Ok(()) => Ok(()),
            Err(ClientError::NotFound { .. }) => {
                debug!(kind = S::LABEL, %key, "already deleted");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
