use serde::{Deserialize, Serialize};

use ordo_types::{Ordinal, Revision, replica_name};

use crate::core::{Spec, Status};

/// A single replica of a pod group, created by the platform as `<group>-<ordinal>`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSpec {
    pub group: String,
    pub ordinal: Ordinal,
    /// template revision the replica was created from
    #[serde(default)]
    pub revision: Revision,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplicaStatus {
    pub ready: bool,
    /// set by the replica once its tier specific responsibilities are evacuated
    pub decommissioned: bool,
}

impl Status for ReplicaStatus {}

impl Spec for ReplicaSpec {
    const LABEL: &'static str = "Replica";
    type Status = ReplicaStatus;
}

impl ReplicaSpec {
    pub fn new(group: impl Into<String>, ordinal: Ordinal, revision: impl Into<Revision>) -> Self {
        Self {
            group: group.into(),
            ordinal,
            revision: revision.into(),
        }
    }

    pub fn name(&self) -> String {
        replica_name(&self.group, self.ordinal)
    }
}

/// Persistent volume claim bound to one replica
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaimSpec {
    pub group: String,
    pub claim: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaimStatus {}

impl Status for VolumeClaimStatus {}

impl Spec for VolumeClaimSpec {
    const LABEL: &'static str = "VolumeClaim";
    type Status = VolumeClaimStatus;
}

/// name of the claim object created from template `claim` for `replica`
pub fn volume_claim_name(claim: &str, replica: &str) -> String {
    format!("{claim}-{replica}")
}
