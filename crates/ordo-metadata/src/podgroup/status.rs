use std::fmt;

use serde::{Deserialize, Serialize};

use ordo_types::{ReplicaCount, Revision};

use crate::core::Status;

/// Observed state of a pod group as reported by the platform
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodGroupStatus {
    /// replica count the platform is currently converging to
    pub replicas: ReplicaCount,
    pub ready_replicas: ReplicaCount,
    pub updated_replicas: ReplicaCount,
    pub current_revision: Revision,
    pub update_revision: Revision,
}

impl Status for PodGroupStatus {}

impl fmt::Display for PodGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{} ready, revision {} -> {}",
            self.ready_replicas, self.replicas, self.current_revision, self.update_revision
        )
    }
}

impl PodGroupStatus {
    pub fn is_rolled_out(&self) -> bool {
        self.current_revision == self.update_revision
    }
}

/// Lifecycle phase of a pod group, exactly one per reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// pod group object does not exist yet
    Pending,
    ScalingUp,
    ScalingDown,
    Updating,
    Ready,
    /// needs operator attention, not retried by itself
    Error,
}

impl Phase {
    /// convergence still in progress, caller should reconcile again later
    pub fn is_converging(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::ScalingUp | Self::ScalingDown | Self::Updating
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::ScalingUp => write!(f, "ScalingUp"),
            Self::ScalingDown => write!(f, "ScalingDown"),
            Self::Updating => write!(f, "Updating"),
            Self::Ready => write!(f, "Ready"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Human readable condition surfaced on the controller object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodGroupCondition {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PodGroupCondition {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            message: None,
        }
    }

    pub fn with_message(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for PodGroupCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.phase, message),
            None => write!(f, "{}", self.phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_missing_fields() {
        let status: PodGroupStatus =
            serde_yaml::from_str("replicas: 1\nupdateRevision: v1\n").expect("parsed");
        assert_eq!(status.ready_replicas, 0);
        assert_eq!(status.current_revision, "");
        assert!(!status.is_rolled_out());
    }

    #[test]
    fn test_phase_display_matches_serde() {
        for phase in [
            Phase::Pending,
            Phase::ScalingUp,
            Phase::ScalingDown,
            Phase::Updating,
            Phase::Ready,
            Phase::Error,
        ] {
            let yaml = serde_yaml::to_string(&phase).expect("serialized");
            assert_eq!(yaml.trim(), phase.to_string());
        }
    }

    #[test]
    fn test_condition_display() {
        assert_eq!(PodGroupCondition::new(Phase::Ready).to_string(), "Ready");
        assert_eq!(
            PodGroupCondition::with_message(Phase::Error, "no pod manager for tier indexer")
                .to_string(),
            "Error: no pod manager for tier indexer"
        );
    }
}
