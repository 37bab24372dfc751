use serde::{Deserialize, Serialize};

use ordo_types::{ReplicaCount, Revision};

use crate::core::Spec;

use super::PodGroupStatus;

/// Desired state of a pod group: a set of ordinally identified replicas of one template
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodGroupSpec {
    pub replicas: ReplicaCount,

    /// hash of the replica template, changing it starts a rolling update
    #[serde(default)]
    pub template_revision: Revision,

    /// per replica volume claim templates, claim objects are named `<claim>-<replica>`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claims: Vec<String>,
}

impl Spec for PodGroupSpec {
    const LABEL: &'static str = "PodGroup";
    type Status = PodGroupStatus;
}

impl PodGroupSpec {
    pub fn new(replicas: ReplicaCount, template_revision: impl Into<Revision>) -> Self {
        Self {
            replicas,
            template_revision: template_revision.into(),
            volume_claims: vec![],
        }
    }

    pub fn with_volume_claims<T: Into<String>>(mut self, claims: Vec<T>) -> Self {
        self.volume_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// true if `other` asks for a different replica count or template
    pub fn drifted_from(&self, other: &Self) -> bool {
        self.replicas != other.replicas || self.template_revision != other.template_revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_serde() {
        let spec = PodGroupSpec::new(3, "v1").with_volume_claims(vec!["pvc-etc", "pvc-var"]);
        let yaml = serde_yaml::to_string(&spec).expect("serialized");
        assert_eq!(
            yaml,
            r#"replicas: 3
templateRevision: v1
volumeClaims:
- pvc-etc
- pvc-var
"#
        );

        let parsed: PodGroupSpec = serde_yaml::from_str("replicas: 2\n").expect("parsed");
        assert_eq!(parsed, PodGroupSpec::new(2, ""));
    }

    #[test]
    fn test_drift() {
        let current = PodGroupSpec::new(3, "v1");
        assert!(!current.drifted_from(&PodGroupSpec::new(3, "v1")));
        assert!(current.drifted_from(&PodGroupSpec::new(2, "v1")));
        assert!(current.drifted_from(&PodGroupSpec::new(3, "v2")));
    }
}
