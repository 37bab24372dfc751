pub mod config_file;
pub mod defaults;
pub mod identity;

pub use identity::{ObjectKey, OwnerIdentity};

// Pod group
pub type ReplicaCount = u32;
pub type Ordinal = u32;
pub type Revision = String;

/// identifier of a service tier, used to resolve tier specific capabilities
pub type TierId = String;

/// name of a remote storage provider ("aws", ...)
pub type ProviderName = String;

/// name of a replica with given ordinal within a pod group
pub fn replica_name(group: &str, ordinal: Ordinal) -> String {
    format!("{group}-{ordinal}")
}
