use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ordo_types::ProviderName;

use crate::StorageError;

/// An entry returned by listing remote packages
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub key: String,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Where packages for one application source live
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStorageConfig {
    pub provider: ProviderName,
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    /// listing starts after this key, used to skip the directory marker itself
    #[serde(default)]
    pub start_after: String,
    pub endpoint: String,
    /// derived from the endpoint when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[async_trait]
pub trait RemoteStorageClient: Debug + Send + Sync {
    /// list packages under prefix, one level deep
    async fn list_packages(&self, prefix: &str) -> Result<Vec<PackageEntry>, StorageError>;

    /// fetch `remote_key` into `destination` on the local filesystem
    async fn download(&self, remote_key: &str, destination: &Path) -> Result<(), StorageError>;

    /// image of the init step materializing packages on a replica
    fn bootstrap_image(&self) -> String;

    /// arguments of the init step syncing `bucket/path` into `destination`
    fn bootstrap_command(
        &self,
        endpoint: &str,
        bucket: &str,
        path: &str,
        destination: &str,
    ) -> Vec<String>;
}
