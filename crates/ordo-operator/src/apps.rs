//!
//! # Application packages
//!
//! Replicas start with their application packages synced from remote storage
//! by an init step. The provider is resolved from the source's config.
//!

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ordo_storage::{ProviderRegistry, RemoteStorageClient, RemoteStorageConfig};

use crate::OperatorError;

/// Packages of one application source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSource {
    pub name: String,
    /// location below the bucket
    pub path: String,
    pub storage: RemoteStorageConfig,
}

/// Container image and arguments run before the replica's main process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitStep {
    pub image: String,
    pub command: Vec<String>,
}

/// init step syncing `source` into `<mount>/<source name>`
pub fn init_step(
    providers: &ProviderRegistry,
    source: &AppSource,
    mount: &str,
) -> Result<InitStep, OperatorError> {
    let client = providers.create(&source.storage)?;
    let destination = format!("{}/{}", mount.trim_end_matches('/'), source.name);

    Ok(InitStep {
        image: client.bootstrap_image(),
        command: client.bootstrap_command(
            &source.storage.endpoint,
            &source.storage.bucket,
            &source.path,
            &destination,
        ),
    })
}

/// download every package under `prefix` into `dir`, skipping directory markers
#[instrument(skip(client))]
pub async fn fetch_packages(
    client: &dyn RemoteStorageClient,
    prefix: &str,
    dir: &Path,
) -> Result<Vec<PathBuf>, OperatorError> {
    let entries = client.list_packages(prefix).await?;
    let mut fetched = vec![];

    for entry in entries {
        let Some(file_name) = entry.key.rsplit('/').next().filter(|name| !name.is_empty()) else {
            debug!(key = %entry.key, "skipping directory");
            continue;
        };

        let destination = dir.join(file_name);
        client.download(&entry.key, &destination).await?;
        fetched.push(destination);
    }

    info!(count = fetched.len(), "fetched packages");
    Ok(fetched)
}
