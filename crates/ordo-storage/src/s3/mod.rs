//!
//! # S3 compatible provider
//!
//! Listing and download semantics for S3 style object stores. The transport
//! itself is injected as an [`ObjectStoreApi`] so the provider does not carry
//! any wire protocol.
//!

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info, instrument};

use ordo_types::defaults::{STORAGE_LIST_DELIMITER, STORAGE_LIST_MAX_KEYS};

use crate::{
    PackageEntry, ProviderFactory, ProviderRegistry, RemoteStorageClient, RemoteStorageConfig,
    StorageError,
};

pub const PROVIDER_NAME: &str = "aws";
pub const BOOTSTRAP_IMAGE: &str = "amazon/aws-cli";

static REGION_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r".*.s3[-,.](?P<region>.*).amazonaws.com").ok());

/// extract region from endpoints such as `https://s3-us-west-2.amazonaws.com`
pub fn region_from_endpoint(endpoint: &str) -> Option<String> {
    REGION_PATTERN
        .as_ref()?
        .captures(endpoint)?
        .name("region")
        .map(|region| region.as_str().to_owned())
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: String,
    pub start_after: String,
    pub max_keys: usize,
    pub delimiter: String,
}

/// Transport to an S3 compatible endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStoreApi: Send + Sync {
    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<Vec<PackageEntry>, TransportError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, TransportError>;
}

pub struct S3Provider {
    region: String,
    bucket: String,
    prefix: String,
    start_after: String,
    endpoint: String,
    api: Arc<dyn ObjectStoreApi>,
}

impl fmt::Debug for S3Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Provider")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl S3Provider {
    pub fn new(
        config: &RemoteStorageConfig,
        api: Arc<dyn ObjectStoreApi>,
    ) -> Result<Self, StorageError> {
        let region = config
            .region
            .clone()
            .or_else(|| region_from_endpoint(&config.endpoint))
            .ok_or_else(|| StorageError::InvalidEndpoint(config.endpoint.clone()))?;

        Ok(Self {
            region,
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
            start_after: config.start_after.clone(),
            endpoint: config.endpoint.clone(),
            api,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// register provider under [`PROVIDER_NAME`], every client shares `api`
    pub fn register(registry: &mut ProviderRegistry, api: Arc<dyn ObjectStoreApi>) {
        let factory: ProviderFactory = Arc::new(move |config: &RemoteStorageConfig| {
            let provider = S3Provider::new(config, api.clone())?;
            Ok(Arc::new(provider) as Arc<dyn RemoteStorageClient>)
        });
        registry.register(PROVIDER_NAME, factory);
    }
}

#[async_trait]
impl RemoteStorageClient for S3Provider {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_packages(&self, prefix: &str) -> Result<Vec<PackageEntry>, StorageError> {
        let prefix = if prefix.is_empty() {
            self.prefix.clone()
        } else {
            prefix.to_owned()
        };

        let request = ListObjectsRequest {
            bucket: self.bucket.clone(),
            prefix,
            start_after: self.start_after.clone(),
            max_keys: STORAGE_LIST_MAX_KEYS,
            delimiter: STORAGE_LIST_DELIMITER.to_owned(),
        };

        info!(prefix = %request.prefix, "listing packages");
        let entries = self.api.list_objects(&request).await.map_err(|err| {
            error!(%err, "unable to list items in bucket");
            StorageError::List {
                bucket: self.bucket.clone(),
                reason: err.to_string(),
            }
        })?;

        if entries.is_empty() {
            return Err(StorageError::EmptyListing(self.bucket.clone()));
        }

        debug!(count = entries.len(), "listed packages");
        Ok(entries)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn download(&self, remote_key: &str, destination: &Path) -> Result<(), StorageError> {
        let bytes = self
            .api
            .get_object(&self.bucket, remote_key)
            .await
            .map_err(|err| StorageError::Download {
                key: remote_key.to_owned(),
                reason: err.to_string(),
            })?;

        std::fs::write(destination, &bytes).map_err(|source| StorageError::LocalFile {
            path: destination.to_path_buf(),
            source,
        })?;

        info!(remote_key, bytes = bytes.len(), ?destination, "file downloaded");
        Ok(())
    }

    fn bootstrap_image(&self) -> String {
        BOOTSTRAP_IMAGE.to_owned()
    }

    fn bootstrap_command(
        &self,
        endpoint: &str,
        bucket: &str,
        path: &str,
        destination: &str,
    ) -> Vec<String> {
        vec![
            format!("--endpoint-url={endpoint}"),
            "s3".to_owned(),
            "sync".to_owned(),
            format!("s3://{}/", join_clean(&[bucket, path])),
            format!("{}/", join_clean(&[destination])),
        ]
    }
}

/// join path segments with `/`, dropping empty and duplicate separators
fn join_clean(parts: &[&str]) -> String {
    let absolute = parts.first().is_some_and(|first| first.starts_with('/'));
    let joined = parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}
