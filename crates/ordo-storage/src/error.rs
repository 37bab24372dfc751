use std::io::Error as IoError;
use std::path::PathBuf;

use ordo_types::ProviderName;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("remote storage provider {0} is not registered")]
    UnknownProvider(ProviderName),
    #[error("invalid storage endpoint {0}")]
    InvalidEndpoint(String),
    #[error("empty objects list in bucket {0}")]
    EmptyListing(String),
    #[error("unable to list bucket {bucket}: {reason}")]
    List { bucket: String, reason: String },
    #[error("unable to download {key}: {reason}")]
    Download { key: String, reason: String },
    #[error("unable to write {path}: {source}")]
    LocalFile {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}
