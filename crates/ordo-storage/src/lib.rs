//!
//! # Remote package storage
//!
//! Replicas fetch application packages from a provider specific object
//! store. The operator only depends on [`RemoteStorageClient`]; providers
//! register a factory under their name in a [`ProviderRegistry`].
//!

mod error;
mod client;
mod registry;
pub mod s3;

pub use error::StorageError;
pub use client::{RemoteStorageClient, PackageEntry, RemoteStorageConfig};
pub use registry::{ProviderRegistry, ProviderFactory};
