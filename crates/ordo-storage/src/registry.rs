use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use ordo_types::ProviderName;

use crate::{RemoteStorageClient, RemoteStorageConfig, StorageError};

pub type ProviderFactory = Arc<
    dyn Fn(&RemoteStorageConfig) -> Result<Arc<dyn RemoteStorageClient>, StorageError>
        + Send
        + Sync,
>;

/// Lookup table of storage providers by name
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, ProviderFactory>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// register factory for provider, replacing previous registration with same name
    pub fn register(&mut self, name: impl Into<ProviderName>, factory: ProviderFactory) {
        let name = name.into();
        debug!(%name, "registering storage provider");
        self.providers.insert(name, factory);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// create a client for the provider named in config
    pub fn create(
        &self,
        config: &RemoteStorageConfig,
    ) -> Result<Arc<dyn RemoteStorageClient>, StorageError> {
        let factory = self
            .providers
            .get(&config.provider)
            .ok_or_else(|| StorageError::UnknownProvider(config.provider.clone()))?;
        factory(config)
    }
}
