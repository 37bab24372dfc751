use std::fmt::Debug;
use std::fs::{File, read_to_string};
use std::io::{Error as IoError, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("invalid toml config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Toml backed configuration that can be written to and read back from disk
pub trait SaveLoadConfig {
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), IoError>;

    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, LoadConfigError>
    where
        Self: Sized;

    fn load_str(config: &str) -> Result<Self, LoadConfigError>
    where
        Self: Sized;
}

impl<S> SaveLoadConfig for S
where
    S: Serialize + DeserializeOwned + Debug,
{
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), IoError> {
        let path = path.as_ref();
        debug!(?path, "saving config");
        let toml = toml::to_string(self).map_err(|err| IoError::other(format!("{err}")))?;

        let mut file = File::create(path)?;
        file.write_all(toml.as_bytes())?;
        file.sync_all()
    }

    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, LoadConfigError> {
        let path = path.as_ref();
        debug!(?path, "loading config");

        let content = read_to_string(path).map_err(|source| LoadConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_str(&content)
    }

    fn load_str(config: &str) -> Result<Self, LoadConfigError> {
        Ok(toml::from_str(config)?)
    }
}
