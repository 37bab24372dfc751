use ordo_metadata::ClientError;
use ordo_metadata::podgroup::Phase;
use ordo_storage::StorageError;
use ordo_types::ObjectKey;

#[derive(thiserror::Error, Debug)]
pub enum OperatorError {
    /// platform unavailable or lost a version race, requeue
    #[error("transient platform failure: {0}")]
    Transient(#[source] ClientError),
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: ObjectKey },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unrecoverable: {0}")]
    Unrecoverable(String),
    #[error("remote storage: {0}")]
    Storage(#[source] StorageError),
}

impl OperatorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Storage(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ClientError> for OperatorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound { kind, key } => Self::NotFound { kind, key },
            ClientError::Serialization { .. } => Self::Unrecoverable(err.to_string()),
            ClientError::AlreadyExists { .. }
            | ClientError::Conflict { .. }
            | ClientError::Unavailable(_) => Self::Transient(err),
        }
    }
}

impl From<StorageError> for OperatorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownProvider(_) | StorageError::InvalidEndpoint(_) => {
                Self::Configuration(err.to_string())
            }
            _ => Self::Storage(err),
        }
    }
}

/// Failed reconciliation together with the phase it interrupted
#[derive(thiserror::Error, Debug)]
#[error("reconcile failed in phase {phase}: {source}")]
pub struct PhaseError {
    pub phase: Phase,
    pub source: OperatorError,
}

impl PhaseError {
    pub fn new(phase: Phase, source: OperatorError) -> Self {
        Self { phase, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_mapping() {
        let key = ObjectKey::new("test", "mc");

        let err: OperatorError = ClientError::NotFound {
            kind: "PodGroup",
            key: key.clone(),
        }
        .into();
        assert!(err.is_not_found());

        let err: OperatorError = ClientError::Conflict {
            kind: "PodGroup",
            key,
            expected: 1,
            found: 2,
        }
        .into();
        assert!(err.is_transient());

        let err: OperatorError = ClientError::Unavailable("api server".to_owned()).into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: OperatorError = StorageError::UnknownProvider("gcs".to_owned()).into();
        assert!(matches!(err, OperatorError::Configuration(_)));

        let err: OperatorError = StorageError::EmptyListing("apps".to_owned()).into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_phase_error_display() {
        let err = PhaseError::new(
            Phase::Error,
            OperatorError::Configuration("no pod manager registered for tier indexer".to_owned()),
        );
        assert_eq!(
            err.to_string(),
            "reconcile failed in phase Error: configuration error: no pod manager registered for tier indexer"
        );
    }
}
