use crate::entity::EntityHandle;
use crate::model::{IdCodecError, IdRep, ObjectCreationError};
use crate::proxy::ProxyCreationError;
use crate::store::ValuesHashError;

/// Error raised by [`PersistenceContext`](crate::PersistenceContext) operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("entity {0} is unknown to this persistence context")]
    UnknownEntity(EntityHandle),
    #[error("passed entity {0} not managed")]
    NotManaged(EntityHandle),
    #[error("entity {0} has status new")]
    NotTracked(EntityHandle),
    #[error("entity {0} cannot be identified with a null id")]
    MissingId(EntityHandle),
    #[error("no values hash available for entity {0}")]
    NoValuesHash(EntityHandle),
    #[error("no entity model registered for class {0}")]
    UnknownModel(String),
    #[error("entity {entity} of class {class} cannot be managed as {model}")]
    ModelMismatch {
        entity: EntityHandle,
        class: String,
        model: String,
    },
    #[error(transparent)]
    ValuesHash(#[from] ValuesHashError),

    #[error("entity {entity} already identified with other id: {existing}")]
    AlreadyIdentified {
        entity: EntityHandle,
        existing: IdRep,
        requested: IdRep,
    },
    #[error("other entity instance already exists in persistence context: {entity}")]
    DuplicateInstance {
        entity: String,
        existing: EntityHandle,
    },

    #[error("could not create entity object for {entity}")]
    EntityCreationFailed {
        entity: String,
        #[source]
        source: ObjectCreationError,
    },
    #[error("entity which gets inherited by other entities can not be lazy initialized: {entity}")]
    ProxyRefused { entity: String },
    #[error("lazy proxies are disabled, cannot lazy initialize {entity}")]
    LazyProxiesDisabled { entity: String },
    #[error("cannot lazy initialize class: {entity}")]
    LazyInitialization {
        entity: String,
        #[source]
        source: ProxyCreationError,
    },
    #[error("invalid identifier for {class}")]
    IdCodec {
        class: String,
        #[source]
        source: IdCodecError,
    },
    #[error("failed to encode value hash: {0}")]
    ValueHashEncoding(String),
}

impl PersistenceError {
    /// The caller violated a precondition.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            PersistenceError::UnknownEntity(_)
                | PersistenceError::NotManaged(_)
                | PersistenceError::NotTracked(_)
                | PersistenceError::MissingId(_)
                | PersistenceError::NoValuesHash(_)
                | PersistenceError::UnknownModel(_)
                | PersistenceError::ModelMismatch { .. }
                | PersistenceError::ValuesHash(_)
        )
    }

    /// A ledger invariant would have been broken. Never retryable.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            PersistenceError::AlreadyIdentified { .. } | PersistenceError::DuplicateInstance { .. }
        )
    }
}
