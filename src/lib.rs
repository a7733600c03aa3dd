mod entity;
mod error;
mod model;
mod operation;
mod proxy;
mod store;

pub use entity::{Entity, EntityArena, EntityHandle, Lob, Value, Values};
pub use error::PersistenceError;
pub use model::{
    Capabilities, EntityModel, EntityProperty, IdCodecError, IdDef, IdRep, ModelDef, ModelError,
    ModelRegistry, ModelRegistryBuilder, ObjectCreationError, PropertyKind, RelationDef,
    ScalarType,
};
pub use operation::{CascadeError, CascadeOperation, CascadeType, CascadeTypes, OperationCascader};
pub use proxy::{EntityProxyManager, InMemoryProxyManager, LazyLoadBinding, ProxyCreationError};
pub use store::{
    ContextOptions, EntityInfo, EntityState, IdentityLookup, PersistenceContext, ValueHash,
    ValueHashes, ValueHashesFactory, ValuesHash, ValuesHashError,
};
