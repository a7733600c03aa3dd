//! Lazy placeholders for entities that are referenced before they are loaded.

mod in_memory;

use std::sync::Arc;

use crate::entity::{Entity, EntityHandle, Value};
use crate::model::EntityModel;

pub use in_memory::InMemoryProxyManager;

/// Everything a placeholder needs to load itself on first access.
#[derive(Debug, Clone)]
pub struct LazyLoadBinding<S> {
    pub entity: EntityHandle,
    pub model: Arc<EntityModel>,
    pub id: Value,
    pub session: S,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyCreationError {
    #[error("can not create proxy class for {0}")]
    ClassNotProxyable(String),
    #[error("proxy creation failed: {0}")]
    Other(String),
}

/// Creates placeholders and tracks their pending lazy loads.
pub trait EntityProxyManager {
    /// Passed through to the binding untouched; the context never inspects it.
    type Session;

    fn create_proxy(
        &mut self,
        class: &str,
        binding: LazyLoadBinding<Self::Session>,
    ) -> Result<Entity, ProxyCreationError>;

    /// Forget the pending load of `entity`, if any.
    fn dispose_lazy_binding(&mut self, entity: EntityHandle);
}
