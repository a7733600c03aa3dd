use std::collections::{HashMap, HashSet};

use super::{EntityProxyManager, LazyLoadBinding, ProxyCreationError};
use crate::entity::{Entity, EntityHandle};

/// Proxy manager that keeps pending bindings in a HashMap.
///
/// Whoever intercepts the first field access calls
/// [`take_binding`](InMemoryProxyManager::take_binding) and runs the load
/// through the bound session.
#[derive(Debug)]
pub struct InMemoryProxyManager<S> {
    pending: HashMap<EntityHandle, LazyLoadBinding<S>>,
    refused: HashSet<String>,
}

impl<S> Default for InMemoryProxyManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> InMemoryProxyManager<S> {
    pub fn new() -> Self {
        InMemoryProxyManager {
            pending: HashMap::new(),
            refused: HashSet::new(),
        }
    }

    /// Classes that cannot be stood in for by a placeholder.
    pub fn refuse_class(mut self, class: impl Into<String>) -> Self {
        self.refused.insert(class.into());
        self
    }

    pub fn pending_binding(&self, entity: EntityHandle) -> Option<&LazyLoadBinding<S>> {
        self.pending.get(&entity)
    }

    pub fn take_binding(&mut self, entity: EntityHandle) -> Option<LazyLoadBinding<S>> {
        self.pending.remove(&entity)
    }

    pub fn is_pending(&self, entity: EntityHandle) -> bool {
        self.pending.contains_key(&entity)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl<S> EntityProxyManager for InMemoryProxyManager<S> {
    type Session = S;

    fn create_proxy(
        &mut self,
        class: &str,
        binding: LazyLoadBinding<S>,
    ) -> Result<Entity, ProxyCreationError> {
        if self.refused.contains(class) {
            return Err(ProxyCreationError::ClassNotProxyable(class.to_string()));
        }

        self.pending.insert(binding.entity, binding);
        Ok(Entity::placeholder(class))
    }

    fn dispose_lazy_binding(&mut self, entity: EntityHandle) {
        self.pending.remove(&entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Value;
    use crate::model::{IdDef, ModelDef, ModelRegistry, PropertyKind};

    fn binding(entity: u64) -> LazyLoadBinding<&'static str> {
        let models = ModelRegistry::builder()
            .model(
                ModelDef::new("Article")
                    .id(IdDef::generated("id"))
                    .property("id", PropertyKind::int()),
            )
            .build()
            .unwrap();
        LazyLoadBinding {
            entity: EntityHandle::new(entity),
            model: models.get("Article").unwrap(),
            id: Value::Int(7),
            session: "session-1",
        }
    }

    #[test]
    fn proxy_is_a_placeholder_with_pending_binding() {
        let mut proxies = InMemoryProxyManager::new();
        let entity = proxies.create_proxy("Article", binding(1)).unwrap();

        assert!(entity.is_placeholder());
        assert_eq!(entity.class(), "Article");
        assert!(proxies.is_pending(EntityHandle::new(1)));
        assert_eq!(
            proxies.pending_binding(EntityHandle::new(1)).map(|b| b.session),
            Some("session-1")
        );
    }

    #[test]
    fn refused_class_fails() {
        let mut proxies = InMemoryProxyManager::new().refuse_class("Article");
        assert_eq!(
            proxies.create_proxy("Article", binding(1)).unwrap_err(),
            ProxyCreationError::ClassNotProxyable("Article".into())
        );
        assert_eq!(proxies.pending_count(), 0);
    }

    #[test]
    fn dispose_and_take_clear_binding() {
        let mut proxies = InMemoryProxyManager::new();
        proxies.create_proxy("Article", binding(1)).unwrap();
        proxies.create_proxy("Article", binding(2)).unwrap();

        proxies.dispose_lazy_binding(EntityHandle::new(1));
        let taken = proxies.take_binding(EntityHandle::new(2)).unwrap();

        assert_eq!(taken.id, Value::Int(7));
        assert_eq!(proxies.pending_count(), 0);
    }
}
