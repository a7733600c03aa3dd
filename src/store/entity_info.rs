use std::fmt;
use std::sync::Arc;

use crate::entity::Value;
use crate::model::EntityModel;

/// Lifecycle state of an entity as seen by the persistence context.
///
/// Only `Managed` and `Removed` are ever stored; `New` and `Detached` are
/// derived from the entity's identifier when it is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    New,
    Managed,
    Removed,
    Detached,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityState::New => "new",
            EntityState::Managed => "managed",
            EntityState::Removed => "removed",
            EntityState::Detached => "detached",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct EntityInfo {
    state: EntityState,
    model: Arc<EntityModel>,
    id: Option<Value>,
}

impl EntityInfo {
    pub fn new(state: EntityState, model: Arc<EntityModel>, id: Option<Value>) -> Self {
        EntityInfo { state, model, id }
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn model(&self) -> &Arc<EntityModel> {
        &self.model
    }

    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// `Class#idRep`, the form entities take in error messages.
    pub fn build_entity_string(model: &EntityModel, id: Option<&Value>) -> String {
        let id = match id {
            None | Some(Value::Null) => "<null>".to_string(),
            Some(id) => model
                .value_to_rep(id)
                .map(|rep| rep.into_string())
                .unwrap_or_else(|_| "<invalid>".to_string()),
        };
        format!("{}#{}", model.class(), id)
    }
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            EntityInfo::build_entity_string(&self.model, self.id.as_ref()),
            self.state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IdDef, ModelDef, ModelRegistry, PropertyKind};

    fn article() -> Arc<EntityModel> {
        ModelRegistry::builder()
            .model(
                ModelDef::new("Article")
                    .id(IdDef::generated("id"))
                    .property("id", PropertyKind::int()),
            )
            .build()
            .unwrap()
            .get("Article")
            .unwrap()
    }

    #[test]
    fn entity_string() {
        let model = article();
        assert_eq!(
            EntityInfo::build_entity_string(&model, Some(&Value::Int(7))),
            "Article#7"
        );
        assert_eq!(EntityInfo::build_entity_string(&model, None), "Article#<null>");
        assert_eq!(
            EntityInfo::build_entity_string(&model, Some(&Value::Text("x".into()))),
            "Article#<invalid>"
        );
    }

    #[test]
    fn display_includes_state() {
        let info = EntityInfo::new(EntityState::Removed, article(), Some(Value::Int(7)));
        assert_eq!(info.to_string(), "Article#7 (removed)");
    }
}
