use std::sync::Arc;

use super::{EntityProperty, IdCodecError, IdRep};
use crate::entity::{Entity, Value};

/// Which property holds the identifier and who assigns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdDef {
    property: String,
    generated: bool,
}

impl IdDef {
    /// Identifier assigned by storage on insert.
    pub fn generated(property: impl Into<String>) -> Self {
        IdDef {
            property: property.into(),
            generated: true,
        }
    }

    /// Natural key set by the application.
    pub fn assigned(property: impl Into<String>) -> Self {
        IdDef {
            property: property.into(),
            generated: false,
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectCreationError {
    #[error("abstract class {0} cannot be instantiated")]
    AbstractClass(String),
}

/// Mapping metadata of one entity class. Built by
/// [`ModelRegistry`](super::ModelRegistry), immutable afterwards.
#[derive(Debug)]
pub struct EntityModel {
    pub(super) class: String,
    pub(super) id_def: IdDef,
    pub(super) id_index: usize,
    pub(super) properties: Vec<EntityProperty>,
    pub(super) lineage: Vec<String>,
    pub(super) super_model: Option<Arc<EntityModel>>,
    pub(super) has_sub_models: bool,
    pub(super) is_abstract: bool,
}

impl EntityModel {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn id_def(&self) -> &IdDef {
        &self.id_def
    }

    pub fn id_property(&self) -> &EntityProperty {
        &self.properties[self.id_index]
    }

    /// Inherited properties first, then the class's own, in declaration order.
    pub fn properties(&self) -> &[EntityProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&EntityProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// This class followed by every ancestor class, nearest first.
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    pub fn super_model(&self) -> Option<&Arc<EntityModel>> {
        self.super_model.as_ref()
    }

    pub fn has_sub_models(&self) -> bool {
        self.has_sub_models
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_a(&self, class: &str) -> bool {
        self.lineage.iter().any(|c| c == class)
    }

    pub fn value_to_rep(&self, id: &Value) -> Result<IdRep, IdCodecError> {
        self.id_property().value_to_rep(id)
    }

    pub fn rep_to_value(&self, rep: &IdRep) -> Result<Value, IdCodecError> {
        self.id_property().rep_to_value(rep)
    }

    pub fn read_id(&self, entity: &Entity) -> Value {
        self.id_property().read_value(entity)
    }

    /// A blank instance of this class.
    pub fn instantiate(&self) -> Result<Entity, ObjectCreationError> {
        if self.is_abstract {
            return Err(ObjectCreationError::AbstractClass(self.class.clone()));
        }
        Ok(Entity::new(self.class.clone()))
    }
}
