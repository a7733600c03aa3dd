use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{EntityModel, EntityProperty, IdDef, ModelError, PropertyKind};
use crate::entity::Entity;

/// Declaration of one entity class, resolved by [`ModelRegistryBuilder::build`].
#[derive(Debug, Clone)]
pub struct ModelDef {
    class: String,
    extends: Option<String>,
    id: Option<IdDef>,
    properties: Vec<(String, PropertyKind)>,
    is_abstract: bool,
}

impl ModelDef {
    pub fn new(class: impl Into<String>) -> Self {
        ModelDef {
            class: class.into(),
            extends: None,
            id: None,
            properties: Vec::new(),
            is_abstract: false,
        }
    }

    pub fn extends(mut self, super_class: impl Into<String>) -> Self {
        self.extends = Some(super_class.into());
        self
    }

    pub fn id(mut self, id: IdDef) -> Self {
        self.id = Some(id);
        self
    }

    pub fn property(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
        self.properties.push((name.into(), kind));
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    defs: Vec<ModelDef>,
}

impl ModelRegistryBuilder {
    pub fn model(mut self, def: ModelDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Resolve inheritance and validate every declaration.
    pub fn build(self) -> Result<ModelRegistry, ModelError> {
        let mut defs: HashMap<String, ModelDef> = HashMap::with_capacity(self.defs.len());
        for def in self.defs {
            if defs.contains_key(&def.class) {
                return Err(ModelError::DuplicateModel(def.class));
            }
            defs.insert(def.class.clone(), def);
        }

        let mut lineages: Vec<(String, Vec<String>)> = Vec::with_capacity(defs.len());
        for class in defs.keys() {
            lineages.push((class.clone(), lineage_of(class, &defs)?));
        }
        // supers have shorter lineages, so they are built first
        lineages.sort_by(|(a, la), (b, lb)| la.len().cmp(&lb.len()).then_with(|| a.cmp(b)));

        let super_classes: HashSet<&str> = defs
            .values()
            .filter_map(|def| def.extends.as_deref())
            .collect();

        let mut models: HashMap<String, Arc<EntityModel>> = HashMap::with_capacity(defs.len());
        for (class, lineage) in &lineages {
            let def = &defs[class];
            let super_model = match &def.extends {
                Some(super_class) => models.get(super_class).cloned(),
                None => None,
            };
            let model = build_model(
                def,
                lineage.clone(),
                super_model,
                super_classes.contains(class.as_str()),
            )?;
            models.insert(class.clone(), Arc::new(model));
        }

        Ok(ModelRegistry { models })
    }
}

fn lineage_of(class: &str, defs: &HashMap<String, ModelDef>) -> Result<Vec<String>, ModelError> {
    let mut lineage = vec![class.to_string()];
    let mut current = &defs[class];
    while let Some(super_class) = &current.extends {
        if lineage.iter().any(|c| c == super_class) {
            return Err(ModelError::InheritanceCycle(class.to_string()));
        }
        current = defs
            .get(super_class)
            .ok_or_else(|| ModelError::UnknownSuperModel {
                class: current.class.clone(),
                super_class: super_class.clone(),
            })?;
        lineage.push(super_class.clone());
    }
    Ok(lineage)
}

fn build_model(
    def: &ModelDef,
    lineage: Vec<String>,
    super_model: Option<Arc<EntityModel>>,
    has_sub_models: bool,
) -> Result<EntityModel, ModelError> {
    let mut properties: Vec<EntityProperty> = super_model
        .as_ref()
        .map(|model| model.properties().to_vec())
        .unwrap_or_default();

    for (name, kind) in &def.properties {
        if properties.iter().any(|p| p.name() == name) {
            return Err(ModelError::DuplicateProperty {
                class: def.class.clone(),
                property: name.clone(),
            });
        }
        properties.push(EntityProperty::new(name.clone(), def.class.clone(), kind.clone()));
    }

    let id_def = match (&def.id, &super_model) {
        (Some(_), Some(_)) => return Err(ModelError::IdRedefined(def.class.clone())),
        (Some(id), None) => id.clone(),
        (None, Some(model)) => model.id_def().clone(),
        (None, None) => return Err(ModelError::MissingId(def.class.clone())),
    };

    let id_index = properties
        .iter()
        .position(|p| p.name() == id_def.property_name())
        .ok_or_else(|| ModelError::UnknownIdProperty {
            class: def.class.clone(),
            property: id_def.property_name().to_string(),
        })?;
    if !properties[id_index].capabilities().identifiable {
        return Err(ModelError::IdPropertyNotIdentifiable {
            class: def.class.clone(),
            property: id_def.property_name().to_string(),
        });
    }

    Ok(EntityModel {
        class: def.class.clone(),
        id_def,
        id_index,
        properties,
        lineage,
        super_model,
        has_sub_models,
        is_abstract: def.is_abstract,
    })
}

/// Every entity model known to a session, addressable by class name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<EntityModel>>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    pub fn get(&self, class: &str) -> Option<Arc<EntityModel>> {
        self.models.get(class).cloned()
    }

    /// Model of the entity's concrete class.
    pub fn model_of(&self, entity: &Entity) -> Option<Arc<EntityModel>> {
        self.get(entity.class())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
