use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use super::{CascadeError, CascadeOperation, CascadeType};
use crate::entity::{Entity, EntityHandle};
use crate::error::PersistenceError;
use crate::model::{EntityModel, ModelRegistry};
use crate::proxy::EntityProxyManager;
use crate::store::PersistenceContext;

/// Visited-set for one cascade pass. Create one per pass and drop it after.
#[derive(Debug)]
pub struct OperationCascader {
    cascade_type: CascadeType,
    cascaded: HashSet<EntityHandle>,
}

impl OperationCascader {
    pub fn new(cascade_type: CascadeType) -> Self {
        OperationCascader {
            cascade_type,
            cascaded: HashSet::new(),
        }
    }

    pub fn cascade_type(&self) -> CascadeType {
        self.cascade_type
    }

    /// Record `entity` as visited. Returns false if it already was, in which
    /// case the caller must not cascade into it again.
    pub fn mark_as_cascaded(&mut self, entity: EntityHandle) -> bool {
        self.cascaded.insert(entity)
    }

    pub fn is_cascaded(&self, entity: EntityHandle) -> bool {
        self.cascaded.contains(&entity)
    }

    pub fn cascaded_count(&self) -> usize {
        self.cascaded.len()
    }

    /// Hand every entity reachable through one of `entity`'s cascading
    /// relations to `operation`.
    pub fn cascade_properties(
        &self,
        model: &EntityModel,
        entity: &Entity,
        operation: &mut dyn CascadeOperation,
    ) -> Result<(), CascadeError> {
        for property in model
            .properties()
            .iter()
            .filter(|property| property.capabilities().cascadable)
        {
            let value = property.read_value(entity);
            property
                .cascade(&value, self.cascade_type, operation)
                .map_err(|source| CascadeError::Property {
                    cascade_type: self.cascade_type,
                    property: property.qualified_name(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    /// Apply `operation` to `root` and, transitively, to every entity reached
    /// through relations that cascade this pass's type.
    ///
    /// Entities are applied once each, depth first in property order. Tracked
    /// entities cascade through their ledger model, untracked ones through the
    /// registry model of their class. A failure is wrapped once per relation
    /// between `root` and the failing entity.
    pub fn cascade_graph<P: EntityProxyManager>(
        &mut self,
        context: &PersistenceContext<P>,
        models: &ModelRegistry,
        root: EntityHandle,
        operation: &mut dyn CascadeOperation,
    ) -> Result<(), CascadeError> {
        let mut hops: Vec<Hop> = Vec::new();
        let mut pending: Vec<(EntityHandle, Option<usize>)> = vec![(root, None)];

        while let Some((entity, hop)) = pending.pop() {
            if !self.mark_as_cascaded(entity) {
                continue;
            }
            trace!(entity = %entity, cascade_type = %self.cascade_type, "cascading");

            let reached = self
                .apply(context, models, entity, operation)
                .map_err(|source| self.wrap_path(&hops, hop, source))?;

            for (property, targets) in reached.into_iter().rev() {
                hops.push(Hop {
                    parent: hop,
                    property,
                });
                let index = hops.len() - 1;
                for target in targets.into_iter().rev() {
                    if !self.is_cascaded(target) {
                        pending.push((target, Some(index)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Run `operation` on `entity` and collect what its cascading relations
    /// reach, grouped by relation.
    fn apply<P: EntityProxyManager>(
        &self,
        context: &PersistenceContext<P>,
        models: &ModelRegistry,
        entity: EntityHandle,
        operation: &mut dyn CascadeOperation,
    ) -> Result<Vec<(String, Vec<EntityHandle>)>, CascadeError> {
        operation.cascade(entity)?;

        let instance = context
            .entity(entity)
            .ok_or(PersistenceError::UnknownEntity(entity))?;
        let model = resolve_model(context, models, entity, instance)?;

        let mut reached = Vec::new();
        for property in model
            .properties()
            .iter()
            .filter(|property| property.capabilities().cascadable)
        {
            let value = property.read_value(instance);
            let mut targets = Vec::new();
            let mut collect = |target: EntityHandle| {
                targets.push(target);
                Ok::<(), CascadeError>(())
            };
            property
                .cascade(&value, self.cascade_type, &mut collect)
                .map_err(|source| CascadeError::Property {
                    cascade_type: self.cascade_type,
                    property: property.qualified_name(),
                    source: Box::new(source),
                })?;
            if !targets.is_empty() {
                reached.push((property.qualified_name(), targets));
            }
        }
        Ok(reached)
    }

    fn wrap_path(&self, hops: &[Hop], hop: Option<usize>, source: CascadeError) -> CascadeError {
        let mut error = source;
        let mut current = hop;
        while let Some(index) = current {
            error = CascadeError::Property {
                cascade_type: self.cascade_type,
                property: hops[index].property.clone(),
                source: Box::new(error),
            };
            current = hops[index].parent;
        }
        error
    }
}

/// One relation traversed during a pass, linked to the hop that reached its owner.
#[derive(Debug)]
struct Hop {
    parent: Option<usize>,
    property: String,
}

fn resolve_model<P: EntityProxyManager>(
    context: &PersistenceContext<P>,
    models: &ModelRegistry,
    entity: EntityHandle,
    instance: &Entity,
) -> Result<Arc<EntityModel>, PersistenceError> {
    if let Ok(model) = context.get_entity_model_by_entity(entity) {
        return Ok(Arc::clone(model));
    }
    models
        .model_of(instance)
        .ok_or_else(|| PersistenceError::UnknownModel(instance.class().to_string()))
}
