use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::{
    ContextOptions, EntityInfo, EntityState, IdentityLookup, ValueHashes, ValueHashesFactory,
    ValuesHash,
};
use crate::entity::{Entity, EntityArena, EntityHandle, Value, Values};
use crate::error::PersistenceError;
use crate::model::{EntityModel, IdRep, ModelRegistry};
use crate::proxy::{EntityProxyManager, LazyLoadBinding};

/// Identity map and unit-of-work ledger of one session.
///
/// The context owns every entity instance of the session in an
/// [`EntityArena`]; all ledger maps are keyed by the instance's
/// [`EntityHandle`]. Identifier representations are additionally indexed per
/// class, for the entity's own class and every ancestor, so a lookup through
/// a super model finds instances loaded as a sub model.
pub struct PersistenceContext<P> {
    proxy_manager: P,
    options: ContextOptions,
    entities: EntityArena,
    managed: HashSet<EntityHandle>,
    removed: HashSet<EntityHandle>,
    models: HashMap<EntityHandle, Arc<EntityModel>>,
    id_reps: HashMap<EntityHandle, IdRep>,
    values_hashes: HashMap<EntityHandle, ValuesHash>,
    identifiers: HashMap<String, HashMap<IdRep, EntityHandle>>,
}

impl<P: EntityProxyManager> PersistenceContext<P> {
    pub fn new(proxy_manager: P) -> Self {
        Self::with_options(proxy_manager, ContextOptions::default())
    }

    pub fn with_options(proxy_manager: P, options: ContextOptions) -> Self {
        let capacity = options.initial_capacity;
        PersistenceContext {
            proxy_manager,
            options,
            entities: EntityArena::new(),
            managed: HashSet::with_capacity(capacity),
            removed: HashSet::new(),
            models: HashMap::with_capacity(capacity),
            id_reps: HashMap::with_capacity(capacity),
            values_hashes: HashMap::with_capacity(capacity),
            identifiers: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn proxy_manager(&self) -> &P {
        &self.proxy_manager
    }

    pub fn proxy_manager_mut(&mut self) -> &mut P {
        &mut self.proxy_manager
    }

    // ========================================================================
    // entity instances
    // ========================================================================

    /// Hand a new object to the session. It stays untracked until managed.
    pub fn insert_entity(&mut self, entity: Entity) -> EntityHandle {
        self.entities.insert(entity)
    }

    pub fn entity(&self, entity: EntityHandle) -> Option<&Entity> {
        self.entities.get(entity)
    }

    pub fn entity_mut(&mut self, entity: EntityHandle) -> Option<&mut Entity> {
        self.entities.get_mut(entity)
    }

    /// Detach the entity and give up ownership of the instance.
    pub fn release_entity(&mut self, entity: EntityHandle) -> Option<Entity> {
        self.detach_entity(entity);
        self.entities.remove(entity)
    }

    /// Forget every ledger entry and pending lazy load. Instances stay in the
    /// arena, untracked.
    pub fn clear(&mut self) {
        for entity in self.managed.iter().chain(&self.removed) {
            self.proxy_manager.dispose_lazy_binding(*entity);
        }
        self.managed.clear();
        self.removed.clear();
        self.models.clear();
        self.id_reps.clear();
        self.values_hashes.clear();
        self.identifiers.clear();
        debug!("persistence context cleared");
    }

    // ========================================================================
    // lookups
    // ========================================================================

    pub fn get_id_by_entity(&self, entity: EntityHandle) -> Option<&IdRep> {
        self.id_reps.get(&entity)
    }

    pub fn get_entity_by_id(
        &self,
        model: &EntityModel,
        id: &Value,
    ) -> Result<Option<EntityHandle>, PersistenceError> {
        if id.is_null() {
            return Ok(None);
        }
        let id_rep = id_rep_of(model, id)?;
        Ok(self.get_entity_by_id_rep(model, id_rep.as_str()))
    }

    /// Any tracked entity, managed or removed.
    pub fn get_entity_by_id_rep(&self, model: &EntityModel, id_rep: &str) -> Option<EntityHandle> {
        self.identifiers
            .get(model.class())
            .and_then(|by_rep| by_rep.get(id_rep))
            .copied()
    }

    pub fn get_managed_entity(
        &self,
        model: &EntityModel,
        id: &Value,
    ) -> Result<Option<EntityHandle>, PersistenceError> {
        if id.is_null() {
            return Ok(None);
        }
        let id_rep = id_rep_of(model, id)?;
        Ok(self.get_managed_entity_by_id_rep(model, id_rep.as_str()))
    }

    pub fn get_managed_entity_by_id_rep(
        &self,
        model: &EntityModel,
        id_rep: &str,
    ) -> Option<EntityHandle> {
        self.get_entity_by_id_rep(model, id_rep)
            .filter(|entity| self.managed.contains(entity))
    }

    pub fn get_removed_entity(
        &self,
        model: &EntityModel,
        id: &Value,
    ) -> Result<Option<EntityHandle>, PersistenceError> {
        if id.is_null() {
            return Ok(None);
        }
        let id_rep = id_rep_of(model, id)?;
        Ok(self.get_removed_entity_by_id_rep(model, id_rep.as_str()))
    }

    pub fn get_removed_entity_by_id_rep(
        &self,
        model: &EntityModel,
        id_rep: &str,
    ) -> Option<EntityHandle> {
        self.get_entity_by_id_rep(model, id_rep)
            .filter(|entity| self.removed.contains(entity))
    }

    pub fn managed_entities(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.managed.iter().copied()
    }

    pub fn removed_entities(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.removed.iter().copied()
    }

    pub fn contains_managed_entity(&self, entity: EntityHandle) -> bool {
        self.managed.contains(&entity)
    }

    pub fn contains_removed_entity(&self, entity: EntityHandle) -> bool {
        self.removed.contains(&entity)
    }

    pub fn get_entity_model_by_entity(
        &self,
        entity: EntityHandle,
    ) -> Result<&Arc<EntityModel>, PersistenceError> {
        self.models
            .get(&entity)
            .ok_or(PersistenceError::NotTracked(entity))
    }

    /// Determine the lifecycle state of `entity` without touching the ledger.
    ///
    /// Tracked entities report their ledger state. Untracked ones are judged
    /// by their identifier field: with generated identifiers a set field
    /// means the entity was detached from some session, with assigned keys
    /// the entity is always considered new.
    pub fn classify(
        &self,
        entity: EntityHandle,
        models: &ModelRegistry,
    ) -> Result<EntityInfo, PersistenceError> {
        let state = if self.managed.contains(&entity) {
            Some(EntityState::Managed)
        } else if self.removed.contains(&entity) {
            Some(EntityState::Removed)
        } else {
            None
        };

        if let Some(state) = state {
            let model = self.get_entity_model_by_entity(entity)?.clone();
            let id = match self.id_reps.get(&entity) {
                Some(id_rep) => Some(model.rep_to_value(id_rep).map_err(|source| {
                    PersistenceError::IdCodec {
                        class: model.class().to_string(),
                        source,
                    }
                })?),
                None => None,
            };
            return Ok(EntityInfo::new(state, model, id));
        }

        let instance = self
            .entities
            .get(entity)
            .ok_or(PersistenceError::UnknownEntity(entity))?;
        let model = models
            .model_of(instance)
            .ok_or_else(|| PersistenceError::UnknownModel(instance.class().to_string()))?;
        let id = Some(model.read_id(instance)).filter(|id| !id.is_null());

        let state = if model.id_def().is_generated() && id.is_some() {
            EntityState::Detached
        } else {
            EntityState::New
        };
        Ok(EntityInfo::new(state, model, id))
    }

    // ========================================================================
    // managed instances and proxies
    // ========================================================================

    /// The managed instance for `id`, created blank if the session has none yet.
    pub fn get_or_create_managed_entity(
        &mut self,
        model: &Arc<EntityModel>,
        id: &Value,
    ) -> Result<EntityHandle, PersistenceError> {
        if let Some(entity) = self.get_managed_entity(model, id)? {
            return Ok(entity);
        }
        self.create_managed_entity(model, id)
    }

    /// Instantiate, manage and identify a blank instance. The identifier field
    /// is left for the session to map along with the other values.
    pub fn create_managed_entity(
        &mut self,
        model: &Arc<EntityModel>,
        id: &Value,
    ) -> Result<EntityHandle, PersistenceError> {
        let instance =
            model
                .instantiate()
                .map_err(|source| PersistenceError::EntityCreationFailed {
                    entity: EntityInfo::build_entity_string(model, Some(id)),
                    source,
                })?;

        let entity = self.entities.insert(instance);
        let tracked = self
            .manage_entity(entity, Arc::clone(model))
            .and_then(|()| self.identify_managed_entity(entity, id));
        if let Err(err) = tracked {
            self.release_entity(entity);
            return Err(err);
        }
        Ok(entity)
    }

    /// A tracked instance for `id`, or a lazy placeholder bound to `session`.
    ///
    /// Returns `Ok(None)` for a null id. Models with sub models are refused,
    /// since the concrete class of the row is unknown until it is loaded.
    pub fn get_or_create_entity_proxy(
        &mut self,
        model: &Arc<EntityModel>,
        id: &Value,
        session: P::Session,
    ) -> Result<Option<EntityHandle>, PersistenceError> {
        if id.is_null() {
            return Ok(None);
        }

        let id_rep = id_rep_of(model, id)?;
        if let Some(entity) = self.get_entity_by_id_rep(model, id_rep.as_str()) {
            return Ok(Some(entity));
        }

        if model.has_sub_models() {
            return Err(PersistenceError::ProxyRefused {
                entity: EntityInfo::build_entity_string(model, Some(id)),
            });
        }
        if !self.options.lazy_proxies {
            return Err(PersistenceError::LazyProxiesDisabled {
                entity: EntityInfo::build_entity_string(model, Some(id)),
            });
        }

        let entity = self.entities.reserve();
        let binding = LazyLoadBinding {
            entity,
            model: Arc::clone(model),
            id: id.clone(),
            session,
        };
        let mut proxy = self
            .proxy_manager
            .create_proxy(model.class(), binding)
            .map_err(|source| PersistenceError::LazyInitialization {
                entity: EntityInfo::build_entity_string(model, Some(id)),
                source,
            })?;
        model.id_property().write_value(&mut proxy, id.clone());
        self.entities.fill(entity, proxy);

        let tracked = self
            .manage_entity(entity, Arc::clone(model))
            .and_then(|()| self.identify_managed_entity(entity, id));
        if let Err(err) = tracked {
            self.release_entity(entity);
            return Err(err);
        }

        debug!(entity = %entity, class = model.class(), id_rep = %id_rep, "created entity proxy");
        Ok(Some(entity))
    }

    // ========================================================================
    // ledger transitions
    // ========================================================================

    /// Mark `entity` managed under `model`, clearing any removed state.
    ///
    /// The model must be the one of the instance's own class; an entity
    /// cannot change its model once identified.
    pub fn manage_entity(
        &mut self,
        entity: EntityHandle,
        model: Arc<EntityModel>,
    ) -> Result<(), PersistenceError> {
        let instance = self
            .entities
            .get(entity)
            .ok_or(PersistenceError::UnknownEntity(entity))?;
        if instance.class() != model.class() {
            return Err(PersistenceError::ModelMismatch {
                entity,
                class: instance.class().to_string(),
                model: model.class().to_string(),
            });
        }
        if let Some(tracked) = self.models.get(&entity) {
            if !Arc::ptr_eq(tracked, &model) && self.id_reps.contains_key(&entity) {
                return Err(PersistenceError::ModelMismatch {
                    entity,
                    class: tracked.class().to_string(),
                    model: model.class().to_string(),
                });
            }
        }

        self.removed.remove(&entity);
        self.managed.insert(entity);
        debug!(entity = %entity, class = model.class(), "managing entity");
        self.models.insert(entity, model);
        Ok(())
    }

    /// Schedule a managed entity for deletion. It stays identifiable until detached.
    pub fn remove_entity(&mut self, entity: EntityHandle) -> Result<(), PersistenceError> {
        self.validate_entity_managed(entity)?;

        self.managed.remove(&entity);
        self.removed.insert(entity);
        debug!(entity = %entity, "removed entity");
        Ok(())
    }

    /// Purge every ledger entry of `entity`, including its identifier
    /// registrations under all ancestor classes and a pending lazy load.
    pub fn detach_entity(&mut self, entity: EntityHandle) {
        self.proxy_manager.dispose_lazy_binding(entity);
        if let Some(model) = self.models.remove(&entity) {
            if let Some(id_rep) = self.id_reps.remove(&entity) {
                self.remove_identification(&model, &id_rep, entity);
            }
        }

        self.id_reps.remove(&entity);
        self.managed.remove(&entity);
        self.values_hashes.remove(&entity);
        self.removed.remove(&entity);
        debug!(entity = %entity, "detached entity");
    }

    /// End-of-flush cleanup: detach every removed entity.
    pub fn detach_all_removed(&mut self) {
        let removed: Vec<EntityHandle> = self.removed.iter().copied().collect();
        for entity in removed {
            self.detach_entity(entity);
        }
    }

    /// Bind `id` to a managed entity, under its own class and every ancestor.
    ///
    /// All classes of the lineage are checked before anything is registered,
    /// so a collision leaves the ledger untouched. Identifying the same
    /// instance with the same id again is a no-op.
    pub fn identify_managed_entity(
        &mut self,
        entity: EntityHandle,
        id: &Value,
    ) -> Result<(), PersistenceError> {
        self.validate_entity_managed(entity)?;
        if id.is_null() {
            return Err(PersistenceError::MissingId(entity));
        }

        let model = Arc::clone(self.get_entity_model_by_entity(entity)?);
        let id_rep = id_rep_of(&model, id)?;

        if let Some(existing) = self.id_reps.get(&entity) {
            if *existing != id_rep {
                return Err(PersistenceError::AlreadyIdentified {
                    entity,
                    existing: existing.clone(),
                    requested: id_rep,
                });
            }
        }

        for class in model.lineage() {
            let registered = self
                .identifiers
                .get(class)
                .and_then(|by_rep| by_rep.get(&id_rep));
            if let Some(&other) = registered {
                if other != entity {
                    return Err(PersistenceError::DuplicateInstance {
                        entity: format!("{}#{}", class, id_rep),
                        existing: other,
                    });
                }
            }
        }

        for class in model.lineage() {
            self.identifiers
                .entry(class.clone())
                .or_default()
                .insert(id_rep.clone(), entity);
        }
        debug!(entity = %entity, class = model.class(), id_rep = %id_rep, "identified managed entity");
        self.id_reps.insert(entity, id_rep);
        Ok(())
    }

    // ========================================================================
    // values and value hashes
    // ========================================================================

    /// Write loaded values onto a managed entity. A pending lazy load is
    /// dropped, the supplied values take its place.
    pub fn map_values(
        &mut self,
        entity: EntityHandle,
        values: &Values,
    ) -> Result<(), PersistenceError> {
        self.validate_entity_managed(entity)?;

        let model = Arc::clone(self.get_entity_model_by_entity(entity)?);
        self.proxy_manager.dispose_lazy_binding(entity);

        let instance = self
            .entities
            .get_mut(entity)
            .ok_or(PersistenceError::UnknownEntity(entity))?;
        instance.mark_initialized();
        for property in model.properties() {
            if let Some(value) = values.get(property.name()) {
                property.write_value(instance, value.clone());
            }
        }
        Ok(())
    }

    pub fn contains_value_hashes(&self, entity: EntityHandle) -> Result<bool, PersistenceError> {
        self.validate_entity_managed(entity)?;
        Ok(self.values_hashes.contains_key(&entity))
    }

    /// Replace the entity's snapshot. Each property's hash comes from
    /// `value_hashes`, else from `values`, else from the live field. Returns
    /// the raw values that were hashed.
    pub fn update_value_hashes(
        &mut self,
        entity: EntityHandle,
        values: Values,
        value_hashes: ValueHashes,
    ) -> Result<Values, PersistenceError> {
        self.validate_entity_managed(entity)?;

        let model = Arc::clone(self.get_entity_model_by_entity(entity)?);
        let instance = self
            .entities
            .get(entity)
            .ok_or(PersistenceError::UnknownEntity(entity))?;
        let (values_hash, resolved) = ValueHashesFactory::new(&model, self)
            .with_values(values)
            .with_value_hashes(value_hashes)
            .create(instance)?;

        self.values_hashes.insert(entity, values_hash);
        Ok(resolved)
    }

    pub fn get_values_hash_by_entity(
        &self,
        entity: EntityHandle,
    ) -> Result<&ValuesHash, PersistenceError> {
        self.values_hashes
            .get(&entity)
            .ok_or(PersistenceError::NoValuesHash(entity))
    }

    /// Whether the live field values differ from the last snapshot.
    pub fn has_pending_changes(&self, entity: EntityHandle) -> Result<bool, PersistenceError> {
        self.validate_entity_managed(entity)?;

        let stored = self.get_values_hash_by_entity(entity)?;
        let model = self.get_entity_model_by_entity(entity)?;
        let instance = self
            .entities
            .get(entity)
            .ok_or(PersistenceError::UnknownEntity(entity))?;
        let (live, _) = ValueHashesFactory::new(model, self).create(instance)?;

        Ok(!stored.matches(&live)?)
    }

    // ========================================================================
    // helpers
    // ========================================================================

    fn validate_entity_managed(&self, entity: EntityHandle) -> Result<(), PersistenceError> {
        if self.managed.contains(&entity) {
            return Ok(());
        }
        if !self.entities.contains(entity) {
            return Err(PersistenceError::UnknownEntity(entity));
        }
        Err(PersistenceError::NotManaged(entity))
    }

    fn remove_identification(&mut self, model: &EntityModel, id_rep: &IdRep, entity: EntityHandle) {
        for class in model.lineage() {
            if let Some(by_rep) = self.identifiers.get_mut(class) {
                if by_rep.get(id_rep) == Some(&entity) {
                    by_rep.remove(id_rep);
                }
            }
        }
    }
}

impl<P> IdentityLookup for PersistenceContext<P> {
    fn id_rep_of(&self, entity: EntityHandle) -> Option<&IdRep> {
        self.id_reps.get(&entity)
    }
}

fn id_rep_of(model: &EntityModel, id: &Value) -> Result<IdRep, PersistenceError> {
    model
        .value_to_rep(id)
        .map_err(|source| PersistenceError::IdCodec {
            class: model.class().to_string(),
            source,
        })
}
