use std::collections::HashMap;

use super::{Entity, EntityHandle};

/// Owns every entity instance of a session and hands out their handles.
#[derive(Debug)]
pub struct EntityArena {
    slots: HashMap<EntityHandle, Entity>,
    next: u64,
}

impl Default for EntityArena {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityArena {
    pub fn new() -> Self {
        EntityArena {
            slots: HashMap::new(),
            next: 1,
        }
    }

    pub fn insert(&mut self, entity: Entity) -> EntityHandle {
        let handle = self.reserve();
        self.slots.insert(handle, entity);
        handle
    }

    /// Issue a handle without storing anything under it yet.
    pub(crate) fn reserve(&mut self) -> EntityHandle {
        let handle = EntityHandle::new(self.next);
        self.next += 1;
        handle
    }

    pub(crate) fn fill(&mut self, handle: EntityHandle, entity: Entity) {
        self.slots.insert(handle, entity);
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.slots.get(&handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.slots.get_mut(&handle)
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    pub fn remove(&mut self, handle: EntityHandle) -> Option<Entity> {
        self.slots.remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
