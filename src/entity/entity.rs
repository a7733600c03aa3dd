use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// Stable native identity of an entity instance.
///
/// Handles are issued by [`EntityArena`](super::EntityArena) and are never
/// reused, so two handles are equal iff they denote the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    pub(crate) fn new(raw: u64) -> Self {
        EntityHandle(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A mutable domain object: its concrete class plus a bag of field values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    class: String,
    fields: BTreeMap<String, Value>,
    #[serde(skip, default)]
    placeholder: bool,
}

impl Entity {
    pub fn new(class: impl Into<String>) -> Self {
        Entity {
            class: class.into(),
            fields: BTreeMap::new(),
            placeholder: false,
        }
    }

    /// A lazy placeholder whose fields are populated on first load.
    pub fn placeholder(class: impl Into<String>) -> Self {
        Entity {
            placeholder: true,
            ..Entity::new(class)
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the field value, `Value::Null` when it was never set.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.placeholder = false;
    }
}
