use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::entity::{Entity, EntityHandle, Lob, Value, Values};
use crate::error::PersistenceError;
use crate::model::{EntityModel, IdRep, PropertyKind};

/// Explicit per-property hashes handed in by the session.
pub type ValueHashes = BTreeMap<String, ValueHash>;

/// Resolves the identity of referenced entities while hashing associations.
pub trait IdentityLookup {
    fn id_rep_of(&self, entity: EntityHandle) -> Option<&IdRep>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum ReferenceHash {
    Identified(IdRep),
    Unidentified(EntityHandle),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Fingerprint {
    Null,
    Scalar(Vec<u8>),
    Digest([u8; 32]),
    Reference(ReferenceHash),
    Collection(Vec<ReferenceHash>),
}

/// Opaque fingerprint of one property value. Only supports [`matches`](ValueHash::matches).
///
/// Associations hash by the referenced entity's identity rather than its
/// contents, so comparing snapshots never walks into related graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueHash(Fingerprint);

impl ValueHash {
    pub fn null() -> Self {
        ValueHash(Fingerprint::Null)
    }

    pub fn matches(&self, other: &ValueHash) -> bool {
        self.0 == other.0
    }

    pub(crate) fn create(
        kind: &PropertyKind,
        value: &Value,
        identities: &dyn IdentityLookup,
    ) -> Result<Self, PersistenceError> {
        let reference = |entity: EntityHandle| match identities.id_rep_of(entity) {
            Some(rep) => ReferenceHash::Identified(rep.clone()),
            None => ReferenceHash::Unidentified(entity),
        };

        let fingerprint = match (kind, value) {
            (_, Value::Null) => Fingerprint::Null,
            (PropertyKind::Lob, Value::Lob(lob)) => Fingerprint::Digest(lob_digest(lob)),
            (PropertyKind::ToOne(_), Value::Ref(entity)) => {
                Fingerprint::Reference(reference(*entity))
            }
            (PropertyKind::ToMany(_), Value::Refs(entities)) => {
                Fingerprint::Collection(entities.iter().copied().map(&reference).collect())
            }
            (_, value) => Fingerprint::Scalar(
                bitcode::serialize(value)
                    .map_err(|e| PersistenceError::ValueHashEncoding(e.to_string()))?,
            ),
        };
        Ok(ValueHash(fingerprint))
    }
}

fn lob_digest(lob: &Lob) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((lob.file_name.len() as u64).to_le_bytes());
    hasher.update(lob.file_name.as_bytes());
    hasher.update(&lob.data);
    hasher.finalize().into()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuesHashError {
    #[error("number of value hashes differs ({left} vs {right})")]
    SizeMismatch { left: usize, right: usize },
    #[error("no value hash for property '{0}' available")]
    MissingProperty(String),
}

/// Snapshot of every property's [`ValueHash`] for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesHash {
    value_hashes: BTreeMap<String, ValueHash>,
}

impl ValuesHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_value_hash(&mut self, property_name: impl Into<String>, value_hash: ValueHash) {
        self.value_hashes.insert(property_name.into(), value_hash);
    }

    pub fn value_hashes(&self) -> &BTreeMap<String, ValueHash> {
        &self.value_hashes
    }

    pub fn contains_property_name(&self, property_name: &str) -> bool {
        self.value_hashes.contains_key(property_name)
    }

    pub fn value_hash(&self, property_name: &str) -> Result<&ValueHash, ValuesHashError> {
        self.value_hashes
            .get(property_name)
            .ok_or_else(|| ValuesHashError::MissingProperty(property_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.value_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value_hashes.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ValueHash> {
        self.value_hashes.iter()
    }

    /// `Ok(false)` means the entity has pending changes. Snapshots over
    /// different property sets cannot be compared and yield an error.
    pub fn matches(&self, other: &ValuesHash) -> Result<bool, ValuesHashError> {
        if self.len() != other.len() {
            return Err(ValuesHashError::SizeMismatch {
                left: self.len(),
                right: other.len(),
            });
        }

        for (property_name, value_hash) in &self.value_hashes {
            let other_hash = other.value_hash(property_name)?;
            if !value_hash.matches(other_hash) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Builds a [`ValuesHash`] for one entity, preferring explicit hashes, then
/// supplied values, then the entity's live field values.
pub struct ValueHashesFactory<'a> {
    model: &'a EntityModel,
    identities: &'a dyn IdentityLookup,
    values: Values,
    value_hashes: ValueHashes,
}

impl<'a> ValueHashesFactory<'a> {
    pub fn new(model: &'a EntityModel, identities: &'a dyn IdentityLookup) -> Self {
        ValueHashesFactory {
            model,
            identities,
            values: Values::new(),
            value_hashes: ValueHashes::new(),
        }
    }

    pub fn with_values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    pub fn with_value_hashes(mut self, value_hashes: ValueHashes) -> Self {
        self.value_hashes = value_hashes;
        self
    }

    /// Returns the snapshot plus the raw values hashed for properties that
    /// had no explicit hash.
    pub fn create(&self, entity: &Entity) -> Result<(ValuesHash, Values), PersistenceError> {
        let mut values_hash = ValuesHash::new();
        let mut resolved = Values::new();

        for property in self.model.properties() {
            let name = property.name();
            if let Some(value_hash) = self.value_hashes.get(name) {
                values_hash.put_value_hash(name, value_hash.clone());
                continue;
            }

            let value = match self.values.get(name) {
                Some(value) => value.clone(),
                None => property.read_value(entity),
            };
            values_hash.put_value_hash(name, property.create_value_hash(&value, self.identities)?);
            resolved.insert(name.to_string(), value);
        }

        Ok((values_hash, resolved))
    }
}
