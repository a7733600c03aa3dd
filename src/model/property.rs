use std::fmt;

use super::id::{locale_to_rep, rep_to_locale, rep_to_scalar, scalar_to_rep};
use super::{IdCodecError, IdRep};
use crate::entity::{Entity, Value};
use crate::error::PersistenceError;
use crate::operation::{CascadeError, CascadeOperation, CascadeType, CascadeTypes};
use crate::store::{IdentityLookup, ValueHash};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Composite(Vec<ScalarType>),
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("bool"),
            ScalarType::Int => f.write_str("int"),
            ScalarType::Float => f.write_str("float"),
            ScalarType::Text => f.write_str("text"),
            ScalarType::Bytes => f.write_str("bytes"),
            ScalarType::Composite(parts) => {
                f.write_str("composite(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Target and cascade behaviour of an association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    target: String,
    cascade: CascadeTypes,
}

impl RelationDef {
    pub fn new(target: impl Into<String>) -> Self {
        RelationDef {
            target: target.into(),
            cascade: CascadeTypes::NONE,
        }
    }

    pub fn cascade(mut self, cascade: impl Into<CascadeTypes>) -> Self {
        self.cascade = cascade.into();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cascade_types(&self) -> CascadeTypes {
        self.cascade
    }
}

/// What a property kind is able to take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub hashable: bool,
    pub cascadable: bool,
    pub selectable: bool,
    pub identifiable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    Locale,
    Lob,
    ToOne(RelationDef),
    ToMany(RelationDef),
}

impl PropertyKind {
    pub fn int() -> Self {
        PropertyKind::Scalar(ScalarType::Int)
    }

    pub fn text() -> Self {
        PropertyKind::Scalar(ScalarType::Text)
    }

    pub fn to_one(relation: RelationDef) -> Self {
        PropertyKind::ToOne(relation)
    }

    pub fn to_many(relation: RelationDef) -> Self {
        PropertyKind::ToMany(relation)
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            PropertyKind::Scalar(scalar) => Capabilities {
                hashable: true,
                cascadable: false,
                selectable: true,
                identifiable: !matches!(scalar, ScalarType::Float),
            },
            PropertyKind::Locale => Capabilities {
                hashable: true,
                cascadable: false,
                selectable: true,
                identifiable: true,
            },
            PropertyKind::Lob => Capabilities {
                hashable: true,
                cascadable: false,
                selectable: true,
                identifiable: false,
            },
            PropertyKind::ToOne(_) => Capabilities {
                hashable: true,
                cascadable: true,
                selectable: true,
                identifiable: false,
            },
            PropertyKind::ToMany(_) => Capabilities {
                hashable: true,
                cascadable: true,
                selectable: false,
                identifiable: false,
            },
        }
    }

    pub fn relation(&self) -> Option<&RelationDef> {
        match self {
            PropertyKind::ToOne(relation) | PropertyKind::ToMany(relation) => Some(relation),
            _ => None,
        }
    }

    fn name(&self) -> String {
        match self {
            PropertyKind::Scalar(scalar) => scalar.to_string(),
            PropertyKind::Locale => "locale".to_string(),
            PropertyKind::Lob => "lob".to_string(),
            PropertyKind::ToOne(_) => "to-one".to_string(),
            PropertyKind::ToMany(_) => "to-many".to_string(),
        }
    }
}

/// A mapped property: accessor, hashing strategy and cascade behaviour in one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProperty {
    name: String,
    declaring_class: String,
    kind: PropertyKind,
}

impl EntityProperty {
    pub(crate) fn new(
        name: impl Into<String>,
        declaring_class: impl Into<String>,
        kind: PropertyKind,
    ) -> Self {
        EntityProperty {
            name: name.into(),
            declaring_class: declaring_class.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// `Class::property`, as used in error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring_class, self.name)
    }

    pub fn read_value(&self, entity: &Entity) -> Value {
        entity.get(&self.name).clone()
    }

    pub fn write_value(&self, entity: &mut Entity, value: Value) {
        entity.set(self.name.clone(), value);
    }

    pub fn value_to_rep(&self, value: &Value) -> Result<IdRep, IdCodecError> {
        match &self.kind {
            PropertyKind::Scalar(scalar) => scalar_to_rep(scalar, value).map(IdRep::from),
            PropertyKind::Locale => locale_to_rep(value).map(IdRep::from),
            other => Err(IdCodecError::Unsupported(other.name())),
        }
    }

    pub fn rep_to_value(&self, rep: &IdRep) -> Result<Value, IdCodecError> {
        match &self.kind {
            PropertyKind::Scalar(scalar) => rep_to_scalar(scalar, rep.as_str()),
            PropertyKind::Locale => rep_to_locale(rep.as_str()),
            other => Err(IdCodecError::Unsupported(other.name())),
        }
    }

    pub fn create_value_hash(
        &self,
        value: &Value,
        identities: &dyn IdentityLookup,
    ) -> Result<ValueHash, PersistenceError> {
        ValueHash::create(&self.kind, value, identities)
    }

    /// Hand every entity `value` references to `operation`, if this relation
    /// cascades `cascade_type`. Non-relation properties never cascade.
    pub fn cascade(
        &self,
        value: &Value,
        cascade_type: CascadeType,
        operation: &mut dyn CascadeOperation,
    ) -> Result<(), CascadeError> {
        let Some(relation) = self.kind.relation() else {
            return Ok(());
        };
        if !relation.cascade_types().contains(cascade_type) {
            return Ok(());
        }

        for entity in value.referenced_entities() {
            operation.cascade(entity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityHandle;

    #[test]
    fn capability_table() {
        assert!(!PropertyKind::int().capabilities().cascadable);
        assert!(PropertyKind::int().capabilities().identifiable);
        assert!(!PropertyKind::Scalar(ScalarType::Float).capabilities().identifiable);
        assert!(!PropertyKind::Lob.capabilities().identifiable);

        let to_many = PropertyKind::to_many(RelationDef::new("Comment"));
        assert!(to_many.capabilities().cascadable);
        assert!(!to_many.capabilities().selectable);
    }

    #[test]
    fn accessor_reads_and_writes_named_field() {
        let property = EntityProperty::new("title", "Article", PropertyKind::text());
        let mut entity = Entity::new("Article");

        assert_eq!(property.read_value(&entity), Value::Null);
        property.write_value(&mut entity, Value::from("Hello"));
        assert_eq!(property.read_value(&entity), Value::from("Hello"));
    }

    #[test]
    fn relations_are_not_identifiers() {
        let property = EntityProperty::new(
            "author",
            "Article",
            PropertyKind::to_one(RelationDef::new("User")),
        );
        assert_eq!(
            property.value_to_rep(&Value::Ref(EntityHandle::new(1))),
            Err(IdCodecError::Unsupported("to-one".into()))
        );
    }

    #[test]
    fn cascade_only_for_configured_types() {
        let a = EntityHandle::new(1);
        let b = EntityHandle::new(2);
        let property = EntityProperty::new(
            "comments",
            "Article",
            PropertyKind::to_many(RelationDef::new("Comment").cascade(CascadeType::Persist)),
        );

        let mut reached = Vec::new();
        let mut collect = |entity: EntityHandle| {
            reached.push(entity);
            Ok::<(), CascadeError>(())
        };
        property
            .cascade(&Value::Refs(vec![a, b]), CascadeType::Remove, &mut collect)
            .unwrap();
        property
            .cascade(&Value::Refs(vec![a, b]), CascadeType::Persist, &mut collect)
            .unwrap();

        assert_eq!(reached, vec![a, b]);
    }

    #[test]
    fn qualified_name_uses_declaring_class() {
        let property = EntityProperty::new("name", "Animal", PropertyKind::text());
        assert_eq!(property.qualified_name(), "Animal::name");
    }

    #[test]
    fn composite_type_display() {
        let scalar = ScalarType::Composite(vec![ScalarType::Int, ScalarType::Text]);
        assert_eq!(scalar.to_string(), "composite(int, text)");
    }
}
