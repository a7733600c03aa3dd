use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EntityHandle;

/// Named property values, as exchanged with the session when mapping rows.
pub type Values = BTreeMap<String, Value>;

/// A managed large object: original file name plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lob {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Lob {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Lob {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Locale id such as `de_CH`.
    Locale(String),
    Lob(Lob),
    /// Components of a composite identifier.
    Tuple(Vec<Value>),
    /// To-one association.
    Ref(EntityHandle),
    /// To-many association, in collection order.
    Refs(Vec<EntityHandle>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Locale(_) => "locale",
            Value::Lob(_) => "lob",
            Value::Tuple(_) => "tuple",
            Value::Ref(_) => "ref",
            Value::Refs(_) => "refs",
        }
    }

    /// Entities this value points at, empty for non-association values.
    pub fn referenced_entities(&self) -> Vec<EntityHandle> {
        match self {
            Value::Ref(handle) => vec![*handle],
            Value::Refs(handles) => handles.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Lob> for Value {
    fn from(value: Lob) -> Self {
        Value::Lob(value)
    }
}

impl From<EntityHandle> for Value {
    fn from(value: EntityHandle) -> Self {
        Value::Ref(value)
    }
}

impl From<Option<EntityHandle>> for Value {
    fn from(value: Option<EntityHandle>) -> Self {
        value.map(Value::Ref).unwrap_or(Value::Null)
    }
}

impl From<Vec<EntityHandle>> for Value {
    fn from(value: Vec<EntityHandle>) -> Self {
        Value::Refs(value)
    }
}
