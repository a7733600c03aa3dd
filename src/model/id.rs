use std::borrow::Borrow;
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::ScalarType;
use crate::entity::Value;

/// Canonical string form of a typed identifier, used as the identity-map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdRep(String);

impl IdRep {
    pub fn new(rep: impl Into<String>) -> Self {
        IdRep(rep.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IdRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for IdRep {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdRep {
    fn from(rep: &str) -> Self {
        IdRep::new(rep)
    }
}

impl From<String> for IdRep {
    fn from(rep: String) -> Self {
        IdRep(rep)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdCodecError {
    #[error("identifier value must not be null")]
    NullValue,
    #[error("expected {expected} identifier, got {found} value")]
    TypeMismatch { expected: String, found: String },
    #[error("malformed {expected} identifier representation '{rep}'")]
    MalformedRep { expected: String, rep: String },
    #[error("{0} properties cannot serve as identifier")]
    Unsupported(String),
}

fn mismatch(expected: &ScalarType, value: &Value) -> IdCodecError {
    IdCodecError::TypeMismatch {
        expected: expected.to_string(),
        found: value.kind_name().to_string(),
    }
}

fn malformed(expected: impl fmt::Display, rep: &str) -> IdCodecError {
    IdCodecError::MalformedRep {
        expected: expected.to_string(),
        rep: rep.to_string(),
    }
}

pub(crate) fn scalar_to_rep(scalar: &ScalarType, value: &Value) -> Result<String, IdCodecError> {
    if value.is_null() {
        return Err(IdCodecError::NullValue);
    }

    match (scalar, value) {
        (ScalarType::Int, Value::Int(i)) => Ok(i.to_string()),
        (ScalarType::Text, Value::Text(s)) => Ok(s.clone()),
        (ScalarType::Bool, Value::Bool(b)) => Ok(if *b { "1" } else { "0" }.to_string()),
        (ScalarType::Bytes, Value::Bytes(bytes)) => Ok(STANDARD.encode(bytes)),
        (ScalarType::Float, _) => Err(IdCodecError::Unsupported(scalar.to_string())),
        (ScalarType::Composite(parts), Value::Tuple(values)) if parts.len() == values.len() => {
            let reps = parts
                .iter()
                .zip(values)
                .map(|(part, value)| scalar_to_rep(part, value))
                .collect::<Result<Vec<_>, _>>()?;
            serde_json::to_string(&reps).map_err(|_| mismatch(scalar, value))
        }
        _ => Err(mismatch(scalar, value)),
    }
}

pub(crate) fn rep_to_scalar(scalar: &ScalarType, rep: &str) -> Result<Value, IdCodecError> {
    match scalar {
        ScalarType::Int => rep
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| malformed(scalar, rep)),
        ScalarType::Text => Ok(Value::Text(rep.to_string())),
        ScalarType::Bool => match rep {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            _ => Err(malformed(scalar, rep)),
        },
        ScalarType::Bytes => STANDARD
            .decode(rep)
            .map(Value::Bytes)
            .map_err(|_| malformed(scalar, rep)),
        ScalarType::Float => Err(IdCodecError::Unsupported(scalar.to_string())),
        ScalarType::Composite(parts) => {
            let reps: Vec<String> =
                serde_json::from_str(rep).map_err(|_| malformed(scalar, rep))?;
            if reps.len() != parts.len() {
                return Err(malformed(scalar, rep));
            }
            parts
                .iter()
                .zip(&reps)
                .map(|(part, rep)| rep_to_scalar(part, rep))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple)
        }
    }
}

pub(crate) fn locale_to_rep(value: &Value) -> Result<String, IdCodecError> {
    match value {
        Value::Null => Err(IdCodecError::NullValue),
        Value::Locale(id) if !id.is_empty() => Ok(normalize_locale(id)),
        Value::Locale(id) => Err(malformed("locale", id)),
        other => Err(IdCodecError::TypeMismatch {
            expected: "locale".to_string(),
            found: other.kind_name().to_string(),
        }),
    }
}

pub(crate) fn rep_to_locale(rep: &str) -> Result<Value, IdCodecError> {
    if rep.is_empty() {
        return Err(malformed("locale", rep));
    }
    Ok(Value::Locale(normalize_locale(rep)))
}

fn normalize_locale(id: &str) -> String {
    id.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_rep_is_decimal() {
        assert_eq!(scalar_to_rep(&ScalarType::Int, &Value::Int(-42)).unwrap(), "-42");
        assert_eq!(rep_to_scalar(&ScalarType::Int, "7").unwrap(), Value::Int(7));
        assert!(matches!(
            rep_to_scalar(&ScalarType::Int, "seven"),
            Err(IdCodecError::MalformedRep { .. })
        ));
    }

    #[test]
    fn bytes_rep_is_base64() {
        let value = Value::Bytes(vec![0, 255, 16]);
        let rep = scalar_to_rep(&ScalarType::Bytes, &value).unwrap();
        assert_eq!(rep, "AP8Q");
        assert_eq!(rep_to_scalar(&ScalarType::Bytes, &rep).unwrap(), value);
    }

    #[test]
    fn composite_rep_is_json_array_of_component_reps() {
        let scalar = ScalarType::Composite(vec![ScalarType::Int, ScalarType::Text]);
        let value = Value::Tuple(vec![Value::Int(4), Value::Text("x\"y".into())]);

        let rep = scalar_to_rep(&scalar, &value).unwrap();
        assert_eq!(rep, r#"["4","x\"y"]"#);
        assert_eq!(rep_to_scalar(&scalar, &rep).unwrap(), value);
    }

    #[test]
    fn composite_arity_must_match() {
        let scalar = ScalarType::Composite(vec![ScalarType::Int, ScalarType::Int]);
        assert!(scalar_to_rep(&scalar, &Value::Tuple(vec![Value::Int(1)])).is_err());
        assert!(rep_to_scalar(&scalar, r#"["1"]"#).is_err());
    }

    #[test]
    fn null_has_no_rep() {
        assert_eq!(
            scalar_to_rep(&ScalarType::Int, &Value::Null),
            Err(IdCodecError::NullValue)
        );
        assert_eq!(locale_to_rep(&Value::Null), Err(IdCodecError::NullValue));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let err = scalar_to_rep(&ScalarType::Int, &Value::Text("7".into())).unwrap_err();
        assert_eq!(err.to_string(), "expected int identifier, got text value");
    }

    #[test]
    fn locale_ids_are_normalized() {
        assert_eq!(locale_to_rep(&Value::Locale("de-CH".into())).unwrap(), "de_CH");
        assert_eq!(rep_to_locale("fr-FR").unwrap(), Value::Locale("fr_FR".into()));
    }

    #[test]
    fn float_cannot_be_an_identifier() {
        assert!(matches!(
            scalar_to_rep(&ScalarType::Float, &Value::Float(1.0)),
            Err(IdCodecError::Unsupported(_))
        ));
    }
}
