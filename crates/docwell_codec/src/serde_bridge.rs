//! Bridge between serde types and [`Value`].
//!
//! Rust types are serialized into an intermediate `ciborium::Value` and then
//! converted into the document value model. The conversion enforces the same
//! restrictions as [`Value`] itself: no floats, no tags, text map keys only,
//! and integers within the `i64` range.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use ciborium::value::{Integer, Value as CborValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Serializes any serde type into a [`Value`].
///
/// # Errors
///
/// Returns an error if the type contains floats, non-text map keys or
/// integers that do not fit in an `i64`.
pub fn to_value<T: Serialize + ?Sized>(input: &T) -> CodecResult<Value> {
    let cbor = CborValue::serialized(input)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    from_cbor_value(cbor)
}

/// Deserializes a serde type out of a [`Value`].
///
/// # Errors
///
/// Returns an error if the value does not match the shape of `T`.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> CodecResult<T> {
    to_cbor_value(value)
        .deserialized()
        .map_err(|e| CodecError::decoding_failed(e.to_string()))
}

fn from_cbor_value(cbor: CborValue) -> CodecResult<Value> {
    match cbor {
        CborValue::Null => Ok(Value::Null),
        CborValue::Bool(b) => Ok(Value::Bool(b)),
        CborValue::Integer(n) => {
            let wide = i128::from(n);
            i64::try_from(wide)
                .map(Value::Integer)
                .map_err(|_| CodecError::IntegerOverflow)
        }
        CborValue::Float(f) if f.is_nan() => Err(CodecError::NaNForbidden),
        CborValue::Float(_) => Err(CodecError::FloatForbidden),
        CborValue::Text(s) => Ok(Value::Text(s)),
        CborValue::Bytes(b) => Ok(Value::Bytes(b)),
        CborValue::Array(items) => items
            .into_iter()
            .map(from_cbor_value)
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array),
        CborValue::Map(pairs) => {
            let mut map = BTreeMap::new();
            for (key, value) in pairs {
                let key = match key {
                    CborValue::Text(k) => k,
                    other => {
                        return Err(CodecError::invalid_structure(format!(
                            "map keys must be text, found {other:?}"
                        )))
                    }
                };
                map.insert(key, from_cbor_value(value)?);
            }
            Ok(Value::Map(map))
        }
        CborValue::Tag(tag, _) => Err(CodecError::unsupported_type(format!("tag {tag}"))),
        other => Err(CodecError::unsupported_type(format!("{other:?}"))),
    }
}

fn to_cbor_value(value: &Value) -> CborValue {
    match value {
        Value::Null => CborValue::Null,
        Value::Bool(b) => CborValue::Bool(*b),
        Value::Integer(n) => CborValue::Integer(Integer::from(*n)),
        Value::Text(s) => CborValue::Text(s.clone()),
        Value::Bytes(b) => CborValue::Bytes(b.clone()),
        Value::Array(items) => CborValue::Array(items.iter().map(to_cbor_value).collect()),
        Value::Map(entries) => CborValue::Map(
            entries
                .iter()
                .map(|(k, v)| (CborValue::Text(k.clone()), to_cbor_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Employee {
        name: String,
        age: u32,
        tags: Vec<String>,
        manager: Option<String>,
    }

    #[test]
    fn struct_becomes_map() {
        let employee = Employee {
            name: "Ada".into(),
            age: 36,
            tags: vec!["eng".into()],
            manager: None,
        };

        let value = to_value(&employee).unwrap();
        assert_eq!(value.get("name"), Some(&Value::Text("Ada".into())));
        assert_eq!(value.get("age"), Some(&Value::Integer(36)));
        assert_eq!(value.get("manager"), Some(&Value::Null));

        let back: Employee = from_value(&value).unwrap();
        assert_eq!(back, employee);
    }

    #[test]
    fn floats_are_rejected() {
        assert_eq!(to_value(&1.5f64), Err(CodecError::FloatForbidden));
        assert_eq!(to_value(&f64::NAN), Err(CodecError::NaNForbidden));
    }

    #[test]
    fn oversized_integer_is_rejected() {
        assert_eq!(to_value(&u64::MAX), Err(CodecError::IntegerOverflow));
    }

    #[test]
    fn non_text_map_keys_are_rejected() {
        let mut map = std::collections::HashMap::new();
        map.insert(1u8, "one");
        assert!(matches!(
            to_value(&map),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn shape_mismatch_fails_to_decode() {
        let value = Value::map(vec![("name", Value::Integer(3))]);
        let result: CodecResult<Employee> = from_value(&value);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }
}
