//! Serialization helpers for the JSON-based wire format.
//!
//! Binary fields travel as base64 strings; every model field accessor has a
//! lenient variant that maps missing or mismatched data to `None` so a
//! partial or migrated record never crashes the caller.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from decoding wire-format data.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Unexpected type for field: {0}")]
    UnexpectedType(String),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_vec_base64<S: Serializer>(bytes: &Vec<u8>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD.encode(bytes))
}

pub fn deserialize_vec_base64<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(d)?;
    STANDARD.decode(&s).map_err(serde::de::Error::custom)
}

pub fn serialize_vec_optional_base64<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(value) => s.serialize_some(&STANDARD.encode(value)),
        None => s.serialize_none(),
    }
}

pub fn deserialize_vec_optional_base64<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<u8>>, D::Error> {
    let s: Option<String> = Option::deserialize(d)?;
    s.map(|s| STANDARD.decode(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn serialize_array_base64<S, const N: usize>(
    bytes: &[u8; N],
    s: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&STANDARD.encode(bytes))
}

pub fn deserialize_array_base64<'de, D, const N: usize>(d: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    let decoded = STANDARD.decode(&s).map_err(serde::de::Error::custom)?;
    decoded.try_into().map_err(|v: Vec<u8>| {
        serde::de::Error::custom(format!("expected {} bytes, got {}", N, v.len()))
    })
}

/// Decode a JSON value into `T`, surfacing the decode error.
pub fn deserialize_value<T: DeserializeOwned>(value: &Value) -> Result<T, CodecError> {
    T::deserialize(value).map_err(CodecError::Json)
}

/// Decode a JSON value into `T`, or `None` if it does not fit.
pub fn deserialize_value_or_none<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

/// Typed accessors over a parsed JSON object.
///
/// The `*_or_none` accessors never fail: a missing key, a type mismatch, or
/// corrupt base64 all read as "no value". The `require_*` accessors are for
/// fields the schema guarantees and fail loudly with a [`CodecError`].
pub trait JsonObjectExt {
    fn get_str_or_none(&self, key: &str) -> Option<&str>;
    fn get_i64_or_none(&self, key: &str) -> Option<i64>;
    fn get_bool_or_none(&self, key: &str) -> Option<bool>;
    fn get_bytes_or_none(&self, key: &str) -> Option<Vec<u8>>;
    fn get_object_or_none(&self, key: &str) -> Option<&Map<String, Value>>;

    fn require_str(&self, key: &str) -> Result<&str, CodecError>;
    fn require_i64(&self, key: &str) -> Result<i64, CodecError>;
    fn require_bool(&self, key: &str) -> Result<bool, CodecError>;
    fn require_bytes(&self, key: &str) -> Result<Vec<u8>, CodecError>;

    fn put_str(&mut self, key: &str, value: &str);
    fn put_i64(&mut self, key: &str, value: i64);
    fn put_bool(&mut self, key: &str, value: bool);
    fn put_bytes(&mut self, key: &str, value: &[u8]);
    fn put_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CodecError>;
}

impl JsonObjectExt for Map<String, Value> {
    fn get_str_or_none(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_i64_or_none(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    fn get_bool_or_none(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn get_bytes_or_none(&self, key: &str) -> Option<Vec<u8>> {
        self.get_str_or_none(key)
            .and_then(|s| STANDARD.decode(s).ok())
    }

    fn get_object_or_none(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    fn require_str(&self, key: &str) -> Result<&str, CodecError> {
        let value = self
            .get(key)
            .ok_or_else(|| CodecError::MissingField(key.to_string()))?;
        value
            .as_str()
            .ok_or_else(|| CodecError::UnexpectedType(key.to_string()))
    }

    fn require_i64(&self, key: &str) -> Result<i64, CodecError> {
        let value = self
            .get(key)
            .ok_or_else(|| CodecError::MissingField(key.to_string()))?;
        value
            .as_i64()
            .ok_or_else(|| CodecError::UnexpectedType(key.to_string()))
    }

    fn require_bool(&self, key: &str) -> Result<bool, CodecError> {
        let value = self
            .get(key)
            .ok_or_else(|| CodecError::MissingField(key.to_string()))?;
        value
            .as_bool()
            .ok_or_else(|| CodecError::UnexpectedType(key.to_string()))
    }

    fn require_bytes(&self, key: &str) -> Result<Vec<u8>, CodecError> {
        let s = self.require_str(key)?;
        Ok(STANDARD.decode(s)?)
    }

    fn put_str(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), Value::String(value.to_string()));
    }

    fn put_i64(&mut self, key: &str, value: i64) {
        self.insert(key.to_string(), Value::from(value));
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.insert(key.to_string(), Value::Bool(value));
    }

    fn put_bytes(&mut self, key: &str, value: &[u8]) {
        self.insert(key.to_string(), Value::String(STANDARD.encode(value)));
    }

    fn put_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CodecError> {
        self.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn lenient_accessors_on_missing_fields() {
        let obj = object(r#"{}"#);

        assert_eq!(obj.get_str_or_none("name"), None);
        assert_eq!(obj.get_i64_or_none("count"), None);
        assert_eq!(obj.get_bool_or_none("flag"), None);
        assert_eq!(obj.get_bytes_or_none("blob"), None);
        assert!(obj.get_object_or_none("nested").is_none());
    }

    #[test]
    fn lenient_accessors_on_mismatched_types() {
        let obj = object(r#"{"name": 42, "count": "not a number", "flag": "yes"}"#);

        assert_eq!(obj.get_str_or_none("name"), None);
        assert_eq!(obj.get_i64_or_none("count"), None);
        assert_eq!(obj.get_bool_or_none("flag"), None);
    }

    #[test]
    fn lenient_bytes_on_corrupt_base64() {
        let obj = object(r#"{"blob": "not!base64!!"}"#);
        assert_eq!(obj.get_bytes_or_none("blob"), None);
    }

    #[test]
    fn strict_accessors_read_valid_fields() {
        let obj = object(r#"{"name": "alice", "count": 3, "flag": true, "blob": "AQID"}"#);

        assert_eq!(obj.require_str("name").unwrap(), "alice");
        assert_eq!(obj.require_i64("count").unwrap(), 3);
        assert!(obj.require_bool("flag").unwrap());
        assert_eq!(obj.require_bytes("blob").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn strict_accessors_fail_loudly() {
        let obj = object(r#"{"count": "three", "blob": "???"}"#);

        assert!(matches!(
            obj.require_str("name"),
            Err(CodecError::MissingField(_))
        ));
        assert!(matches!(
            obj.require_i64("count"),
            Err(CodecError::UnexpectedType(_))
        ));
        assert!(matches!(
            obj.require_bytes("blob"),
            Err(CodecError::Base64(_))
        ));
    }

    #[test]
    fn put_accessors_roundtrip() {
        let mut obj = Map::new();
        obj.put_str("name", "bob");
        obj.put_i64("count", 7);
        obj.put_bool("flag", false);
        obj.put_bytes("blob", &[1, 2, 3]);

        assert_eq!(obj.require_str("name").unwrap(), "bob");
        assert_eq!(obj.require_i64("count").unwrap(), 7);
        assert!(!obj.require_bool("flag").unwrap());
        assert_eq!(obj.require_bytes("blob").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn nested_deserialize_or_none() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Inner {
            value: i64,
        }

        let obj = object(r#"{"good": {"value": 1}, "bad": {"value": "x"}}"#);

        let good: Option<Inner> = deserialize_value_or_none(obj.get("good").unwrap());
        assert_eq!(good, Some(Inner { value: 1 }));

        let bad: Option<Inner> = deserialize_value_or_none(obj.get("bad").unwrap());
        assert_eq!(bad, None);

        let strict: Result<Inner, _> = deserialize_value(obj.get("bad").unwrap());
        assert!(strict.is_err());
    }

    #[test]
    fn optional_base64_vec_roundtrip() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Helper {
            #[serde(
                default,
                serialize_with = "serialize_vec_optional_base64",
                deserialize_with = "deserialize_vec_optional_base64"
            )]
            value: Option<Vec<u8>>,
        }

        let with_value: Helper = serde_json::from_str(r#"{"value": "AQID"}"#).unwrap();
        assert_eq!(with_value.value, Some(vec![1, 2, 3]));

        let with_null: Helper = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(with_null.value, None);

        let missing: Helper = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.value, None);

        let serialized = serde_json::to_string(&Helper {
            value: Some(vec![1, 2, 3]),
        })
        .unwrap();
        assert_eq!(serialized, r#"{"value":"AQID"}"#);
    }

    #[test]
    fn array_base64_rejects_wrong_length() {
        #[derive(Deserialize, Debug)]
        struct Helper {
            #[serde(deserialize_with = "deserialize_array_base64::<_, 4>")]
            #[allow(dead_code)]
            value: [u8; 4],
        }

        // "AQID" decodes to 3 bytes, not 4
        let result: Result<Helper, _> = serde_json::from_str(r#"{"value": "AQID"}"#);
        assert!(result.is_err());
    }
}
