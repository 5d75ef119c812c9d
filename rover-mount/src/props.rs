use crate::error::DecodeError;
use crate::tag::Tag;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Immutable prop bag for one node.
///
/// Changing a prop always produces a new `Props`; equality is by value.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Arc<Map<String, Value>>);

impl Props {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(map) => Ok(Props(Arc::new(map))),
            Value::Null => Ok(Props::empty()),
            other => Err(DecodeError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        T::deserialize(Value::Object((*self.0).clone())).map_err(DecodeError::from)
    }

    /// Decodes typed props, keeping `last_good` when the bag is malformed
    pub fn decode_or<T: DeserializeOwned + Clone>(&self, tag: Option<Tag>, last_good: &T) -> T {
        match self.decode() {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(tag = ?tag, error = %err, "malformed props, keeping last known good");
                last_good.clone()
            }
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Props({})", Value::Object((*self.0).clone()))
    }
}

impl TryFrom<Value> for Props {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Props::from_json(value)
    }
}

/// Opaque per-node state delivered through `UpdateState`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Arc<Value>);

impl State {
    pub fn new(value: Value) -> Self {
        State(Arc::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        visible: bool,
        opacity: f32,
    }

    #[test]
    fn test_props_require_object() {
        assert!(Props::from_json(json!({"a": 1})).is_ok());
        assert!(Props::from_json(Value::Null).unwrap().is_empty());
        match Props::from_json(json!([1, 2])) {
            Err(DecodeError::NotAnObject(kind)) => assert_eq!(kind, "array"),
            other => panic!("Expected NotAnObject, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_or_keeps_last_good() {
        let last = Sample {
            visible: true,
            opacity: 0.5,
        };
        let bad = Props::from_json(json!({"visible": "yes"})).unwrap();
        assert_eq!(bad.decode_or(Some(Tag(1)), &last), last);

        let good = Props::from_json(json!({"visible": false})).unwrap();
        let decoded: Sample = good.decode_or(Some(Tag(1)), &last);
        assert!(!decoded.visible);
        assert_eq!(decoded.opacity, 0.0);
    }
}
