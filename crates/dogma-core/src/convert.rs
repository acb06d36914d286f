//! Tree converters
//!
//! - [`dogmatize`] pins a whole tree: every mapping key becomes protected and
//!   every list becomes a [`DogmaticList`].
//! - [`undogmatize`] copies a tree back into plain containers.
//! - [`from_json`] / [`to_json`] bridge `serde_json`. `to_json` doubles as
//!   the serializability probe: values it rejects are not configuration.

use std::rc::Rc;

use serde_json::{Map, Number, Value as JsonValue};

use crate::dict::{DictRef, DogmaticDict, FixedMap};
use crate::error::NotSerializable;
use crate::list::DogmaticList;
use crate::value::Value;

/// Default nesting limit for [`to_json`]
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Recursively protect a tree
#[must_use]
pub fn dogmatize(value: &Value) -> Value {
    match value {
        Value::Dict(dict) => {
            let fixed: FixedMap = dict
                .items()
                .into_iter()
                .map(|(k, v)| {
                    let v = dogmatize(&v);
                    (k, v)
                })
                .collect();
            Value::Dict(DictRef::new(DogmaticDict::with_fixed(fixed)))
        }
        Value::List(items) => {
            let items = items.borrow().iter().map(dogmatize).collect();
            Value::FrozenList(Rc::new(DogmaticList::new(items)))
        }
        Value::FrozenList(list) => {
            Value::FrozenList(Rc::new(DogmaticList::new(list.iter().map(dogmatize).collect())))
        }
        Value::Tuple(items) => Value::Tuple(items.iter().map(dogmatize).collect()),
        other => other.clone(),
    }
}

/// Recursively copy a tree into plain containers
///
/// The tree must not contain itself.
#[must_use]
pub fn undogmatize(value: &Value) -> Value {
    match value {
        Value::Dict(dict) => Value::dict(DogmaticDict::from_entries(
            dict.items()
                .into_iter()
                .map(|(k, v)| {
                    let v = undogmatize(&v);
                    (k, v)
                })
                .collect(),
        )),
        Value::List(items) => Value::list(items.borrow().iter().map(undogmatize).collect()),
        Value::FrozenList(list) => Value::list(list.iter().map(undogmatize).collect()),
        Value::Tuple(items) => Value::Tuple(items.iter().map(undogmatize).collect()),
        other => other.clone(),
    }
}

/// Whether walking `value` never re-enters a container already on the path
#[must_use]
pub fn is_acyclic(value: &Value) -> bool {
    fn walk(value: &Value, active: &mut Vec<*const ()>) -> bool {
        let id = value.container_id();
        if let Some(id) = id {
            if active.contains(&id) {
                return false;
            }
            active.push(id);
        }
        let ok = match value {
            Value::Dict(dict) => dict.items().iter().all(|(_, v)| walk(v, active)),
            Value::Tuple(_) | Value::List(_) | Value::FrozenList(_) => value
                .sequence_items()
                .unwrap_or_default()
                .iter()
                .all(|v| walk(v, active)),
            _ => true,
        };
        if id.is_some() {
            active.pop();
        }
        ok
    }
    walk(value, &mut Vec::new())
}

/// Convert JSON into plain runtime values
#[must_use]
pub fn from_json(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Array(items) => Value::list(items.iter().map(from_json).collect()),
        JsonValue::Object(map) => Value::dict(DogmaticDict::from_entries(
            map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect(),
        )),
    }
}

/// Convert a runtime value into JSON with [`DEFAULT_MAX_DEPTH`]
///
/// # Errors
/// Returns [`NotSerializable`] for host objects, non-finite floats,
/// circular containers and over-deep nesting.
pub fn to_json(value: &Value) -> Result<JsonValue, NotSerializable> {
    to_json_with_limit(value, DEFAULT_MAX_DEPTH)
}

/// Convert a runtime value into JSON, refusing nesting beyond `max_depth`
///
/// Dogmatic containers serialize as their plain view.
///
/// # Errors
/// See [`to_json`].
pub fn to_json_with_limit(value: &Value, max_depth: usize) -> Result<JsonValue, NotSerializable> {
    JsonWriter {
        active: Vec::new(),
        max_depth,
    }
    .write(value)
}

struct JsonWriter {
    active: Vec<*const ()>,
    max_depth: usize,
}

impl JsonWriter {
    fn write(&mut self, value: &Value) -> Result<JsonValue, NotSerializable> {
        let id = value.container_id();
        if let Some(id) = id {
            if self.active.contains(&id) {
                return Err(NotSerializable::Circular);
            }
            if self.active.len() >= self.max_depth {
                return Err(NotSerializable::TooDeep(self.max_depth));
            }
            self.active.push(id);
        }
        let result = self.write_inner(value);
        if id.is_some() {
            self.active.pop();
        }
        result
    }

    fn write_inner(&mut self, value: &Value) -> Result<JsonValue, NotSerializable> {
        Ok(match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(x) => Number::from_f64(*x)
                .map(JsonValue::Number)
                .ok_or(NotSerializable::NonFiniteFloat(*x))?,
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Tuple(items) => JsonValue::Array(self.write_all(items)?),
            Value::List(items) => {
                let items = items.borrow().clone();
                JsonValue::Array(self.write_all(&items)?)
            }
            Value::FrozenList(list) => JsonValue::Array(self.write_all(list.as_slice())?),
            Value::Dict(dict) => {
                let mut map = Map::new();
                for (key, item) in dict.items() {
                    let item = self.write(&item)?;
                    map.insert(key, item);
                }
                JsonValue::Object(map)
            }
            Value::Opaque(obj) => return Err(NotSerializable::HostObject(obj.type_name())),
        })
    }

    fn write_all(&mut self, items: &[Value]) -> Result<Vec<JsonValue>, NotSerializable> {
        items.iter().map(|item| self.write(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn dogmatize_protects_every_key() {
        let value = dogmatize(&from_json(&json!({"a": {"b": 1}, "c": [1, 2]})));
        let Value::Dict(dict) = value else {
            panic!("expected dict");
        };
        assert!(dict.borrow().is_fixed("a"));
        assert!(matches!(dict.get("c"), Some(Value::FrozenList(_))));
        let Some(Value::Dict(inner)) = dict.get("a") else {
            panic!("expected nested dict");
        };
        assert!(inner.borrow().is_fixed("b"));
    }

    #[test]
    fn dogmatize_rebuilds_tuples() {
        let value = dogmatize(&Value::tuple(vec![Value::list(vec![Value::Int(1)])]));
        let Value::Tuple(items) = value else {
            panic!("expected tuple");
        };
        assert!(matches!(items[0], Value::FrozenList(_)));
    }

    #[test]
    fn undogmatize_produces_mutable_plain_containers() {
        let frozen = dogmatize(&from_json(&json!({"x": [1, 2, 3]})));
        let plain = undogmatize(&frozen);
        let Value::Dict(dict) = &plain else {
            panic!("expected dict");
        };
        assert!(!dict.borrow().is_fixed("x"));
        assert!(matches!(dict.get("x"), Some(Value::List(_))));
    }

    #[test]
    fn round_trip_preserves_content() {
        let original = json!({"a": {"b": [1, {"c": null}], "d": "e"}, "f": 1.5, "g": true});
        let value = from_json(&original);
        let back = undogmatize(&dogmatize(&value));
        assert_eq!(back, value);
        assert_eq!(to_json(&back).unwrap(), original);
    }

    #[test]
    fn host_objects_are_not_serializable() {
        #[derive(Debug)]
        struct Handle;
        impl crate::value::Opaque for Handle {
            fn type_name(&self) -> &'static str {
                "handle"
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
        let value = Value::list(vec![Value::Opaque(Rc::new(Handle))]);
        assert_eq!(to_json(&value), Err(NotSerializable::HostObject("handle")));
    }

    #[test]
    fn nan_is_not_serializable() {
        assert!(matches!(
            to_json(&Value::Float(f64::NAN)),
            Err(NotSerializable::NonFiniteFloat(_))
        ));
    }

    #[test]
    fn circular_list_is_detected() {
        let list = Value::list(vec![]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert!(!is_acyclic(&list));
        assert_eq!(to_json(&list), Err(NotSerializable::Circular));
    }

    #[test]
    fn shared_but_acyclic_containers_are_fine() {
        let shared = Value::list(vec![Value::Int(1)]);
        let outer = Value::list(vec![shared.clone(), shared]);
        assert!(is_acyclic(&outer));
        assert_eq!(to_json(&outer).unwrap(), json!([[1], [1]]));
    }

    #[test]
    fn depth_limit_applies() {
        let value = from_json(&json!([[[1]]]));
        assert_eq!(to_json_with_limit(&value, 2), Err(NotSerializable::TooDeep(2)));
        assert!(to_json_with_limit(&value, 3).is_ok());
    }
}
