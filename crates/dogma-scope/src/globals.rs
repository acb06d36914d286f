//! Injected global bindings
//!
//! A block sees only what the caller hands it here, plus builtins. Data
//! values are deep-copied for every evaluation, so one evaluation cannot
//! leak mutations into the next.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use dogma_core::{from_json, undogmatize, Value};

use crate::error::EvalError;
use crate::function::NativeFunction;

/// Global bindings available to a block
#[derive(Debug, Clone, Default)]
pub struct Globals {
    bindings: IndexMap<String, Value>,
}

impl Globals {
    /// Create empty globals
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a data value
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: &JsonValue) -> Self {
        self.insert_value(name, value);
        self
    }

    /// With a native function
    #[must_use]
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.insert_function(name, func);
        self
    }

    /// Bind a data value
    pub fn insert_value(&mut self, name: impl Into<String>, value: &JsonValue) {
        self.bindings.insert(name.into(), from_json(value));
    }

    /// Bind a native function
    pub fn insert_function(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) {
        let name = name.into();
        let function = NativeFunction::new(name.clone(), func);
        self.bindings.insert(name, Value::Opaque(Rc::new(function)));
    }

    /// Binding for `name`
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Whether `name` is bound
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bound names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Number of bindings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no bindings
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Fresh copy for one evaluation
    pub(crate) fn snapshot(&self) -> IndexMap<String, Value> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.clone(), undogmatize(value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_binds_values_and_functions() {
        let globals = Globals::new()
            .with_value("base", &json!({"lr": 0.1}))
            .with_function("noop", |_| Ok(Value::Null));
        assert_eq!(globals.len(), 2);
        assert!(globals.contains("base"));
        assert_eq!(globals.names().collect::<Vec<_>>(), vec!["base", "noop"]);
        assert_eq!(globals.get("noop").map(Value::type_name), Some("builtin_function"));
    }

    #[test]
    fn snapshots_do_not_share_containers() {
        let globals = Globals::new().with_value("xs", &json!([1, 2]));
        let first = globals.snapshot();
        if let Some(Value::List(items)) = first.get("xs") {
            items.borrow_mut().push(Value::Int(3));
        }
        let second = globals.snapshot();
        assert_eq!(second.get("xs"), Some(&Value::list(vec![Value::Int(1), Value::Int(2)])));
    }
}
