//! Evaluated configuration
//!
//! A [`Configuration`] is the plain JSON object a scope hands to the outside
//! world. It is immutable once produced; the next evaluation replaces it.
//! The same type doubles as a loader for fixed and preset documents written
//! in JSON or YAML.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use dogma_core::DottedPath;

use crate::error::ScopeError;
use crate::fingerprint::{canonical_json, Fingerprint};

/// Top-level configuration entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: Map<String, JsonValue>,
}

impl Configuration {
    /// Empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidDocument`] if the text is not valid JSON
    /// or its root is not an object.
    pub fn from_json_str(text: &str) -> Result<Self, ScopeError> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| ScopeError::InvalidDocument(e.to_string()))?;
        Self::try_from(value)
    }

    /// Parse a YAML mapping
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidDocument`] if the text is not valid YAML
    /// or its root is not a mapping.
    pub fn from_yaml_str(text: &str) -> Result<Self, ScopeError> {
        let value: JsonValue =
            serde_yaml::from_str(text).map_err(|e| ScopeError::InvalidDocument(e.to_string()))?;
        Self::try_from(value)
    }

    /// Top-level value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Value at a dotted path, descending through objects
    #[must_use]
    pub fn lookup(&self, path: &DottedPath) -> Option<&JsonValue> {
        let mut segments = path.iter();
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// [`lookup`](Self::lookup) with a path written as `a.b.c`
    #[must_use]
    pub fn lookup_str(&self, path: &str) -> Option<&JsonValue> {
        self.lookup(&path.parse().ok()?)
    }

    /// Whether `key` is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.values
    }

    /// Copy as a JSON object value
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.values.clone())
    }

    /// Take the underlying map
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Map<String, JsonValue> {
        self.values
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidDocument`] if serialization fails
    pub fn to_json_string(&self) -> Result<String, ScopeError> {
        serde_json::to_string_pretty(&self.values)
            .map_err(|e| ScopeError::InvalidDocument(e.to_string()))
    }

    /// YAML document
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidDocument`] if serialization fails
    pub fn to_yaml_string(&self) -> Result<String, ScopeError> {
        serde_yaml::to_string(&self.values).map_err(|e| ScopeError::InvalidDocument(e.to_string()))
    }

    /// Compact JSON with sorted keys; the input of [`fingerprint`](Self::fingerprint)
    #[must_use]
    pub fn to_canonical_json(&self) -> String {
        canonical_json(&self.to_value())
    }

    /// Convert into a typed struct
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidDocument`] if the entries do not match `T`
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, ScopeError> {
        serde_json::from_value(self.to_value()).map_err(|e| ScopeError::InvalidDocument(e.to_string()))
    }

    /// Content fingerprint
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.to_canonical_json().as_bytes())
    }
}

impl From<Map<String, JsonValue>> for Configuration {
    fn from(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }
}

impl TryFrom<JsonValue> for Configuration {
    type Error = ScopeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(values) => Ok(Self { values }),
            other => Err(ScopeError::InvalidDocument(format!(
                "expected a mapping at the document root, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

impl From<Configuration> for JsonValue {
    fn from(config: Configuration) -> Self {
        JsonValue::Object(config.values)
    }
}

impl<'a> IntoIterator for &'a Configuration {
    type Item = (&'a String, &'a JsonValue);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// JSON type name for messages
pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
