//! Configuration scope
//!
//! A [`ConfigScope`] owns one parsed block and evaluates it against a fixed
//! baseline and a preset:
//! - Fixed keys cannot be changed by the block, only extended
//! - Preset keys are ordinary defaults the block may override
//! - Fixed keys the block never mentions are revealed and reported
//! - Private and non-serializable bindings are filtered out of the result

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use dogma_core::{
    dogmatize, from_json, to_json_with_limit, DictRef, DogmaticDict, TypeChange, Value,
};
use dogma_lang::{parse_block, Block};

use crate::configuration::{json_type_name, Configuration};
use crate::error::ScopeError;
use crate::globals::Globals;
use crate::interp::Interpreter;
use crate::options::ScopeOptions;

/// Results of the last successful evaluation
#[derive(Debug, Clone)]
struct Evaluation {
    config: Configuration,
    added_values: BTreeSet<String>,
    typechanges: BTreeMap<String, TypeChange>,
}

/// A configuration block and the result of its last evaluation
///
/// Not thread-safe; evaluation mutates the scope.
#[derive(Debug)]
pub struct ConfigScope {
    block: Block,
    globals: Globals,
    options: ScopeOptions,
    state: Option<Evaluation>,
}

impl ConfigScope {
    /// Wrap a parsed block
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidSignature`] if the block header declares
    /// any parameter, `*args` or `**kwargs`.
    pub fn new(block: Block) -> Result<Self, ScopeError> {
        if !block.signature.is_zero_argument() {
            return Err(ScopeError::InvalidSignature(block.signature.describe()));
        }
        Ok(Self {
            block,
            globals: Globals::new(),
            options: ScopeOptions::default(),
            state: None,
        })
    }

    /// Parse and wrap block source
    ///
    /// # Errors
    /// Returns [`ScopeError::Parse`] or [`ScopeError::InvalidSignature`]
    pub fn from_source(source: &str) -> Result<Self, ScopeError> {
        Self::new(parse_block(source)?)
    }

    /// With injected globals
    #[inline]
    #[must_use]
    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    /// With options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: ScopeOptions) -> Self {
        self.options = options;
        self
    }

    /// Name from the block's `def` header
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.block.name.as_deref()
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ScopeOptions {
        &self.options
    }

    /// Injected globals
    #[inline]
    #[must_use]
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Whether the last evaluation succeeded
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Evaluate the block against `fixed` and `preset`
    ///
    /// Both trees must be JSON objects when given. Any previous result is
    /// discarded first, so a failed evaluation leaves the scope
    /// uninitialized.
    ///
    /// # Errors
    /// - [`ScopeError::InvalidBaseline`] if `fixed` or `preset` is not an object
    /// - [`ScopeError::Eval`] if the block raises
    pub fn evaluate(
        &mut self,
        fixed: Option<&JsonValue>,
        preset: Option<&JsonValue>,
    ) -> Result<&Configuration, ScopeError> {
        self.state = None;
        let fixed = as_mapping(fixed, "fixed")?;
        let preset = as_mapping(preset, "preset")?;

        let env = hybrid_environment(fixed);
        if let Some(preset) = preset {
            env.update(preset.iter().map(|(k, v)| (k.clone(), from_json(v))));
        }

        Interpreter::new(env.clone(), self.globals.snapshot(), &self.options).run(&self.block)?;

        let added_values = env.revelation();
        for path in &added_values {
            tracing::debug!("Revealed fixed key: {}", path);
        }
        let typechanges = env.collected_typechanges();
        for (path, change) in &typechanges {
            tracing::debug!("Type change at {}: {}", path, change);
        }

        let config = self.filter(&env);
        tracing::info!(
            "Evaluated {}: {} entries, {} added, {} type changes",
            self.name().unwrap_or("<block>"),
            config.len(),
            added_values.len(),
            typechanges.len()
        );

        let state = self.state.insert(Evaluation {
            config,
            added_values,
            typechanges,
        });
        Ok(&state.config)
    }

    /// Keep public bindings that serialize
    fn filter(&self, env: &DictRef) -> Configuration {
        let mut values = Map::new();
        for (key, value) in env.items() {
            if self.options.is_private(&key) {
                tracing::debug!("Skipping private binding: {}", key);
                continue;
            }
            match to_json_with_limit(&value, self.options.max_nesting_depth) {
                Ok(json) => {
                    values.insert(key, json);
                }
                Err(e) => tracing::debug!("Dropping binding {}: {}", key, e),
            }
        }
        Configuration::from(values)
    }

    fn evaluation(&self) -> Result<&Evaluation, ScopeError> {
        self.state.as_ref().ok_or(ScopeError::NotEvaluated)
    }

    /// Configuration of the last evaluation
    ///
    /// # Errors
    /// Returns [`ScopeError::NotEvaluated`] before a successful evaluation
    #[inline]
    pub fn config(&self) -> Result<&Configuration, ScopeError> {
        self.evaluation().map(|e| &e.config)
    }

    /// One top-level entry
    ///
    /// # Errors
    /// Returns [`ScopeError::NotEvaluated`] before a successful evaluation
    /// and [`ScopeError::NotFound`] for a missing key
    pub fn get(&self, key: &str) -> Result<&JsonValue, ScopeError> {
        self.config()?
            .get(key)
            .ok_or_else(|| ScopeError::NotFound(key.to_string()))
    }

    /// Dotted paths of fixed keys the block never set
    ///
    /// # Errors
    /// Returns [`ScopeError::NotEvaluated`] before a successful evaluation
    #[inline]
    pub fn added_values(&self) -> Result<&BTreeSet<String>, ScopeError> {
        self.evaluation().map(|e| &e.added_values)
    }

    /// Attempted type changes on fixed keys, by dotted path
    ///
    /// # Errors
    /// Returns [`ScopeError::NotEvaluated`] before a successful evaluation
    #[inline]
    pub fn typechanges(&self) -> Result<&BTreeMap<String, TypeChange>, ScopeError> {
        self.evaluation().map(|e| &e.typechanges)
    }
}

fn as_mapping<'a>(
    tree: Option<&'a JsonValue>,
    which: &'static str,
) -> Result<Option<&'a Map<String, JsonValue>>, ScopeError> {
    match tree {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ScopeError::InvalidBaseline {
            which,
            found: json_type_name(other),
        }),
    }
}

/// Namespace whose fixed keys are the dogmatized baseline
fn hybrid_environment(fixed: Option<&Map<String, JsonValue>>) -> DictRef {
    let fixed: IndexMap<String, Value> = fixed
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), dogmatize(&from_json(v))))
        .collect();
    DictRef::new(DogmaticDict::with_fixed(Rc::new(fixed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parameters_are_rejected() {
        let err = ConfigScope::from_source("def cfg(a, b=1):\n    x = a\n").unwrap_err();
        assert!(matches!(err, ScopeError::InvalidSignature(ref s) if s.contains('a')));
        assert!(matches!(
            ConfigScope::from_source("def cfg(*rest):\n    pass\n"),
            Err(ScopeError::InvalidSignature(_))
        ));
        assert!(matches!(ConfigScope::from_source("x = = 1"), Err(ScopeError::Parse(_))));
    }

    #[test]
    fn baselines_must_be_mappings() {
        let mut scope = ConfigScope::from_source("x = 1").unwrap();
        let err = scope.evaluate(Some(&json!([1])), None).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::InvalidBaseline {
                which: "fixed",
                found: "array"
            }
        ));
        assert!(scope.evaluate(None, Some(&json!("x"))).is_err());
        assert!(scope.evaluate(Some(&JsonValue::Null), None).is_ok());
    }

    #[test]
    fn reads_require_evaluation() {
        let scope = ConfigScope::from_source("def cfg():\n    x = 1\n").unwrap();
        assert_eq!(scope.name(), Some("cfg"));
        assert!(!scope.is_initialized());
        assert!(matches!(scope.config(), Err(ScopeError::NotEvaluated)));
        assert!(matches!(scope.get("x"), Err(ScopeError::NotEvaluated)));
        assert!(matches!(scope.added_values(), Err(ScopeError::NotEvaluated)));
    }

    #[test]
    fn filters_private_and_host_values() {
        let mut scope = ConfigScope::from_source("_tmp = 1\nf = lambda: 0\nbad = float('nan')\nok = [1]").unwrap();
        let config = scope.evaluate(None, None).unwrap().clone();
        assert_eq!(config.to_value(), json!({"ok": [1]}));
        assert!(matches!(scope.get("f"), Err(ScopeError::NotFound(ref k)) if k == "f"));
    }

    #[test]
    fn custom_private_prefix() {
        let mut scope = ConfigScope::from_source("_a = 1\ntmp_b = 2")
            .unwrap()
            .with_options(ScopeOptions::new().with_private_prefix("tmp_"));
        assert_eq!(scope.evaluate(None, None).unwrap().to_value(), json!({"_a": 1}));
    }
}
