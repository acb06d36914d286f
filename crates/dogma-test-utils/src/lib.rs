//! Testing utilities for the Dogma workspace
//!
//! Shared fixtures, evaluation helpers and tracing setup.

#![allow(missing_docs)]

use dogma_scope::{ConfigScope, ScopeError};
use serde_json::{json, Value as JsonValue};

/// Install a test-friendly subscriber once; honors `RUST_LOG`
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A training baseline with nested mappings and a list
pub fn ml_baseline() -> JsonValue {
    json!({
        "seed": 42,
        "model": {"depth": 4, "width": 128, "activation": "relu"},
        "optimizer": {"name": "sgd", "lr": 0.1, "schedule": {"gamma": 0.9}},
        "layers": [64, 64],
    })
}

/// Softer defaults to go with [`ml_baseline`]
pub fn ml_preset() -> JsonValue {
    json!({"epochs": 10, "batch_size": 32, "seed": 0})
}

pub fn scope(source: &str) -> ConfigScope {
    ConfigScope::from_source(source).unwrap()
}

/// Evaluate `source` and return the configuration as a JSON object
pub fn evaluate(source: &str, fixed: &JsonValue, preset: &JsonValue) -> JsonValue {
    let mut scope = scope(source);
    scope.evaluate(Some(fixed), Some(preset)).unwrap().to_value()
}

/// Evaluate and return the error
pub fn evaluate_err(source: &str, fixed: &JsonValue) -> ScopeError {
    scope(source).evaluate(Some(fixed), None).unwrap_err()
}
