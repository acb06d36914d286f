//! Dogma Scope
//!
//! Evaluates declarative configuration blocks against a fixed baseline and
//! a preset, producing a plain JSON configuration plus a report of what the
//! baseline supplied and where the block tried to change a fixed type.
//!
//! # Core Concepts
//!
//! - [`ConfigScope`]: one block, evaluated on demand
//! - [`Configuration`]: the filtered, serializable result with a [`Fingerprint`]
//! - [`Globals`]: values and native functions injected into every evaluation
//! - [`ScopeOptions`]: private prefix, recursion and nesting limits
//!
//! # Example
//!
//! ```rust
//! use dogma_scope::ConfigScope;
//! use serde_json::json;
//!
//! let mut scope = ConfigScope::from_source(
//!     "def cfg():\n    lr = 0.5\n    epochs = 10\n    _scratch = [lr] * 2\n",
//! )
//! .unwrap();
//!
//! let config = scope
//!     .evaluate(Some(&json!({"lr": 0.1, "seed": 7})), None)
//!     .unwrap();
//! assert_eq!(config.to_value(), json!({"lr": 0.1, "epochs": 10, "seed": 7}));
//!
//! let added: Vec<_> = scope.added_values().unwrap().iter().cloned().collect();
//! assert_eq!(added, vec!["seed".to_string()]);
//! ```

pub mod configuration;
pub mod error;
pub mod fingerprint;
pub mod function;
pub mod globals;
mod interp;
pub mod options;
pub mod scope;

// Re-exports
pub use configuration::Configuration;
pub use dogma_core::{DottedPath, TypeChange, Value, ValueKind};
pub use error::{EvalError, ScopeError};
pub use fingerprint::{Fingerprint, FingerprintError};
pub use function::{NativeFn, NativeFunction};
pub use globals::Globals;
pub use options::ScopeOptions;
pub use scope::ConfigScope;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
