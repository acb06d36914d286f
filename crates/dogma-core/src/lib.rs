//! Dogma Core
//!
//! Runtime values and the dogmatic containers that protect a fixed
//! configuration baseline.
//!
//! # Core Concepts
//!
//! - [`Value`]: runtime value tree with reference-shared containers
//! - [`DogmaticDict`] / [`DictRef`]: mapping whose fixed keys cannot change value,
//!   with deep merge, type-drift records and revelation of unset keys
//! - [`DogmaticList`]: fixed sequence on which every mutation is suppressed
//! - [`dogmatize`] / [`undogmatize`]: convert whole trees in and out of protection
//! - [`to_json`]: serializability probe and JSON export
//!
//! # Example
//!
//! ```rust
//! use dogma_core::{dogmatize, from_json, Value};
//! use serde_json::json;
//!
//! let env = dogmatize(&from_json(&json!({"lr": 0.1})));
//! let Value::Dict(env) = env else { unreachable!() };
//!
//! env.set("lr", Value::Float(0.5));
//! env.set("epochs", Value::Int(10));
//!
//! assert_eq!(env.get("lr"), Some(Value::Float(0.1)));
//! assert_eq!(env.get("epochs"), Some(Value::Int(10)));
//! ```

mod convert;
mod dict;
mod error;
mod list;
mod path;
mod typechange;
mod value;

// Re-exports
pub use convert::{
    dogmatize, from_json, is_acyclic, to_json, to_json_with_limit, undogmatize, DEFAULT_MAX_DEPTH,
};
pub use dict::{DictRef, DogmaticDict, FixedMap};
pub use error::{NotSerializable, UnsupportedOperation};
pub use list::DogmaticList;
pub use path::{DottedPath, PathError};
pub use typechange::{type_changed, TypeChange};
pub use value::{format_float, ListRef, Opaque, Value, ValueKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
