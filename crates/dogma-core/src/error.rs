//! Error types for dogmatic containers

/// A mutation that fixed sequences refuse loudly
///
/// Every other mutation of a [`DogmaticList`](crate::DogmaticList) is a
/// silent no-op; `pop` would hand the caller a value that was never
/// removed, so it fails instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {operation} from a fixed {type_name}")]
pub struct UnsupportedOperation {
    /// Operation that was attempted
    pub operation: &'static str,
    /// Container type name
    pub type_name: &'static str,
}

impl UnsupportedOperation {
    /// Create the error
    #[inline]
    #[must_use]
    pub const fn new(operation: &'static str, type_name: &'static str) -> Self {
        Self {
            operation,
            type_name,
        }
    }
}

/// Why a value was kept out of a JSON document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotSerializable {
    /// Functions and other host objects
    #[error("{0} values are not JSON-serializable")]
    HostObject(&'static str),

    /// NaN and infinities
    #[error("float {0} has no JSON representation")]
    NonFiniteFloat(f64),

    /// A container that contains itself
    #[error("circular reference detected")]
    Circular,

    /// Nesting beyond the configured limit
    #[error("value nested deeper than {0} levels")]
    TooDeep(usize),
}
