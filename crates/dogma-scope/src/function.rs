//! Callable host objects
//!
//! Lambdas created by a block and native functions injected by the caller
//! travel through evaluation as [`Opaque`] values. They never reach the
//! configuration because the serializability probe rejects them.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use dogma_core::{Opaque, Value};
use dogma_lang::LambdaExpr;

use crate::error::EvalError;

/// Local bindings of one lambda call or comprehension iteration
pub(crate) type Frame = HashMap<String, Value>;

/// Signature of a native function
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, EvalError>;

/// A lambda together with the local frames it was created in
#[derive(Debug)]
pub(crate) struct Function {
    pub(crate) def: Rc<LambdaExpr>,
    pub(crate) captured: Vec<Rc<Frame>>,
}

impl Opaque for Function {
    fn type_name(&self) -> &'static str {
        "function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A function implemented by the host
///
/// Receives positional arguments only.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    /// Wrap a closure
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// Name the function was registered under
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with positional arguments
    ///
    /// # Errors
    /// Whatever the wrapped closure returns.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Opaque for NativeFunction {
    fn type_name(&self) -> &'static str {
        "builtin_function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_function_calls_closure() {
        let double = NativeFunction::new("double", |args| match args {
            [Value::Int(i)] => Ok(Value::Int(i * 2)),
            _ => Err(EvalError::host("double expects one int")),
        });
        assert_eq!(double.name(), "double");
        assert_eq!(double.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
        assert!(double.call(&[]).is_err());
    }

    #[test]
    fn functions_are_opaque_to_serialization() {
        let native: Rc<dyn Opaque> = Rc::new(NativeFunction::new("f", |_| Ok(Value::Null)));
        assert!(dogma_core::to_json(&Value::Opaque(native)).is_err());
    }
}
