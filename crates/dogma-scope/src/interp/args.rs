//! Evaluated call arguments

use dogma_core::Value;

use crate::error::EvalError;

/// Positional and keyword arguments of one call
#[derive(Debug, Default)]
pub(crate) struct Arguments {
    pub(crate) positional: Vec<Value>,
    pub(crate) keyword: Vec<(String, Value)>,
}

impl Arguments {
    pub(crate) fn new(positional: Vec<Value>, keyword: Vec<(String, Value)>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    pub(crate) fn positional(positional: Vec<Value>) -> Self {
        Self::new(positional, Vec::new())
    }

    /// Remove and return the keyword argument `name`
    pub(crate) fn keyword(&mut self, name: &str) -> Option<Value> {
        let index = self.keyword.iter().position(|(k, _)| k == name)?;
        Some(self.keyword.remove(index).1)
    }

    /// Check the positional count and reject leftover keywords
    pub(crate) fn finish(&self, func: &str, min: usize, max: usize) -> Result<(), EvalError> {
        if let Some((name, _)) = self.keyword.first() {
            return Err(EvalError::type_error(format!(
                "{func}() got an unexpected keyword argument '{name}'"
            )));
        }
        let given = self.positional.len();
        if given < min || given > max {
            let expected = if min == max {
                format!("{min}")
            } else if max == usize::MAX {
                format!("at least {min}")
            } else {
                format!("from {min} to {max}")
            };
            return Err(EvalError::type_error(format!(
                "{func}() takes {expected} positional arguments but {given} were given"
            )));
        }
        Ok(())
    }

    /// Take positional argument `index`, leaving `None` in its place
    pub(crate) fn take(&mut self, index: usize) -> Option<Value> {
        self.positional
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, Value::Null))
    }

    /// [`take`](Self::take) for an argument `finish` already guaranteed
    pub(crate) fn take_or_null(&mut self, index: usize) -> Value {
        self.take(index).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_consumed() {
        let mut args = Arguments::new(vec![Value::Int(1)], vec![("key".into(), Value::Null)]);
        assert!(args.finish("f", 1, 1).is_err());
        assert_eq!(args.keyword("key"), Some(Value::Null));
        assert!(args.finish("f", 1, 1).is_ok());
    }

    #[test]
    fn arity_messages() {
        let args = Arguments::positional(vec![]);
        let err = args.finish("len", 1, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type error: len() takes 1 positional arguments but 0 were given"
        );
        assert!(args.finish("max", 1, usize::MAX).unwrap_err().to_string().contains("at least 1"));
    }
}
