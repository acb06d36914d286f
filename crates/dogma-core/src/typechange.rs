//! Type-drift bookkeeping
//!
//! Assigning a differently shaped value to a protected key never fails; the
//! attempt is recorded as a [`TypeChange`] instead.

use std::fmt::{self, Display, Formatter};

use serde::{Serialize, Serializer};

use crate::value::{Value, ValueKind};

/// An override whose shape disagreed with the fixed value
///
/// Serializes as the pair `[attempted, fixed]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeChange {
    /// Kind of the value the block tried to assign
    pub attempted: ValueKind,
    /// Kind of the fixed value that was kept
    pub fixed: ValueKind,
}

impl TypeChange {
    /// Create a record
    #[inline]
    #[must_use]
    pub const fn new(attempted: ValueKind, fixed: ValueKind) -> Self {
        Self { attempted, fixed }
    }
}

impl Display for TypeChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.attempted, self.fixed)
    }
}

impl Serialize for TypeChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.attempted, self.fixed).serialize(serializer)
    }
}

/// Whether assigning `attempted` over `fixed` counts as type drift
///
/// Mappings only conflict with non-mappings and lists only with non-lists
/// (plain and frozen lists are the same shape). Everything else compares by
/// kind, so `int` over `float` is drift while `1` over `7` is not.
#[must_use]
pub fn type_changed(attempted: &Value, fixed: &Value) -> bool {
    if attempted.is_mapping() || fixed.is_mapping() {
        return !(attempted.is_mapping() && fixed.is_mapping());
    }
    if attempted.is_list() || fixed.is_list() {
        return !(attempted.is_list() && fixed.is_list());
    }
    attempted.kind() != fixed.kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::DogmaticDict;

    #[test]
    fn same_scalar_kind_is_not_drift() {
        assert!(!type_changed(&Value::Int(99), &Value::Int(1)));
    }

    #[test]
    fn int_over_float_is_drift() {
        assert!(type_changed(&Value::Int(1), &Value::Float(1.0)));
    }

    #[test]
    fn plain_list_over_frozen_list_is_not_drift() {
        let frozen = Value::frozen_list(vec![Value::Int(1)]);
        assert!(!type_changed(&Value::list(vec![]), &frozen));
    }

    #[test]
    fn list_over_dict_is_drift() {
        let fixed = Value::dict(DogmaticDict::new());
        assert!(type_changed(&Value::list(vec![]), &fixed));
        assert!(type_changed(&fixed, &Value::Int(3)));
    }

    #[test]
    fn serializes_as_pair() {
        let change = TypeChange::new(ValueKind::List, ValueKind::Dict);
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"["list","dict"]"#);
        assert_eq!(change.to_string(), "list -> dict");
    }
}
