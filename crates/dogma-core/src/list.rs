//! Immutable projection of fixed sequences
//!
//! Unlike mappings, sequences have no meaningful key-wise merge, so a list
//! that came from the fixed baseline is protected as a whole.

use crate::error::UnsupportedOperation;
use crate::value::Value;

/// A list derived from a fixed value
///
/// All mutators are accepted and ignored. The in-place operators return the
/// list itself so `x += [4]` rebinds `x` to the unchanged list. `pop` fails
/// with [`UnsupportedOperation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DogmaticList {
    items: Vec<Value>,
}

#[allow(clippy::unused_self, clippy::needless_pass_by_value)]
impl DogmaticList {
    /// Freeze the given items
    #[inline]
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Borrow the elements
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Iterate over the elements
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Copy the elements out
    #[inline]
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.clone()
    }

    /// No-op
    pub fn append(&self, _value: Value) {}

    /// No-op
    pub fn extend(&self, _values: Vec<Value>) {}

    /// No-op
    pub fn insert(&self, _index: i64, _value: Value) {}

    /// No-op
    pub fn reverse(&self) {}

    /// No-op
    pub fn sort(&self) {}

    /// No-op
    pub fn set_item(&self, _index: i64, _value: Value) {}

    /// No-op
    pub fn set_slice(&self, _lower: Option<i64>, _upper: Option<i64>, _values: Vec<Value>) {}

    /// No-op
    pub fn delete_item(&self, _index: i64) {}

    /// No-op
    pub fn delete_slice(&self, _lower: Option<i64>, _upper: Option<i64>) {}

    /// No-op; returns the list unchanged
    #[must_use]
    pub fn add_assign(&self, _other: &Value) -> &Self {
        self
    }

    /// No-op; returns the list unchanged
    #[must_use]
    pub fn mul_assign(&self, _times: i64) -> &Self {
        self
    }

    /// No-op
    pub fn remove(&self, _value: &Value) {}

    /// Always fails: a caller relying on the popped value would otherwise
    /// receive an element that was never removed
    pub fn pop(&self, _index: Option<i64>) -> Result<Value, UnsupportedOperation> {
        Err(UnsupportedOperation::new("pop", "list"))
    }
}

impl<'a> IntoIterator for &'a DogmaticList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen() -> DogmaticList {
        DogmaticList::new(vec![Value::Int(3), Value::Int(1), Value::Int(2)])
    }

    #[test]
    fn mutators_leave_contents_unchanged() {
        let list = frozen();
        let before = list.to_vec();

        list.append(Value::Int(4));
        list.extend(vec![Value::Int(5)]);
        list.insert(0, Value::Int(6));
        list.reverse();
        list.sort();
        list.set_item(0, Value::Int(7));
        list.set_slice(Some(0), Some(2), vec![]);
        list.delete_item(1);
        list.delete_slice(None, None);
        list.remove(&Value::Int(3));

        assert_eq!(list.to_vec(), before);
    }

    #[test]
    fn in_place_operators_return_self() {
        let list = frozen();
        let same = list.add_assign(&Value::list(vec![Value::Int(9)]));
        assert!(std::ptr::eq(same, &list));
        let same = list.mul_assign(3);
        assert!(std::ptr::eq(same, &list));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn pop_fails_loudly() {
        let list = frozen();
        assert!(list.pop(None).is_err());
        let err = list.pop(Some(0)).unwrap_err();
        assert_eq!(err.operation, "pop");
        assert_eq!(list.len(), 3);
    }
}
