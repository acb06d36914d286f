//! Immutable projection of fixed mappings
//!
//! A [`DogmaticDict`] behaves like an ordinary insertion-ordered mapping,
//! except that keys present in its fixed map are pinned: assigning to them
//! stores the fixed value again and, when the shapes disagree, records a
//! [`TypeChange`]. Assigning a mapping onto a fixed mapping merges it key by
//! key, so nested fixed keys stay pinned while nested free keys are
//! updated.
//!
//! The mapping's view is the keys that were set, in assignment order,
//! followed by the fixed keys that were never set. [`DictRef::revelation`]
//! materializes the latter and reports them.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::path::DottedPath;
use crate::typechange::{type_changed, TypeChange};
use crate::value::Value;

/// Fixed keys of one mapping node
pub type FixedMap = IndexMap<String, Value>;

/// Mapping with protected keys
#[derive(Debug, Default)]
pub struct DogmaticDict {
    entries: IndexMap<String, Value>,
    fixed: Rc<FixedMap>,
    typechanges: IndexMap<DottedPath, TypeChange>,
}

impl DogmaticDict {
    /// Empty mapping without fixed keys
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty mapping pinned to `fixed`
    ///
    /// The fixed map is shared, not copied.
    #[inline]
    #[must_use]
    pub fn with_fixed(fixed: impl Into<Rc<FixedMap>>) -> Self {
        Self {
            entries: IndexMap::new(),
            fixed: fixed.into(),
            typechanges: IndexMap::new(),
        }
    }

    /// Plain mapping holding `entries`
    #[inline]
    #[must_use]
    pub fn from_entries(entries: IndexMap<String, Value>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Fixed keys of this node
    #[inline]
    #[must_use]
    pub fn fixed(&self) -> &FixedMap {
        &self.fixed
    }

    /// Whether `key` is protected
    #[inline]
    #[must_use]
    pub fn is_fixed(&self, key: &str) -> bool {
        self.fixed.contains_key(key)
    }

    /// Whether `key` has been set (as opposed to only being fixed)
    #[inline]
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Value at `key`; unset fixed keys read as their fixed value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).or_else(|| self.fixed.get(key))
    }

    /// Whether `key` is visible
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key) || self.fixed.contains_key(key)
    }

    /// Number of visible keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len() + self.unset_fixed().count()
    }

    /// Whether no key is visible
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible key/value pairs: set keys first, then unset fixed keys
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .chain(self.unset_fixed())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Visible keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// Type changes recorded on this node, including those merged in from
    /// nested fixed mappings during assignment
    #[inline]
    #[must_use]
    pub fn typechanges(&self) -> &IndexMap<DottedPath, TypeChange> {
        &self.typechanges
    }

    /// Remove a free key
    ///
    /// Protected keys are left in place and their value is returned, so a
    /// `del` or `pop` of a fixed key is a no-op.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        if self.fixed.contains_key(key) {
            return self.get(key).cloned();
        }
        self.entries.shift_remove(key)
    }

    fn unset_fixed(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fixed
            .iter()
            .filter(|(k, _)| !self.entries.contains_key(k.as_str()))
    }
}

impl PartialEq for DogmaticDict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// Shared handle to a [`DogmaticDict`]
///
/// Operations that may recurse into child mappings live here so that no
/// borrow is held across the recursion.
#[derive(Debug, Clone, Default)]
pub struct DictRef(Rc<RefCell<DogmaticDict>>);

impl DictRef {
    /// Share a dict
    #[inline]
    #[must_use]
    pub fn new(dict: DogmaticDict) -> Self {
        Self(Rc::new(RefCell::new(dict)))
    }

    /// Borrow the dict
    #[inline]
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, DogmaticDict> {
        self.0.borrow()
    }

    /// Borrow the dict mutably
    #[inline]
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, DogmaticDict> {
        self.0.borrow_mut()
    }

    /// Whether both handles point at the same dict
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity for cycle detection
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0).cast()
    }

    /// Cloned value at `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Snapshot of the visible pairs
    #[must_use]
    pub fn items(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Assign `value` to `key`, honoring protected keys
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let fixed_value = self.0.borrow().fixed.get(&key).cloned();
        let Some(fixed_value) = fixed_value else {
            self.0.borrow_mut().entries.insert(key, value);
            return;
        };

        {
            let mut dict = self.0.borrow_mut();
            dict.entries.insert(key.clone(), fixed_value.clone());
            if type_changed(&value, &fixed_value) {
                dict.typechanges.insert(
                    DottedPath::single(key.as_str()),
                    TypeChange::new(value.kind(), fixed_value.kind()),
                );
            }
        }

        if let (Value::Dict(child), Value::Dict(incoming)) = (&fixed_value, &value) {
            child.update(incoming.items());
            let nested: Vec<(DottedPath, TypeChange)> = child
                .borrow()
                .typechanges
                .iter()
                .map(|(path, change)| (path.clone().prefixed(key.as_str()), *change))
                .collect();
            self.0.borrow_mut().typechanges.extend(nested);
        }
    }

    /// [`set`](Self::set) every pair in order
    pub fn update(&self, pairs: impl IntoIterator<Item = (String, Value)>) {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }

    /// Remove a free key; see [`DogmaticDict::delete`]
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().delete(key)
    }

    /// Install every fixed key that was never set and report its path
    ///
    /// Recurses into fixed mappings, prefixing their paths with `key.`. A
    /// top-level key that was missing is reported together with every path
    /// below it. Calling this twice reports nothing the second time.
    pub fn revelation(&self) -> BTreeSet<String> {
        self.reveal().iter().map(ToString::to_string).collect()
    }

    fn reveal(&self) -> Vec<DottedPath> {
        let fixed = Rc::clone(&self.0.borrow().fixed);
        let mut missing = Vec::new();

        for (key, fixed_value) in fixed.iter() {
            let is_set = self.0.borrow().entries.contains_key(key);
            if !is_set {
                self.0
                    .borrow_mut()
                    .entries
                    .insert(key.clone(), fixed_value.clone());
                missing.push(DottedPath::single(key.as_str()));
            }

            if let Some(Value::Dict(child)) = self.get(key) {
                missing.extend(
                    child
                        .reveal()
                        .into_iter()
                        .map(|path| path.prefixed(key.as_str())),
                );
            }
        }

        missing
    }

    /// Type changes of this node and of every fixed mapping below it
    ///
    /// Drift introduced by item assignment on a nested fixed mapping is only
    /// recorded on that mapping; this collects it under dotted paths.
    #[must_use]
    pub fn collected_typechanges(&self) -> BTreeMap<String, TypeChange> {
        self.drift()
            .into_iter()
            .map(|(path, change)| (path.to_string(), change))
            .collect()
    }

    fn drift(&self) -> Vec<(DottedPath, TypeChange)> {
        let (own, fixed) = {
            let dict = self.0.borrow();
            (dict.typechanges.clone(), Rc::clone(&dict.fixed))
        };

        let mut collected: Vec<_> = own.into_iter().collect();
        for (key, fixed_value) in fixed.iter() {
            if let Value::Dict(child) = fixed_value {
                collected.extend(
                    child
                        .drift()
                        .into_iter()
                        .map(|(path, change)| (path.prefixed(key.as_str()), change)),
                );
            }
        }
        collected
    }
}
