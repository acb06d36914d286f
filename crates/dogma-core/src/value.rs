//! Runtime values
//!
//! [`Value`] is the tree a declarative block computes with. Containers are
//! shared by reference: binding a list to a second name aliases it, exactly
//! like the assignment statements the block language models.

use std::any::Any;
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::dict::{DictRef, DogmaticDict};
use crate::list::DogmaticList;

/// Shared, mutable plain list
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Depth after which `Display` stops descending into containers
const DISPLAY_DEPTH: usize = 32;

/// Host object carried through evaluation but never serialized
///
/// Functions defined inside a block and native functions injected by the
/// caller are both opaque values.
pub trait Opaque: fmt::Debug {
    /// Type name reported in diagnostics (`function`, `builtin_function`, ...)
    fn type_name(&self) -> &'static str;

    /// Downcast support for the evaluator
    fn as_any(&self) -> &dyn Any;
}

/// A runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// `None` / `null`
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String
    Str(String),
    /// Fixed-arity immutable sequence
    Tuple(Rc<[Value]>),
    /// Plain mutable list
    List(ListRef),
    /// List derived from a fixed baseline; every mutation is suppressed
    FrozenList(Rc<DogmaticList>),
    /// Mapping; a dict without fixed keys is a plain mapping
    Dict(DictRef),
    /// Host object (functions and other non-data values)
    Opaque(Rc<dyn Opaque>),
}

impl Value {
    /// Build a plain list
    #[inline]
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    /// Build a tuple
    #[inline]
    #[must_use]
    pub fn tuple(items: Vec<Value>) -> Self {
        Self::Tuple(items.into())
    }

    /// Build a frozen list
    #[inline]
    #[must_use]
    pub fn frozen_list(items: Vec<Value>) -> Self {
        Self::FrozenList(Rc::new(DogmaticList::new(items)))
    }

    /// Wrap a dict
    #[inline]
    #[must_use]
    pub fn dict(dict: DogmaticDict) -> Self {
        Self::Dict(DictRef::new(dict))
    }

    /// Build a plain dict from key/value pairs
    #[must_use]
    pub fn dict_from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::dict(DogmaticDict::from_entries(
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Kind of this value, used for type-drift records
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::List(_) | Self::FrozenList(_) => ValueKind::List,
            Self::Dict(_) => ValueKind::Dict,
            Self::Opaque(obj) => ValueKind::Opaque(obj.type_name()),
        }
    }

    /// Type name as reported to users
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Mapping check (plain or dogmatic)
    #[inline]
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    /// Sequence check (plain or frozen list; tuples excluded)
    #[inline]
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_) | Self::FrozenList(_))
    }

    /// Truthiness as used by conditions and `bool()`
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::List(items) => !items.borrow().is_empty(),
            Self::FrozenList(list) => !list.is_empty(),
            Self::Dict(dict) => !dict.borrow().is_empty(),
            Self::Opaque(_) => true,
        }
    }

    /// String slice if this is a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Snapshot of the elements of any sequence value (tuple, list, frozen list)
    #[must_use]
    pub fn sequence_items(&self) -> Option<Vec<Value>> {
        match self {
            Self::Tuple(items) => Some(items.to_vec()),
            Self::List(items) => Some(items.borrow().clone()),
            Self::FrozenList(list) => Some(list.to_vec()),
            _ => None,
        }
    }

    /// Identity of the shared container, if any
    ///
    /// Used for cycle detection while walking value trees.
    #[must_use]
    pub fn container_id(&self) -> Option<*const ()> {
        match self {
            Self::List(items) => Some(Rc::as_ptr(items).cast()),
            Self::FrozenList(list) => Some(Rc::as_ptr(list).cast()),
            Self::Dict(dict) => Some(dict.as_ptr()),
            _ => None,
        }
    }

    /// Render for `str()`: strings unquoted, everything else as its repr
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn fmt_depth(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > DISPLAY_DEPTH {
            return f.write_str("...");
        }
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                fmt_items(f, items, depth)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::List(items) => {
                f.write_str("[")?;
                fmt_items(f, &items.borrow(), depth)?;
                f.write_str("]")
            }
            Self::FrozenList(list) => {
                f.write_str("[")?;
                fmt_items(f, list.as_slice(), depth)?;
                f.write_str("]")
            }
            Self::Dict(dict) => {
                f.write_str("{")?;
                for (i, (key, value)) in dict.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: ")?;
                    value.fmt_depth(f, depth + 1)?;
                }
                f.write_str("}")
            }
            Self::Opaque(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

fn fmt_items(f: &mut Formatter<'_>, items: &[Value], depth: usize) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt_depth(f, depth + 1)?;
    }
    Ok(())
}

/// Floats always show a fractional part so they stay distinguishable from ints
#[must_use]
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let name = if x > 0.0 { "inf" } else { "-inf" };
        name.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.fmt_depth(f, 0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a[..] == b[..],
            (Self::Dict(a), Self::Dict(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Self::Opaque(a), Self::Opaque(b)) => Rc::ptr_eq(a, b),
            (a, b) if a.is_list() && b.is_list() => {
                if a.container_id() == b.container_id() {
                    return true;
                }
                a.sequence_items() == b.sequence_items()
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::list(items)
    }
}

/// Shape of a value, as recorded in type-drift reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `None`
    Null,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float
    Float,
    /// String
    Str,
    /// Tuple
    Tuple,
    /// List (plain or frozen)
    List,
    /// Mapping (plain or dogmatic)
    Dict,
    /// Host object with its type name
    Opaque(&'static str),
}

impl ValueKind {
    /// Stable lowercase name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Tuple => "tuple",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Opaque(name) => name,
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ValueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
