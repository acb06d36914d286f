//! Builtin functions

use std::any::Any;
use std::cmp::Ordering;

use indexmap::IndexMap;

use dogma_core::{is_acyclic, undogmatize, DogmaticDict, Opaque, Value};
use dogma_lang::BinaryOp;

use super::{ops, Arguments, Interpreter};
use crate::error::EvalError;

/// A builtin function value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Len,
    Str,
    Int,
    Float,
    Bool,
    List,
    Dict,
    Tuple,
    Range,
    Min,
    Max,
    Sum,
    Abs,
    Round,
    Sorted,
    Copy,
}

const ALL: [Builtin; 16] = [
    Builtin::Len,
    Builtin::Str,
    Builtin::Int,
    Builtin::Float,
    Builtin::Bool,
    Builtin::List,
    Builtin::Dict,
    Builtin::Tuple,
    Builtin::Range,
    Builtin::Min,
    Builtin::Max,
    Builtin::Sum,
    Builtin::Abs,
    Builtin::Round,
    Builtin::Sorted,
    Builtin::Copy,
];

impl Builtin {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        ALL.into_iter().find(|b| b.name() == name)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Tuple => "tuple",
            Self::Range => "range",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Abs => "abs",
            Self::Round => "round",
            Self::Sorted => "sorted",
            Self::Copy => "copy",
        }
    }
}

impl Opaque for Builtin {
    fn type_name(&self) -> &'static str {
        "builtin_function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    builtin: Builtin,
    mut args: Arguments,
) -> Result<Value, EvalError> {
    let name = builtin.name();
    match builtin {
        Builtin::Len => {
            args.finish(name, 1, 1)?;
            len(&args.take_or_null(0))
        }
        Builtin::Str => {
            args.finish(name, 0, 1)?;
            Ok(Value::Str(
                args.take(0).map_or_else(String::new, |v| v.to_display_string()),
            ))
        }
        Builtin::Int => {
            args.finish(name, 0, 1)?;
            to_int(&args.take(0).unwrap_or(Value::Int(0)))
        }
        Builtin::Float => {
            args.finish(name, 0, 1)?;
            to_float(&args.take(0).unwrap_or(Value::Float(0.0)))
        }
        Builtin::Bool => {
            args.finish(name, 0, 1)?;
            Ok(Value::Bool(args.take(0).is_some_and(|v| v.is_truthy())))
        }
        Builtin::List | Builtin::Tuple => {
            args.finish(name, 0, 1)?;
            let items = match args.take(0) {
                Some(value) => ops::iterate(&value)?,
                None => Vec::new(),
            };
            Ok(if builtin == Builtin::List {
                Value::list(items)
            } else {
                Value::tuple(items)
            })
        }
        Builtin::Dict => {
            let keywords = std::mem::take(&mut args.keyword);
            args.finish(name, 0, 1)?;
            let mut map = IndexMap::new();
            if let Some(source) = args.take(0) {
                map.extend(ops::mapping_pairs(&source)?);
            }
            map.extend(keywords);
            Ok(Value::dict(DogmaticDict::from_entries(map)))
        }
        Builtin::Range => range(&args, interp.options.max_sequence_len),
        Builtin::Min => extreme(interp, args, name, Ordering::Less),
        Builtin::Max => extreme(interp, args, name, Ordering::Greater),
        Builtin::Sum => {
            args.finish(name, 1, 2)?;
            let items = ops::iterate(&args.take_or_null(0))?;
            let mut total = args.take(1).unwrap_or(Value::Int(0));
            for item in items {
                total = ops::binary(BinaryOp::Add, &total, &item, interp.options.max_sequence_len)?;
            }
            Ok(total)
        }
        Builtin::Abs => {
            args.finish(name, 1, 1)?;
            match args.take_or_null(0) {
                Value::Int(i) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow("abs")),
                Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                Value::Float(x) => Ok(Value::Float(x.abs())),
                other => Err(EvalError::type_error(format!(
                    "bad operand type for abs(): '{}'",
                    other.type_name()
                ))),
            }
        }
        Builtin::Round => round(&mut args),
        Builtin::Sorted => {
            let key = args.keyword("key");
            let reverse = args.keyword("reverse").is_some_and(|v| v.is_truthy());
            args.finish(name, 1, 1)?;
            let items = ops::iterate(&args.take_or_null(0))?;
            Ok(Value::list(sort_values(interp, items, key.as_ref(), reverse)?))
        }
        Builtin::Copy => {
            args.finish(name, 1, 1)?;
            let value = args.take_or_null(0);
            if !is_acyclic(&value) {
                return Err(EvalError::value_error("cannot copy a circular value"));
            }
            Ok(undogmatize(&value))
        }
    }
}

fn len(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::Tuple(items) => items.len(),
        Value::List(items) => items.borrow().len(),
        Value::FrozenList(list) => list.len(),
        Value::Dict(dict) => dict.borrow().len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    i64::try_from(n).map(Value::Int).map_err(|_| EvalError::Overflow("len"))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_int(x: f64) -> Result<Value, EvalError> {
    if !x.is_finite() {
        return Err(EvalError::value_error(format!(
            "cannot convert float {} to integer",
            dogma_core::format_float(x)
        )));
    }
    let t = x.trunc();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(EvalError::Overflow("int"));
    }
    Ok(Value::Int(t as i64))
}

fn to_int(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) => float_to_int(*x),
        Value::Str(s) => s
            .trim()
            .replace('_', "")
            .parse()
            .map(Value::Int)
            .map_err(|_| EvalError::value_error(format!("invalid literal for int(): {s:?}"))),
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_float(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| EvalError::value_error(format!("could not convert string to float: {s:?}"))),
        other => Err(EvalError::type_error(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn range(args: &Arguments, max_len: usize) -> Result<Value, EvalError> {
    args.finish("range", 1, 3)?;
    let bounds = args
        .positional
        .iter()
        .map(|v| ops::int_arg(v, "range() arguments"))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(EvalError::type_error("range() takes 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(EvalError::value_error("range() step must not be zero"));
    }

    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    let len = if span <= 0 {
        0
    } else {
        (span - 1) / i128::from(step).abs() + 1
    };
    let len = usize::try_from(len)
        .ok()
        .filter(|n| *n <= max_len)
        .ok_or(EvalError::Overflow("range"))?;

    let mut out = Vec::with_capacity(len);
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(Value::Int(i));
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(Value::list(out))
}

fn extreme(
    interp: &mut Interpreter<'_>,
    mut args: Arguments,
    name: &str,
    wanted: Ordering,
) -> Result<Value, EvalError> {
    let key = args.keyword("key").filter(|k| !matches!(k, Value::Null));
    let default = args.keyword("default");
    args.finish(name, 1, usize::MAX)?;
    let items = if args.positional.len() == 1 {
        ops::iterate(&args.take_or_null(0))?
    } else {
        std::mem::take(&mut args.positional)
    };

    let symbol = if wanted == Ordering::Less { "<" } else { ">" };
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let rank = match &key {
            Some(key) => interp.call(key, Arguments::positional(vec![item.clone()]))?,
            None => item.clone(),
        };
        let better = match &best {
            None => true,
            Some((best_rank, _)) => ops::partial_order(&rank, best_rank, symbol)? == Some(wanted),
        };
        if better {
            best = Some((rank, item));
        }
    }

    match best {
        Some((_, item)) => Ok(item),
        None => default.ok_or_else(|| {
            EvalError::value_error(format!("{name}() arg is an empty sequence"))
        }),
    }
}

/// Round half to even
fn round_half_even(x: f64) -> f64 {
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        x.round()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn round(args: &mut Arguments) -> Result<Value, EvalError> {
    args.finish("round", 1, 2)?;
    let value = args.take_or_null(0);
    let digits = match args.take(1) {
        None | Some(Value::Null) => None,
        Some(v) => Some(ops::int_arg(&v, "ndigits")?),
    };
    let scale = |digits: i64| 10f64.powi(digits.clamp(-308, 308) as i32);

    match (value, digits) {
        (Value::Int(i), None) => Ok(Value::Int(i)),
        (Value::Bool(b), None) => Ok(Value::Int(i64::from(b))),
        (Value::Int(i), Some(d)) if d >= 0 => Ok(Value::Int(i)),
        (Value::Int(i), Some(d)) => {
            let p = scale(-d);
            float_to_int(round_half_even(i as f64 / p) * p)
        }
        (Value::Float(x), None) => float_to_int(round_half_even(x)),
        (Value::Float(x), Some(d)) => {
            let p = scale(d);
            let scaled = x * p;
            if scaled.is_finite() {
                Ok(Value::Float(round_half_even(scaled) / p))
            } else {
                Ok(Value::Float(x))
            }
        }
        (other, _) => Err(EvalError::type_error(format!(
            "type '{}' cannot be rounded",
            other.type_name()
        ))),
    }
}

/// Stable sort by `key` (or the items themselves)
pub(crate) fn sort_values(
    interp: &mut Interpreter<'_>,
    items: Vec<Value>,
    key: Option<&Value>,
    reverse: bool,
) -> Result<Vec<Value>, EvalError> {
    let mut ranked = Vec::with_capacity(items.len());
    for item in items {
        let rank = match key {
            Some(Value::Null) | None => item.clone(),
            Some(key) => interp.call(key, Arguments::positional(vec![item.clone()]))?,
        };
        ranked.push((rank, item));
    }

    let mut compare = |a: &(Value, Value), b: &(Value, Value)| -> Result<Ordering, EvalError> {
        let ord = ops::partial_order(&a.0, &b.0, "<")?.unwrap_or(Ordering::Equal);
        Ok(if reverse { ord.reverse() } else { ord })
    };
    Ok(merge_sort(ranked, &mut compare)?
        .into_iter()
        .map(|(_, item)| item)
        .collect())
}

/// Merge sort with a fallible comparison; equal elements keep their order
fn merge_sort<T>(
    mut items: Vec<T>,
    compare: &mut impl FnMut(&T, &T) -> Result<Ordering, EvalError>,
) -> Result<Vec<T>, EvalError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare(r, l)? == Ordering::Less {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ScopeOptions;
    use dogma_core::{to_json, DictRef};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn eval(source: &str) -> Result<JsonValue, EvalError> {
        let options = ScopeOptions::default();
        let env = DictRef::default();
        let block = dogma_lang::parse_block(&format!("result = {source}")).unwrap();
        let mut interp = Interpreter::new(env.clone(), IndexMap::new(), &options);
        match interp.run(&block) {
            Ok(()) => Ok(to_json(&env.get("result").unwrap()).unwrap()),
            Err(crate::error::ScopeError::Eval { source, .. }) => Err(source),
            Err(other) => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn lookup_covers_every_builtin() {
        for builtin in ALL {
            assert_eq!(Builtin::lookup(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::lookup("print"), None);
    }

    #[test]
    fn conversions() {
        assert_eq!(eval("int('12')").unwrap(), json!(12));
        assert_eq!(eval("int(-2.7)").unwrap(), json!(-2));
        assert_eq!(eval("float('1.5')").unwrap(), json!(1.5));
        assert_eq!(eval("str(1.0)").unwrap(), json!("1.0"));
        assert_eq!(eval("str([1, 'a'])").unwrap(), json!("[1, \"a\"]"));
        assert_eq!(eval("bool([])").unwrap(), json!(false));
        assert!(matches!(eval("int('x')"), Err(EvalError::Value(_))));
    }

    #[test]
    fn containers() {
        assert_eq!(eval("len({'a': 1})").unwrap(), json!(1));
        assert_eq!(eval("list('ab')").unwrap(), json!(["a", "b"]));
        assert_eq!(eval("tuple([1, 2])").unwrap(), json!([1, 2]));
        assert_eq!(eval("dict([('a', 1)], b=2)").unwrap(), json!({"a": 1, "b": 2}));
        assert_eq!(eval("range(5, 0, -2)").unwrap(), json!([5, 3, 1]));
    }

    #[test]
    fn aggregates() {
        assert_eq!(eval("min(3, 1, 2)").unwrap(), json!(1));
        assert_eq!(eval("max(['a', 'bbb', 'cc'], key=len)").unwrap(), json!("bbb"));
        assert_eq!(eval("max([], default=0)").unwrap(), json!(0));
        assert_eq!(eval("sum([1, 2, 3], 10)").unwrap(), json!(16));
        assert_eq!(eval("sum([0.5, 0.25])").unwrap(), json!(0.75));
        assert!(matches!(eval("min([])"), Err(EvalError::Value(_))));
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(eval("round(2.5)").unwrap(), json!(2));
        assert_eq!(eval("round(3.5)").unwrap(), json!(4));
        assert_eq!(eval("round(-2.5)").unwrap(), json!(-2));
        assert_eq!(eval("round(0.125, 2)").unwrap(), json!(0.12));
        assert_eq!(eval("round(1234, -2)").unwrap(), json!(1200));
        assert_eq!(eval("abs(-3)").unwrap(), json!(3));
    }

    #[test]
    fn sorting_is_stable() {
        assert_eq!(eval("sorted([3, 1, 2])").unwrap(), json!([1, 2, 3]));
        assert_eq!(
            eval("sorted([('b', 1), ('a', 1), ('c', 0)], key=lambda p: p[1])").unwrap(),
            json!([["c", 0], ["b", 1], ["a", 1]])
        );
        assert_eq!(
            eval("sorted([('b', 1), ('a', 1), ('c', 0)], key=lambda p: p[1], reverse=True)").unwrap(),
            json!([["b", 1], ["a", 1], ["c", 0]])
        );
        assert!(matches!(eval("sorted([1, 'a'])"), Err(EvalError::Type(_))));
    }

    #[test]
    fn copy_detaches_containers() {
        assert_eq!(eval("copy({'a': [1]})").unwrap(), json!({"a": [1]}));
    }
}
