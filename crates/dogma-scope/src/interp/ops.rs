//! Operators, comparisons and sequence helpers
//!
//! Integer arithmetic is checked; floor division and modulo round toward
//! negative infinity. Booleans take part in arithmetic as 0 and 1.

use std::cmp::Ordering;

use dogma_core::Value;
use dogma_lang::{BinaryOp, CompareOp, UnaryOp};

use crate::error::EvalError;

/// Deepest container nesting that comparisons descend into
pub(crate) const COMPARE_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    #[allow(clippy::cast_precision_loss)]
    fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(x) => x,
        }
    }
}

fn num(value: &Value) -> Option<Num> {
    match value {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(x) => Some(Num::Float(*x)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        _ => None,
    }
}

/// Integer argument (`bool` accepted)
pub(crate) fn int_arg(value: &Value, what: &str) -> Result<i64, EvalError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(EvalError::type_error(format!(
            "{what} must be integers, not '{}'",
            other.type_name()
        ))),
    }
}

/// String key of a mapping
pub(crate) fn dict_key(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(EvalError::type_error(format!(
            "dict keys must be str, not '{}'",
            other.type_name()
        ))),
    }
}

pub(crate) fn unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow("-")),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v.clone()),
        (op, v) => {
            let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
            Err(EvalError::type_error(format!(
                "bad operand type for unary {symbol}: '{}'",
                v.type_name()
            )))
        }
    }
}

/// `lhs op rhs`; repetition results longer than `max_len` are refused
pub(crate) fn binary(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    max_len: usize,
) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (num(lhs), num(rhs)) {
        return match (a, b) {
            (Num::Int(a), Num::Int(b)) => int_arith(op, a, b),
            _ => float_arith(op, a.to_f64(), b.to_f64()),
        };
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Add, a, b) if a.is_list() && b.is_list() => {
            let mut items = a.sequence_items().unwrap_or_default();
            items.extend(b.sequence_items().unwrap_or_default());
            Ok(Value::list(items))
        }
        (BinaryOp::Mul, seq, count) | (BinaryOp::Mul, count, seq)
            if matches!(count, Value::Int(_) | Value::Bool(_))
                && matches!(seq, Value::Str(_) | Value::Tuple(_) | Value::List(_) | Value::FrozenList(_)) =>
        {
            repeat(seq, int_arg(count, "repeat counts")?, max_len)
        }
        _ => Err(EvalError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn repeat(seq: &Value, times: i64, max_len: usize) -> Result<Value, EvalError> {
    let times = usize::try_from(times).unwrap_or(0);
    if let Value::Str(s) = seq {
        bounded_len(s.len().checked_mul(times), max_len)?;
        return Ok(Value::Str(s.repeat(times)));
    }
    let items = seq.sequence_items().unwrap_or_default();
    let repeated = repeat_items(&items, times, max_len)?;
    Ok(match seq {
        Value::Tuple(_) => Value::tuple(repeated),
        _ => Value::list(repeated),
    })
}

/// `items` concatenated `times` times
pub(crate) fn repeat_items(
    items: &[Value],
    times: usize,
    max_len: usize,
) -> Result<Vec<Value>, EvalError> {
    let len = bounded_len(items.len().checked_mul(times), max_len)?;
    let mut out = Vec::with_capacity(len);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

fn bounded_len(len: Option<usize>, max_len: usize) -> Result<usize, EvalError> {
    len.filter(|n| *n <= max_len).ok_or(EvalError::Overflow("*"))
}

#[allow(clippy::cast_precision_loss)]
fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = EvalError::Overflow(op.symbol());
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            a.checked_div(b).map(|q| {
                if a % b != 0 && (a < 0) != (b < 0) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            a.checked_rem(b)
                .map(|r| if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_arith(op, a as f64, b as f64);
            }
            u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
        }
    };
    result.map(Value::Int).ok_or(overflow)
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::ZeroDivision)
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => {
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(EvalError::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

pub(crate) fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    let ordering = match op {
        CompareOp::Eq => return equals(lhs, rhs),
        CompareOp::Ne => return equals(lhs, rhs).map(|eq| !eq),
        CompareOp::In => return contains(rhs, lhs),
        CompareOp::NotIn => return contains(rhs, lhs).map(|found| !found),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            partial_order(lhs, rhs, op.symbol())?
        }
    };
    Ok(match ordering {
        None => false,
        Some(ord) => match op {
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            _ => ord != Ordering::Less,
        },
    })
}

/// Structural equality
///
/// A container compares equal to itself without being walked. Past
/// [`COMPARE_DEPTH`] nested containers the comparison fails, which is how
/// two distinct self-referential lists end up.
pub(crate) fn equals(lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    equals_at(lhs, rhs, 0)
}

fn equals_at(lhs: &Value, rhs: &Value, depth: usize) -> Result<bool, EvalError> {
    if lhs.container_id().is_some() && lhs.container_id() == rhs.container_id() {
        return Ok(true);
    }
    match (lhs, rhs) {
        (Value::Dict(a), Value::Dict(b)) => {
            let depth = descend(depth)?;
            let pairs = a.items();
            if pairs.len() != b.borrow().len() {
                return Ok(false);
            }
            for (key, value) in &pairs {
                match b.get(key) {
                    Some(other) if equals_at(value, &other, depth)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        (Value::Tuple(_), Value::Tuple(_)) => sequences_equal(lhs, rhs, depth),
        (a, b) if a.is_list() && b.is_list() => sequences_equal(lhs, rhs, depth),
        _ => Ok(lhs == rhs),
    }
}

fn sequences_equal(lhs: &Value, rhs: &Value, depth: usize) -> Result<bool, EvalError> {
    let depth = descend(depth)?;
    let a = lhs.sequence_items().unwrap_or_default();
    let b = rhs.sequence_items().unwrap_or_default();
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(&b) {
        if !equals_at(x, y, depth)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn descend(depth: usize) -> Result<usize, EvalError> {
    if depth >= COMPARE_DEPTH {
        Err(EvalError::RecursionLimit(COMPARE_DEPTH))
    } else {
        Ok(depth + 1)
    }
}

/// Ordering of two values; `None` when a NaN is involved
pub(crate) fn partial_order(
    lhs: &Value,
    rhs: &Value,
    symbol: &str,
) -> Result<Option<Ordering>, EvalError> {
    order_at(lhs, rhs, symbol, 0)
}

fn order_at(
    lhs: &Value,
    rhs: &Value,
    symbol: &str,
    depth: usize,
) -> Result<Option<Ordering>, EvalError> {
    if let (Some(a), Some(b)) = (num(lhs), num(rhs)) {
        return Ok(match (a, b) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            _ => a.to_f64().partial_cmp(&b.to_f64()),
        });
    }
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Tuple(a), Value::Tuple(b)) => sequence_order(a, b, symbol, descend(depth)?),
        (a, b) if a.is_list() && b.is_list() => sequence_order(
            &a.sequence_items().unwrap_or_default(),
            &b.sequence_items().unwrap_or_default(),
            symbol,
            descend(depth)?,
        ),
        _ => Err(EvalError::type_error(format!(
            "'{symbol}' not supported between instances of '{}' and '{}'",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn sequence_order(
    a: &[Value],
    b: &[Value],
    symbol: &str,
    depth: usize,
) -> Result<Option<Ordering>, EvalError> {
    for (x, y) in a.iter().zip(b) {
        if !equals_at(x, y, depth)? {
            return order_at(x, y, symbol, depth);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not '{}'",
                other.type_name()
            ))),
        },
        Value::Dict(dict) => Ok(item.as_str().is_some_and(|key| dict.borrow().contains_key(key))),
        Value::Tuple(_) | Value::List(_) | Value::FrozenList(_) => {
            for x in &container.sequence_items().unwrap_or_default() {
                if equals(x, item)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Snapshot of the items iteration would produce
pub(crate) fn iterate(value: &Value) -> Result<Vec<Value>, EvalError> {
    if let Some(items) = value.sequence_items() {
        return Ok(items);
    }
    match value {
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(dict) => Ok(dict
            .borrow()
            .keys()
            .map(|k| Value::Str(k.to_string()))
            .collect()),
        other => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// Key/value pairs from a mapping or an iterable of pairs
pub(crate) fn mapping_pairs(value: &Value) -> Result<Vec<(String, Value)>, EvalError> {
    if let Value::Dict(dict) = value {
        return Ok(dict.items());
    }
    iterate(value)?
        .into_iter()
        .map(|pair| match pair.sequence_items().as_deref() {
            Some([key, value]) => Ok((dict_key(key)?, value.clone())),
            _ => Err(EvalError::value_error(format!(
                "dictionary update sequence element {pair} is not a key/value pair"
            ))),
        })
        .collect()
}

/// Position of `index` in a sequence of `len`, counting negatives from the end
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

/// Clamped `start..stop` for a contiguous slice
pub(crate) fn slice_bounds(len: usize, lower: Option<i64>, upper: Option<i64>) -> (usize, usize) {
    let n = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64| -> usize {
        let bound = if bound < 0 { bound.saturating_add(n) } else { bound };
        usize::try_from(bound.clamp(0, n)).unwrap_or(0)
    };
    let start = clamp(lower.unwrap_or(0));
    let stop = clamp(upper.unwrap_or(n)).max(start);
    (start, stop)
}

/// Positions selected by `[lower:upper:step]`
pub(crate) fn slice_indices(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, EvalError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::value_error("slice step cannot be zero"));
    }
    if step == 1 {
        let (start, stop) = slice_bounds(len, lower, upper);
        return Ok((start..stop).collect());
    }

    let n = i64::try_from(len).unwrap_or(i64::MAX);
    let adjust = |bound: i64| if bound < 0 { bound.saturating_add(n) } else { bound };
    let (mut i, stop) = if step > 0 {
        (
            lower.map_or(0, |b| adjust(b).clamp(0, n)),
            upper.map_or(n, |b| adjust(b).clamp(0, n)),
        )
    } else {
        (
            lower.map_or(n - 1, |b| adjust(b).clamp(-1, n - 1)),
            upper.map_or(-1, |b| adjust(b).clamp(-1, n - 1)),
        )
    };

    let mut out = Vec::new();
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(index) = usize::try_from(i) {
            out.push(index);
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
        super::binary(op, lhs, rhs, 1 << 20)
    }

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().map(|i| Value::Int(*i)).collect())
    }

    #[test]
    fn floor_division_and_modulo_round_down() {
        assert_eq!(binary(BinaryOp::FloorDiv, &Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-4));
        assert_eq!(binary(BinaryOp::Mod, &Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(1));
        assert_eq!(binary(BinaryOp::Mod, &Value::Int(7), &Value::Int(-2)).unwrap(), Value::Int(-1));
        assert_eq!(
            binary(BinaryOp::Mod, &Value::Float(-1.5), &Value::Float(1.0)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn true_division_is_float() {
        assert_eq!(binary(BinaryOp::Div, &Value::Int(7), &Value::Int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(EvalError::ZeroDivision)
        );
    }

    #[test]
    fn integer_overflow_is_reported() {
        assert_eq!(
            binary(BinaryOp::Mul, &Value::Int(i64::MAX), &Value::Int(2)),
            Err(EvalError::Overflow("*"))
        );
        assert_eq!(
            binary(BinaryOp::FloorDiv, &Value::Int(i64::MIN), &Value::Int(-1)),
            Err(EvalError::Overflow("//"))
        );
        assert_eq!(binary(BinaryOp::Pow, &Value::Int(2), &Value::Int(10)).unwrap(), Value::Int(1024));
        assert_eq!(binary(BinaryOp::Pow, &Value::Int(2), &Value::Int(-1)).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn sequences_concatenate_and_repeat() {
        assert_eq!(binary(BinaryOp::Add, &ints(&[1]), &ints(&[2])).unwrap(), ints(&[1, 2]));
        assert_eq!(
            binary(BinaryOp::Add, &Value::frozen_list(vec![Value::Int(1)]), &ints(&[2])).unwrap(),
            ints(&[1, 2])
        );
        assert_eq!(binary(BinaryOp::Mul, &Value::Int(2), &ints(&[0])).unwrap(), ints(&[0, 0]));
        assert_eq!(
            binary(BinaryOp::Mul, &Value::from("ab"), &Value::Int(2)).unwrap(),
            Value::from("abab")
        );
        assert!(binary(BinaryOp::Add, &Value::from("a"), &Value::Int(1)).is_err());
    }

    #[test]
    fn oversized_repetition_is_refused() {
        let huge = Value::Int(1_000_000_000_000);
        assert_eq!(binary(BinaryOp::Mul, &Value::from("x"), &huge), Err(EvalError::Overflow("*")));
        assert_eq!(binary(BinaryOp::Mul, &huge, &ints(&[0])), Err(EvalError::Overflow("*")));
        assert_eq!(
            super::binary(BinaryOp::Mul, &Value::from("ab"), &Value::Int(3), 5),
            Err(EvalError::Overflow("*"))
        );
        assert_eq!(
            super::binary(BinaryOp::Mul, &Value::from("ab"), &Value::Int(2), 4).unwrap(),
            Value::from("abab")
        );
    }

    #[test]
    fn comparisons() {
        assert!(compare(CompareOp::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap());
        assert!(compare(CompareOp::Ge, &Value::from("b"), &Value::from("a")).unwrap());
        assert!(compare(CompareOp::Lt, &ints(&[1, 2]), &ints(&[1, 3])).unwrap());
        assert!(compare(CompareOp::Lt, &ints(&[1]), &ints(&[1, 0])).unwrap());
        assert!(!compare(CompareOp::Lt, &Value::Float(f64::NAN), &Value::Float(1.0)).unwrap());
        assert!(compare(CompareOp::Lt, &Value::Int(1), &Value::from("a")).is_err());
    }

    #[test]
    fn membership() {
        assert!(compare(CompareOp::In, &Value::Int(2), &ints(&[1, 2])).unwrap());
        assert!(compare(CompareOp::NotIn, &Value::from("z"), &Value::from("abc")).unwrap());
        let dict = Value::dict_from_pairs([("k", Value::Null)]);
        assert!(compare(CompareOp::In, &Value::from("k"), &dict).unwrap());
        assert!(compare(CompareOp::In, &Value::Int(1), &Value::Int(1)).is_err());
    }

    #[test]
    fn slices_follow_sequence_rules() {
        assert_eq!(slice_indices(5, None, None, None).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(slice_indices(5, Some(-2), None, None).unwrap(), vec![3, 4]);
        assert_eq!(slice_indices(5, None, None, Some(-1)).unwrap(), vec![4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(5, Some(1), Some(10), Some(2)).unwrap(), vec![1, 3]);
        assert_eq!(slice_indices(5, Some(3), Some(1), None).unwrap(), Vec::<usize>::new());
        assert!(slice_indices(5, None, None, Some(0)).is_err());
    }

    #[test]
    fn indices_count_from_the_end() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }

    #[test]
    fn mapping_pairs_accepts_pair_sequences() {
        let pairs = Value::list(vec![Value::tuple(vec![Value::from("a"), Value::Int(1)])]);
        assert_eq!(mapping_pairs(&pairs).unwrap(), vec![("a".to_string(), Value::Int(1))]);
        assert!(mapping_pairs(&ints(&[1])).is_err());
    }
}
