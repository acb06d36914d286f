//! Methods on builtin value types

use dogma_core::{DictRef, DogmaticList, ListRef, Value};

use super::builtins::sort_values;
use super::{ops, Arguments, Interpreter};
use crate::error::EvalError;

pub(crate) fn call_method(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    name: &str,
    args: Arguments,
) -> Result<Value, EvalError> {
    match receiver {
        Value::List(items) => list_method(interp, items, name, args),
        Value::FrozenList(list) => frozen_list_method(list, name, args),
        Value::Tuple(items) => sequence_method(items, "tuple", name, args),
        Value::Dict(dict) => dict_method(dict, name, args),
        Value::Str(s) => str_method(s, name, args),
        other => Err(no_method(other.type_name(), name)),
    }
}

fn no_method(type_name: &str, name: &str) -> EvalError {
    EvalError::type_error(format!("'{type_name}' object has no method '{name}'"))
}

fn list_method(
    interp: &mut Interpreter<'_>,
    items: &ListRef,
    name: &str,
    mut args: Arguments,
) -> Result<Value, EvalError> {
    match name {
        "append" => {
            args.finish("append", 1, 1)?;
            items.borrow_mut().push(args.take_or_null(0));
            Ok(Value::Null)
        }
        "extend" => {
            args.finish("extend", 1, 1)?;
            let extra = ops::iterate(&args.take_or_null(0))?;
            items.borrow_mut().extend(extra);
            Ok(Value::Null)
        }
        "insert" => {
            args.finish("insert", 2, 2)?;
            let index = ops::int_arg(&args.take_or_null(0), "list indices")?;
            let len = items.borrow().len();
            let n = i64::try_from(len).unwrap_or(i64::MAX);
            let at = if index < 0 { index.saturating_add(n) } else { index };
            let at = usize::try_from(at.clamp(0, n)).unwrap_or(len);
            items.borrow_mut().insert(at, args.take_or_null(1));
            Ok(Value::Null)
        }
        "reverse" => {
            args.finish("reverse", 0, 0)?;
            items.borrow_mut().reverse();
            Ok(Value::Null)
        }
        "sort" => {
            let key = args.keyword("key");
            let reverse = args.keyword("reverse").is_some_and(|v| v.is_truthy());
            args.finish("sort", 0, 0)?;
            let snapshot = items.borrow().clone();
            let sorted = sort_values(interp, snapshot, key.as_ref(), reverse)?;
            *items.borrow_mut() = sorted;
            Ok(Value::Null)
        }
        "remove" => {
            args.finish("remove", 1, 1)?;
            let target = args.take_or_null(0);
            let snapshot = items.borrow().clone();
            let position = position_of(&snapshot, &target)?;
            match position {
                Some(pos) => {
                    items.borrow_mut().remove(pos);
                    Ok(Value::Null)
                }
                None => Err(EvalError::value_error("list.remove(x): x not in list")),
            }
        }
        "pop" => {
            args.finish("pop", 0, 1)?;
            let index = match args.take(0) {
                Some(v) => ops::int_arg(&v, "list indices")?,
                None => -1,
            };
            let len = items.borrow().len();
            if len == 0 {
                return Err(EvalError::Index("pop from empty list".into()));
            }
            let pos = ops::normalize_index(index, len)
                .ok_or_else(|| EvalError::Index("pop index out of range".into()))?;
            Ok(items.borrow_mut().remove(pos))
        }
        "copy" => {
            args.finish("copy", 0, 0)?;
            Ok(Value::list(items.borrow().clone()))
        }
        _ => {
            let snapshot = items.borrow().clone();
            sequence_method(&snapshot, "list", name, args)
        }
    }
}

fn frozen_list_method(list: &DogmaticList, name: &str, mut args: Arguments) -> Result<Value, EvalError> {
    match name {
        "append" => {
            args.finish("append", 1, 1)?;
            list.append(args.take_or_null(0));
        }
        "extend" => {
            args.finish("extend", 1, 1)?;
            list.extend(ops::iterate(&args.take_or_null(0))?);
        }
        "insert" => {
            args.finish("insert", 2, 2)?;
            list.insert(ops::int_arg(&args.take_or_null(0), "list indices")?, args.take_or_null(1));
        }
        "reverse" => {
            args.finish("reverse", 0, 0)?;
            list.reverse();
        }
        "sort" => {
            args.keyword("key");
            args.keyword("reverse");
            args.finish("sort", 0, 0)?;
            list.sort();
        }
        "remove" => {
            args.finish("remove", 1, 1)?;
            list.remove(&args.take_or_null(0));
        }
        "pop" => {
            args.finish("pop", 0, 1)?;
            let index = match args.take(0) {
                Some(v) => Some(ops::int_arg(&v, "list indices")?),
                None => None,
            };
            return list.pop(index).map_err(Into::into);
        }
        "copy" => {
            args.finish("copy", 0, 0)?;
            return Ok(Value::list(list.to_vec()));
        }
        _ => return sequence_method(list.as_slice(), "list", name, args),
    }
    Ok(Value::Null)
}

/// Read-only methods shared by every sequence
fn sequence_method(
    items: &[Value],
    type_name: &str,
    name: &str,
    mut args: Arguments,
) -> Result<Value, EvalError> {
    match name {
        "index" => {
            args.finish("index", 1, 1)?;
            let target = args.take_or_null(0);
            let pos = position_of(items, &target)?
                .ok_or_else(|| EvalError::value_error(format!("{target} is not in {type_name}")))?;
            i64::try_from(pos).map(Value::Int).map_err(|_| EvalError::Overflow("index"))
        }
        "count" => {
            args.finish("count", 1, 1)?;
            let target = args.take_or_null(0);
            let mut n = 0usize;
            for x in items {
                if ops::equals(x, &target)? {
                    n += 1;
                }
            }
            i64::try_from(n).map(Value::Int).map_err(|_| EvalError::Overflow("count"))
        }
        _ => Err(no_method(type_name, name)),
    }
}

fn position_of(items: &[Value], target: &Value) -> Result<Option<usize>, EvalError> {
    for (i, x) in items.iter().enumerate() {
        if ops::equals(x, target)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn dict_method(dict: &DictRef, name: &str, mut args: Arguments) -> Result<Value, EvalError> {
    match name {
        "get" => {
            args.finish("get", 1, 2)?;
            let key = ops::dict_key(&args.take_or_null(0))?;
            Ok(dict.get(&key).unwrap_or_else(|| args.take_or_null(1)))
        }
        "keys" => {
            args.finish("keys", 0, 0)?;
            Ok(Value::list(
                dict.borrow().keys().map(|k| Value::Str(k.to_string())).collect(),
            ))
        }
        "values" => {
            args.finish("values", 0, 0)?;
            Ok(Value::list(dict.items().into_iter().map(|(_, v)| v).collect()))
        }
        "items" => {
            args.finish("items", 0, 0)?;
            Ok(Value::list(
                dict.items()
                    .into_iter()
                    .map(|(k, v)| Value::tuple(vec![Value::Str(k), v]))
                    .collect(),
            ))
        }
        "update" => {
            let keywords = std::mem::take(&mut args.keyword);
            args.finish("update", 0, 1)?;
            if let Some(source) = args.take(0) {
                dict.update(ops::mapping_pairs(&source)?);
            }
            dict.update(keywords);
            Ok(Value::Null)
        }
        "pop" => {
            args.finish("pop", 1, 2)?;
            let key = ops::dict_key(&args.take_or_null(0))?;
            match (dict.delete(&key), args.take(1)) {
                (Some(value), _) | (None, Some(value)) => Ok(value),
                (None, None) => Err(EvalError::Key(key)),
            }
        }
        "setdefault" => {
            args.finish("setdefault", 1, 2)?;
            let key = ops::dict_key(&args.take_or_null(0))?;
            if let Some(existing) = dict.get(&key) {
                return Ok(existing);
            }
            let value = args.take_or_null(1);
            dict.set(key.as_str(), value);
            Ok(dict.get(&key).unwrap_or(Value::Null))
        }
        "copy" => {
            args.finish("copy", 0, 0)?;
            Ok(Value::dict_from_pairs(dict.items()))
        }
        _ => Err(no_method("dict", name)),
    }
}

fn str_arg(value: &Value, what: &str) -> Result<String, EvalError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(EvalError::type_error(format!(
            "{what} must be str, not '{}'",
            other.type_name()
        ))),
    }
}

/// `None` or a string
fn optional_str(value: Option<Value>, what: &str) -> Result<Option<String>, EvalError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => str_arg(&v, what).map(Some),
    }
}

fn str_method(s: &str, name: &str, mut args: Arguments) -> Result<Value, EvalError> {
    match name {
        "upper" => {
            args.finish("upper", 0, 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            args.finish("lower", 0, 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "strip" => {
            args.finish("strip", 0, 1)?;
            Ok(Value::Str(match optional_str(args.take(0), "strip arg")? {
                Some(chars) => s.trim_matches(|c: char| chars.contains(c)).to_string(),
                None => s.trim().to_string(),
            }))
        }
        "split" => {
            let maxsplit_kw = args.keyword("maxsplit");
            let sep_kw = args.keyword("sep");
            args.finish("split", 0, 2)?;
            let sep = optional_str(args.take(0).or(sep_kw), "separator")?;
            let maxsplit = match args.take(1).or(maxsplit_kw) {
                Some(v) => ops::int_arg(&v, "maxsplit")?,
                None => -1,
            };
            split(s, sep.as_deref(), maxsplit)
        }
        "join" => {
            args.finish("join", 1, 1)?;
            let parts = ops::iterate(&args.take_or_null(0))?
                .iter()
                .map(|part| str_arg(part, "sequence item"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(parts.join(s)))
        }
        "replace" => {
            args.finish("replace", 2, 3)?;
            let old = str_arg(&args.take_or_null(0), "replace arg")?;
            let new = str_arg(&args.take_or_null(1), "replace arg")?;
            Ok(Value::Str(match args.take(2) {
                Some(count) => match ops::int_arg(&count, "count")? {
                    n if n < 0 => s.replace(&old, &new),
                    n => s.replacen(&old, &new, usize::try_from(n).unwrap_or(usize::MAX)),
                },
                None => s.replace(&old, &new),
            }))
        }
        "startswith" | "endswith" => {
            args.finish(name, 1, 1)?;
            let candidates = match args.take_or_null(0) {
                Value::Tuple(items) => items
                    .iter()
                    .map(|item| str_arg(item, "tuple item"))
                    .collect::<Result<Vec<_>, _>>()?,
                other => vec![str_arg(&other, &format!("{name} first arg"))?],
            };
            let hit = candidates.iter().any(|c| {
                if name == "startswith" {
                    s.starts_with(c.as_str())
                } else {
                    s.ends_with(c.as_str())
                }
            });
            Ok(Value::Bool(hit))
        }
        _ => Err(no_method("str", name)),
    }
}

fn split(s: &str, sep: Option<&str>, maxsplit: i64) -> Result<Value, EvalError> {
    let limit = usize::try_from(maxsplit).ok();
    let parts: Vec<String> = match sep {
        Some("") => return Err(EvalError::value_error("empty separator")),
        Some(sep) => match limit {
            Some(n) => s.splitn(n.saturating_add(1), sep).map(str::to_string).collect(),
            None => s.split(sep).map(str::to_string).collect(),
        },
        None => {
            let mut parts = Vec::new();
            let mut rest = s.trim_start();
            while !rest.is_empty() {
                if limit.is_some_and(|n| parts.len() == n) {
                    parts.push(rest.to_string());
                    break;
                }
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                parts.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            parts
        }
    };
    Ok(Value::list(parts.into_iter().map(Value::Str).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ScopeOptions;
    use dogma_core::{dogmatize, from_json, to_json};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn run(fixed: JsonValue, source: &str) -> DictRef {
        let Value::Dict(env) = dogmatize(&from_json(&fixed)) else {
            panic!("fixed must be an object");
        };
        let options = ScopeOptions::default();
        let block = dogma_lang::parse_block(source).unwrap();
        Interpreter::new(env.clone(), IndexMap::new(), &options)
            .run(&block)
            .unwrap();
        env
    }

    fn get(env: &DictRef, name: &str) -> JsonValue {
        to_json(&env.get(name).unwrap()).unwrap()
    }

    #[test]
    fn list_methods() {
        let env = run(
            json!({}),
            "xs = [3, 1, 2]\nxs.append(4)\nxs.insert(0, 9)\nxs.remove(1)\n\
             last = xs.pop()\nxs.sort(reverse=True)\nat = xs.index(3)\nys = xs.copy()\nys.reverse()",
        );
        assert_eq!(get(&env, "xs"), json!([9, 3, 2]));
        assert_eq!(get(&env, "ys"), json!([2, 3, 9]));
        assert_eq!(get(&env, "last"), json!(4));
        assert_eq!(get(&env, "at"), json!(1));
    }

    #[test]
    fn frozen_list_mutators_are_silent() {
        let env = run(
            json!({"xs": [2, 1]}),
            "xs.append(3)\nxs.extend([4])\nxs.sort()\nxs.reverse()\nxs.remove(2)\nn = xs.count(1)\nys = xs.copy()\nys.append(0)",
        );
        assert_eq!(get(&env, "xs"), json!([2, 1]));
        assert_eq!(get(&env, "n"), json!(1));
        assert_eq!(get(&env, "ys"), json!([2, 1, 0]));
    }

    #[test]
    fn dict_methods() {
        let env = run(
            json!({"opt": {"name": "sgd"}}),
            "d = {'a': 1}\nd.update({'b': 2}, c=3)\nb = d.pop('b')\nz = d.pop('zz', 0)\n\
             s = d.setdefault('e', 5)\ng = d.get('missing', 'dflt')\nitems = d.items()\n\
             opt.update(name='adam', lr=0.1)\nkept = opt.pop('name')",
        );
        assert_eq!(get(&env, "d"), json!({"a": 1, "c": 3, "e": 5}));
        assert_eq!(get(&env, "b"), json!(2));
        assert_eq!(get(&env, "z"), json!(0));
        assert_eq!(get(&env, "s"), json!(5));
        assert_eq!(get(&env, "g"), json!("dflt"));
        assert_eq!(get(&env, "items"), json!([["a", 1], ["c", 3], ["e", 5]]));
        assert_eq!(get(&env, "opt"), json!({"name": "sgd", "lr": 0.1}));
        assert_eq!(get(&env, "kept"), json!("sgd"));
    }

    #[test]
    fn str_methods() {
        let env = run(
            json!({}),
            "a = '  Hi There '.strip().lower()\nb = 'a,b,,c'.split(',', 2)\nc = ' x  y '.split()\n\
             d = '-'.join(['p', 'q'])\ne = 'aaa'.replace('a', 'b', 2)\nf = 'model.pt'.endswith(('.pt', '.bin'))",
        );
        assert_eq!(get(&env, "a"), json!("hi there"));
        assert_eq!(get(&env, "b"), json!(["a", "b", ",c"]));
        assert_eq!(get(&env, "c"), json!(["x", "y"]));
        assert_eq!(get(&env, "d"), json!("p-q"));
        assert_eq!(get(&env, "e"), json!("bba"));
        assert_eq!(get(&env, "f"), json!(true));
    }

    #[test]
    fn method_errors() {
        let err = split("x", Some(""), -1).unwrap_err();
        assert!(matches!(err, EvalError::Value(_)));
        assert_eq!(
            no_method("int", "bit_length").to_string(),
            "type error: 'int' object has no method 'bit_length'"
        );
    }
}
