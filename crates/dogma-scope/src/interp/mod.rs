//! Block interpreter
//!
//! Statements run against a [`DictRef`] namespace, so every top-level
//! binding goes through the protected-key rules of the dogmatic dict.
//! Names resolve through local frames (lambda parameters, comprehension
//! variables), then the namespace, then injected globals, then builtins.

mod args;
pub(crate) mod builtins;
mod methods;
pub(crate) mod ops;

use std::rc::Rc;

use indexmap::IndexMap;

use dogma_core::{DictRef, DogmaticDict, Value};
use dogma_lang::{
    BinaryOp, Block, CallArgs, Expr, ForClause, Literal, SliceExpr, Stmt, StmtKind, Target,
};

use crate::error::{EvalError, ScopeError};
use crate::function::{Frame, Function, NativeFunction};
use crate::options::ScopeOptions;

pub(crate) use args::Arguments;
use builtins::Builtin;

type Bounds = (Option<i64>, Option<i64>, Option<i64>);

/// Executes one block against one namespace
pub(crate) struct Interpreter<'a> {
    env: DictRef,
    globals: IndexMap<String, Value>,
    options: &'a ScopeOptions,
    frames: Vec<Rc<Frame>>,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        env: DictRef,
        globals: IndexMap<String, Value>,
        options: &'a ScopeOptions,
    ) -> Self {
        Self {
            env,
            globals,
            options,
            frames: Vec::new(),
            depth: 0,
        }
    }

    /// Run every statement, tagging failures with their line
    pub(crate) fn run(&mut self, block: &Block) -> Result<(), ScopeError> {
        for stmt in &block.body {
            self.exec(stmt)
                .map_err(|source| ScopeError::Eval { line: stmt.line, source })?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), EvalError> {
        match &stmt.kind {
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
                Ok(())
            }
            StmtKind::AugAssign { target, op, value } => self.aug_assign(target, *op, value),
            StmtKind::Delete(targets) => targets.iter().try_for_each(|t| self.delete(t)),
            StmtKind::Expr(expr) => self.eval(expr).map(drop),
            StmtKind::Pass => Ok(()),
        }
    }

    // === Targets ===

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), EvalError> {
        match target {
            Target::Name(name) => {
                self.env.set(name.as_str(), value);
                Ok(())
            }
            Target::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                set_item(&object, &index, value)
            }
            Target::Slice { object, slice } => {
                let object = self.eval(object)?;
                let bounds = self.eval_slice(slice)?;
                set_slice(&object, bounds, &value)
            }
            Target::Unpack(targets) => {
                let items = ops::iterate(&value)?;
                if items.len() != targets.len() {
                    return Err(EvalError::value_error(format!(
                        "expected {} values to unpack, got {}",
                        targets.len(),
                        items.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item)?;
                }
                Ok(())
            }
        }
    }

    fn aug_assign(&mut self, target: &Target, op: BinaryOp, value: &Expr) -> Result<(), EvalError> {
        match target {
            Target::Name(name) => {
                let current = self.lookup(name)?;
                let rhs = self.eval(value)?;
                let result = in_place(op, current, &rhs, self.options.max_sequence_len)?;
                self.env.set(name.as_str(), result);
                Ok(())
            }
            Target::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                let current = get_item(&object, &index)?;
                let rhs = self.eval(value)?;
                let result = in_place(op, current, &rhs, self.options.max_sequence_len)?;
                set_item(&object, &index, result)
            }
            Target::Slice { object, slice } => {
                let object = self.eval(object)?;
                let bounds = self.eval_slice(slice)?;
                let current = get_slice(&object, bounds)?;
                let rhs = self.eval(value)?;
                let result = in_place(op, current, &rhs, self.options.max_sequence_len)?;
                set_slice(&object, bounds, &result)
            }
            Target::Unpack(_) => Err(EvalError::type_error(
                "illegal expression for augmented assignment",
            )),
        }
    }

    fn delete(&mut self, target: &Target) -> Result<(), EvalError> {
        match target {
            Target::Name(name) => {
                if !self.env.borrow().contains_key(name) {
                    return Err(EvalError::Name(name.clone()));
                }
                self.env.delete(name);
                Ok(())
            }
            Target::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                delete_item(&object, &index)
            }
            Target::Slice { object, slice } => {
                let object = self.eval(object)?;
                let bounds = self.eval_slice(slice)?;
                delete_slice(&object, bounds)
            }
            Target::Unpack(targets) => targets.iter().try_for_each(|t| self.delete(t)),
        }
    }

    // === Expressions ===

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.frames.iter().rev().find_map(|frame| frame.get(name)) {
            return Ok(value.clone());
        }
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        Builtin::lookup(name)
            .map(|builtin| Value::Opaque(Rc::new(builtin)))
            .ok_or_else(|| EvalError::Name(name.to_string()))
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(x) => Value::Float(*x),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::list(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(items)?)),
            Expr::Dict(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = ops::dict_key(&self.eval(key)?)?;
                    let value = self.eval(value)?;
                    map.insert(key, value);
                }
                Ok(Value::dict(DogmaticDict::from_entries(map)))
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                ops::unary(*op, &operand)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                ops::binary(*op, &lhs, &rhs, self.options.max_sequence_len)
            }
            Expr::Compare { first, rest } => {
                let mut lhs = self.eval(first)?;
                for (op, expr) in rest {
                    let rhs = self.eval(expr)?;
                    if !ops::compare(*op, &lhs, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.is_truthy() {
                    self.eval(rhs)
                } else {
                    Ok(lhs)
                }
            }
            Expr::Or(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(rhs)
                }
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Lambda(def) => Ok(Value::Opaque(Rc::new(Function {
                def: Rc::clone(def),
                captured: self.frames.clone(),
            }))),
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = self.eval_args(args)?;
                self.call(&callee, args)
            }
            Expr::Method {
                receiver,
                name,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_args(args)?;
                methods::call_method(self, &receiver, name, args)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                get_item(&object, &index)
            }
            Expr::Slice { object, slice } => {
                let object = self.eval(object)?;
                let bounds = self.eval_slice(slice)?;
                get_slice(&object, bounds)
            }
            Expr::ListComp(comp) => {
                let mut out = Vec::new();
                self.comprehend(&comp.clause, &mut |interp| {
                    out.push(interp.eval(&comp.element)?);
                    Ok(())
                })?;
                Ok(Value::list(out))
            }
            Expr::DictComp(comp) => {
                let mut map = IndexMap::new();
                self.comprehend(&comp.clause, &mut |interp| {
                    let key = ops::dict_key(&interp.eval(&comp.key)?)?;
                    let value = interp.eval(&comp.value)?;
                    map.insert(key, value);
                    Ok(())
                })?;
                Ok(Value::dict(DogmaticDict::from_entries(map)))
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_args(&mut self, args: &CallArgs) -> Result<Arguments, EvalError> {
        let positional = self.eval_all(&args.positional)?;
        let keyword = args
            .keyword
            .iter()
            .map(|(name, expr)| Ok((name.clone(), self.eval(expr)?)))
            .collect::<Result<_, EvalError>>()?;
        Ok(Arguments::new(positional, keyword))
    }

    fn eval_slice(&mut self, slice: &SliceExpr) -> Result<Bounds, EvalError> {
        let mut bound = |expr: &Option<Box<Expr>>| -> Result<Option<i64>, EvalError> {
            match expr {
                None => Ok(None),
                Some(expr) => match self.eval(expr)? {
                    Value::Null => Ok(None),
                    value => ops::int_arg(&value, "slice indices").map(Some),
                },
            }
        };
        Ok((bound(&slice.lower)?, bound(&slice.upper)?, bound(&slice.step)?))
    }

    /// Run `each` once per item of the clause, with loop variables bound
    fn comprehend(
        &mut self,
        clause: &ForClause,
        each: &mut dyn FnMut(&mut Self) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let iterable = self.eval(&clause.iter)?;
        for item in ops::iterate(&iterable)? {
            let frame = bind_loop_variables(&clause.targets, item)?;
            self.frames.push(Rc::new(frame));
            let result = self.comprehension_step(clause, each);
            self.frames.pop();
            result?;
        }
        Ok(())
    }

    fn comprehension_step(
        &mut self,
        clause: &ForClause,
        each: &mut dyn FnMut(&mut Self) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        if let Some(condition) = &clause.condition {
            if !self.eval(condition)?.is_truthy() {
                return Ok(());
            }
        }
        each(self)
    }

    // === Calls ===

    pub(crate) fn call(&mut self, callee: &Value, args: Arguments) -> Result<Value, EvalError> {
        if let Value::Opaque(object) = callee {
            let any = object.as_any();
            if let Some(function) = any.downcast_ref::<Function>() {
                return self.call_function(function, args);
            }
            if let Some(native) = any.downcast_ref::<NativeFunction>() {
                if !args.keyword.is_empty() {
                    return Err(EvalError::type_error(format!(
                        "{}() takes no keyword arguments",
                        native.name()
                    )));
                }
                return native.call(&args.positional);
            }
            if let Some(builtin) = any.downcast_ref::<Builtin>() {
                return builtins::call(self, *builtin, args);
            }
        }
        Err(EvalError::type_error(format!(
            "'{}' object is not callable",
            callee.type_name()
        )))
    }

    fn call_function(&mut self, function: &Function, args: Arguments) -> Result<Value, EvalError> {
        let params = &function.def.params;
        let Arguments {
            positional,
            keyword,
        } = args;
        if positional.len() > params.len() {
            return Err(EvalError::type_error(format!(
                "<lambda>() takes {} positional arguments but {} were given",
                params.len(),
                positional.len()
            )));
        }

        let mut frame: Frame = params.iter().cloned().zip(positional).collect();
        for (name, value) in keyword {
            if !params.contains(&name) {
                return Err(EvalError::type_error(format!(
                    "<lambda>() got an unexpected keyword argument '{name}'"
                )));
            }
            if frame.contains_key(&name) {
                return Err(EvalError::type_error(format!(
                    "<lambda>() got multiple values for argument '{name}'"
                )));
            }
            frame.insert(name, value);
        }
        if let Some(missing) = params.iter().find(|p| !frame.contains_key(*p)) {
            return Err(EvalError::type_error(format!(
                "<lambda>() missing required argument '{missing}'"
            )));
        }

        if self.depth >= self.options.max_call_depth {
            return Err(EvalError::RecursionLimit(self.options.max_call_depth));
        }
        let mut frames = function.captured.clone();
        frames.push(Rc::new(frame));
        let saved = std::mem::replace(&mut self.frames, frames);
        self.depth += 1;
        let result = self.eval(&function.def.body);
        self.depth -= 1;
        self.frames = saved;
        result
    }
}

fn bind_loop_variables(targets: &[String], item: Value) -> Result<Frame, EvalError> {
    if let [name] = targets {
        return Ok(Frame::from([(name.clone(), item)]));
    }
    let items = ops::iterate(&item)?;
    if items.len() != targets.len() {
        return Err(EvalError::value_error(format!(
            "expected {} values to unpack, got {}",
            targets.len(),
            items.len()
        )));
    }
    Ok(targets.iter().cloned().zip(items).collect())
}

/// `op=`: lists extend or repeat in place, frozen lists ignore it, others rebind
fn in_place(
    op: BinaryOp,
    current: Value,
    rhs: &Value,
    max_len: usize,
) -> Result<Value, EvalError> {
    match (&current, op) {
        (Value::List(items), BinaryOp::Add) => {
            let extra = ops::iterate(rhs)?;
            items.borrow_mut().extend(extra);
            Ok(current)
        }
        (Value::List(items), BinaryOp::Mul) if matches!(rhs, Value::Int(_) | Value::Bool(_)) => {
            let times = usize::try_from(ops::int_arg(rhs, "repeat counts")?).unwrap_or(0);
            let repeated = ops::repeat_items(&items.borrow(), times, max_len)?;
            *items.borrow_mut() = repeated;
            Ok(current)
        }
        (Value::FrozenList(list), BinaryOp::Add) => {
            ops::iterate(rhs)?;
            let _ = list.add_assign(rhs);
            Ok(current)
        }
        (Value::FrozenList(list), BinaryOp::Mul) if matches!(rhs, Value::Int(_) | Value::Bool(_)) => {
            let _ = list.mul_assign(ops::int_arg(rhs, "repeat counts")?);
            Ok(current)
        }
        _ => ops::binary(op, &current, rhs, max_len),
    }
}

fn index_into(items: &[Value], index: &Value, kind: &str) -> Result<Value, EvalError> {
    let i = ops::int_arg(index, &format!("{kind} indices"))?;
    ops::normalize_index(i, items.len())
        .map(|pos| items[pos].clone())
        .ok_or_else(|| EvalError::Index(format!("{kind} index out of range")))
}

fn get_item(object: &Value, index: &Value) -> Result<Value, EvalError> {
    match object {
        Value::Dict(dict) => index
            .as_str()
            .and_then(|key| dict.get(key))
            .ok_or_else(|| EvalError::Key(index.to_string())),
        Value::List(items) => index_into(&items.borrow(), index, "list"),
        Value::FrozenList(list) => index_into(list.as_slice(), index, "list"),
        Value::Tuple(items) => index_into(items, index, "tuple"),
        Value::Str(s) => {
            let chars: Vec<Value> = s.chars().map(|c| Value::Str(c.to_string())).collect();
            index_into(&chars, index, "string")
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn get_slice(object: &Value, (lower, upper, step): Bounds) -> Result<Value, EvalError> {
    let select = |items: &[Value]| -> Result<Vec<Value>, EvalError> {
        Ok(ops::slice_indices(items.len(), lower, upper, step)?
            .into_iter()
            .map(|i| items[i].clone())
            .collect())
    };
    match object {
        Value::List(items) => Ok(Value::list(select(&items.borrow())?)),
        Value::FrozenList(list) => Ok(Value::list(select(list.as_slice())?)),
        Value::Tuple(items) => Ok(Value::tuple(select(items)?)),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(
                ops::slice_indices(chars.len(), lower, upper, step)?
                    .into_iter()
                    .map(|i| chars[i])
                    .collect(),
            ))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn set_item(object: &Value, index: &Value, value: Value) -> Result<(), EvalError> {
    match object {
        Value::Dict(dict) => {
            dict.set(ops::dict_key(index)?, value);
            Ok(())
        }
        Value::List(items) => {
            let i = ops::int_arg(index, "list indices")?;
            let mut items = items.borrow_mut();
            let pos = ops::normalize_index(i, items.len())
                .ok_or_else(|| EvalError::Index("list assignment index out of range".into()))?;
            items[pos] = value;
            Ok(())
        }
        Value::FrozenList(list) => {
            list.set_item(ops::int_arg(index, "list indices")?, value);
            Ok(())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

fn set_slice(object: &Value, (lower, upper, step): Bounds, value: &Value) -> Result<(), EvalError> {
    match object {
        Value::List(items) => {
            if step.is_some_and(|s| s != 1) {
                return Err(EvalError::value_error(
                    "extended slice assignment is not supported",
                ));
            }
            let replacement = ops::iterate(value)?;
            let mut items = items.borrow_mut();
            let (start, stop) = ops::slice_bounds(items.len(), lower, upper);
            items.splice(start..stop, replacement);
            Ok(())
        }
        Value::FrozenList(list) => {
            list.set_slice(lower, upper, ops::iterate(value)?);
            Ok(())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object does not support slice assignment",
            other.type_name()
        ))),
    }
}

fn delete_item(object: &Value, index: &Value) -> Result<(), EvalError> {
    match object {
        Value::Dict(dict) => {
            let key = ops::dict_key(index)?;
            if !dict.borrow().contains_key(&key) {
                return Err(EvalError::Key(index.to_string()));
            }
            dict.delete(&key);
            Ok(())
        }
        Value::List(items) => {
            let i = ops::int_arg(index, "list indices")?;
            let mut items = items.borrow_mut();
            let pos = ops::normalize_index(i, items.len())
                .ok_or_else(|| EvalError::Index("list assignment index out of range".into()))?;
            items.remove(pos);
            Ok(())
        }
        Value::FrozenList(list) => {
            list.delete_item(ops::int_arg(index, "list indices")?);
            Ok(())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object does not support item deletion",
            other.type_name()
        ))),
    }
}

fn delete_slice(object: &Value, (lower, upper, step): Bounds) -> Result<(), EvalError> {
    match object {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let mut doomed = ops::slice_indices(items.len(), lower, upper, step)?;
            doomed.sort_unstable();
            for pos in doomed.into_iter().rev() {
                items.remove(pos);
            }
            Ok(())
        }
        Value::FrozenList(list) => {
            ops::slice_indices(list.len(), lower, upper, step)?;
            list.delete_slice(lower, upper);
            Ok(())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object does not support item deletion",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogma_core::{dogmatize, from_json, to_json};
    use dogma_lang::parse_block;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn run_with(fixed: JsonValue, source: &str) -> Result<DictRef, ScopeError> {
        let Value::Dict(env) = dogmatize(&from_json(&fixed)) else {
            panic!("fixed must be an object");
        };
        let options = ScopeOptions::default();
        let block = parse_block(source)?;
        Interpreter::new(env.clone(), IndexMap::new(), &options).run(&block)?;
        Ok(env)
    }

    fn run(source: &str) -> DictRef {
        run_with(json!({}), source).unwrap()
    }

    fn get(env: &DictRef, name: &str) -> JsonValue {
        to_json(&env.get(name).unwrap()).unwrap()
    }

    fn eval_error(source: &str) -> EvalError {
        match run_with(json!({}), source) {
            Err(ScopeError::Eval { source, .. }) => source,
            other => panic!("expected an evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn assignments_and_arithmetic() {
        let env = run("a = 1 + 2 * 3\nb = a // 2; c = -a ** 2\nd = 7 / 2\ne = 'x' * 3");
        assert_eq!(get(&env, "a"), json!(7));
        assert_eq!(get(&env, "b"), json!(3));
        assert_eq!(get(&env, "c"), json!(-49));
        assert_eq!(get(&env, "d"), json!(3.5));
        assert_eq!(get(&env, "e"), json!("xxx"));
    }

    #[test]
    fn containers_alias() {
        let env = run("a = [1]\nb = a\nb.append(2)\nd = {'k': []}\nd['k'] += [1]");
        assert_eq!(get(&env, "a"), json!([1, 2]));
        assert_eq!(get(&env, "d"), json!({"k": [1]}));
    }

    #[test]
    fn unpacking_and_chained_assignment() {
        let env = run("x, (y, z) = 1, [2, 3]\np = q = 'v'");
        assert_eq!(get(&env, "y"), json!(2));
        assert_eq!(get(&env, "z"), json!(3));
        assert_eq!(get(&env, "q"), json!("v"));
        assert!(matches!(eval_error("a, b = [1]"), EvalError::Value(_)));
    }

    #[test]
    fn slices() {
        let env = run("xs = list(range(6))\nys = xs[::-2]\nxs[1:3] = ['a']\ndel xs[-1]\nzs = 'hello'[1:3]");
        assert_eq!(get(&env, "ys"), json!([5, 3, 1]));
        assert_eq!(get(&env, "xs"), json!([0, "a", 3, 4]));
        assert_eq!(get(&env, "zs"), json!("el"));
    }

    #[test]
    fn comprehensions_bind_locally() {
        let env = run("sq = [x * x for x in range(4) if x % 2 == 0]\ninv = {v: k for k, v in {'a': 'b'}.items()}");
        assert_eq!(get(&env, "sq"), json!([0, 4]));
        assert_eq!(get(&env, "inv"), json!({"b": "a"}));
        assert!(env.get("x").is_none());
    }

    #[test]
    fn lambdas_capture_and_recurse() {
        let env = run(
            "fact = lambda n: 1 if n <= 1 else n * fact(n - 1)\n\
             adders = [lambda y: x + y for x in [1, 2]]\n\
             a = fact(5)\nb = adders[1](10)\nc = (lambda p, q: p - q)(q=1, p=5)",
        );
        assert_eq!(get(&env, "a"), json!(120));
        assert_eq!(get(&env, "b"), json!(12));
        assert_eq!(get(&env, "c"), json!(4));
    }

    #[test]
    fn unbounded_recursion_hits_the_limit() {
        assert_eq!(eval_error("f = lambda: f()\nf()"), EvalError::RecursionLimit(64));
    }

    #[test]
    fn comparing_distinct_cycles_hits_the_limit() {
        let lists = "a = []\na.append(a)\nb = []\nb.append(b)\n";
        for check in [
            "c = a == b",
            "c = a != b",
            "c = a < b",
            "c = a in [b]",
            "c = [b].index(a)",
            "c = [b].count(a)",
            "[b].remove(a)",
        ] {
            assert_eq!(
                eval_error(&format!("{lists}{check}")),
                EvalError::RecursionLimit(ops::COMPARE_DEPTH),
                "{check}"
            );
        }

        let dicts = "d = {}\nd['k'] = d\ne = {}\ne['k'] = e\nc = d == e";
        assert_eq!(eval_error(dicts), EvalError::RecursionLimit(ops::COMPARE_DEPTH));

        let env = run("a = []\na.append(a)\nsame = a == a\ninside = a in a");
        assert_eq!(get(&env, "same"), json!(true));
        assert_eq!(get(&env, "inside"), json!(true));
    }

    #[test]
    fn oversized_sequences_are_refused() {
        assert_eq!(eval_error("s = 'x' * 10 ** 12"), EvalError::Overflow("*"));
        assert_eq!(eval_error("xs = [0]\nxs *= 10 ** 12"), EvalError::Overflow("*"));
        assert_eq!(eval_error("r = range(10 ** 12)"), EvalError::Overflow("range"));
        assert_eq!(eval_error("r = range(0, 10 ** 12, 2)"), EvalError::Overflow("range"));
    }

    #[test]
    fn boolean_operators_short_circuit() {
        let env = run("a = 0 or 'fallback'\nb = None and undefined_name\nc = 1 < 2 < 3\nd = not []");
        assert_eq!(get(&env, "a"), json!("fallback"));
        assert_eq!(get(&env, "b"), json!(null));
        assert_eq!(get(&env, "c"), json!(true));
        assert_eq!(get(&env, "d"), json!(true));
    }

    #[test]
    fn fixed_keys_ignore_assignment() {
        let env = run_with(
            json!({"lr": 0.1, "layers": [64, 64], "opt": {"name": "sgd"}}),
            "lr = 0.5\nlayers.append(32)\nlayers += [1]\nlayers[0] = 1\ndel layers[0]\nopt['name'] = 'adam'\nopt['momentum'] = 0.9\ndel lr",
        )
        .unwrap();
        assert_eq!(get(&env, "lr"), json!(0.1));
        assert_eq!(get(&env, "layers"), json!([64, 64]));
        assert_eq!(get(&env, "opt"), json!({"name": "sgd", "momentum": 0.9}));
    }

    #[test]
    fn popping_a_fixed_list_fails() {
        let err = run_with(json!({"xs": [1]}), "a = 1\nxs.pop()").unwrap_err();
        match err {
            ScopeError::Eval { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(source, EvalError::Unsupported(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(eval_error("y = missing"), EvalError::Name("missing".into()));
        assert!(matches!(eval_error("y = {}['k']"), EvalError::Key(_)));
        assert!(matches!(eval_error("y = [][0]"), EvalError::Index(_)));
        assert!(matches!(eval_error("y = 1 + 'a'"), EvalError::Type(_)));
        assert!(matches!(eval_error("y = 1 % 0"), EvalError::ZeroDivision));
        assert!(matches!(eval_error("y = (1)(2)"), EvalError::Type(_)));
        assert!(matches!(eval_error("del nothing"), EvalError::Name(_)));
    }
}
