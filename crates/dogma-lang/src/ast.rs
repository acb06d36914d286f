//! Syntax tree of a configuration block

use std::rc::Rc;

/// A parsed configuration block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Name from the `def` header, if the block had one
    pub name: Option<String>,
    /// Parameters from the `def` header; empty without a header
    pub signature: Signature,
    /// Statements in source order
    pub body: Vec<Stmt>,
}

/// Parameter list of a block header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Named parameters
    pub params: Vec<Param>,
    /// `*args` name
    pub varargs: Option<String>,
    /// `**kwargs` name
    pub kwargs: Option<String>,
}

impl Signature {
    /// True when the block takes no arguments of any kind
    #[inline]
    #[must_use]
    pub fn is_zero_argument(&self) -> bool {
        self.params.is_empty() && self.varargs.is_none() && self.kwargs.is_none()
    }

    /// Render as it would appear between the parentheses
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self.params.iter().map(|p| p.name.clone()).collect();
        if let Some(name) = &self.varargs {
            parts.push(format!("*{name}"));
        }
        if let Some(name) = &self.kwargs {
            parts.push(format!("**{name}"));
        }
        parts.join(", ")
    }
}

/// A named header parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Default value expression
    pub default: Option<Expr>,
}

/// A statement with its source line (1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What the statement does
    pub kind: StmtKind,
    /// Line the statement starts on
    pub line: usize,
}

/// Statement forms
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `a = b = value`
    Assign {
        /// Targets, assigned left to right
        targets: Vec<Target>,
        /// Assigned expression
        value: Expr,
    },
    /// `target op= value`
    AugAssign {
        /// Single target
        target: Target,
        /// Operator
        op: BinaryOp,
        /// Right-hand side
        value: Expr,
    },
    /// `del a, b[0]`
    Delete(Vec<Target>),
    /// Bare expression, evaluated for its effect
    Expr(Expr),
    /// `pass`
    Pass,
}

/// Assignment target
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Plain name
    Name(String),
    /// `object[index]`
    Index {
        /// Container
        object: Expr,
        /// Key or position
        index: Expr,
    },
    /// `object[lower:upper:step]`
    Slice {
        /// Container
        object: Expr,
        /// Bounds
        slice: SliceExpr,
    },
    /// `a, b` unpacking
    Unpack(Vec<Target>),
}

/// Slice bounds
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    /// Start
    pub lower: Option<Box<Expr>>,
    /// End
    pub upper: Option<Box<Expr>>,
    /// Step
    pub step: Option<Box<Expr>>,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Name lookup
    Name(String),
    /// `[a, b]`
    List(Vec<Expr>),
    /// `(a, b)`
    Tuple(Vec<Expr>),
    /// `{k: v}`
    Dict(Vec<(Expr, Expr)>),
    /// `-x`, `+x`, `not x`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Arithmetic
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Comparison chain `a < b <= c`
    Compare {
        /// Leftmost operand
        first: Box<Expr>,
        /// Operator/operand pairs
        rest: Vec<(CompareOp, Expr)>,
    },
    /// Short-circuit `and`
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit `or`
    Or(Box<Expr>, Box<Expr>),
    /// `then if condition else otherwise`
    Conditional {
        /// Condition
        condition: Box<Expr>,
        /// Value when true
        then: Box<Expr>,
        /// Value when false
        otherwise: Box<Expr>,
    },
    /// `lambda a, b: body`
    Lambda(Rc<LambdaExpr>),
    /// `callee(args)`
    Call {
        /// Called expression
        callee: Box<Expr>,
        /// Arguments
        args: CallArgs,
    },
    /// `receiver.name(args)`
    Method {
        /// Receiver
        receiver: Box<Expr>,
        /// Method name
        name: String,
        /// Arguments
        args: CallArgs,
    },
    /// `object[index]`
    Index {
        /// Container
        object: Box<Expr>,
        /// Key or position
        index: Box<Expr>,
    },
    /// `object[lower:upper:step]`
    Slice {
        /// Container
        object: Box<Expr>,
        /// Bounds
        slice: SliceExpr,
    },
    /// `[element for x in iter if cond]`
    ListComp(Box<Comprehension>),
    /// `{key: value for x in iter if cond}`
    DictComp(Box<DictComprehension>),
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `None`
    Null,
    /// `True` / `False`
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
}

/// Lambda definition
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    /// Parameter names
    pub params: Vec<String>,
    /// Body expression
    pub body: Expr,
}

/// Call arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments
    pub positional: Vec<Expr>,
    /// `name=value` arguments
    pub keyword: Vec<(String, Expr)>,
}

/// `for` clause shared by comprehensions
#[derive(Debug, Clone, PartialEq)]
pub struct ForClause {
    /// Loop variables (more than one unpacks each item)
    pub targets: Vec<String>,
    /// Iterated expression
    pub iter: Expr,
    /// Optional filter
    pub condition: Option<Expr>,
}

/// List comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    /// Produced element
    pub element: Expr,
    /// Loop
    pub clause: ForClause,
}

/// Dict comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct DictComprehension {
    /// Produced key
    pub key: Expr,
    /// Produced value
    pub value: Expr,
    /// Loop
    pub clause: ForClause,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Pos,
    /// `not`
    Not,
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

impl BinaryOp {
    /// Operator symbol
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl CompareOp {
    /// Operator symbol
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}
