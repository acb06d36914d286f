//! Dogma Lang
//!
//! The block language that configuration scopes evaluate: a small sequence
//! of assignments and expressions, optionally under a `def name():` header.
//!
//! # Example
//!
//! ```rust
//! use dogma_lang::{parse_block, StmtKind};
//!
//! let block = parse_block("lr = 0.1\nlayers = [64, 64]\n").unwrap();
//! assert!(block.name.is_none());
//! assert!(matches!(block.body[0].kind, StmtKind::Assign { .. }));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

// Re-exports
pub use ast::{
    BinaryOp, Block, CallArgs, CompareOp, Comprehension, DictComprehension, Expr, ForClause,
    LambdaExpr, Literal, Param, Signature, SliceExpr, Stmt, StmtKind, Target, UnaryOp,
};
pub use parser::{parse_block, ParseError, ParseErrorKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
