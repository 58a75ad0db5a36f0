//! Typed-AST skeleton (C5) — §3, §4.4.

pub mod block;
pub mod expr;
pub mod stmt;

pub use block::{Block, File};
pub use expr::{BinaryOp, Expr, ExprKind, LambdaExpr, Literal, ObjectExpr, ObjectMember, UnaryOp};
pub use stmt::{Stmt, StmtKind};
