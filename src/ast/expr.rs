//! Expressions (C5) — §3 "Expression" entity and §4.4.
//!
//! Every expression owns its sub-expressions directly (`Box`/`Vec`); the
//! only non-owning edge is `symbol_reference`, a [`WeakSymbol`] the
//! resolver/analyzer fill in once a name or member access is resolved.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::block::Block;
use crate::source_ref::SourceRef;
use crate::symbols::{Scope, SymbolHandle, WeakSymbol};
use crate::types::DataType;

#[derive(Debug, Clone)]
pub enum Literal {
    Null,
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl Literal {
    /// §4.6 "Literal. Directly sets `value_type` from the literal kind."
    pub fn value_type(&self) -> DataType {
        match self {
            Literal::Null => DataType::Null,
            Literal::Integer(_) => DataType::Integer,
            Literal::Double(_) => DataType::Double,
            Literal::Boolean(_) => DataType::Boolean,
            Literal::String(_) => DataType::String,
        }
    }
}

/// §3 "Object expression": ordered `(name, is_nullable, value_expression)`
/// members plus `is_pattern`.
pub struct ObjectMember {
    pub name: String,
    pub is_nullable: bool,
    pub value: Expr,
}

pub struct ObjectExpr {
    pub members: Vec<ObjectMember>,
    pub is_pattern: bool,
}

/// A lambda's own scope/parameter list/captured-locals mirror
/// [`crate::symbols::FunctionSymbol`], but a lambda is an *expression*
/// variant rather than a named symbol (§3 only lists `function` under
/// `Symbol`; a lambda has no declared name to register in a scope).
pub struct LambdaExpr {
    pub parameters: Vec<SymbolHandle>,
    pub return_type: RefCell<Option<DataType>>,
    pub body: Box<Block>,
    pub is_async: bool,
    pub scope: Rc<Scope>,
    /// `Rc`-wrapped (rather than a bare `RefCell`) so a resolver walk can
    /// hold a cheap owned handle to a lambda's capture list on its closure
    /// stack instead of borrowing into the expression tree for the
    /// duration of the walk.
    pub captured_locals: Rc<RefCell<Vec<WeakSymbol>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
}

pub enum ExprKind {
    Literal(Literal),
    /// `inner? . name`; when `inner` is `None` the expression is a simple
    /// name (§4.4).
    MemberAccess { inner: Option<Box<Expr>>, name: String },
    ElementAccess { inner: Box<Expr>, index: Box<Expr> },
    MethodCall { receiver: Box<Expr>, name: String, args: Vec<Expr>, is_awaited: bool },
    Object(ObjectExpr),
    /// `is_pattern` marks a `[ ... ]` pattern array.
    Array { elements: Vec<Expr>, is_pattern: bool },
    /// `...`, only valid inside patterns (§4.4, error category 9).
    Ellipsis,
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Conditional { condition: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr> },
    Lambda(LambdaExpr),
}

pub struct Expr {
    pub source_ref: SourceRef,
    pub kind: ExprKind,
    pub symbol_reference: RefCell<WeakSymbol>,
    pub value_type: RefCell<Option<DataType>>,
}

impl Expr {
    pub fn new(source_ref: SourceRef, kind: ExprKind) -> Expr {
        Expr { source_ref, kind, symbol_reference: RefCell::new(WeakSymbol::none()), value_type: RefCell::new(None) }
    }

    /// True for a bare `name` reference, i.e. a trivial member access with
    /// no receiver (§4.5 point 3).
    pub fn is_simple_name(&self) -> bool {
        matches!(&self.kind, ExprKind::MemberAccess { inner: None, .. })
    }

    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::MemberAccess { inner: None, name } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_ref::Location;

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(1, 1), Location::new(1, 1))
    }

    #[test]
    fn literal_value_types() {
        assert!(matches!(Literal::Integer(3).value_type(), DataType::Integer));
        assert!(matches!(Literal::Null.value_type(), DataType::Null));
    }

    #[test]
    fn bare_name_is_simple() {
        let e = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: "x".into() });
        assert!(e.is_simple_name());
        assert_eq!(e.simple_name(), Some("x"));
    }

    #[test]
    fn qualified_access_is_not_simple() {
        let inner = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: "a".into() });
        let e = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: Some(Box::new(inner)), name: "b".into() });
        assert!(!e.is_simple_name());
    }
}
