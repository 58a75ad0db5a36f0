//! Statements (C5) — §4.4.

use std::cell::Cell;

use crate::ast::block::Block;
use crate::ast::expr::Expr;
use crate::source_ref::SourceRef;
use crate::symbols::SymbolHandle;

pub enum StmtKind {
    /// Wraps a symbol (variable, function, or type symbol) being introduced
    /// into the current scope.
    Declaration { symbol: SymbolHandle },
    /// `is_declaration` marks a `let` binding as opposed to a plain `=`.
    Assignment { lhs: Expr, rhs: Expr, is_declaration: bool },
    Expression(Expr),
    /// `lhs == rhs`; [SUPPLEMENT-1] assigns each pattern test a stable
    /// `test_id` the first time the resolver visits it.
    PatternTest { lhs: Expr, rhs: Expr, test_id: Cell<Option<u32>> },
    If { condition: Expr, then_block: Box<Block>, else_block: Option<Box<Block>> },
    Return { value: Option<Expr> },
    Assert { condition: Expr },
}

pub struct Stmt {
    pub source_ref: SourceRef,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(source_ref: SourceRef, kind: StmtKind) -> Stmt {
        Stmt { source_ref, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{Expr, ExprKind, Literal};
    use crate::source_ref::Location;

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(1, 1), Location::new(1, 1))
    }

    #[test]
    fn pattern_test_starts_without_an_id() {
        let lhs = Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1)));
        let rhs = Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1)));
        let stmt = Stmt::new(dummy_ref(), StmtKind::PatternTest { lhs, rhs, test_id: Cell::new(None) });
        match &stmt.kind {
            StmtKind::PatternTest { test_id, .. } => assert!(test_id.get().is_none()),
            _ => unreachable!(),
        }
    }
}
