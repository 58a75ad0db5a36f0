//! LSTF semantic core — §1 overview.
//!
//! This crate owns the typed AST, symbol table and the two depth-first
//! passes (symbol resolution, §4.5; semantic analysis, §4.6) that turn a
//! parsed LSTF file into a fully-typed, fully-resolved tree or a set of
//! diagnostics. The scanner, parser, bytecode emitter, VM and JSON-RPC/LSP
//! client layers named in §1 as this crate's neighbors are out of scope
//! ([AMBIENT-1]) — a caller is expected to hand this crate an already-parsed
//! [`ast::File`] and read back [`context::CompilationContext::sink`].

pub mod analyzer;
pub mod ast;
pub mod context;
pub mod diagnostics;
pub mod node;
pub mod resolver;
pub mod source_ref;
pub mod symbols;
pub mod types;

pub use analyzer::SemanticAnalyzer;
pub use context::CompilationContext;
pub use diagnostics::{Diagnostic, DiagnosticsSink, Severity};
pub use resolver::SymbolResolver;

use ast::File;

/// Runs both passes over `file` in order, short-circuiting before the
/// analyzer if resolution already failed — §7 "a pass with any errors
/// prevents the subsequent pass from running" — and returns whether the
/// analyzer ran at all (as opposed to `ctx.sink.has_errors()`, which is also
/// true when the analyzer itself reported something).
///
/// Mirrors `Compiler::compile_str`, which runs its parser,
/// semantic analyser and back-end generator in a fixed sequence and bails
/// out of the pipeline the moment one stage fails, minus the parser/codegen
/// stages this crate doesn't implement ([AMBIENT-4]).
pub fn compile_file(ctx: &CompilationContext, file: &File) -> bool {
    let mut resolver = SymbolResolver::new(ctx);
    resolver.resolve_file(file);

    if ctx.sink.has_errors() {
        return false;
    }

    let mut analyzer = SemanticAnalyzer::new(ctx);
    analyzer.analyze_file(file);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, ExprKind, Literal, Stmt, StmtKind};
    use crate::source_ref::{Location, SourceRef};
    use crate::symbols::{FunctionSymbol, SymbolData, SymbolHeader, SymbolKind};
    use std::cell::RefCell;

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(1, 1), Location::new(1, 1))
    }

    fn make_file() -> File {
        let block = Block::new(dummy_ref());
        block.install_builtins();
        let main_fn = SymbolData::new_floating(
            SymbolHeader { name: "main".into(), is_builtin: true, source_ref: dummy_ref() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![],
                return_type: RefCell::new(types::DataType::Void),
                is_async: false,
                is_instance: false,
                has_block: true,
                body: RefCell::new(None),
                scope: block.scope.clone(),
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire();
        File::new("t.lstf", "", block, main_fn)
    }

    #[test]
    fn analyzer_does_not_run_after_an_undeclared_name_error() {
        let ctx = CompilationContext::new();
        let file = make_file();
        let bad_name = ast::Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: "mystery".into() });
        file.main_block.push(Stmt::new(dummy_ref(), StmtKind::Expression(bad_name)));

        let analyzer_ran = compile_file(&ctx, &file);

        assert!(!analyzer_ran);
        // only the resolver's undeclared-name error; the analyzer's
        // mandatory-assignment check never gets a chance to add its own two.
        assert_eq!(ctx.sink.error_count(), 1);
    }

    #[test]
    fn clean_file_runs_both_passes_and_flags_missing_mandatory_assignments() {
        let ctx = CompilationContext::new();
        let file = make_file();
        let literal = ast::Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1)));
        file.main_block.push(Stmt::new(dummy_ref(), StmtKind::Expression(literal)));

        let analyzer_ran = compile_file(&ctx, &file);

        assert!(analyzer_ran);
        assert_eq!(ctx.sink.error_count(), 2);
    }
}
