//! Symbol resolver: the first of two depth-first walks over a parsed file.
//!
//! Carries an explicit [`ScopeStack`] (pushed on entering a block/function/
//! lambda/type-symbol scope, popped on exit) plus a stack of enclosing
//! function/lambda frames used for closure-capture propagation. Dispatch is
//! a plain `match` on node kind, mirroring `barracuda_pest_semantic_analyser.rs`'s
//! shape, but every failure is
//! reported through a [`crate::diagnostics::DiagnosticsSink`] rather than
//! `panic!`ing, so one bad declaration doesn't stop the rest of the walk.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{Block, Expr, ExprKind, File, LambdaExpr, Stmt, StmtKind};
use crate::context::CompilationContext;
use crate::source_ref::SourceRef;
use crate::symbols::{FunctionSymbol, ScopeStack, SymbolHandle, SymbolKind, TypeSymbolKind, WeakSymbol};
use crate::types::DataType;

/// A VM closure frame currently open during the walk, used to propagate
/// captured locals outward from the point of reference to every enclosing
/// function/lambda that doesn't declare the name itself. Holds owned,
/// cheaply-cloned handles rather than borrows into the tree, since the
/// walk pushes and pops these as it enters and leaves nested bodies.
enum ClosureFrame {
    Function(SymbolHandle),
    Lambda { scope: Rc<crate::symbols::Scope>, captured_locals: Rc<RefCell<Vec<WeakSymbol>>> },
}

impl ClosureFrame {
    fn declares(&self, name: &str, sym: &SymbolHandle) -> bool {
        let owner_scope = match self {
            ClosureFrame::Function(handle) => match &*handle.kind.borrow() {
                SymbolKind::Function(f) => Some(f.scope.clone()),
                _ => None,
            },
            ClosureFrame::Lambda { scope, .. } => Some(scope.clone()),
        };
        match owner_scope {
            Some(scope) => scope.get_symbol(name).map(|s| crate::node::Handle::ptr_eq(&s, sym)).unwrap_or(false),
            None => false,
        }
    }

    /// Adds `sym` to this frame's capture list if not already present.
    /// Returns `false` for an already-captured symbol (a no-op).
    fn capture(&self, sym: &SymbolHandle) -> bool {
        match self {
            ClosureFrame::Function(handle) => match &*handle.kind.borrow() {
                SymbolKind::Function(f) => f.capture(sym),
                _ => false,
            },
            ClosureFrame::Lambda { captured_locals, .. } => {
                let already = captured_locals.borrow().iter().any(|w| match w.upgrade() {
                    Some(existing) => crate::node::Handle::ptr_eq(&existing, sym),
                    None => false,
                });
                if already {
                    return false;
                }
                captured_locals.borrow_mut().push(sym.downgrade());
                true
            }
        }
    }

    fn captured_count(&self) -> usize {
        match self {
            ClosureFrame::Function(handle) => match &*handle.kind.borrow() {
                SymbolKind::Function(f) => f.captured_locals.borrow().len(),
                _ => 0,
            },
            ClosureFrame::Lambda { captured_locals, .. } => captured_locals.borrow().len(),
        }
    }
}

/// Conservative stand-in for the bytecode VM's closure-capture slot count;
/// a real integration would pull this from the VM's own constants.
const CLOSURE_CAPTURE_LIMIT: usize = 255;

pub struct SymbolResolver<'ctx> {
    ctx: &'ctx CompilationContext,
    scopes: ScopeStack,
    closures: Vec<ClosureFrame>,
}

impl<'ctx> SymbolResolver<'ctx> {
    pub fn new(ctx: &'ctx CompilationContext) -> Self {
        SymbolResolver { ctx, scopes: ScopeStack::new(), closures: Vec::new() }
    }

    pub fn resolve_file(&mut self, file: &File) {
        self.scopes.push(file.main_block.scope.clone());
        let is_function = matches!(&*file.main_function.kind.borrow(), SymbolKind::Function(_));
        if is_function {
            self.closures.push(ClosureFrame::Function(file.main_function.clone()));
        }
        self.resolve_block_body(&file.main_block);
        if is_function {
            self.closures.pop();
        }
        self.scopes.pop();
    }

    fn resolve_block(&mut self, block: &Block) {
        self.scopes.push(block.scope.clone());
        self.resolve_block_body(block);
        self.scopes.pop();
    }

    fn resolve_block_body(&mut self, block: &Block) {
        for stmt in block.statements.borrow().iter() {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Declaration { symbol } => {
                self.declare(symbol, &stmt.source_ref);
                self.resolve_symbol_types(symbol);
                self.resolve_function_body_if_present(symbol);
            }
            StmtKind::Assignment { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }
            StmtKind::Expression(e) => self.resolve_expr(e),
            StmtKind::PatternTest { lhs, rhs, test_id } => {
                if test_id.get().is_none() {
                    test_id.set(Some(self.ctx.next_pattern_test_id()));
                }
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }
            StmtKind::If { condition, then_block, else_block } => {
                self.resolve_expr(condition);
                self.resolve_block(then_block);
                if let Some(b) = else_block {
                    self.resolve_block(b);
                }
            }
            StmtKind::Return { value } => {
                if let Some(v) = value {
                    self.resolve_expr(v);
                }
            }
            StmtKind::Assert { condition } => self.resolve_expr(condition),
        }
    }

    /// Declarations are checked against the current scope before recursing
    /// into children. Anonymous interfaces are never inserted here — they
    /// get a name (and a scope entry) only once the analyzer mints one for
    /// an object literal.
    fn declare(&mut self, symbol: &SymbolHandle, source_ref: &SourceRef) {
        if let SymbolKind::TypeSymbol(TypeSymbolKind::Interface(i)) = &*symbol.kind.borrow() {
            if i.is_anonymous {
                return;
            }
        }
        let name = symbol.header.name.clone();
        tracing::debug!(name = %name, "declaring symbol");
        match self.scopes.current().add_symbol(&name, symbol) {
            Ok(()) => {}
            Err(collision) => {
                self.ctx.sink.report_error(source_ref, format!("'{}' declaration conflicts with previous", name));
                self.ctx.sink.report_note(&collision.existing.header.source_ref, "previous declaration is here");
            }
        }
    }

    /// Resolves whatever unresolved type slots hang off a freshly declared
    /// symbol and recurses into anything it owns (parameters, interface
    /// members) once its own borrow of `symbol.kind` has ended.
    fn resolve_symbol_types(&mut self, symbol: &SymbolHandle) {
        let mut nested: Vec<SymbolHandle> = Vec::new();
        {
            let mut kind = symbol.kind.borrow_mut();
            match &mut *kind {
                SymbolKind::Variable(v) => {
                    if let Some(t) = v.declared_type.borrow().clone() {
                        let resolved = self.resolve_data_type(&t, &symbol.header.source_ref);
                        *v.declared_type.borrow_mut() = Some(resolved);
                    }
                }
                SymbolKind::Function(f) => {
                    let resolved_return = self.resolve_data_type(&f.return_type.borrow().clone(), &symbol.header.source_ref);
                    *f.return_type.borrow_mut() = resolved_return;
                    nested.extend(f.parameters.iter().cloned());
                }
                SymbolKind::TypeSymbol(TypeSymbolKind::Alias { target, .. }) => {
                    let resolved = self.resolve_data_type(&target.borrow().clone(), &symbol.header.source_ref);
                    self.check_alias_circularity(&symbol.header.name, &resolved, &symbol.header.source_ref);
                    *target.borrow_mut() = resolved;
                }
                SymbolKind::TypeSymbol(TypeSymbolKind::Interface(i)) => {
                    let resolved_bases: Vec<DataType> = i
                        .base_types
                        .borrow()
                        .iter()
                        .map(|b| self.resolve_data_type(b, &symbol.header.source_ref))
                        .collect();
                    *i.base_types.borrow_mut() = resolved_bases;
                    nested.extend(i.common.members.borrow().iter().map(|(_, m)| m.clone()));
                }
                SymbolKind::TypeSymbol(TypeSymbolKind::Enum(_)) => {}
                SymbolKind::InterfaceProperty(p) | SymbolKind::ObjectProperty(p) => {
                    let resolved = self.resolve_data_type(&p.property_type.borrow().clone(), &symbol.header.source_ref);
                    *p.property_type.borrow_mut() = resolved;
                }
                SymbolKind::Constant(_) => {}
            }
        }
        for member in &nested {
            self.resolve_symbol_types(member);
        }
    }

    /// Resolves a function's block body once its parameter/return types are
    /// in place. Kept separate from [`Self::resolve_symbol_types`] because
    /// in this model a function's executable block lives alongside its
    /// declaring statement rather than on the symbol itself.
    pub fn resolve_function_body(&mut self, function: &SymbolHandle, body: &Block) {
        let parameters: Vec<SymbolHandle> = match &*function.kind.borrow() {
            SymbolKind::Function(f) => f.parameters.clone(),
            _ => Vec::new(),
        };
        self.scopes.push(body.scope.clone());
        for param in &parameters {
            let _ = self.scopes.current().add_symbol(&param.header.name, param);
        }
        self.closures.push(ClosureFrame::Function(function.clone()));
        self.resolve_block_body(body);
        self.closures.pop();
        self.scopes.pop();
    }

    /// Takes a declared function's body block out of its symbol (if any),
    /// resolves it, and puts it back. Scoped narrowly around the `take` so
    /// the borrow on `symbol.kind` never overlaps the recursive walk, which
    /// itself re-borrows `symbol.kind` to read the parameter list.
    fn resolve_function_body_if_present(&mut self, symbol: &SymbolHandle) {
        let body = {
            let kind = symbol.kind.borrow();
            match &*kind {
                SymbolKind::Function(f) => f.body.borrow_mut().take(),
                _ => None,
            }
        };
        if let Some(body) = body {
            self.resolve_function_body(symbol, &body);
            let kind = symbol.kind.borrow();
            if let SymbolKind::Function(f) = &*kind {
                *f.body.borrow_mut() = Some(body);
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::MemberAccess { inner: None, name } => {
                self.resolve_simple_name(expr, name);
            }
            ExprKind::MemberAccess { inner: Some(inner), .. } => {
                // A qualified access is left for the analyzer, which knows
                // the receiver's resolved type and can look up the member.
                self.resolve_expr(inner);
            }
            ExprKind::ElementAccess { inner, index } => {
                self.resolve_expr(inner);
                self.resolve_expr(index);
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.resolve_expr(receiver);
                for a in args {
                    self.resolve_expr(a);
                }
            }
            ExprKind::Object(obj) => {
                for m in &obj.members {
                    self.resolve_expr(&m.value);
                }
            }
            ExprKind::Array { elements, .. } => {
                for e in elements {
                    self.resolve_expr(e);
                }
            }
            ExprKind::Ellipsis => {}
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }
            ExprKind::Conditional { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }
            ExprKind::Lambda(lambda) => self.resolve_lambda(lambda),
        }
    }

    fn resolve_lambda(&mut self, lambda: &LambdaExpr) {
        self.scopes.push(lambda.scope.clone());
        for p in &lambda.parameters {
            let _ = self.scopes.current().add_symbol(&p.header.name, p);
        }
        self.closures.push(ClosureFrame::Lambda { scope: lambda.scope.clone(), captured_locals: lambda.captured_locals.clone() });
        self.resolve_block_body(&lambda.body);
        self.closures.pop();
        self.scopes.pop();
    }

    /// A trivial member access (no receiver) gets its `symbol_reference`
    /// set from the active scope stack, or an undeclared-name error.
    fn resolve_simple_name(&mut self, expr: &Expr, name: &str) {
        match self.scopes.lookup(name) {
            Some(sym) => {
                *expr.symbol_reference.borrow_mut() = sym.downgrade();
                self.propagate_capture(&sym, name);
            }
            None => {
                self.ctx.sink.report_error(&expr.source_ref, format!("undeclared name '{}'", name));
            }
        }
    }

    /// Walks the closure-frame stack from the innermost enclosing function
    /// or lambda outward, adding `sym` to every frame's capture list up to
    /// (but not including) the frame that actually declares it.
    ///
    /// §4.5 point 4 triggers this "when a member-access resolves to a
    /// variable (or to a function whose own captured-locals set is
    /// non-empty)" — a reference to a nested function that is itself a
    /// closure must propagate outward the same way a plain variable
    /// reference does, so every frame between the reference site and the
    /// function's declaring scope also ends up with it in `captured_locals`.
    fn propagate_capture(&mut self, sym: &SymbolHandle, name: &str) {
        let should_propagate = match &*sym.kind.borrow() {
            SymbolKind::Variable(_) => true,
            SymbolKind::Function(f) => !f.captured_locals.borrow().is_empty(),
            _ => false,
        };
        if !should_propagate {
            return;
        }

        for frame in self.closures.iter().rev() {
            if frame.declares(name, sym) {
                break;
            }
            if frame.capture(sym) {
                let captured_count = frame.captured_count();
                tracing::debug!(name, captured_count, "closure capture recorded");
                if captured_count > CLOSURE_CAPTURE_LIMIT {
                    self.ctx
                        .sink
                        .report_error(&sym.header.source_ref, format!("closure capture limit exceeded capturing '{}'", name));
                    return;
                }
            }
        }
    }

    /// Built-in names translate directly; anything else is looked up as a
    /// type symbol. Always produces a fresh, owned `DataType`, so a caller
    /// can never end up aliasing a type that's already parented elsewhere.
    fn resolve_data_type(&mut self, dt: &DataType, source_ref: &SourceRef) -> DataType {
        match dt {
            DataType::Unresolved { name, type_arguments } => self.resolve_unresolved_name(name, type_arguments, source_ref),
            DataType::Array(elem) => DataType::Array(Box::new(self.resolve_data_type(elem, source_ref))),
            DataType::Union(opts) => DataType::Union(opts.iter().map(|o| self.resolve_data_type(o, source_ref)).collect()),
            DataType::Future(Some(inner)) => DataType::Future(Some(Box::new(self.resolve_data_type(inner, source_ref)))),
            DataType::Future(None) => DataType::Future(None),
            DataType::Function(f) => {
                let params = f.params.iter().map(|p| self.resolve_data_type(p, source_ref)).collect();
                let return_type = Box::new(self.resolve_data_type(&f.return_type, source_ref));
                DataType::Function(crate::types::FunctionType { params, return_type })
            }
            other => other.clone(),
        }
    }

    fn resolve_unresolved_name(&mut self, name: &str, type_arguments: &[DataType], source_ref: &SourceRef) -> DataType {
        let resolved_args: Vec<DataType> = type_arguments.iter().map(|a| self.resolve_data_type(a, source_ref)).collect();

        match name {
            "int" | "integer" => DataType::Integer,
            "double" => DataType::Double,
            "number" => DataType::Number,
            "bool" | "boolean" => DataType::Boolean,
            "string" => DataType::String,
            "object" => DataType::Object,
            "any" => DataType::Any,
            "pattern" => DataType::Pattern,
            "void" => DataType::Void,
            "array" => match resolved_args.into_iter().next() {
                Some(elem) => DataType::Array(Box::new(elem)),
                None => DataType::Array(Box::new(DataType::Any)),
            },
            "future" => {
                let mut future = DataType::Future(None);
                match resolved_args.len() {
                    0 => {
                        self.ctx.sink.report_error(source_ref, "missing type argument for 'future'");
                    }
                    1 => {
                        let _ = future.add_type_parameter(resolved_args.into_iter().next().unwrap());
                    }
                    _ => {
                        self.ctx.sink.report_error(source_ref, "too many type arguments for 'future'");
                    }
                }
                future
            }
            _ => match self.scopes.lookup(name) {
                None => {
                    self.ctx.sink.report_error(source_ref, format!("'{}' does not refer to a type", name));
                    DataType::Unresolved { name: name.to_string(), type_arguments: Vec::new() }
                }
                Some(sym) => {
                    let kind = sym.kind.borrow();
                    match &*kind {
                        SymbolKind::TypeSymbol(TypeSymbolKind::Enum(_)) => DataType::Enum(sym.downgrade()),
                        SymbolKind::TypeSymbol(TypeSymbolKind::Interface(_)) => DataType::Interface(sym.downgrade()),
                        SymbolKind::TypeSymbol(TypeSymbolKind::Alias { target, .. }) => target.borrow().copy(),
                        _ => {
                            self.ctx.sink.report_error(source_ref, format!("'{}' does not refer to a type", name));
                            DataType::Unresolved { name: name.to_string(), type_arguments: Vec::new() }
                        }
                    }
                }
            },
        }
    }

    /// After resolving an alias's target, checks for an unresolved
    /// reference back to the alias's own name: a genuine self-cycle means
    /// `alias_name` never resolved to a concrete type symbol, so it still
    /// shows up as `Unresolved { name: alias_name, .. }` somewhere in the
    /// resolved tree.
    fn check_alias_circularity(&self, alias_name: &str, resolved: &DataType, source_ref: &SourceRef) {
        if contains_unresolved_name(resolved, alias_name) {
            self.ctx.sink.report_error(source_ref, format!("type '{}' circularly references itself", alias_name));
        }
    }
}

fn contains_unresolved_name(dt: &DataType, name: &str) -> bool {
    match dt {
        DataType::Unresolved { name: n, type_arguments } => n == name || type_arguments.iter().any(|a| contains_unresolved_name(a, name)),
        DataType::Array(e) => contains_unresolved_name(e, name),
        DataType::Union(opts) => opts.iter().any(|o| contains_unresolved_name(o, name)),
        DataType::Future(Some(e)) => contains_unresolved_name(e, name),
        DataType::Function(f) => f.params.iter().any(|p| contains_unresolved_name(p, name)) || contains_unresolved_name(&f.return_type, name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, File, Stmt, StmtKind};
    use crate::source_ref::Location;
    use crate::symbols::{Scope, SymbolData, SymbolHeader, VariableSymbol};

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(1, 1), Location::new(1, 1))
    }

    fn make_main_function() -> SymbolHandle {
        let scope = Scope::new();
        SymbolData::new_floating(
            SymbolHeader { name: "main".into(), is_builtin: true, source_ref: dummy_ref() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![],
                return_type: RefCell::new(DataType::Void),
                is_async: false,
                is_instance: false,
                has_block: true,
                body: RefCell::new(None),
                scope,
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire()
    }

    #[test]
    fn undeclared_name_is_reported() {
        let ctx = CompilationContext::new();
        let file = File::new("t.lstf", "", Block::new(dummy_ref()), make_main_function());
        let name_expr = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: "mystery".into() });
        file.main_block.push(Stmt::new(dummy_ref(), StmtKind::Expression(name_expr)));

        let mut resolver = SymbolResolver::new(&ctx);
        resolver.resolve_file(&file);

        assert_eq!(ctx.sink.error_count(), 1);
    }

    #[test]
    fn declaration_collision_reports_error_and_note() {
        let ctx = CompilationContext::new();
        let scope = Scope::new();
        let a = SymbolData::new_floating(
            SymbolHeader { name: "x".into(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Variable(VariableSymbol { declared_type: RefCell::new(Some(DataType::Integer)), has_initializer: false, is_parameter: false }),
        )
        .acquire();
        let b = SymbolData::new_floating(
            SymbolHeader { name: "x".into(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Variable(VariableSymbol { declared_type: RefCell::new(Some(DataType::Integer)), has_initializer: false, is_parameter: false }),
        )
        .acquire();

        let mut resolver = SymbolResolver::new(&ctx);
        resolver.scopes.push(scope);
        resolver.declare(&a, &dummy_ref());
        resolver.declare(&b, &dummy_ref());

        assert_eq!(ctx.sink.error_count(), 1);
        assert_eq!(ctx.sink.diagnostics().len(), 2);
    }

    #[test]
    fn referencing_a_capturing_function_propagates_its_captures_outward() {
        // main { let outer: integer; function f() { function g() { return outer; } (lambda referencing g) } }
        //
        // g captures `outer` into both g and f. The lambda nested in f does
        // not declare g, so referencing g from the lambda must add g itself
        // to the lambda's own captured locals (§4.5 point 4), even though g
        // is a function and not a plain variable.
        let ctx = CompilationContext::new();

        let main_block = Block::new(dummy_ref());
        let outer = SymbolData::new_floating(
            SymbolHeader { name: "outer".into(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Variable(VariableSymbol { declared_type: RefCell::new(Some(DataType::Integer)), has_initializer: true, is_parameter: false }),
        )
        .acquire();
        main_block.scope.add_symbol("outer", &outer).unwrap();
        main_block.push(Stmt::new(dummy_ref(), StmtKind::Declaration { symbol: outer }));

        let f_block = Block::new(dummy_ref());
        let f_scope = f_block.scope.clone();

        let g_block = Block::new(dummy_ref());
        let outer_ref = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: "outer".into() });
        g_block.push(Stmt::new(dummy_ref(), StmtKind::Return { value: Some(outer_ref) }));
        let g = SymbolData::new_floating(
            SymbolHeader { name: "g".into(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![],
                return_type: RefCell::new(DataType::Integer),
                is_async: false,
                is_instance: false,
                has_block: true,
                body: RefCell::new(Some(g_block)),
                scope: f_scope.clone(),
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire();
        f_scope.add_symbol("g", &g).unwrap();
        f_block.push(Stmt::new(dummy_ref(), StmtKind::Declaration { symbol: g }));

        let lambda_captured_locals = Rc::new(RefCell::new(Vec::new()));
        let lambda_body = Block::new(dummy_ref());
        let g_ref = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: "g".into() });
        lambda_body.push(Stmt::new(dummy_ref(), StmtKind::Expression(g_ref)));
        let lambda = LambdaExpr {
            parameters: vec![],
            return_type: RefCell::new(None),
            body: Box::new(lambda_body),
            is_async: false,
            scope: Scope::new(),
            captured_locals: lambda_captured_locals.clone(),
        };
        f_block.push(Stmt::new(dummy_ref(), StmtKind::Expression(Expr::new(dummy_ref(), ExprKind::Lambda(lambda)))));

        let f = SymbolData::new_floating(
            SymbolHeader { name: "f".into(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![],
                return_type: RefCell::new(DataType::Void),
                is_async: false,
                is_instance: false,
                has_block: true,
                body: RefCell::new(Some(f_block)),
                scope: f_scope,
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire();
        main_block.scope.add_symbol("f", &f).unwrap();
        main_block.push(Stmt::new(dummy_ref(), StmtKind::Declaration { symbol: f }));

        let main_fn = SymbolData::new_floating(
            SymbolHeader { name: "main".into(), is_builtin: true, source_ref: dummy_ref() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![],
                return_type: RefCell::new(DataType::Void),
                is_async: false,
                is_instance: false,
                has_block: true,
                body: RefCell::new(None),
                scope: main_block.scope.clone(),
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire();
        let file = File::new("t.lstf", "", main_block, main_fn);

        let mut resolver = SymbolResolver::new(&ctx);
        resolver.resolve_file(&file);

        assert_eq!(ctx.sink.error_count(), 0);
        assert_eq!(lambda_captured_locals.borrow().len(), 1, "lambda should have captured `g` itself");
    }

    #[test]
    fn builtin_type_name_resolves_without_lookup() {
        let ctx = CompilationContext::new();
        let mut resolver = SymbolResolver::new(&ctx);
        let resolved = resolver.resolve_unresolved_name("integer", &[], &dummy_ref());
        assert!(matches!(resolved, DataType::Integer));
        assert_eq!(ctx.sink.error_count(), 0);
    }

    #[test]
    fn future_without_argument_is_an_error() {
        let ctx = CompilationContext::new();
        let mut resolver = SymbolResolver::new(&ctx);
        let _ = resolver.resolve_unresolved_name("future", &[], &dummy_ref());
        assert_eq!(ctx.sink.error_count(), 1);
    }

    #[test]
    fn future_with_one_argument_resolves() {
        let ctx = CompilationContext::new();
        let mut resolver = SymbolResolver::new(&ctx);
        let resolved = resolver.resolve_unresolved_name(
            "future",
            &[DataType::Unresolved { name: "integer".into(), type_arguments: vec![] }],
            &dummy_ref(),
        );
        assert_eq!(resolved.to_string(), "future<integer>");
    }
}
