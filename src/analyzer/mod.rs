//! Semantic analyzer: the second of two depth-first walks over a resolved
//! file — §4.6.
//!
//! Carries the two stacks §4.6 names explicitly (`scopes`, an expected-type
//! stack) plus the `ellipsis_allowed` flag, and a third stack this crate adds
//! symmetrically: the enclosing function/lambda's declared return type, so a
//! `return` statement's value can be checked against it the same way an
//! assignment's RHS is checked against its LHS (§4.6 doesn't single out
//! `return` by name, but the "expected type stack" mechanism it describes
//! generalizes directly — see DESIGN.md).
//!
//! Like the resolver, every failure goes through
//! [`crate::diagnostics::DiagnosticsSink`] rather than `panic!`ing, departing
//! from `barracuda_pest_semantic_analyser.rs`'s control flow for the
//! reasons recorded in SPEC_FULL.md [AMBIENT-2].

use crate::ast::{Block, Expr, ExprKind, File, LambdaExpr, ObjectExpr, Stmt, StmtKind};
use crate::context::CompilationContext;
use crate::source_ref::SourceRef;
use crate::symbols::{
    lookup_interface_member, lookup_interface_member_symbol, InterfaceSymbol, PropertySymbol, Scope, ScopeStack,
    SymbolData, SymbolHandle, SymbolHeader, SymbolKind, TypeSymbolCommon, TypeSymbolKind,
};
use crate::types::DataType;

pub struct SemanticAnalyzer<'ctx> {
    ctx: &'ctx CompilationContext,
    scopes: ScopeStack,
    /// §4.6: "a stack of *optional* data types; the top is consulted when
    /// visiting any expression."
    expected_expression_types: Vec<Option<DataType>>,
    /// §4.6: "flipped to true only for the direct children of a pattern
    /// array/object and then restored on exit."
    ellipsis_allowed: bool,
    /// Supplement to §4.6 (see module doc): declared return type of the
    /// innermost enclosing function/lambda, consulted by `return`.
    return_type_stack: Vec<DataType>,
}

impl<'ctx> SemanticAnalyzer<'ctx> {
    pub fn new(ctx: &'ctx CompilationContext) -> Self {
        SemanticAnalyzer {
            ctx,
            scopes: ScopeStack::new(),
            expected_expression_types: Vec::new(),
            ellipsis_allowed: false,
            return_type_stack: Vec::new(),
        }
    }

    pub fn analyze_file(&mut self, file: &File) {
        self.scopes.push(file.main_block.scope.clone());
        self.return_type_stack.push(DataType::Void);
        self.analyze_block_body(&file.main_block, file, true);
        self.return_type_stack.pop();
        self.scopes.pop();

        // §4.6 "verifies mandatory top-level assignments"; §6, error
        // category 10.
        if !file.server_path_assigned.get() {
            self.ctx
                .sink
                .report_error(&SourceRef::file_start(file.path.clone()), "assignment to 'server_path' required");
        }
        if !file.project_files_assigned.get() {
            self.ctx
                .sink
                .report_error(&SourceRef::file_start(file.path.clone()), "assignment to 'project_files' required");
        }
    }

    fn analyze_block(&mut self, block: &Block, file: &File) {
        self.scopes.push(block.scope.clone());
        self.analyze_block_body(block, file, false);
        self.scopes.pop();
    }

    fn analyze_block_body(&mut self, block: &Block, file: &File, at_top_level: bool) {
        for stmt in block.statements.borrow().iter() {
            self.analyze_stmt(stmt, file, at_top_level);
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt, file: &File, at_top_level: bool) {
        match &stmt.kind {
            StmtKind::Declaration { symbol } => {
                self.analyze_function_body_if_present(symbol, file);
            }
            StmtKind::Assignment { lhs, rhs, is_declaration } => {
                self.analyze_assignment(lhs, rhs, *is_declaration, at_top_level, file);
            }
            StmtKind::Expression(e) => self.analyze_expr(e, None),
            StmtKind::PatternTest { lhs, rhs, .. } => {
                self.analyze_expr(lhs, None);
                let expected = lhs.value_type.borrow().clone();
                self.analyze_expr(rhs, expected);
            }
            StmtKind::If { condition, then_block, else_block } => {
                self.analyze_expr(condition, Some(DataType::Boolean));
                self.analyze_block(then_block, file);
                if let Some(b) = else_block {
                    self.analyze_block(b, file);
                }
            }
            StmtKind::Return { value } => {
                let expected = self.return_type_stack.last().cloned();
                if let Some(v) = value {
                    self.analyze_expr(v, expected);
                }
            }
            StmtKind::Assert { condition } => self.analyze_expr(condition, Some(DataType::Boolean)),
        }
    }

    fn analyze_assignment(&mut self, lhs: &Expr, rhs: &Expr, is_declaration: bool, at_top_level: bool, file: &File) {
        if is_declaration {
            let declared = lhs.symbol_reference.borrow().upgrade().and_then(|sym| match &*sym.kind.borrow() {
                SymbolKind::Variable(v) => v.declared_type.borrow().clone(),
                _ => None,
            });
            match declared {
                None => {
                    self.analyze_expr(rhs, None);
                    let inferred = rhs.value_type.borrow().clone();
                    if let Some(sym) = lhs.symbol_reference.borrow().upgrade() {
                        if let SymbolKind::Variable(v) = &*sym.kind.borrow() {
                            *v.declared_type.borrow_mut() = inferred.clone();
                        }
                    }
                    *lhs.value_type.borrow_mut() = inferred;
                }
                Some(declared_type) => {
                    *lhs.value_type.borrow_mut() = Some(declared_type.clone());
                    self.analyze_expr(rhs, Some(declared_type));
                }
            }
        } else {
            self.analyze_expr(lhs, None);
            let expected = lhs.value_type.borrow().clone();
            self.analyze_expr(rhs, expected);

            if at_top_level {
                if let Some(name) = lhs.simple_name() {
                    match name {
                        "server_path" => file.server_path_assigned.set(true),
                        "project_files" => file.project_files_assigned.set(true),
                        _ => {}
                    }
                }
            }
        }
    }

    /// Takes a declared function's body out of its symbol, analyzes it with
    /// its own scope/return-type/closure frame active, and puts it back —
    /// mirrors [`crate::resolver::SymbolResolver::resolve_function_body_if_present`].
    fn analyze_function_body_if_present(&mut self, symbol: &SymbolHandle, file: &File) {
        let (body, return_type, scope) = {
            let kind = symbol.kind.borrow();
            match &*kind {
                SymbolKind::Function(f) => (f.body.borrow_mut().take(), f.return_type.borrow().clone(), f.scope.clone()),
                _ => return,
            }
        };
        let Some(body) = body else { return };

        self.scopes.push(scope);
        self.return_type_stack.push(return_type);
        self.analyze_block_body(&body, file, false);
        self.return_type_stack.pop();
        self.scopes.pop();

        let kind = symbol.kind.borrow();
        if let SymbolKind::Function(f) = &*kind {
            *f.body.borrow_mut() = Some(body);
        }
    }

    /// Analyzes `expr` with `expected` on top of the expected-type stack,
    /// then applies the uniform post-check §4.6 calls "generic expression
    /// check": re-label onto the expected type on success, report a type
    /// mismatch on failure. Every recursive descent into a child expression
    /// goes through this single entry point so the check fires uniformly,
    /// matching §9's "visit_expression...must fire uniformly" contract.
    fn analyze_expr(&mut self, expr: &Expr, expected: Option<DataType>) {
        self.expected_expression_types.push(expected.clone());
        self.compute_value_type(expr);
        self.expected_expression_types.pop();

        if let Some(expected_type) = expected {
            let actual = expr.value_type.borrow().clone();
            if let Some(actual_type) = actual {
                if expected_type.is_supertype_of(&actual_type) {
                    *expr.value_type.borrow_mut() = Some(expected_type);
                } else {
                    self.ctx.sink.report_error(
                        &expr.source_ref,
                        format!("cannot convert expression of type {} to {}", actual_type, expected_type),
                    );
                }
            }
        }
    }

    fn expected_top(&self) -> Option<DataType> {
        self.expected_expression_types.last().cloned().flatten()
    }

    fn compute_value_type(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(lit) => {
                *expr.value_type.borrow_mut() = Some(lit.value_type());
            }
            ExprKind::MemberAccess { inner: None, .. } => self.analyze_trivial_name(expr),
            ExprKind::MemberAccess { inner: Some(inner), name } => self.analyze_qualified_access(expr, inner, name),
            ExprKind::ElementAccess { inner, index } => self.analyze_element_access(expr, inner, index),
            ExprKind::MethodCall { receiver, name, args, is_awaited } => {
                self.analyze_method_call(expr, receiver, name, args, *is_awaited)
            }
            ExprKind::Object(obj) => self.analyze_object(expr, obj),
            ExprKind::Array { elements, is_pattern } => self.analyze_array(expr, elements, *is_pattern),
            ExprKind::Ellipsis => {
                if !self.ellipsis_allowed {
                    self.ctx.sink.report_error(&expr.source_ref, "'...' is only allowed inside a pattern");
                } else {
                    *expr.value_type.borrow_mut() = Some(DataType::Pattern);
                }
            }
            ExprKind::Unary { op, operand } => self.analyze_unary(expr, *op, operand),
            ExprKind::Binary { op, lhs, rhs } => self.analyze_binary(expr, *op, lhs, rhs),
            ExprKind::Conditional { condition, then_branch, else_branch } => {
                self.analyze_conditional(expr, condition, then_branch, else_branch)
            }
            ExprKind::Lambda(lambda) => self.analyze_lambda(expr, lambda),
        }
    }

    /// §4.6 "Member access (non-trivial)": derives `value_type` from the
    /// resolved symbol once the resolver has already set `symbol_reference`
    /// for a bare name — variable -> variable type; function -> function
    /// type; interface/object property -> property type; constant ->
    /// expression type; type symbol -> no value type.
    fn analyze_trivial_name(&mut self, expr: &Expr) {
        // If unset, the resolver already reported `undeclared name` for
        // this site; silently abort further inference (§4.6 failure
        // semantics) rather than cascading a second diagnostic.
        if let Some(sym) = expr.symbol_reference.borrow().upgrade() {
            *expr.value_type.borrow_mut() = value_type_from_symbol(&sym);
        }
    }

    fn analyze_qualified_access(&mut self, expr: &Expr, inner: &Expr, name: &str) {
        self.analyze_expr(inner, None);
        let Some(inner_type) = inner.value_type.borrow().clone() else { return };

        match self.resolve_member(&inner_type, name, &expr.source_ref) {
            MemberResolution::Unchecked => {
                tracing::warn!(member = name, "unchecked member access");
                self.ctx.sink.report_warning(&expr.source_ref, "unchecked member access");
                *expr.value_type.borrow_mut() = Some(DataType::Any);
            }
            MemberResolution::Found(sym) => {
                *expr.symbol_reference.borrow_mut() = sym.downgrade();
                *expr.value_type.borrow_mut() = value_type_from_symbol(&sym);
            }
            MemberResolution::NotAnObject => {
                self.ctx
                    .sink
                    .report_error(&expr.source_ref, format!("request for member '{}' in something not an object", name));
            }
            MemberResolution::NoSuchMember => {
                self.ctx.sink.report_error(&expr.source_ref, format!("no member named '{}'", name));
            }
        }
    }

    /// Shared receiver-type dispatch for both non-trivial member access and
    /// method-call lookup (§4.6's member-access rule, reused for the callee
    /// half of a method call).
    fn resolve_member(&self, receiver_type: &DataType, name: &str, _source_ref: &SourceRef) -> MemberResolution {
        match receiver_type {
            DataType::Any | DataType::Object => MemberResolution::Unchecked,
            DataType::Interface(_) => match lookup_interface_member_symbol(receiver_type, name) {
                Some(sym) => MemberResolution::Found(sym),
                None => MemberResolution::NoSuchMember,
            },
            _ => MemberResolution::NotAnObject,
        }
    }

    fn analyze_element_access(&mut self, expr: &Expr, inner: &Expr, index: &Expr) {
        self.analyze_expr(inner, None);
        self.analyze_expr(index, Some(DataType::Integer));

        let Some(inner_type) = inner.value_type.borrow().clone() else { return };
        match inner_type {
            DataType::Array(elem) => *expr.value_type.borrow_mut() = Some(*elem),
            DataType::Any => *expr.value_type.borrow_mut() = Some(DataType::Any),
            other => {
                self.ctx
                    .sink
                    .report_error(&expr.source_ref, format!("cannot index into expression of type {}", other));
            }
        }
    }

    fn analyze_method_call(&mut self, expr: &Expr, receiver: &Expr, name: &str, args: &[Expr], is_awaited: bool) {
        self.analyze_expr(receiver, None);
        let Some(receiver_type) = receiver.value_type.borrow().clone() else {
            for a in args {
                self.analyze_expr(a, None);
            }
            return;
        };

        let callee_type = match self.resolve_member(&receiver_type, name, &expr.source_ref) {
            MemberResolution::Unchecked => {
                self.ctx.sink.report_warning(&expr.source_ref, "unchecked member access");
                for a in args {
                    self.analyze_expr(a, None);
                }
                *expr.value_type.borrow_mut() = Some(DataType::Any);
                return;
            }
            MemberResolution::Found(sym) => {
                *expr.symbol_reference.borrow_mut() = sym.downgrade();
                value_type_from_symbol(&sym)
            }
            MemberResolution::NotAnObject => {
                self.ctx
                    .sink
                    .report_error(&expr.source_ref, format!("request for member '{}' in something not an object", name));
                for a in args {
                    self.analyze_expr(a, None);
                }
                return;
            }
            MemberResolution::NoSuchMember => {
                self.ctx.sink.report_error(&expr.source_ref, format!("no member named '{}'", name));
                for a in args {
                    self.analyze_expr(a, None);
                }
                return;
            }
        };

        let Some(DataType::Function(func)) = callee_type else {
            self.ctx.sink.report_error(&expr.source_ref, format!("'{}' is not callable", name));
            for a in args {
                self.analyze_expr(a, None);
            }
            return;
        };

        if args.len() != func.params.len() {
            self.ctx.sink.report_error(
                &expr.source_ref,
                format!("'{}' expects {} argument(s), found {}", name, func.params.len(), args.len()),
            );
        }
        for (i, a) in args.iter().enumerate() {
            let expected = func.params.get(i).cloned();
            self.analyze_expr(a, expected);
        }

        let return_type = *func.return_type;
        if is_awaited {
            match return_type {
                DataType::Future(Some(t)) => *expr.value_type.borrow_mut() = Some(*t),
                other => {
                    self.ctx
                        .sink
                        .report_error(&expr.source_ref, format!("cannot await expression of type {}", other));
                }
            }
        } else {
            *expr.value_type.borrow_mut() = Some(return_type);
        }
    }

    /// §4.6 "Object literal": duplicate-member check, then either pattern
    /// analysis or anonymous-interface synthesis.
    fn analyze_object(&mut self, expr: &Expr, obj: &ObjectExpr) {
        let mut seen: Vec<&str> = Vec::new();
        for member in &obj.members {
            if seen.contains(&member.name.as_str()) {
                self.ctx
                    .sink
                    .report_error(&member.value.source_ref, format!("initializer '{}' conflicts with previous", member.name));
                if let Some(first) = obj.members.iter().find(|m| m.name == member.name) {
                    self.ctx.sink.report_note(&first.value.source_ref, "previous initializer is here");
                }
            } else {
                seen.push(&member.name);
            }
        }

        let expected = self.expected_top();
        let treat_as_pattern = obj.is_pattern && matches!(expected, None | Some(DataType::Pattern));

        if treat_as_pattern {
            let saved = self.ellipsis_allowed;
            self.ellipsis_allowed = true;
            for member in &obj.members {
                self.analyze_expr(&member.value, None);
            }
            self.ellipsis_allowed = saved;
            *expr.value_type.borrow_mut() = Some(DataType::Pattern);
            return;
        }

        let expected_interface = match &expected {
            Some(DataType::Interface(_)) => expected.clone(),
            _ => None,
        };

        let mut property_types: Vec<(String, DataType, bool)> = Vec::new();
        for member in &obj.members {
            let member_expected = expected_interface
                .as_ref()
                .and_then(|iface| lookup_interface_member(iface, &member.name));
            self.analyze_expr(&member.value, member_expected);
            let ty = member.value.value_type.borrow().clone().unwrap_or(DataType::Any);
            property_types.push((member.name.clone(), ty, member.is_nullable));
        }

        let interface_name = self.ctx.next_anonymous_interface_name();
        let common = TypeSymbolCommon::new(Scope::new());
        let interface_floating = SymbolData::new_floating(
            SymbolHeader { name: interface_name, is_builtin: false, source_ref: expr.source_ref.clone() },
            SymbolKind::TypeSymbol(TypeSymbolKind::Interface(InterfaceSymbol {
                common,
                base_types: std::cell::RefCell::new(Vec::new()),
                is_anonymous: true,
            })),
        );
        let interface_symbol = interface_floating.acquire();

        for (name, ty, is_nullable) in property_types {
            let prop = SymbolData::new_floating(
                SymbolHeader { name: name.clone(), is_builtin: false, source_ref: expr.source_ref.clone() },
                SymbolKind::InterfaceProperty(PropertySymbol { property_type: std::cell::RefCell::new(ty), is_nullable }),
            )
            .acquire();
            if let SymbolKind::TypeSymbol(TypeSymbolKind::Interface(iface)) = &*interface_symbol.kind.borrow() {
                iface.common.insert_member(name, prop);
            }
        }

        let _ = self.scopes.current().add_symbol(&interface_symbol.header.name, &interface_symbol);
        *expr.value_type.borrow_mut() = Some(DataType::Interface(interface_symbol.downgrade()));
        // The scope entry and `value_type` above are both weak (§3 "Scope":
        // `map name -> weak(symbol)`; every expression's `value_type` is a
        // plain `DataType`, not an owner). Retain a strong handle on the
        // context so the synthesized interface outlives this call instead
        // of being destroyed the moment `interface_symbol` drops.
        self.ctx.retain_anonymous_interface(interface_symbol);
    }

    /// §4.6 "Array literal": left-to-right union folding, or pattern mode.
    fn analyze_array(&mut self, expr: &Expr, elements: &[Expr], is_pattern: bool) {
        if is_pattern {
            let saved = self.ellipsis_allowed;
            self.ellipsis_allowed = true;
            for e in elements {
                self.analyze_expr(e, None);
            }
            self.ellipsis_allowed = saved;
            *expr.value_type.borrow_mut() = Some(DataType::Pattern);
            return;
        }

        let element_expected = match self.expected_top() {
            Some(DataType::Array(elem)) => Some(*elem),
            _ => None,
        };

        if elements.is_empty() {
            *expr.value_type.borrow_mut() = Some(DataType::Array(Box::new(DataType::Any)));
            return;
        }

        let mut fold: Option<DataType> = None;
        for e in elements {
            self.analyze_expr(e, element_expected.clone());
            let Some(ty) = e.value_type.borrow().clone() else { continue };
            fold = Some(match fold {
                None => ty,
                Some(existing) => fold_union(existing, ty),
            });
        }

        let element_type = fold.unwrap_or(DataType::Any);
        *expr.value_type.borrow_mut() = Some(DataType::Array(Box::new(element_type)));
    }

    fn analyze_unary(&mut self, expr: &Expr, op: crate::ast::UnaryOp, operand: &Expr) {
        use crate::ast::UnaryOp;
        match op {
            UnaryOp::Negate => {
                self.analyze_expr(operand, None);
                let ty = operand.value_type.borrow().clone();
                match &ty {
                    Some(DataType::Integer) | Some(DataType::Double) | Some(DataType::Number) => {
                        *expr.value_type.borrow_mut() = ty;
                    }
                    Some(other) => {
                        self.ctx
                            .sink
                            .report_error(&expr.source_ref, format!("cannot negate expression of type {}", other));
                    }
                    None => {}
                }
            }
            UnaryOp::Not => {
                self.analyze_expr(operand, Some(DataType::Boolean));
                *expr.value_type.borrow_mut() = Some(DataType::Boolean);
            }
        }
    }

    fn analyze_binary(&mut self, expr: &Expr, op: crate::ast::BinaryOp, lhs: &Expr, rhs: &Expr) {
        use crate::ast::BinaryOp::*;
        match op {
            And | Or => {
                self.analyze_expr(lhs, Some(DataType::Boolean));
                self.analyze_expr(rhs, Some(DataType::Boolean));
                *expr.value_type.borrow_mut() = Some(DataType::Boolean);
            }
            LessThan | LessEqual | GreaterThan | GreaterEqual => {
                self.analyze_expr(lhs, None);
                let lhs_type = lhs.value_type.borrow().clone();
                self.analyze_expr(rhs, lhs_type.clone());
                if let Some(t) = &lhs_type {
                    if !is_numeric(&Some(t.clone())) {
                        self.ctx.sink.report_error(&expr.source_ref, format!("cannot compare expression of type {}", t));
                    }
                }
                *expr.value_type.borrow_mut() = Some(DataType::Boolean);
            }
            Equal | NotEqual => {
                self.analyze_expr(lhs, None);
                let expected = lhs.value_type.borrow().clone();
                self.analyze_expr(rhs, expected);
                *expr.value_type.borrow_mut() = Some(DataType::Boolean);
            }
            Add | Subtract | Multiply | Divide | Modulo => {
                self.analyze_expr(lhs, None);
                self.analyze_expr(rhs, None);
                let lhs_type = lhs.value_type.borrow().clone();
                let rhs_type = rhs.value_type.borrow().clone();
                match (lhs_type, rhs_type) {
                    (Some(DataType::String), Some(DataType::String)) if op == Add => {
                        *expr.value_type.borrow_mut() = Some(DataType::String);
                    }
                    (Some(l), Some(r)) => match numeric_binary_result(&l, &r) {
                        Some(result) => *expr.value_type.borrow_mut() = Some(result),
                        None => {
                            self.ctx.sink.report_error(
                                &expr.source_ref,
                                format!("cannot apply operator to expressions of type {} and {}", l, r),
                            );
                        }
                    },
                    _ => {}
                }
            }
        }
    }

    fn analyze_conditional(&mut self, expr: &Expr, condition: &Expr, then_branch: &Expr, else_branch: &Expr) {
        self.analyze_expr(condition, Some(DataType::Boolean));
        self.analyze_expr(then_branch, None);
        self.analyze_expr(else_branch, None);

        let then_type = then_branch.value_type.borrow().clone();
        let else_type = else_branch.value_type.borrow().clone();
        if let (Some(t), Some(e)) = (then_type, else_type) {
            *expr.value_type.borrow_mut() = Some(fold_union(t, e));
        }
    }

    fn analyze_lambda(&mut self, expr: &Expr, lambda: &LambdaExpr) {
        let return_type = lambda.return_type.borrow().clone().unwrap_or(DataType::Any);
        let params: Vec<DataType> = lambda
            .parameters
            .iter()
            .map(|p| match &*p.kind.borrow() {
                SymbolKind::Variable(v) => v.declared_type.borrow().clone().unwrap_or(DataType::Any),
                _ => DataType::Any,
            })
            .collect();

        self.scopes.push(lambda.scope.clone());
        self.return_type_stack.push(return_type.clone());
        for stmt in lambda.body.statements.borrow().iter() {
            self.analyze_stmt_in_lambda(stmt);
        }
        self.return_type_stack.pop();
        self.scopes.pop();

        *expr.value_type.borrow_mut() =
            Some(DataType::Function(crate::types::FunctionType { params, return_type: Box::new(return_type) }));
    }

    /// A lambda body has no enclosing [`File`] to track mandatory top-level
    /// assignments against (those only apply at true file scope, §6), so its
    /// statements are walked with a throwaway file-less variant of
    /// [`Self::analyze_stmt`].
    fn analyze_stmt_in_lambda(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expression(e) => self.analyze_expr(e, None),
            StmtKind::Return { value } => {
                let expected = self.return_type_stack.last().cloned();
                if let Some(v) = value {
                    self.analyze_expr(v, expected);
                }
            }
            StmtKind::Assignment { lhs, rhs, is_declaration } if !*is_declaration => {
                self.analyze_expr(lhs, None);
                let expected = lhs.value_type.borrow().clone();
                self.analyze_expr(rhs, expected);
            }
            StmtKind::Assignment { lhs, rhs, .. } => {
                // Declarations inside a lambda body behave identically to a
                // top-level declaration assignment minus the mandatory-flag
                // bookkeeping (lambdas cannot assign `server_path`/`project_files`
                // meaningfully since they are not the file's top level).
                let declared = lhs.symbol_reference.borrow().upgrade().and_then(|sym| match &*sym.kind.borrow() {
                    SymbolKind::Variable(v) => v.declared_type.borrow().clone(),
                    _ => None,
                });
                match declared {
                    None => {
                        self.analyze_expr(rhs, None);
                        let inferred = rhs.value_type.borrow().clone();
                        if let Some(sym) = lhs.symbol_reference.borrow().upgrade() {
                            if let SymbolKind::Variable(v) = &*sym.kind.borrow() {
                                *v.declared_type.borrow_mut() = inferred.clone();
                            }
                        }
                        *lhs.value_type.borrow_mut() = inferred;
                    }
                    Some(declared_type) => {
                        *lhs.value_type.borrow_mut() = Some(declared_type.clone());
                        self.analyze_expr(rhs, Some(declared_type));
                    }
                }
            }
            StmtKind::PatternTest { lhs, rhs, .. } => {
                self.analyze_expr(lhs, None);
                let expected = lhs.value_type.borrow().clone();
                self.analyze_expr(rhs, expected);
            }
            StmtKind::If { condition, then_block, else_block } => {
                self.analyze_expr(condition, Some(DataType::Boolean));
                self.scopes.push(then_block.scope.clone());
                for s in then_block.statements.borrow().iter() {
                    self.analyze_stmt_in_lambda(s);
                }
                self.scopes.pop();
                if let Some(b) = else_block {
                    self.scopes.push(b.scope.clone());
                    for s in b.statements.borrow().iter() {
                        self.analyze_stmt_in_lambda(s);
                    }
                    self.scopes.pop();
                }
            }
            StmtKind::Assert { condition } => self.analyze_expr(condition, Some(DataType::Boolean)),
            StmtKind::Declaration { .. } => {
                // A nested function declared inside a lambda body has no
                // enclosing `File` either; out of scope for this crate's
                // supported program shapes (§1 Non-goals keeps nesting
                // shallow in practice).
            }
        }
    }
}

enum MemberResolution {
    Unchecked,
    Found(SymbolHandle),
    NotAnObject,
    NoSuchMember,
}

/// §4.6: "derive `value_type` from the resolved symbol."
fn value_type_from_symbol(sym: &SymbolHandle) -> Option<DataType> {
    match &*sym.kind.borrow() {
        SymbolKind::Variable(v) => v.declared_type.borrow().clone(),
        SymbolKind::Function(f) => Some(f.function_type()),
        SymbolKind::Constant(c) => c.value_type.borrow().clone(),
        SymbolKind::InterfaceProperty(p) | SymbolKind::ObjectProperty(p) => Some(p.property_type.borrow().clone()),
        SymbolKind::TypeSymbol(_) => None,
    }
}

fn is_numeric(ty: &Option<DataType>) -> bool {
    matches!(ty, Some(DataType::Integer) | Some(DataType::Double) | Some(DataType::Number) | Some(DataType::Boolean))
}

/// Numeric promotion ladder used by arithmetic binary operators: `double`
/// wins over `integer`; `number` is compatible with either.
fn numeric_binary_result(lhs: &DataType, rhs: &DataType) -> Option<DataType> {
    use DataType::*;
    match (lhs, rhs) {
        (Double, Double) | (Double, Integer) | (Integer, Double) => Some(Double),
        (Integer, Integer) => Some(Integer),
        (Number, Integer) | (Integer, Number) | (Number, Number) | (Number, Double) | (Double, Number) => Some(Number),
        _ => None,
    }
}

/// §4.6 array-literal fold / §4.6 conditional result: equal types fold to
/// themselves; otherwise grow (or start) a union. §8 "a union with a single
/// distinct option folds to that option (the analyzer never produces a
/// singleton union)" is what keeps this from ever emitting `Union([x])`.
fn fold_union(existing: DataType, next: DataType) -> DataType {
    if existing.equals(&next) {
        return existing;
    }
    match existing {
        DataType::Union(mut opts) => {
            if !opts.iter().any(|o| o.equals(&next)) {
                opts.push(next);
            }
            DataType::Union(opts)
        }
        other => DataType::Union(vec![other, next]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, ExprKind, File, Literal, Stmt, StmtKind};
    use crate::source_ref::Location;
    use crate::symbols::{FunctionSymbol, Scope, SymbolData, SymbolHeader, VariableSymbol};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(1, 1), Location::new(1, 1))
    }

    fn make_main_function(scope: Rc<Scope>) -> SymbolHandle {
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

    fn make_file_with_builtins() -> File {
        let block = Block::new(dummy_ref());
        block.install_builtins();
        let main_fn = make_main_function(block.scope.clone());
        File::new("t.lstf", "", block, main_fn)
    }

    fn declare_variable(file: &File, name: &str, declared_type: Option<DataType>) -> SymbolHandle {
        let sym = SymbolData::new_floating(
            SymbolHeader { name: name.into(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Variable(VariableSymbol { declared_type: RefCell::new(declared_type), has_initializer: true, is_parameter: false }),
        )
        .acquire();
        file.main_block.scope.add_symbol(name, &sym).unwrap();
        file.main_block.push(Stmt::new(dummy_ref(), StmtKind::Declaration { symbol: sym.clone() }));
        sym
    }

    fn name_expr(name: &str, sym: &SymbolHandle) -> Expr {
        let e = Expr::new(dummy_ref(), ExprKind::MemberAccess { inner: None, name: name.to_string() });
        *e.symbol_reference.borrow_mut() = sym.downgrade();
        e
    }

    #[test]
    fn missing_mandatory_assignments_are_both_reported() {
        let ctx = CompilationContext::new();
        let file = make_file_with_builtins();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        analyzer.analyze_file(&file);
        assert_eq!(ctx.sink.error_count(), 2);
    }

    #[test]
    fn numeric_promotion_widens_integer_to_number() {
        let ctx = CompilationContext::new();
        let file = make_file_with_builtins();
        let x = declare_variable(&file, "x", Some(DataType::Number));
        let lhs = name_expr("x", &x);
        let rhs = Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(3)));
        file.main_block.push(Stmt::new(dummy_ref(), StmtKind::Assignment { lhs, rhs, is_declaration: true }));

        let mut analyzer = SemanticAnalyzer::new(&ctx);
        analyzer.analyze_file(&file);

        // the two mandatory-assignment errors remain, but nothing else.
        assert_eq!(ctx.sink.error_count(), 2);
    }

    #[test]
    fn narrowing_assignment_is_a_type_mismatch() {
        let ctx = CompilationContext::new();
        let file = make_file_with_builtins();
        let x = declare_variable(&file, "x", Some(DataType::Integer));
        let lhs = name_expr("x", &x);
        let rhs = Expr::new(dummy_ref(), ExprKind::Literal(Literal::Double(3.0)));
        file.main_block.push(Stmt::new(dummy_ref(), StmtKind::Assignment { lhs, rhs, is_declaration: true }));

        let mut analyzer = SemanticAnalyzer::new(&ctx);
        analyzer.analyze_file(&file);

        // 2 mandatory-assignment errors + 1 type mismatch.
        assert_eq!(ctx.sink.error_count(), 3);
    }

    #[test]
    fn empty_array_literal_has_any_element_type() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        let expr = Expr::new(dummy_ref(), ExprKind::Array { elements: vec![], is_pattern: false });
        analyzer.analyze_expr(&expr, None);
        assert_eq!(expr.value_type.borrow().as_ref().unwrap().to_string(), "any[]");
    }

    #[test]
    fn array_literal_folds_equal_elements_without_growing_union() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        let elements = vec![
            Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1))),
            Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(2))),
        ];
        let expr = Expr::new(dummy_ref(), ExprKind::Array { elements, is_pattern: false });
        analyzer.analyze_expr(&expr, None);
        assert_eq!(expr.value_type.borrow().as_ref().unwrap().to_string(), "integer[]");
    }

    #[test]
    fn array_literal_folds_mixed_elements_into_a_union() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        let elements = vec![
            Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1))),
            Expr::new(dummy_ref(), ExprKind::Literal(Literal::String("two".into()))),
            Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(3))),
        ];
        let expr = Expr::new(dummy_ref(), ExprKind::Array { elements, is_pattern: false });
        analyzer.analyze_expr(&expr, None);
        assert_eq!(expr.value_type.borrow().as_ref().unwrap().to_string(), "integer | string");
    }

    #[test]
    fn ellipsis_outside_pattern_is_an_error() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        let expr = Expr::new(dummy_ref(), ExprKind::Ellipsis);
        analyzer.analyze_expr(&expr, None);
        assert_eq!(ctx.sink.error_count(), 1);
    }

    #[test]
    fn ellipsis_inside_pattern_array_is_allowed() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        let elements = vec![
            Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1))),
            Expr::new(dummy_ref(), ExprKind::Ellipsis),
        ];
        let expr = Expr::new(dummy_ref(), ExprKind::Array { elements, is_pattern: true });
        analyzer.analyze_expr(&expr, None);
        assert_eq!(ctx.sink.error_count(), 0);
        assert_eq!(expr.value_type.borrow().as_ref().unwrap().to_string(), "pattern");
    }

    #[test]
    fn object_literal_duplicate_member_is_reported() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        analyzer.scopes.push(Scope::new());
        let members = vec![
            crate::ast::ObjectMember { name: "n".into(), is_nullable: false, value: Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1))) },
            crate::ast::ObjectMember { name: "n".into(), is_nullable: false, value: Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(2))) },
        ];
        let expr = Expr::new(dummy_ref(), ExprKind::Object(ObjectExpr { members, is_pattern: false }));
        analyzer.analyze_expr(&expr, None);
        assert_eq!(ctx.sink.error_count(), 1);
    }

    #[test]
    fn object_literal_synthesizes_anonymous_interface() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        analyzer.scopes.push(Scope::new());
        let members = vec![crate::ast::ObjectMember {
            name: "n".into(),
            is_nullable: false,
            value: Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(7))),
        }];
        let expr = Expr::new(dummy_ref(), ExprKind::Object(ObjectExpr { members, is_pattern: false }));
        analyzer.analyze_expr(&expr, None);

        let ty = expr.value_type.borrow().clone().unwrap();
        assert!(matches!(ty, DataType::Interface(_)));
        assert_eq!(lookup_interface_member(&ty, "n").unwrap().to_string(), "integer");
    }

    #[test]
    fn conditional_folds_branch_types_into_a_union() {
        let ctx = CompilationContext::new();
        let mut analyzer = SemanticAnalyzer::new(&ctx);
        let expr = Expr::new(
            dummy_ref(),
            ExprKind::Conditional {
                condition: Box::new(Expr::new(dummy_ref(), ExprKind::Literal(Literal::Boolean(true)))),
                then_branch: Box::new(Expr::new(dummy_ref(), ExprKind::Literal(Literal::Integer(1)))),
                else_branch: Box::new(Expr::new(dummy_ref(), ExprKind::Literal(Literal::String("x".into())))),
            },
        );
        analyzer.analyze_expr(&expr, None);
        assert_eq!(expr.value_type.borrow().as_ref().unwrap().to_string(), "integer | string");
    }
}
