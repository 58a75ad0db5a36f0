//! Compilation context — §9 "Global state".
//!
//! The source keeps `num_interfaces_created` and `next_pattern_test_id` as
//! process-global counters. [AMBIENT-4]/§9's own recommendation ("a
//! language-neutral strategy is to pass a compilation context that carries
//! both counters and any diagnostics sink") is what we do instead: one
//! `CompilationContext` per file, threaded through the resolver and then
//! the analyzer, matching `Compiler<P, A, G>`'s pattern of
//! carrying pass-specific state (`env_vars`, `precision`) in a single
//! struct built once per compilation rather than in process globals.

use std::cell::{Cell, RefCell};

use crate::diagnostics::DiagnosticsSink;
use crate::symbols::SymbolHandle;

pub struct CompilationContext {
    pub sink: DiagnosticsSink,
    num_interfaces_created: Cell<u32>,
    next_pattern_test_id: Cell<u32>,
    /// §3 "a fresh anonymous interface is minted for every object literal
    /// during analysis" — owned here (the object literal itself has no
    /// slot to hold a type-symbol handle) so the synthesized
    /// `SymbolData`'s strong count never drops to zero once the analyzer
    /// that minted it returns. Without a strong owner the interface is
    /// destroyed the moment the local `Handle` that created it goes out of
    /// scope, leaving every `WeakSymbol` pointing at it (the scope entry,
    /// the expression's `value_type`) dangling.
    anonymous_interfaces: RefCell<Vec<SymbolHandle>>,
}

impl CompilationContext {
    pub fn new() -> Self {
        CompilationContext {
            sink: DiagnosticsSink::new(),
            num_interfaces_created: Cell::new(0),
            next_pattern_test_id: Cell::new(0),
            anonymous_interfaces: RefCell::new(Vec::new()),
        }
    }

    /// Names the next anonymous interface minted for an object literal
    /// (§3 "a fresh anonymous interface is minted for every object literal
    /// during analysis").
    pub fn next_anonymous_interface_name(&self) -> String {
        let n = self.num_interfaces_created.get();
        self.num_interfaces_created.set(n + 1);
        format!("<anonymous interface #{}>", n)
    }

    /// Keeps `sym` alive for the lifetime of the context. Called once per
    /// synthesized anonymous interface (`analyzer::analyze_object`) so the
    /// `WeakSymbol`s handed out to the scope and the expression's
    /// `value_type` stay upgradeable.
    pub fn retain_anonymous_interface(&self, sym: SymbolHandle) {
        self.anonymous_interfaces.borrow_mut().push(sym);
    }

    /// [SUPPLEMENT-1]: a stable id handed to every pattern-test statement
    /// the resolver visits for the first time.
    pub fn next_pattern_test_id(&self) -> u32 {
        let id = self.next_pattern_test_id.get();
        self.next_pattern_test_id.set(id + 1);
        id
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_monotone() {
        let ctx = CompilationContext::new();
        assert_eq!(ctx.next_pattern_test_id(), 0);
        assert_eq!(ctx.next_pattern_test_id(), 1);
        assert_eq!(ctx.next_anonymous_interface_name(), "<anonymous interface #0>");
        assert_eq!(ctx.next_anonymous_interface_name(), "<anonymous interface #1>");
    }
}
