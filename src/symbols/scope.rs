//! Scopes (C4) — §3 "Scope" entity and §4.3.
//!
//! A scope is just a `name -> weak(symbol)` map; nothing here owns the
//! symbols it names. `lookup`'s "walk outward through the owner's parent
//! back-pointer" (§4.3) is realized by [`ScopeStack`], the explicit stack
//! the resolver and analyzer each carry during their single depth-first
//! walk (§4.5/§4.6): because the walk is single-pass and depth-first, the
//! stack's contents are always exactly the lexical ancestor chain at the
//! current position, so walking the stack top-down is equivalent to
//! climbing `parent` pointers node-by-node, without needing every node to
//! carry one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::node::Handle;
use crate::symbols::{SymbolHandle, WeakSymbol};

/// §3 "Scope": `map name → weak(symbol)`.
pub struct Scope {
    names: RefCell<HashMap<String, WeakSymbol>>,
}

/// Error returned by [`Scope::add_symbol`] on a name collision — invariant
/// (F): "a symbol may appear in at most one scope... an error for a
/// collision (different symbol, same name)".
pub struct Collision {
    pub existing: SymbolHandle,
}

impl Scope {
    pub fn new() -> Rc<Scope> {
        Rc::new(Scope { names: RefCell::new(HashMap::new()) })
    }

    /// `get_symbol(name)` — looks only in this scope.
    pub fn get_symbol(&self, name: &str) -> Option<SymbolHandle> {
        self.names.borrow().get(name).and_then(WeakSymbol::upgrade)
    }

    /// Inserts `sym` under `name`. Idempotent for the same `(name, symbol)`
    /// pair; returns the previously-registered symbol on a genuine
    /// collision so the caller can build the "conflicts with previous"
    /// diagnostic note (§4.5 point 1 / error category 1).
    pub fn add_symbol(&self, name: &str, sym: &SymbolHandle) -> Result<(), Collision> {
        if let Some(existing) = self.get_symbol(name) {
            if Handle::ptr_eq(&existing, sym) {
                return Ok(());
            }
            return Err(Collision { existing });
        }
        self.names.borrow_mut().insert(name.to_string(), sym.downgrade());
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.names.borrow().keys().cloned().collect()
    }
}

/// An explicit stack of active scopes maintained by a single depth-first
/// walk (§4.5, §4.6). Generalizes `semantic_analyser::ScopeTracker`'s
/// `Vec<HashMap<String, SymbolType>>` from per-walk `HashMap`s to shared
/// `Scope` handles, since scopes here are real entities owned by
/// blocks/functions/lambdas/type-symbols rather than throwaway per-pass
/// bookkeeping.
pub struct ScopeStack {
    scopes: Vec<Rc<Scope>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { scopes: Vec::new() }
    }

    pub fn push(&mut self, scope: Rc<Scope>) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<Rc<Scope>> {
        self.scopes.pop()
    }

    pub fn current(&self) -> &Rc<Scope> {
        self.scopes.last().expect("scope stack must not be empty during a walk")
    }

    /// `lookup(name)` — tries the current scope, then walks outward.
    pub fn lookup(&self, name: &str) -> Option<SymbolHandle> {
        self.scopes.iter().rev().find_map(|scope| scope.get_symbol(name))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_ref::{Location, SourceRef};
    use crate::symbols::{ConstantSymbol, SymbolData, SymbolHeader, SymbolKind};
    use crate::types::DataType;

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(1, 1), Location::new(1, 1))
    }

    fn make_constant(name: &str) -> SymbolHandle {
        SymbolData::new_floating(
            SymbolHeader { name: name.to_string(), is_builtin: false, source_ref: dummy_ref() },
            SymbolKind::Constant(ConstantSymbol { value_type: RefCell::new(Some(DataType::Integer)) }),
        )
        .acquire()
    }

    #[test]
    fn add_symbol_is_idempotent_for_same_pair() {
        let scope = Scope::new();
        let a = make_constant("A");
        assert!(scope.add_symbol("A", &a).is_ok());
        assert!(scope.add_symbol("A", &a).is_ok());
    }

    #[test]
    fn add_symbol_collides_on_different_symbol_same_name() {
        let scope = Scope::new();
        let a = make_constant("A");
        let b = make_constant("A");
        assert!(scope.add_symbol("A", &a).is_ok());
        assert!(scope.add_symbol("A", &b).is_err());
    }

    #[test]
    fn lookup_walks_outward_through_the_stack() {
        let outer = Scope::new();
        let inner = Scope::new();
        let x = make_constant("x");
        outer.add_symbol("x", &x).unwrap();

        let mut stack = ScopeStack::new();
        stack.push(outer);
        stack.push(inner);

        assert!(stack.lookup("x").is_some());
        assert!(stack.current().get_symbol("x").is_none());
    }
}
