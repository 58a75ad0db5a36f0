//! Symbols (C4) — §3 "Symbol" entity family and §4.3.
//!
//! A [`Symbol`] is the one node kind in this tree that genuinely needs
//! shared ownership: it is owned by its declaring statement (or parameter
//! list, or enclosing type symbol / object-literal) and *also* named, by
//! weak reference, from every [`Scope`] that can see it and every
//! expression whose `symbol_reference` points at it. That is exactly the
//! shape [`crate::node::Floating`]/[`Handle`]/[`WeakHandle`] model.

pub mod scope;

use std::cell::RefCell;
use std::collections::HashSet;

use crate::ast::block::Block;
use crate::node::{Floating, Handle, WeakHandle};
use crate::source_ref::SourceRef;
use crate::types::DataType;

pub use scope::{Scope, ScopeStack};

pub type SymbolHandle = Handle<SymbolData>;
pub type WeakSymbol = WeakHandle<SymbolData>;

/// Fields common to every symbol discriminant (§3 "Symbol (abstract)").
pub struct SymbolHeader {
    pub name: String,
    pub is_builtin: bool,
    pub source_ref: SourceRef,
}

pub struct SymbolData {
    pub header: SymbolHeader,
    pub kind: RefCell<SymbolKind>,
}

impl SymbolData {
    pub fn new_floating(header: SymbolHeader, kind: SymbolKind) -> Floating<SymbolData> {
        Floating::new(SymbolData { header, kind: RefCell::new(kind) })
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }
}

pub enum SymbolKind {
    Variable(VariableSymbol),
    Function(FunctionSymbol),
    TypeSymbol(TypeSymbolKind),
    Constant(ConstantSymbol),
    InterfaceProperty(PropertySymbol),
    ObjectProperty(PropertySymbol),
}

/// §3 "Variable": optional explicit type, optional initializer. The
/// initializer itself lives on the owning `Assignment`/`Declaration`
/// statement, not here; this just tracks whether one was given and the
/// resolved/declared type slot the analyzer fills in.
pub struct VariableSymbol {
    pub declared_type: RefCell<Option<DataType>>,
    pub has_initializer: bool,
    pub is_parameter: bool,
}

/// §3 "Function": parameter list, return type, optional block (`None` ⇒
/// builtin / VM-call), async/instance flags, own scope, captured-locals set.
pub struct FunctionSymbol {
    pub parameters: Vec<SymbolHandle>,
    pub return_type: RefCell<DataType>,
    pub is_async: bool,
    pub is_instance: bool,
    pub has_block: bool,
    /// The function's own block, owned here rather than by the declaring
    /// statement (§3 "Function ... optional block (none ⇒ builtin/VM-call)").
    /// `None` for a builtin/VM-call function even when `has_block` would
    /// otherwise be expected; taken out and put back by the resolver/analyzer
    /// walks (see [`crate::resolver::SymbolResolver::resolve_function_body`])
    /// rather than borrowed for the whole walk, since a nested call can
    /// re-enter the same symbol's `kind` cell (e.g. a recursive call's type
    /// lookup).
    pub body: RefCell<Option<Block>>,
    pub scope: std::rc::Rc<Scope>,
    /// Ordered (insertion order matters for the bytecode emitter's capture
    /// layout) and deduplicated by symbol identity, not name.
    pub captured_locals: RefCell<Vec<WeakSymbol>>,
}

impl FunctionSymbol {
    pub fn function_type(&self) -> DataType {
        let params = self
            .parameters
            .iter()
            .map(|p| match &*p.kind.borrow() {
                SymbolKind::Variable(v) => v.declared_type.borrow().clone().unwrap_or(DataType::Any),
                _ => DataType::Any,
            })
            .collect();
        crate::types::DataType::Function(crate::types::FunctionType {
            params,
            return_type: Box::new(self.return_type.borrow().clone()),
        })
    }

    /// Adds `sym` to the captured-locals set if not already present
    /// (identity comparison, §4.5 point 4). Returns `false` if the symbol
    /// was already captured (a no-op insert).
    pub fn capture(&self, sym: &SymbolHandle) -> bool {
        let already = self.captured_locals.borrow().iter().any(|w| match w.upgrade() {
            Some(existing) => Handle::ptr_eq(&existing, sym),
            None => false,
        });
        if already {
            return false;
        }
        self.captured_locals.borrow_mut().push(sym.downgrade());
        true
    }
}

/// §3 "Type symbol (abstract)": discriminant, own scope, insertion-ordered
/// `name -> member` map. Represented as a `Vec` rather than an `IndexMap`
/// since `ast/symbol_table.rs` uses a plain `HashMap`
/// with a separate `declaration_order` field for the same ordering need —
/// a `Vec` of pairs gets the same property more directly for the small
/// member counts interfaces/enums actually have.
pub struct TypeSymbolCommon {
    pub scope: std::rc::Rc<Scope>,
    pub members: RefCell<Vec<(String, SymbolHandle)>>,
}

impl TypeSymbolCommon {
    pub fn new(scope: std::rc::Rc<Scope>) -> Self {
        TypeSymbolCommon { scope, members: RefCell::new(Vec::new()) }
    }

    pub fn get_member(&self, name: &str) -> Option<SymbolHandle> {
        self.members.borrow().iter().find(|(n, _)| n == name).map(|(_, s)| s.clone())
    }

    pub fn insert_member(&self, name: String, sym: SymbolHandle) {
        self.members.borrow_mut().push((name, sym));
    }
}

pub enum TypeSymbolKind {
    Alias { common: TypeSymbolCommon, target: RefCell<DataType> },
    Enum(EnumSymbol),
    Interface(InterfaceSymbol),
}

pub struct EnumSymbol {
    pub common: TypeSymbolCommon,
}

/// §3 "Interface": ordered members, base-type references, `is_anonymous`.
pub struct InterfaceSymbol {
    pub common: TypeSymbolCommon,
    pub base_types: RefCell<Vec<DataType>>,
    pub is_anonymous: bool,
}

pub struct ConstantSymbol {
    pub value_type: RefCell<Option<DataType>>,
}

pub struct PropertySymbol {
    pub property_type: RefCell<DataType>,
    pub is_nullable: bool,
}

/// Walks `datatype`'s own members and then its base types to find `name`.
/// [SUPPLEMENT-4]: breadth-first across the base-type list (not recursively
/// through each base's own `is_supertype_of`) so a diamond-shaped base
/// hierarchy resolves the nearest match instead of potentially looping —
/// `lstf-interfacetype.c`'s member lookup walks a base's `members` map
/// directly rather than going back through `is_supertype_of`, which is the
/// behavior this mirrors.
pub fn lookup_interface_member(datatype: &DataType, name: &str) -> Option<DataType> {
    let member = lookup_interface_member_symbol(datatype, name)?;
    let kind = member.kind.borrow();
    match &*kind {
        SymbolKind::InterfaceProperty(p) => Some(p.property_type.borrow().clone()),
        _ => None,
    }
}

/// Same walk as [`lookup_interface_member`] but returns the member symbol
/// itself rather than just its type, so a caller (the analyzer's non-trivial
/// member access handling, §4.6) can set an expression's `symbol_reference`
/// to the actual property, not merely record its type.
pub fn lookup_interface_member_symbol(datatype: &DataType, name: &str) -> Option<SymbolHandle> {
    let iface_weak = match datatype {
        DataType::Interface(w) => w,
        _ => return None,
    };
    let root = iface_weak.upgrade()?;

    let mut frontier: Vec<SymbolHandle> = vec![root];
    let mut visited: HashSet<*const ()> = HashSet::new();

    while !frontier.is_empty() {
        let mut next_frontier = Vec::new();
        for sym in frontier {
            let ptr = Handle::as_ptr(&sym);
            if !visited.insert(ptr) {
                continue;
            }
            let kind = sym.kind.borrow();
            let iface = match &*kind {
                SymbolKind::TypeSymbol(TypeSymbolKind::Interface(i)) => i,
                _ => continue,
            };
            if let Some(member) = iface.common.get_member(name) {
                return Some(member);
            }
            for base in iface.base_types.borrow().iter() {
                if let DataType::Interface(base_weak) = base {
                    if let Some(base_sym) = base_weak.upgrade() {
                        next_frontier.push(base_sym);
                    }
                }
            }
        }
        frontier = next_frontier;
    }

    None
}
