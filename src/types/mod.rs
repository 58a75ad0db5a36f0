//! Data-type lattice (C3) — §4.2.
//!
//! `DataType` is a tagged enum rather than a trait-with-one-impl-per-variant
//! (§9 "Polymorphic data types" names both as acceptable; a closed,
//! seventeen-variant lattice with no expectation of external extension
//! fits a `match` better, the same choice made for the closed
//! `ASTNode`/`PrimitiveDataType` enums in `ast/ast_node.rs` and
//! `ast/datatype.rs`).
//!
//! Every variant owns its children directly (`Box`/`Vec`) rather than
//! through a shared pointer: per invariant (D), reusing a data type in a
//! second slot must copy it first, and an owned tree makes that the
//! *only* option the type system allows — attempting to reuse a `DataType`
//! value in two slots is a move, and `.copy()` (== `.clone()`, since every
//! field is itself `Clone`) is the only way to use it twice. `Enum` and
//! `Interface` carry a [`WeakSymbol`] back-pointer to their nominal type
//! symbol instead of inlining members, since interface members live on the
//! `Interface` type-symbol's own member map (`symbols::InterfaceSymbol`).

use std::fmt;

use crate::symbols::{SymbolKind, TypeSymbolKind, WeakSymbol};

/// Function data type: structural, never bound to a named symbol.
#[derive(Debug, Clone)]
pub struct FunctionType {
    pub params: Vec<DataType>,
    pub return_type: Box<DataType>,
}

/// Error produced by [`DataType::add_type_parameter`] / `replace_type_parameter`
/// (§4.2 "Parameterized types").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityError {
    TooManyTypeArguments,
    MissingTypeArgument,
}

#[derive(Debug, Clone)]
pub enum DataType {
    Any,
    Void,
    Null,
    Boolean,
    Integer,
    Double,
    Number,
    String,
    Object,
    Pattern,
    /// Placeholder produced by the parser for a named type reference;
    /// eliminated by the resolver (§4.5 point 2). `type_arguments` holds
    /// any `<...>` arguments written at the reference site (e.g. `future`'s
    /// single wrapped type) before they've been matched up with the
    /// referenced type's parameter slots.
    Unresolved { name: String, type_arguments: Vec<DataType> },
    Array(Box<DataType>),
    Union(Vec<DataType>),
    /// `None` only transiently while being constructed by the resolver;
    /// a fully resolved `future` always has exactly one wrapped type.
    Future(Option<Box<DataType>>),
    Function(FunctionType),
    Enum(WeakSymbol),
    Interface(WeakSymbol),
}

impl DataType {
    /// `is_supertype_of(self, other)` — "`self` can receive a value of
    /// `other`" (§4.2 subtype table).
    pub fn is_supertype_of(&self, other: &DataType) -> bool {
        use DataType::*;
        match self {
            Any => !matches!(other, Void),
            Void => matches!(other, Void),
            Null => matches!(other, Null),
            Boolean => match other {
                Boolean => true,
                Union(opts) => opts.iter().all(|o| self.is_supertype_of(o)),
                _ => false,
            },
            Integer => matches!(other, Integer | Boolean),
            Double => matches!(other, Double | Integer),
            Number => matches!(other, Number | Integer | Double | Boolean),
            String => matches!(other, String),
            Object => matches!(other, Object | Interface(_)),
            Array(elem) => match other {
                Array(other_elem) => elem.equals(other_elem),
                _ => false,
            },
            Enum(sym) => match other {
                Enum(other_sym) => symbol_identity_eq(sym, other_sym),
                _ => false,
            },
            Interface(sym) => interface_is_supertype_of(sym, other),
            Future(Some(t)) => match other {
                Future(Some(other_t)) => t.is_supertype_of(other_t),
                _ => false,
            },
            Future(None) => false,
            Pattern => pattern_accepts(other),
            Union(opts) => opts.iter().all(|o| o.is_supertype_of(other)),
            Unresolved { .. } => false,
            Function(_) => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    /// `copy(self)` — a structurally new node with the same logical
    /// content. Array/union/future/function recurse into children;
    /// enum/interface retain the symbol back-pointer (they don't own
    /// members, so there is nothing deeper to copy).
    pub fn copy(&self) -> DataType {
        self.clone()
    }

    /// `equals(a, b) := is_supertype_of(a, b) AND is_supertype_of(b, a)`.
    pub fn equals(&self, other: &DataType) -> bool {
        self.is_supertype_of(other) && other.is_supertype_of(self)
    }

    /// `future` owns exactly one wrapped-type slot; `function` accumulates
    /// parameter types one at a time as the resolver replaces each
    /// `unresolved` parameter type in turn (§4.5 point 2's "containing
    /// data-type slot ... the parameters list of a parameterizable type").
    pub fn add_type_parameter(&mut self, param: DataType) -> Result<(), ArityError> {
        match self {
            DataType::Future(slot @ None) => {
                *slot = Some(Box::new(param));
                Ok(())
            }
            DataType::Future(Some(_)) => Err(ArityError::TooManyTypeArguments),
            DataType::Function(f) => {
                f.params.push(param);
                Ok(())
            }
            _ => Err(ArityError::TooManyTypeArguments),
        }
    }

    pub fn replace_type_parameter(&mut self, index: usize, param: DataType) -> Result<(), ArityError> {
        match self {
            DataType::Future(slot) => {
                if index != 0 {
                    return Err(ArityError::TooManyTypeArguments);
                }
                *slot = Some(Box::new(param));
                Ok(())
            }
            DataType::Function(f) => {
                if index >= f.params.len() {
                    return Err(ArityError::MissingTypeArgument);
                }
                f.params[index] = param;
                Ok(())
            }
            _ => Err(ArityError::TooManyTypeArguments),
        }
    }

    /// §4.2 "future owns exactly one wrapped type slot; ... missing
    /// parameter fails with `missing_type_argument`" — called once parsing
    /// of a `future<...>` reference is complete.
    pub fn check_future_arity(&self) -> Result<(), ArityError> {
        match self {
            DataType::Future(None) => Err(ArityError::MissingTypeArgument),
            _ => Ok(()),
        }
    }

    /// Invariant (E): true if `self` sits directly in a future/function's
    /// own type-parameter slot, as opposed to a structurally nested slot
    /// such as an array's element type. Because every parameterizable
    /// variant owns its parameter slots directly (no shared aliasing is
    /// possible, see invariant D), this is answered purely structurally by
    /// the caller holding the parent `DataType` — there is no need for a
    /// dynamic `parent` field to distinguish the two cases.
    pub fn is_type_parameter_of(parent: &DataType, candidate: &DataType) -> bool {
        match parent {
            DataType::Future(Some(t)) => std::ptr::eq(t.as_ref(), candidate),
            DataType::Function(f) => f.params.iter().any(|p| std::ptr::eq(p, candidate)),
            _ => false,
        }
    }

    /// `to_string(self)` — §4.2: named types print their symbol's name
    /// (unless it is an anonymous interface, which prints its structural
    /// shape instead); unions print `A | B`; arrays print `E[]`, or
    /// `(U)[]` when `E` is itself a union.
    pub fn to_display_string(&self) -> String {
        use DataType::*;
        match self {
            Any => "any".to_string(),
            Void => "void".to_string(),
            Null => "null".to_string(),
            Boolean => "boolean".to_string(),
            Integer => "integer".to_string(),
            Double => "double".to_string(),
            Number => "number".to_string(),
            String => "string".to_string(),
            Object => "object".to_string(),
            // [SUPPLEMENT-3] matches `lstf-patterntype.c`'s literal "pattern".
            Pattern => "pattern".to_string(),
            Unresolved { name, type_arguments } => {
                if type_arguments.is_empty() {
                    name.clone()
                } else {
                    let args = type_arguments.iter().map(DataType::to_display_string).collect::<Vec<_>>().join(", ");
                    format!("{}<{}>", name, args)
                }
            }
            Array(elem) => {
                if matches!(elem.as_ref(), Union(_)) {
                    format!("({})[]", elem.to_display_string())
                } else {
                    format!("{}[]", elem.to_display_string())
                }
            }
            Union(opts) => opts
                .iter()
                .map(DataType::to_display_string)
                .collect::<Vec<_>>()
                .join(" | "),
            // [SUPPLEMENT-3] matches `lstf-futuretype.c`'s `future<{}>` format.
            Future(Some(t)) => format!("future<{}>", t.to_display_string()),
            Future(None) => "future<?>".to_string(),
            Function(f) => {
                let params = f
                    .params
                    .iter()
                    .map(DataType::to_display_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({}) => {}", params, f.return_type.to_display_string())
            }
            Enum(sym) => symbol_display_name(sym),
            Interface(sym) => symbol_display_name(sym),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// §4.2 `pattern` row: accepts any type except `any`, `function`,
/// `unresolved`, `void`, `future`; for a union, iff every option is itself
/// pattern-acceptable.
///
/// [SUPPLEMENT/Open Question] `lstf-patterntype.c` rejects `unresolvedtype`
/// unconditionally, which can surface a confusing secondary error if the
/// resolver already failed on that type; per §9's open question we keep the
/// literal behavior (no short-circuit on prior error count) since the
/// analyzer only runs at all when the resolver's error counter is zero
/// (§4.6 "a pass with any errors prevents the subsequent pass from
/// running"), which already makes the scenario unreachable in practice.
fn pattern_accepts(other: &DataType) -> bool {
    match other {
        DataType::Any | DataType::Function(_) | DataType::Unresolved { .. } | DataType::Void | DataType::Future(_) => false,
        DataType::Union(opts) => opts.iter().all(pattern_accepts),
        _ => true,
    }
}

fn symbol_identity_eq(a: &WeakSymbol, b: &WeakSymbol) -> bool {
    match (a.upgrade(), b.upgrade()) {
        (Some(a), Some(b)) => crate::node::Handle::ptr_eq(&a, &b),
        _ => false,
    }
}

fn symbol_display_name(sym: &WeakSymbol) -> String {
    match sym.upgrade() {
        Some(handle) => {
            let is_anonymous_interface = matches!(
                &*handle.kind.borrow(),
                SymbolKind::TypeSymbol(TypeSymbolKind::Interface(i)) if i.is_anonymous
            );
            if is_anonymous_interface {
                anonymous_interface_shape(&handle)
            } else {
                handle.header.name.clone()
            }
        }
        None => "<unresolved symbol>".to_string(),
    }
}

fn anonymous_interface_shape(handle: &crate::symbols::SymbolHandle) -> String {
    let kind = handle.kind.borrow();
    let interface = match &*kind {
        SymbolKind::TypeSymbol(TypeSymbolKind::Interface(i)) => i,
        _ => return "{}".to_string(),
    };
    let members = interface.common.members.borrow();
    let rendered = members
        .iter()
        .map(|(name, member)| {
            let member_kind = member.kind.borrow();
            let ty = match &*member_kind {
                SymbolKind::InterfaceProperty(p) => p.property_type.borrow().to_display_string(),
                _ => "?".to_string(),
            };
            format!("{}: {}", name, ty)
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!("{{ {}; }}", rendered)
}

/// §4.2 interface row: `interface(I) :> interface(I')` iff (a) every base
/// type of `I` is also a supertype of `other`, and (b) every member of `I`
/// has a matching member in `I'` (searched through `I'`'s own members and
/// its base types) whose property type is a supertype of `I`'s member type.
/// `object :> interface` always holds (handled in the `Object` arm above);
/// any other `other` fails.
fn interface_is_supertype_of(i_weak: &WeakSymbol, other: &DataType) -> bool {
    let i_sym = match i_weak.upgrade() {
        Some(s) => s,
        None => return false,
    };
    let i_kind = i_sym.kind.borrow();
    let i_iface = match &*i_kind {
        SymbolKind::TypeSymbol(TypeSymbolKind::Interface(iface)) => iface,
        _ => return false,
    };

    match other {
        DataType::Interface(_) => {}
        _ => return false,
    }

    for base in i_iface.base_types.borrow().iter() {
        if !base.is_supertype_of(other) {
            return false;
        }
    }

    for (name, member) in i_iface.common.members.borrow().iter() {
        let member_kind = member.kind.borrow();
        let member_type = match &*member_kind {
            SymbolKind::InterfaceProperty(p) => p.property_type.borrow().clone(),
            _ => continue,
        };
        match crate::symbols::lookup_interface_member(other, name) {
            Some(other_type) => {
                if !other_type.is_supertype_of(&member_type) {
                    return false;
                }
            }
            None => return false,
        }
    }

    true
}
