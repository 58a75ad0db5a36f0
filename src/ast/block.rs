//! Blocks and the source-file root (C5) — §3 "Block"/"Source file".

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ast::stmt::{Stmt, StmtKind};
use crate::source_ref::{Location, SourceRef};
use crate::symbols::{FunctionSymbol, Scope, SymbolData, SymbolHandle, SymbolHeader, SymbolKind, VariableSymbol};
use crate::types::DataType;

/// §3 "Block": ordered sequence of statements, owned `scope`.
pub struct Block {
    pub source_ref: SourceRef,
    pub statements: RefCell<Vec<Stmt>>,
    pub scope: Rc<Scope>,
}

impl Block {
    pub fn new(source_ref: SourceRef) -> Block {
        Block { source_ref, statements: RefCell::new(Vec::new()), scope: Scope::new() }
    }

    pub fn push(&self, stmt: Stmt) {
        self.statements.borrow_mut().push(stmt);
    }

    /// [SUPPLEMENT-2] installs the declarations the parser is contractually
    /// required to have already produced (§6): the two mandatory bindings
    /// (`server_path`, `project_files`), the two named builtin functions
    /// (`diagnostics`, `print`), and a representative (non-exhaustive) LSP
    /// enum/interface pair so resolver/analyzer tests exercise a realistic
    /// starting scope without this crate depending on an actual LSP type
    /// catalogue.
    ///
    /// §6 describes these as "declarations in the main function" — i.e.
    /// owned, not merely named. Each builtin is therefore both entered into
    /// the block's scope directly (so a caller that never runs the resolver
    /// over this block still finds them by name) *and* wrapped in a
    /// `StmtKind::Declaration` pushed onto the block itself, which is this
    /// block's strong owner; without that second half, the only reference
    /// to each builtin symbol would be the scope's own weak entry and the
    /// `SymbolData` would be destroyed the moment the local `Handle`
    /// acquired here went out of scope.
    pub fn install_builtins(&self) {
        let builtin_ref = SourceRef::new("<builtin>", Location::ZERO, Location::ZERO);

        let server_path = SymbolData::new_floating(
            SymbolHeader { name: "server_path".to_string(), is_builtin: true, source_ref: builtin_ref.clone() },
            SymbolKind::Variable(VariableSymbol {
                declared_type: RefCell::new(Some(DataType::String)),
                has_initializer: false,
                is_parameter: false,
            }),
        )
        .acquire();
        let _ = self.scope.add_symbol("server_path", &server_path);
        self.push(Stmt::new(builtin_ref.clone(), StmtKind::Declaration { symbol: server_path }));

        let project_files = SymbolData::new_floating(
            SymbolHeader { name: "project_files".to_string(), is_builtin: true, source_ref: builtin_ref.clone() },
            SymbolKind::Variable(VariableSymbol {
                declared_type: RefCell::new(Some(DataType::Array(Box::new(DataType::String)))),
                has_initializer: false,
                is_parameter: false,
            }),
        )
        .acquire();
        let _ = self.scope.add_symbol("project_files", &project_files);
        self.push(Stmt::new(builtin_ref.clone(), StmtKind::Declaration { symbol: project_files }));

        let diagnostics_scope = Scope::new();
        let file_param = SymbolData::new_floating(
            SymbolHeader { name: "file".to_string(), is_builtin: true, source_ref: builtin_ref.clone() },
            SymbolKind::Variable(VariableSymbol {
                declared_type: RefCell::new(Some(DataType::String)),
                has_initializer: false,
                is_parameter: true,
            }),
        )
        .acquire();
        let diagnostics = SymbolData::new_floating(
            SymbolHeader { name: "diagnostics".to_string(), is_builtin: true, source_ref: builtin_ref.clone() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![file_param],
                return_type: RefCell::new(DataType::Any),
                is_async: false,
                is_instance: false,
                has_block: false,
                body: RefCell::new(None),
                scope: diagnostics_scope,
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire();
        let _ = self.scope.add_symbol("diagnostics", &diagnostics);
        self.push(Stmt::new(builtin_ref.clone(), StmtKind::Declaration { symbol: diagnostics }));

        let print_scope = Scope::new();
        let args_param = SymbolData::new_floating(
            SymbolHeader { name: "args".to_string(), is_builtin: true, source_ref: builtin_ref.clone() },
            SymbolKind::Variable(VariableSymbol {
                declared_type: RefCell::new(Some(DataType::Any)),
                has_initializer: false,
                is_parameter: true,
            }),
        )
        .acquire();
        let print = SymbolData::new_floating(
            SymbolHeader { name: "print".to_string(), is_builtin: true, source_ref: builtin_ref.clone() },
            SymbolKind::Function(FunctionSymbol {
                parameters: vec![args_param],
                return_type: RefCell::new(DataType::Void),
                is_async: false,
                is_instance: false,
                has_block: false,
                body: RefCell::new(None),
                scope: print_scope,
                captured_locals: RefCell::new(Vec::new()),
            }),
        )
        .acquire();
        let _ = self.scope.add_symbol("print", &print);
        self.push(Stmt::new(builtin_ref, StmtKind::Declaration { symbol: print }));
    }
}

/// §3 "Source file": path, contents, top-level block, implicit `main`
/// function. Also tracks the two mandatory top-level assignment flags the
/// analyzer checks at end of file (§4.6, §6, error category 10).
pub struct File {
    pub path: Rc<str>,
    pub contents: Rc<str>,
    pub main_block: Box<Block>,
    pub main_function: SymbolHandle,
    pub server_path_assigned: Cell<bool>,
    pub project_files_assigned: Cell<bool>,
}

impl File {
    pub fn new(path: impl Into<Rc<str>>, contents: impl Into<Rc<str>>, main_block: Block, main_function: SymbolHandle) -> File {
        File {
            path: path.into(),
            contents: contents.into(),
            main_block: Box::new(main_block),
            main_function,
            server_path_assigned: Cell::new(false),
            project_files_assigned: Cell::new(false),
        }
    }
}
