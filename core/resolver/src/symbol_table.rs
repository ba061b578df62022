//! Scoped symbol table used as the default semantic context.
//!
//! Scopes form a tree: the root scope holds file-level declarations and the
//! builtin typedef names, a function definition opens a scope for its
//! parameters and every nested compound statement opens one more. Lookup walks
//! from the current scope up to the root.
//!
//! The table follows the resolver's walk: declarations are registered when
//! the resolver leaves them, so a candidate only sees names declared before it
//! in document order.

use std::cell::RefCell;
use std::rc::Rc;

use cdom_ast::arena::AstArena;
use cdom_ast::nodes::{NodeId, NodeKind, StorageClass};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::context::{BindFailure, CandidateOutcome, SemanticContext};

/// Typedef names every translation unit can use without declaring them.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "size_t",
    "ptrdiff_t",
    "wchar_t",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Declaring node; `None` for builtins.
    pub declared_at: Option<NodeId>,
}

pub(crate) type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) id: u32,
    pub(crate) parent: Option<ScopeRef>,
    pub(crate) symbols: FxHashMap<String, Symbol>,
}

impl Scope {
    pub(crate) fn new(id: u32, parent: Option<ScopeRef>) -> ScopeRef {
        Rc::new(RefCell::new(Self {
            id,
            parent,
            symbols: FxHashMap::default(),
        }))
    }

    /// Inserts `symbol`, replacing a previous declaration of the same name in
    /// this scope (C allows redeclaration).
    pub(crate) fn insert_symbol(&mut self, name: &str, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.to_string(), symbol)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn lookup_symbol(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.symbols.get(name) {
            return Some(symbol.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().lookup_symbol(name);
        }
        None
    }
}

#[derive(Debug)]
pub struct ScopedSymbolTable {
    scopes: FxHashMap<u32, ScopeRef>,
    root_scope: ScopeRef,
    current_scope: ScopeRef,
    next_scope_id: u32,
}

impl Default for ScopedSymbolTable {
    fn default() -> Self {
        let root = Scope::new(0, None);
        let mut scopes = FxHashMap::default();
        scopes.insert(0, Rc::clone(&root));
        let table = ScopedSymbolTable {
            scopes,
            root_scope: Rc::clone(&root),
            current_scope: root,
            next_scope_id: 1,
        };
        table.init_builtin_types();
        table
    }
}

impl ScopedSymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn init_builtin_types(&self) {
        let mut root = self.root_scope.borrow_mut();
        for name in BUILTIN_TYPE_NAMES {
            root.insert_symbol(
                name,
                Symbol {
                    kind: SymbolKind::Type,
                    declared_at: None,
                },
            );
        }
    }

    pub fn push_scope(&mut self) -> u32 {
        let id = self.next_scope_id;
        self.next_scope_id += 1;
        let scope = Scope::new(id, Some(Rc::clone(&self.current_scope)));
        self.scopes.insert(id, Rc::clone(&scope));
        self.current_scope = scope;
        id
    }

    /// Leaves the current scope. The root scope is never left.
    pub fn pop_scope(&mut self) {
        let parent = self.current_scope.borrow().parent.clone();
        if let Some(parent) = parent {
            self.current_scope = parent;
        }
    }

    #[must_use]
    pub fn current_scope_id(&self) -> u32 {
        self.current_scope.borrow().id
    }

    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn register_type(&mut self, name: &str, declared_at: Option<NodeId>) {
        self.register(name, SymbolKind::Type, declared_at);
    }

    pub fn register_variable(&mut self, name: &str, declared_at: Option<NodeId>) {
        self.register(name, SymbolKind::Variable, declared_at);
    }

    pub fn register_function(&mut self, name: &str, declared_at: Option<NodeId>) {
        self.register(name, SymbolKind::Function, declared_at);
    }

    fn register(&mut self, name: &str, kind: SymbolKind, declared_at: Option<NodeId>) {
        self.current_scope
            .borrow_mut()
            .insert_symbol(name, Symbol { kind, declared_at });
    }

    /// Registers a function in the scope enclosing the current one, so the
    /// name outlives the function's own parameter scope.
    fn register_in_enclosing(&mut self, name: &str, kind: SymbolKind, declared_at: NodeId) {
        let enclosing = self
            .current_scope
            .borrow()
            .parent
            .clone()
            .unwrap_or_else(|| Rc::clone(&self.root_scope));
        enclosing.borrow_mut().insert_symbol(
            name,
            Symbol {
                kind,
                declared_at: Some(declared_at),
            },
        );
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.current_scope.borrow().lookup_symbol(name)
    }

    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        self.lookup(name)
            .is_some_and(|symbol| symbol.kind == SymbolKind::Type)
    }

    fn register_declaration(&mut self, arena: &AstArena, declaration: NodeId) {
        let Some(NodeKind::SimpleDeclaration(simple)) = arena.get(declaration) else {
            return;
        };
        let is_typedef = storage_of(arena, simple.decl_specifier) == StorageClass::Typedef;
        for declarator in &simple.declarators {
            let Some((name, is_function)) = declared_name(arena, *declarator) else {
                continue;
            };
            let name = name.to_string();
            if is_typedef {
                self.register_type(&name, Some(*declarator));
            } else if is_function {
                self.register_function(&name, Some(*declarator));
            } else {
                self.register_variable(&name, Some(*declarator));
            }
        }
    }

    fn register_function_declarator(&mut self, arena: &AstArena, declarator: NodeId) {
        let Some(NodeKind::FunctionDeclarator(function)) = arena.get(declarator) else {
            return;
        };
        if let Some(name) = arena.name_image(function.name) {
            let name = name.to_string();
            self.register_in_enclosing(&name, SymbolKind::Function, declarator);
        }
        for parameter in &function.parameters {
            let Some(NodeKind::ParameterDeclaration(parameter)) = arena.get(*parameter) else {
                continue;
            };
            if let Some((name, _)) = parameter
                .declarator
                .and_then(|declarator| declared_name(arena, declarator))
            {
                let name = name.to_string();
                self.register_variable(&name, parameter.declarator);
            }
        }
    }

    fn check_candidate(&self, arena: &AstArena, candidate: NodeId) -> Result<(), BindFailure> {
        let locals = CandidateLocals::collect(arena, candidate);
        self.check_node(arena, candidate, &locals)
    }

    fn check_node(
        &self,
        arena: &AstArena,
        node: NodeId,
        locals: &CandidateLocals,
    ) -> Result<(), BindFailure> {
        let Some(kind) = arena.get(node) else {
            return Err(BindFailure::Other(format!("node {node} is missing")));
        };
        if let Some(ambiguous) = kind.as_ambiguous() {
            // A nested ambiguity binds if any reading of it does.
            let mut first_failure = None;
            for candidate in ambiguous.candidates() {
                match self.check_node(arena, *candidate, locals) {
                    Ok(()) => return Ok(()),
                    Err(failure) => {
                        if first_failure.is_none() {
                            first_failure = Some(failure);
                        }
                    }
                }
            }
            return Err(first_failure
                .unwrap_or_else(|| BindFailure::Other("ambiguity without candidates".into())));
        }
        match kind {
            NodeKind::NamedTypeSpecifier(specifier) => {
                let name = arena.name_image(specifier.name).unwrap_or_default();
                if !locals.types.contains(name) {
                    match self.lookup(name) {
                        Some(symbol) if symbol.kind == SymbolKind::Type => {}
                        Some(_) => return Err(BindFailure::NotAType(name.to_string())),
                        None => return Err(BindFailure::Undeclared(name.to_string())),
                    }
                }
            }
            NodeKind::IdExpression(expression) => {
                let name = arena.name_image(expression.name).unwrap_or_default();
                if !locals.values.contains(name) {
                    match self.lookup(name) {
                        Some(symbol) if symbol.kind == SymbolKind::Type => {
                            return Err(BindFailure::NotAValue(name.to_string()));
                        }
                        Some(_) => {}
                        None => return Err(BindFailure::Undeclared(name.to_string())),
                    }
                }
            }
            _ => {}
        }
        for (_, child) in kind.children() {
            self.check_node(arena, child, locals)?;
        }
        Ok(())
    }
}

/// Names a candidate declares itself, visible to the rest of the candidate.
#[derive(Default)]
struct CandidateLocals {
    types: FxHashSet<String>,
    values: FxHashSet<String>,
}

impl CandidateLocals {
    fn collect(arena: &AstArena, candidate: NodeId) -> Self {
        let mut locals = CandidateLocals::default();
        for node in arena.descendants(candidate) {
            match arena.get(node) {
                Some(NodeKind::SimpleDeclaration(simple)) => {
                    let is_typedef =
                        storage_of(arena, simple.decl_specifier) == StorageClass::Typedef;
                    for declarator in &simple.declarators {
                        if let Some((name, _)) = declared_name(arena, *declarator) {
                            if is_typedef {
                                locals.types.insert(name.to_string());
                            } else {
                                locals.values.insert(name.to_string());
                            }
                        }
                    }
                }
                Some(NodeKind::ParameterDeclaration(parameter)) => {
                    if let Some((name, _)) = parameter
                        .declarator
                        .and_then(|declarator| declared_name(arena, declarator))
                    {
                        locals.values.insert(name.to_string());
                    }
                }
                Some(NodeKind::FunctionDefinition(definition)) => {
                    if let Some((name, _)) = declared_name(arena, definition.declarator) {
                        locals.values.insert(name.to_string());
                    }
                }
                _ => {}
            }
        }
        locals
    }
}

fn storage_of(arena: &AstArena, decl_specifier: NodeId) -> StorageClass {
    match arena.get(decl_specifier) {
        Some(NodeKind::SimpleDeclSpecifier(specifier)) => specifier.storage,
        Some(NodeKind::NamedTypeSpecifier(specifier)) => specifier.storage,
        _ => StorageClass::Unspecified,
    }
}

/// Name introduced by a declarator and whether it declares a function.
fn declared_name(arena: &AstArena, declarator: NodeId) -> Option<(&str, bool)> {
    match arena.get(declarator)? {
        NodeKind::Declarator(plain) => arena.name_image(plain.name).map(|name| (name, false)),
        NodeKind::FunctionDeclarator(function) => {
            arena.name_image(function.name).map(|name| (name, true))
        }
        _ => None,
    }
}

fn owned_by_function_definition(arena: &AstArena, node: NodeId) -> bool {
    arena
        .parent(node)
        .and_then(|parent| arena.get(parent))
        .is_some_and(|parent| matches!(parent, NodeKind::FunctionDefinition(_)))
}

impl SemanticContext for ScopedSymbolTable {
    fn bind_candidate(&mut self, arena: &AstArena, candidate: NodeId) -> CandidateOutcome {
        match self.check_candidate(arena, candidate) {
            Ok(()) => CandidateOutcome::bound(),
            Err(failure) => CandidateOutcome::Unbound(failure),
        }
    }

    fn enter_node(&mut self, arena: &AstArena, node: NodeId) {
        match arena.get(node) {
            Some(NodeKind::FunctionDefinition(_)) => {
                self.push_scope();
            }
            Some(NodeKind::CompoundStatement(_)) if !owned_by_function_definition(arena, node) => {
                self.push_scope();
            }
            _ => {}
        }
    }

    fn leave_node(&mut self, arena: &AstArena, node: NodeId) {
        match arena.get(node) {
            Some(NodeKind::FunctionDefinition(_)) => self.pop_scope(),
            Some(NodeKind::CompoundStatement(_)) if !owned_by_function_definition(arena, node) => {
                self.pop_scope();
            }
            Some(NodeKind::FunctionDeclarator(_)) if owned_by_function_definition(arena, node) => {
                self.register_function_declarator(arena, node);
            }
            Some(NodeKind::SimpleDeclaration(_)) => self.register_declaration(arena, node),
            _ => {}
        }
    }
}
