//! Scope analysis and variable resolution.
//!
//! # Overview
//!
//! Call [`analyze`] to build a [`ScopeTree`] from a parsed [`Program`].  The
//! tree records every [`Scope`] (with its [`ScopeKind`] and [`Binding`]
//! declarations), maps each scope-opening AST node to its scope, and resolves
//! identifier references across the entire program:
//!
//! - A reference that finds a binding on the scope chain is appended to that
//!   binding's [`Binding::references`].
//! - A reference that finds nothing is recorded in [`ScopeTree::globals`].
//!
//! Lexical declarations of every statement list are registered when the list
//! is entered, so forward references (calls to functions declared further
//! down, closures that mention a later `let`) resolve to the right binding.
//!
//! A lexical name declared twice in one scope is fatal and reported as
//! [`LetFloatError::DuplicateBinding`].
//!
//! # Direct eval
//!
//! Each [`Scope`] records in `uses_eval` whether it or a descendant contains a
//! direct call to `eval(…)`.  An eval can observe or introduce bindings
//! anywhere on its chain, so the flag is set on every enclosing scope.

use std::collections::HashMap;

use crate::error::{LetFloatError, LetFloatResult};
use crate::parser::ast::{
    ArrowBody, ArrowExpr, BlockStmt, Class, ClassMember, ExportDecl, ExportDefault, Expr, ForHead,
    ForInit, Function, MemberProp, ModuleExportName, NodeId, ObjectPatProp, ObjectProp, Pat,
    Program, PropKey, SourceLocation, SourceType, Stmt, VarDecl, VarKind,
};

// ─────────────────────────────────────────────────────────────────────────────
// Public identifier types
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque identifier for a [`Scope`] in the [`ScopeTree`].
pub type ScopeId = usize;

// ─────────────────────────────────────────────────────────────────────────────
// Scope kind
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of a JavaScript scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The implicit outermost scope of a classic script.
    Global,
    /// The scope created by a function, method, arrow, or static block.
    Function,
    /// A `{ … }` block scope, a lexical `for` head, a `switch` body, or the
    /// name scope of a class expression.
    Block,
    /// The implicit outermost scope of an ES module.
    Module,
    /// The scope introduced by a `with (obj) { … }` statement.
    With,
    /// The scope created by a `catch (param) { … }` clause.
    Catch,
}

impl ScopeKind {
    /// Returns `true` if this kind creates a new *function* scope boundary
    /// (`var` declarations are hoisted here).
    pub fn is_function_boundary(self) -> bool {
        matches!(self, ScopeKind::Global | ScopeKind::Function | ScopeKind::Module)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding kind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic origin of a [`Binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `var` declaration.
    Var,
    /// `let` declaration.
    Let,
    /// `const` declaration.
    Const,
    /// `function` declaration (or the self-name of a function expression).
    Function,
    /// `class` declaration (or the self-name of a class expression).
    Class,
    /// A formal parameter, or a `catch` parameter.
    Param,
    /// A binding introduced by an `import` declaration.
    Import,
}

impl BindingKind {
    /// Returns `true` for block-scoped declarations that may not be
    /// redeclared (`let`, `const`, `class`).
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            BindingKind::Let | BindingKind::Const | BindingKind::Class
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding
// ─────────────────────────────────────────────────────────────────────────────

/// One resolved occurrence of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Source location of the identifier.
    pub loc: SourceLocation,
    /// The innermost scope the reference occurs in.
    pub scope: ScopeId,
    /// `true` for assignment and update targets.
    pub is_write: bool,
}

/// A single name declared in a [`Scope`].
#[derive(Debug, Clone)]
pub struct Binding {
    /// The identifier text.
    pub name: String,
    /// Syntactic origin of this binding.
    pub kind: BindingKind,
    /// Source location of the (latest) declaration.
    pub loc: SourceLocation,
    /// The scope that owns this binding.
    pub scope_id: ScopeId,
    /// Every resolved reference to this binding, in source order.
    pub references: Vec<Reference>,
    /// How many declarations give this binding a value (initializers,
    /// function declarations, parameters).
    pub initializations: u32,
    /// Location of the latest declaration that gives the binding a value.
    pub init_loc: Option<SourceLocation>,
}

impl Binding {
    /// `true` when the binding is assigned after its first initialization.
    pub fn is_reassigned(&self) -> bool {
        self.initializations > 1 || self.references.iter().any(|r| r.is_write)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// A single scope node in the [`ScopeTree`].
#[derive(Debug, Clone)]
pub struct Scope {
    /// Unique identifier within the [`ScopeTree`].
    pub id: ScopeId,
    /// The kind of this scope.
    pub kind: ScopeKind,
    /// The parent scope, or `None` for the root.
    pub parent: Option<ScopeId>,
    /// Direct child scopes.
    pub children: Vec<ScopeId>,
    /// The AST node that opened this scope (`None` for the root).
    pub node: Option<NodeId>,
    /// All names declared directly in this scope.
    pub bindings: HashMap<String, Binding>,
    /// `true` if this scope or a descendant contains a direct `eval(…)`.
    pub uses_eval: bool,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, node: Option<NodeId>) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            node,
            bindings: HashMap::new(),
            uses_eval: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScopeTree
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a complete scope analysis pass over a [`Program`].
#[derive(Debug)]
pub struct ScopeTree {
    /// All scopes, indexed by [`ScopeId`].
    pub scopes: Vec<Scope>,
    /// The root scope (Global or Module).
    pub root: ScopeId,
    /// Scope-opening AST nodes and the scope each one opens.
    pub node_scopes: HashMap<NodeId, ScopeId>,
    /// Names referenced without any visible declaration, with their
    /// reference sites.
    pub globals: HashMap<String, Vec<Reference>>,
}

impl ScopeTree {
    /// Returns a reference to the scope with the given `id`.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Find the binding `name` resolves to when referenced from `scope`.
    pub fn lookup(&self, mut scope: ScopeId, name: &str) -> Option<&Binding> {
        loop {
            let s = &self.scopes[scope];
            if let Some(b) = s.bindings.get(name) {
                return Some(b);
            }
            scope = s.parent?;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Analyse `program` and return the fully-populated [`ScopeTree`].
///
/// # Errors
///
/// Returns [`LetFloatError::DuplicateBinding`] for the first conflicting
/// declaration.
pub fn analyze(program: &Program) -> LetFloatResult<ScopeTree> {
    let mut analyzer = Analyzer::new();
    analyzer.analyze_program(program)?;
    Ok(ScopeTree {
        scopes: analyzer.scopes,
        root: 0,
        node_scopes: analyzer.node_scopes,
        globals: analyzer.globals,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal analyser
// ─────────────────────────────────────────────────────────────────────────────

struct Analyzer {
    scopes: Vec<Scope>,
    /// Stack of active scope IDs (back = innermost).
    scope_stack: Vec<ScopeId>,
    node_scopes: HashMap<NodeId, ScopeId>,
    globals: HashMap<String, Vec<Reference>>,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            scopes: Vec::new(),
            scope_stack: Vec::new(),
            node_scopes: HashMap::new(),
            globals: HashMap::new(),
        }
    }

    // ── Scope management ─────────────────────────────────────────────────────

    fn push_scope(&mut self, kind: ScopeKind, node: Option<NodeId>) -> ScopeId {
        let parent = self.scope_stack.last().copied();
        let id = self.scopes.len();
        self.scopes.push(Scope::new(id, kind, parent, node));
        if let Some(p) = parent {
            self.scopes[p].children.push(id);
        }
        if let Some(node) = node {
            self.node_scopes.insert(node, id);
        }
        self.scope_stack.push(id);
        id
    }

    fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    fn current_scope(&self) -> ScopeId {
        self.scope_stack.last().copied().unwrap_or(0)
    }

    /// Returns the nearest enclosing scope whose kind is a function boundary.
    fn nearest_fn_scope(&self) -> ScopeId {
        self.scope_stack
            .iter()
            .rev()
            .copied()
            .find(|&id| self.scopes[id].kind.is_function_boundary())
            .unwrap_or(0)
    }

    // ── Declaration helpers ───────────────────────────────────────────────────

    /// Declare `name` with `kind` at `loc` in scope `scope_id`.
    ///
    /// - `var` may redeclare a `var`, `function`, or parameter.
    /// - `function` may redeclare a `function`, and at a function boundary
    ///   also a `var` or parameter; the binding then becomes a function.
    /// - Parameters may repeat.
    /// - Everything else is a duplicate.
    fn declare(
        &mut self,
        name: &str,
        kind: BindingKind,
        loc: SourceLocation,
        scope_id: ScopeId,
        initialized: bool,
    ) -> LetFloatResult<()> {
        let at_boundary = self.scopes[scope_id].kind.is_function_boundary();
        if let Some(existing) = self.scopes[scope_id].bindings.get_mut(name) {
            use BindingKind as K;
            let compatible = match (existing.kind, kind) {
                (K::Var | K::Function | K::Param, K::Var) => true,
                (K::Function, K::Function) => true,
                (K::Var | K::Param, K::Function) => at_boundary,
                (K::Param, K::Param) => true,
                _ => false,
            };
            if !compatible {
                return Err(LetFloatError::DuplicateBinding {
                    name: name.to_owned(),
                    line: loc.start.line,
                    column: loc.start.column,
                });
            }
            if kind == K::Function {
                existing.kind = K::Function;
                existing.loc = loc;
            }
            if initialized {
                existing.initializations += 1;
                existing.init_loc = Some(loc);
            }
            return Ok(());
        }

        let binding = Binding {
            name: name.to_owned(),
            kind,
            loc,
            scope_id,
            references: Vec::new(),
            initializations: u32::from(initialized),
            init_loc: initialized.then_some(loc),
        };
        self.scopes[scope_id]
            .bindings
            .insert(name.to_owned(), binding);
        Ok(())
    }

    fn declare_pat(
        &mut self,
        pat: &Pat,
        kind: BindingKind,
        scope_id: ScopeId,
        initialized: bool,
    ) -> LetFloatResult<()> {
        for id in pat.bound_names() {
            self.declare(&id.name, kind, id.loc, scope_id, initialized)?;
        }
        Ok(())
    }

    /// Register the lexical declarations that sit directly in `stmts`
    /// (`let`, `const`, `class`, function declarations, imports) in the
    /// current scope.
    fn declare_lexical(&mut self, stmts: &[Stmt]) -> LetFloatResult<()> {
        for stmt in stmts {
            self.declare_lexical_stmt(stmt)?;
        }
        Ok(())
    }

    fn declare_lexical_stmt(&mut self, stmt: &Stmt) -> LetFloatResult<()> {
        let sid = self.current_scope();
        match stmt {
            Stmt::Var(v) => self.declare_lexical_var(v)?,
            Stmt::FnDecl(f) => {
                if let Some(id) = &f.id {
                    self.declare(&id.name, BindingKind::Function, id.loc, sid, true)?;
                }
            }
            Stmt::ClassDecl(c) => {
                if let Some(id) = &c.id {
                    self.declare(&id.name, BindingKind::Class, id.loc, sid, true)?;
                }
            }
            Stmt::Import(imp) => {
                for spec in &imp.specifiers {
                    let local = spec.local();
                    self.declare(&local.name, BindingKind::Import, local.loc, sid, true)?;
                }
            }
            Stmt::Export(ExportDecl::Decl { decl, .. }) => self.declare_lexical_stmt(decl)?,
            Stmt::Export(ExportDecl::Default { value, .. }) => match value {
                ExportDefault::Fn(f) => {
                    if let Some(id) = &f.id {
                        self.declare(&id.name, BindingKind::Function, id.loc, sid, true)?;
                    }
                }
                ExportDefault::Class(c) => {
                    if let Some(id) = &c.id {
                        self.declare(&id.name, BindingKind::Class, id.loc, sid, true)?;
                    }
                }
                ExportDefault::Expr(_) => {}
            },
            _ => {}
        }
        Ok(())
    }

    /// Register a `let` or `const` declaration in the current scope.
    fn declare_lexical_var(&mut self, v: &VarDecl) -> LetFloatResult<()> {
        let kind = match v.kind {
            VarKind::Var => return Ok(()),
            VarKind::Let => BindingKind::Let,
            VarKind::Const => BindingKind::Const,
        };
        let sid = self.current_scope();
        for d in &v.declarators {
            self.declare_pat(&d.id, kind, sid, d.init.is_some())?;
        }
        Ok(())
    }

    // ── Hoisting helpers ──────────────────────────────────────────────────────

    /// Pre-scan `stmts` for `var` declarations (and block-level function
    /// declarations) and register them in the nearest function scope.
    ///
    /// Must run after [`Self::declare_lexical`] for the same container.
    /// `in_loop` is set inside a loop body, where an initializer runs once per
    /// iteration and so counts as a reassignment.
    fn hoist_stmts(
        &mut self,
        stmts: &[Stmt],
        nested: bool,
        in_loop: bool,
    ) -> LetFloatResult<()> {
        for stmt in stmts {
            self.hoist_stmt(stmt, nested, in_loop)?;
        }
        Ok(())
    }

    fn hoist_var_decl(&mut self, v: &VarDecl, in_loop: bool) -> LetFloatResult<()> {
        if v.kind != VarKind::Var {
            return Ok(());
        }
        let fn_scope = self.nearest_fn_scope();
        for d in &v.declarators {
            let initialized = d.init.is_some();
            self.declare_pat(&d.id, BindingKind::Var, fn_scope, initialized)?;
            if initialized && in_loop {
                self.declare_pat(&d.id, BindingKind::Var, fn_scope, true)?;
            }
        }
        Ok(())
    }

    fn hoist_stmt(&mut self, stmt: &Stmt, nested: bool, in_loop: bool) -> LetFloatResult<()> {
        match stmt {
            Stmt::Var(v) => self.hoist_var_decl(v, in_loop)?,
            Stmt::FnDecl(f) if nested => {
                // A function declared in a block is also visible as a `var`
                // in the enclosing function, unless that would conflict.
                if let Some(id) = &f.id {
                    let fn_scope = self.nearest_fn_scope();
                    if !self.scopes[fn_scope].bindings.contains_key(&id.name) {
                        self.declare(&id.name, BindingKind::Var, id.loc, fn_scope, false)?;
                    }
                }
            }
            Stmt::Block(b) => self.hoist_stmts(&b.body, true, in_loop)?,
            Stmt::If(s) => {
                self.hoist_stmt(&s.consequent, true, in_loop)?;
                if let Some(alt) = &s.alternate {
                    self.hoist_stmt(alt, true, in_loop)?;
                }
            }
            Stmt::For(s) => {
                if let Some(ForInit::Var(v)) = &s.init {
                    self.hoist_var_decl(v, in_loop)?;
                }
                self.hoist_stmt(&s.body, true, true)?;
            }
            Stmt::ForIn(s) => {
                if let ForHead::Var(v) = &s.left {
                    self.hoist_var_decl(v, in_loop)?;
                }
                self.hoist_stmt(&s.body, true, true)?;
            }
            Stmt::ForOf(s) => {
                if let ForHead::Var(v) = &s.left {
                    self.hoist_var_decl(v, in_loop)?;
                }
                self.hoist_stmt(&s.body, true, true)?;
            }
            Stmt::While(s) => self.hoist_stmt(&s.body, true, true)?,
            Stmt::DoWhile(s) => self.hoist_stmt(&s.body, true, true)?,
            Stmt::Switch(s) => {
                for case in &s.cases {
                    self.hoist_stmts(&case.consequent, true, in_loop)?;
                }
            }
            Stmt::Try(s) => {
                self.hoist_stmts(&s.block.body, true, in_loop)?;
                if let Some(handler) = &s.handler {
                    self.hoist_stmts(&handler.body.body, true, in_loop)?;
                }
                if let Some(fin) = &s.finalizer {
                    self.hoist_stmts(&fin.body, true, in_loop)?;
                }
            }
            Stmt::Labeled(s) => self.hoist_stmt(&s.body, nested, in_loop)?,
            Stmt::With(s) => self.hoist_stmt(&s.body, true, in_loop)?,
            Stmt::Export(ExportDecl::Decl { decl, .. }) => {
                self.hoist_stmt(decl, nested, in_loop)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Enter a function body or the program: lexical declarations first,
    /// then every `var` hoisted from nested statements.
    fn enter_container(&mut self, stmts: &[Stmt]) -> LetFloatResult<()> {
        self.declare_lexical(stmts)?;
        self.hoist_stmts(stmts, false, false)
    }

    // ── Identifier resolution ─────────────────────────────────────────────────

    /// Resolve an identifier reference at the current position.
    ///
    /// Resolution walks through `with` scopes as if they were transparent;
    /// consumers treat every scope under a `with` as dynamic.
    fn resolve_ref(&mut self, name: &str, loc: SourceLocation, is_write: bool) {
        let reference = Reference {
            loc,
            scope: self.current_scope(),
            is_write,
        };
        for i in (0..self.scope_stack.len()).rev() {
            let sid = self.scope_stack[i];
            if let Some(binding) = self.scopes[sid].bindings.get_mut(name) {
                binding.references.push(reference);
                return;
            }
        }
        self.globals.entry(name.to_owned()).or_default().push(reference);
    }

    /// `var` may not pass a lexical binding of the same name on its way to
    /// the function scope.
    fn check_var_escape(&self, name: &str, loc: SourceLocation) -> LetFloatResult<()> {
        for &sid in self.scope_stack.iter().rev() {
            let scope = &self.scopes[sid];
            if scope.kind.is_function_boundary() {
                break;
            }
            if scope.bindings.get(name).is_some_and(|b| b.kind.is_lexical()) {
                return Err(LetFloatError::DuplicateBinding {
                    name: name.to_owned(),
                    line: loc.start.line,
                    column: loc.start.column,
                });
            }
        }
        Ok(())
    }

    // ── Direct eval ───────────────────────────────────────────────────────────

    fn mark_uses_eval(&mut self) {
        for &sid in &self.scope_stack {
            self.scopes[sid].uses_eval = true;
        }
    }

    // ── Program entry point ───────────────────────────────────────────────────

    fn analyze_program(&mut self, program: &Program) -> LetFloatResult<()> {
        let kind = if program.source_type == SourceType::Module {
            ScopeKind::Module
        } else {
            ScopeKind::Global
        };
        self.push_scope(kind, None);
        self.enter_container(&program.body)?;
        for stmt in &program.body {
            self.visit_stmt(stmt)?;
        }
        self.pop_scope();
        Ok(())
    }

    // ── Statements ────────────────────────────────────────────────────────────

    fn visit_stmts(&mut self, stmts: &[Stmt]) -> LetFloatResult<()> {
        for stmt in stmts {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> LetFloatResult<()> {
        match stmt {
            Stmt::Directive(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Debugger(_)
            | Stmt::Empty(_) => {}
            Stmt::Block(b) => self.visit_block(b)?,
            Stmt::Var(v) => self.visit_var_decl(v, false)?,
            Stmt::FnDecl(f) => self.visit_function(f, false)?,
            Stmt::ClassDecl(c) => self.visit_class(c, false)?,
            Stmt::Expr(e) => self.visit_expr(&e.expr)?,
            Stmt::If(s) => {
                self.visit_expr(&s.test)?;
                self.visit_stmt(&s.consequent)?;
                if let Some(alt) = &s.alternate {
                    self.visit_stmt(alt)?;
                }
            }
            Stmt::For(s) => {
                // A for-statement with `let`/`const` init creates its own scope.
                let lexical = match &s.init {
                    Some(ForInit::Var(v)) if v.kind != VarKind::Var => Some(v),
                    _ => None,
                };
                if let Some(v) = lexical {
                    self.push_scope(ScopeKind::Block, Some(s.node_id));
                    self.declare_lexical_var(v)?;
                }
                match &s.init {
                    Some(ForInit::Var(v)) => self.visit_var_decl(v, false)?,
                    Some(ForInit::Expr(e)) => self.visit_expr(e)?,
                    None => {}
                }
                if let Some(test) = &s.test {
                    self.visit_expr(test)?;
                }
                if let Some(update) = &s.update {
                    self.visit_expr(update)?;
                }
                self.visit_stmt(&s.body)?;
                if lexical.is_some() {
                    self.pop_scope();
                }
            }
            Stmt::ForIn(s) => self.visit_for_in_of(s.node_id, &s.left, &s.right, &s.body)?,
            Stmt::ForOf(s) => self.visit_for_in_of(s.node_id, &s.left, &s.right, &s.body)?,
            Stmt::While(s) => {
                self.visit_expr(&s.test)?;
                self.visit_stmt(&s.body)?;
            }
            Stmt::DoWhile(s) => {
                self.visit_stmt(&s.body)?;
                self.visit_expr(&s.test)?;
            }
            Stmt::Switch(s) => {
                self.visit_expr(&s.discriminant)?;
                // The switch body is a single block scope containing all cases.
                self.push_scope(ScopeKind::Block, Some(s.node_id));
                for case in &s.cases {
                    self.declare_lexical(&case.consequent)?;
                }
                for case in &s.cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test)?;
                    }
                    self.visit_stmts(&case.consequent)?;
                }
                self.pop_scope();
            }
            Stmt::Try(s) => {
                self.visit_block(&s.block)?;
                if let Some(handler) = &s.handler {
                    self.push_scope(ScopeKind::Catch, Some(handler.node_id));
                    let sid = self.current_scope();
                    if let Some(param) = &handler.param {
                        self.declare_pat(param, BindingKind::Param, sid, true)?;
                        self.visit_pat_decl(param)?;
                    }
                    self.declare_lexical(&handler.body.body)?;
                    self.visit_stmts(&handler.body.body)?;
                    self.pop_scope();
                }
                if let Some(fin) = &s.finalizer {
                    self.visit_block(fin)?;
                }
            }
            Stmt::Return(s) => {
                if let Some(arg) = &s.argument {
                    self.visit_expr(arg)?;
                }
            }
            Stmt::Throw(s) => self.visit_expr(&s.argument)?,
            Stmt::Labeled(s) => self.visit_stmt(&s.body)?,
            Stmt::With(s) => {
                self.visit_expr(&s.object)?;
                self.push_scope(ScopeKind::With, Some(s.node_id));
                self.visit_stmt(&s.body)?;
                self.pop_scope();
            }
            Stmt::Import(_) => {}
            Stmt::Export(e) => match e {
                ExportDecl::Decl { decl, .. } => self.visit_stmt(decl)?,
                ExportDecl::Named {
                    specifiers, source, ..
                } => {
                    // Re-exports name bindings of another module.
                    if source.is_none() {
                        for spec in specifiers {
                            if let ModuleExportName::Ident(id) = &spec.local {
                                self.resolve_ref(&id.name, id.loc, false);
                            }
                        }
                    }
                }
                ExportDecl::All { .. } => {}
                ExportDecl::Default { value, .. } => match value {
                    ExportDefault::Fn(f) => self.visit_function(f, false)?,
                    ExportDefault::Class(c) => self.visit_class(c, false)?,
                    ExportDefault::Expr(ex) => self.visit_expr(ex)?,
                },
            },
        }
        Ok(())
    }

    /// Nested blocks only register their own lexical declarations; their
    /// `var`s were hoisted when the function was entered.
    fn visit_block(&mut self, b: &BlockStmt) -> LetFloatResult<()> {
        self.push_scope(ScopeKind::Block, Some(b.node_id));
        self.declare_lexical(&b.body)?;
        self.visit_stmts(&b.body)?;
        self.pop_scope();
        Ok(())
    }

    fn visit_for_in_of(
        &mut self,
        node_id: NodeId,
        left: &ForHead,
        right: &Expr,
        body: &Stmt,
    ) -> LetFloatResult<()> {
        let lexical = matches!(left, ForHead::Var(v) if v.kind != VarKind::Var);
        if lexical {
            self.push_scope(ScopeKind::Block, Some(node_id));
            if let ForHead::Var(v) = left {
                self.declare_lexical_var(v)?;
            }
        }
        match left {
            // The loop assigns the head on every iteration.
            ForHead::Var(v) => self.visit_var_decl(v, v.kind == VarKind::Var)?,
            ForHead::Pat(p) => self.visit_pat_ref(p)?,
        }
        self.visit_expr(right)?;
        self.visit_stmt(body)?;
        if lexical {
            self.pop_scope();
        }
        Ok(())
    }

    /// Visit declarators of an already-registered declaration.
    fn visit_var_decl(&mut self, v: &VarDecl, head_is_write: bool) -> LetFloatResult<()> {
        for decl in &v.declarators {
            if v.kind == VarKind::Var {
                for id in decl.id.bound_names() {
                    self.check_var_escape(&id.name, id.loc)?;
                    if head_is_write {
                        self.resolve_ref(&id.name, id.loc, true);
                    }
                }
            }
            self.visit_pat_decl(&decl.id)?;
            if let Some(init) = &decl.init {
                self.visit_expr(init)?;
            }
        }
        Ok(())
    }

    /// Visit the expressions embedded in a declaration pattern (defaults and
    /// computed keys) without declaring anything.
    fn visit_pat_decl(&mut self, pat: &Pat) -> LetFloatResult<()> {
        match pat {
            Pat::Ident(_) => {}
            Pat::Array(a) => {
                for el in a.elements.iter().flatten() {
                    self.visit_pat_decl(el)?;
                }
            }
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue { key, value } => {
                            self.visit_prop_key(key)?;
                            self.visit_pat_decl(value)?;
                        }
                        ObjectPatProp::Shorthand { default, .. } => {
                            if let Some(d) = default {
                                self.visit_expr(d)?;
                            }
                        }
                        ObjectPatProp::Rest(r) => self.visit_pat_decl(r)?,
                    }
                }
            }
            Pat::Rest(r) => self.visit_pat_decl(r)?,
            Pat::Assign(a) => {
                self.visit_pat_decl(&a.left)?;
                self.visit_expr(&a.right)?;
            }
            Pat::Expr(e) => self.visit_expr(e)?,
        }
        Ok(())
    }

    /// Visit a pattern that appears as an assignment target: identifiers are
    /// resolved as write references rather than declared.
    fn visit_pat_ref(&mut self, pat: &Pat) -> LetFloatResult<()> {
        match pat {
            Pat::Ident(id) => self.resolve_ref(&id.name, id.loc, true),
            Pat::Array(a) => {
                for el in a.elements.iter().flatten() {
                    self.visit_pat_ref(el)?;
                }
            }
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue { key, value } => {
                            self.visit_prop_key(key)?;
                            self.visit_pat_ref(value)?;
                        }
                        ObjectPatProp::Shorthand { key, default } => {
                            self.resolve_ref(&key.name, key.loc, true);
                            if let Some(d) = default {
                                self.visit_expr(d)?;
                            }
                        }
                        ObjectPatProp::Rest(r) => self.visit_pat_ref(r)?,
                    }
                }
            }
            Pat::Rest(r) => self.visit_pat_ref(r)?,
            Pat::Assign(a) => {
                self.visit_pat_ref(&a.left)?;
                self.visit_expr(&a.right)?;
            }
            Pat::Expr(e) => self.visit_expr(e)?,
        }
        Ok(())
    }

    // ── Functions and classes ─────────────────────────────────────────────────

    /// Analyse a function.  Declarations were registered by the enclosing
    /// container; expression names live in the function's own scope.
    fn visit_function(&mut self, f: &Function, is_expr: bool) -> LetFloatResult<()> {
        let sid = self.push_scope(ScopeKind::Function, Some(f.node_id));
        for param in &f.params {
            self.declare_pat(param, BindingKind::Param, sid, true)?;
        }
        for param in &f.params {
            self.visit_pat_decl(param)?;
        }
        self.enter_container(&f.body.body)?;
        // A named function expression can refer to itself unless a parameter
        // or body declaration shadows the name.
        if is_expr
            && let Some(id) = &f.id
            && !self.scopes[sid].bindings.contains_key(&id.name)
        {
            self.declare(&id.name, BindingKind::Function, id.loc, sid, true)?;
        }
        self.visit_stmts(&f.body.body)?;
        self.pop_scope();
        Ok(())
    }

    fn visit_arrow(&mut self, a: &ArrowExpr) -> LetFloatResult<()> {
        let sid = self.push_scope(ScopeKind::Function, Some(a.node_id));
        for param in &a.params {
            self.declare_pat(param, BindingKind::Param, sid, true)?;
        }
        for param in &a.params {
            self.visit_pat_decl(param)?;
        }
        match &a.body {
            ArrowBody::Block(b) => {
                self.enter_container(&b.body)?;
                self.visit_stmts(&b.body)?;
            }
            ArrowBody::Expr(e) => self.visit_expr(e)?,
        }
        self.pop_scope();
        Ok(())
    }

    fn visit_class(&mut self, c: &Class, is_expr: bool) -> LetFloatResult<()> {
        // Only the expression form gets a scope; a declaration's name lives
        // in the enclosing container.
        if is_expr {
            let sid = self.push_scope(ScopeKind::Block, Some(c.node_id));
            if let Some(id) = &c.id {
                self.declare(&id.name, BindingKind::Class, id.loc, sid, true)?;
            }
        }
        if let Some(super_class) = &c.super_class {
            self.visit_expr(super_class)?;
        }
        for member in &c.members {
            match member {
                ClassMember::Method(m) => {
                    self.visit_prop_key(&m.key)?;
                    self.visit_function(&m.value, false)?;
                }
                ClassMember::Field(p) => {
                    self.visit_prop_key(&p.key)?;
                    if let Some(val) = &p.value {
                        self.visit_expr(val)?;
                    }
                }
                ClassMember::StaticBlock(s) => {
                    self.push_scope(ScopeKind::Function, Some(s.node_id));
                    self.enter_container(&s.body)?;
                    self.visit_stmts(&s.body)?;
                    self.pop_scope();
                }
            }
        }
        if is_expr {
            self.pop_scope();
        }
        Ok(())
    }

    fn visit_prop_key(&mut self, key: &PropKey) -> LetFloatResult<()> {
        if let PropKey::Computed(e) = key {
            self.visit_expr(e)?;
        }
        Ok(())
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &Expr) -> LetFloatResult<()> {
        match expr {
            Expr::Ident(id) => self.resolve_ref(&id.name, id.loc, false),
            Expr::This(_) | Expr::Super(_) | Expr::Lit(_) | Expr::MetaProp(_) => {}
            Expr::Template(t) => {
                for e in &t.expressions {
                    self.visit_expr(e)?;
                }
            }
            Expr::Array(a) => {
                for el in a.elements.iter().flatten() {
                    self.visit_expr(el)?;
                }
            }
            Expr::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            self.visit_prop_key(key)?;
                            self.visit_expr(value)?;
                        }
                        ObjectProp::Shorthand(id) => self.resolve_ref(&id.name, id.loc, false),
                        ObjectProp::CoverInit { key, init } => {
                            self.resolve_ref(&key.name, key.loc, false);
                            self.visit_expr(init)?;
                        }
                        ObjectProp::Method { key, value, .. } => {
                            self.visit_prop_key(key)?;
                            self.visit_function(value, false)?;
                        }
                        ObjectProp::Spread(e) => self.visit_expr(e)?,
                    }
                }
            }
            Expr::Fn(f) => self.visit_function(f, true)?,
            Expr::Arrow(a) => self.visit_arrow(a)?,
            Expr::Class(c) => self.visit_class(c, true)?,
            Expr::Unary(u) => self.visit_expr(&u.argument)?,
            Expr::Update(u) => match u.argument.as_ref() {
                Expr::Ident(id) => self.resolve_ref(&id.name, id.loc, true),
                other => self.visit_expr(other)?,
            },
            Expr::Binary(b) => {
                self.visit_expr(&b.left)?;
                self.visit_expr(&b.right)?;
            }
            Expr::Logical(l) => {
                self.visit_expr(&l.left)?;
                self.visit_expr(&l.right)?;
            }
            Expr::Conditional(c) => {
                self.visit_expr(&c.test)?;
                self.visit_expr(&c.consequent)?;
                self.visit_expr(&c.alternate)?;
            }
            Expr::Assign(a) => {
                self.visit_pat_ref(&a.left)?;
                self.visit_expr(&a.right)?;
            }
            Expr::Sequence(s) => {
                for e in &s.expressions {
                    self.visit_expr(e)?;
                }
            }
            Expr::Member(m) => {
                self.visit_expr(&m.object)?;
                if let MemberProp::Computed(e) = &m.property {
                    self.visit_expr(e)?;
                }
            }
            Expr::Call(c) => {
                // Detect direct `eval(…)` call.
                if let Expr::Ident(id) = c.callee.as_ref()
                    && id.name == "eval"
                {
                    self.mark_uses_eval();
                }
                self.visit_expr(&c.callee)?;
                for arg in &c.arguments {
                    self.visit_expr(arg)?;
                }
            }
            Expr::New(n) => {
                self.visit_expr(&n.callee)?;
                for arg in &n.arguments {
                    self.visit_expr(arg)?;
                }
            }
            Expr::TaggedTemplate(t) => {
                self.visit_expr(&t.tag)?;
                for e in &t.quasi.expressions {
                    self.visit_expr(e)?;
                }
            }
            Expr::Spread(s) => self.visit_expr(&s.argument)?,
            Expr::Yield(y) => {
                if let Some(arg) = &y.argument {
                    self.visit_expr(arg)?;
                }
            }
            Expr::Await(a) => self.visit_expr(&a.argument)?,
            Expr::Import(i) => {
                self.visit_expr(&i.source)?;
                if let Some(opts) = &i.options {
                    self.visit_expr(opts)?;
                }
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse_program;

    fn tree(src: &str) -> ScopeTree {
        let prog = parse_program(src, SourceType::Script).unwrap();
        analyze(&prog).unwrap()
    }

    fn analyze_err(src: &str) -> LetFloatError {
        let prog = parse_program(src, SourceType::Script).unwrap();
        analyze(&prog).unwrap_err()
    }

    fn scope_with(tree: &ScopeTree, name: &str) -> ScopeId {
        tree.scopes
            .iter()
            .find(|s| s.bindings.contains_key(name))
            .map(|s| s.id)
            .unwrap()
    }

    // ── Basic scope creation ──────────────────────────────────────────────────

    #[test]
    fn test_analyze_empty_script_creates_global_scope() {
        let tree = tree("");
        assert_eq!(tree.scopes.len(), 1);
        assert_eq!(tree.scopes[0].kind, ScopeKind::Global);
    }

    #[test]
    fn test_analyze_module_creates_module_scope() {
        let prog = parse_program("import { a } from 'm'; a(1);", SourceType::Module).unwrap();
        let tree = analyze(&prog).unwrap();
        assert_eq!(tree.scopes[0].kind, ScopeKind::Module);
        let a = &tree.scopes[0].bindings["a"];
        assert_eq!(a.kind, BindingKind::Import);
        assert_eq!(a.references.len(), 1);
    }

    // ── Hoisting ─────────────────────────────────────────────────────────────

    #[test]
    fn test_var_hoisted_out_of_block() {
        let tree = tree("{ var x; let y; }");
        assert!(tree.scopes[0].bindings.contains_key("x"));
        assert!(!tree.scopes[0].bindings.contains_key("y"));
        assert!(tree.scopes[1].bindings.contains_key("y"));
    }

    #[test]
    fn test_forward_reference_to_function() {
        let tree = tree("g(1); function g(a) { return a; }");
        let g = &tree.scopes[0].bindings["g"];
        assert_eq!(g.kind, BindingKind::Function);
        assert_eq!(g.references.len(), 1);
        assert!(tree.globals.is_empty());
    }

    #[test]
    fn test_block_function_is_also_function_scoped() {
        let tree = tree("function f() { { function h() {} } return h; }");
        let f_scope = scope_with(&tree, "h");
        assert_eq!(tree.scopes[f_scope].kind, ScopeKind::Function);
        assert_eq!(tree.scopes[f_scope].bindings["h"].kind, BindingKind::Var);
        assert_eq!(tree.scopes[f_scope].bindings["h"].references.len(), 1);
    }

    #[test]
    fn test_let_not_visible_outside_block() {
        let tree = tree("{ let y = 1; } y;");
        assert!(tree.globals.contains_key("y"));
    }

    // ── Duplicates ───────────────────────────────────────────────────────────

    #[test]
    fn test_duplicate_var_is_ok() {
        let tree = tree("var x = 1; var x = 2; function f() {} var f;");
        assert!(tree.scopes[0].bindings["x"].is_reassigned());
        assert_eq!(tree.scopes[0].bindings["f"].kind, BindingKind::Function);
    }

    #[test]
    fn test_duplicate_let_is_error() {
        let err = analyze_err("let a = 1;\nlet a = 2;");
        assert!(matches!(
            err,
            LetFloatError::DuplicateBinding { ref name, line: 2, column: 5 } if name == "a"
        ));
    }

    #[test]
    fn test_let_after_var_is_error() {
        assert!(matches!(
            analyze_err("var a; let a;"),
            LetFloatError::DuplicateBinding { .. }
        ));
    }

    #[test]
    fn test_var_escaping_past_let_is_error() {
        assert!(matches!(
            analyze_err("{ let a; { var a; } }"),
            LetFloatError::DuplicateBinding { .. }
        ));
    }

    #[test]
    fn test_param_then_let_is_error() {
        assert!(matches!(
            analyze_err("function f(x) { let x; }"),
            LetFloatError::DuplicateBinding { .. }
        ));
        tree("function f(x) { var x; }");
    }

    #[test]
    fn test_catch_param_rules() {
        assert!(matches!(
            analyze_err("try {} catch (e) { let e; }"),
            LetFloatError::DuplicateBinding { .. }
        ));
        let tree = tree("try {} catch (e) { var e; }");
        assert!(tree.scopes[0].bindings.contains_key("e"));
    }

    // ── Functions and closures ────────────────────────────────────────────────

    #[test]
    fn test_function_scope_with_params() {
        let prog = parse_program("function f(a, { b }, ...c) { return a; }", SourceType::Script)
            .unwrap();
        let tree = analyze(&prog).unwrap();
        let Stmt::FnDecl(f) = &prog.body[0] else {
            panic!("expected function");
        };
        let sid = tree.node_scopes[&f.node_id];
        let scope = tree.scope(sid);
        assert_eq!(scope.kind, ScopeKind::Function);
        for name in ["a", "b", "c"] {
            assert_eq!(scope.bindings[name].kind, BindingKind::Param);
        }
        assert_eq!(scope.bindings["a"].references.len(), 1);
    }

    #[test]
    fn test_closure_reference_records_inner_scope() {
        let tree = tree("function main(x) { return function (y) { return x + y; }; }");
        let main_scope = scope_with(&tree, "x");
        let x = &tree.scopes[main_scope].bindings["x"];
        assert_eq!(x.references.len(), 1);
        let use_scope = x.references[0].scope;
        assert_ne!(use_scope, main_scope);
        assert_eq!(tree.scopes[use_scope].parent, Some(main_scope));
    }

    #[test]
    fn test_curried_arrows_each_open_a_scope() {
        let tree = tree("const f = a => b => c => a + b + c;");
        assert_eq!(tree.scopes.len(), 4);
        assert!(tree.scopes[1..].iter().all(|s| s.kind == ScopeKind::Function));
    }

    #[test]
    fn test_named_function_expression_self_binding() {
        let tree = tree("const fact = function f(n) { return n ? f(n - 1) : 1; };");
        let sid = scope_with(&tree, "f");
        assert_eq!(tree.scopes[sid].kind, ScopeKind::Function);
        assert_eq!(tree.scopes[sid].bindings["f"].references.len(), 1);
    }

    #[test]
    fn test_class_expression_name_scope() {
        let tree = tree("const K = class C { m() { return C; } };");
        let sid = scope_with(&tree, "C");
        assert_eq!(tree.scopes[sid].kind, ScopeKind::Block);
        assert!(!tree.scopes[0].bindings.contains_key("C"));
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    #[test]
    fn test_reassignment_tracking() {
        let tree = tree(
            "let a = 1; a = 2; let b = 1; b++; const c = f(1); let [d] = e; ({ g } = h); for (var k in o) {}",
        );
        let root = &tree.scopes[0].bindings;
        assert!(root["a"].is_reassigned());
        assert!(root["b"].is_reassigned());
        assert!(!root["c"].is_reassigned());
        assert!(!root["d"].is_reassigned());
        assert!(root["k"].is_reassigned());
        assert!(tree.globals["g"][0].is_write);
    }

    #[test]
    fn test_initializer_inside_a_loop_counts_as_reassignment() {
        let tree = tree("for (;;) { var a = 1; } while (c) { if (d) { var b = 2; } } var e = 3; do var g; while (0);");
        let root = &tree.scopes[0].bindings;
        assert!(root["a"].is_reassigned());
        assert!(root["b"].is_reassigned());
        assert!(!root["e"].is_reassigned());
        assert!(!root["g"].is_reassigned());
    }

    #[test]
    fn test_init_loc_points_at_the_initializer() {
        let tree = tree("var v;\nvar v = 1;\nvar w;\nfunction f(p) {}");
        let root = &tree.scopes[0].bindings;
        assert_eq!(root["v"].loc.start.line, 1);
        assert_eq!(root["v"].init_loc.map(|l| l.start.line), Some(2));
        assert!(root["w"].init_loc.is_none());
        assert_eq!(root["f"].init_loc.map(|l| l.start.line), Some(4));
    }

    // ── Dynamic scopes ────────────────────────────────────────────────────────

    #[test]
    fn test_with_creates_with_scope() {
        let tree = tree("with (o) { x; }");
        assert!(tree.scopes.iter().any(|s| s.kind == ScopeKind::With));
    }

    #[test]
    fn test_uses_eval_propagates_to_ancestors() {
        let tree = tree("function f(a) { return function () { eval('a'); }; } function g() {}");
        let g_scope = tree
            .scopes
            .iter()
            .filter(|s| s.kind == ScopeKind::Function)
            .last()
            .unwrap();
        assert!(tree.scopes[0].uses_eval);
        assert!(!g_scope.uses_eval);
        assert_eq!(
            tree.scopes.iter().filter(|s| s.uses_eval).count(),
            3
        );
    }

    #[test]
    fn test_lookup_walks_parents() {
        let tree = tree("var outer = 1; function f() { { let inner = outer; } }");
        let block = scope_with(&tree, "inner");
        assert_eq!(tree.lookup(block, "outer").map(|b| b.scope_id), Some(0));
        assert!(tree.lookup(0, "inner").is_none());
    }

    #[test]
    fn test_scope_kind_is_function_boundary() {
        assert!(ScopeKind::Global.is_function_boundary());
        assert!(ScopeKind::Function.is_function_boundary());
        assert!(ScopeKind::Module.is_function_boundary());
        assert!(!ScopeKind::Block.is_function_boundary());
        assert!(!ScopeKind::Catch.is_function_boundary());
        assert!(!ScopeKind::With.is_function_boundary());
    }

    #[test]
    fn test_binding_kind_is_lexical() {
        assert!(BindingKind::Let.is_lexical());
        assert!(BindingKind::Const.is_lexical());
        assert!(BindingKind::Class.is_lexical());
        assert!(!BindingKind::Var.is_lexical());
        assert!(!BindingKind::Param.is_lexical());
    }
}
