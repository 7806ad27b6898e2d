//! The float pass: one pre-order traversal over a program.
//!
//! Every node is classified once, up front:
//!
//! - a declarator `name = init` inside a function is a *declaration*
//!   candidate; its initializer is not also considered as a call;
//! - any other call is a *call* candidate, unless an earlier run generated it
//!   (helper calls and `*__fb()` accessors) or it is an inner link of an
//!   optional chain;
//! - everything else is only descended into.
//!
//! An accepted candidate is moved out whole.  The site is replaced by an
//! accessor call and the traversal does not look inside the replacement.
//! The hoisted declaration waits in a per-scope queue and is spliced in when
//! the traversal leaves the target scope's node, so generated code is never
//! visited.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::FloatConfig;
use crate::error::{LetFloatError, LetFloatResult};
use crate::parser::ast::*;
use crate::parser::scope::{BindingKind, ScopeId};

use super::free_vars::free_vars;
use super::names::{self, Reservations};
use super::provider::ScopeProvider;
use super::purity::is_eligible;
use super::resolve::resolve;
use super::runtime::{self, GeneratedNodes};
use super::insert;

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloatReport {
    /// Candidates analysed.
    pub candidates: usize,
    /// Candidates moved.
    pub floated: usize,
    /// Candidates left in place.
    pub rejected: usize,
    /// Artifacts of an earlier run that were recognized and skipped.
    pub skipped_generated: usize,
    /// Name of the helper the hoisted declarations call, when anything was
    /// floated.
    pub helper: Option<String>,
    /// Whether this run injected the helper (rather than reusing one).
    pub helper_injected: bool,
    /// Hoisted names in creation order.
    pub hoisted: Vec<String>,
}

/// Float every eligible computation in `program` as far out as its free
/// variables allow.
///
/// `scopes` must describe `program` as it was before this call.
pub fn float_program<P>(
    program: &mut Program,
    scopes: &P,
    config: &FloatConfig,
) -> LetFloatResult<FloatReport>
where
    P: ScopeProvider + ?Sized,
{
    let root = scopes.root();
    let existing_helper = runtime::existing_helper(program, config);
    let mut state = RunState {
        scopes,
        config,
        nodes: GeneratedNodes::new(program.next_node_id),
        reservations: Reservations::default(),
        pending: HashMap::new(),
        stack: vec![root],
        param_owners: Vec::new(),
        closures: Vec::new(),
        helper: String::new(),
        report: FloatReport::default(),
    };
    state.helper = match &existing_helper {
        Some(name) => name.clone(),
        None => state.fresh_helper_name(),
    };

    state.stmts(&mut program.body)?;

    let top_level = state.pending.remove(&root).unwrap_or_default();
    if let Some(scope) = state.pending.keys().next() {
        return Err(LetFloatError::Internal(format!(
            "hoisted declarations queued for scope {scope}, which was never left"
        )));
    }
    let floated_any = state.report.floated > 0;
    let helper = (floated_any && existing_helper.is_none())
        .then(|| runtime::helper_declaration(&state.helper, &mut state.nodes));
    state.report.helper_injected = helper.is_some();
    insert::insert_into_program(&mut program.body, helper, top_level);
    program.next_node_id = state.nodes.next_id();

    let mut report = state.report;
    if floated_any {
        report.helper = Some(state.helper);
    }
    info!(
        candidates = report.candidates,
        floated = report.floated,
        rejected = report.rejected,
        skipped = report.skipped_generated,
        "float pass finished"
    );
    Ok(report)
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidate decisions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateKind {
    Call,
    Declaration,
}

impl CandidateKind {
    fn as_str(self) -> &'static str {
        match self {
            CandidateKind::Call => "call",
            CandidateKind::Declaration => "declaration",
        }
    }
}

/// Why a candidate stayed where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Ineligible,
    Unresolvable,
    NoWiderScope,
    ParameterDefault,
    LocalBinding,
    Reassigned,
    InitializedLater,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::Ineligible => "not safe to move",
            Rejection::Unresolvable => "dynamic scope or unresolvable name",
            Rejection::NoWiderScope => "already in its outermost legal scope",
            Rejection::ParameterDefault => "used inside the target's parameter list",
            Rejection::LocalBinding => "depends on a local of the enclosing function",
            Rejection::Reassigned => "depends on a reassigned binding",
            Rejection::InitializedLater => "depends on a var initialized after the closure",
        }
    }
}

/// A function body the traversal is inside.
struct Closure {
    scope: ScopeId,
    /// Byte offset where the function starts.
    start: usize,
    /// Function declarations can be called before their statement is reached.
    hoisted: bool,
}

struct RunState<'a, P: ScopeProvider + ?Sized> {
    scopes: &'a P,
    config: &'a FloatConfig,
    nodes: GeneratedNodes,
    reservations: Reservations,
    /// Hoisted declarations waiting for their target scope to be left.
    pending: HashMap<ScopeId, Vec<Stmt>>,
    /// Scopes enclosing the current node, innermost last.
    stack: Vec<ScopeId>,
    /// Functions whose parameter list encloses the current node.
    param_owners: Vec<ScopeId>,
    /// Functions enclosing the current node, innermost last.
    closures: Vec<Closure>,
    helper: String,
    report: FloatReport,
}

impl<P: ScopeProvider + ?Sized> RunState<'_, P> {
    fn current_scope(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or_else(|| self.scopes.root())
    }

    /// The helper must not be shadowed anywhere it may be called from, so
    /// its name avoids every binding in the program.
    fn fresh_helper_name(&mut self) -> String {
        let root = self.scopes.root();
        loop {
            let name = names::allocate(
                self.scopes,
                &mut self.reservations,
                self.config,
                &self.config.helper_base,
                root,
                root,
            );
            if !self.scopes.any_binding_named(&name) {
                return name;
            }
        }
    }

    /// Decide whether `expr`, evaluated in the current scope, can move, and
    /// where to.
    fn plan(&mut self, expr: &Expr, kind: CandidateKind) -> Option<ScopeId> {
        self.report.candidates += 1;
        match self.target_for(expr, kind) {
            Ok(target) => Some(target),
            Err(reason) => {
                self.report.rejected += 1;
                debug!(
                    kind = kind.as_str(),
                    line = expr.loc().start.line,
                    reason = reason.as_str(),
                    "left in place"
                );
                None
            }
        }
    }

    fn target_for(&self, expr: &Expr, kind: CandidateKind) -> Result<ScopeId, Rejection> {
        if !is_eligible(expr) {
            return Err(Rejection::Ineligible);
        }
        let free = free_vars(expr);
        let use_site = self.current_scope();
        let enclosing = self.scopes.nearest_function_scope(use_site);
        let target = resolve(self.scopes, &free, use_site).ok_or(Rejection::Unresolvable)?;
        if target == enclosing {
            return Err(Rejection::NoWiderScope);
        }
        if self.param_owners.contains(&target) {
            return Err(Rejection::ParameterDefault);
        }
        for name in &free {
            let Some(binding) = self.scopes.binding_for(use_site, name) else {
                continue;
            };
            if binding.is_reassigned() {
                return Err(Rejection::Reassigned);
            }
            if binding.kind == BindingKind::Var
                && let Some(init) = binding.init_loc
                && !self.initialized_before_closure(binding.scope_id, init.start.offset)
            {
                return Err(Rejection::InitializedLater);
            }
            if kind == CandidateKind::Call
                && binding.kind != BindingKind::Param
                && self.scopes.nearest_function_scope(binding.scope_id) == enclosing
            {
                return Err(Rejection::LocalBinding);
            }
        }
        Ok(target)
    }

    /// `true` when the function directly inside `owner` that encloses the
    /// current node is created after the declaration at `init_offset` ran.
    /// A hoisted thunk forced from a closure created earlier would cache the
    /// value from before the initializer.
    fn initialized_before_closure(&self, owner: ScopeId, init_offset: usize) -> bool {
        let outermost = self.closures.iter().find(|c| {
            self.scopes
                .parent(c.scope)
                .is_some_and(|p| self.scopes.nearest_function_scope(p) == owner)
        });
        match outermost {
            Some(c) => !c.hoisted && init_offset < c.start,
            None => true,
        }
    }

    /// Move `slot` into a memoized binding in `target` and leave an accessor
    /// call in its place.
    fn float(&mut self, slot: &mut Expr, base: &str, target: ScopeId, kind: CandidateKind) {
        let use_site = self.current_scope();
        let name = names::allocate(
            self.scopes,
            &mut self.reservations,
            self.config,
            base,
            target,
            use_site,
        );
        debug!(
            kind = kind.as_str(),
            line = slot.loc().start.line,
            name = %name,
            target,
            "floated"
        );
        let accessor = runtime::accessor_call(&name, &mut self.nodes);
        let original = std::mem::replace(slot, accessor);
        let decl = runtime::memoized_binding(&name, &self.helper, original, &mut self.nodes);
        self.pending.entry(target).or_default().push(decl);
        self.report.floated += 1;
        self.report.hoisted.push(name);
    }

    fn is_artifact_call(&self, call: &CallExpr) -> bool {
        self.nodes.contains(call.node_id)
            || runtime::is_helper_call(call, self.config)
            || runtime::is_accessor_call(call, self.config)
    }

    // ── Scope bookkeeping ───────────────────────────────────────────────────

    /// Push the scope `node` opens, if it opens one.
    fn enter(&mut self, node: NodeId) -> Option<ScopeId> {
        let scope = self.scopes.scope_of_node(node)?;
        self.stack.push(scope);
        Some(scope)
    }

    fn enter_required(&mut self, node: NodeId) -> LetFloatResult<ScopeId> {
        self.enter(node).ok_or_else(|| {
            LetFloatError::Internal(format!("node {} has no scope", node.0))
        })
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    fn take_pending(&mut self, scope: ScopeId) -> Option<Vec<Stmt>> {
        self.pending.remove(&scope)
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn stmts(&mut self, stmts: &mut [Stmt]) -> LetFloatResult<()> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn block(&mut self, b: &mut BlockStmt) -> LetFloatResult<()> {
        let pushed = self.enter(b.node_id).is_some();
        self.stmts(&mut b.body)?;
        if pushed {
            self.leave();
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &mut Stmt) -> LetFloatResult<()> {
        match stmt {
            Stmt::Directive(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Debugger(_)
            | Stmt::Empty(_)
            | Stmt::Import(_) => {}
            Stmt::Block(b) => self.block(b)?,
            Stmt::Var(v) => self.var_decl(v)?,
            Stmt::FnDecl(f) => {
                if f.id.as_ref().is_some_and(|id| id.name == self.helper) {
                    self.report.skipped_generated += 1;
                } else {
                    self.function(f, true)?;
                }
            }
            Stmt::ClassDecl(c) => self.class(c)?,
            Stmt::Expr(e) => self.expr(&mut e.expr)?,
            Stmt::If(s) => {
                self.expr(&mut s.test)?;
                self.stmt(&mut s.consequent)?;
                if let Some(alt) = &mut s.alternate {
                    self.stmt(alt)?;
                }
            }
            Stmt::For(s) => {
                let pushed = self.enter(s.node_id).is_some();
                match &mut s.init {
                    Some(ForInit::Var(v)) => self.var_decl(v)?,
                    Some(ForInit::Expr(e)) => self.expr(e)?,
                    None => {}
                }
                if let Some(test) = &mut s.test {
                    self.expr(test)?;
                }
                if let Some(update) = &mut s.update {
                    self.expr(update)?;
                }
                self.stmt(&mut s.body)?;
                if pushed {
                    self.leave();
                }
            }
            Stmt::ForIn(s) => self.for_in_of(s.node_id, &mut s.left, &mut s.right, &mut s.body)?,
            Stmt::ForOf(s) => self.for_in_of(s.node_id, &mut s.left, &mut s.right, &mut s.body)?,
            Stmt::While(s) => {
                self.expr(&mut s.test)?;
                self.stmt(&mut s.body)?;
            }
            Stmt::DoWhile(s) => {
                self.stmt(&mut s.body)?;
                self.expr(&mut s.test)?;
            }
            Stmt::Switch(s) => {
                self.expr(&mut s.discriminant)?;
                let pushed = self.enter(s.node_id).is_some();
                for case in &mut s.cases {
                    if let Some(test) = &mut case.test {
                        self.expr(test)?;
                    }
                    self.stmts(&mut case.consequent)?;
                }
                if pushed {
                    self.leave();
                }
            }
            Stmt::Try(s) => {
                self.block(&mut s.block)?;
                if let Some(handler) = &mut s.handler {
                    self.enter_required(handler.node_id)?;
                    if let Some(param) = &mut handler.param {
                        self.pat(param)?;
                    }
                    self.stmts(&mut handler.body.body)?;
                    self.leave();
                }
                if let Some(fin) = &mut s.finalizer {
                    self.block(fin)?;
                }
            }
            Stmt::Return(s) => {
                if let Some(arg) = &mut s.argument {
                    self.expr(arg)?;
                }
            }
            Stmt::Throw(s) => self.expr(&mut s.argument)?,
            Stmt::Labeled(s) => self.stmt(&mut s.body)?,
            Stmt::With(s) => {
                self.expr(&mut s.object)?;
                self.enter_required(s.node_id)?;
                self.stmt(&mut s.body)?;
                self.leave();
            }
            Stmt::Export(e) => match e {
                ExportDecl::Decl { decl, .. } => self.stmt(decl)?,
                ExportDecl::Default { value, .. } => match value {
                    ExportDefault::Fn(f) => self.function(f, true)?,
                    ExportDefault::Class(c) => self.class(c)?,
                    ExportDefault::Expr(ex) => self.expr(ex)?,
                },
                ExportDecl::Named { .. } | ExportDecl::All { .. } => {}
            },
        }
        Ok(())
    }

    fn for_in_of(
        &mut self,
        node: NodeId,
        left: &mut ForHead,
        right: &mut Expr,
        body: &mut Stmt,
    ) -> LetFloatResult<()> {
        let pushed = self.enter(node).is_some();
        match left {
            ForHead::Var(v) => self.var_decl(v)?,
            ForHead::Pat(p) => self.pat(p)?,
        }
        self.expr(right)?;
        self.stmt(body)?;
        if pushed {
            self.leave();
        }
        Ok(())
    }

    fn var_decl(&mut self, v: &mut VarDecl) -> LetFloatResult<()> {
        for d in &mut v.declarators {
            self.declarator(d)?;
        }
        Ok(())
    }

    fn declarator(&mut self, d: &mut VarDeclarator) -> LetFloatResult<()> {
        if self.nodes.contains(d.node_id) {
            return Ok(());
        }
        self.pat(&mut d.id)?;
        let Some(init) = d.init.as_mut() else {
            return Ok(());
        };
        if let Pat::Ident(id) = &d.id {
            if runtime::is_memoized_binding(&id.name, init, self.config) {
                self.report.skipped_generated += 1;
                return Ok(());
            }
            let in_function =
                self.scopes.nearest_function_scope(self.current_scope()) != self.scopes.root();
            // Nothing to save by memoizing a name or a literal.
            let trivial = matches!(&**init, Expr::Ident(_) | Expr::Lit(_));
            if in_function
                && !trivial
                && let Some(target) = self.plan(init, CandidateKind::Declaration)
            {
                let base = names::decl_base_hint(&id.name, self.config);
                self.float(init, &base, target, CandidateKind::Declaration);
                return Ok(());
            }
        }
        self.expr_children(init)
    }

    // ── Functions and classes ───────────────────────────────────────────────

    fn enter_closure(
        &mut self,
        node: NodeId,
        loc: SourceLocation,
        hoisted: bool,
    ) -> LetFloatResult<ScopeId> {
        let scope = self.enter_required(node)?;
        self.closures.push(Closure {
            scope,
            start: loc.start.offset,
            hoisted,
        });
        Ok(scope)
    }

    fn leave_closure(&mut self) {
        self.closures.pop();
        self.leave();
    }

    /// `hoisted` is set for function declarations.
    fn function(&mut self, f: &mut Function, hoisted: bool) -> LetFloatResult<()> {
        let scope = self.enter_closure(f.node_id, f.loc, hoisted)?;
        self.params(&mut f.params, scope)?;
        self.stmts(&mut f.body.body)?;
        if let Some(decls) = self.take_pending(scope) {
            insert::insert_hoisted(&mut f.body.body, decls);
        }
        self.leave_closure();
        Ok(())
    }

    fn arrow(&mut self, a: &mut ArrowExpr) -> LetFloatResult<()> {
        let scope = self.enter_closure(a.node_id, a.loc, false)?;
        self.params(&mut a.params, scope)?;
        match &mut a.body {
            ArrowBody::Block(b) => self.stmts(&mut b.body)?,
            ArrowBody::Expr(e) => self.expr(e)?,
        }
        if let Some(decls) = self.take_pending(scope) {
            insert::insert_into_arrow(a, decls, &mut self.nodes);
        }
        self.leave_closure();
        Ok(())
    }

    fn params(&mut self, params: &mut [Pat], owner: ScopeId) -> LetFloatResult<()> {
        self.param_owners.push(owner);
        for param in params {
            self.pat(param)?;
        }
        self.param_owners.pop();
        Ok(())
    }

    fn class(&mut self, c: &mut Class) -> LetFloatResult<()> {
        // Only class expressions open a scope for their name.
        let pushed = self.enter(c.node_id).is_some();
        if let Some(sup) = &mut c.super_class {
            self.expr(sup)?;
        }
        for member in &mut c.members {
            match member {
                ClassMember::Method(m) => {
                    self.prop_key(&mut m.key)?;
                    self.function(&mut m.value, false)?;
                }
                ClassMember::Field(f) => {
                    self.prop_key(&mut f.key)?;
                    if let Some(value) = &mut f.value {
                        self.expr(value)?;
                    }
                }
                ClassMember::StaticBlock(s) => {
                    let scope = self.enter_closure(s.node_id, s.loc, false)?;
                    self.stmts(&mut s.body)?;
                    if let Some(decls) = self.take_pending(scope) {
                        insert::insert_hoisted(&mut s.body, decls);
                    }
                    self.leave_closure();
                }
            }
        }
        if pushed {
            self.leave();
        }
        Ok(())
    }

    fn prop_key(&mut self, key: &mut PropKey) -> LetFloatResult<()> {
        if let PropKey::Computed(e) = key {
            self.expr(e)?;
        }
        Ok(())
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    fn pat(&mut self, pat: &mut Pat) -> LetFloatResult<()> {
        match pat {
            Pat::Ident(_) => {}
            Pat::Array(a) => {
                for el in a.elements.iter_mut().flatten() {
                    self.pat(el)?;
                }
            }
            Pat::Object(o) => {
                for prop in &mut o.properties {
                    match prop {
                        ObjectPatProp::KeyValue { key, value } => {
                            self.prop_key(key)?;
                            self.pat(value)?;
                        }
                        ObjectPatProp::Shorthand { default, .. } => {
                            if let Some(d) = default {
                                self.expr(d)?;
                            }
                        }
                        ObjectPatProp::Rest(r) => self.pat(r)?,
                    }
                }
            }
            Pat::Rest(r) => self.pat(r)?,
            Pat::Assign(a) => {
                self.pat(&mut a.left)?;
                self.expr(&mut a.right)?;
            }
            Pat::Expr(e) => self.expr(e)?,
        }
        Ok(())
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn expr(&mut self, expr: &mut Expr) -> LetFloatResult<()> {
        if let Expr::Call(call) = &*expr {
            if self.is_artifact_call(call) {
                self.report.skipped_generated += 1;
                return Ok(());
            }
            if let Some(target) = self.plan(expr, CandidateKind::Call) {
                let base = names::call_base_hint(call, self.config);
                self.float(expr, &base, target, CandidateKind::Call);
                return Ok(());
            }
        }
        self.expr_children(expr)
    }

    /// The object or callee of a member access or call.  A link whose own
    /// chain holds a `?.` cannot move alone: the rest of the chain would
    /// lose its short-circuit.
    fn chain_link(&mut self, expr: &mut Expr) -> LetFloatResult<()> {
        if has_optional_link(expr) {
            self.expr_children(expr)
        } else {
            self.expr(expr)
        }
    }

    fn expr_children(&mut self, expr: &mut Expr) -> LetFloatResult<()> {
        match expr {
            Expr::Ident(_)
            | Expr::Lit(_)
            | Expr::This(_)
            | Expr::Super(_)
            | Expr::MetaProp(_) => {}
            Expr::Template(t) => {
                for e in &mut t.expressions {
                    self.expr(e)?;
                }
            }
            Expr::Array(a) => {
                for el in a.elements.iter_mut().flatten() {
                    self.expr(el)?;
                }
            }
            Expr::Object(o) => {
                for prop in &mut o.properties {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            self.prop_key(key)?;
                            self.expr(value)?;
                        }
                        ObjectProp::Shorthand(_) => {}
                        ObjectProp::CoverInit { init, .. } => self.expr(init)?,
                        ObjectProp::Method { key, value, .. } => {
                            self.prop_key(key)?;
                            self.function(value, false)?;
                        }
                        ObjectProp::Spread(e) => self.expr(e)?,
                    }
                }
            }
            Expr::Fn(f) => self.function(f, false)?,
            Expr::Arrow(a) => self.arrow(a)?,
            Expr::Class(c) => self.class(c)?,
            Expr::Unary(u) => self.expr(&mut u.argument)?,
            Expr::Update(u) => self.expr(&mut u.argument)?,
            Expr::Binary(b) => {
                self.expr(&mut b.left)?;
                self.expr(&mut b.right)?;
            }
            Expr::Logical(l) => {
                self.expr(&mut l.left)?;
                self.expr(&mut l.right)?;
            }
            Expr::Conditional(c) => {
                self.expr(&mut c.test)?;
                self.expr(&mut c.consequent)?;
                self.expr(&mut c.alternate)?;
            }
            Expr::Assign(a) => {
                self.pat(&mut a.left)?;
                self.expr(&mut a.right)?;
            }
            Expr::Sequence(s) => {
                for e in &mut s.expressions {
                    self.expr(e)?;
                }
            }
            Expr::Member(m) => {
                self.chain_link(&mut m.object)?;
                if let MemberProp::Computed(e) = &mut m.property {
                    self.expr(e)?;
                }
            }
            Expr::Call(c) => {
                self.chain_link(&mut c.callee)?;
                for arg in &mut c.arguments {
                    self.expr(arg)?;
                }
            }
            Expr::New(n) => {
                self.expr(&mut n.callee)?;
                for arg in &mut n.arguments {
                    self.expr(arg)?;
                }
            }
            Expr::TaggedTemplate(t) => {
                self.expr(&mut t.tag)?;
                for e in &mut t.quasi.expressions {
                    self.expr(e)?;
                }
            }
            Expr::Spread(s) => self.expr(&mut s.argument)?,
            Expr::Yield(y) => {
                if let Some(arg) = &mut y.argument {
                    self.expr(arg)?;
                }
            }
            Expr::Await(a) => self.expr(&mut a.argument)?,
            Expr::Import(i) => {
                self.expr(&mut i.source)?;
                if let Some(opts) = &mut i.options {
                    self.expr(opts)?;
                }
            }
        }
        Ok(())
    }
}

fn has_optional_link(mut expr: &Expr) -> bool {
    loop {
        match expr {
            Expr::Call(c) if c.optional => return true,
            Expr::Call(c) => expr = &c.callee,
            Expr::Member(m) if m.optional => return true,
            Expr::Member(m) => expr = &m.object,
            _ => return false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::to_source;
    use crate::parser::parse::parse_program;
    use crate::parser::scope::analyze;

    fn run(src: &str) -> (String, FloatReport) {
        run_as(src, SourceType::Script)
    }

    fn run_as(src: &str, source_type: SourceType) -> (String, FloatReport) {
        let mut prog = parse_program(src, source_type).unwrap();
        let tree = analyze(&prog).unwrap();
        let report = float_program(&mut prog, &tree, &FloatConfig::default()).unwrap();
        (to_source(&prog), report)
    }

    const HELPER: &str = "function memo__fb(producer) {\n  var value;\n  return function() {\n    \
        if (producer !== void 0) {\n      value = producer();\n      producer = void 0;\n    \
        }\n    return value;\n  };\n}\n";

    const SCENARIO_A: &str = "function add(x){return function(y){return x+y}} \
        function main(x){return function(y){return function(z){return (add(x)(y))+z}}}";

    const SCENARIO_B: &str =
        "function main(x){return function(y){return function(z){ var xy = add(x)(y); return add(xy)(z); }}}";

    #[test]
    fn test_scenario_a_curried_call_floats_to_y_closure() {
        let (out, report) = run(SCENARIO_A);
        let expected = format!(
            "{HELPER}function add(x) {{\n  return function(y) {{\n    return x + y;\n  }};\n}}\n\
             function main(x) {{\n  return function(y) {{\n    \
             const add_y__fb = memo__fb(function() {{\n      return add(x)(y);\n    }});\n    \
             return function(z) {{\n      return add_y__fb() + z;\n    }};\n  }};\n}}\n"
        );
        assert_eq!(out, expected);
        assert_eq!(report.floated, 1);
        assert_eq!(report.hoisted, vec!["add_y__fb".to_owned()]);
        assert_eq!(report.helper.as_deref(), Some("memo__fb"));
        assert!(report.helper_injected);
    }

    #[test]
    fn test_scenario_b_declaration_keeps_its_keyword() {
        let (out, report) = run(SCENARIO_B);
        assert!(out.contains(
            "  return function(y) {\n    const xy__fb = memo__fb(function() {\n      return add(x)(y);\n    });\n"
        ));
        assert!(out.contains("var xy = xy__fb();\n"));
        assert!(out.contains("return add(xy)(z);"));
        assert_eq!(report.hoisted, vec!["xy__fb".to_owned()]);
    }

    #[test]
    fn test_scenario_c_receiver_references_stay() {
        let src = "function main(x){return function(y){return function(z){return this.add(x)(y)+z}}}";
        let (out, report) = run(src);
        assert_eq!(report.floated, 0);
        assert!(!out.contains("__fb"));
        let src = "function main(x){return function(y){return function(z){return add(arguments)(y)}}}";
        assert_eq!(run(src).1.floated, 0);
    }

    #[test]
    fn test_scenario_d_nullary_calls_poison_their_ancestors() {
        let src = "function main(x){return function(y){return function(z){return add(x)(f(g(), y))+z}}}";
        let (out, report) = run(src);
        assert!(out.contains("f(g(), y)"));
        // The nullary-free callee `add(x)` still floats on its own, to `main`.
        assert_eq!(report.hoisted, vec!["add_x__fb".to_owned()]);
        assert!(out.contains("return add_x__fb()(f(g(), y)) + z;"));
        assert_eq!(report.rejected, 3);
    }

    #[test]
    fn test_scenario_e_rerun_does_not_double_wrap() {
        let (first, report1) = run(SCENARIO_A);
        let (second, report2) = run(&first);
        assert_eq!(report1.floated, 1);
        assert_eq!(report2.floated, 0);
        assert!(!report2.helper_injected);
        assert_eq!(second, first);
        assert_eq!(second.matches("memo__fb(").count(), first.matches("memo__fb(").count());

        let (first, _) = run(SCENARIO_B);
        let (second, report) = run(&first);
        assert_eq!(report.floated, 0);
        assert_eq!(second, first);
    }

    #[test]
    fn test_top_level_declarations_are_not_candidates() {
        let (out, report) = run("var k = add(1)(2);");
        assert_eq!(report.floated, 0);
        assert_eq!(out, "var k = add(1)(2);\n");
    }

    #[test]
    fn test_call_without_free_locals_floats_to_root_after_directives() {
        let src = "'use strict'; function f(q) { return g(q, h(1)); }";
        let (out, report) = run(src);
        assert_eq!(report.hoisted, vec!["h__fb".to_owned()]);
        let expected = format!(
            "'use strict';\n{HELPER}const h__fb = memo__fb(function() {{\n  return h(1);\n}});\n\
             function f(q) {{\n  return g(q, h__fb());\n}}\n"
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_module_insertion_after_imports() {
        let src = "import { h } from 'lib'; export function f(q) { return h(2); }";
        let (out, _) = run_as(src, SourceType::Module);
        assert!(out.starts_with(&format!("import {{ h }} from \"lib\";\n{HELPER}const h__fb")));
    }

    #[test]
    fn test_concise_arrow_target_gets_block_body() {
        let (out, report) = run("const f = (x) => (y) => (z) => add(x)(y) + z;");
        assert_eq!(report.hoisted, vec!["add_y__fb".to_owned()]);
        assert!(out.contains(
            "const f = (x) => (y) => {\n  const add_y__fb = memo__fb(function() {\n    return add(x)(y);\n  });\n  return (z) => add_y__fb() + z;\n};\n"
        ));
    }

    #[test]
    fn test_reassigned_dependency_stays() {
        let src = "function main(x){ x = x + 1; return function(y){return function(z){return add(x)(y)+z}}}";
        let (_, report) = run(src);
        assert_eq!(report.floated, 0);
    }

    #[test]
    fn test_dynamic_scopes_are_untouched() {
        let src = "function main(x){ eval('1'); return function(y){return function(z){return add(x)(y)+z}}}";
        assert_eq!(run(src).1.floated, 0);
        let src = "function main(o){ with (o) { return function(y){return function(z){return add(y)(y)+z}} } }";
        assert_eq!(run(src).1.floated, 0);
    }

    #[test]
    fn test_use_inside_parameter_default_is_not_moved_into_that_function() {
        let src = "function outer(a, g = function (q) { return add(a)(a); }) { return g; }";
        let (_, report) = run(src);
        assert_eq!(report.floated, 0);
    }

    #[test]
    fn test_outer_locals_do_not_block_bare_calls() {
        let src = "function f(p) { var loc = p + 1; return function (q) { return add(loc)(q); }; }";
        let (out, report) = run(src);
        assert_eq!(report.hoisted, vec!["add_loc__fb".to_owned()]);
        assert!(out.contains(
            "function f(p) {\n  const add_loc__fb = memo__fb(function() {\n    return add(loc);\n  });\n  var loc = p + 1;\n"
        ));
        assert!(out.contains("return add_loc__fb()(q);"));
    }

    #[test]
    fn test_var_initialized_after_the_closure_stays() {
        let src = "function f1(p){ var h = function(q){ return add(loc)(q); }; var r1 = h(1); var loc = p + 1; return [r1, h(1)]; }";
        let (out, report) = run(src);
        assert_eq!(report.floated, 0);
        assert!(out.contains("return add(loc)(q);"));

        // A declaration can be called before any statement of its body runs.
        let src = "function f(p) { var loc = p + 1; function h(q) { return add(loc)(q); } return h; }";
        let (out, report) = run(src);
        assert_eq!(report.floated, 0);
        assert!(out.contains("return add(loc)(q);"));
    }

    #[test]
    fn test_var_initialized_in_a_loop_stays() {
        let src = "function f(xs, fns) { for (var i = 0; i < xs.length; i++) { var v = xs[i]; fns.push(function (q) { return add(v)(q); }); } return fns; }";
        let (out, report) = run(src);
        assert_eq!(report.floated, 0);
        assert!(out.contains("return add(v)(q);"));
    }

    #[test]
    fn test_var_initialized_before_nested_closures_floats() {
        let src = "function f(p) { var loc = p + 1; return function (a) { return function (q) { return add(loc)(a)(q); }; }; }";
        let (_, report) = run(src);
        assert_eq!(report.hoisted, vec!["add_a__fb".to_owned()]);
    }

    #[test]
    fn test_name_and_literal_initializers_are_not_candidates() {
        let src = "function f(a){ return function(b){ var k = a; var n = 1; return k + n + b; }; }";
        let (out, report) = run(src);
        assert_eq!(report.candidates, 0);
        assert!(out.contains("var k = a;\n"));
        assert!(out.contains("var n = 1;\n"));
    }

    #[test]
    fn test_self_referential_initializer_stays() {
        let src = "function f(a){ return function(b){ var x = g(x, a); return x; }; }";
        let (out, report) = run(src);
        assert_eq!(report.floated, 0);
        assert!(!out.contains("x__fb"));
        assert!(out.contains("var x = g(x, a);"));
    }

    #[test]
    fn test_optional_chain_moves_whole_or_not_at_all() {
        let src = "function f(a){ return function(y){ return a?.b(1).c(y); }; }";
        let (out, report) = run(src);
        assert_eq!(report.floated, 0);
        assert!(out.contains("return a?.b(1).c(y);"));

        let src = "function f(a){ return function(y){ return a?.b(1).c(2) + y; }; }";
        let (out, report) = run(src);
        assert_eq!(report.hoisted.len(), 1);
        assert!(out.contains("return a?.b(1).c(2);\n"));
    }

    #[test]
    fn test_call_ahead_of_an_optional_link_floats() {
        let src = "function f(g){ return function(y){ return g(1)?.c(y); }; }";
        let (out, report) = run(src);
        assert_eq!(report.hoisted, vec!["g__fb".to_owned()]);
        assert!(out.contains("return g__fb()?.c(y);"));
    }

    #[test]
    fn test_names_avoid_collisions() {
        let src = "var add_y__fb = 0; \
            function main(x){return function(y){return function(z){return add(x)(y)+z+add(x)(y)}}}";
        let (out, report) = run(src);
        assert_eq!(
            report.hoisted,
            vec!["add_y__fb_1".to_owned(), "add_y__fb_2".to_owned()]
        );
        assert!(out.contains("return add_y__fb_1() + z + add_y__fb_2();"));
    }

    #[test]
    fn test_helper_name_avoids_existing_bindings() {
        let src = "function f(q) { var memo__fb = 1; return function (r) { return g(q)(r, h(1)); }; }";
        let (out, report) = run(src);
        assert_eq!(report.helper.as_deref(), Some("memo__fb_1"));
        assert!(out.contains("function memo__fb_1(producer)"));
    }

    #[test]
    fn test_nothing_to_float_leaves_program_alone() {
        let src = "function f(a) {\n  return a + 1;\n}\n";
        let (out, report) = run(src);
        assert_eq!(out, src);
        assert_eq!(report, FloatReport::default());
    }

    #[test]
    fn test_node_counter_advances() {
        let mut prog = parse_program(SCENARIO_A, SourceType::Script).unwrap();
        let before = prog.next_node_id;
        let tree = analyze(&prog).unwrap();
        float_program(&mut prog, &tree, &FloatConfig::default()).unwrap();
        assert!(prog.next_node_id > before);
    }
}
