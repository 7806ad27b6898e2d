//! Free-variable collection.
//!
//! [`free_vars`] lists, in first-occurrence order, every name an expression
//! reads or writes that is not bound inside the expression itself.  Property
//! keys, member property names, and labels are not references.  Names bound
//! by nested functions (parameters, declarations, the function's own name),
//! nested blocks, catch clauses, and class expressions are excluded within
//! their extent.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::parser::ast::*;

/// Ordered, duplicate-free list of free names.  Curried call sites rarely
/// mention more than a handful.
pub type FreeVars = SmallVec<[String; 4]>;

/// Collect the free variables of `expr`.
pub fn free_vars(expr: &Expr) -> FreeVars {
    let mut collector = Collector::default();
    collector.expr(expr);
    collector.out
}

#[derive(Default)]
struct Collector {
    /// Names bound by the enclosing nested constructs, innermost last.
    frames: Vec<HashSet<String>>,
    out: FreeVars,
}

impl Collector {
    fn reference(&mut self, name: &str) {
        if self.frames.iter().any(|f| f.contains(name)) {
            return;
        }
        if !self.out.iter().any(|n| n == name) {
            self.out.push(name.to_owned());
        }
    }

    fn with_frame(&mut self, names: HashSet<String>, f: impl FnOnce(&mut Self)) {
        self.frames.push(names);
        f(self);
        self.frames.pop();
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(id) => self.reference(&id.name),
            Expr::Lit(_) | Expr::This(_) | Expr::Super(_) | Expr::MetaProp(_) => {}
            Expr::Template(t) => t.expressions.iter().for_each(|e| self.expr(e)),
            Expr::Array(a) => a.elements.iter().flatten().for_each(|e| self.expr(e)),
            Expr::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.expr(value);
                        }
                        ObjectProp::Shorthand(id) => self.reference(&id.name),
                        ObjectProp::CoverInit { key, init } => {
                            self.reference(&key.name);
                            self.expr(init);
                        }
                        ObjectProp::Method { key, value, .. } => {
                            self.prop_key(key);
                            self.function(value, false);
                        }
                        ObjectProp::Spread(e) => self.expr(e),
                    }
                }
            }
            Expr::Fn(f) => self.function(f, true),
            Expr::Arrow(a) => {
                let mut names = HashSet::new();
                bind_params(&a.params, &mut names);
                if let ArrowBody::Block(b) = &a.body {
                    var_names(&b.body, &mut names);
                    lexical_names(&b.body, &mut names);
                }
                self.with_frame(names, |c| {
                    a.params.iter().for_each(|p| c.binding_pat(p));
                    match &a.body {
                        ArrowBody::Block(b) => c.stmts(&b.body),
                        ArrowBody::Expr(e) => c.expr(e),
                    }
                });
            }
            Expr::Class(cls) => {
                let names = cls.id.iter().map(|id| id.name.clone()).collect();
                self.with_frame(names, |c| c.class(cls));
            }
            Expr::Unary(u) => self.expr(&u.argument),
            Expr::Update(u) => self.expr(&u.argument),
            Expr::Binary(b) => {
                self.expr(&b.left);
                self.expr(&b.right);
            }
            Expr::Logical(l) => {
                self.expr(&l.left);
                self.expr(&l.right);
            }
            Expr::Conditional(c) => {
                self.expr(&c.test);
                self.expr(&c.consequent);
                self.expr(&c.alternate);
            }
            Expr::Assign(a) => {
                self.target_pat(&a.left);
                self.expr(&a.right);
            }
            Expr::Sequence(s) => s.expressions.iter().for_each(|e| self.expr(e)),
            Expr::Member(m) => {
                self.expr(&m.object);
                if let MemberProp::Computed(e) = &m.property {
                    self.expr(e);
                }
            }
            Expr::Call(c) => {
                self.expr(&c.callee);
                c.arguments.iter().for_each(|a| self.expr(a));
            }
            Expr::New(n) => {
                self.expr(&n.callee);
                n.arguments.iter().for_each(|a| self.expr(a));
            }
            Expr::TaggedTemplate(t) => {
                self.expr(&t.tag);
                t.quasi.expressions.iter().for_each(|e| self.expr(e));
            }
            Expr::Spread(s) => self.expr(&s.argument),
            Expr::Yield(y) => {
                if let Some(arg) = &y.argument {
                    self.expr(arg);
                }
            }
            Expr::Await(a) => self.expr(&a.argument),
            Expr::Import(i) => {
                self.expr(&i.source);
                if let Some(opts) = &i.options {
                    self.expr(opts);
                }
            }
        }
    }

    fn prop_key(&mut self, key: &PropKey) {
        if let PropKey::Computed(e) = key {
            self.expr(e);
        }
    }

    /// `is_expr`: a function expression binds its own name inside itself.
    fn function(&mut self, f: &Function, is_expr: bool) {
        let mut names = HashSet::new();
        if is_expr && let Some(id) = &f.id {
            names.insert(id.name.clone());
        }
        names.insert("arguments".to_owned());
        bind_params(&f.params, &mut names);
        var_names(&f.body.body, &mut names);
        lexical_names(&f.body.body, &mut names);
        self.with_frame(names, |c| {
            f.params.iter().for_each(|p| c.binding_pat(p));
            c.stmts(&f.body.body);
        });
    }

    fn class(&mut self, c: &Class) {
        if let Some(sup) = &c.super_class {
            self.expr(sup);
        }
        for member in &c.members {
            match member {
                ClassMember::Method(m) => {
                    self.prop_key(&m.key);
                    self.function(&m.value, false);
                }
                ClassMember::Field(f) => {
                    self.prop_key(&f.key);
                    if let Some(value) = &f.value {
                        self.expr(value);
                    }
                }
                ClassMember::StaticBlock(s) => {
                    let mut names = HashSet::new();
                    var_names(&s.body, &mut names);
                    lexical_names(&s.body, &mut names);
                    self.with_frame(names, |c| c.stmts(&s.body));
                }
            }
        }
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    /// A declaration pattern: names are already bound by the frame; only
    /// defaults and computed keys are visited.
    fn binding_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(_) => {}
            Pat::Array(a) => a.elements.iter().flatten().for_each(|p| self.binding_pat(p)),
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.binding_pat(value);
                        }
                        ObjectPatProp::Shorthand { default, .. } => {
                            if let Some(d) = default {
                                self.expr(d);
                            }
                        }
                        ObjectPatProp::Rest(r) => self.binding_pat(r),
                    }
                }
            }
            Pat::Rest(r) => self.binding_pat(r),
            Pat::Assign(a) => {
                self.binding_pat(&a.left);
                self.expr(&a.right);
            }
            Pat::Expr(e) => self.expr(e),
        }
    }

    /// An assignment target: identifiers are write references.
    fn target_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(id) => self.reference(&id.name),
            Pat::Array(a) => a.elements.iter().flatten().for_each(|p| self.target_pat(p)),
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.target_pat(value);
                        }
                        ObjectPatProp::Shorthand { key, default } => {
                            self.reference(&key.name);
                            if let Some(d) = default {
                                self.expr(d);
                            }
                        }
                        ObjectPatProp::Rest(r) => self.target_pat(r),
                    }
                }
            }
            Pat::Rest(r) => self.target_pat(r),
            Pat::Assign(a) => {
                self.target_pat(&a.left);
                self.expr(&a.right);
            }
            Pat::Expr(e) => self.expr(e),
        }
    }

    // ── Statements (bodies of nested functions) ─────────────────────────────

    fn stmts(&mut self, stmts: &[Stmt]) {
        stmts.iter().for_each(|s| self.stmt(s));
    }

    fn block(&mut self, body: &[Stmt]) {
        let mut names = HashSet::new();
        lexical_names(body, &mut names);
        self.with_frame(names, |c| c.stmts(body));
    }

    fn var_decl(&mut self, v: &VarDecl) {
        for d in &v.declarators {
            self.binding_pat(&d.id);
            if let Some(init) = &d.init {
                self.expr(init);
            }
        }
    }

    /// Run `f` inside a frame for a `let`/`const` loop head, if there is one.
    fn loop_head(&mut self, decl: Option<&VarDecl>, f: impl FnOnce(&mut Self)) {
        let mut names = HashSet::new();
        if let Some(v) = decl.filter(|v| v.kind != VarKind::Var) {
            for d in &v.declarators {
                names.extend(d.id.bound_names().into_iter().map(|id| id.name.clone()));
            }
        }
        self.with_frame(names, f);
    }

    fn for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Var(v) => self.var_decl(v),
            ForHead::Pat(p) => self.target_pat(p),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Directive(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Debugger(_)
            | Stmt::Empty(_)
            | Stmt::Import(_)
            | Stmt::Export(_) => {}
            Stmt::Block(b) => self.block(&b.body),
            Stmt::Var(v) => self.var_decl(v),
            Stmt::FnDecl(f) => self.function(f, false),
            Stmt::ClassDecl(c) => self.class(c),
            Stmt::Expr(e) => self.expr(&e.expr),
            Stmt::If(s) => {
                self.expr(&s.test);
                self.stmt(&s.consequent);
                if let Some(alt) = &s.alternate {
                    self.stmt(alt);
                }
            }
            Stmt::For(s) => {
                let decl = match &s.init {
                    Some(ForInit::Var(v)) => Some(v),
                    _ => None,
                };
                self.loop_head(decl, |c| {
                    match &s.init {
                        Some(ForInit::Var(v)) => c.var_decl(v),
                        Some(ForInit::Expr(e)) => c.expr(e),
                        None => {}
                    }
                    if let Some(test) = &s.test {
                        c.expr(test);
                    }
                    if let Some(update) = &s.update {
                        c.expr(update);
                    }
                    c.stmt(&s.body);
                });
            }
            Stmt::ForIn(s) => self.for_in_of(&s.left, &s.right, &s.body),
            Stmt::ForOf(s) => self.for_in_of(&s.left, &s.right, &s.body),
            Stmt::While(s) => {
                self.expr(&s.test);
                self.stmt(&s.body);
            }
            Stmt::DoWhile(s) => {
                self.stmt(&s.body);
                self.expr(&s.test);
            }
            Stmt::Switch(s) => {
                self.expr(&s.discriminant);
                let mut names = HashSet::new();
                for case in &s.cases {
                    lexical_names(&case.consequent, &mut names);
                }
                self.with_frame(names, |c| {
                    for case in &s.cases {
                        if let Some(test) = &case.test {
                            c.expr(test);
                        }
                        c.stmts(&case.consequent);
                    }
                });
            }
            Stmt::Try(s) => {
                self.block(&s.block.body);
                if let Some(handler) = &s.handler {
                    let mut names = HashSet::new();
                    if let Some(param) = &handler.param {
                        bind_params(std::slice::from_ref(param), &mut names);
                    }
                    lexical_names(&handler.body.body, &mut names);
                    self.with_frame(names, |c| {
                        if let Some(param) = &handler.param {
                            c.binding_pat(param);
                        }
                        c.stmts(&handler.body.body);
                    });
                }
                if let Some(fin) = &s.finalizer {
                    self.block(&fin.body);
                }
            }
            Stmt::Return(s) => {
                if let Some(arg) = &s.argument {
                    self.expr(arg);
                }
            }
            Stmt::Throw(s) => self.expr(&s.argument),
            Stmt::Labeled(s) => self.stmt(&s.body),
            Stmt::With(s) => {
                self.expr(&s.object);
                self.stmt(&s.body);
            }
        }
    }

    fn for_in_of(&mut self, left: &ForHead, right: &Expr, body: &Stmt) {
        let decl = match left {
            ForHead::Var(v) => Some(v),
            ForHead::Pat(_) => None,
        };
        self.loop_head(decl, |c| {
            c.for_head(left);
            c.expr(right);
            c.stmt(body);
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Declared-name collection
// ─────────────────────────────────────────────────────────────────────────────

fn bind_params(params: &[Pat], names: &mut HashSet<String>) {
    for param in params {
        names.extend(param.bound_names().into_iter().map(|id| id.name.clone()));
    }
}

/// Names a function body hoists to its top: `var` declarations at any block
/// depth and function declarations nested in blocks.  Nested functions are
/// not entered.
fn var_names(stmts: &[Stmt], names: &mut HashSet<String>) {
    for stmt in stmts {
        var_names_stmt(stmt, names);
    }
}

fn var_names_decl(v: &VarDecl, names: &mut HashSet<String>) {
    if v.kind == VarKind::Var {
        for d in &v.declarators {
            names.extend(d.id.bound_names().into_iter().map(|id| id.name.clone()));
        }
    }
}

fn var_names_stmt(stmt: &Stmt, names: &mut HashSet<String>) {
    match stmt {
        Stmt::Var(v) => var_names_decl(v, names),
        Stmt::FnDecl(f) => names.extend(f.id.iter().map(|id| id.name.clone())),
        Stmt::Block(b) => var_names(&b.body, names),
        Stmt::If(s) => {
            var_names_stmt(&s.consequent, names);
            if let Some(alt) = &s.alternate {
                var_names_stmt(alt, names);
            }
        }
        Stmt::For(s) => {
            if let Some(ForInit::Var(v)) = &s.init {
                var_names_decl(v, names);
            }
            var_names_stmt(&s.body, names);
        }
        Stmt::ForIn(s) => {
            if let ForHead::Var(v) = &s.left {
                var_names_decl(v, names);
            }
            var_names_stmt(&s.body, names);
        }
        Stmt::ForOf(s) => {
            if let ForHead::Var(v) = &s.left {
                var_names_decl(v, names);
            }
            var_names_stmt(&s.body, names);
        }
        Stmt::While(s) => var_names_stmt(&s.body, names),
        Stmt::DoWhile(s) => var_names_stmt(&s.body, names),
        Stmt::Labeled(s) => var_names_stmt(&s.body, names),
        Stmt::With(s) => var_names_stmt(&s.body, names),
        Stmt::Switch(s) => s.cases.iter().for_each(|c| var_names(&c.consequent, names)),
        Stmt::Try(s) => {
            var_names(&s.block.body, names);
            if let Some(h) = &s.handler {
                var_names(&h.body.body, names);
            }
            if let Some(f) = &s.finalizer {
                var_names(&f.body, names);
            }
        }
        _ => {}
    }
}

/// Names declared directly in `stmts` by `let`, `const`, `class`, or
/// `function`.
fn lexical_names(stmts: &[Stmt], names: &mut HashSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Var(v) if v.kind != VarKind::Var => {
                for d in &v.declarators {
                    names.extend(d.id.bound_names().into_iter().map(|id| id.name.clone()));
                }
            }
            Stmt::FnDecl(f) => names.extend(f.id.iter().map(|id| id.name.clone())),
            Stmt::ClassDecl(c) => names.extend(c.id.iter().map(|id| id.name.clone())),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse_program;

    fn fv(src: &str) -> Vec<String> {
        let prog = parse_program(&format!("({src});"), SourceType::Script).unwrap();
        let Stmt::Expr(e) = &prog.body[0] else {
            panic!("expected expression statement");
        };
        free_vars(&e.expr).into_vec()
    }

    #[test]
    fn test_first_occurrence_order_without_duplicates() {
        assert_eq!(fv("add(x)(y) + x"), ["add", "x", "y"]);
    }

    #[test]
    fn test_property_names_are_not_references() {
        assert_eq!(fv("o.p + { k: v, [c]: 1 }.k"), ["o", "v", "c"]);
        assert_eq!(fv("{ short }"), ["short"]);
    }

    #[test]
    fn test_nested_function_bindings_are_excluded() {
        assert_eq!(fv("function f(a, { b = d }) { var c; return f(a, b, c, e); }"), ["d", "e"]);
        assert_eq!(fv("(a) => a + b"), ["b"]);
        assert_eq!(fv("function () { return arguments[0]; }"), Vec::<String>::new());
    }

    #[test]
    fn test_block_scoping_inside_nested_function() {
        // `x` is bound only inside the block; the return refers to an outer `x`.
        assert_eq!(fv("function () { { let x = 1; } return x; }"), ["x"]);
        assert_eq!(fv("function () { if (p) { var y = 1; } return y; }"), ["p"]);
        assert_eq!(fv("function () { for (let i = 0; i < n; i++) {} return i; }"), ["n", "i"]);
    }

    #[test]
    fn test_catch_and_class_names() {
        assert_eq!(fv("function () { try { t(1); } catch (e) { h(e); } }"), ["t", "h"]);
        assert_eq!(fv("class K { m() { return K; } }"), Vec::<String>::new());
        assert_eq!(fv("class extends Base { }"), ["Base"]);
    }

    #[test]
    fn test_assignment_targets_are_references() {
        assert_eq!(fv("(q) => { total = q; [a, b] = q; }"), ["total", "a", "b"]);
    }

    #[test]
    fn test_function_expression_name_is_bound_inside() {
        assert_eq!(fv("function fact(n) { return n ? fact(n - 1) : one; }"), ["one"]);
    }

    #[test]
    fn test_self_referential_initializer_keeps_declared_name() {
        let prog = parse_program("var x = g(x, a);", SourceType::Script).unwrap();
        let Stmt::Var(decl) = &prog.body[0] else {
            panic!("expected var declaration");
        };
        let init = decl.declarators[0].init.as_deref().unwrap();
        assert_eq!(free_vars(init).into_vec(), ["g", "x", "a"]);
    }
}
