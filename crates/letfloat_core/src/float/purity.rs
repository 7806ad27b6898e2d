//! Eligibility of an expression for floating.
//!
//! An expression may move only if evaluating it somewhere else, later, and at
//! most once cannot be told apart from evaluating it in place.  The check is
//! syntactic and deliberately coarse:
//!
//! - no call or `new` with an empty argument list anywhere in the subtree,
//!   nested functions included (a nullary call is the idiom for an effect);
//! - no reference to the current invocation: `this`, `arguments`, `super`,
//!   `new.target`, or a `.caller` / `.callee` read;
//! - no suspension (`await`, `yield`) or direct write (assignment, update,
//!   `delete`, dynamic `import()`) performed by the expression itself.
//!
//! Invocation references are judged per frame: an ordinary nested function
//! (function expression, method, class member) has its own receiver, so
//! references inside it are fine, while an arrow shares its parent's.  Writes
//! and suspensions inside any nested function are not performed by the
//! expression and are allowed.

use crate::parser::ast::*;

/// `true` when `expr` may be moved into a memoized producer.
pub fn is_eligible(expr: &Expr) -> bool {
    expr_ok(expr, Frame::default())
}

/// What the code being checked is allowed to do at the current depth.
#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    /// Inside an ordinary nested function: invocation references belong to
    /// that function.
    own_receiver: bool,
    /// Inside any nested function: its body runs later, if ever.
    deferred: bool,
}

impl Frame {
    fn ordinary_function() -> Self {
        Frame {
            own_receiver: true,
            deferred: true,
        }
    }

    fn arrow(self) -> Self {
        Frame {
            own_receiver: self.own_receiver,
            deferred: true,
        }
    }

    /// Static blocks and static field initializers run when the class is
    /// evaluated, with the class itself as receiver.
    fn class_static() -> Self {
        Frame {
            own_receiver: true,
            deferred: false,
        }
    }
}

fn expr_ok(expr: &Expr, frame: Frame) -> bool {
    match expr {
        Expr::Ident(id) => id.name != "arguments" || frame.own_receiver,
        Expr::This(_) | Expr::Super(_) => frame.own_receiver,
        Expr::MetaProp(m) => m.meta != "new" || frame.own_receiver,
        Expr::Lit(_) => true,
        Expr::Template(t) => t.expressions.iter().all(|e| expr_ok(e, frame)),
        Expr::Array(a) => a.elements.iter().flatten().all(|e| expr_ok(e, frame)),
        Expr::Object(o) => o.properties.iter().all(|p| match p {
            ObjectProp::KeyValue { key, value } => key_ok(key, frame) && expr_ok(value, frame),
            ObjectProp::Shorthand(id) => id.name != "arguments" || frame.own_receiver,
            ObjectProp::CoverInit { init, .. } => expr_ok(init, frame),
            ObjectProp::Method { key, value, .. } => {
                key_ok(key, frame) && function_ok(value, Frame::ordinary_function())
            }
            ObjectProp::Spread(e) => expr_ok(e, frame),
        }),
        Expr::Fn(f) => function_ok(f, Frame::ordinary_function()),
        Expr::Arrow(a) => {
            let inner = frame.arrow();
            a.params.iter().all(|p| pat_ok(p, inner))
                && match &a.body {
                    ArrowBody::Block(b) => stmts_ok(&b.body, inner),
                    ArrowBody::Expr(e) => expr_ok(e, inner),
                }
        }
        Expr::Class(c) => class_ok(c, frame),
        Expr::Unary(u) => {
            (u.op != UnaryOp::Delete || frame.deferred) && expr_ok(&u.argument, frame)
        }
        Expr::Update(u) => frame.deferred && expr_ok(&u.argument, frame),
        Expr::Binary(b) => expr_ok(&b.left, frame) && expr_ok(&b.right, frame),
        Expr::Logical(l) => expr_ok(&l.left, frame) && expr_ok(&l.right, frame),
        Expr::Conditional(c) => {
            expr_ok(&c.test, frame) && expr_ok(&c.consequent, frame) && expr_ok(&c.alternate, frame)
        }
        Expr::Assign(a) => frame.deferred && pat_ok(&a.left, frame) && expr_ok(&a.right, frame),
        Expr::Sequence(s) => s.expressions.iter().all(|e| expr_ok(e, frame)),
        Expr::Member(m) => {
            let prop_ok = match &m.property {
                MemberProp::Ident(id) => id.name != "caller" && id.name != "callee",
                MemberProp::Private(_) => true,
                MemberProp::Computed(e) => expr_ok(e, frame),
            };
            prop_ok && expr_ok(&m.object, frame)
        }
        Expr::Call(c) => {
            !c.arguments.is_empty()
                && expr_ok(&c.callee, frame)
                && c.arguments.iter().all(|a| expr_ok(a, frame))
        }
        Expr::New(n) => {
            !n.arguments.is_empty()
                && expr_ok(&n.callee, frame)
                && n.arguments.iter().all(|a| expr_ok(a, frame))
        }
        Expr::TaggedTemplate(t) => {
            expr_ok(&t.tag, frame) && t.quasi.expressions.iter().all(|e| expr_ok(e, frame))
        }
        Expr::Spread(s) => expr_ok(&s.argument, frame),
        Expr::Yield(y) => frame.deferred && y.argument.as_deref().is_none_or(|a| expr_ok(a, frame)),
        Expr::Await(a) => frame.deferred && expr_ok(&a.argument, frame),
        Expr::Import(i) => {
            frame.deferred
                && expr_ok(&i.source, frame)
                && i.options.as_deref().is_none_or(|o| expr_ok(o, frame))
        }
    }
}

fn key_ok(key: &PropKey, frame: Frame) -> bool {
    match key {
        PropKey::Computed(e) => expr_ok(e, frame),
        _ => true,
    }
}

fn function_ok(f: &Function, frame: Frame) -> bool {
    f.params.iter().all(|p| pat_ok(p, frame)) && stmts_ok(&f.body.body, frame)
}

fn class_ok(c: &Class, frame: Frame) -> bool {
    if let Some(sup) = &c.super_class
        && !expr_ok(sup, frame)
    {
        return false;
    }
    c.members.iter().all(|member| match member {
        ClassMember::Method(m) => {
            key_ok(&m.key, frame) && function_ok(&m.value, Frame::ordinary_function())
        }
        ClassMember::Field(f) => {
            let init_frame = if f.is_static {
                Frame::class_static()
            } else {
                Frame::ordinary_function()
            };
            key_ok(&f.key, frame) && f.value.as_deref().is_none_or(|v| expr_ok(v, init_frame))
        }
        ClassMember::StaticBlock(s) => stmts_ok(&s.body, Frame::class_static()),
    })
}

fn pat_ok(pat: &Pat, frame: Frame) -> bool {
    match pat {
        Pat::Ident(_) => true,
        Pat::Array(a) => a.elements.iter().flatten().all(|p| pat_ok(p, frame)),
        Pat::Object(o) => o.properties.iter().all(|p| match p {
            ObjectPatProp::KeyValue { key, value } => key_ok(key, frame) && pat_ok(value, frame),
            ObjectPatProp::Shorthand { default, .. } => {
                default.as_deref().is_none_or(|d| expr_ok(d, frame))
            }
            ObjectPatProp::Rest(r) => pat_ok(r, frame),
        }),
        Pat::Rest(r) => pat_ok(r, frame),
        Pat::Assign(a) => pat_ok(&a.left, frame) && expr_ok(&a.right, frame),
        Pat::Expr(e) => expr_ok(e, frame),
    }
}

// ── Statements inside nested functions ──────────────────────────────────────

fn stmts_ok(stmts: &[Stmt], frame: Frame) -> bool {
    stmts.iter().all(|s| stmt_ok(s, frame))
}

fn var_ok(v: &VarDecl, frame: Frame) -> bool {
    v.declarators.iter().all(|d| {
        pat_ok(&d.id, frame) && d.init.as_deref().is_none_or(|e| expr_ok(e, frame))
    })
}

fn for_head_ok(head: &ForHead, frame: Frame) -> bool {
    match head {
        ForHead::Var(v) => var_ok(v, frame),
        ForHead::Pat(p) => pat_ok(p, frame),
    }
}

fn stmt_ok(stmt: &Stmt, frame: Frame) -> bool {
    match stmt {
        Stmt::Directive(_)
        | Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Debugger(_)
        | Stmt::Empty(_)
        | Stmt::Import(_) => true,
        Stmt::Block(b) => stmts_ok(&b.body, frame),
        Stmt::Var(v) => var_ok(v, frame),
        Stmt::FnDecl(f) => function_ok(f, Frame::ordinary_function()),
        Stmt::ClassDecl(c) => class_ok(c, frame),
        Stmt::Expr(e) => expr_ok(&e.expr, frame),
        Stmt::If(s) => {
            expr_ok(&s.test, frame)
                && stmt_ok(&s.consequent, frame)
                && s.alternate.as_deref().is_none_or(|a| stmt_ok(a, frame))
        }
        Stmt::For(s) => {
            let init_ok = match &s.init {
                Some(ForInit::Var(v)) => var_ok(v, frame),
                Some(ForInit::Expr(e)) => expr_ok(e, frame),
                None => true,
            };
            init_ok
                && s.test.as_deref().is_none_or(|e| expr_ok(e, frame))
                && s.update.as_deref().is_none_or(|e| expr_ok(e, frame))
                && stmt_ok(&s.body, frame)
        }
        Stmt::ForIn(s) => {
            for_head_ok(&s.left, frame) && expr_ok(&s.right, frame) && stmt_ok(&s.body, frame)
        }
        Stmt::ForOf(s) => {
            for_head_ok(&s.left, frame) && expr_ok(&s.right, frame) && stmt_ok(&s.body, frame)
        }
        Stmt::While(s) => expr_ok(&s.test, frame) && stmt_ok(&s.body, frame),
        Stmt::DoWhile(s) => stmt_ok(&s.body, frame) && expr_ok(&s.test, frame),
        Stmt::Switch(s) => {
            expr_ok(&s.discriminant, frame)
                && s.cases.iter().all(|c| {
                    c.test.as_ref().is_none_or(|t| expr_ok(t, frame))
                        && stmts_ok(&c.consequent, frame)
                })
        }
        Stmt::Try(s) => {
            stmts_ok(&s.block.body, frame)
                && s.handler.as_ref().is_none_or(|h| {
                    h.param.as_ref().is_none_or(|p| pat_ok(p, frame))
                        && stmts_ok(&h.body.body, frame)
                })
                && s.finalizer.as_ref().is_none_or(|f| stmts_ok(&f.body, frame))
        }
        Stmt::Return(s) => s.argument.as_deref().is_none_or(|e| expr_ok(e, frame)),
        Stmt::Throw(s) => expr_ok(&s.argument, frame),
        Stmt::Labeled(s) => stmt_ok(&s.body, frame),
        Stmt::With(s) => expr_ok(&s.object, frame) && stmt_ok(&s.body, frame),
        Stmt::Export(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse_program;

    /// Parse `src` as a single expression statement inside a function body
    /// (so `await`/`yield` are legal where the test needs them).
    fn eligible(src: &str) -> bool {
        let wrapped = format!("async function* host() {{ ({src}); }}");
        let prog = parse_program(&wrapped, SourceType::Script).unwrap();
        let Stmt::FnDecl(f) = &prog.body[0] else {
            panic!("expected function");
        };
        let Stmt::Expr(e) = &f.body.body[0] else {
            panic!("expected expression statement");
        };
        is_eligible(&e.expr)
    }

    #[test]
    fn test_curried_application_is_eligible() {
        assert!(eligible("add(x)(y)"));
        assert!(eligible("a + b * f(c)"));
        assert!(eligible("[x, { k: g(y) }, `t${h(z)}`]"));
    }

    #[test]
    fn test_nullary_call_is_rejected_at_any_depth() {
        assert!(!eligible("foo()"));
        assert!(!eligible("add(x)(foo())"));
        assert!(!eligible("a?.()"));
        assert!(!eligible("new Thing"));
        assert!(!eligible("function (q) { return bar(); }"));
        assert!(!eligible("(q) => [1, 2].map(() => tick())"));
    }

    #[test]
    fn test_receiver_references_are_rejected() {
        assert!(!eligible("this.x"));
        assert!(!eligible("f(this)"));
        assert!(!eligible("arguments[0]"));
        assert!(!eligible("g(new.target)"));
        assert!(!eligible("(q) => this.v"));
        assert!(!eligible("f.caller"));
        assert!(!eligible("g(arguments.callee)"));
    }

    #[test]
    fn test_ordinary_function_resets_receiver() {
        assert!(eligible("function (q) { return this.v + arguments.length; }"));
        assert!(eligible("({ m(q) { return this.v; } })"));
        assert!(eligible("class { m(q) { return super.m(q); } }"));
        assert!(eligible("function (q) { return (r) => this.v; }"));
    }

    #[test]
    fn test_writes_and_suspension() {
        assert!(!eligible("x = 1"));
        assert!(!eligible("f(x++)"));
        assert!(!eligible("delete o.k"));
        assert!(!eligible("f(await p)"));
        assert!(!eligible("f(yield v)"));
        assert!(!eligible("import(m)"));
        assert!(eligible("(q) => { q += 1; return q; }"));
        assert!(eligible("async (q) => await q"));
    }

    #[test]
    fn test_class_static_initializers_run_eagerly() {
        assert!(!eligible("class { static k = x++; }"));
        assert!(!eligible("class { static { counter = 1; } }"));
        assert!(eligible("class { k = x++; }"));
        assert!(eligible("class { static k = this.name; }"));
    }
}
