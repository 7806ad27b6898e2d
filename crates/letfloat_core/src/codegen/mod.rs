//! Source printer for the [`ast`](crate::parser::ast).
//!
//! [`to_source`] renders a [`Program`] back to JavaScript text with two-space
//! indentation.  Parentheses are emitted only where precedence, `??` mixing,
//! or an ambiguous statement start requires them, so the printed text parses
//! back to the same tree shape.

use crate::parser::ast::*;
use crate::parser::scanner::is_id_continue;

/// Render a whole program.
pub fn to_source(program: &Program) -> String {
    let mut p = Printer::default();
    p.stmts(&program.body);
    p.out
}

/// Render a single expression (used for diagnostics).
pub fn expr_to_source(expr: &Expr) -> String {
    let mut p = Printer::default();
    p.expr(expr, prec::SEQ);
    p.out
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence levels
// ─────────────────────────────────────────────────────────────────────────────

/// Binding strength of each expression form; higher binds tighter.
mod prec {
    pub const SEQ: u8 = 0;
    pub const ASSIGN: u8 = 1;
    pub const COND: u8 = 2;
    pub const NULLISH: u8 = 3;
    pub const OR: u8 = 4;
    pub const AND: u8 = 5;
    pub const BIT_OR: u8 = 6;
    pub const BIT_XOR: u8 = 7;
    pub const BIT_AND: u8 = 8;
    pub const EQUALITY: u8 = 9;
    pub const RELATIONAL: u8 = 10;
    pub const SHIFT: u8 = 11;
    pub const ADDITIVE: u8 = 12;
    pub const MULTIPLICATIVE: u8 = 13;
    pub const EXPONENT: u8 = 14;
    pub const UNARY: u8 = 15;
    pub const POSTFIX: u8 = 16;
    pub const CALL: u8 = 17;
    pub const PRIMARY: u8 = 18;
}

fn binary_prec(op: BinaryOp) -> u8 {
    use BinaryOp as B;
    match op {
        B::BitOr => prec::BIT_OR,
        B::BitXor => prec::BIT_XOR,
        B::BitAnd => prec::BIT_AND,
        B::Eq | B::NotEq | B::StrictEq | B::StrictNotEq => prec::EQUALITY,
        B::Lt | B::LtEq | B::Gt | B::GtEq | B::In | B::Instanceof => prec::RELATIONAL,
        B::Shl | B::Shr | B::UShr => prec::SHIFT,
        B::Add | B::Sub => prec::ADDITIVE,
        B::Mul | B::Div | B::Rem => prec::MULTIPLICATIVE,
        B::Exp => prec::EXPONENT,
    }
}

fn logical_prec(op: LogicalOp) -> u8 {
    match op {
        LogicalOp::Nullish => prec::NULLISH,
        LogicalOp::Or => prec::OR,
        LogicalOp::And => prec::AND,
    }
}

fn expr_prec(expr: &Expr) -> u8 {
    match expr {
        Expr::Sequence(_) => prec::SEQ,
        Expr::Assign(_) | Expr::Arrow(_) | Expr::Yield(_) | Expr::Spread(_) => prec::ASSIGN,
        Expr::Conditional(_) => prec::COND,
        Expr::Logical(l) => logical_prec(l.op),
        Expr::Binary(b) => binary_prec(b.op),
        Expr::Unary(_) | Expr::Await(_) => prec::UNARY,
        Expr::Update(u) if u.prefix => prec::UNARY,
        Expr::Update(_) => prec::POSTFIX,
        Expr::Member(_)
        | Expr::Call(_)
        | Expr::New(_)
        | Expr::TaggedTemplate(_)
        | Expr::Import(_) => prec::CALL,
        _ => prec::PRIMARY,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Printer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
    /// Set while printing a `for (…;` initializer, where a bare `in` would
    /// be read as a for-in loop.
    no_in: bool,
}

impl Printer {
    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline_indent(&mut self) {
        self.out.push('\n');
        self.write_indent();
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    /// Run `f` against an empty buffer and return what it printed.
    fn capture(&mut self, f: impl FnOnce(&mut Self)) -> String {
        let saved = std::mem::take(&mut self.out);
        f(self);
        std::mem::replace(&mut self.out, saved)
    }

    fn comma_list<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            each(self, item);
        }
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.write_indent();
            self.stmt(stmt);
            self.out.push('\n');
        }
    }

    fn block(&mut self, body: &[Stmt]) {
        if body.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{\n");
        self.indent += 1;
        self.stmts(body);
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    /// The body of `if`/`for`/`while`/…: blocks stay on the header line,
    /// anything else follows after a space.
    fn sub_stmt(&mut self, stmt: &Stmt) {
        self.write(" ");
        self.stmt(stmt);
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Directive(d) => {
                self.write(&d.raw);
                self.write(";");
            }
            Stmt::Block(b) => self.block(&b.body),
            Stmt::Var(v) => {
                self.var_decl(v);
                self.write(";");
            }
            Stmt::FnDecl(f) => self.function(f),
            Stmt::ClassDecl(c) => self.class(c),
            Stmt::Expr(e) => {
                let text = self.capture(|p| p.expr(&e.expr, prec::SEQ));
                if needs_stmt_parens(&text) {
                    self.write("(");
                    self.write(&text);
                    self.write(")");
                } else {
                    self.write(&text);
                }
                self.write(";");
            }
            Stmt::If(s) => {
                self.write("if (");
                self.expr(&s.test, prec::SEQ);
                self.write(")");
                match &s.alternate {
                    None => self.sub_stmt(&s.consequent),
                    Some(alt) => {
                        // A braceless consequent could capture the `else`.
                        if matches!(s.consequent.as_ref(), Stmt::Block(_)) {
                            self.sub_stmt(&s.consequent);
                        } else {
                            self.write(" ");
                            self.block(std::slice::from_ref(s.consequent.as_ref()));
                        }
                        self.write(" else");
                        self.sub_stmt(alt);
                    }
                }
            }
            Stmt::For(s) => {
                self.write("for (");
                match &s.init {
                    Some(ForInit::Var(v)) => {
                        let saved = std::mem::replace(&mut self.no_in, true);
                        self.var_decl(v);
                        self.no_in = saved;
                    }
                    Some(ForInit::Expr(e)) => {
                        let saved = std::mem::replace(&mut self.no_in, true);
                        self.expr(e, prec::SEQ);
                        self.no_in = saved;
                    }
                    None => {}
                }
                self.write(";");
                if let Some(test) = &s.test {
                    self.write(" ");
                    self.expr(test, prec::SEQ);
                }
                self.write(";");
                if let Some(update) = &s.update {
                    self.write(" ");
                    self.expr(update, prec::SEQ);
                }
                self.write(")");
                self.sub_stmt(&s.body);
            }
            Stmt::ForIn(s) => {
                self.write("for (");
                self.for_head(&s.left);
                self.write(" in ");
                self.expr(&s.right, prec::SEQ);
                self.write(")");
                self.sub_stmt(&s.body);
            }
            Stmt::ForOf(s) => {
                self.write(if s.is_await { "for await (" } else { "for (" });
                self.for_head(&s.left);
                self.write(" of ");
                self.expr(&s.right, prec::ASSIGN);
                self.write(")");
                self.sub_stmt(&s.body);
            }
            Stmt::While(s) => {
                self.write("while (");
                self.expr(&s.test, prec::SEQ);
                self.write(")");
                self.sub_stmt(&s.body);
            }
            Stmt::DoWhile(s) => {
                self.write("do");
                self.sub_stmt(&s.body);
                self.write(" while (");
                self.expr(&s.test, prec::SEQ);
                self.write(");");
            }
            Stmt::Switch(s) => {
                self.write("switch (");
                self.expr(&s.discriminant, prec::SEQ);
                self.write(") {");
                self.indent += 1;
                for case in &s.cases {
                    self.newline_indent();
                    match &case.test {
                        Some(test) => {
                            self.write("case ");
                            self.expr(test, prec::SEQ);
                            self.write(":");
                        }
                        None => self.write("default:"),
                    }
                    self.indent += 1;
                    for stmt in &case.consequent {
                        self.newline_indent();
                        self.stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.newline_indent();
                self.write("}");
            }
            Stmt::Try(s) => {
                self.write("try ");
                self.block(&s.block.body);
                if let Some(handler) = &s.handler {
                    self.write(" catch ");
                    if let Some(param) = &handler.param {
                        self.write("(");
                        self.pat(param);
                        self.write(") ");
                    }
                    self.block(&handler.body.body);
                }
                if let Some(fin) = &s.finalizer {
                    self.write(" finally ");
                    self.block(&fin.body);
                }
            }
            Stmt::Return(s) => {
                self.write("return");
                if let Some(arg) = &s.argument {
                    self.write(" ");
                    self.expr(arg, prec::SEQ);
                }
                self.write(";");
            }
            Stmt::Throw(s) => {
                self.write("throw ");
                self.expr(&s.argument, prec::SEQ);
                self.write(";");
            }
            Stmt::Break(j) | Stmt::Continue(j) => {
                self.write(if matches!(stmt, Stmt::Break(_)) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = &j.label {
                    self.write(" ");
                    self.write(&label.name);
                }
                self.write(";");
            }
            Stmt::Labeled(s) => {
                self.write(&s.label.name);
                self.write(":");
                self.sub_stmt(&s.body);
            }
            Stmt::Debugger(_) => self.write("debugger;"),
            Stmt::With(s) => {
                self.write("with (");
                self.expr(&s.object, prec::SEQ);
                self.write(")");
                self.sub_stmt(&s.body);
            }
            Stmt::Empty(_) => self.write(";"),
            Stmt::Import(imp) => self.import(imp),
            Stmt::Export(e) => self.export(e),
        }
    }

    fn var_decl(&mut self, v: &VarDecl) {
        self.write(v.kind.as_str());
        self.write(" ");
        self.comma_list(&v.declarators, |p, d| {
            p.pat(&d.id);
            if let Some(init) = &d.init {
                p.write(" = ");
                p.expr(init, prec::ASSIGN);
            }
        });
    }

    fn for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Var(v) => self.var_decl(v),
            ForHead::Pat(p) => self.pat(p),
        }
    }

    fn import(&mut self, imp: &ImportDecl) {
        self.write("import ");
        if !imp.specifiers.is_empty() {
            let mut named = Vec::new();
            let mut first = true;
            for spec in &imp.specifiers {
                match spec {
                    ImportSpecifier::Default(id) => {
                        self.write(&id.name);
                        first = false;
                    }
                    ImportSpecifier::Namespace(id) => {
                        if !first {
                            self.write(", ");
                        }
                        self.write("* as ");
                        self.write(&id.name);
                        first = false;
                    }
                    ImportSpecifier::Named { imported, local } => named.push((imported, local)),
                }
            }
            if !named.is_empty() {
                if !first {
                    self.write(", ");
                }
                self.write("{ ");
                self.comma_list(&named, |p, (imported, local)| {
                    if matches!(imported, ModuleExportName::Ident(id) if id.name == local.name) {
                        p.write(&local.name);
                    } else {
                        p.module_export_name(imported);
                        p.write(" as ");
                        p.write(&local.name);
                    }
                });
                self.write(" }");
            }
            self.write(" from ");
        }
        self.string(&imp.source.value);
        self.write(";");
    }

    fn export(&mut self, export: &ExportDecl) {
        self.write("export ");
        match export {
            ExportDecl::Decl { decl, .. } => self.stmt(decl),
            ExportDecl::Named {
                specifiers, source, ..
            } => {
                if specifiers.is_empty() {
                    self.write("{}");
                } else {
                    self.write("{ ");
                    self.comma_list(specifiers, |p, spec| {
                        p.module_export_name(&spec.local);
                        if let Some(exported) = &spec.exported {
                            p.write(" as ");
                            p.module_export_name(exported);
                        }
                    });
                    self.write(" }");
                }
                if let Some(source) = source {
                    self.write(" from ");
                    self.string(&source.value);
                }
                self.write(";");
            }
            ExportDecl::All {
                exported, source, ..
            } => {
                self.write("*");
                if let Some(name) = exported {
                    self.write(" as ");
                    self.module_export_name(name);
                }
                self.write(" from ");
                self.string(&source.value);
                self.write(";");
            }
            ExportDecl::Default { value, .. } => {
                self.write("default ");
                match value {
                    ExportDefault::Fn(f) => self.function(f),
                    ExportDefault::Class(c) => self.class(c),
                    ExportDefault::Expr(e) => {
                        let text = self.capture(|p| p.expr(e, prec::ASSIGN));
                        if needs_stmt_parens(&text) {
                            self.write("(");
                            self.write(&text);
                            self.write(")");
                        } else {
                            self.write(&text);
                        }
                        self.write(";");
                    }
                }
            }
        }
    }

    fn module_export_name(&mut self, name: &ModuleExportName) {
        match name {
            ModuleExportName::Ident(id) => self.write(&id.name),
            ModuleExportName::Str(s) => self.string(&s.value),
        }
    }

    // ── Functions and classes ───────────────────────────────────────────────

    /// Declarations and expressions; methods go through [`Printer::method`].
    fn function(&mut self, f: &Function) {
        if f.is_async {
            self.write("async ");
        }
        self.write("function");
        if f.is_generator {
            self.write("*");
        }
        if let Some(id) = &f.id {
            self.write(" ");
            self.write(&id.name);
        }
        self.function_tail(f);
    }

    fn function_tail(&mut self, f: &Function) {
        self.params(&f.params);
        self.write(" ");
        let saved = std::mem::replace(&mut self.no_in, false);
        self.block(&f.body.body);
        self.no_in = saved;
    }

    fn params(&mut self, params: &[Pat]) {
        self.write("(");
        self.comma_list(params, |p, param| p.pat(param));
        self.write(")");
    }

    fn method(&mut self, kind: MethodKind, key: &PropKey, value: &Function) {
        match kind {
            MethodKind::Get => self.write("get "),
            MethodKind::Set => self.write("set "),
            MethodKind::Method | MethodKind::Constructor => {
                if value.is_async {
                    self.write("async ");
                }
                if value.is_generator {
                    self.write("*");
                }
            }
        }
        self.prop_key(key);
        self.function_tail(value);
    }

    fn class(&mut self, c: &Class) {
        self.write("class");
        if let Some(id) = &c.id {
            self.write(" ");
            self.write(&id.name);
        }
        if let Some(sup) = &c.super_class {
            self.write(" extends ");
            self.expr(sup, prec::CALL);
        }
        if c.members.is_empty() {
            self.write(" {}");
            return;
        }
        self.write(" {");
        self.indent += 1;
        let saved = std::mem::replace(&mut self.no_in, false);
        for member in &c.members {
            self.newline_indent();
            match member {
                ClassMember::Method(m) => {
                    if m.is_static {
                        self.write("static ");
                    }
                    self.method(m.kind, &m.key, &m.value);
                }
                ClassMember::Field(f) => {
                    if f.is_static {
                        self.write("static ");
                    }
                    self.prop_key(&f.key);
                    if let Some(value) = &f.value {
                        self.write(" = ");
                        self.expr(value, prec::ASSIGN);
                    }
                    self.write(";");
                }
                ClassMember::StaticBlock(s) => {
                    self.write("static ");
                    self.block(&s.body);
                }
            }
        }
        self.no_in = saved;
        self.indent -= 1;
        self.newline_indent();
        self.write("}");
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(id) => self.write(&id.name),
            PropKey::Private(id) => {
                self.write("#");
                self.write(&id.name);
            }
            PropKey::Str(s) => self.string(&s.value),
            PropKey::Num(raw) => self.write(raw),
            PropKey::Computed(e) => {
                self.write("[");
                self.expr(e, prec::ASSIGN);
                self.write("]");
            }
        }
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    fn pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(id) => self.write(&id.name),
            Pat::Array(a) => {
                self.write("[");
                self.comma_list(&a.elements, |p, el| {
                    if let Some(el) = el {
                        p.pat(el);
                    }
                });
                if matches!(a.elements.last(), Some(None)) {
                    self.write(",");
                }
                self.write("]");
            }
            Pat::Object(o) => {
                if o.properties.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                self.comma_list(&o.properties, |p, prop| match prop {
                    ObjectPatProp::KeyValue { key, value } => {
                        p.prop_key(key);
                        p.write(": ");
                        p.pat(value);
                    }
                    ObjectPatProp::Shorthand { key, default } => {
                        p.write(&key.name);
                        if let Some(d) = default {
                            p.write(" = ");
                            p.expr(d, prec::ASSIGN);
                        }
                    }
                    ObjectPatProp::Rest(r) => {
                        p.write("...");
                        p.pat(r);
                    }
                });
                self.write(" }");
            }
            Pat::Rest(r) => {
                self.write("...");
                self.pat(r);
            }
            Pat::Assign(a) => {
                self.pat(&a.left);
                self.write(" = ");
                self.expr(&a.right, prec::ASSIGN);
            }
            Pat::Expr(e) => self.expr(e, prec::CALL),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    /// Print `expr`, parenthesized when it binds looser than `min`.
    fn expr(&mut self, expr: &Expr, min: u8) {
        let needs_in_parens =
            self.no_in && matches!(expr, Expr::Binary(b) if b.op == BinaryOp::In);
        if expr_prec(expr) < min || needs_in_parens {
            self.write("(");
            let saved = std::mem::replace(&mut self.no_in, false);
            self.expr_inner(expr);
            self.no_in = saved;
            self.write(")");
        } else {
            self.expr_inner(expr);
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(id) => self.write(&id.name),
            Expr::Lit(lit) => self.lit(&lit.value),
            Expr::Template(t) => self.template(t),
            Expr::This(_) => self.write("this"),
            Expr::Super(_) => self.write("super"),
            Expr::Array(a) => {
                self.write("[");
                let saved = std::mem::replace(&mut self.no_in, false);
                self.comma_list(&a.elements, |p, el| {
                    if let Some(el) = el {
                        p.expr(el, prec::ASSIGN);
                    }
                });
                if matches!(a.elements.last(), Some(None)) {
                    self.write(",");
                }
                self.no_in = saved;
                self.write("]");
            }
            Expr::Object(o) => self.object(o),
            Expr::Fn(f) => self.function(f),
            Expr::Arrow(a) => self.arrow(a),
            Expr::Class(c) => self.class(c),
            Expr::Unary(u) => {
                let op = u.op.as_str();
                self.write(op);
                let arg = self.capture(|p| p.expr(&u.argument, prec::UNARY));
                let glue = op.chars().all(|c| c.is_ascii_alphabetic())
                    || (op == "-" && arg.starts_with('-'))
                    || (op == "+" && arg.starts_with('+'));
                if glue {
                    self.write(" ");
                }
                self.write(&arg);
            }
            Expr::Update(u) => {
                let op = if u.increment { "++" } else { "--" };
                if u.prefix {
                    self.write(op);
                    self.expr(&u.argument, prec::UNARY);
                } else {
                    self.expr(&u.argument, prec::POSTFIX);
                    self.write(op);
                }
            }
            Expr::Binary(b) => {
                let p = binary_prec(b.op);
                if b.op == BinaryOp::Exp {
                    // `**` is right-associative and rejects a bare unary base.
                    self.expr(&b.left, prec::POSTFIX);
                    self.write(" ** ");
                    self.expr(&b.right, p);
                } else {
                    self.expr(&b.left, p);
                    self.write(" ");
                    self.write(b.op.as_str());
                    self.write(" ");
                    self.expr(&b.right, p + 1);
                }
            }
            Expr::Logical(l) => {
                let p = logical_prec(l.op);
                // `??` cannot be mixed with `&&`/`||` without parentheses.
                let (left_min, right_min) = if l.op == LogicalOp::Nullish {
                    let left = if matches!(l.left.as_ref(), Expr::Logical(x) if x.op == LogicalOp::Nullish)
                    {
                        p
                    } else {
                        prec::BIT_OR
                    };
                    (left, prec::BIT_OR)
                } else {
                    let nullish = |e: &Expr| matches!(e, Expr::Logical(x) if x.op == LogicalOp::Nullish);
                    (
                        if nullish(l.left.as_ref()) { prec::BIT_OR } else { p },
                        if nullish(l.right.as_ref()) { prec::BIT_OR } else { p + 1 },
                    )
                };
                self.expr(&l.left, left_min);
                self.write(" ");
                self.write(l.op.as_str());
                self.write(" ");
                self.expr(&l.right, right_min);
            }
            Expr::Conditional(c) => {
                self.expr(&c.test, prec::NULLISH);
                self.write(" ? ");
                let saved = std::mem::replace(&mut self.no_in, false);
                self.expr(&c.consequent, prec::ASSIGN);
                self.no_in = saved;
                self.write(" : ");
                self.expr(&c.alternate, prec::ASSIGN);
            }
            Expr::Assign(a) => {
                self.pat(&a.left);
                self.write(" ");
                self.write(a.op.0);
                self.write(" ");
                self.expr(&a.right, prec::ASSIGN);
            }
            Expr::Sequence(s) => {
                self.comma_list(&s.expressions, |p, e| p.expr(e, prec::ASSIGN));
            }
            Expr::Member(m) => {
                self.member_object(&m.object);
                let saved = std::mem::replace(&mut self.no_in, false);
                match &m.property {
                    MemberProp::Ident(id) => {
                        self.write(if m.optional { "?." } else { "." });
                        self.write(&id.name);
                    }
                    MemberProp::Private(id) => {
                        self.write(if m.optional { "?.#" } else { ".#" });
                        self.write(&id.name);
                    }
                    MemberProp::Computed(e) => {
                        self.write(if m.optional { "?.[" } else { "[" });
                        self.expr(e, prec::SEQ);
                        self.write("]");
                    }
                }
                self.no_in = saved;
            }
            Expr::Call(c) => {
                self.expr(&c.callee, prec::CALL);
                if c.optional {
                    self.write("?.");
                }
                self.arguments(&c.arguments);
            }
            Expr::New(n) => {
                self.write("new ");
                if callee_contains_call(&n.callee) {
                    self.write("(");
                    self.expr_inner(&n.callee);
                    self.write(")");
                } else {
                    self.expr(&n.callee, prec::CALL);
                }
                self.arguments(&n.arguments);
            }
            Expr::TaggedTemplate(t) => {
                self.expr(&t.tag, prec::CALL);
                self.template(&t.quasi);
            }
            Expr::Spread(s) => {
                self.write("...");
                self.expr(&s.argument, prec::ASSIGN);
            }
            Expr::Yield(y) => {
                self.write(if y.delegate { "yield*" } else { "yield" });
                if let Some(arg) = &y.argument {
                    self.write(" ");
                    self.expr(arg, prec::ASSIGN);
                }
            }
            Expr::Await(a) => {
                self.write("await ");
                self.expr(&a.argument, prec::UNARY);
            }
            Expr::Import(i) => {
                self.write("import(");
                self.expr(&i.source, prec::ASSIGN);
                if let Some(opts) = &i.options {
                    self.write(", ");
                    self.expr(opts, prec::ASSIGN);
                }
                self.write(")");
            }
            Expr::MetaProp(m) => {
                self.write(m.meta);
                self.write(".");
                self.write(m.property);
            }
        }
    }

    /// The object of a member expression.  An integer literal needs
    /// parentheses so its `.` is not read as a decimal point.
    fn member_object(&mut self, object: &Expr) {
        let bare_integer = matches!(
            object,
            Expr::Lit(Lit { value: LitValue::Num { raw, .. }, .. })
                if raw.bytes().all(|b| b.is_ascii_digit() || b == b'_')
        );
        if bare_integer {
            self.write("(");
            self.expr_inner(object);
            self.write(")");
        } else {
            self.expr(object, prec::CALL);
        }
    }

    fn arguments(&mut self, args: &[Expr]) {
        self.write("(");
        let saved = std::mem::replace(&mut self.no_in, false);
        self.comma_list(args, |p, a| p.expr(a, prec::ASSIGN));
        self.no_in = saved;
        self.write(")");
    }

    fn arrow(&mut self, a: &ArrowExpr) {
        if a.is_async {
            self.write("async ");
        }
        self.params(&a.params);
        self.write(" => ");
        match &a.body {
            ArrowBody::Block(b) => {
                let saved = std::mem::replace(&mut self.no_in, false);
                self.block(&b.body);
                self.no_in = saved;
            }
            ArrowBody::Expr(e) => {
                let text = self.capture(|p| p.expr(e, prec::ASSIGN));
                if text.starts_with('{') {
                    self.write("(");
                    self.write(&text);
                    self.write(")");
                } else {
                    self.write(&text);
                }
            }
        }
    }

    fn object(&mut self, o: &ObjectExpr) {
        if o.properties.is_empty() {
            self.write("{}");
            return;
        }
        let saved = std::mem::replace(&mut self.no_in, false);
        self.write("{ ");
        self.comma_list(&o.properties, |p, prop| match prop {
            ObjectProp::KeyValue { key, value } => {
                p.prop_key(key);
                p.write(": ");
                p.expr(value, prec::ASSIGN);
            }
            ObjectProp::Shorthand(id) => p.write(&id.name),
            ObjectProp::CoverInit { key, init } => {
                p.write(&key.name);
                p.write(" = ");
                p.expr(init, prec::ASSIGN);
            }
            ObjectProp::Method { kind, key, value } => p.method(*kind, key, value),
            ObjectProp::Spread(e) => {
                p.write("...");
                p.expr(e, prec::ASSIGN);
            }
        });
        self.write(" }");
        self.no_in = saved;
    }

    fn template(&mut self, t: &TemplateLit) {
        self.write("`");
        for (i, quasi) in t.quasis.iter().enumerate() {
            self.write(&quasi.raw);
            if let Some(e) = t.expressions.get(i) {
                self.write("${");
                let saved = std::mem::replace(&mut self.no_in, false);
                self.expr(e, prec::SEQ);
                self.no_in = saved;
                self.write("}");
            }
        }
        self.write("`");
    }

    fn lit(&mut self, value: &LitValue) {
        match value {
            LitValue::Null => self.write("null"),
            LitValue::Bool(b) => self.write(if *b { "true" } else { "false" }),
            LitValue::Num { raw, .. } => self.write(raw),
            LitValue::BigInt(raw) | LitValue::Regex(raw) => self.write(raw),
            LitValue::Str(s) => self.string(s),
        }
    }

    fn string(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.write("\\\""),
                '\\' => self.write("\\\\"),
                '\n' => self.write("\\n"),
                '\r' => self.write("\\r"),
                '\t' => self.write("\\t"),
                '\u{2028}' => self.write("\\u2028"),
                '\u{2029}' => self.write("\\u2029"),
                c if (c as u32) < 0x20 => self.write(&format!("\\x{:02x}", c as u32)),
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Free helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `true` when `text` starts with `word` as a whole word.
fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.chars().next().is_some_and(is_id_continue))
}

/// An expression statement may not begin with `{`, `function`, `class`,
/// `async function`, or `let [`.
fn needs_stmt_parens(text: &str) -> bool {
    if text.starts_with('{') || starts_with_word(text, "function") || starts_with_word(text, "class")
    {
        return true;
    }
    if let Some(rest) = text.strip_prefix("async")
        && starts_with_word(text, "async")
        && starts_with_word(rest.trim_start(), "function")
    {
        return true;
    }
    text.strip_prefix("let")
        .is_some_and(|rest| rest.trim_start().starts_with('['))
}

/// `new f().x()` would bind the arguments to `f`; a callee whose member chain
/// contains a call must be wrapped.
fn callee_contains_call(expr: &Expr) -> bool {
    match expr {
        Expr::Call(_) => true,
        Expr::Member(m) => callee_contains_call(&m.object),
        Expr::TaggedTemplate(t) => callee_contains_call(&t.tag),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse_program;

    fn print(src: &str) -> String {
        to_source(&parse_program(src, SourceType::Script).unwrap())
    }

    fn print_module(src: &str) -> String {
        to_source(&parse_program(src, SourceType::Module).unwrap())
    }

    /// Printing is stable: printing the printed output changes nothing.
    fn assert_stable(src: &str) {
        let once = print(src);
        assert_eq!(print(&once), once, "unstable print of {src:?}");
    }

    // ── Statements ───────────────────────────────────────────────────────────

    #[test]
    fn test_function_indentation() {
        assert_eq!(
            print("function main(x){return function(y){return x+y}}"),
            "function main(x) {\n  return function(y) {\n    return x + y;\n  };\n}\n"
        );
    }

    #[test]
    fn test_empty_bodies() {
        assert_eq!(print("function f(){}"), "function f() {}\n");
        assert_eq!(print("class A{}"), "class A {}\n");
        assert_eq!(print("{}"), "{}\n");
    }

    #[test]
    fn test_directive_keeps_raw_quotes() {
        assert_eq!(print("'use strict'; x"), "'use strict';\nx;\n");
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            print("if (a) b(); else if (c) { d() } else e()"),
            "if (a) {\n  b();\n} else if (c) {\n  d();\n} else e();\n"
        );
        assert_eq!(
            print("for (let i = 0; i < n; i++) x(i)"),
            "for (let i = 0; i < n; i++) x(i);\n"
        );
        assert_eq!(print("for (;;) {}"), "for (;;) {}\n");
        assert_eq!(print("do x(); while (y)"), "do x(); while (y);\n");
        assert_eq!(
            print("switch (a) { case 1: b(); break; default: c() }"),
            "switch (a) {\n  case 1:\n    b();\n    break;\n  default:\n    c();\n}\n"
        );
        assert_eq!(
            print("try { a() } catch { b() } finally { c() }"),
            "try {\n  a();\n} catch {\n  b();\n} finally {\n  c();\n}\n"
        );
    }

    #[test]
    fn test_for_init_parenthesizes_in() {
        assert_eq!(
            print("for (var a = (b in c); a;) {}"),
            "for (var a = (b in c); a;) {}\n"
        );
    }

    #[test]
    fn test_modules() {
        assert_eq!(
            print_module("import a, {b as c, d} from 'm'; export {c as e}; export default 1;"),
            "import a, { b as c, d } from \"m\";\nexport { c as e };\nexport default 1;\n"
        );
        assert_eq!(
            print_module("import * as ns from 'n'; export * from 'z'; export const x = 1;"),
            "import * as ns from \"n\";\nexport * from \"z\";\nexport const x = 1;\n"
        );
    }

    #[test]
    fn test_class_members() {
        assert_eq!(
            print("class A extends B { static #x = 1; get y() { return 2 } static { z() } }"),
            "class A extends B {\n  static #x = 1;\n  get y() {\n    return 2;\n  }\n  static {\n    z();\n  }\n}\n"
        );
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(print("(a + b) * c"), "(a + b) * c;\n");
        assert_eq!(print("a + (b * c)"), "a + b * c;\n");
        assert_eq!(print("a - (b - c)"), "a - (b - c);\n");
        assert_eq!(print("(a ** b) ** c"), "(a ** b) ** c;\n");
        assert_eq!(print("a ** b ** c"), "a ** b ** c;\n");
        assert_eq!(print("(-a) ** b"), "(-a) ** b;\n");
        assert_eq!(print("(a, b) ? c : d"), "(a, b) ? c : d;\n");
        assert_eq!(print("x = (a, b)"), "x = (a, b);\n");
    }

    #[test]
    fn test_nullish_mixing() {
        assert_eq!(print("a ?? (b || c)"), "a ?? (b || c);\n");
        assert_eq!(print("(a && b) ?? c"), "(a && b) ?? c;\n");
        assert_eq!(print("a ?? b ?? c"), "a ?? b ?? c;\n");
    }

    #[test]
    fn test_unary_spacing() {
        assert_eq!(print("- -a"), "- -a;\n");
        assert_eq!(print("+ +a"), "+ +a;\n");
        assert_eq!(print("-(+a)"), "-+a;\n");
        assert_eq!(print("typeof a"), "typeof a;\n");
        assert_eq!(print("void 0"), "void 0;\n");
    }

    #[test]
    fn test_statement_start_guards() {
        assert_eq!(print("(function () {})()"), "(function() {}());\n");
        assert_eq!(print("({}).x"), "({}.x);\n");
        assert_eq!(print("(class {}).name"), "(class {}.name);\n");
        assert_eq!(print("functional()"), "functional();\n");
    }

    #[test]
    fn test_arrow_bodies() {
        assert_eq!(print("f = (a) => ({ a })"), "f = (a) => ({ a });\n");
        assert_eq!(print("f = x => y => x"), "f = (x) => (y) => x;\n");
        assert_eq!(print("f = async () => { await g(1) }"), "f = async () => {\n  await g(1);\n};\n");
    }

    #[test]
    fn test_new_and_members() {
        assert_eq!(print("new (f())()"), "new (f())();\n");
        assert_eq!(print("new a.b(c)"), "new a.b(c);\n");
        assert_eq!(print("new Foo"), "new Foo();\n");
        assert_eq!(print("(1).toString()"), "(1).toString();\n");
        assert_eq!(print("1.5.toFixed(1)"), "1.5.toFixed(1);\n");
        assert_eq!(print("a?.b?.[c]?.(d)"), "a?.b?.[c]?.(d);\n");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(print(r#"'a"b\n\u2028'"#), "\"a\\\"b\\n\\u2028\";\n");
        assert_eq!(print(r"'\0'"), "\"\\x00\";\n");
    }

    #[test]
    fn test_templates_and_literals() {
        assert_eq!(print("tag`a${b}c`"), "tag`a${b}c`;\n");
        assert_eq!(print("x = [a, , b, ,]"), "x = [a, , b, ,];\n");
        assert_eq!(print("x = /re/g.test(s)"), "x = /re/g.test(s);\n");
        assert_eq!(print("x = 10n + 0x1F"), "x = 10n + 0x1F;\n");
    }

    #[test]
    fn test_destructuring_patterns() {
        assert_eq!(
            print("const { a, b: [c, ...d], e = 1, ...f } = g"),
            "const { a, b: [c, ...d], e = 1, ...f } = g;\n"
        );
        assert_eq!(print("[a, b] = [b, a]"), "[a, b] = [b, a];\n");
        assert_eq!(print("({ a } = b)"), "({ a } = b);\n");
    }

    #[test]
    fn test_printing_is_stable() {
        for src in [
            "function main(x){return function(y){return function(z){return (add(x)(y))+z}}}",
            "label: for (const k of ks) { if (k) continue label; }",
            "var o = { get a() { return 1 }, [k]: 2, async *g() { yield 1 } };",
            "x = a ? b : c ? d : e;",
            "x = (a = 1) => a, y = async x => x;",
        ] {
            assert_stable(src);
        }
    }
}
