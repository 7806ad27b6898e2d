//! Readable, collision-free names for hoisted bindings.

use std::collections::{HashMap, HashSet};

use crate::config::FloatConfig;
use crate::parser::ast::{CallExpr, Expr, MemberProp};
use crate::parser::scope::ScopeId;

use super::provider::ScopeProvider;

// ─────────────────────────────────────────────────────────────────────────────
// Base hints
// ─────────────────────────────────────────────────────────────────────────────

/// Base name for a floated call: the innermost callee name followed by the
/// identifier arguments of the outermost call, joined with `_`.
///
/// `add(x)(y)` gives `add_y`; `obj.scale(k, 2, n)` gives `scale_k_n`.
pub fn call_base_hint(call: &CallExpr, config: &FloatConfig) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(name) = callee_name(&call.callee) {
        parts.push(name);
    }
    parts.extend(call.arguments.iter().filter_map(Expr::as_ident));
    sanitize(&parts.join("_"), config)
}

/// Base name for a floated declaration initializer: the declared name.
pub fn decl_base_hint(name: &str, config: &FloatConfig) -> String {
    sanitize(name, config)
}

/// Name of the function ultimately being applied, looking through curried
/// applications: `f(a)(b)(c)` names `f`.
fn callee_name(callee: &Expr) -> Option<&str> {
    match callee {
        Expr::Ident(id) => Some(&id.name),
        Expr::Member(m) => match &m.property {
            MemberProp::Ident(id) => Some(&id.name),
            MemberProp::Private(id) => Some(&id.name),
            MemberProp::Computed(_) => None,
        },
        Expr::Call(inner) => callee_name(&inner.callee),
        _ => None,
    }
}

/// Restrict to `[A-Za-z0-9_$]`, never start with a digit, never be empty.
fn sanitize(raw: &str, config: &FloatConfig) -> String {
    let mut out: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    if out.is_empty() {
        return config.fallback_base.clone();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Allocation
// ─────────────────────────────────────────────────────────────────────────────

/// Names handed out during one run, keyed by the scope that will declare
/// them.  Generated declarations do not exist in the analysed scope tree, so
/// this table is the only record of them until the run ends.
#[derive(Debug, Default)]
pub struct Reservations {
    by_scope: HashMap<ScopeId, HashSet<String>>,
}

impl Reservations {
    /// Record `name` as declared in `scope`.
    pub fn reserve(&mut self, scope: ScopeId, name: &str) {
        self.by_scope.entry(scope).or_default().insert(name.to_owned());
    }

    /// `true` when `scope` itself has reserved `name`.
    pub fn is_reserved(&self, scope: ScopeId, name: &str) -> bool {
        self.by_scope.get(&scope).is_some_and(|names| names.contains(name))
    }
}

/// Pick the first free spelling of `base` for a declaration placed in
/// `target` and referenced from `use_site`, and reserve it.
///
/// A spelling is taken when it would capture or be captured by anything:
/// a binding or ambient name visible at `target`, a reservation at `target`
/// or above, or a binding or reservation in any scope from `use_site` up to
/// but excluding `target`.
pub fn allocate<P>(
    provider: &P,
    reservations: &mut Reservations,
    config: &FloatConfig,
    base: &str,
    target: ScopeId,
    use_site: ScopeId,
) -> String
where
    P: ScopeProvider + ?Sized,
{
    let mut n = 0;
    loop {
        let candidate = config.candidate_name(base, n);
        if is_free(provider, reservations, &candidate, target, use_site) {
            reservations.reserve(target, &candidate);
            return candidate;
        }
        n += 1;
    }
}

fn is_free<P>(
    provider: &P,
    reservations: &Reservations,
    name: &str,
    target: ScopeId,
    use_site: ScopeId,
) -> bool
where
    P: ScopeProvider + ?Sized,
{
    if provider.binding_for(target, name).is_some() || provider.is_ambient(target, name) {
        return false;
    }
    let mut current = Some(target);
    while let Some(id) = current {
        if reservations.is_reserved(id, name) {
            return false;
        }
        current = provider.parent(id);
    }
    let mut current = Some(use_site);
    while let Some(id) = current {
        if id == target {
            break;
        }
        if provider.own_binding(id, name).is_some() || reservations.is_reserved(id, name) {
            return false;
        }
        current = provider.parent(id);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{SourceType, Stmt};
    use crate::parser::parse::parse_program;
    use crate::parser::scope::{ScopeTree, analyze};

    fn call_of(src: &str) -> CallExpr {
        let prog = parse_program(src, SourceType::Script).unwrap();
        let Stmt::Expr(e) = &prog.body[0] else {
            panic!("expected expression statement");
        };
        let Expr::Call(call) = e.expr.as_ref() else {
            panic!("expected call");
        };
        (**call).clone()
    }

    fn tree(src: &str) -> ScopeTree {
        analyze(&parse_program(src, SourceType::Script).unwrap()).unwrap()
    }

    fn scope_declaring(t: &ScopeTree, name: &str) -> ScopeId {
        t.scopes
            .iter()
            .find(|s| s.bindings.contains_key(name))
            .map(|s| s.id)
            .unwrap()
    }

    #[test]
    fn test_call_hints() {
        let cfg = FloatConfig::default();
        assert_eq!(call_base_hint(&call_of("add(x)(y);"), &cfg), "add_y");
        assert_eq!(call_base_hint(&call_of("obj.scale(k, 2, n);"), &cfg), "scale_k_n");
        assert_eq!(call_base_hint(&call_of("f(a)(b)(c);"), &cfg), "f_c");
        assert_eq!(call_base_hint(&call_of("(0, g)(1);"), &cfg), "fb");
        assert_eq!(call_base_hint(&call_of("o[k](v);"), &cfg), "v");
    }

    #[test]
    fn test_sanitize() {
        let cfg = FloatConfig::default();
        assert_eq!(decl_base_hint("xy", &cfg), "xy");
        assert_eq!(decl_base_hint("caf\u{e9}", &cfg), "caf");
        assert_eq!(decl_base_hint("\u{e9}", &cfg), "fb");
        assert_eq!(sanitize("9lives", &cfg), "_9lives");
        assert_eq!(sanitize("$el", &cfg), "$el");
    }

    #[test]
    fn test_allocate_skips_visible_bindings() {
        let t = tree("var add_y__fb; function f(q) { return q; }");
        let f = scope_declaring(&t, "q");
        let mut res = Reservations::default();
        let cfg = FloatConfig::default();
        assert_eq!(allocate(&t, &mut res, &cfg, "add_y", f, f), "add_y__fb_1");
    }

    #[test]
    fn test_allocate_skips_ambient_names() {
        let t = tree("function f(q) { return add_y__fb; }");
        let f = scope_declaring(&t, "q");
        let mut res = Reservations::default();
        let cfg = FloatConfig::default();
        assert_eq!(allocate(&t, &mut res, &cfg, "add_y", f, f), "add_y__fb_1");
    }

    #[test]
    fn test_allocate_reserves_and_counts_up() {
        let t = tree("function f(q) { return q; }");
        let f = scope_declaring(&t, "q");
        let mut res = Reservations::default();
        let cfg = FloatConfig::default();
        assert_eq!(allocate(&t, &mut res, &cfg, "a", f, f), "a__fb");
        assert_eq!(allocate(&t, &mut res, &cfg, "a", f, f), "a__fb_1");
        // Reserved at the root: visible from `f` as well.
        assert_eq!(allocate(&t, &mut res, &cfg, "b", t.root, t.root), "b__fb");
        assert_eq!(allocate(&t, &mut res, &cfg, "b", f, f), "b__fb_1");
    }

    #[test]
    fn test_allocate_avoids_shadowing_between_use_site_and_target() {
        let t = tree("function f(q) { return function (r) { var s__fb; return q(r); }; }");
        let f = scope_declaring(&t, "q");
        let inner = scope_declaring(&t, "r");
        let mut res = Reservations::default();
        let cfg = FloatConfig::default();
        // `s__fb` in the inner function would shadow a declaration in `f`.
        assert_eq!(allocate(&t, &mut res, &cfg, "s", f, inner), "s__fb_1");
        // The same name in an unrelated function is fine.
        res.reserve(inner, "t__fb");
        assert_eq!(allocate(&t, &mut res, &cfg, "t", f, f), "t__fb");
    }
}
