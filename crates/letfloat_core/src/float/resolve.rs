//! Target-scope resolution: how far out may a computation move?
//!
//! Starting from the function that contains the use site, the walk widens one
//! function boundary at a time and keeps the last scope in which every free
//! variable still means what it meant at the use site.

use tracing::trace;

use crate::parser::scope::{Binding, ScopeId};

use super::provider::ScopeProvider;

/// The outermost function (or root) scope into which a computation with
/// `free_vars`, evaluated at `use_site`, can move unchanged.
///
/// Returns `None` when the use site sits under dynamic name resolution or one
/// of the names cannot be resolved at all.
pub fn resolve<P>(provider: &P, free_vars: &[String], use_site: ScopeId) -> Option<ScopeId>
where
    P: ScopeProvider + ?Sized,
{
    if provider.chain_is_dynamic(use_site) {
        trace!(use_site, "dynamic scope on the chain");
        return None;
    }
    if free_vars.is_empty() {
        return Some(provider.root());
    }

    let mut resolved: Vec<(&str, Option<&Binding>)> = Vec::with_capacity(free_vars.len());
    for name in free_vars {
        let binding = provider.binding_for(use_site, name);
        if binding.is_none() && !provider.is_ambient(use_site, name) {
            trace!(name = %name, use_site, "unresolvable name");
            return None;
        }
        resolved.push((name.as_str(), binding));
    }

    let mut accepted = provider.nearest_function_scope(use_site);
    while let Some(parent) = provider.parent(accepted) {
        let wider = provider.nearest_function_scope(parent);
        let visible = resolved.iter().all(|&(name, binding)| match binding {
            Some(b) => provider.is_ancestor_or_self(b.scope_id, wider),
            None => provider.is_ambient(wider, name),
        });
        if !visible {
            trace!(accepted, rejected = wider, "stopped widening");
            break;
        }
        trace!(from = accepted, to = wider, "widened");
        accepted = wider;
    }
    Some(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceType;
    use crate::parser::parse::parse_program;
    use crate::parser::scope::{ScopeTree, analyze};

    fn tree(src: &str) -> ScopeTree {
        analyze(&parse_program(src, SourceType::Script).unwrap()).unwrap()
    }

    /// The function scope whose parameter list declares `param`.
    fn scope_of_param(t: &ScopeTree, param: &str) -> ScopeId {
        t.scopes
            .iter()
            .find(|s| s.bindings.get(param).is_some_and(|b| b.kind == crate::parser::scope::BindingKind::Param))
            .map(|s| s.id)
            .unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const CURRIED: &str = "function add(x) { return function (y) { return x + y; }; }
        function main(x) { return function (y) { return function (z) { return add(x)(y) + z; }; }; }";

    #[test]
    fn test_curried_call_moves_to_the_closure_of_its_last_argument() {
        let t = tree(CURRIED);
        let z = scope_of_param(&t, "z");
        let y = t.scope(z).parent.unwrap();
        assert_eq!(resolve(&t, &names(&["add", "x", "y"]), z), Some(y));
    }

    #[test]
    fn test_outer_only_names_move_further() {
        let t = tree(CURRIED);
        let z = scope_of_param(&t, "z");
        let y = t.scope(z).parent.unwrap();
        let main = t.scope(y).parent.unwrap();
        assert_eq!(resolve(&t, &names(&["add", "x"]), z), Some(main));
        assert_eq!(resolve(&t, &names(&["add"]), z), Some(t.root));
    }

    #[test]
    fn test_no_free_variables_goes_to_root() {
        let t = tree(CURRIED);
        let z = scope_of_param(&t, "z");
        assert_eq!(resolve(&t, &[], z), Some(t.root));
    }

    #[test]
    fn test_local_binding_pins_to_use_site_function() {
        let t = tree(CURRIED);
        let z = scope_of_param(&t, "z");
        assert_eq!(resolve(&t, &names(&["z"]), z), Some(z));
    }

    #[test]
    fn test_block_binding_blocks_widening() {
        let t = tree("function f(a) { { let b = 1; return function (c) { return g(b)(c); }; } }");
        let c = scope_of_param(&t, "c");
        // `b` lives in a block of `f`, so the `c` closure is as far as it goes.
        assert_eq!(resolve(&t, &names(&["g", "b"]), c), Some(c));
    }

    #[test]
    fn test_globals_are_visible_everywhere() {
        let t = tree("function f(a) { return function (b) { return Math.max(a, glob); }; }");
        let b = scope_of_param(&t, "b");
        let f = scope_of_param(&t, "a");
        assert_eq!(resolve(&t, &names(&["Math", "a", "glob"]), b), Some(f));
    }

    #[test]
    fn test_dynamic_scope_is_never_resolved() {
        let t = tree("function f(o) { with (o) { (function (q) { return g(q); }); } }");
        let q = scope_of_param(&t, "q");
        assert_eq!(resolve(&t, &names(&["g"]), q), None);

        let t = tree("function f(s) { eval(s); return function (q) { return g(q); }; }");
        let q = scope_of_param(&t, "q");
        assert_eq!(resolve(&t, &names(&["g"]), q), None);
    }

    #[test]
    fn test_unknown_name_is_unresolvable() {
        let t = tree("function f(a) { return a; }");
        let f = scope_of_param(&t, "a");
        assert_eq!(resolve(&t, &names(&["neverMentioned"]), f), None);
    }
}
