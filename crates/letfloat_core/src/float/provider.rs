//! The scope capability the float pass is written against.
//!
//! The pass never walks [`ScopeTree`] internals directly; everything it asks
//! about scopes goes through [`ScopeProvider`].  [`ScopeTree`] is the one
//! implementation.

use crate::parser::ast::NodeId;
use crate::parser::scope::{Binding, ScopeId, ScopeKind, ScopeTree};

/// Names every script can rely on without declaring them.
///
/// A name counts as ambient when nothing in the program binds it and it is
/// either referenced unresolved somewhere in the program or listed here.
pub const BUILTIN_GLOBALS: &[&str] = &[
    "undefined",
    "NaN",
    "Infinity",
    "globalThis",
    "Object",
    "Function",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Symbol",
    "BigInt",
    "Math",
    "JSON",
    "Date",
    "RegExp",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "Promise",
    "Proxy",
    "Reflect",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "console",
];

/// Read-only view of scopes and bindings.
pub trait ScopeProvider {
    /// The program (global or module) scope.
    fn root(&self) -> ScopeId;

    /// Enclosing scope, `None` for the root.
    fn parent(&self, scope: ScopeId) -> Option<ScopeId>;

    /// The binding `scope` itself declares for `name`.
    fn own_binding(&self, scope: ScopeId, name: &str) -> Option<&Binding>;

    /// `true` when `name` is unbound on the chain from `scope` and resolves
    /// to the host environment instead.
    fn is_ambient(&self, scope: ScopeId, name: &str) -> bool;

    /// `true` for the root and for function-like scopes.
    fn is_function_boundary(&self, scope: ScopeId) -> bool;

    /// `true` when name resolution inside `scope` cannot be decided
    /// statically (`with`, direct `eval`).
    fn is_dynamic(&self, scope: ScopeId) -> bool;

    /// The scope opened by the node with this id, if any.
    fn scope_of_node(&self, node: NodeId) -> Option<ScopeId>;

    /// `true` when any scope in the program declares `name`.
    fn any_binding_named(&self, name: &str) -> bool;

    // ── Derived lookups ─────────────────────────────────────────────────────

    /// Resolve `name` from `scope` outward.
    fn binding_for(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(binding) = self.own_binding(id, name) {
                return Some(binding);
            }
            current = self.parent(id);
        }
        None
    }

    /// The closest enclosing function boundary, `scope` itself included.
    fn nearest_function_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while !self.is_function_boundary(current) {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// `true` when `ancestor` is `scope` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// `true` when `scope` or any of its ancestors is dynamic.
    fn chain_is_dynamic(&self, scope: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.is_dynamic(id) {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

impl ScopeProvider for ScopeTree {
    fn root(&self) -> ScopeId {
        self.root
    }

    fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope(scope).parent
    }

    fn own_binding(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        self.scope(scope).bindings.get(name)
    }

    fn is_ambient(&self, scope: ScopeId, name: &str) -> bool {
        self.binding_for(scope, name).is_none()
            && (self.globals.contains_key(name) || BUILTIN_GLOBALS.contains(&name))
    }

    fn is_function_boundary(&self, scope: ScopeId) -> bool {
        self.scope(scope).kind.is_function_boundary()
    }

    fn is_dynamic(&self, scope: ScopeId) -> bool {
        let s = self.scope(scope);
        s.kind == ScopeKind::With || s.uses_eval
    }

    fn scope_of_node(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    fn any_binding_named(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.bindings.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceType;
    use crate::parser::parse::parse_program;
    use crate::parser::scope::analyze;

    fn tree(src: &str) -> ScopeTree {
        analyze(&parse_program(src, SourceType::Script).unwrap()).unwrap()
    }

    /// Innermost scope declaring `name`.
    fn owner(tree: &ScopeTree, name: &str) -> ScopeId {
        tree.scopes
            .iter()
            .rev()
            .find(|s| s.bindings.contains_key(name))
            .map(|s| s.id)
            .unwrap()
    }

    #[test]
    fn test_binding_for_walks_outward() {
        let t = tree("var a; function f(b) { { let c; } }");
        let c_scope = owner(&t, "c");
        assert_eq!(t.binding_for(c_scope, "b").unwrap().name, "b");
        assert_eq!(t.binding_for(c_scope, "a").unwrap().scope_id, t.root());
        assert!(t.binding_for(t.root(), "b").is_none());
    }

    #[test]
    fn test_nearest_function_scope_skips_blocks() {
        let t = tree("function f(b) { { let c; } }");
        let c_scope = owner(&t, "c");
        let f_scope = owner(&t, "b");
        assert_eq!(t.nearest_function_scope(c_scope), f_scope);
        assert_eq!(t.nearest_function_scope(t.root()), t.root());
    }

    #[test]
    fn test_is_ancestor_or_self() {
        let t = tree("function f(b) { { let c; } }");
        let c_scope = owner(&t, "c");
        let f_scope = owner(&t, "b");
        assert!(t.is_ancestor_or_self(f_scope, c_scope));
        assert!(t.is_ancestor_or_self(c_scope, c_scope));
        assert!(!t.is_ancestor_or_self(c_scope, f_scope));
    }

    #[test]
    fn test_ambient_names() {
        let t = tree("var Math2 = 1; console.log(somethingGlobal);");
        assert!(t.is_ambient(t.root(), "somethingGlobal"));
        assert!(t.is_ambient(t.root(), "undefined"));
        assert!(!t.is_ambient(t.root(), "Math2"));
        assert!(!t.is_ambient(t.root(), "neverMentioned"));
    }

    #[test]
    fn test_shadowed_builtin_is_not_ambient() {
        let t = tree("function f(Math) { return Math; }");
        let f_scope = owner(&t, "Math");
        assert!(!t.is_ambient(f_scope, "Math"));
        assert!(t.is_ambient(t.root(), "Math"));
    }

    #[test]
    fn test_dynamic_scopes() {
        let t = tree("function f(o) { with (o) { g(1); } } function h(s) { eval(s); }");
        assert!(t.scopes.iter().any(|s| s.kind == ScopeKind::With && t.is_dynamic(s.id)));
        let h_scope = owner(&t, "s");
        assert!(t.is_dynamic(h_scope));
        assert!(t.chain_is_dynamic(h_scope));
        // Direct eval taints every enclosing scope, the root included.
        let f_scope = owner(&t, "o");
        assert!(t.chain_is_dynamic(f_scope));

        let t = tree("function f(o) { { let c; } }");
        assert!(!t.chain_is_dynamic(owner(&t, "c")));
    }

    #[test]
    fn test_any_binding_named() {
        let t = tree("function f() { var deep; }");
        assert!(t.any_binding_named("deep"));
        assert!(!t.any_binding_named("shallow"));
    }
}
