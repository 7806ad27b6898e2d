//! Generated code: the memoize-once helper, hoisted declarations, and
//! accessor calls, plus recognizers for what an earlier run produced.
//!
//! The helper injected into a compiled unit is
//!
//! ```js
//! function memo__fb(producer) {
//!   var value;
//!   return function() {
//!     if (producer !== void 0) {
//!       value = producer();
//!       producer = void 0;
//!     }
//!     return value;
//!   };
//! }
//! ```
//!
//! The returned accessor has two states: pending (it still holds its
//! producer) and cached (the producer has been dropped and `value` holds the
//! result).  A producer that throws leaves the accessor pending.

use std::collections::HashSet;

use crate::config::FloatConfig;
use crate::parser::ast::*;

// ─────────────────────────────────────────────────────────────────────────────
// Node minting
// ─────────────────────────────────────────────────────────────────────────────

/// Mints node ids for generated code and remembers every id it minted, so the
/// traversal can recognize generated nodes.
#[derive(Debug)]
pub struct GeneratedNodes {
    next: u32,
    minted: HashSet<NodeId>,
}

impl GeneratedNodes {
    /// Continue numbering after a program's existing ids.
    pub fn new(next: u32) -> Self {
        Self {
            next,
            minted: HashSet::new(),
        }
    }

    /// A fresh id, recorded as generated.
    pub fn mint(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.minted.insert(id);
        id
    }

    /// `true` for ids minted here.
    pub fn contains(&self, id: NodeId) -> bool {
        self.minted.contains(&id)
    }

    /// First id not yet handed out; written back to
    /// [`Program::next_node_id`] when the run ends.
    pub fn next_id(&self) -> u32 {
        self.next
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────────────────────────

fn here() -> SourceLocation {
    SourceLocation::default()
}

fn ident_expr(name: &str) -> Expr {
    Expr::Ident(Ident::synthetic(name))
}

fn void_zero() -> Expr {
    Expr::Unary(Box::new(UnaryExpr {
        loc: here(),
        op: UnaryOp::Void,
        argument: Box::new(Expr::Lit(Lit {
            loc: here(),
            value: LitValue::Num {
                value: 0.0,
                raw: "0".to_owned(),
            },
        })),
    }))
}

fn call(callee: Expr, arguments: Vec<Expr>, nodes: &mut GeneratedNodes) -> Expr {
    Expr::Call(Box::new(CallExpr {
        node_id: nodes.mint(),
        loc: here(),
        callee: Box::new(callee),
        arguments,
        optional: false,
    }))
}

fn assign_stmt(name: &str, value: Expr) -> Stmt {
    Stmt::Expr(ExprStmt {
        loc: here(),
        expr: Box::new(Expr::Assign(Box::new(AssignExpr {
            loc: here(),
            op: AssignOp("="),
            left: Pat::Ident(Ident::synthetic(name)),
            right: Box::new(value),
        }))),
    })
}

fn return_stmt(value: Expr) -> Stmt {
    Stmt::Return(ReturnStmt {
        loc: here(),
        argument: Some(Box::new(value)),
    })
}

fn block(body: Vec<Stmt>, nodes: &mut GeneratedNodes) -> BlockStmt {
    BlockStmt {
        node_id: nodes.mint(),
        loc: here(),
        body,
    }
}

fn function(
    name: Option<&str>,
    params: &[&str],
    body: Vec<Stmt>,
    nodes: &mut GeneratedNodes,
) -> Function {
    Function {
        node_id: nodes.mint(),
        loc: here(),
        id: name.map(Ident::synthetic),
        is_async: false,
        is_generator: false,
        params: params.iter().map(|p| Pat::Ident(Ident::synthetic(*p))).collect(),
        body: block(body, nodes),
    }
}

/// `function <name>(producer) { … }`, the memoize-once helper.
pub fn helper_declaration(name: &str, nodes: &mut GeneratedNodes) -> Stmt {
    let pending = Expr::Binary(Box::new(BinaryExpr {
        loc: here(),
        op: BinaryOp::StrictNotEq,
        left: Box::new(ident_expr("producer")),
        right: Box::new(void_zero()),
    }));
    let run = vec![
        assign_stmt("value", call(ident_expr("producer"), Vec::new(), nodes)),
        assign_stmt("producer", void_zero()),
    ];
    let force = Stmt::If(IfStmt {
        loc: here(),
        test: Box::new(pending),
        consequent: Box::new(Stmt::Block(block(run, nodes))),
        alternate: None,
    });
    let accessor = function(None, &[], vec![force, return_stmt(ident_expr("value"))], nodes);
    let cache = Stmt::Var(VarDecl {
        loc: here(),
        kind: VarKind::Var,
        declarators: vec![VarDeclarator {
            node_id: nodes.mint(),
            loc: here(),
            id: Pat::Ident(Ident::synthetic("value")),
            init: None,
        }],
    });
    let body = vec![cache, return_stmt(Expr::Fn(Box::new(accessor)))];
    Stmt::FnDecl(Box::new(function(Some(name), &["producer"], body, nodes)))
}

/// `const <name> = <helper>(function () { return <value>; });`
pub fn memoized_binding(
    name: &str,
    helper: &str,
    value: Expr,
    nodes: &mut GeneratedNodes,
) -> Stmt {
    let producer = function(None, &[], vec![return_stmt(value)], nodes);
    let init = call(ident_expr(helper), vec![Expr::Fn(Box::new(producer))], nodes);
    Stmt::Var(VarDecl {
        loc: here(),
        kind: VarKind::Const,
        declarators: vec![VarDeclarator {
            node_id: nodes.mint(),
            loc: here(),
            id: Pat::Ident(Ident::synthetic(name)),
            init: Some(Box::new(init)),
        }],
    })
}

/// `<name>()`, forcing a hoisted binding.
pub fn accessor_call(name: &str, nodes: &mut GeneratedNodes) -> Expr {
    call(ident_expr(name), Vec::new(), nodes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Recognizing earlier output
// ─────────────────────────────────────────────────────────────────────────────

/// Name of a helper already declared at the top level of `program`.
pub fn existing_helper(program: &Program, config: &FloatConfig) -> Option<String> {
    program.body.iter().find_map(|stmt| match stmt {
        Stmt::FnDecl(f) => f
            .id
            .as_ref()
            .filter(|id| config.is_helper_name(&id.name))
            .map(|id| id.name.clone()),
        _ => None,
    })
}

/// `true` for `<helper>(…)`.
pub fn is_helper_call(call: &CallExpr, config: &FloatConfig) -> bool {
    call.callee
        .as_ident()
        .is_some_and(|name| config.is_helper_name(name))
}

/// `true` for `<base>__fb()` and its numbered variants.
pub fn is_accessor_call(call: &CallExpr, config: &FloatConfig) -> bool {
    call.arguments.is_empty()
        && call
            .callee
            .as_ident()
            .is_some_and(|name| config.generated_base(name).is_some())
}

/// `true` for a declarator `<base>__fb = <helper>(…)` left by an earlier run.
pub fn is_memoized_binding(name: &str, init: &Expr, config: &FloatConfig) -> bool {
    config.generated_base(name).is_some()
        && matches!(init, Expr::Call(c) if is_helper_call(c, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::to_source;
    use crate::parser::parse::parse_program;

    fn program_of(body: Vec<Stmt>) -> Program {
        Program {
            loc: SourceLocation::default(),
            source_type: SourceType::Script,
            body,
            next_node_id: 0,
        }
    }

    #[test]
    fn test_helper_source() {
        let mut nodes = GeneratedNodes::new(0);
        let helper = helper_declaration("memo__fb", &mut nodes);
        assert_eq!(
            to_source(&program_of(vec![helper])),
            "function memo__fb(producer) {\n  var value;\n  return function() {\n    \
             if (producer !== void 0) {\n      value = producer();\n      producer = void 0;\n    \
             }\n    return value;\n  };\n}\n"
        );
    }

    #[test]
    fn test_memoized_binding_source() {
        let mut nodes = GeneratedNodes::new(10);
        let value = Expr::Ident(Ident::synthetic("x"));
        let decl = memoized_binding("x__fb", "memo__fb", value, &mut nodes);
        assert_eq!(
            to_source(&program_of(vec![decl])),
            "const x__fb = memo__fb(function() {\n  return x;\n});\n"
        );
    }

    #[test]
    fn test_minted_ids_are_fresh_and_tracked() {
        let mut nodes = GeneratedNodes::new(42);
        let call = accessor_call("a__fb", &mut nodes);
        let Expr::Call(c) = &call else {
            panic!("expected call");
        };
        assert_eq!(c.node_id, NodeId(42));
        assert!(nodes.contains(NodeId(42)));
        assert!(!nodes.contains(NodeId(41)));
        assert_eq!(nodes.next_id(), 43);
    }

    #[test]
    fn test_recognizers() {
        let cfg = FloatConfig::default();
        let prog = parse_program(
            "function memo__fb_2(p) {} const a__fb = memo__fb_2(function () { return 1; }); a__fb(); g(1);",
            SourceType::Script,
        )
        .unwrap();
        assert_eq!(existing_helper(&prog, &cfg).as_deref(), Some("memo__fb_2"));

        let Stmt::Var(v) = &prog.body[1] else {
            panic!("expected declaration");
        };
        let init = v.declarators[0].init.as_deref().unwrap();
        assert!(is_memoized_binding("a__fb", init, &cfg));
        assert!(!is_memoized_binding("a", init, &cfg));

        let calls: Vec<&CallExpr> = prog.body[2..]
            .iter()
            .filter_map(|s| match s {
                Stmt::Expr(e) => match e.expr.as_ref() {
                    Expr::Call(c) => Some(c.as_ref()),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert!(is_accessor_call(calls[0], &cfg));
        assert!(!is_accessor_call(calls[1], &cfg));
        assert!(!is_helper_call(calls[1], &cfg));
    }
}
