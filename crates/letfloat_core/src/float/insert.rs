//! Placement of hoisted declarations inside their target container.
//!
//! A container is the program's statement list, a function or static-block
//! body, or an arrow body (a concise arrow is first rewritten to a block
//! that returns its expression).  Declarations go after the leading run of
//! directives and imports, in the order they were created.

use crate::parser::ast::*;

use super::runtime::GeneratedNodes;

/// Index of the first statement after leading directives and imports.
pub fn insertion_index(stmts: &[Stmt]) -> usize {
    stmts
        .iter()
        .take_while(|s| matches!(s, Stmt::Directive(_) | Stmt::Import(_)))
        .count()
}

/// Insert `decls`, in order, at the insertion point of `stmts`.
pub fn insert_hoisted(stmts: &mut Vec<Stmt>, decls: Vec<Stmt>) {
    let at = insertion_index(stmts);
    stmts.splice(at..at, decls);
}

/// Insert into an arrow body, turning `x => expr` into
/// `x => { <decls> return expr; }` first when needed.
pub fn insert_into_arrow(arrow: &mut ArrowExpr, decls: Vec<Stmt>, nodes: &mut GeneratedNodes) {
    let placeholder = ArrowBody::Block(BlockStmt {
        node_id: nodes.mint(),
        loc: arrow.loc,
        body: Vec::new(),
    });
    let mut block = match std::mem::replace(&mut arrow.body, placeholder) {
        ArrowBody::Block(b) => b,
        ArrowBody::Expr(expr) => {
            let loc = expr.loc();
            BlockStmt {
                node_id: nodes.mint(),
                loc,
                body: vec![Stmt::Return(ReturnStmt {
                    loc,
                    argument: Some(expr),
                })],
            }
        }
    };
    insert_hoisted(&mut block.body, decls);
    arrow.body = ArrowBody::Block(block);
}

/// Insert into the program: the helper (if it must be injected) first, then
/// the declarations hoisted to the top level.
pub fn insert_into_program(body: &mut Vec<Stmt>, helper: Option<Stmt>, decls: Vec<Stmt>) {
    let all: Vec<Stmt> = helper.into_iter().chain(decls).collect();
    if !all.is_empty() {
        insert_hoisted(body, all);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::to_source;
    use crate::parser::parse::parse_program;

    fn marker(name: &str) -> Stmt {
        Stmt::Expr(ExprStmt {
            loc: SourceLocation::default(),
            expr: Box::new(Expr::Ident(Ident::synthetic(name))),
        })
    }

    #[test]
    fn test_insertion_index_skips_directives_and_imports() {
        let prog = parse_program("'use strict'; import a from 'a'; import 'b'; f(a);", SourceType::Module)
            .unwrap();
        assert_eq!(insertion_index(&prog.body), 3);
        let prog = parse_program("f(1); 'not a directive';", SourceType::Script).unwrap();
        assert_eq!(insertion_index(&prog.body), 0);
    }

    #[test]
    fn test_insert_keeps_creation_order() {
        let mut prog = parse_program("'use strict'; body();", SourceType::Script).unwrap();
        insert_hoisted(&mut prog.body, vec![marker("first"), marker("second")]);
        assert_eq!(to_source(&prog), "'use strict';\nfirst;\nsecond;\nbody();\n");
    }

    #[test]
    fn test_concise_arrow_becomes_block() {
        let mut prog = parse_program("g = (x) => x + 1;", SourceType::Script).unwrap();
        let mut nodes = GeneratedNodes::new(prog.next_node_id);
        let Stmt::Expr(e) = &mut prog.body[0] else {
            panic!("expected expression statement");
        };
        let Expr::Assign(a) = e.expr.as_mut() else {
            panic!("expected assignment");
        };
        let Expr::Arrow(arrow) = a.right.as_mut() else {
            panic!("expected arrow");
        };
        insert_into_arrow(arrow, vec![marker("hoisted")], &mut nodes);
        assert_eq!(
            to_source(&prog),
            "g = (x) => {\n  hoisted;\n  return x + 1;\n};\n"
        );
    }

    #[test]
    fn test_program_gets_helper_before_declarations() {
        let mut prog = parse_program("import z from 'z'; run(z);", SourceType::Module).unwrap();
        insert_into_program(&mut prog.body, Some(marker("helper")), vec![marker("decl")]);
        assert_eq!(
            to_source(&prog),
            "import z from \"z\";\nhelper;\ndecl;\nrun(z);\n"
        );
    }
}
