//! Recursive-descent parser producing the owned [`ast`](crate::parser::ast).
//!
//! The parser pulls one token at a time from the [`Scanner`].  Lookahead is a
//! clone of the scanner, and arrow-function heads are recognised by a bounded
//! trial parse that rewinds on failure.  Destructuring assignment targets are
//! parsed as expressions and reinterpreted as patterns once the `=` is seen.

use crate::error::{LetFloatError, LetFloatResult};
use crate::parser::ast::*;
use crate::parser::scanner::{Position, Scanner, Span, Token, TokenKind, TokenValue, cook_template};

/// Parse `source` as a complete script or module.
///
/// # Errors
///
/// Returns [`LetFloatError::SyntaxError`] for the first lexical or grammatical
/// error, positioned at the offending token.
pub fn parse_program(source: &str, source_type: SourceType) -> LetFloatResult<Program> {
    let mut parser = Parser::new(source, source_type)?;
    let body = parser.parse_body(TokenKind::Eof)?;
    let end = parser.tok.span.end;
    Ok(Program {
        loc: Span {
            start: Position {
                offset: 0,
                line: 1,
                column: 1,
            },
            end,
        },
        source_type,
        body,
        next_node_id: parser.next_id,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser state
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to rewind after a failed trial parse.
#[derive(Clone)]
struct Checkpoint<'src> {
    scanner: Scanner<'src>,
    tok: Token,
    prev_end: Position,
    next_id: u32,
    in_async: bool,
    in_generator: bool,
    allow_in: bool,
    depth: u32,
}

/// Deepest statement or expression nesting the parser accepts.  Every later
/// pass walks the tree recursively, so the limit also bounds their stack use.
const MAX_NESTING_DEPTH: u32 = 500;

struct Parser<'src> {
    scanner: Scanner<'src>,
    source: &'src str,
    source_type: SourceType,
    /// Current (not yet consumed) token.
    tok: Token,
    /// End of the most recently consumed token.
    prev_end: Position,
    next_id: u32,
    in_async: bool,
    in_generator: bool,
    /// `false` while parsing a `for` head, where `in` ends the initializer.
    allow_in: bool,
    /// Current nesting level, see [`MAX_NESTING_DEPTH`].
    depth: u32,
}

/// Binary operators as seen by precedence climbing.
#[derive(Clone, Copy)]
enum InfixOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, source_type: SourceType) -> LetFloatResult<Self> {
        let mut scanner = Scanner::new(source);
        let tok = scanner.next_token()?;
        Ok(Self {
            scanner,
            source,
            source_type,
            tok,
            prev_end: Position::default(),
            next_id: 0,
            in_async: source_type == SourceType::Module,
            in_generator: false,
            allow_in: true,
            depth: 0,
        })
    }

    // ── Token helpers ───────────────────────────────────────────────────────

    fn advance(&mut self) -> LetFloatResult<Token> {
        let next = self.scanner.next_token()?;
        self.prev_end = self.tok.span.end;
        Ok(std::mem::replace(&mut self.tok, next))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.tok.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> LetFloatResult<bool> {
        if self.at(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> LetFloatResult<Token> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_ident(&mut self, word: &str) -> LetFloatResult<()> {
        if self.tok.is_ident(word) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error_here(format!("expected '{word}'")))
        }
    }

    fn peek(&self) -> LetFloatResult<Token> {
        self.scanner.clone().next_token()
    }

    fn slice(&self, span: Span) -> &'src str {
        &self.source[span.start.offset..span.end.offset]
    }

    fn loc_from(&self, start: Position) -> SourceLocation {
        Span {
            start,
            end: self.prev_end,
        }
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn error_here(&self, message: impl Into<String>) -> LetFloatError {
        let pos = self.tok.span.start;
        LetFloatError::syntax(message, pos.line, pos.column)
    }

    fn error_at(&self, loc: SourceLocation, message: impl Into<String>) -> LetFloatError {
        LetFloatError::syntax(message, loc.start.line, loc.start.column)
    }

    fn unexpected(&self) -> LetFloatError {
        if self.at(TokenKind::Eof) {
            self.error_here("unexpected end of input")
        } else {
            self.error_here(format!("unexpected token '{}'", self.slice(self.tok.span)))
        }
    }

    /// Automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> LetFloatResult<()> {
        if self.eat(TokenKind::Semicolon)? {
            return Ok(());
        }
        if matches!(self.tok.kind, TokenKind::RightBrace | TokenKind::Eof)
            || self.tok.had_line_terminator_before
        {
            return Ok(());
        }
        Err(self.unexpected())
    }

    // ── Backtracking ────────────────────────────────────────────────────────

    fn checkpoint(&self) -> Checkpoint<'src> {
        Checkpoint {
            scanner: self.scanner.clone(),
            tok: self.tok.clone(),
            prev_end: self.prev_end,
            next_id: self.next_id,
            in_async: self.in_async,
            in_generator: self.in_generator,
            allow_in: self.allow_in,
            depth: self.depth,
        }
    }

    fn rewind(&mut self, cp: Checkpoint<'src>) {
        self.scanner = cp.scanner;
        self.tok = cp.tok;
        self.prev_end = cp.prev_end;
        self.next_id = cp.next_id;
        self.in_async = cp.in_async;
        self.in_generator = cp.in_generator;
        self.allow_in = cp.allow_in;
        self.depth = cp.depth;
    }

    /// Run `f`; on failure rewind to where we started and return `None`.
    fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> LetFloatResult<T>,
    ) -> LetFloatResult<Option<T>> {
        let cp = self.checkpoint();
        match f(self) {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                self.rewind(cp);
                Ok(None)
            }
        }
    }

    /// Run `f` with `allow_in` set to `allow`, restoring it afterwards.
    fn with_in<T>(
        &mut self,
        allow: bool,
        f: impl FnOnce(&mut Self) -> LetFloatResult<T>,
    ) -> LetFloatResult<T> {
        let saved = std::mem::replace(&mut self.allow_in, allow);
        let result = f(self);
        self.allow_in = saved;
        result
    }

    /// Run `f` inside a function context with the given async/generator
    /// flags.
    fn in_function<T>(
        &mut self,
        is_async: bool,
        is_generator: bool,
        f: impl FnOnce(&mut Self) -> LetFloatResult<T>,
    ) -> LetFloatResult<T> {
        let saved = (self.in_async, self.in_generator, self.allow_in);
        self.in_async = is_async;
        self.in_generator = is_generator;
        self.allow_in = true;
        let result = f(self);
        (self.in_async, self.in_generator, self.allow_in) = saved;
        result
    }

    // ── Nesting ─────────────────────────────────────────────────────────────

    fn enter_nesting(&mut self) -> LetFloatResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here("nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> LetFloatResult<T>,
    ) -> LetFloatResult<T> {
        self.enter_nesting()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ── Names ───────────────────────────────────────────────────────────────

    /// The current token's text if it can serve as an IdentifierName
    /// (identifiers and reserved words).
    fn identifier_name(&self) -> Option<String> {
        match self.tok.kind {
            TokenKind::Identifier => Some(self.tok.text().to_owned()),
            k if k.is_keyword() => Some(self.slice(self.tok.span).to_owned()),
            _ => None,
        }
    }

    fn parse_identifier_name(&mut self) -> LetFloatResult<Ident> {
        let Some(name) = self.identifier_name() else {
            return Err(self.error_here("expected identifier name"));
        };
        let tok = self.advance()?;
        Ok(Ident {
            loc: tok.span,
            name,
        })
    }

    fn parse_binding_ident(&mut self) -> LetFloatResult<Ident> {
        if !self.at(TokenKind::Identifier) {
            return Err(if self.tok.kind.is_keyword() {
                self.error_here(format!(
                    "unexpected reserved word '{}'",
                    self.slice(self.tok.span)
                ))
            } else {
                self.error_here("expected identifier")
            });
        }
        let tok = self.advance()?;
        Ok(Ident {
            loc: tok.span,
            name: tok.text().to_owned(),
        })
    }

    fn parse_string_lit(&mut self) -> LetFloatResult<StringLit> {
        let tok = self.expect(TokenKind::StringLiteral)?;
        Ok(StringLit {
            loc: tok.span,
            value: tok.text().to_owned(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    /// A statement list with a leading directive prologue.
    fn parse_body(&mut self, end: TokenKind) -> LetFloatResult<Vec<Stmt>> {
        let mut body = Vec::new();
        while self.at(TokenKind::StringLiteral) {
            let string_span = self.tok.span;
            let stmt = self.parse_statement()?;
            let is_directive = matches!(
                &stmt,
                Stmt::Expr(es) if matches!(
                    es.expr.as_ref(),
                    Expr::Lit(Lit { loc, value: LitValue::Str(_) }) if *loc == string_span
                )
            );
            if !is_directive {
                body.push(stmt);
                break;
            }
            body.push(Stmt::Directive(Directive {
                loc: stmt.loc(),
                raw: self.slice(string_span).to_owned(),
            }));
        }
        body.extend(self.parse_statements(end)?);
        Ok(body)
    }

    fn parse_statements(&mut self, end: TokenKind) -> LetFloatResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.at(end) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected());
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> LetFloatResult<Stmt> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        match self.tok.kind {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Var => self.parse_var_statement(VarKind::Var),
            TokenKind::Const => self.parse_var_statement(VarKind::Const),
            TokenKind::Identifier if self.tok.is_ident("let") && self.let_starts_declaration()? => {
                self.parse_var_statement(VarKind::Let)
            }
            TokenKind::Function => Ok(Stmt::FnDecl(Box::new(self.parse_function(start, false, true)?))),
            TokenKind::Identifier if self.at_async_function()? => {
                self.advance()?;
                Ok(Stmt::FnDecl(Box::new(self.parse_function(start, true, true)?)))
            }
            TokenKind::Class => Ok(Stmt::ClassDecl(Box::new(self.parse_class(true)?))),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => {
                self.advance()?;
                let test = self.parse_paren_expression()?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While(WhileStmt {
                    loc: self.loc_from(start),
                    test,
                    body,
                }))
            }
            TokenKind::Do => {
                self.advance()?;
                let body = Box::new(self.parse_statement()?);
                self.expect(TokenKind::While)?;
                let test = self.parse_paren_expression()?;
                self.eat(TokenKind::Semicolon)?;
                Ok(Stmt::DoWhile(DoWhileStmt {
                    loc: self.loc_from(start),
                    body,
                    test,
                }))
            }
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Return => {
                self.advance()?;
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(ReturnStmt {
                    loc: self.loc_from(start),
                    argument,
                }))
            }
            TokenKind::Throw => {
                self.advance()?;
                if self.tok.had_line_terminator_before {
                    return Err(self.error_here("illegal newline after throw"));
                }
                let argument = Box::new(self.parse_expression()?);
                self.consume_semicolon()?;
                Ok(Stmt::Throw(ThrowStmt {
                    loc: self.loc_from(start),
                    argument,
                }))
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.advance()?.kind == TokenKind::Break;
                let label = if self.at(TokenKind::Identifier) && !self.tok.had_line_terminator_before {
                    Some(self.parse_binding_ident()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                let jump = JumpStmt {
                    loc: self.loc_from(start),
                    label,
                };
                Ok(if is_break {
                    Stmt::Break(jump)
                } else {
                    Stmt::Continue(jump)
                })
            }
            TokenKind::Debugger => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Stmt::Debugger(self.loc_from(start)))
            }
            TokenKind::With => {
                self.advance()?;
                let node_id = self.next_node_id();
                let object = self.parse_paren_expression()?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::With(WithStmt {
                    node_id,
                    loc: self.loc_from(start),
                    object,
                    body,
                }))
            }
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::Empty(self.loc_from(start)))
            }
            TokenKind::Import if !self.import_is_expression()? => {
                if self.source_type != SourceType::Module {
                    return Err(self.error_here("import declarations may only appear in a module"));
                }
                self.parse_import()
            }
            TokenKind::Export => {
                if self.source_type != SourceType::Module {
                    return Err(self.error_here("export declarations may only appear in a module"));
                }
                self.parse_export()
            }
            TokenKind::Identifier if self.peek()?.kind == TokenKind::Colon => {
                let label = self.parse_binding_ident()?;
                self.expect(TokenKind::Colon)?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::Labeled(LabeledStmt {
                    loc: self.loc_from(start),
                    label,
                    body,
                }))
            }
            _ => {
                let expr = Box::new(self.parse_expression()?);
                self.consume_semicolon()?;
                Ok(Stmt::Expr(ExprStmt {
                    loc: self.loc_from(start),
                    expr,
                }))
            }
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.tok.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) || self.tok.had_line_terminator_before
    }

    /// `let` begins a declaration when followed by a binding name or pattern.
    fn let_starts_declaration(&self) -> LetFloatResult<bool> {
        let next = self.peek()?;
        Ok(matches!(
            next.kind,
            TokenKind::Identifier | TokenKind::LeftBracket | TokenKind::LeftBrace
        ))
    }

    fn at_async_function(&self) -> LetFloatResult<bool> {
        if !self.tok.is_ident("async") {
            return Ok(false);
        }
        let next = self.peek()?;
        Ok(next.kind == TokenKind::Function && !next.had_line_terminator_before)
    }

    fn import_is_expression(&self) -> LetFloatResult<bool> {
        let next = self.peek()?;
        Ok(matches!(next.kind, TokenKind::LeftParen | TokenKind::Dot))
    }

    fn parse_block(&mut self) -> LetFloatResult<BlockStmt> {
        let start = self.tok.span.start;
        let node_id = self.next_node_id();
        self.expect(TokenKind::LeftBrace)?;
        let body = self.parse_statements(TokenKind::RightBrace)?;
        self.expect(TokenKind::RightBrace)?;
        Ok(BlockStmt {
            node_id,
            loc: self.loc_from(start),
            body,
        })
    }

    fn parse_paren_expression(&mut self) -> LetFloatResult<Box<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let expr = self.with_in(true, |p| p.parse_expression())?;
        self.expect(TokenKind::RightParen)?;
        Ok(Box::new(expr))
    }

    fn parse_var_statement(&mut self, kind: VarKind) -> LetFloatResult<Stmt> {
        let decl = self.parse_var_decl(kind)?;
        self.consume_semicolon()?;
        Ok(Stmt::Var(VarDecl {
            loc: self.loc_from(decl.loc.start),
            ..decl
        }))
    }

    /// `var|let|const` declarators, without the terminating semicolon.
    fn parse_var_decl(&mut self, kind: VarKind) -> LetFloatResult<VarDecl> {
        let start = self.tok.span.start;
        self.advance()?;
        let mut declarators = Vec::new();
        loop {
            let dstart = self.tok.span.start;
            let node_id = self.next_node_id();
            let id = self.parse_binding_target()?;
            let init = if self.eat(TokenKind::Equal)? {
                Some(Box::new(self.parse_assign()?))
            } else {
                None
            };
            declarators.push(VarDeclarator {
                node_id,
                loc: self.loc_from(dstart),
                id,
                init,
            });
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        Ok(VarDecl {
            loc: self.loc_from(start),
            kind,
            declarators,
        })
    }

    fn parse_if(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        self.advance()?;
        let test = self.parse_paren_expression()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            loc: self.loc_from(start),
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_for(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        self.advance()?;
        let node_id = self.next_node_id();
        let is_await = if self.tok.is_ident("await") && self.in_async {
            self.advance()?;
            true
        } else {
            false
        };
        self.expect(TokenKind::LeftParen)?;

        // Head: declaration, expression, or nothing.
        let decl_kind = match self.tok.kind {
            TokenKind::Var => Some(VarKind::Var),
            TokenKind::Const => Some(VarKind::Const),
            TokenKind::Identifier if self.tok.is_ident("let") && self.let_starts_declaration()? => {
                Some(VarKind::Let)
            }
            _ => None,
        };
        let init = if let Some(kind) = decl_kind {
            Some(ForInit::Var(self.with_in(false, |p| p.parse_var_decl(kind))?))
        } else if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(ForInit::Expr(Box::new(
                self.with_in(false, |p| p.parse_expression())?,
            )))
        };

        let is_of = self.tok.is_ident("of");
        if is_of || self.at(TokenKind::In) {
            let left = match init {
                Some(ForInit::Var(decl)) => {
                    if decl.declarators.len() != 1 {
                        return Err(self.error_at(decl.loc, "invalid left-hand side in for loop"));
                    }
                    ForHead::Var(decl)
                }
                Some(ForInit::Expr(expr)) => ForHead::Pat(self.expr_to_pat(*expr)?),
                None => return Err(self.unexpected()),
            };
            self.advance()?;
            let right = Box::new(if is_of {
                self.with_in(true, |p| p.parse_assign())?
            } else {
                self.with_in(true, |p| p.parse_expression())?
            });
            self.expect(TokenKind::RightParen)?;
            let body = Box::new(self.parse_statement()?);
            let loc = self.loc_from(start);
            return Ok(if is_of {
                Stmt::ForOf(Box::new(ForOfStmt {
                    node_id,
                    loc,
                    is_await,
                    left,
                    right,
                    body,
                }))
            } else {
                Stmt::ForIn(Box::new(ForInStmt {
                    node_id,
                    loc,
                    left,
                    right,
                    body,
                }))
            });
        }

        self.expect(TokenKind::Semicolon)?;
        let test = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.with_in(true, |p| p.parse_expression())?))
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.at(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.with_in(true, |p| p.parse_expression())?))
        };
        self.expect(TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For(Box::new(ForStmt {
            node_id,
            loc: self.loc_from(start),
            init,
            test,
            update,
            body,
        })))
    }

    fn parse_switch(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        self.advance()?;
        let node_id = self.next_node_id();
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenKind::LeftBrace)?;
        let mut cases = Vec::new();
        while !self.eat(TokenKind::RightBrace)? {
            let cstart = self.tok.span.start;
            let test = if self.eat(TokenKind::Case)? {
                Some(self.with_in(true, |p| p.parse_expression())?)
            } else {
                self.expect(TokenKind::Default)?;
                None
            };
            self.expect(TokenKind::Colon)?;
            let mut consequent = Vec::new();
            while !matches!(
                self.tok.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace
            ) {
                if self.at(TokenKind::Eof) {
                    return Err(self.unexpected());
                }
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase {
                loc: self.loc_from(cstart),
                test,
                consequent,
            });
        }
        Ok(Stmt::Switch(SwitchStmt {
            node_id,
            loc: self.loc_from(start),
            discriminant,
            cases,
        }))
    }

    fn parse_try(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        self.advance()?;
        let block = self.parse_block()?;
        let handler = if self.at(TokenKind::Catch) {
            let cstart = self.tok.span.start;
            self.advance()?;
            let node_id = self.next_node_id();
            let param = if self.eat(TokenKind::LeftParen)? {
                let param = self.parse_binding_target()?;
                self.expect(TokenKind::RightParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                node_id,
                loc: self.loc_from(cstart),
                param,
                body,
            })
        } else {
            None
        };
        let finalizer = if self.eat(TokenKind::Finally)? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("missing catch or finally after try"));
        }
        Ok(Stmt::Try(Box::new(TryStmt {
            loc: self.loc_from(start),
            block,
            handler,
            finalizer,
        })))
    }

    // ── Module declarations ─────────────────────────────────────────────────

    fn parse_module_export_name(&mut self) -> LetFloatResult<ModuleExportName> {
        if self.at(TokenKind::StringLiteral) {
            Ok(ModuleExportName::Str(self.parse_string_lit()?))
        } else {
            Ok(ModuleExportName::Ident(self.parse_identifier_name()?))
        }
    }

    fn parse_import(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        self.expect(TokenKind::Import)?;
        let mut specifiers = Vec::new();
        if !self.at(TokenKind::StringLiteral) {
            if self.at(TokenKind::Identifier) {
                specifiers.push(ImportSpecifier::Default(self.parse_binding_ident()?));
                if !self.eat(TokenKind::Comma)? {
                    self.expect_ident("from")?;
                    return self.finish_import(start, specifiers);
                }
            }
            if self.eat(TokenKind::Star)? {
                self.expect_ident("as")?;
                specifiers.push(ImportSpecifier::Namespace(self.parse_binding_ident()?));
            } else {
                self.expect(TokenKind::LeftBrace)?;
                while !self.eat(TokenKind::RightBrace)? {
                    let imported = self.parse_module_export_name()?;
                    let local = if self.tok.is_ident("as") {
                        self.advance()?;
                        self.parse_binding_ident()?
                    } else {
                        match &imported {
                            ModuleExportName::Ident(id) if keyword_free(id) => id.clone(),
                            _ => return Err(self.error_here("expected 'as'")),
                        }
                    };
                    specifiers.push(ImportSpecifier::Named { imported, local });
                    if !self.eat(TokenKind::Comma)? {
                        self.expect(TokenKind::RightBrace)?;
                        break;
                    }
                }
            }
            self.expect_ident("from")?;
        }
        self.finish_import(start, specifiers)
    }

    fn finish_import(
        &mut self,
        start: Position,
        specifiers: Vec<ImportSpecifier>,
    ) -> LetFloatResult<Stmt> {
        let source = self.parse_string_lit()?;
        if self.at(TokenKind::With) {
            return Err(self.error_here("import attributes are not supported"));
        }
        self.consume_semicolon()?;
        Ok(Stmt::Import(ImportDecl {
            loc: self.loc_from(start),
            specifiers,
            source,
        }))
    }

    fn parse_export(&mut self) -> LetFloatResult<Stmt> {
        let start = self.tok.span.start;
        self.expect(TokenKind::Export)?;
        let export = match self.tok.kind {
            TokenKind::Default => {
                self.advance()?;
                let dstart = self.tok.span.start;
                let value = if self.at(TokenKind::Function) {
                    ExportDefault::Fn(Box::new(self.parse_function(dstart, false, false)?))
                } else if self.at_async_function()? {
                    self.advance()?;
                    ExportDefault::Fn(Box::new(self.parse_function(dstart, true, false)?))
                } else if self.at(TokenKind::Class) {
                    ExportDefault::Class(Box::new(self.parse_class(false)?))
                } else {
                    let expr = self.with_in(true, |p| p.parse_assign())?;
                    self.consume_semicolon()?;
                    ExportDefault::Expr(Box::new(expr))
                };
                ExportDecl::Default {
                    loc: self.loc_from(start),
                    value,
                }
            }
            TokenKind::Star => {
                self.advance()?;
                let exported = if self.tok.is_ident("as") {
                    self.advance()?;
                    Some(self.parse_module_export_name()?)
                } else {
                    None
                };
                self.expect_ident("from")?;
                let source = self.parse_string_lit()?;
                self.consume_semicolon()?;
                ExportDecl::All {
                    loc: self.loc_from(start),
                    exported,
                    source,
                }
            }
            TokenKind::LeftBrace => {
                self.advance()?;
                let mut specifiers = Vec::new();
                while !self.eat(TokenKind::RightBrace)? {
                    let local = self.parse_module_export_name()?;
                    let exported = if self.tok.is_ident("as") {
                        self.advance()?;
                        Some(self.parse_module_export_name()?)
                    } else {
                        None
                    };
                    specifiers.push(ExportSpecifier { local, exported });
                    if !self.eat(TokenKind::Comma)? {
                        self.expect(TokenKind::RightBrace)?;
                        break;
                    }
                }
                let source = if self.tok.is_ident("from") {
                    self.advance()?;
                    Some(self.parse_string_lit()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                ExportDecl::Named {
                    loc: self.loc_from(start),
                    specifiers,
                    source,
                }
            }
            _ => {
                let decl = match self.tok.kind {
                    TokenKind::Var
                    | TokenKind::Const
                    | TokenKind::Function
                    | TokenKind::Class => self.parse_statement()?,
                    TokenKind::Identifier
                        if self.tok.is_ident("let") || self.at_async_function()? =>
                    {
                        self.parse_statement()?
                    }
                    _ => return Err(self.unexpected()),
                };
                ExportDecl::Decl {
                    loc: self.loc_from(start),
                    decl: Box::new(decl),
                }
            }
        };
        Ok(Stmt::Export(export))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Functions and classes
    // ─────────────────────────────────────────────────────────────────────

    /// Parse from the `function` keyword.  `start` points at `async` when
    /// present (the caller has already consumed it).
    fn parse_function(
        &mut self,
        start: Position,
        is_async: bool,
        name_required: bool,
    ) -> LetFloatResult<Function> {
        self.expect(TokenKind::Function)?;
        let is_generator = self.eat(TokenKind::Star)?;
        let id = if self.at(TokenKind::Identifier) {
            Some(self.parse_binding_ident()?)
        } else if name_required {
            return Err(self.error_here("function declarations require a name"));
        } else {
            None
        };
        self.parse_function_rest(start, id, is_async, is_generator)
    }

    /// Parameters and body of any non-arrow function.
    fn parse_function_rest(
        &mut self,
        start: Position,
        id: Option<Ident>,
        is_async: bool,
        is_generator: bool,
    ) -> LetFloatResult<Function> {
        let node_id = self.next_node_id();
        let (params, body) = self.in_function(is_async, is_generator, |p| {
            let params = p.parse_formal_params()?;
            let body = p.parse_function_body()?;
            Ok((params, body))
        })?;
        Ok(Function {
            node_id,
            loc: self.loc_from(start),
            id,
            is_async,
            is_generator,
            params,
            body,
        })
    }

    fn parse_formal_params(&mut self) -> LetFloatResult<Vec<Pat>> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        while !self.eat(TokenKind::RightParen)? {
            if self.eat(TokenKind::DotDotDot)? {
                params.push(Pat::Rest(Box::new(self.parse_binding_target()?)));
                self.expect(TokenKind::RightParen)?;
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.eat(TokenKind::Comma)? {
                self.expect(TokenKind::RightParen)?;
                break;
            }
        }
        Ok(params)
    }

    fn parse_function_body(&mut self) -> LetFloatResult<BlockStmt> {
        let start = self.tok.span.start;
        let node_id = self.next_node_id();
        self.expect(TokenKind::LeftBrace)?;
        let body = self.parse_body(TokenKind::RightBrace)?;
        self.expect(TokenKind::RightBrace)?;
        Ok(BlockStmt {
            node_id,
            loc: self.loc_from(start),
            body,
        })
    }

    fn parse_class(&mut self, name_required: bool) -> LetFloatResult<Class> {
        let start = self.tok.span.start;
        self.expect(TokenKind::Class)?;
        let node_id = self.next_node_id();
        let id = if self.at(TokenKind::Identifier) {
            Some(self.parse_binding_ident()?)
        } else if name_required {
            return Err(self.error_here("class declarations require a name"));
        } else {
            None
        };
        let super_class = if self.eat(TokenKind::Extends)? {
            Some(Box::new(self.nested(Self::parse_lhs)?))
        } else {
            None
        };
        self.expect(TokenKind::LeftBrace)?;
        let mut members = Vec::new();
        while !self.eat(TokenKind::RightBrace)? {
            if self.eat(TokenKind::Semicolon)? {
                continue;
            }
            members.push(self.parse_class_member()?);
        }
        Ok(Class {
            node_id,
            loc: self.loc_from(start),
            id,
            super_class,
            members,
        })
    }

    /// `true` when the current contextual word (`static`, `async`, `get`,
    /// `set`) acts as a modifier rather than as the member's own name.
    fn word_is_modifier(&self) -> LetFloatResult<bool> {
        let next = self.peek()?;
        Ok(!matches!(
            next.kind,
            TokenKind::LeftParen
                | TokenKind::Equal
                | TokenKind::Semicolon
                | TokenKind::RightBrace
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Eof
        ))
    }

    fn parse_class_member(&mut self) -> LetFloatResult<ClassMember> {
        let start = self.tok.span.start;
        let mut is_static = false;
        if self.tok.is_ident("static") && self.word_is_modifier()? {
            self.advance()?;
            is_static = true;
            if self.at(TokenKind::LeftBrace) {
                let node_id = self.next_node_id();
                self.advance()?;
                let body = self.in_function(false, false, |p| p.parse_statements(TokenKind::RightBrace))?;
                self.expect(TokenKind::RightBrace)?;
                return Ok(ClassMember::StaticBlock(StaticBlock {
                    node_id,
                    loc: self.loc_from(start),
                    body,
                }));
            }
        }
        let (kind, is_async, is_generator) = self.parse_method_modifiers()?;
        let key = self.parse_prop_key(true)?;
        if self.at(TokenKind::LeftParen) {
            let is_ctor = !is_static
                && kind == MethodKind::Method
                && matches!(&key, PropKey::Ident(id) if id.name == "constructor");
            let value = self.parse_function_rest(self.tok.span.start, None, is_async, is_generator)?;
            return Ok(ClassMember::Method(MethodDef {
                loc: self.loc_from(start),
                is_static,
                kind: if is_ctor { MethodKind::Constructor } else { kind },
                key,
                value: Box::new(value),
            }));
        }
        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.unexpected());
        }
        let value = if self.eat(TokenKind::Equal)? {
            Some(Box::new(
                self.in_function(false, false, |p| p.parse_assign())?,
            ))
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok(ClassMember::Field(FieldDef {
            loc: self.loc_from(start),
            is_static,
            key,
            value,
        }))
    }

    /// `async`, `*`, `get`, `set` prefixes shared by classes and object
    /// literals.
    fn parse_method_modifiers(&mut self) -> LetFloatResult<(MethodKind, bool, bool)> {
        let mut is_async = false;
        if self.tok.is_ident("async")
            && self.word_is_modifier()?
            && !self.peek()?.had_line_terminator_before
        {
            self.advance()?;
            is_async = true;
        }
        let is_generator = self.eat(TokenKind::Star)?;
        let mut kind = MethodKind::Method;
        if !is_async
            && !is_generator
            && (self.tok.is_ident("get") || self.tok.is_ident("set"))
            && self.word_is_modifier()?
        {
            kind = if self.tok.is_ident("get") {
                MethodKind::Get
            } else {
                MethodKind::Set
            };
            self.advance()?;
        }
        Ok((kind, is_async, is_generator))
    }

    fn parse_prop_key(&mut self, allow_private: bool) -> LetFloatResult<PropKey> {
        match self.tok.kind {
            TokenKind::StringLiteral => Ok(PropKey::Str(self.parse_string_lit()?)),
            TokenKind::NumericLiteral => {
                let tok = self.advance()?;
                Ok(PropKey::Num(self.slice(tok.span).to_owned()))
            }
            TokenKind::LeftBracket => {
                self.advance()?;
                let expr = self.with_in(true, |p| p.parse_assign())?;
                self.expect(TokenKind::RightBracket)?;
                Ok(PropKey::Computed(Box::new(expr)))
            }
            TokenKind::PrivateIdentifier if allow_private => {
                let tok = self.advance()?;
                Ok(PropKey::Private(PrivateIdent {
                    loc: tok.span,
                    name: tok.text().to_owned(),
                }))
            }
            _ => Ok(PropKey::Ident(self.parse_identifier_name()?)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Patterns
    // ─────────────────────────────────────────────────────────────────────

    fn parse_binding_target(&mut self) -> LetFloatResult<Pat> {
        match self.tok.kind {
            TokenKind::LeftBracket => self.nested(Self::parse_array_pattern),
            TokenKind::LeftBrace => self.nested(Self::parse_object_pattern),
            _ => Ok(Pat::Ident(self.parse_binding_ident()?)),
        }
    }

    fn parse_binding_element(&mut self) -> LetFloatResult<Pat> {
        let start = self.tok.span.start;
        let target = self.parse_binding_target()?;
        if self.eat(TokenKind::Equal)? {
            let right = Box::new(self.with_in(true, |p| p.parse_assign())?);
            return Ok(Pat::Assign(Box::new(AssignPat {
                loc: self.loc_from(start),
                left: target,
                right,
            })));
        }
        Ok(target)
    }

    fn parse_array_pattern(&mut self) -> LetFloatResult<Pat> {
        let start = self.tok.span.start;
        self.expect(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.eat(TokenKind::RightBracket)? {
            if self.eat(TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            if self.eat(TokenKind::DotDotDot)? {
                elements.push(Some(Pat::Rest(Box::new(self.parse_binding_target()?))));
                self.expect(TokenKind::RightBracket)?;
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.eat(TokenKind::Comma)? {
                self.expect(TokenKind::RightBracket)?;
                break;
            }
        }
        Ok(Pat::Array(Box::new(ArrayPat {
            loc: self.loc_from(start),
            elements,
        })))
    }

    fn parse_object_pattern(&mut self) -> LetFloatResult<Pat> {
        let start = self.tok.span.start;
        self.expect(TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.eat(TokenKind::RightBrace)? {
            if self.eat(TokenKind::DotDotDot)? {
                properties.push(ObjectPatProp::Rest(Pat::Ident(self.parse_binding_ident()?)));
                self.expect(TokenKind::RightBrace)?;
                break;
            }
            let shorthand_ok = self.at(TokenKind::Identifier);
            let key = self.parse_prop_key(false)?;
            if self.eat(TokenKind::Colon)? {
                let value = self.parse_binding_element()?;
                properties.push(ObjectPatProp::KeyValue { key, value });
            } else {
                let PropKey::Ident(key) = key else {
                    return Err(self.unexpected());
                };
                if !shorthand_ok {
                    return Err(self.error_at(key.loc, format!("unexpected reserved word '{}'", key.name)));
                }
                let default = if self.eat(TokenKind::Equal)? {
                    Some(Box::new(self.with_in(true, |p| p.parse_assign())?))
                } else {
                    None
                };
                properties.push(ObjectPatProp::Shorthand { key, default });
            }
            if !self.eat(TokenKind::Comma)? {
                self.expect(TokenKind::RightBrace)?;
                break;
            }
        }
        Ok(Pat::Object(Box::new(ObjectPat {
            loc: self.loc_from(start),
            properties,
        })))
    }

    /// Reinterpret an already-parsed expression as an assignment pattern.
    fn expr_to_pat(&self, expr: Expr) -> LetFloatResult<Pat> {
        match expr {
            Expr::Ident(id) => Ok(Pat::Ident(id)),
            Expr::Member(m) if !m.optional => Ok(Pat::Expr(Box::new(Expr::Member(m)))),
            Expr::Array(arr) => {
                let mut elements = Vec::with_capacity(arr.elements.len());
                for el in arr.elements {
                    elements.push(match el {
                        None => None,
                        Some(Expr::Spread(s)) => {
                            Some(Pat::Rest(Box::new(self.expr_to_pat(*s.argument)?)))
                        }
                        Some(e) => Some(self.expr_to_pat(e)?),
                    });
                }
                Ok(Pat::Array(Box::new(ArrayPat {
                    loc: arr.loc,
                    elements,
                })))
            }
            Expr::Object(obj) => {
                let mut properties = Vec::with_capacity(obj.properties.len());
                for prop in obj.properties {
                    properties.push(match prop {
                        ObjectProp::KeyValue { key, value } => ObjectPatProp::KeyValue {
                            key,
                            value: self.expr_to_pat(*value)?,
                        },
                        ObjectProp::Shorthand(key) => ObjectPatProp::Shorthand { key, default: None },
                        ObjectProp::CoverInit { key, init } => ObjectPatProp::Shorthand {
                            key,
                            default: Some(init),
                        },
                        ObjectProp::Spread(e) => ObjectPatProp::Rest(self.expr_to_pat(*e)?),
                        ObjectProp::Method { value, .. } => {
                            return Err(self.error_at(value.loc, "invalid destructuring target"));
                        }
                    });
                }
                Ok(Pat::Object(Box::new(ObjectPat {
                    loc: obj.loc,
                    properties,
                })))
            }
            Expr::Assign(a) if a.op.0 == "=" => Ok(Pat::Assign(Box::new(AssignPat {
                loc: a.loc,
                left: a.left,
                right: a.right,
            }))),
            other => Err(self.error_at(other.loc(), "invalid assignment target")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn parse_expression(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        let first = self.parse_assign()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(TokenKind::Comma)? {
            expressions.push(self.parse_assign()?);
        }
        Ok(Expr::Sequence(Box::new(SequenceExpr {
            loc: self.loc_from(start),
            expressions,
        })))
    }

    fn parse_assign(&mut self) -> LetFloatResult<Expr> {
        self.nested(Self::parse_assign_inner)
    }

    fn parse_assign_inner(&mut self) -> LetFloatResult<Expr> {
        if self.in_generator && self.tok.is_ident("yield") {
            return self.parse_yield();
        }
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }
        let start = self.tok.span.start;
        let left = self.parse_conditional()?;
        let kind = self.tok.kind;
        if !kind.is_assign_op() {
            return Ok(left);
        }
        let target = if kind == TokenKind::Equal {
            self.expr_to_pat(left)?
        } else {
            match left {
                Expr::Ident(id) => Pat::Ident(id),
                Expr::Member(m) if !m.optional => Pat::Expr(Box::new(Expr::Member(m))),
                other => return Err(self.error_at(other.loc(), "invalid assignment target")),
            }
        };
        let op = AssignOp(assign_op_str(kind));
        self.advance()?;
        let right = Box::new(self.parse_assign()?);
        Ok(Expr::Assign(Box::new(AssignExpr {
            loc: self.loc_from(start),
            op,
            left: target,
            right,
        })))
    }

    fn parse_yield(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        self.advance()?;
        let delegate = !self.tok.had_line_terminator_before && self.eat(TokenKind::Star)?;
        let ends_here = self.tok.had_line_terminator_before
            || matches!(
                self.tok.kind,
                TokenKind::RightParen
                    | TokenKind::RightBracket
                    | TokenKind::RightBrace
                    | TokenKind::Comma
                    | TokenKind::Semicolon
                    | TokenKind::Colon
                    | TokenKind::Eof
                    | TokenKind::TemplateMiddle
                    | TokenKind::TemplateTail
            );
        let argument = if delegate || !ends_here {
            Some(Box::new(self.parse_assign()?))
        } else {
            None
        };
        Ok(Expr::Yield(Box::new(YieldExpr {
            loc: self.loc_from(start),
            delegate,
            argument,
        })))
    }

    /// Recognise `x =>`, `async x =>`, `(…) =>`, and `async (…) =>`.
    fn try_parse_arrow(&mut self) -> LetFloatResult<Option<Expr>> {
        let start = self.tok.span.start;
        match self.tok.kind {
            TokenKind::Identifier => {
                let next = self.peek()?;
                if next.kind == TokenKind::Arrow && !next.had_line_terminator_before {
                    let param = self.parse_binding_ident()?;
                    return self
                        .parse_arrow_body(start, false, vec![Pat::Ident(param)])
                        .map(Some);
                }
                if !self.tok.is_ident("async") || next.had_line_terminator_before {
                    return Ok(None);
                }
                let params = match next.kind {
                    TokenKind::Identifier => self.attempt(|p| {
                        p.advance()?;
                        let param = p.parse_binding_ident()?;
                        p.expect_arrow()?;
                        Ok(vec![Pat::Ident(param)])
                    })?,
                    TokenKind::LeftParen => self.attempt(|p| {
                        p.advance()?;
                        let params = p.in_function(true, false, |p| p.parse_formal_params())?;
                        p.expect_arrow()?;
                        Ok(params)
                    })?,
                    _ => None,
                };
                match params {
                    Some(params) => self.parse_arrow_body(start, true, params).map(Some),
                    None => Ok(None),
                }
            }
            TokenKind::LeftParen => {
                let in_async = self.in_async;
                let params = self.attempt(|p| {
                    let params = p.in_function(in_async, false, |p| p.parse_formal_params())?;
                    p.expect_arrow()?;
                    Ok(params)
                })?;
                match params {
                    Some(params) => self.parse_arrow_body(start, false, params).map(Some),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// The `=>` of an arrow head, which must share a line with the params.
    fn expect_arrow(&mut self) -> LetFloatResult<()> {
        if self.at(TokenKind::Arrow) && !self.tok.had_line_terminator_before {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_arrow_body(
        &mut self,
        start: Position,
        is_async: bool,
        params: Vec<Pat>,
    ) -> LetFloatResult<Expr> {
        self.expect(TokenKind::Arrow)?;
        let node_id = self.next_node_id();
        let allow_in = self.allow_in;
        let body = self.in_function(is_async, false, |p| {
            if p.at(TokenKind::LeftBrace) {
                Ok(ArrowBody::Block(p.parse_function_body()?))
            } else {
                p.allow_in = allow_in;
                Ok(ArrowBody::Expr(Box::new(p.parse_assign()?)))
            }
        })?;
        Ok(Expr::Arrow(Box::new(ArrowExpr {
            node_id,
            loc: self.loc_from(start),
            is_async,
            params,
            body,
        })))
    }

    fn parse_conditional(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        let test = self.parse_binary(1)?;
        if !self.eat(TokenKind::Question)? {
            return Ok(test);
        }
        let consequent = Box::new(self.with_in(true, |p| p.parse_assign())?);
        self.expect(TokenKind::Colon)?;
        let alternate = Box::new(self.parse_assign()?);
        Ok(Expr::Conditional(Box::new(ConditionalExpr {
            loc: self.loc_from(start),
            test: Box::new(test),
            consequent,
            alternate,
        })))
    }

    fn infix_op(&self) -> Option<(u8, InfixOp)> {
        use BinaryOp as B;
        let op = match self.tok.kind {
            TokenKind::QuestionQuestion => (1, InfixOp::Logical(LogicalOp::Nullish)),
            TokenKind::PipePipe => (2, InfixOp::Logical(LogicalOp::Or)),
            TokenKind::AmpersandAmpersand => (3, InfixOp::Logical(LogicalOp::And)),
            TokenKind::Pipe => (4, InfixOp::Binary(B::BitOr)),
            TokenKind::Caret => (5, InfixOp::Binary(B::BitXor)),
            TokenKind::Ampersand => (6, InfixOp::Binary(B::BitAnd)),
            TokenKind::EqualEqual => (7, InfixOp::Binary(B::Eq)),
            TokenKind::BangEqual => (7, InfixOp::Binary(B::NotEq)),
            TokenKind::EqualEqualEqual => (7, InfixOp::Binary(B::StrictEq)),
            TokenKind::BangEqualEqual => (7, InfixOp::Binary(B::StrictNotEq)),
            TokenKind::Less => (8, InfixOp::Binary(B::Lt)),
            TokenKind::LessEqual => (8, InfixOp::Binary(B::LtEq)),
            TokenKind::Greater => (8, InfixOp::Binary(B::Gt)),
            TokenKind::GreaterEqual => (8, InfixOp::Binary(B::GtEq)),
            TokenKind::Instanceof => (8, InfixOp::Binary(B::Instanceof)),
            TokenKind::In if self.allow_in => (8, InfixOp::Binary(B::In)),
            TokenKind::LessLess => (9, InfixOp::Binary(B::Shl)),
            TokenKind::GreaterGreater => (9, InfixOp::Binary(B::Shr)),
            TokenKind::GreaterGreaterGreater => (9, InfixOp::Binary(B::UShr)),
            TokenKind::Plus => (10, InfixOp::Binary(B::Add)),
            TokenKind::Minus => (10, InfixOp::Binary(B::Sub)),
            TokenKind::Star => (11, InfixOp::Binary(B::Mul)),
            TokenKind::Slash => (11, InfixOp::Binary(B::Div)),
            TokenKind::Percent => (11, InfixOp::Binary(B::Rem)),
            TokenKind::StarStar => (12, InfixOp::Binary(B::Exp)),
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over the binary and logical operators.
    fn parse_binary(&mut self, min_prec: u8) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        let starts_unary = is_unary_start(&self.tok, self.in_async);
        let mut left = self.parse_unary()?;
        // Each operator deepens the left spine by one.
        let base = self.depth;
        loop {
            if self.at(TokenKind::RegExpLiteral) {
                let tok = self.tok.clone();
                self.tok = self.scanner.rescan_slash(&tok, false)?;
            }
            let Some((prec, op)) = self.infix_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            if matches!(op, InfixOp::Binary(BinaryOp::Exp)) && starts_unary {
                return Err(self.error_here(
                    "unary operator used immediately before exponentiation expression",
                ));
            }
            self.advance()?;
            self.enter_nesting()?;
            // `**` is right-associative.
            let next_min = if prec == 12 { prec } else { prec + 1 };
            let right = Box::new(self.parse_binary(next_min)?);
            let loc = self.loc_from(start);
            let left_box = Box::new(left);
            left = match op {
                InfixOp::Binary(op) => Expr::Binary(Box::new(BinaryExpr {
                    loc,
                    op,
                    left: left_box,
                    right,
                })),
                InfixOp::Logical(op) => Expr::Logical(Box::new(LogicalExpr {
                    loc,
                    op,
                    left: left_box,
                    right,
                })),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_unary(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        let op = match self.tok.kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let argument = Box::new(self.nested(Self::parse_unary)?);
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                loc: self.loc_from(start),
                op,
                argument,
            })));
        }
        if matches!(self.tok.kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let increment = self.advance()?.kind == TokenKind::PlusPlus;
            let argument = Box::new(self.nested(Self::parse_unary)?);
            return Ok(Expr::Update(Box::new(UpdateExpr {
                loc: self.loc_from(start),
                increment,
                prefix: true,
                argument,
            })));
        }
        if self.in_async && self.tok.is_ident("await") {
            self.advance()?;
            let argument = Box::new(self.nested(Self::parse_unary)?);
            return Ok(Expr::Await(Box::new(AwaitExpr {
                loc: self.loc_from(start),
                argument,
            })));
        }
        let expr = self.parse_lhs()?;
        if matches!(self.tok.kind, TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.tok.had_line_terminator_before
        {
            let increment = self.advance()?.kind == TokenKind::PlusPlus;
            return Ok(Expr::Update(Box::new(UpdateExpr {
                loc: self.loc_from(start),
                increment,
                prefix: false,
                argument: Box::new(expr),
            })));
        }
        Ok(expr)
    }

    /// Member, call, `new`, and tagged-template chains.
    fn parse_lhs(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        let base = if self.at(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        self.parse_call_tail(start, base, true)
    }

    fn parse_new(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        self.expect(TokenKind::New)?;
        if self.eat(TokenKind::Dot)? {
            self.expect_ident("target")?;
            return Ok(Expr::MetaProp(Box::new(MetaProp {
                loc: self.loc_from(start),
                meta: "new",
                property: "target",
            })));
        }
        let cstart = self.tok.span.start;
        let callee = if self.at(TokenKind::New) {
            self.nested(Self::parse_new)?
        } else {
            self.parse_primary()?
        };
        let callee = self.parse_call_tail(cstart, callee, false)?;
        let arguments = if self.at(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New(Box::new(NewExpr {
            loc: self.loc_from(start),
            callee: Box::new(callee),
            arguments,
        })))
    }

    fn parse_call_tail(
        &mut self,
        start: Position,
        mut expr: Expr,
        allow_call: bool,
    ) -> LetFloatResult<Expr> {
        let mut in_chain = false;
        let base = self.depth;
        loop {
            match self.tok.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.parse_member_name()?;
                    expr = self.member(start, expr, property, false);
                }
                TokenKind::QuestionDot if allow_call => {
                    self.advance()?;
                    in_chain = true;
                    match self.tok.kind {
                        TokenKind::LeftParen => {
                            let arguments = self.parse_arguments()?;
                            expr = self.call(start, expr, arguments, true);
                        }
                        TokenKind::LeftBracket => {
                            self.advance()?;
                            let prop = self.with_in(true, |p| p.parse_expression())?;
                            self.expect(TokenKind::RightBracket)?;
                            expr = self.member(start, expr, MemberProp::Computed(Box::new(prop)), true);
                        }
                        _ => {
                            let property = self.parse_member_name()?;
                            expr = self.member(start, expr, property, true);
                        }
                    }
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let prop = self.with_in(true, |p| p.parse_expression())?;
                    self.expect(TokenKind::RightBracket)?;
                    expr = self.member(start, expr, MemberProp::Computed(Box::new(prop)), false);
                }
                TokenKind::LeftParen if allow_call => {
                    let arguments = self.parse_arguments()?;
                    expr = self.call(start, expr, arguments, false);
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    if in_chain {
                        return Err(self.error_here("tagged template cannot be used in an optional chain"));
                    }
                    let quasi = self.parse_template()?;
                    expr = Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
                        loc: self.loc_from(start),
                        tag: Box::new(expr),
                        quasi,
                    }));
                }
                _ => break,
            }
            self.enter_nesting()?;
        }
        self.depth = base;
        Ok(expr)
    }

    fn member(&self, start: Position, object: Expr, property: MemberProp, optional: bool) -> Expr {
        Expr::Member(Box::new(MemberExpr {
            loc: self.loc_from(start),
            object: Box::new(object),
            property,
            optional,
        }))
    }

    fn call(&mut self, start: Position, callee: Expr, arguments: Vec<Expr>, optional: bool) -> Expr {
        let node_id = self.next_node_id();
        Expr::Call(Box::new(CallExpr {
            node_id,
            loc: self.loc_from(start),
            callee: Box::new(callee),
            arguments,
            optional,
        }))
    }

    fn parse_member_name(&mut self) -> LetFloatResult<MemberProp> {
        if self.at(TokenKind::PrivateIdentifier) {
            let tok = self.advance()?;
            return Ok(MemberProp::Private(PrivateIdent {
                loc: tok.span,
                name: tok.text().to_owned(),
            }));
        }
        Ok(MemberProp::Ident(self.parse_identifier_name()?))
    }

    fn parse_arguments(&mut self) -> LetFloatResult<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        self.with_in(true, |p| {
            let mut args = Vec::new();
            while !p.eat(TokenKind::RightParen)? {
                args.push(p.parse_spread_or_assign()?);
                if !p.eat(TokenKind::Comma)? {
                    p.expect(TokenKind::RightParen)?;
                    break;
                }
            }
            Ok(args)
        })
    }

    fn parse_spread_or_assign(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        if self.eat(TokenKind::DotDotDot)? {
            let argument = Box::new(self.parse_assign()?);
            return Ok(Expr::Spread(Box::new(SpreadElement {
                loc: self.loc_from(start),
                argument,
            })));
        }
        self.parse_assign()
    }

    fn parse_primary(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        match self.tok.kind {
            TokenKind::Identifier => {
                if self.at_async_function()? {
                    self.advance()?;
                    return Ok(Expr::Fn(Box::new(self.parse_function(start, true, false)?)));
                }
                let tok = self.advance()?;
                Ok(Expr::Ident(Ident {
                    loc: tok.span,
                    name: tok.text().to_owned(),
                }))
            }
            TokenKind::This => {
                self.advance()?;
                Ok(Expr::This(self.loc_from(start)))
            }
            TokenKind::Super => {
                self.advance()?;
                if !matches!(
                    self.tok.kind,
                    TokenKind::LeftParen | TokenKind::Dot | TokenKind::LeftBracket
                ) {
                    return Err(self.error_here("'super' keyword unexpected here"));
                }
                Ok(Expr::Super(self.loc_from(start)))
            }
            TokenKind::Null | TokenKind::True | TokenKind::False => {
                let kind = self.advance()?.kind;
                let value = match kind {
                    TokenKind::Null => LitValue::Null,
                    k => LitValue::Bool(k == TokenKind::True),
                };
                Ok(self.lit(start, value))
            }
            TokenKind::NumericLiteral => {
                let tok = self.advance()?;
                let raw = self.slice(tok.span).to_owned();
                let value = if raw.ends_with('n') {
                    LitValue::BigInt(raw)
                } else {
                    let value = match tok.value {
                        TokenValue::Number(n) => n,
                        _ => f64::NAN,
                    };
                    LitValue::Num { value, raw }
                };
                Ok(self.lit(start, value))
            }
            TokenKind::StringLiteral => {
                let tok = self.advance()?;
                Ok(self.lit(start, LitValue::Str(tok.text().to_owned())))
            }
            TokenKind::Slash | TokenKind::SlashEqual | TokenKind::RegExpLiteral => {
                if !self.at(TokenKind::RegExpLiteral) {
                    let tok = self.tok.clone();
                    self.tok = self.scanner.rescan_slash(&tok, true)?;
                }
                let tok = self.advance()?;
                Ok(self.lit(start, LitValue::Regex(tok.text().to_owned())))
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                Ok(Expr::Template(Box::new(self.parse_template()?)))
            }
            TokenKind::LeftParen => {
                self.advance()?;
                let expr = self.with_in(true, |p| p.parse_expression())?;
                self.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => Ok(Expr::Fn(Box::new(self.parse_function(start, false, false)?))),
            TokenKind::Class => Ok(Expr::Class(Box::new(self.parse_class(false)?))),
            TokenKind::Import => {
                self.advance()?;
                if self.eat(TokenKind::Dot)? {
                    self.expect_ident("meta")?;
                    return Ok(Expr::MetaProp(Box::new(MetaProp {
                        loc: self.loc_from(start),
                        meta: "import",
                        property: "meta",
                    })));
                }
                self.expect(TokenKind::LeftParen)?;
                let (source, options) = self.with_in(true, |p| {
                    let source = Box::new(p.parse_assign()?);
                    let mut options = None;
                    if p.eat(TokenKind::Comma)? && !p.at(TokenKind::RightParen) {
                        options = Some(Box::new(p.parse_assign()?));
                        p.eat(TokenKind::Comma)?;
                    }
                    p.expect(TokenKind::RightParen)?;
                    Ok((source, options))
                })?;
                Ok(Expr::Import(Box::new(ImportCall {
                    loc: self.loc_from(start),
                    source,
                    options,
                })))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn lit(&self, start: Position, value: LitValue) -> Expr {
        Expr::Lit(Lit {
            loc: self.loc_from(start),
            value,
        })
    }

    fn parse_template(&mut self) -> LetFloatResult<TemplateLit> {
        let start = self.tok.span.start;
        let head = self.advance()?;
        let mut quasis = vec![template_element(head.text())];
        let mut expressions = Vec::new();
        if head.kind == TokenKind::TemplateHead {
            loop {
                expressions.push(self.with_in(true, |p| p.parse_expression())?);
                let tok = self.advance()?;
                quasis.push(template_element(tok.text()));
                match tok.kind {
                    TokenKind::TemplateMiddle => {}
                    TokenKind::TemplateTail => break,
                    _ => {
                        return Err(LetFloatError::syntax(
                            "unterminated template substitution",
                            tok.span.start.line,
                            tok.span.start.column,
                        ));
                    }
                }
            }
        }
        Ok(TemplateLit {
            loc: self.loc_from(start),
            quasis,
            expressions,
        })
    }

    fn parse_array_literal(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        self.expect(TokenKind::LeftBracket)?;
        let elements = self.with_in(true, |p| {
            let mut elements = Vec::new();
            while !p.eat(TokenKind::RightBracket)? {
                if p.eat(TokenKind::Comma)? {
                    elements.push(None);
                    continue;
                }
                elements.push(Some(p.parse_spread_or_assign()?));
                if !p.eat(TokenKind::Comma)? {
                    p.expect(TokenKind::RightBracket)?;
                    break;
                }
            }
            Ok(elements)
        })?;
        Ok(Expr::Array(Box::new(ArrayExpr {
            loc: self.loc_from(start),
            elements,
        })))
    }

    fn parse_object_literal(&mut self) -> LetFloatResult<Expr> {
        let start = self.tok.span.start;
        self.expect(TokenKind::LeftBrace)?;
        let properties = self.with_in(true, |p| {
            let mut properties = Vec::new();
            while !p.eat(TokenKind::RightBrace)? {
                properties.push(p.parse_object_prop()?);
                if !p.eat(TokenKind::Comma)? {
                    p.expect(TokenKind::RightBrace)?;
                    break;
                }
            }
            Ok(properties)
        })?;
        Ok(Expr::Object(Box::new(ObjectExpr {
            loc: self.loc_from(start),
            properties,
        })))
    }

    fn parse_object_prop(&mut self) -> LetFloatResult<ObjectProp> {
        if self.eat(TokenKind::DotDotDot)? {
            return Ok(ObjectProp::Spread(Box::new(self.parse_assign()?)));
        }
        let (kind, is_async, is_generator) = self.parse_method_modifiers()?;
        let is_plain_ident = self.at(TokenKind::Identifier);
        let key = self.parse_prop_key(false)?;
        if self.at(TokenKind::LeftParen) {
            let value = self.parse_function_rest(self.tok.span.start, None, is_async, is_generator)?;
            return Ok(ObjectProp::Method {
                kind,
                key,
                value: Box::new(value),
            });
        }
        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.unexpected());
        }
        if self.eat(TokenKind::Colon)? {
            return Ok(ObjectProp::KeyValue {
                key,
                value: Box::new(self.parse_assign()?),
            });
        }
        let PropKey::Ident(id) = key else {
            return Err(self.unexpected());
        };
        if !is_plain_ident {
            return Err(self.error_at(id.loc, format!("unexpected reserved word '{}'", id.name)));
        }
        if self.eat(TokenKind::Equal)? {
            return Ok(ObjectProp::CoverInit {
                key: id,
                init: Box::new(self.parse_assign()?),
            });
        }
        Ok(ObjectProp::Shorthand(id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Free helpers
// ─────────────────────────────────────────────────────────────────────────────

fn assign_op_str(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::PlusEqual => "+=",
        TokenKind::MinusEqual => "-=",
        TokenKind::StarEqual => "*=",
        TokenKind::StarStarEqual => "**=",
        TokenKind::SlashEqual => "/=",
        TokenKind::PercentEqual => "%=",
        TokenKind::LessLessEqual => "<<=",
        TokenKind::GreaterGreaterEqual => ">>=",
        TokenKind::GreaterGreaterGreaterEqual => ">>>=",
        TokenKind::AmpersandEqual => "&=",
        TokenKind::PipeEqual => "|=",
        TokenKind::CaretEqual => "^=",
        TokenKind::AmpersandAmpersandEqual => "&&=",
        TokenKind::PipePipeEqual => "||=",
        TokenKind::QuestionQuestionEqual => "??=",
        _ => "=",
    }
}

fn is_unary_start(tok: &Token, in_async: bool) -> bool {
    matches!(
        tok.kind,
        TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Typeof
            | TokenKind::Void
            | TokenKind::Delete
    ) || (in_async && tok.is_ident("await"))
}

/// An import name without `as` must itself be a legal binding name.
fn keyword_free(id: &Ident) -> bool {
    crate::parser::scanner::Scanner::tokenize_all(&id.name)
        .map(|toks| toks.len() == 1 && toks[0].kind == TokenKind::Identifier)
        .unwrap_or(false)
}

fn template_element(raw: &str) -> TemplateElement {
    TemplateElement {
        raw: raw.to_owned(),
        cooked: cook_template(raw),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn script(src: &str) -> Program {
        parse_program(src, SourceType::Script).unwrap()
    }

    fn module(src: &str) -> Program {
        parse_program(src, SourceType::Module).unwrap()
    }

    fn first_expr(src: &str) -> Expr {
        match script(src).body.into_iter().next() {
            Some(Stmt::Expr(es)) => *es.expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    // ── Statements ───────────────────────────────────────────────────────────

    #[test]
    fn test_var_declarations_and_asi() {
        let prog = script("var a = 1\nlet [b, c] = d\nconst {e, f: g = 2} = h");
        assert_eq!(prog.body.len(), 3);
        let Stmt::Var(decl) = &prog.body[1] else {
            panic!("expected let declaration");
        };
        assert_eq!(decl.kind, VarKind::Let);
        let names: Vec<&str> = decl.declarators[0]
            .id
            .bound_names()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_let_as_identifier() {
        let expr = first_expr("let + 1;");
        assert!(matches!(expr, Expr::Binary(_)));
    }

    #[test]
    fn test_missing_semicolon_on_same_line_is_error() {
        let err = parse_program("a b", SourceType::Script).unwrap_err();
        assert!(matches!(err, LetFloatError::SyntaxError { line: 1, column: 3, .. }));
    }

    #[test]
    fn test_return_restricted_production() {
        let prog = script("function f() { return\n1 }");
        let Stmt::FnDecl(f) = &prog.body[0] else {
            panic!("expected function");
        };
        assert!(matches!(&f.body.body[0], Stmt::Return(r) if r.argument.is_none()));
        assert_eq!(f.body.body.len(), 2);
    }

    #[test]
    fn test_directive_prologue() {
        let prog = script("'use strict'; (\"not a directive\"); x");
        assert!(matches!(&prog.body[0], Stmt::Directive(d) if d.raw == "'use strict'"));
        assert!(matches!(&prog.body[1], Stmt::Expr(_)));
    }

    #[test]
    fn test_for_variants() {
        let prog = script(
            "for (var i = 0; i < n; i++) {}\nfor (const k in o) {}\nfor (let [a, b] of xs) {}\nfor (x.y of z);",
        );
        assert!(matches!(&prog.body[0], Stmt::For(_)));
        assert!(matches!(&prog.body[1], Stmt::ForIn(_)));
        assert!(matches!(&prog.body[2], Stmt::ForOf(_)));
        assert!(matches!(&prog.body[3], Stmt::ForOf(f) if matches!(f.left, ForHead::Pat(Pat::Expr(_)))));
    }

    #[test]
    fn test_in_operator_allowed_outside_for_head() {
        let prog = script("for (var a = (b in c); a in d;) {}");
        let Stmt::For(f) = &prog.body[0] else {
            panic!("expected classic for");
        };
        assert!(matches!(&f.init, Some(ForInit::Var(_))));
        assert!(matches!(f.test.as_deref(), Some(Expr::Binary(b)) if b.op == BinaryOp::In));
    }

    #[test]
    fn test_try_catch_finally_and_labels() {
        let prog = script("outer: try { a() } catch ({ message }) { b() } finally { c() }");
        let Stmt::Labeled(l) = &prog.body[0] else {
            panic!("expected label");
        };
        let Stmt::Try(t) = l.body.as_ref() else {
            panic!("expected try");
        };
        assert!(t.handler.as_ref().is_some_and(|h| h.param.is_some()));
        assert!(t.finalizer.is_some());
    }

    #[test]
    fn test_switch() {
        let prog = script("switch (x) { case 1: a(); break; default: b() }");
        let Stmt::Switch(s) = &prog.body[0] else {
            panic!("expected switch");
        };
        assert_eq!(s.cases.len(), 2);
        assert_eq!(s.cases[0].consequent.len(), 2);
        assert!(s.cases[1].test.is_none());
    }

    // ── Functions, arrows, classes ───────────────────────────────────────────

    #[test]
    fn test_arrow_forms() {
        for src in [
            "x => x",
            "(x, y) => x + y",
            "() => {}",
            "([a], {b} = {}, ...rest) => a",
            "async x => await x",
            "async (x) => x",
        ] {
            assert!(matches!(first_expr(src), Expr::Arrow(_)), "{src}");
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(first_expr("(a, b)"), Expr::Sequence(_)));
        assert!(matches!(first_expr("(a)(b)"), Expr::Call(_)));
        assert!(matches!(first_expr("async(a)"), Expr::Call(_)));
    }

    #[test]
    fn test_curried_arrow_nests() {
        let Expr::Arrow(outer) = first_expr("x => y => add(x)(y)") else {
            panic!("expected arrow");
        };
        let ArrowBody::Expr(body) = &outer.body else {
            panic!("expected concise body");
        };
        assert!(matches!(body.as_ref(), Expr::Arrow(_)));
    }

    #[test]
    fn test_generator_and_async_functions() {
        let prog = script("function* g() { yield 1; yield* h(); }\nasync function f() { await g(); }");
        let Stmt::FnDecl(g) = &prog.body[0] else {
            panic!("expected generator");
        };
        assert!(g.is_generator);
        let Stmt::FnDecl(f) = &prog.body[1] else {
            panic!("expected async function");
        };
        assert!(f.is_async);
    }

    #[test]
    fn test_await_is_identifier_outside_async() {
        assert!(matches!(first_expr("await(1)"), Expr::Call(_)));
    }

    #[test]
    fn test_class_members() {
        let prog = script(
            "class A extends B { #x = 1; static y; constructor() { super(); } get z() { return this.#x } static { init(); } async *gen() {} static() {} }",
        );
        let Stmt::ClassDecl(class) = &prog.body[0] else {
            panic!("expected class");
        };
        assert!(class.super_class.is_some());
        assert_eq!(class.members.len(), 7);
        assert!(matches!(&class.members[2], ClassMember::Method(m) if m.kind == MethodKind::Constructor));
        assert!(matches!(&class.members[3], ClassMember::Method(m) if m.kind == MethodKind::Get));
        assert!(matches!(&class.members[4], ClassMember::StaticBlock(_)));
        assert!(matches!(&class.members[6], ClassMember::Method(m) if !m.is_static));
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    #[test]
    fn test_precedence() {
        let Expr::Binary(add) = first_expr("a + b * c") else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.right.as_ref(), Expr::Binary(m) if m.op == BinaryOp::Mul));

        let Expr::Binary(exp) = first_expr("a ** b ** c") else {
            panic!("expected binary");
        };
        assert!(matches!(exp.right.as_ref(), Expr::Binary(_)));
    }

    #[test]
    fn test_unary_before_exponent_is_error() {
        assert!(parse_program("-a ** 2", SourceType::Script).is_err());
        assert!(parse_program("(-a) ** 2", SourceType::Script).is_ok());
    }

    #[test]
    fn test_destructuring_assignment() {
        let Expr::Assign(a) = first_expr("[a, b.c, ...d] = e") else {
            panic!("expected assignment");
        };
        assert!(matches!(a.left, Pat::Array(_)));
        let Expr::Assign(a) = first_expr("({ a, b = 1, c: d } = e)") else {
            panic!("expected assignment");
        };
        assert!(matches!(a.left, Pat::Object(_)));
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(parse_program("f() = 1", SourceType::Script).is_err());
        assert!(parse_program("a?.b = 1", SourceType::Script).is_err());
    }

    #[test]
    fn test_optional_chaining() {
        let Expr::Call(call) = first_expr("a?.b.c?.(d)") else {
            panic!("expected call");
        };
        assert!(call.optional);
        assert!(matches!(call.callee.as_ref(), Expr::Member(m) if !m.optional));
    }

    #[test]
    fn test_new_forms() {
        assert!(matches!(first_expr("new Foo"), Expr::New(n) if n.arguments.is_empty()));
        let Expr::Member(m) = first_expr("new a.b(c).d") else {
            panic!("expected member");
        };
        assert!(matches!(m.object.as_ref(), Expr::New(n) if n.arguments.len() == 1));
    }

    #[test]
    fn test_regex_after_block_and_division_after_paren() {
        let prog = script("{}\n/re/.test(s)");
        assert!(matches!(&prog.body[1], Stmt::Expr(_)));
        assert!(matches!(first_expr("(a) / 2"), Expr::Binary(b) if b.op == BinaryOp::Div));
        let prog = script("x = {} / 2");
        assert_eq!(prog.body.len(), 1);
    }

    #[test]
    fn test_templates() {
        let Expr::Template(t) = first_expr("`a${b}c${d}`") else {
            panic!("expected template");
        };
        assert_eq!(t.quasis.len(), 3);
        assert_eq!(t.expressions.len(), 2);
        assert!(matches!(first_expr("tag`x`"), Expr::TaggedTemplate(_)));
    }

    #[test]
    fn test_object_literal_forms() {
        let Expr::Object(o) = first_expr("({ a, b: 1, [c]: 2, d() {}, get e() { return 1 }, ...f, 'g': 3, 4: 5 })") else {
            panic!("expected object");
        };
        assert_eq!(o.properties.len(), 8);
        assert!(matches!(&o.properties[3], ObjectProp::Method { kind: MethodKind::Method, .. }));
        assert!(matches!(&o.properties[4], ObjectProp::Method { kind: MethodKind::Get, .. }));
    }

    #[test]
    fn test_call_node_ids_are_distinct() {
        let Expr::Call(outer) = first_expr("add(x)(y)") else {
            panic!("expected call");
        };
        let Expr::Call(inner) = outer.callee.as_ref() else {
            panic!("expected inner call");
        };
        assert_ne!(outer.node_id, inner.node_id);
    }

    // ── Modules ──────────────────────────────────────────────────────────────

    #[test]
    fn test_import_export_forms() {
        let prog = module(
            "import a, { b as c, d } from './m.js';\nimport * as ns from 'n';\nimport 'side';\nexport const x = 1;\nexport { x as y };\nexport * from 'z';\nexport default function () {}",
        );
        assert_eq!(prog.body.len(), 7);
        let Stmt::Import(imp) = &prog.body[0] else {
            panic!("expected import");
        };
        let locals: Vec<&str> = imp.specifiers.iter().map(|s| s.local().name.as_str()).collect();
        assert_eq!(locals, vec!["a", "c", "d"]);
        assert!(matches!(
            &prog.body[6],
            Stmt::Export(ExportDecl::Default { value: ExportDefault::Fn(f), .. }) if f.id.is_none()
        ));
    }

    #[test]
    fn test_import_in_script_is_error() {
        assert!(parse_program("import x from 'y'", SourceType::Script).is_err());
        assert!(parse_program("import('y')", SourceType::Script).is_ok());
    }

    #[test]
    fn test_top_level_await_in_module() {
        let prog = module("await ready;");
        assert!(matches!(&prog.body[0], Stmt::Expr(e) if matches!(e.expr.as_ref(), Expr::Await(_))));
    }

    // ── Nesting limit ────────────────────────────────────────────────────────

    fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    fn nesting_error(src: String) -> bool {
        on_big_stack(move || {
            matches!(
                parse_program(&src, SourceType::Script),
                Err(LetFloatError::SyntaxError { ref message, .. }) if message == "nesting too deep"
            )
        })
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let n = 100_000;
        assert!(nesting_error(format!("var a = {}1{};", "[".repeat(n), "]".repeat(n))));
        assert!(nesting_error(format!("{}x{}", "(".repeat(n), ")".repeat(n))));
        assert!(nesting_error(format!("{}x", "!".repeat(n))));
        assert!(nesting_error("{".repeat(n)));
        assert!(nesting_error(format!("var {}a{} = b;", "[".repeat(n), "]".repeat(n))));
    }

    #[test]
    fn test_long_chains_count_toward_nesting() {
        assert!(nesting_error(format!("a{}", ".b".repeat(100_000))));
        assert!(nesting_error(format!("1{}", " + 1".repeat(100_000))));
        assert!(nesting_error(format!("f{}", "(1)".repeat(100_000))));
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let prog = on_big_stack(|| {
            let src = format!(
                "var a = {}1{}; var s = 'x'{}; o{}; {}{}",
                "[".repeat(64),
                "]".repeat(64),
                " + 'y'".repeat(200),
                ".p".repeat(200),
                "{".repeat(64),
                "}".repeat(64),
            );
            parse_program(&src, SourceType::Script)
        });
        assert_eq!(prog.unwrap().body.len(), 4);
    }

    #[test]
    fn test_error_position() {
        let err = parse_program("var x = ;", SourceType::Script).unwrap_err();
        assert!(matches!(err, LetFloatError::SyntaxError { line: 1, column: 9, .. }));
    }
}
