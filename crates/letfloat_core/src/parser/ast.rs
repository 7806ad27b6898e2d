//! Owned JavaScript syntax tree.
//!
//! Every node carries a [`SourceLocation`] (`loc`).  Nodes that open a scope,
//! or that the float pass may rewrite, additionally carry a [`NodeId`] minted
//! from [`Program::next_node_id`]; scope analysis keys its node → scope map by
//! these ids and the float pass mints fresh ones from the same counter.
//!
//! # Structure
//!
//! - [`Program`]: root node; module declarations live in the ordinary
//!   statement list as [`Stmt::Import`] / [`Stmt::Export`].
//! - [`Stmt`], [`Expr`], [`Pat`]: statements, expressions, binding and
//!   assignment targets.
//! - [`Function`] / [`Class`]: shared by declarations and expressions.

use crate::parser::scanner::Span;

/// Source location attached to every node: a half-open `[start, end)` span.
pub type SourceLocation = Span;

/// Stable identity of a scope-opening or rewritable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the source file is a classic script or an ES module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// A classic script; `import`/`export` declarations are rejected.
    Script,
    /// An ES module; strict, with top-level `import`/`export`.
    Module,
}

/// The root of a parsed compilation unit.
#[derive(Debug, Clone)]
pub struct Program {
    /// Source location of the entire program.
    pub loc: SourceLocation,
    /// Script or module.
    pub source_type: SourceType,
    /// Top-level statements, including module declarations.
    pub body: Vec<Stmt>,
    /// Next unused [`NodeId`].
    pub next_node_id: u32,
}

impl Program {
    /// Mint a fresh node id that no node in this tree carries yet.
    pub fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Common helpers
// ─────────────────────────────────────────────────────────────────────────────

/// An identifier used as a name, label, or binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    /// Source location.
    pub loc: SourceLocation,
    /// Identifier text with escapes decoded.
    pub name: String,
}

impl Ident {
    /// Build an identifier with a default (synthetic) location.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self {
            loc: SourceLocation::default(),
            name: name.into(),
        }
    }
}

/// `#name` inside a class body.  `name` excludes the `#`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateIdent {
    /// Source location.
    pub loc: SourceLocation,
    /// Name without the leading `#`.
    pub name: String,
}

/// A string literal appearing outside expression position (module
/// specifiers, property keys).
#[derive(Debug, Clone, PartialEq)]
pub struct StringLit {
    /// Source location.
    pub loc: SourceLocation,
    /// Decoded value.
    pub value: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// A statement or module-level declaration.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `"use strict";` and other directive-prologue strings.
    Directive(Directive),
    /// `{ … }`
    Block(BlockStmt),
    /// `var` / `let` / `const`
    Var(VarDecl),
    /// `function name() { … }`
    FnDecl(Box<Function>),
    /// `class Name { … }`
    ClassDecl(Box<Class>),
    /// `expr;`
    Expr(ExprStmt),
    /// `if (test) consequent else alternate`
    If(IfStmt),
    /// `for (init; test; update) body`
    For(Box<ForStmt>),
    /// `for (left in right) body`
    ForIn(Box<ForInStmt>),
    /// `for [await] (left of right) body`
    ForOf(Box<ForOfStmt>),
    /// `while (test) body`
    While(WhileStmt),
    /// `do body while (test);`
    DoWhile(DoWhileStmt),
    /// `switch (discriminant) { cases }`
    Switch(SwitchStmt),
    /// `try … catch … finally …`
    Try(Box<TryStmt>),
    /// `return argument?;`
    Return(ReturnStmt),
    /// `throw argument;`
    Throw(ThrowStmt),
    /// `break label?;`
    Break(JumpStmt),
    /// `continue label?;`
    Continue(JumpStmt),
    /// `label: body`
    Labeled(LabeledStmt),
    /// `debugger;`
    Debugger(SourceLocation),
    /// `with (object) body`
    With(WithStmt),
    /// `;`
    Empty(SourceLocation),
    /// `import … from "…";`
    Import(ImportDecl),
    /// Any form of `export`.
    Export(ExportDecl),
}

impl Stmt {
    /// Returns the source location of this statement.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Directive(s) => s.loc,
            Stmt::Block(s) => s.loc,
            Stmt::Var(s) => s.loc,
            Stmt::FnDecl(s) => s.loc,
            Stmt::ClassDecl(s) => s.loc,
            Stmt::Expr(s) => s.loc,
            Stmt::If(s) => s.loc,
            Stmt::For(s) => s.loc,
            Stmt::ForIn(s) => s.loc,
            Stmt::ForOf(s) => s.loc,
            Stmt::While(s) => s.loc,
            Stmt::DoWhile(s) => s.loc,
            Stmt::Switch(s) => s.loc,
            Stmt::Try(s) => s.loc,
            Stmt::Return(s) => s.loc,
            Stmt::Throw(s) => s.loc,
            Stmt::Break(s) | Stmt::Continue(s) => s.loc,
            Stmt::Labeled(s) => s.loc,
            Stmt::Debugger(loc) | Stmt::Empty(loc) => *loc,
            Stmt::With(s) => s.loc,
            Stmt::Import(s) => s.loc,
            Stmt::Export(s) => s.loc(),
        }
    }
}

/// A directive-prologue entry.  `raw` includes the quotes exactly as written
/// so that `'use strict'` survives printing byte for byte.
#[derive(Debug, Clone)]
pub struct Directive {
    /// Source location.
    pub loc: SourceLocation,
    /// Quoted source text.
    pub raw: String,
}

/// `{ statements }`
#[derive(Debug, Clone)]
pub struct BlockStmt {
    /// Identity; only blocks used as statements open their own scope.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Statements in the block.
    pub body: Vec<Stmt>,
}

/// `expr;`
#[derive(Debug, Clone)]
pub struct ExprStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The expression.
    pub expr: Box<Expr>,
}

/// `if (test) consequent else alternate`
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Box<Expr>,
    /// Taken branch.
    pub consequent: Box<Stmt>,
    /// Not-taken branch.
    pub alternate: Option<Box<Stmt>>,
}

/// `for (init; test; update) body`
#[derive(Debug, Clone)]
pub struct ForStmt {
    /// Identity; the loop head opens a scope for `let`/`const`.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Optional initializer.
    pub init: Option<ForInit>,
    /// Optional condition.
    pub test: Option<Box<Expr>>,
    /// Optional update.
    pub update: Option<Box<Expr>>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// The initializer slot of a C-style `for`.
#[derive(Debug, Clone)]
pub enum ForInit {
    /// Declaration.
    Var(VarDecl),
    /// Expression.
    Expr(Box<Expr>),
}

/// The left-hand side of `for-in` / `for-of`.
#[derive(Debug, Clone)]
pub enum ForHead {
    /// `var x`, `let [a, b]`, …
    Var(VarDecl),
    /// An assignment target.
    Pat(Pat),
}

/// `for (left in right) body`
#[derive(Debug, Clone)]
pub struct ForInStmt {
    /// Identity.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Loop binding.
    pub left: ForHead,
    /// Enumerated object.
    pub right: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// `for [await] (left of right) body`
#[derive(Debug, Clone)]
pub struct ForOfStmt {
    /// Identity.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// `for await`.
    pub is_await: bool,
    /// Loop binding.
    pub left: ForHead,
    /// Iterable.
    pub right: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// `while (test) body`
#[derive(Debug, Clone)]
pub struct WhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// `do body while (test);`
#[derive(Debug, Clone)]
pub struct DoWhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop body.
    pub body: Box<Stmt>,
    /// Condition.
    pub test: Box<Expr>,
}

/// `switch (discriminant) { cases }`
#[derive(Debug, Clone)]
pub struct SwitchStmt {
    /// Identity; the case block is one lexical scope.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Switched value.
    pub discriminant: Box<Expr>,
    /// Clauses in source order.
    pub cases: Vec<SwitchCase>,
}

/// `case test:` or `default:` followed by statements.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Source location.
    pub loc: SourceLocation,
    /// `None` for `default:`.
    pub test: Option<Expr>,
    /// Clause body.
    pub consequent: Vec<Stmt>,
}

/// `try { block } catch (param) { … } finally { … }`
#[derive(Debug, Clone)]
pub struct TryStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Protected block.
    pub block: BlockStmt,
    /// Optional handler.
    pub handler: Option<CatchClause>,
    /// Optional finalizer.
    pub finalizer: Option<BlockStmt>,
}

/// `catch (param) body`
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Identity; the parameter and body share one catch scope.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// `None` for `catch { … }`.
    pub param: Option<Pat>,
    /// Handler body.
    pub body: BlockStmt,
}

/// `return argument?;`
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Returned value.
    pub argument: Option<Box<Expr>>,
}

/// `throw argument;`
#[derive(Debug, Clone)]
pub struct ThrowStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Thrown value.
    pub argument: Box<Expr>,
}

/// `break` / `continue` with an optional label.
#[derive(Debug, Clone)]
pub struct JumpStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Target label.
    pub label: Option<Ident>,
}

/// `label: body`
#[derive(Debug, Clone)]
pub struct LabeledStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The label.
    pub label: Ident,
    /// Labeled statement.
    pub body: Box<Stmt>,
}

/// `with (object) body`
#[derive(Debug, Clone)]
pub struct WithStmt {
    /// Identity; the body is resolved dynamically.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Scope object.
    pub object: Box<Expr>,
    /// Body.
    pub body: Box<Stmt>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Variable declarations
// ─────────────────────────────────────────────────────────────────────────────

/// `var` / `let` / `const` followed by one or more declarators.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// Declaration keyword.
    pub kind: VarKind,
    /// Declarators in source order.
    pub declarators: Vec<VarDeclarator>,
}

/// The declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Function-scoped.
    Var,
    /// Block-scoped, reassignable.
    Let,
    /// Block-scoped, not reassignable.
    Const,
}

impl VarKind {
    /// The keyword as written.
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// `target [= init]`
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    /// Identity.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Binding pattern.
    pub id: Pat,
    /// Initializer.
    pub init: Option<Box<Expr>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions and classes
// ─────────────────────────────────────────────────────────────────────────────

/// A non-arrow function: declaration, expression, method, or accessor.
#[derive(Debug, Clone)]
pub struct Function {
    /// Identity; maps to the function's scope.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Name; always present for declarations except `export default`.
    pub id: Option<Ident>,
    /// `async function`.
    pub is_async: bool,
    /// `function*`.
    pub is_generator: bool,
    /// Formal parameters; defaults appear as [`Pat::Assign`].
    pub params: Vec<Pat>,
    /// Function body.
    pub body: BlockStmt,
}

/// `[async] (params) => body`
#[derive(Debug, Clone)]
pub struct ArrowExpr {
    /// Identity.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// `async` arrow.
    pub is_async: bool,
    /// Formal parameters.
    pub params: Vec<Pat>,
    /// Block or concise body.
    pub body: ArrowBody,
}

/// The body of an arrow function.
#[derive(Debug, Clone)]
pub enum ArrowBody {
    /// `{ statements }`
    Block(BlockStmt),
    /// Concise expression body.
    Expr(Box<Expr>),
}

/// `class [id] [extends super_class] { members }`
#[derive(Debug, Clone)]
pub struct Class {
    /// Identity; maps to the class-body scope holding the inner name.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Class name.
    pub id: Option<Ident>,
    /// Heritage expression.
    pub super_class: Option<Box<Expr>>,
    /// Members in source order.
    pub members: Vec<ClassMember>,
}

/// A member of a class body.
#[derive(Debug, Clone)]
pub enum ClassMember {
    /// Constructor, method, getter, or setter.
    Method(MethodDef),
    /// Field (public or private).
    Field(FieldDef),
    /// `static { … }`
    StaticBlock(StaticBlock),
}

/// The flavour of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// `constructor(…) { … }`
    Constructor,
    /// Plain method.
    Method,
    /// `get key() { … }`
    Get,
    /// `set key(v) { … }`
    Set,
}

/// `[static] [get|set] key(params) { body }`
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Source location.
    pub loc: SourceLocation,
    /// `static`.
    pub is_static: bool,
    /// Method flavour.
    pub kind: MethodKind,
    /// Key.
    pub key: PropKey,
    /// The method's function value.
    pub value: Box<Function>,
}

/// `[static] key [= value];`
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Source location.
    pub loc: SourceLocation,
    /// `static`.
    pub is_static: bool,
    /// Key.
    pub key: PropKey,
    /// Initializer.
    pub value: Option<Box<Expr>>,
}

/// `static { … }`
#[derive(Debug, Clone)]
pub struct StaticBlock {
    /// Identity; a static block behaves as its own function body.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Body statements.
    pub body: Vec<Stmt>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Module declarations
// ─────────────────────────────────────────────────────────────────────────────

/// `import specifiers from "source";` or `import "source";`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// Imported bindings (empty for a bare side-effect import).
    pub specifiers: Vec<ImportSpecifier>,
    /// Module specifier.
    pub source: StringLit,
}

/// One binding introduced by an `import`.
#[derive(Debug, Clone)]
pub enum ImportSpecifier {
    /// `name`
    Default(Ident),
    /// `* as name`
    Namespace(Ident),
    /// `{ imported as local }`
    Named {
        /// Exported name in the source module.
        imported: ModuleExportName,
        /// Local binding.
        local: Ident,
    },
}

impl ImportSpecifier {
    /// The local binding this specifier introduces.
    pub fn local(&self) -> &Ident {
        match self {
            ImportSpecifier::Default(id) | ImportSpecifier::Namespace(id) => id,
            ImportSpecifier::Named { local, .. } => local,
        }
    }
}

/// An identifier or string used as an import/export name.
#[derive(Debug, Clone)]
pub enum ModuleExportName {
    /// Identifier name.
    Ident(Ident),
    /// Arbitrary string name.
    Str(StringLit),
}

/// `{ local as exported }`
#[derive(Debug, Clone)]
pub struct ExportSpecifier {
    /// Local (or re-exported) name.
    pub local: ModuleExportName,
    /// Exported name; equal to `local` when no `as` clause was written.
    pub exported: Option<ModuleExportName>,
}

/// Any form of `export`.
#[derive(Debug, Clone)]
pub enum ExportDecl {
    /// `export var/let/const/function/class …`
    Decl {
        /// Source location.
        loc: SourceLocation,
        /// The exported declaration.
        decl: Box<Stmt>,
    },
    /// `export { a, b as c } [from "m"];`
    Named {
        /// Source location.
        loc: SourceLocation,
        /// Specifiers.
        specifiers: Vec<ExportSpecifier>,
        /// Re-export source.
        source: Option<StringLit>,
    },
    /// `export * [as ns] from "m";`
    All {
        /// Source location.
        loc: SourceLocation,
        /// `as ns` alias.
        exported: Option<ModuleExportName>,
        /// Source module.
        source: StringLit,
    },
    /// `export default function/class/expr`
    Default {
        /// Source location.
        loc: SourceLocation,
        /// Exported value.
        value: ExportDefault,
    },
}

impl ExportDecl {
    /// Returns the source location of this declaration.
    pub fn loc(&self) -> SourceLocation {
        match self {
            ExportDecl::Decl { loc, .. }
            | ExportDecl::Named { loc, .. }
            | ExportDecl::All { loc, .. }
            | ExportDecl::Default { loc, .. } => *loc,
        }
    }
}

/// The value of `export default`.
#[derive(Debug, Clone)]
pub enum ExportDefault {
    /// `export default function [name]() {}`
    Fn(Box<Function>),
    /// `export default class [Name] {}`
    Class(Box<Class>),
    /// `export default expr;`
    Expr(Box<Expr>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

/// A primitive literal.
#[derive(Debug, Clone)]
pub struct Lit {
    /// Source location.
    pub loc: SourceLocation,
    /// Literal value.
    pub value: LitValue,
}

/// The value of a [`Lit`].
#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Number; `raw` is the source spelling and is what gets printed.
    Num {
        /// Parsed value.
        value: f64,
        /// Source text.
        raw: String,
    },
    /// BigInt; the source spelling including the `n` suffix.
    BigInt(String),
    /// Decoded string value.
    Str(String),
    /// `/pattern/flags` as written.
    Regex(String),
}

/// `` `quasi ${expr} quasi` ``
#[derive(Debug, Clone)]
pub struct TemplateLit {
    /// Source location.
    pub loc: SourceLocation,
    /// Raw text chunks; always one more than `expressions`.
    pub quasis: Vec<TemplateElement>,
    /// Substitutions.
    pub expressions: Vec<Expr>,
}

/// A raw text chunk inside a template.
#[derive(Debug, Clone)]
pub struct TemplateElement {
    /// Raw text (escapes left as written).
    pub raw: String,
    /// Cooked value; `None` for an invalid escape in a tagged template.
    pub cooked: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// A JavaScript expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Identifier reference.
    Ident(Ident),
    /// Primitive literal.
    Lit(Lit),
    /// Template literal.
    Template(Box<TemplateLit>),
    /// `this`
    This(SourceLocation),
    /// `super` (only as a callee or member object).
    Super(SourceLocation),
    /// `[a, , ...b]`
    Array(Box<ArrayExpr>),
    /// `{ a: 1, b, ...c }`
    Object(Box<ObjectExpr>),
    /// Function expression.
    Fn(Box<Function>),
    /// Arrow function.
    Arrow(Box<ArrowExpr>),
    /// Class expression.
    Class(Box<Class>),
    /// Prefix unary operator.
    Unary(Box<UnaryExpr>),
    /// `++` / `--`
    Update(Box<UpdateExpr>),
    /// Binary operator.
    Binary(Box<BinaryExpr>),
    /// `&&`, `||`, `??`
    Logical(Box<LogicalExpr>),
    /// `test ? a : b`
    Conditional(Box<ConditionalExpr>),
    /// Assignment.
    Assign(Box<AssignExpr>),
    /// `a, b, c`
    Sequence(Box<SequenceExpr>),
    /// `a.b`, `a[b]`, `a?.b`
    Member(Box<MemberExpr>),
    /// `f(x)`, `f?.(x)`
    Call(Box<CallExpr>),
    /// `new C(x)`
    New(Box<NewExpr>),
    /// `` tag`…` ``
    TaggedTemplate(Box<TaggedTemplateExpr>),
    /// `...x` inside array literals and argument lists.
    Spread(Box<SpreadElement>),
    /// `yield [*] x`
    Yield(Box<YieldExpr>),
    /// `await x`
    Await(Box<AwaitExpr>),
    /// `import(x)`
    Import(Box<ImportCall>),
    /// `new.target` / `import.meta`
    MetaProp(Box<MetaProp>),
}

impl Expr {
    /// Returns the source location of this expression.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Ident(e) => e.loc,
            Expr::Lit(e) => e.loc,
            Expr::Template(e) => e.loc,
            Expr::This(loc) | Expr::Super(loc) => *loc,
            Expr::Array(e) => e.loc,
            Expr::Object(e) => e.loc,
            Expr::Fn(e) => e.loc,
            Expr::Arrow(e) => e.loc,
            Expr::Class(e) => e.loc,
            Expr::Unary(e) => e.loc,
            Expr::Update(e) => e.loc,
            Expr::Binary(e) => e.loc,
            Expr::Logical(e) => e.loc,
            Expr::Conditional(e) => e.loc,
            Expr::Assign(e) => e.loc,
            Expr::Sequence(e) => e.loc,
            Expr::Member(e) => e.loc,
            Expr::Call(e) => e.loc,
            Expr::New(e) => e.loc,
            Expr::TaggedTemplate(e) => e.loc,
            Expr::Spread(e) => e.loc,
            Expr::Yield(e) => e.loc,
            Expr::Await(e) => e.loc,
            Expr::Import(e) => e.loc,
            Expr::MetaProp(e) => e.loc,
        }
    }

    /// `Some(name)` when this is a plain identifier reference.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(id) => Some(&id.name),
            _ => None,
        }
    }
}

/// `[elements]`; `None` marks a hole.
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements.
    pub elements: Vec<Option<Expr>>,
}

/// `{ properties }`
#[derive(Debug, Clone)]
pub struct ObjectExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Properties in source order.
    pub properties: Vec<ObjectProp>,
}

/// One entry in an object literal.
#[derive(Debug, Clone)]
pub enum ObjectProp {
    /// `key: value`
    KeyValue {
        /// Key.
        key: PropKey,
        /// Value.
        value: Box<Expr>,
    },
    /// `{ name }`
    Shorthand(Ident),
    /// `{ name = default }`; only valid once reinterpreted as a pattern.
    CoverInit {
        /// Binding name.
        key: Ident,
        /// Default value.
        init: Box<Expr>,
    },
    /// Method, getter, or setter.
    Method {
        /// `Method`, `Get`, or `Set`.
        kind: MethodKind,
        /// Key.
        key: PropKey,
        /// Function value.
        value: Box<Function>,
    },
    /// `...expr`
    Spread(Box<Expr>),
}

/// A property key in an object literal, class, or object pattern.
#[derive(Debug, Clone)]
pub enum PropKey {
    /// Identifier name (reserved words allowed).
    Ident(Ident),
    /// `#name`
    Private(PrivateIdent),
    /// `"key"`
    Str(StringLit),
    /// Numeric key; source spelling.
    Num(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// `...argument`
#[derive(Debug, Clone)]
pub struct SpreadElement {
    /// Source location.
    pub loc: SourceLocation,
    /// Spread value.
    pub argument: Box<Expr>,
}

/// Prefix unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
    /// `delete`
    Delete,
}

impl UnaryOp {
    /// The operator as written.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

/// `op argument`
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Operator.
    pub op: UnaryOp,
    /// Operand.
    pub argument: Box<Expr>,
}

/// `++x`, `x--`, …
#[derive(Debug, Clone)]
pub struct UpdateExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// `true` for `++`, `false` for `--`.
    pub increment: bool,
    /// Prefix form.
    pub prefix: bool,
    /// Target.
    pub argument: Box<Expr>,
}

/// Binary (non-logical, non-assignment) operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Exp,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `in`
    In,
    /// `instanceof`
    Instanceof,
}

impl BinaryOp {
    /// The operator as written.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Exp => "**",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

/// `left op right`
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Operator.
    pub op: BinaryOp,
    /// Left operand.
    pub left: Box<Expr>,
    /// Right operand.
    pub right: Box<Expr>,
}

/// Short-circuit operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}

impl LogicalOp {
    /// The operator as written.
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::Nullish => "??",
        }
    }
}

/// `left op right`
#[derive(Debug, Clone)]
pub struct LogicalExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Operator.
    pub op: LogicalOp,
    /// Left operand.
    pub left: Box<Expr>,
    /// Right operand.
    pub right: Box<Expr>,
}

/// `test ? consequent : alternate`
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Condition.
    pub test: Box<Expr>,
    /// Taken branch.
    pub consequent: Box<Expr>,
    /// Not-taken branch.
    pub alternate: Box<Expr>,
}

/// Assignment operator; `"="` or a compound form such as `"+="`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignOp(pub &'static str);

/// `left op right`
#[derive(Debug, Clone)]
pub struct AssignExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Operator.
    pub op: AssignOp,
    /// Target; simple targets are [`Pat::Expr`] or [`Pat::Ident`].
    pub left: Pat,
    /// Assigned value.
    pub right: Box<Expr>,
}

/// `a, b, c`
#[derive(Debug, Clone)]
pub struct SequenceExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Expressions in order.
    pub expressions: Vec<Expr>,
}

/// The property part of a member expression.
#[derive(Debug, Clone)]
pub enum MemberProp {
    /// `.name`
    Ident(Ident),
    /// `.#name`
    Private(PrivateIdent),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// `object.property`, `object[property]`, or with `?.`.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Object.
    pub object: Box<Expr>,
    /// Property.
    pub property: MemberProp,
    /// Accessed with `?.`.
    pub optional: bool,
}

/// `callee(arguments)` or `callee?.(arguments)`.
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Identity; calls are float candidates.
    pub node_id: NodeId,
    /// Source location.
    pub loc: SourceLocation,
    /// Callee.
    pub callee: Box<Expr>,
    /// Arguments.
    pub arguments: Vec<Expr>,
    /// Called with `?.(`.
    pub optional: bool,
}

/// `new callee(arguments)`; `arguments` is empty for `new C`.
#[derive(Debug, Clone)]
pub struct NewExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Constructor.
    pub callee: Box<Expr>,
    /// Arguments.
    pub arguments: Vec<Expr>,
}

/// `` tag`quasi` ``
#[derive(Debug, Clone)]
pub struct TaggedTemplateExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Tag function.
    pub tag: Box<Expr>,
    /// Template.
    pub quasi: TemplateLit,
}

/// `yield [*] [argument]`
#[derive(Debug, Clone)]
pub struct YieldExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// `yield*`.
    pub delegate: bool,
    /// Yielded value.
    pub argument: Option<Box<Expr>>,
}

/// `await argument`
#[derive(Debug, Clone)]
pub struct AwaitExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Awaited value.
    pub argument: Box<Expr>,
}

/// `import(source [, options])`
#[derive(Debug, Clone)]
pub struct ImportCall {
    /// Source location.
    pub loc: SourceLocation,
    /// Module specifier.
    pub source: Box<Expr>,
    /// Options object.
    pub options: Option<Box<Expr>>,
}

/// `new.target` or `import.meta`.
#[derive(Debug, Clone)]
pub struct MetaProp {
    /// Source location.
    pub loc: SourceLocation,
    /// `new` or `import`.
    pub meta: &'static str,
    /// `target` or `meta`.
    pub property: &'static str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

/// A binding pattern, or an assignment target.
#[derive(Debug, Clone)]
pub enum Pat {
    /// `name`
    Ident(Ident),
    /// `[a, , ...b]`
    Array(Box<ArrayPat>),
    /// `{ a, b: c, ...d }`
    Object(Box<ObjectPat>),
    /// `...target`
    Rest(Box<Pat>),
    /// `target = default`
    Assign(Box<AssignPat>),
    /// Member-expression target; only in assignment position.
    Expr(Box<Expr>),
}

impl Pat {
    /// Returns the source location of this pattern.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Pat::Ident(p) => p.loc,
            Pat::Array(p) => p.loc,
            Pat::Object(p) => p.loc,
            Pat::Rest(p) => p.loc(),
            Pat::Assign(p) => p.loc,
            Pat::Expr(e) => e.loc(),
        }
    }

    /// Every identifier this pattern binds, in source order.
    pub fn bound_names(&self) -> Vec<&Ident> {
        let mut out = Vec::new();
        self.collect_bound_names(&mut out);
        out
    }

    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        match self {
            Pat::Ident(id) => out.push(id),
            Pat::Array(a) => {
                for el in a.elements.iter().flatten() {
                    el.collect_bound_names(out);
                }
            }
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue { value, .. } => value.collect_bound_names(out),
                        ObjectPatProp::Shorthand { key, .. } => out.push(key),
                        ObjectPatProp::Rest(rest) => rest.collect_bound_names(out),
                    }
                }
            }
            Pat::Rest(inner) => inner.collect_bound_names(out),
            Pat::Assign(a) => a.left.collect_bound_names(out),
            Pat::Expr(_) => {}
        }
    }
}

/// `[elements]`; `None` marks a hole.
#[derive(Debug, Clone)]
pub struct ArrayPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements.
    pub elements: Vec<Option<Pat>>,
}

/// `{ properties }`
#[derive(Debug, Clone)]
pub struct ObjectPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Properties.
    pub properties: Vec<ObjectPatProp>,
}

/// One entry in an object pattern.
#[derive(Debug, Clone)]
pub enum ObjectPatProp {
    /// `key: pattern`
    KeyValue {
        /// Key.
        key: PropKey,
        /// Target pattern (may carry a default).
        value: Pat,
    },
    /// `name [= default]`
    Shorthand {
        /// Binding name.
        key: Ident,
        /// Default.
        default: Option<Box<Expr>>,
    },
    /// `...rest`
    Rest(Pat),
}

/// `left = right`
#[derive(Debug, Clone)]
pub struct AssignPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Target.
    pub left: Pat,
    /// Default value.
    pub right: Box<Expr>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ident_pat(name: &str) -> Pat {
        Pat::Ident(Ident::synthetic(name))
    }

    #[test]
    fn test_fresh_id_is_monotonic() {
        let mut prog = Program {
            loc: SourceLocation::default(),
            source_type: SourceType::Script,
            body: vec![],
            next_node_id: 7,
        };
        assert_eq!(prog.fresh_id(), NodeId(7));
        assert_eq!(prog.fresh_id(), NodeId(8));
        assert_eq!(prog.next_node_id, 9);
    }

    #[test]
    fn test_bound_names_walks_nested_patterns() {
        let pat = Pat::Object(Box::new(ObjectPat {
            loc: SourceLocation::default(),
            properties: vec![
                ObjectPatProp::Shorthand {
                    key: Ident::synthetic("a"),
                    default: None,
                },
                ObjectPatProp::KeyValue {
                    key: PropKey::Ident(Ident::synthetic("ignored")),
                    value: Pat::Array(Box::new(ArrayPat {
                        loc: SourceLocation::default(),
                        elements: vec![
                            Some(ident_pat("b")),
                            None,
                            Some(Pat::Rest(Box::new(ident_pat("c")))),
                        ],
                    })),
                },
                ObjectPatProp::Rest(Pat::Assign(Box::new(AssignPat {
                    loc: SourceLocation::default(),
                    left: ident_pat("d"),
                    right: Box::new(Expr::Ident(Ident::synthetic("e"))),
                }))),
            ],
        }));
        let names: Vec<&str> = pat.bound_names().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_member_target_binds_nothing() {
        let pat = Pat::Expr(Box::new(Expr::Ident(Ident::synthetic("x"))));
        assert!(pat.bound_names().is_empty());
    }

    #[test]
    fn test_operator_spellings() {
        assert_eq!(BinaryOp::UShr.as_str(), ">>>");
        assert_eq!(BinaryOp::Instanceof.as_str(), "instanceof");
        assert_eq!(LogicalOp::Nullish.as_str(), "??");
        assert_eq!(UnaryOp::Typeof.as_str(), "typeof");
        assert_eq!(VarKind::Const.as_str(), "const");
    }

    #[test]
    fn test_as_ident() {
        assert_eq!(Expr::Ident(Ident::synthetic("f")).as_ident(), Some("f"));
        assert_eq!(Expr::This(SourceLocation::default()).as_ident(), None);
    }
}
