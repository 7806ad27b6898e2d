//! ES2025 JavaScript lexer (scanner).
//!
//! See [`Scanner`] for the main entry point.  Comments and whitespace are
//! consumed silently; the only trace they leave is
//! [`Token::had_line_terminator_before`], which the parser needs for
//! automatic semicolon insertion.

use crate::error::{LetFloatError, LetFloatResult};

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// A byte offset + line/column location in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the beginning of the source string.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, measured in Unicode scalar values.
    pub column: u32,
}

/// A half-open `[start, end)` source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Inclusive start of the span.
    pub start: Position,
    /// Exclusive end of the span.
    pub end: Position,
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic category of a JavaScript lexical token.
///
/// Contextual keywords (`async`, `of`, `get`, `set`, `static`, `let`, `from`,
/// `as`, …) are scanned as [`TokenKind::Identifier`]; the parser decides
/// their role from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────────────────
    /// Decimal, hex, binary, octal, or BigInt numeric literal.
    NumericLiteral,
    /// String literal enclosed in `"` or `'`.
    StringLiteral,
    /// A complete template literal with no substitutions: `` `…` ``.
    NoSubstitutionTemplate,
    /// Opening span of a substituted template: `` `…${ ``.
    TemplateHead,
    /// Middle span between two substitutions: `}…${`.
    TemplateMiddle,
    /// Closing span of a substituted template: `` }…` ``.
    TemplateTail,
    /// Regular expression literal `/pattern/flags`.
    RegExpLiteral,

    // ── Identifiers ───────────────────────────────────────────────────────
    /// An identifier that is not a reserved word.
    Identifier,
    /// A private identifier beginning with `#`.
    PrivateIdentifier,

    // ── Reserved words ────────────────────────────────────────────────────
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // ── Punctuators ───────────────────────────────────────────────────────
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    DotDotDot,
    Semicolon,
    Comma,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    EqualEqualEqual,
    BangEqualEqual,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,
    Ampersand,
    Pipe,
    Caret,
    Bang,
    Tilde,
    AmpersandAmpersand,
    PipePipe,
    QuestionQuestion,
    Question,
    Colon,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    StarStarEqual,
    SlashEqual,
    PercentEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    GreaterGreaterGreaterEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    AmpersandAmpersandEqual,
    PipePipeEqual,
    QuestionQuestionEqual,
    /// `=>`
    Arrow,
    /// `?.`
    QuestionDot,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns `true` for reserved words.  Reserved words may still appear as
    /// property names (`a.default`, `{ new: 1 }`).
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Break
                | Case
                | Catch
                | Class
                | Const
                | Continue
                | Debugger
                | Default
                | Delete
                | Do
                | Else
                | Enum
                | Export
                | Extends
                | False
                | Finally
                | For
                | Function
                | If
                | Import
                | In
                | Instanceof
                | New
                | Null
                | Return
                | Super
                | Switch
                | This
                | Throw
                | True
                | Try
                | Typeof
                | Var
                | Void
                | While
                | With
        )
    }

    /// Returns `true` for the compound assignment operators and `=`.
    pub fn is_assign_op(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Equal
                | PlusEqual
                | MinusEqual
                | StarEqual
                | StarStarEqual
                | SlashEqual
                | PercentEqual
                | LessLessEqual
                | GreaterGreaterEqual
                | GreaterGreaterGreaterEqual
                | AmpersandEqual
                | PipeEqual
                | CaretEqual
                | AmpersandAmpersandEqual
                | PipePipeEqual
                | QuestionQuestionEqual
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenValue / Token
// ─────────────────────────────────────────────────────────────────────────────

/// The payload value associated with a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// No semantic value (punctuators, reserved words, EOF).
    None,
    /// Identifier name (escapes decoded), decoded string literal value, raw
    /// template chunk, or raw regular-expression literal text.
    Str(String),
    /// Parsed numeric value for [`TokenKind::NumericLiteral`].
    Number(f64),
}

/// A single lexical token produced by the [`Scanner`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The syntactic category.
    pub kind: TokenKind,
    /// The associated value, if any.
    pub value: TokenValue,
    /// Source location of this token.
    pub span: Span,
    /// `true` when at least one line terminator (possibly inside a comment)
    /// appeared between the previous token and this one.
    pub had_line_terminator_before: bool,
}

impl Token {
    /// The string payload, or `""` for tokens without one.
    pub fn text(&self) -> &str {
        match &self.value {
            TokenValue::Str(s) => s,
            _ => "",
        }
    }

    /// `true` when this token is the identifier `word` (used for contextual
    /// keywords such as `async`, `of`, `get`).
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text() == word
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Character-classification helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\x0B' | '\x0C' | ' ' | '\u{00A0}' | '\u{FEFF}' | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    ) || is_line_terminator(c)
}

/// Returns `true` for characters that may *start* a JS identifier.
pub fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// Returns `true` for characters that may *continue* a JS identifier.
pub fn is_id_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' || c.is_alphanumeric()
}

fn keyword_kind(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match s {
        "break" => Break,
        "case" => Case,
        "catch" => Catch,
        "class" => Class,
        "const" => Const,
        "continue" => Continue,
        "debugger" => Debugger,
        "default" => Default,
        "delete" => Delete,
        "do" => Do,
        "else" => Else,
        "enum" => Enum,
        "export" => Export,
        "extends" => Extends,
        "false" => False,
        "finally" => Finally,
        "for" => For,
        "function" => Function,
        "if" => If,
        "import" => Import,
        "in" => In,
        "instanceof" => Instanceof,
        "new" => New,
        "null" => Null,
        "return" => Return,
        "super" => Super,
        "switch" => Switch,
        "this" => This,
        "throw" => Throw,
        "true" => True,
        "try" => Try,
        "typeof" => Typeof,
        "var" => Var,
        "void" => Void,
        "while" => While,
        "with" => With,
        _ => return None,
    };
    Some(kind)
}

/// Punctuators ordered longest-first so the first prefix match wins.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    (">>>=", TokenKind::GreaterGreaterGreaterEqual),
    ("...", TokenKind::DotDotDot),
    ("===", TokenKind::EqualEqualEqual),
    ("!==", TokenKind::BangEqualEqual),
    ("**=", TokenKind::StarStarEqual),
    ("<<=", TokenKind::LessLessEqual),
    (">>=", TokenKind::GreaterGreaterEqual),
    (">>>", TokenKind::GreaterGreaterGreater),
    ("&&=", TokenKind::AmpersandAmpersandEqual),
    ("||=", TokenKind::PipePipeEqual),
    ("??=", TokenKind::QuestionQuestionEqual),
    ("=>", TokenKind::Arrow),
    ("==", TokenKind::EqualEqual),
    ("!=", TokenKind::BangEqual),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("**", TokenKind::StarStar),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("<<", TokenKind::LessLess),
    (">>", TokenKind::GreaterGreater),
    ("&&", TokenKind::AmpersandAmpersand),
    ("||", TokenKind::PipePipe),
    ("??", TokenKind::QuestionQuestion),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::StarEqual),
    ("%=", TokenKind::PercentEqual),
    ("&=", TokenKind::AmpersandEqual),
    ("|=", TokenKind::PipeEqual),
    ("^=", TokenKind::CaretEqual),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("%", TokenKind::Percent),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("!", TokenKind::Bang),
    ("~", TokenKind::Tilde),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("=", TokenKind::Equal),
    (".", TokenKind::Dot),
];

/// `/` is *division* only after tokens that end a value; everywhere else it
/// opens a regular-expression literal.  A `}` is ambiguous (block vs. object
/// literal) and is treated as a block end; the parser corrects the guess with
/// [`Scanner::rescan_slash`] when it knows better.
fn slash_is_regexp(last: Option<TokenKind>) -> bool {
    match last {
        None => true,
        Some(k) => !matches!(
            k,
            TokenKind::Identifier
                | TokenKind::PrivateIdentifier
                | TokenKind::NumericLiteral
                | TokenKind::StringLiteral
                | TokenKind::NoSubstitutionTemplate
                | TokenKind::TemplateTail
                | TokenKind::RegExpLiteral
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::Super
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// ES2025 JavaScript lexer.
///
/// # Example
///
/// ```
/// use letfloat_core::parser::scanner::{Scanner, TokenKind};
///
/// let mut sc = Scanner::new("let x = 42;");
/// loop {
///     let tok = sc.next_token().unwrap();
///     if tok.kind == TokenKind::Eof { break; }
///     println!("{:?}", tok.kind);
/// }
/// ```
#[derive(Clone)]
pub struct Scanner<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    /// `brace_depth` recorded at each open template substitution; a `}` at
    /// that depth resumes the template instead of closing a block.
    template_stack: Vec<usize>,
    brace_depth: usize,
    last_significant_kind: Option<TokenKind>,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for the given UTF-8 source string.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            template_stack: Vec::new(),
            brace_depth: 0,
            last_significant_kind: None,
        }
    }

    /// The complete source text being scanned.
    pub fn source(&self) -> &'src str {
        self.source
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek2(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Advance past the current character.  `\r\n` counts as one line break.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        match ch {
            '\r' => {
                if self.rest().starts_with('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.column = 1;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn advance_bytes(&mut self, n: usize) {
        let target = self.pos + n;
        while self.pos < target && self.advance().is_some() {}
    }

    fn current_pos(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn error_at(&self, pos: Position, message: impl Into<String>) -> LetFloatError {
        LetFloatError::syntax(message, pos.line, pos.column)
    }

    // ── Trivia ──────────────────────────────────────────────────────────────

    /// Skip whitespace and comments; return `true` if a line terminator was
    /// crossed.
    fn skip_trivia(&mut self) -> LetFloatResult<bool> {
        let mut had_lt = false;
        // A `#!` line is only legal at the very start of the source.
        if self.pos == 0 && self.rest().starts_with("#!") {
            while matches!(self.peek(), Some(c) if !is_line_terminator(c)) {
                self.advance();
            }
        }
        loop {
            match self.peek() {
                Some(c) if is_js_whitespace(c) => {
                    had_lt |= is_line_terminator(c);
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while matches!(self.peek(), Some(c) if !is_line_terminator(c)) {
                        self.advance();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.current_pos();
                    self.advance_bytes(2);
                    loop {
                        if self.rest().starts_with("*/") {
                            self.advance_bytes(2);
                            break;
                        }
                        match self.advance() {
                            Some(c) => had_lt |= is_line_terminator(c),
                            None => return Err(self.error_at(start, "unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(had_lt),
            }
        }
    }

    // ── Escapes ─────────────────────────────────────────────────────────────

    fn read_hex(&mut self, digits: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..digits {
            let d = self.peek()?.to_digit(16)?;
            self.advance();
            value = value * 16 + d;
        }
        Some(value)
    }

    /// Decode a `\u` escape body (after the `u`): `XXXX` or `{X…}`.
    fn read_unicode_escape(&mut self) -> Option<char> {
        if self.peek() == Some('{') {
            self.advance();
            let mut value = 0u32;
            let mut count = 0;
            while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
                self.advance();
                value = value.checked_mul(16)?.checked_add(d)?;
                count += 1;
            }
            if count == 0 || self.peek() != Some('}') {
                return None;
            }
            self.advance();
            char::from_u32(value)
        } else {
            let hi = self.read_hex(4)?;
            if (0xD800..0xDC00).contains(&hi) && self.rest().starts_with("\\u") {
                // Surrogate pair spelled as two escapes.
                let save = (self.pos, self.line, self.column);
                self.advance_bytes(2);
                if let Some(lo) = self.read_hex(4)
                    && (0xDC00..0xE000).contains(&lo)
                {
                    return char::from_u32(0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00));
                }
                (self.pos, self.line, self.column) = save;
            }
            Some(char::from_u32(hi).unwrap_or('\u{FFFD}'))
        }
    }

    /// Decode one escape sequence after the `\`, appending the cooked text to
    /// `out`.  Returns `false` for a malformed escape.
    fn read_escape(&mut self, out: &mut String) -> bool {
        let Some(c) = self.advance() else {
            return false;
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{C}'),
            'v' => out.push('\u{B}'),
            '0' if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            'x' => match self.read_hex(2).and_then(char::from_u32) {
                Some(ch) => out.push(ch),
                None => return false,
            },
            'u' => match self.read_unicode_escape() {
                Some(ch) => out.push(ch),
                None => return false,
            },
            // Line continuation.
            c if is_line_terminator(c) => {}
            '1'..='7' | '0' => {
                // Legacy octal escape.
                let mut value = c.to_digit(8).unwrap_or(0);
                while let Some(d) = self.peek().and_then(|d| d.to_digit(8)) {
                    if value * 8 + d > 0o377 {
                        break;
                    }
                    self.advance();
                    value = value * 8 + d;
                }
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            other => out.push(other),
        }
        true
    }

    // ── String literal ──────────────────────────────────────────────────────

    fn scan_string(&mut self, quote: char, start: Position) -> LetFloatResult<TokenValue> {
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error_at(start, "unterminated string literal"));
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(TokenValue::Str(value));
                }
                Some('\\') => {
                    self.advance();
                    if !self.read_escape(&mut value) {
                        return Err(self.error_at(start, "invalid escape sequence in string"));
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    // ── Template literal body ───────────────────────────────────────────────

    /// Scan template characters after `` ` `` or after a substitution's `}`.
    /// Returns the raw chunk and whether it ended with `${`.
    fn scan_template_chunk(&mut self, start: Position) -> LetFloatResult<(String, bool)> {
        let chunk_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error_at(start, "unterminated template literal")),
                Some('`') => {
                    let raw = self.source[chunk_start..self.pos].to_owned();
                    self.advance();
                    return Ok((raw, false));
                }
                Some('$') if self.peek2() == Some('{') => {
                    let raw = self.source[chunk_start..self.pos].to_owned();
                    self.advance_bytes(2);
                    return Ok((raw, true));
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ── Regular-expression literal ──────────────────────────────────────────

    fn scan_regexp(&mut self, start: Position) -> LetFloatResult<TokenValue> {
        let mut in_class = false;
        loop {
            match self.advance() {
                None => return Err(self.error_at(start, "unterminated regular expression")),
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error_at(start, "unterminated regular expression"));
                }
                Some('\\') => {
                    if matches!(self.advance(), None | Some('\n') | Some('\r')) {
                        return Err(self.error_at(start, "unterminated regular expression"));
                    }
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        Ok(TokenValue::Str(
            self.source[start.offset..self.pos].to_owned(),
        ))
    }

    // ── Numeric literal ─────────────────────────────────────────────────────

    fn eat_digits(&mut self, radix: u32) {
        while matches!(self.peek(), Some(c) if c.is_digit(radix) || c == '_') {
            self.advance();
        }
    }

    fn scan_numeric(&mut self, start: Position) -> LetFloatResult<TokenValue> {
        let radix = if self.peek() == Some('0') {
            match self.peek2() {
                Some('x' | 'X') => 16,
                Some('o' | 'O') => 8,
                Some('b' | 'B') => 2,
                _ => 10,
            }
        } else {
            10
        };
        if radix != 10 {
            self.advance_bytes(2);
            self.eat_digits(radix);
        } else {
            self.eat_digits(10);
            if self.peek() == Some('.') {
                self.advance();
                self.eat_digits(10);
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.eat_digits(10);
            }
        }
        if self.peek() == Some('n') {
            self.advance();
        }
        if matches!(self.peek(), Some(c) if is_id_start(c)) {
            return Err(self.error_at(start, "identifier starts immediately after numeric literal"));
        }
        Ok(TokenValue::Number(parse_numeric_raw(
            &self.source[start.offset..self.pos],
        )))
    }

    // ── Identifier / keyword ────────────────────────────────────────────────

    /// Scan an identifier name; returns the decoded name and whether any
    /// `\u` escape appeared in it.
    fn scan_identifier_name(&mut self, start: Position) -> LetFloatResult<(String, bool)> {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('\\') => {
                    self.advance();
                    let decoded = (self.advance() == Some('u'))
                        .then(|| self.read_unicode_escape())
                        .flatten();
                    match decoded {
                        Some(c) if is_id_continue(c) => name.push(c),
                        _ => return Err(self.error_at(start, "invalid escape in identifier")),
                    }
                    escaped = true;
                }
                Some(c) if is_id_continue(c) => {
                    self.advance();
                    name.push(c);
                }
                _ => return Ok((name, escaped)),
            }
        }
    }

    // ── Main public API ─────────────────────────────────────────────────────

    /// Scan and return the next [`Token`].
    ///
    /// Returns a token with [`TokenKind::Eof`] when the input is exhausted.
    pub fn next_token(&mut self) -> LetFloatResult<Token> {
        let had_lt = self.skip_trivia()?;
        let start = self.current_pos();
        let (kind, value) = self.scan_token(start)?;
        self.last_significant_kind = Some(kind);
        Ok(Token {
            kind,
            value,
            span: Span {
                start,
                end: self.current_pos(),
            },
            had_line_terminator_before: had_lt,
        })
    }

    fn scan_token(&mut self, start: Position) -> LetFloatResult<(TokenKind, TokenValue)> {
        let Some(c) = self.peek() else {
            return Ok((TokenKind::Eof, TokenValue::None));
        };
        match c {
            '"' | '\'' => {
                self.advance();
                Ok((TokenKind::StringLiteral, self.scan_string(c, start)?))
            }
            '`' => {
                self.advance();
                let (raw, has_sub) = self.scan_template_chunk(start)?;
                let kind = if has_sub {
                    self.template_stack.push(self.brace_depth);
                    TokenKind::TemplateHead
                } else {
                    TokenKind::NoSubstitutionTemplate
                };
                Ok((kind, TokenValue::Str(raw)))
            }
            '}' if self.template_stack.last() == Some(&self.brace_depth) => {
                self.template_stack.pop();
                self.advance();
                let (raw, has_sub) = self.scan_template_chunk(start)?;
                let kind = if has_sub {
                    self.template_stack.push(self.brace_depth);
                    TokenKind::TemplateMiddle
                } else {
                    TokenKind::TemplateTail
                };
                Ok((kind, TokenValue::Str(raw)))
            }
            '{' => {
                self.advance();
                self.brace_depth += 1;
                Ok((TokenKind::LeftBrace, TokenValue::None))
            }
            '}' => {
                self.advance();
                self.brace_depth = self.brace_depth.saturating_sub(1);
                Ok((TokenKind::RightBrace, TokenValue::None))
            }
            '0'..='9' => Ok((TokenKind::NumericLiteral, self.scan_numeric(start)?)),
            '.' if matches!(self.peek2(), Some(d) if d.is_ascii_digit()) => {
                Ok((TokenKind::NumericLiteral, self.scan_numeric(start)?))
            }
            '/' if slash_is_regexp(self.last_significant_kind) => {
                self.advance();
                let (pos, line, column) = (self.pos, self.line, self.column);
                match self.scan_regexp(start) {
                    Ok(raw) => Ok((TokenKind::RegExpLiteral, raw)),
                    // Not a well-formed literal: read it as division and let
                    // the parser re-scan if a regexp was actually required.
                    Err(_) => {
                        (self.pos, self.line, self.column) = (pos, line, column);
                        if self.peek() == Some('=') {
                            self.advance();
                            Ok((TokenKind::SlashEqual, TokenValue::None))
                        } else {
                            Ok((TokenKind::Slash, TokenValue::None))
                        }
                    }
                }
            }
            '/' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok((TokenKind::SlashEqual, TokenValue::None))
                } else {
                    Ok((TokenKind::Slash, TokenValue::None))
                }
            }
            '?' if self.rest().starts_with("?.")
                && !matches!(self.rest()[2..].chars().next(), Some(d) if d.is_ascii_digit()) =>
            {
                self.advance_bytes(2);
                Ok((TokenKind::QuestionDot, TokenValue::None))
            }
            '#' => {
                self.advance();
                if !matches!(self.peek(), Some(c) if is_id_start(c) || c == '\\') {
                    return Err(self.error_at(start, "invalid or unexpected token '#'"));
                }
                let (name, _) = self.scan_identifier_name(start)?;
                Ok((TokenKind::PrivateIdentifier, TokenValue::Str(name)))
            }
            c if is_id_start(c) || c == '\\' => {
                let (name, escaped) = self.scan_identifier_name(start)?;
                // Escaped spellings of reserved words stay identifiers.
                match keyword_kind(&name).filter(|_| !escaped) {
                    Some(kind) => Ok((kind, TokenValue::None)),
                    None => Ok((TokenKind::Identifier, TokenValue::Str(name))),
                }
            }
            _ => {
                let rest = self.rest();
                let Some(&(text, kind)) = PUNCTUATORS.iter().find(|(p, _)| rest.starts_with(p))
                else {
                    return Err(self.error_at(start, format!("unexpected character {c:?}")));
                };
                self.advance_bytes(text.len());
                Ok((kind, TokenValue::None))
            }
        }
    }

    /// Re-scan `tok`, which must start with `/`, as a regular expression
    /// (`as_regexp == true`) or as `/` / `/=`.
    pub fn rescan_slash(&mut self, tok: &Token, as_regexp: bool) -> LetFloatResult<Token> {
        let start = tok.span.start;
        self.pos = start.offset;
        self.line = start.line;
        self.column = start.column;
        self.advance();
        let (kind, value) = if as_regexp {
            (TokenKind::RegExpLiteral, self.scan_regexp(start)?)
        } else if self.peek() == Some('=') {
            self.advance();
            (TokenKind::SlashEqual, TokenValue::None)
        } else {
            (TokenKind::Slash, TokenValue::None)
        };
        self.last_significant_kind = Some(kind);
        Ok(Token {
            kind,
            value,
            span: Span {
                start,
                end: self.current_pos(),
            },
            had_line_terminator_before: tok.had_line_terminator_before,
        })
    }

    /// Convenience: tokenize the entire `source` string and return all tokens
    /// (the [`TokenKind::Eof`] sentinel is **not** included).
    ///
    /// # Errors
    ///
    /// Returns the first [`LetFloatError::SyntaxError`] encountered.
    pub fn tokenize_all(source: &'src str) -> LetFloatResult<Vec<Token>> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = scanner.next_token()?;
            if tok.kind == TokenKind::Eof {
                return Ok(tokens);
            }
            tokens.push(tok);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Parse the raw text of a numeric literal to an `f64`.
///
/// Numeric separators and the BigInt suffix are stripped first.
fn parse_numeric_raw(raw: &str) -> f64 {
    let clean: String = raw.chars().filter(|&c| c != '_' && c != 'n').collect();
    let radix_body = |prefix_len: usize, radix: u32| {
        u64::from_str_radix(&clean[prefix_len..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN)
    };
    match clean.get(..2) {
        Some("0x" | "0X") => radix_body(2, 16),
        Some("0o" | "0O") => radix_body(2, 8),
        Some("0b" | "0B") => radix_body(2, 2),
        _ => clean.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Cook a raw template chunk.  Returns `None` when the chunk contains an
/// invalid escape (legal only in tagged templates).
pub fn cook_template(raw: &str) -> Option<String> {
    let mut sc = Scanner::new(raw);
    let mut out = String::new();
    while let Some(c) = sc.peek() {
        sc.advance();
        match c {
            '\\' => {
                if !sc.read_escape(&mut out) {
                    return None;
                }
            }
            // Template line endings are normalised to `\n`.
            '\r' => out.push('\n'),
            c => out.push(c),
        }
    }
    Some(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::tokenize_all(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn tokens(src: &str) -> Vec<Token> {
        Scanner::tokenize_all(src).unwrap()
    }

    // ── Keywords and identifiers ─────────────────────────────────────────────

    #[test]
    fn test_reserved_words_and_contextual_identifiers() {
        assert_eq!(
            kinds("function return var async of"),
            vec![
                TokenKind::Function,
                TokenKind::Return,
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_identifier_value_and_escape() {
        let toks = tokens("$foo _bar \\u0061bc");
        assert_eq!(toks[0].text(), "$foo");
        assert_eq!(toks[1].text(), "_bar");
        assert_eq!(toks[2].text(), "abc");
        assert_eq!(toks[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_escaped_keyword_is_identifier() {
        let toks = tokens("\\u0076ar");
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[0].text(), "var");
    }

    #[test]
    fn test_private_identifier() {
        let toks = tokens("this.#count");
        assert_eq!(toks[2].kind, TokenKind::PrivateIdentifier);
        assert_eq!(toks[2].text(), "count");
    }

    // ── Numbers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_numeric_literals() {
        let toks = tokens("42 3.5 .25 1e3 0xff 0b101 0o17 1_000 10n");
        let values: Vec<f64> = toks
            .iter()
            .map(|t| match t.value {
                TokenValue::Number(n) => n,
                _ => panic!("expected number, got {t:?}"),
            })
            .collect();
        assert_eq!(
            values,
            vec![42.0, 3.5, 0.25, 1000.0, 255.0, 5.0, 15.0, 1000.0, 10.0]
        );
    }

    #[test]
    fn test_number_followed_by_identifier_is_error() {
        assert!(Scanner::tokenize_all("3in").is_err());
    }

    // ── Strings ──────────────────────────────────────────────────────────────

    #[test]
    fn test_string_escapes_are_decoded() {
        let toks = tokens(r#""a\nb" 'it\'s' "\x41B\u{43}""#);
        assert_eq!(toks[0].text(), "a\nb");
        assert_eq!(toks[1].text(), "it's");
        assert_eq!(toks[2].text(), "ABC");
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = Scanner::tokenize_all("'abc").unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    // ── Templates ────────────────────────────────────────────────────────────

    #[test]
    fn test_template_with_substitutions() {
        assert_eq!(
            kinds("`a${b}c${ {d} }e`"),
            vec![
                TokenKind::TemplateHead,
                TokenKind::Identifier,
                TokenKind::TemplateMiddle,
                TokenKind::LeftBrace,
                TokenKind::Identifier,
                TokenKind::RightBrace,
                TokenKind::TemplateTail,
            ]
        );
    }

    #[test]
    fn test_cook_template() {
        assert_eq!(cook_template("a\\tb").as_deref(), Some("a\tb"));
        assert_eq!(cook_template("\\unicode"), None);
    }

    // ── Regexp vs division ───────────────────────────────────────────────────

    #[test]
    fn test_slash_disambiguation() {
        assert_eq!(
            kinds("a / b"),
            vec![TokenKind::Identifier, TokenKind::Slash, TokenKind::Identifier]
        );
        let toks = tokens("x = /a[/]b/gi");
        assert_eq!(toks[2].kind, TokenKind::RegExpLiteral);
        assert_eq!(toks[2].text(), "/a[/]b/gi");
    }

    // ── Punctuators and trivia ───────────────────────────────────────────────

    #[test]
    fn test_rescan_slash_both_ways() {
        let mut sc = Scanner::new("} /a/g");
        sc.next_token().unwrap();
        let guessed = sc.next_token().unwrap();
        assert_eq!(guessed.kind, TokenKind::RegExpLiteral);
        let div = sc.rescan_slash(&guessed, false).unwrap();
        assert_eq!(div.kind, TokenKind::Slash);
        assert_eq!(sc.next_token().unwrap().text(), "a");

        // An unterminated guess falls back to division.
        let mut sc = Scanner::new("} / 2");
        sc.next_token().unwrap();
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::Slash);

        let mut sc = Scanner::new("x /=a/g");
        sc.next_token().unwrap();
        let op = sc.next_token().unwrap();
        assert_eq!(op.kind, TokenKind::SlashEqual);
        let re = sc.rescan_slash(&op, true).unwrap();
        assert_eq!(re.kind, TokenKind::RegExpLiteral);
        assert_eq!(re.text(), "/=a/g");
    }

    #[test]
    fn test_longest_punctuator_wins() {
        assert_eq!(
            kinds("a >>>= b ?? c?.d ... =>"),
            vec![
                TokenKind::Identifier,
                TokenKind::GreaterGreaterGreaterEqual,
                TokenKind::Identifier,
                TokenKind::QuestionQuestion,
                TokenKind::Identifier,
                TokenKind::QuestionDot,
                TokenKind::Identifier,
                TokenKind::DotDotDot,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn test_optional_chain_not_confused_with_conditional_number() {
        assert_eq!(
            kinds("a?.5:1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::NumericLiteral,
                TokenKind::Colon,
                TokenKind::NumericLiteral,
            ]
        );
    }

    #[test]
    fn test_comments_record_line_terminators() {
        let toks = tokens("a /* x\n y */ b // tail\nc");
        assert!(!toks[0].had_line_terminator_before);
        assert!(toks[1].had_line_terminator_before);
        assert!(toks[2].had_line_terminator_before);
    }

    #[test]
    fn test_positions_track_lines() {
        let toks = tokens("a\n  b");
        assert_eq!(toks[1].span.start.line, 2);
        assert_eq!(toks[1].span.start.column, 3);
        assert_eq!(toks[1].span.start.offset, 4);
    }

    #[test]
    fn test_hashbang_is_skipped() {
        assert_eq!(kinds("#!/usr/bin/env node\nx"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_unexpected_character_is_error() {
        let err = Scanner::tokenize_all("a @ b").unwrap_err();
        assert!(matches!(err, LetFloatError::SyntaxError { column: 3, .. }));
    }
}
