//! VibeLang lexer: source text to a token stream with synthesized
//! indentation events.
//!
//! Indentation is significant: each nesting level is exactly two spaces
//! deeper than its enclosing level, and the lexer emits Indent/Dedent
//! tokens as the level changes. Blank lines and comment-only lines never
//! produce indentation events. Tabs in leading whitespace are an error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    // Identifiers
    Ident(String),
    // Keywords
    Define,
    Type,
    Expect,
    Ensure,
    Invariant,
    Given,
    When,
    Otherwise,
    Import,
    Export,
    True,
    False,
    SelfKw,
    Old,
    // Primitive type keywords
    IntTy,
    FloatTy,
    BoolTy,
    StringTy,
    ByteTy,
    UnitTy,
    ArrayTy,
    ResultTy,
    // Operators
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Eq,        // ==
    Neq,       // !=
    Lt,        // <
    Gt,        // >
    Le,        // <=
    Ge,        // >=
    And,       // &&
    Or,        // ||
    Not,       // !
    Arrow,     // ->
    Pipe,      // |
    Ampersand, // &
    Question,  // ?
    // Symbols
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Comma,    // ,
    Colon,    // :
    Dot,      // .
    Assign,   // =
    Ellipsis, // ...
    // Structure
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Short display name used by the `lex` token dump.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::IntLit(_) => "INT_LIT",
            TokenKind::FloatLit(_) => "FLOAT_LIT",
            TokenKind::StrLit(_) => "STR_LIT",
            TokenKind::Ident(_) => "IDENT",
            TokenKind::Define => "DEFINE",
            TokenKind::Type => "TYPE",
            TokenKind::Expect => "EXPECT",
            TokenKind::Ensure => "ENSURE",
            TokenKind::Invariant => "INVARIANT",
            TokenKind::Given => "GIVEN",
            TokenKind::When => "WHEN",
            TokenKind::Otherwise => "OTHERWISE",
            TokenKind::Import => "IMPORT",
            TokenKind::Export => "EXPORT",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::SelfKw => "SELF",
            TokenKind::Old => "OLD",
            TokenKind::IntTy => "INT",
            TokenKind::FloatTy => "FLOAT",
            TokenKind::BoolTy => "BOOL",
            TokenKind::StringTy => "STRING",
            TokenKind::ByteTy => "BYTE",
            TokenKind::UnitTy => "UNIT",
            TokenKind::ArrayTy => "ARRAY",
            TokenKind::ResultTy => "RESULT",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Eq => "EQ",
            TokenKind::Neq => "NEQ",
            TokenKind::Lt => "LT",
            TokenKind::Gt => "GT",
            TokenKind::Le => "LE",
            TokenKind::Ge => "GE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Arrow => "ARROW",
            TokenKind::Pipe => "PIPE",
            TokenKind::Ampersand => "AMPERSAND",
            TokenKind::Question => "QUESTION",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Dot => "DOT",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Ellipsis => "ELLIPSIS",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::Eof => "EOF",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, col: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            col,
        }
    }
}

#[derive(Debug, Error)]
pub enum LexError {
    #[error("Lex error [{line}:{col}]: {msg}")]
    Error {
        msg: String,
        line: usize,
        col: usize,
    },
}

impl LexError {
    pub fn location(&self) -> (usize, usize) {
        let LexError::Error { line, col, .. } = self;
        (*line, *col)
    }

    pub fn message(&self) -> String {
        let LexError::Error { msg, .. } = self;
        msg.clone()
    }
}

fn keyword(s: &str) -> Option<TokenKind> {
    match s {
        "define" => Some(TokenKind::Define),
        "type" => Some(TokenKind::Type),
        "expect" => Some(TokenKind::Expect),
        "ensure" => Some(TokenKind::Ensure),
        "invariant" => Some(TokenKind::Invariant),
        "given" => Some(TokenKind::Given),
        "when" => Some(TokenKind::When),
        "otherwise" => Some(TokenKind::Otherwise),
        "import" => Some(TokenKind::Import),
        "export" => Some(TokenKind::Export),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "self" => Some(TokenKind::SelfKw),
        "old" => Some(TokenKind::Old),
        "Int" => Some(TokenKind::IntTy),
        "Float" => Some(TokenKind::FloatTy),
        "Bool" => Some(TokenKind::BoolTy),
        "String" => Some(TokenKind::StringTy),
        "Byte" => Some(TokenKind::ByteTy),
        "Unit" => Some(TokenKind::UnitTy),
        "Array" => Some(TokenKind::ArrayTy),
        "Result" => Some(TokenKind::ResultTy),
        _ => None,
    }
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        // Line endings are normalized before scanning.
        let normalized = source.replace("\r\n", "\n");
        Lexer {
            chars: normalized.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            at_line_start: true,
        }
    }

    fn error(&self, msg: impl Into<String>) -> LexError {
        LexError::Error {
            msg: msg.into(),
            line: self.line,
            col: self.col,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.pos < self.chars.len() {
            self.scan_token(&mut tokens)?;
        }

        // Close any open indentation levels at end of input.
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, "", self.line, 1));
        }

        tokens.push(Token::new(TokenKind::Eof, "", self.line, self.col));
        Ok(tokens)
    }

    fn scan_token(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        if self.at_line_start {
            self.handle_indentation(tokens)?;
            if self.at_line_start || self.pos >= self.chars.len() {
                // Blank or comment-only line was consumed; rescan from the top.
                return Ok(());
            }
        }

        let ch = match self.current() {
            Some(c) => c,
            None => return Ok(()),
        };

        // Inline whitespace between tokens
        if ch == ' ' || ch == '\t' {
            self.advance();
            return Ok(());
        }

        if ch == '\n' {
            let line = self.line;
            let col = self.col;
            self.advance();

            let last_is_structural = tokens
                .last()
                .map(|t| {
                    matches!(
                        t.kind,
                        TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
                    )
                })
                .unwrap_or(true);

            if !tokens.is_empty() && !last_is_structural {
                tokens.push(Token::new(TokenKind::Newline, "\\n", line, col));
            }
            self.at_line_start = true;
            return Ok(());
        }

        if ch == '\r' {
            self.advance();
            return Ok(());
        }

        if ch == '#' {
            self.skip_comment()?;
            return Ok(());
        }

        if ch == '"' {
            let tok = self.scan_string()?;
            tokens.push(tok);
            return Ok(());
        }

        if ch.is_ascii_digit() {
            let tok = self.scan_number()?;
            tokens.push(tok);
            return Ok(());
        }

        if ch.is_alphabetic() || ch == '_' {
            let tok = self.scan_identifier();
            tokens.push(tok);
            return Ok(());
        }

        let tok = self.scan_operator()?;
        tokens.push(tok);
        Ok(())
    }

    fn handle_indentation(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let mut spaces = 0usize;

        while let Some(c) = self.current() {
            if c == ' ' {
                spaces += 1;
                self.pos += 1;
                self.col += 1;
            } else if c == '\t' {
                return Err(self.error("Tabs are not allowed, use 2 spaces for indentation"));
            } else {
                break;
            }
        }

        // Blank and comment-only lines do not affect indentation.
        match self.current() {
            None => return Ok(()),
            Some('\n') | Some('\r') => {
                self.advance();
                return Ok(());
            }
            Some('#') => {
                self.skip_comment()?;
                if self.current() == Some('\n') {
                    self.advance();
                }
                return Ok(());
            }
            _ => {}
        }

        self.at_line_start = false;

        if spaces % 2 != 0 {
            return Err(self.error(format!(
                "Indentation must be a multiple of 2 spaces, found {}",
                spaces
            )));
        }
        let level = spaces / 2;
        let current = *self.indent_stack.last().unwrap();
        let line = self.line;

        if level == current + 1 {
            self.indent_stack.push(level);
            tokens.push(Token::new(TokenKind::Indent, "", line, 1));
        } else if level > current + 1 {
            return Err(self.error(format!(
                "Indentation increased by more than one level (from {} to {})",
                current, level
            )));
        } else if level < current {
            while self.indent_stack.len() > 1 && *self.indent_stack.last().unwrap() > level {
                self.indent_stack.pop();
                tokens.push(Token::new(TokenKind::Dedent, "", line, 1));
            }
            if *self.indent_stack.last().unwrap() != level {
                return Err(self.error(format!("Inconsistent indentation level: {}", level)));
            }
        }

        Ok(())
    }

    fn skip_comment(&mut self) -> Result<(), LexError> {
        if self.peek(1) == Some('#') {
            // Multi-line comment, not nested.
            let start_line = self.line;
            let start_col = self.col;
            self.advance();
            self.advance();
            loop {
                match self.current() {
                    None => {
                        return Err(LexError::Error {
                            msg: "Unclosed multi-line comment".to_string(),
                            line: start_line,
                            col: start_col,
                        })
                    }
                    Some('#') if self.peek(1) == Some('#') => {
                        self.advance();
                        self.advance();
                        break;
                    }
                    Some(_) => {
                        self.advance();
                    }
                }
            }
        } else {
            while let Some(c) = self.current() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }
        Ok(())
    }

    fn scan_string(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        let start_col = self.col;
        let mut lexeme = String::from("\"");
        self.advance(); // opening quote

        let mut value = String::new();

        loop {
            match self.current() {
                None | Some('\n') => {
                    return Err(LexError::Error {
                        msg: "Unterminated string literal".to_string(),
                        line: start_line,
                        col: start_col,
                    })
                }
                Some('"') => {
                    lexeme.push('"');
                    self.advance();
                    break;
                }
                Some('\\') => {
                    lexeme.push('\\');
                    self.advance();
                    match self.advance() {
                        Some('n') => {
                            lexeme.push('n');
                            value.push('\n');
                        }
                        Some('t') => {
                            lexeme.push('t');
                            value.push('\t');
                        }
                        Some('r') => {
                            lexeme.push('r');
                            value.push('\r');
                        }
                        Some('"') => {
                            lexeme.push('"');
                            value.push('"');
                        }
                        Some('\\') => {
                            lexeme.push('\\');
                            value.push('\\');
                        }
                        Some(c) => {
                            lexeme.push(c);
                            value.push(c);
                        }
                        None => {
                            return Err(LexError::Error {
                                msg: "Unterminated string literal".to_string(),
                                line: start_line,
                                col: start_col,
                            })
                        }
                    }
                }
                Some(c) => {
                    lexeme.push(c);
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token::new(
            TokenKind::StrLit(value),
            lexeme,
            start_line,
            start_col,
        ))
    }

    fn scan_number(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let col = self.col;
        let mut num_str = String::new();
        let mut is_float = false;

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                num_str.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.current() == Some('.') && self.peek(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            is_float = true;
            num_str.push('.');
            self.advance();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    num_str.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if is_float {
            let f: f64 = num_str
                .parse()
                .map_err(|_| self.error("Invalid floating-point literal"))?;
            Ok(Token::new(TokenKind::FloatLit(f), num_str, line, col))
        } else {
            let i: i64 = num_str
                .parse()
                .map_err(|_| self.error("Integer literal out of range"))?;
            Ok(Token::new(TokenKind::IntLit(i), num_str, line, col))
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut ident = String::new();

        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = keyword(&ident).unwrap_or_else(|| TokenKind::Ident(ident.clone()));
        Token::new(kind, ident, line, col)
    }

    fn scan_operator(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let col = self.col;
        let ch = match self.current() {
            Some(c) => c,
            None => return Err(self.error("Unexpected end of input")),
        };

        // Maximal munch: longest operator first.
        if ch == '.' && self.peek(1) == Some('.') && self.peek(2) == Some('.') {
            self.advance();
            self.advance();
            self.advance();
            return Ok(Token::new(TokenKind::Ellipsis, "...", line, col));
        }

        let two = match (ch, self.peek(1)) {
            ('-', Some('>')) => Some((TokenKind::Arrow, "->")),
            ('=', Some('=')) => Some((TokenKind::Eq, "==")),
            ('!', Some('=')) => Some((TokenKind::Neq, "!=")),
            ('<', Some('=')) => Some((TokenKind::Le, "<=")),
            ('>', Some('=')) => Some((TokenKind::Ge, ">=")),
            ('&', Some('&')) => Some((TokenKind::And, "&&")),
            ('|', Some('|')) => Some((TokenKind::Or, "||")),
            _ => None,
        };
        if let Some((kind, lexeme)) = two {
            self.advance();
            self.advance();
            return Ok(Token::new(kind, lexeme, line, col));
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '!' => TokenKind::Not,
            '|' => TokenKind::Pipe,
            '&' => TokenKind::Ampersand,
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Assign,
            _ => {
                return Err(self.error(format!("Unexpected character '{}'", ch)));
            }
        };
        self.advance();
        Ok(Token::new(kind, ch.to_string(), line, col))
    }
}
