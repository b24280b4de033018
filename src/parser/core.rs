use super::*;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            scopes: Vec::new(),
        }
    }

    pub(super) fn error(&self, msg: impl Into<String>) -> ParseError {
        let tok = self.current();
        ParseError::Error {
            msg: msg.into(),
            line: tok.line,
            col: tok.col,
        }
    }

    pub(super) fn current(&self) -> &Token {
        if self.pos < self.tokens.len() {
            &self.tokens[self.pos]
        } else {
            self.tokens.last().unwrap()
        }
    }

    pub(super) fn peek(&self, offset: usize) -> &Token {
        let idx = self.pos + offset;
        if idx < self.tokens.len() {
            &self.tokens[idx]
        } else {
            self.tokens.last().unwrap()
        }
    }

    pub(super) fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() && !matches!(tok.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    pub(super) fn is_newline(&self) -> bool {
        matches!(self.current().kind, TokenKind::Newline)
    }

    pub(super) fn is_indent(&self) -> bool {
        matches!(self.current().kind, TokenKind::Indent)
    }

    pub(super) fn is_dedent(&self) -> bool {
        matches!(self.current().kind, TokenKind::Dedent)
    }

    pub(super) fn is_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    pub(super) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "Expected {}, found {}",
                what,
                self.current().kind.name()
            )))
        }
    }

    pub(super) fn expect_ident(&mut self, what: &str) -> Result<(String, Token), ParseError> {
        let tok = self.expect(&TokenKind::Ident(String::new()), what)?;
        match tok.kind.clone() {
            TokenKind::Ident(s) => Ok((s, tok)),
            _ => unreachable!(),
        }
    }

    pub(super) fn skip_newlines(&mut self) {
        while self.is_newline() {
            self.advance();
        }
    }

    // -----------------------------------------------------------------------
    // Binding scopes
    // -----------------------------------------------------------------------

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    pub(super) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(super) fn bind_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    pub(super) fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.contains(name))
    }

    // -----------------------------------------------------------------------
    // Top level
    // -----------------------------------------------------------------------

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut imports = Vec::new();
        let mut declarations = Vec::new();

        self.skip_newlines();

        while self.check(&TokenKind::Import) {
            imports.push(self.parse_import()?);
            self.skip_newlines();
        }

        while !self.is_eof() {
            match &self.current().kind {
                TokenKind::Type => declarations.push(Decl::Type(self.parse_type_decl()?)),
                TokenKind::Define => declarations.push(Decl::Function(self.parse_fn_decl()?)),
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent => {
                    self.advance();
                }
                _ => {
                    return Err(self.error(format!(
                        "Expected 'type' or 'define', found {}",
                        self.current().kind.name()
                    )))
                }
            }
            self.skip_newlines();
        }

        Ok(Program {
            imports,
            declarations,
        })
    }

    fn parse_import(&mut self) -> Result<Import, ParseError> {
        let import_tok = self.expect(&TokenKind::Import, "'import'")?;

        let (first, _) = self.expect_ident("module name after 'import'")?;
        let mut path_parts = vec![first];

        while self.check(&TokenKind::Dot) {
            self.advance();
            let (part, _) = self.expect_ident("module path segment after '.'")?;
            path_parts.push(part);
        }

        Ok(Import {
            module_path: path_parts.join("."),
            line: import_tok.line,
            col: import_tok.col,
        })
    }
}
