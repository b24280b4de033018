use super::*;

impl Parser {
    pub(super) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();

        if self.is_indent() {
            self.advance();
            self.push_scope();

            while !self.is_dedent() && !self.is_eof() {
                if self.is_newline() {
                    self.advance();
                    continue;
                }
                statements.push(self.parse_statement()?);
                self.skip_newlines();
            }

            self.pop_scope();
            if self.is_dedent() {
                self.advance();
            }
        } else {
            // Single statement on the same line (no indented block).
            statements.push(self.parse_statement()?);
        }

        let (line, col) = statements
            .first()
            .map(|s| (s.line, s.col))
            .unwrap_or((0, 0));
        Ok(Block {
            statements,
            line,
            col,
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if let TokenKind::Ident(s) = &self.current().kind {
            if s == "for" && matches!(self.peek(1).kind, TokenKind::Ident(_)) {
                return Err(self.error("'for' loops are not supported"));
            }
            if matches!(self.peek(1).kind, TokenKind::Assign | TokenKind::Colon) {
                return self.parse_binding();
            }
        }

        let expr = self.parse_expression()?;
        Ok(Stmt {
            line: expr.line,
            col: expr.col,
            kind: StmtKind::Expr(expr),
        })
    }

    /// `name = expr` or `name: Type = expr`. A bare `name = expr` targeting
    /// an already-bound name is an assignment, otherwise a new binding.
    fn parse_binding(&mut self) -> Result<Stmt, ParseError> {
        let (name, tok) = self.expect_ident("binding name")?;

        let annotation = if self.check(&TokenKind::Colon) {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect(&TokenKind::Assign, "'='")?;
        let value = self.parse_expression()?;

        if annotation.is_none() && self.is_bound(&name) {
            Ok(Stmt {
                kind: StmtKind::Assign {
                    target: name,
                    value,
                },
                line: tok.line,
                col: tok.col,
            })
        } else {
            self.bind_name(&name);
            Ok(Stmt {
                kind: StmtKind::Let {
                    name,
                    annotation,
                    value,
                },
                line: tok.line,
                col: tok.col,
            })
        }
    }

    // -----------------------------------------------------------------------
    // when / given
    // -----------------------------------------------------------------------

    pub(super) fn parse_when(&mut self) -> Result<Expr, ParseError> {
        let when_tok = self.expect(&TokenKind::When, "'when'")?;
        let condition = self.parse_expression()?;
        self.skip_newlines();

        let then_block = self.parse_block()?;

        self.skip_newlines();
        let else_block = if self.check(&TokenKind::Otherwise) {
            self.advance();
            self.skip_newlines();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Expr {
            kind: ExprKind::When {
                condition: Box::new(condition),
                then_block,
                else_block,
            },
            line: when_tok.line,
            col: when_tok.col,
        })
    }

    pub(super) fn parse_given(&mut self) -> Result<Expr, ParseError> {
        let given_tok = self.expect(&TokenKind::Given, "'given'")?;
        let scrutinee = self.parse_expression()?;
        self.skip_newlines();

        let mut has_indent = false;
        if self.is_indent() {
            self.advance();
            has_indent = true;
            self.skip_newlines();
        }

        let mut cases = Vec::new();
        while self.pattern_start() {
            let pattern = self.parse_pattern()?;
            self.expect(&TokenKind::Arrow, "'->' after pattern")?;

            let expression = if self.is_newline() {
                // Block continuation: the case expression on its own
                // indented line.
                self.skip_newlines();
                if !self.is_indent() {
                    return Err(self.error("Expected an expression after '->'"));
                }
                self.advance();
                self.skip_newlines();
                let e = self.parse_expression()?;
                self.skip_newlines();
                if self.is_dedent() {
                    self.advance();
                }
                e
            } else {
                self.parse_expression()?
            };

            cases.push(PatternCase {
                pattern,
                expression,
            });
            self.skip_newlines();
        }

        if has_indent && self.is_dedent() {
            self.advance();
        }

        if cases.is_empty() {
            return Err(self.error("Expected at least one 'pattern -> expression' case"));
        }

        Ok(Expr {
            kind: ExprKind::Given {
                scrutinee: Box::new(scrutinee),
                cases,
            },
            line: given_tok.line,
            col: given_tok.col,
        })
    }
}
