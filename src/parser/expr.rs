use super::*;

impl Parser {
    // Precedence ladder, lowest first: || , &&, == !=, < > <= >=, + -,
    // * / %, unary, postfix. All binary operators are left-associative.

    pub(super) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::Or) {
            let op_tok = self.advance();
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right, &op_tok);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::And) {
            let op_tok = self.advance();
            let right = self.parse_equality()?;
            left = binary(BinOp::And, left, right, &op_tok);
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Neq => BinOp::Neq,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right, &op_tok);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right, &op_tok);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, &op_tok);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right, &op_tok);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current().kind {
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let op_tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                line: op_tok.line,
                col: op_tok.col,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::LParen) {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    args.push(self.parse_expression()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        args.push(self.parse_expression()?);
                    }
                }
                self.expect(&TokenKind::RParen, "')'")?;
                let (line, col) = (expr.line, expr.col);
                expr = Expr {
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    line,
                    col,
                };
            } else if self.check(&TokenKind::Dot) {
                self.advance();
                let (member, _) = self.expect_ident("member name after '.'")?;
                let (line, col) = (expr.line, expr.col);
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        member,
                    },
                    line,
                    col,
                };
            } else if self.check(&TokenKind::Question) {
                return Err(
                    self.error("The '?' error-propagation operator is not supported")
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::IntLit(i) => {
                self.advance();
                Ok(literal(Literal::Int(i), &tok))
            }
            TokenKind::FloatLit(f) => {
                self.advance();
                Ok(literal(Literal::Float(f), &tok))
            }
            TokenKind::StrLit(ref s) => {
                let s = s.clone();
                self.advance();
                Ok(literal(Literal::Str(s), &tok))
            }
            TokenKind::True => {
                self.advance();
                Ok(literal(Literal::Bool(true), &tok))
            }
            TokenKind::False => {
                self.advance();
                Ok(literal(Literal::Bool(false), &tok))
            }
            TokenKind::Ident(ref name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Ident(name),
                    line: tok.line,
                    col: tok.col,
                })
            }
            TokenKind::SelfKw => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Ident("self".to_string()),
                    line: tok.line,
                    col: tok.col,
                })
            }
            TokenKind::Old => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'old'")?;
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(Expr {
                    kind: ExprKind::Old(Box::new(inner)),
                    line: tok.line,
                    col: tok.col,
                })
            }
            TokenKind::When => self.parse_when(),
            TokenKind::Given => self.parse_given(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_record_literal(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.error(format!(
                "Unexpected token in expression: {}",
                self.current().kind.name()
            ))),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let lbracket = self.expect(&TokenKind::LBracket, "'['")?;
        let mut elements = Vec::new();

        if !self.check(&TokenKind::RBracket) {
            elements.push(self.parse_expression()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                elements.push(self.parse_expression()?);
            }
        }

        self.expect(&TokenKind::RBracket, "']'")?;
        Ok(Expr {
            kind: ExprKind::ArrayLit(elements),
            line: lbracket.line,
            col: lbracket.col,
        })
    }

    fn parse_record_literal(&mut self) -> Result<Expr, ParseError> {
        let lbrace = self.expect(&TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();

        self.skip_newlines();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            let (name, _) = self.expect_ident("field name")?;
            self.expect(&TokenKind::Colon, "':' after field name")?;
            let value = self.parse_expression()?;
            fields.push((name, value));
            self.skip_newlines();
            if self.check(&TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            }
        }

        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Expr {
            kind: ExprKind::RecordLit(fields),
            line: lbrace.line,
            col: lbrace.col,
        })
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, op_tok: &Token) -> Expr {
    Expr {
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line: op_tok.line,
        col: op_tok.col,
    }
}

fn literal(lit: Literal, tok: &Token) -> Expr {
    Expr {
        kind: ExprKind::Literal(lit),
        line: tok.line,
        col: tok.col,
    }
}
