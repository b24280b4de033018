use super::*;

impl Parser {
    pub(super) fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::IntTy
            | TokenKind::FloatTy
            | TokenKind::BoolTy
            | TokenKind::StringTy
            | TokenKind::ByteTy
            | TokenKind::UnitTy => {
                self.advance();
                Ok(TypeExpr {
                    kind: TypeExprKind::Primitive(tok.lexeme.clone()),
                    line: tok.line,
                    col: tok.col,
                })
            }
            TokenKind::ArrayTy => {
                self.advance();
                self.expect(&TokenKind::LBracket, "'[' after 'Array'")?;
                let elem = self.parse_type()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                Ok(TypeExpr {
                    kind: TypeExprKind::Array(Box::new(elem)),
                    line: tok.line,
                    col: tok.col,
                })
            }
            TokenKind::ResultTy => {
                self.advance();
                self.expect(&TokenKind::LBracket, "'[' after 'Result'")?;
                let ok_ty = self.parse_type()?;
                self.expect(&TokenKind::Comma, "',' between Result type arguments")?;
                let err_ty = self.parse_type()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                Ok(TypeExpr {
                    kind: TypeExprKind::ResultOf(Box::new(ok_ty), Box::new(err_ty)),
                    line: tok.line,
                    col: tok.col,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                let mut type_args = Vec::new();
                if self.check(&TokenKind::LBracket) {
                    self.advance();
                    type_args.push(self.parse_type()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        type_args.push(self.parse_type()?);
                    }
                    self.expect(&TokenKind::RBracket, "']'")?;
                }
                Ok(TypeExpr {
                    kind: TypeExprKind::Named(name, type_args),
                    line: tok.line,
                    col: tok.col,
                })
            }
            _ => Err(self.error(format!(
                "Expected a type, found {}",
                self.current().kind.name()
            ))),
        }
    }
}
