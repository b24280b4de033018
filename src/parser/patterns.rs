use super::*;

impl Parser {
    pub(super) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::Ident(ref s) if s == "_" => {
                self.advance();
                Ok(pattern(PatternKind::Wildcard, &tok))
            }
            TokenKind::Ident(ref name) => {
                let name = name.clone();
                self.advance();

                // Constructor with payload sub-patterns: Circle(r)
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let mut sub = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        sub.push(self.parse_pattern()?);
                        while self.check(&TokenKind::Comma) {
                            self.advance();
                            sub.push(self.parse_pattern()?);
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    return Ok(pattern(PatternKind::Constructor(name, sub), &tok));
                }

                // Capitalized names are nullary constructors, lowercase bind.
                if name.chars().next().map_or(false, |c| c.is_uppercase()) {
                    Ok(pattern(PatternKind::Constructor(name, Vec::new()), &tok))
                } else {
                    Ok(pattern(PatternKind::Ident(name), &tok))
                }
            }
            TokenKind::IntLit(i) => {
                self.advance();
                Ok(pattern(PatternKind::Literal(Literal::Int(i)), &tok))
            }
            TokenKind::FloatLit(f) => {
                self.advance();
                Ok(pattern(PatternKind::Literal(Literal::Float(f)), &tok))
            }
            TokenKind::StrLit(ref s) => {
                let s = s.clone();
                self.advance();
                Ok(pattern(PatternKind::Literal(Literal::Str(s)), &tok))
            }
            TokenKind::True => {
                self.advance();
                Ok(pattern(PatternKind::Literal(Literal::Bool(true)), &tok))
            }
            TokenKind::False => {
                self.advance();
                Ok(pattern(PatternKind::Literal(Literal::Bool(false)), &tok))
            }
            _ => Err(self.error(format!(
                "Expected a pattern, found {}",
                self.current().kind.name()
            ))),
        }
    }

    pub(super) fn pattern_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Ident(_)
                | TokenKind::IntLit(_)
                | TokenKind::FloatLit(_)
                | TokenKind::StrLit(_)
                | TokenKind::True
                | TokenKind::False
        )
    }
}

fn pattern(kind: PatternKind, tok: &crate::lexer::Token) -> Pattern {
    Pattern {
        kind,
        line: tok.line,
        col: tok.col,
    }
}
