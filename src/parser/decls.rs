use super::*;

impl Parser {
    // -----------------------------------------------------------------------
    // Type declarations
    // -----------------------------------------------------------------------

    pub(super) fn parse_type_decl(&mut self) -> Result<TypeDecl, ParseError> {
        let type_tok = self.expect(&TokenKind::Type, "'type'")?;

        // The declared name may shadow a built-in type keyword.
        let name = match &self.current().kind {
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.advance();
                s
            }
            TokenKind::IntTy
            | TokenKind::FloatTy
            | TokenKind::BoolTy
            | TokenKind::StringTy
            | TokenKind::ByteTy
            | TokenKind::UnitTy
            | TokenKind::ArrayTy
            | TokenKind::ResultTy => self.advance().lexeme,
            _ => {
                return Err(self.error(format!(
                    "Expected type name, found {}",
                    self.current().kind.name()
                )))
            }
        };

        // Optional type parameters: [T, E]
        let mut type_params = Vec::new();
        if self.check(&TokenKind::LBracket) {
            self.advance();
            let (first, _) = self.expect_ident("type parameter name")?;
            type_params.push(first);
            while self.check(&TokenKind::Comma) {
                self.advance();
                let (p, _) = self.expect_ident("type parameter name")?;
                type_params.push(p);
            }
            self.expect(&TokenKind::RBracket, "']'")?;
        }

        self.expect(&TokenKind::Assign, "'=' after type name")?;

        let (definition, mut dedent_pending) = self.parse_type_definition()?;

        // Invariant lines, indented one level under the declaration.
        let mut invariants = Vec::new();
        self.skip_newlines();
        if self.is_indent() {
            self.advance();
            dedent_pending = true;
        }
        while self.check(&TokenKind::Invariant) {
            self.advance();
            invariants.push(self.parse_expression()?);
            self.skip_newlines();
        }
        if dedent_pending && self.is_dedent() {
            self.advance();
        }

        // An alias constrained by invariants is a refined type.
        let definition = match definition {
            TypeDef::Alias(base) if !invariants.is_empty() => TypeDef::Refined(base),
            other => other,
        };

        Ok(TypeDecl {
            name,
            type_params,
            definition,
            invariants,
            line: type_tok.line,
            col: type_tok.col,
        })
    }

    /// Parse the right-hand side of a type declaration. Returns the
    /// definition and whether an indentation level opened here is still
    /// waiting for its dedent (invariants may share it).
    fn parse_type_definition(&mut self) -> Result<(TypeDef, bool), ParseError> {
        self.skip_newlines();

        let mut has_indent = false;
        if self.is_indent() {
            self.advance();
            has_indent = true;
        }

        let def = match self.current().kind {
            TokenKind::Pipe => self.parse_sum_variants()?,
            TokenKind::LBrace => self.parse_record_fields()?,
            _ => TypeDef::Alias(self.parse_type()?),
        };

        self.skip_newlines();
        if has_indent {
            if self.is_dedent() {
                self.advance();
                has_indent = false;
            }
        }

        Ok((def, has_indent))
    }

    fn parse_sum_variants(&mut self) -> Result<TypeDef, ParseError> {
        let mut variants = Vec::new();

        while self.check(&TokenKind::Pipe) {
            self.advance();
            self.skip_newlines();
            let (vname, vtok) = self.expect_ident("variant name after '|'")?;

            let mut params = Vec::new();
            if self.check(&TokenKind::LParen) {
                self.advance();
                if !self.check(&TokenKind::RParen) {
                    params.push(self.parse_type()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        params.push(self.parse_type()?);
                    }
                }
                self.expect(&TokenKind::RParen, "')'")?;
            }

            variants.push(Variant {
                name: vname,
                params,
                line: vtok.line,
                col: vtok.col,
            });
            self.skip_newlines();
        }

        Ok(TypeDef::Sum(variants))
    }

    fn parse_record_fields(&mut self) -> Result<TypeDef, ParseError> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        self.skip_newlines();

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            let (fname, _) = self.expect_ident("field name")?;
            self.expect(&TokenKind::Colon, "':' after field name")?;
            let ty = self.parse_type()?;
            fields.push((fname, ty));
            self.skip_newlines();
            if self.check(&TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            }
        }

        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(TypeDef::Record(fields))
    }

    // -----------------------------------------------------------------------
    // Function declarations
    // -----------------------------------------------------------------------

    pub(super) fn parse_fn_decl(&mut self) -> Result<FnDecl, ParseError> {
        let define_tok = self.expect(&TokenKind::Define, "'define'")?;
        let (name, _) = self.expect_ident("function name after 'define'")?;

        self.expect(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_param()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                params.push(self.parse_param()?);
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;

        self.expect(&TokenKind::Arrow, "'->' before return type")?;
        let return_type = self.parse_type()?;
        self.skip_newlines();

        // Contract lines may sit one level under the signature.
        let mut has_outer_indent = false;
        if self.is_indent() {
            self.advance();
            has_outer_indent = true;
        }

        let mut preconditions = Vec::new();
        let mut postconditions = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::Expect => {
                    self.advance();
                    preconditions.push(self.parse_expression()?);
                    self.skip_newlines();
                }
                TokenKind::Ensure => {
                    self.advance();
                    postconditions.push(self.parse_expression()?);
                    self.skip_newlines();
                }
                _ => break,
            }
        }

        if has_outer_indent && self.is_dedent() {
            self.advance();
            has_outer_indent = false;
        }
        self.skip_newlines();

        if !self.check(&TokenKind::Given) {
            return Err(self.error(format!(
                "Expected 'given' to introduce the body of '{}'",
                name
            )));
        }
        self.advance();
        self.skip_newlines();

        self.push_scope();
        let param_names: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        for n in &param_names {
            self.bind_name(n);
        }
        let body = self.parse_block()?;
        self.pop_scope();

        if has_outer_indent && self.is_dedent() {
            self.advance();
        }

        Ok(FnDecl {
            name,
            params,
            return_type,
            preconditions,
            postconditions,
            body,
            line: define_tok.line,
            col: define_tok.col,
        })
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let (name, tok) = self.expect_ident("parameter name")?;
        self.expect(&TokenKind::Colon, "':' after parameter name")?;
        let ty = self.parse_type()?;
        Ok(Param {
            name,
            ty,
            line: tok.line,
            col: tok.col,
        })
    }
}
