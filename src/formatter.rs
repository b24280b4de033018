//! Canonical source serializer. Deterministic and idempotent: formatting
//! the parse of formatted output reproduces it byte for byte.

use crate::ast::*;

pub struct Formatter {
    indent_width: usize,
}

impl Formatter {
    pub fn new() -> Self {
        Formatter { indent_width: 2 }
    }

    pub fn with_indent_width(indent_width: usize) -> Self {
        Formatter { indent_width }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_width * level)
    }

    // -----------------------------------------------------------------------
    // Program
    // -----------------------------------------------------------------------

    pub fn format(&self, program: &Program) -> String {
        let mut parts: Vec<String> = Vec::new();

        for imp in &program.imports {
            parts.push(format!("import {}", imp.module_path));
        }

        if !program.imports.is_empty() && !program.declarations.is_empty() {
            parts.push(String::new());
        }

        for (i, decl) in program.declarations.iter().enumerate() {
            match decl {
                Decl::Type(td) => parts.push(self.format_type_decl(td)),
                Decl::Function(fd) => parts.push(self.format_fn_decl(fd)),
            }
            if i < program.declarations.len() - 1 {
                parts.push(String::new());
            }
        }

        if parts.is_empty() {
            String::new()
        } else {
            parts.join("\n") + "\n"
        }
    }

    // -----------------------------------------------------------------------
    // Type declarations
    // -----------------------------------------------------------------------

    fn format_type_decl(&self, decl: &TypeDecl) -> String {
        let mut lines: Vec<String> = Vec::new();

        let mut header = format!("type {}", decl.name);
        if !decl.type_params.is_empty() {
            header.push('[');
            header.push_str(&decl.type_params.join(", "));
            header.push(']');
        }
        header.push_str(" =");
        let def = self.format_type_definition(&decl.definition);
        if !def.starts_with('\n') {
            header.push(' ');
        }
        header.push_str(&def);
        lines.push(header);

        for inv in &decl.invariants {
            lines.push(format!(
                "{}invariant {}",
                self.indent(1),
                self.format_expr(inv)
            ));
        }

        lines.join("\n")
    }

    fn format_type_definition(&self, def: &TypeDef) -> String {
        match def {
            TypeDef::Alias(t) | TypeDef::Refined(t) => self.format_type(t),
            TypeDef::Sum(variants) => {
                let rendered: Vec<String> = variants
                    .iter()
                    .map(|v| {
                        let mut s = format!("| {}", v.name);
                        if !v.params.is_empty() {
                            let ps: Vec<String> =
                                v.params.iter().map(|p| self.format_type(p)).collect();
                            s.push('(');
                            s.push_str(&ps.join(", "));
                            s.push(')');
                        }
                        s
                    })
                    .collect();
                if rendered.len() == 1 {
                    rendered.into_iter().next().unwrap()
                } else {
                    // Each variant on its own line, one level in.
                    let sep = format!("\n{}", self.indent(1));
                    format!("{}{}", sep, rendered.join(&sep))
                }
            }
            TypeDef::Record(fields) => {
                let fs: Vec<String> = fields
                    .iter()
                    .map(|(n, t)| format!("{}: {}", n, self.format_type(t)))
                    .collect();
                format!("{{ {} }}", fs.join(", "))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Function declarations
    // -----------------------------------------------------------------------

    fn format_fn_decl(&self, decl: &FnDecl) -> String {
        let mut lines: Vec<String> = Vec::new();

        let params: Vec<String> = decl
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, self.format_type(&p.ty)))
            .collect();
        lines.push(format!(
            "define {}({}) -> {}",
            decl.name,
            params.join(", "),
            self.format_type(&decl.return_type)
        ));

        for pre in &decl.preconditions {
            lines.push(format!("{}expect {}", self.indent(1), self.format_expr(pre)));
        }
        for post in &decl.postconditions {
            lines.push(format!("{}ensure {}", self.indent(1), self.format_expr(post)));
        }

        lines.push("given".to_string());
        lines.extend(self.format_block(&decl.body, 1));
        lines.join("\n")
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    pub fn format_type(&self, t: &TypeExpr) -> String {
        match &t.kind {
            TypeExprKind::Primitive(name) => name.clone(),
            TypeExprKind::Array(elem) => format!("Array[{}]", self.format_type(elem)),
            TypeExprKind::ResultOf(ok, err) => format!(
                "Result[{}, {}]",
                self.format_type(ok),
                self.format_type(err)
            ),
            TypeExprKind::Named(name, args) => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let rendered: Vec<String> =
                        args.iter().map(|a| self.format_type(a)).collect();
                    format!("{}[{}]", name, rendered.join(", "))
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    pub fn format_expr(&self, expr: &Expr) -> String {
        self.format_expr_prec(expr, 0)
    }

    /// Parenthesize wherever the tree shape would not survive reparsing
    /// under the operator precedence rules.
    fn format_expr_prec(&self, expr: &Expr, min_prec: u8) -> String {
        let rendered = self.format_expr_bare(expr);
        if precedence(expr) < min_prec {
            format!("({})", rendered)
        } else {
            rendered
        }
    }

    fn format_expr_bare(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(lit) => format_literal(lit),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Binary { op, left, right } => {
                let prec = op_precedence(*op);
                format!(
                    "{} {} {}",
                    self.format_expr_prec(left, prec),
                    op.as_str(),
                    self.format_expr_prec(right, prec + 1)
                )
            }
            ExprKind::Unary { op, operand } => {
                format!("{}{}", op.as_str(), self.format_expr_prec(operand, UNARY_PREC))
            }
            ExprKind::Call { callee, args } => {
                let rendered: Vec<String> = args.iter().map(|a| self.format_expr(a)).collect();
                format!(
                    "{}({})",
                    self.format_expr_prec(callee, ATOM_PREC),
                    rendered.join(", ")
                )
            }
            ExprKind::Member { object, member } => {
                format!("{}.{}", self.format_expr_prec(object, ATOM_PREC), member)
            }
            ExprKind::ArrayLit(elements) => {
                let rendered: Vec<String> =
                    elements.iter().map(|e| self.format_expr(e)).collect();
                format!("[{}]", rendered.join(", "))
            }
            ExprKind::RecordLit(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(n, v)| format!("{}: {}", n, self.format_expr(v)))
                    .collect();
                format!("{{ {} }}", rendered.join(", "))
            }
            // Inline fallback; block positions use the multi-line forms.
            ExprKind::When { condition, .. } => format!("when {}", self.format_expr(condition)),
            ExprKind::Given { scrutinee, .. } => format!("given {}", self.format_expr(scrutinee)),
            ExprKind::Old(inner) => format!("old({})", self.format_expr(inner)),
        }
    }

    pub fn format_pattern(&self, pat: &Pattern) -> String {
        match &pat.kind {
            PatternKind::Constructor(name, subs) => {
                if subs.is_empty() {
                    name.clone()
                } else {
                    let rendered: Vec<String> =
                        subs.iter().map(|s| self.format_pattern(s)).collect();
                    format!("{}({})", name, rendered.join(", "))
                }
            }
            PatternKind::Ident(name) => name.clone(),
            PatternKind::Literal(lit) => format_literal(lit),
            PatternKind::Wildcard => "_".to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Blocks and statements
    // -----------------------------------------------------------------------

    fn format_block(&self, block: &Block, level: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for stmt in &block.statements {
            match &stmt.kind {
                StmtKind::Expr(expr) => match &expr.kind {
                    ExprKind::When {
                        condition,
                        then_block,
                        else_block,
                    } => lines.extend(self.when_lines(
                        "",
                        condition,
                        then_block,
                        else_block.as_ref(),
                        level,
                    )),
                    ExprKind::Given { scrutinee, cases } => {
                        lines.extend(self.given_lines("", scrutinee, cases, level))
                    }
                    _ => lines.push(format!("{}{}", self.indent(level), self.format_expr(expr))),
                },
                StmtKind::Let {
                    name,
                    annotation,
                    value,
                } => {
                    let mut prefix = name.clone();
                    if let Some(ann) = annotation {
                        prefix.push_str(": ");
                        prefix.push_str(&self.format_type(ann));
                    }
                    prefix.push_str(" = ");
                    lines.extend(self.binding_lines(&prefix, value, level));
                }
                StmtKind::Assign { target, value } => {
                    let prefix = format!("{} = ", target);
                    lines.extend(self.binding_lines(&prefix, value, level));
                }
            }
        }

        lines
    }

    fn binding_lines(&self, prefix: &str, value: &Expr, level: usize) -> Vec<String> {
        match &value.kind {
            ExprKind::When {
                condition,
                then_block,
                else_block,
            } => self.when_lines(prefix, condition, then_block, else_block.as_ref(), level),
            ExprKind::Given { scrutinee, cases } => {
                self.given_lines(prefix, scrutinee, cases, level)
            }
            _ => vec![format!(
                "{}{}{}",
                self.indent(level),
                prefix,
                self.format_expr(value)
            )],
        }
    }

    fn when_lines(
        &self,
        prefix: &str,
        condition: &Expr,
        then_block: &Block,
        else_block: Option<&Block>,
        level: usize,
    ) -> Vec<String> {
        let mut lines = vec![format!(
            "{}{}when {}",
            self.indent(level),
            prefix,
            self.format_expr(condition)
        )];
        lines.extend(self.format_block(then_block, level + 1));
        if let Some(eb) = else_block {
            lines.push(format!("{}otherwise", self.indent(level)));
            lines.extend(self.format_block(eb, level + 1));
        }
        lines
    }

    fn given_lines(
        &self,
        prefix: &str,
        scrutinee: &Expr,
        cases: &[PatternCase],
        level: usize,
    ) -> Vec<String> {
        let mut lines = vec![format!(
            "{}{}given {}",
            self.indent(level),
            prefix,
            self.format_expr(scrutinee)
        )];
        for case in cases {
            lines.push(format!(
                "{}{} -> {}",
                self.indent(level + 1),
                self.format_pattern(&case.pattern),
                self.format_expr(&case.expression)
            ));
        }
        lines
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render an expression in canonical source form with the default layout.
pub fn expr_to_string(expr: &Expr) -> String {
    Formatter::new().format_expr(expr)
}

const UNARY_PREC: u8 = 7;
const ATOM_PREC: u8 = 8;

fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::Neq => 3,
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => 4,
        BinOp::Add | BinOp::Sub => 5,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
    }
}

fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Binary { op, .. } => op_precedence(*op),
        ExprKind::Unary { .. } => UNARY_PREC,
        // Inline when/given renderings cannot nest inside operators
        // without parentheses.
        ExprKind::When { .. } | ExprKind::Given { .. } => 0,
        _ => ATOM_PREC,
    }
}

fn format_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => format_float(*f),
        Literal::Str(s) => {
            let mut out = String::from("\"");
            for c in s.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '\r' => out.push_str("\\r"),
                    other => out.push(other),
                }
            }
            out.push('"');
            out
        }
        Literal::Bool(b) => {
            if *b {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
    }
}

/// Floats always print with a decimal point so they re-lex as floats.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}
