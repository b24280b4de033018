//! Code emitter: lowers the typed, verified, optimized tree to Python
//! source together with a small runtime prelude.
//!
//! The prelude defines exactly three names — `Success`, `Error` and
//! `Unit` — and the emitted code relies on nothing else. Contracts the
//! verifier left in the residual plan become assertions: preconditions at
//! function entry, postconditions before each exit, invariants inside the
//! validating constructors of refined types.

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::*;
use crate::formatter::expr_to_string;
use crate::verifier::{CheckPlan, ContractKind};

#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("Code generation error: {0}")]
    Unsupported(String),
}

const RUNTIME_PRELUDE: &str = "\
# --- VibeLang runtime ---
class Success:
    def __init__(self, value):
        self.value = value
    def __repr__(self):
        return \"Success({!r})\".format(self.value)

class Error:
    def __init__(self, err):
        self.err = err
    def __repr__(self):
        return \"Error({!r})\".format(self.err)

Unit = object()
# --- end runtime ---
";

pub fn generate(program: &Program, plan: &CheckPlan) -> Result<String, CodeGenError> {
    let mut gen = CodeGenerator::new();
    gen.generate(program, plan)
}

struct CodeGenerator {
    indent_level: usize,
    lines: Vec<String>,
}

impl CodeGenerator {
    fn new() -> Self {
        CodeGenerator {
            indent_level: 0,
            lines: Vec::new(),
        }
    }

    fn generate(&mut self, program: &Program, plan: &CheckPlan) -> Result<String, CodeGenError> {
        self.emit_raw(RUNTIME_PRELUDE);

        for imp in &program.imports {
            self.emit(&format!("import {}", imp.module_path));
        }
        if !program.imports.is_empty() {
            self.emit("");
        }

        for decl in &program.declarations {
            match decl {
                Decl::Type(td) => self.gen_type_decl(td, plan)?,
                Decl::Function(fd) => self.gen_fn_decl(fd, plan)?,
            }
            self.emit("");
        }

        let mut out = self.lines.join("\n");
        while out.ends_with('\n') {
            out.pop();
        }
        out.push('\n');
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Emission helpers
    // -----------------------------------------------------------------------

    fn indent(&self) -> String {
        "    ".repeat(self.indent_level)
    }

    fn emit(&mut self, line: &str) {
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", self.indent(), line));
        }
    }

    fn emit_raw(&mut self, text: &str) {
        for line in text.lines() {
            self.lines.push(line.to_string());
        }
    }

    // -----------------------------------------------------------------------
    // Type declarations
    // -----------------------------------------------------------------------

    fn gen_type_decl(&mut self, td: &TypeDecl, plan: &CheckPlan) -> Result<(), CodeGenError> {
        match &td.definition {
            TypeDef::Sum(variants) => {
                self.gen_sum_type(&td.name, variants)?;
                Ok(())
            }
            TypeDef::Record(fields) => {
                self.gen_record_type(&td.name, fields);
                Ok(())
            }
            TypeDef::Alias(_) | TypeDef::Refined(_) => {
                self.gen_validating_type(td, plan)
            }
        }
    }

    fn gen_sum_type(&mut self, name: &str, variants: &[Variant]) -> Result<(), CodeGenError> {
        // Base tag.
        self.emit(&format!("class {}:", name));
        self.indent_level += 1;
        self.emit("pass");
        self.indent_level -= 1;
        self.emit("");

        for variant in variants {
            self.emit(&format!("class {}({}):", variant.name, name));
            self.indent_level += 1;
            if variant.params.is_empty() {
                self.emit("pass");
            } else {
                let params: Vec<String> =
                    (0..variant.params.len()).map(|i| format!("v{}", i)).collect();
                self.emit(&format!("def __init__(self, {}):", params.join(", ")));
                self.indent_level += 1;
                for p in &params {
                    self.emit(&format!("self.{} = {}", p, p));
                }
                self.indent_level -= 1;
            }
            self.indent_level -= 1;
            self.emit("");
        }
        Ok(())
    }

    fn gen_record_type(&mut self, name: &str, fields: &[(String, TypeExpr)]) {
        self.emit(&format!("class {}:", name));
        self.indent_level += 1;
        if fields.is_empty() {
            self.emit("pass");
        } else {
            let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
            self.emit(&format!("def __init__(self, {}):", names.join(", ")));
            self.indent_level += 1;
            for n in &names {
                self.emit(&format!("self.{} = {}", n, n));
            }
            self.indent_level -= 1;
        }
        self.indent_level -= 1;
    }

    /// Aliases and refined types lower to a constructor that validates the
    /// declared invariants on entry.
    fn gen_validating_type(&mut self, td: &TypeDecl, plan: &CheckPlan) -> Result<(), CodeGenError> {
        let empty = HashMap::new();
        self.emit(&format!("class {}:", td.name));
        self.indent_level += 1;
        self.emit("def __init__(self, value):");
        self.indent_level += 1;
        for (i, inv) in td.invariants.iter().enumerate() {
            if !plan.needs_check(&td.name, ContractKind::Invariant, i) {
                continue;
            }
            let code = self.gen_expr(inv, &empty)?;
            self.emit(&format!(
                "assert {}, {}",
                code,
                py_str(&format!(
                    "Invariant violated for {}: {}",
                    td.name,
                    expr_to_string(inv)
                ))
            ));
        }
        self.emit("self.value = value");
        self.indent_level -= 1;
        self.indent_level -= 1;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Function declarations
    // -----------------------------------------------------------------------

    fn gen_fn_decl(&mut self, fd: &FnDecl, plan: &CheckPlan) -> Result<(), CodeGenError> {
        let params: Vec<&str> = fd.params.iter().map(|p| p.name.as_str()).collect();
        self.emit(&format!("def {}({}):", fd.name, params.join(", ")));
        self.indent_level += 1;

        let empty = HashMap::new();

        // Preconditions assert at entry.
        for (i, pre) in fd.preconditions.iter().enumerate() {
            if !plan.needs_check(&fd.name, ContractKind::Precondition, i) {
                continue;
            }
            let code = self.gen_expr(pre, &empty)?;
            self.emit(&format!(
                "assert {}, {}",
                code,
                py_str(&format!("Precondition failed: {}", expr_to_string(pre)))
            ));
        }

        // Snapshot every old(e) a kept postcondition mentions.
        let kept_posts: Vec<(usize, &Expr)> = fd
            .postconditions
            .iter()
            .enumerate()
            .filter(|(i, _)| plan.needs_check(&fd.name, ContractKind::Postcondition, *i))
            .collect();

        let mut old_map: HashMap<String, String> = HashMap::new();
        for (_, post) in &kept_posts {
            let mut olds = Vec::new();
            collect_old_exprs(post, &mut olds);
            for old_expr in olds {
                let key = expr_to_string(&old_expr);
                if old_map.contains_key(&key) {
                    continue;
                }
                let local = format!("_old_{}", old_map.len());
                let code = self.gen_expr(&old_expr, &empty)?;
                self.emit(&format!("{} = {}", local, code));
                old_map.insert(key, local);
            }
        }

        self.gen_block_body(&fd.body, &old_map)?;

        // Postconditions assert before the exit.
        for (_, post) in &kept_posts {
            let code = self.gen_expr(post, &old_map)?;
            self.emit(&format!(
                "assert {}, {}",
                code,
                py_str(&format!("Postcondition failed: {}", expr_to_string(post)))
            ));
        }

        self.emit("return result");
        self.indent_level -= 1;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Blocks and statements
    // -----------------------------------------------------------------------

    /// Emit the statements of a function body, binding the block's value
    /// to `result`.
    fn gen_block_body(
        &mut self,
        block: &Block,
        old_map: &HashMap<String, String>,
    ) -> Result<(), CodeGenError> {
        if block.statements.is_empty() {
            self.emit("result = Unit");
            return Ok(());
        }

        let last_idx = block.statements.len() - 1;
        for (i, stmt) in block.statements.iter().enumerate() {
            self.gen_statement(stmt, i == last_idx, old_map)?;
        }
        Ok(())
    }

    fn gen_statement(
        &mut self,
        stmt: &Stmt,
        is_last: bool,
        old_map: &HashMap<String, String>,
    ) -> Result<(), CodeGenError> {
        match &stmt.kind {
            StmtKind::Let { name, value, .. } => {
                let code = self.gen_expr(value, old_map)?;
                self.emit(&format!("{} = {}", name, code));
                if is_last {
                    self.emit("result = Unit");
                }
            }
            StmtKind::Assign { target, value } => {
                let code = self.gen_expr(value, old_map)?;
                self.emit(&format!("{} = {}", target, code));
                if is_last {
                    self.emit("result = Unit");
                }
            }
            StmtKind::Expr(expr) => {
                let code = self.gen_expr(expr, old_map)?;
                if is_last {
                    self.emit(&format!("result = {}", code));
                } else {
                    self.emit(&code);
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn gen_expr(
        &self,
        expr: &Expr,
        old_map: &HashMap<String, String>,
    ) -> Result<String, CodeGenError> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(py_literal(lit)),
            ExprKind::Ident(name) => Ok(name.clone()),
            ExprKind::Binary { op, left, right } => {
                let l = self.gen_expr(left, old_map)?;
                let r = self.gen_expr(right, old_map)?;
                Ok(format!("({} {} {})", l, py_bin_op(*op), r))
            }
            ExprKind::Unary { op, operand } => {
                let inner = self.gen_expr(operand, old_map)?;
                let py_op = match op {
                    UnOp::Not => "not ",
                    UnOp::Neg => "-",
                };
                Ok(format!("({}{})", py_op, inner))
            }
            ExprKind::Call { callee, args } => {
                let f = self.gen_expr(callee, old_map)?;
                let rendered: Result<Vec<String>, CodeGenError> =
                    args.iter().map(|a| self.gen_expr(a, old_map)).collect();
                Ok(format!("{}({})", f, rendered?.join(", ")))
            }
            ExprKind::Member { object, member } => {
                let obj = self.gen_expr(object, old_map)?;
                Ok(format!("{}.{}", obj, member))
            }
            ExprKind::ArrayLit(elements) => {
                let rendered: Result<Vec<String>, CodeGenError> =
                    elements.iter().map(|e| self.gen_expr(e, old_map)).collect();
                Ok(format!("[{}]", rendered?.join(", ")))
            }
            ExprKind::RecordLit(fields) => {
                let mut rendered = Vec::new();
                for (name, value) in fields {
                    rendered.push(format!(
                        "{}: {}",
                        py_str(name),
                        self.gen_expr(value, old_map)?
                    ));
                }
                Ok(format!("{{{}}}", rendered.join(", ")))
            }
            ExprKind::When {
                condition,
                then_block,
                else_block,
            } => {
                let cond = self.gen_expr(condition, old_map)?;
                let then_code = self.gen_block_value(then_block, old_map)?;
                let else_code = match else_block {
                    Some(eb) => self.gen_block_value(eb, old_map)?,
                    None => "Unit".to_string(),
                };
                Ok(format!("({} if {} else {})", then_code, cond, else_code))
            }
            ExprKind::Given { scrutinee, cases } => {
                self.gen_given(scrutinee, cases, old_map)
            }
            ExprKind::Old(inner) => {
                let key = expr_to_string(inner);
                match old_map.get(&key) {
                    Some(local) => Ok(local.clone()),
                    None => Err(CodeGenError::Unsupported(format!(
                        "old({}) outside a postcondition",
                        key
                    ))),
                }
            }
        }
    }

    /// The value of a block used in expression position: its final
    /// expression statement, or Unit.
    fn gen_block_value(
        &self,
        block: &Block,
        old_map: &HashMap<String, String>,
    ) -> Result<String, CodeGenError> {
        match block.value_expr() {
            Some(e) => self.gen_expr(e, old_map),
            None => Ok("Unit".to_string()),
        }
    }

    /// Pattern matching lowers to a chain of equality and constructor-shape
    /// tests built bottom-up, evaluated against a bound scrutinee.
    fn gen_given(
        &self,
        scrutinee: &Expr,
        cases: &[PatternCase],
        old_map: &HashMap<String, String>,
    ) -> Result<String, CodeGenError> {
        let subject = self.gen_expr(scrutinee, old_map)?;

        let mut chain = "Unit".to_string();
        for case in cases.iter().rev() {
            let cond = self.gen_pattern_condition("_subject", &case.pattern)?;
            let value = self.gen_expr(&case.expression, old_map)?;
            if cond == "True" {
                chain = value;
            } else {
                chain = format!("({} if {} else {})", value, cond, chain);
            }
        }

        Ok(format!("(lambda _subject: {})({})", chain, subject))
    }

    fn gen_pattern_condition(
        &self,
        var: &str,
        pattern: &Pattern,
    ) -> Result<String, CodeGenError> {
        match &pattern.kind {
            PatternKind::Literal(lit) => Ok(format!("{} == {}", var, py_literal(lit))),
            PatternKind::Ident(_) | PatternKind::Wildcard => Ok("True".to_string()),
            PatternKind::Constructor(name, subs) => {
                let mut conds = vec![format!("isinstance({}, {})", var, name)];
                for (i, sub) in subs.iter().enumerate() {
                    let field = format!("{}.v{}", var, i);
                    let sub_cond = self.gen_pattern_condition(&field, sub)?;
                    if sub_cond != "True" {
                        conds.push(sub_cond);
                    }
                }
                Ok(conds.join(" and "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Lowering tables
// ---------------------------------------------------------------------------

fn py_bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "//",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Neq => "!=",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "<=",
        BinOp::Ge => ">=",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn py_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{:.1}", f)
            } else {
                f.to_string()
            }
        }
        Literal::Str(s) => py_str(s),
        Literal::Bool(b) => {
            if *b {
                "True".to_string()
            } else {
                "False".to_string()
            }
        }
    }
}

fn py_str(s: &str) -> String {
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

fn collect_old_exprs(expr: &Expr, out: &mut Vec<Expr>) {
    match &expr.kind {
        ExprKind::Old(inner) => out.push((**inner).clone()),
        ExprKind::Binary { left, right, .. } => {
            collect_old_exprs(left, out);
            collect_old_exprs(right, out);
        }
        ExprKind::Unary { operand, .. } => collect_old_exprs(operand, out),
        ExprKind::Call { callee, args } => {
            collect_old_exprs(callee, out);
            for a in args {
                collect_old_exprs(a, out);
            }
        }
        ExprKind::Member { object, .. } => collect_old_exprs(object, out),
        ExprKind::ArrayLit(elems) => {
            for e in elems {
                collect_old_exprs(e, out);
            }
        }
        ExprKind::RecordLit(fields) => {
            for (_, v) in fields {
                collect_old_exprs(v, out);
            }
        }
        _ => {}
    }
}
