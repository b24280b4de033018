//! Pass composition: lex → parse → check → verify → optimize → emit.
//!
//! Each pass appends its diagnostics (ordered by source position) to the
//! shared buffer; the pipeline halts after any pass that produced an
//! error-severity diagnostic. Running twice on the same input yields
//! identical diagnostics and byte-identical emitted output.

use crate::ast::Program;
use crate::codegen;
use crate::config::Options;
use crate::diagnostics::{has_errors, sort_batch, Diagnostic};
use crate::formatter::Formatter;
use crate::lexer::{Lexer, Token};
use crate::optimizer::Optimizer;
use crate::parser::Parser;
use crate::typechecker::run_type_check;
use crate::verifier::{Verifier, VerifyOutcome};

#[derive(Default)]
pub struct CompileOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub program: Option<Program>,
    pub verification: Option<VerifyOutcome>,
    pub rewrites_applied: usize,
    pub emitted: Option<String>,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        !has_errors(&self.diagnostics)
    }
}

pub fn lex_source(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(source).tokenize().map_err(|e| {
        let (line, col) = e.location();
        Diagnostic::error(e.message(), line, col)
    })
}

pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    let tokens = lex_source(source)?;
    Parser::new(tokens).parse().map_err(|e| {
        let (line, col) = e.location();
        Diagnostic::error(e.message(), line, col)
    })
}

/// Parse and type-check, returning the ordered type diagnostics.
pub fn check_source(source: &str) -> Result<Vec<Diagnostic>, Diagnostic> {
    let program = parse_program(source)?;
    let mut batch: Vec<Diagnostic> = run_type_check(&program)
        .into_iter()
        .map(|e| Diagnostic::error(e.message, e.line, e.col))
        .collect();
    sort_batch(&mut batch);
    Ok(batch)
}

/// Parse and verify under the configured level.
pub fn verify_source(source: &str, opts: &Options) -> Result<VerifyOutcome, Diagnostic> {
    let program = parse_program(source)?;
    let verifier = Verifier::new(opts.verification_level, opts.verification_timeout_ms);
    Ok(verifier.verify(&program))
}

/// Parse and reserialize in canonical form.
pub fn format_source(source: &str, indent_width: usize) -> Result<String, Diagnostic> {
    let program = parse_program(source)?;
    Ok(Formatter::with_indent_width(indent_width).format(&program))
}

/// Parse, optimize and reserialize; also reports how many rewrites fired.
pub fn optimize_source(source: &str, indent_width: usize) -> Result<(String, usize), Diagnostic> {
    let program = parse_program(source)?;
    let mut optimizer = Optimizer::new();
    let optimized = optimizer.optimize(&program);
    let text = Formatter::with_indent_width(indent_width).format(&optimized);
    Ok((text, optimizer.rewrites_applied()))
}

/// The full pipeline, producing target code when every pass is clean.
pub fn compile(source: &str, opts: &Options) -> CompileOutput {
    let mut out = CompileOutput::default();

    let program = match parse_program(source) {
        Ok(p) => p,
        Err(d) => {
            out.diagnostics.push(d);
            return out;
        }
    };

    let mut batch: Vec<Diagnostic> = run_type_check(&program)
        .into_iter()
        .map(|e| Diagnostic::error(e.message, e.line, e.col))
        .collect();
    sort_batch(&mut batch);
    out.diagnostics.extend(batch);
    if has_errors(&out.diagnostics) {
        out.program = Some(program);
        return out;
    }

    let verifier = Verifier::new(opts.verification_level, opts.verification_timeout_ms);
    let outcome = verifier.verify(&program);
    let mut batch: Vec<Diagnostic> = outcome
        .errors
        .iter()
        .map(|e| Diagnostic::error(e.message.clone(), e.line, e.col))
        .collect();
    sort_batch(&mut batch);
    out.diagnostics.extend(batch);
    out.verification = Some(outcome);
    if has_errors(&out.diagnostics) {
        out.program = Some(program);
        return out;
    }

    let mut optimizer = Optimizer::new();
    let optimized = optimizer.optimize(&program);
    out.rewrites_applied = optimizer.rewrites_applied();

    let plan = &out
        .verification
        .as_ref()
        .expect("verification ran above")
        .plan;
    match codegen::generate(&optimized, plan) {
        Ok(text) => out.emitted = Some(text),
        Err(e) => out
            .diagnostics
            .push(Diagnostic::error(e.to_string(), 0, 0)),
    }

    out.program = Some(program);
    out
}
