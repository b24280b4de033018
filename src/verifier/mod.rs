//! Lightweight symbolic contract verifier.
//!
//! For each contract the verifier decides proven / refuted / unknown using
//! constant evaluation, inequality reasoning over bounds extracted from
//! preconditions, and equalities for pure bindings in the function body.
//! Contracts it cannot settle are handed to the oracle; whatever remains
//! unproven is planned as a runtime check for the emitter, according to
//! the configured verification level.

pub mod oracle;
pub mod symbolic;

use std::collections::HashSet;

use crate::ast::*;
use crate::config::VerificationLevel;
use crate::formatter::expr_to_string;

use oracle::{InProcessOracle, Oracle, OracleVerdict};
use symbolic::{expr_is_pure, SymbolicEvaluator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    Proven,
    Refuted,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Precondition,
    Postcondition,
    Invariant,
}

impl ContractKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContractKind::Precondition => "Precondition",
            ContractKind::Postcondition => "Postcondition",
            ContractKind::Invariant => "Invariant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// The function or type the contract belongs to.
    pub owner: String,
    pub kind: ContractKind,
    /// Position among the owner's contracts of this kind.
    pub index: usize,
    pub status: VerificationStatus,
    pub message: String,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct VerifyError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

/// Which contracts the emitter must turn into runtime assertions.
#[derive(Debug, Clone, Default)]
pub struct CheckPlan {
    check_all: bool,
    residual: HashSet<(String, ContractKind, usize)>,
}

impl CheckPlan {
    /// A plan that keeps every contract as a runtime check.
    pub fn check_everything() -> CheckPlan {
        CheckPlan {
            check_all: true,
            residual: HashSet::new(),
        }
    }

    fn require(&mut self, owner: &str, kind: ContractKind, index: usize) {
        self.residual.insert((owner.to_string(), kind, index));
    }

    pub fn needs_check(&self, owner: &str, kind: ContractKind, index: usize) -> bool {
        self.check_all || self.residual.contains(&(owner.to_string(), kind, index))
    }

    pub fn residual_count(&self) -> usize {
        self.residual.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifyOutcome {
    pub results: Vec<VerificationResult>,
    pub plan: CheckPlan,
    pub errors: Vec<VerifyError>,
}

impl VerifyOutcome {
    pub fn count(&self, status: VerificationStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

pub struct Verifier {
    level: VerificationLevel,
    timeout_ms: u64,
    oracle: Box<dyn Oracle>,
}

impl Verifier {
    pub fn new(level: VerificationLevel, timeout_ms: u64) -> Self {
        Verifier {
            level,
            timeout_ms,
            oracle: Box::new(InProcessOracle),
        }
    }

    pub fn with_oracle(
        level: VerificationLevel,
        timeout_ms: u64,
        oracle: Box<dyn Oracle>,
    ) -> Self {
        Verifier {
            level,
            timeout_ms,
            oracle,
        }
    }

    pub fn verify(&self, program: &Program) -> VerifyOutcome {
        let mut outcome = VerifyOutcome::default();

        if self.level == VerificationLevel::None {
            return outcome;
        }

        for decl in &program.declarations {
            match decl {
                Decl::Function(fd) => self.verify_function(fd, &mut outcome.results),
                Decl::Type(td) => self.verify_type_invariants(td, &mut outcome.results),
            }
        }

        for r in &outcome.results {
            let residual = match self.level {
                VerificationLevel::None => false,
                VerificationLevel::Runtime => true,
                VerificationLevel::Hybrid | VerificationLevel::Full => {
                    r.status != VerificationStatus::Proven
                }
            };
            if residual {
                outcome.plan.require(&r.owner, r.kind, r.index);
            }

            let is_error = match self.level {
                VerificationLevel::None | VerificationLevel::Runtime => false,
                VerificationLevel::Hybrid => r.status == VerificationStatus::Refuted,
                VerificationLevel::Full => r.status != VerificationStatus::Proven,
            };
            if is_error {
                outcome.errors.push(VerifyError {
                    message: format!("{} ({})", r.message, r.owner),
                    line: r.line,
                    col: r.col,
                });
            }
        }

        outcome
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    fn verify_function(&self, fd: &FnDecl, results: &mut Vec<VerificationResult>) {
        // Preconditions are checked in isolation, with no assumed facts.
        let bare = SymbolicEvaluator::new();
        for (i, pre) in fd.preconditions.iter().enumerate() {
            results.push(self.discharge(
                &bare,
                &[],
                pre,
                &fd.name,
                ContractKind::Precondition,
                i,
            ));
        }

        // Postconditions get the preconditions as assumptions plus
        // equalities for pure bindings in the body.
        let mut evaluator = SymbolicEvaluator::new();
        for pre in &fd.preconditions {
            for bound in evaluator.extract_bounds(pre) {
                evaluator.add_assumption(bound);
            }
        }

        let assigned = assigned_vars(&fd.body);
        for stmt in &fd.body.statements {
            if let StmtKind::Let { name, value, .. } = &stmt.kind {
                if assigned.contains(name) {
                    continue;
                }
                if expr_is_pure(value) && !mentions_any(value, &assigned) {
                    let resolved = evaluator.resolve(value);
                    evaluator.add_binding(name.clone(), resolved);
                }
            }
        }
        if let Some(value) = fd.body.value_expr() {
            if expr_is_pure(value) && !mentions_any(value, &assigned) {
                let resolved = evaluator.resolve(value);
                evaluator.add_binding("result", resolved);
            }
        }

        for (i, post) in fd.postconditions.iter().enumerate() {
            let rewritten = rewrite_old(post, &assigned);
            let mut result = self.discharge(
                &evaluator,
                &fd.preconditions,
                &rewritten,
                &fd.name,
                ContractKind::Postcondition,
                i,
            );
            // Report the contract as written, not the rewritten form.
            result.message = status_message(result.status, ContractKind::Postcondition, post);
            result.line = post.line;
            result.col = post.col;
            results.push(result);
        }
    }

    // -----------------------------------------------------------------------
    // Type invariants
    // -----------------------------------------------------------------------

    fn verify_type_invariants(&self, td: &TypeDecl, results: &mut Vec<VerificationResult>) {
        let mut evaluator = SymbolicEvaluator::new();

        for (i, inv) in td.invariants.iter().enumerate() {
            results.push(self.discharge(
                &evaluator,
                &[],
                inv,
                &td.name,
                ContractKind::Invariant,
                i,
            ));
            // Earlier invariants constrain later ones.
            for bound in evaluator.extract_bounds(inv) {
                evaluator.add_assumption(bound);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Core discharge
    // -----------------------------------------------------------------------

    fn discharge(
        &self,
        evaluator: &SymbolicEvaluator,
        facts: &[Expr],
        contract: &Expr,
        owner: &str,
        kind: ContractKind,
        index: usize,
    ) -> VerificationResult {
        let status = match evaluator.check_truth(contract) {
            Some(true) => VerificationStatus::Proven,
            Some(false) => VerificationStatus::Refuted,
            None => {
                // Ask the oracle whether the negated goal is satisfiable
                // together with the facts.
                let negated = Expr {
                    kind: ExprKind::Unary {
                        op: UnOp::Not,
                        operand: Box::new(contract.clone()),
                    },
                    line: contract.line,
                    col: contract.col,
                };
                match self.oracle.decide(facts, &negated, self.timeout_ms) {
                    OracleVerdict::Unsat => VerificationStatus::Proven,
                    OracleVerdict::Sat => VerificationStatus::Refuted,
                    OracleVerdict::Unknown => VerificationStatus::Unknown,
                }
            }
        };

        VerificationResult {
            owner: owner.to_string(),
            kind,
            index,
            status,
            message: status_message(status, kind, contract),
            line: contract.line,
            col: contract.col,
        }
    }
}

fn status_message(status: VerificationStatus, kind: ContractKind, contract: &Expr) -> String {
    let text = expr_to_string(contract);
    match status {
        VerificationStatus::Proven => format!("{} proven: {}", kind.label(), text),
        VerificationStatus::Refuted => {
            format!("{} refuted: '{}' can never hold", kind.label(), text)
        }
        VerificationStatus::Unknown => {
            format!("{} could not be statically verified: {}", kind.label(), text)
        }
    }
}

// ---------------------------------------------------------------------------
// Body analysis helpers
// ---------------------------------------------------------------------------

/// All assignment targets anywhere in a block, including nested branches.
fn assigned_vars(block: &Block) -> HashSet<String> {
    let mut vars = HashSet::new();
    collect_assigned(block, &mut vars);
    vars
}

fn collect_assigned(block: &Block, out: &mut HashSet<String>) {
    for stmt in &block.statements {
        match &stmt.kind {
            StmtKind::Assign { target, .. } => {
                out.insert(target.clone());
            }
            StmtKind::Let { value, .. } => collect_assigned_expr(value, out),
            StmtKind::Expr(e) => collect_assigned_expr(e, out),
        }
    }
}

fn collect_assigned_expr(expr: &Expr, out: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::When {
            then_block,
            else_block,
            ..
        } => {
            collect_assigned(then_block, out);
            if let Some(eb) = else_block {
                collect_assigned(eb, out);
            }
        }
        ExprKind::Given { cases, .. } => {
            for case in cases {
                collect_assigned_expr(&case.expression, out);
            }
        }
        _ => {}
    }
}

fn mentions_any(expr: &Expr, vars: &HashSet<String>) -> bool {
    if vars.is_empty() {
        return false;
    }
    let mut found = false;
    visit_idents(expr, &mut |name| {
        if vars.contains(name) {
            found = true;
        }
    });
    found
}

fn visit_idents(expr: &Expr, f: &mut impl FnMut(&str)) {
    match &expr.kind {
        ExprKind::Ident(name) => f(name),
        ExprKind::Binary { left, right, .. } => {
            visit_idents(left, f);
            visit_idents(right, f);
        }
        ExprKind::Unary { operand, .. } => visit_idents(operand, f),
        ExprKind::Call { callee, args } => {
            visit_idents(callee, f);
            for a in args {
                visit_idents(a, f);
            }
        }
        ExprKind::Member { object, .. } => visit_idents(object, f),
        ExprKind::ArrayLit(elems) => {
            for e in elems {
                visit_idents(e, f);
            }
        }
        ExprKind::RecordLit(fields) => {
            for (_, v) in fields {
                visit_idents(v, f);
            }
        }
        ExprKind::Old(inner) => visit_idents(inner, f),
        ExprKind::When { condition, .. } => visit_idents(condition, f),
        ExprKind::Given { scrutinee, .. } => visit_idents(scrutinee, f),
        ExprKind::Literal(_) => {}
    }
}

/// `old(e)` is discharged as `e` at entry when nothing in the body
/// reassigns a variable `e` mentions; otherwise it stays opaque.
fn rewrite_old(expr: &Expr, assigned: &HashSet<String>) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Old(inner) => {
            if mentions_any(inner, assigned) {
                ExprKind::Old(inner.clone())
            } else {
                return rewrite_old(inner, assigned);
            }
        }
        ExprKind::Binary { op, left, right } => ExprKind::Binary {
            op: *op,
            left: Box::new(rewrite_old(left, assigned)),
            right: Box::new(rewrite_old(right, assigned)),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op: *op,
            operand: Box::new(rewrite_old(operand, assigned)),
        },
        ExprKind::Call { callee, args } => ExprKind::Call {
            callee: Box::new(rewrite_old(callee, assigned)),
            args: args.iter().map(|a| rewrite_old(a, assigned)).collect(),
        },
        other => other.clone(),
    };
    Expr {
        kind,
        line: expr.line,
        col: expr.col,
    }
}
