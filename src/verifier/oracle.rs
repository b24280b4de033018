//! Pluggable decision procedure consulted for goals the built-in
//! simplifier cannot settle.

use crate::ast::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleVerdict {
    Sat,
    Unsat,
    Unknown,
}

/// An external solver seam. `facts` are assumed true; the verdict is about
/// the satisfiability of `facts && goal`. An implementation that cannot
/// answer within `budget_ms` must return `Unknown` rather than block.
pub trait Oracle {
    fn decide(&self, facts: &[Expr], goal: &Expr, budget_ms: u64) -> OracleVerdict;
}

/// Default in-process oracle: no solver behind it, answers `Unknown` for
/// every query. Keeps verification deterministic and free of I/O.
pub struct InProcessOracle;

impl Oracle for InProcessOracle {
    fn decide(&self, _facts: &[Expr], _goal: &Expr, _budget_ms: u64) -> OracleVerdict {
        OracleVerdict::Unknown
    }
}
