//! Symbolic evaluation core: constant folding, bound implication, and the
//! monotone additive patterns used to discharge contracts without a solver.

use std::collections::HashMap;

use crate::ast::{BinOp, Expr, ExprKind, Literal, UnOp, PURE_BUILTINS};

const MAX_SUBST_DEPTH: usize = 8;

/// A constant an expression folded to.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Const {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Const::Int(i) => Some(*i as f64),
            Const::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// A known bound on a symbolic variable: `var op value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub var: String,
    pub op: BinOp,
    pub value: f64,
}

/// Evaluates contract expressions under a set of assumptions and pure
/// definitional bindings.
pub struct SymbolicEvaluator {
    assumptions: Vec<Bound>,
    bindings: HashMap<String, Expr>,
}

impl SymbolicEvaluator {
    pub fn new() -> Self {
        SymbolicEvaluator {
            assumptions: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn add_assumption(&mut self, bound: Bound) {
        self.assumptions.push(bound);
    }

    pub fn add_binding(&mut self, name: impl Into<String>, expr: Expr) {
        self.bindings.insert(name.into(), expr);
    }

    pub fn binding(&self, name: &str) -> Option<&Expr> {
        self.bindings.get(name)
    }

    // -----------------------------------------------------------------------
    // Substitution
    // -----------------------------------------------------------------------

    /// Replace identifiers that have pure definitions with their defining
    /// expressions, recursively.
    pub fn resolve(&self, expr: &Expr) -> Expr {
        self.resolve_depth(expr, 0)
    }

    fn resolve_depth(&self, expr: &Expr, depth: usize) -> Expr {
        if depth > MAX_SUBST_DEPTH {
            return expr.clone();
        }
        let kind = match &expr.kind {
            ExprKind::Ident(name) => match self.bindings.get(name) {
                Some(def) => return self.resolve_depth(def, depth + 1),
                None => ExprKind::Ident(name.clone()),
            },
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: Box::new(self.resolve_depth(left, depth)),
                right: Box::new(self.resolve_depth(right, depth)),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: Box::new(self.resolve_depth(operand, depth)),
            },
            ExprKind::Call { callee, args } => ExprKind::Call {
                callee: Box::new(self.resolve_depth(callee, depth)),
                args: args.iter().map(|a| self.resolve_depth(a, depth)).collect(),
            },
            other => other.clone(),
        };
        Expr {
            kind,
            line: expr.line,
            col: expr.col,
        }
    }

    // -----------------------------------------------------------------------
    // Constant folding
    // -----------------------------------------------------------------------

    pub fn try_eval_const(&self, expr: &Expr) -> Option<Const> {
        match &expr.kind {
            ExprKind::Literal(lit) => Some(match lit {
                Literal::Int(i) => Const::Int(*i),
                Literal::Float(f) => Const::Float(*f),
                Literal::Bool(b) => Const::Bool(*b),
                Literal::Str(s) => Const::Str(s.clone()),
            }),
            ExprKind::Unary { op, operand } => {
                let inner = self.try_eval_const(operand)?;
                match (op, inner) {
                    (UnOp::Neg, Const::Int(i)) => Some(Const::Int(-i)),
                    (UnOp::Neg, Const::Float(f)) => Some(Const::Float(-f)),
                    (UnOp::Not, Const::Bool(b)) => Some(Const::Bool(!b)),
                    _ => None,
                }
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.try_eval_const(left)?;
                let r = self.try_eval_const(right)?;
                eval_binary(&l, *op, &r)
            }
            // Length of a literal string or array folds to its size.
            ExprKind::Call { callee, args } => {
                if let ExprKind::Ident(name) = &callee.kind {
                    if name == "length" && args.len() == 1 {
                        match &args[0].kind {
                            ExprKind::Literal(Literal::Str(s)) => {
                                return Some(Const::Int(s.chars().count() as i64));
                            }
                            ExprKind::ArrayLit(elems) => {
                                return Some(Const::Int(elems.len() as i64));
                            }
                            _ => {}
                        }
                    }
                }
                None
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Truth checking
    // -----------------------------------------------------------------------

    /// Decide the truth of `expr` if possible: `Some(true)` definitely
    /// holds, `Some(false)` definitely fails, `None` unknown.
    pub fn check_truth(&self, expr: &Expr) -> Option<bool> {
        let resolved = self.resolve(expr);
        self.check_truth_inner(&resolved)
    }

    fn check_truth_inner(&self, expr: &Expr) -> Option<bool> {
        if let Some(Const::Bool(b)) = self.try_eval_const(expr) {
            return Some(b);
        }

        match &expr.kind {
            ExprKind::Binary { op, left, right } => match op {
                BinOp::And => {
                    let lt = self.check_truth_inner(left);
                    let rt = self.check_truth_inner(right);
                    if lt == Some(false) || rt == Some(false) {
                        Some(false)
                    } else if lt == Some(true) && rt == Some(true) {
                        Some(true)
                    } else {
                        None
                    }
                }
                BinOp::Or => {
                    let lt = self.check_truth_inner(left);
                    let rt = self.check_truth_inner(right);
                    if lt == Some(true) || rt == Some(true) {
                        Some(true)
                    } else if lt == Some(false) && rt == Some(false) {
                        Some(false)
                    } else {
                        None
                    }
                }
                _ => self.check_comparison(*op, left, right),
            },
            ExprKind::Unary {
                op: UnOp::Not,
                operand,
            } => self.check_truth_inner(operand).map(|b| !b),
            _ => None,
        }
    }

    fn check_comparison(&self, op: BinOp, left: &Expr, right: &Expr) -> Option<bool> {
        if !is_comparison(op) {
            return None;
        }

        // Reflexive cases: x >= x, x == x hold; x > x, x != x fail.
        if exprs_equal(left, right) {
            return match op {
                BinOp::Ge | BinOp::Le | BinOp::Eq => Some(true),
                BinOp::Gt | BinOp::Lt | BinOp::Neq => Some(false),
                _ => None,
            };
        }

        // var op constant, checked against assumptions.
        if let Some(result) = self.check_var_const(left, op, right) {
            return Some(result);
        }
        if let Some(flipped) = flip_op(op) {
            if let Some(result) = self.check_var_const(right, flipped, left) {
                return Some(result);
            }
        }

        // Monotone additive facts: a + b >= a when b >= 0.
        self.check_additive_pattern(op, left, right)
    }

    fn check_var_const(&self, var_expr: &Expr, op: BinOp, const_expr: &Expr) -> Option<bool> {
        let name = match &var_expr.kind {
            ExprKind::Ident(n) => n,
            _ => return None,
        };
        let value = self.try_eval_const(const_expr)?.as_f64()?;

        for a in &self.assumptions {
            if a.var != *name {
                continue;
            }
            if let Some(result) = implies(a.op, a.value, op, value) {
                return Some(result);
            }
        }
        None
    }

    fn check_additive_pattern(&self, op: BinOp, left: &Expr, right: &Expr) -> Option<bool> {
        if !matches!(op, BinOp::Ge | BinOp::Gt | BinOp::Le | BinOp::Lt) {
            return None;
        }

        // (a + b) op a — reduces to b op 0.
        if let ExprKind::Binary {
            op: BinOp::Add,
            left: a,
            right: b,
        } = &left.kind
        {
            if exprs_equal(a, right) {
                return self.check_addend_sign(b, op);
            }
            if exprs_equal(b, right) {
                return self.check_addend_sign(a, op);
            }
        }

        // a op (a + b) — flip and reduce.
        if let ExprKind::Binary {
            op: BinOp::Add,
            left: a,
            right: b,
        } = &right.kind
        {
            let flipped = flip_op(op)?;
            if exprs_equal(a, left) {
                return self.check_addend_sign(b, flipped);
            }
            if exprs_equal(b, left) {
                return self.check_addend_sign(a, flipped);
            }
        }

        None
    }

    /// The comparison has reduced to `addend op 0`; decide it.
    fn check_addend_sign(&self, addend: &Expr, op: BinOp) -> Option<bool> {
        if let Some(value) = self.try_eval_const(addend).and_then(|c| c.as_f64()) {
            return match op {
                BinOp::Ge => Some(value >= 0.0),
                BinOp::Gt => Some(value > 0.0),
                BinOp::Le => Some(value <= 0.0),
                BinOp::Lt => Some(value < 0.0),
                _ => None,
            };
        }

        if let ExprKind::Ident(name) = &addend.kind {
            for a in &self.assumptions {
                if a.var != *name {
                    continue;
                }
                if let Some(result) = implies(a.op, a.value, op, 0.0) {
                    return Some(result);
                }
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Bound extraction
    // -----------------------------------------------------------------------

    /// Extract simple `var op constant` bounds from a contract expression.
    pub fn extract_bounds(&self, expr: &Expr) -> Vec<Bound> {
        let mut bounds = Vec::new();
        self.collect_bounds(expr, &mut bounds);
        bounds
    }

    fn collect_bounds(&self, expr: &Expr, out: &mut Vec<Bound>) {
        if let ExprKind::Binary { op, left, right } = &expr.kind {
            if *op == BinOp::And {
                self.collect_bounds(left, out);
                self.collect_bounds(right, out);
                return;
            }
            if matches!(op, BinOp::Ge | BinOp::Gt | BinOp::Le | BinOp::Lt | BinOp::Eq) {
                if let Some(b) = self.single_bound(left, *op, right) {
                    out.push(b);
                }
                if let Some(flipped) = flip_op(*op) {
                    if let Some(b) = self.single_bound(right, flipped, left) {
                        out.push(b);
                    }
                }
            }
        }
    }

    fn single_bound(&self, left: &Expr, op: BinOp, right: &Expr) -> Option<Bound> {
        if let ExprKind::Ident(name) = &left.kind {
            let value = self.try_eval_const(right)?.as_f64()?;
            return Some(Bound {
                var: name.clone(),
                op,
                value,
            });
        }
        None
    }
}

impl Default for SymbolicEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn eval_binary(left: &Const, op: BinOp, right: &Const) -> Option<Const> {
    use Const::*;

    match (left, right) {
        (Int(a), Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinOp::Add => a.checked_add(b).map(Int),
                BinOp::Sub => a.checked_sub(b).map(Int),
                BinOp::Mul => a.checked_mul(b).map(Int),
                BinOp::Div => floor_div(a, b).map(Int),
                BinOp::Mod => modulo(a, b).map(Int),
                _ => compare_f64(a as f64, op, b as f64),
            }
        }
        (Bool(a), Bool(b)) => match op {
            BinOp::And => Some(Bool(*a && *b)),
            BinOp::Or => Some(Bool(*a || *b)),
            BinOp::Eq => Some(Bool(a == b)),
            BinOp::Neq => Some(Bool(a != b)),
            _ => None,
        },
        (Str(a), Str(b)) => match op {
            BinOp::Add => Some(Str(format!("{}{}", a, b))),
            BinOp::Eq => Some(Bool(a == b)),
            BinOp::Neq => Some(Bool(a != b)),
            _ => None,
        },
        _ => {
            let a = left.as_f64()?;
            let b = right.as_f64()?;
            match op {
                BinOp::Add => Some(Float(a + b)),
                BinOp::Sub => Some(Float(a - b)),
                BinOp::Mul => Some(Float(a * b)),
                BinOp::Div => {
                    if b == 0.0 {
                        None
                    } else {
                        Some(Float(a / b))
                    }
                }
                _ => compare_f64(a, op, b),
            }
        }
    }
}

/// Integer division as the emitted target computes it: floor division,
/// rounding toward negative infinity. None on a zero divisor or overflow.
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && (r < 0) != (b < 0) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Modulo as the emitted target computes it: the result takes the sign of
/// the divisor. None on a zero divisor or overflow.
pub fn modulo(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    let r = a.checked_rem(b)?;
    if r != 0 && (r < 0) != (b < 0) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn compare_f64(a: f64, op: BinOp, b: f64) -> Option<Const> {
    let result = match op {
        BinOp::Eq => a == b,
        BinOp::Neq => a != b,
        BinOp::Lt => a < b,
        BinOp::Gt => a > b,
        BinOp::Le => a <= b,
        BinOp::Ge => a >= b,
        _ => return None,
    };
    Some(Const::Bool(result))
}

fn is_comparison(op: BinOp) -> bool {
    matches!(
        op,
        BinOp::Ge | BinOp::Gt | BinOp::Le | BinOp::Lt | BinOp::Eq | BinOp::Neq
    )
}

pub fn flip_op(op: BinOp) -> Option<BinOp> {
    match op {
        BinOp::Ge => Some(BinOp::Le),
        BinOp::Le => Some(BinOp::Ge),
        BinOp::Gt => Some(BinOp::Lt),
        BinOp::Lt => Some(BinOp::Gt),
        BinOp::Eq => Some(BinOp::Eq),
        BinOp::Neq => Some(BinOp::Neq),
        _ => None,
    }
}

/// Does `var known_op known_val` imply `var query_op query_val`?
/// `Some(false)` means the bounds contradict.
fn implies(known_op: BinOp, known_val: f64, query_op: BinOp, query_val: f64) -> Option<bool> {
    use BinOp::*;

    match (known_op, query_op) {
        (Ge, Ge) if known_val >= query_val => Some(true),
        (Ge, Gt) if known_val > query_val => Some(true),
        (Gt, Ge) if known_val >= query_val => Some(true),
        (Gt, Gt) if known_val >= query_val => Some(true),

        (Le, Le) if known_val <= query_val => Some(true),
        (Le, Lt) if known_val < query_val => Some(true),
        (Lt, Le) if known_val <= query_val => Some(true),
        (Lt, Lt) if known_val <= query_val => Some(true),

        // Equality pins the value exactly.
        (Eq, Eq) => Some(known_val == query_val),
        (Eq, Neq) => Some(known_val != query_val),
        (Eq, Ge) => Some(known_val >= query_val),
        (Eq, Gt) => Some(known_val > query_val),
        (Eq, Le) => Some(known_val <= query_val),
        (Eq, Lt) => Some(known_val < query_val),

        // Contradictions.
        (Ge, Lt) if known_val >= query_val => Some(false),
        (Gt, Le) if known_val >= query_val => Some(false),
        (Le, Gt) if known_val <= query_val => Some(false),
        (Lt, Ge) if known_val <= query_val => Some(false),

        _ => None,
    }
}

/// Structural expression equality, ignoring source locations.
pub fn exprs_equal(a: &Expr, b: &Expr) -> bool {
    match (&a.kind, &b.kind) {
        (ExprKind::Literal(x), ExprKind::Literal(y)) => x == y,
        (ExprKind::Ident(x), ExprKind::Ident(y)) => x == y,
        (
            ExprKind::Binary {
                op: o1,
                left: l1,
                right: r1,
            },
            ExprKind::Binary {
                op: o2,
                left: l2,
                right: r2,
            },
        ) => o1 == o2 && exprs_equal(l1, l2) && exprs_equal(r1, r2),
        (
            ExprKind::Unary {
                op: o1,
                operand: x1,
            },
            ExprKind::Unary {
                op: o2,
                operand: x2,
            },
        ) => o1 == o2 && exprs_equal(x1, x2),
        (
            ExprKind::Call {
                callee: c1,
                args: a1,
            },
            ExprKind::Call {
                callee: c2,
                args: a2,
            },
        ) => {
            exprs_equal(c1, c2)
                && a1.len() == a2.len()
                && a1.iter().zip(a2.iter()).all(|(x, y)| exprs_equal(x, y))
        }
        (
            ExprKind::Member {
                object: o1,
                member: m1,
            },
            ExprKind::Member {
                object: o2,
                member: m2,
            },
        ) => m1 == m2 && exprs_equal(o1, o2),
        (ExprKind::Old(x), ExprKind::Old(y)) => exprs_equal(x, y),
        _ => false,
    }
}

/// True for expressions with no observable effects: literals, identifiers,
/// operators over pure operands, and calls to recognized pure built-ins.
/// There is no general effect analysis behind this, only the table.
pub fn expr_is_pure(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) => true,
        ExprKind::Binary { left, right, .. } => expr_is_pure(left) && expr_is_pure(right),
        ExprKind::Unary { operand, .. } => expr_is_pure(operand),
        ExprKind::Member { object, .. } => expr_is_pure(object),
        ExprKind::ArrayLit(elems) => elems.iter().all(expr_is_pure),
        ExprKind::RecordLit(fields) => fields.iter().all(|(_, v)| expr_is_pure(v)),
        ExprKind::Call { callee, args } => {
            let callee_pure = match &callee.kind {
                ExprKind::Ident(name) => PURE_BUILTINS.contains(&name.as_str()),
                _ => false,
            };
            callee_pure && args.iter().all(expr_is_pure)
        }
        ExprKind::When { .. } | ExprKind::Given { .. } | ExprKind::Old(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr {
            kind: ExprKind::Ident(name.to_string()),
            line: 1,
            col: 1,
        }
    }

    fn int(value: i64) -> Expr {
        Expr {
            kind: ExprKind::Literal(Literal::Int(value)),
            line: 1,
            col: 1,
        }
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line: 1,
            col: 1,
        }
    }

    #[test]
    fn constant_folding() {
        let ev = SymbolicEvaluator::new();
        let expr = binary(BinOp::Add, int(2), int(3));
        assert_eq!(ev.try_eval_const(&expr), Some(Const::Int(5)));
    }

    #[test]
    fn overflowing_constants_do_not_fold() {
        let ev = SymbolicEvaluator::new();
        let expr = binary(BinOp::Mul, int(9_000_000_000), int(9_000_000_000));
        assert_eq!(ev.try_eval_const(&expr), None);
    }

    #[test]
    fn integer_division_floors_like_the_emitted_target() {
        let ev = SymbolicEvaluator::new();
        assert_eq!(
            ev.try_eval_const(&binary(BinOp::Div, int(7), int(2))),
            Some(Const::Int(3))
        );
        assert_eq!(
            ev.try_eval_const(&binary(BinOp::Div, int(-7), int(2))),
            Some(Const::Int(-4))
        );
    }

    #[test]
    fn modulo_takes_the_divisor_sign() {
        let ev = SymbolicEvaluator::new();
        assert_eq!(
            ev.try_eval_const(&binary(BinOp::Mod, int(-7), int(3))),
            Some(Const::Int(2))
        );
        assert_eq!(
            ev.try_eval_const(&binary(BinOp::Mod, int(7), int(-3))),
            Some(Const::Int(-2))
        );
    }

    #[test]
    fn reflexive_truths() {
        let ev = SymbolicEvaluator::new();
        assert_eq!(
            ev.check_truth(&binary(BinOp::Ge, ident("x"), ident("x"))),
            Some(true)
        );
        assert_eq!(
            ev.check_truth(&binary(BinOp::Gt, ident("x"), ident("x"))),
            Some(false)
        );
    }

    #[test]
    fn bounds_imply_comparisons() {
        let mut ev = SymbolicEvaluator::new();
        ev.add_assumption(Bound {
            var: "x".to_string(),
            op: BinOp::Ge,
            value: 10.0,
        });
        assert_eq!(
            ev.check_truth(&binary(BinOp::Ge, ident("x"), int(5))),
            Some(true)
        );
        assert_eq!(
            ev.check_truth(&binary(BinOp::Lt, ident("x"), int(5))),
            Some(false)
        );
        assert_eq!(
            ev.check_truth(&binary(BinOp::Ge, ident("x"), int(20))),
            None
        );
    }

    #[test]
    fn additive_pattern_uses_addend_sign() {
        let mut ev = SymbolicEvaluator::new();
        ev.add_assumption(Bound {
            var: "y".to_string(),
            op: BinOp::Ge,
            value: 0.0,
        });
        let sum = binary(BinOp::Add, ident("x"), ident("y"));
        assert_eq!(
            ev.check_truth(&binary(BinOp::Ge, sum, ident("x"))),
            Some(true)
        );
    }

    #[test]
    fn bindings_substitute_into_goals() {
        let mut ev = SymbolicEvaluator::new();
        ev.add_binding("result", binary(BinOp::Add, ident("x"), int(1)));
        let goal = binary(BinOp::Ge, ident("result"), ident("x"));
        assert_eq!(ev.check_truth(&goal), Some(true));
    }

    #[test]
    fn length_of_literals_folds() {
        let ev = SymbolicEvaluator::new();
        let call = Expr {
            kind: ExprKind::Call {
                callee: Box::new(ident("length")),
                args: vec![Expr {
                    kind: ExprKind::Literal(Literal::Str("abc".to_string())),
                    line: 1,
                    col: 1,
                }],
            },
            line: 1,
            col: 1,
        };
        assert_eq!(ev.try_eval_const(&call), Some(Const::Int(3)));
    }

    #[test]
    fn purity_follows_the_builtin_table() {
        let pure_call = Expr {
            kind: ExprKind::Call {
                callee: Box::new(ident("length")),
                args: vec![ident("xs")],
            },
            line: 1,
            col: 1,
        };
        let impure_call = Expr {
            kind: ExprKind::Call {
                callee: Box::new(ident("launch")),
                args: vec![],
            },
            line: 1,
            col: 1,
        };
        assert!(expr_is_pure(&pure_call));
        assert!(!expr_is_pure(&impure_call));
    }
}
