//! AST-to-AST rewriter: constant folding, identity simplification and dead
//! branch elimination, applied bottom-up. The input tree is never touched;
//! `optimize` returns a fresh tree and counts the rewrites it applied.

use crate::ast::*;
use crate::verifier::symbolic::{expr_is_pure, modulo};

pub struct Optimizer {
    rewrites_applied: usize,
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer {
            rewrites_applied: 0,
        }
    }

    pub fn rewrites_applied(&self) -> usize {
        self.rewrites_applied
    }

    pub fn optimize(&mut self, program: &Program) -> Program {
        Program {
            imports: program.imports.clone(),
            declarations: program
                .declarations
                .iter()
                .map(|d| self.opt_decl(d))
                .collect(),
        }
    }

    fn opt_decl(&mut self, decl: &Decl) -> Decl {
        match decl {
            Decl::Function(fd) => Decl::Function(FnDecl {
                name: fd.name.clone(),
                params: fd.params.clone(),
                return_type: fd.return_type.clone(),
                preconditions: fd.preconditions.iter().map(|e| self.opt_expr(e)).collect(),
                postconditions: fd.postconditions.iter().map(|e| self.opt_expr(e)).collect(),
                body: self.opt_block(&fd.body),
                line: fd.line,
                col: fd.col,
            }),
            Decl::Type(td) => Decl::Type(td.clone()),
        }
    }

    fn opt_block(&mut self, block: &Block) -> Block {
        Block {
            statements: block.statements.iter().map(|s| self.opt_stmt(s)).collect(),
            line: block.line,
            col: block.col,
        }
    }

    fn opt_stmt(&mut self, stmt: &Stmt) -> Stmt {
        let kind = match &stmt.kind {
            StmtKind::Let {
                name,
                annotation,
                value,
            } => StmtKind::Let {
                name: name.clone(),
                annotation: annotation.clone(),
                value: self.opt_expr(value),
            },
            StmtKind::Assign { target, value } => StmtKind::Assign {
                target: target.clone(),
                value: self.opt_expr(value),
            },
            StmtKind::Expr(e) => StmtKind::Expr(self.opt_expr(e)),
        };
        Stmt {
            kind,
            line: stmt.line,
            col: stmt.col,
        }
    }

    fn opt_expr(&mut self, expr: &Expr) -> Expr {
        match &expr.kind {
            ExprKind::Binary { op, left, right } => self.opt_binary(expr, *op, left, right),
            ExprKind::Unary { op, operand } => self.opt_unary(expr, *op, operand),
            ExprKind::Call { callee, args } => Expr {
                kind: ExprKind::Call {
                    callee: Box::new(self.opt_expr(callee)),
                    args: args.iter().map(|a| self.opt_expr(a)).collect(),
                },
                line: expr.line,
                col: expr.col,
            },
            ExprKind::Member { object, member } => Expr {
                kind: ExprKind::Member {
                    object: Box::new(self.opt_expr(object)),
                    member: member.clone(),
                },
                line: expr.line,
                col: expr.col,
            },
            ExprKind::ArrayLit(elements) => Expr {
                kind: ExprKind::ArrayLit(elements.iter().map(|e| self.opt_expr(e)).collect()),
                line: expr.line,
                col: expr.col,
            },
            ExprKind::RecordLit(fields) => Expr {
                kind: ExprKind::RecordLit(
                    fields
                        .iter()
                        .map(|(n, v)| (n.clone(), self.opt_expr(v)))
                        .collect(),
                ),
                line: expr.line,
                col: expr.col,
            },
            ExprKind::When {
                condition,
                then_block,
                else_block,
            } => self.opt_when(expr, condition, then_block, else_block.as_ref()),
            ExprKind::Given { scrutinee, cases } => Expr {
                kind: ExprKind::Given {
                    scrutinee: Box::new(self.opt_expr(scrutinee)),
                    cases: cases
                        .iter()
                        .map(|c| PatternCase {
                            pattern: c.pattern.clone(),
                            expression: self.opt_expr(&c.expression),
                        })
                        .collect(),
                },
                line: expr.line,
                col: expr.col,
            },
            ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::Old(_) => expr.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Binary operations
    // -----------------------------------------------------------------------

    fn opt_binary(&mut self, expr: &Expr, op: BinOp, left: &Expr, right: &Expr) -> Expr {
        let left = self.opt_expr(left);
        let right = self.opt_expr(right);

        if let Some(folded) = try_fold_binary(&left, op, &right, expr.line, expr.col) {
            self.rewrites_applied += 1;
            return folded;
        }

        if let Some(simplified) = try_simplify_identity(&left, op, &right, expr.line, expr.col) {
            self.rewrites_applied += 1;
            return simplified;
        }

        Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line: expr.line,
            col: expr.col,
        }
    }

    // -----------------------------------------------------------------------
    // Unary operations
    // -----------------------------------------------------------------------

    fn opt_unary(&mut self, expr: &Expr, op: UnOp, operand: &Expr) -> Expr {
        let operand = self.opt_expr(operand);

        if let ExprKind::Literal(lit) = &operand.kind {
            let folded = match (op, lit) {
                (UnOp::Neg, Literal::Int(i)) => i.checked_neg().map(Literal::Int),
                (UnOp::Neg, Literal::Float(f)) => Some(Literal::Float(-f)),
                (UnOp::Not, Literal::Bool(b)) => Some(Literal::Bool(!b)),
                _ => None,
            };
            if let Some(lit) = folded {
                self.rewrites_applied += 1;
                return Expr {
                    kind: ExprKind::Literal(lit),
                    line: expr.line,
                    col: expr.col,
                };
            }
        }

        // !!x → x
        if op == UnOp::Not {
            if let ExprKind::Unary {
                op: UnOp::Not,
                operand: inner,
            } = &operand.kind
            {
                self.rewrites_applied += 1;
                return (**inner).clone();
            }
        }

        Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line: expr.line,
            col: expr.col,
        }
    }

    // -----------------------------------------------------------------------
    // Dead branch elimination
    // -----------------------------------------------------------------------

    fn opt_when(
        &mut self,
        expr: &Expr,
        condition: &Expr,
        then_block: &Block,
        else_block: Option<&Block>,
    ) -> Expr {
        let condition = self.opt_expr(condition);
        let then_block = self.opt_block(then_block);
        let else_block = else_block.map(|b| self.opt_block(b));

        if let ExprKind::Literal(Literal::Bool(value)) = condition.kind {
            self.rewrites_applied += 1;
            if value {
                return block_to_expr(then_block, expr.line, expr.col);
            }
            return match else_block {
                Some(eb) => block_to_expr(eb, expr.line, expr.col),
                // The branch produced nothing; stand in for the Unit value.
                None => Expr {
                    kind: ExprKind::Literal(Literal::Int(0)),
                    line: expr.line,
                    col: expr.col,
                },
            };
        }

        Expr {
            kind: ExprKind::When {
                condition: Box::new(condition),
                then_block,
                else_block,
            },
            line: expr.line,
            col: expr.col,
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Folding helpers
// ---------------------------------------------------------------------------

fn int_lit(value: i64, line: usize, col: usize) -> Expr {
    Expr {
        kind: ExprKind::Literal(Literal::Int(value)),
        line,
        col,
    }
}

fn float_lit(value: f64, line: usize, col: usize) -> Expr {
    Expr {
        kind: ExprKind::Literal(Literal::Float(value)),
        line,
        col,
    }
}

fn bool_lit(value: bool, line: usize, col: usize) -> Expr {
    Expr {
        kind: ExprKind::Literal(Literal::Bool(value)),
        line,
        col,
    }
}

fn try_fold_binary(left: &Expr, op: BinOp, right: &Expr, line: usize, col: usize) -> Option<Expr> {
    let (l, r) = match (&left.kind, &right.kind) {
        (ExprKind::Literal(l), ExprKind::Literal(r)) => (l, r),
        _ => return None,
    };

    match (l, r) {
        (Literal::Int(a), Literal::Int(b)) => fold_int(*a, op, *b, line, col),
        (Literal::Float(a), Literal::Float(b)) => fold_float(*a, op, *b, line, col),
        // Mixed numeric operands promote to float.
        (Literal::Int(a), Literal::Float(b)) => fold_float(*a as f64, op, *b, line, col),
        (Literal::Float(a), Literal::Int(b)) => fold_float(*a, op, *b as f64, line, col),
        (Literal::Str(a), Literal::Str(b)) if op == BinOp::Add => Some(Expr {
            kind: ExprKind::Literal(Literal::Str(format!("{}{}", a, b))),
            line,
            col,
        }),
        (Literal::Bool(a), Literal::Bool(b)) => fold_bool(*a, op, *b, line, col),
        _ => None,
    }
}

fn fold_int(a: i64, op: BinOp, b: i64, line: usize, col: usize) -> Option<Expr> {
    match op {
        BinOp::Add => a.checked_add(b).map(|v| int_lit(v, line, col)),
        BinOp::Sub => a.checked_sub(b).map(|v| int_lit(v, line, col)),
        BinOp::Mul => a.checked_mul(b).map(|v| int_lit(v, line, col)),
        // Modulo must fold to what the emitted code computes: the result
        // takes the sign of the divisor.
        BinOp::Mod => modulo(a, b).map(|v| int_lit(v, line, col)),
        BinOp::Div => {
            if b == 0 {
                return None;
            }
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b).map(|v| int_lit(v, line, col)),
                Some(_) => Some(float_lit(a as f64 / b as f64, line, col)),
                None => None,
            }
        }
        BinOp::Eq => Some(bool_lit(a == b, line, col)),
        BinOp::Neq => Some(bool_lit(a != b, line, col)),
        BinOp::Lt => Some(bool_lit(a < b, line, col)),
        BinOp::Le => Some(bool_lit(a <= b, line, col)),
        BinOp::Gt => Some(bool_lit(a > b, line, col)),
        BinOp::Ge => Some(bool_lit(a >= b, line, col)),
        _ => None,
    }
}

fn fold_float(a: f64, op: BinOp, b: f64, line: usize, col: usize) -> Option<Expr> {
    match op {
        BinOp::Add => Some(float_lit(a + b, line, col)),
        BinOp::Sub => Some(float_lit(a - b, line, col)),
        BinOp::Mul => Some(float_lit(a * b, line, col)),
        BinOp::Div => {
            if b == 0.0 {
                None
            } else {
                Some(float_lit(a / b, line, col))
            }
        }
        BinOp::Eq => Some(bool_lit(a == b, line, col)),
        BinOp::Neq => Some(bool_lit(a != b, line, col)),
        BinOp::Lt => Some(bool_lit(a < b, line, col)),
        BinOp::Le => Some(bool_lit(a <= b, line, col)),
        BinOp::Gt => Some(bool_lit(a > b, line, col)),
        BinOp::Ge => Some(bool_lit(a >= b, line, col)),
        _ => None,
    }
}

fn fold_bool(a: bool, op: BinOp, b: bool, line: usize, col: usize) -> Option<Expr> {
    match op {
        BinOp::And => Some(bool_lit(a && b, line, col)),
        BinOp::Or => Some(bool_lit(a || b, line, col)),
        BinOp::Eq => Some(bool_lit(a == b, line, col)),
        BinOp::Neq => Some(bool_lit(a != b, line, col)),
        _ => None,
    }
}

fn is_int_literal(expr: &Expr, value: i64) -> bool {
    matches!(&expr.kind, ExprKind::Literal(Literal::Int(v)) if *v == value)
}

fn try_simplify_identity(
    left: &Expr,
    op: BinOp,
    right: &Expr,
    line: usize,
    col: usize,
) -> Option<Expr> {
    let l_zero = is_int_literal(left, 0);
    let r_zero = is_int_literal(right, 0);
    let l_one = is_int_literal(left, 1);
    let r_one = is_int_literal(right, 1);

    match op {
        BinOp::Add => {
            if r_zero {
                return Some(left.clone());
            }
            if l_zero {
                return Some(right.clone());
            }
        }
        BinOp::Sub => {
            if r_zero {
                return Some(left.clone());
            }
        }
        BinOp::Mul => {
            if r_one {
                return Some(left.clone());
            }
            if l_one {
                return Some(right.clone());
            }
            // The absorbing rules drop an operand, so it must be pure.
            if r_zero && expr_is_pure(left) {
                return Some(int_lit(0, line, col));
            }
            if l_zero && expr_is_pure(right) {
                return Some(int_lit(0, line, col));
            }
        }
        _ => {}
    }

    None
}

fn block_to_expr(block: Block, line: usize, col: usize) -> Expr {
    if block.statements.len() == 1 {
        if let StmtKind::Expr(e) = &block.statements[0].kind {
            return e.clone();
        }
    }
    // Multi-statement branches survive wrapped under an always-true guard.
    Expr {
        kind: ExprKind::When {
            condition: Box::new(bool_lit(true, line, col)),
            then_block: block,
            else_block: None,
        },
        line,
        col,
    }
}
