/// Spec tests for the AST optimizer.
///
/// Most tests optimize a one-function program and inspect the rewritten
/// body value, or reserialize it through the formatter for easy
/// comparison.
use vibelang::ast::*;
use vibelang::formatter::Formatter;
use vibelang::optimizer::Optimizer;
use vibelang::pipeline::parse_program;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse(src: &str) -> Program {
    parse_program(src).expect("parse failed")
}

fn optimize(src: &str) -> (Program, usize) {
    let program = parse(src);
    let mut optimizer = Optimizer::new();
    let optimized = optimizer.optimize(&program);
    (optimized, optimizer.rewrites_applied())
}

fn body_value(program: &Program) -> &Expr {
    let f = program
        .declarations
        .iter()
        .find_map(|d| match d {
            Decl::Function(f) => Some(f),
            _ => None,
        })
        .expect("no function");
    f.body.value_expr().expect("no body value")
}

fn optimized_body(src: &str) -> (Expr, usize) {
    let (program, count) = optimize(src);
    (body_value(&program).clone(), count)
}

fn in_fn(body: &str) -> String {
    format!("define f(x: Int) -> Int\ngiven\n  {}\n", body)
}

// ---------------------------------------------------------------------------
// Constant folding
// ---------------------------------------------------------------------------

#[test]
fn folds_integer_arithmetic() {
    let (expr, count) = optimized_body(&in_fn("2 + 3 * 4"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(14))));
    assert!(count >= 2);
}

#[test]
fn folds_integer_comparison() {
    let (expr, _) = optimized_body(&in_fn("2 < 3"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Bool(true))));
}

#[test]
fn folds_float_arithmetic() {
    let (expr, _) = optimized_body(&in_fn("1.5 + 2.5"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Float(f)) if f == 4.0));
}

#[test]
fn folds_mixed_numeric_to_float() {
    let (expr, _) = optimized_body(&in_fn("1 + 0.5"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Float(f)) if f == 1.5));
}

#[test]
fn folds_string_concatenation() {
    let (expr, _) = optimized_body(&in_fn("\"foo\" + \"bar\""));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Str(ref s)) if s == "foobar"));
}

#[test]
fn folds_bool_logic() {
    let (expr, _) = optimized_body(&in_fn("true && false"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Bool(false))));
}

#[test]
fn exact_integer_division_folds_to_int() {
    let (expr, _) = optimized_body(&in_fn("6 / 3"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(2))));
}

#[test]
fn inexact_integer_division_folds_to_float() {
    let (expr, _) = optimized_body(&in_fn("7 / 2"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Float(f)) if f == 3.5));
}

#[test]
fn modulo_folds_like_the_emitted_target() {
    // The result takes the sign of the divisor, as in the generated code.
    let (expr, _) = optimized_body(&in_fn("-7 % 3"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(2))));

    let (expr, _) = optimized_body(&in_fn("7 % -3"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(-2))));
}

#[test]
fn overflowing_arithmetic_is_not_folded() {
    let (expr, count) = optimized_body(&in_fn("9000000000 * 9000000000"));
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    assert_eq!(count, 0);
}

#[test]
fn division_by_zero_is_not_folded() {
    let (expr, count) = optimized_body(&in_fn("1 / 0"));
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Div, .. }));
    assert_eq!(count, 0);
}

#[test]
fn folds_unary_negation() {
    let (expr, _) = optimized_body(&in_fn("-(3)"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(-3))));
}

// ---------------------------------------------------------------------------
// Identity simplification
// ---------------------------------------------------------------------------

#[test]
fn add_zero_is_identity() {
    let (expr, count) = optimized_body(&in_fn("x + 0"));
    assert!(matches!(expr.kind, ExprKind::Ident(ref n) if n == "x"));
    assert_eq!(count, 1);

    let (expr, _) = optimized_body(&in_fn("0 + x"));
    assert!(matches!(expr.kind, ExprKind::Ident(ref n) if n == "x"));
}

#[test]
fn subtract_zero_is_identity() {
    let (expr, _) = optimized_body(&in_fn("x - 0"));
    assert!(matches!(expr.kind, ExprKind::Ident(ref n) if n == "x"));
}

#[test]
fn multiply_by_one_is_identity() {
    let (expr, _) = optimized_body(&in_fn("x * 1"));
    assert!(matches!(expr.kind, ExprKind::Ident(ref n) if n == "x"));
    let (expr, _) = optimized_body(&in_fn("1 * x"));
    assert!(matches!(expr.kind, ExprKind::Ident(ref n) if n == "x"));
}

#[test]
fn multiply_by_zero_absorbs_pure_operand() {
    let (expr, _) = optimized_body(&in_fn("x * 0"));
    assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(0))));
}

#[test]
fn multiply_by_zero_keeps_effectful_call() {
    // g(x) is not a recognized pure built-in, so the product survives.
    let (expr, count) = optimized_body(&in_fn("g(x) * 0"));
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    assert_eq!(count, 0);
}

#[test]
fn double_negation_is_removed() {
    let src = "define f(b: Bool) -> Bool\ngiven\n  !!b\n";
    let (program, count) = optimize(src);
    assert!(matches!(
        body_value(&program).kind,
        ExprKind::Ident(ref n) if n == "b"
    ));
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Dead branch elimination
// ---------------------------------------------------------------------------

#[test]
fn when_true_keeps_then_branch() {
    let src = "define f(x: Int) -> Int\ngiven\n  when true\n    1\n  otherwise\n    2\n";
    let (program, count) = optimize(src);
    assert!(matches!(
        body_value(&program).kind,
        ExprKind::Literal(Literal::Int(1))
    ));
    assert!(count >= 1);
}

#[test]
fn when_false_keeps_otherwise_branch() {
    let src = "define f(x: Int) -> Int\ngiven\n  when false\n    1\n  otherwise\n    2\n";
    let (program, _) = optimize(src);
    assert!(matches!(
        body_value(&program).kind,
        ExprKind::Literal(Literal::Int(2))
    ));
}

#[test]
fn folded_condition_cascades_into_branch_elimination() {
    let src = "define f(x: Int) -> Int\ngiven\n  when 1 < 2\n    x\n  otherwise\n    0\n";
    let (program, count) = optimize(src);
    assert!(matches!(
        body_value(&program).kind,
        ExprKind::Ident(ref n) if n == "x"
    ));
    assert!(count >= 2);
}

#[test]
fn unknown_condition_is_preserved() {
    let src = "define f(x: Int) -> Int\ngiven\n  when x > 0\n    1\n  otherwise\n    2\n";
    let (program, count) = optimize(src);
    assert!(matches!(body_value(&program).kind, ExprKind::When { .. }));
    assert_eq!(count, 0);
}

#[test]
fn multi_statement_branch_is_preserved_under_guard() {
    let src = "define f(x: Int) -> Int\ngiven\n  when true\n    y = x + 1\n    y\n  otherwise\n    2\n";
    let (program, _) = optimize(src);
    // The two-statement branch survives, wrapped under an always-true when.
    match &body_value(&program).kind {
        ExprKind::When {
            condition,
            then_block,
            else_block,
        } => {
            assert!(matches!(
                condition.kind,
                ExprKind::Literal(Literal::Bool(true))
            ));
            assert_eq!(then_block.statements.len(), 2);
            assert!(else_block.is_none());
        }
        other => panic!("expected guarded block, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Structure preservation
// ---------------------------------------------------------------------------

#[test]
fn contracts_are_optimized_too() {
    let src = "define f(x: Int) -> Int\n  expect 1 + 1 == 2\ngiven\n  x\n";
    let (program, count) = optimize(src);
    let f = match &program.declarations[0] {
        Decl::Function(f) => f,
        other => panic!("expected function, got {:?}", other),
    };
    assert!(matches!(
        f.preconditions[0].kind,
        ExprKind::Literal(Literal::Bool(true))
    ));
    assert!(count >= 1);
}

#[test]
fn input_tree_is_not_mutated() {
    let src = "define f(x: Int) -> Int\ngiven\n  when true\n    1 + 2\n  otherwise\n    x * 0\n";
    let program = parse(src);
    let before = program.clone();
    let mut optimizer = Optimizer::new();
    let _ = optimizer.optimize(&program);
    assert_eq!(program, before);
}

#[test]
fn optimizing_twice_is_stable() {
    let src = "define f(x: Int) -> Int\ngiven\n  x + 0 + 0\n";
    let program = parse(src);
    let mut o1 = Optimizer::new();
    let once = o1.optimize(&program);
    let mut o2 = Optimizer::new();
    let twice = o2.optimize(&once);
    assert_eq!(once, twice);
}

#[test]
fn optimized_output_formats_cleanly() {
    let src = "define f(x: Int) -> Int\ngiven\n  x * 1 + 0\n";
    let (program, _) = optimize(src);
    let text = Formatter::new().format(&program);
    assert!(text.contains("\n  x\n"), "got:\n{}", text);
}
