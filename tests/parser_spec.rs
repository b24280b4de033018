/// Spec tests for the VibeLang parser.
///
/// Programs are lexed and parsed via the pipeline helper; tests then
/// inspect the resulting tree or assert that parsing fails with a message
/// containing a specific substring.
use vibelang::ast::*;
use vibelang::pipeline::parse_program;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse(src: &str) -> Program {
    parse_program(src).expect("parse failed")
}

fn parse_err(src: &str) -> String {
    match parse_program(src) {
        Ok(_) => panic!("expected parse error for {:?}", src),
        Err(d) => d.message,
    }
}

fn first_fn(program: &Program) -> &FnDecl {
    program
        .declarations
        .iter()
        .find_map(|d| match d {
            Decl::Function(f) => Some(f),
            _ => None,
        })
        .expect("no function declaration")
}

fn first_type(program: &Program) -> &TypeDecl {
    program
        .declarations
        .iter()
        .find_map(|d| match d {
            Decl::Type(t) => Some(t),
            _ => None,
        })
        .expect("no type declaration")
}

fn body_value<'a>(f: &'a FnDecl) -> &'a Expr {
    f.body.value_expr().expect("body has no value expression")
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

#[test]
fn imports_with_dotted_paths() {
    let p = parse("import math\nimport data.list\n\ndefine f() -> Int\ngiven\n  1\n");
    assert_eq!(p.imports.len(), 2);
    assert_eq!(p.imports[0].module_path, "math");
    assert_eq!(p.imports[1].module_path, "data.list");
}

// ---------------------------------------------------------------------------
// Function declarations
// ---------------------------------------------------------------------------

#[test]
fn simple_function() {
    let p = parse("define add(x: Int, y: Int) -> Int\ngiven\n  x + y\n");
    let f = first_fn(&p);
    assert_eq!(f.name, "add");
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.params[0].name, "x");
    assert!(matches!(
        f.return_type.kind,
        TypeExprKind::Primitive(ref n) if n == "Int"
    ));
}

#[test]
fn contracts_are_collected_in_order() {
    let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
    let __binding = parse(src);
    let f = first_fn(&__binding);
    assert_eq!(f.preconditions.len(), 2);
    assert_eq!(f.postconditions.len(), 1);
}

#[test]
fn missing_given_is_error() {
    let msg = parse_err("define f() -> Int\n  42\n");
    assert!(msg.contains("given"), "got: {}", msg);
}

#[test]
fn missing_arrow_is_error() {
    let msg = parse_err("define f()\ngiven\n  1\n");
    assert!(msg.contains("->"), "got: {}", msg);
}

#[test]
fn empty_parameter_list() {
    let f_src = "define f() -> Unit\ngiven\n  0\n";
    assert_eq!(first_fn(&parse(f_src)).params.len(), 0);
}

// ---------------------------------------------------------------------------
// Expressions: precedence and associativity
// ---------------------------------------------------------------------------

#[test]
fn arithmetic_precedence() {
    // 1 + 2 * 3 == 7 parses as ((1 + (2 * 3)) == 7)
    let p = parse("define f() -> Bool\ngiven\n  1 + 2 * 3 == 7\n");
    let expr = body_value(first_fn(&p));

    let (left, right) = match &expr.kind {
        ExprKind::Binary {
            op: BinOp::Eq,
            left,
            right,
        } => (left, right),
        other => panic!("expected ==, got {:?}", other),
    };
    assert!(matches!(right.kind, ExprKind::Literal(Literal::Int(7))));

    let (add_l, add_r) = match &left.kind {
        ExprKind::Binary {
            op: BinOp::Add,
            left,
            right,
        } => (left, right),
        other => panic!("expected +, got {:?}", other),
    };
    assert!(matches!(add_l.kind, ExprKind::Literal(Literal::Int(1))));
    assert!(matches!(
        add_r.kind,
        ExprKind::Binary { op: BinOp::Mul, .. }
    ));
}

#[test]
fn binary_operators_are_left_associative() {
    let p = parse("define f() -> Int\ngiven\n  1 - 2 - 3\n");
    let expr = body_value(first_fn(&p));
    match &expr.kind {
        ExprKind::Binary {
            op: BinOp::Sub,
            left,
            right,
        } => {
            assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
            assert!(matches!(right.kind, ExprKind::Literal(Literal::Int(3))));
        }
        other => panic!("expected -, got {:?}", other),
    }
}

#[test]
fn parentheses_override_precedence() {
    let p = parse("define f() -> Int\ngiven\n  (1 + 2) * 3\n");
    let expr = body_value(first_fn(&p));
    match &expr.kind {
        ExprKind::Binary {
            op: BinOp::Mul,
            left,
            ..
        } => assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Add, .. })),
        other => panic!("expected *, got {:?}", other),
    }
}

#[test]
fn logical_precedence() {
    // a || b && c parses as a || (b && c)
    let p = parse("define f(a: Bool, b: Bool, c: Bool) -> Bool\ngiven\n  a || b && c\n");
    let expr = body_value(first_fn(&p));
    match &expr.kind {
        ExprKind::Binary {
            op: BinOp::Or,
            right,
            ..
        } => assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::And, .. })),
        other => panic!("expected ||, got {:?}", other),
    }
}

#[test]
fn unary_is_right_associative() {
    let p = parse("define f(b: Bool) -> Bool\ngiven\n  !!b\n");
    let expr = body_value(first_fn(&p));
    match &expr.kind {
        ExprKind::Unary {
            op: UnOp::Not,
            operand,
        } => assert!(matches!(
            operand.kind,
            ExprKind::Unary { op: UnOp::Not, .. }
        )),
        other => panic!("expected !, got {:?}", other),
    }
}

#[test]
fn calls_and_member_access_chain() {
    let p = parse("define f(a: Int) -> Int\ngiven\n  g(a).h(1, 2)\n");
    let expr = body_value(first_fn(&p));
    match &expr.kind {
        ExprKind::Call { callee, args } => {
            assert_eq!(args.len(), 2);
            assert!(matches!(callee.kind, ExprKind::Member { .. }));
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn array_and_record_literals() {
    let p = parse("define f() -> Array[Int]\ngiven\n  [1, 2, 3]\n");
    assert!(matches!(
        body_value(first_fn(&p)).kind,
        ExprKind::ArrayLit(ref elems) if elems.len() == 3
    ));

    let p = parse("define g() -> Unit\ngiven\n  { name: \"a\", age: 3 }\n");
    assert!(matches!(
        body_value(first_fn(&p)).kind,
        ExprKind::RecordLit(ref fields) if fields.len() == 2
    ));
}

#[test]
fn old_in_postcondition() {
    let src = "define bump(x: Int) -> Int\n  ensure result >= old(x)\ngiven\n  x + 1\n";
    let __binding = parse(src);
    let f = first_fn(&__binding);
    let post = &f.postconditions[0];
    match &post.kind {
        ExprKind::Binary { right, .. } => {
            assert!(matches!(right.kind, ExprKind::Old(_)))
        }
        other => panic!("expected binary, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Rejected syntax
// ---------------------------------------------------------------------------

#[test]
fn question_operator_is_rejected() {
    let msg = parse_err("define f(x: Int) -> Int\ngiven\n  g(x)?\n");
    assert!(msg.contains("'?'"), "got: {}", msg);
}

#[test]
fn for_loop_is_rejected() {
    let msg = parse_err("define f(xs: Array[Int]) -> Int\ngiven\n  for x in xs\n");
    assert!(msg.contains("for"), "got: {}", msg);
}

// ---------------------------------------------------------------------------
// when / given
// ---------------------------------------------------------------------------

#[test]
fn when_with_otherwise() {
    let src = "define f(x: Int) -> Int\ngiven\n  when x > 0\n    1\n  otherwise\n    2\n";
    let __binding = parse(src);
    let expr = body_value(first_fn(&__binding));
    match &expr.kind {
        ExprKind::When {
            then_block,
            else_block,
            ..
        } => {
            assert_eq!(then_block.statements.len(), 1);
            assert!(else_block.is_some());
        }
        other => panic!("expected when, got {:?}", other),
    }
}

#[test]
fn when_without_otherwise() {
    let src = "define f(x: Int) -> Unit\ngiven\n  when x > 0\n    g()\n";
    let __binding = parse(src);
    let expr = body_value(first_fn(&__binding));
    assert!(matches!(
        expr.kind,
        ExprKind::When {
            ref else_block, ..
        } if else_block.is_none()
    ));
}

#[test]
fn given_expression_cases() {
    let src = "define f(x: Int) -> String\ngiven\n  given x\n    0 -> \"zero\"\n    1 -> \"one\"\n    _ -> \"many\"\n";
    let __binding = parse(src);
    let expr = body_value(first_fn(&__binding));
    match &expr.kind {
        ExprKind::Given { cases, .. } => {
            assert_eq!(cases.len(), 3);
            assert!(matches!(
                cases[0].pattern.kind,
                PatternKind::Literal(Literal::Int(0))
            ));
            assert!(matches!(cases[2].pattern.kind, PatternKind::Wildcard));
        }
        other => panic!("expected given, got {:?}", other),
    }
}

#[test]
fn constructor_patterns() {
    let src = "define f(s: Shape) -> Float\ngiven\n  given s\n    Circle(r) -> r\n    Point -> 0.0\n";
    let __binding = parse(src);
    let expr = body_value(first_fn(&__binding));
    match &expr.kind {
        ExprKind::Given { cases, .. } => {
            match &cases[0].pattern.kind {
                PatternKind::Constructor(name, subs) => {
                    assert_eq!(name, "Circle");
                    assert_eq!(subs.len(), 1);
                    assert!(matches!(subs[0].kind, PatternKind::Ident(ref n) if n == "r"));
                }
                other => panic!("expected constructor, got {:?}", other),
            }
            // A bare capitalized name is a nullary constructor, not a binding.
            assert!(matches!(
                cases[1].pattern.kind,
                PatternKind::Constructor(ref n, ref subs) if n == "Point" && subs.is_empty()
            ));
        }
        other => panic!("expected given, got {:?}", other),
    }
}

#[test]
fn given_requires_at_least_one_case() {
    let msg = parse_err("define f(x: Int) -> Int\ngiven\n  given x\n");
    assert!(msg.contains("case"), "got: {}", msg);
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[test]
fn let_binding_and_assignment() {
    let src = "define f(x: Int) -> Int\ngiven\n  y = x + 1\n  y = y * 2\n  y\n";
    let __binding = parse(src);
    let f_decl = first_fn(&__binding);
    let stmts = &f_decl.body.statements;
    assert_eq!(stmts.len(), 3);
    assert!(matches!(stmts[0].kind, StmtKind::Let { ref name, .. } if name == "y"));
    // The second write targets an existing binding.
    assert!(matches!(stmts[1].kind, StmtKind::Assign { ref target, .. } if target == "y"));
    assert!(matches!(stmts[2].kind, StmtKind::Expr(_)));
}

#[test]
fn annotated_let_binding() {
    let src = "define f() -> Int\ngiven\n  y: Int = 5\n  y\n";
    let __binding = parse(src);
    let f_decl = first_fn(&__binding);
    assert!(matches!(
        f_decl.body.statements[0].kind,
        StmtKind::Let {
            ref annotation, ..
        } if annotation.is_some()
    ));
}

#[test]
fn assignment_to_parameter_is_assignment() {
    let src = "define f(x: Int) -> Int\ngiven\n  x = x + 1\n  x\n";
    let __binding = parse(src);
    let f_decl = first_fn(&__binding);
    assert!(matches!(
        f_decl.body.statements[0].kind,
        StmtKind::Assign { ref target, .. } if target == "x"
    ));
}

// ---------------------------------------------------------------------------
// Type declarations
// ---------------------------------------------------------------------------

#[test]
fn alias_declaration() {
    let __binding = parse("type Money = Int\n");
    let td = first_type(&__binding);
    assert_eq!(td.name, "Money");
    assert!(matches!(td.definition, TypeDef::Alias(_)));
    assert!(td.invariants.is_empty());
}

#[test]
fn refined_declaration() {
    let src = "type Celsius = Float\n  invariant value >= -273.15\n";
    let __binding = parse(src);
    let td = first_type(&__binding);
    assert!(matches!(td.definition, TypeDef::Refined(_)));
    assert_eq!(td.invariants.len(), 1);
}

#[test]
fn sum_type_declaration() {
    let src = "type Shape =\n  | Circle(Float)\n  | Rect(Float, Float)\n  | Point\n";
    let __binding = parse(src);
    let td = first_type(&__binding);
    match &td.definition {
        TypeDef::Sum(variants) => {
            assert_eq!(variants.len(), 3);
            assert_eq!(variants[0].name, "Circle");
            assert_eq!(variants[0].params.len(), 1);
            assert_eq!(variants[1].params.len(), 2);
            assert!(variants[2].params.is_empty());
        }
        other => panic!("expected sum, got {:?}", other),
    }
}

#[test]
fn inline_sum_type() {
    let src = "type Flag = | On | Off\n";
    let __binding = parse(src);
    let td = first_type(&__binding);
    assert!(matches!(td.definition, TypeDef::Sum(ref vs) if vs.len() == 2));
}

#[test]
fn record_type_declaration() {
    let src = "type User = { name: String, age: Int }\n";
    let __binding = parse(src);
    let td = first_type(&__binding);
    assert!(matches!(td.definition, TypeDef::Record(ref fs) if fs.len() == 2));
}

#[test]
fn type_parameters() {
    let src = "type Pair[A, B] = { first: A, second: B }\n";
    let __binding = parse(src);
    let td = first_type(&__binding);
    assert_eq!(td.type_params, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn generic_type_annotations() {
    let src = "define f(r: Result[Int, String], xs: Array[Float]) -> Int\ngiven\n  1\n";
    let __binding = parse(src);
    let f_decl = first_fn(&__binding);
    assert!(matches!(f_decl.params[0].ty.kind, TypeExprKind::ResultOf(_, _)));
    assert!(matches!(f_decl.params[1].ty.kind, TypeExprKind::Array(_)));
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

#[test]
fn declarations_record_positions() {
    let p = parse("type Money = Int\n\ndefine f() -> Int\ngiven\n  1\n");
    assert_eq!(p.declarations[0].location(), (1, 1));
    assert_eq!(p.declarations[1].location(), (3, 1));
}

#[test]
fn stop_at_first_error() {
    // The bad token is reported, not anything later.
    let msg = parse_err("define f() -> Int\ngiven\n  1 +\n");
    assert!(!msg.is_empty());
}
