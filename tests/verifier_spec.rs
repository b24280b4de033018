/// Spec tests for the symbolic contract verifier.
///
/// Programs are parsed and verified at a given level; tests inspect the
/// per-contract statuses and the residual check plan.
use vibelang::config::VerificationLevel;
use vibelang::pipeline::parse_program;
use vibelang::verifier::{
    ContractKind, VerificationStatus, Verifier, VerifyOutcome,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn verify_at(src: &str, level: VerificationLevel) -> VerifyOutcome {
    let program = parse_program(src).expect("parse failed");
    Verifier::new(level, 1000).verify(&program)
}

fn verify(src: &str) -> VerifyOutcome {
    verify_at(src, VerificationLevel::Hybrid)
}

fn statuses(outcome: &VerifyOutcome, kind: ContractKind) -> Vec<VerificationStatus> {
    outcome
        .results
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.status)
        .collect()
}

// ---------------------------------------------------------------------------
// Trivially true contracts
// ---------------------------------------------------------------------------

#[test]
fn bool_true_precondition_is_proven() {
    let out = verify("define f(x: Int) -> Int\n  expect true\ngiven\n  x\n");
    assert_eq!(out.results.len(), 1);
    assert_eq!(out.results[0].status, VerificationStatus::Proven);
}

#[test]
fn constant_comparison_is_proven() {
    let out = verify("define f(x: Int) -> Int\n  expect 1 > 0\ngiven\n  x\n");
    assert_eq!(out.results[0].status, VerificationStatus::Proven);
}

#[test]
fn constant_arithmetic_is_proven() {
    let out = verify("define f(x: Int) -> Int\n  expect 2 + 3 > 4\ngiven\n  x\n");
    assert_eq!(out.results[0].status, VerificationStatus::Proven);
}

#[test]
fn reflexive_comparisons() {
    let out = verify("define f(x: Int) -> Int\n  expect x >= x\n  expect x == x\ngiven\n  x\n");
    assert_eq!(
        statuses(&out, ContractKind::Precondition),
        vec![VerificationStatus::Proven, VerificationStatus::Proven]
    );
}

// ---------------------------------------------------------------------------
// Trivially false contracts
// ---------------------------------------------------------------------------

#[test]
fn bool_false_precondition_is_refuted() {
    let out = verify("define f(x: Int) -> Int\n  expect false\ngiven\n  x\n");
    assert_eq!(out.results[0].status, VerificationStatus::Refuted);
}

#[test]
fn constant_contradiction_is_refuted() {
    let out = verify("define f(x: Int) -> Int\n  expect 1 > 2\ngiven\n  x\n");
    assert_eq!(out.results[0].status, VerificationStatus::Refuted);
}

#[test]
fn reflexive_strict_comparison_is_refuted() {
    let out = verify("define f(x: Int) -> Int\n  expect x > x\n  expect x != x\ngiven\n  x\n");
    assert_eq!(
        statuses(&out, ContractKind::Precondition),
        vec![VerificationStatus::Refuted, VerificationStatus::Refuted]
    );
}

// ---------------------------------------------------------------------------
// Assumption propagation
// ---------------------------------------------------------------------------

#[test]
fn precondition_implies_postcondition() {
    let src = "define f(x: Int) -> Int\n  expect x >= 0\n  ensure x >= 0\ngiven\n  x\n";
    let out = verify(src);
    // The precondition itself cannot be established without call-site
    // information, but it justifies the postcondition.
    assert_eq!(
        statuses(&out, ContractKind::Precondition),
        vec![VerificationStatus::Unknown]
    );
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Proven]
    );
}

#[test]
fn stronger_bound_implies_weaker() {
    let src = "define f(x: Int) -> Int\n  expect x >= 10\n  ensure x >= 5\ngiven\n  x\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Proven]
    );
}

#[test]
fn contradicting_bound_is_refuted() {
    let src = "define f(x: Int) -> Int\n  expect x >= 10\n  ensure x < 5\ngiven\n  x\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Refuted]
    );
}

#[test]
fn monotone_addition_is_proven() {
    // result = x + y, and y >= 0 makes result >= x.
    let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Proven]
    );
}

#[test]
fn let_bindings_feed_the_result() {
    let src = "define f(x: Int) -> Int\n  expect x >= 0\n  ensure result >= x\ngiven\n  y = x + x\n  y\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Proven]
    );
}

#[test]
fn division_result_is_unknown() {
    let src = "define halve(x: Int) -> Int\n  ensure result * 2 == x\ngiven\n  x / 2\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Unknown]
    );
    // Unknown contracts stay in the residual plan under hybrid.
    assert!(out
        .plan
        .needs_check("halve", ContractKind::Postcondition, 0));
}

#[test]
fn overflowing_constant_arithmetic_is_unknown_not_a_panic() {
    let src = "define f(x: Int) -> Int\n  ensure result < 9000000000 * 9000000000\ngiven\n  x\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Unknown]
    );
}

#[test]
fn constant_division_reasons_about_floor_division() {
    // 7 / 2 is 3 in the generated code, so 7 / 2 == 3 must prove and
    // 7 / 2 == 3.5 must refute.
    let src = "define f(x: Int) -> Int\n  expect 7 / 2 == 3\n  expect 7 / 2 == 3.5\ngiven\n  x\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Precondition),
        vec![VerificationStatus::Proven, VerificationStatus::Refuted]
    );
}

#[test]
fn old_of_unassigned_parameter_discharges() {
    let src = "define bump(x: Int) -> Int\n  ensure result >= old(x)\ngiven\n  x + 1\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Proven]
    );
}

#[test]
fn old_of_reassigned_variable_is_unknown() {
    let src = "define f(x: Int) -> Int\n  ensure result >= old(x)\ngiven\n  x = x + 1\n  x\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Postcondition),
        vec![VerificationStatus::Unknown]
    );
}

// ---------------------------------------------------------------------------
// Type invariants
// ---------------------------------------------------------------------------

#[test]
fn free_invariant_is_unknown() {
    let out = verify("type Nat = Int\n  invariant value >= 0\n");
    assert_eq!(
        statuses(&out, ContractKind::Invariant),
        vec![VerificationStatus::Unknown]
    );
    assert!(out.plan.needs_check("Nat", ContractKind::Invariant, 0));
}

#[test]
fn earlier_invariants_support_later_ones() {
    let src = "type Small = Int\n  invariant value >= 10\n  invariant value >= 5\n";
    let out = verify(src);
    assert_eq!(
        statuses(&out, ContractKind::Invariant),
        vec![VerificationStatus::Unknown, VerificationStatus::Proven]
    );
}

// ---------------------------------------------------------------------------
// Levels and the residual plan
// ---------------------------------------------------------------------------

#[test]
fn level_none_checks_nothing() {
    let src = "define f(x: Int) -> Int\n  expect false\ngiven\n  x\n";
    let out = verify_at(src, VerificationLevel::None);
    assert!(out.results.is_empty());
    assert!(out.errors.is_empty());
    assert_eq!(out.plan.residual_count(), 0);
}

#[test]
fn level_runtime_keeps_even_proven_contracts() {
    let src = "define f(x: Int) -> Int\n  expect true\n  ensure result == x\ngiven\n  x\n";
    let out = verify_at(src, VerificationLevel::Runtime);
    assert!(out.plan.needs_check("f", ContractKind::Precondition, 0));
    assert!(out.plan.needs_check("f", ContractKind::Postcondition, 0));
    assert!(out.errors.is_empty());
}

#[test]
fn hybrid_drops_proven_and_keeps_unknown() {
    let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
    let out = verify(src);
    // Unprovable preconditions stay as entry checks.
    assert!(out.plan.needs_check("add", ContractKind::Precondition, 0));
    assert!(out.plan.needs_check("add", ContractKind::Precondition, 1));
    // The proven postcondition is dropped.
    assert!(!out.plan.needs_check("add", ContractKind::Postcondition, 0));
    assert!(out.errors.is_empty());
}

#[test]
fn hybrid_reports_refuted_as_error() {
    let out = verify("define f(x: Int) -> Int\n  expect 1 > 2\ngiven\n  x\n");
    assert_eq!(out.errors.len(), 1);
}

#[test]
fn full_reports_unknown_as_error() {
    let src = "define halve(x: Int) -> Int\n  ensure result * 2 == x\ngiven\n  x / 2\n";
    let out = verify_at(src, VerificationLevel::Full);
    assert_eq!(out.errors.len(), 1);
    assert!(out.errors[0].message.contains("result * 2 == x"));
}

#[test]
fn full_accepts_fully_proven_program() {
    let src = "define f(x: Int) -> Int\n  expect true\n  ensure result >= x\ngiven\n  x + 0\n";
    let out = verify_at(src, VerificationLevel::Full);
    assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[test]
fn messages_carry_the_contract_text() {
    let out = verify("define f(x: Int) -> Int\n  expect x >= 0\ngiven\n  x\n");
    assert!(out.results[0].message.contains("x >= 0"));
}

#[test]
fn results_carry_positions() {
    let out = verify("define f(x: Int) -> Int\n  expect x >= 0\ngiven\n  x\n");
    assert_eq!(out.results[0].line, 2);
}

#[test]
fn verification_is_deterministic() {
    let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  ensure result >= x\ngiven\n  x + y\n";
    let a = verify(src);
    let b = verify(src);
    let render = |o: &VerifyOutcome| {
        o.results
            .iter()
            .map(|r| format!("{}:{:?}:{}", r.owner, r.status, r.message))
            .collect::<Vec<_>>()
    };
    assert_eq!(render(&a), render(&b));
}
