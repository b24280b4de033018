//! VibeLang static type checker.
//!
//! Two-phase analysis:
//!   Phase 1 — register declared type names, variant constructors and
//!             function signatures across the whole program.
//!   Phase 2 — check each declaration: contract expressions must be Bool,
//!             bodies must produce the declared return type, and every
//!             expression gets a resolved type.
//!
//! The checker keeps going after an error. `Type::Unknown` is compatible
//! with everything, so one bad expression does not cascade into a wall of
//! follow-on diagnostics.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::types::Type;

#[derive(Debug, Clone)]
pub struct TypeError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

pub fn run_type_check(program: &Program) -> Vec<TypeError> {
    let mut checker = TypeChecker::new();
    checker.check(program);
    checker.errors
}

// ---------------------------------------------------------------------------
// Internal structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct FnSig {
    params: Vec<Type>,
    ret: Type,
}

#[derive(Debug, Clone)]
struct VariantSig {
    owner: String,
    params: Vec<Type>,
}

struct TypeChecker {
    /// Every declared type name.
    declared: HashSet<String>,
    /// Alias / refined declarations: name → underlying type (one level).
    alias_targets: HashMap<String, Type>,
    /// Sum type name → ordered variant names.
    sum_variants: HashMap<String, Vec<String>>,
    /// Constructor name → owning sum type and payload types.
    variants: HashMap<String, VariantSig>,
    /// Record type name → fields.
    records: HashMap<String, Vec<(String, Type)>>,
    fn_sigs: HashMap<String, FnSig>,
    /// Functions and constructors visible to every expression.
    globals: HashMap<String, Type>,
    errors: Vec<TypeError>,
    in_postcondition: bool,
}

impl TypeChecker {
    fn new() -> Self {
        let mut tc = TypeChecker {
            declared: HashSet::new(),
            alias_targets: HashMap::new(),
            sum_variants: HashMap::new(),
            variants: HashMap::new(),
            records: HashMap::new(),
            fn_sigs: HashMap::new(),
            globals: HashMap::new(),
            errors: Vec::new(),
            in_postcondition: false,
        };
        tc.register_builtins();
        tc
    }

    fn register_builtins(&mut self) {
        // `length` works over both arrays and strings.
        self.globals.insert(
            "length".to_string(),
            Type::Fn(vec![Type::Unknown], Box::new(Type::Int)),
        );
    }

    fn error(&mut self, msg: impl Into<String>, line: usize, col: usize) {
        self.errors.push(TypeError {
            message: msg.into(),
            line,
            col,
        });
    }

    fn check(&mut self, program: &Program) {
        // Phase 1a: every declared type name.
        for decl in &program.declarations {
            if let Decl::Type(td) = decl {
                self.declared.insert(td.name.clone());
            }
        }

        // Phase 1b: type definitions, then function signatures.
        for decl in &program.declarations {
            if let Decl::Type(td) = decl {
                self.register_type_decl(td);
            }
        }
        for decl in &program.declarations {
            if let Decl::Function(fd) = decl {
                self.register_fn_decl(fd);
            }
        }

        // Phase 2: full checks, in source order.
        for decl in &program.declarations {
            match decl {
                Decl::Type(td) => self.check_type_decl(td),
                Decl::Function(fd) => self.check_fn_decl(fd),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 1 — registration
    // -----------------------------------------------------------------------

    fn register_type_decl(&mut self, td: &TypeDecl) {
        match &td.definition {
            TypeDef::Alias(base) | TypeDef::Refined(base) => {
                let target = self.resolve_type_expr(base, &td.type_params);
                self.alias_targets.insert(td.name.clone(), target);
            }
            TypeDef::Sum(variants) => {
                let mut names = Vec::new();
                for v in variants {
                    if names.contains(&v.name) {
                        self.error(
                            format!(
                                "Duplicate variant '{}' in type '{}'",
                                v.name, td.name
                            ),
                            v.line,
                            v.col,
                        );
                        continue;
                    }
                    names.push(v.name.clone());

                    let params: Vec<Type> = v
                        .params
                        .iter()
                        .map(|p| self.resolve_type_expr(p, &td.type_params))
                        .collect();
                    let owner_ty = Type::Named(td.name.clone(), Vec::new());
                    // Constructors are values: nullary variants have the sum
                    // type itself, the rest are functions into it.
                    let ctor_ty = if params.is_empty() {
                        owner_ty
                    } else {
                        Type::Fn(params.clone(), Box::new(owner_ty))
                    };
                    self.globals.insert(v.name.clone(), ctor_ty);
                    self.variants.insert(
                        v.name.clone(),
                        VariantSig {
                            owner: td.name.clone(),
                            params,
                        },
                    );
                }
                self.sum_variants.insert(td.name.clone(), names);
            }
            TypeDef::Record(fields) => {
                let resolved: Vec<(String, Type)> = fields
                    .iter()
                    .map(|(n, t)| (n.clone(), self.resolve_type_expr(t, &td.type_params)))
                    .collect();
                self.records.insert(td.name.clone(), resolved);
            }
        }
    }

    fn register_fn_decl(&mut self, fd: &FnDecl) {
        let mut seen = HashSet::new();
        for p in &fd.params {
            if !seen.insert(p.name.clone()) {
                self.error(
                    format!(
                        "Duplicate parameter '{}' in function '{}'",
                        p.name, fd.name
                    ),
                    p.line,
                    p.col,
                );
            }
        }

        let params: Vec<Type> = fd
            .params
            .iter()
            .map(|p| self.resolve_type_expr(&p.ty, &[]))
            .collect();
        let ret = self.resolve_type_expr(&fd.return_type, &[]);

        self.globals.insert(
            fd.name.clone(),
            Type::Fn(params.clone(), Box::new(ret.clone())),
        );
        self.fn_sigs.insert(fd.name.clone(), FnSig { params, ret });
    }

    // -----------------------------------------------------------------------
    // Type resolution helpers
    // -----------------------------------------------------------------------

    fn resolve_type_expr(&mut self, te: &TypeExpr, type_params: &[String]) -> Type {
        let ty = Type::from_expr(te);
        self.validate_named(&ty, te.line, te.col, type_params);
        ty
    }

    fn validate_named(&mut self, ty: &Type, line: usize, col: usize, type_params: &[String]) {
        match ty {
            Type::Named(name, args) => {
                let known = self.declared.contains(name)
                    || self.records.contains_key(name)
                    || type_params.iter().any(|p| p == name);
                if !known {
                    self.error(format!("Unknown type '{}'", name), line, col);
                }
                for a in args {
                    self.validate_named(a, line, col, type_params);
                }
            }
            Type::Array(elem) => self.validate_named(elem, line, col, type_params),
            Type::Result(ok, err) => {
                self.validate_named(ok, line, col, type_params);
                self.validate_named(err, line, col, type_params);
            }
            _ => {}
        }
    }

    /// Unfold named types through alias declarations, one level at a time.
    fn unfold(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..8 {
            let next = match &current {
                Type::Named(name, _) => self.alias_targets.get(name).cloned(),
                _ => None,
            };
            match next {
                Some(target) if target != current => current = target,
                _ => break,
            }
        }
        current
    }

    fn types_compatible(&self, actual: &Type, expected: &Type) -> bool {
        if actual.compatible(expected) {
            return true;
        }
        let ua = self.unfold(actual);
        let ue = self.unfold(expected);
        ua.compatible(&ue)
    }

    // -----------------------------------------------------------------------
    // Phase 2 — type declarations
    // -----------------------------------------------------------------------

    fn check_type_decl(&mut self, td: &TypeDecl) {
        // The carried value: the base type for aliases and refinements,
        // the declared type itself for sums and records.
        let carried = match &td.definition {
            TypeDef::Alias(base) | TypeDef::Refined(base) => Type::from_expr(base),
            TypeDef::Sum(_) | TypeDef::Record(_) => Type::Named(td.name.clone(), Vec::new()),
        };

        for inv in &td.invariants {
            let mut env = self.globals.clone();
            env.insert("value".to_string(), carried.clone());
            env.insert("self".to_string(), carried.clone());
            let inv_ty = self.infer(inv, &mut env);
            if !matches!(self.unfold(&inv_ty), Type::Bool | Type::Unknown) {
                self.error(
                    format!("Invariant must be Bool, got {}", inv_ty.display()),
                    inv.line,
                    inv.col,
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2 — function declarations
    // -----------------------------------------------------------------------

    fn check_fn_decl(&mut self, fd: &FnDecl) {
        let sig = match self.fn_sigs.get(&fd.name) {
            Some(s) => s.clone(),
            None => return,
        };

        let mut env = self.globals.clone();
        for (p, ty) in fd.params.iter().zip(sig.params.iter()) {
            env.insert(p.name.clone(), ty.clone());
        }

        for pre in &fd.preconditions {
            let pre_ty = self.infer(pre, &mut env.clone());
            if !matches!(self.unfold(&pre_ty), Type::Bool | Type::Unknown) {
                self.error(
                    format!("Precondition must be Bool, got {}", pre_ty.display()),
                    pre.line,
                    pre.col,
                );
            }
        }

        let mut post_env = env.clone();
        post_env.insert("result".to_string(), sig.ret.clone());
        self.in_postcondition = true;
        for post in &fd.postconditions {
            let post_ty = self.infer(post, &mut post_env.clone());
            if !matches!(self.unfold(&post_ty), Type::Bool | Type::Unknown) {
                self.error(
                    format!("Postcondition must be Bool, got {}", post_ty.display()),
                    post.line,
                    post.col,
                );
            }
        }
        self.in_postcondition = false;

        let body_ty = self.check_block(&fd.body, &env);
        if body_ty != Type::Unknown
            && sig.ret != Type::Unknown
            && !self.types_compatible(&body_ty, &sig.ret)
        {
            self.error(
                format!(
                    "Function '{}' body has type {} but the declared return type is {}",
                    fd.name,
                    body_ty.display(),
                    sig.ret.display()
                ),
                fd.body.line,
                fd.body.col,
            );
        }
    }

    // -----------------------------------------------------------------------
    // Blocks and statements
    // -----------------------------------------------------------------------

    fn check_block(&mut self, block: &Block, env: &HashMap<String, Type>) -> Type {
        let mut local = env.clone();
        let mut result = Type::Unit;

        for stmt in &block.statements {
            match &stmt.kind {
                StmtKind::Let {
                    name,
                    annotation,
                    value,
                } => {
                    let val_ty = self.infer(value, &mut local);
                    if let Some(ann) = annotation {
                        let ann_ty = self.resolve_type_expr(ann, &[]);
                        if val_ty != Type::Unknown && !self.types_compatible(&val_ty, &ann_ty) {
                            self.error(
                                format!(
                                    "Binding '{}' is annotated {} but its value has type {}",
                                    name,
                                    ann_ty.display(),
                                    val_ty.display()
                                ),
                                stmt.line,
                                stmt.col,
                            );
                        }
                        local.insert(name.clone(), ann_ty);
                    } else {
                        local.insert(name.clone(), val_ty);
                    }
                    result = Type::Unit;
                }
                StmtKind::Assign { target, value } => {
                    let val_ty = self.infer(value, &mut local);
                    match local.get(target).cloned() {
                        Some(target_ty) => {
                            if val_ty != Type::Unknown
                                && !self.types_compatible(&val_ty, &target_ty)
                            {
                                self.error(
                                    format!(
                                        "Cannot assign {} to '{}' of type {}",
                                        val_ty.display(),
                                        target,
                                        target_ty.display()
                                    ),
                                    stmt.line,
                                    stmt.col,
                                );
                            }
                        }
                        None => {
                            self.error(
                                format!("Assignment to undefined variable '{}'", target),
                                stmt.line,
                                stmt.col,
                            );
                        }
                    }
                    result = Type::Unit;
                }
                StmtKind::Expr(e) => {
                    result = self.infer(e, &mut local);
                }
            }
        }

        result
    }

    // -----------------------------------------------------------------------
    // Expression inference
    // -----------------------------------------------------------------------

    fn infer(&mut self, expr: &Expr, env: &mut HashMap<String, Type>) -> Type {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Str(_) => Type::Str,
                Literal::Bool(_) => Type::Bool,
            },
            ExprKind::Ident(name) => match env.get(name) {
                Some(ty) => ty.clone(),
                None => {
                    self.error(
                        format!("Undefined identifier '{}'", name),
                        expr.line,
                        expr.col,
                    );
                    Type::Unknown
                }
            },
            ExprKind::Binary { op, left, right } => self.infer_binary(expr, *op, left, right, env),
            ExprKind::Unary { op, operand } => self.infer_unary(expr, *op, operand, env),
            ExprKind::Call { callee, args } => self.infer_call(expr, callee, args, env),
            ExprKind::Member { object, member } => {
                let obj_ty = self.infer(object, env);
                match self.unfold(&obj_ty) {
                    Type::Named(name, _) => match self.records.get(&name) {
                        Some(fields) => match fields.iter().find(|(n, _)| n == member) {
                            Some((_, ty)) => ty.clone(),
                            None => {
                                self.error(
                                    format!("Type '{}' has no field '{}'", name, member),
                                    expr.line,
                                    expr.col,
                                );
                                Type::Unknown
                            }
                        },
                        None => Type::Unknown,
                    },
                    _ => Type::Unknown,
                }
            }
            ExprKind::ArrayLit(elements) => {
                if elements.is_empty() {
                    return Type::Array(Box::new(Type::Unknown));
                }
                let elem_ty = self.infer(&elements[0], env);
                for elem in &elements[1..] {
                    let et = self.infer(elem, env);
                    if et != Type::Unknown
                        && elem_ty != Type::Unknown
                        && !self.types_compatible(&et, &elem_ty)
                    {
                        self.error(
                            format!(
                                "Array element type mismatch: expected {}, got {}",
                                elem_ty.display(),
                                et.display()
                            ),
                            elem.line,
                            elem.col,
                        );
                    }
                }
                Type::Array(Box::new(elem_ty))
            }
            ExprKind::RecordLit(fields) => {
                for (_, value) in fields {
                    self.infer(value, env);
                }
                Type::Unknown
            }
            ExprKind::When {
                condition,
                then_block,
                else_block,
            } => {
                let cond_ty = self.infer(condition, env);
                if !matches!(self.unfold(&cond_ty), Type::Bool | Type::Unknown) {
                    self.error(
                        format!("When condition must be Bool, got {}", cond_ty.display()),
                        condition.line,
                        condition.col,
                    );
                }
                let then_ty = self.check_block(then_block, env);
                match else_block {
                    Some(eb) => {
                        let else_ty = self.check_block(eb, env);
                        if then_ty != Type::Unknown
                            && else_ty != Type::Unknown
                            && !self.types_compatible(&then_ty, &else_ty)
                            && !self.types_compatible(&else_ty, &then_ty)
                        {
                            self.error(
                                format!(
                                    "When branches have different types: {} vs {}",
                                    then_ty.display(),
                                    else_ty.display()
                                ),
                                expr.line,
                                expr.col,
                            );
                        }
                        if then_ty == Type::Unknown {
                            else_ty
                        } else {
                            then_ty
                        }
                    }
                    // Without an otherwise branch the expression is Unit.
                    None => Type::Unit,
                }
            }
            ExprKind::Given { scrutinee, cases } => self.infer_given(expr, scrutinee, cases, env),
            ExprKind::Old(inner) => {
                if !self.in_postcondition {
                    self.error(
                        "'old' is only valid in postconditions",
                        expr.line,
                        expr.col,
                    );
                }
                self.infer(inner, env)
            }
        }
    }

    fn infer_binary(
        &mut self,
        expr: &Expr,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        env: &mut HashMap<String, Type>,
    ) -> Type {
        let lt = self.infer(left, env);
        let lt = self.unfold(&lt);
        let rt = self.infer(right, env);
        let rt = self.unfold(&rt);

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if lt == Type::Unknown || rt == Type::Unknown {
                    return Type::Unknown;
                }
                match (&lt, &rt) {
                    (Type::Int, Type::Int) => Type::Int,
                    (Type::Float, Type::Float) => Type::Float,
                    (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
                    (Type::Str, Type::Str) if op == BinOp::Add => Type::Str,
                    _ => {
                        self.error(
                            format!(
                                "Cannot apply '{}' to {} and {}",
                                op.as_str(),
                                lt.display(),
                                rt.display()
                            ),
                            expr.line,
                            expr.col,
                        );
                        Type::Unknown
                    }
                }
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                if lt != Type::Unknown && rt != Type::Unknown {
                    if !lt.is_numeric() || !rt.is_numeric() {
                        self.error(
                            format!(
                                "Cannot apply '{}' to {} and {}",
                                op.as_str(),
                                lt.display(),
                                rt.display()
                            ),
                            expr.line,
                            expr.col,
                        );
                    }
                }
                Type::Bool
            }
            BinOp::Eq | BinOp::Neq => {
                if lt != Type::Unknown
                    && rt != Type::Unknown
                    && !lt.compatible(&rt)
                    && !rt.compatible(&lt)
                {
                    self.error(
                        format!(
                            "Cannot compare {} and {} with '{}'",
                            lt.display(),
                            rt.display(),
                            op.as_str()
                        ),
                        expr.line,
                        expr.col,
                    );
                }
                Type::Bool
            }
            BinOp::And | BinOp::Or => {
                if !matches!(lt, Type::Bool | Type::Unknown) {
                    self.error(
                        format!(
                            "Left operand of '{}' must be Bool, got {}",
                            op.as_str(),
                            lt.display()
                        ),
                        left.line,
                        left.col,
                    );
                }
                if !matches!(rt, Type::Bool | Type::Unknown) {
                    self.error(
                        format!(
                            "Right operand of '{}' must be Bool, got {}",
                            op.as_str(),
                            rt.display()
                        ),
                        right.line,
                        right.col,
                    );
                }
                Type::Bool
            }
        }
    }

    fn infer_unary(
        &mut self,
        expr: &Expr,
        op: UnOp,
        operand: &Expr,
        env: &mut HashMap<String, Type>,
    ) -> Type {
        let ty = self.infer(operand, env);
        let ty = self.unfold(&ty);
        match op {
            UnOp::Not => {
                if !matches!(ty, Type::Bool | Type::Unknown) {
                    self.error(
                        format!("Operand of '!' must be Bool, got {}", ty.display()),
                        expr.line,
                        expr.col,
                    );
                }
                Type::Bool
            }
            UnOp::Neg => {
                if ty.is_numeric() || ty == Type::Unknown {
                    ty
                } else {
                    self.error(
                        format!("Operand of unary '-' must be numeric, got {}", ty.display()),
                        expr.line,
                        expr.col,
                    );
                    Type::Unknown
                }
            }
        }
    }

    fn infer_call(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        args: &[Expr],
        env: &mut HashMap<String, Type>,
    ) -> Type {
        let callee_ty = self.infer(callee, env);

        let callee_name = match &callee.kind {
            ExprKind::Ident(n) => Some(n.clone()),
            _ => None,
        };

        match self.unfold(&callee_ty) {
            Type::Fn(params, ret) => {
                if args.len() != params.len() {
                    let who = callee_name.unwrap_or_else(|| "callee".to_string());
                    self.error(
                        format!(
                            "Function '{}' expects {} arguments, got {}",
                            who,
                            params.len(),
                            args.len()
                        ),
                        expr.line,
                        expr.col,
                    );
                    for arg in args {
                        self.infer(arg, env);
                    }
                    return *ret;
                }
                for (i, (arg, expected)) in args.iter().zip(params.iter()).enumerate() {
                    let arg_ty = self.infer(arg, env);
                    if arg_ty != Type::Unknown && !self.types_compatible(&arg_ty, expected) {
                        let who = callee_name.clone().unwrap_or_else(|| "callee".to_string());
                        self.error(
                            format!(
                                "Argument {} of '{}': expected {}, got {}",
                                i + 1,
                                who,
                                expected.display(),
                                arg_ty.display()
                            ),
                            arg.line,
                            arg.col,
                        );
                    }
                }
                *ret
            }
            Type::Unknown => {
                for arg in args {
                    self.infer(arg, env);
                }
                Type::Unknown
            }
            other => {
                self.error(
                    format!("Expression of type {} is not callable", other.display()),
                    expr.line,
                    expr.col,
                );
                for arg in args {
                    self.infer(arg, env);
                }
                Type::Unknown
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pattern matching
    // -----------------------------------------------------------------------

    fn infer_given(
        &mut self,
        expr: &Expr,
        scrutinee: &Expr,
        cases: &[PatternCase],
        env: &mut HashMap<String, Type>,
    ) -> Type {
        let scrutinee_ty = self.infer(scrutinee, env);

        let mut result_ty = Type::Unknown;
        for case in cases {
            let mut case_env = env.clone();
            self.check_pattern(&case.pattern, &scrutinee_ty, &mut case_env);
            let case_ty = self.infer(&case.expression, &mut case_env);
            if result_ty == Type::Unknown {
                result_ty = case_ty;
            } else if case_ty != Type::Unknown
                && !self.types_compatible(&case_ty, &result_ty)
                && !self.types_compatible(&result_ty, &case_ty)
            {
                self.error(
                    format!(
                        "Given cases have different types: {} vs {}",
                        result_ty.display(),
                        case_ty.display()
                    ),
                    case.expression.line,
                    case.expression.col,
                );
            }
        }

        self.check_exhaustiveness(expr, &scrutinee_ty, cases);
        result_ty
    }

    fn check_pattern(
        &mut self,
        pattern: &Pattern,
        expected: &Type,
        env: &mut HashMap<String, Type>,
    ) {
        match &pattern.kind {
            PatternKind::Wildcard => {}
            PatternKind::Ident(name) => {
                env.insert(name.clone(), expected.clone());
            }
            PatternKind::Literal(lit) => {
                let lit_ty = match lit {
                    Literal::Int(_) => Type::Int,
                    Literal::Float(_) => Type::Float,
                    Literal::Str(_) => Type::Str,
                    Literal::Bool(_) => Type::Bool,
                };
                if *expected != Type::Unknown && !self.types_compatible(&lit_ty, expected) {
                    self.error(
                        format!(
                            "Pattern of type {} does not match scrutinee type {}",
                            lit_ty.display(),
                            expected.display()
                        ),
                        pattern.line,
                        pattern.col,
                    );
                }
            }
            PatternKind::Constructor(name, subs) => {
                let sig = match self.variants.get(name).cloned() {
                    Some(sig) => sig,
                    None => {
                        self.error(
                            format!("Unknown variant '{}'", name),
                            pattern.line,
                            pattern.col,
                        );
                        for sub in subs {
                            self.check_pattern(sub, &Type::Unknown, env);
                        }
                        return;
                    }
                };

                if let Type::Named(scrut_name, _) = self.unfold(expected) {
                    if scrut_name != sig.owner {
                        self.error(
                            format!(
                                "Variant '{}' belongs to type '{}', not '{}'",
                                name, sig.owner, scrut_name
                            ),
                            pattern.line,
                            pattern.col,
                        );
                    }
                }

                if subs.len() != sig.params.len() {
                    self.error(
                        format!(
                            "Variant '{}' has {} fields, pattern names {}",
                            name,
                            sig.params.len(),
                            subs.len()
                        ),
                        pattern.line,
                        pattern.col,
                    );
                }
                for (sub, ty) in subs.iter().zip(sig.params.iter()) {
                    self.check_pattern(sub, ty, env);
                }
            }
        }
    }

    fn check_exhaustiveness(&mut self, expr: &Expr, scrutinee_ty: &Type, cases: &[PatternCase]) {
        // A catch-all pattern covers everything.
        for case in cases {
            if matches!(
                case.pattern.kind,
                PatternKind::Wildcard | PatternKind::Ident(_)
            ) {
                return;
            }
        }

        match self.unfold(scrutinee_ty) {
            Type::Bool => {
                let has = |b: bool| {
                    cases.iter().any(|c| {
                        matches!(&c.pattern.kind, PatternKind::Literal(Literal::Bool(v)) if *v == b)
                    })
                };
                let mut missing = Vec::new();
                if !has(true) {
                    missing.push("true");
                }
                if !has(false) {
                    missing.push("false");
                }
                if !missing.is_empty() {
                    self.error(
                        format!("Non-exhaustive given: missing {}", missing.join(", ")),
                        expr.line,
                        expr.col,
                    );
                }
            }
            Type::Named(name, _) => {
                if let Some(variant_names) = self.sum_variants.get(&name).cloned() {
                    let present: Vec<&str> = cases
                        .iter()
                        .filter_map(|c| match &c.pattern.kind {
                            PatternKind::Constructor(n, _) => Some(n.as_str()),
                            _ => None,
                        })
                        .collect();
                    let missing: Vec<String> = variant_names
                        .iter()
                        .filter(|v| !present.contains(&v.as_str()))
                        .cloned()
                        .collect();
                    if !missing.is_empty() {
                        self.error(
                            format!(
                                "Non-exhaustive given on {}: missing {}",
                                name,
                                missing.join(", ")
                            ),
                            expr.line,
                            expr.col,
                        );
                    }
                }
            }
            // Infinite domains need a catch-all, which was checked above.
            Type::Int | Type::Float | Type::Str => {
                self.error(
                    "Non-exhaustive given: missing catch-all '_' case",
                    expr.line,
                    expr.col,
                );
            }
            _ => {}
        }
    }
}
