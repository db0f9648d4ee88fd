//! Statement-level simplifiers: each proposes a replacement *sequence* of
//! zero or more statements for a single statement position. Zero statements
//! is deletion; this is how `RemoveStatement`, the catalog's priority-1
//! entry, is expressed without a separate "delete" API.

use jitdiff_core::tree::{Assign, Block, Expr, FuzzType, Literal, PrimitiveKind, Stmt, UnOp};

pub trait StatementSimplifier {
    fn name(&self) -> &'static str;
    /// Late simplifiers are skipped on the fine pass's first outer
    /// iteration.
    fn late(&self) -> bool {
        false
    }
    /// `fresh_name` mints a variable name guaranteed unused in the current
    /// program; only `ExtractCondition` needs it.
    fn propose(&self, stmt: &Stmt, fresh_name: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>>;
}

/// Priority 1: fires before any other simplifier is tried at a position.
#[derive(Debug)]
pub struct RemoveStatement;
impl StatementSimplifier for RemoveStatement {
    fn name(&self) -> &'static str {
        "remove-statement"
    }
    fn propose(&self, _stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        vec![vec![]]
    }
}

#[derive(Debug)]
pub struct FlattenBlock;
impl StatementSimplifier for FlattenBlock {
    fn name(&self) -> &'static str {
        "flatten-block"
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        match stmt {
            Stmt::Block(b) => vec![b.0.clone()],
            _ => vec![],
        }
    }
}

/// `T x = expr; ↦ T x;`
#[derive(Debug)]
pub struct DeclWithoutInitializer;
impl StatementSimplifier for DeclWithoutInitializer {
    fn name(&self) -> &'static str {
        "decl-without-initializer"
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        match stmt {
            Stmt::Assign(Assign::NewLocal { ty, name, .. }) => {
                vec![vec![Stmt::LocalDecl { ty: ty.clone(), name: name.clone() }]]
            }
            _ => vec![],
        }
    }
}

/// A ref-typed local initialized with (or rebound to) `ref <lvalue>`
/// collapses to a plain value copy, dropping the indirection.
#[derive(Debug)]
pub struct RefRebindToValue;
impl StatementSimplifier for RefRebindToValue {
    fn name(&self) -> &'static str {
        "ref-rebind-to-value"
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        match stmt {
            Stmt::Assign(Assign::NewLocal { ty: FuzzType::Ref(inner), name, init: Expr::Ref(e) }) => {
                vec![vec![Stmt::Assign(Assign::NewLocal { ty: (**inner).clone(), name: name.clone(), init: (**e).clone() })]]
            }
            Stmt::Assign(Assign::RefRebind { lhs, rhs: Expr::Ref(e) }) => {
                vec![vec![Stmt::Assign(Assign::Compound { lhs: lhs.clone(), op: None, rhs: Some((**e).clone()) })]]
            }
            _ => vec![],
        }
    }
}

/// then-inline / else-inline / flip-empty-then / extract-condition-to-local.
#[derive(Debug)]
pub struct IfBranchExtraction;
impl StatementSimplifier for IfBranchExtraction {
    fn name(&self) -> &'static str {
        "if-branch-extraction"
    }
    fn propose(&self, stmt: &Stmt, fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        let Stmt::If { cond, then_block, else_block } = stmt else { return vec![] };
        let mut out = Vec::new();
        out.push(then_block.0.clone());
        if let Some(eb) = else_block {
            out.push(eb.0.clone());
        }
        // Open Question 1: flip-if only when the then-branch is empty.
        if then_block.0.is_empty() {
            if let Some(eb) = else_block {
                out.push(vec![Stmt::If {
                    cond: Expr::Unary { op: UnOp::Not, operand: Box::new(cond.clone()) },
                    then_block: eb.clone(),
                    else_block: None,
                }]);
            }
        }
        let name = fresh();
        out.push(vec![
            Stmt::Assign(Assign::NewLocal { ty: FuzzType::Primitive(PrimitiveKind::Bool), name: name.clone(), init: cond.clone() }),
            Stmt::If { cond: Expr::var(name), then_block: then_block.clone(), else_block: else_block.clone() },
        ]);
        out
    }
}

/// `for (int v = 0; v < bound; v++) body ↦ { int v = 0; body }`, dropping
/// the condition and increment unconditionally (no usage check needed: the
/// induction variable is read-only by construction, so deleting its own
/// advance never changes whether anything else in `body` compiles).
#[derive(Debug)]
pub struct ForLoopToBlock;
impl StatementSimplifier for ForLoopToBlock {
    fn name(&self) -> &'static str {
        "for-loop-to-block"
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        match stmt {
            Stmt::For { var, body, .. } => {
                let mut stmts = vec![Stmt::Assign(Assign::NewLocal {
                    ty: FuzzType::Primitive(PrimitiveKind::Int),
                    name: var.clone(),
                    init: Expr::Literal(Literal::Int(0)),
                })];
                stmts.extend(body.0.clone());
                vec![vec![Stmt::Block(Block(stmts))]]
            }
            _ => vec![],
        }
    }
}

/// try-only / finally-only / concatenation / reversed concatenation.
#[derive(Debug)]
pub struct TryFinallyVariants;
impl StatementSimplifier for TryFinallyVariants {
    fn name(&self) -> &'static str {
        "try-finally-variants"
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        match stmt {
            Stmt::TryFinally { try_block, finally_block } => {
                let mut concat = try_block.0.clone();
                concat.extend(finally_block.0.clone());
                let mut reversed = finally_block.0.clone();
                reversed.extend(try_block.0.clone());
                vec![try_block.0.clone(), finally_block.0.clone(), concat, reversed]
            }
            _ => vec![],
        }
    }
}

/// `<expr containing a call>; ↦` extract the call to its own statement,
/// dropping whatever wrapped it. Narrowed to the common wrapper shapes
/// (`Paren`, `Cast`) directly around a `Call`, rather than arbitrary nesting
/// depth — deeper extraction would need a fresh local to hold the call's
/// result for shapes where the wrapper's other operands also matter, which
/// none of this tree's wrapper-only shapes (`Paren`, `Cast`) do.
#[derive(Debug)]
pub struct InvocationExtraction;
impl StatementSimplifier for InvocationExtraction {
    fn name(&self) -> &'static str {
        "invocation-extraction"
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        let Stmt::ExprStmt(e) = stmt else { return vec![] };
        match e {
            Expr::Paren(inner) | Expr::Cast { expr: inner, .. } if matches!(**inner, Expr::Call { .. }) => {
                vec![vec![Stmt::ExprStmt((**inner).clone())]]
            }
            _ => vec![],
        }
    }
}

/// Late: narrow an integer literal to the smallest primitive kind that
/// still represents its value.
#[derive(Debug)]
pub struct ConstantLiteralNarrowing;
impl StatementSimplifier for ConstantLiteralNarrowing {
    fn name(&self) -> &'static str {
        "constant-literal-narrowing-decl"
    }
    fn late(&self) -> bool {
        true
    }
    fn propose(&self, stmt: &Stmt, _fresh: &mut dyn FnMut() -> String) -> Vec<Vec<Stmt>> {
        // The expression-level narrowing (see `expression.rs`) already
        // handles every literal occurrence reachable via `expr_roots`; this
        // entry exists only for symmetry with the catalog's statement/
        // expression/member three-tier traversal and proposes nothing on
        // its own.
        let _ = stmt;
        vec![]
    }
}

/// Ordering matters: `RemoveStatement` must be tried first at every
/// position.
pub fn statement_simplifiers() -> Vec<Box<dyn StatementSimplifier>> {
    vec![
        Box::new(RemoveStatement),
        Box::new(FlattenBlock),
        Box::new(DeclWithoutInitializer),
        Box::new(RefRebindToValue),
        Box::new(IfBranchExtraction),
        Box::new(ForLoopToBlock),
        Box::new(TryFinallyVariants),
        Box::new(InvocationExtraction),
        Box::new(ConstantLiteralNarrowing),
    ]
}
