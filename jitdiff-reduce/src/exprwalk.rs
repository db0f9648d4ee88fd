//! Generic expression-occurrence addressing: every subexpression reachable
//! from a statement's top-level expression fields is numbered in a stable
//! depth-first order, so a simplifier can target "occurrence N" without the
//! caller needing to know the tree shape at that position.

use jitdiff_core::tree::{Assign, CallTarget, Expr, Stmt};

pub fn children(e: &Expr) -> Vec<&Expr> {
    match e {
        Expr::Unary { operand, .. } => vec![operand],
        Expr::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        Expr::Call { target, args } => {
            let mut v = Vec::new();
            if let CallTarget::Instance { receiver, .. } = target {
                v.push(receiver.as_ref());
            }
            v.extend(args.iter());
            v
        }
        Expr::Cast { expr, .. } => vec![expr],
        Expr::Ref(inner) => vec![inner],
        Expr::New { args, .. } => args.iter().collect(),
        Expr::Paren(inner) => vec![inner],
        Expr::ChecksumSite { value, .. } => vec![value],
        Expr::Literal(_) | Expr::Var(_) => vec![],
    }
}

pub fn children_mut(e: &mut Expr) -> Vec<&mut Expr> {
    match e {
        Expr::Unary { operand, .. } => vec![operand],
        Expr::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        Expr::Call { target, args } => {
            let mut v = Vec::new();
            if let CallTarget::Instance { receiver, .. } = target {
                v.push(receiver.as_mut());
            }
            v.extend(args.iter_mut());
            v
        }
        Expr::Cast { expr, .. } => vec![expr],
        Expr::Ref(inner) => vec![inner],
        Expr::New { args, .. } => args.iter_mut().collect(),
        Expr::Paren(inner) => vec![inner],
        Expr::ChecksumSite { value, .. } => vec![value],
        Expr::Literal(_) | Expr::Var(_) => vec![],
    }
}

/// Top-level expression fields directly owned by a statement (not
/// recursing into nested blocks, which the addr module visits separately).
pub fn expr_roots(stmt: &Stmt) -> Vec<&Expr> {
    match stmt {
        Stmt::Assign(Assign::NewLocal { init, .. }) => vec![init],
        Stmt::Assign(Assign::RefRebind { rhs, .. }) => vec![rhs],
        Stmt::Assign(Assign::Compound { rhs: Some(e), .. }) => vec![e],
        Stmt::Assign(Assign::Compound { rhs: None, .. }) | Stmt::Assign(Assign::IncDec { .. }) => vec![],
        Stmt::ExprStmt(e) => vec![e],
        Stmt::If { cond, .. } => vec![cond],
        Stmt::Return(Some(e)) => vec![e],
        Stmt::Return(None) => vec![],
        Stmt::For { bound, .. } => vec![bound],
        Stmt::Block(_) | Stmt::TryFinally { .. } | Stmt::LocalDecl { .. } => vec![],
    }
}

pub fn expr_roots_mut(stmt: &mut Stmt) -> Vec<&mut Expr> {
    match stmt {
        Stmt::Assign(Assign::NewLocal { init, .. }) => vec![init],
        Stmt::Assign(Assign::RefRebind { rhs, .. }) => vec![rhs],
        Stmt::Assign(Assign::Compound { rhs: Some(e), .. }) => vec![e],
        Stmt::Assign(Assign::Compound { rhs: None, .. }) | Stmt::Assign(Assign::IncDec { .. }) => vec![],
        Stmt::ExprStmt(e) => vec![e],
        Stmt::If { cond, .. } => vec![cond],
        Stmt::Return(Some(e)) => vec![e],
        Stmt::Return(None) => vec![],
        Stmt::For { bound, .. } => vec![bound],
        Stmt::Block(_) | Stmt::TryFinally { .. } | Stmt::LocalDecl { .. } => vec![],
    }
}

fn count_in(e: &Expr) -> usize {
    1 + children(e).iter().map(|c| count_in(c)).sum::<usize>()
}

pub fn count_exprs(stmt: &Stmt) -> usize {
    expr_roots(stmt).iter().map(|r| count_in(r)).sum()
}

fn nth_in<'e>(e: &'e Expr, n: usize, counter: &mut usize) -> Option<&'e Expr> {
    if *counter == n {
        *counter += 1;
        return Some(e);
    }
    *counter += 1;
    for c in children(e) {
        if let Some(found) = nth_in(c, n, counter) {
            return Some(found);
        }
    }
    None
}

pub fn nth_expr(stmt: &Stmt, n: usize) -> Option<&Expr> {
    let mut counter = 0;
    for root in expr_roots(stmt) {
        if let Some(e) = nth_in(root, n, &mut counter) {
            return Some(e);
        }
    }
    None
}

fn set_nth_in(e: &mut Expr, n: usize, counter: &mut usize, new: &mut Option<Expr>) {
    if new.is_none() {
        return;
    }
    if *counter == n {
        *e = new.take().unwrap();
        *counter += 1;
        return;
    }
    *counter += 1;
    for c in children_mut(e) {
        if new.is_none() {
            return;
        }
        set_nth_in(c, n, counter, new);
    }
}

pub fn set_nth_expr(stmt: &mut Stmt, n: usize, replacement: Expr) {
    let mut counter = 0;
    let mut new = Some(replacement);
    for root in expr_roots_mut(stmt) {
        if new.is_none() {
            return;
        }
        set_nth_in(root, n, &mut counter, &mut new);
    }
}

/// Apply a context-free expression rewrite at every occurrence within
/// `stmt`, producing one candidate statement per (occurrence, proposal).
pub fn candidates_for_expr_rewrite(stmt: &Stmt, rewrite: impl Fn(&Expr) -> Vec<Expr>) -> Vec<Stmt> {
    let total = count_exprs(stmt);
    let mut out = Vec::new();
    for n in 0..total {
        let Some(target) = nth_expr(stmt, n) else { continue };
        for proposal in rewrite(target) {
            let mut candidate = stmt.clone();
            set_nth_expr(&mut candidate, n, proposal);
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitdiff_core::tree::{BinOp, Literal};

    #[test]
    fn counts_nested_binary_expression() {
        let e = Expr::Binary {
            op: BinOp::Add,
            lhs: Box::new(Expr::Literal(Literal::Int(1))),
            rhs: Box::new(Expr::Paren(Box::new(Expr::Literal(Literal::Int(2))))),
        };
        let stmt = Stmt::ExprStmt(e);
        assert_eq!(count_exprs(&stmt), 4); // binary, lit1, paren, lit2
    }

    #[test]
    fn set_nth_replaces_exact_occurrence() {
        let e = Expr::Binary {
            op: BinOp::Add,
            lhs: Box::new(Expr::Literal(Literal::Int(1))),
            rhs: Box::new(Expr::Literal(Literal::Int(2))),
        };
        let mut stmt = Stmt::ExprStmt(e);
        set_nth_expr(&mut stmt, 1, Expr::Literal(Literal::Int(99)));
        if let Stmt::ExprStmt(Expr::Binary { lhs, rhs, .. }) = &stmt {
            assert!(matches!(**lhs, Expr::Literal(Literal::Int(99))));
            assert!(matches!(**rhs, Expr::Literal(Literal::Int(2))));
        } else {
            panic!("unexpected shape");
        }
    }
}
