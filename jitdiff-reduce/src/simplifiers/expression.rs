//! Expression-level simplifiers: context-free `Expr -> Vec<Expr>` rewrites,
//! applied at every occurrence within a statement by
//! `exprwalk::candidates_for_expr_rewrite`.

use jitdiff_core::tree::{Expr, Literal};

#[derive(Debug)]
pub struct NamedExprSimplifier {
    pub name: &'static str,
    pub late: bool,
    pub rewrite: fn(&Expr) -> Vec<Expr>,
}

pub fn binary_operand_extraction(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Binary { lhs, rhs, .. } => vec![(**lhs).clone(), (**rhs).clone()],
        _ => vec![],
    }
}

pub fn cast_removal(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Cast { expr, .. } => vec![(**expr).clone()],
        _ => vec![],
    }
}

/// Skips unwrapping parens around a `Binary` inner expression: doing so
/// would change the printed precedence of the surrounding expression.
pub fn paren_removal(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Paren(inner) if !matches!(**inner, Expr::Binary { .. }) => vec![(**inner).clone()],
        _ => vec![],
    }
}

/// Applies to every `UnOp`, including the inc/dec forms (those also appear
/// as `Expr::Unary` when used as an expression value, not only inside
/// `Assign::IncDec`).
pub fn unary_operand_extraction(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Unary { operand, .. } => vec![(**operand).clone()],
        _ => vec![],
    }
}

/// Late: shrink an integer literal to the narrowest primitive kind that
/// still represents its value.
pub fn constant_numeric_literal_narrowing(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Literal(Literal::Int(n)) => {
            let mut out = Vec::new();
            if let Ok(b) = u8::try_from(*n) {
                out.push(Expr::Literal(Literal::Byte(b)));
            }
            if let Ok(b) = i8::try_from(*n) {
                out.push(Expr::Literal(Literal::SByte(b)));
            }
            if let Ok(s) = i16::try_from(*n) {
                out.push(Expr::Literal(Literal::Short(s)));
            }
            if let Ok(s) = u16::try_from(*n) {
                out.push(Expr::Literal(Literal::UShort(s)));
            }
            out
        }
        Expr::Literal(Literal::Long(n)) => {
            let mut out = Vec::new();
            if let Ok(i) = i32::try_from(*n) {
                out.push(Expr::Literal(Literal::Int(i)));
            }
            out
        }
        Expr::Literal(Literal::ULong(n)) => {
            let mut out = Vec::new();
            if let Ok(i) = u32::try_from(*n) {
                out.push(Expr::Literal(Literal::UInt(i)));
            }
            out
        }
        Expr::Literal(Literal::Double(d)) => {
            let f = *d as f32;
            if f as f64 == *d {
                vec![Expr::Literal(Literal::Float(f))]
            } else {
                vec![]
            }
        }
        _ => vec![],
    }
}

pub fn expression_simplifiers() -> Vec<NamedExprSimplifier> {
    vec![
        NamedExprSimplifier { name: "binary-operand-extraction", late: false, rewrite: binary_operand_extraction },
        NamedExprSimplifier { name: "cast-removal", late: false, rewrite: cast_removal },
        NamedExprSimplifier { name: "paren-removal", late: false, rewrite: paren_removal },
        NamedExprSimplifier { name: "unary-operand-extraction", late: false, rewrite: unary_operand_extraction },
        NamedExprSimplifier { name: "constant-numeric-literal-narrowing", late: true, rewrite: constant_numeric_literal_narrowing },
    ]
}
