//! `BinOpTable`/`UnOpTable`: record exactly
//! which operand keyword pairs produce which result keyword, so the
//! Synthesizer can pick an operator for a *requested* result type and know
//! up front whether a cast is required because the operator's natural
//! result keyword differs from what was asked for.

use crate::tree::{BinOp, PrimitiveKind, UnOp};

/// The "natural" result kind of applying `op` to two operands both of kind
/// `operand`. Small integral kinds promote to `Int` for arithmetic/bitwise
/// operators, mirroring the usual integer-promotion rule; shifts always
/// force the RHS to `Int` but keep the LHS's promoted kind as the result;
/// comparisons and logical operators always produce `Bool`.
pub fn binary_natural_result(op: BinOp, operand: PrimitiveKind) -> PrimitiveKind {
    use BinOp::*;
    match op {
        Eq | Ne | Lt | Le | Gt | Ge | And | Or => PrimitiveKind::Bool,
        Shl | Shr => promote_for_arith(operand),
        Add | Sub | Mul | Div | Mod | BitAnd | BitOr | BitXor => promote_for_arith(operand),
    }
}

fn promote_for_arith(k: PrimitiveKind) -> PrimitiveKind {
    use PrimitiveKind::*;
    match k {
        SByte | Byte | Short | UShort | Char | Bool => Int,
        other => other,
    }
}

/// Whether `op` is defined over `operand` at all (e.g. logical `&&`/`||`
/// only apply to `Bool`; arithmetic/bitwise/shift only apply to integral or
/// floating kinds as appropriate).
pub fn binary_applicable(op: BinOp, operand: PrimitiveKind) -> bool {
    use BinOp::*;
    match op {
        And | Or => matches!(operand, PrimitiveKind::Bool),
        BitAnd | BitOr | BitXor | Shl | Shr => operand.is_integral() && !matches!(operand, PrimitiveKind::Bool),
        Add | Sub | Mul | Div | Mod => !matches!(operand, PrimitiveKind::Bool),
        Eq | Ne => true,
        Lt | Le | Gt | Ge => !matches!(operand, PrimitiveKind::Bool),
    }
}

/// Every `(op, operand_kind)` pair whose natural (possibly-cast) result is
/// `result`: the Synthesizer tries these in order, wrapping in a cast
/// whenever `binary_natural_result(op, operand) != result`.
pub fn binary_candidates_for_result(result: PrimitiveKind) -> Vec<(BinOp, PrimitiveKind)> {
    let ops = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::Mod,
        BinOp::BitAnd,
        BinOp::BitOr,
        BinOp::BitXor,
        BinOp::Shl,
        BinOp::Shr,
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Lt,
        BinOp::Le,
        BinOp::Gt,
        BinOp::Ge,
        BinOp::And,
        BinOp::Or,
    ];
    let mut out = Vec::new();
    for op in ops {
        for operand in PrimitiveKind::ALL {
            if binary_applicable(op, operand) {
                out.push((op, operand));
            }
        }
    }
    // Prefer operand kinds that already equal the requested result (no
    // cast needed) before kinds that would require wrapping in a cast.
    out.sort_by_key(|(op, operand)| binary_natural_result(*op, *operand) != result);
    out
}

pub fn unary_natural_result(op: UnOp, operand: PrimitiveKind) -> PrimitiveKind {
    match op {
        UnOp::Not => PrimitiveKind::Bool,
        UnOp::Neg | UnOp::BitNot | UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => {
            promote_for_arith(operand)
        }
    }
}

pub fn unary_applicable(op: UnOp, operand: PrimitiveKind) -> bool {
    match op {
        UnOp::Not => matches!(operand, PrimitiveKind::Bool),
        UnOp::BitNot | UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => {
            operand.is_integral() && !matches!(operand, PrimitiveKind::Bool)
        }
        UnOp::Neg => !matches!(operand, PrimitiveKind::Bool),
    }
}

pub fn unary_candidates_for_result(result: PrimitiveKind) -> Vec<(UnOp, PrimitiveKind)> {
    let ops = [UnOp::Neg, UnOp::Not, UnOp::BitNot, UnOp::PreInc, UnOp::PreDec, UnOp::PostInc, UnOp::PostDec];
    let mut out = Vec::new();
    for op in ops {
        for operand in PrimitiveKind::ALL {
            if unary_applicable(op, operand) {
                out.push((op, operand));
            }
        }
    }
    out.sort_by_key(|(op, operand)| unary_natural_result(*op, *operand) != result);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_rhs_is_always_forced_to_int_by_caller() {
        // This table only records the LHS/result relationship; the
        // Synthesizer is responsible for forcing the RHS to `int`.
        assert_eq!(binary_natural_result(BinOp::Shl, PrimitiveKind::Byte), PrimitiveKind::Int);
    }

    #[test]
    fn logical_ops_only_apply_to_bool() {
        assert!(binary_applicable(BinOp::And, PrimitiveKind::Bool));
        assert!(!binary_applicable(BinOp::And, PrimitiveKind::Int));
    }

    #[test]
    fn candidates_matching_result_come_first() {
        let cands = binary_candidates_for_result(PrimitiveKind::Int);
        let (op, operand) = cands[0];
        assert_eq!(binary_natural_result(op, operand), PrimitiveKind::Int);
    }

    #[test]
    fn unary_not_only_applies_to_bool() {
        assert!(unary_applicable(UnOp::Not, PrimitiveKind::Bool));
        assert!(!unary_applicable(UnOp::Not, PrimitiveKind::Int));
    }
}
