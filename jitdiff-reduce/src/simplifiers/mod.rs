//! The rewrite catalog the fine pass draws candidates from.
//!
//! Each simplifier is a small named unit with a `propose` method, run
//! through the fixed-point driver in `fine::run`; a proposal is only kept
//! if the caller's interestingness predicate still accepts it — unlike an
//! always-improving optimization pass, nothing here is assumed safe on its
//! own.

pub mod expression;
pub mod program;
pub mod statement;

pub use expression::expression_simplifiers;
pub use program::{program_simplifiers, ProgramSimplifier};
pub use statement::{statement_simplifiers, StatementSimplifier};
