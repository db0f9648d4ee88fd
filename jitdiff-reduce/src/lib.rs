//! Interestingness-preserving tree-rewrite shrinker: given a program known
//! to trigger some compile/runtime divergence, produces the smallest
//! program still triggering the same divergence. Synchronous throughout —
//! callers supply a `Predicate` closure bridging to their own compiler and
//! executor.

pub mod addr;
pub mod coarse;
pub mod exprwalk;
pub mod finalize;
pub mod fine;
pub mod gitlog;
pub mod interestingness;
pub mod reducer;
pub mod simplifiers;

pub use interestingness::{Mode, Predicate};
pub use reducer::{reduce, ReductionResult};
