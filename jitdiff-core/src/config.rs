//! Generation tunables.
//!
//! Collected into one `Serialize`/`Deserialize` struct so `jitdiff-cli` can
//! layer an optional `--config <path>` TOML file over the defaults with
//! `serde` + `toml`.

use crate::random::RecursionRejection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Number of aggregates `TypeUniverse::generate_types` produces.
    pub num_aggregates: u32,
    /// Number of interfaces `TypeUniverse::generate_types` produces.
    pub num_interfaces: u32,
    /// Probability an aggregate is generated as a class rather than a
    /// struct.
    pub class_probability: f64,
    /// `(weight, field_count)` distribution for aggregate field counts.
    pub field_count_distribution: Vec<(u32, u32)>,
    /// `(weight, param_count)` distribution for function parameter counts.
    pub param_count_distribution: Vec<(u32, u32)>,
    /// Probability a parameter or return type is generated as `Ref`.
    pub by_ref_probability: f64,
    /// Probability assignment-generation introduces a brand new local
    /// rather than reusing an existing l-value.
    pub new_local_probability: f64,
    /// Probability a `Ref`-typed l-value undergoes ref-reassignment rather
    /// than a plain value assignment.
    pub ref_reassign_probability: f64,
    /// Probability call-generation synthesizes a brand-new callee rather
    /// than calling an existing function.
    pub new_callee_probability: f64,
    /// Upper bound on a single function's transitive call-count budget
    ///.
    pub single_function_max_total_calls: u64,
    /// Minimum number of statements function 0's root block must reach
    /// before the generation loop may stop.
    pub global_min_statement_count: u32,
    /// `(weight, statement_count)` distribution for a block's target
    /// statement count.
    pub block_statement_count_distribution: Vec<(u32, u32)>,
    /// `(weight, StatementKind)` distribution, see [`StatementKindWeight`].
    pub statement_kind_weights: Vec<StatementKindWeight>,
    /// Whether `ChecksumInstrumentation` is active (`--checksum[+|-]`).
    pub checksum_enabled: bool,
    pub recursion: RecursionRejection,
    /// Number of `If`-guard generation retries before accepting a possibly
    /// constant-valued guard.
    pub if_guard_retries: u32,
    /// Bias toward 0/1/-1/min/max when generating primitive literals
    ///, expressed as the probability of picking a biased constant
    /// instead of a uniform value.
    pub literal_bias_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    Block,
    Assignment,
    Call,
    If,
    Return,
    TryFinally,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementKindWeight(pub u32, pub StatementKind);

impl Default for GenConfig {
    fn default() -> Self {
        use StatementKind::*;
        Self {
            num_aggregates: 6,
            num_interfaces: 2,
            class_probability: 0.5,
            field_count_distribution: vec![(4, 1), (4, 2), (2, 3), (1, 4)],
            param_count_distribution: vec![(3, 0), (4, 1), (3, 2), (1, 3)],
            by_ref_probability: 0.15,
            new_local_probability: 0.5,
            ref_reassign_probability: 0.2,
            new_callee_probability: 0.3,
            single_function_max_total_calls: 1000,
            global_min_statement_count: 20,
            block_statement_count_distribution: vec![(3, 2), (4, 4), (2, 6), (1, 8)],
            statement_kind_weights: vec![
                StatementKindWeight(2, Block),
                StatementKindWeight(6, Assignment),
                StatementKindWeight(3, Call),
                StatementKindWeight(3, If),
                StatementKindWeight(2, Return),
                StatementKindWeight(1, TryFinally),
                StatementKindWeight(2, Loop),
            ],
            checksum_enabled: true,
            recursion: RecursionRejection::default(),
            if_guard_retries: 20,
            literal_bias_probability: 0.35,
        }
    }
}

impl GenConfig {
    pub fn statement_weights(&self) -> Vec<(u32, StatementKind)> {
        self.statement_kind_weights.iter().map(|w| (w.0, w.1)).collect()
    }
}
