//! Top-level reduction driver: detect why the starting program was
//! interesting, run the coarse pass, run the fine pass to a fixed point,
//! then finalize. Stays synchronous so it has no opinion on how a caller
//! bridges `Predicate` to an actual compiler/executor — `jitdiff-cli` does
//! that with `tokio::runtime::Handle::block_on`.

use crate::coarse;
use crate::finalize;
use crate::fine;
use crate::interestingness::{self, Mode, Predicate};
use jitdiff_core::random::Random;
use jitdiff_core::tree::Program;
use jitdiff_exec::{InfraError, Outcome};
use tracing::info;

/// The reduced program plus the bookkeeping needed to render its header.
#[derive(Debug)]
pub struct ReductionResult {
    pub program: Program,
    pub mode: Mode,
    pub original_bytes: usize,
}

/// Reduces `program`, which must already be known interesting via
/// `initial_outcome` (the result of compiling and running it unmodified).
/// `predicate` re-checks every candidate produced along the way against the
/// mode derived from `initial_outcome`.
pub fn reduce(
    program: Program,
    initial_outcome: &Outcome,
    original_bytes: usize,
    predicate: &mut impl Predicate,
    rng: &mut Random,
) -> Result<ReductionResult, InfraError> {
    match initial_outcome {
        Outcome::CompilerTimeout { .. } | Outcome::ExecutionTimeout => return Err(InfraError::InitialTimeout),
        _ => {}
    }
    let mut mode = interestingness::detect_mode(initial_outcome).ok_or(InfraError::NothingToReduce)?;

    info!(?mode, "starting coarse pass");
    let program = coarse::local_lifting(program, &mut mode, predicate);
    let program = coarse::statement_removal(program, &mut mode, predicate);

    info!(?mode, "starting fine pass");
    let program = fine::run(program, &mut mode, predicate, rng);

    Ok(ReductionResult { program, mode, original_bytes })
}

impl ReductionResult {
    /// Renders the finalized, human-readable reproduction source. Summaries
    /// are the caller's choice of label for each side (an exception type
    /// name, or a checksum) since only the caller still has the final
    /// `Outcome` the reduction converged to.
    pub fn render(&self, elapsed_hhmmss: &str, debug_summary: &str, release_summary: &str) -> String {
        finalize::render_finalized(&self.program, self.original_bytes, elapsed_hhmmss, debug_summary, release_summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitdiff_core::config::GenConfig;
    use jitdiff_core::synth::generate_program;
    use jitdiff_exec::SideResult;
    use pretty_assertions::assert_eq as assert_eq_pretty;

    fn side(checksum: &str) -> SideResult {
        SideResult { checksum: checksum.into(), exception_type: None, checksum_sites: vec![] }
    }

    #[test]
    fn nothing_to_reduce_on_success() {
        let cfg = GenConfig::default();
        let program = generate_program(&cfg, 1, "Program");
        let outcome = Outcome::ExecutionSuccess { debug: side("1"), release: side("1") };
        let mut rng = Random::new(1);
        let mut always_true = |_: &Program, _: &mut Mode| true;
        let result = reduce(program, &outcome, 1024, &mut always_true, &mut rng);
        assert!(matches!(result, Err(InfraError::NothingToReduce)));
    }

    #[test]
    fn initial_timeout_is_surfaced() {
        let cfg = GenConfig::default();
        let program = generate_program(&cfg, 1, "Program");
        let outcome = Outcome::ExecutionTimeout;
        let mut rng = Random::new(1);
        let mut always_true = |_: &Program, _: &mut Mode| true;
        let result = reduce(program, &outcome, 1024, &mut always_true, &mut rng);
        assert!(matches!(result, Err(InfraError::InitialTimeout)));
    }

    #[test]
    fn reduces_a_checksum_divergence_to_a_fixed_point() {
        let cfg = GenConfig::default();
        let program = generate_program(&cfg, 7, "Program");
        let outcome = Outcome::ProgramMismatch {
            debug: side("1"),
            release: side("2"),
            debug_first_unmatch: None,
            release_first_unmatch: None,
            debug_summary: "1".into(),
            release_summary: "2".into(),
        };
        let mut rng = Random::new(7);
        // Every candidate is accepted, so reduction should converge quickly
        // rather than loop forever chasing a predicate that never rejects.
        let mut always_true = |_: &Program, _: &mut Mode| true;
        let result = reduce(program, &outcome, 4096, &mut always_true, &mut rng).expect("reducible");
        assert_eq!(result.mode, Mode::ChecksumDivergence);
        let rendered = result.render("00:00:01", "1", "2");
        assert!(rendered.contains("Reduced from"));
    }

    /// Invariant 8: one extra fine pass after the reported fixed point
    /// changes nothing.
    #[test]
    fn fine_pass_is_idempotent_at_its_own_fixed_point() {
        let cfg = GenConfig::default();
        let program = generate_program(&cfg, 3, "Program");
        let mut mode = Mode::ChecksumDivergence;
        let mut always_true = |_: &Program, _: &mut Mode| true;
        let mut rng = Random::new(3);
        let converged = fine::run(program, &mut mode, &mut always_true, &mut rng);
        let before = jitdiff_core::printer::print_program(&converged, 3, "");

        let mut rng_again = Random::new(3);
        let replayed = fine::run(converged, &mut mode, &mut always_true, &mut rng_again);
        let after = jitdiff_core::printer::print_program(&replayed, 3, "");
        assert_eq_pretty!(before, after);
    }
}
