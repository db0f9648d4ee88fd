//! Interestingness-mode detection: which observable failure made the
//! *original* program worth reducing, so every candidate along the way is
//! judged against the same criterion rather than "any failure at all"
//! (which would let the reducer wander from, say, a checksum mismatch to an
//! unrelated compile error).

use jitdiff_exec::{CompileConfig, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    CompilerCrash(CompileConfig),
    CompileError(CompileConfig, String),
    RuntimeCrash,
    ExceptionDivergence { debug_exception: String, release_exception: String },
    ChecksumDivergence,
}

pub fn detect_mode(outcome: &Outcome) -> Option<Mode> {
    match outcome {
        Outcome::CompilerCrash { config, .. } => Some(Mode::CompilerCrash(*config)),
        Outcome::CompileError { config, diagnostic } => Some(Mode::CompileError(*config, diagnostic.clone())),
        Outcome::ExecutionCrash { .. } => Some(Mode::RuntimeCrash),
        Outcome::ProgramMismatch { debug, release, .. } => match (&debug.exception_type, &release.exception_type) {
            (Some(d), Some(r)) if d != r => {
                Some(Mode::ExceptionDivergence { debug_exception: d.clone(), release_exception: r.clone() })
            }
            (Some(d), None) => Some(Mode::ExceptionDivergence { debug_exception: d.clone(), release_exception: String::new() }),
            (None, Some(r)) => Some(Mode::ExceptionDivergence { debug_exception: String::new(), release_exception: r.clone() }),
            _ => Some(Mode::ChecksumDivergence),
        },
        Outcome::CompilerTimeout { .. } | Outcome::ExecutionTimeout | Outcome::ExecutionSuccess { .. } | Outcome::NotInteresting => None,
    }
}

/// Whether a candidate's outcome still matches the target mode. A crash
/// silently upgrades the target mode to `RuntimeCrash`.
pub fn is_interesting(mode: &mut Mode, outcome: &Outcome) -> bool {
    if matches!(outcome, Outcome::ExecutionCrash { .. }) {
        *mode = Mode::RuntimeCrash;
        return true;
    }
    match detect_mode(outcome) {
        Some(observed) => &observed == mode,
        None => false,
    }
}

/// What the coarse and fine passes drive candidates through: compile both
/// configurations, execute, classify, and report whether the result still
/// matches (or, via a crash, upgrades) the tracked mode. Implemented by a
/// plain closure in the common case; `jitdiff-cli` bridges this to the
/// async executor-client with `tokio::runtime::Handle::block_on`.
pub trait Predicate {
    fn check(&mut self, program: &jitdiff_core::tree::Program, mode: &mut Mode) -> bool;
}

impl<F> Predicate for F
where
    F: FnMut(&jitdiff_core::tree::Program, &mut Mode) -> bool,
{
    fn check(&mut self, program: &jitdiff_core::tree::Program, mode: &mut Mode) -> bool {
        self(program, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitdiff_exec::SideResult;

    fn side(checksum: &str, exception: Option<&str>) -> SideResult {
        SideResult { checksum: checksum.into(), exception_type: exception.map(String::from), checksum_sites: vec![] }
    }

    #[test]
    fn detects_checksum_divergence() {
        let outcome = Outcome::ProgramMismatch {
            debug: side("1", None),
            release: side("2", None),
            debug_first_unmatch: None,
            release_first_unmatch: None,
            debug_summary: "1".into(),
            release_summary: "2".into(),
        };
        assert_eq!(detect_mode(&outcome), Some(Mode::ChecksumDivergence));
    }

    #[test]
    fn crash_upgrades_any_target_mode() {
        let mut mode = Mode::ChecksumDivergence;
        let crash = Outcome::ExecutionCrash { stderr: "boom".into() };
        assert!(is_interesting(&mut mode, &crash));
        assert_eq!(mode, Mode::RuntimeCrash);
    }

    #[test]
    fn execution_success_is_never_interesting() {
        let mut mode = Mode::ChecksumDivergence;
        let success = Outcome::ExecutionSuccess { debug: side("1", None), release: side("1", None) };
        assert!(!is_interesting(&mut mode, &success));
    }
}
