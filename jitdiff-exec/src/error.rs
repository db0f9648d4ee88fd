//! The outcome taxonomy threaded through compile, execute, and reduce.
//!
//! One `thiserror`-derived enum, one variant per failure mode, with small
//! `Display` messages rather than wrapping the underlying cause verbatim.

use thiserror::Error;

/// A side's observed result once a program pair has actually run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideResult {
    pub checksum: String,
    pub exception_type: Option<String>,
    pub checksum_sites: Vec<(String, String)>,
}

/// The classification of a single attempted (compile, execute) pipeline run
/// for one candidate program, or one of the failure modes the pipeline can
/// stop at before reaching a result. `NotInteresting` is reducer-only: it is
/// never produced by the executor-client itself, only by the predicate that
/// wraps it.
#[derive(Debug, Error)]
pub enum Outcome {
    /// The syntax tree failed to compile and the host compiler itself
    /// terminated abnormally (crashed) rather than reporting diagnostics.
    #[error("compiler crashed while compiling {config}: {stderr}")]
    CompilerCrash { config: CompileConfig, stderr: String },

    /// Compilation produced at least one error-severity diagnostic.
    #[error("compile error in {config} build: {diagnostic}")]
    CompileError { config: CompileConfig, diagnostic: String },

    /// The host did not produce a compiler-timeout-bound response before
    /// the caller's compile deadline (Open Question 3: treated identically
    /// to an execution timeout rather than a distinct taxonomy member).
    #[error("compiler timed out compiling {config} build")]
    CompilerTimeout { config: CompileConfig },

    /// The child did not produce a response line within the deadline; it
    /// has already been killed by the time this is constructed.
    #[error("execution timed out")]
    ExecutionTimeout,

    /// The child ended (EOF on stdout) without ever producing a response
    /// line; whatever stderr it had written is captured verbatim.
    #[error("execution crashed: {stderr}")]
    ExecutionCrash { stderr: String },

    /// A well-formed pair of results was obtained for both builds.
    #[error("execution succeeded")]
    ExecutionSuccess { debug: SideResult, release: SideResult },

    /// `ExecutionSuccess`, but debug and release disagree (differing
    /// exception types, or matching exception status but differing
    /// checksums). `first_unmatch` is which side produced the earliest
    /// checksum site that diverges, if the disagreement is checksum-based.
    #[error("program mismatch: debug={debug_summary} release={release_summary}")]
    ProgramMismatch {
        debug: SideResult,
        release: SideResult,
        debug_first_unmatch: Option<(String, String)>,
        release_first_unmatch: Option<(String, String)>,
        debug_summary: String,
        release_summary: String,
    },

    /// Reducer-only: the interestingness predicate rejected this candidate.
    #[error("candidate not interesting")]
    NotInteresting,
}

impl Outcome {
    pub fn is_interesting_success(&self) -> bool {
        matches!(self, Outcome::ProgramMismatch { .. })
    }

    /// Short tag used by the event log and the reduced-header summary
    /// lines (`// Debug: <summary>` / `// Release: <summary>`).
    pub fn side_summary(result: &SideResult) -> String {
        match &result.exception_type {
            Some(ty) => ty.clone(),
            None => result.checksum.clone(),
        }
    }
}

/// Which build of a candidate a `CompilerCrash`/`CompileError`/
/// `CompilerTimeout` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileConfig {
    Debug,
    Release,
}

impl std::fmt::Display for CompileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileConfig::Debug => write!(f, "debug"),
            CompileConfig::Release => write!(f, "release"),
        }
    }
}

/// Infrastructure failures that are never part of a candidate's
/// classification and must be surfaced to the dispatcher rather than
/// swallowed into `NotInteresting`.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to spawn execution server: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("execution server I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("malformed wire message: {0}")]
    Protocol(#[source] serde_json::Error),

    #[error("program has no compile or runtime errors; nothing to reduce")]
    NothingToReduce,

    #[error("program times out under the initial run; cannot distinguish a hang from a slow program")]
    InitialTimeout,
}
