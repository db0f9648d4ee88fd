//! Plain-text summary printed to stdout once a worker finds and (optionally)
//! reduces an interesting program, independent of the `--output-events-to`
//! machine-readable log.

use jitdiff_exec::Outcome;

pub fn summarize(seed: u64, outcome: &Outcome) -> String {
    match outcome {
        Outcome::CompilerCrash { config, stderr } => {
            format!("seed {seed}: compiler crashed on {config} build: {}", first_line(stderr))
        }
        Outcome::CompileError { config, diagnostic } => {
            format!("seed {seed}: compile error on {config} build: {}", first_line(diagnostic))
        }
        Outcome::CompilerTimeout { config } => format!("seed {seed}: compiler timed out on {config} build"),
        Outcome::ExecutionTimeout => format!("seed {seed}: execution timed out"),
        Outcome::ExecutionCrash { stderr } => format!("seed {seed}: execution crashed: {}", first_line(stderr)),
        Outcome::ExecutionSuccess { .. } => format!("seed {seed}: ok, no divergence"),
        Outcome::ProgramMismatch { debug_summary, release_summary, .. } => {
            format!("seed {seed}: MISMATCH debug={debug_summary} release={release_summary}")
        }
        Outcome::NotInteresting => format!("seed {seed}: not interesting"),
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitdiff_exec::SideResult;

    #[test]
    fn mismatch_summary_names_both_sides() {
        let outcome = Outcome::ProgramMismatch {
            debug: SideResult { checksum: "1".into(), exception_type: None, checksum_sites: vec![] },
            release: SideResult { checksum: "2".into(), exception_type: None, checksum_sites: vec![] },
            debug_first_unmatch: None,
            release_first_unmatch: None,
            debug_summary: "1".into(),
            release_summary: "2".into(),
        };
        let text = summarize(42, &outcome);
        assert!(text.contains("MISMATCH"));
        assert!(text.contains("debug=1"));
        assert!(text.contains("release=2"));
    }
}
