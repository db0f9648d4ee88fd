//! Ties `HostCompiler`, `ExecutorClient`, and the `Outcome` taxonomy
//! together into the one compile-both/run-both/classify sequence every
//! caller needs (`jitdiff-cli`'s per-worker loop and the Reducer's real
//! `Predicate` bridge alike), so neither has to hand-roll the classification
//! rules in one place.

use crate::client::{ExecutorClient, RunPairOutcome};
use crate::error::{CompileConfig, Outcome, SideResult};
use crate::host_compiler::{compile_both, CompileOutcome, HostCompiler};
use crate::protocol::{CheckpointSite, RunPairPayload, SideResultWire};
use std::time::Duration;

/// Compiles both sides, and if both succeed, runs the pair through `client`
/// and classifies the result. Never returns `Err`: every failure mode along
/// the way is a variant of `Outcome` itself.
pub async fn run_pipeline(
    compiler: &dyn HostCompiler,
    client: &mut ExecutorClient,
    debug_source: &str,
    release_source: &str,
    track_output: bool,
    deadline: Duration,
) -> Result<Outcome, crate::error::InfraError> {
    let (debug_compiled, release_compiled) = compile_both(compiler, debug_source, release_source);

    let debug_bytes = match classify_compile(debug_compiled, CompileConfig::Debug) {
        Ok(bytes) => bytes,
        Err(outcome) => return Ok(outcome),
    };
    let release_bytes = match classify_compile(release_compiled, CompileConfig::Release) {
        Ok(bytes) => bytes,
        Err(outcome) => return Ok(outcome),
    };

    let payload = RunPairPayload::new(&debug_bytes, &release_bytes, track_output);
    let outcome = match client.run_pair(payload, deadline).await? {
        RunPairOutcome::Timeout => Outcome::ExecutionTimeout,
        RunPairOutcome::Crash { stderr } => Outcome::ExecutionCrash { stderr },
        RunPairOutcome::Result(result) => classify_run_pair(result),
    };
    Ok(outcome)
}

fn classify_compile(outcome: CompileOutcome, config: CompileConfig) -> Result<Vec<u8>, Outcome> {
    match outcome {
        CompileOutcome::Success(bytes) => Ok(bytes),
        CompileOutcome::Diagnostics(diagnostics) => {
            Err(Outcome::CompileError { config, diagnostic: diagnostics.join("; ") })
        }
        CompileOutcome::Crash(stderr) => Err(Outcome::CompilerCrash { config, stderr }),
        CompileOutcome::Timeout => Err(Outcome::CompilerTimeout { config }),
    }
}

fn classify_run_pair(result: crate::protocol::RunPairResult) -> Outcome {
    let debug = side_result(result.debug_result);
    let release = side_result(result.release_result);
    let debug_first_unmatch = result.debug_first_unmatch.map(checkpoint_tuple);
    let release_first_unmatch = result.release_first_unmatch.map(checkpoint_tuple);

    let mismatched = debug.exception_type != release.exception_type || debug.checksum != release.checksum;
    if !mismatched {
        return Outcome::ExecutionSuccess { debug, release };
    }
    let debug_summary = Outcome::side_summary(&debug);
    let release_summary = Outcome::side_summary(&release);
    Outcome::ProgramMismatch { debug, release, debug_first_unmatch, release_first_unmatch, debug_summary, release_summary }
}

fn side_result(wire: SideResultWire) -> SideResult {
    SideResult {
        checksum: wire.checksum,
        exception_type: wire.exception_type,
        checksum_sites: wire.checksum_sites.unwrap_or_default().into_iter().map(|s| (s.id, s.value)).collect(),
    }
}

fn checkpoint_tuple(site: CheckpointSite) -> (String, String) {
    (site.id, site.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_compiler::MockHostCompiler;
    use std::path::Path;

    #[tokio::test]
    async fn compile_error_short_circuits_before_execution() {
        let mock = MockHostCompiler {
            debug_outcome: Some(CompileOutcome::Diagnostics(vec!["CS0103".into()])),
            release_outcome: Some(CompileOutcome::Success(vec![])),
        };
        let mut client = ExecutorClient::spawn(Path::new("/bin/cat")).expect("spawn cat");
        let outcome = run_pipeline(&mock, &mut client, "debug src", "release src", false, Duration::from_secs(5))
            .await
            .expect("no infra error");
        assert!(matches!(outcome, Outcome::CompileError { config: CompileConfig::Debug, .. }));
    }
}
