//! The async Executor-Client: spawns one execution-server worker child,
//! drives it with line-delimited JSON requests/responses, and enforces a
//! caller-supplied timeout via cancellation + kill.
//!
//! Spawns the child, then drives it over `tokio::process` with
//! `tokio::time::timeout` wrapping each read, so a hung child can be killed
//! without blocking the worker's event loop.

use crate::error::InfraError;
use crate::protocol::{Request, Response, RunPairPayload, RunPairResult};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Environment variables forced on at spawn so the worker's JIT behaves
/// consistently across debug/release invocations (tiered compilation
/// enabled, JIT assertions promoted to throws).
const FORCE_TIERED_COMPILATION: (&str, &str) = ("DOTNET_TieredCompilation", "1");
const FORCE_JIT_ASSERT_THROW: (&str, &str) = ("DOTNET_JitThrowOnAssertionFailure", "1");

#[derive(Debug)]
pub enum RunPairOutcome {
    Result(RunPairResult),
    Timeout,
    /// Child ended (stdout EOF) without producing a response line.
    Crash { stderr: String },
}

/// A reused execution-server worker. `last_used` lets the dispatcher retire
/// idle children.
pub struct ExecutorClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    last_used: Instant,
}

impl ExecutorClient {
    pub fn spawn(host_path: &Path) -> Result<Self, InfraError> {
        let mut child = Command::new(host_path)
            .env(FORCE_TIERED_COMPILATION.0, FORCE_TIERED_COMPILATION.1)
            .env(FORCE_JIT_ASSERT_THROW.0, FORCE_JIT_ASSERT_THROW.1)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(InfraError::Spawn)?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");

        tracing::debug!(host = %host_path.display(), "spawned execution server");
        Ok(Self { child, stdin, stdout: BufReader::new(stdout), last_used: Instant::now() })
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.elapsed()
    }

    /// Sends one `RunPair` request and waits for the matching response line,
    /// or until `deadline` elapses. Cancellation is terminal: a timed-out or
    /// crashed client must be discarded, never reused; the child cannot
    /// resume mid-request once its response line is lost.
    pub async fn run_pair(&mut self, payload: RunPairPayload, deadline: Duration) -> Result<RunPairOutcome, InfraError> {
        self.last_used = Instant::now();
        let request = Request::RunPair { pair: payload };
        self.send(&request).await?;

        match tokio::time::timeout(deadline, self.read_response()).await {
            Ok(Ok(Some(response))) => match response.run_pair_result {
                Some(result) => Ok(RunPairOutcome::Result(result)),
                None => Ok(RunPairOutcome::Crash { stderr: self.drain_stderr().await }),
            },
            Ok(Ok(None)) => Ok(RunPairOutcome::Crash { stderr: self.drain_stderr().await }),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => {
                tracing::warn!(deadline_secs = deadline.as_secs_f64(), "execution server timed out, killing child");
                let _ = self.child.kill().await;
                Ok(RunPairOutcome::Timeout)
            }
        }
    }

    pub async fn shutdown(mut self) {
        let _ = self.send(&Request::Shutdown).await;
        let _ = self.child.wait().await;
    }

    async fn send(&mut self, request: &Request) -> Result<(), InfraError> {
        let mut line = serde_json::to_string(request).map_err(InfraError::Protocol)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await.map_err(InfraError::Io)?;
        self.stdin.flush().await.map_err(InfraError::Io)
    }

    /// Reads exactly one response line, or `None` on EOF (the child closed
    /// stdout without ever writing a response).
    async fn read_response(&mut self) -> Result<Option<Response>, InfraError> {
        let mut line = String::new();
        let bytes_read = self.stdout.read_line(&mut line).await.map_err(InfraError::Io)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        let response: Response = serde_json::from_str(line.trim_end()).map_err(InfraError::Protocol)?;
        Ok(Some(response))
    }

    /// Drains whatever stderr the child had buffered; only called once the
    /// child is known dead or dying, so a healthy child's stderr is never
    /// read mid-flight.
    async fn drain_stderr(&mut self) -> String {
        use tokio::io::AsyncReadExt;
        let Some(mut stderr) = self.child.stderr.take() else { return String::new() };
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl std::fmt::Debug for ExecutorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorClient").field("idle_for", &self.idle_for()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RunPairPayload;

    #[tokio::test]
    async fn spawn_of_missing_binary_is_an_infra_error() {
        let result = ExecutorClient::spawn(Path::new("/nonexistent/host-binary-for-tests"));
        assert!(matches!(result, Err(InfraError::Spawn(_))));
    }

    #[tokio::test]
    async fn run_pair_against_cat_echoes_request_and_is_classified_as_crash() {
        // `cat` echoes the request line back verbatim; it parses as a
        // `Response` with no `runPairResult` key, which this crate treats
        // the same as a malformed/empty response: a crash, not a hang.
        let mut client = ExecutorClient::spawn(Path::new("/bin/cat")).expect("spawn cat");
        let payload = RunPairPayload::new(&[], &[], false);
        let outcome = client.run_pair(payload, Duration::from_secs(5)).await.expect("no infra error");
        assert!(matches!(outcome, RunPairOutcome::Crash { .. }));
    }

    /// A real (if trivial) stand-in worker binary, built from a shell script
    /// rather than `/bin/cat`, so `run_pair`'s success path — parsing an
    /// actual `runPairResult` line — gets exercised end to end.
    fn write_fake_worker(dir: &std::path::Path) -> std::path::PathBuf {
        let script_path = dir.join("fake-worker.sh");
        let response = crate::protocol::Response {
            run_pair_result: Some(crate::protocol::RunPairResult {
                debug_result: crate::protocol::SideResultWire {
                    checksum: "42".into(),
                    exception_type: None,
                    checksum_sites: None,
                },
                release_result: crate::protocol::SideResultWire {
                    checksum: "42".into(),
                    exception_type: None,
                    checksum_sites: None,
                },
                debug_first_unmatch: None,
                release_first_unmatch: None,
            }),
        };
        let response_line = serde_json::to_string(&response).expect("serialize canned response");
        let script = format!("#!/bin/sh\nread _line\necho '{response_line}'\n");
        std::fs::write(&script_path, script).expect("write fake worker script");
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).expect("chmod +x");
        script_path
    }

    #[tokio::test]
    async fn run_pair_against_a_real_worker_script_parses_the_success_response() {
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = write_fake_worker(dir.path());
        let mut client = ExecutorClient::spawn(&worker).expect("spawn fake worker");
        let payload = RunPairPayload::new(&[1, 2, 3], &[1, 2, 3], false);
        let outcome = client.run_pair(payload, Duration::from_secs(5)).await.expect("no infra error");
        match outcome {
            RunPairOutcome::Result(result) => {
                assert_eq!(result.debug_result.checksum, "42");
                assert_eq!(result.release_result.checksum, "42");
            }
            other => panic!("expected a parsed result, got {other:?}"),
        }
    }
}
