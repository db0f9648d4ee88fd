//! The concrete `HostCompiler`: shells out to the `--host <path>` binary in
//! compile mode. `jitdiff-exec::HostCompiler` is a synchronous trait (it is
//! called from the Reducer's synchronous core as well as the dispatcher),
//! so the timeout here is a plain poll-and-kill loop rather than
//! `tokio::time::timeout` — the same boundary the Executor-Client enforces
//! for execution, just without an async runtime to lean on.

use jitdiff_exec::{CompileConfig, CompileOutcome, CompileUnit, HostCompiler};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ProcessHostCompiler {
    host_path: PathBuf,
    timeout: Duration,
}

impl ProcessHostCompiler {
    pub fn new(host_path: PathBuf, timeout: Duration) -> Self {
        Self { host_path, timeout }
    }
}

impl HostCompiler for ProcessHostCompiler {
    fn compile(&self, unit: &CompileUnit) -> CompileOutcome {
        let config_flag = match unit.config {
            CompileConfig::Debug => "debug",
            CompileConfig::Release => "release",
        };
        let mut child = match Command::new(&self.host_path)
            .arg("compile")
            .arg("--config")
            .arg(config_flag)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return CompileOutcome::Crash(format!("failed to spawn host compiler: {e}")),
        };

        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(unit.source.as_bytes()).is_err() {
                return CompileOutcome::Crash("failed to write source to host compiler stdin".into());
            }
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let output = child.wait_with_output().unwrap_or_else(|_| std::process::Output {
                        status,
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                    });
                    return classify_output(status.success(), output.stdout, output.stderr);
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return CompileOutcome::Timeout;
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return CompileOutcome::Crash(format!("error waiting on host compiler: {e}")),
            }
        }
    }
}

fn classify_output(success: bool, stdout: Vec<u8>, stderr: Vec<u8>) -> CompileOutcome {
    if success {
        CompileOutcome::Success(stdout)
    } else {
        let text = String::from_utf8_lossy(&stderr);
        let diagnostics: Vec<String> = text.lines().filter(|l| !l.trim().is_empty()).map(String::from).collect();
        if diagnostics.is_empty() {
            CompileOutcome::Crash(text.into_owned())
        } else {
            CompileOutcome::Diagnostics(diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_host_binary_is_a_crash_not_a_panic() {
        let compiler = ProcessHostCompiler::new(PathBuf::from("/nonexistent/host-binary"), Duration::from_secs(1));
        let outcome = compiler.compile(&CompileUnit { source: "class C {}".into(), config: CompileConfig::Debug });
        assert!(matches!(outcome, CompileOutcome::Crash(_)));
    }
}
