//! Git-debug replay (optional, disabled by default): wraps another
//! `Predicate` and, on every accepted candidate, overwrites a fixed source
//! file in a working directory and runs `git commit`, so a human can
//! `git log -p` the shrink history afterwards. Purely diagnostic — it never
//! changes which candidates are accepted, since it only observes `check`'s
//! return value rather than influencing it.

use crate::interestingness::{Mode, Predicate};
use jitdiff_core::tree::Program;
use std::path::PathBuf;
use std::process::Command;

pub struct GitDebugPredicate<P> {
    inner: P,
    dir: PathBuf,
    file_name: &'static str,
    step: u64,
}

impl<P> std::fmt::Debug for GitDebugPredicate<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitDebugPredicate").field("dir", &self.dir).field("step", &self.step).finish()
    }
}

impl<P: Predicate> GitDebugPredicate<P> {
    /// `dir` must already be a git repository (or have one initialized by
    /// the caller before reduction starts); this type never runs `git init`
    /// itself since that decision belongs to the CLI's `--reduce-debug-git`
    /// flag handling, not the reduction core.
    pub fn new(inner: P, dir: PathBuf) -> Self {
        Self { inner, dir, file_name: "candidate.cs", step: 0 }
    }
}

impl<P: Predicate> Predicate for GitDebugPredicate<P> {
    fn check(&mut self, program: &Program, mode: &mut Mode) -> bool {
        let accepted = self.inner.check(program, mode);
        if accepted {
            self.step += 1;
            let path = self.dir.join(self.file_name);
            let source = jitdiff_core::printer::print_program(program, 0, "");
            if std::fs::write(&path, source).is_ok() {
                let _ = Command::new("git").arg("-C").arg(&self.dir).arg("add").arg(self.file_name).status();
                let _ = Command::new("git")
                    .arg("-C")
                    .arg(&self.dir)
                    .arg("commit")
                    .arg("-m")
                    .arg(format!("reduction step {}", self.step))
                    .arg("--allow-empty")
                    .status();
            }
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitdiff_core::config::GenConfig;
    use jitdiff_core::synth::generate_program;

    #[test]
    fn wrapping_a_predicate_preserves_its_verdict() {
        let dir = std::env::temp_dir().join("jitdiff-gitlog-test-no-repo");
        let mut always_true = |_: &Program, _: &mut Mode| true;
        let mut wrapped = GitDebugPredicate::new(&mut always_true, dir);
        let cfg = GenConfig::default();
        let program = generate_program(&cfg, 1, "Program");
        let mut mode = Mode::ChecksumDivergence;
        // No git repo at `dir`: the commit attempt fails silently, but the
        // inner verdict must still be forwarded.
        assert!(wrapped.check(&program, &mut mode));
    }
}
