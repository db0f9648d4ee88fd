//! The command-line surface, as a `clap::Parser` derive struct.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "jitdiff", version, about = "Differential JIT fuzzer: generate, compile, execute, and reduce")]
pub struct Cli {
    /// Path to the host toolchain binary (the execution-server worker and,
    /// in `compile <config>` mode, the compiler).
    #[arg(long)]
    pub host: PathBuf,

    /// Base seed; each generated program's own seed is derived from this
    /// plus its sequence number, so a run is reproducible end to end.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Stop after generating this many programs.
    #[arg(long)]
    pub num_programs: Option<u64>,

    /// Stop after running for roughly this many seconds.
    #[arg(long)]
    pub seconds_to_run: Option<u64>,

    /// Number of parallel workers; `-1` uses the available parallelism.
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    pub parallelism: i64,

    /// Reduce every interesting program found before reporting it.
    #[arg(long)]
    pub reduce: bool,

    /// During reduction, spawn a fresh execution-server child for every
    /// candidate instead of reusing one worker process across the whole
    /// reduction (slower, but isolates a candidate that corrupts worker
    /// state from affecting the next one).
    #[arg(long)]
    pub reduce_use_child_processes: bool,

    /// Print the (reduced, if `--reduce`) source of every interesting
    /// program to stdout.
    #[arg(long)]
    pub output_source: bool,

    /// Append a JSON-lines event log to this path.
    #[arg(long)]
    pub output_events_to: Option<PathBuf>,

    /// Force checksum instrumentation on.
    #[arg(long = "checksum+", conflicts_with = "checksum_off")]
    pub checksum_on: bool,

    /// Force checksum instrumentation off.
    #[arg(long = "checksum-")]
    pub checksum_off: bool,

    /// Instead of generating, scan `<dir>` for `.seed` files whose stored
    /// divergence no longer reproduces, and delete them.
    #[arg(long)]
    pub remove_fixed: Option<PathBuf>,

    /// Optional TOML file overriding generation tunables.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to write found-divergence `.seed` files into.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// If set, commit the source after every accepted reduction step to a
    /// git repository at this path (diagnostic only).
    #[arg(long)]
    pub reduce_debug_git: Option<PathBuf>,

    /// Per-candidate compile/execute deadline, in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}
