//! Command-line front end for the differential JIT fuzzer: the
//! "external collaborator" layer made concrete — configuration loading,
//! the parallel dispatcher, seed-file I/O, the event log, and a plain-text
//! reporter, wired over `jitdiff-core`/`jitdiff-exec`/`jitdiff-reduce`.

mod cli;
mod config;
mod dispatch;
mod events;
mod host_process;
mod report;
mod seedfile;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jitdiff=info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut gen_config = match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if cli.checksum_on {
        gen_config.checksum_enabled = true;
    } else if cli.checksum_off {
        gen_config.checksum_enabled = false;
    }
    let cfg = Arc::new(gen_config);
    let cli = Arc::new(cli);

    if let Some(dir) = cli.remove_fixed.clone() {
        return match dispatch::run_remove_fixed(cli, cfg, &dir).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("failed to scan {}: {e}", dir.display());
                ExitCode::FAILURE
            }
        };
    }

    match dispatch::run_generate(cli, cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
