//! The parallel work dispatcher: fans out `--parallelism` workers, each an
//! independent instance of generate → compile → execute → (optionally)
//! reduce, sharing nothing but the append-only event log.

use crate::cli::Cli;
use crate::events::{Event, EventLog};
use crate::host_process::ProcessHostCompiler;
use crate::report;
use crate::seedfile::{self, StoredOutcome};
use jitdiff_core::tree::Program;
use jitdiff_core::{generate_program, printer, GenConfig, Random};
use jitdiff_exec::{run_pipeline, ExecutorClient, HostCompiler, Outcome};
use jitdiff_reduce::gitlog::GitDebugPredicate;
use jitdiff_reduce::interestingness::{is_interesting, Mode};
use jitdiff_reduce::reduce;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

fn resolve_parallelism(requested: i64) -> usize {
    if requested < 0 {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        requested.max(1) as usize
    }
}

fn is_interesting_outcome(outcome: &Outcome) -> bool {
    !matches!(outcome, Outcome::ExecutionSuccess { .. } | Outcome::NotInteresting)
}

pub async fn run_generate(cli: Arc<Cli>, cfg: Arc<GenConfig>) -> Result<(), jitdiff_exec::InfraError> {
    let events = match &cli.output_events_to {
        Some(path) => Some(Arc::new(EventLog::open(path).expect("failed to open event log"))),
        None => None,
    };
    let counter = Arc::new(AtomicU64::new(0));
    let workers = resolve_parallelism(cli.parallelism);
    let run_until = cli.seconds_to_run.map(|s| Instant::now() + Duration::from_secs(s));

    info!(workers, "starting dispatcher");
    let mut handles = Vec::new();
    for worker_id in 0..workers {
        let cli = cli.clone();
        let cfg = cfg.clone();
        let events = events.clone();
        let counter = counter.clone();
        handles.push(tokio::spawn(run_worker(worker_id, cli, cfg, events, counter, run_until)));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "worker task panicked");
        }
    }
    Ok(())
}

async fn run_worker(
    worker_id: usize,
    cli: Arc<Cli>,
    cfg: Arc<GenConfig>,
    events: Option<Arc<EventLog>>,
    counter: Arc<AtomicU64>,
    run_until: Option<Instant>,
) {
    let compiler: Arc<dyn HostCompiler> =
        Arc::new(ProcessHostCompiler::new(cli.host.clone(), Duration::from_secs(cli.timeout_secs)));
    let mut client = match ExecutorClient::spawn(&cli.host) {
        Ok(client) => client,
        Err(e) => {
            warn!(worker_id, error = %e, "failed to spawn execution server");
            return;
        }
    };
    let timeout = Duration::from_secs(cli.timeout_secs);

    loop {
        if let Some(deadline) = run_until {
            if Instant::now() >= deadline {
                break;
            }
        }
        let idx = counter.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = cli.num_programs {
            if idx >= limit {
                break;
            }
        }

        let seed = cli.seed.wrapping_add(idx);
        let program = generate_program(&cfg, seed, "Program");
        let source = printer::print_program(&program, seed, &timestamp());
        if let Some(log) = &events {
            log.record(&Event::ProgramGenerated { seed, bytes: source.len() });
        }

        let outcome = match run_pipeline(&*compiler, &mut client, &source, &source, cfg.checksum_enabled, timeout).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(worker_id, seed, error = %e, "infrastructure failure, retiring worker");
                return;
            }
        };
        if let Some(log) = &events {
            log.record(&Event::ExecuteResult { seed, outcome: format!("{outcome}") });
        }

        if !is_interesting_outcome(&outcome) {
            continue;
        }
        println!("{}", report::summarize(seed, &outcome));
        if let Outcome::ProgramMismatch { debug_summary, release_summary, .. } = &outcome {
            if let Some(log) = &events {
                log.record(&Event::Mismatch { seed, debug_summary: debug_summary.clone(), release_summary: release_summary.clone() });
            }
        }

        let final_program = if cli.reduce {
            match reduce_interesting(&cli, &compiler, program.clone(), &outcome, source.len(), seed) {
                Some(result) => {
                    if let Some(log) = &events {
                        log.record(&Event::ReductionDone {
                            seed,
                            original_bytes: source.len(),
                            reduced_bytes: printer::print_program(&result.program, seed, "").len(),
                            elapsed_hhmmss: "00:00:00".into(),
                        });
                    }
                    Some(result)
                }
                None => {
                    warn!(worker_id, seed, "reduction aborted, keeping original program");
                    None
                }
            }
        } else {
            None
        };

        let stored = StoredOutcome {
            mode: format!("{outcome}"),
            debug_summary: match &outcome {
                Outcome::ProgramMismatch { debug_summary, .. } => debug_summary.clone(),
                _ => String::new(),
            },
            release_summary: match &outcome {
                Outcome::ProgramMismatch { release_summary, .. } => release_summary.clone(),
                _ => String::new(),
            },
        };
        let seed_path = cli.output_dir.join(format!("{seed}.seed"));
        if let Err(e) = seedfile::write(&seed_path, seed, &stored) {
            warn!(worker_id, seed, error = %e, "failed to write seed file");
        }

        if cli.output_source {
            let rendered = match &final_program {
                Some(result) => result.render("00:00:00", &stored.debug_summary, &stored.release_summary),
                None => printer::print_program(&program, seed, &timestamp()),
            };
            println!("{rendered}");
        }
    }
}

fn reduce_interesting(
    cli: &Cli,
    compiler: &Arc<dyn HostCompiler>,
    program: Program,
    outcome: &Outcome,
    original_bytes: usize,
    seed: u64,
) -> Option<jitdiff_reduce::ReductionResult> {
    let handle = tokio::runtime::Handle::current();
    let compiler = compiler.clone();
    let host_path = cli.host.clone();
    let timeout = Duration::from_secs(cli.timeout_secs);
    let spawn_per_candidate = cli.reduce_use_child_processes;
    let mut reused_client = if spawn_per_candidate { None } else { ExecutorClient::spawn(&host_path).ok() };

    let mut predicate = move |candidate: &Program, mode: &mut Mode| -> bool {
        let candidate_source = printer::print_program(candidate, seed, "");
        // `reduce_interesting` runs synchronously inside a task the
        // dispatcher already spawned onto the runtime, so this thread is
        // already driving it; `Handle::block_on` alone would panic with
        // "Cannot block the current thread from within a runtime" even
        // though the call site itself is a plain (non-async) closure.
        // `block_in_place` hands this thread's other work to another
        // worker for the duration of the nested `block_on`.
        let result = tokio::task::block_in_place(|| {
            handle.block_on(async {
                if spawn_per_candidate {
                    let mut client = ExecutorClient::spawn(&host_path).ok()?;
                    let outcome = run_pipeline(&*compiler, &mut client, &candidate_source, &candidate_source, false, timeout).await.ok();
                    client.shutdown().await;
                    outcome
                } else {
                    let client = reused_client.as_mut()?;
                    run_pipeline(&*compiler, client, &candidate_source, &candidate_source, false, timeout).await.ok()
                }
            })
        });
        match result {
            Some(o) => is_interesting(mode, &o),
            None => false,
        }
    };

    let mut rng = Random::new(seed);
    let git_dir = cli.reduce_debug_git.clone();
    let reduced = if let Some(dir) = git_dir {
        let mut wrapped = GitDebugPredicate::new(&mut predicate, dir);
        reduce(program, outcome, original_bytes, &mut wrapped, &mut rng)
    } else {
        reduce(program, outcome, original_bytes, &mut predicate, &mut rng)
    };
    reduced.ok()
}

fn timestamp() -> String {
    "1970-01-01 00:00:00".to_string()
}

/// `--remove-fixed <dir>`: regenerate each stored seed's program, re-run the
/// pipeline once, and delete the `.seed` file if it no longer reproduces
/// its stored mode.
pub async fn run_remove_fixed(cli: Arc<Cli>, cfg: Arc<GenConfig>, dir: &std::path::Path) -> std::io::Result<()> {
    let compiler = ProcessHostCompiler::new(cli.host.clone(), Duration::from_secs(cli.timeout_secs));
    let mut client = ExecutorClient::spawn(&cli.host).expect("spawn execution server");
    let timeout = Duration::from_secs(cli.timeout_secs);

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("seed") {
            continue;
        }
        let Ok((seed, _stored)) = seedfile::read(&path) else { continue };
        let program = generate_program(&cfg, seed, "Program");
        let source = printer::print_program(&program, seed, &timestamp());
        let outcome = match run_pipeline(&compiler, &mut client, &source, &source, cfg.checksum_enabled, timeout).await {
            Ok(outcome) => outcome,
            Err(_) => continue,
        };
        if !is_interesting_outcome(&outcome) {
            info!(seed, path = %path.display(), "fixed, removing seed file");
            let _ = std::fs::remove_file(&path);
        }
    }
    Ok(())
}
