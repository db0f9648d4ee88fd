//! Fine pass: an outer fixed-point loop over the full simplifier catalog.
//! Each outer iteration shuffles statement-nodes, then expression-nodes,
//! then member-declaration-nodes, tries the catalog round-robin at
//! each, and restarts that phase's traversal the moment a candidate is
//! accepted (indices and node identities may have shifted underneath).
//! Late simplifiers (call-site inlining, move-instance-to-static, constant
//! narrowing) are skipped entirely on the first outer iteration so cheaper
//! rewrites get first crack at the program.

use crate::addr::{self, BlockAddr};
use crate::exprwalk;
use crate::interestingness::{Mode, Predicate};
use crate::simplifiers::{expression_simplifiers, program_simplifiers, statement_simplifiers};
use jitdiff_core::random::Random;
use jitdiff_core::tree::Program;

struct NameCounter(u64);

impl NameCounter {
    fn fresh(&mut self) -> String {
        let n = self.0;
        self.0 += 1;
        format!("r_fine_{n}")
    }
}

struct StmtLoc {
    block: BlockAddr,
    idx: usize,
}

fn statement_locations(program: &Program) -> Vec<StmtLoc> {
    let mut out = Vec::new();
    for block_addr in addr::enumerate_block_addrs(program) {
        let len = addr::resolve_block(program, &block_addr).0.len();
        for idx in 0..len {
            out.push(StmtLoc { block: block_addr.clone(), idx });
        }
    }
    out
}

pub fn run(mut program: Program, mode: &mut Mode, predicate: &mut impl Predicate, rng: &mut Random) -> Program {
    let mut names = NameCounter(0);
    let mut first_iteration = true;
    loop {
        let mut any_change = false;
        any_change |= run_statement_phase(&mut program, mode, predicate, rng, &mut names, first_iteration);
        any_change |= run_expression_phase(&mut program, mode, predicate, rng, first_iteration);
        any_change |= run_member_phase(&mut program, mode, predicate, rng, first_iteration);
        first_iteration = false;
        if !any_change {
            return program;
        }
    }
}

fn run_statement_phase(
    program: &mut Program,
    mode: &mut Mode,
    predicate: &mut impl Predicate,
    rng: &mut Random,
    names: &mut NameCounter,
    first_iteration: bool,
) -> bool {
    let mut any_change = false;
    loop {
        let mut locs = statement_locations(program);
        rng.shuffle(&mut locs);
        let mut committed = false;
        for loc in &locs {
            let stmt = addr::resolve_block(program, &loc.block).0[loc.idx].clone();
            for simplifier in statement_simplifiers() {
                if simplifier.late() && first_iteration {
                    continue;
                }
                let before = names.0;
                let mut fresh = || names.fresh();
                let candidates = simplifier.propose(&stmt, &mut fresh);
                let mut accepted = false;
                for splice in candidates {
                    let mut candidate = program.clone();
                    {
                        let block = addr::resolve_block_mut(&mut candidate, &loc.block);
                        if loc.idx >= block.0.len() {
                            continue;
                        }
                        block.0.splice(loc.idx..=loc.idx, splice);
                    }
                    if predicate.check(&candidate, mode) {
                        *program = candidate;
                        accepted = true;
                        break;
                    }
                }
                if accepted {
                    committed = true;
                    any_change = true;
                    break;
                }
                names.0 = before;
            }
            if committed {
                break;
            }
        }
        if !committed {
            return any_change;
        }
    }
}

fn run_expression_phase(
    program: &mut Program,
    mode: &mut Mode,
    predicate: &mut impl Predicate,
    rng: &mut Random,
    first_iteration: bool,
) -> bool {
    let mut any_change = false;
    loop {
        let mut locs = statement_locations(program);
        rng.shuffle(&mut locs);
        let mut committed = false;
        for loc in &locs {
            let stmt = addr::resolve_block(program, &loc.block).0[loc.idx].clone();
            for simplifier in expression_simplifiers() {
                if simplifier.late && first_iteration {
                    continue;
                }
                let candidates = exprwalk::candidates_for_expr_rewrite(&stmt, simplifier.rewrite);
                let mut accepted = false;
                for candidate_stmt in candidates {
                    let mut candidate = program.clone();
                    {
                        let block = addr::resolve_block_mut(&mut candidate, &loc.block);
                        if loc.idx >= block.0.len() {
                            continue;
                        }
                        block.0[loc.idx] = candidate_stmt;
                    }
                    if predicate.check(&candidate, mode) {
                        *program = candidate;
                        accepted = true;
                        break;
                    }
                }
                if accepted {
                    committed = true;
                    any_change = true;
                    break;
                }
            }
            if committed {
                break;
            }
        }
        if !committed {
            return any_change;
        }
    }
}

fn run_member_phase(
    program: &mut Program,
    mode: &mut Mode,
    predicate: &mut impl Predicate,
    rng: &mut Random,
    first_iteration: bool,
) -> bool {
    let mut any_change = false;
    loop {
        let mut committed = false;
        'simplifiers: for simplifier in program_simplifiers() {
            if simplifier.late() && first_iteration {
                continue;
            }
            let mut candidates = simplifier.propose(program);
            rng.shuffle(&mut candidates);
            for candidate in candidates {
                if predicate.check(&candidate, mode) {
                    *program = candidate;
                    committed = true;
                    any_change = true;
                    break 'simplifiers;
                }
            }
        }
        if !committed {
            return any_change;
        }
    }
}

