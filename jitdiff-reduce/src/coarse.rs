//! Coarse pass: a cheap first pass over the whole program before the fine
//! pass's expensive per-node catalog runs. Two steps, run once each in
//! order: local-lifting, then a largest-method-first binary-search
//! statement remover.

use crate::addr::{self, descendant_count};
use crate::interestingness::{Mode, Predicate};
use jitdiff_core::tree::{Assign, Expr, FuzzType, Program, Stmt, VarPath};
use std::collections::HashSet;

/// Step 1: every non-ref single-variable local declaration is rewritten as
/// a hoisted default-initialized `LocalDecl` at the top of its function
/// plus an in-place assignment, whenever the rewrite is still interesting.
/// This gives the remover freedom to later delete the assignment without
/// also losing the declaration other statements may depend on existing.
pub fn local_lifting(mut program: Program, mode: &mut Mode, predicate: &mut impl Predicate) -> Program {
    let mut rejected: HashSet<(usize, String)> = HashSet::new();
    loop {
        let Some((fid, name, ty, init, addr)) = find_liftable_local(&program, &rejected) else { break };
        let mut candidate = program.clone();
        {
            let func = &mut candidate.functions[fid];
            func.body.0.insert(0, Stmt::LocalDecl { ty: ty.clone(), name: name.clone() });
        }
        let block = addr::resolve_block_mut(&mut candidate, &addr);
        if let Some(slot) = block.0.iter_mut().find(|s| matches!(s, Stmt::Assign(Assign::NewLocal { name: n, .. }) if *n == name)) {
            *slot = Stmt::Assign(Assign::Compound { lhs: VarPath::root(name.clone()), op: None, rhs: Some(init.clone()) });
        }
        if predicate.check(&candidate, mode) {
            program = candidate;
        } else {
            rejected.insert((fid, name));
        }
    }
    program
}

#[allow(clippy::type_complexity)]
fn find_liftable_local(
    program: &Program,
    rejected: &HashSet<(usize, String)>,
) -> Option<(usize, String, FuzzType, Expr, addr::BlockAddr)> {
    for f in &program.functions {
        for block_addr in addr::enumerate_block_addrs(program).into_iter().filter(|a| addr_belongs_to(program, a, f.id)) {
            let block = addr::resolve_block(program, &block_addr);
            for stmt in &block.0 {
                if let Stmt::Assign(Assign::NewLocal { ty, name, init }) = stmt {
                    if ty.is_ref() {
                        continue;
                    }
                    if rejected.contains(&(f.id, name.clone())) {
                        continue;
                    }
                    return Some((f.id, name.clone(), ty.clone(), init.clone(), block_addr.clone()));
                }
            }
        }
    }
    None
}

fn addr_belongs_to(_program: &Program, a: &addr::BlockAddr, fid: usize) -> bool {
    match a {
        addr::BlockAddr::Body(id) => *id == fid,
        addr::BlockAddr::Via(parent, _, _) => addr_belongs_to(_program, parent, fid),
    }
}

/// Step 2: binary-search statement removal, one function at a time,
/// largest function first by descendant statement count.
pub fn statement_removal(mut program: Program, mode: &mut Mode, predicate: &mut impl Predicate) -> Program {
    let mut order: Vec<usize> = (0..program.functions.len()).collect();
    order.sort_by_key(|&id| std::cmp::Reverse(descendant_count(&program.functions[id].body)));
    for fid in order {
        program = remove_block_statements(program, fid, mode, predicate);
    }
    program
}

fn remove_block_statements(mut program: Program, fid: usize, mode: &mut Mode, predicate: &mut impl Predicate) -> Program {
    loop {
        let addrs: Vec<_> =
            addr::enumerate_block_addrs(&program).into_iter().filter(|a| addr_belongs_to(&program, a, fid)).collect();
        let mut changed = false;
        for block_addr in addrs {
            let len = addr::resolve_block(&program, &block_addr).0.len();
            if len == 0 {
                continue;
            }
            if let Some(next) = binary_search_remove(&program, &block_addr, len, mode, predicate) {
                program = next;
                changed = true;
                break;
            }
        }
        if !changed {
            return program;
        }
    }
}

/// Halves the block repeatedly, dropping whichever half can be removed
/// while staying interesting, biggest chunk first.
fn binary_search_remove(
    program: &Program,
    block_addr: &addr::BlockAddr,
    len: usize,
    mode: &mut Mode,
    predicate: &mut impl Predicate,
) -> Option<Program> {
    let mut chunk = len;
    while chunk >= 1 {
        let mut start = 0;
        while start < len {
            let end = (start + chunk).min(len);
            let mut candidate = program.clone();
            {
                let block = addr::resolve_block_mut(&mut candidate, block_addr);
                if end > block.0.len() {
                    start += chunk;
                    continue;
                }
                block.0.drain(start..end);
            }
            if predicate.check(&candidate, mode) {
                return Some(candidate);
            }
            start += chunk;
        }
        chunk /= 2;
    }
    None
}
