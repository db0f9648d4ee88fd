//! Addressing into a `Program`'s nested blocks without holding overlapping
//! mutable borrows: an address is an owned path built by an immutable
//! top-down walk, resolved against `&mut Program` fresh for each mutation,
//! rather than a live borrow held across the whole rewrite.

use jitdiff_core::tree::{Block, FunctionId, Program, Stmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Inner,
    Then,
    Else,
    Try,
    Finally,
    For,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockAddr {
    Body(FunctionId),
    Via(Box<BlockAddr>, usize, Branch),
}

pub fn resolve_block<'p>(program: &'p Program, addr: &BlockAddr) -> &'p Block {
    match addr {
        BlockAddr::Body(fid) => &program.functions[*fid].body,
        BlockAddr::Via(parent, idx, branch) => {
            let pblock = resolve_block(program, parent);
            match (&pblock.0[*idx], branch) {
                (Stmt::Block(b), Branch::Inner) => b,
                (Stmt::If { then_block, .. }, Branch::Then) => then_block,
                (Stmt::If { else_block: Some(b), .. }, Branch::Else) => b,
                (Stmt::TryFinally { try_block, .. }, Branch::Try) => try_block,
                (Stmt::TryFinally { finally_block, .. }, Branch::Finally) => finally_block,
                (Stmt::For { body, .. }, Branch::For) => body,
                _ => unreachable!("block address does not match tree shape"),
            }
        }
    }
}

pub fn resolve_block_mut<'p>(program: &'p mut Program, addr: &BlockAddr) -> &'p mut Block {
    match addr {
        BlockAddr::Body(fid) => &mut program.functions[*fid].body,
        BlockAddr::Via(parent, idx, branch) => {
            let pblock = resolve_block_mut(program, parent);
            match (&mut pblock.0[*idx], branch) {
                (Stmt::Block(b), Branch::Inner) => b,
                (Stmt::If { then_block, .. }, Branch::Then) => then_block,
                (Stmt::If { else_block: Some(b), .. }, Branch::Else) => b,
                (Stmt::TryFinally { try_block, .. }, Branch::Try) => try_block,
                (Stmt::TryFinally { finally_block, .. }, Branch::Finally) => finally_block,
                (Stmt::For { body, .. }, Branch::For) => body,
                _ => unreachable!("block address does not match tree shape"),
            }
        }
    }
}

/// Every block reachable in the program, in a stable (function order, then
/// depth-first statement order) traversal. Re-derived after every accepted
/// rewrite since indices and nesting may have changed underneath.
pub fn enumerate_block_addrs(program: &Program) -> Vec<BlockAddr> {
    let mut out = Vec::new();
    for f in &program.functions {
        collect(&f.body, BlockAddr::Body(f.id), &mut out);
    }
    out
}

fn collect(block: &Block, addr: BlockAddr, out: &mut Vec<BlockAddr>) {
    out.push(addr.clone());
    for (i, stmt) in block.0.iter().enumerate() {
        match stmt {
            Stmt::Block(b) => collect(b, BlockAddr::Via(Box::new(addr.clone()), i, Branch::Inner), out),
            Stmt::If { then_block, else_block, .. } => {
                collect(then_block, BlockAddr::Via(Box::new(addr.clone()), i, Branch::Then), out);
                if let Some(eb) = else_block {
                    collect(eb, BlockAddr::Via(Box::new(addr.clone()), i, Branch::Else), out);
                }
            }
            Stmt::TryFinally { try_block, finally_block } => {
                collect(try_block, BlockAddr::Via(Box::new(addr.clone()), i, Branch::Try), out);
                collect(finally_block, BlockAddr::Via(Box::new(addr.clone()), i, Branch::Finally), out);
            }
            Stmt::For { body, .. } => collect(body, BlockAddr::Via(Box::new(addr.clone()), i, Branch::For), out),
            _ => {}
        }
    }
}

/// Total descendant statement count of a block, used to order the coarse
/// pass's per-method binary-search remover "largest-first".
pub fn descendant_count(block: &Block) -> usize {
    let mut total = 0;
    for stmt in &block.0 {
        total += 1;
        match stmt {
            Stmt::Block(b) => total += descendant_count(b),
            Stmt::If { then_block, else_block, .. } => {
                total += descendant_count(then_block);
                if let Some(eb) = else_block {
                    total += descendant_count(eb);
                }
            }
            Stmt::TryFinally { try_block, finally_block } => {
                total += descendant_count(try_block) + descendant_count(finally_block);
            }
            Stmt::For { body, .. } => total += descendant_count(body),
            _ => {}
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitdiff_core::tree::{Assign, FuzzType, Literal, PrimitiveKind};

    fn sample_program() -> Program {
        let body = Block(vec![
            Stmt::If {
                cond: jitdiff_core::tree::Expr::Literal(Literal::Bool(true)),
                then_block: Block(vec![Stmt::Assign(Assign::NewLocal {
                    ty: FuzzType::Primitive(PrimitiveKind::Int),
                    name: "x".into(),
                    init: jitdiff_core::tree::Expr::Literal(Literal::Int(1)),
                })]),
                else_block: None,
            },
            Stmt::Return(None),
        ]);
        Program {
            aggregates: vec![],
            interfaces: vec![],
            type_order: vec![],
            statics: vec![],
            functions: vec![jitdiff_core::tree::Function {
                id: 0,
                name: "entry".into(),
                return_type: None,
                parameters: vec![],
                body,
                instance_type: None,
                interface_type: None,
                call_counts: Default::default(),
            }],
            primary_class_name: "Program".into(),
            checksum_enabled: false,
        }
    }

    #[test]
    fn enumerates_nested_blocks() {
        let program = sample_program();
        let addrs = enumerate_block_addrs(&program);
        // root + the `then` block.
        assert_eq!(addrs.len(), 2);
        assert_eq!(resolve_block(&program, &addrs[0]).0.len(), 2);
        assert_eq!(resolve_block(&program, &addrs[1]).0.len(), 1);
    }

    #[test]
    fn resolve_mut_reaches_nested_block() {
        let mut program = sample_program();
        let addrs = enumerate_block_addrs(&program);
        resolve_block_mut(&mut program, &addrs[1]).0.clear();
        assert!(resolve_block(&program, &addrs[1]).0.is_empty());
    }

    #[test]
    fn descendant_count_counts_nested_statements() {
        let program = sample_program();
        assert_eq!(descendant_count(&program.functions[0].body), 3);
    }
}
