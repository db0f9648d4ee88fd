//! Program-level (whole-tree) simplifiers: function/type/field removal,
//! parameter removal, void conversion, call-site inlining, and moving an
//! instance method to static form.
//!
//! Several catalog entries are deliberately narrowed here to avoid the
//! `FunctionId`/`AggregateId` index-renumbering that would otherwise make a
//! removal silently change an unrelated call or field's meaning rather than
//! just failing to compile: function/aggregate/interface removal only ever
//! drops the tail element of its Vec, and only when nothing else in the
//! program still refers to it.

use crate::exprwalk;
use jitdiff_core::tree::{
    AggregateId, Block, CallTarget, Expr, FunctionId, FuzzType, InterfaceId, Literal, Program, Stmt, TypeDecl,
    VariableIdentifier, ESCAPE_ORDINARY_PARAM,
};
use std::collections::HashMap;

pub trait ProgramSimplifier {
    fn name(&self) -> &'static str;
    fn late(&self) -> bool {
        false
    }
    fn propose(&self, program: &Program) -> Vec<Program>;
}

fn walk_expr(e: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(e);
    for c in exprwalk::children(e) {
        walk_expr(c, visit);
    }
}

fn walk_block_exprs(block: &Block, visit: &mut impl FnMut(&Expr)) {
    for stmt in &block.0 {
        for root in exprwalk::expr_roots(stmt) {
            walk_expr(root, visit);
        }
        match stmt {
            Stmt::Block(b) => walk_block_exprs(b, visit),
            Stmt::If { then_block, else_block, .. } => {
                walk_block_exprs(then_block, visit);
                if let Some(eb) = else_block {
                    walk_block_exprs(eb, visit);
                }
            }
            Stmt::TryFinally { try_block, finally_block } => {
                walk_block_exprs(try_block, visit);
                walk_block_exprs(finally_block, visit);
            }
            Stmt::For { body, .. } => walk_block_exprs(body, visit),
            _ => {}
        }
    }
}

fn walk_program_exprs(program: &Program, visit: &mut impl FnMut(&Expr)) {
    for f in &program.functions {
        walk_block_exprs(&f.body, visit);
    }
    for s in &program.statics {
        walk_expr(&s.init, visit);
    }
}

fn walk_expr_mut(e: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    f(e);
    for c in exprwalk::children_mut(e) {
        walk_expr_mut(c, f);
    }
}

fn walk_block_exprs_mut(block: &mut Block, f: &mut impl FnMut(&mut Expr)) {
    for stmt in &mut block.0 {
        for root in exprwalk::expr_roots_mut(stmt) {
            walk_expr_mut(root, f);
        }
        match stmt {
            Stmt::Block(b) => walk_block_exprs_mut(b, f),
            Stmt::If { then_block, else_block, .. } => {
                walk_block_exprs_mut(then_block, f);
                if let Some(eb) = else_block {
                    walk_block_exprs_mut(eb, f);
                }
            }
            Stmt::TryFinally { try_block, finally_block } => {
                walk_block_exprs_mut(try_block, f);
                walk_block_exprs_mut(finally_block, f);
            }
            Stmt::For { body, .. } => walk_block_exprs_mut(body, f),
            _ => {}
        }
    }
}

fn walk_program_exprs_mut(program: &mut Program, f: &mut impl FnMut(&mut Expr)) {
    for func in &mut program.functions {
        walk_block_exprs_mut(&mut func.body, f);
    }
    for s in &mut program.statics {
        walk_expr_mut(&mut s.init, f);
    }
}

fn rewrite_returns_to_none(block: &mut Block) {
    for stmt in &mut block.0 {
        match stmt {
            Stmt::Return(opt) => *opt = None,
            Stmt::Block(b) => rewrite_returns_to_none(b),
            Stmt::If { then_block, else_block, .. } => {
                rewrite_returns_to_none(then_block);
                if let Some(eb) = else_block {
                    rewrite_returns_to_none(eb);
                }
            }
            Stmt::TryFinally { try_block, finally_block } => {
                rewrite_returns_to_none(try_block);
                rewrite_returns_to_none(finally_block);
            }
            Stmt::For { body, .. } => rewrite_returns_to_none(body),
            _ => {}
        }
    }
}

fn rename_var_base(block: &mut Block, old: &str, new: &str) {
    walk_block_exprs_mut(block, &mut |e| {
        if let Expr::Var(path) = e {
            if path.base == old {
                path.base = new.to_string();
            }
        }
    });
}

/// Clone-and-replace substitution, used by call-site inlining. Only
/// replaces a `Var` occurrence when its path has no further field/index
/// projections past the base name; a parameter accessed through a deeper
/// path is left unsubstituted, which simply makes the candidate fail to
/// compile (filtered by the interestingness predicate) rather than miscompile.
fn substitute_vars(e: &Expr, map: &HashMap<String, Expr>) -> Expr {
    match e {
        Expr::Var(path) if path.path.is_empty() => map.get(&path.base).cloned().unwrap_or_else(|| e.clone()),
        Expr::Literal(_) | Expr::Var(_) => e.clone(),
        Expr::Unary { op, operand } => Expr::Unary { op: *op, operand: Box::new(substitute_vars(operand, map)) },
        Expr::Binary { op, lhs, rhs } => {
            Expr::Binary { op: *op, lhs: Box::new(substitute_vars(lhs, map)), rhs: Box::new(substitute_vars(rhs, map)) }
        }
        Expr::Call { target, args } => Expr::Call {
            target: match target {
                CallTarget::Static(fid) => CallTarget::Static(*fid),
                CallTarget::Instance { receiver, function } => {
                    CallTarget::Instance { receiver: Box::new(substitute_vars(receiver, map)), function: *function }
                }
            },
            args: args.iter().map(|a| substitute_vars(a, map)).collect(),
        },
        Expr::Cast { to, expr } => Expr::Cast { to: to.clone(), expr: Box::new(substitute_vars(expr, map)) },
        Expr::Ref(inner) => Expr::Ref(Box::new(substitute_vars(inner, map))),
        Expr::New { id, args } => Expr::New { id: *id, args: args.iter().map(|a| substitute_vars(a, map)).collect() },
        Expr::Paren(inner) => Expr::Paren(Box::new(substitute_vars(inner, map))),
        Expr::ChecksumSite { site_id, value } => {
            Expr::ChecksumSite { site_id: site_id.clone(), value: Box::new(substitute_vars(value, map)) }
        }
    }
}

fn type_mentions_aggregate(ty: &FuzzType, id: AggregateId) -> bool {
    match ty {
        FuzzType::Aggregate(a) => *a == id,
        FuzzType::Array { element, .. } => type_mentions_aggregate(element, id),
        FuzzType::Ref(inner) => type_mentions_aggregate(inner, id),
        _ => false,
    }
}

fn type_mentions_interface(ty: &FuzzType, id: InterfaceId) -> bool {
    match ty {
        FuzzType::Interface(i) => *i == id,
        FuzzType::Array { element, .. } => type_mentions_interface(element, id),
        FuzzType::Ref(inner) => type_mentions_interface(inner, id),
        _ => false,
    }
}

fn function_is_referenced(program: &Program, id: FunctionId) -> bool {
    if id == 0 {
        return true; // function 0 is the program's entry point.
    }
    let mut referenced = false;
    walk_program_exprs(program, &mut |e| {
        if let Expr::Call { target, .. } = e {
            if target.function_id() == id {
                referenced = true;
            }
        }
    });
    referenced
}

fn aggregate_is_referenced(program: &Program, id: AggregateId) -> bool {
    for f in &program.functions {
        if f.instance_type == Some(id) {
            return true;
        }
        if f.return_type.as_ref().is_some_and(|t| type_mentions_aggregate(t, id)) {
            return true;
        }
        if f.parameters.iter().any(|p| type_mentions_aggregate(&p.ty, id)) {
            return true;
        }
    }
    for s in &program.statics {
        if type_mentions_aggregate(&s.var.ty, id) {
            return true;
        }
    }
    for agg in &program.aggregates {
        if agg.id != id && agg.fields.iter().any(|(_, ty)| type_mentions_aggregate(ty, id)) {
            return true;
        }
    }
    let mut referenced = false;
    walk_program_exprs(program, &mut |e| match e {
        Expr::New { id: nid, .. } if *nid == id => referenced = true,
        Expr::Literal(Literal::Aggregate { id: lid, .. }) if *lid == id => referenced = true,
        _ => {}
    });
    referenced
}

fn interface_is_referenced(program: &Program, id: InterfaceId) -> bool {
    for f in &program.functions {
        if f.interface_type == Some(id) {
            return true;
        }
        if f.return_type.as_ref().is_some_and(|t| type_mentions_interface(t, id)) {
            return true;
        }
        if f.parameters.iter().any(|p| type_mentions_interface(&p.ty, id)) {
            return true;
        }
    }
    for s in &program.statics {
        if type_mentions_interface(&s.var.ty, id) {
            return true;
        }
    }
    for agg in &program.aggregates {
        if agg.implements.contains(&id) {
            return true;
        }
        if agg.fields.iter().any(|(_, ty)| type_mentions_interface(ty, id)) {
            return true;
        }
    }
    false
}

fn static_is_referenced(program: &Program, name: &str) -> bool {
    let mut referenced = false;
    walk_program_exprs(program, &mut |e| {
        if let Expr::Var(path) = e {
            if path.base == name {
                referenced = true;
            }
        }
    });
    referenced
}

#[derive(Debug)]
pub struct RemoveTrailingUnreferencedFunction;
impl ProgramSimplifier for RemoveTrailingUnreferencedFunction {
    fn name(&self) -> &'static str {
        "remove-trailing-unreferenced-function"
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let Some(last) = program.functions.last() else { return vec![] };
        if program.functions.len() <= 1 || function_is_referenced(program, last.id) {
            return vec![];
        }
        let mut candidate = program.clone();
        candidate.functions.pop();
        vec![candidate]
    }
}

#[derive(Debug)]
pub struct RemoveTrailingUnreferencedAggregate;
impl ProgramSimplifier for RemoveTrailingUnreferencedAggregate {
    fn name(&self) -> &'static str {
        "remove-trailing-unreferenced-aggregate"
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let Some(TypeDecl::Aggregate(id)) = program.type_order.last().copied() else { return vec![] };
        if aggregate_is_referenced(program, id) {
            return vec![];
        }
        let mut candidate = program.clone();
        candidate.type_order.pop();
        candidate.aggregates.retain(|a| a.id != id);
        vec![candidate]
    }
}

#[derive(Debug)]
pub struct RemoveTrailingUnreferencedInterface;
impl ProgramSimplifier for RemoveTrailingUnreferencedInterface {
    fn name(&self) -> &'static str {
        "remove-trailing-unreferenced-interface"
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let Some(TypeDecl::Interface(id)) = program.type_order.last().copied() else { return vec![] };
        if interface_is_referenced(program, id) {
            return vec![];
        }
        let mut candidate = program.clone();
        candidate.type_order.pop();
        candidate.interfaces.retain(|i| i.id != id);
        vec![candidate]
    }
}

#[derive(Debug)]
pub struct RemoveStaticField;
impl ProgramSimplifier for RemoveStaticField {
    fn name(&self) -> &'static str {
        "remove-static-field"
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let Some(last) = program.statics.last() else { return vec![] };
        if static_is_referenced(program, &last.var.name) {
            return vec![];
        }
        let mut candidate = program.clone();
        candidate.statics.pop();
        vec![candidate]
    }
}

/// Unused-parameter removal, rewriting every call site's argument list in
/// lockstep.
#[derive(Debug)]
pub struct ParameterRemoval;
impl ProgramSimplifier for ParameterRemoval {
    fn name(&self) -> &'static str {
        "parameter-removal"
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let mut out = Vec::new();
        for func in &program.functions {
            for (idx, param) in func.parameters.iter().enumerate() {
                let mut used = false;
                walk_block_exprs(&func.body, &mut |e| {
                    if let Expr::Var(path) = e {
                        if path.base == param.name {
                            used = true;
                        }
                    }
                });
                if used {
                    continue;
                }
                let mut candidate = program.clone();
                candidate.functions[func.id].parameters.remove(idx);
                walk_program_exprs_mut(&mut candidate, &mut |e| {
                    if let Expr::Call { target, args } = e {
                        if target.function_id() == func.id && idx < args.len() {
                            args.remove(idx);
                        }
                    }
                });
                out.push(candidate);
            }
        }
        out
    }
}

/// Drop a function's return type, rewriting every `Return(Some(_))` inside
/// it to `Return(None)`.
#[derive(Debug)]
pub struct VoidConversion;
impl ProgramSimplifier for VoidConversion {
    fn name(&self) -> &'static str {
        "void-conversion"
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let mut out = Vec::new();
        for func in &program.functions {
            if func.return_type.is_none() {
                continue;
            }
            let mut candidate = program.clone();
            let cfunc = &mut candidate.functions[func.id];
            cfunc.return_type = None;
            rewrite_returns_to_none(&mut cfunc.body);
            out.push(candidate);
        }
        out
    }
}

/// Late: substitutes a call to a single-statement (`Return(Some(expr))`)
/// callee with that expression directly, narrowed to callees whose
/// parameters are only ever used as bare variables (no field/index
/// projection) so plain name substitution is exact rather than needing
/// full alpha-renaming.
#[derive(Debug)]
pub struct InlineCallSite;
impl ProgramSimplifier for InlineCallSite {
    fn name(&self) -> &'static str {
        "inline-call-site"
    }
    fn late(&self) -> bool {
        true
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let mut out = Vec::new();
        for func in &program.functions {
            let body_expr = match func.body.0.as_slice() {
                [Stmt::Return(Some(e))] => e,
                _ => continue,
            };
            let mut path_used = false;
            walk_expr(body_expr, &mut |e| {
                if let Expr::Var(path) = e {
                    if !path.path.is_empty() && func.parameters.iter().any(|p| p.name == path.base) {
                        path_used = true;
                    }
                }
            });
            if path_used {
                continue;
            }
            let fid = func.id;
            let params: Vec<String> = func.parameters.iter().map(|p| p.name.clone()).collect();
            let template = body_expr.clone();
            let mut candidate = program.clone();
            walk_program_exprs_mut(&mut candidate, &mut |e| {
                let replacement = if let Expr::Call { target, args } = e {
                    if target.function_id() == fid {
                        let mut map = HashMap::new();
                        if let CallTarget::Instance { receiver, .. } = target {
                            map.insert("this".to_string(), (**receiver).clone());
                        }
                        for (name, arg) in params.iter().zip(args.iter()) {
                            map.insert(name.clone(), arg.clone());
                        }
                        Some(substitute_vars(&template, &map))
                    } else {
                        None
                    }
                } else {
                    None
                };
                if let Some(r) = replacement {
                    *e = r;
                }
            });
            out.push(candidate);
        }
        out
    }
}

/// Late: rewrite an instance method to a static one, prepending the
/// receiver as its first argument at every call site and renaming `this`
/// references to the new parameter.
#[derive(Debug)]
pub struct MoveInstanceToStatic;
impl ProgramSimplifier for MoveInstanceToStatic {
    fn name(&self) -> &'static str {
        "move-instance-to-static"
    }
    fn late(&self) -> bool {
        true
    }
    fn propose(&self, program: &Program) -> Vec<Program> {
        let mut out = Vec::new();
        for func in &program.functions {
            let Some(agg_id) = func.instance_type else { continue };
            let fid = func.id;
            let receiver_name = format!("self_{fid}");
            let mut candidate = program.clone();
            {
                let cfunc = &mut candidate.functions[fid];
                cfunc.instance_type = None;
                cfunc.parameters.insert(
                    0,
                    VariableIdentifier {
                        ty: FuzzType::Aggregate(agg_id),
                        name: receiver_name.clone(),
                        ref_escape_scope: ESCAPE_ORDINARY_PARAM,
                        read_only: true,
                    },
                );
                rename_var_base(&mut cfunc.body, "this", &receiver_name);
            }
            walk_program_exprs_mut(&mut candidate, &mut |e| {
                let replacement = if let Expr::Call { target: CallTarget::Instance { receiver, function }, args } = e {
                    if *function == fid {
                        let mut new_args = vec![(**receiver).clone()];
                        new_args.append(args);
                        Some(Expr::Call { target: CallTarget::Static(fid), args: new_args })
                    } else {
                        None
                    }
                } else {
                    None
                };
                if let Some(r) = replacement {
                    *e = r;
                }
            });
            out.push(candidate);
        }
        out
    }
}

pub fn program_simplifiers() -> Vec<Box<dyn ProgramSimplifier>> {
    vec![
        Box::new(RemoveTrailingUnreferencedFunction),
        Box::new(RemoveTrailingUnreferencedAggregate),
        Box::new(RemoveTrailingUnreferencedInterface),
        Box::new(RemoveStaticField),
        Box::new(ParameterRemoval),
        Box::new(VoidConversion),
        Box::new(InlineCallSite),
        Box::new(MoveInstanceToStatic),
    ]
}
