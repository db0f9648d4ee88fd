//! The Synthesizer: walks `GenConfig` and a `TypeUniverse` into a
//! full `Program` tree. This is the largest single component — function,
//! block, statement, assignment, call and expression generation, plus the
//! ref-escape discipline that keeps every `Ref` sound by construction.
//!
//! Walks a typed universe, builds a tree, and threads a mutable
//! generation-state struct through every helper along the way.

mod scope;

use crate::checksum::{build_checksum_statements, SiteIdGen};
use crate::config::{GenConfig, StatementKind};
use crate::literal::LiteralGen;
use crate::op_tables;
use crate::random::Random;
use crate::statics::StaticsPool;
use crate::tree::{
    Assign, BinOp, Block, CallTarget, Expr, Function, FuzzType, LValueInfo, Literal, PrimitiveKind, Program, Stmt,
    UnOp, VarPath, VariableIdentifier, ESCAPE_BYREF_PARAM, ESCAPE_ORDINARY_PARAM,
};
use crate::types_universe::TypeUniverse;
use scope::ScopeStack;
use std::collections::BTreeMap;

/// Hard ceiling on the number of functions a single program may grow to,
/// independent of the per-function call budget: a safety net against
/// unbounded new-callee chains rather than a tunable.
const MAX_FUNCTIONS: usize = 400;

pub fn generate_program(cfg: &GenConfig, seed: u64, primary_class_name: impl Into<String>) -> Program {
    let mut rng = Random::new(seed);
    let universe = TypeUniverse::generate_types(cfg, &mut rng);
    let mut synth = Synthesizer::new(rng, cfg, &universe);
    synth.generate_entry_point();
    synth.into_program(primary_class_name.into(), &universe)
}

struct Synthesizer<'a> {
    rng: Random,
    cfg: &'a GenConfig,
    universe: &'a TypeUniverse,
    statics: StaticsPool,
    functions: Vec<Function>,
    scope: ScopeStack,
    function_id_stack: Vec<usize>,
    call_count_stack: Vec<BTreeMap<usize, u64>>,
    return_type_stack: Vec<Option<FuzzType>>,
    var_counter: u32,
    stmt_depth: u32,
    expr_depth: u32,
    finally_depth: u32,
    global_statement_count: u32,
    sites: SiteIdGen,
}

impl<'a> Synthesizer<'a> {
    fn new(rng: Random, cfg: &'a GenConfig, universe: &'a TypeUniverse) -> Self {
        Self {
            rng,
            cfg,
            universe,
            statics: StaticsPool::new(),
            functions: Vec::new(),
            scope: ScopeStack::new(),
            function_id_stack: Vec::new(),
            call_count_stack: Vec::new(),
            return_type_stack: Vec::new(),
            var_counter: 0,
            stmt_depth: 0,
            expr_depth: 0,
            finally_depth: 0,
            global_statement_count: 0,
            sites: SiteIdGen::new(),
        }
    }

    fn generate_entry_point(&mut self) {
        self.generate_function(None, None, None, true);
    }

    fn into_program(self, primary_class_name: String, universe: &TypeUniverse) -> Program {
        Program {
            aggregates: universe.aggregates.clone(),
            interfaces: universe.interfaces.clone(),
            type_order: universe.type_order.clone(),
            statics: self.statics.into_fields(),
            functions: self.functions,
            primary_class_name,
            checksum_enabled: self.cfg.checksum_enabled,
        }
    }

    // ---- function generation -------------------------------------------

    /// Reserves `self.functions.len()` as the new function's id *before*
    /// generating its body, so any new callees the body itself creates
    /// (which reserve higher ids the same way) are pushed first; by the
    /// time we overwrite the reserved slot the forward-only call graph and
    /// transitive call-count bookkeeping both already hold.
    fn generate_function(
        &mut self,
        instance_type: Option<usize>,
        interface_type: Option<usize>,
        forced_return: Option<FuzzType>,
        is_entry: bool,
    ) -> usize {
        let id = self.functions.len();
        self.functions.push(Function {
            id,
            name: if is_entry { "entry".to_string() } else { format!("m{id}") },
            return_type: None,
            parameters: Vec::new(),
            body: Block::new(),
            instance_type,
            interface_type,
            call_counts: BTreeMap::new(),
        });

        let return_type = if is_entry { None } else { forced_return.or_else(|| self.maybe_return_type()) };
        let mut parameters = if is_entry { Vec::new() } else { self.generate_parameters() };
        if let Some(agg_id) = instance_type {
            // `this` is visible as an implicit zero-escape local, not a
            // declared parameter the printer would emit.
            parameters.push(VariableIdentifier {
                ty: FuzzType::Aggregate(agg_id),
                name: "this".to_string(),
                ref_escape_scope: ESCAPE_ORDINARY_PARAM,
                read_only: true,
            });
        }

        self.function_id_stack.push(id);
        self.call_count_stack.push(BTreeMap::new());
        self.return_type_stack.push(return_type.clone());
        self.scope.push(parameters.clone());

        let body = self.generate_block_inner(true, is_entry);

        self.scope.pop();
        self.return_type_stack.pop();
        let call_counts = self.call_count_stack.pop().unwrap_or_default();
        self.function_id_stack.pop();

        // Parameters used only to seed `this` are not printable formals.
        if instance_type.is_some() {
            parameters.pop();
        }

        self.functions[id].return_type = return_type;
        self.functions[id].parameters = parameters;
        self.functions[id].body = body;
        self.functions[id].call_counts = call_counts;
        id
    }

    fn maybe_return_type(&mut self) -> Option<FuzzType> {
        if self.rng.flip_coin(0.7) {
            Some(self.universe.pick_type(self.cfg.by_ref_probability, &mut self.rng))
        } else {
            None
        }
    }

    fn generate_parameters(&mut self) -> Vec<VariableIdentifier> {
        let count = *self.rng.sample_weighted(&self.cfg.param_count_distribution);
        let mut params = Vec::with_capacity(count as usize);
        for i in 0..count {
            let is_ref = self.rng.flip_coin(self.cfg.by_ref_probability);
            let base = self.universe.pick_type(0.0, &mut self.rng);
            let ty = if is_ref { base.make_ref() } else { base };
            let escape = if is_ref { ESCAPE_BYREF_PARAM } else { ESCAPE_ORDINARY_PARAM };
            params.push(VariableIdentifier { ty, name: format!("p{i}"), ref_escape_scope: escape, read_only: false });
        }
        params
    }

    // ---- block generation -------------------------------------------

    /// `is_function_root` marks a function body (no randomly-chosen
    /// `Return` inside it is needed to terminate, and a missing terminal
    /// return on a non-void function is synthesized); `enforce_global_min`
    /// applies only to the entry point's body, whose statement count
    /// floors the whole program's size.
    fn generate_block_inner(&mut self, is_function_root: bool, enforce_global_min: bool) -> Block {
        let target = *self.rng.sample_weighted(&self.cfg.block_statement_count_distribution);
        let mut block = Block::new();
        let mut saw_return = false;

        loop {
            let enough = block.0.len() as u32 >= target
                && (!enforce_global_min || self.global_statement_count >= self.cfg.global_min_statement_count);
            if enough {
                break;
            }
            let allow_return = !is_function_root && self.finally_depth == 0;
            let stmt = self.generate_statement(allow_return);
            self.global_statement_count += 1;
            let is_return = matches!(stmt, Stmt::Return(_));
            block.push(stmt);
            if is_return {
                saw_return = true;
                break;
            }
        }

        if is_function_root && !saw_return {
            let rt = self.return_type_stack.last().cloned().flatten();
            if let Some(rt) = rt {
                let expr = self.generate_return_value(&rt);
                block.push(Stmt::Return(Some(expr)));
            }
        }

        if self.cfg.checksum_enabled {
            let paths = self.enumerate_primitive_lvalues();
            let checksum_stmts = build_checksum_statements(&mut self.sites, &paths);
            if !checksum_stmts.is_empty() {
                if matches!(block.0.last(), Some(Stmt::Return(_))) {
                    let ret = block.0.pop().unwrap();
                    block.0.extend(checksum_stmts);
                    block.push(ret);
                } else {
                    block.0.extend(checksum_stmts);
                }
            }
        }

        block
    }

    // ---- statement generation -------------------------------------------

    fn generate_statement(&mut self, allow_return: bool) -> Stmt {
        let compound_ok = self.cfg.recursion.should_recurse(self.stmt_depth, &mut self.rng);
        let mut weights = self.cfg.statement_weights();
        weights.retain(|(_, kind)| match kind {
            StatementKind::Return => allow_return,
            StatementKind::Block | StatementKind::If | StatementKind::TryFinally | StatementKind::Loop => compound_ok,
            StatementKind::Assignment | StatementKind::Call => true,
        });
        if weights.is_empty() {
            weights.push((1, StatementKind::Assignment));
        }
        let kind = *self.rng.sample_weighted(&weights);
        match kind {
            StatementKind::Block => {
                self.stmt_depth += 1;
                self.scope.push(Vec::new());
                let body = self.generate_block_inner(false, false);
                self.scope.pop();
                self.stmt_depth -= 1;
                Stmt::Block(body)
            }
            StatementKind::Assignment => self.generate_assignment(),
            StatementKind::Call => self.generate_call_statement(),
            StatementKind::If => self.generate_if(),
            StatementKind::Return => self.generate_return(),
            StatementKind::TryFinally => self.generate_try_finally(),
            StatementKind::Loop => self.generate_loop(),
        }
    }

    fn generate_if(&mut self) -> Stmt {
        let cond = self.generate_nonconstant_bool_guard();
        self.stmt_depth += 1;
        self.scope.push(Vec::new());
        let then_block = self.generate_block_inner(false, false);
        self.scope.pop();
        let else_block = if self.rng.flip_coin(0.5) {
            self.scope.push(Vec::new());
            let b = self.generate_block_inner(false, false);
            self.scope.pop();
            Some(b)
        } else {
            None
        };
        self.stmt_depth -= 1;
        Stmt::If { cond, then_block, else_block }
    }

    fn generate_nonconstant_bool_guard(&mut self) -> Expr {
        for _ in 0..self.cfg.if_guard_retries {
            let e = self.generate_expression(&FuzzType::Primitive(PrimitiveKind::Bool));
            if !matches!(e, Expr::Literal(Literal::Bool(_))) {
                return e;
            }
        }
        self.generate_expression(&FuzzType::Primitive(PrimitiveKind::Bool))
    }

    fn generate_return(&mut self) -> Stmt {
        let rt = self.return_type_stack.last().cloned().flatten();
        match rt {
            Some(ty) => Stmt::Return(Some(self.generate_return_value(&ty))),
            None => Stmt::Return(None),
        }
    }

    /// A `Ref`-typed return always picks an existing l-value whose escape
    /// scope already clears the caller's frame; we never
    /// route a `return ref` through a ref-returning call, simplifying the
    /// aliasing analysis that property would otherwise require (recorded
    /// in the design ledger as a deliberate scope reduction).
    fn generate_return_value(&mut self, ty: &FuzzType) -> Expr {
        if let FuzzType::Ref(inner) = ty {
            let lv = self.gen_lvalue(inner, ESCAPE_BYREF_PARAM, false);
            return Expr::Ref(Box::new(Expr::Var(lv.path)));
        }
        self.generate_expression(ty)
    }

    fn generate_try_finally(&mut self) -> Stmt {
        self.stmt_depth += 1;
        self.scope.push(Vec::new());
        let try_block = self.generate_block_inner(false, false);
        self.scope.pop();
        self.finally_depth += 1;
        self.scope.push(Vec::new());
        let finally_block = self.generate_block_inner(false, false);
        self.scope.pop();
        self.finally_depth -= 1;
        self.stmt_depth -= 1;
        Stmt::TryFinally { try_block, finally_block }
    }

    fn generate_loop(&mut self) -> Stmt {
        self.var_counter += 1;
        let name = format!("i{}", self.var_counter);
        let depth = self.scope.depth() + 1;
        let induction = VariableIdentifier {
            ty: FuzzType::Primitive(PrimitiveKind::Int),
            name: name.clone(),
            ref_escape_scope: -depth,
            read_only: true,
        };
        self.stmt_depth += 1;
        self.scope.push(vec![induction]);
        let body = self.generate_block_inner(false, false);
        self.scope.pop();
        self.stmt_depth -= 1;
        // Fixed bound of 2 keeps generated loops cheap to execute twice
        // under debug and release without dominating wall-clock.
        Stmt::For { var: name, bound: Expr::Literal(Literal::Int(2)), body }
    }

    // ---- assignment generation -------------------------------------------

    fn generate_assignment(&mut self) -> Stmt {
        if self.rng.flip_coin(self.cfg.new_local_probability) {
            self.generate_new_local_assignment()
        } else {
            self.generate_existing_lvalue_assignment()
        }
    }

    fn generate_new_local_assignment(&mut self) -> Stmt {
        let ty = self.universe.pick_type(self.cfg.by_ref_probability, &mut self.rng);
        self.var_counter += 1;
        let name = format!("var{}", self.var_counter);
        let init = if ty.is_ref() {
            let inner = ty.strip_ref().clone();
            let lv = self.gen_lvalue(&inner, i64::MIN, false);
            Expr::Ref(Box::new(Expr::Var(lv.path)))
        } else {
            self.generate_expression(&ty)
        };
        let depth = self.scope.depth();
        self.scope.declare(VariableIdentifier {
            ty: ty.clone(),
            name: name.clone(),
            ref_escape_scope: -depth,
            read_only: false,
        });
        Stmt::Assign(Assign::NewLocal { ty, name, init })
    }

    fn generate_existing_lvalue_assignment(&mut self) -> Stmt {
        let lv = self.gen_lvalue_untyped(true);
        if lv.is_ref_root && self.rng.flip_coin(self.cfg.ref_reassign_probability) {
            let src = self.gen_lvalue(&lv.ty, lv.ref_escape_scope, false);
            return Stmt::Assign(Assign::RefRebind { lhs: lv.path, rhs: Expr::Ref(Box::new(Expr::Var(src.path))) });
        }
        self.generate_compound_or_plain(lv)
    }

    fn generate_compound_or_plain(&mut self, lv: LValueInfo) -> Stmt {
        let Some(kind) = lv.ty.as_primitive() else {
            let rhs = self.generate_expression(&lv.ty);
            return Stmt::Assign(Assign::Compound { lhs: lv.path, op: None, rhs: Some(rhs) });
        };
        let roll = self.rng.next_in_range(0, 2);
        match roll {
            0 => {
                let rhs = self.generate_expression(&lv.ty);
                Stmt::Assign(Assign::Compound { lhs: lv.path, op: None, rhs: Some(rhs) })
            }
            1 => {
                let candidates: Vec<BinOp> = [
                    BinOp::Add,
                    BinOp::Sub,
                    BinOp::Mul,
                    BinOp::Div,
                    BinOp::Mod,
                    BinOp::BitAnd,
                    BinOp::BitOr,
                    BinOp::BitXor,
                    BinOp::Shl,
                    BinOp::Shr,
                ]
                .into_iter()
                .filter(|op| op.compound_text().is_some() && op_tables::binary_applicable(*op, kind))
                .collect();
                if candidates.is_empty() {
                    let rhs = self.generate_expression(&lv.ty);
                    return Stmt::Assign(Assign::Compound { lhs: lv.path, op: None, rhs: Some(rhs) });
                }
                let op = *self.rng.pick_element(&candidates);
                let rhs_ty = if op.is_shift() { FuzzType::Primitive(PrimitiveKind::Int) } else { lv.ty.clone() };
                let mut rhs = self.generate_expression(&rhs_ty);
                if op.is_division_like() {
                    rhs = self.wrap_divisor_guard(rhs, &rhs_ty);
                }
                Stmt::Assign(Assign::Compound { lhs: lv.path, op: Some(op), rhs: Some(rhs) })
            }
            _ if kind.is_integral() => {
                let ops = [UnOp::PreInc, UnOp::PreDec, UnOp::PostInc, UnOp::PostDec];
                let op = *self.rng.pick_element(&ops);
                Stmt::Assign(Assign::IncDec { lhs: lv.path, op })
            }
            _ => {
                let rhs = self.generate_expression(&lv.ty);
                Stmt::Assign(Assign::Compound { lhs: lv.path, op: None, rhs: Some(rhs) })
            }
        }
    }

    /// Wraps a compound divisor/modulus RHS in `(T)((rhs) | 1)` so a
    /// randomly-generated zero divisor can never reach the host compiler
    ///.
    fn wrap_divisor_guard(&mut self, rhs: Expr, ty: &FuzzType) -> Expr {
        let kind = ty.as_primitive().unwrap_or(PrimitiveKind::Int);
        let one = self.literal_one(kind);
        Expr::Cast {
            to: ty.clone(),
            expr: Box::new(Expr::Binary {
                op: BinOp::BitOr,
                lhs: Box::new(Expr::Paren(Box::new(rhs))),
                rhs: Box::new(Expr::Literal(one)),
            }),
        }
    }

    fn literal_one(&self, kind: PrimitiveKind) -> Literal {
        use PrimitiveKind::*;
        match kind {
            Bool => Literal::Bool(true),
            SByte => Literal::SByte(1),
            Byte => Literal::Byte(1),
            Short => Literal::Short(1),
            UShort => Literal::UShort(1),
            Int => Literal::Int(1),
            UInt => Literal::UInt(1),
            Long => Literal::Long(1),
            ULong => Literal::ULong(1),
            Char => Literal::Char('\u{1}'),
            Float => Literal::Float(1.0),
            Double => Literal::Double(1.0),
        }
    }

    // ---- call generation -------------------------------------------

    fn generate_call_statement(&mut self) -> Stmt {
        let (target, _ret) = self.bind_call(None);
        let fn_id = target.function_id();
        let args = self.generate_args(fn_id);
        Stmt::ExprStmt(Expr::Call { target, args })
    }

    fn generate_call_expr(&mut self, ty: &FuzzType) -> Expr {
        let (target, actual) = self.bind_call(Some(ty));
        let fn_id = target.function_id();
        let args = self.generate_args(fn_id);
        let call = Expr::Call { target, args };
        if &actual != ty {
            Expr::Cast { to: ty.clone(), expr: Box::new(call) }
        } else {
            call
        }
    }

    fn generate_args(&mut self, fn_id: usize) -> Vec<Expr> {
        let params = self.functions[fn_id].parameters.clone();
        let mut args = Vec::with_capacity(params.len());
        for p in &params {
            if p.ty.is_ref() {
                let inner = p.ty.strip_ref().clone();
                let lv = self.gen_lvalue(&inner, i64::MIN, false);
                args.push(Expr::Ref(Box::new(Expr::Var(lv.path))));
            } else {
                args.push(self.generate_expression(&p.ty));
            }
        }
        args
    }

    fn current_total_calls(&self) -> u64 {
        self.call_count_stack.last().map(|m| m.values().sum()).unwrap_or(0)
    }

    fn record_call(&mut self, callee: usize) {
        let callee_counts = self.functions[callee].call_counts.clone();
        if let Some(top) = self.call_count_stack.last_mut() {
            *top.entry(callee).or_insert(0) += 1;
            for (g, n) in callee_counts {
                *top.entry(g).or_insert(0) += n;
            }
        }
    }

    /// Picks either a brand-new callee (recursing into `generate_function`)
    /// or an existing function with strictly greater id whose transitive
    /// call count the current function's budget can still absorb. `required` is `None` for a plain call statement,
    /// whose return value (if any) is simply discarded.
    fn bind_call(&mut self, required: Option<&FuzzType>) -> (CallTarget, FuzzType) {
        let current_total = self.current_total_calls();
        let budget_left = self.cfg.single_function_max_total_calls.saturating_sub(current_total);
        let can_create_new = budget_left > 0 && self.functions.len() < MAX_FUNCTIONS;

        if can_create_new && self.rng.flip_coin(self.cfg.new_callee_probability) {
            return self.bind_new_callee(required);
        }

        let current_id = *self.function_id_stack.last().unwrap_or(&0);
        let candidates: Vec<usize> = self
            .functions
            .iter()
            .filter(|f| f.id > current_id)
            .filter(|f| self.return_castable(&f.return_type, required))
            .filter(|f| f.call_counts.values().sum::<u64>() + 1 <= budget_left)
            .map(|f| f.id)
            .collect();

        if candidates.is_empty() {
            return self.bind_new_callee(required);
        }

        let callee = *self.rng.pick_element(&candidates);
        self.record_call(callee);
        let actual = self.functions[callee].return_type.clone().unwrap_or(FuzzType::Primitive(PrimitiveKind::Int));
        let target = if let Some(agg_id) = self.functions[callee].instance_type {
            let receiver = self.generate_expression(&FuzzType::Aggregate(agg_id));
            CallTarget::Instance { receiver: Box::new(receiver), function: callee }
        } else {
            CallTarget::Static(callee)
        };
        (target, actual)
    }

    fn bind_new_callee(&mut self, required: Option<&FuzzType>) -> (CallTarget, FuzzType) {
        let forced = required.cloned();
        let as_instance = required.is_none() && self.rng.flip_coin(0.2) && !self.universe.aggregates.is_empty();
        let instance_type = if as_instance { Some(self.rng.pick_index(self.universe.aggregates.len())) } else { None };
        let id = self.generate_function(instance_type, None, forced, false);
        self.record_call(id);
        let actual = self.functions[id].return_type.clone().unwrap_or(FuzzType::Primitive(PrimitiveKind::Int));
        let target = if let Some(agg_id) = instance_type {
            let receiver = self.generate_expression(&FuzzType::Aggregate(agg_id));
            CallTarget::Instance { receiver: Box::new(receiver), function: id }
        } else {
            CallTarget::Static(id)
        };
        (target, actual)
    }

    fn return_castable(&self, actual: &Option<FuzzType>, required: Option<&FuzzType>) -> bool {
        match (actual, required) {
            (_, None) => true,
            (Some(a), Some(r)) => self.type_matches(a, r),
            (None, Some(_)) => false,
        }
    }

    // ---- expression generation -------------------------------------------

    fn generate_expression(&mut self, ty: &FuzzType) -> Expr {
        self.expr_depth += 1;
        let result = self.generate_expression_inner(ty);
        self.expr_depth -= 1;
        result
    }

    fn generate_expression_inner(&mut self, ty: &FuzzType) -> Expr {
        let compound_ok = self.cfg.recursion.should_recurse(self.expr_depth, &mut self.rng);
        let roll = self.rng.next_in_range(0, 9);
        if !compound_ok || roll <= 2 {
            if let Some(e) = self.generate_member_access(ty) {
                return e;
            }
            return self.generate_literal_expr(ty);
        }
        match roll {
            3 => self.generate_literal_expr(ty),
            4 | 5 => self.generate_binary(ty),
            6 => self.generate_unary(ty),
            7 => self.generate_call_expr(ty),
            8 => self.generate_new_object(ty).unwrap_or_else(|| self.generate_literal_expr(ty)),
            _ => self.generate_member_access(ty).unwrap_or_else(|| self.generate_literal_expr(ty)),
        }
    }

    fn generate_literal_expr(&mut self, ty: &FuzzType) -> Expr {
        let gen = LiteralGen::new(self.universe, self.cfg.literal_bias_probability);
        Expr::Literal(gen.generate(ty, &mut self.rng))
    }

    fn generate_member_access(&mut self, ty: &FuzzType) -> Option<Expr> {
        let candidates: Vec<VarPath> =
            self.enumerate_lvalues().into_iter().filter(|lv| self.type_matches(&lv.ty, ty)).map(|lv| lv.path).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(Expr::Var(self.rng.pick_element(&candidates).clone()))
    }

    fn generate_unary(&mut self, ty: &FuzzType) -> Expr {
        let Some(result_kind) = ty.as_primitive() else {
            return self.generate_literal_expr(ty);
        };
        let candidates = op_tables::unary_candidates_for_result(result_kind);
        if candidates.is_empty() {
            return self.generate_literal_expr(ty);
        }
        let (op, operand_kind) = *self.rng.pick_element(&candidates);
        let operand_ty = FuzzType::Primitive(operand_kind);
        let operand = if matches!(op, UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec) {
            let lv = self.gen_lvalue(&operand_ty, i64::MIN, true);
            Expr::Var(lv.path)
        } else {
            self.generate_expression(&operand_ty)
        };
        let natural = op_tables::unary_natural_result(op, operand_kind);
        let expr = Expr::Unary { op, operand: Box::new(operand) };
        if natural != result_kind {
            Expr::Cast { to: ty.clone(), expr: Box::new(expr) }
        } else {
            expr
        }
    }

    fn generate_binary(&mut self, ty: &FuzzType) -> Expr {
        let Some(result_kind) = ty.as_primitive() else {
            return self.generate_literal_expr(ty);
        };
        let candidates = op_tables::binary_candidates_for_result(result_kind);
        let (op, operand_kind) = *self.rng.pick_element(&candidates);
        let operand_ty = FuzzType::Primitive(operand_kind);
        let rhs_ty = if op.is_shift() { FuzzType::Primitive(PrimitiveKind::Int) } else { operand_ty.clone() };
        let lhs = self.generate_expression(&operand_ty);
        let mut rhs = self.generate_expression(&rhs_ty);
        let mut tries = 0;
        while matches!(lhs, Expr::Literal(_)) && matches!(rhs, Expr::Literal(_)) && tries < 5 {
            rhs = self.generate_expression(&rhs_ty);
            tries += 1;
        }
        if op.is_division_like() {
            rhs = self.wrap_divisor_guard(rhs, &rhs_ty);
        }
        let natural = op_tables::binary_natural_result(op, operand_kind);
        let expr = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        if natural != result_kind {
            Expr::Cast { to: ty.clone(), expr: Box::new(expr) }
        } else {
            expr
        }
    }

    fn generate_new_object(&mut self, ty: &FuzzType) -> Option<Expr> {
        let FuzzType::Aggregate(id) = ty.strip_ref() else { return None };
        let id = *id;
        let field_types: Vec<FuzzType> = self.universe.aggregate(id).fields.iter().map(|(_, t)| t.clone()).collect();
        let args = field_types.iter().map(|fty| self.generate_expression(fty)).collect();
        Some(Expr::New { id, args })
    }

    // ---- l-value enumeration and the ref-escape discipline --------------

    fn type_matches(&self, have: &FuzzType, want: &FuzzType) -> bool {
        match (have, want) {
            (FuzzType::Primitive(a), FuzzType::Primitive(b)) => a == b || a.widens_to(*b),
            (FuzzType::Aggregate(a), FuzzType::Interface(b)) => self.universe.get_implementers(*b).contains(a),
            (a, b) => a == b,
        }
    }

    fn enumerate_lvalues(&self) -> Vec<LValueInfo> {
        let mut out = Vec::new();
        for var in self.scope.visible() {
            self.collect_paths(var, VarPath::root(var.name.clone()), &mut out, 0);
        }
        for f in self.statics.fields() {
            self.collect_paths(&f.var, VarPath::root(f.var.name.clone()), &mut out, 0);
        }
        out
    }

    fn enumerate_primitive_lvalues(&self) -> Vec<LValueInfo> {
        self.enumerate_lvalues().into_iter().filter(|lv| lv.ty.is_primitive()).collect()
    }

    fn collect_paths(&self, var: &VariableIdentifier, path: VarPath, out: &mut Vec<LValueInfo>, depth: u32) {
        let effective = var.ty.strip_ref().clone();
        out.push(LValueInfo {
            path: path.clone(),
            ty: effective.clone(),
            ref_escape_scope: var.ref_escape_scope,
            read_only: var.read_only,
            is_ref_root: depth == 0 && var.ty.is_ref(),
        });
        if depth > 3 {
            return;
        }
        self.collect_nested(&effective, path, var.ref_escape_scope, var.read_only, out, depth);
    }

    fn collect_nested(
        &self,
        ty: &FuzzType,
        path: VarPath,
        escape: i64,
        read_only: bool,
        out: &mut Vec<LValueInfo>,
        depth: u32,
    ) {
        match ty {
            FuzzType::Aggregate(id) => {
                for (name, fty) in &self.universe.aggregate(*id).fields {
                    let p = path.clone().with_field(name.clone());
                    let effective = fty.strip_ref().clone();
                    out.push(LValueInfo {
                        path: p.clone(),
                        ty: effective.clone(),
                        ref_escape_scope: escape,
                        read_only,
                        is_ref_root: false,
                    });
                    self.collect_nested(&effective, p, escape, read_only, out, depth + 1);
                }
            }
            FuzzType::Array { element, .. } => {
                let p = path.with_index(0);
                let effective = element.strip_ref().clone();
                out.push(LValueInfo {
                    path: p.clone(),
                    ty: effective.clone(),
                    ref_escape_scope: escape,
                    read_only,
                    is_ref_root: false,
                });
                self.collect_nested(&effective, p, escape, read_only, out, depth + 1);
            }
            _ => {}
        }
    }

    /// Finds (or, failing that, manufactures via a fresh static) an l-value
    /// whose effective type matches `target_ty` and whose escape scope is
    /// at least `min_escape`; `writable` additionally excludes read-only
    /// l-values (e.g. loop induction variables) from the candidate set.
    fn gen_lvalue(&mut self, target_ty: &FuzzType, min_escape: i64, writable: bool) -> LValueInfo {
        let candidates: Vec<LValueInfo> = self
            .enumerate_lvalues()
            .into_iter()
            .filter(|lv| self.type_matches(&lv.ty, target_ty) && lv.ref_escape_scope >= min_escape)
            .filter(|lv| !writable || !lv.read_only)
            .collect();
        if candidates.is_empty() {
            return self.synthesize_static_lvalue(target_ty);
        }
        let idx = self.rng.pick_index(candidates.len());
        candidates.into_iter().nth(idx).unwrap()
    }

    /// Used by "pick any existing assignable l-value" (assignment
    /// generation never constrains the type up front); falls back to a
    /// fresh static of a randomly chosen type if nothing is writable yet.
    fn gen_lvalue_untyped(&mut self, writable: bool) -> LValueInfo {
        let candidates: Vec<LValueInfo> =
            self.enumerate_lvalues().into_iter().filter(|lv| !writable || !lv.read_only).collect();
        if candidates.is_empty() {
            let ty = self.universe.pick_type_no_ref(&mut self.rng);
            return self.synthesize_static_lvalue(&ty);
        }
        let idx = self.rng.pick_index(candidates.len());
        candidates.into_iter().nth(idx).unwrap()
    }

    fn synthesize_static_lvalue(&mut self, target_ty: &FuzzType) -> LValueInfo {
        let idx = self.statics.generate_new_field(
            Some(target_ty),
            self.universe,
            self.cfg.literal_bias_probability,
            &mut self.rng,
        );
        let var = self.statics.fields()[idx].var.clone();
        LValueInfo {
            path: VarPath::root(var.name.clone()),
            ty: var.ty.strip_ref().clone(),
            ref_escape_scope: var.ref_escape_scope,
            read_only: var.read_only,
            is_ref_root: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_program;
    use sha2::{Digest, Sha256};

    fn digest(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Invariant 1: two runs of the generator with the same seed
    /// produce byte-identical source text.
    #[test]
    fn same_seed_produces_byte_identical_source() {
        let cfg = GenConfig::default();
        let a = print_program(&generate_program(&cfg, 1019504228635510285, "Program"), 1019504228635510285, "");
        let b = print_program(&generate_program(&cfg, 1019504228635510285, "Program"), 1019504228635510285, "");
        assert_eq!(a, b);
        assert_eq!(digest(&a), digest(&b));
    }

    #[test]
    fn different_seeds_usually_differ() {
        let cfg = GenConfig::default();
        let a = print_program(&generate_program(&cfg, 1, "Program"), 1, "");
        let b = print_program(&generate_program(&cfg, 2, "Program"), 2, "");
        assert_ne!(a, b);
    }

    /// Invariant 6: when checksumming is on, every primitive-typed
    /// local or static visible at end-of-block appears in a checksum call.
    #[test]
    fn checksum_enabled_programs_emit_checksum_sites() {
        let mut cfg = GenConfig::default();
        cfg.checksum_enabled = true;
        let source = print_program(&generate_program(&cfg, 7, "Program"), 7, "");
        assert!(source.contains("Checksum("));
    }
}
