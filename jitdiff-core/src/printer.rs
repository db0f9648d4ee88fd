//! Printer: serializes a `Program` to the concrete source text the
//! host compiler consumes, plus the stable header comment format
//! downstream tooling parses.
//!
//! Walks the typed tree and accumulates into an indented `String` buffer,
//! one `write_*` method per node kind.

use crate::tree::{
    Assign, Block, CallTarget, Expr, FuzzType, Literal, PathSegment, Program, Stmt, TypeDecl, UnOp, VarPath,
};
use std::fmt::Write as _;

pub const TOOL_NAME: &str = "jitdiff";
pub const TOOL_VERSION: (u32, u32) = (1, 0);

/// Render `program`'s full source text, prefixed with the two header lines
/// every generated repro carries (`Generated by ... / Seed: ...`); the
/// `Reduced from ...` and `Debug:`/`Release:` lines are appended separately
/// by the Reducer's finalization step, which is the only stage that knows
/// the before/after sizes and observed outcomes.
pub fn print_program(program: &Program, seed: u64, generated_at: &str) -> String {
    let mut out = String::new();
    write_generated_header(&mut out, seed, generated_at);
    out.push('\n');
    write_body(&mut out, program);
    out
}

pub fn write_generated_header(out: &mut String, seed: u64, generated_at: &str) {
    let _ = writeln!(out, "// Generated by {TOOL_NAME} v{}.{} on {generated_at}", TOOL_VERSION.0, TOOL_VERSION.1);
    let _ = writeln!(out, "// Seed: {seed}");
}

/// The Reducer's finalization header; callers prepend
/// this to a freshly-rendered reduced body in place of the generated header.
pub fn reduced_header(
    original_kib: f64,
    reduced_kib: f64,
    elapsed_hhmmss: &str,
    debug_summary: &str,
    release_summary: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Reduced from {original_kib:.1} KiB to {reduced_kib:.1} KiB in {elapsed_hhmmss}");
    let _ = writeln!(out, "// Debug: {debug_summary}");
    let _ = writeln!(out, "// Release: {release_summary}");
    out
}

fn write_body(out: &mut String, program: &Program) {
    for decl in &program.type_order {
        match decl {
            TypeDecl::Interface(id) => write_interface(out, program, *id),
            TypeDecl::Aggregate(id) => write_aggregate(out, program, *id),
        }
        out.push('\n');
    }
    write_primary_class(out, program);
}

fn write_interface(out: &mut String, program: &Program, id: usize) {
    let iface = program.interface(id);
    let _ = writeln!(out, "interface {} {{}}", iface.name);
}

fn write_aggregate(out: &mut String, program: &Program, id: usize) {
    let agg = program.aggregate(id);
    let kind = if agg.is_class { "class" } else { "struct" };
    let mut header = format!("{kind} {}", agg.name);
    if !agg.implements.is_empty() {
        let names: Vec<String> = agg.implements.iter().map(|i| program.interface(*i).name.clone()).collect();
        header.push_str(" : ");
        header.push_str(&names.join(", "));
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{{");
    for (name, ty) in &agg.fields {
        let _ = writeln!(out, "    public {} {name};", type_name(ty));
    }
    let _ = writeln!(out, "}}");
}

fn write_primary_class(out: &mut String, program: &Program) {
    let _ = writeln!(out, "class {}", program.primary_class_name);
    let _ = writeln!(out, "{{");
    if program.checksum_enabled {
        let _ = writeln!(out, "    static s_rt s_rt = new s_rt();");
    }
    for field in &program.statics {
        let _ = writeln!(
            out,
            "    static {} {} = {};",
            type_name(&field.var.ty),
            field.var.name,
            render_expr(&field.init, program.checksum_enabled)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "    static void Main()");
    let _ = writeln!(out, "    {{");
    let _ = writeln!(out, "        m0();");
    let _ = writeln!(out, "    }}");
    for (id, func) in program.functions.iter().enumerate() {
        let _ = writeln!(out);
        write_function(out, program, id, func);
    }
    let _ = writeln!(out, "}}");
}

fn write_function(out: &mut String, program: &Program, id: usize, func: &crate::tree::Function) {
    let qualifier = if func.instance_type.is_some() { "" } else { "static " };
    let ret = func.return_type.as_ref().map(type_name).unwrap_or_else(|| "void".to_string());
    let params: Vec<String> = func
        .parameters
        .iter()
        .filter(|p| p.name != "this")
        .map(|p| {
            let prefix = if p.ty.is_ref() { "ref " } else { "" };
            format!("{prefix}{} {}", type_name(p.ty.strip_ref()), p.name)
        })
        .collect();
    let _ = writeln!(out, "    {qualifier}{ret} m{id}({})", params.join(", "));
    let _ = writeln!(out, "    {{");
    write_block(out, program, &func.body, 2);
    let _ = writeln!(out, "    }}");
}

fn write_block(out: &mut String, program: &Program, block: &Block, indent: usize) {
    let pad = "    ".repeat(indent);
    for stmt in &block.0 {
        write_stmt(out, program, stmt, indent, &pad);
    }
}

fn write_stmt(out: &mut String, program: &Program, stmt: &Stmt, indent: usize, pad: &str) {
    match stmt {
        Stmt::Block(b) => {
            let _ = writeln!(out, "{pad}{{");
            write_block(out, program, b, indent + 1);
            let _ = writeln!(out, "{pad}}}");
        }
        Stmt::Assign(a) => write_assign(out, a, pad, program.checksum_enabled),
        Stmt::ExprStmt(e) => {
            let _ = writeln!(out, "{pad}{};", render_expr(e, program.checksum_enabled));
        }
        Stmt::If { cond, then_block, else_block } => {
            let _ = writeln!(out, "{pad}if ({})", render_expr(cond, program.checksum_enabled));
            let _ = writeln!(out, "{pad}{{");
            write_block(out, program, then_block, indent + 1);
            let _ = writeln!(out, "{pad}}}");
            if let Some(eb) = else_block {
                let _ = writeln!(out, "{pad}else");
                let _ = writeln!(out, "{pad}{{");
                write_block(out, program, eb, indent + 1);
                let _ = writeln!(out, "{pad}}}");
            }
        }
        Stmt::Return(None) => {
            let _ = writeln!(out, "{pad}return;");
        }
        Stmt::Return(Some(e)) => {
            let _ = writeln!(out, "{pad}return {};", render_expr(e, program.checksum_enabled));
        }
        Stmt::TryFinally { try_block, finally_block } => {
            let _ = writeln!(out, "{pad}try");
            let _ = writeln!(out, "{pad}{{");
            write_block(out, program, try_block, indent + 1);
            let _ = writeln!(out, "{pad}}}");
            let _ = writeln!(out, "{pad}finally");
            let _ = writeln!(out, "{pad}{{");
            write_block(out, program, finally_block, indent + 1);
            let _ = writeln!(out, "{pad}}}");
        }
        Stmt::For { var, bound, body } => {
            let _ = writeln!(
                out,
                "{pad}for (int {var} = 0; {var} < {}; {var}++)",
                render_expr(bound, program.checksum_enabled)
            );
            let _ = writeln!(out, "{pad}{{");
            write_block(out, program, body, indent + 1);
            let _ = writeln!(out, "{pad}}}");
        }
        Stmt::LocalDecl { ty, name } => {
            let _ = writeln!(out, "{pad}{} {name};", type_name(ty));
        }
    }
}

fn write_assign(out: &mut String, a: &Assign, pad: &str, checksum_enabled: bool) {
    match a {
        Assign::NewLocal { ty, name, init } => {
            let _ = writeln!(out, "{pad}{} {name} = {};", type_name(ty), render_expr(init, checksum_enabled));
        }
        Assign::RefRebind { lhs, rhs } => {
            let _ = writeln!(out, "{pad}{} = {};", render_path(lhs), render_expr(rhs, checksum_enabled));
        }
        Assign::Compound { lhs, op: None, rhs: Some(rhs) } => {
            let _ = writeln!(out, "{pad}{} = {};", render_path(lhs), render_expr(rhs, checksum_enabled));
        }
        Assign::Compound { lhs, op: Some(op), rhs: Some(rhs) } => {
            let sym = op.compound_text().unwrap_or("=");
            let _ = writeln!(out, "{pad}{} {sym} {};", render_path(lhs), render_expr(rhs, checksum_enabled));
        }
        Assign::Compound { lhs, rhs: None, .. } => {
            let _ = writeln!(out, "{pad}{};", render_path(lhs));
        }
        Assign::IncDec { lhs, op } => {
            let path = render_path(lhs);
            let rendered = match op {
                UnOp::PreInc => format!("++{path}"),
                UnOp::PreDec => format!("--{path}"),
                UnOp::PostInc => format!("{path}++"),
                UnOp::PostDec => format!("{path}--"),
                _ => path,
            };
            let _ = writeln!(out, "{pad}{rendered};");
        }
    }
}

fn render_path(path: &VarPath) -> String {
    let mut s = path.base.clone();
    for seg in &path.path {
        match seg {
            PathSegment::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            PathSegment::Index(i) => {
                let _ = write!(s, "[{i}]");
            }
        }
    }
    s
}

fn render_expr(e: &Expr, checksum_enabled: bool) -> String {
    match e {
        Expr::Literal(l) => render_literal(l),
        Expr::Var(p) => render_path(p),
        Expr::Unary { op, operand } => render_unary(*op, operand, checksum_enabled),
        Expr::Binary { op, lhs, rhs } => {
            format!("({} {} {})", render_expr(lhs, checksum_enabled), op.source_text(), render_expr(rhs, checksum_enabled))
        }
        Expr::Call { target, args } => render_call(target, args, checksum_enabled),
        Expr::Cast { to, expr } => format!("(({}){})", type_name(to), render_expr(expr, checksum_enabled)),
        Expr::Ref(inner) => format!("ref {}", render_expr(inner, checksum_enabled)),
        Expr::New { id, args } => {
            let rendered: Vec<String> = args.iter().map(|a| render_expr(a, checksum_enabled)).collect();
            format!("new T{id}({})", rendered.join(", "))
        }
        Expr::Paren(inner) => format!("({})", render_expr(inner, checksum_enabled)),
        // Finalization flips `checksum_enabled` off and drops the runtime
        // object: with it gone, a checksum site
        // prints as a plain console write of the same value instead of a
        // call through the no-longer-declared `s_rt`.
        Expr::ChecksumSite { site_id, value } if checksum_enabled => {
            format!("s_rt.Checksum(\"{site_id}\", {})", render_expr(value, checksum_enabled))
        }
        Expr::ChecksumSite { value, .. } => format!("System.Console.WriteLine({})", render_expr(value, checksum_enabled)),
    }
}

fn render_unary(op: UnOp, operand: &Expr, checksum_enabled: bool) -> String {
    let inner = render_expr(operand, checksum_enabled);
    match op {
        UnOp::Neg => format!("(-{inner})"),
        UnOp::Not => format!("(!{inner})"),
        UnOp::BitNot => format!("(~{inner})"),
        UnOp::PreInc => format!("(++{inner})"),
        UnOp::PreDec => format!("(--{inner})"),
        UnOp::PostInc => format!("({inner}++)"),
        UnOp::PostDec => format!("({inner}--)"),
    }
}

fn render_call(target: &CallTarget, args: &[Expr], checksum_enabled: bool) -> String {
    let rendered_args: Vec<String> = args.iter().map(|a| render_expr(a, checksum_enabled)).collect();
    match target {
        CallTarget::Static(id) => format!("m{id}({})", rendered_args.join(", ")),
        CallTarget::Instance { receiver, function } => {
            format!("{}.m{function}({})", render_expr(receiver, checksum_enabled), rendered_args.join(", "))
        }
    }
}

fn render_literal(l: &Literal) -> String {
    match l {
        Literal::Bool(b) => b.to_string(),
        Literal::SByte(v) => format!("(sbyte){v}"),
        Literal::Byte(v) => format!("(byte){v}"),
        Literal::Short(v) => format!("(short){v}"),
        Literal::UShort(v) => format!("(ushort){v}"),
        Literal::Int(v) => v.to_string(),
        Literal::UInt(v) => format!("{v}u"),
        Literal::Long(v) => format!("{v}L"),
        Literal::ULong(v) => format!("{v}UL"),
        Literal::Char(c) => format!("'{}'", c.escape_default()),
        Literal::Float(v) => format!("{v}f"),
        Literal::Double(v) => format!("{v}d"),
        Literal::ZeroArray { element } => format!("new {}[1]", type_name(element)),
        Literal::Aggregate { id, fields } => {
            let rendered: Vec<String> = fields.iter().map(render_literal).collect();
            format!("new T{id}({})", rendered.join(", "))
        }
    }
}

fn type_name(ty: &FuzzType) -> String {
    match ty {
        FuzzType::Primitive(k) => k.keyword().to_string(),
        FuzzType::Array { element, .. } => format!("{}[]", type_name(element)),
        FuzzType::Aggregate(id) => format!("T{id}"),
        FuzzType::Interface(id) => format!("I{id}"),
        FuzzType::Ref(inner) => type_name(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::synth::generate_program;

    #[test]
    fn header_carries_seed_and_tool_name() {
        let mut out = String::new();
        write_generated_header(&mut out, 42, "2026-01-01 00:00:00");
        assert!(out.contains("Seed: 42"));
        assert!(out.contains(TOOL_NAME));
    }

    #[test]
    fn printed_program_contains_entry_point_and_all_functions() {
        let cfg = GenConfig::default();
        let program = generate_program(&cfg, 7, "Program");
        let src = print_program(&program, 7, "2026-01-01 00:00:00");
        assert!(src.contains("static void Main()"));
        for id in 0..program.functions.len() {
            assert!(src.contains(&format!("m{id}(")));
        }
    }

    #[test]
    fn reduced_header_includes_both_sizes_and_outcomes() {
        let header = reduced_header(12.3, 0.5, "00:00:07", "NullReferenceException", "NullReferenceException");
        assert!(header.contains("12.3 KiB to 0.5 KiB"));
        assert!(header.contains("Debug: NullReferenceException"));
    }
}
