//! Human-readable program dump.
//!
//! Sections appear only when non-empty, except `[code]`:
//! ```text
//! [constants]
//! C0 "abc"
//!
//! [code]  ; -> String
//!   0000  LdConst    C0  ; "abc"
//!   0003  Ret
//! ```

use std::fmt::Write as _;

use rill_core::{Colors, Paint, TypeCatalog};

use super::instructions::{BranchKind, Instruction, StringComparison};
use super::program::Program;

/// Mnemonic column width.
const MNEMONIC: usize = 10;

/// Generate a human-readable dump of the program.
pub fn dump(program: &Program, catalog: &dyn TypeCatalog, colors: Colors) -> String {
    let section = |name: &str| colors.paint(Paint::Section, format_args!("[{name}]"));
    let mut out = String::new();

    if !program.constants().is_empty() {
        writeln!(out, "{}", section("constants")).unwrap();
        for (i, value) in program.constants().iter().enumerate() {
            writeln!(out, "C{i} {}", value.format(colors)).unwrap();
        }
        out.push('\n');
    }

    if !program.types().is_empty() {
        writeln!(out, "{}", section("types")).unwrap();
        for (i, ty) in program.types().iter().enumerate() {
            writeln!(out, "T{i} {}", catalog.type_name(ty)).unwrap();
        }
        out.push('\n');
    }

    if !program.members().is_empty() {
        writeln!(out, "{}", section("members")).unwrap();
        for (i, m) in program.members().iter().enumerate() {
            let d = &m.member;
            let params: Vec<String> = d
                .params
                .iter()
                .map(|p| catalog.type_name(p))
                .chain(d.rest.iter().map(|r| format!("params {}[]", catalog.type_name(r))))
                .collect();
            writeln!(
                out,
                "M{i} {}.{}({}) -> {}{}",
                catalog.type_name(&d.declaring),
                d.name,
                params.join(", "),
                catalog.type_name(&d.return_ty),
                colors.paint(Paint::Muted, format_args!("  ; argc {}", m.argc)),
            )
            .unwrap();
        }
        out.push('\n');
    }

    if !program.variables().is_empty() {
        writeln!(out, "{}", section("variables")).unwrap();
        for (i, v) in program.variables().iter().enumerate() {
            writeln!(out, "V{i} {}: {}", v.name, catalog.type_name(&v.ty)).unwrap();
        }
        out.push('\n');
    }

    if !program.locals().is_empty() {
        writeln!(out, "{}", section("locals")).unwrap();
        for (i, ty) in program.locals().iter().enumerate() {
            writeln!(out, "L{i} {}", catalog.type_name(ty)).unwrap();
        }
        out.push('\n');
    }

    let result = catalog.type_name(program.result_type());
    writeln!(
        out,
        "{}{}",
        section("code"),
        colors.paint(Paint::Muted, format_args!("  ; -> {result}"))
    )
    .unwrap();
    for item in program.instructions() {
        match item {
            Ok((offset, instr)) => {
                let line = format_instruction(program, catalog, offset, &instr, colors);
                let offset = colors.paint(Paint::Muted, format_args!("{offset:04}"));
                writeln!(out, "  {offset}  {line}").unwrap();
            }
            Err(e) => {
                writeln!(out, "  <{e}>").unwrap();
            }
        }
    }

    out
}

/// Format one instruction: mnemonic, operands and an optional `;` comment.
pub fn format_instruction(
    program: &Program,
    catalog: &dyn TypeCatalog,
    offset: u32,
    instr: &Instruction,
    colors: Colors,
) -> String {
    let name = instr.opcode().name();
    let (operand, comment) = match *instr {
        Instruction::LdI4(v) => (v.to_string(), None),
        Instruction::LdI8(v) => (v.to_string(), None),
        Instruction::LdR4(v) => (format!("{v:?}"), None),
        Instruction::LdR8(v) => (format!("{v:?}"), None),
        Instruction::LdConst(id) => (
            format!("C{}", id.0),
            Some(program.constant(id).format(Colors::OFF)),
        ),
        Instruction::LdVar(id) => (format!("V{}", id.0), Some(program.variable(id).name.clone())),
        Instruction::LdLoc(id) | Instruction::StLoc(id) => (format!("L{}", id.0), None),
        Instruction::StrEq(mode) => (
            match mode {
                StringComparison::Ordinal => "Ordinal",
                StringComparison::IgnoreCase => "IgnoreCase",
            }
            .to_string(),
            None,
        ),
        Instruction::Conv(kind) | Instruction::ConvOvf(kind) | Instruction::ConvOvfUn(kind) => {
            (kind.name().to_string(), None)
        }
        Instruction::Box(t)
        | Instruction::UnboxAny(t)
        | Instruction::CastClass(t)
        | Instruction::ToEnum(t) => (
            format!("T{}", t.0),
            Some(catalog.type_name(program.type_ref(t))),
        ),
        Instruction::NewArray(t, count) => (
            format!("T{} {count}", t.0),
            Some(catalog.type_name(program.type_ref(t))),
        ),
        Instruction::Call(id) => {
            let m = &program.member(id).member;
            (
                format!("M{}", id.0),
                Some(format!("{}.{}", catalog.type_name(&m.declaring), m.name)),
            )
        }
        Instruction::Branch { kind, .. } => {
            let target = instr.branch_target(offset).unwrap_or_default();
            let cond = match kind {
                BranchKind::Always => None,
                BranchKind::IfTrue => Some("if true".to_string()),
                BranchKind::IfFalse => Some("if false".to_string()),
            };
            (format!("{target:04}"), cond)
        }
        _ => (String::new(), None),
    };

    let mut line = colors.paint(Paint::Opcode, name);
    if !operand.is_empty() {
        let pad = MNEMONIC.saturating_sub(name.len()).max(1);
        write!(line, "{:pad$}{operand}", "").unwrap();
    }
    if let Some(comment) = comment {
        write!(line, "  {}", colors.paint(Paint::Muted, format_args!("; {comment}"))).unwrap();
    }
    line
}
