//! Tests for the program dump.

use std::sync::Arc;

use rill_core::{Colors, HostCatalog, MemberDescriptor, Ty, Value};

use super::dump::dump;
use super::instructions::{BranchForm, BranchKind, Instruction};
use super::program::{Program, ProgramTables};
use super::sink::{BytecodeWriter, InstructionSink};

#[test]
fn dump_conditional() {
    let mut tables = ProgramTables::new();
    let yes = tables.intern_constant(Value::string("yes"));
    let no = tables.intern_constant(Value::string("no"));

    let mut w = BytecodeWriter::new();
    w.emit(Instruction::LdTrue);
    w.emit(Instruction::branch(BranchKind::IfFalse, BranchForm::Short, 5));
    w.emit(Instruction::LdConst(yes));
    w.emit(Instruction::branch(BranchKind::Always, BranchForm::Short, 3));
    w.emit(Instruction::LdConst(no));
    w.emit(Instruction::Ret);

    let program = Program::new(w.into_code(), tables, vec![], Ty::String, None).unwrap();
    let catalog = HostCatalog::default();

    insta::assert_snapshot!(dump(&program, &catalog, Colors::OFF), @r#"
    [constants]
    C0 "yes"
    C1 "no"

    [code]  ; -> String
      0000  LdTrue
      0001  BrFalse.S 0008  ; if false
      0003  LdConst   C0  ; "yes"
      0006  Br.S      0011
      0008  LdConst   C1  ; "no"
      0011  Ret
    "#);
}

#[test]
fn dump_members_variables_and_locals() {
    let catalog = HostCatalog::with_builtins();
    let concat = Arc::new(
        MemberDescriptor::method("Concat", Ty::String)
            .static_member()
            .rest(Ty::Object)
            .returns(Ty::String)
            .build(),
    );

    let mut tables = ProgramTables::new();
    let x = tables.intern_variable("x", &Ty::I32);
    let obj = tables.intern_type(&Ty::Object);
    let m = tables.intern_member(&concat, false, 1);

    let mut w = BytecodeWriter::new();
    w.emit(Instruction::LdVar(x));
    w.emit(Instruction::StLoc(super::ids::LocalId(0)));
    w.emit(Instruction::LdLoc(super::ids::LocalId(0)));
    w.emit(Instruction::Box(obj));
    w.emit(Instruction::NewArray(obj, 1));
    w.emit(Instruction::Call(m));
    w.emit(Instruction::Ret);

    let program = Program::new(w.into_code(), tables, vec![Ty::I32], Ty::String, None).unwrap();

    insta::assert_snapshot!(dump(&program, &catalog, Colors::OFF), @r"
    [types]
    T0 Object

    [members]
    M0 String.Concat(params Object[]) -> String  ; argc 1

    [variables]
    V0 x: Int32

    [locals]
    L0 Int32

    [code]  ; -> String
      0000  LdVar     V0  ; x
      0003  StLoc     L0
      0006  LdLoc     L0
      0009  Box       T0  ; Object
      0012  NewArray  T0 1  ; Object
      0017  Call      M0  ; String.Concat
      0020  Ret
    ");
}

#[test]
fn dump_paints_sections_offsets_and_opcodes() {
    let mut w = BytecodeWriter::new();
    w.emit(Instruction::LdI4(2));
    w.emit(Instruction::Ret);
    let program = Program::new(w.into_code(), ProgramTables::new(), vec![], Ty::I32, None).unwrap();
    let catalog = HostCatalog::default();

    let lines: Vec<String> = dump(&program, &catalog, Colors::ON)
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(
        lines,
        [
            "\x1b[1;34m[code]\x1b[0m\x1b[2m  ; -> Int32\x1b[0m",
            "  \x1b[2m0000\x1b[0m  \x1b[34mLdI4\x1b[0m      2",
            "  \x1b[2m0005\x1b[0m  \x1b[34mRet\x1b[0m",
        ]
    );
}
