use std::sync::Arc;

use pretty_assertions::assert_eq;
use rill_bytecode::{
    BranchForm, BranchKind, BytecodeWriter, Instruction, InstructionSink, LocalId, Program,
    ProgramTables, VariableId,
};
use rill_core::{Colors, HostCatalog, HostError, MemberDescriptor, Ty, Value};

use super::{ExecLimits, PrintTracer, RuntimeError, VM, Verbosity};

fn program(code: &[Instruction], tables: ProgramTables, locals: Vec<Ty>, result: Ty) -> Program {
    let mut writer = BytecodeWriter::new();
    for instr in code {
        writer.emit(*instr);
    }
    Program::new(writer.into_code(), tables, locals, result, None).unwrap()
}

fn simple(code: &[Instruction]) -> Program {
    program(code, ProgramTables::new(), vec![], Ty::Object)
}

fn run(program: &Program) -> Result<Value, RuntimeError> {
    VM::builder(program).build().execute()
}

fn conditional(condition: Instruction) -> Program {
    simple(&[
        condition,
        Instruction::branch(BranchKind::IfFalse, BranchForm::Short, 7),
        Instruction::LdI4(1),
        Instruction::branch(BranchKind::Always, BranchForm::Short, 5),
        Instruction::LdI4(2),
        Instruction::Ret,
    ])
}

#[test]
fn arithmetic() {
    let p = simple(&[
        Instruction::LdI4(2),
        Instruction::LdI4(3),
        Instruction::Mul,
        Instruction::LdI4(1),
        Instruction::Sub,
        Instruction::Ret,
    ]);
    assert_eq!(run(&p), Ok(Value::I32(5)));
}

#[test]
fn branches_select_an_arm() {
    assert_eq!(run(&conditional(Instruction::LdTrue)), Ok(Value::I32(1)));
    assert_eq!(run(&conditional(Instruction::LdFalse)), Ok(Value::I32(2)));
}

#[test]
fn variables_are_read_by_slot() {
    let mut tables = ProgramTables::new();
    let x = tables.intern_variable("x", &Ty::I32);
    let p = program(
        &[
            Instruction::LdVar(x),
            Instruction::LdI4(1),
            Instruction::Add,
            Instruction::Ret,
        ],
        tables,
        vec![],
        Ty::I32,
    );

    let values = [Some(Value::I32(4))];
    let vm = VM::builder(&p).variables(&values).build();
    assert_eq!(vm.execute(), Ok(Value::I32(5)));

    let unbound = [None];
    let vm = VM::builder(&p).variables(&unbound).build();
    assert_eq!(vm.execute(), Err(RuntimeError::MissingVariable("x".into())));
}

#[test]
fn missing_variable_slot() {
    let mut tables = ProgramTables::new();
    tables.intern_variable("y", &Ty::I32);
    let p = program(
        &[Instruction::LdVar(VariableId(0)), Instruction::Ret],
        tables,
        vec![],
        Ty::I32,
    );
    assert_eq!(run(&p), Err(RuntimeError::MissingVariable("y".into())));
}

#[test]
fn locals_hold_values_for_one_run() {
    let local = LocalId(0);
    let p = program(
        &[
            Instruction::LdI4(7),
            Instruction::StLoc(local),
            Instruction::LdLoc(local),
            Instruction::LdLoc(local),
            Instruction::Mul,
            Instruction::Ret,
        ],
        ProgramTables::new(),
        vec![Ty::I32],
        Ty::I32,
    );
    assert_eq!(run(&p), Ok(Value::I32(49)));
}

#[test]
fn host_calls_receive_arguments_in_order() {
    let member = Arc::new(
        MemberDescriptor::method("Minus", Ty::Object)
            .static_member()
            .params([Ty::I32, Ty::I32])
            .returns(Ty::I32)
            .invoke(|_, args| match args {
                [Value::I32(a), Value::I32(b)] => Ok(Value::I32(a - b)),
                _ => Err(HostError::new("bad arguments")),
            })
            .build(),
    );
    let mut tables = ProgramTables::new();
    let id = tables.intern_member(&member, false, 2);
    let p = program(
        &[
            Instruction::LdI4(10),
            Instruction::LdI4(3),
            Instruction::Call(id),
            Instruction::Ret,
        ],
        tables,
        vec![],
        Ty::I32,
    );
    assert_eq!(run(&p), Ok(Value::I32(7)));
}

#[test]
fn host_failures_name_the_member() {
    let member = Arc::new(
        MemberDescriptor::method("Explode", Ty::Object)
            .static_member()
            .invoke(|_, _| Err(HostError::new("boom")))
            .build(),
    );
    let mut tables = ProgramTables::new();
    let id = tables.intern_member(&member, false, 0);
    let p = program(&[Instruction::Call(id), Instruction::Ret], tables, vec![], Ty::Object);
    assert_eq!(
        run(&p),
        Err(RuntimeError::Host {
            member: "Explode".into(),
            message: "boom".into()
        })
    );
}

#[test]
fn null_receiver_is_rejected() {
    let member = Arc::new(
        MemberDescriptor::property("Length", Ty::String, Ty::I32)
            .invoke(|_, _| Ok(Value::I32(0)))
            .build(),
    );
    let mut tables = ProgramTables::new();
    let id = tables.intern_member(&member, true, 0);
    let p = program(
        &[Instruction::LdNull, Instruction::Call(id), Instruction::Ret],
        tables,
        vec![],
        Ty::I32,
    );
    assert_eq!(run(&p), Err(RuntimeError::NullReference));
}

#[test]
fn arrays() {
    let mut tables = ProgramTables::new();
    let int = tables.intern_type(&Ty::I32);
    let build = |tail: &[Instruction], tables: ProgramTables| {
        let mut code = vec![
            Instruction::LdI4(1),
            Instruction::LdI4(2),
            Instruction::NewArray(int, 2),
        ];
        code.extend_from_slice(tail);
        program(&code, tables, vec![], Ty::Object)
    };

    let contains = build(
        &[Instruction::LdI4(2), Instruction::ArrayContains, Instruction::Ret],
        tables.clone(),
    );
    assert_eq!(run(&contains), Ok(Value::Bool(true)));

    let element = build(
        &[Instruction::LdI4(1), Instruction::LdElem, Instruction::Ret],
        tables.clone(),
    );
    assert_eq!(run(&element), Ok(Value::I32(2)));

    let outside = build(&[Instruction::LdI4(5), Instruction::LdElem, Instruction::Ret], tables);
    assert_eq!(
        run(&outside),
        Err(RuntimeError::IndexOutOfRange { index: 5, len: 2 })
    );
}

#[test]
fn string_indexing_yields_chars() {
    let mut tables = ProgramTables::new();
    let abc = tables.intern_constant(Value::string("abc"));
    let p = program(
        &[
            Instruction::LdConst(abc),
            Instruction::LdI4(1),
            Instruction::StrChar,
            Instruction::Ret,
        ],
        tables,
        vec![],
        Ty::CHAR,
    );
    assert_eq!(run(&p), Ok(Value::Char('b')));
}

#[test]
fn unboxing_checks_the_runtime_type() {
    let mut tables = ProgramTables::new();
    let abc = tables.intern_constant(Value::string("abc"));
    let int = tables.intern_type(&Ty::I32);
    let p = program(
        &[
            Instruction::LdConst(abc),
            Instruction::UnboxAny(int),
            Instruction::Ret,
        ],
        tables,
        vec![],
        Ty::I32,
    );
    assert_eq!(
        run(&p),
        Err(RuntimeError::InvalidCast {
            from: "String".into(),
            to: "Int32".into()
        })
    );
}

#[test]
fn owner_must_be_supplied() {
    let p = simple(&[Instruction::LdOwner, Instruction::Ret]);
    assert_eq!(run(&p), Err(RuntimeError::NullReference));

    let vm = VM::builder(&p).owner(Value::string("me")).build();
    assert_eq!(vm.execute(), Ok(Value::string("me")));
}

#[test]
fn stack_limit() {
    let p = simple(&[
        Instruction::LdI4(1),
        Instruction::LdI4(2),
        Instruction::Add,
        Instruction::Ret,
    ]);
    let vm = VM::builder(&p)
        .limits(ExecLimits::new().max_stack(1))
        .build();
    assert_eq!(vm.execute(), Err(RuntimeError::StackLimitExceeded(1)));
}

#[test]
fn malformed_stacks() {
    let p = simple(&[Instruction::Add, Instruction::Ret]);
    assert_eq!(run(&p), Err(RuntimeError::StackUnderflow { offset: 0 }));

    let p = simple(&[Instruction::LdI4(1), Instruction::LdI4(2), Instruction::Ret]);
    assert!(matches!(run(&p), Err(RuntimeError::InvalidProgram(_))));
}

#[test]
fn print_tracer_collects_one_line_per_step() {
    let catalog = HostCatalog::with_builtins();
    let p = conditional(Instruction::LdTrue);
    let mut tracer = PrintTracer::new(&p, &catalog, Verbosity::Default, Colors::OFF);
    let result = VM::builder(&p).build().execute_with(&mut tracer);
    assert_eq!(result, Ok(Value::I32(1)));
    assert_eq!(
        tracer.lines(),
        [
            "0000  LdTrue  -> True",
            "0001  BrFalse.S 0010  ; if false  (not taken)",
            "0003  LdI4      1  -> 1",
            "0008  Br.S      0015  (taken)",
            "0015  Ret  => 1",
        ]
    );
}

#[test]
fn verbose_tracer_shows_the_stack() {
    let catalog = HostCatalog::with_builtins();
    let p = simple(&[
        Instruction::LdI4(1),
        Instruction::LdI4(2),
        Instruction::Add,
        Instruction::Ret,
    ]);
    let mut tracer = PrintTracer::new(&p, &catalog, Verbosity::Verbose, Colors::OFF);
    VM::builder(&p).build().execute_with(&mut tracer).unwrap();
    assert_eq!(tracer.lines()[1], "0005  LdI4      2  [2] 1 2");
    assert_eq!(tracer.lines()[2], "0010  Add  [1] 3");
}

#[test]
fn colored_trace_mutes_offsets_and_stack_markers() {
    let catalog = HostCatalog::with_builtins();
    let p = simple(&[Instruction::LdI4(4), Instruction::Ret]);
    let mut tracer = PrintTracer::new(&p, &catalog, Verbosity::Default, Colors::ON);
    VM::builder(&p).build().execute_with(&mut tracer).unwrap();
    assert_eq!(
        tracer.lines(),
        [
            "\x1b[2m0000\x1b[0m  \x1b[34mLdI4\x1b[0m      4  \x1b[2m->\x1b[0m \x1b[36m4\x1b[0m",
            "\x1b[2m0005\x1b[0m  \x1b[34mRet\x1b[0m  \x1b[2m=>\x1b[0m \x1b[36m4\x1b[0m",
        ]
    );
}
