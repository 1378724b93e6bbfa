use pretty_assertions::assert_eq;
use rill_bytecode::{BranchForm, BranchKind, Instruction, LocalId, Program};
use rill_core::{PrimitiveKind, Ty, Value};

use super::assemble;
use crate::elements::{
    ArithmeticCode, ArithmeticOp, CompareCode, CompareOp, Element, ElementKind, InTarget,
    LogicalOp,
};
use crate::lexer::Position;

fn at() -> Position {
    Position::new(1, 1)
}

fn int(n: i32) -> Element {
    Element::literal(Value::I32(n), false, 0..0, at())
}

fn boolean(b: bool) -> Element {
    Element::literal(Value::Bool(b), false, 0..0, at())
}

fn add(left: Element, right: Element) -> Element {
    Element::new(
        ElementKind::Arithmetic {
            op: ArithmeticOp::Add,
            left: Box::new(left),
            right: Box::new(right),
            code: ArithmeticCode::Primitive(Instruction::Add),
        },
        Ty::I32,
        0..0,
        at(),
    )
}

fn conditional(condition: Element, then: Element, otherwise: Element) -> Element {
    let ty = then.ty.clone();
    Element::new(
        ElementKind::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        ty,
        0..0,
        at(),
    )
}

fn listing(program: &Program) -> Vec<(u32, Instruction)> {
    program.instructions().map(|r| r.unwrap()).collect()
}

#[test]
fn literal_and_ret() {
    let program = assemble(&add(int(1), int(2)), vec![], None).unwrap();
    assert_eq!(
        listing(&program),
        [
            (0, Instruction::LdI4(1)),
            (5, Instruction::LdI4(2)),
            (10, Instruction::Add),
            (11, Instruction::Ret),
        ]
    );
    assert_eq!(program.result_type(), &Ty::I32);
}

#[test]
fn conditional_uses_short_branches() {
    let program = assemble(&conditional(boolean(true), int(1), int(2)), vec![], None).unwrap();
    assert_eq!(
        listing(&program),
        [
            (0, Instruction::LdTrue),
            (1, Instruction::branch(BranchKind::IfFalse, BranchForm::Short, 7)),
            (3, Instruction::LdI4(1)),
            (8, Instruction::branch(BranchKind::Always, BranchForm::Short, 5)),
            (10, Instruction::LdI4(2)),
            (15, Instruction::Ret),
        ]
    );
}

#[test]
fn large_arm_needs_long_branch() {
    // 30 literals and 29 additions: 179 bytes, out of i8 reach.
    let arm = (1..30).fold(int(0), |acc, n| add(acc, int(n)));
    let program = assemble(&conditional(boolean(false), arm, int(-1)), vec![], None).unwrap();
    let code = listing(&program);
    assert_eq!(
        code[1],
        (1, Instruction::branch(BranchKind::IfFalse, BranchForm::Long, 181))
    );
    // The jump over the else arm stays short.
    let (offset, last_branch) = code[code.len() - 3];
    assert_eq!(offset, 185);
    assert_eq!(
        last_branch,
        Instruction::branch(BranchKind::Always, BranchForm::Short, 5)
    );
}

#[test]
fn short_circuit_and() {
    let e = Element::new(
        ElementKind::Logical {
            op: LogicalOp::And,
            left: Box::new(boolean(false)),
            right: Box::new(boolean(true)),
            short_circuit: true,
        },
        Ty::BOOL,
        0..0,
        at(),
    );
    let program = assemble(&e, vec![], None).unwrap();
    assert_eq!(
        listing(&program),
        [
            (0, Instruction::LdFalse),
            (1, Instruction::Dup),
            (2, Instruction::branch(BranchKind::IfFalse, BranchForm::Short, 2)),
            (4, Instruction::Pop),
            (5, Instruction::LdTrue),
            (6, Instruction::Ret),
        ]
    );
}

#[test]
fn in_list_caches_probe() {
    let local = LocalId(0);
    let cached = || Element::new(ElementKind::Local(local), Ty::I32, 0..0, at());
    let eq = |item: Element| {
        Element::new(
            ElementKind::Compare {
                op: CompareOp::Eq,
                left: Box::new(cached()),
                right: Box::new(item),
                code: CompareCode::Primitive {
                    instr: Instruction::Ceq,
                    negate: false,
                },
            },
            Ty::BOOL,
            0..0,
            at(),
        )
    };
    let e = Element::new(
        ElementKind::In {
            probe: Box::new(int(3)),
            target: InTarget::List {
                local,
                comparisons: vec![eq(int(1)), eq(int(3))],
            },
        },
        Ty::BOOL,
        0..0,
        at(),
    );
    let program = assemble(&e, vec![Ty::I32], None).unwrap();
    assert_eq!(
        listing(&program),
        [
            (0, Instruction::LdI4(3)),
            (5, Instruction::StLoc(local)),
            (8, Instruction::LdLoc(local)),
            (11, Instruction::LdI4(1)),
            (16, Instruction::Ceq),
            (17, Instruction::branch(BranchKind::IfTrue, BranchForm::Short, 14)),
            (19, Instruction::LdLoc(local)),
            (22, Instruction::LdI4(3)),
            (27, Instruction::Ceq),
            (28, Instruction::branch(BranchKind::IfTrue, BranchForm::Short, 3)),
            (30, Instruction::LdFalse),
            (31, Instruction::branch(BranchKind::Always, BranchForm::Short, 1)),
            (33, Instruction::LdTrue),
            (34, Instruction::Ret),
        ]
    );
}

#[test]
fn unrolled_power() {
    let power = |exponent: u32| {
        Element::new(
            ElementKind::Arithmetic {
                op: ArithmeticOp::Power,
                left: Box::new(int(2)),
                right: Box::new(int(exponent as i32)),
                code: ArithmeticCode::Unrolled {
                    kind: PrimitiveKind::Int32,
                    exponent,
                    mul: Instruction::Mul,
                },
            },
            Ty::I32,
            0..0,
            at(),
        )
    };
    let program = assemble(&power(3), vec![], None).unwrap();
    assert_eq!(
        listing(&program),
        [
            (0, Instruction::LdI4(2)),
            (5, Instruction::Dup),
            (6, Instruction::Dup),
            (7, Instruction::Mul),
            (8, Instruction::Mul),
            (9, Instruction::Ret),
        ]
    );

    let program = assemble(&power(0), vec![], None).unwrap();
    assert_eq!(
        listing(&program),
        [(0, Instruction::LdI4(1)), (5, Instruction::Ret)]
    );
}

#[test]
fn large_power_squares_and_multiplies() {
    let power = Element::new(
        ElementKind::Arithmetic {
            op: ArithmeticOp::Power,
            left: Box::new(int(3)),
            right: Box::new(int(70)),
            code: ArithmeticCode::Unrolled {
                kind: PrimitiveKind::Int32,
                exponent: 70,
                mul: Instruction::Mul,
            },
        },
        Ty::I32,
        0..0,
        at(),
    );
    let program = assemble(&power, vec![], None).unwrap();
    let code: Vec<Instruction> = listing(&program).into_iter().map(|(_, i)| i).collect();
    // 70 = 0b1000110: two spare copies of the base, six squarings, two multiplies
    let expected: Vec<Instruction> = [Instruction::LdI4(3), Instruction::Dup, Instruction::Dup]
        .into_iter()
        .chain([0, 0, 0, 1, 1, 0].into_iter().flat_map(|bit| {
            let square = [Instruction::Dup, Instruction::Mul];
            square.into_iter().chain((bit == 1).then_some(Instruction::Mul))
        }))
        .chain([Instruction::Ret])
        .collect();
    assert_eq!(code, expected);
}

#[test]
fn variables_are_interned_once() {
    let x = || Element::new(ElementKind::Variable("x".into()), Ty::I32, 0..0, at());
    let program = assemble(&add(x(), x()), vec![], None).unwrap();
    assert_eq!(program.variables().len(), 1);
    assert_eq!(program.variables()[0].name, "x");
}
