use rill_bytecode::{BranchForm, BranchKind, Instruction};

use super::{BranchManager, EmitError};

/// Measure one forward branch at `at` to a label marked at `target`.
fn single(at: u32, target: u32) -> BranchManager {
    let mut m = BranchManager::new();
    let label = m.define_label().unwrap();
    m.branch(BranchKind::Always, label, at).unwrap();
    m.mark_label(label, target).unwrap();
    m.compute().unwrap();
    m
}

#[test]
fn measuring_pass_emits_short_placeholders() {
    let mut m = BranchManager::new();
    let label = m.define_label().unwrap();
    let instr = m.branch(BranchKind::IfTrue, label, 7).unwrap();
    assert_eq!(instr, Instruction::branch(BranchKind::IfTrue, BranchForm::Short, 0));
}

#[test]
fn displacement_boundary() {
    // Short branch ends at 2: 129 - 2 = 127 fits an i8, 130 - 2 does not.
    assert_eq!(single(0, 129).long_count(), 0);
    assert_eq!(single(0, 130).long_count(), 1);
}

#[test]
fn write_pass_short_branch() {
    let mut m = single(0, 100);
    m.begin_write();
    let label = m.define_label().unwrap();
    let instr = m.branch(BranchKind::Always, label, 0).unwrap();
    assert_eq!(instr, Instruction::branch(BranchKind::Always, BranchForm::Short, 98));
    m.mark_label(label, 100).unwrap();
    m.finish().unwrap();
}

#[test]
fn write_pass_long_branch_shifts_label() {
    let mut m = single(0, 200);
    m.begin_write();
    let label = m.define_label().unwrap();
    let instr = m.branch(BranchKind::IfFalse, label, 0).unwrap();
    assert_eq!(instr, Instruction::branch(BranchKind::IfFalse, BranchForm::Long, 198));
    m.mark_label(label, 203).unwrap();
    m.finish().unwrap();
}

#[test]
fn widening_cascades() {
    let mut m = BranchManager::new();
    let outer = m.define_label().unwrap();
    let inner = m.define_label().unwrap();
    m.branch(BranchKind::IfFalse, outer, 0).unwrap();
    m.branch(BranchKind::Always, inner, 10).unwrap();
    m.mark_label(outer, 127).unwrap();
    m.mark_label(inner, 200).unwrap();
    m.compute().unwrap();
    // `inner` goes long first, which pushes `outer` past the i8 range.
    assert_eq!(m.long_count(), 2);

    m.begin_write();
    let outer = m.define_label().unwrap();
    let inner = m.define_label().unwrap();
    assert_eq!(
        m.branch(BranchKind::IfFalse, outer, 0).unwrap(),
        Instruction::branch(BranchKind::IfFalse, BranchForm::Long, 128)
    );
    assert_eq!(
        m.branch(BranchKind::Always, inner, 13).unwrap(),
        Instruction::branch(BranchKind::Always, BranchForm::Long, 188)
    );
    m.mark_label(outer, 133).unwrap();
    m.mark_label(inner, 206).unwrap();
    m.finish().unwrap();
}

#[test]
fn compute_is_idempotent() {
    let mut m = single(0, 300);
    let predicted = m.predict(300);
    m.compute().unwrap();
    assert_eq!(m.long_count(), 1);
    assert_eq!(m.predict(300), predicted);
}

#[test]
fn unmarked_label() {
    let mut m = BranchManager::new();
    let label = m.define_label().unwrap();
    m.branch(BranchKind::Always, label, 0).unwrap();
    assert_eq!(m.compute(), Err(EmitError::UnmarkedLabel(0)));
}

#[test]
fn label_mismatch_is_reported() {
    let mut m = single(0, 100);
    m.begin_write();
    let label = m.define_label().unwrap();
    m.branch(BranchKind::Always, label, 0).unwrap();
    assert_eq!(
        m.mark_label(label, 101),
        Err(EmitError::LabelMismatch {
            label: 0,
            expected: 100,
            actual: 101
        })
    );
}

#[test]
fn branch_mismatch_is_reported() {
    let mut m = single(4, 100);
    m.begin_write();
    let label = m.define_label().unwrap();
    assert_eq!(
        m.branch(BranchKind::Always, label, 5),
        Err(EmitError::BranchMismatch {
            index: 0,
            expected: 4,
            actual: 5
        })
    );
}

#[test]
fn incomplete_replay() {
    let mut m = single(0, 10);
    m.begin_write();
    m.define_label().unwrap();
    assert!(matches!(m.finish(), Err(EmitError::Internal(_))));
}
