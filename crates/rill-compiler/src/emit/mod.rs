//! Bytecode assembly from typed elements.
//!
//! Two passes over the same element tree:
//! - measure: emit into a `MeasuringSink` with every branch short
//! - write: emit into a `BytecodeWriter` with the branch forms settled by
//!   `BranchManager::compute`
//!
//! Operand tables are interned once and shared by both passes.

mod branch;
mod codegen;
mod context;
mod error;

#[cfg(test)]
mod branch_tests;
#[cfg(test)]
mod emit_tests;

use rill_bytecode::{
    BytecodeWriter, Instruction, InstructionSink, MeasuringSink, Program, ProgramTables,
};
use rill_core::Ty;

use crate::elements::Element;

pub use branch::{BranchManager, Label};
pub use codegen::emit_element;
pub use context::EmitContext;
pub use error::EmitError;

fn emit_root(root: &Element, cx: &mut EmitContext<'_>) -> Result<(), EmitError> {
    emit_element(root, cx)?;
    cx.emit(Instruction::Ret);
    Ok(())
}

/// Lower `root` into a verified `Program`.
#[tracing::instrument(level = "debug", skip_all, fields(ty = %root.ty))]
pub fn assemble(
    root: &Element,
    locals: Vec<Ty>,
    owner: Option<Ty>,
) -> Result<Program, EmitError> {
    let mut tables = ProgramTables::new();
    let mut branches = BranchManager::new();

    let mut measure = MeasuringSink::new();
    emit_root(
        root,
        &mut EmitContext::new(&mut measure, &mut tables, &mut branches),
    )?;
    branches.compute()?;

    branches.begin_write();
    let mut writer = BytecodeWriter::new();
    emit_root(
        root,
        &mut EmitContext::new(&mut writer, &mut tables, &mut branches),
    )?;
    branches.finish()?;

    let expected = branches.predict(measure.offset());
    let actual = writer.code().len() as u32;
    if expected != actual {
        return Err(EmitError::Internal(format!(
            "predicted {expected} bytes, wrote {actual}"
        )));
    }

    tracing::debug!(
        bytes = actual,
        instructions = measure.count(),
        long_branches = branches.long_count(),
        "expression assembled"
    );
    Ok(Program::new(
        writer.into_code(),
        tables,
        locals,
        root.ty.clone(),
        owner,
    )?)
}
