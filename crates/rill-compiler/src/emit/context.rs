use rill_bytecode::{BranchKind, Instruction, InstructionSink, ProgramTables};

use super::EmitError;
use super::branch::{BranchManager, Label};

/// One emission pass: a sink, the shared operand tables and the branch plan.
pub struct EmitContext<'a> {
    sink: &'a mut dyn InstructionSink,
    tables: &'a mut ProgramTables,
    branches: &'a mut BranchManager,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        sink: &'a mut dyn InstructionSink,
        tables: &'a mut ProgramTables,
        branches: &'a mut BranchManager,
    ) -> Self {
        Self {
            sink,
            tables,
            branches,
        }
    }

    pub fn emit(&mut self, instr: Instruction) {
        self.sink.emit(instr);
    }

    pub fn offset(&self) -> u32 {
        self.sink.offset()
    }

    pub fn tables(&mut self) -> &mut ProgramTables {
        self.tables
    }

    pub fn define_label(&mut self) -> Result<Label, EmitError> {
        self.branches.define_label()
    }

    pub fn mark_label(&mut self, label: Label) -> Result<(), EmitError> {
        let offset = self.sink.offset();
        self.branches.mark_label(label, offset)
    }

    pub fn branch(&mut self, kind: BranchKind, label: Label) -> Result<(), EmitError> {
        let offset = self.sink.offset();
        let instr = self.branches.branch(kind, label, offset)?;
        self.sink.emit(instr);
        Ok(())
    }
}
