//! Instruction set, sinks and program container.

mod dump;
mod ids;
mod instructions;
mod program;
mod sink;

#[cfg(test)]
mod dump_tests;

pub use dump::{dump, format_instruction};
pub use ids::{ConstId, LocalId, MemberId, TypeRef, VariableId};
pub use instructions::{BranchForm, BranchKind, DecodeError, Instruction, Opcode, StringComparison};
pub use program::{Instructions, MemberRef, Program, ProgramTables, VariableSlot};
pub use sink::{BytecodeWriter, InstructionSink, MeasuringSink};
