//! Bytecode format for compiled rill expressions.
//!
//! This crate contains:
//! - The instruction set (`Instruction`, `Opcode`) and its byte encoding
//! - Instruction sinks: `MeasuringSink` for layout passes, `BytecodeWriter`
//!   for real output
//! - The `Program` container with its constant, type and member tables
//! - A human-readable disassembler (`dump`)

#![allow(clippy::comparison_chain)]

pub mod bytecode;

pub use bytecode::{
    BranchForm, BranchKind, BytecodeWriter, ConstId, DecodeError, Instruction, InstructionSink,
    Instructions, LocalId, MeasuringSink, MemberId, MemberRef, Opcode, Program, ProgramTables,
    StringComparison, TypeRef, VariableId, VariableSlot, dump, format_instruction,
};
