//! Instruction sinks.
//!
//! Code generation is written against `InstructionSink` so the same emission
//! can run twice: once into a `MeasuringSink` to learn instruction offsets,
//! once into a `BytecodeWriter` for the real bytes.

use super::instructions::Instruction;

/// Destination for emitted instructions.
pub trait InstructionSink {
    /// Byte offset at which the next instruction lands.
    fn offset(&self) -> u32;

    fn emit(&mut self, instr: Instruction);
}

/// Records sizes only.
#[derive(Debug, Default)]
pub struct MeasuringSink {
    offset: u32,
    count: usize,
}

impl MeasuringSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instructions seen.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl InstructionSink for MeasuringSink {
    fn offset(&self) -> u32 {
        self.offset
    }

    fn emit(&mut self, instr: Instruction) {
        self.offset += instr.size();
        self.count += 1;
    }
}

/// Encodes instructions into a byte buffer.
#[derive(Debug, Default)]
pub struct BytecodeWriter {
    code: Vec<u8>,
}

impl BytecodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_code(self) -> Vec<u8> {
        self.code
    }
}

impl InstructionSink for BytecodeWriter {
    fn offset(&self) -> u32 {
        self.code.len() as u32
    }

    fn emit(&mut self, instr: Instruction) {
        instr.encode(&mut self.code);
    }
}
