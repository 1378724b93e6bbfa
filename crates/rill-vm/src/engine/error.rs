//! Errors that can occur while evaluating a program.

use rill_bytecode::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// Checked arithmetic or a checked conversion left the target range.
    #[error("arithmetic operation resulted in an overflow")]
    Overflow,

    #[error("attempted to divide by zero")]
    DivideByZero,

    #[error("cannot cast `{from}` to `{to}`")]
    InvalidCast { from: String, to: String },

    #[error("object reference is null")]
    NullReference,

    #[error("index {index} is outside the bounds of a {len}-element sequence")]
    IndexOutOfRange { index: i64, len: usize },

    /// A host member body failed.
    #[error("`{member}` failed: {message}")]
    Host { member: String, message: String },

    #[error("invalid program: {0}")]
    InvalidProgram(String),

    #[error("stack underflow at offset {offset}")]
    StackUnderflow { offset: u32 },

    #[error("stack depth limit of {0} exceeded")]
    StackLimitExceeded(u32),

    #[error("variable `{0}` has no value")]
    MissingVariable(String),
}

impl From<DecodeError> for RuntimeError {
    fn from(e: DecodeError) -> Self {
        Self::InvalidProgram(e.to_string())
    }
}
