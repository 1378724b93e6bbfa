use rill_bytecode::DecodeError;

/// Errors raised while assembling bytecode.
///
/// Everything but `Program` means the measuring and writing passes
/// disagreed, which is a compiler bug rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("label {label} predicted at {expected}, marked at {actual}")]
    LabelMismatch { label: u32, expected: u32, actual: u32 },

    #[error("branch {index} predicted at {expected}, emitted at {actual}")]
    BranchMismatch {
        index: usize,
        expected: u32,
        actual: u32,
    },

    #[error("label {0} is referenced but never marked")]
    UnmarkedLabel(u32),

    #[error("invalid program: {0}")]
    Program(#[from] DecodeError),

    #[error("internal emit error: {0}")]
    Internal(String),
}
