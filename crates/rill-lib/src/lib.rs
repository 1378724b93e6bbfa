//! Rill: typed expressions compiled once, evaluated many times.
//!
//! # Example
//!
//! ```
//! use rill::{ExpressionContext, Ty, Value, VariableValues};
//!
//! let context = ExpressionContext::new().variable("x", Ty::I32);
//! let expression = context.compile("x * 2 + 1").expect("valid expression");
//!
//! let values = VariableValues::new().with("x", Value::I32(20));
//! assert_eq!(expression.evaluate(&values).unwrap(), Value::I32(41));
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod context;
mod expression;
mod variables;

#[cfg(test)]
mod expression_tests;

pub use context::ExpressionContext;
pub use expression::{Expression, Traced};
pub use variables::VariableValues;

pub use rill_bytecode::{Program, StringComparison};
pub use rill_compiler::{CompileOptions, ExpressionCompiler};
pub use rill_core::{
    Colors, HostCatalog, HostCatalogBuilder, HostError, HostObject, HostType, HostTypeId,
    MemberDescriptor, Paint, PrimitiveKind, Ty, TypeCatalog, Value,
};
pub use rill_vm::{ExecLimits, RuntimeError, Verbosity};

/// Errors from compiling or evaluating an expression.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] rill_compiler::Error),

    #[error("evaluation failed: {0}")]
    Runtime(#[from] RuntimeError),

    /// A bound value does not fit the declared variable type.
    #[error("variable `{name}` is declared `{expected}` but bound to `{actual}`")]
    VariableType {
        name: String,
        expected: String,
        actual: String,
    },
}

impl Error {
    /// Rustc-style snippet for compile errors, plain text otherwise.
    pub fn render(&self, source: &str) -> String {
        match self {
            Error::Compile(e) => e.render(source),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
