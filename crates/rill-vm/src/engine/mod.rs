//! Runtime engine: instruction dispatch, value operations and tracing.

mod error;
mod ops;
mod trace;
mod vm;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod ops_tests;

pub use error::RuntimeError;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use vm::{ExecLimits, VM, VMBuilder};
