//! Runtime VM for executing compiled rill programs.
//!
//! A `VM` evaluates one `Program` once against bound variable values and an
//! optional owner object. Programs are immutable; run as many VMs over the
//! same program as needed, from any thread.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![allow(clippy::comparison_chain)]

pub mod engine;

pub use engine::{
    ExecLimits, NoopTracer, PrintTracer, RuntimeError, Tracer, VM, VMBuilder, Verbosity,
};
