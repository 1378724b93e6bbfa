//! A compiled expression, ready to evaluate.

use std::sync::Arc;

use rill_bytecode::{Program, dump};
use rill_core::{Colors, Ty, TypeCatalog, Value};
use rill_vm::{ExecLimits, NoopTracer, PrintTracer, Tracer, VM, Verbosity};

use crate::Result;
use crate::variables::VariableValues;

/// Source text plus its immutable `Program`.
///
/// Clones share the program. Evaluation builds a fresh VM each time, so one
/// `Expression` can be evaluated from several threads at once.
#[derive(Clone)]
pub struct Expression {
    source: Arc<str>,
    program: Arc<Program>,
    catalog: Arc<dyn TypeCatalog>,
    case_sensitive: bool,
    limits: ExecLimits,
}

/// Outcome of a traced evaluation.
#[derive(Debug)]
pub struct Traced {
    pub result: Result<Value>,
    /// One line per executed instruction.
    pub lines: Vec<String>,
}

impl Expression {
    pub(crate) fn new(
        source: &str,
        program: Program,
        catalog: Arc<dyn TypeCatalog>,
        case_sensitive: bool,
    ) -> Self {
        Self {
            source: source.into(),
            program: Arc::new(program),
            catalog,
            case_sensitive,
            limits: ExecLimits::default(),
        }
    }

    pub fn limits(mut self, limits: ExecLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn result_type(&self) -> &Ty {
        self.program.result_type()
    }

    /// Variables the expression reads, in first-use order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Ty)> {
        self.program
            .variables()
            .iter()
            .map(|slot| (slot.name.as_str(), &slot.ty))
    }

    pub fn evaluate(&self, values: &VariableValues) -> Result<Value> {
        self.run(values, None, &mut NoopTracer)
    }

    /// Evaluate with `owner` as the receiver of unqualified instance members.
    pub fn evaluate_for(&self, owner: Value, values: &VariableValues) -> Result<Value> {
        self.run(values, Some(owner), &mut NoopTracer)
    }

    /// Evaluate while recording every executed instruction.
    pub fn trace(
        &self,
        values: &VariableValues,
        owner: Option<Value>,
        verbosity: Verbosity,
        colors: Colors,
    ) -> Traced {
        let mut tracer =
            PrintTracer::new(&self.program, self.catalog.as_ref(), verbosity, colors);
        let result = self.run(values, owner, &mut tracer);
        Traced {
            result,
            lines: tracer.lines().to_vec(),
        }
    }

    /// Disassembly of the program.
    pub fn dump(&self, colors: Colors) -> String {
        dump(&self.program, self.catalog.as_ref(), colors)
    }

    fn run<T: Tracer>(
        &self,
        values: &VariableValues,
        owner: Option<Value>,
        tracer: &mut T,
    ) -> Result<Value> {
        let bound = values.bind(&self.program, self.catalog.as_ref(), self.case_sensitive)?;
        let mut builder = VM::builder(&self.program)
            .catalog(self.catalog.as_ref())
            .variables(&bound)
            .limits(self.limits);
        if let Some(owner) = owner {
            builder = builder.owner(owner);
        }
        let value = builder.build().execute_with(tracer)?;
        Ok(value)
    }
}

impl std::fmt::Debug for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expression")
            .field("source", &self.source)
            .field("result_type", self.program.result_type())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
