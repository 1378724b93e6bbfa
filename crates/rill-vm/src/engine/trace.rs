//! Execution tracing.
//!
//! `Tracer` methods receive raw data the VM already holds; formatting happens
//! in the implementation. `NoopTracer` compiles to nothing, so `VM::execute`
//! pays no cost for the hooks.

use rill_bytecode::{Instruction, Program, format_instruction};
use rill_core::{Colors, MemberDescriptor, Paint, TypeCatalog, Value};

/// How much `PrintTracer` shows per instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Instruction and the value on top of the stack.
    #[default]
    Default,
    /// Whole stack, plus a sub-line for every host call.
    Verbose,
}

/// Hooks called during execution:
/// - `trace_instruction` before an instruction runs
/// - `trace_stack` after a non-branching instruction ran
/// - `trace_branch` after a branch was taken or not
/// - `trace_call` just before a host member is invoked
/// - `trace_return` when `Ret` produces the result
pub trait Tracer {
    fn trace_instruction(&mut self, offset: u32, instr: &Instruction);

    fn trace_stack(&mut self, stack: &[Value]);

    fn trace_branch(&mut self, taken: bool);

    fn trace_call(&mut self, member: &MemberDescriptor, receiver: Option<&Value>, args: &[Value]);

    fn trace_return(&mut self, value: &Value);
}

/// Tracer that does nothing.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_instruction(&mut self, _offset: u32, _instr: &Instruction) {}

    #[inline(always)]
    fn trace_stack(&mut self, _stack: &[Value]) {}

    #[inline(always)]
    fn trace_branch(&mut self, _taken: bool) {}

    #[inline(always)]
    fn trace_call(
        &mut self,
        _member: &MemberDescriptor,
        _receiver: Option<&Value>,
        _args: &[Value],
    ) {
    }

    #[inline(always)]
    fn trace_return(&mut self, _value: &Value) {}
}

/// Tracer that collects one line per executed instruction.
pub struct PrintTracer<'p> {
    program: &'p Program,
    catalog: &'p dyn TypeCatalog,
    verbosity: Verbosity,
    colors: Colors,
    lines: Vec<String>,
    /// Instruction line waiting for its outcome.
    pending: Option<String>,
    /// Host call sub-lines of the pending instruction.
    calls: Vec<String>,
}

impl<'p> PrintTracer<'p> {
    pub fn new(
        program: &'p Program,
        catalog: &'p dyn TypeCatalog,
        verbosity: Verbosity,
        colors: Colors,
    ) -> Self {
        Self {
            program,
            catalog,
            verbosity,
            colors,
            lines: Vec::new(),
            pending: None,
            calls: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Collected trace, newline-terminated.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn finish(&mut self, outcome: String) {
        let Some(line) = self.pending.take() else {
            return;
        };
        if outcome.is_empty() {
            self.lines.push(line);
        } else {
            self.lines.push(format!("{line}  {outcome}"));
        }
        self.lines.append(&mut self.calls);
    }

    fn stack_text(&self, stack: &[Value]) -> String {
        let c = self.colors;
        match self.verbosity {
            Verbosity::Default => match stack.last() {
                Some(top) => format!("{} {}", c.paint(Paint::Muted, "->"), top.format(c)),
                None => String::new(),
            },
            Verbosity::Verbose => {
                let items: Vec<String> = stack.iter().map(|v| v.format(c)).collect();
                let depth = c.paint(Paint::Muted, format_args!("[{}]", stack.len()));
                format!("{depth} {}", items.join(" "))
            }
        }
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_instruction(&mut self, offset: u32, instr: &Instruction) {
        self.finish(String::new());
        let text = format_instruction(self.program, self.catalog, offset, instr, self.colors);
        let offset = self.colors.paint(Paint::Muted, format_args!("{offset:04}"));
        self.pending = Some(format!("{offset}  {text}"));
    }

    fn trace_stack(&mut self, stack: &[Value]) {
        let text = self.stack_text(stack);
        self.finish(text);
    }

    fn trace_branch(&mut self, taken: bool) {
        let text = if taken { "taken" } else { "not taken" };
        self.finish(self.colors.paint(Paint::Muted, format_args!("({text})")));
    }

    fn trace_call(&mut self, member: &MemberDescriptor, receiver: Option<&Value>, args: &[Value]) {
        if self.verbosity != Verbosity::Verbose {
            return;
        }
        let c = self.colors;
        let args: Vec<String> = args.iter().map(|v| v.format(c)).collect();
        let target = match receiver {
            Some(r) => r.format(c),
            None => self.catalog.type_name(&member.declaring),
        };
        self.calls.push(format!(
            "        {} {target}.{}({})",
            c.paint(Paint::Opcode, "call"),
            member.name,
            args.join(", ")
        ));
    }

    fn trace_return(&mut self, value: &Value) {
        let c = self.colors;
        let text = format!("{} {}", c.paint(Paint::Muted, "=>"), value.format(c));
        self.finish(text);
    }
}
