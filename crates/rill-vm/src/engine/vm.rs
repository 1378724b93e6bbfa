//! Virtual machine for evaluating compiled programs.

use rill_bytecode::{BranchKind, Instruction, Program, StringComparison};
use rill_core::{Ty, TypeCatalog, Value};

use super::error::RuntimeError;
use super::ops::{self, Arith, Bitwise};
use super::trace::{NoopTracer, Tracer};

/// Runtime limits for one evaluation.
#[derive(Clone, Copy, Debug)]
pub struct ExecLimits {
    /// Maximum operand stack depth (default: 1,024).
    pub(crate) max_stack: u32,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self { max_stack: 1024 }
    }
}

impl ExecLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_stack(mut self, depth: u32) -> Self {
        self.max_stack = depth;
        self
    }

    pub fn get_max_stack(&self) -> u32 {
        self.max_stack
    }
}

/// Builder for VM instances.
pub struct VMBuilder<'p> {
    program: &'p Program,
    catalog: Option<&'p dyn TypeCatalog>,
    variables: &'p [Option<Value>],
    owner: Option<Value>,
    limits: ExecLimits,
}

impl<'p> VMBuilder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            catalog: None,
            variables: &[],
            owner: None,
            limits: ExecLimits::default(),
        }
    }

    /// Catalog consulted by downcasts. Without one, a downcast succeeds only
    /// on an exact runtime type match.
    pub fn catalog(mut self, catalog: &'p dyn TypeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Values indexed like `Program::variables`.
    pub fn variables(mut self, values: &'p [Option<Value>]) -> Self {
        self.variables = values;
        self
    }

    pub fn owner(mut self, owner: Value) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn limits(mut self, limits: ExecLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> VM<'p> {
        VM {
            program: self.program,
            catalog: self.catalog,
            variables: self.variables,
            owner: self.owner,
            limits: self.limits,
            stack: Vec::new(),
            locals: vec![Value::Null; self.program.locals().len()],
            ip: 0,
        }
    }
}

/// Evaluation state for one run of a program.
pub struct VM<'p> {
    program: &'p Program,
    catalog: Option<&'p dyn TypeCatalog>,
    variables: &'p [Option<Value>],
    owner: Option<Value>,
    limits: ExecLimits,
    stack: Vec<Value>,
    locals: Vec<Value>,
    /// Offset of the instruction being executed.
    ip: u32,
}

impl<'p> VM<'p> {
    pub fn builder(program: &'p Program) -> VMBuilder<'p> {
        VMBuilder::new(program)
    }

    /// Run to `Ret` and return the result.
    pub fn execute(self) -> Result<Value, RuntimeError> {
        self.execute_with(&mut NoopTracer)
    }

    /// Run with a tracer observing every instruction.
    pub fn execute_with<T: Tracer>(mut self, tracer: &mut T) -> Result<Value, RuntimeError> {
        let end = self.program.code().len();
        loop {
            let at = self.ip as usize;
            if at >= end {
                return Err(RuntimeError::InvalidProgram(
                    "execution ran past the end of the code".into(),
                ));
            }
            let instr = self.program.decode_at(at)?;
            tracer.trace_instruction(self.ip, &instr);
            let next = self.ip + instr.size();

            match instr {
                Instruction::Ret => {
                    let value = self.pop()?;
                    if !self.stack.is_empty() {
                        return Err(RuntimeError::InvalidProgram(format!(
                            "{} values left on the stack at return",
                            self.stack.len()
                        )));
                    }
                    tracer.trace_return(&value);
                    return Ok(value);
                }
                Instruction::Branch { kind, .. } => {
                    let taken = match kind {
                        BranchKind::Always => true,
                        BranchKind::IfTrue => self.pop_bool()?,
                        BranchKind::IfFalse => !self.pop_bool()?,
                    };
                    tracer.trace_branch(taken);
                    self.ip = match instr.branch_target(self.ip) {
                        Some(target) if taken => target as u32,
                        _ => next,
                    };
                    continue;
                }
                _ => self.step(instr, tracer)?,
            }
            tracer.trace_stack(&self.stack);
            self.ip = next;
        }
    }

    fn step<T: Tracer>(&mut self, instr: Instruction, tracer: &mut T) -> Result<(), RuntimeError> {
        let program = self.program;
        match instr {
            Instruction::Nop => {}
            Instruction::LdNull => self.push(Value::Null)?,
            Instruction::LdTrue => self.push(Value::Bool(true))?,
            Instruction::LdFalse => self.push(Value::Bool(false))?,
            Instruction::LdI4(v) => self.push(Value::I32(v))?,
            Instruction::LdI8(v) => self.push(Value::I64(v))?,
            Instruction::LdR4(v) => self.push(Value::F32(v))?,
            Instruction::LdR8(v) => self.push(Value::F64(v))?,
            Instruction::LdConst(id) => self.push(program.constant(id).clone())?,
            Instruction::LdVar(id) => {
                let value = match self.variables.get(id.index()) {
                    Some(Some(v)) => v.clone(),
                    _ => {
                        let name = program.variable(id).name.clone();
                        return Err(RuntimeError::MissingVariable(name));
                    }
                };
                self.push(value)?;
            }
            Instruction::LdOwner => {
                let owner = self.owner.clone().ok_or(RuntimeError::NullReference)?;
                self.push(owner)?;
            }
            Instruction::LdLoc(id) => {
                let value = self.local(id.index())?.clone();
                self.push(value)?;
            }
            Instruction::StLoc(id) => {
                let value = self.pop()?;
                *self.local(id.index())? = value;
            }
            Instruction::Dup => {
                let top = self.stack.last().cloned().ok_or(self.underflow())?;
                self.push(top)?;
            }
            Instruction::Pop => {
                self.pop()?;
            }

            Instruction::Add => self.arith(Arith::Add, false)?,
            Instruction::AddOvf | Instruction::AddOvfUn => self.arith(Arith::Add, true)?,
            Instruction::Sub => self.arith(Arith::Sub, false)?,
            Instruction::SubOvf | Instruction::SubOvfUn => self.arith(Arith::Sub, true)?,
            Instruction::Mul => self.arith(Arith::Mul, false)?,
            Instruction::MulOvf | Instruction::MulOvfUn => self.arith(Arith::Mul, true)?,
            Instruction::Div | Instruction::DivUn => self.arith(Arith::Div, false)?,
            Instruction::Rem | Instruction::RemUn => self.arith(Arith::Rem, false)?,
            Instruction::Neg => self.unary(ops::negate)?,
            Instruction::Pow => self.binary(ops::power)?,

            Instruction::And => self.binary(|a, b| ops::bitwise(Bitwise::And, a, b))?,
            Instruction::Or => self.binary(|a, b| ops::bitwise(Bitwise::Or, a, b))?,
            Instruction::Xor => self.binary(|a, b| ops::bitwise(Bitwise::Xor, a, b))?,
            Instruction::Not => self.unary(ops::not)?,
            Instruction::Shl => self.binary(|a, b| ops::shift(true, a, b))?,
            Instruction::Shr | Instruction::ShrUn => self.binary(|a, b| ops::shift(false, a, b))?,

            Instruction::Ceq => self.binary(|a, b| Ok(Value::Bool(a == b)))?,
            Instruction::Cgt => self.ordering(|o| o.is_some_and(|o| o.is_gt()))?,
            Instruction::CgtUn => self.ordering(|o| o.is_none_or(|o| o.is_gt()))?,
            Instruction::Clt => self.ordering(|o| o.is_some_and(|o| o.is_lt()))?,
            Instruction::CltUn => self.ordering(|o| o.is_none_or(|o| o.is_lt()))?,
            Instruction::StrEq(mode) => self.string_equals(mode)?,
            Instruction::Concat => self.binary(|a, b| Ok(Value::string(format!("{a}{b}"))))?,

            Instruction::Conv(kind) => self.unary(|v| ops::convert(v, kind, false))?,
            Instruction::ConvOvf(kind) | Instruction::ConvOvfUn(kind) => {
                self.unary(|v| ops::convert(v, kind, true))?
            }
            // Values carry their runtime type already.
            Instruction::Box(_) => {}
            Instruction::UnboxAny(t) => {
                let ty = program.type_ref(t);
                self.unary(|v| unbox(v, ty))?;
            }
            Instruction::CastClass(t) => {
                let ty = program.type_ref(t);
                let catalog = self.catalog;
                self.unary(|v| cast_class(v, ty, catalog))?;
            }
            Instruction::ToEnum(t) => {
                let ty = program.type_ref(t);
                self.unary(|v| ops::to_enum(v, ty))?;
            }
            Instruction::NewArray(t, count) => {
                let count = count as usize;
                if self.stack.len() < count {
                    return Err(self.underflow());
                }
                let items = self.stack.split_off(self.stack.len() - count);
                self.push(Value::array(program.type_ref(t).clone(), items))?;
            }
            Instruction::LdElem => self.binary(load_element)?,
            Instruction::ArrayContains => self.binary(|array, probe| match array {
                Value::Array(a) => Ok(Value::Bool(a.items.contains(&probe))),
                Value::Null => Err(RuntimeError::NullReference),
                other => Err(not_a(&other, "array")),
            })?,
            Instruction::StrChar => self.binary(string_char)?,

            Instruction::Call(id) => {
                let m = program.member(id);
                let argc = m.argc as usize;
                if self.stack.len() < argc {
                    return Err(self.underflow());
                }
                let args = self.stack.split_off(self.stack.len() - argc);
                let receiver = if m.receiver {
                    match self.pop()? {
                        Value::Null => return Err(RuntimeError::NullReference),
                        r => Some(r),
                    }
                } else {
                    None
                };
                tracer.trace_call(&m.member, receiver.as_ref(), &args);
                let result = m.member.invoke(receiver.as_ref(), &args).map_err(|e| {
                    RuntimeError::Host {
                        member: m.member.name.clone(),
                        message: e.0,
                    }
                })?;
                self.push(result)?;
            }

            Instruction::Branch { .. } | Instruction::Ret => {
                return Err(RuntimeError::InvalidProgram(format!(
                    "control instruction dispatched as a step at {}",
                    self.ip
                )));
            }
        }
        Ok(())
    }

    fn underflow(&self) -> RuntimeError {
        RuntimeError::StackUnderflow { offset: self.ip }
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.limits.max_stack as usize {
            return Err(RuntimeError::StackLimitExceeded(self.limits.max_stack));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(self.underflow())
    }

    fn pop_bool(&mut self) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(not_a(&other, "Boolean")),
        }
    }

    fn local(&mut self, index: usize) -> Result<&mut Value, RuntimeError> {
        self.locals
            .get_mut(index)
            .ok_or_else(|| RuntimeError::InvalidProgram(format!("local {index} out of range")))
    }

    fn unary(
        &mut self,
        f: impl FnOnce(Value) -> Result<Value, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let v = self.pop()?;
        let r = f(v)?;
        self.push(r)
    }

    fn binary(
        &mut self,
        f: impl FnOnce(Value, Value) -> Result<Value, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let r = f(a, b)?;
        self.push(r)
    }

    fn arith(&mut self, op: Arith, checked: bool) -> Result<(), RuntimeError> {
        self.binary(|a, b| ops::arithmetic(op, checked, a, b))
    }

    fn ordering(
        &mut self,
        test: impl FnOnce(Option<std::cmp::Ordering>) -> bool,
    ) -> Result<(), RuntimeError> {
        self.binary(|a, b| Ok(Value::Bool(test(ops::compare(&a, &b)?))))
    }

    fn string_equals(&mut self, mode: StringComparison) -> Result<(), RuntimeError> {
        self.binary(|a, b| Ok(Value::Bool(ops::string_equals(&a, &b, mode)?)))
    }
}

fn not_a(v: &Value, what: &str) -> RuntimeError {
    RuntimeError::InvalidProgram(format!("expected {what}, found `{}`", v.runtime_type()))
}

fn index_of(index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let Some(i) = index.as_i128() else {
        return Err(not_a(index, "an integral index"));
    };
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or(RuntimeError::IndexOutOfRange {
            index: i as i64,
            len,
        })
}

fn load_element(target: Value, index: Value) -> Result<Value, RuntimeError> {
    match target {
        Value::Array(a) => {
            let i = index_of(&index, a.items.len())?;
            Ok(a.items[i].clone())
        }
        Value::Null => Err(RuntimeError::NullReference),
        other => Err(not_a(&other, "array")),
    }
}

fn string_char(target: Value, index: Value) -> Result<Value, RuntimeError> {
    match target {
        Value::String(s) => {
            let len = s.chars().count();
            let i = index_of(&index, len)?;
            s.chars()
                .nth(i)
                .map(Value::Char)
                .ok_or(RuntimeError::IndexOutOfRange { index: i as i64, len })
        }
        Value::Null => Err(RuntimeError::NullReference),
        other => Err(not_a(&other, "String")),
    }
}

fn cast_error(v: &Value, to: &Ty) -> RuntimeError {
    RuntimeError::InvalidCast {
        from: v.runtime_type().to_string(),
        to: to.to_string(),
    }
}

/// Unboxing requires the exact runtime type.
fn unbox(v: Value, ty: &Ty) -> Result<Value, RuntimeError> {
    if v.is_null() {
        return Err(RuntimeError::NullReference);
    }
    if &v.runtime_type() != ty {
        return Err(cast_error(&v, ty));
    }
    Ok(v)
}

/// Downcast; `null` passes through.
fn cast_class(v: Value, ty: &Ty, catalog: Option<&dyn TypeCatalog>) -> Result<Value, RuntimeError> {
    if v.is_null() || matches!(ty, Ty::Object) {
        return Ok(v);
    }
    let actual = v.runtime_type();
    let ok = match catalog {
        Some(catalog) => catalog.is_assignable(&actual, ty),
        None => &actual == ty,
    };
    if ok { Ok(v) } else { Err(cast_error(&v, ty)) }
}
