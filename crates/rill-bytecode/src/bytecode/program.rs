//! Compiled program container.
//!
//! A [`Program`] holds encoded code plus the tables its operands index into.
//! Construction verifies every instruction once, so the VM can index tables
//! without bounds surprises.

use std::collections::HashSet;
use std::sync::Arc;

use rill_core::{MemberDescriptor, Ty, Value};

use super::ids::{ConstId, LocalId, MemberId, TypeRef, VariableId};
use super::instructions::{DecodeError, Instruction};

/// Bound host member plus its calling convention.
#[derive(Clone, Debug)]
pub struct MemberRef {
    pub member: Arc<MemberDescriptor>,
    /// A receiver sits below the arguments on the stack.
    pub receiver: bool,
    /// Number of argument values popped, rest array counted as one.
    pub argc: u16,
}

/// A named variable the program reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableSlot {
    pub name: String,
    pub ty: Ty,
}

/// Interned operand tables.
///
/// Interning is idempotent, so a measuring pass and a writing pass over the
/// same expression agree on every index.
#[derive(Clone, Debug, Default)]
pub struct ProgramTables {
    constants: Vec<Value>,
    types: Vec<Ty>,
    members: Vec<MemberRef>,
    variables: Vec<VariableSlot>,
}

fn same_constant(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F32(x), Value::F32(y)) => x.to_bits() == y.to_bits(),
        (Value::F64(x), Value::F64(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

impl ProgramTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_constant(&mut self, value: Value) -> ConstId {
        if let Some(i) = self.constants.iter().position(|c| same_constant(c, &value)) {
            return ConstId(i as u16);
        }
        self.constants.push(value);
        ConstId((self.constants.len() - 1) as u16)
    }

    pub fn intern_type(&mut self, ty: &Ty) -> TypeRef {
        if let Some(i) = self.types.iter().position(|t| t == ty) {
            return TypeRef(i as u16);
        }
        self.types.push(ty.clone());
        TypeRef((self.types.len() - 1) as u16)
    }

    pub fn intern_member(
        &mut self,
        member: &Arc<MemberDescriptor>,
        receiver: bool,
        argc: u16,
    ) -> MemberId {
        let found = self.members.iter().position(|m| {
            Arc::ptr_eq(&m.member, member) && m.receiver == receiver && m.argc == argc
        });
        if let Some(i) = found {
            return MemberId(i as u16);
        }
        self.members.push(MemberRef {
            member: Arc::clone(member),
            receiver,
            argc,
        });
        MemberId((self.members.len() - 1) as u16)
    }

    pub fn intern_variable(&mut self, name: &str, ty: &Ty) -> VariableId {
        if let Some(i) = self.variables.iter().position(|v| v.name == name) {
            return VariableId(i as u16);
        }
        self.variables.push(VariableSlot {
            name: name.to_string(),
            ty: ty.clone(),
        });
        VariableId((self.variables.len() - 1) as u16)
    }

    fn check_sizes(&self) -> Result<(), DecodeError> {
        let limit = u16::MAX as usize + 1;
        for (table, len) in [
            ("constant", self.constants.len()),
            ("type", self.types.len()),
            ("member", self.members.len()),
            ("variable", self.variables.len()),
        ] {
            if len > limit {
                return Err(DecodeError::InvalidOperand {
                    offset: 0,
                    detail: format!("{table} table holds {len} entries"),
                });
            }
        }
        Ok(())
    }
}

/// An immutable, verified program. `Send + Sync`; evaluate it from any
/// number of VMs at once.
#[derive(Debug)]
pub struct Program {
    code: Vec<u8>,
    tables: ProgramTables,
    locals: Vec<Ty>,
    result_type: Ty,
    owner_type: Option<Ty>,
    checksum: u32,
}

impl Program {
    pub fn new(
        code: Vec<u8>,
        tables: ProgramTables,
        locals: Vec<Ty>,
        result_type: Ty,
        owner_type: Option<Ty>,
    ) -> Result<Self, DecodeError> {
        let checksum = crc32fast::hash(&code);
        let program = Self {
            code,
            tables,
            locals,
            result_type,
            owner_type,
            checksum,
        };
        program.verify()?;
        Ok(program)
    }

    fn verify(&self) -> Result<(), DecodeError> {
        self.tables.check_sizes()?;

        let mut boundaries = HashSet::new();
        let mut branches = Vec::new();
        for item in self.instructions() {
            let (offset, instr) = item?;
            boundaries.insert(offset as i64);
            self.check_operands(offset as usize, &instr)?;
            if let Some(target) = instr.branch_target(offset) {
                branches.push((offset as usize, target));
            }
        }
        for (offset, target) in branches {
            if !boundaries.contains(&target) {
                return Err(DecodeError::BadBranchTarget { offset, target });
            }
        }
        Ok(())
    }

    fn check_operands(&self, offset: usize, instr: &Instruction) -> Result<(), DecodeError> {
        let (table, index, len) = match *instr {
            Instruction::LdConst(id) => ("constant", id.index(), self.tables.constants.len()),
            Instruction::LdVar(id) => ("variable", id.index(), self.tables.variables.len()),
            Instruction::LdLoc(id) | Instruction::StLoc(id) => {
                ("local", id.index(), self.locals.len())
            }
            Instruction::Box(t)
            | Instruction::UnboxAny(t)
            | Instruction::CastClass(t)
            | Instruction::ToEnum(t)
            | Instruction::NewArray(t, _) => ("type", t.index(), self.tables.types.len()),
            Instruction::Call(id) => ("member", id.index(), self.tables.members.len()),
            _ => return Ok(()),
        };
        if index >= len {
            return Err(DecodeError::InvalidOperand {
                offset,
                detail: format!("{table} index {index} out of {len}"),
            });
        }
        Ok(())
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Decode the instruction at a byte offset.
    #[inline]
    pub fn decode_at(&self, offset: usize) -> Result<Instruction, DecodeError> {
        Instruction::decode(&self.code, offset)
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            code: &self.code,
            offset: 0,
        }
    }

    pub fn constant(&self, id: ConstId) -> &Value {
        &self.tables.constants[id.index()]
    }

    pub fn constants(&self) -> &[Value] {
        &self.tables.constants
    }

    pub fn type_ref(&self, id: TypeRef) -> &Ty {
        &self.tables.types[id.index()]
    }

    pub fn types(&self) -> &[Ty] {
        &self.tables.types
    }

    pub fn member(&self, id: MemberId) -> &MemberRef {
        &self.tables.members[id.index()]
    }

    pub fn members(&self) -> &[MemberRef] {
        &self.tables.members
    }

    pub fn variable(&self, id: VariableId) -> &VariableSlot {
        &self.tables.variables[id.index()]
    }

    pub fn variables(&self) -> &[VariableSlot] {
        &self.tables.variables
    }

    pub fn local(&self, id: LocalId) -> &Ty {
        &self.locals[id.index()]
    }

    pub fn locals(&self) -> &[Ty] {
        &self.locals
    }

    pub fn result_type(&self) -> &Ty {
        &self.result_type
    }

    pub fn owner_type(&self) -> Option<&Ty> {
        self.owner_type.as_ref()
    }

    /// CRC32 of the code bytes.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn verify_checksum(&self) -> Result<(), DecodeError> {
        let actual = crc32fast::hash(&self.code);
        if actual != self.checksum {
            return Err(DecodeError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }
}

/// Iterator over `(offset, instruction)` pairs.
pub struct Instructions<'a> {
    code: &'a [u8],
    offset: usize,
}

impl Iterator for Instructions<'_> {
    type Item = Result<(u32, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.code.len() {
            return None;
        }
        let at = self.offset;
        match Instruction::decode(self.code, at) {
            Ok(instr) => {
                self.offset += instr.size() as usize;
                Some(Ok((at as u32, instr)))
            }
            Err(e) => {
                self.offset = self.code.len();
                Some(Err(e))
            }
        }
    }
}
