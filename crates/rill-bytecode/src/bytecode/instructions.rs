//! Instruction definitions and their byte encoding.
//!
//! Every instruction is a one-byte opcode followed by little-endian operands.
//! Branch offsets are relative to the end of the branch instruction.

use rill_core::PrimitiveKind;

use super::ids::{ConstId, LocalId, MemberId, TypeRef, VariableId};

/// Program decoding and verification errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode { offset: usize, opcode: u8 },
    #[error("instruction at offset {offset} is truncated")]
    Truncated { offset: usize },
    #[error("invalid operand at offset {offset}: {detail}")]
    InvalidOperand { offset: usize, detail: String },
    #[error("branch at offset {offset} targets {target}, which is not an instruction boundary")]
    BadBranchTarget { offset: usize, target: i64 },
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

/// String equality mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StringComparison {
    #[default]
    Ordinal,
    IgnoreCase,
}

impl StringComparison {
    fn to_byte(self) -> u8 {
        match self {
            Self::Ordinal => 0,
            Self::IgnoreCase => 1,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Ordinal),
            1 => Some(Self::IgnoreCase),
            _ => None,
        }
    }
}

/// Branch condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Always,
    IfTrue,
    IfFalse,
}

/// Branch encoding: `Short` carries an `i8` displacement, `Long` an `i32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BranchForm {
    #[default]
    Short,
    Long,
}

impl BranchForm {
    /// Encoded size of a branch in this form.
    pub const fn size(self) -> u32 {
        match self {
            Self::Short => 2,
            Self::Long => 5,
        }
    }
}

/// Instruction opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    LdNull = 0x01,
    LdTrue = 0x02,
    LdFalse = 0x03,
    LdI4 = 0x04,
    LdI8 = 0x05,
    LdR4 = 0x06,
    LdR8 = 0x07,
    LdConst = 0x08,
    LdVar = 0x09,
    LdOwner = 0x0a,
    LdLoc = 0x0b,
    StLoc = 0x0c,
    Dup = 0x0d,
    Pop = 0x0e,

    Add = 0x10,
    AddOvf = 0x11,
    AddOvfUn = 0x12,
    Sub = 0x13,
    SubOvf = 0x14,
    SubOvfUn = 0x15,
    Mul = 0x16,
    MulOvf = 0x17,
    MulOvfUn = 0x18,
    Div = 0x19,
    DivUn = 0x1a,
    Rem = 0x1b,
    RemUn = 0x1c,
    Neg = 0x1d,
    Pow = 0x1e,

    And = 0x20,
    Or = 0x21,
    Xor = 0x22,
    Not = 0x23,
    Shl = 0x24,
    Shr = 0x25,
    ShrUn = 0x26,

    Ceq = 0x28,
    Cgt = 0x29,
    CgtUn = 0x2a,
    Clt = 0x2b,
    CltUn = 0x2c,
    StrEq = 0x2d,
    Concat = 0x2e,

    Conv = 0x30,
    ConvOvf = 0x31,
    ConvOvfUn = 0x32,
    Box = 0x34,
    UnboxAny = 0x35,
    CastClass = 0x36,
    ToEnum = 0x37,
    NewArray = 0x38,
    LdElem = 0x39,
    ArrayContains = 0x3a,
    StrChar = 0x3b,

    Call = 0x40,

    BrS = 0x48,
    BrTrueS = 0x49,
    BrFalseS = 0x4a,
    Br = 0x4c,
    BrTrue = 0x4d,
    BrFalse = 0x4e,

    Ret = 0x50,
}

impl Opcode {
    pub const ALL: &'static [Opcode] = &[
        Self::Nop,
        Self::LdNull,
        Self::LdTrue,
        Self::LdFalse,
        Self::LdI4,
        Self::LdI8,
        Self::LdR4,
        Self::LdR8,
        Self::LdConst,
        Self::LdVar,
        Self::LdOwner,
        Self::LdLoc,
        Self::StLoc,
        Self::Dup,
        Self::Pop,
        Self::Add,
        Self::AddOvf,
        Self::AddOvfUn,
        Self::Sub,
        Self::SubOvf,
        Self::SubOvfUn,
        Self::Mul,
        Self::MulOvf,
        Self::MulOvfUn,
        Self::Div,
        Self::DivUn,
        Self::Rem,
        Self::RemUn,
        Self::Neg,
        Self::Pow,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Not,
        Self::Shl,
        Self::Shr,
        Self::ShrUn,
        Self::Ceq,
        Self::Cgt,
        Self::CgtUn,
        Self::Clt,
        Self::CltUn,
        Self::StrEq,
        Self::Concat,
        Self::Conv,
        Self::ConvOvf,
        Self::ConvOvfUn,
        Self::Box,
        Self::UnboxAny,
        Self::CastClass,
        Self::ToEnum,
        Self::NewArray,
        Self::LdElem,
        Self::ArrayContains,
        Self::StrChar,
        Self::Call,
        Self::BrS,
        Self::BrTrueS,
        Self::BrFalseS,
        Self::Br,
        Self::BrTrue,
        Self::BrFalse,
        Self::Ret,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u8 == v)
    }

    /// Size of the operands following the opcode byte.
    pub fn operand_size(self) -> usize {
        match self {
            Self::LdI4 | Self::LdR4 | Self::BrTrue | Self::BrFalse | Self::Br => 4,
            Self::LdI8 | Self::LdR8 => 8,
            Self::LdConst
            | Self::LdVar
            | Self::LdLoc
            | Self::StLoc
            | Self::Box
            | Self::UnboxAny
            | Self::CastClass
            | Self::ToEnum
            | Self::Call => 2,
            Self::NewArray => 4,
            Self::StrEq
            | Self::Conv
            | Self::ConvOvf
            | Self::ConvOvfUn
            | Self::BrS
            | Self::BrTrueS
            | Self::BrFalseS => 1,
            _ => 0,
        }
    }

    /// Instruction size in bytes.
    pub fn size(self) -> usize {
        1 + self.operand_size()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nop => "Nop",
            Self::LdNull => "LdNull",
            Self::LdTrue => "LdTrue",
            Self::LdFalse => "LdFalse",
            Self::LdI4 => "LdI4",
            Self::LdI8 => "LdI8",
            Self::LdR4 => "LdR4",
            Self::LdR8 => "LdR8",
            Self::LdConst => "LdConst",
            Self::LdVar => "LdVar",
            Self::LdOwner => "LdOwner",
            Self::LdLoc => "LdLoc",
            Self::StLoc => "StLoc",
            Self::Dup => "Dup",
            Self::Pop => "Pop",
            Self::Add => "Add",
            Self::AddOvf => "AddOvf",
            Self::AddOvfUn => "AddOvfUn",
            Self::Sub => "Sub",
            Self::SubOvf => "SubOvf",
            Self::SubOvfUn => "SubOvfUn",
            Self::Mul => "Mul",
            Self::MulOvf => "MulOvf",
            Self::MulOvfUn => "MulOvfUn",
            Self::Div => "Div",
            Self::DivUn => "DivUn",
            Self::Rem => "Rem",
            Self::RemUn => "RemUn",
            Self::Neg => "Neg",
            Self::Pow => "Pow",
            Self::And => "And",
            Self::Or => "Or",
            Self::Xor => "Xor",
            Self::Not => "Not",
            Self::Shl => "Shl",
            Self::Shr => "Shr",
            Self::ShrUn => "ShrUn",
            Self::Ceq => "Ceq",
            Self::Cgt => "Cgt",
            Self::CgtUn => "CgtUn",
            Self::Clt => "Clt",
            Self::CltUn => "CltUn",
            Self::StrEq => "StrEq",
            Self::Concat => "Concat",
            Self::Conv => "Conv",
            Self::ConvOvf => "ConvOvf",
            Self::ConvOvfUn => "ConvOvfUn",
            Self::Box => "Box",
            Self::UnboxAny => "UnboxAny",
            Self::CastClass => "CastClass",
            Self::ToEnum => "ToEnum",
            Self::NewArray => "NewArray",
            Self::LdElem => "LdElem",
            Self::ArrayContains => "ArrayContains",
            Self::StrChar => "StrChar",
            Self::Call => "Call",
            Self::BrS => "Br.S",
            Self::BrTrueS => "BrTrue.S",
            Self::BrFalseS => "BrFalse.S",
            Self::Br => "Br",
            Self::BrTrue => "BrTrue",
            Self::BrFalse => "BrFalse",
            Self::Ret => "Ret",
        }
    }

    fn branch(kind: BranchKind, form: BranchForm) -> Self {
        match (kind, form) {
            (BranchKind::Always, BranchForm::Short) => Self::BrS,
            (BranchKind::IfTrue, BranchForm::Short) => Self::BrTrueS,
            (BranchKind::IfFalse, BranchForm::Short) => Self::BrFalseS,
            (BranchKind::Always, BranchForm::Long) => Self::Br,
            (BranchKind::IfTrue, BranchForm::Long) => Self::BrTrue,
            (BranchKind::IfFalse, BranchForm::Long) => Self::BrFalse,
        }
    }
}

/// A decoded instruction.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Instruction {
    Nop,
    LdNull,
    LdTrue,
    LdFalse,
    LdI4(i32),
    LdI8(i64),
    LdR4(f32),
    LdR8(f64),
    LdConst(ConstId),
    LdVar(VariableId),
    /// Push the expression owner.
    LdOwner,
    LdLoc(LocalId),
    StLoc(LocalId),
    Dup,
    Pop,

    Add,
    AddOvf,
    AddOvfUn,
    Sub,
    SubOvf,
    SubOvfUn,
    Mul,
    MulOvf,
    MulOvfUn,
    Div,
    DivUn,
    Rem,
    RemUn,
    Neg,
    /// `Math.Pow` over two doubles.
    Pow,

    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    ShrUn,

    Ceq,
    Cgt,
    CgtUn,
    Clt,
    CltUn,
    StrEq(StringComparison),
    /// Pop two values, push the concatenation of their string forms.
    Concat,

    Conv(PrimitiveKind),
    ConvOvf(PrimitiveKind),
    ConvOvfUn(PrimitiveKind),
    Box(TypeRef),
    UnboxAny(TypeRef),
    CastClass(TypeRef),
    /// Reinterpret an integral value as an enum of the given type.
    ToEnum(TypeRef),
    /// Pop `count` values into a new array of the element type.
    NewArray(TypeRef, u16),
    LdElem,
    ArrayContains,
    /// Index a string, producing a `Char`.
    StrChar,

    Call(MemberId),

    Branch {
        kind: BranchKind,
        form: BranchForm,
        offset: i32,
    },

    Ret,
}

impl Instruction {
    pub fn branch(kind: BranchKind, form: BranchForm, offset: i32) -> Self {
        Self::Branch { kind, form, offset }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Nop => Opcode::Nop,
            Self::LdNull => Opcode::LdNull,
            Self::LdTrue => Opcode::LdTrue,
            Self::LdFalse => Opcode::LdFalse,
            Self::LdI4(_) => Opcode::LdI4,
            Self::LdI8(_) => Opcode::LdI8,
            Self::LdR4(_) => Opcode::LdR4,
            Self::LdR8(_) => Opcode::LdR8,
            Self::LdConst(_) => Opcode::LdConst,
            Self::LdVar(_) => Opcode::LdVar,
            Self::LdOwner => Opcode::LdOwner,
            Self::LdLoc(_) => Opcode::LdLoc,
            Self::StLoc(_) => Opcode::StLoc,
            Self::Dup => Opcode::Dup,
            Self::Pop => Opcode::Pop,
            Self::Add => Opcode::Add,
            Self::AddOvf => Opcode::AddOvf,
            Self::AddOvfUn => Opcode::AddOvfUn,
            Self::Sub => Opcode::Sub,
            Self::SubOvf => Opcode::SubOvf,
            Self::SubOvfUn => Opcode::SubOvfUn,
            Self::Mul => Opcode::Mul,
            Self::MulOvf => Opcode::MulOvf,
            Self::MulOvfUn => Opcode::MulOvfUn,
            Self::Div => Opcode::Div,
            Self::DivUn => Opcode::DivUn,
            Self::Rem => Opcode::Rem,
            Self::RemUn => Opcode::RemUn,
            Self::Neg => Opcode::Neg,
            Self::Pow => Opcode::Pow,
            Self::And => Opcode::And,
            Self::Or => Opcode::Or,
            Self::Xor => Opcode::Xor,
            Self::Not => Opcode::Not,
            Self::Shl => Opcode::Shl,
            Self::Shr => Opcode::Shr,
            Self::ShrUn => Opcode::ShrUn,
            Self::Ceq => Opcode::Ceq,
            Self::Cgt => Opcode::Cgt,
            Self::CgtUn => Opcode::CgtUn,
            Self::Clt => Opcode::Clt,
            Self::CltUn => Opcode::CltUn,
            Self::StrEq(_) => Opcode::StrEq,
            Self::Concat => Opcode::Concat,
            Self::Conv(_) => Opcode::Conv,
            Self::ConvOvf(_) => Opcode::ConvOvf,
            Self::ConvOvfUn(_) => Opcode::ConvOvfUn,
            Self::Box(_) => Opcode::Box,
            Self::UnboxAny(_) => Opcode::UnboxAny,
            Self::CastClass(_) => Opcode::CastClass,
            Self::ToEnum(_) => Opcode::ToEnum,
            Self::NewArray(..) => Opcode::NewArray,
            Self::LdElem => Opcode::LdElem,
            Self::ArrayContains => Opcode::ArrayContains,
            Self::StrChar => Opcode::StrChar,
            Self::Call(_) => Opcode::Call,
            Self::Branch { kind, form, .. } => Opcode::branch(*kind, *form),
            Self::Ret => Opcode::Ret,
        }
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.opcode().size() as u32
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch { .. })
    }

    /// Absolute target of a branch located at `at`.
    pub fn branch_target(&self, at: u32) -> Option<i64> {
        match self {
            Self::Branch { offset, .. } => Some(at as i64 + self.size() as i64 + *offset as i64),
            _ => None,
        }
    }

    /// Append the encoded instruction to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode() as u8);
        match *self {
            Self::LdI4(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::LdI8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::LdR4(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::LdR8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::LdConst(id) => out.extend_from_slice(&id.0.to_le_bytes()),
            Self::LdVar(id) => out.extend_from_slice(&id.0.to_le_bytes()),
            Self::LdLoc(id) | Self::StLoc(id) => out.extend_from_slice(&id.0.to_le_bytes()),
            Self::StrEq(mode) => out.push(mode.to_byte()),
            Self::Conv(kind) | Self::ConvOvf(kind) | Self::ConvOvfUn(kind) => {
                out.push(kind.index() as u8)
            }
            Self::Box(t) | Self::UnboxAny(t) | Self::CastClass(t) | Self::ToEnum(t) => {
                out.extend_from_slice(&t.0.to_le_bytes())
            }
            Self::NewArray(t, count) => {
                out.extend_from_slice(&t.0.to_le_bytes());
                out.extend_from_slice(&count.to_le_bytes());
            }
            Self::Call(id) => out.extend_from_slice(&id.0.to_le_bytes()),
            Self::Branch { form, offset, .. } => match form {
                BranchForm::Short => {
                    debug_assert!(i8::try_from(offset).is_ok(), "short branch out of range");
                    out.push(offset as i8 as u8);
                }
                BranchForm::Long => out.extend_from_slice(&offset.to_le_bytes()),
            },
            _ => {}
        }
    }

    /// Decode the instruction starting at `offset`.
    pub fn decode(code: &[u8], offset: usize) -> Result<Self, DecodeError> {
        let byte = *code.get(offset).ok_or(DecodeError::Truncated { offset })?;
        let opcode = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode {
            offset,
            opcode: byte,
        })?;
        let operands = code
            .get(offset + 1..offset + opcode.size())
            .ok_or(DecodeError::Truncated { offset })?;

        let u16_at = |i: usize| u16::from_le_bytes([operands[i], operands[i + 1]]);
        let arr4 = || [operands[0], operands[1], operands[2], operands[3]];
        let arr8 = || {
            let mut a = [0u8; 8];
            a.copy_from_slice(&operands[..8]);
            a
        };
        let kind = || {
            PrimitiveKind::ALL
                .get(operands[0] as usize)
                .copied()
                .ok_or_else(|| DecodeError::InvalidOperand {
                    offset,
                    detail: format!("primitive kind {}", operands[0]),
                })
        };

        Ok(match opcode {
            Opcode::Nop => Self::Nop,
            Opcode::LdNull => Self::LdNull,
            Opcode::LdTrue => Self::LdTrue,
            Opcode::LdFalse => Self::LdFalse,
            Opcode::LdI4 => Self::LdI4(i32::from_le_bytes(arr4())),
            Opcode::LdI8 => Self::LdI8(i64::from_le_bytes(arr8())),
            Opcode::LdR4 => Self::LdR4(f32::from_le_bytes(arr4())),
            Opcode::LdR8 => Self::LdR8(f64::from_le_bytes(arr8())),
            Opcode::LdConst => Self::LdConst(ConstId(u16_at(0))),
            Opcode::LdVar => Self::LdVar(VariableId(u16_at(0))),
            Opcode::LdOwner => Self::LdOwner,
            Opcode::LdLoc => Self::LdLoc(LocalId(u16_at(0))),
            Opcode::StLoc => Self::StLoc(LocalId(u16_at(0))),
            Opcode::Dup => Self::Dup,
            Opcode::Pop => Self::Pop,
            Opcode::Add => Self::Add,
            Opcode::AddOvf => Self::AddOvf,
            Opcode::AddOvfUn => Self::AddOvfUn,
            Opcode::Sub => Self::Sub,
            Opcode::SubOvf => Self::SubOvf,
            Opcode::SubOvfUn => Self::SubOvfUn,
            Opcode::Mul => Self::Mul,
            Opcode::MulOvf => Self::MulOvf,
            Opcode::MulOvfUn => Self::MulOvfUn,
            Opcode::Div => Self::Div,
            Opcode::DivUn => Self::DivUn,
            Opcode::Rem => Self::Rem,
            Opcode::RemUn => Self::RemUn,
            Opcode::Neg => Self::Neg,
            Opcode::Pow => Self::Pow,
            Opcode::And => Self::And,
            Opcode::Or => Self::Or,
            Opcode::Xor => Self::Xor,
            Opcode::Not => Self::Not,
            Opcode::Shl => Self::Shl,
            Opcode::Shr => Self::Shr,
            Opcode::ShrUn => Self::ShrUn,
            Opcode::Ceq => Self::Ceq,
            Opcode::Cgt => Self::Cgt,
            Opcode::CgtUn => Self::CgtUn,
            Opcode::Clt => Self::Clt,
            Opcode::CltUn => Self::CltUn,
            Opcode::StrEq => Self::StrEq(StringComparison::from_byte(operands[0]).ok_or_else(
                || DecodeError::InvalidOperand {
                    offset,
                    detail: format!("string comparison {}", operands[0]),
                },
            )?),
            Opcode::Concat => Self::Concat,
            Opcode::Conv => Self::Conv(kind()?),
            Opcode::ConvOvf => Self::ConvOvf(kind()?),
            Opcode::ConvOvfUn => Self::ConvOvfUn(kind()?),
            Opcode::Box => Self::Box(TypeRef(u16_at(0))),
            Opcode::UnboxAny => Self::UnboxAny(TypeRef(u16_at(0))),
            Opcode::CastClass => Self::CastClass(TypeRef(u16_at(0))),
            Opcode::ToEnum => Self::ToEnum(TypeRef(u16_at(0))),
            Opcode::NewArray => Self::NewArray(TypeRef(u16_at(0)), u16_at(2)),
            Opcode::LdElem => Self::LdElem,
            Opcode::ArrayContains => Self::ArrayContains,
            Opcode::StrChar => Self::StrChar,
            Opcode::Call => Self::Call(MemberId(u16_at(0))),
            Opcode::BrS => Self::branch(BranchKind::Always, BranchForm::Short, operands[0] as i8 as i32),
            Opcode::BrTrueS => {
                Self::branch(BranchKind::IfTrue, BranchForm::Short, operands[0] as i8 as i32)
            }
            Opcode::BrFalseS => {
                Self::branch(BranchKind::IfFalse, BranchForm::Short, operands[0] as i8 as i32)
            }
            Opcode::Br => Self::branch(BranchKind::Always, BranchForm::Long, i32::from_le_bytes(arr4())),
            Opcode::BrTrue => {
                Self::branch(BranchKind::IfTrue, BranchForm::Long, i32::from_le_bytes(arr4()))
            }
            Opcode::BrFalse => {
                Self::branch(BranchKind::IfFalse, BranchForm::Long, i32::from_le_bytes(arr4()))
            }
            Opcode::Ret => Self::Ret,
        })
    }
}
