//! Element to instruction lowering.

use rill_bytecode::{BranchKind, Instruction};
use rill_core::{PrimitiveKind, Value};

use super::EmitError;
use super::context::EmitContext;
use crate::elements::{
    ArithmeticCode, CompareCode, Conversion, Element, ElementKind, InTarget, IndexKind, LogicalOp,
    NegateCode, Receiver,
};

fn load_literal(cx: &mut EmitContext<'_>, value: &Value) {
    let instr = match value {
        Value::Null => Instruction::LdNull,
        Value::Bool(true) => Instruction::LdTrue,
        Value::Bool(false) => Instruction::LdFalse,
        Value::I32(v) => Instruction::LdI4(*v),
        Value::I64(v) => Instruction::LdI8(*v),
        Value::F32(v) => Instruction::LdR4(*v),
        Value::F64(v) => Instruction::LdR8(*v),
        other => Instruction::LdConst(cx.tables().intern_constant(other.clone())),
    };
    cx.emit(instr);
}

fn load_number(cx: &mut EmitContext<'_>, kind: PrimitiveKind, n: i32) -> Result<(), EmitError> {
    let value = match kind {
        PrimitiveKind::Int32 => Value::I32(n),
        PrimitiveKind::UInt32 => Value::U32(n as u32),
        PrimitiveKind::Int64 => Value::I64(n as i64),
        PrimitiveKind::UInt64 => Value::U64(n as u64),
        PrimitiveKind::Single => Value::F32(n as f32),
        PrimitiveKind::Double => Value::F64(n as f64),
        other => {
            return Err(EmitError::Internal(format!(
                "no constant form for {}",
                other.name()
            )));
        }
    };
    load_literal(cx, &value);
    Ok(())
}

/// Exponents up to this use `n - 1` copies and `n - 1` multiplications.
const LINEAR_POWER_LIMIT: u32 = 64;

/// Raise the value on top of the stack to `exponent >= 1`.
///
/// Past the linear limit this is square-and-multiply: one copy of the base
/// is kept below the accumulator for each remaining set bit, so stack depth
/// and code size stay logarithmic in the exponent.
fn emit_power(exponent: u32, mul: Instruction, cx: &mut EmitContext<'_>) {
    if exponent <= LINEAR_POWER_LIMIT {
        for _ in 1..exponent {
            cx.emit(Instruction::Dup);
        }
        for _ in 1..exponent {
            cx.emit(mul);
        }
        return;
    }
    for _ in 1..exponent.count_ones() {
        cx.emit(Instruction::Dup);
    }
    let top = u32::BITS - 1 - exponent.leading_zeros();
    for bit in (0..top).rev() {
        cx.emit(Instruction::Dup);
        cx.emit(mul);
        if exponent & (1 << bit) != 0 {
            cx.emit(mul);
        }
    }
}

fn emit_receiver(cx: &mut EmitContext<'_>, receiver: &Receiver) -> Result<(), EmitError> {
    match receiver {
        Receiver::None => {}
        Receiver::Owner => cx.emit(Instruction::LdOwner),
        Receiver::Value(e) => emit_element(e, cx)?,
    }
    Ok(())
}

fn emit_conversion(
    cx: &mut EmitContext<'_>,
    conversion: &Conversion,
    source: &rill_core::Ty,
) -> Result<(), EmitError> {
    match conversion {
        Conversion::Identity => {}
        Conversion::Numeric {
            to,
            checked,
            unsigned_source,
        } => cx.emit(match (checked, unsigned_source) {
            (true, true) => Instruction::ConvOvfUn(*to),
            (true, false) => Instruction::ConvOvf(*to),
            (false, _) => Instruction::Conv(*to),
        }),
        Conversion::Box(_) => {
            let ty = cx.tables().intern_type(source);
            cx.emit(Instruction::Box(ty));
        }
        Conversion::Unbox(to) => {
            let ty = cx.tables().intern_type(to);
            cx.emit(Instruction::UnboxAny(ty));
        }
        Conversion::CastClass(to) => {
            let ty = cx.tables().intern_type(to);
            cx.emit(Instruction::CastClass(ty));
        }
        Conversion::ToEnum { underlying, ty } => {
            let ty = cx.tables().intern_type(ty);
            cx.emit(Instruction::Conv(*underlying));
            cx.emit(Instruction::ToEnum(ty));
        }
        Conversion::FromEnum(kind) => cx.emit(Instruction::Conv(*kind)),
        Conversion::Operator(member) => {
            let id = cx.tables().intern_member(member, false, 1);
            cx.emit(Instruction::Call(id));
        }
    }
    Ok(())
}

/// Emit `e`, leaving exactly one value on the stack.
pub fn emit_element(e: &Element, cx: &mut EmitContext<'_>) -> Result<(), EmitError> {
    match &e.kind {
        ElementKind::Literal(lit) => load_literal(cx, &lit.value),
        ElementKind::Variable(name) => {
            let id = cx.tables().intern_variable(name, &e.ty);
            cx.emit(Instruction::LdVar(id));
        }
        ElementKind::Local(id) => cx.emit(Instruction::LdLoc(*id)),
        ElementKind::Member { receiver, member } => {
            emit_receiver(cx, receiver)?;
            let id = cx.tables().intern_member(member, receiver.is_some(), 0);
            cx.emit(Instruction::Call(id));
        }
        ElementKind::Call {
            receiver,
            member,
            args,
            rest,
        } => {
            emit_receiver(cx, receiver)?;
            for arg in args {
                emit_element(arg, cx)?;
            }
            let mut argc = args.len();
            if let Some((element, items)) = rest {
                for item in items {
                    emit_element(item, cx)?;
                }
                let ty = cx.tables().intern_type(element);
                let count = u16::try_from(items.len())
                    .map_err(|_| EmitError::Internal("too many rest arguments".into()))?;
                cx.emit(Instruction::NewArray(ty, count));
                argc += 1;
            }
            let argc = u16::try_from(argc)
                .map_err(|_| EmitError::Internal("too many arguments".into()))?;
            let id = cx.tables().intern_member(member, receiver.is_some(), argc);
            cx.emit(Instruction::Call(id));
        }
        ElementKind::Index {
            target,
            index,
            kind,
        } => {
            emit_element(target, cx)?;
            emit_element(index, cx)?;
            cx.emit(match kind {
                IndexKind::Array => Instruction::LdElem,
                IndexKind::Chars => Instruction::StrChar,
            });
        }
        ElementKind::Arithmetic {
            left, right, code, ..
        } => match code {
            ArithmeticCode::Primitive(instr) => {
                emit_element(left, cx)?;
                emit_element(right, cx)?;
                cx.emit(*instr);
            }
            ArithmeticCode::Operator(member) => {
                emit_element(left, cx)?;
                emit_element(right, cx)?;
                let id = cx.tables().intern_member(member, false, 2);
                cx.emit(Instruction::Call(id));
            }
            ArithmeticCode::Unrolled {
                kind,
                exponent,
                mul,
            } => {
                if *exponent == 0 {
                    return load_number(cx, *kind, 1);
                }
                emit_element(left, cx)?;
                emit_power(*exponent, *mul, cx);
            }
        },
        ElementKind::Compare {
            left, right, code, ..
        } => {
            emit_element(left, cx)?;
            emit_element(right, cx)?;
            match code {
                CompareCode::Primitive { instr, negate } => {
                    cx.emit(*instr);
                    if *negate {
                        cx.emit(Instruction::Not);
                    }
                }
                CompareCode::Operator(member) => {
                    let id = cx.tables().intern_member(member, false, 2);
                    cx.emit(Instruction::Call(id));
                }
            }
        }
        ElementKind::Shift {
            left, right, instr, ..
        } => {
            emit_element(left, cx)?;
            emit_element(right, cx)?;
            cx.emit(*instr);
        }
        ElementKind::Negate { operand, code } => match code {
            NegateCode::Neg => {
                emit_element(operand, cx)?;
                cx.emit(Instruction::Neg);
            }
            NegateCode::CheckedZero(kind) => {
                load_number(cx, *kind, 0)?;
                emit_element(operand, cx)?;
                cx.emit(Instruction::SubOvf);
            }
            NegateCode::Operator(member) => {
                emit_element(operand, cx)?;
                let id = cx.tables().intern_member(member, false, 1);
                cx.emit(Instruction::Call(id));
            }
        },
        ElementKind::Not(operand) => {
            emit_element(operand, cx)?;
            cx.emit(Instruction::Not);
        }
        ElementKind::Logical {
            op,
            left,
            right,
            short_circuit,
        } => {
            if *short_circuit {
                // left; dup; skip right when left decides; pop; right; end:
                let end = cx.define_label()?;
                emit_element(left, cx)?;
                cx.emit(Instruction::Dup);
                let skip = match op {
                    LogicalOp::And => BranchKind::IfFalse,
                    LogicalOp::Or => BranchKind::IfTrue,
                };
                cx.branch(skip, end)?;
                cx.emit(Instruction::Pop);
                emit_element(right, cx)?;
                cx.mark_label(end)?;
            } else {
                emit_element(left, cx)?;
                emit_element(right, cx)?;
                cx.emit(match op {
                    LogicalOp::And => Instruction::And,
                    LogicalOp::Or => Instruction::Or,
                });
            }
        }
        ElementKind::Xor { left, right } => {
            emit_element(left, cx)?;
            emit_element(right, cx)?;
            cx.emit(Instruction::Xor);
        }
        ElementKind::Cast {
            operand,
            conversion,
        } => {
            emit_element(operand, cx)?;
            emit_conversion(cx, conversion, &operand.ty)?;
        }
        ElementKind::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let else_label = cx.define_label()?;
            let end = cx.define_label()?;
            emit_element(condition, cx)?;
            cx.branch(BranchKind::IfFalse, else_label)?;
            emit_element(then, cx)?;
            cx.branch(BranchKind::Always, end)?;
            cx.mark_label(else_label)?;
            emit_element(otherwise, cx)?;
            cx.mark_label(end)?;
        }
        ElementKind::In { probe, target } => match target {
            InTarget::List { local, comparisons } => {
                let found = cx.define_label()?;
                let end = cx.define_label()?;
                emit_element(probe, cx)?;
                cx.emit(Instruction::StLoc(*local));
                for cmp in comparisons {
                    emit_element(cmp, cx)?;
                    cx.branch(BranchKind::IfTrue, found)?;
                }
                cx.emit(Instruction::LdFalse);
                cx.branch(BranchKind::Always, end)?;
                cx.mark_label(found)?;
                cx.emit(Instruction::LdTrue);
                cx.mark_label(end)?;
            }
            InTarget::Array(array) => {
                emit_element(array, cx)?;
                emit_element(probe, cx)?;
                cx.emit(Instruction::ArrayContains);
            }
            InTarget::Collection { target, member } => {
                emit_element(target, cx)?;
                emit_element(probe, cx)?;
                let id = cx.tables().intern_member(member, true, 1);
                cx.emit(Instruction::Call(id));
            }
        },
    }
    Ok(())
}
