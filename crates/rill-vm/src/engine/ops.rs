//! Value-level semantics of the arithmetic, comparison and conversion
//! instructions.
//!
//! Operands arrive already promoted by the compiler, so binary operations
//! expect both sides to carry the same kind. Anything else means the program
//! does not match its own types and surfaces as `InvalidProgram`.

use std::cmp::Ordering;

use rill_bytecode::StringComparison;
use rill_core::{PrimitiveKind, Ty, Value};

use super::error::RuntimeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bitwise {
    And,
    Or,
    Xor,
}

fn mismatch(op: &str, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::InvalidProgram(format!(
        "`{op}` applied to `{}` and `{}`",
        a.runtime_type(),
        b.runtime_type()
    ))
}

fn unary_mismatch(op: &str, v: &Value) -> RuntimeError {
    RuntimeError::InvalidProgram(format!("`{op}` applied to `{}`", v.runtime_type()))
}

macro_rules! integral {
    ($variant:ident, $x:expr, $y:expr, $op:expr, $checked:expr) => {{
        let (x, y) = ($x, $y);
        let r = match $op {
            Arith::Add if $checked => x.checked_add(y),
            Arith::Add => Some(x.wrapping_add(y)),
            Arith::Sub if $checked => x.checked_sub(y),
            Arith::Sub => Some(x.wrapping_sub(y)),
            Arith::Mul if $checked => x.checked_mul(y),
            Arith::Mul => Some(x.wrapping_mul(y)),
            Arith::Div | Arith::Rem if y == 0 => return Err(RuntimeError::DivideByZero),
            Arith::Div => x.checked_div(y),
            Arith::Rem => x.checked_rem(y),
        };
        r.map(Value::$variant).ok_or(RuntimeError::Overflow)
    }};
}

macro_rules! real {
    ($variant:ident, $x:expr, $y:expr, $op:expr) => {{
        let (x, y) = ($x, $y);
        Ok(Value::$variant(match $op {
            Arith::Add => x + y,
            Arith::Sub => x - y,
            Arith::Mul => x * y,
            Arith::Div => x / y,
            Arith::Rem => x % y,
        }))
    }};
}

fn op_name(op: Arith) -> &'static str {
    match op {
        Arith::Add => "+",
        Arith::Sub => "-",
        Arith::Mul => "*",
        Arith::Div => "/",
        Arith::Rem => "%",
    }
}

/// `Add`..`RemUn` and their overflow-checking forms.
///
/// Signedness comes from the operand values, so the `Un` forms share this
/// path with the signed ones.
pub fn arithmetic(op: Arith, checked: bool, a: Value, b: Value) -> Result<Value, RuntimeError> {
    use Value::*;
    match (&a, &b) {
        (I32(x), I32(y)) => integral!(I32, *x, *y, op, checked),
        (U32(x), U32(y)) => integral!(U32, *x, *y, op, checked),
        (I64(x), I64(y)) => integral!(I64, *x, *y, op, checked),
        (U64(x), U64(y)) => integral!(U64, *x, *y, op, checked),
        (F32(x), F32(y)) => real!(F32, *x, *y, op),
        (F64(x), F64(y)) => real!(F64, *x, *y, op),
        (DateTime(x), DateTime(y)) if op == Arith::Sub => {
            Ok(TimeSpan(x.signed_duration_since(*y)))
        }
        (DateTime(x), TimeSpan(t)) => {
            let r = match op {
                Arith::Add => x.checked_add_signed(*t),
                Arith::Sub => x.checked_sub_signed(*t),
                _ => return Err(mismatch(op_name(op), &a, &b)),
            };
            r.map(DateTime).ok_or(RuntimeError::Overflow)
        }
        (TimeSpan(x), TimeSpan(y)) => {
            let r = match op {
                Arith::Add => x.checked_add(y),
                Arith::Sub => x.checked_sub(y),
                _ => return Err(mismatch(op_name(op), &a, &b)),
            };
            r.map(TimeSpan).ok_or(RuntimeError::Overflow)
        }
        _ => Err(mismatch(op_name(op), &a, &b)),
    }
}

/// Unchecked negation. Checked negation is emitted as `0 - x`.
pub fn negate(v: Value) -> Result<Value, RuntimeError> {
    Ok(match v {
        Value::I32(x) => Value::I32(x.wrapping_neg()),
        Value::I64(x) => Value::I64(x.wrapping_neg()),
        Value::F32(x) => Value::F32(-x),
        Value::F64(x) => Value::F64(-x),
        Value::TimeSpan(t) => Value::TimeSpan(-t),
        other => return Err(unary_mismatch("-", &other)),
    })
}

pub fn power(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (&a, &b) {
        (Value::F64(x), Value::F64(y)) => Ok(Value::F64(x.powf(*y))),
        _ => Err(mismatch("^", &a, &b)),
    }
}

macro_rules! bits {
    ($variant:ident, $x:expr, $y:expr, $op:expr) => {{
        let (x, y) = ($x, $y);
        Ok(Value::$variant(match $op {
            Bitwise::And => x & y,
            Bitwise::Or => x | y,
            Bitwise::Xor => x ^ y,
        }))
    }};
}

/// Logical on booleans (both sides already evaluated), bitwise on integrals.
pub fn bitwise(op: Bitwise, a: Value, b: Value) -> Result<Value, RuntimeError> {
    use Value::*;
    match (&a, &b) {
        (Bool(x), Bool(y)) => bits!(Bool, *x, *y, op),
        (I32(x), I32(y)) => bits!(I32, *x, *y, op),
        (U32(x), U32(y)) => bits!(U32, *x, *y, op),
        (I64(x), I64(y)) => bits!(I64, *x, *y, op),
        (U64(x), U64(y)) => bits!(U64, *x, *y, op),
        _ => {
            let name = match op {
                Bitwise::And => "and",
                Bitwise::Or => "or",
                Bitwise::Xor => "xor",
            };
            Err(mismatch(name, &a, &b))
        }
    }
}

pub fn not(v: Value) -> Result<Value, RuntimeError> {
    Ok(match v {
        Value::Bool(b) => Value::Bool(!b),
        Value::I32(x) => Value::I32(!x),
        Value::U32(x) => Value::U32(!x),
        Value::I64(x) => Value::I64(!x),
        Value::U64(x) => Value::U64(!x),
        other => return Err(unary_mismatch("not", &other)),
    })
}

/// Shift counts are masked to the operand width.
pub fn shift(left: bool, v: Value, count: Value) -> Result<Value, RuntimeError> {
    let Value::I32(n) = count else {
        return Err(mismatch(if left { "<<" } else { ">>" }, &v, &count));
    };
    let n = n as u32;
    Ok(match (v, left) {
        (Value::I32(x), true) => Value::I32(x.wrapping_shl(n)),
        (Value::I32(x), false) => Value::I32(x.wrapping_shr(n)),
        (Value::U32(x), true) => Value::U32(x.wrapping_shl(n)),
        (Value::U32(x), false) => Value::U32(x.wrapping_shr(n)),
        (Value::I64(x), true) => Value::I64(x.wrapping_shl(n)),
        (Value::I64(x), false) => Value::I64(x.wrapping_shr(n)),
        (Value::U64(x), true) => Value::U64(x.wrapping_shl(n)),
        (Value::U64(x), false) => Value::U64(x.wrapping_shr(n)),
        (other, _) => return Err(unary_mismatch(if left { "<<" } else { ">>" }, &other)),
    })
}

/// Ordering for `Cgt`/`Clt`; `None` when either real operand is NaN.
pub fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>, RuntimeError> {
    use Value::*;
    Ok(match (a, b) {
        (Bool(x), Bool(y)) => x.partial_cmp(y),
        (Char(x), Char(y)) => x.partial_cmp(y),
        (I32(x), I32(y)) => x.partial_cmp(y),
        (U32(x), U32(y)) => x.partial_cmp(y),
        (I64(x), I64(y)) => x.partial_cmp(y),
        (U64(x), U64(y)) => x.partial_cmp(y),
        (F32(x), F32(y)) => x.partial_cmp(y),
        (F64(x), F64(y)) => x.partial_cmp(y),
        (String(x), String(y)) => x.partial_cmp(y),
        (DateTime(x), DateTime(y)) => x.partial_cmp(y),
        (TimeSpan(x), TimeSpan(y)) => x.partial_cmp(y),
        (Enum(x), Enum(y)) if x.ty == y.ty => x.value.partial_cmp(&y.value),
        _ => return Err(mismatch("compare", a, b)),
    })
}

pub fn string_equals(a: &Value, b: &Value, mode: StringComparison) -> Result<bool, RuntimeError> {
    match (a, b) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, Value::String(_)) | (Value::String(_), Value::Null) => Ok(false),
        (Value::String(x), Value::String(y)) => Ok(match mode {
            StringComparison::Ordinal => x == y,
            StringComparison::IgnoreCase => x
                .chars()
                .flat_map(char::to_lowercase)
                .eq(y.chars().flat_map(char::to_lowercase)),
        }),
        _ => Err(mismatch("string ==", a, b)),
    }
}

/// A convertible scalar.
enum Scalar {
    Int(i128),
    Real(f64),
}

fn scalar(v: &Value) -> Option<Scalar> {
    match v {
        Value::F32(x) => Some(Scalar::Real(*x as f64)),
        Value::F64(x) => Some(Scalar::Real(*x)),
        _ => v.as_i128().map(Scalar::Int),
    }
}

macro_rules! to_int {
    ($ty:ty, $variant:ident, $src:expr, $checked:expr) => {
        match $src {
            Scalar::Int(n) if $checked => <$ty>::try_from(n)
                .map(Value::$variant)
                .map_err(|_| RuntimeError::Overflow),
            Scalar::Int(n) => Ok(Value::$variant(n as $ty)),
            Scalar::Real(x) if $checked => {
                if x.is_nan() {
                    return Err(RuntimeError::Overflow);
                }
                <$ty>::try_from(x.trunc() as i128)
                    .map(Value::$variant)
                    .map_err(|_| RuntimeError::Overflow)
            }
            Scalar::Real(x) => Ok(Value::$variant(x as $ty)),
        }
    };
}

fn invalid_cast(v: &Value, to: &str) -> RuntimeError {
    RuntimeError::InvalidCast {
        from: v.runtime_type().to_string(),
        to: to.to_string(),
    }
}

fn scalar_of(v: &Value, kind: PrimitiveKind) -> Result<Scalar, RuntimeError> {
    scalar(v).ok_or_else(|| invalid_cast(v, kind.name()))
}

fn char_code(src: Scalar, checked: bool) -> Result<u16, RuntimeError> {
    match src {
        Scalar::Int(n) if checked => u16::try_from(n).map_err(|_| RuntimeError::Overflow),
        Scalar::Int(n) => Ok(n as u16),
        Scalar::Real(x) if checked => {
            if x.is_nan() {
                return Err(RuntimeError::Overflow);
            }
            u16::try_from(x.trunc() as i128).map_err(|_| RuntimeError::Overflow)
        }
        Scalar::Real(x) => Ok(x as u16),
    }
}

/// `Conv`, `ConvOvf` and `ConvOvfUn`. Enums convert through their
/// underlying value.
pub fn convert(v: Value, kind: PrimitiveKind, checked: bool) -> Result<Value, RuntimeError> {
    use PrimitiveKind::*;
    match kind {
        Boolean => match v {
            Value::Bool(_) => Ok(v),
            other => Err(invalid_cast(&other, kind.name())),
        },
        Char => {
            let code = char_code(scalar_of(&v, kind)?, checked)?;
            // Lone surrogates have no `char`.
            char::from_u32(code as u32)
                .map(Value::Char)
                .ok_or_else(|| invalid_cast(&v, kind.name()))
        }
        SByte => to_int!(i8, I8, scalar_of(&v, kind)?, checked),
        Byte => to_int!(u8, U8, scalar_of(&v, kind)?, checked),
        Int16 => to_int!(i16, I16, scalar_of(&v, kind)?, checked),
        UInt16 => to_int!(u16, U16, scalar_of(&v, kind)?, checked),
        Int32 => to_int!(i32, I32, scalar_of(&v, kind)?, checked),
        UInt32 => to_int!(u32, U32, scalar_of(&v, kind)?, checked),
        Int64 => to_int!(i64, I64, scalar_of(&v, kind)?, checked),
        UInt64 => to_int!(u64, U64, scalar_of(&v, kind)?, checked),
        Single => Ok(Value::F32(match scalar_of(&v, kind)? {
            Scalar::Int(n) => n as f32,
            Scalar::Real(x) => x as f32,
        })),
        Double => Ok(Value::F64(match scalar_of(&v, kind)? {
            Scalar::Int(n) => n as f64,
            Scalar::Real(x) => x,
        })),
    }
}

/// Reinterpret an integral value as an enum of `ty`.
pub fn to_enum(v: Value, ty: &Ty) -> Result<Value, RuntimeError> {
    let (Some(id), Some(n)) = (ty.host_id(), v.as_i128()) else {
        return Err(invalid_cast(&v, &ty.to_string()));
    };
    let value = i64::try_from(n).map_err(|_| RuntimeError::Overflow)?;
    Ok(Value::enum_value(id, value))
}
