//! Runtime values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::colors::{Colors, Paint};
use crate::types::{HostTypeId, PrimitiveKind, Ty};

/// An opaque host object passed into an expression.
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Runtime type, checked by downcasts.
    fn type_of(&self) -> Ty;

    fn as_any(&self) -> &dyn Any;

    /// Text used by string concatenation.
    fn display(&self) -> String {
        format!("{self:?}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ty: HostTypeId,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    pub element: Ty,
    pub items: Vec<Value>,
}

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    DateTime(NaiveDateTime),
    TimeSpan(TimeDelta),
    Enum(EnumValue),
    Array(Arc<ArrayValue>),
    Object(Arc<dyn HostObject>),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn enum_value(ty: HostTypeId, value: i64) -> Self {
        Value::Enum(EnumValue { ty, value })
    }

    pub fn array(element: Ty, items: Vec<Value>) -> Self {
        Value::Array(Arc::new(ArrayValue { element, items }))
    }

    pub fn object(obj: impl HostObject + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Primitive kind of a primitive value.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        use PrimitiveKind::*;
        Some(match self {
            Value::Bool(_) => Boolean,
            Value::Char(_) => Char,
            Value::I8(_) => SByte,
            Value::U8(_) => Byte,
            Value::I16(_) => Int16,
            Value::U16(_) => UInt16,
            Value::I32(_) => Int32,
            Value::U32(_) => UInt32,
            Value::I64(_) => Int64,
            Value::U64(_) => UInt64,
            Value::F32(_) => Single,
            Value::F64(_) => Double,
            _ => return None,
        })
    }

    /// Dynamic type, as seen by downcasts and unboxing.
    pub fn runtime_type(&self) -> Ty {
        match self {
            Value::Null => Ty::Null,
            Value::String(_) => Ty::String,
            Value::DateTime(_) => Ty::DateTime,
            Value::TimeSpan(_) => Ty::TimeSpan,
            Value::Enum(e) => Ty::Host(e.ty),
            Value::Array(a) => Ty::array_of(a.element.clone()),
            Value::Object(o) => o.type_of(),
            _ => match self.kind() {
                Some(kind) => Ty::Primitive(kind),
                None => Ty::Object,
            },
        }
    }

    /// Integral payload widened to `i128`; enums yield their underlying value.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Char(c) => *c as u32 as i128,
            Value::I8(v) => *v as i128,
            Value::U8(v) => *v as i128,
            Value::I16(v) => *v as i128,
            Value::U16(v) => *v as i128,
            Value::I32(v) => *v as i128,
            Value::U32(v) => *v as i128,
            Value::I64(v) => *v as i128,
            Value::U64(v) => *v as i128,
            Value::Enum(e) => e.value as i128,
            _ => return None,
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// Render as colored output for terminals.
    pub fn format(&self, colors: Colors) -> String {
        match self {
            Value::Null => colors.paint(Paint::Muted, "null"),
            Value::String(s) => colors.paint(Paint::Text, format_args!("{s:?}")),
            Value::Char(c) => colors.paint(Paint::Text, format_args!("{c:?}")),
            Value::Array(a) => {
                let items: Vec<String> = a.items.iter().map(|v| v.format(colors)).collect();
                let sep = colors.paint(Paint::Muted, ", ");
                format!(
                    "{}{}{}",
                    colors.paint(Paint::Muted, "["),
                    items.join(&sep),
                    colors.paint(Paint::Muted, "]")
                )
            }
            Value::Bool(_)
            | Value::I8(_)
            | Value::U8(_)
            | Value::I16(_)
            | Value::U16(_)
            | Value::I32(_)
            | Value::U32(_)
            | Value::I64(_)
            | Value::U64(_)
            | Value::F32(_)
            | Value::F64(_) => colors.paint(Paint::Number, self),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (F32(a), F32(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (String(a), String(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (TimeSpan(a), TimeSpan(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            (Array(a), Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Object(a), Object(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

/// Formats like the host's `ToString`, used by string concatenation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Char(c) => write!(f, "{c}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::TimeSpan(t) => write!(f, "{}", format_time_span(*t)),
            Value::Enum(e) => write!(f, "{}", e.value),
            Value::Array(a) => {
                f.write_str("[")?;
                for (i, item) in a.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(o) => f.write_str(&o.display()),
        }
    }
}

/// `[-][d.]hh:mm:ss[.fffffff]`
fn format_time_span(t: TimeDelta) -> String {
    let negative = t < TimeDelta::zero();
    let t = if negative { -t } else { t };
    let days = t.num_days();
    let hours = t.num_hours() % 24;
    let minutes = t.num_minutes() % 60;
    let seconds = t.num_seconds() % 60;
    let ticks = t.subsec_nanos() / 100;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Enum(e) => serializer.serialize_i64(e.value),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.items.len()))?;
                for item in &a.items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::DateTime(_) | Value::TimeSpan(_) | Value::Object(_) => {
                serializer.serialize_str(&self.to_string())
            }
        }
    }
}
