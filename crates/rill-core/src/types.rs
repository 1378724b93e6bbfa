//! Static types.
//!
//! `Ty` is what the compiler reasons about. Host types are opaque ids into a
//! `TypeCatalog`; everything else is built in.

use std::fmt;

/// Primitive kinds, in declaration order of the promotion matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 12] = [
        Self::Boolean,
        Self::Char,
        Self::SByte,
        Self::Byte,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Single,
        Self::Double,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index, used by the static tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Char => "Char",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Single => "Single",
            Self::Double => "Double",
        }
    }

    /// Everything except `Boolean` takes part in arithmetic.
    pub fn is_numeric(self) -> bool {
        self != Self::Boolean
    }

    /// Integral kinds, `Char` included.
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::Boolean | Self::Single | Self::Double)
    }

    pub fn is_real(self) -> bool {
        matches!(self, Self::Single | Self::Double)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::Char | Self::Byte | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    pub fn bit_width(self) -> u32 {
        match self {
            Self::Boolean => 1,
            Self::SByte | Self::Byte => 8,
            Self::Char | Self::Int16 | Self::UInt16 => 16,
            Self::Int32 | Self::UInt32 | Self::Single => 32,
            Self::Int64 | Self::UInt64 | Self::Double => 64,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of a host type inside its catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostTypeId(pub u32);

impl HostTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A static type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Primitive(PrimitiveKind),
    String,
    Object,
    DateTime,
    TimeSpan,
    /// Type of the `null` literal; converts to every reference type.
    Null,
    Host(HostTypeId),
    Array(Box<Ty>),
}

impl Ty {
    pub const BOOL: Ty = Ty::Primitive(PrimitiveKind::Boolean);
    pub const CHAR: Ty = Ty::Primitive(PrimitiveKind::Char);
    pub const I32: Ty = Ty::Primitive(PrimitiveKind::Int32);
    pub const U32: Ty = Ty::Primitive(PrimitiveKind::UInt32);
    pub const I64: Ty = Ty::Primitive(PrimitiveKind::Int64);
    pub const U64: Ty = Ty::Primitive(PrimitiveKind::UInt64);
    pub const F32: Ty = Ty::Primitive(PrimitiveKind::Single);
    pub const F64: Ty = Ty::Primitive(PrimitiveKind::Double);

    pub fn array_of(element: Ty) -> Ty {
        Ty::Array(Box::new(element))
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Ty::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        self.primitive() == Some(kind)
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_numeric)
    }

    pub fn is_integral(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_integral)
    }

    pub fn is_bool(&self) -> bool {
        self.is_primitive(PrimitiveKind::Boolean)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Ty::String)
    }

    pub fn array_element(&self) -> Option<&Ty> {
        match self {
            Ty::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn host_id(&self) -> Option<HostTypeId> {
        match self {
            Ty::Host(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<PrimitiveKind> for Ty {
    fn from(kind: PrimitiveKind) -> Self {
        Ty::Primitive(kind)
    }
}

/// Catalog-free rendering; host types print as `#id`.
///
/// Use `TypeCatalog::type_name` for user-facing names.
impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Primitive(kind) => write!(f, "{kind}"),
            Ty::String => f.write_str("String"),
            Ty::Object => f.write_str("Object"),
            Ty::DateTime => f.write_str("DateTime"),
            Ty::TimeSpan => f.write_str("TimeSpan"),
            Ty::Null => f.write_str("null"),
            Ty::Host(id) => write!(f, "#{}", id.0),
            Ty::Array(element) => write!(f, "{element}[]"),
        }
    }
}
