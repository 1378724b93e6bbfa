//! Numeric promotion and implicit-conversion scoring.
//!
//! The promotion matrix is computed once from the implicit numeric conversion
//! table: the result of a binary operation is the first of
//! `Int32, UInt32, Int64, UInt64, Single, Double` both operands widen to.
//! Mixing `UInt64` with a signed integral kind has no result, as in C#.

use std::sync::LazyLock;

use crate::catalog::{MemberKind, TypeCatalog};
use crate::types::{PrimitiveKind, Ty};

use PrimitiveKind::*;

/// Candidate result kinds for arithmetic, narrowest first.
const OPERATION_KINDS: [PrimitiveKind; 6] = [Int32, UInt32, Int64, UInt64, Single, Double];

static PROMOTION: LazyLock<[[Option<PrimitiveKind>; PrimitiveKind::COUNT]; PrimitiveKind::COUNT]> =
    LazyLock::new(|| {
        let mut table = [[None; PrimitiveKind::COUNT]; PrimitiveKind::COUNT];
        for a in PrimitiveKind::ALL {
            for b in PrimitiveKind::ALL {
                table[a.index()][b.index()] = compute_promotion(a, b);
            }
        }
        table
    });

fn compute_promotion(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    let signed_integral = |k: PrimitiveKind| k.is_integral() && !k.is_unsigned();
    if (a == UInt64 && signed_integral(b)) || (b == UInt64 && signed_integral(a)) {
        return None;
    }
    OPERATION_KINDS
        .into_iter()
        .find(|&k| implicit_numeric(a, k) && implicit_numeric(b, k))
}

/// C# implicit numeric conversions, identity included.
pub fn implicit_numeric(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return true;
    }
    match from {
        SByte => matches!(to, Int16 | Int32 | Int64 | Single | Double),
        Byte => matches!(
            to,
            Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double
        ),
        Int16 => matches!(to, Int32 | Int64 | Single | Double),
        UInt16 | Char => matches!(to, Int32 | UInt32 | Int64 | UInt64 | Single | Double)
            || (from == Char && to == UInt16),
        Int32 => matches!(to, Int64 | Single | Double),
        UInt32 => matches!(to, Int64 | UInt64 | Single | Double),
        Int64 | UInt64 => matches!(to, Single | Double),
        Single => to == Double,
        Double | Boolean => false,
    }
}

/// Result kind of a binary arithmetic or comparison over two primitives.
pub fn binary_promotion(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    PROMOTION[a.index()][b.index()]
}

/// Kind a single operand is widened to before unary and shift operations.
pub fn unary_promotion(kind: PrimitiveKind) -> Option<PrimitiveKind> {
    if !kind.is_numeric() {
        return None;
    }
    OPERATION_KINDS
        .into_iter()
        .find(|&k| implicit_numeric(kind, k))
}

/// Representation rank used by widening scores.
pub fn numeric_rank(kind: PrimitiveKind) -> u32 {
    match kind {
        Boolean => 0,
        SByte | Byte => 1,
        Char | Int16 | UInt16 => 2,
        Int32 | UInt32 => 3,
        Int64 | UInt64 => 4,
        Single => 5,
        Double => 6,
    }
}

/// Relative conversion costs for overload scoring.
///
/// Only the ordering matters: identical < user operator < numeric widening <
/// interface < inheritance distance.
pub struct ConversionScore;

impl ConversionScore {
    pub const IDENTICAL: u32 = 0;
    pub const USER_OPERATOR: u32 = 1;
    pub const WIDENING_BASE: u32 = 2;
    pub const INTERFACE: u32 = 100;
    pub const INHERITANCE_STEP: u32 = 1000;
    pub const NULL_BASE: u32 = 1000;
    pub const NULL_STEP: u32 = 100;
}

/// Cost of implicitly converting `from` to `to`, or `None` when no implicit
/// conversion exists.
pub fn implicit_score<C: TypeCatalog + ?Sized>(catalog: &C, from: &Ty, to: &Ty) -> Option<u32> {
    if from == to {
        return Some(ConversionScore::IDENTICAL);
    }
    if matches!(from, Ty::Null) {
        if !catalog.is_reference_type(to) {
            return None;
        }
        let depth = catalog.inheritance_distance(to, &Ty::Object).unwrap_or(0);
        return Some(
            ConversionScore::NULL_BASE
                .saturating_sub(ConversionScore::NULL_STEP * depth)
                .max(ConversionScore::WIDENING_BASE),
        );
    }
    if let (Some(a), Some(b)) = (from.primitive(), to.primitive()) {
        return implicit_numeric(a, b).then(|| {
            ConversionScore::WIDENING_BASE + numeric_rank(b).saturating_sub(numeric_rank(a))
        });
    }
    if catalog.is_interface(to) && catalog.implements(from, to) {
        return Some(ConversionScore::INTERFACE);
    }
    if catalog.is_assignable(from, to) {
        let distance = catalog.inheritance_distance(from, to).unwrap_or(1).max(1);
        return Some(ConversionScore::INHERITANCE_STEP * distance);
    }
    find_implicit_operator(catalog, from, to).map(|_| ConversionScore::USER_OPERATOR)
}

/// User-defined `Implicit` operator converting `from` to `to`, declared on either type.
pub fn find_implicit_operator<C: TypeCatalog + ?Sized>(
    catalog: &C,
    from: &Ty,
    to: &Ty,
) -> Option<std::sync::Arc<crate::catalog::MemberDescriptor>> {
    [from, to]
        .into_iter()
        .filter(|t| t.host_id().is_some())
        .flat_map(|t| catalog.find_members(t, "Implicit", &[MemberKind::Operator], false))
        .find(|m| m.params.len() == 1 && &m.params[0] == from && &m.return_ty == to)
}
