//! Implicit and explicit conversions.

use std::sync::Arc;

use rill_core::{MemberDescriptor, MemberKind, PrimitiveKind, Ty, find_implicit_operator, implicit_numeric};

use super::{Binder, Site};
use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::elements::{Conversion, Element, ElementKind};

/// Cast-target keyword aliases. Matched case-insensitively.
pub fn builtin_type(name: &str) -> Option<Ty> {
    use PrimitiveKind::*;
    let kind = match name.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => Boolean,
        "char" => Char,
        "sbyte" => SByte,
        "byte" => Byte,
        "short" | "int16" => Int16,
        "ushort" | "uint16" => UInt16,
        "int" | "int32" => Int32,
        "uint" | "uint32" => UInt32,
        "long" | "int64" => Int64,
        "ulong" | "uint64" => UInt64,
        "float" | "single" => Single,
        "double" => Double,
        "string" => return Some(Ty::String),
        "object" => return Some(Ty::Object),
        "datetime" => return Some(Ty::DateTime),
        "timespan" => return Some(Ty::TimeSpan),
        _ => return None,
    };
    Some(Ty::Primitive(kind))
}

impl Binder<'_> {
    /// Conversion applied without a cast, or `None` when there is none.
    pub fn implicit_conversion(&self, from: &Ty, to: &Ty) -> Option<Conversion> {
        let catalog = self.catalog();
        if from == to {
            return Some(Conversion::Identity);
        }
        if matches!(from, Ty::Null) {
            return catalog.is_reference_type(to).then_some(Conversion::Identity);
        }
        if let (Some(a), Some(b)) = (from.primitive(), to.primitive()) {
            return implicit_numeric(a, b).then(|| Conversion::Numeric {
                to: b,
                checked: false,
                unsigned_source: a.is_unsigned(),
            });
        }
        if catalog.is_assignable(from, to) {
            if catalog.is_value_type(from) {
                return Some(Conversion::Box(to.clone()));
            }
            return Some(Conversion::Identity);
        }
        find_implicit_operator(catalog, from, to).map(Conversion::Operator)
    }

    /// Wrap `e` so its type becomes `to`.
    pub fn apply(&self, e: Element, conversion: Conversion, to: &Ty) -> Element {
        if matches!(conversion, Conversion::Identity) && &e.ty == to {
            return e;
        }
        let (span, start) = (e.span.clone(), e.start);
        Element::new(
            ElementKind::Cast {
                operand: Box::new(e),
                conversion,
            },
            to.clone(),
            span,
            start,
        )
    }

    /// Implicitly convert `e` to `to`, or fail with a type mismatch.
    pub fn convert(&self, e: Element, to: &Ty) -> Result<Element, SemanticError> {
        match self.implicit_conversion(&e.ty, to) {
            Some(conversion) => Ok(self.apply(e, conversion, to)),
            None => {
                let site = Site::new(e.span.clone(), e.start);
                Err(site.error(
                    SemanticErrorKind::TypeMismatch,
                    format!(
                        "cannot implicitly convert `{}` to `{}`",
                        self.type_name(&e.ty),
                        self.type_name(to)
                    ),
                ))
            }
        }
    }

    /// User operator named `name` taking exactly `from` and returning `to`.
    fn conversion_operators(&self, name: &str, from: &Ty, to: &Ty) -> Vec<Arc<MemberDescriptor>> {
        let mut out: Vec<Arc<MemberDescriptor>> = Vec::new();
        for ty in [from, to] {
            if ty.host_id().is_none() {
                continue;
            }
            for m in self
                .catalog()
                .find_members(ty, name, &[MemberKind::Operator], false)
            {
                let fits = m.params.len() == 1 && &m.params[0] == from && &m.return_ty == to;
                if fits && !out.iter().any(|o| Arc::ptr_eq(o, &m)) {
                    out.push(m);
                }
            }
        }
        out
    }

    pub fn explicit_conversion(
        &self,
        from: &Ty,
        to: &Ty,
        site: &Site,
    ) -> Result<Conversion, SemanticError> {
        let catalog = self.catalog();
        if from == to {
            return Ok(Conversion::Identity);
        }

        let mut operators = self.conversion_operators("Explicit", from, to);
        match operators.len() {
            0 => {}
            1 => return Ok(Conversion::Operator(operators.remove(0))),
            _ => {
                return Err(site.error(
                    SemanticErrorKind::AmbiguousMatch,
                    format!(
                        "explicit conversion from `{}` to `{}` is declared on both types",
                        self.type_name(from),
                        self.type_name(to)
                    ),
                ));
            }
        }

        if let Some(underlying) = catalog.enum_underlying(to) {
            let numeric_source = from.is_numeric() || catalog.is_enum(from);
            if numeric_source {
                return Ok(Conversion::ToEnum {
                    underlying,
                    ty: to.clone(),
                });
            }
        }
        if catalog.is_enum(from)
            && let Some(kind) = to.primitive().filter(|k| k.is_numeric())
        {
            return Ok(Conversion::FromEnum(kind));
        }

        if let Some(conversion) = self.implicit_conversion(from, to) {
            return Ok(conversion);
        }

        if let (Some(a), Some(b)) = (from.primitive(), to.primitive())
            && a.is_numeric()
            && b.is_numeric()
        {
            return Ok(Conversion::Numeric {
                to: b,
                checked: self.options().checked,
                unsigned_source: a.is_unsigned(),
            });
        }

        let from_is_box = matches!(from, Ty::Object) || catalog.is_interface(from);
        if from_is_box && catalog.is_value_type(to) {
            let unboxable = matches!(from, Ty::Object) || catalog.implements(to, from);
            if unboxable {
                return Ok(Conversion::Unbox(to.clone()));
            }
        }

        if catalog.is_reference_type(from) && catalog.is_reference_type(to) {
            let downcast = catalog.is_base_of(from, to);
            let interface_cast = (catalog.is_interface(from) && !catalog.is_sealed(to))
                || (catalog.is_interface(to) && !catalog.is_sealed(from))
                || (catalog.is_interface(from) && catalog.implements(to, from));
            if downcast || interface_cast {
                return Ok(Conversion::CastClass(to.clone()));
            }
        }

        Err(site.error(
            SemanticErrorKind::InvalidExplicitCast,
            format!("`{}` to `{}`", self.type_name(from), self.type_name(to)),
        ))
    }

    /// `cast(e, to)`.
    pub fn cast(&self, e: Element, to: Ty, site: &Site) -> Result<Element, SemanticError> {
        let conversion = self.explicit_conversion(&e.ty, &to, site)?;
        let mut out = self.apply(e, conversion, &to);
        out.span = site.span.clone();
        out.start = site.start;
        Ok(out)
    }

    /// Cast target: keyword alias for single names, else a catalog type.
    pub fn resolve_type_name(
        &self,
        dotted: &str,
        array: bool,
        site: &Site,
    ) -> Result<Ty, SemanticError> {
        let builtin = (!dotted.contains('.')).then(|| builtin_type(dotted)).flatten();
        let ty = builtin
            .or_else(|| self.catalog().find_type(dotted, self.ignore_case()))
            .ok_or_else(|| site.error(SemanticErrorKind::UndefinedType, dotted))?;
        Ok(if array { Ty::array_of(ty) } else { ty })
    }
}
