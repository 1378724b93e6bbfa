//! Operator typing.
//!
//! Priority per operator: a host operator overload on either operand type,
//! then primitive promotion, then the special cases (strings, temporal
//! values, enums, references).

use std::sync::Arc;

use rill_bytecode::Instruction;
use rill_core::{
    MemberDescriptor, MemberKind, PrimitiveKind, Ty, binary_promotion, implicit_score,
    unary_promotion,
};

use super::{Binder, Site};
use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::elements::{
    ArithmeticCode, ArithmeticOp, CompareCode, CompareOp, Conversion, Element, ElementKind,
    InTarget, LogicalOp, NegateCode, ShiftOp,
};

fn arithmetic_instruction(op: ArithmeticOp, kind: PrimitiveKind, checked: bool) -> Instruction {
    let overflow = checked && kind.is_integral();
    let unsigned = kind.is_unsigned();
    match op {
        ArithmeticOp::Add if overflow && unsigned => Instruction::AddOvfUn,
        ArithmeticOp::Add if overflow => Instruction::AddOvf,
        ArithmeticOp::Add => Instruction::Add,
        ArithmeticOp::Sub if overflow && unsigned => Instruction::SubOvfUn,
        ArithmeticOp::Sub if overflow => Instruction::SubOvf,
        ArithmeticOp::Sub => Instruction::Sub,
        ArithmeticOp::Mul if overflow && unsigned => Instruction::MulOvfUn,
        ArithmeticOp::Mul if overflow => Instruction::MulOvf,
        ArithmeticOp::Mul => Instruction::Mul,
        ArithmeticOp::Div if unsigned => Instruction::DivUn,
        ArithmeticOp::Div => Instruction::Div,
        ArithmeticOp::Mod if unsigned => Instruction::RemUn,
        ArithmeticOp::Mod => Instruction::Rem,
        ArithmeticOp::Power => Instruction::Pow,
    }
}

/// Ordered comparison over a promoted kind. `<=` and `>=` are the negated
/// opposite test; on reals the opposite test is the unordered form so NaN
/// compares false both ways.
fn compare_code(op: CompareOp, unsigned: bool, real: bool) -> CompareCode {
    let lt = if unsigned { Instruction::CltUn } else { Instruction::Clt };
    let gt = if unsigned { Instruction::CgtUn } else { Instruction::Cgt };
    let (instr, negate) = match op {
        CompareOp::Eq => (Instruction::Ceq, false),
        CompareOp::Ne => (Instruction::Ceq, true),
        CompareOp::Lt => (lt, false),
        CompareOp::Gt => (gt, false),
        CompareOp::Le if real => (Instruction::CgtUn, true),
        CompareOp::Le => (gt, true),
        CompareOp::Ge if real => (Instruction::CltUn, true),
        CompareOp::Ge => (lt, true),
    };
    CompareCode::Primitive { instr, negate }
}

fn boxed(e: Element) -> Box<Element> {
    Box::new(e)
}

impl Binder<'_> {
    fn not_defined(&self, symbol: &str, left: &Ty, right: &Ty, site: &Site) -> SemanticError {
        site.error(
            SemanticErrorKind::OperationNotDefined,
            format!(
                "`{symbol}` is not defined for types `{}` and `{}`",
                self.type_name(left),
                self.type_name(right)
            ),
        )
    }

    fn not_defined_unary(&self, symbol: &str, operand: &Ty, site: &Site) -> SemanticError {
        site.error(
            SemanticErrorKind::OperationNotDefined,
            format!(
                "`{symbol}` is not defined for type `{}`",
                self.type_name(operand)
            ),
        )
    }

    /// Host operator `name` applicable to `operands`, declared on any of
    /// their types or ancestors.
    fn find_operator(
        &self,
        name: &str,
        operands: &[&Ty],
        site: &Site,
    ) -> Result<Option<Arc<MemberDescriptor>>, SemanticError> {
        if operands.iter().all(|t| t.host_id().is_none()) {
            return Ok(None);
        }
        let catalog = self.catalog();
        let mut candidates: Vec<Arc<MemberDescriptor>> = Vec::new();
        for ty in operands.iter().filter(|t| t.host_id().is_some()) {
            for m in self.visible_members(ty, name, &[MemberKind::Operator], site)? {
                if !candidates.iter().any(|c| Arc::ptr_eq(c, &m)) {
                    candidates.push(m);
                }
            }
        }
        let mut applicable: Vec<Arc<MemberDescriptor>> = candidates
            .into_iter()
            .filter(|m| {
                m.params.len() == operands.len()
                    && operands
                        .iter()
                        .zip(&m.params)
                        .all(|(arg, param)| implicit_score(catalog, arg, param).is_some())
            })
            .collect();
        match applicable.len() {
            0 => Ok(None),
            1 => Ok(applicable.pop()),
            n => {
                let types: Vec<String> = operands
                    .iter()
                    .map(|t| format!("`{}`", self.type_name(t)))
                    .collect();
                Err(site.error(
                    SemanticErrorKind::AmbiguousMatch,
                    format!(
                        "{n} `{name}` operators accept ({})",
                        types.join(", ")
                    ),
                ))
            }
        }
    }

    /// Convert both operands to the operator's parameters.
    fn operator_operands(
        &self,
        member: &MemberDescriptor,
        left: Element,
        right: Element,
    ) -> Result<(Box<Element>, Box<Element>), SemanticError> {
        let left = self.convert(left, &member.params[0])?;
        let right = self.convert(right, &member.params[1])?;
        Ok((boxed(left), boxed(right)))
    }

    fn promote(&self, e: Element, kind: PrimitiveKind) -> Result<Element, SemanticError> {
        self.convert(e, &Ty::Primitive(kind))
    }

    pub fn arithmetic(
        &self,
        op: ArithmeticOp,
        left: Element,
        right: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let (lt, rt) = (left.ty.clone(), right.ty.clone());
        let make = |code, ty, left, right| {
            Element::new(
                ElementKind::Arithmetic {
                    op,
                    left,
                    right,
                    code,
                },
                ty,
                site.span.clone(),
                site.start,
            )
        };

        if let Some(member) = self.find_operator(op.operator_name(), &[&lt, &rt], site)? {
            let ty = member.return_ty.clone();
            let (l, r) = self.operator_operands(&member, left, right)?;
            return Ok(make(ArithmeticCode::Operator(member), ty, l, r));
        }

        if op == ArithmeticOp::Power {
            return self.power(left, right, site);
        }

        if op == ArithmeticOp::Add && (lt.is_string() || rt.is_string()) {
            let code = ArithmeticCode::Primitive(Instruction::Concat);
            return Ok(make(code, Ty::String, boxed(left), boxed(right)));
        }

        let temporal = match (op, &lt, &rt) {
            (ArithmeticOp::Sub, Ty::DateTime, Ty::DateTime) => Some(Ty::TimeSpan),
            (ArithmeticOp::Add | ArithmeticOp::Sub, Ty::DateTime, Ty::TimeSpan) => {
                Some(Ty::DateTime)
            }
            (ArithmeticOp::Add | ArithmeticOp::Sub, Ty::TimeSpan, Ty::TimeSpan) => {
                Some(Ty::TimeSpan)
            }
            _ => None,
        };
        if let Some(ty) = temporal {
            let instr = arithmetic_instruction(op, PrimitiveKind::Int64, false);
            let code = ArithmeticCode::Primitive(instr);
            return Ok(make(code, ty, boxed(left), boxed(right)));
        }

        let promoted = match (lt.primitive(), rt.primitive()) {
            (Some(a), Some(b)) => binary_promotion(a, b),
            _ => None,
        };
        let Some(kind) = promoted else {
            return Err(self.not_defined(op.symbol(), &lt, &rt, site));
        };
        let instr = arithmetic_instruction(op, kind, self.options().checked);
        let (l, r) = (self.promote(left, kind)?, self.promote(right, kind)?);
        Ok(make(
            ArithmeticCode::Primitive(instr),
            Ty::Primitive(kind),
            boxed(l),
            boxed(r),
        ))
    }

    /// `x ^ n` unrolls into multiplications in `x`'s promoted kind for any
    /// literal `n >= 0`; everything else is `Pow` over doubles.
    fn power(&self, left: Element, right: Element, site: &Site) -> Result<Element, SemanticError> {
        let (lt, rt) = (left.ty.clone(), right.ty.clone());
        let literal_exponent = right.as_literal().and_then(|lit| match lit.value {
            rill_core::Value::I32(n) => u32::try_from(n).ok(),
            _ => None,
        });

        if let (Some(exponent), Some(kind)) =
            (literal_exponent, lt.primitive().and_then(unary_promotion))
        {
            let mul = arithmetic_instruction(ArithmeticOp::Mul, kind, self.options().checked);
            let left = self.promote(left, kind)?;
            return Ok(Element::new(
                ElementKind::Arithmetic {
                    op: ArithmeticOp::Power,
                    left: boxed(left),
                    right: boxed(right),
                    code: ArithmeticCode::Unrolled {
                        kind,
                        exponent,
                        mul,
                    },
                },
                Ty::Primitive(kind),
                site.span.clone(),
                site.start,
            ));
        }

        if !lt.is_numeric() || !rt.is_numeric() {
            return Err(self.not_defined("^", &lt, &rt, site));
        }
        let (l, r) = (self.convert(left, &Ty::F64)?, self.convert(right, &Ty::F64)?);
        Ok(Element::new(
            ElementKind::Arithmetic {
                op: ArithmeticOp::Power,
                left: boxed(l),
                right: boxed(r),
                code: ArithmeticCode::Primitive(Instruction::Pow),
            },
            Ty::F64,
            site.span.clone(),
            site.start,
        ))
    }

    pub fn compare(
        &self,
        op: CompareOp,
        left: Element,
        right: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let catalog = self.catalog();
        let (lt, rt) = (left.ty.clone(), right.ty.clone());
        let make = |code, left, right| {
            Element::new(
                ElementKind::Compare {
                    op,
                    left,
                    right,
                    code,
                },
                Ty::BOOL,
                site.span.clone(),
                site.start,
            )
        };

        if let Some(member) = self.find_operator(op.operator_name(), &[&lt, &rt], site)? {
            let (l, r) = self.operator_operands(&member, left, right)?;
            return Ok(make(CompareCode::Operator(member), l, r));
        }

        if let (Some(a), Some(b)) = (lt.primitive(), rt.primitive()) {
            if a == PrimitiveKind::Boolean && b == PrimitiveKind::Boolean {
                if !op.is_equality() {
                    return Err(self.not_defined(op.symbol(), &lt, &rt, site));
                }
                let code = compare_code(op, false, false);
                return Ok(make(code, boxed(left), boxed(right)));
            }
            let Some(kind) = binary_promotion(a, b) else {
                return Err(self.not_defined(op.symbol(), &lt, &rt, site));
            };
            let code = compare_code(op, kind.is_integral() && kind.is_unsigned(), kind.is_real());
            let (l, r) = (self.promote(left, kind)?, self.promote(right, kind)?);
            return Ok(make(code, boxed(l), boxed(r)));
        }

        let stringish = |t: &Ty| t.is_string() || matches!(t, Ty::Null);
        if op.is_equality() && stringish(&lt) && stringish(&rt) && (lt.is_string() || rt.is_string())
        {
            let code = CompareCode::Primitive {
                instr: Instruction::StrEq(self.options().string_comparison),
                negate: op == CompareOp::Ne,
            };
            return Ok(make(code, boxed(left), boxed(right)));
        }

        if lt == rt
            && let Some(underlying) = catalog.enum_underlying(&lt)
        {
            let kind = unary_promotion(underlying).unwrap_or(PrimitiveKind::Int64);
            let to = Ty::Primitive(kind);
            let l = self.apply(left, Conversion::FromEnum(kind), &to);
            let r = self.apply(right, Conversion::FromEnum(kind), &to);
            let code = compare_code(op, kind.is_unsigned(), false);
            return Ok(make(code, boxed(l), boxed(r)));
        }

        if lt == rt && matches!(lt, Ty::DateTime | Ty::TimeSpan) {
            let code = compare_code(op, false, false);
            return Ok(make(code, boxed(left), boxed(right)));
        }

        if op.is_equality() && self.reference_comparable(&lt, &rt) {
            return Ok(make(compare_code(op, false, false), boxed(left), boxed(right)));
        }

        Err(self.not_defined(op.symbol(), &lt, &rt, site))
    }

    fn reference_comparable(&self, a: &Ty, b: &Ty) -> bool {
        let catalog = self.catalog();
        let is_ref = |t: &Ty| matches!(t, Ty::Null) || catalog.is_reference_type(t);
        if !is_ref(a) || !is_ref(b) {
            return false;
        }
        matches!(a, Ty::Null)
            || matches!(b, Ty::Null)
            || catalog.is_assignable(a, b)
            || catalog.is_assignable(b, a)
            || catalog.is_interface(a)
            || catalog.is_interface(b)
    }

    /// `<<` and `>>`: the left operand decides the result kind, the count is
    /// narrowed to `Int32`.
    pub fn shift(
        &self,
        op: ShiftOp,
        left: Element,
        right: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let (lt, rt) = (left.ty.clone(), right.ty.clone());
        let kind = lt
            .primitive()
            .filter(|k| k.is_integral())
            .and_then(unary_promotion);
        let (Some(kind), true) = (kind, rt.is_integral()) else {
            return Err(self.not_defined(op.symbol(), &lt, &rt, site));
        };
        let left = self.promote(left, kind)?;
        let right = match self.implicit_conversion(&rt, &Ty::I32) {
            Some(conversion) => self.apply(right, conversion, &Ty::I32),
            None => {
                let narrow = Conversion::Numeric {
                    to: PrimitiveKind::Int32,
                    checked: false,
                    unsigned_source: rt.primitive().is_some_and(|k| k.is_unsigned()),
                };
                self.apply(right, narrow, &Ty::I32)
            }
        };
        let instr = match op {
            ShiftOp::Left => Instruction::Shl,
            ShiftOp::Right if kind.is_unsigned() => Instruction::ShrUn,
            ShiftOp::Right => Instruction::Shr,
        };
        Ok(Element::new(
            ElementKind::Shift {
                op,
                left: boxed(left),
                right: boxed(right),
                instr,
            },
            Ty::Primitive(kind),
            site.span.clone(),
            site.start,
        ))
    }

    /// Promoted integral kind shared by two bitwise operands.
    fn bitwise_kind(&self, lt: &Ty, rt: &Ty) -> Option<PrimitiveKind> {
        let (a, b) = (lt.primitive()?, rt.primitive()?);
        if !a.is_integral() || !b.is_integral() {
            return None;
        }
        binary_promotion(a, b)
    }

    pub fn logical(
        &self,
        op: LogicalOp,
        left: Element,
        right: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let (lt, rt) = (left.ty.clone(), right.ty.clone());
        let (ty, short_circuit, left, right) = if lt.is_bool() && rt.is_bool() {
            (Ty::BOOL, true, left, right)
        } else if let Some(kind) = self.bitwise_kind(&lt, &rt) {
            let (l, r) = (self.promote(left, kind)?, self.promote(right, kind)?);
            (Ty::Primitive(kind), false, l, r)
        } else {
            return Err(self.not_defined(op.symbol(), &lt, &rt, site));
        };
        Ok(Element::new(
            ElementKind::Logical {
                op,
                left: boxed(left),
                right: boxed(right),
                short_circuit,
            },
            ty,
            site.span.clone(),
            site.start,
        ))
    }

    pub fn xor(&self, left: Element, right: Element, site: &Site) -> Result<Element, SemanticError> {
        let (lt, rt) = (left.ty.clone(), right.ty.clone());
        let (ty, left, right) = if lt.is_bool() && rt.is_bool() {
            (Ty::BOOL, left, right)
        } else if let Some(kind) = self.bitwise_kind(&lt, &rt) {
            let (l, r) = (self.promote(left, kind)?, self.promote(right, kind)?);
            (Ty::Primitive(kind), l, r)
        } else {
            return Err(self.not_defined("XOR", &lt, &rt, site));
        };
        Ok(Element::new(
            ElementKind::Xor {
                left: boxed(left),
                right: boxed(right),
            },
            ty,
            site.span.clone(),
            site.start,
        ))
    }

    pub fn not(&self, operand: Element, site: &Site) -> Result<Element, SemanticError> {
        let ty = operand.ty.clone();
        let (ty, operand) = if ty.is_bool() {
            (Ty::BOOL, operand)
        } else if let Some(kind) = ty
            .primitive()
            .filter(|k| k.is_integral())
            .and_then(unary_promotion)
        {
            (Ty::Primitive(kind), self.promote(operand, kind)?)
        } else {
            return Err(self.not_defined_unary("NOT", &ty, site));
        };
        Ok(Element::new(
            ElementKind::Not(boxed(operand)),
            ty,
            site.span.clone(),
            site.start,
        ))
    }

    pub fn negate(&self, operand: Element, site: &Site) -> Result<Element, SemanticError> {
        let ty = operand.ty.clone();
        let make = |code, ty, operand| {
            Element::new(
                ElementKind::Negate {
                    operand: boxed(operand),
                    code,
                },
                ty,
                site.span.clone(),
                site.start,
            )
        };

        if let Some(member) = self.find_operator("UnaryNegation", &[&ty], site)? {
            let result = member.return_ty.clone();
            let operand = self.convert(operand, &member.params[0])?;
            return Ok(make(NegateCode::Operator(member), result, operand));
        }

        if matches!(ty, Ty::TimeSpan) {
            return Ok(make(NegateCode::Neg, Ty::TimeSpan, operand));
        }

        let kind = match ty.primitive().and_then(unary_promotion) {
            Some(PrimitiveKind::UInt32) => PrimitiveKind::Int64,
            Some(PrimitiveKind::UInt64) | None => {
                return Err(self.not_defined_unary("-", &ty, site));
            }
            Some(kind) => kind,
        };
        let operand = self.promote(operand, kind)?;
        let code = if self.options().checked && kind.is_integral() {
            NegateCode::CheckedZero(kind)
        } else {
            NegateCode::Neg
        };
        Ok(make(code, Ty::Primitive(kind), operand))
    }

    /// `if(condition, then, otherwise)`.
    pub fn conditional(
        &self,
        condition: Element,
        then: Element,
        otherwise: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        if !condition.ty.is_bool() {
            let at = Site::new(condition.span.clone(), condition.start);
            return Err(at.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "condition must be `Boolean`, found `{}`",
                    self.type_name(&condition.ty)
                ),
            ));
        }
        let (tt, et) = (then.ty.clone(), otherwise.ty.clone());
        let ty = if self.implicit_conversion(&et, &tt).is_some() {
            tt
        } else if self.implicit_conversion(&tt, &et).is_some() {
            et
        } else {
            return Err(site.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "branches `{}` and `{}` have no common type",
                    self.type_name(&tt),
                    self.type_name(&et)
                ),
            ));
        };
        let then = self.convert(then, &ty)?;
        let otherwise = self.convert(otherwise, &ty)?;
        Ok(Element::new(
            ElementKind::Conditional {
                condition: boxed(condition),
                then: boxed(then),
                otherwise: boxed(otherwise),
            },
            ty,
            site.span.clone(),
            site.start,
        ))
    }

    /// `probe in (a, b, ...)`: the probe is stored in a local and compared
    /// with each item in turn.
    pub fn in_list(
        &mut self,
        probe: Element,
        items: Vec<Element>,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let local = self.alloc_local(probe.ty.clone());
        let mut comparisons = Vec::with_capacity(items.len());
        for item in items {
            let at = Site::new(item.span.clone(), item.start);
            let cached = Element::new(
                ElementKind::Local(local),
                probe.ty.clone(),
                probe.span.clone(),
                probe.start,
            );
            let cmp = self.compare(CompareOp::Eq, cached, item, &at)?;
            if !cmp.ty.is_bool() {
                return Err(at.error(
                    SemanticErrorKind::TypeMismatch,
                    format!(
                        "equality of `{}` does not yield `Boolean`",
                        self.type_name(&probe.ty)
                    ),
                ));
            }
            comparisons.push(cmp);
        }
        Ok(Element::new(
            ElementKind::In {
                probe: boxed(probe),
                target: InTarget::List { local, comparisons },
            },
            Ty::BOOL,
            site.span.clone(),
            site.start,
        ))
    }

    /// `probe in target` for arrays and host collections.
    pub fn in_collection(
        &self,
        probe: Element,
        target: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let make = |probe, target| {
            Element::new(
                ElementKind::In {
                    probe: boxed(probe),
                    target,
                },
                Ty::BOOL,
                site.span.clone(),
                site.start,
            )
        };

        if let Some(element) = target.ty.array_element().cloned() {
            let probe = self.convert(probe, &element)?;
            return Ok(make(probe, InTarget::Array(boxed(target))));
        }

        let Some(shape) = self.catalog().collection_shape(&target.ty) else {
            return Err(site.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "`{}` is not a collection",
                    self.type_name(&target.ty)
                ),
            ));
        };
        let method = shape.contains_method();
        let member = self
            .visible_members(&target.ty, method, &[MemberKind::Method], site)?
            .into_iter()
            .find(|m| !m.is_static && m.params.len() == 1)
            .ok_or_else(|| {
                site.error(
                    SemanticErrorKind::UndefinedMember,
                    format!("`{method}` on type `{}`", self.type_name(&target.ty)),
                )
            })?;
        let probe = self.convert(probe, &member.params[0])?;
        Ok(make(
            probe,
            InTarget::Collection {
                target: boxed(target),
                member,
            },
        ))
    }
}
