//! Typed expression elements.
//!
//! The tree builder turns each production into an `Element` whose static
//! type is fixed on construction. Every operator decision (promotion,
//! overload, opcode choice) is made then, so emission only walks the tree.

mod literal;

#[cfg(test)]
mod literal_tests;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use rill_bytecode::{Instruction, LocalId};
use rill_core::{MemberDescriptor, PrimitiveKind, Ty, Value};

use crate::lexer::Position;

pub use literal::{
    LiteralError, parse_char, parse_date_time, parse_hex, parse_integer, parse_real, parse_string,
    parse_time_span,
};

/// A typed node of the expression tree.
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub ty: Ty,
    pub span: Range<usize>,
    pub start: Position,
}

impl Element {
    pub fn new(kind: ElementKind, ty: Ty, span: Range<usize>, start: Position) -> Self {
        Self {
            kind,
            ty,
            span,
            start,
        }
    }

    pub fn literal(value: Value, unsigned: bool, span: Range<usize>, start: Position) -> Self {
        let ty = match &value {
            Value::Null => Ty::Null,
            other => other.runtime_type(),
        };
        Self::new(
            ElementKind::Literal(Literal { value, unsigned }),
            ty,
            span,
            start,
        )
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ElementKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Span covering `self` through `other`.
    pub fn span_to(&self, other: &Element) -> Range<usize> {
        self.span.start.min(other.span.start)..self.span.end.max(other.span.end)
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    /// Written with a `u` or `ul` suffix. Such literals never fold into a
    /// negative constant.
    pub unsigned: bool,
}

/// What a member access or call is applied to.
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Static member.
    None,
    /// Instance member of the expression owner.
    Owner,
    Value(Box<Element>),
}

impl Receiver {
    pub fn is_some(&self) -> bool {
        !matches!(self, Receiver::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Power,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Power => "^",
        }
    }

    /// Name of the host operator method overloading this operation.
    pub fn operator_name(self) -> &'static str {
        match self {
            Self::Add => "Addition",
            Self::Sub => "Subtraction",
            Self::Mul => "Multiply",
            Self::Div => "Division",
            Self::Mod => "Modulus",
            Self::Power => "Exponent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    pub fn operator_name(self) -> &'static str {
        match self {
            Self::Eq => "Equality",
            Self::Ne => "Inequality",
            Self::Lt => "LessThan",
            Self::Gt => "GreaterThan",
            Self::Le => "LessThanOrEqual",
            Self::Ge => "GreaterThanOrEqual",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Left,
    Right,
}

impl ShiftOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Left => "<<",
            Self::Right => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ArithmeticCode {
    /// Both operands, then one instruction.
    Primitive(Instruction),
    /// Host operator method over both operands.
    Operator(Arc<MemberDescriptor>),
    /// `x ^ n` for a literal `n >= 0`, as multiplications in `kind`.
    Unrolled {
        kind: PrimitiveKind,
        exponent: u32,
        mul: Instruction,
    },
}

#[derive(Debug, Clone)]
pub enum CompareCode {
    /// Both operands, the instruction, then `Not` when `negate`.
    Primitive { instr: Instruction, negate: bool },
    Operator(Arc<MemberDescriptor>),
}

#[derive(Debug, Clone)]
pub enum NegateCode {
    Neg,
    /// `0 - x` with overflow checking.
    CheckedZero(PrimitiveKind),
    Operator(Arc<MemberDescriptor>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Array,
    Chars,
}

/// How a value is converted between two types.
#[derive(Debug, Clone)]
pub enum Conversion {
    Identity,
    Numeric {
        to: PrimitiveKind,
        checked: bool,
        unsigned_source: bool,
    },
    /// Value type to `Object` or an interface.
    Box(Ty),
    /// `Object` or an interface to a value type, checked at run time.
    Unbox(Ty),
    /// Reference downcast, checked at run time.
    CastClass(Ty),
    ToEnum {
        underlying: PrimitiveKind,
        ty: Ty,
    },
    /// Enum to a numeric kind.
    FromEnum(PrimitiveKind),
    /// User `Implicit` or `Explicit` operator.
    Operator(Arc<MemberDescriptor>),
}

#[derive(Debug, Clone)]
pub enum InTarget {
    /// `x in (a, b, c)`: the probe is cached in a local and compared pairwise.
    List {
        local: LocalId,
        comparisons: Vec<Element>,
    },
    Array(Box<Element>),
    /// Host collection probed through `Contains` or `ContainsKey`.
    Collection {
        target: Box<Element>,
        member: Arc<MemberDescriptor>,
    },
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    Literal(Literal),
    Variable(String),
    Local(LocalId),
    /// Field or property read.
    Member {
        receiver: Receiver,
        member: Arc<MemberDescriptor>,
    },
    Call {
        receiver: Receiver,
        member: Arc<MemberDescriptor>,
        args: Vec<Element>,
        /// Element type and values packed into the trailing variadic array.
        rest: Option<(Ty, Vec<Element>)>,
    },
    Index {
        target: Box<Element>,
        index: Box<Element>,
        kind: IndexKind,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Element>,
        right: Box<Element>,
        code: ArithmeticCode,
    },
    Compare {
        op: CompareOp,
        left: Box<Element>,
        right: Box<Element>,
        code: CompareCode,
    },
    Shift {
        op: ShiftOp,
        left: Box<Element>,
        right: Box<Element>,
        instr: Instruction,
    },
    Negate {
        operand: Box<Element>,
        code: NegateCode,
    },
    /// Logical on `Boolean`, complement on integrals.
    Not(Box<Element>),
    Logical {
        op: LogicalOp,
        left: Box<Element>,
        right: Box<Element>,
        short_circuit: bool,
    },
    Xor {
        left: Box<Element>,
        right: Box<Element>,
    },
    Cast {
        operand: Box<Element>,
        conversion: Conversion,
    },
    Conditional {
        condition: Box<Element>,
        then: Box<Element>,
        otherwise: Box<Element>,
    },
    In {
        probe: Box<Element>,
        target: InTarget,
    },
}

impl ElementKind {
    /// Short name, used by tree dumps.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Literal(_) => "Literal",
            Self::Variable(_) => "Variable",
            Self::Local(_) => "Local",
            Self::Member { .. } => "Member",
            Self::Call { .. } => "Call",
            Self::Index { .. } => "Index",
            Self::Arithmetic { .. } => "Arithmetic",
            Self::Compare { .. } => "Compare",
            Self::Shift { .. } => "Shift",
            Self::Negate { .. } => "Negate",
            Self::Not(_) => "Not",
            Self::Logical { .. } => "Logical",
            Self::Xor { .. } => "Xor",
            Self::Cast { .. } => "Cast",
            Self::Conditional { .. } => "Conditional",
            Self::In { .. } => "In",
        }
    }
}

/// Indented one-line-per-element rendering.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self, 0)
    }
}

fn write_element(f: &mut fmt::Formatter<'_>, e: &Element, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    write!(f, "{indent}{}", e.kind.name())?;
    match &e.kind {
        ElementKind::Literal(lit) => write!(f, " {:?}", lit.value.to_string())?,
        ElementKind::Variable(name) => write!(f, " {name}")?,
        ElementKind::Local(id) => write!(f, " L{}", id.0)?,
        ElementKind::Member { member, .. } | ElementKind::Call { member, .. } => {
            write!(f, " {}", member.name)?
        }
        ElementKind::Arithmetic { op, .. } => write!(f, " {}", op.symbol())?,
        ElementKind::Compare { op, .. } => write!(f, " {}", op.symbol())?,
        ElementKind::Shift { op, .. } => write!(f, " {}", op.symbol())?,
        ElementKind::Logical { op, .. } => write!(f, " {}", op.symbol())?,
        _ => {}
    }
    writeln!(f, " : {}", e.ty)?;
    for child in children(e) {
        write_element(f, child, depth + 1)?;
    }
    Ok(())
}

/// Direct sub-elements in evaluation order.
pub fn children(e: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    match &e.kind {
        ElementKind::Literal(_) | ElementKind::Variable(_) | ElementKind::Local(_) => {}
        ElementKind::Member { receiver, .. } => {
            if let Receiver::Value(r) = receiver {
                out.push(r.as_ref());
            }
        }
        ElementKind::Call {
            receiver,
            args,
            rest,
            ..
        } => {
            if let Receiver::Value(r) = receiver {
                out.push(r.as_ref());
            }
            out.extend(args);
            if let Some((_, items)) = rest {
                out.extend(items);
            }
        }
        ElementKind::Index { target, index, .. } => {
            out.push(target);
            out.push(index);
        }
        ElementKind::Arithmetic { left, right, .. }
        | ElementKind::Compare { left, right, .. }
        | ElementKind::Shift { left, right, .. }
        | ElementKind::Logical { left, right, .. }
        | ElementKind::Xor { left, right } => {
            out.push(left);
            out.push(right);
        }
        ElementKind::Negate { operand, .. }
        | ElementKind::Not(operand)
        | ElementKind::Cast { operand, .. } => out.push(operand),
        ElementKind::Conditional {
            condition,
            then,
            otherwise,
        } => {
            out.push(condition);
            out.push(then);
            out.push(otherwise);
        }
        ElementKind::In { probe, target } => {
            out.push(probe);
            match target {
                InTarget::List { comparisons, .. } => out.extend(comparisons),
                InTarget::Array(t) | InTarget::Collection { target: t, .. } => out.push(t),
            }
        }
    }
    out
}
