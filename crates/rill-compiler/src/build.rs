//! Parse-tree analyzer that turns the expression grammar into typed elements.
//!
//! Runs inside the parser: every production is reduced as soon as it is
//! complete, so a semantic error stops the parse at the first offending
//! construct. Token leaves become literals or names; productions combine
//! their children's values through the `Binder` typing rules.

use rill_core::{Ty, Value};

use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::elements::{
    ArithmeticOp, CompareOp, Element, LiteralError, LogicalOp, ShiftOp, parse_char,
    parse_date_time, parse_hex, parse_integer, parse_real, parse_string, parse_time_span,
};
use crate::grammar::{Analyzer, Node, PatternId};
use crate::lexer::TokenId;
use crate::resolve::{Binder, Chain, Site};
use crate::scope::Scope;
use crate::syntax::productions::*;
use crate::syntax::tokens::*;

/// Value staged on a parse-tree node.
#[derive(Debug, Clone)]
pub enum Item {
    Element(Element),
    Name(String),
    /// `name` or `name(args)`, not yet bound to a receiver.
    Access {
        name: String,
        args: Option<Vec<Element>>,
    },
    Arguments(Vec<Element>),
    TypeName(Ty),
}

/// A reduced child: a bare token, or one value with the child's location.
#[derive(Debug)]
enum Part {
    Token(TokenId, Site),
    Item(Item, Site),
}

impl Part {
    fn site(&self) -> &Site {
        match self {
            Part::Token(_, site) | Part::Item(_, site) => site,
        }
    }
}

fn internal(site: &Site, detail: impl AsRef<str>) -> SemanticError {
    site.error(SemanticErrorKind::Internal, detail)
}

fn node_site<V>(node: &Node<V>) -> Site {
    Site::new(node.span.clone(), node.start)
}

/// Children of `node` in order. Tokens without values stay tokens.
fn parts(node: &mut Node<Item>) -> Vec<Part> {
    let mut out = Vec::new();
    for mut child in node.take_children() {
        let site = node_site(&child);
        let values = child.take_values();
        if values.is_empty() {
            if let Some(id) = child.token_id() {
                out.push(Part::Token(id, site));
            }
            continue;
        }
        out.extend(values.into_iter().map(|v| Part::Item(v, site.clone())));
    }
    out
}

fn expect_element(part: Option<Part>, at: &Site) -> Result<Element, SemanticError> {
    match part {
        Some(Part::Item(Item::Element(e), _)) => Ok(e),
        Some(other) => Err(internal(other.site(), "expected an expression")),
        None => Err(internal(at, "missing operand")),
    }
}

/// `-literal` written directly against an integer token.
fn fold_negative(literal: &Element) -> Option<Value> {
    let lit = literal.as_literal()?;
    match lit.value {
        Value::I32(v) => Some(Value::I32(-v)),
        Value::I64(v) => Some(Value::I64(-v)),
        Value::U32(v) if !lit.unsigned && v == 1 << 31 => Some(Value::I32(i32::MIN)),
        Value::U64(v) if !lit.unsigned && v == 1 << 63 => Some(Value::I64(i64::MIN)),
        _ => None,
    }
}

/// Builds typed elements for one expression.
pub struct TreeBuilder<'s> {
    binder: Binder<'s>,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(scope: &'s Scope) -> Self {
        Self {
            binder: Binder::new(scope),
        }
    }

    /// Convert the root to the scope's expected type, when one is set.
    pub fn finish(&self, root: Element) -> Result<Element, SemanticError> {
        match self.binder.scope().expected_type() {
            Some(ty) => self.binder.convert(root, ty),
            None => Ok(root),
        }
    }

    /// Types of the locals allocated while building.
    pub fn into_locals(self) -> Vec<Ty> {
        self.binder.into_locals()
    }

    fn literal(&self, id: TokenId, image: &str, site: &Site) -> Result<Option<Item>, SemanticError> {
        let options = self.binder.options();
        let plain = |r: Result<Value, LiteralError>| r.map(|v| (v, false));
        let parsed = match id {
            INTEGER => parse_integer(image, options.integers_as_doubles),
            REAL => plain(parse_real(
                image,
                options.decimal_separator,
                options.real_literal_type,
            )),
            HEX => parse_hex(image),
            STRING => plain(parse_string(image)),
            CHAR => plain(parse_char(image)),
            DATETIME => plain(parse_date_time(image, &options.date_time_format)),
            TIMESPAN => plain(parse_time_span(image)),
            TRUE => Ok((Value::Bool(true), false)),
            FALSE => Ok((Value::Bool(false), false)),
            NULL => Ok((Value::Null, false)),
            IDENTIFIER => return Ok(Some(Item::Name(image.to_string()))),
            _ => return Ok(None),
        };
        let (value, unsigned) = parsed.map_err(|e| site.error(e.kind(), e.detail()))?;
        Ok(Some(Item::Element(Element::literal(
            value,
            unsigned,
            site.span.clone(),
            site.start,
        ))))
    }

    fn binary(
        &self,
        op: TokenId,
        left: Element,
        right: Element,
        site: &Site,
    ) -> Result<Element, SemanticError> {
        let b = &self.binder;
        match op {
            ADD => b.arithmetic(ArithmeticOp::Add, left, right, site),
            SUB => b.arithmetic(ArithmeticOp::Sub, left, right, site),
            MUL => b.arithmetic(ArithmeticOp::Mul, left, right, site),
            DIV => b.arithmetic(ArithmeticOp::Div, left, right, site),
            MOD => b.arithmetic(ArithmeticOp::Mod, left, right, site),
            POWER => b.arithmetic(ArithmeticOp::Power, left, right, site),
            EQ => b.compare(CompareOp::Eq, left, right, site),
            NE => b.compare(CompareOp::Ne, left, right, site),
            LT => b.compare(CompareOp::Lt, left, right, site),
            GT => b.compare(CompareOp::Gt, left, right, site),
            LTE => b.compare(CompareOp::Le, left, right, site),
            GTE => b.compare(CompareOp::Ge, left, right, site),
            SHL => b.shift(ShiftOp::Left, left, right, site),
            SHR => b.shift(ShiftOp::Right, left, right, site),
            AND => b.logical(LogicalOp::And, left, right, site),
            OR => b.logical(LogicalOp::Or, left, right, site),
            XOR => b.xor(left, right, site),
            other => Err(internal(site, format!("{other} is not a binary operator"))),
        }
    }

    /// `operand {op operand}`, folded to the left.
    fn operator_chain(&self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut iter = parts.into_iter();
        let mut left = expect_element(iter.next(), at)?;
        while let Some(part) = iter.next() {
            let (op, op_site) = match part {
                Part::Token(op, site) => (op, site),
                Part::Item(_, site) => return Err(internal(&site, "expected an operator")),
            };
            let right = expect_element(iter.next(), &op_site)?;
            let site = Site::new(left.span.start..right.span.end, left.start);
            left = self.binary(op, left, right, &site)?;
        }
        Ok(left)
    }

    fn not(&self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut iter = parts.into_iter().peekable();
        let negated = matches!(iter.peek(), Some(Part::Token(NOT, _)));
        if negated {
            iter.next();
        }
        let operand = expect_element(iter.next(), at)?;
        if negated {
            self.binder.not(operand, at)
        } else {
            Ok(operand)
        }
    }

    fn negate(&self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut iter = parts.into_iter();
        let first = iter.next();
        if !matches!(first, Some(Part::Token(SUB, _))) {
            return expect_element(first, at);
        }
        let next = iter.next();
        let bare = matches!(&next, Some(Part::Item(Item::Element(e), site)) if e.span == site.span);
        let operand = expect_element(next, at)?;
        if bare && let Some(value) = fold_negative(&operand) {
            return Ok(Element::literal(value, false, at.span.clone(), at.start));
        }
        self.binder.negate(operand, at)
    }

    fn in_expression(&mut self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut iter = parts.into_iter();
        let probe = expect_element(iter.next(), at)?;
        match iter.next() {
            None => Ok(probe),
            Some(Part::Token(IN, _)) => {
                let target = iter.find(|p| matches!(p, Part::Item(..)));
                match target {
                    Some(Part::Item(Item::Arguments(items), _)) => {
                        self.binder.in_list(probe, items, at)
                    }
                    Some(Part::Item(Item::Element(target), _)) => {
                        self.binder.in_collection(probe, target, at)
                    }
                    _ => Err(internal(at, "malformed `in` target")),
                }
            }
            Some(other) => Err(internal(other.site(), "expected `in`")),
        }
    }

    /// `head {"." access | "[" arguments "]"}` resolved left to right.
    fn member_chain(&self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut iter = parts.into_iter();
        let (mut chain, origin) = match iter.next() {
            Some(Part::Item(Item::Element(e), site)) => (Chain::Value(e), site),
            Some(Part::Item(Item::Access { name, args }, site)) => {
                (self.binder.resolve_root(&name, args, &site)?, site)
            }
            other => {
                let site = other.as_ref().map_or(at, Part::site);
                return Err(internal(site, "expected a member chain head"));
            }
        };

        while let Some(part) = iter.next() {
            match part {
                Part::Token(DOT, _) => {
                    let Some(Part::Item(Item::Access { name, args }, step)) = iter.next() else {
                        return Err(internal(at, "expected a member after `.`"));
                    };
                    let site = Site::new(origin.span.start..step.span.end, origin.start);
                    chain = self.binder.resolve_member(chain, &name, args, &site)?;
                }
                Part::Token(LEFT_BRACKET, _) => {
                    let Some(Part::Item(Item::Arguments(args), _)) = iter.next() else {
                        return Err(internal(at, "expected an index"));
                    };
                    let Some(Part::Token(RIGHT_BRACKET, close)) = iter.next() else {
                        return Err(internal(at, "expected `]`"));
                    };
                    let site = Site::new(origin.span.start..close.span.end, origin.start);
                    chain = self.binder.resolve_index(chain, args, &site)?;
                }
                other => return Err(internal(other.site(), "unexpected member tail")),
            }
        }
        self.binder.finish_chain(chain)
    }

    fn member_function(&self, parts: Vec<Part>, at: &Site) -> Result<Item, SemanticError> {
        let mut name = None;
        let mut call = false;
        let mut args = Vec::new();
        for part in parts {
            match part {
                Part::Item(Item::Name(n), _) => name = Some(n),
                Part::Token(LEFT_PAREN, _) => call = true,
                Part::Item(Item::Arguments(a), _) => args = a,
                _ => {}
            }
        }
        let name = name.ok_or_else(|| internal(at, "missing member name"))?;
        Ok(Item::Access {
            name,
            args: call.then_some(args),
        })
    }

    fn elements(parts: Vec<Part>) -> Vec<Element> {
        parts
            .into_iter()
            .filter_map(|p| match p {
                Part::Item(Item::Element(e), _) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn conditional(&self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut operands = Self::elements(parts).into_iter();
        let (Some(condition), Some(then), Some(otherwise)) =
            (operands.next(), operands.next(), operands.next())
        else {
            return Err(internal(at, "`if` takes three operands"));
        };
        self.binder.conditional(condition, then, otherwise, at)
    }

    fn cast(&self, parts: Vec<Part>, at: &Site) -> Result<Element, SemanticError> {
        let mut operand = None;
        let mut target = None;
        for part in parts {
            match part {
                Part::Item(Item::Element(e), _) => operand = Some(e),
                Part::Item(Item::TypeName(ty), _) => target = Some(ty),
                _ => {}
            }
        }
        let (Some(operand), Some(target)) = (operand, target) else {
            return Err(internal(at, "`cast` takes an operand and a type"));
        };
        self.binder.cast(operand, target, at)
    }

    fn cast_type(&self, parts: Vec<Part>, at: &Site) -> Result<Item, SemanticError> {
        let mut segments: Vec<String> = Vec::new();
        let mut array = false;
        for part in parts {
            match part {
                Part::Item(Item::Name(n), _) => segments.push(n),
                Part::Token(ARRAY_BRACES, _) => array = true,
                _ => {}
            }
        }
        let dotted = segments.join(".");
        let ty = self.binder.resolve_type_name(&dotted, array, at)?;
        Ok(Item::TypeName(ty))
    }

    /// Reduce a completed production to one item.
    fn reduce(&mut self, id: PatternId, parts: Vec<Part>, at: &Site) -> Result<Item, SemanticError> {
        let element = match id {
            EXPRESSION => expect_element(parts.into_iter().next(), at)?,
            XOR_EXPRESSION | OR_EXPRESSION | AND_EXPRESSION | COMPARE_EXPRESSION
            | SHIFT_EXPRESSION | ADDITIVE_EXPRESSION | MULTIPLICATIVE_EXPRESSION
            | POWER_EXPRESSION => self.operator_chain(parts, at)?,
            NOT_EXPRESSION => self.not(parts, at)?,
            IN_EXPRESSION => self.in_expression(parts, at)?,
            NEGATE_EXPRESSION => self.negate(parts, at)?,
            MEMBER_EXPRESSION | FIELD_PROPERTY => self.member_chain(parts, at)?,
            BASIC_EXPRESSION => {
                // Literal, member function or parenthesized expression: pass
                // the single value through.
                let value = parts.into_iter().find_map(|p| match p {
                    Part::Item(item, _) => Some(item),
                    Part::Token(..) => None,
                });
                return value.ok_or_else(|| internal(at, "empty basic expression"));
            }
            MEMBER_FUNCTION => return self.member_function(parts, at),
            ARGUMENT_LIST => return Ok(Item::Arguments(Self::elements(parts))),
            IF_EXPRESSION => self.conditional(parts, at)?,
            CAST_EXPRESSION => self.cast(parts, at)?,
            CAST_TYPE => return self.cast_type(parts, at),
            other => return Err(internal(at, format!("unexpected production {other}"))),
        };
        Ok(Item::Element(element))
    }
}

impl Analyzer for TreeBuilder<'_> {
    type Value = Item;
    type Error = SemanticError;

    fn exit(&mut self, mut node: Node<Item>) -> Result<Option<Node<Item>>, SemanticError> {
        let site = node_site(&node);
        if let Some(id) = node.token_id() {
            let image = node.image().unwrap_or_default().to_string();
            if let Some(item) = self.literal(id, &image, &site)? {
                node.add_value(item);
            }
            return Ok(Some(node));
        }
        let Some(id) = node.pattern_id() else {
            return Ok(Some(node));
        };
        let parts = parts(&mut node);
        let item = self.reduce(id, parts, &site)?;
        node.add_value(item);
        Ok(Some(node))
    }
}
