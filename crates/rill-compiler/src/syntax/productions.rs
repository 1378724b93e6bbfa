//! Production patterns of the expression language.
//!
//! ```text
//! Expression     = Xor
//! Xor            = Or {XOR Or}
//! Or             = And {OR And}
//! And            = Not {AND Not}
//! Not            = [NOT] In
//! In             = Compare [IN InTarget]
//! InTarget       = FieldProperty | "(" ArgumentList ")"
//! FieldProperty  = MemberFunction {MemberTail}
//! Compare        = Shift {("=" | "<>" | "<" | ">" | "<=" | ">=") Shift}
//! Shift          = Additive {("<<" | ">>") Additive}
//! Additive       = Multiplicative {("+" | "-") Multiplicative}
//! Multiplicative = Power {("*" | "/" | "%") Power}
//! Power          = Negate {"^" Negate}
//! Negate         = ["-"] Member
//! Member         = Basic {MemberTail}
//! MemberTail     = "." MemberFunction | "[" ArgumentList "]"
//! Basic          = Literal | "(" Expression ")" | MemberFunction | If | Cast
//! MemberFunction = IDENTIFIER | IDENTIFIER "(" [ArgumentList] ")"
//! ArgumentList   = Expression {sep Expression}
//! If             = IF "(" Expression sep Expression sep Expression ")"
//! Cast           = CAST "(" Expression sep CastType ")"
//! CastType       = IDENTIFIER {"." IDENTIFIER} ["[]"]
//! ```
//!
//! Operator repetitions go through synthetic tail productions so the
//! operands and operators of one level end up as siblings.

use crate::grammar::{Alternative, Element, PatternId, ProductionPattern};
use crate::lexer::TokenId;

use super::tokens::*;

pub const EXPRESSION: PatternId = PatternId(0);
pub const XOR_EXPRESSION: PatternId = PatternId(1);
pub const XOR_TAIL: PatternId = PatternId(2);
pub const OR_EXPRESSION: PatternId = PatternId(3);
pub const OR_TAIL: PatternId = PatternId(4);
pub const AND_EXPRESSION: PatternId = PatternId(5);
pub const AND_TAIL: PatternId = PatternId(6);
pub const NOT_EXPRESSION: PatternId = PatternId(7);
pub const IN_EXPRESSION: PatternId = PatternId(8);
pub const IN_TARGET: PatternId = PatternId(9);
pub const FIELD_PROPERTY: PatternId = PatternId(10);
pub const COMPARE_EXPRESSION: PatternId = PatternId(11);
pub const COMPARE_TAIL: PatternId = PatternId(12);
pub const SHIFT_EXPRESSION: PatternId = PatternId(13);
pub const SHIFT_TAIL: PatternId = PatternId(14);
pub const ADDITIVE_EXPRESSION: PatternId = PatternId(15);
pub const ADDITIVE_TAIL: PatternId = PatternId(16);
pub const MULTIPLICATIVE_EXPRESSION: PatternId = PatternId(17);
pub const MULTIPLICATIVE_TAIL: PatternId = PatternId(18);
pub const POWER_EXPRESSION: PatternId = PatternId(19);
pub const POWER_TAIL: PatternId = PatternId(20);
pub const NEGATE_EXPRESSION: PatternId = PatternId(21);
pub const MEMBER_EXPRESSION: PatternId = PatternId(22);
pub const MEMBER_TAIL: PatternId = PatternId(23);
pub const BASIC_EXPRESSION: PatternId = PatternId(24);
pub const LITERAL: PatternId = PatternId(25);
pub const MEMBER_FUNCTION: PatternId = PatternId(26);
pub const ARGUMENT_LIST: PatternId = PatternId(27);
pub const ARGUMENT_TAIL: PatternId = PatternId(28);
pub const IF_EXPRESSION: PatternId = PatternId(29);
pub const CAST_EXPRESSION: PatternId = PatternId(30);
pub const CAST_TYPE: PatternId = PatternId(31);
pub const CAST_TYPE_TAIL: PatternId = PatternId(32);
pub const IN_CLAUSE: PatternId = PatternId(33);

/// `first {tail}`.
fn chain(id: PatternId, name: &str, first: PatternId, tail: PatternId) -> ProductionPattern {
    ProductionPattern::new(id, name).alt(
        Alternative::new()
            .production(first)
            .then(Element::production(tail).zero_or_more()),
    )
}

/// One alternative `op operand` per operator.
fn tail(id: PatternId, name: &str, operators: &[TokenId], operand: PatternId) -> ProductionPattern {
    operators.iter().fold(ProductionPattern::synthetic(id, name), |p, &op| {
        p.alt(Alternative::new().token(op).production(operand))
    })
}

pub fn patterns() -> Vec<ProductionPattern> {
    vec![
        ProductionPattern::new(EXPRESSION, "Expression")
            .alt(Alternative::new().production(XOR_EXPRESSION)),
        chain(XOR_EXPRESSION, "XorExpression", OR_EXPRESSION, XOR_TAIL),
        tail(XOR_TAIL, "XorTail", &[XOR], OR_EXPRESSION),
        chain(OR_EXPRESSION, "OrExpression", AND_EXPRESSION, OR_TAIL),
        tail(OR_TAIL, "OrTail", &[OR], AND_EXPRESSION),
        chain(AND_EXPRESSION, "AndExpression", NOT_EXPRESSION, AND_TAIL),
        tail(AND_TAIL, "AndTail", &[AND], NOT_EXPRESSION),
        ProductionPattern::new(NOT_EXPRESSION, "NotExpression").alt(
            Alternative::new()
                .then(Element::token(NOT).optional())
                .production(IN_EXPRESSION),
        ),
        ProductionPattern::new(IN_EXPRESSION, "InExpression").alt(
            Alternative::new()
                .production(COMPARE_EXPRESSION)
                .then(Element::production(IN_CLAUSE).optional()),
        ),
        ProductionPattern::synthetic(IN_CLAUSE, "InClause")
            .alt(Alternative::new().token(IN).production(IN_TARGET)),
        ProductionPattern::synthetic(IN_TARGET, "InTarget")
            .alt(Alternative::new().production(FIELD_PROPERTY))
            .alt(
                Alternative::new()
                    .token(LEFT_PAREN)
                    .production(ARGUMENT_LIST)
                    .token(RIGHT_PAREN),
            ),
        chain(FIELD_PROPERTY, "FieldProperty", MEMBER_FUNCTION, MEMBER_TAIL),
        chain(
            COMPARE_EXPRESSION,
            "CompareExpression",
            SHIFT_EXPRESSION,
            COMPARE_TAIL,
        ),
        tail(
            COMPARE_TAIL,
            "CompareTail",
            &[EQ, NE, LT, GT, LTE, GTE],
            SHIFT_EXPRESSION,
        ),
        chain(
            SHIFT_EXPRESSION,
            "ShiftExpression",
            ADDITIVE_EXPRESSION,
            SHIFT_TAIL,
        ),
        tail(SHIFT_TAIL, "ShiftTail", &[SHL, SHR], ADDITIVE_EXPRESSION),
        chain(
            ADDITIVE_EXPRESSION,
            "AdditiveExpression",
            MULTIPLICATIVE_EXPRESSION,
            ADDITIVE_TAIL,
        ),
        tail(
            ADDITIVE_TAIL,
            "AdditiveTail",
            &[ADD, SUB],
            MULTIPLICATIVE_EXPRESSION,
        ),
        chain(
            MULTIPLICATIVE_EXPRESSION,
            "MultiplicativeExpression",
            POWER_EXPRESSION,
            MULTIPLICATIVE_TAIL,
        ),
        tail(
            MULTIPLICATIVE_TAIL,
            "MultiplicativeTail",
            &[MUL, DIV, MOD],
            POWER_EXPRESSION,
        ),
        chain(
            POWER_EXPRESSION,
            "PowerExpression",
            NEGATE_EXPRESSION,
            POWER_TAIL,
        ),
        tail(POWER_TAIL, "PowerTail", &[POWER], NEGATE_EXPRESSION),
        ProductionPattern::new(NEGATE_EXPRESSION, "NegateExpression").alt(
            Alternative::new()
                .then(Element::token(SUB).optional())
                .production(MEMBER_EXPRESSION),
        ),
        chain(
            MEMBER_EXPRESSION,
            "MemberExpression",
            BASIC_EXPRESSION,
            MEMBER_TAIL,
        ),
        ProductionPattern::synthetic(MEMBER_TAIL, "MemberTail")
            .alt(Alternative::new().token(DOT).production(MEMBER_FUNCTION))
            .alt(
                Alternative::new()
                    .token(LEFT_BRACKET)
                    .production(ARGUMENT_LIST)
                    .token(RIGHT_BRACKET),
            ),
        ProductionPattern::new(BASIC_EXPRESSION, "BasicExpression")
            .alt(Alternative::new().production(LITERAL))
            .alt(
                Alternative::new()
                    .token(LEFT_PAREN)
                    .production(EXPRESSION)
                    .token(RIGHT_PAREN),
            )
            .alt(Alternative::new().production(MEMBER_FUNCTION))
            .alt(Alternative::new().production(IF_EXPRESSION))
            .alt(Alternative::new().production(CAST_EXPRESSION)),
        [INTEGER, REAL, HEX, STRING, CHAR, TRUE, FALSE, NULL, TIMESPAN, DATETIME]
            .into_iter()
            .fold(ProductionPattern::synthetic(LITERAL, "Literal"), |p, t| {
                p.alt(Alternative::new().token(t))
            }),
        ProductionPattern::new(MEMBER_FUNCTION, "MemberFunction")
            .alt(Alternative::new().token(IDENTIFIER))
            .alt(
                Alternative::new()
                    .token(IDENTIFIER)
                    .token(LEFT_PAREN)
                    .then(Element::production(ARGUMENT_LIST).optional())
                    .token(RIGHT_PAREN),
            ),
        chain(ARGUMENT_LIST, "ArgumentList", EXPRESSION, ARGUMENT_TAIL),
        tail(ARGUMENT_TAIL, "ArgumentTail", &[ARGUMENT_SEPARATOR], EXPRESSION),
        ProductionPattern::new(IF_EXPRESSION, "IfExpression").alt(
            Alternative::new()
                .token(IF)
                .token(LEFT_PAREN)
                .production(EXPRESSION)
                .token(ARGUMENT_SEPARATOR)
                .production(EXPRESSION)
                .token(ARGUMENT_SEPARATOR)
                .production(EXPRESSION)
                .token(RIGHT_PAREN),
        ),
        ProductionPattern::new(CAST_EXPRESSION, "CastExpression").alt(
            Alternative::new()
                .token(CAST)
                .token(LEFT_PAREN)
                .production(EXPRESSION)
                .token(ARGUMENT_SEPARATOR)
                .production(CAST_TYPE)
                .token(RIGHT_PAREN),
        ),
        ProductionPattern::new(CAST_TYPE, "CastType").alt(
            Alternative::new()
                .token(IDENTIFIER)
                .then(Element::production(CAST_TYPE_TAIL).zero_or_more())
                .then(Element::token(ARRAY_BRACES).optional()),
        ),
        ProductionPattern::synthetic(CAST_TYPE_TAIL, "CastTypeTail")
            .alt(Alternative::new().token(DOT).token(IDENTIFIER)),
    ]
}
