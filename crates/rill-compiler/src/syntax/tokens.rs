//! Token ids and patterns of the expression language.
//!
//! Ids are registration order, so keywords come before `IDENTIFIER` and win
//! equal-length matches.

use crate::grammar::{GrammarError, GrammarErrorKind};
use crate::lexer::{TokenId, TokenPattern};

pub const ADD: TokenId = TokenId(0);
pub const SUB: TokenId = TokenId(1);
pub const MUL: TokenId = TokenId(2);
pub const DIV: TokenId = TokenId(3);
pub const POWER: TokenId = TokenId(4);
pub const MOD: TokenId = TokenId(5);
pub const LEFT_PAREN: TokenId = TokenId(6);
pub const RIGHT_PAREN: TokenId = TokenId(7);
pub const LEFT_BRACKET: TokenId = TokenId(8);
pub const RIGHT_BRACKET: TokenId = TokenId(9);
pub const EQ: TokenId = TokenId(10);
pub const LT: TokenId = TokenId(11);
pub const GT: TokenId = TokenId(12);
pub const LTE: TokenId = TokenId(13);
pub const GTE: TokenId = TokenId(14);
pub const NE: TokenId = TokenId(15);
pub const SHL: TokenId = TokenId(16);
pub const SHR: TokenId = TokenId(17);
pub const DOT: TokenId = TokenId(18);
pub const ARRAY_BRACES: TokenId = TokenId(19);
pub const ARGUMENT_SEPARATOR: TokenId = TokenId(20);
pub const AND: TokenId = TokenId(21);
pub const OR: TokenId = TokenId(22);
pub const XOR: TokenId = TokenId(23);
pub const NOT: TokenId = TokenId(24);
pub const IN: TokenId = TokenId(25);
pub const TRUE: TokenId = TokenId(26);
pub const FALSE: TokenId = TokenId(27);
pub const NULL: TokenId = TokenId(28);
pub const IF: TokenId = TokenId(29);
pub const CAST: TokenId = TokenId(30);
pub const WHITESPACE: TokenId = TokenId(31);
pub const INTEGER: TokenId = TokenId(32);
pub const REAL: TokenId = TokenId(33);
pub const HEX: TokenId = TokenId(34);
pub const STRING: TokenId = TokenId(35);
pub const CHAR: TokenId = TokenId(36);
pub const TIMESPAN: TokenId = TokenId(37);
pub const DATETIME: TokenId = TokenId(38);
pub const IDENTIFIER: TokenId = TokenId(39);
pub const LOGICAL_OPERATOR: TokenId = TokenId(40);

const OPERATORS: &[(TokenId, &str, &str)] = &[
    (ADD, "ADD", "+"),
    (SUB, "SUB", "-"),
    (MUL, "MUL", "*"),
    (DIV, "DIV", "/"),
    (POWER, "POWER", "^"),
    (MOD, "MOD", "%"),
    (LEFT_PAREN, "LEFT_PAREN", "("),
    (RIGHT_PAREN, "RIGHT_PAREN", ")"),
    (LEFT_BRACKET, "LEFT_BRACKET", "["),
    (RIGHT_BRACKET, "RIGHT_BRACKET", "]"),
    (EQ, "EQ", "="),
    (LT, "LT", "<"),
    (GT, "GT", ">"),
    (LTE, "LTE", "<="),
    (GTE, "GTE", ">="),
    (NE, "NE", "<>"),
    (SHL, "SHL", "<<"),
    (SHR, "SHR", ">>"),
    (DOT, "DOT", "."),
    (ARRAY_BRACES, "ARRAY_BRACES", "[]"),
];

const KEYWORDS: &[(TokenId, &str)] = &[
    (AND, "AND"),
    (OR, "OR"),
    (XOR, "XOR"),
    (NOT, "NOT"),
    (IN, "IN"),
    (TRUE, "TRUE"),
    (FALSE, "FALSE"),
    (NULL, "NULL"),
    (IF, "IF"),
    (CAST, "CAST"),
];

/// Characters a separator may not be: they already start other tokens.
const RESERVED: &str = "+-*/^%()[]=<>.\"'#_&|";

fn escape(c: char) -> String {
    if r"\.^$|?*+()[]{}".contains(c) {
        format!("\\{c}")
    } else {
        c.to_string()
    }
}

fn check_separator(name: &str, c: char) -> Result<(), GrammarError> {
    if c.is_whitespace() || c.is_alphanumeric() || RESERVED.contains(c) {
        return Err(GrammarError::new(
            GrammarErrorKind::InvalidToken,
            name,
            format!("'{c}' cannot be used as a separator"),
        ));
    }
    Ok(())
}

/// All token patterns, in id order, for the given separators.
pub fn patterns(decimal: char, argument: char) -> Result<Vec<TokenPattern>, GrammarError> {
    if decimal != '.' {
        check_separator("REAL", decimal)?;
    }
    check_separator("ARGUMENT_SEPARATOR", argument)?;
    if decimal == argument {
        return Err(GrammarError::new(
            GrammarErrorKind::InvalidToken,
            "ARGUMENT_SEPARATOR",
            "argument and decimal separators must differ",
        ));
    }

    let mut out = Vec::with_capacity(41);
    for &(id, name, text) in OPERATORS {
        out.push(TokenPattern::exact(id, name, text));
    }
    out.push(TokenPattern::exact(
        ARGUMENT_SEPARATOR,
        "ARGUMENT_SEPARATOR",
        argument.to_string(),
    ));
    for &(id, word) in KEYWORDS {
        out.push(TokenPattern::exact(id, word, word));
    }

    let dp = escape(decimal);
    out.extend([
        TokenPattern::regex(WHITESPACE, "WHITESPACE", r"\s+").ignored(),
        TokenPattern::regex(INTEGER, "INTEGER", r"\d+(u|l|ul|lu)?"),
        TokenPattern::regex(REAL, "REAL", format!(r"\d*{dp}\d+(e[+-]?\d{{1,3}})?(d|f)?")),
        TokenPattern::regex(HEX, "HEX", r"0x[0-9a-f]+(u|l|ul|lu)?"),
        TokenPattern::regex(STRING, "STRING", r#""([^"\\\n]|\\.)*""#),
        TokenPattern::regex(CHAR, "CHAR", r"'([^'\\\n]|\\.|\\u[0-9a-f]{4})'"),
        TokenPattern::regex(
            TIMESPAN,
            "TIMESPAN",
            r"##(\d+\.)?\d{1,2}:\d{2}(:\d{2}(\.\d{1,7})?)?#",
        ),
        TokenPattern::regex(DATETIME, "DATETIME", r"#[^#]+#"),
        TokenPattern::regex(IDENTIFIER, "IDENTIFIER", r"[\p{L}_][\p{L}\p{N}_]*"),
        TokenPattern::regex(LOGICAL_OPERATOR, "LOGICAL_OPERATOR", r"&&|\|\|")
            .error("use AND/OR instead"),
    ]);
    Ok(out)
}
