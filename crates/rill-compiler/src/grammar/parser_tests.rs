use indoc::indoc;
use pretty_assertions::assert_eq;

use super::node::{Analyzer, Node, TreeKeeper};
use super::parser::{Grammar, GrammarBuilder, ParseFailure};
use super::pattern::{Alternative, Element, PatternId, ProductionPattern};
use crate::lexer::{ReaderBuffer, TokenId, TokenPattern};

const NUM: TokenId = TokenId(1);
const ADD: TokenId = TokenId(2);
const MUL: TokenId = TokenId(3);
const LP: TokenId = TokenId(4);
const RP: TokenId = TokenId(5);
const WS: TokenId = TokenId(6);

const EXPR: PatternId = PatternId(0);
const EXPR_TAIL: PatternId = PatternId(1);
const TERM: PatternId = PatternId(2);
const TERM_TAIL: PatternId = PatternId(3);
const FACTOR: PatternId = PatternId(4);

/// Expr   = Term ("+" Term)*
/// Term   = Factor ("*" Factor)*
/// Factor = NUM | "(" Expr ")"
fn grammar() -> Grammar {
    let mut g = GrammarBuilder::new(false);
    for p in [
        TokenPattern::regex(NUM, "NUM", r"\d+"),
        TokenPattern::exact(ADD, "ADD", "+"),
        TokenPattern::exact(MUL, "MUL", "*"),
        TokenPattern::exact(LP, "LP", "("),
        TokenPattern::exact(RP, "RP", ")"),
        TokenPattern::regex(WS, "WS", r"\s+").ignored(),
    ] {
        g.add_token(p).unwrap();
    }
    for p in [
        ProductionPattern::new(EXPR, "Expr").alt(
            Alternative::new()
                .production(TERM)
                .then(Element::production(EXPR_TAIL).zero_or_more()),
        ),
        ProductionPattern::synthetic(EXPR_TAIL, "ExprTail")
            .alt(Alternative::new().token(ADD).production(TERM)),
        ProductionPattern::new(TERM, "Term").alt(
            Alternative::new()
                .production(FACTOR)
                .then(Element::production(TERM_TAIL).zero_or_more()),
        ),
        ProductionPattern::synthetic(TERM_TAIL, "TermTail")
            .alt(Alternative::new().token(MUL).production(FACTOR)),
        ProductionPattern::new(FACTOR, "Factor")
            .alt(Alternative::new().token(NUM))
            .alt(Alternative::new().token(LP).production(EXPR).token(RP)),
    ] {
        g.add_production(p).unwrap();
    }
    g.prepare().unwrap()
}

/// Evaluates while parsing.
struct Calculator;

impl Analyzer for Calculator {
    type Value = i64;
    type Error = String;

    fn exit(&mut self, mut node: Node<i64>) -> Result<Option<Node<i64>>, String> {
        if let Some(image) = node.image() {
            if node.token_id() == Some(NUM) {
                let n: i64 = image.parse().map_err(|_| format!("bad number {image}"))?;
                if n == 13 {
                    return Err("unlucky 13".to_string());
                }
                node.add_value(n);
            }
            return Ok(Some(node));
        }
        let values = node.take_child_values();
        let result: i64 = match node.pattern_id() {
            Some(EXPR) => values.iter().sum(),
            Some(TERM) => values.iter().product(),
            _ => values.first().copied().unwrap_or_default(),
        };
        node.add_value(result);
        Ok(Some(node))
    }
}

fn tree(text: &str) -> String {
    let g = grammar();
    let node = g
        .parse(ReaderBuffer::from_text(text), &mut TreeKeeper)
        .unwrap()
        .unwrap();
    g.format_tree(&node)
}

fn syntax_errors(text: &str) -> String {
    let g = grammar();
    match g.parse(ReaderBuffer::from_text(text), &mut TreeKeeper) {
        Err(ParseFailure::Syntax(log)) => log.to_string(),
        other => panic!("expected syntax errors, got {other:?}"),
    }
}

fn calculate(text: &str) -> Result<i64, ParseFailure<String>> {
    let node = grammar()
        .parse(ReaderBuffer::from_text(text), &mut Calculator)?
        .unwrap();
    Ok(node.values[0])
}

#[test]
fn synthetic_tails_are_spliced() {
    assert_eq!(
        tree("1 + 2*3"),
        indoc! {r#"
            Expr
              Term
                Factor
                  NUM "1"
              ADD "+"
              Term
                Factor
                  NUM "2"
                MUL "*"
                Factor
                  NUM "3"
        "#}
    );
}

#[test]
fn node_spans_cover_children() {
    let g = grammar();
    let node = g
        .parse(ReaderBuffer::from_text("  (1+2) * 3"), &mut TreeKeeper)
        .unwrap()
        .unwrap();

    assert_eq!(node.span, 2..11);
    assert_eq!(node.start.to_string(), "1:3");
    let factor = &node.children()[0].children()[0];
    assert_eq!(factor.span, 2..7);
}

#[test]
fn analyzer_values_flow_upwards() {
    assert_eq!(calculate("2 * (3 + 4)"), Ok(14));
    assert_eq!(calculate("1 + 2 * 3 + 4"), Ok(11));
}

#[test]
fn analyzer_failure_stops_the_parse() {
    assert_eq!(
        calculate("1 + 13"),
        Err(ParseFailure::Analysis("unlucky 13".to_string()))
    );
}

#[test]
fn missing_close_paren() {
    assert_eq!(
        syntax_errors("(1 + 2"),
        r#"1:7: unexpected end of input, expected ")""#
    );
}

#[test]
fn trailing_input() {
    assert_eq!(
        syntax_errors("1 2"),
        r#"1:3: unexpected token "2", expected <EOF>"#
    );
}

#[test]
fn lexical_error_is_logged_and_skipped() {
    assert_eq!(
        syntax_errors("1 + @2"),
        "1:5: unexpected character '@'"
    );
}

#[test]
fn recovery_reports_errors_spaced_apart() {
    assert_eq!(
        syntax_errors("1 + ( ) + 2 + 3 + 4 + )"),
        indoc! {r#"
            1:7: unexpected token ")", expected one of <NUM>, "("
            1:23: unexpected token ")", expected one of <NUM>, "(""#}
    );
}

#[test]
fn follow_up_errors_are_suppressed() {
    assert_eq!(
        syntax_errors("1 + ) * * *"),
        r#"1:5: unexpected token ")", expected one of <NUM>, "(""#
    );
}

#[test]
fn grammar_is_reusable() {
    let g = grammar();

    for text in ["1", "(2)", "3*4"] {
        assert!(g.parse(ReaderBuffer::from_text(text), &mut TreeKeeper).is_ok());
    }
}
