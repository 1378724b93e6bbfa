use super::nfa::{Nfa, Unsupported};
use super::pattern::TokenId;
use super::reader::ReaderBuffer;

fn nfa(patterns: &[(&str, u16)]) -> Nfa {
    let mut nfa = Nfa::new(false);
    for &(p, id) in patterns {
        nfa.add(p, TokenId(id)).unwrap();
    }
    nfa
}

fn longest(nfa: &Nfa, text: &str) -> Option<(TokenId, usize)> {
    nfa.match_longest(&mut ReaderBuffer::from_text(text)).unwrap()
}

fn rejection(pattern: &str) -> Unsupported {
    Nfa::new(false).add(pattern, TokenId(1)).unwrap_err()
}

#[test]
fn integer_and_real_literals() {
    let nfa = nfa(&[(r"\d+", 1), (r"\d*\.\d+", 2)]);

    assert_eq!(longest(&nfa, "123+"), Some((TokenId(1), 3)));
    assert_eq!(longest(&nfa, "12.5)"), Some((TokenId(2), 4)));
    assert_eq!(longest(&nfa, ".5"), Some((TokenId(2), 2)));
    assert_eq!(longest(&nfa, "x"), None);
}

#[test]
fn identifier_class() {
    let nfa = nfa(&[("[a-z_][a-z0-9_]*", 1)]);

    assert_eq!(longest(&nfa, "abc_9 + 1"), Some((TokenId(1), 5)));
    assert_eq!(longest(&nfa, "9abc"), None);
}

#[test]
fn equal_length_goes_to_lowest_id() {
    let nfa = nfa(&[("[a-z]+", 5), ("ab", 2)]);

    assert_eq!(longest(&nfa, "ab"), Some((TokenId(2), 2)));
    assert_eq!(longest(&nfa, "abc"), Some((TokenId(5), 3)));
}

#[test]
fn negated_class_and_any() {
    let nfa = nfa(&[("'[^']*'", 1), ("#.", 2)]);

    assert_eq!(longest(&nfa, "'it' + x"), Some((TokenId(1), 4)));
    assert_eq!(longest(&nfa, "#\n"), None);
    assert_eq!(longest(&nfa, "#z"), Some((TokenId(2), 2)));
}

#[test]
fn bounded_repetition() {
    let nfa = nfa(&[("a{2,3}", 1)]);

    assert_eq!(longest(&nfa, "a"), None);
    assert_eq!(longest(&nfa, "aa"), Some((TokenId(1), 2)));
    assert_eq!(longest(&nfa, "aaaa"), Some((TokenId(1), 3)));
}

#[test]
fn alternation_and_groups() {
    let nfa = nfa(&[("(ab|cd)+e?", 1)]);

    assert_eq!(longest(&nfa, "abcdabe"), Some((TokenId(1), 7)));
    assert_eq!(longest(&nfa, "cdx"), Some((TokenId(1), 2)));
}

#[test]
fn escapes() {
    let nfa = nfa(&[(r"\x41B\.", 1), (r"[\t ]+", 2)]);

    assert_eq!(longest(&nfa, "AB."), Some((TokenId(1), 3)));
    assert_eq!(longest(&nfa, " \t x"), Some((TokenId(2), 3)));
}

#[test]
fn ignore_case() {
    let mut nfa = Nfa::new(true);
    nfa.add("true", TokenId(1)).unwrap();
    nfa.add("[a-f]+", TokenId(2)).unwrap();

    assert_eq!(longest(&nfa, "TRUE"), Some((TokenId(1), 4)));
    assert_eq!(longest(&nfa, "BEEF"), Some((TokenId(2), 4)));
}

#[test]
fn unsupported_constructs_are_rejected() {
    assert_eq!(rejection("a+?").reason, "lazy or possessive quantifier");
    assert_eq!(rejection("(?i)a").reason, "group options");
    assert_eq!(rejection("^a").reason, "anchor");
    assert_eq!(rejection(r"\bword").reason, "escape sequence");
    assert_eq!(rejection("a{5,2}").reason, "repetition bounds");
    assert_eq!(rejection("a{1000}").reason, "repetition bounds");
    assert_eq!(rejection("(ab").reason, "unterminated group");
    assert_eq!(rejection("ab)").reason, "unbalanced `)`");
    assert_eq!(rejection("[ab").reason, "unterminated class");
    assert_eq!(rejection("*a").reason, "quantifier without operand");
}

#[test]
fn rejected_pattern_adds_nothing() {
    let mut nfa = Nfa::new(false);
    assert!(nfa.add("^x", TokenId(1)).is_err());

    assert!(nfa.is_empty());
}
