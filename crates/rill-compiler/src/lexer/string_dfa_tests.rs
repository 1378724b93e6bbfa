use super::pattern::TokenId;
use super::reader::ReaderBuffer;
use super::string_dfa::StringDfa;

fn longest(dfa: &StringDfa, text: &str) -> Option<(TokenId, usize)> {
    dfa.match_longest(&mut ReaderBuffer::from_text(text)).unwrap()
}

#[test]
fn longest_literal_wins() {
    let mut dfa = StringDfa::new(false);
    dfa.add("<", TokenId(1));
    dfa.add("<=", TokenId(2));
    dfa.add("<<", TokenId(3));

    assert_eq!(longest(&dfa, "<= 1"), Some((TokenId(2), 2)));
    assert_eq!(longest(&dfa, "<<2"), Some((TokenId(3), 2)));
    assert_eq!(longest(&dfa, "< 2"), Some((TokenId(1), 1)));
}

#[test]
fn prefix_without_acceptance_backs_off() {
    let mut dfa = StringDfa::new(false);
    dfa.add("a", TokenId(1));
    dfa.add("abc", TokenId(2));

    assert_eq!(longest(&dfa, "abd"), Some((TokenId(1), 1)));
}

#[test]
fn no_match() {
    let mut dfa = StringDfa::new(false);
    dfa.add("if", TokenId(1));

    assert_eq!(longest(&dfa, "x"), None);
    assert_eq!(longest(&dfa, ""), None);
    assert_eq!(longest(&dfa, "IF"), None);
}

#[test]
fn duplicate_text_keeps_lowest_id() {
    let mut dfa = StringDfa::new(false);
    dfa.add("and", TokenId(7));
    dfa.add("and", TokenId(3));
    dfa.add("and", TokenId(5));

    assert_eq!(longest(&dfa, "and"), Some((TokenId(3), 3)));
}

#[test]
fn ignore_case_folds_every_character() {
    let mut dfa = StringDfa::new(true);
    dfa.add("Cast", TokenId(1));

    assert_eq!(longest(&dfa, "CAST("), Some((TokenId(1), 4)));
    assert_eq!(longest(&dfa, "cast"), Some((TokenId(1), 4)));
    assert_eq!(longest(&dfa, "cAsT"), Some((TokenId(1), 4)));
}

#[test]
fn non_ascii_start() {
    let mut dfa = StringDfa::new(true);
    dfa.add("äb", TokenId(1));

    assert_eq!(longest(&dfa, "ÄB"), Some((TokenId(1), 2)));
}
