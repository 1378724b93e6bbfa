//! Tokenizer for grammar-defined token patterns.
//!
//! Input is read incrementally through `ReaderBuffer`. Three matchers run at
//! every position:
//! - `StringDfa`: exact literals, case-folded when the grammar ignores case
//! - `Nfa`: regular expressions within a small supported subset
//! - `RegexMatcher`: everything else, via a regex-automata dense DFA
//!
//! The longest match wins; ties go to the lowest token id.

mod nfa;
mod pattern;
mod reader;
mod regex;
mod string_dfa;
mod token;
mod tokenizer;

#[cfg(test)]
mod nfa_tests;
#[cfg(test)]
mod string_dfa_tests;

pub use nfa::{Nfa, Unsupported};
pub use pattern::{PatternKind, TokenId, TokenPattern};
pub use reader::{BLOCK_SIZE, ReaderBuffer};
pub use regex::{RegexBuildError, RegexMatcher};
pub use string_dfa::StringDfa;
pub use token::{Position, Token, TokenIndex, TokenList};
pub use tokenizer::{TokenMatch, TokenStream, Tokenizer};
