//! LL(k) grammar engine.
//!
//! Grammars are declared as token and production patterns, checked and
//! analyzed once by `GrammarBuilder::prepare`, then used for any number of
//! parses. Look-ahead length grows per decision point only as far as needed
//! to separate the alternatives.

mod analysis;
mod error;
mod lookahead;
mod node;
mod parser;
mod pattern;

#[cfg(test)]
mod parser_tests;

pub use error::{GrammarError, GrammarErrorKind, ParseError, ParseErrorKind, ParseLog};
pub use lookahead::{LookAheadSet, Sequence};
pub use node::{Analyzer, Node, NodeKind, TreeKeeper};
pub use parser::{Grammar, GrammarBuilder, ParseFailure};
pub use pattern::{Alternative, Element, PatternId, ProductionPattern, Symbol};
