//! The expression language's concrete grammar.
//!
//! Keywords are case-insensitive. The decimal and argument separators are
//! part of the token set, so one grammar is prepared per separator pair.

pub mod productions;
pub mod tokens;


use crate::grammar::{Grammar, GrammarBuilder, GrammarError};
use crate::options::CompileOptions;

/// Prepare the grammar for `options`' separators.
#[tracing::instrument(level = "debug", skip_all, fields(separators = ?options.separators()))]
pub fn build_grammar(options: &CompileOptions) -> Result<Grammar, GrammarError> {
    let (decimal, argument) = options.separators();
    let mut builder = GrammarBuilder::new(true);
    for pattern in tokens::patterns(decimal, argument)? {
        builder.add_token(pattern)?;
    }
    for pattern in productions::patterns() {
        builder.add_production(pattern)?;
    }
    builder.start(productions::EXPRESSION);
    builder.prepare()
}
