//! Compiler for rill expressions.
//!
//! Pipeline: source text → tokens → parse tree → typed elements → bytecode.
//!
//! Modules:
//! - `lexer`: grammar-driven tokenizer over a buffered reader
//! - `grammar`: LL(k) grammar preparation and the recursive-descent parser
//! - `syntax`: the expression grammar's tokens and productions
//! - `elements`: the typed expression tree
//! - `resolve`: name binding, operator typing, overloads and conversions
//! - `emit`: two-pass bytecode assembly
//! - `diagnostics`: error reporting with source snippets

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod build;
pub mod compiler;
pub mod diagnostics;
pub mod elements;
pub mod emit;
pub mod grammar;
pub mod lexer;
pub mod options;
pub mod resolve;
pub mod scope;
pub mod syntax;

#[cfg(test)]
mod compiler_tests;

pub use compiler::{Analyzed, ExpressionCompiler};
pub use diagnostics::{
    Diagnostic, Diagnostics, DiagnosticsPrinter, SemanticError, SemanticErrorKind,
};
pub use emit::EmitError;
pub use grammar::{GrammarError, ParseLog};
pub use options::CompileOptions;
pub use scope::{Import, Scope};

use lexer::Position;

/// Errors that can occur while compiling an expression.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(ParseLog),

    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("emit error: {0}")]
    Emit(#[from] EmitError),
}

impl Error {
    /// Errors as positioned diagnostics.
    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            Self::Syntax(log) => log.into(),
            Self::Semantic(e) => e.into(),
            Self::Grammar(_) | Self::Emit(_) => {
                let mut out = Diagnostics::new();
                out.push(Diagnostic {
                    message: self.to_string(),
                    span: 0..0,
                    position: Position::new(1, 1),
                });
                out
            }
        }
    }

    /// Diagnostics rendered against `source`, without color.
    pub fn render(&self, source: &str) -> String {
        self.diagnostics().printer().source(source).render()
    }
}

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, Error>;
