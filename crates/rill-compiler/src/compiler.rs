//! Source text to `Program`.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rill_bytecode::Program;
use rill_core::Ty;

use crate::build::{Item, TreeBuilder};
use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::elements::Element;
use crate::emit::assemble;
use crate::grammar::{Grammar, ParseFailure, TreeKeeper};
use crate::lexer::{Position, ReaderBuffer, Token};
use crate::options::CompileOptions;
use crate::scope::Scope;
use crate::syntax::build_grammar;
use crate::{Error, Result};

/// A typed expression before emission.
#[derive(Debug, Clone)]
pub struct Analyzed {
    pub root: Element,
    pub locals: Vec<Ty>,
}

/// Compiles expressions against a `Scope`.
///
/// Prepared grammars are cached per separator pair. The cache sits behind a
/// mutex, so one compiler can be shared across threads.
#[derive(Default)]
pub struct ExpressionCompiler {
    grammars: Mutex<IndexMap<(char, char), Arc<Grammar>>>,
}

impl ExpressionCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prepared grammars held.
    pub fn cached_grammars(&self) -> usize {
        self.grammars.lock().len()
    }

    pub fn grammar(&self, options: &CompileOptions) -> Result<Arc<Grammar>> {
        let key = options.separators();
        let mut cache = self.grammars.lock();
        if let Some(grammar) = cache.get(&key) {
            return Ok(Arc::clone(grammar));
        }
        let grammar = Arc::new(build_grammar(options)?);
        cache.insert(key, Arc::clone(&grammar));
        Ok(grammar)
    }

    /// Parse and type `source` without emitting code.
    pub fn analyze(&self, source: &str, scope: &Scope) -> Result<Analyzed> {
        let grammar = self.grammar(scope.compile_options())?;
        let mut builder = TreeBuilder::new(scope);
        let node = match grammar.parse(ReaderBuffer::from_text(source), &mut builder) {
            Ok(node) => node,
            Err(ParseFailure::Syntax(log)) => return Err(Error::Syntax(log)),
            Err(ParseFailure::Analysis(e)) => return Err(Error::Semantic(e)),
        };

        let root = node.and_then(|mut n| n.take_values().into_iter().next());
        let Some(Item::Element(root)) = root else {
            let end = source.len();
            return Err(Error::Semantic(SemanticError::new(
                SemanticErrorKind::Internal,
                Some("expression produced no value"),
                end..end,
                Position::new(1, 1),
            )));
        };
        let root = builder.finish(root)?;
        tracing::debug!(ty = %root.ty, "expression typed");
        Ok(Analyzed {
            root,
            locals: builder.into_locals(),
        })
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compile(&self, source: &str, scope: &Scope) -> Result<Program> {
        let Analyzed { root, locals } = self.analyze(source, scope)?;
        let program = assemble(&root, locals, scope.owner_type().cloned())?;
        Ok(program)
    }

    /// Tokens of `source`, ignored tokens excluded.
    pub fn tokenize(&self, source: &str, options: &CompileOptions) -> Result<Vec<Token>> {
        let grammar = self.grammar(options)?;
        grammar
            .tokenizer()
            .tokens(ReaderBuffer::from_text(source))
            .map_err(Error::Syntax)
    }

    /// Indented parse tree of `source`, one node per line.
    pub fn parse_tree(&self, source: &str, options: &CompileOptions) -> Result<String> {
        let grammar = self.grammar(options)?;
        match grammar.parse(ReaderBuffer::from_text(source), &mut TreeKeeper) {
            Ok(Some(node)) => Ok(grammar.format_tree(&node)),
            Ok(None) => Ok(String::new()),
            Err(ParseFailure::Syntax(log)) => Err(Error::Syntax(log)),
            Err(ParseFailure::Analysis(never)) => match never {},
        }
    }
}

impl std::fmt::Debug for ExpressionCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCompiler")
            .field("cached_grammars", &self.cached_grammars())
            .finish()
    }
}
