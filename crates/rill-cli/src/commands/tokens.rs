//! Print the token stream of an expression.

use rill::{CompileOptions, ExpressionCompiler};
use rill_compiler::Error;

use super::common::{CliError, SourceInput};

pub struct TokensArgs {
    pub source: SourceInput,
    pub options: CompileOptions,
}

pub fn run(args: TokensArgs) -> Result<(), CliError> {
    for line in token_lines(&args)? {
        println!("{line}");
    }
    Ok(())
}

/// `line:column  NAME  "image"`, one per token.
pub fn token_lines(args: &TokensArgs) -> Result<Vec<String>, CliError> {
    let text = args.source.load()?;
    let compiler = ExpressionCompiler::new();
    let failed = |e: Error| CliError::rill(e, &text);

    let grammar = compiler.grammar(&args.options).map_err(failed)?;
    let tokens = compiler.tokenize(&text, &args.options).map_err(failed)?;
    let tokenizer = grammar.tokenizer();
    Ok(tokens
        .iter()
        .map(|t| {
            let name = tokenizer
                .pattern(t.id)
                .map_or("?", |p| p.name.as_str());
            let at = format!("{}:{}", t.start.line, t.start.column);
            format!("{at:<6}{name:<20}{:?}", t.image)
        })
        .collect())
}
