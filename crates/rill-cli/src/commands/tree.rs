use rill::{CompileOptions, ExpressionCompiler};

use super::common::{CliError, SourceInput};

pub struct TreeArgs {
    pub source: SourceInput,
    pub options: CompileOptions,
}

pub fn run(args: TreeArgs) -> Result<(), CliError> {
    let text = args.source.load()?;
    let tree = ExpressionCompiler::new()
        .parse_tree(&text, &args.options)
        .map_err(|e| CliError::rill(e, &text))?;
    println!("{}", tree.trim_end());
    Ok(())
}
