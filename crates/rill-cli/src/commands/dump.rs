use rill::Colors;

use super::common::{CliError, CompileInput};

pub struct DumpArgs {
    pub input: CompileInput,
    pub color: bool,
}

pub fn run(args: DumpArgs) -> Result<(), CliError> {
    let text = args.input.source.load()?;
    let (context, _) = args.input.prepare()?;
    let expression = context
        .compile(&text)
        .map_err(|e| CliError::rill(e, &text))?;
    print!("{}", expression.dump(Colors::new(args.color)));
    Ok(())
}
