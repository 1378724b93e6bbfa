//! Compile and evaluate an expression.

use rill::{Colors, ExecLimits};

use super::common::{CliError, CompileInput};

pub struct EvalArgs {
    pub input: CompileInput,
    pub json: bool,
    pub max_stack: u32,
    pub color: bool,
}

pub fn run(args: EvalArgs) -> Result<(), CliError> {
    println!("{}", evaluate(&args)?);
    Ok(())
}

/// Result text as printed by `eval`.
pub fn evaluate(args: &EvalArgs) -> Result<String, CliError> {
    let text = args.input.source.load()?;
    let (context, values) = args.input.prepare()?;
    let rill_error = |error: rill::Error| CliError::rill(error, &text);

    let expression = context
        .compile(&text)
        .map_err(rill_error)?
        .limits(ExecLimits::new().max_stack(args.max_stack));
    let value = expression.evaluate(&values).map_err(rill_error)?;
    tracing::debug!(ty = %expression.result_type(), "evaluated");

    if args.json {
        return Ok(serde_json::to_string(&value)?);
    }
    Ok(value.format(Colors::new(args.color)))
}
