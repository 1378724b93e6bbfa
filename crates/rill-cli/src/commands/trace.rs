//! Trace expression evaluation for debugging.

use rill::{Colors, ExecLimits, Paint, Verbosity};

use super::common::{CliError, CompileInput};

pub struct TraceArgs {
    pub input: CompileInput,
    pub verbosity: Verbosity,
    pub max_stack: u32,
    pub color: bool,
}

pub fn run(args: TraceArgs) -> Result<(), CliError> {
    let text = args.input.source.load()?;
    let (context, values) = args.input.prepare()?;
    let expression = context
        .compile(&text)
        .map_err(|e| CliError::rill(e, &text))?
        .limits(ExecLimits::new().max_stack(args.max_stack));

    let colors = Colors::new(args.color);
    let traced = expression.trace(&values, None, args.verbosity, colors);
    for line in &traced.lines {
        println!("{line}");
    }

    let value = traced.result.map_err(|e| CliError::rill(e, &text))?;
    println!("{}", colors.paint(Paint::Muted, "---"));
    println!("{}", value.format(colors));
    Ok(())
}
