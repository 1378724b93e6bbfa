//! Command builders for the CLI.
//!
//! Every command takes an expression and the compile options; commands that
//! evaluate also take variable bindings and runtime limits.

use clap::Command;

use super::args::*;

/// Expression input plus everything that shapes compilation.
fn with_compile_args(cmd: Command) -> Command {
    cmd.arg(expression_arg())
        .arg(file_arg())
        .arg(var_arg())
        .arg(checked_arg())
        .arg(ignore_case_strings_arg())
        .arg(case_sensitive_arg())
        .arg(decimal_separator_arg())
        .arg(argument_separator_arg())
        .arg(integers_as_doubles_arg())
        .arg(result_type_arg())
        .arg(color_arg())
}

/// Only the inputs the tokenizer and parser look at.
fn with_syntax_args(cmd: Command) -> Command {
    cmd.arg(expression_arg())
        .arg(file_arg())
        .arg(decimal_separator_arg())
        .arg(argument_separator_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("rill")
        .about("Compile, inspect and evaluate rill expressions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(eval_command())
        .subcommand(dump_command())
        .subcommand(trace_command())
        .subcommand(tokens_command())
        .subcommand(tree_command())
}

/// Compile and evaluate an expression.
pub fn eval_command() -> Command {
    let cmd = Command::new("eval")
        .about("Evaluate an expression")
        .override_usage(
            "\
  rill eval <EXPR> [--var NAME:TYPE=VALUE]...
  rill eval -f <FILE> [--var NAME:TYPE=VALUE]...",
        )
        .after_help(
            r#"EXAMPLES:
  rill eval '2 + 3 * 4'                        # 14
  rill eval 'x * 2' --var x:int=21             # 42
  rill eval 'name.ToUpper()' --var name:string=rill
  rill eval '2147483647 + 1' --checked         # overflow error
  rill eval '7 / 2' --result-type double --json"#,
        )
        .arg(json_arg())
        .arg(max_stack_arg());
    with_compile_args(cmd)
}

/// Show compiled bytecode.
pub fn dump_command() -> Command {
    let cmd = Command::new("dump")
        .about("Show compiled bytecode")
        .after_help(
            r#"EXAMPLES:
  rill dump 'if(x > 0, x, -x)' --var x:int
  rill dump '5 in (1,2,3)' --color always"#,
        );
    with_compile_args(cmd)
}

/// Evaluate while printing every executed instruction.
pub fn trace_command() -> Command {
    let cmd = Command::new("trace")
        .about("Trace expression evaluation")
        .after_help(
            r#"EXAMPLES:
  rill trace 'a and b' --var a:bool=false --var b:bool=true
  rill trace -v 'Math.Max(x, 3)' --var x:int=5   # whole stack and host calls"#,
        )
        .arg(max_stack_arg());
    with_compile_args(cmd)
}

/// Show the token stream.
pub fn tokens_command() -> Command {
    let cmd = Command::new("tokens")
        .about("Show the tokens of an expression")
        .after_help(
            r#"EXAMPLES:
  rill tokens 'a.b(1, "x")'
  rill tokens '1,5 + 2' --decimal-separator , --argument-separator ';'"#,
        );
    with_syntax_args(cmd)
}

/// Show the parse tree.
pub fn tree_command() -> Command {
    let cmd = Command::new("tree")
        .about("Show the parse tree of an expression")
        .after_help(
            r#"EXAMPLES:
  rill tree '1 + 2 * 3'"#,
        );
    with_syntax_args(cmd)
}
