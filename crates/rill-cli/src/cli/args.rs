//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so commands compose the same
//! definitions.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Inline expression text (positional).
pub fn expression_arg() -> Arg {
    Arg::new("expression")
        .value_name("EXPR")
        .required_unless_present("file")
        .help("Expression text")
}

/// Expression file (-f/--file), `-` for stdin.
pub fn file_arg() -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .conflicts_with("expression")
        .help("Read the expression from a file (`-` for stdin)")
}

/// Variable declaration and binding (--var NAME:TYPE=VALUE), repeatable.
pub fn var_arg() -> Arg {
    Arg::new("var")
        .long("var")
        .value_name("NAME:TYPE=VALUE")
        .action(ArgAction::Append)
        .help("Declare and bind a variable, e.g. `--var x:int=5` (value omitted: declared only)")
}

/// Checked arithmetic (--checked).
pub fn checked_arg() -> Arg {
    Arg::new("checked")
        .long("checked")
        .action(ArgAction::SetTrue)
        .help("Raise an error on integral overflow")
}

/// Case-insensitive string equality (--ignore-case-strings).
pub fn ignore_case_strings_arg() -> Arg {
    Arg::new("ignore_case_strings")
        .long("ignore-case-strings")
        .action(ArgAction::SetTrue)
        .help("Compare strings ignoring case")
}

/// Case-sensitive identifiers (--case-sensitive).
pub fn case_sensitive_arg() -> Arg {
    Arg::new("case_sensitive")
        .long("case-sensitive")
        .action(ArgAction::SetTrue)
        .help("Resolve variables and members case-sensitively")
}

/// Decimal separator (--decimal-separator).
pub fn decimal_separator_arg() -> Arg {
    Arg::new("decimal_separator")
        .long("decimal-separator")
        .value_name("CHAR")
        .value_parser(value_parser!(char))
        .default_value(".")
        .help("Character inside real literals")
}

/// Argument separator (--argument-separator).
pub fn argument_separator_arg() -> Arg {
    Arg::new("argument_separator")
        .long("argument-separator")
        .value_name("CHAR")
        .value_parser(value_parser!(char))
        .default_value(",")
        .help("Separator in argument and `in` lists")
}

/// Decimal integer literals become doubles (--integers-as-doubles).
pub fn integers_as_doubles_arg() -> Arg {
    Arg::new("integers_as_doubles")
        .long("integers-as-doubles")
        .action(ArgAction::SetTrue)
        .help("Type unsuffixed integer literals as Double")
}

/// Result type (--result-type).
pub fn result_type_arg() -> Arg {
    Arg::new("result_type")
        .long("result-type")
        .value_name("TYPE")
        .help("Convert the result to TYPE (e.g. double, string)")
}

/// JSON output (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the result as JSON")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .global(true)
        .help("Verbosity level (-v for debug logs and a verbose trace, -vv for trace logs)")
}

/// Operand stack limit (--max-stack).
pub fn max_stack_arg() -> Arg {
    Arg::new("max_stack")
        .long("max-stack")
        .value_name("N")
        .value_parser(value_parser!(u32))
        .default_value("1024")
        .help("Maximum operand stack depth during evaluation")
}
